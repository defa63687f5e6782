pub mod filter;
pub mod meeting;
pub mod user;
