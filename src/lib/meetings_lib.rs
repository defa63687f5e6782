pub mod client;
pub mod db;
pub mod errors;
pub mod models;
pub mod repos;
pub mod services;
pub mod utils;
