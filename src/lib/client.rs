pub mod admin;
pub mod meeting_service;
