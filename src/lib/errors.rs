use thiserror::Error;

pub const MISSING_FIELDS: &str = "Missing required fields";
pub const INVALID_TIME_ORDER: &str = "Start time must be before end time";
pub const EMPTY_TITLE: &str = "Title cannot be empty";
pub const INVALID_BULK_PAYLOAD: &str = "Invalid request. Please provide an array of meeting IDs.";

#[derive(Debug, Error)]
pub enum MeetingError {
    #[error("{0}")]
    Validation(String),

    #[error("Meeting not found")]
    NotFound,

    #[error(transparent)]
    Store(#[from] surrealdb::Error),

    #[error("{0}")]
    Internal(String),
}

impl MeetingError {
    pub fn validation(message: &str) -> Self {
        Self::Validation(message.to_string())
    }
}
