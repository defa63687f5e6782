use std::{convert::Infallible, fmt::Display};

use axum::{
    extract::rejection::{JsonRejection, PathRejection},
    http::StatusCode,
    response::{IntoResponse, IntoResponseParts},
    Json,
};
use meetings_lib::errors::MeetingError;
use serde::Serialize;
use serde_json::json;
use tracing::{error, warn};

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum MeetingsWebErrorId {
    InvalidRequest,
    NotFound,
    StoreFailure,
}

impl MeetingsWebErrorId {
    pub fn status(self) -> StatusCode {
        match self {
            Self::InvalidRequest => StatusCode::BAD_REQUEST,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::StoreFailure => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl Display for MeetingsWebErrorId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_fmt(format_args!("{:#?}", self))
    }
}

/// Leaves the error id in the response extensions for outer layers.
impl IntoResponseParts for MeetingsWebErrorId {
    type Error = Infallible;

    fn into_response_parts(
        self,
        mut res: axum::response::ResponseParts,
    ) -> Result<axum::response::ResponseParts, Self::Error> {
        res.extensions_mut().insert(self);
        Ok(res)
    }
}

#[derive(Debug, Serialize)]
pub struct MeetingsWebError {
    pub id: MeetingsWebErrorId,
    pub message: String,
}

impl MeetingsWebError {
    pub fn invalid_request(message: impl Into<String>) -> Self {
        Self {
            id: MeetingsWebErrorId::InvalidRequest,
            message: message.into(),
        }
    }
}

impl From<MeetingError> for MeetingsWebError {
    fn from(err: MeetingError) -> Self {
        let id = match &err {
            MeetingError::Validation(_) => MeetingsWebErrorId::InvalidRequest,
            MeetingError::NotFound => MeetingsWebErrorId::NotFound,
            MeetingError::Store(_) | MeetingError::Internal(_) => {
                error!("meeting request failed: {}", err);
                MeetingsWebErrorId::StoreFailure
            }
        };

        Self {
            id,
            message: err.to_string(),
        }
    }
}

impl From<JsonRejection> for MeetingsWebError {
    fn from(rejection: JsonRejection) -> Self {
        warn!("rejected request body: {}", rejection.body_text());
        Self::invalid_request(rejection.body_text())
    }
}

impl From<PathRejection> for MeetingsWebError {
    fn from(rejection: PathRejection) -> Self {
        warn!("rejected path: {}", rejection.body_text());
        Self::invalid_request(rejection.body_text())
    }
}

impl IntoResponse for MeetingsWebError {
    fn into_response(self) -> axum::response::Response {
        let body = match self.id {
            MeetingsWebErrorId::StoreFailure => json!({ "error": self.message }),
            _ => json!({ "message": self.message }),
        };

        (self.id.status(), self.id, Json(body)).into_response()
    }
}
