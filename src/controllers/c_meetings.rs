use std::collections::HashMap;

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, Query, State,
    },
    http::StatusCode,
    Json,
};
use meetings_lib::{
    errors::{MeetingError, INVALID_BULK_PAYLOAD},
    models::{
        filter::MeetingFilter,
        meeting::{
            CreateMeetingRequest, DeletedCount, Meeting, MeetingList, MeetingMessage, MeetingPatch,
            Message,
        },
    },
    services::s_meetings,
};
use serde_json::Value;
use tracing::{debug, info, instrument};
use ulid::Ulid;

use crate::errors::MeetingsWebError;
use crate::state::AppState;

#[instrument(skip(state))]
pub async fn get_meetings(
    State(state): State<AppState>,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<MeetingList>, MeetingsWebError> {
    info!("c: get meetings");

    let meetings = s_meetings::get_meetings(&state.db, MeetingFilter::from_params(params)).await?;
    debug!("c: returning {} meetings", meetings.len());

    Ok(Json(MeetingList { meetings }))
}

#[instrument(skip(state, payload))]
pub async fn handle_create_meeting(
    State(state): State<AppState>,
    payload: Result<Json<CreateMeetingRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<MeetingMessage>), MeetingsWebError> {
    info!("c: create meeting");

    let Json(request) = payload?;
    let meeting = s_meetings::create_meeting(&state.db, request).await?;

    Ok((
        StatusCode::CREATED,
        Json(MeetingMessage {
            message: String::from("Meeting created successfully"),
            meeting,
        }),
    ))
}

#[instrument(skip(state))]
pub async fn handle_get_meeting(
    State(state): State<AppState>,
    meeting_id: Result<Path<Ulid>, PathRejection>,
) -> Result<Json<Meeting>, MeetingsWebError> {
    let Path(meeting_id) = meeting_id?;
    info!("c: get meeting {}", meeting_id);

    let meeting = s_meetings::get_meeting(&state.db, &meeting_id).await?;

    Ok(Json(meeting))
}

#[instrument(skip(state, payload))]
pub async fn handle_update_meeting(
    State(state): State<AppState>,
    meeting_id: Result<Path<Ulid>, PathRejection>,
    payload: Result<Json<MeetingPatch>, JsonRejection>,
) -> Result<Json<MeetingMessage>, MeetingsWebError> {
    let Path(meeting_id) = meeting_id?;
    info!("c: update meeting {}", meeting_id);

    let Json(patch) = payload?;
    let meeting = s_meetings::update_meeting(&state.db, &meeting_id, patch).await?;

    Ok(Json(MeetingMessage {
        message: String::from("Meeting updated successfully"),
        meeting,
    }))
}

#[instrument(skip(state))]
pub async fn handle_delete_meeting(
    State(state): State<AppState>,
    meeting_id: Result<Path<Ulid>, PathRejection>,
) -> Result<Json<Message>, MeetingsWebError> {
    let Path(meeting_id) = meeting_id?;
    info!("c: delete meeting {}", meeting_id);

    s_meetings::delete_meeting(&state.db, &meeting_id).await?;

    Ok(Json(Message {
        message: String::from("Meeting deleted successfully"),
    }))
}

/// Any body that is not a JSON array gets the same bulk-payload message.
#[instrument(skip(state, payload))]
pub async fn handle_delete_meetings(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Json<DeletedCount>, MeetingsWebError> {
    info!("c: delete meetings");

    let Json(payload) = payload.map_err(|rejection| {
        debug!("c: unreadable bulk payload: {}", rejection.body_text());
        MeetingError::validation(INVALID_BULK_PAYLOAD)
    })?;

    let ids = s_meetings::meeting_ids_from_payload(&payload)?;
    let count = s_meetings::delete_meetings(&state.db, ids).await?;

    Ok(Json(DeletedCount {
        message: String::from("Meetings deleted successfully"),
        count,
    }))
}
