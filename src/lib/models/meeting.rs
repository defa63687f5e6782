use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use surrealdb::sql::Thing;

use super::user::UserSummary;
use crate::errors::{MeetingError, EMPTY_TITLE, INVALID_TIME_ORDER, MISSING_FIELDS};
use crate::utils::{deserialize_optional_timestamp, deserialize_present, thing_key, user_thing};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MeetingType {
    #[default]
    InPerson,
    Virtual,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MeetingStatus {
    #[default]
    Scheduled,
    Canceled,
    Completed,
}

/// Fails unless `start` is strictly before `end`.
pub fn check_time_order(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<(), MeetingError> {
    if start >= end {
        return Err(MeetingError::validation(INVALID_TIME_ORDER));
    }

    Ok(())
}

// === store models === //

/// A meeting document as it sits in the `meeting` table.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct MeetingRecord {
    pub id: Thing,
    pub title: String,
    #[serde(default)]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub meeting_type: MeetingType,
    #[serde(default)]
    pub meeting_link: Option<String>,
    #[serde(default)]
    pub participants: Vec<Thing>,
    pub organizer: Thing,
    #[serde(default)]
    pub status: MeetingStatus,
    #[serde(default)]
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl MeetingRecord {
    /// Every user this meeting points at, organizer first.
    pub fn user_refs(&self) -> impl Iterator<Item = &Thing> {
        std::iter::once(&self.organizer).chain(self.participants.iter())
    }
}

#[derive(Debug, Serialize)]
pub struct InsertMeetingArgs {
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub meeting_type: MeetingType,
    pub meeting_link: Option<String>,
    pub participants: Vec<Thing>,
    pub organizer: Thing,
    pub status: MeetingStatus,
    pub now: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct UpdateMeetingArgs {
    pub id: Thing,
    pub title: String,
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    pub location: Option<String>,
    pub meeting_type: MeetingType,
    pub meeting_link: Option<String>,
    pub participants: Vec<Thing>,
    pub status: MeetingStatus,
    pub updated_at: DateTime<Utc>,
}

impl From<&MeetingRecord> for UpdateMeetingArgs {
    fn from(record: &MeetingRecord) -> Self {
        Self {
            id: record.id.clone(),
            title: record.title.clone(),
            description: record.description.clone(),
            start_time: record.start_time,
            end_time: record.end_time,
            location: record.location.clone(),
            meeting_type: record.meeting_type,
            meeting_link: record.meeting_link.clone(),
            participants: record.participants.clone(),
            status: record.status,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SelectMeetingArgs {
    pub id: Thing,
}

#[derive(Debug, Serialize)]
pub struct SoftDeleteArgs {
    pub id: Thing,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct SoftDeleteManyArgs {
    pub ids: Vec<Thing>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize)]
pub struct IdContainer {
    pub id: Thing,
}

// === request models === //

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateMeetingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub meeting_type: Option<MeetingType>,
    pub meeting_link: Option<String>,
    pub participants: Option<Vec<String>>,
    pub organizer: Option<String>,
}

impl CreateMeetingRequest {
    /// Checks required fields and time order, then fills in defaults.
    pub fn into_insert_args(self, now: DateTime<Utc>) -> Result<InsertMeetingArgs, MeetingError> {
        let (title, start_time, end_time, organizer) =
            match (self.title, self.start_time, self.end_time, self.organizer) {
                (Some(title), Some(start), Some(end), Some(organizer))
                    if !title.is_empty() && !organizer.is_empty() =>
                {
                    (title, start, end, organizer)
                }
                _ => return Err(MeetingError::validation(MISSING_FIELDS)),
            };

        check_time_order(start_time, end_time)?;

        Ok(InsertMeetingArgs {
            title,
            description: self.description,
            start_time,
            end_time,
            location: self.location,
            meeting_type: self.meeting_type.unwrap_or_default(),
            meeting_link: self.meeting_link,
            participants: self
                .participants
                .unwrap_or_default()
                .iter()
                .map(|p| user_thing(p))
                .collect(),
            organizer: user_thing(&organizer),
            status: MeetingStatus::default(),
            now,
        })
    }
}

/// A partial update. `description`, `location` and `meetingLink` distinguish
/// an explicit `null` (clear) from an absent key (keep).
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MeetingPatch {
    pub title: Option<String>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub description: Option<Option<String>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_optional_timestamp")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub location: Option<Option<String>>,
    pub meeting_type: Option<MeetingType>,
    #[serde(default, deserialize_with = "deserialize_present")]
    pub meeting_link: Option<Option<String>>,
    pub participants: Option<Vec<String>>,
    pub status: Option<MeetingStatus>,
}

impl MeetingPatch {
    /// Time order is only checked when both ends arrive in the same patch.
    pub fn validate(&self) -> Result<(), MeetingError> {
        if matches!(&self.title, Some(title) if title.is_empty()) {
            return Err(MeetingError::validation(EMPTY_TITLE));
        }

        if let (Some(start), Some(end)) = (self.start_time, self.end_time) {
            check_time_order(start, end)?;
        }

        Ok(())
    }

    pub fn apply_to(self, record: &mut MeetingRecord, now: DateTime<Utc>) {
        if let Some(title) = self.title {
            record.title = title;
        }
        if let Some(description) = self.description {
            record.description = description;
        }
        if let Some(start_time) = self.start_time {
            record.start_time = start_time;
        }
        if let Some(end_time) = self.end_time {
            record.end_time = end_time;
        }
        if let Some(location) = self.location {
            record.location = location;
        }
        if let Some(meeting_type) = self.meeting_type {
            record.meeting_type = meeting_type;
        }
        if let Some(meeting_link) = self.meeting_link {
            record.meeting_link = meeting_link;
        }
        if let Some(participants) = self.participants {
            record.participants = participants.iter().map(|p| user_thing(p)).collect();
        }
        if let Some(status) = self.status {
            record.status = status;
        }

        record.updated_at = now;
    }
}

// === response models === //

/// A meeting as served, with user references resolved.
///
/// A dangling organizer becomes `null`; dangling participants are left out.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Meeting {
    #[serde(rename = "_id")]
    pub id: String,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub start_time: DateTime<Utc>,
    pub end_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<String>,
    pub meeting_type: MeetingType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meeting_link: Option<String>,
    pub participants: Vec<UserSummary>,
    pub organizer: Option<UserSummary>,
    pub status: MeetingStatus,
    pub deleted: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Meeting {
    pub fn resolve(record: MeetingRecord, users: &HashMap<Thing, UserSummary>) -> Self {
        Self {
            id: thing_key(&record.id),
            organizer: users.get(&record.organizer).cloned(),
            participants: record
                .participants
                .iter()
                .filter_map(|p| users.get(p).cloned())
                .collect(),
            title: record.title,
            description: record.description,
            start_time: record.start_time,
            end_time: record.end_time,
            location: record.location,
            meeting_type: record.meeting_type,
            meeting_link: record.meeting_link,
            status: record.status,
            deleted: record.deleted,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingList {
    pub meetings: Vec<Meeting>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MeetingMessage {
    pub message: String,
    pub meeting: Meeting,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Message {
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeletedCount {
    pub message: String,
    pub count: usize,
}
