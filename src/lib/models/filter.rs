use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::utils::{thing_key, user_thing};

/// Meeting fields a list request may filter on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum FilterField {
    Title,
    Description,
    Location,
    MeetingType,
    MeetingLink,
    Status,
    Organizer,
    Participants,
}

impl FilterField {
    pub fn from_param(key: &str) -> Option<Self> {
        match key {
            "title" => Some(Self::Title),
            "description" => Some(Self::Description),
            "location" => Some(Self::Location),
            "meetingType" => Some(Self::MeetingType),
            "meetingLink" => Some(Self::MeetingLink),
            "status" => Some(Self::Status),
            "organizer" => Some(Self::Organizer),
            "participants" => Some(Self::Participants),
            _ => None,
        }
    }

    pub fn column(self) -> &'static str {
        match self {
            Self::Title => "title",
            Self::Description => "description",
            Self::Location => "location",
            Self::MeetingType => "meeting_type",
            Self::MeetingLink => "meeting_link",
            Self::Status => "status",
            Self::Organizer => "organizer",
            Self::Participants => "participants",
        }
    }

    pub fn is_user_ref(self) -> bool {
        matches!(self, Self::Organizer | Self::Participants)
    }
}

/// Equality/membership conditions ANDed onto the live-meetings query.
///
/// Keys outside [`FilterField`] are dropped, which includes `deleted`:
/// tombstoned meetings are never listed.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct MeetingFilter {
    pub conditions: BTreeMap<FilterField, String>,
}

impl MeetingFilter {
    pub fn from_params(params: HashMap<String, String>) -> Self {
        let mut conditions = BTreeMap::new();

        for (key, value) in params {
            match FilterField::from_param(&key) {
                Some(field) if field.is_user_ref() => {
                    conditions.insert(field, thing_key(&user_thing(&value)));
                }
                Some(field) => {
                    conditions.insert(field, value);
                }
                None => debug!("ignoring unknown meeting filter {:?}", key),
            }
        }

        Self { conditions }
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }
}
