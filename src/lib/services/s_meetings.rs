use std::collections::HashMap;

use chrono::Utc;
use itertools::Itertools;
use serde_json::Value;
use surrealdb::sql::Thing;
use tracing::{debug, info, instrument};
use ulid::Ulid;

use crate::db::meetings_db::MeetingsDB;
use crate::errors::{MeetingError, INVALID_BULK_PAYLOAD};
use crate::models::filter::MeetingFilter;
use crate::models::meeting::{
    CreateMeetingRequest, Meeting, MeetingPatch, MeetingRecord, SoftDeleteArgs,
    SoftDeleteManyArgs, UpdateMeetingArgs,
};
use crate::models::user::UserSummary;
use crate::repos::{r_meetings::MeetingsRepo, r_users::UsersRepo};
use crate::utils::{meeting_thing, meeting_thing_from_str};

#[instrument(skip(db))]
pub async fn get_meetings(db: &MeetingsDB, filter: MeetingFilter) -> Result<Vec<Meeting>, MeetingError> {
    let records = MeetingsRepo::new(db.clone()).select_meetings(&filter).await?;
    debug!("s: {} meetings matched", records.len());

    resolve_meetings(db, records).await
}

#[instrument(skip(db))]
pub async fn create_meeting(
    db: &MeetingsDB,
    request: CreateMeetingRequest,
) -> Result<Meeting, MeetingError> {
    let args = request.into_insert_args(Utc::now())?;
    let record = MeetingsRepo::new(db.clone()).insert_meeting(args).await?;
    info!("s: created meeting {}", record.id);

    resolve_meeting(db, record).await
}

#[instrument(skip(db))]
pub async fn get_meeting(db: &MeetingsDB, meeting_id: &Ulid) -> Result<Meeting, MeetingError> {
    let record = select_live_meeting(db, meeting_id).await?;

    resolve_meeting(db, record).await
}

#[instrument(skip(db))]
pub async fn update_meeting(
    db: &MeetingsDB,
    meeting_id: &Ulid,
    patch: MeetingPatch,
) -> Result<Meeting, MeetingError> {
    patch.validate()?;

    let mut record = select_live_meeting(db, meeting_id).await?;
    patch.apply_to(&mut record, Utc::now());

    let updated = MeetingsRepo::new(db.clone())
        .update_meeting(UpdateMeetingArgs::from(&record))
        .await?
        .ok_or(MeetingError::NotFound)?;

    resolve_meeting(db, updated).await
}

#[instrument(skip(db))]
pub async fn delete_meeting(db: &MeetingsDB, meeting_id: &Ulid) -> Result<(), MeetingError> {
    let record = select_live_meeting(db, meeting_id).await?;

    MeetingsRepo::new(db.clone())
        .soft_delete_meeting(SoftDeleteArgs {
            id: record.id,
            updated_at: Utc::now(),
        })
        .await
}

/// Tombstones every live meeting named in `ids`; unknown ids are skipped.
#[instrument(skip(db))]
pub async fn delete_meetings(db: &MeetingsDB, ids: Vec<Thing>) -> Result<usize, MeetingError> {
    let count = MeetingsRepo::new(db.clone())
        .soft_delete_meetings(SoftDeleteManyArgs {
            ids,
            updated_at: Utc::now(),
        })
        .await?;
    info!("s: soft deleted {} meetings", count);

    Ok(count)
}

/// Reads a bulk-delete body. It must be a non-empty array; entries that are
/// not meeting ids are dropped rather than rejected.
pub fn meeting_ids_from_payload(payload: &Value) -> Result<Vec<Thing>, MeetingError> {
    let ids = payload
        .as_array()
        .filter(|ids| !ids.is_empty())
        .ok_or_else(|| MeetingError::validation(INVALID_BULK_PAYLOAD))?;

    Ok(ids
        .iter()
        .filter_map(Value::as_str)
        .filter_map(meeting_thing_from_str)
        .unique()
        .collect())
}

async fn select_live_meeting(db: &MeetingsDB, meeting_id: &Ulid) -> Result<MeetingRecord, MeetingError> {
    MeetingsRepo::new(db.clone())
        .select_meeting(meeting_thing(meeting_id))
        .await?
        .ok_or(MeetingError::NotFound)
}

async fn resolve_meeting(db: &MeetingsDB, record: MeetingRecord) -> Result<Meeting, MeetingError> {
    resolve_meetings(db, vec![record])
        .await?
        .pop()
        .ok_or_else(|| MeetingError::Internal(String::from("Meeting lost while resolving users")))
}

/// Swaps user references for user summaries with a single lookup.
async fn resolve_meetings(
    db: &MeetingsDB,
    records: Vec<MeetingRecord>,
) -> Result<Vec<Meeting>, MeetingError> {
    let user_ids = records
        .iter()
        .flat_map(MeetingRecord::user_refs)
        .unique()
        .cloned()
        .collect::<Vec<Thing>>();

    let users = UsersRepo::new(db.clone())
        .select_users(user_ids)
        .await?
        .into_iter()
        .map(|user| (user.id.clone(), UserSummary::from(user)))
        .collect::<HashMap<Thing, UserSummary>>();

    Ok(records
        .into_iter()
        .map(|record| Meeting::resolve(record, &users))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::SurrealDBConnection;
    use crate::errors::INVALID_TIME_ORDER;
    use crate::models::filter::FilterField;
    use crate::models::meeting::{MeetingStatus, MeetingType, SelectMeetingArgs};
    use crate::utils::thing_key;
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::str::FromStr;
    use std::time::Duration;

    async fn seeded_db() -> MeetingsDB {
        let db = MeetingsDB::connect(&SurrealDBConnection::in_memory())
            .await
            .expect("in-memory store should start");

        db.execute(
            r#"
                CREATE user:alice SET first_name = 'Alice', last_name = 'Archer', username = 'aarcher', email = 'alice@example.com';
                CREATE user:bob SET first_name = 'Bob', last_name = 'Stone', username = 'bstone';
            "#,
        )
        .await
        .expect("users should seed");

        db
    }

    fn request(body: Value) -> CreateMeetingRequest {
        serde_json::from_value(body).expect("request should deserialize")
    }

    fn kickoff() -> CreateMeetingRequest {
        request(json!({
            "title": "Kickoff",
            "description": "Scope and timeline",
            "startTime": "2024-03-01T09:00:00Z",
            "endTime": "2024-03-01T10:00:00Z",
            "location": "Room 4",
            "meetingType": "virtual",
            "meetingLink": "https://meet.example.com/kickoff",
            "participants": ["bob"],
            "organizer": "alice",
        }))
    }

    fn ulid_of(meeting: &Meeting) -> Ulid {
        Ulid::from_str(&meeting.id).expect("meeting ids are ULIDs")
    }

    async fn raw_record(db: &MeetingsDB, meeting: &Meeting) -> MeetingRecord {
        db.query_single_with_args(
            "SELECT * FROM $id",
            SelectMeetingArgs {
                id: meeting_thing(&ulid_of(meeting)),
            },
        )
        .await
        .expect("select should succeed")
        .expect("record should still be stored")
    }

    #[tokio::test]
    async fn test_create_then_get_round_trip() {
        let db = seeded_db().await;

        let created = create_meeting(&db, kickoff()).await.unwrap();
        let fetched = get_meeting(&db, &ulid_of(&created)).await.unwrap();

        assert_eq!(created, fetched);
        assert_eq!(fetched.title, "Kickoff");
        assert_eq!(fetched.meeting_type, MeetingType::Virtual);
        assert_eq!(fetched.status, MeetingStatus::Scheduled);
        assert!(!fetched.deleted);
        assert_eq!(fetched.created_at, fetched.updated_at);

        let organizer = fetched.organizer.expect("alice exists");
        assert_eq!(organizer.id, "alice");
        assert_eq!(organizer.first_name.as_deref(), Some("Alice"));
        assert_eq!(organizer.username.as_deref(), Some("aarcher"));
        assert_eq!(fetched.participants.len(), 1);
        assert_eq!(fetched.participants[0].last_name.as_deref(), Some("Stone"));
    }

    #[tokio::test]
    async fn test_create_rejects_reversed_times() {
        let db = seeded_db().await;

        let result = create_meeting(
            &db,
            request(json!({
                "title": "Backwards",
                "startTime": "2024-01-02T10:00Z",
                "endTime": "2024-01-01T10:00Z",
                "organizer": "alice",
            })),
        )
        .await;

        assert!(matches!(result, Err(MeetingError::Validation(ref m)) if m == INVALID_TIME_ORDER));
        assert!(get_meetings(&db, MeetingFilter::default()).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_excludes_deleted_and_sorts_newest_first() {
        let db = seeded_db().await;

        let first = create_meeting(&db, kickoff()).await.unwrap();
        let second = create_meeting(&db, kickoff()).await.unwrap();
        let third = create_meeting(&db, kickoff()).await.unwrap();
        delete_meeting(&db, &ulid_of(&second)).await.unwrap();

        let listed = get_meetings(&db, MeetingFilter::default()).await.unwrap();

        let ids: Vec<&str> = listed.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, vec![third.id.as_str(), first.id.as_str()]);
        assert!(listed.iter().all(|m| !m.deleted));
    }

    #[tokio::test]
    async fn test_list_applies_filters() {
        let db = seeded_db().await;

        let kickoff = create_meeting(&db, kickoff()).await.unwrap();
        let solo = create_meeting(
            &db,
            request(json!({
                "title": "Focus time",
                "startTime": "2024-03-02T09:00:00Z",
                "endTime": "2024-03-02T11:00:00Z",
                "organizer": "bob",
            })),
        )
        .await
        .unwrap();

        let by_status_and_type = MeetingFilter {
            conditions: BTreeMap::from([
                (FilterField::Status, String::from("scheduled")),
                (FilterField::MeetingType, String::from("in-person")),
            ]),
        };
        let listed = get_meetings(&db, by_status_and_type).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, solo.id);

        let by_participant = MeetingFilter {
            conditions: BTreeMap::from([(FilterField::Participants, String::from("bob"))]),
        };
        let listed = get_meetings(&db, by_participant).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, kickoff.id);

        let by_organizer = MeetingFilter {
            conditions: BTreeMap::from([(FilterField::Organizer, String::from("bob"))]),
        };
        let listed = get_meetings(&db, by_organizer).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].title, "Focus time");
    }

    #[tokio::test]
    async fn test_soft_delete_hides_but_keeps_record() {
        let db = seeded_db().await;
        let meeting = create_meeting(&db, kickoff()).await.unwrap();
        let id = ulid_of(&meeting);

        delete_meeting(&db, &id).await.unwrap();

        assert!(matches!(get_meeting(&db, &id).await, Err(MeetingError::NotFound)));
        assert!(matches!(delete_meeting(&db, &id).await, Err(MeetingError::NotFound)));

        let stored = raw_record(&db, &meeting).await;
        assert!(stored.deleted);
        assert!(stored.updated_at > meeting.updated_at);
    }

    #[tokio::test]
    async fn test_update_and_delete_unknown_meeting() {
        let db = seeded_db().await;
        let missing = Ulid::new();

        assert!(matches!(
            update_meeting(&db, &missing, MeetingPatch::default()).await,
            Err(MeetingError::NotFound)
        ));
        assert!(matches!(delete_meeting(&db, &missing).await, Err(MeetingError::NotFound)));
    }

    #[tokio::test]
    async fn test_update_skips_deleted_meeting() {
        let db = seeded_db().await;
        let meeting = create_meeting(&db, kickoff()).await.unwrap();
        let id = ulid_of(&meeting);
        delete_meeting(&db, &id).await.unwrap();

        let patch: MeetingPatch = serde_json::from_value(json!({ "title": "Revived" })).unwrap();

        assert!(matches!(update_meeting(&db, &id, patch).await, Err(MeetingError::NotFound)));
        assert_eq!(raw_record(&db, &meeting).await.title, "Kickoff");
    }

    #[tokio::test]
    async fn test_bulk_delete_skips_missing_ids() {
        let db = seeded_db().await;
        let a = create_meeting(&db, kickoff()).await.unwrap();
        let c = create_meeting(&db, kickoff()).await.unwrap();
        let keep = create_meeting(&db, kickoff()).await.unwrap();

        let payload = json!([a.id, Ulid::new().to_string(), c.id]);
        let ids = meeting_ids_from_payload(&payload).unwrap();
        let count = delete_meetings(&db, ids).await.unwrap();

        assert_eq!(count, 2);
        let listed = get_meetings(&db, MeetingFilter::default()).await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].id, keep.id);
        assert!(raw_record(&db, &a).await.deleted);
        assert!(raw_record(&db, &c).await.deleted);
    }

    #[tokio::test]
    async fn test_bulk_delete_ignores_already_deleted() {
        let db = seeded_db().await;
        let a = create_meeting(&db, kickoff()).await.unwrap();
        delete_meeting(&db, &ulid_of(&a)).await.unwrap();

        let ids = meeting_ids_from_payload(&json!([a.id])).unwrap();

        assert_eq!(delete_meetings(&db, ids).await.unwrap(), 0);
    }

    #[test]
    fn test_meeting_ids_from_payload() {
        let ulid = Ulid::new();

        let ids = meeting_ids_from_payload(&json!([ulid.to_string(), "nope", 42, ulid.to_string()])).unwrap();
        assert_eq!(ids, vec![meeting_thing(&ulid)]);

        for bad in [json!([]), json!({ "ids": [] }), json!("abc"), Value::Null] {
            let err = meeting_ids_from_payload(&bad).unwrap_err();
            assert_eq!(err.to_string(), INVALID_BULK_PAYLOAD);
        }
    }

    #[tokio::test]
    async fn test_update_status_only() {
        let db = seeded_db().await;
        let meeting = create_meeting(&db, kickoff()).await.unwrap();
        tokio::time::sleep(Duration::from_millis(5)).await;

        let patch: MeetingPatch = serde_json::from_value(json!({ "status": "completed" })).unwrap();
        let updated = update_meeting(&db, &ulid_of(&meeting), patch).await.unwrap();

        assert_eq!(updated.status, MeetingStatus::Completed);
        assert!(updated.updated_at > meeting.updated_at);

        let mut expected = meeting.clone();
        expected.status = MeetingStatus::Completed;
        expected.updated_at = updated.updated_at;
        assert_eq!(updated, expected);
        assert_eq!(get_meeting(&db, &ulid_of(&meeting)).await.unwrap(), expected);
    }

    #[tokio::test]
    async fn test_update_single_end_skips_time_order_check() {
        let db = seeded_db().await;
        let meeting = create_meeting(&db, kickoff()).await.unwrap();

        let patch: MeetingPatch =
            serde_json::from_value(json!({ "startTime": "2024-03-01T12:00:00Z" })).unwrap();
        let updated = update_meeting(&db, &ulid_of(&meeting), patch).await.unwrap();

        assert!(updated.start_time > updated.end_time);

        let both: MeetingPatch = serde_json::from_value(json!({
            "startTime": "2024-03-01T12:00:00Z",
            "endTime": "2024-03-01T11:00:00Z",
        }))
        .unwrap();
        assert!(matches!(
            update_meeting(&db, &ulid_of(&meeting), both).await,
            Err(MeetingError::Validation(_))
        ));
    }

    #[tokio::test]
    async fn test_update_clears_and_replaces_fields() {
        let db = seeded_db().await;
        let meeting = create_meeting(&db, kickoff()).await.unwrap();

        let patch: MeetingPatch = serde_json::from_value(json!({
            "meetingLink": null,
            "meetingType": "in-person",
            "location": "",
            "participants": ["alice", "bob"],
        }))
        .unwrap();
        let updated = update_meeting(&db, &ulid_of(&meeting), patch).await.unwrap();

        assert_eq!(updated.meeting_link, None);
        assert_eq!(updated.meeting_type, MeetingType::InPerson);
        assert_eq!(updated.location.as_deref(), Some(""));
        assert_eq!(updated.description, meeting.description);
        let names: Vec<&str> = updated.participants.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(names, vec!["alice", "bob"]);
    }

    #[tokio::test]
    async fn test_dangling_users_resolve_as_absent() {
        let db = seeded_db().await;

        let meeting = create_meeting(
            &db,
            request(json!({
                "title": "Ghost hour",
                "startTime": "2024-03-01T09:00:00Z",
                "endTime": "2024-03-01T10:00:00Z",
                "participants": ["bob", "casper"],
                "organizer": "nobody",
            })),
        )
        .await
        .unwrap();

        assert_eq!(meeting.organizer, None);
        assert_eq!(meeting.participants.len(), 1);
        assert_eq!(meeting.participants[0].id, "bob");

        let stored = raw_record(&db, &meeting).await;
        assert_eq!(thing_key(&stored.organizer), "nobody");
        assert_eq!(stored.participants.len(), 2);
    }
}
