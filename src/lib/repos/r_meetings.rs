use std::collections::BTreeMap;

use surrealdb::sql::Thing;
use tracing::{debug, instrument};

use crate::db::meetings_db::MeetingsDB;
use crate::errors::MeetingError;
use crate::models::filter::{FilterField, MeetingFilter};
use crate::models::meeting::{
    IdContainer, InsertMeetingArgs, MeetingRecord, SelectMeetingArgs, SoftDeleteArgs,
    SoftDeleteManyArgs, UpdateMeetingArgs,
};
use crate::utils::USER_TABLE;

pub struct MeetingsRepo {
    db: MeetingsDB,
}

impl MeetingsRepo {
    pub fn new(db: MeetingsDB) -> Self {
        Self { db }
    }

    #[instrument(skip(self))]
    pub async fn insert_meeting(&self, args: InsertMeetingArgs) -> Result<MeetingRecord, MeetingError> {
        let created = self
            .db
            .query_single_with_args::<MeetingRecord, InsertMeetingArgs>(
                r#"
                    CREATE
                        meeting:ulid()
                    SET
                        title = $title,
                        description = $description,
                        start_time = <datetime> $start_time,
                        end_time = <datetime> $end_time,
                        location = $location,
                        meeting_type = $meeting_type,
                        meeting_link = $meeting_link,
                        participants = $participants,
                        organizer = $organizer,
                        status = $status,
                        deleted = false,
                        created_at = <datetime> $now,
                        updated_at = <datetime> $now
                "#,
                args,
            )
            .await?;

        created.ok_or_else(|| MeetingError::Internal(String::from("No meeting returned from create")))
    }

    /// Live meetings only, newest first.
    #[instrument(skip(self))]
    pub async fn select_meetings(
        &self,
        filter: &MeetingFilter,
    ) -> Result<Vec<MeetingRecord>, MeetingError> {
        let (conditions, bindings) = filter_conditions(filter);
        let query = format!(
            "SELECT * FROM meeting WHERE deleted = false{conditions} ORDER BY created_at DESC"
        );
        debug!("r: select meetings - {}", query);

        Ok(self.db.query_many_with_args(&query, bindings).await?)
    }

    /// A live meeting by id; tombstoned meetings read as absent.
    #[instrument(skip(self))]
    pub async fn select_meeting(&self, id: Thing) -> Result<Option<MeetingRecord>, MeetingError> {
        Ok(self
            .db
            .query_single_with_args(
                "SELECT * FROM $id WHERE deleted = false",
                SelectMeetingArgs { id },
            )
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn update_meeting(
        &self,
        args: UpdateMeetingArgs,
    ) -> Result<Option<MeetingRecord>, MeetingError> {
        Ok(self
            .db
            .query_single_with_args(
                r#"
                    UPDATE
                        $id
                    SET
                        title = $title,
                        description = $description,
                        start_time = <datetime> $start_time,
                        end_time = <datetime> $end_time,
                        location = $location,
                        meeting_type = $meeting_type,
                        meeting_link = $meeting_link,
                        participants = $participants,
                        status = $status,
                        updated_at = <datetime> $updated_at
                    RETURN AFTER
                "#,
                args,
            )
            .await?)
    }

    #[instrument(skip(self))]
    pub async fn soft_delete_meeting(&self, args: SoftDeleteArgs) -> Result<(), MeetingError> {
        Ok(self
            .db
            .query_none_with_args(
                "UPDATE $id SET deleted = true, updated_at = <datetime> $updated_at RETURN NONE",
                args,
            )
            .await?)
    }

    /// Tombstones every live meeting in `ids` and returns how many were hit.
    #[instrument(skip(self))]
    pub async fn soft_delete_meetings(&self, args: SoftDeleteManyArgs) -> Result<usize, MeetingError> {
        let deleted: Vec<IdContainer> = self
            .db
            .query_many_with_args(
                r#"
                    UPDATE
                        meeting
                    SET
                        deleted = true,
                        updated_at = <datetime> $updated_at
                    WHERE
                        id INSIDE $ids AND deleted = false
                    RETURN id
                "#,
                args,
            )
            .await?;

        Ok(deleted.len())
    }
}

/// Renders filter conditions as SurrealQL with every value bound as a parameter.
fn filter_conditions(filter: &MeetingFilter) -> (String, BTreeMap<String, String>) {
    let mut conditions = String::new();
    let mut bindings = BTreeMap::new();

    for (field, value) in &filter.conditions {
        let column = field.column();
        let param = format!("f_{column}");

        let condition = match field {
            FilterField::Organizer => {
                format!(" AND {column} = type::thing('{USER_TABLE}', ${param})")
            }
            FilterField::Participants => {
                format!(" AND {column} CONTAINS type::thing('{USER_TABLE}', ${param})")
            }
            _ => format!(" AND {column} = ${param}"),
        };

        conditions.push_str(&condition);
        bindings.insert(param, value.clone());
    }

    (conditions, bindings)
}
