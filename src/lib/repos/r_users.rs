use surrealdb::sql::Thing;
use tracing::instrument;

use crate::db::meetings_db::MeetingsDB;
use crate::models::user::{SelectUsersArgs, UserRecord};

/// Read-only view of the external `user` table.
pub struct UsersRepo {
    db: MeetingsDB,
}

impl UsersRepo {
    pub fn new(db: MeetingsDB) -> Self {
        Self { db }
    }

    /// Ids with no matching user are simply missing from the result.
    #[instrument(skip(self))]
    pub async fn select_users(&self, ids: Vec<Thing>) -> Result<Vec<UserRecord>, surrealdb::Error> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        self.db
            .query_many_with_args(
                "SELECT id, first_name, last_name, username FROM user WHERE id INSIDE $ids",
                SelectUsersArgs { ids },
            )
            .await
    }
}
