use super::SurrealDBConnection;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt::Debug;
use surrealdb::engine::any::{connect, Any};
use surrealdb::{opt::auth::Root, Surreal};
use tracing::{debug, info, instrument, trace};

const MEETING_SCHEMA: &str = include_str!("../../../schemas/meeting.surql");

/// Cloneable handle to the document store. Clones share one connection.
#[derive(Clone)]
pub struct MeetingsDB {
    pub surreal: Surreal<Any>,
}

impl MeetingsDB {
    #[instrument(skip(conn), fields(address = %conn.address))]
    pub async fn connect(conn: &SurrealDBConnection) -> Result<Self, surrealdb::Error> {
        let surreal = connect(conn.address.as_str()).await?;

        if let (Some(username), Some(password)) = (&conn.username, &conn.password) {
            debug!("signing in as: {:#?}", username);
            surreal
                .signin(Root {
                    username: username.as_str(),
                    password: password.as_str(),
                })
                .await?;
        }

        debug!("ns: {:#?} | db: {:#?}", &conn.namespace, &conn.database);
        surreal
            .use_ns(conn.namespace.as_str())
            .use_db(conn.database.as_str())
            .await?;

        let db = Self { surreal };
        db.apply_schema().await?;

        Ok(db)
    }

    /// `DEFINE` statements overwrite, so this is safe on every connect.
    pub async fn apply_schema(&self) -> Result<(), surrealdb::Error> {
        info!("applying meeting schema");
        self.execute(MEETING_SCHEMA).await
    }

    pub async fn execute(&self, query: &str) -> Result<(), surrealdb::Error> {
        self.surreal.query(query).await?.check()?;
        Ok(())
    }

    pub async fn query_none_with_args<A: Serialize + Debug>(
        &self,
        query: &str,
        args: A,
    ) -> Result<(), surrealdb::Error> {
        trace!("args to bind {:#?}", args);
        self.surreal.query(query).bind(args).await?.check()?;
        Ok(())
    }

    pub async fn query_single<T: DeserializeOwned>(
        &self,
        query: &str,
    ) -> Result<Option<T>, surrealdb::Error> {
        let mut response = self.surreal.query(query).await?;

        response.take(0)
    }

    pub async fn query_single_with_args<T: DeserializeOwned, A: Serialize + Debug>(
        &self,
        query: &str,
        args: A,
    ) -> Result<Option<T>, surrealdb::Error> {
        trace!("args to bind {:#?}", args);
        let mut response = self.surreal.query(query).bind(args).await?;

        response.take(0)
    }

    pub async fn query_many_with_args<T: DeserializeOwned, A: Serialize + Debug>(
        &self,
        query: &str,
        args: A,
    ) -> Result<Vec<T>, surrealdb::Error> {
        trace!("args to bind {:#?}", args);
        let mut response = self.surreal.query(query).bind(args).await?;

        response.take(0)
    }
}
