pub mod meetings_db;

use serde::Deserialize;

/// Where and how to reach the document store.
///
/// `address` uses the `engine::any` scheme, e.g. `ws://127.0.0.1:52000` or
/// `mem://` for an in-process store. Root sign-in happens only when both
/// `username` and `password` are set.
#[derive(Debug, Clone, Deserialize, PartialEq)]
#[serde(default)]
pub struct SurrealDBConnection {
    pub address: String,
    pub username: Option<String>,
    pub password: Option<String>,
    pub namespace: String,
    pub database: String,
}

impl Default for SurrealDBConnection {
    fn default() -> Self {
        Self {
            address: String::from("ws://127.0.0.1:52000"),
            username: None,
            password: None,
            namespace: String::from("crm"),
            database: String::from("crm"),
        }
    }
}

impl SurrealDBConnection {
    pub fn in_memory() -> Self {
        Self {
            address: String::from("mem://"),
            namespace: String::from("test"),
            database: String::from("test"),
            ..Self::default()
        }
    }
}
