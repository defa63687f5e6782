use meetings_lib::db::meetings_db::MeetingsDB;

/// Shared by every handler through axum router state.
#[derive(Clone)]
pub struct AppState {
    pub db: MeetingsDB,
}
