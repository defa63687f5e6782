use std::collections::{BTreeMap, BTreeSet};

use serde_json::Value;
use tracing::{debug, instrument};

use super::meeting_service::{ClientError, MeetingClient};
use crate::utils::parse_timestamp;

const UNKNOWN_ORGANIZER: &str = "Unknown";
const BLANK: &str = " - ";
const DISPLAY_FORMAT: &str = "%Y-%m-%d %H:%M";

/// One line of the meetings table.
#[derive(Debug, Clone, PartialEq)]
pub struct MeetingRow {
    pub id: String,
    pub agenda: String,
    pub date_time: String,
    pub timestamp: String,
    pub created_by_name: String,
}

impl MeetingRow {
    /// Returns `None` for entries without an `_id`.
    pub fn from_meeting(meeting: &Value) -> Option<Self> {
        let id = meeting.get("_id")?.as_str()?.to_string();

        let agenda = match meeting.get("title").and_then(Value::as_str) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => String::from(BLANK),
        };

        Some(Self {
            id,
            agenda,
            date_time: display_time(meeting.get("startTime")),
            timestamp: display_time(meeting.get("createdAt")),
            created_by_name: organizer_name(meeting.get("organizer")),
        })
    }
}

fn display_time(value: Option<&Value>) -> String {
    value
        .and_then(Value::as_str)
        .and_then(parse_timestamp)
        .map(|time| time.format(DISPLAY_FORMAT).to_string())
        .unwrap_or_else(|| String::from(BLANK))
}

fn organizer_name(organizer: Option<&Value>) -> String {
    let Some(organizer) = organizer else {
        return String::from(UNKNOWN_ORGANIZER);
    };

    match organizer.get("firstName").and_then(Value::as_str) {
        Some(first) if !first.is_empty() => {
            let last = organizer
                .get("lastName")
                .and_then(Value::as_str)
                .unwrap_or_default();
            format!("{first} {last}").trim_end().to_string()
        }
        _ => String::from(UNKNOWN_ORGANIZER),
    }
}

/// Local state of the meetings admin screen.
///
/// Every successful mutation is followed by a fresh list call with the
/// current search filters, so `rows` always reflects the server.
pub struct MeetingsAdmin {
    client: MeetingClient,
    filters: BTreeMap<String, String>,
    rows: Vec<MeetingRow>,
    selected: BTreeSet<String>,
}

impl MeetingsAdmin {
    pub fn new(client: MeetingClient) -> Self {
        Self {
            client,
            filters: BTreeMap::new(),
            rows: Vec::new(),
            selected: BTreeSet::new(),
        }
    }

    pub fn rows(&self) -> &[MeetingRow] {
        &self.rows
    }

    pub fn filters(&self) -> &BTreeMap<String, String> {
        &self.filters
    }

    pub fn selected(&self) -> &BTreeSet<String> {
        &self.selected
    }

    /// Returns whether `id` is selected afterwards.
    pub fn toggle_selected(&mut self, id: &str) -> bool {
        if self.selected.remove(id) {
            false
        } else {
            self.selected.insert(id.to_string())
        }
    }

    #[instrument(skip(self))]
    pub async fn refresh(&mut self) -> Result<(), ClientError> {
        let body = self.client.get_all_meetings(&self.filters).await?;

        self.rows = body
            .get("meetings")
            .and_then(Value::as_array)
            .map(|meetings| meetings.iter().filter_map(MeetingRow::from_meeting).collect())
            .unwrap_or_default();

        let rows = &self.rows;
        self.selected.retain(|id| rows.iter().any(|row| &row.id == id));
        debug!("c: {} meeting rows", self.rows.len());

        Ok(())
    }

    pub async fn search(&mut self, filters: BTreeMap<String, String>) -> Result<(), ClientError> {
        self.filters = filters;
        self.refresh().await
    }

    pub async fn clear_search(&mut self) -> Result<(), ClientError> {
        self.search(BTreeMap::new()).await
    }

    pub async fn create(&mut self, meeting: &Value) -> Result<Value, ClientError> {
        let response = self.client.create_meeting(meeting).await?;
        self.refresh().await?;
        Ok(response)
    }

    pub async fn update(&mut self, id: &str, changes: &Value) -> Result<Value, ClientError> {
        let response = self.client.update_meeting(id, changes).await?;
        self.refresh().await?;
        Ok(response)
    }

    pub async fn delete(&mut self, id: &str) -> Result<Value, ClientError> {
        let response = self.client.delete_meeting(id).await?;
        self.refresh().await?;
        Ok(response)
    }

    /// Bulk-deletes the selection. Nothing is sent when the selection is empty.
    pub async fn delete_selected(&mut self) -> Result<Option<Value>, ClientError> {
        if self.selected.is_empty() {
            return Ok(None);
        }

        let ids: Vec<String> = self.selected.iter().cloned().collect();
        let response = self.client.delete_many_meetings(&ids).await?;
        self.selected.clear();
        self.refresh().await?;

        Ok(Some(response))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server, ServerGuard};
    use serde_json::json;

    fn listing() -> Value {
        json!({
            "meetings": [
                {
                    "_id": "01HQB",
                    "title": "Kickoff",
                    "startTime": "2024-03-01T09:00:00Z",
                    "createdAt": "2024-02-20T16:30:00Z",
                    "organizer": { "_id": "alice", "firstName": "Alice", "lastName": "Archer" },
                },
                {
                    "_id": "01HQA",
                    "title": "",
                    "startTime": "2024-03-02T09:00:00Z",
                    "createdAt": "2024-02-19T08:00:00Z",
                    "organizer": null,
                },
            ]
        })
    }

    async fn list_mock(server: &mut ServerGuard, hits: usize) -> mockito::Mock {
        server
            .mock("GET", "/meeting")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(listing().to_string())
            .expect(hits)
            .create_async()
            .await
    }

    #[test]
    fn test_row_formatting() {
        let rows: Vec<MeetingRow> = listing()["meetings"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(MeetingRow::from_meeting)
            .collect();

        assert_eq!(
            rows[0],
            MeetingRow {
                id: String::from("01HQB"),
                agenda: String::from("Kickoff"),
                date_time: String::from("2024-03-01 09:00"),
                timestamp: String::from("2024-02-20 16:30"),
                created_by_name: String::from("Alice Archer"),
            }
        );
        assert_eq!(rows[1].agenda, BLANK);
        assert_eq!(rows[1].created_by_name, UNKNOWN_ORGANIZER);
        assert!(MeetingRow::from_meeting(&json!({ "title": "no id" })).is_none());
    }

    #[tokio::test]
    async fn test_search_sends_filters() {
        let mut server = Server::new_async().await;
        let mock = server
            .mock("GET", "/meeting")
            .match_query(Matcher::UrlEncoded("meetingType".into(), "virtual".into()))
            .with_status(200)
            .with_body(r#"{"meetings":[]}"#)
            .create_async()
            .await;

        let mut admin = MeetingsAdmin::new(MeetingClient::new(server.url()));
        admin
            .search(BTreeMap::from([(String::from("meetingType"), String::from("virtual"))]))
            .await
            .unwrap();

        assert!(admin.rows().is_empty());
        assert_eq!(admin.filters()["meetingType"], "virtual");
        mock.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_refetches_list() {
        let mut server = Server::new_async().await;
        let list = list_mock(&mut server, 1).await;
        let delete = server
            .mock("DELETE", "/meeting/01HQB")
            .with_status(200)
            .with_body(r#"{"message":"Meeting deleted successfully"}"#)
            .create_async()
            .await;

        let mut admin = MeetingsAdmin::new(MeetingClient::new(server.url()));
        admin.delete("01HQB").await.unwrap();

        delete.assert_async().await;
        list.assert_async().await;
        assert_eq!(admin.rows().len(), 2);
    }

    #[tokio::test]
    async fn test_delete_selected_sends_ids_and_clears_selection() {
        let mut server = Server::new_async().await;
        let list = list_mock(&mut server, 2).await;
        let delete_many = server
            .mock("DELETE", "/meeting")
            .match_body(Matcher::Json(json!(["01HQA", "01HQB"])))
            .with_status(200)
            .with_body(r#"{"message":"Meetings deleted successfully","count":2}"#)
            .create_async()
            .await;

        let mut admin = MeetingsAdmin::new(MeetingClient::new(server.url()));
        admin.refresh().await.unwrap();
        assert!(admin.toggle_selected("01HQB"));
        assert!(admin.toggle_selected("01HQA"));

        let response = admin.delete_selected().await.unwrap().unwrap();

        assert_eq!(response["count"], 2);
        assert!(admin.selected().is_empty());
        delete_many.assert_async().await;
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_failed_mutation_skips_refetch() {
        let mut server = Server::new_async().await;
        let list = list_mock(&mut server, 0).await;
        server
            .mock("PUT", "/meeting/01HQB")
            .with_status(400)
            .with_body(r#"{"message":"Start time must be before end time"}"#)
            .create_async()
            .await;

        let mut admin = MeetingsAdmin::new(MeetingClient::new(server.url()));
        let err = admin
            .update("01HQB", &json!({ "startTime": "2024-03-01T11:00:00Z", "endTime": "2024-03-01T10:00:00Z" }))
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::Status { .. }));
        list.assert_async().await;
    }

    #[tokio::test]
    async fn test_delete_selected_without_selection_is_a_no_op() {
        let mut admin = MeetingsAdmin::new(MeetingClient::new("http://127.0.0.1:9"));

        assert!(admin.delete_selected().await.unwrap().is_none());
        assert!(admin.toggle_selected("01HQB"));
        assert!(!admin.toggle_selected("01HQB"));
        assert!(admin.selected().is_empty());
    }
}
