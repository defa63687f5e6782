use reqwest::{Client, RequestBuilder, StatusCode};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;
use tracing::{instrument, trace};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    /// The server answered with a non-2xx status; `body` is passed through as sent.
    #[error("meeting request failed with status {status}")]
    Status { status: StatusCode, body: Value },
}

/// Forwards the six meeting operations to the REST API.
///
/// Every call returns the response body untouched. There are no retries and
/// no caching.
#[derive(Debug, Clone)]
pub struct MeetingClient {
    http: Client,
    base_url: String,
}

impl MeetingClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self::with_client(Client::new(), base_url)
    }

    pub fn with_client(http: Client, base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self { http, base_url }
    }

    #[instrument(skip(self, params))]
    pub async fn get_all_meetings<P: Serialize + ?Sized>(&self, params: &P) -> Result<Value, ClientError> {
        self.send(self.http.get(self.url("")).query(params)).await
    }

    #[instrument(skip(self))]
    pub async fn get_meeting(&self, id: &str) -> Result<Value, ClientError> {
        self.send(self.http.get(self.url(id))).await
    }

    #[instrument(skip(self, body))]
    pub async fn create_meeting<B: Serialize + ?Sized>(&self, body: &B) -> Result<Value, ClientError> {
        self.send(self.http.post(self.url("")).json(body)).await
    }

    #[instrument(skip(self, body))]
    pub async fn update_meeting<B: Serialize + ?Sized>(
        &self,
        id: &str,
        body: &B,
    ) -> Result<Value, ClientError> {
        self.send(self.http.put(self.url(id)).json(body)).await
    }

    #[instrument(skip(self))]
    pub async fn delete_meeting(&self, id: &str) -> Result<Value, ClientError> {
        self.send(self.http.delete(self.url(id))).await
    }

    #[instrument(skip(self))]
    pub async fn delete_many_meetings(&self, ids: &[String]) -> Result<Value, ClientError> {
        self.send(self.http.delete(self.url("")).json(ids)).await
    }

    fn url(&self, id: &str) -> String {
        if id.is_empty() {
            format!("{}/meeting", self.base_url)
        } else {
            format!("{}/meeting/{}", self.base_url, id)
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ClientError> {
        let response = request.send().await?;
        let status = response.status();
        let bytes = response.bytes().await?;
        trace!("c: {} with {} bytes", status, bytes.len());

        let body = serde_json::from_slice(&bytes)
            .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into_owned()));

        if status.is_success() {
            Ok(body)
        } else {
            Err(ClientError::Status { status, body })
        }
    }
}
