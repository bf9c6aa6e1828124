//! REST collaborator over HTTP.
//!
//! `GET {base}/api/rooms/{id}` and `GET {base}/api/rooms/{id}/messages`, both
//! with the session's bearer credential.

use std::time::Duration;

use parley_core::{FetchError, Message, Room, RoomId};
use parley_proto::{MessagesEnvelope, RoomEnvelope, describe_error_payload};
use reqwest::{Client, Url};

use crate::{Credential, HttpError, RoomApi};

/// Connect timeout in seconds.
const CONNECT_TIMEOUT_SECS: u64 = 10;

/// Total timeout in seconds.
const TOTAL_TIMEOUT_SECS: u64 = 30;

/// HTTP collaborator settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpConfig {
    /// Server origin, e.g. `https://chat.example.com`.
    pub base_url: String,
    /// Delay before every request. Zero outside demos.
    pub fetch_delay: Duration,
}

/// [`RoomApi`] backed by the REST endpoints.
#[derive(Debug, Clone)]
pub struct HttpRoomApi {
    client: Client,
    base: Url,
    fetch_delay: Duration,
}

impl HttpRoomApi {
    /// Build a client for `config`.
    ///
    /// # Errors
    ///
    /// - `HttpError::InvalidBaseUrl` if the base URL does not parse
    /// - `HttpError::Client` if the HTTP client cannot be built
    pub fn new(config: &HttpConfig) -> Result<Self, HttpError> {
        let base = Url::parse(&config.base_url).map_err(|e| HttpError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason: e.to_string(),
        })?;

        let client = Client::builder()
            .connect_timeout(Duration::from_secs(CONNECT_TIMEOUT_SECS))
            .timeout(Duration::from_secs(TOTAL_TIMEOUT_SECS))
            .build()
            .map_err(|e| HttpError::Client(e.to_string()))?;

        Ok(Self { client, base, fetch_delay: config.fetch_delay })
    }

    fn url(&self, path: &str) -> Result<Url, FetchError> {
        self.base.join(path).map_err(|e| FetchError::Network(e.to_string()))
    }

    async fn get(&self, credential: &Credential, url: Url) -> Result<Vec<u8>, FetchError> {
        if !self.fetch_delay.is_zero() {
            tokio::time::sleep(self.fetch_delay).await;
        }

        let response = self
            .client
            .get(url)
            .bearer_auth(credential.expose())
            .send()
            .await
            .map_err(|e| FetchError::Network(e.to_string()))?;

        let status = response.status();
        let body = response.bytes().await.map_err(|e| FetchError::Network(e.to_string()))?;

        if !status.is_success() {
            let message = serde_json::from_slice::<serde_json::Value>(&body)
                .map(|payload| describe_error_payload(&payload))
                .unwrap_or_else(|_| status.canonical_reason().unwrap_or("request failed").into());
            return Err(FetchError::Http { status: status.as_u16(), message });
        }

        Ok(body.to_vec())
    }
}

impl RoomApi for HttpRoomApi {
    async fn fetch_room(&self, credential: &Credential, room_id: &RoomId) -> Result<Room, FetchError> {
        let url = self.url(&format!("api/rooms/{room_id}"))?;
        let body = self.get(credential, url).await?;
        Ok(RoomEnvelope::from_json(&body)?.room)
    }

    async fn fetch_history(
        &self,
        credential: &Credential,
        room_id: &RoomId,
    ) -> Result<Vec<Message>, FetchError> {
        let url = self.url(&format!("api/rooms/{room_id}/messages"))?;
        let body = self.get(credential, url).await?;
        Ok(MessagesEnvelope::from_json(&body)?.messages)
    }
}
