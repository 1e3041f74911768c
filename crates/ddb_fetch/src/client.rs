use std::time::Duration;

use ddb_core::document;
use reqwest::Client;
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, HeaderMap, HeaderValue, USER_AGENT};
use serde_json::Value;

use crate::error::{FetchError, body_excerpt};
use crate::id::extract_character_id;

pub const ENDPOINT_ENV: &str = "DDB2CC_CHARACTER_ENDPOINT";

/// `{id}` is replaced with the character id.
pub const DEFAULT_ENDPOINT: &str =
    "https://character-service.dndbeyond.com/character/v5/character/{id}?includeCustomItems=true";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

const BROWSER_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 \
     (KHTML, like Gecko) Chrome/120 Safari/537.36";
const ACCEPT_VALUE: &str = "application/json,text/plain,*/*";
const ACCEPT_LANGUAGE_VALUE: &str = "en-US,en;q=0.9,ko;q=0.8";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchConfig {
    pub endpoint: String,
    pub timeout: Duration,
}

impl FetchConfig {
    /// Uses `DDB2CC_CHARACTER_ENDPOINT` when set and non-empty.
    pub fn from_env() -> Self {
        let endpoint = std::env::var(ENDPOINT_ENV)
            .ok()
            .filter(|value| !value.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_ENDPOINT.to_string());
        Self {
            endpoint,
            ..Self::default()
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Templates containing `{id}` get it substituted; any other template
    /// has the id appended as a path segment.
    pub fn endpoint_for(&self, id: &str) -> String {
        if self.endpoint.contains("{id}") {
            self.endpoint.replace("{id}", id)
        } else {
            format!("{}/{id}", self.endpoint.trim_end_matches('/'))
        }
    }
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

#[derive(Debug, Clone)]
pub struct CharacterFetcher {
    client: Client,
    config: FetchConfig,
}

impl CharacterFetcher {
    pub fn new(config: FetchConfig) -> Result<Self, FetchError> {
        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static(ACCEPT_LANGUAGE_VALUE));
        let client = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()?;
        Ok(Self { client, config })
    }

    pub fn config(&self) -> &FetchConfig {
        &self.config
    }

    /// Fetches the character named by a bare id or a profile link and
    /// returns the character object with any API envelope removed.
    pub async fn fetch(&self, id_or_url: &str) -> Result<Value, FetchError> {
        let id = extract_character_id(id_or_url).ok_or(FetchError::MissingIdentifier)?;
        let url = self.config.endpoint_for(&id);
        tracing::debug!(%id, %url, "fetching character");

        let response = self.client.get(&url).send().await?;
        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let excerpt = body_excerpt(&body);
            tracing::warn!(status = status.as_u16(), %id, "character fetch failed");
            tracing::debug!(body = %excerpt, "character service response");
            return Err(FetchError::Http {
                status: status.as_u16(),
                reason: status.canonical_reason().unwrap_or("").to_string(),
                body_excerpt: excerpt,
            });
        }

        let bytes = response.bytes().await?;
        let value: Value = serde_json::from_slice(&bytes)?;
        let character = unwrap_response(value)?;
        tracing::debug!(%id, bytes = bytes.len(), "fetched character");
        Ok(character)
    }
}

/// Removes the `{ success, message, data }` envelope. An explicit
/// `success: false` is reported with the service's message.
pub fn unwrap_response(value: Value) -> Result<Value, FetchError> {
    if value.get("success").and_then(Value::as_bool) == Some(false) {
        let message = value
            .get("message")
            .and_then(Value::as_str)
            .unwrap_or("no message")
            .to_string();
        return Err(FetchError::Rejected(message));
    }
    Ok(document::unwrap_envelope(value))
}
