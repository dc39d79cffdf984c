//! HTTP client for the marketplace backend.
//!
//! [`ApiClient`] owns the connection pool and the base URL. Endpoint methods
//! live next to the backend app they talk to ([`users`], [`inventory`],
//! [`sales`], [`notify`]); records pass through [`crate::ingest`] on the way in.

mod macros;

pub mod inventory;
pub mod notify;
pub mod sales;
pub mod users;

use std::time::Duration;

use reqwest::{Client, RequestBuilder, Url};
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::config::AppConfig;
use crate::error::{ApiError, GENERIC_FAILURE};
use crate::ingest::{decode_many, decode_one, Record};

#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base: Url,
}

impl ApiClient {
    pub fn new(base: Url, timeout: Duration) -> Result<Self, ApiError> {
        let http = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ApiError::Transport(e.to_string()))?;
        Ok(Self { http, base })
    }

    pub fn from_config(config: &AppConfig) -> Result<Self, ApiError> {
        Self::new(config.api_url.clone(), config.http_timeout)
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    fn url(&self, path: &str) -> Result<Url, ApiError> {
        self.base
            .join(path)
            .map_err(|e| ApiError::InvalidRequest(format!("{path}: {e}")))
    }

    async fn send(&self, request: RequestBuilder) -> Result<Value, ApiError> {
        let response = request.send().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let status = response.status();
        let bytes = response.bytes().await.map_err(|e| ApiError::Transport(e.to_string()))?;
        let body = if bytes.is_empty() {
            None
        } else {
            serde_json::from_slice::<Value>(&bytes).ok()
        };

        if !status.is_success() {
            let message = extract_message(body.as_ref());
            debug!(status = status.as_u16(), message = %message, "Backend rejected request");
            return Err(ApiError::Server { status: status.as_u16(), message });
        }
        match body {
            Some(value) => Ok(value),
            None if bytes.is_empty() => Ok(Value::Null),
            None => Err(ApiError::Decode(format!("non-JSON body with status {status}"))),
        }
    }

    pub(crate) async fn get_json(&self, path: &str) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        self.send(self.http.get(url)).await
    }

    pub(crate) async fn post_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        self.send(self.http.post(url).json(body)).await
    }

    pub(crate) async fn put_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        self.send(self.http.put(url).json(body)).await
    }

    pub(crate) async fn patch_json<B: Serialize + ?Sized>(&self, path: &str, body: &B) -> Result<Value, ApiError> {
        let url = self.url(path)?;
        self.send(self.http.patch(url).json(body)).await
    }

    /// List endpoints answer 404 when there is nothing to list.
    pub(crate) async fn get_list<T: Record>(&self, path: &str) -> Result<Vec<T>, ApiError> {
        match self.get_json(path).await {
            Ok(value) => decode_many(value),
            Err(e) if e.is_not_found() => {
                debug!(kind = T::KIND, path, "Empty list");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    pub(crate) async fn get_one<T: Record>(&self, path: &str) -> Result<T, ApiError> {
        decode_one(self.get_json(path).await?)
    }
}

/// The message to show for a failed request: the first value in the error
/// object (first element if it is a list). Falls back to a generic line.
pub fn extract_message(body: Option<&Value>) -> String {
    let first = match body {
        Some(Value::Object(fields)) => fields.values().next(),
        Some(value @ Value::String(_)) => Some(value),
        _ => None,
    };
    let first = match first {
        Some(Value::Array(values)) => values.first(),
        other => other,
    };
    match first {
        Some(Value::String(text)) if !text.trim().is_empty() => text.clone(),
        Some(Value::Null) | Some(Value::String(_)) | None => {
            if body.is_some() {
                warn!("Error body carried no readable message");
            }
            GENERIC_FAILURE.to_string()
        }
        Some(other) => other.to_string(),
    }
}
