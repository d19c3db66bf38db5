//! HTTP plumbing shared by the registry providers.

use crate::error::{RegistryError, Result};
use reqwest::{Client, Response, StatusCode};
use serde_json::Value;
use std::time::Duration;

/// Build an HTTP client with the configured request timeout.
///
/// # Errors
/// Returns error if the HTTP client cannot be created.
pub fn build_http_client(timeout_secs: u64) -> Result<Client> {
    Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| RegistryError::Internal(format!("failed to create HTTP client: {e}")))
}

/// Map the response status to a typed error, or parse the JSON body.
pub async fn read_json(provider: &str, identifier: &str, response: Response) -> Result<Value> {
    let status = response.status();
    if !status.is_success() {
        let message = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(status_error(provider, identifier, status, message));
    }

    response.json().await.map_err(|e| RegistryError::ParseError {
        provider: provider.to_string(),
        message: format!("Failed to parse response: {e}"),
    })
}

fn status_error(provider: &str, identifier: &str, status: StatusCode, message: String) -> RegistryError {
    match status {
        StatusCode::NOT_FOUND => RegistryError::NotFound {
            provider: provider.to_string(),
            identifier: identifier.to_string(),
        },
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => RegistryError::AuthenticationFailed {
            provider: provider.to_string(),
            message,
        },
        StatusCode::TOO_MANY_REQUESTS => RegistryError::RateLimited {
            provider: provider.to_string(),
        },
        _ => RegistryError::ApiError {
            provider: provider.to_string(),
            status: status.as_u16(),
            message,
        },
    }
}

/// Read a string at a JSON pointer, accepting numbers as well.
///
/// Blank strings and nulls come back as `None`.
#[must_use]
pub fn string_at(value: &Value, pointer: &str) -> Option<String> {
    match value.pointer(pointer)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}
