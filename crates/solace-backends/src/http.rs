//! Shared HTTP plumbing for the hosted backends.

use std::time::Duration;

use reqwest::{Client, Response};

use solace_chat::BackendError;

/// Connection establishment limit. Whole-call limits are applied by the engine.
const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Longest error body carried into a `BackendError`.
const MAX_ERROR_BODY: usize = 500;

pub fn build_client() -> Result<Client, BackendError> {
    Client::builder()
        .connect_timeout(CONNECT_TIMEOUT)
        .build()
        .map_err(|e| BackendError::Request(format!("failed to build HTTP client: {}", e)))
}

pub fn request_error(err: reqwest::Error) -> BackendError {
    BackendError::Request(err.to_string())
}

/// Pass successful responses through; turn anything else into `BackendError::Http`.
pub async fn check_status(response: Response) -> Result<Response, BackendError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    Err(BackendError::Http {
        status: status.as_u16(),
        message: truncate(&body, MAX_ERROR_BODY),
    })
}

/// Join a base URL and a path with exactly one slash.
pub fn join_url(base: &str, path: &str) -> String {
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
