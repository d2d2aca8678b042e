//! Scored backend served over HTTP by a local model server.
//!
//! Request: `POST {endpoint}` with `{"message": ..., "history": [{user, assistant}]}`.
//! Response: `{"text": ..., "confidence": ...}`.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};

use solace_chat::{BackendError, ScoredGenerator};
use solace_core::types::HistoryEntry;

use crate::http::{build_client, check_status, request_error};

/// Cleaned replies shorter than this (chars) are discarded.
const MIN_REPLY_CHARS: usize = 10;

#[derive(Debug, Serialize)]
struct ScoreRequest<'a> {
    message: &'a str,
    history: &'a [HistoryEntry],
}

#[derive(Debug, Deserialize)]
struct ScoreResponse {
    text: String,
    confidence: f64,
}

#[derive(Debug, Clone)]
pub struct HttpScoredModel {
    client: Client,
    endpoint: String,
}

impl HttpScoredModel {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, BackendError> {
        Ok(Self {
            client: build_client()?,
            endpoint: endpoint.into(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }
}

#[async_trait]
impl ScoredGenerator for HttpScoredModel {
    fn name(&self) -> &str {
        "scored-http"
    }

    async fn generate(
        &self,
        message: &str,
        history: &[HistoryEntry],
    ) -> Result<(String, f64), BackendError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(&ScoreRequest { message, history })
            .send()
            .await
            .map_err(request_error)?;

        let parsed: ScoreResponse = check_status(response)
            .await?
            .json()
            .await
            .map_err(|e| BackendError::InvalidResponse(e.to_string()))?;

        let confidence = if parsed.confidence.is_nan() {
            0.0
        } else {
            parsed.confidence.clamp(0.0, 1.0)
        };
        Ok((clean_response(&parsed.text), confidence))
    }
}

/// Tidy a raw model reply.
///
/// Trims whitespace. A reply not ending in `.`, `!` or `?` is cut after its
/// last sentence boundary when that boundary lies past the midpoint. Results
/// shorter than 10 characters become empty.
pub fn clean_response(raw: &str) -> String {
    let mut text = raw.trim();

    if let Some(last) = text.chars().last() {
        if !matches!(last, '.' | '!' | '?') {
            if let Some(boundary) = text.rfind(&['.', '!', '?'][..]) {
                if boundary > text.len() / 2 {
                    text = &text[..boundary + 1];
                }
            }
        }
    }

    if text.chars().count() < MIN_REPLY_CHARS {
        return String::new();
    }
    text.to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_clean_keeps_complete_sentence() {
        assert_eq!(
            clean_response("  That sounds really hard.  "),
            "That sounds really hard."
        );
    }

    #[test]
    fn test_clean_cuts_trailing_fragment() {
        assert_eq!(
            clean_response("That sounds hard. What helps you cope when it"),
            "That sounds hard. What helps you cope when it"
        );
        assert_eq!(
            clean_response("I hear you. That sounds really hard to carry. And"),
            "I hear you. That sounds really hard to carry."
        );
    }

    #[test]
    fn test_clean_keeps_text_without_boundary() {
        assert_eq!(
            clean_response("no punctuation anywhere here"),
            "no punctuation anywhere here"
        );
    }

    #[test]
    fn test_clean_short_reply_is_empty() {
        assert_eq!(clean_response("Ok."), "");
        assert_eq!(clean_response("   "), "");
        assert_eq!(clean_response(""), "");
    }

    #[test]
    fn test_clean_exactly_ten_chars_survives() {
        assert_eq!(clean_response("Breathe in"), "Breathe in");
    }
}
