//! Backends exercised against in-process fake servers.

use axum::http::{HeaderMap, StatusCode, Uri};
use axum::routing::post;
use axum::{Json, Router};
use serde_json::{json, Value};

use solace_backends::{GeminiBackend, HttpScoredModel, OpenAiChatBackend, OpenAiEmbeddingService};
use solace_chat::{BackendError, EmbeddingService, ScoredGenerator, TextGenerator};
use solace_core::types::{HistoryEntry, SessionContext};

/// Serve `router` on an ephemeral port and return its base URL.
async fn serve(router: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    format!("http://{}", addr)
}

fn history() -> Vec<HistoryEntry> {
    vec![HistoryEntry::new("I can't sleep", "That sounds exhausting.")]
}

// =============================================================================
// OpenAI chat completions
// =============================================================================

#[tokio::test]
async fn test_openai_sends_prompt_and_reads_first_choice() {
    let router = Router::new().route(
        "/chat/completions",
        post(|headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(headers["authorization"], "Bearer sk-test");
            assert_eq!(body["model"], "gpt-test");
            assert_eq!(body["max_tokens"], 500);
            let messages = body["messages"].as_array().unwrap();
            assert_eq!(messages.len(), 4);
            assert_eq!(messages[0]["role"], "system");
            assert_eq!(messages[1]["content"], "I can't sleep");
            assert_eq!(messages[3]["content"], "What should I do?");
            Json(json!({
                "choices": [{"message": {"role": "assistant", "content": "Let's look at your evening routine."}}]
            }))
        }),
    );
    let base = serve(router).await;

    let backend = OpenAiChatBackend::new("sk-test", "gpt-test")
        .unwrap()
        .with_base_url(base);
    let reply = backend
        .generate("What should I do?", &history(), &SessionContext::new())
        .await
        .unwrap();
    assert_eq!(reply, "Let's look at your evening routine.");
}

#[tokio::test]
async fn test_openai_missing_content_is_invalid() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { Json(json!({"choices": []})) }),
    );
    let base = serve(router).await;

    let backend = OpenAiChatBackend::new("k", "m").unwrap().with_base_url(base);
    let err = backend
        .generate("hi", &[], &SessionContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
}

#[tokio::test]
async fn test_openai_http_error_status() {
    let router = Router::new().route(
        "/chat/completions",
        post(|| async { (StatusCode::TOO_MANY_REQUESTS, "rate limited") }),
    );
    let base = serve(router).await;

    let backend = OpenAiChatBackend::new("k", "m").unwrap().with_base_url(base);
    let err = backend
        .generate("hi", &[], &SessionContext::new())
        .await
        .unwrap_err();
    match err {
        BackendError::Http { status, message } => {
            assert_eq!(status, 429);
            assert_eq!(message, "rate limited");
        }
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn test_openai_unreachable_is_request_error() {
    // Bind then drop to get a port nothing listens on.
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    drop(listener);

    let backend = OpenAiChatBackend::new("k", "m")
        .unwrap()
        .with_base_url(format!("http://{}", addr));
    let err = backend
        .generate("hi", &[], &SessionContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::Request(_)));
}

// =============================================================================
// Gemini
// =============================================================================

#[tokio::test]
async fn test_gemini_single_prompt_round() {
    let router = Router::new().fallback(
        |uri: Uri, headers: HeaderMap, Json(body): Json<Value>| async move {
            assert_eq!(uri.path(), "/models/gemini-test:generateContent");
            assert_eq!(headers["x-goog-api-key"], "g-key");
            let prompt = body["contents"][0]["parts"][0]["text"].as_str().unwrap();
            assert!(prompt.contains("Previous conversation:\nUser: I can't sleep\n"));
            assert!(prompt.ends_with("User: Any tips?\n\nAssistant:"));
            Json(json!({
                "candidates": [{"content": {"parts": [{"text": "Try a wind-down "}, {"text": "routine."}]}}]
            }))
        },
    );
    let base = serve(router).await;

    let backend = GeminiBackend::new("g-key", "gemini-test")
        .unwrap()
        .with_base_url(base);
    let reply = backend
        .generate("Any tips?", &history(), &SessionContext::new())
        .await
        .unwrap();
    assert_eq!(reply, "Try a wind-down routine.");
}

#[tokio::test]
async fn test_gemini_empty_candidates_is_invalid() {
    let router = Router::new().fallback(|| async { Json(json!({"candidates": []})) });
    let base = serve(router).await;

    let backend = GeminiBackend::new("k", "gemini-test").unwrap().with_base_url(base);
    let err = backend
        .generate("hi", &[], &SessionContext::new())
        .await
        .unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
}

// =============================================================================
// Scored HTTP model
// =============================================================================

#[tokio::test]
async fn test_scored_http_cleans_and_clamps() {
    let router = Router::new().route(
        "/generate",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["message"], "I feel anxious");
            assert_eq!(body["history"][0]["assistant"], "That sounds exhausting.");
            Json(json!({
                "text": "  Let's slow down and notice the thought. What is the worst that",
                "confidence": 1.7
            }))
        }),
    );
    let base = serve(router).await;

    let model = HttpScoredModel::new(format!("{}/generate", base)).unwrap();
    let (text, confidence) = model.generate("I feel anxious", &history()).await.unwrap();
    assert_eq!(text, "Let's slow down and notice the thought.");
    assert_eq!(confidence, 1.0);
}

#[tokio::test]
async fn test_scored_http_malformed_body() {
    let router = Router::new().route("/generate", post(|| async { Json(json!({"reply": "x"})) }));
    let base = serve(router).await;

    let model = HttpScoredModel::new(format!("{}/generate", base)).unwrap();
    let err = model.generate("hi", &[]).await.unwrap_err();
    assert!(matches!(err, BackendError::InvalidResponse(_)));
}

// =============================================================================
// Embeddings
// =============================================================================

#[tokio::test]
async fn test_embeddings_first_vector() {
    let router = Router::new().route(
        "/embeddings",
        post(|Json(body): Json<Value>| async move {
            assert_eq!(body["input"], "hello");
            assert_eq!(body["dimensions"], 3);
            Json(json!({"data": [{"embedding": [0.1, 0.2, 0.3], "index": 0}]}))
        }),
    );
    let base = serve(router).await;

    let service = OpenAiEmbeddingService::new("k", "text-embedding-3-small", 3)
        .unwrap()
        .with_base_url(base);
    let v = service.embed("hello").await.unwrap();
    assert_eq!(v, vec![0.1, 0.2, 0.3]);
    assert_eq!(EmbeddingService::dimensions(&service), 3);
}
