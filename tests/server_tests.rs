// tests for the http api, served on a random local port

mod common;

use common::{Behavior, Stub, router};
use genguard::{FALLBACK_MESSAGE, app};
use serde_json::{Value, json};
use std::sync::Arc;

async fn spawn(stub: Arc<Stub>) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    let app = app(Arc::new(router(stub)));

    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{addr}")
}

async fn new_session(client: &reqwest::Client, base: &str) -> String {
    let res = client
        .post(format!("{base}/sessions"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 201);

    let body: Value = res.json().await.unwrap();
    body["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn test_health() {
    let base = spawn(Stub::new(Behavior::Refuse)).await;
    let body: Value = reqwest::get(format!("{base}/health"))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn test_classify_endpoint() {
    let base = spawn(Stub::new(Behavior::Refuse)).await;
    let body: Value = reqwest::Client::new()
        .post(format!("{base}/classify"))
        .json(&json!({ "message": "it's running in the basement" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["matched"], true);
    assert_eq!(body["category"], "indoor-use");
}

#[tokio::test]
async fn test_message_and_history() {
    let stub = Stub::new(Behavior::Reply(vec!["Check the oil ", "first."]));
    let base = spawn(stub.clone()).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let body: Value = client
        .post(format!("{base}/sessions/{id}/messages"))
        .json(&json!({ "message": "what should I do before hurricane season" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["text"], "Check the oil first.");
    assert_eq!(body["outcome"]["kind"], "completed");

    let session: Value = client
        .get(format!("{base}/sessions/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let turns = session["history"]["turns"].as_array().unwrap();
    assert_eq!(turns.len(), 2);
    assert_eq!(turns[1]["role"], "assistant");
}

#[tokio::test]
async fn test_fallback_over_http() {
    let base = spawn(Stub::new(Behavior::Refuse)).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let body: Value = client
        .post(format!("{base}/sessions/{id}/messages"))
        .json(&json!({ "message": "how often should I test the detector" }))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();

    assert_eq!(body["text"], FALLBACK_MESSAGE);
    assert_eq!(body["outcome"]["kind"], "fallback");
    assert_eq!(body["outcome"]["reason"], "unavailable");
}

#[tokio::test]
async fn test_sessions_are_isolated() {
    let base = spawn(Stub::new(Behavior::Reply(vec!["ok"]))).await;
    let client = reqwest::Client::new();
    let first = new_session(&client, &base).await;
    let second = new_session(&client, &base).await;

    client
        .post(format!("{base}/sessions/{first}/messages"))
        .json(&json!({ "message": "what oil should I use" }))
        .send()
        .await
        .unwrap();

    let session: Value = client
        .get(format!("{base}/sessions/{second}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session["history"]["turns"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_reset_and_delete() {
    let base = spawn(Stub::new(Behavior::Reply(vec!["ok"]))).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    client
        .post(format!("{base}/sessions/{id}/messages"))
        .json(&json!({ "message": "what oil should I use" }))
        .send()
        .await
        .unwrap();

    let res = client
        .post(format!("{base}/sessions/{id}/reset"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    let session: Value = client
        .get(format!("{base}/sessions/{id}"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(session["history"]["turns"].as_array().unwrap().is_empty());

    let res = client
        .delete(format!("{base}/sessions/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 204);

    let res = client
        .get(format!("{base}/sessions/{id}"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_blank_message_rejected() {
    let base = spawn(Stub::new(Behavior::Refuse)).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let res = client
        .post(format!("{base}/sessions/{id}/messages"))
        .json(&json!({ "message": "   " }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 400);
}

#[tokio::test]
async fn test_unknown_session() {
    let base = spawn(Stub::new(Behavior::Refuse)).await;
    let res = reqwest::Client::new()
        .post(format!(
            "{base}/sessions/00000000-0000-4000-8000-000000000000/messages"
        ))
        .json(&json!({ "message": "hello" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 404);
}

#[tokio::test]
async fn test_stream_events() {
    let base = spawn(Stub::new(Behavior::Reply(vec!["Outside ", "only."]))).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let body = client
        .post(format!("{base}/sessions/{id}/stream"))
        .json(&json!({ "message": "where should it go" }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(body.contains("event: partial"));
    assert!(body.contains("data: Outside only."));
    assert!(body.contains("event: done"));
    assert!(body.contains(r#""text":"Outside only.""#));
}

#[tokio::test]
async fn test_stream_fallback_done_event() {
    let base = spawn(Stub::new(Behavior::Refuse)).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let body = client
        .post(format!("{base}/sessions/{id}/stream"))
        .json(&json!({ "message": "how often should I test the detector" }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert!(!body.contains("event: partial"));
    assert!(body.contains("event: done"));
    assert!(body.contains(r#""kind":"fallback""#));
    assert!(body.contains(r#""reason":"unavailable""#));
    assert!(body.contains(FALLBACK_MESSAGE));
}

#[tokio::test]
async fn test_stream_canned_reply() {
    let stub = Stub::new(Behavior::Reply(vec!["never sent"]));
    let base = spawn(stub.clone()).await;
    let client = reqwest::Client::new();
    let id = new_session(&client, &base).await;

    let body = client
        .post(format!("{base}/sessions/{id}/stream"))
        .json(&json!({ "message": "can I run it in my garage" }))
        .send()
        .await
        .unwrap()
        .text()
        .await
        .unwrap();

    assert_eq!(stub.calls(), 0);
    assert!(!body.contains("event: partial"));
    assert!(body.contains("event: done"));
    assert!(body.contains(r#""kind":"canned""#));
    assert!(body.contains(r#""category":"indoor-use""#));
    assert!(!body.contains("never sent"));
}
