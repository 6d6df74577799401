//! End-to-end tests for the completion relay
//!
//! A wiremock server stands in for the chat-completions endpoint; the relay,
//! the session and SQLite storage are the real implementations.

mod common;

use chatdesk::config::CompletionConfig;
use chatdesk::providers::OpenAiProvider;
use chatdesk::relay::{ChatRelay, CompletionService};
use chatdesk::storage::{PersistenceService, SqliteStorage};
use chatdesk::sync::{ChatSession, Phase, SessionContext, SubmitOutcome};
use chatdesk::ChatdeskError;
use common::create_temp_storage;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reply_body(text: &str) -> serde_json::Value {
    serde_json::json!({
        "choices": [
            {"index": 0, "message": {"role": "assistant", "content": text}, "finish_reason": "stop"}
        ],
        "usage": {"prompt_tokens": 12, "completion_tokens": 2, "total_tokens": 14}
    })
}

fn relay_for(server: &MockServer, storage: Arc<SqliteStorage>) -> ChatRelay<SqliteStorage> {
    let config = CompletionConfig {
        api_base: server.uri(),
        system_prompt: "Antwoord kort.".to_string(),
        ..CompletionConfig::default()
    };
    let provider = OpenAiProvider::new(config.clone(), "sk-test".to_string()).unwrap();
    ChatRelay::new(Box::new(provider), storage, &config)
}

#[tokio::test]
async fn test_session_submit_goes_through_provider_and_storage() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .and(header("authorization", "Bearer sk-test"))
        .and(body_partial_json(serde_json::json!({
            "model": "gpt-4o-mini",
            "messages": [
                {"role": "system", "content": "Antwoord kort."},
                {"role": "user", "content": "Hallo"}
            ]
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("Hoi!")))
        .expect(1)
        .mount(&server)
        .await;

    let (storage, _tmp) = create_temp_storage();
    let storage = Arc::new(storage);
    let relay = Arc::new(relay_for(&server, storage.clone()));
    let session = ChatSession::new(storage.clone(), relay, SessionContext::new("anna"));

    let chat = session.create_chat(Some("Groeten")).await.unwrap();
    let outcome = session.submit("Hallo").await.unwrap();
    assert_eq!(outcome, SubmitOutcome::Replied("Hoi!".to_string()));

    let stored = storage.list_messages(&chat.id).await.unwrap();
    let contents: Vec<&str> = stored.iter().map(|m| m.content.as_str()).collect();
    assert_eq!(contents, vec!["Hallo", "Hoi!"]);
    assert_eq!(session.view().len(), 2);
}

#[tokio::test]
async fn test_provider_error_leaves_only_user_message() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(500).set_body_string("overloaded"))
        .mount(&server)
        .await;

    let (storage, _tmp) = create_temp_storage();
    let storage = Arc::new(storage);
    let relay = Arc::new(relay_for(&server, storage.clone()));
    let session = ChatSession::new(storage.clone(), relay, SessionContext::new("anna"));
    let chat = session.create_chat(None).await.unwrap();

    let err = session.submit("Hallo").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChatdeskError>(),
        Some(ChatdeskError::Completion(_))
    ));
    assert_eq!(session.phase(), Phase::Failed);
    assert!(session.can_submit());
    assert_eq!(storage.list_messages(&chat.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_blank_reply_is_rejected_and_not_stored() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(200).set_body_json(reply_body("   ")))
        .mount(&server)
        .await;

    let (storage, _tmp) = create_temp_storage();
    let storage = Arc::new(storage);
    let chat = storage.create_chat("anna", "Leeg").await.unwrap();
    let relay = relay_for(&server, storage.clone());

    let err = relay.complete(&chat.id, "Hallo").await.unwrap_err();
    assert!(err.to_string().contains("invalid response"));
    assert!(storage.list_messages(&chat.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unauthorized_is_reported_as_completion_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat/completions"))
        .respond_with(ResponseTemplate::new(401))
        .mount(&server)
        .await;

    let (storage, _tmp) = create_temp_storage();
    let storage = Arc::new(storage);
    let chat = storage.create_chat("anna", "Sleutel").await.unwrap();
    let relay = relay_for(&server, storage.clone());

    let err = relay.complete(&chat.id, "Hallo").await.unwrap_err();
    assert!(matches!(
        err.downcast_ref::<ChatdeskError>(),
        Some(ChatdeskError::Completion(_))
    ));
}
