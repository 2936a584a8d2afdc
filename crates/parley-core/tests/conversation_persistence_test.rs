//! End-to-end conversation flow over a SQLite store and a mock chat server.

use serde_json::json;
use tempfile::tempdir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_core::{
    ChatClient, Conversation, Durability, MessageStore, SqliteKv, DEFAULT_GREETING,
    NETWORK_ERROR_REPLY,
};

fn open_conversation(db: &std::path::Path) -> Conversation {
    let kv = SqliteKv::open(db).expect("open sqlite store");
    let mut conversation =
        Conversation::new(MessageStore::new(kv, Durability::Strict), DEFAULT_GREETING);
    conversation.initialize();
    conversation
}

#[tokio::test]
async fn conversation_survives_restart() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "Paris."})))
        .mount(&server)
        .await;
    let client = ChatClient::new(&server.uri());

    let dir = tempdir().unwrap();
    let db = dir.path().join("chat.db");

    let before = {
        let mut conversation = open_conversation(&db);
        conversation.set_input("Capital of France?");
        assert!(conversation.send(&client).await);
        conversation.messages().to_vec()
    };
    assert_eq!(before.len(), 3);

    let restarted = open_conversation(&db);
    assert_eq!(restarted.messages(), before.as_slice());
    assert_eq!(restarted.messages()[2].text, "Paris.");
}

#[tokio::test]
async fn failed_send_is_persisted_with_error_reply() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;
    let client = ChatClient::new(&server.uri());

    let dir = tempdir().unwrap();
    let db = dir.path().join("chat.db");

    let mut conversation = open_conversation(&db);
    conversation.set_input("hello?");
    conversation.send(&client).await;

    let restarted = open_conversation(&db);
    let texts: Vec<_> = restarted.messages().iter().map(|m| m.text.as_str()).collect();
    assert_eq!(texts, vec![DEFAULT_GREETING, "hello?", NETWORK_ERROR_REPLY]);
}

#[tokio::test]
async fn cleared_conversation_stays_cleared_after_restart() {
    let dir = tempdir().unwrap();
    let db = dir.path().join("chat.db");

    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!("pong")))
        .mount(&server)
        .await;
    let client = ChatClient::new(&server.uri());

    let mut conversation = open_conversation(&db);
    conversation.set_input("ping");
    conversation.send(&client).await;
    assert!(conversation.request_clear());
    assert!(conversation.confirm_clear());

    let restarted = open_conversation(&db);
    assert_eq!(restarted.messages().len(), 1);
    assert_eq!(restarted.messages()[0].text, DEFAULT_GREETING);
    assert_eq!(restarted.messages(), conversation.messages());
}
