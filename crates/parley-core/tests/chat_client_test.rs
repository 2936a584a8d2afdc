//! ChatClient integration tests against a `wiremock` chat server.

use serde_json::json;
use wiremock::matchers::{body_json, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use parley_core::{ChatClient, ChatTransport, NetworkError};

async fn server_replying(body: serde_json::Value) -> MockServer {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(&server)
        .await;
    server
}

#[tokio::test]
async fn posts_json_message_to_chat_path() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .and(header("content-type", "application/json"))
        .and(body_json(json!({"message": "hello there"})))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "hi!"})))
        .expect(1)
        .mount(&server)
        .await;

    let client = ChatClient::new(&server.uri());
    let reply = client.send("hello there").await.expect("send should succeed");
    assert_eq!(reply.text, "hi!");
}

#[tokio::test]
async fn trailing_slash_base_url_still_hits_chat() {
    let server = server_replying(json!({"reply": "ok"})).await;
    let client = ChatClient::new(&format!("{}/", server.uri()));
    assert_eq!(client.send("x").await.unwrap().text, "ok");
}

#[tokio::test]
async fn each_reply_shape_is_understood() {
    let cases = vec![
        (json!("hi"), "hi"),
        (json!({"reply": "a"}), "a"),
        (json!({"response": "b"}), "b"),
        (json!({"message": "c"}), "c"),
        (json!({"other": "d"}), r#"{"other":"d"}"#),
    ];

    for (body, expected) in cases {
        let server = server_replying(body.clone()).await;
        let client = ChatClient::new(&server.uri());
        let reply = client.send_message("q").await.expect("send should succeed");
        assert_eq!(reply.text, expected, "body: {body}");
    }
}

#[tokio::test]
async fn reply_text_is_formatted() {
    let server = server_replying(json!({
        "reply": "**Sure!** Here you go:\\n\\n\\n\\n- first\\n- second"
    }))
    .await;

    let reply = ChatClient::new(&server.uri()).send("list").await.unwrap();
    assert_eq!(reply.text, "Sure! Here you go:\n• first\n• second");
}

#[tokio::test]
async fn non_success_status_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(503).set_body_string("down for maintenance"))
        .mount(&server)
        .await;

    let err = ChatClient::new(&server.uri()).send("hi").await.unwrap_err();
    match err {
        NetworkError::Status { status, body } => {
            assert_eq!(status, 503);
            assert_eq!(body, "down for maintenance");
        }
        other => panic!("expected status error, got {other:?}"),
    }
}

#[tokio::test]
async fn non_json_body_is_a_decode_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/chat"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
        .mount(&server)
        .await;

    let err = ChatClient::new(&server.uri()).send("hi").await.unwrap_err();
    assert!(matches!(err, NetworkError::Decode(_)), "got {err:?}");
}

#[tokio::test]
async fn unreachable_server_is_a_request_error() {
    let err = ChatClient::new("http://127.0.0.1:1").send("hi").await.unwrap_err();
    assert!(matches!(err, NetworkError::Request(_)), "got {err:?}");
}
