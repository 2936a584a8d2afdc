use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::Client;
use serde::Serialize;
use serde_json::Value;
use tracing::debug;

use crate::endpoint::Endpoint;
use crate::error::NetworkError;
use crate::format::format_reply_text;

#[derive(Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
}

/// Cleaned-up reply from the chat server.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChatReply {
    pub text: String,
}

/// Anything that can answer a chat message.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn send_message(&self, text: &str) -> Result<ChatReply, NetworkError>;
}

#[derive(Clone)]
pub struct ChatClient {
    client: Client,
    base_url: String,
}

impl ChatClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn from_endpoint(endpoint: &Endpoint) -> Self {
        Self::new(endpoint.base_url())
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub async fn send(&self, text: &str) -> Result<ChatReply, NetworkError> {
        let url = format!("{}/chat", self.base_url);
        debug!(url = %url, "Sending message");

        let response = self
            .client
            .post(&url)
            .header(CONTENT_TYPE, "application/json")
            .json(&ChatRequest { message: text })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(NetworkError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body = response.text().await?;
        let data: Value =
            serde_json::from_str(&body).map_err(|e| NetworkError::Decode(e.to_string()))?;
        debug!(raw = %data, "Raw server response");

        Ok(ChatReply {
            text: format_reply_text(&extract_reply_text(&data)),
        })
    }
}

#[async_trait]
impl ChatTransport for ChatClient {
    async fn send_message(&self, text: &str) -> Result<ChatReply, NetworkError> {
        self.send(text).await
    }
}

/// Pull the reply text out of whatever shape the server answered with.
///
/// First match wins: a bare JSON string, then the `reply`, `response` and
/// `message` fields (only when truthy), and finally the whole body as JSON.
pub fn extract_reply_text(data: &Value) -> String {
    if let Value::String(text) = data {
        return text.clone();
    }

    for field in ["reply", "response", "message"] {
        if let Some(value) = data.get(field).filter(|v| is_truthy(v)) {
            return match value {
                Value::String(text) => text.clone(),
                other => other.to_string(),
            };
        }
    }

    data.to_string()
}

fn is_truthy(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(_) | Value::Object(_) => true,
    }
}
