use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use crate::state::ChatMessage;

pub use reqwest::StatusCode;

/// Failure of a single request to the assistant endpoint
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or transport failure, including an unreadable response body
    #[error("request to assistant failed: {0}")]
    RequestFailed(#[from] reqwest::Error),

    /// The endpoint answered with a non-success status
    #[error("assistant rejected the request with status {status}")]
    ResponseRejected { status: StatusCode },
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    messages: &'a [ChatMessage],
}

#[derive(Deserialize)]
struct ChatResponse {
    message: ChatMessage,
}

#[derive(Deserialize)]
struct HealthResponse {
    status: String,
}

#[derive(Clone)]
pub struct AssistantClient {
    client: Client,
    base_url: String,
}

impl AssistantClient {
    pub fn new(base_url: &str) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Send the whole conversation and return the assistant's reply as-is.
    pub async fn send(&self, messages: &[ChatMessage]) -> Result<ChatMessage, ClientError> {
        let url = format!("{}/chat", self.base_url);
        debug!(%url, count = messages.len(), "sending conversation");

        let response = self
            .client
            .post(&url)
            .json(&ChatRequest { messages })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ResponseRejected { status });
        }

        let chat_response: ChatResponse = response.json().await?;
        Ok(chat_response.message)
    }

    /// Probe `GET /health`; true when the backend reports `"ok"`.
    pub async fn health(&self) -> Result<bool, ClientError> {
        let url = format!("{}/health", self.base_url);

        let response = self.client.get(&url).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(ClientError::ResponseRejected { status });
        }

        let health: HealthResponse = response.json().await?;
        Ok(health.status == "ok")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[tokio::test]
    async fn test_send_posts_conversation_and_returns_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .and(header("content-type", "application/json"))
            .and(body_json(serde_json::json!({
                "messages": [
                    {"role": "user", "content": "Will it rain in Boston tomorrow?"}
                ]
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "Yes, 70% chance."}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AssistantClient::new(&server.uri());
        let reply = client
            .send(&[ChatMessage::user("Will it rain in Boston tomorrow?")])
            .await
            .expect("send");

        assert_eq!(reply, ChatMessage::assistant("Yes, 70% chance."));
    }

    #[tokio::test]
    async fn test_send_server_error_is_rejected() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&server.uri());
        let err = client.send(&[ChatMessage::user("hi")]).await.unwrap_err();

        match err {
            ClientError::ResponseRejected { status } => {
                assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR)
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_send_malformed_body_is_request_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&server.uri());
        let err = client.send(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ClientError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_send_unreachable_host_is_request_failure() {
        // Port 9 (discard) on localhost is not expected to accept HTTP.
        let client = AssistantClient::new("http://127.0.0.1:9");
        let err = client.send(&[ChatMessage::user("hi")]).await.unwrap_err();
        assert!(matches!(err, ClientError::RequestFailed(_)));
    }

    #[tokio::test]
    async fn test_trailing_slash_is_trimmed() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "message": {"role": "assistant", "content": "ok"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = AssistantClient::new(&format!("{}/", server.uri()));
        assert_eq!(client.base_url(), server.uri());
        client.send(&[ChatMessage::user("hi")]).await.expect("send");
    }

    #[tokio::test]
    async fn test_health_ok() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"status": "ok"})),
            )
            .mount(&server)
            .await;

        let client = AssistantClient::new(&server.uri());
        assert!(client.health().await.expect("health"));
    }

    #[tokio::test]
    async fn test_health_unavailable() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/health"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let client = AssistantClient::new(&server.uri());
        assert!(client.health().await.is_err());
    }
}
