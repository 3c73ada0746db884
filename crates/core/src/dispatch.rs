//! Request dispatch to the assistant chat endpoint.
//!
//! A dispatcher never fails from the caller's point of view: any transport, status or decoding
//! problem is logged and replaced by the configured fallback reply.
use crate::config::EndpointConfig;
use crate::mode::Mode;
use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, instrument, warn};
use url::Url;

/// Reply text for a submission. Both variants carry text to render.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reply {
    Text(String),
    Fallback(String),
}

impl Reply {
    pub fn text(&self) -> &str {
        match self {
            Reply::Text(text) | Reply::Fallback(text) => text,
        }
    }

    pub fn into_text(self) -> String {
        match self {
            Reply::Text(text) | Reply::Fallback(text) => text,
        }
    }

    pub fn is_fallback(&self) -> bool {
        matches!(self, Reply::Fallback(_))
    }
}

#[async_trait]
pub trait Dispatcher: Send + Sync {
    /// Sends one message to the assistant. Resolves to a fallback reply on failure.
    async fn send(&self, message: &str, mode: Mode) -> Reply;
}

#[derive(Error, Debug)]
pub enum DispatchError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),
    #[error("Unexpected status: {0}")]
    Status(StatusCode),
    #[error("Response has no reply text")]
    MissingReply,
    #[error("No response within {0:?}")]
    Timeout(Duration),
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    message: &'a str,
    mode: Mode,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    reply: Option<String>,
}

/// Dispatcher for the `POST <base_url>/chat_v2` endpoint.
#[derive(Debug, Clone)]
pub struct HttpDispatcher {
    client: reqwest::Client,
    url: Url,
    timeout: Duration,
    fallback_reply: String,
}

impl HttpDispatcher {
    pub fn new(config: &EndpointConfig) -> Result<Self, url::ParseError> {
        Ok(Self {
            client: reqwest::Client::new(),
            url: config.chat_url()?,
            timeout: config.timeout(),
            fallback_reply: config.fallback_reply.clone(),
        })
    }

    async fn request(&self, message: &str, mode: Mode) -> Result<String, DispatchError> {
        let response = self
            .client
            .post(self.url.clone())
            .json(&ChatRequest { message, mode })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(DispatchError::Status(status));
        }

        response
            .json::<ChatResponse>()
            .await?
            .reply
            .filter(|reply| !reply.trim().is_empty())
            .ok_or(DispatchError::MissingReply)
    }
}

#[async_trait]
impl Dispatcher for HttpDispatcher {
    #[instrument(skip(self, message), fields(url = %self.url))]
    async fn send(&self, message: &str, mode: Mode) -> Reply {
        let result = match tokio::time::timeout(self.timeout, self.request(message, mode)).await {
            Ok(result) => result,
            Err(_) => Err(DispatchError::Timeout(self.timeout)),
        };

        match result {
            Ok(text) => {
                debug!(chars = text.chars().count(), "Received reply");
                Reply::Text(text)
            }
            Err(err) => {
                warn!(error = %err, "Chat request failed, using fallback reply");
                Reply::Fallback(self.fallback_reply.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::{
        Mock, MockServer, ResponseTemplate,
        matchers::{body_json, method, path},
    };

    fn endpoint_config(server_url: &str, timeout_ms: u64) -> EndpointConfig {
        EndpointConfig {
            base_url: format!("{server_url}/api"),
            timeout_ms,
            fallback_reply: "Error connecting to Assist AI".to_string(),
        }
    }

    #[tokio::test]
    async fn test_send_posts_message_and_mode() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .and(body_json(json!({"message": "x", "mode": "study"})))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({"reply": "Hi there", "mode": "study"})),
            )
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 1000)).unwrap();
        let reply = dispatcher.send("x", Mode::Study).await;

        assert_eq!(reply, Reply::Text("Hi there".to_string()));
        assert!(!reply.is_fallback());
    }

    #[tokio::test]
    async fn test_send_uses_task_helper_wire_tag() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .and(body_json(json!({"message": "plan my week", "mode": "tasks"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "ok"})))
            .expect(1)
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 1000)).unwrap();
        assert_eq!(dispatcher.send("plan my week", Mode::TaskHelper).await.text(), "ok");
    }

    #[tokio::test]
    async fn test_send_falls_back_on_error_status() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 1000)).unwrap();
        let reply = dispatcher.send("hello", Mode::Default).await;

        assert!(reply.is_fallback());
        assert_eq!(reply.text(), "Error connecting to Assist AI");
    }

    #[tokio::test]
    async fn test_send_falls_back_on_missing_reply_field() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"answer": "nope"})))
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 1000)).unwrap();
        assert!(dispatcher.send("hello", Mode::Default).await.is_fallback());
    }

    #[tokio::test]
    async fn test_send_falls_back_on_blank_reply() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .and(body_json(json!({"message": "empty", "mode": "default"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": ""})))
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .and(body_json(json!({"message": "blank", "mode": "default"})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({"reply": "  \n "})))
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 1000)).unwrap();
        for message in ["empty", "blank"] {
            assert_eq!(
                dispatcher.send(message, Mode::Default).await,
                Reply::Fallback("Error connecting to Assist AI".to_string())
            );
        }
    }

    #[tokio::test]
    async fn test_send_falls_back_on_malformed_body() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>oops</html>"))
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 1000)).unwrap();
        assert!(dispatcher.send("hello", Mode::Default).await.is_fallback());
    }

    #[tokio::test]
    async fn test_send_falls_back_after_timeout() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/api/chat_v2"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({"reply": "too late"}))
                    .set_delay(Duration::from_millis(2000)),
            )
            .mount(&server)
            .await;

        let dispatcher = HttpDispatcher::new(&endpoint_config(&server.uri(), 100)).unwrap();
        let started = std::time::Instant::now();
        let reply = dispatcher.send("hello", Mode::Default).await;

        assert!(reply.is_fallback());
        assert!(started.elapsed() < Duration::from_millis(1500));
    }

    #[tokio::test]
    async fn test_send_falls_back_when_unreachable() {
        // Nothing listens on the discard port
        let config = EndpointConfig {
            base_url: "http://127.0.0.1:9/api".to_string(),
            timeout_ms: 1000,
            fallback_reply: "offline".to_string(),
        };
        let dispatcher = HttpDispatcher::new(&config).unwrap();
        assert_eq!(
            dispatcher.send("hello", Mode::Default).await,
            Reply::Fallback("offline".to_string())
        );
    }
}
