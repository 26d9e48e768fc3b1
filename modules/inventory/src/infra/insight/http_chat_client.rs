//! Client for OpenAI-compatible `chat/completions` endpoints.

use std::time::Duration;

use anyhow::Context;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::InsightConfig;
use crate::domain::insight::{ChatCompletion, InsightError};

pub struct HttpChatClient {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 2],
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize)]
struct ChatReply {
    content: Option<String>,
}

impl HttpChatClient {
    /// Build a client for `endpoint` using the model, key and timeout from `config`.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn new(endpoint: impl Into<String>, config: &InsightConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("failed to create insight HTTP client")?;

        Ok(Self {
            http,
            endpoint: endpoint.into(),
            model: config.model.clone(),
            api_key: config.api_key.clone(),
        })
    }

    /// Client for the configured endpoint, or `None` when insight is disabled.
    ///
    /// # Errors
    /// Returns an error if the underlying HTTP client cannot be created.
    pub fn from_config(config: &InsightConfig) -> anyhow::Result<Option<Self>> {
        config
            .endpoint
            .as_deref()
            .map(|endpoint| Self::new(endpoint, config))
            .transpose()
    }
}

#[async_trait]
impl ChatCompletion for HttpChatClient {
    async fn complete(&self, system: &str, prompt: &str) -> Result<String, InsightError> {
        let body = ChatRequest {
            model: &self.model,
            messages: [
                ChatMessage {
                    role: "system",
                    content: system,
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
        };

        let mut request = self.http.post(&self.endpoint).json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!(?e, "HttpChatClient: request failed");
            InsightError::Upstream(format!("Failed to reach insight service: {e}"))
        })?;

        let status = response.status();
        if !status.is_success() {
            tracing::error!(?status, "HttpChatClient: upstream error status");
            return Err(InsightError::Upstream(format!(
                "Insight service returned HTTP {status}"
            )));
        }

        let parsed: ChatResponse = response.json().await.map_err(|e| {
            tracing::error!(?e, "HttpChatClient: malformed response body");
            InsightError::Upstream(format!("Malformed insight response: {e}"))
        })?;

        parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or_else(|| InsightError::Upstream("Insight service returned no answer".to_owned()))
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use axum::http::{HeaderMap, StatusCode};
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{Value, json};

    async fn spawn_upstream(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.expect("fake upstream");
        });
        format!("http://{addr}/v1/chat/completions")
    }

    fn config_with_key() -> InsightConfig {
        InsightConfig {
            api_key: Some("secret".to_owned()),
            timeout_secs: 5,
            ..InsightConfig::default()
        }
    }

    #[test]
    fn disabled_without_endpoint() {
        assert!(HttpChatClient::from_config(&InsightConfig::default())
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn sends_messages_and_returns_first_choice() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|headers: HeaderMap, Json(body): Json<Value>| async move {
                assert_eq!(
                    headers.get("authorization").unwrap(),
                    "Bearer secret"
                );
                assert_eq!(body["model"], "gpt-4o-mini");
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["messages"][1]["content"], "How many anvils?");
                Json(json!({
                    "choices": [{ "message": { "role": "assistant", "content": "Two." } }]
                }))
            }),
        );
        let endpoint = spawn_upstream(router).await;

        let client = HttpChatClient::new(endpoint, &config_with_key()).unwrap();
        let reply = client.complete("stats", "How many anvils?").await.unwrap();
        assert_eq!(reply, "Two.");
    }

    #[tokio::test]
    async fn error_status_becomes_upstream_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { (StatusCode::TOO_MANY_REQUESTS, "slow down") }),
        );
        let endpoint = spawn_upstream(router).await;

        let client = HttpChatClient::new(endpoint, &config_with_key()).unwrap();
        let err = client.complete("stats", "hi").await.unwrap_err();
        assert!(matches!(&err, InsightError::Upstream(msg) if msg.contains("429")));
    }

    #[tokio::test]
    async fn empty_choices_become_upstream_error() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { Json(json!({ "choices": [] })) }),
        );
        let endpoint = spawn_upstream(router).await;

        let client = HttpChatClient::new(endpoint, &InsightConfig::default()).unwrap();
        let err = client.complete("stats", "hi").await.unwrap_err();
        assert_eq!(err.to_string(), "Insight service returned no answer");
    }

    #[tokio::test]
    async fn unreachable_endpoint_becomes_upstream_error() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let client = HttpChatClient::new(
            format!("http://{addr}/v1/chat/completions"),
            &config_with_key(),
        )
        .unwrap();
        let err = client.complete("stats", "hi").await.unwrap_err();
        assert!(err.to_string().starts_with("Failed to reach insight service"));
    }
}
