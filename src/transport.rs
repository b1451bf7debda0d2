use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;

use crate::error::{AdvisorError, Result};
use crate::models::{CompletionRequest, CompletionResponse};

pub const OPENAI_BASE_URL: &str = "https://api.openai.com/v1";

/// One blocking round trip to a chat-completion endpoint.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Transport: Send + Sync {
    async fn chat(&self, req: &CompletionRequest) -> Result<CompletionResponse>;
}

/// OpenAI-compatible transport. Single attempt, no client-side timeout.
pub struct OpenAiTransport {
    client: Client,
    api_key: String,
    endpoint: String,
}

impl OpenAiTransport {
    pub fn new(api_key: String, base_url: &str) -> Result<Self> {
        if api_key.trim().is_empty() {
            return Err(AdvisorError::Config("API key is empty".to_string()));
        }
        Ok(Self {
            client: Client::new(),
            api_key,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
        })
    }
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ApiErrorDetail {
    message: String,
}

/// Pulls `error.message` out of an OpenAI-style error body, falling back to the raw text.
fn service_error_message(status: reqwest::StatusCode, body: &str) -> String {
    let detail = serde_json::from_str::<ApiErrorBody>(body)
        .map(|b| b.error.message)
        .unwrap_or_else(|_| body.trim().to_string());
    format!("HTTP {status}: {detail}")
}

#[async_trait]
impl Transport for OpenAiTransport {
    async fn chat(&self, req: &CompletionRequest) -> Result<CompletionResponse> {
        tracing::debug!(model = %req.model, messages = req.messages.len(), "Sending completion request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(req)
            .send()
            .await
            .map_err(|e| AdvisorError::Service(format!("Failed to reach completion service: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            tracing::warn!(%status, "Completion service returned an error");
            return Err(AdvisorError::Service(service_error_message(status, &body)));
        }

        response.json().await.map_err(|e| {
            AdvisorError::Service(format!("Failed to decode completion response: {e}"))
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::ApiMessage;

    #[test]
    fn test_empty_key_is_rejected() {
        assert!(matches!(
            OpenAiTransport::new("  ".to_string(), OPENAI_BASE_URL),
            Err(AdvisorError::Config(_))
        ));
    }

    #[test]
    fn test_endpoint_joins_base_url() {
        let t = OpenAiTransport::new("sk-test".to_string(), "http://localhost:9999/v1/")
            .expect("transport");
        assert_eq!(t.endpoint, "http://localhost:9999/v1/chat/completions");
    }

    #[test]
    fn test_service_error_message_prefers_api_detail() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error"}}"#;
        let msg = service_error_message(reqwest::StatusCode::UNAUTHORIZED, body);
        assert_eq!(msg, "HTTP 401 Unauthorized: Incorrect API key provided");
        let msg = service_error_message(reqwest::StatusCode::BAD_GATEWAY, "upstream down");
        assert!(msg.ends_with("upstream down"));
    }

    #[tokio::test]
    #[ignore = "calls the live completion API"]
    async fn test_openai_transport_live() {
        if let Ok(api_key) = std::env::var("OPENAI_API_KEY") {
            let transport = match OpenAiTransport::new(api_key, OPENAI_BASE_URL) {
                Ok(t) => t,
                Err(e) => {
                    eprintln!("Failed to create transport in test: {e}");
                    return;
                }
            };
            let req = CompletionRequest {
                model: "gpt-4o".to_string(),
                messages: vec![ApiMessage::system("Reply with the single word: ok")],
                temperature: Some(0.0),
                response_format: None,
            };
            let res = transport.chat(&req).await;
            assert!(res.is_ok());
        }
    }
}
