use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use tracing::debug;

use mealweek_core::{OracleError, RankingOracle};

const ANTHROPIC_VERSION: &str = "2023-06-01";

/// Ranking oracle backed by the Anthropic messages API. One completion
/// per call, no retries: the planning flow has its own overall deadline
/// and a deterministic fallback, so a failed call is cheaper than a
/// late one.
pub struct AnthropicOracle {
    client: Client,
    base_url: String,
    model: String,
    api_key: SecretString,
}

impl AnthropicOracle {
    pub fn new(
        api_key: SecretString,
        base_url: impl Into<String>,
        model: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, OracleError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs.max(1)))
            .build()
            .map_err(|err| OracleError::Transport(err.to_string()))?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
        })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.base_url)
    }
}

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    content: Vec<ContentBlock>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    text: Option<String>,
}

impl MessagesResponse {
    fn text(&self) -> Option<&str> {
        self.content
            .iter()
            .find(|block| block.block_type == "text")
            .and_then(|block| block.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct ApiError {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    message: String,
}

fn transport_error(err: reqwest::Error) -> OracleError {
    if err.is_timeout() {
        OracleError::Timeout
    } else {
        OracleError::Transport(err.to_string())
    }
}

#[async_trait]
impl RankingOracle for AnthropicOracle {
    async fn rank(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, OracleError> {
        let request = MessagesRequest {
            model: &self.model,
            max_tokens,
            temperature,
            messages: vec![Message { role: "user", content: prompt }],
        };

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", self.api_key.expose_secret())
            .header("anthropic-version", ANTHROPIC_VERSION)
            .header("content-type", "application/json")
            .json(&request)
            .send()
            .await
            .map_err(transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ApiError>(&body)
                .map(|parsed| parsed.error.message)
                .unwrap_or(body);
            return Err(OracleError::Transport(format!("status {status}: {message}")));
        }

        let completion: MessagesResponse =
            response.json().await.map_err(transport_error)?;

        debug!(event_name = "oracle.completed", model = %self.model, "oracle call completed");

        completion
            .text()
            .map(str::to_owned)
            .ok_or_else(|| OracleError::Transport("completion had no text block".to_string()))
    }
}
