use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, instrument};

use super::{NarrativeError, NarrativeGenerator, NarrativeTask};
use crate::config::LlmConfig;

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<Choice>,
    error: Option<ApiError>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: Message,
}

#[derive(Debug, Deserialize)]
struct Message {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiError {
    message: String,
}

/// Client for any OpenAI-compatible `/chat/completions` endpoint.
pub struct OpenAiNarrator {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    model: String,
    timeout: Duration,
}

impl OpenAiNarrator {
    pub fn new(config: &LlmConfig, api_key: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            endpoint: format!("{}/chat/completions", config.base_url.trim_end_matches('/')),
            api_key: api_key.into(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.timeout_secs),
        }
    }

    fn messages<'a>(system: &'a str, user: &'a str) -> Vec<ChatMessage<'a>> {
        vec![
            ChatMessage {
                role: "system",
                content: system,
            },
            ChatMessage {
                role: "user",
                content: user,
            },
        ]
    }
}

fn first_content(response: ChatResponse) -> Result<String, NarrativeError> {
    if let Some(error) = response.error {
        return Err(NarrativeError::Service(error.message));
    }
    response
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .filter(|content| !content.trim().is_empty())
        .ok_or(NarrativeError::EmptyResponse)
}

#[async_trait]
impl NarrativeGenerator for OpenAiNarrator {
    #[instrument(skip(self, task), fields(model = %self.model, role = %task.role))]
    async fn generate(&self, task: &NarrativeTask) -> Result<String, NarrativeError> {
        let system = format!("You are acting as: {}.", task.role);
        let user = format!("{}\n\n{}", task.instructions, task.context);
        let request = ChatRequest {
            model: &self.model,
            messages: Self::messages(&system, &user),
        };

        debug!(prompt_bytes = user.len(), "sending narrative request");
        let response: ChatResponse = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&request)
            .send()
            .await?
            .json()
            .await?;

        let text = first_content(response)?;
        debug!(response_bytes = text.len(), "received narrative");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_endpoint_from_base_url() {
        let mut config = LlmConfig::default();
        config.base_url = "http://localhost:11434/v1/".to_string();
        let narrator = OpenAiNarrator::new(&config, "key");
        assert_eq!(narrator.endpoint, "http://localhost:11434/v1/chat/completions");
    }

    #[test]
    fn test_request_serialization() {
        let request = ChatRequest {
            model: "m",
            messages: OpenAiNarrator::messages("sys", "usr"),
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["model"], "m");
        assert_eq!(json["messages"][0]["role"], "system");
        assert_eq!(json["messages"][1]["content"], "usr");
    }

    #[test]
    fn test_first_content_is_passed_through() {
        let response: ChatResponse = serde_json::from_str(
            r#"{"choices":[{"message":{"role":"assistant","content":"  - Focus on tables.\n    - nested\n"}}]}"#,
        )
        .unwrap();
        assert_eq!(first_content(response).unwrap(), "  - Focus on tables.\n    - nested\n");
    }

    #[test]
    fn test_whitespace_only_content_is_empty() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"role":"assistant","content":" \n\t "}}]}"#).unwrap();
        assert!(matches!(first_content(response), Err(NarrativeError::EmptyResponse)));
    }

    #[test]
    fn test_error_and_empty_responses() {
        let response: ChatResponse =
            serde_json::from_str(r#"{"error":{"message":"rate limited","code":429}}"#).unwrap();
        assert!(matches!(first_content(response), Err(NarrativeError::Service(m)) if m == "rate limited"));

        let response: ChatResponse = serde_json::from_str(r#"{"choices":[]}"#).unwrap();
        assert!(matches!(first_content(response), Err(NarrativeError::EmptyResponse)));
    }
}
