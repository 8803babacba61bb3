//! Chat-completions LLM provider.

use super::{
    http_client, upstream_error_message, Generation, GenerationParams, ProviderError, TextProvider,
};
use crate::config::UpstreamConfig;
use crate::services::prompt::Prompt;
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, Secret};
use serde::{Deserialize, Serialize};
use service_core::observability::TracedRequestExt;

pub struct OpenAiProvider {
    client: Client,
    api_key: Option<Secret<String>>,
    model: String,
    base_url: String,
    params: GenerationParams,
}

impl OpenAiProvider {
    pub fn new(config: &UpstreamConfig) -> Result<Self, ProviderError> {
        Ok(Self {
            client: http_client()?,
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            params: GenerationParams::from(config),
        })
    }

    fn messages<'a>(&self, prompt: &'a Prompt) -> Vec<ChatMessage<'a>> {
        let mut messages = Vec::with_capacity(2);
        if !prompt.system.trim().is_empty() {
            messages.push(ChatMessage {
                role: "system",
                content: &prompt.system,
            });
        }
        messages.push(ChatMessage {
            role: "user",
            content: &prompt.question,
        });
        messages
    }
}

#[async_trait]
impl TextProvider for OpenAiProvider {
    fn name(&self) -> &'static str {
        "openai"
    }

    fn model(&self) -> &str {
        &self.model
    }

    async fn generate(&self, prompt: &Prompt) -> Result<Generation, ProviderError> {
        let api_key = self
            .api_key
            .as_ref()
            .ok_or_else(|| ProviderError::NotConfigured("OPENAI_API_KEY".to_string()))?;

        let request = ChatCompletionRequest {
            model: &self.model,
            messages: self.messages(prompt),
            temperature: self.params.temperature,
            max_tokens: self.params.max_tokens,
        };

        tracing::debug!(
            model = %self.model,
            question_len = prompt.question.len(),
            "Sending request to chat completions API"
        );

        let response = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(api_key.expose_secret())
            .json(&request)
            .with_trace_context()
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            tracing::warn!(
                status = %status,
                body = %body,
                "Chat completions API returned an error"
            );
            return Err(ProviderError::Api {
                status: Some(status.as_u16()),
                message: upstream_error_message(status, &body),
            });
        }

        let payload: CompletionPayload = serde_json::from_str(&body)
            .map_err(|e| ProviderError::UnrecognizedShape(e.to_string()))?;

        Ok(Generation {
            text: payload.into_text()?,
        })
    }
}

// ============================================================================
// Chat Completions Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u32>,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

/// Chat completion, or the flattened `output_text` of the responses API.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum CompletionPayload {
    Chat { choices: Vec<Choice> },
    Output { output_text: String },
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: AssistantMessage,
}

#[derive(Debug, Deserialize)]
struct AssistantMessage {
    #[serde(default)]
    content: Option<String>,
}

impl CompletionPayload {
    fn into_text(self) -> Result<String, ProviderError> {
        match self {
            CompletionPayload::Chat { choices } => choices
                .into_iter()
                .next()
                .map(|c| c.message.content.unwrap_or_default())
                .ok_or_else(|| ProviderError::UnrecognizedShape("no choices returned".into())),
            CompletionPayload::Output { output_text } => Ok(output_text),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ProviderKind;

    fn parse(body: &str) -> Result<String, ProviderError> {
        serde_json::from_str::<CompletionPayload>(body)
            .map_err(|e| ProviderError::UnrecognizedShape(e.to_string()))?
            .into_text()
    }

    #[test]
    fn first_choice_content() {
        let body =
            r#"{"id":"x","choices":[{"index":0,"message":{"role":"assistant","content":"Boo!"}}]}"#;
        assert_eq!(parse(body).unwrap(), "Boo!");
    }

    #[test]
    fn null_content_becomes_empty() {
        let body = r#"{"choices":[{"message":{"role":"assistant","content":null}}]}"#;
        assert_eq!(parse(body).unwrap(), "");
    }

    #[test]
    fn output_text_shape() {
        assert_eq!(parse(r#"{"output_text":"hello"}"#).unwrap(), "hello");
    }

    #[test]
    fn no_choices_or_unknown_shape_fail() {
        assert!(matches!(
            parse(r#"{"choices":[]}"#),
            Err(ProviderError::UnrecognizedShape(_))
        ));
        assert!(parse(r#"[{"generated_text":"wrong provider"}]"#).is_err());
    }

    #[test]
    fn messages_carry_system_then_user() {
        let config = UpstreamConfig::for_provider(ProviderKind::OpenAi, Some("sk-test"));
        let provider = OpenAiProvider::new(&config).unwrap();
        let prompt = Prompt::new("Be brief.", "Why?");
        let messages = provider.messages(&prompt);

        assert_eq!(messages.len(), 2);
        assert_eq!(messages[0].role, "system");
        assert_eq!(messages[1].content, "Why?");
    }
}
