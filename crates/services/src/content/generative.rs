use std::collections::HashMap;
use std::env;

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use study_core::model::{Lesson, Reminder, Subject};

use super::ContentProvider;
use super::payload::{build_prompt, parse_reminders};
use crate::error::ContentError;

const SYSTEM_PROMPT: &str =
    "You write concise study material for school students and always answer with valid JSON.";

#[derive(Clone, Debug)]
pub struct ContentConfig {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
}

impl ContentConfig {
    #[must_use]
    pub fn from_env() -> Option<Self> {
        let api_key = env::var("STUDY_AI_API_KEY").ok()?;
        if api_key.trim().is_empty() {
            return None;
        }
        let base_url =
            env::var("STUDY_AI_BASE_URL").unwrap_or_else(|_| "https://api.openai.com/v1".into());
        let model = env::var("STUDY_AI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".into());
        Some(Self {
            base_url,
            api_key,
            model,
        })
    }
}

/// Generates reminders through an OpenAI-compatible chat completions API.
#[derive(Clone)]
pub struct GenerativeContentProvider {
    client: Client,
    config: Option<ContentConfig>,
}

impl GenerativeContentProvider {
    #[must_use]
    pub fn from_env() -> Self {
        Self::new(ContentConfig::from_env())
    }

    #[must_use]
    pub fn new(config: Option<ContentConfig>) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    #[must_use]
    pub fn enabled(&self) -> bool {
        self.config.is_some()
    }

    async fn complete(&self, prompt: String) -> Result<String, ContentError> {
        let config = self.config.as_ref().ok_or(ContentError::Disabled)?;

        let url = format!(
            "{}/chat/completions",
            config.base_url.trim_end_matches('/')
        );
        let payload = ChatRequest {
            model: config.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT.to_string(),
                },
                ChatMessage {
                    role: "user",
                    content: prompt,
                },
            ],
            temperature: 0.7,
        };

        let response = self
            .client
            .post(url)
            .bearer_auth(&config.api_key)
            .json(&payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(ContentError::HttpStatus(response.status()));
        }

        let body: ChatResponse = response.json().await?;
        body.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .filter(|content| !content.trim().is_empty())
            .ok_or(ContentError::EmptyResponse)
    }
}

#[async_trait]
impl ContentProvider for GenerativeContentProvider {
    async fn fetch(
        &self,
        subjects: &[Subject],
        lessons: &[Lesson],
    ) -> Result<HashMap<Subject, Reminder>, ContentError> {
        let content = self.complete(build_prompt(subjects, lessons)).await?;
        let reminders = parse_reminders(&content)?;
        tracing::debug!(subjects = reminders.len(), "parsed generated reminders");
        Ok(reminders)
    }
}

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage {
    role: &'static str,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessageResponse,
}

#[derive(Debug, Deserialize)]
struct ChatMessageResponse {
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn disabled_provider_refuses_to_fetch() {
        let provider = GenerativeContentProvider::new(None);
        assert!(!provider.enabled());
        let err = provider.fetch(&[], &[]).await.unwrap_err();
        assert!(matches!(err, ContentError::Disabled));
    }

    #[test]
    fn chat_response_tolerates_missing_content() {
        let body: ChatResponse =
            serde_json::from_str(r#"{"choices": [{"message": {"role": "assistant"}}]}"#).unwrap();
        assert!(body.choices[0].message.content.is_none());
    }
}
