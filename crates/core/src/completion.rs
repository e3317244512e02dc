use crate::message::{Speaker, Utterance};
use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use std::time::Duration;

pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1";

/// Failure of the text-generation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum ModelError {
    #[error("completion timed out after {0:?}")]
    Timeout(Duration),
    #[error("completion request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("completion service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("completion service returned no content")]
    EmptyResponse,
    #[error("completion service unavailable: {0}")]
    Unavailable(String),
}

// The `CompletionModel` trait is the only way the interview core talks to a
// language model. The turn controller and feedback reducer depend on this
// abstraction, so tests can swap in `MockCompletionModel` and the services can
// pick a provider at startup.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait CompletionModel: Send + Sync {
    /// Produces the next piece of text for an ordered list of messages.
    async fn complete(&self, messages: &[Utterance]) -> Result<String, ModelError>;
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChoiceMessage,
}

#[derive(Debug, Deserialize)]
struct ChoiceMessage {
    content: Option<String>,
}

/// Chat-completions client for OpenAI and compatible endpoints.
pub struct OpenAiChatModel {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
    temperature: f32,
}

impl OpenAiChatModel {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: OPENAI_API_BASE.to_string(),
            temperature: 0.7,
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

fn openai_role(speaker: Speaker) -> &'static str {
    match speaker {
        Speaker::System => "system",
        Speaker::Candidate => "user",
        Speaker::Interviewer => "assistant",
    }
}

#[async_trait]
impl CompletionModel for OpenAiChatModel {
    async fn complete(&self, messages: &[Utterance]) -> Result<String, ModelError> {
        let body = ChatRequest {
            model: &self.model,
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: openai_role(m.speaker),
                    content: &m.text,
                })
                .collect(),
            temperature: self.temperature,
        };

        let resp = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ModelError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let resp = resp.json::<ChatResponse>().await?;
        resp.choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or(ModelError::EmptyResponse)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::env;

    #[test]
    fn test_request_maps_speakers_to_chat_roles() {
        let messages = [
            Utterance::system("frame"),
            Utterance::interviewer("Hello, could you introduce yourself?"),
            Utterance::candidate("Sure."),
        ];
        let body = ChatRequest {
            model: "gpt-4o",
            messages: messages
                .iter()
                .map(|m| ChatMessage {
                    role: openai_role(m.speaker),
                    content: &m.text,
                })
                .collect(),
            temperature: 0.7,
        };
        let json = serde_json::to_value(&body).unwrap();
        let roles: Vec<&str> = json["messages"]
            .as_array()
            .unwrap()
            .iter()
            .map(|m| m["role"].as_str().unwrap())
            .collect();
        assert_eq!(roles, vec!["system", "assistant", "user"]);
    }

    #[test]
    fn test_response_without_content_parses() {
        let resp: ChatResponse =
            serde_json::from_str(r#"{"choices":[{"message":{"content":null}}]}"#).unwrap();
        assert!(resp.choices[0].message.content.is_none());
    }

    // This is an integration test that makes a live call to the OpenAI API.
    // It is ignored by default; run it with `cargo test -- --ignored`.
    #[tokio::test]
    #[ignore]
    async fn test_live_completion() {
        dotenvy::dotenv_override().ok();
        let api_key = env::var("OPENAI_API_KEY").expect("OPENAI_API_KEY not set");
        let model = OpenAiChatModel::new(SecretString::from(api_key), "gpt-4o");

        let reply = model
            .complete(&[Utterance::system(
                "Greet the candidate and ask them to introduce themselves.",
            )])
            .await
            .expect("completion should succeed");
        assert!(!reply.trim().is_empty());
    }
}
