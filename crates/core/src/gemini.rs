use crate::completion::{CompletionModel, ModelError};
use crate::message::{Speaker, Utterance};
use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

pub const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<Content>,
    contents: Vec<Content>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize, Deserialize)]
struct Content {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Serialize, Deserialize)]
struct Part {
    #[serde(default)]
    text: String,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<Content>,
}

/// `generateContent` client for Google's Gemini models.
pub struct GeminiChatModel {
    client: Client,
    api_key: SecretString,
    model: String,
    base_url: String,
}

impl GeminiChatModel {
    pub fn new(api_key: SecretString, model: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            api_key,
            model: model.into(),
            base_url: GEMINI_API_BASE.to_string(),
        }
    }

    fn build_request(messages: &[Utterance]) -> GenerateRequest {
        let system_text = messages
            .iter()
            .filter(|m| m.speaker == Speaker::System)
            .map(|m| m.text.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");

        let mut contents: Vec<Content> = messages
            .iter()
            .filter(|m| m.speaker != Speaker::System)
            .map(|m| Content {
                role: Some(
                    match m.speaker {
                        Speaker::Interviewer => "model",
                        _ => "user",
                    }
                    .to_string(),
                ),
                parts: vec![Part {
                    text: m.text.clone(),
                }],
            })
            .collect();

        // Gemini rejects requests without contents, so a framing-only prompt
        // is sent as the user turn itself.
        let system_instruction = if contents.is_empty() {
            contents.push(Content {
                role: Some("user".to_string()),
                parts: vec![Part { text: system_text }],
            });
            None
        } else if system_text.is_empty() {
            None
        } else {
            Some(Content {
                role: None,
                parts: vec![Part { text: system_text }],
            })
        };

        GenerateRequest {
            system_instruction,
            contents,
            generation_config: GenerationConfig { temperature: 0.7 },
        }
    }
}

#[async_trait]
impl CompletionModel for GeminiChatModel {
    async fn complete(&self, messages: &[Utterance]) -> Result<String, ModelError> {
        let body = Self::build_request(messages);

        let resp = self
            .client
            .post(format!(
                "{}/models/{}:generateContent",
                self.base_url, self.model
            ))
            .header("x-goog-api-key", self.api_key.expose_secret())
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

        let resp = resp.json::<GenerateResponse>().await?;
        let text = resp
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .map(|p| p.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .ok_or(ModelError::EmptyResponse)?;
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_framing_only_prompt_becomes_user_content() {
        let request = GeminiChatModel::build_request(&[Utterance::system("Greet the candidate.")]);
        assert!(request.system_instruction.is_none());
        assert_eq!(request.contents.len(), 1);
        assert_eq!(request.contents[0].role.as_deref(), Some("user"));
        assert_eq!(request.contents[0].parts[0].text, "Greet the candidate.");
    }

    #[test]
    fn test_history_is_split_from_system_instruction() {
        let request = GeminiChatModel::build_request(&[
            Utterance::system("Stage: technical"),
            Utterance::interviewer("What is a closure?"),
            Utterance::candidate("A function capturing its environment."),
        ]);
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(json["systemInstruction"]["parts"][0]["text"], "Stage: technical");
        assert_eq!(json["contents"][0]["role"], "model");
        assert_eq!(json["contents"][1]["role"], "user");
        let temperature = json["generationConfig"]["temperature"].as_f64().unwrap();
        assert!((temperature - 0.7).abs() < 1e-6);
    }

    #[test]
    fn test_response_text_parts_parse() {
        let resp: GenerateResponse = serde_json::from_str(
            r#"{"candidates":[{"content":{"role":"model","parts":[{"text":"Hello"},{"text":" there"}]}}]}"#,
        )
        .unwrap();
        let content = resp.candidates.into_iter().next().unwrap().content.unwrap();
        assert_eq!(content.parts.len(), 2);
    }
}
