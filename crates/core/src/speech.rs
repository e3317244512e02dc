//! Optional speech collaborators: transcription of candidate audio and
//! synthesis of interviewer replies.

use crate::completion::OPENAI_API_BASE;
use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
#[cfg(test)]
use mockall::automock;
use reqwest::Client;
use reqwest::multipart::{Form, Part};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

#[derive(Debug, thiserror::Error)]
pub enum TranscriptionError {
    #[error("audio payload could not be decoded: {0}")]
    Decode(String),
    #[error("speech recognition is not available")]
    Unavailable,
    #[error("transcription request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("transcription service returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("no speech was recognized")]
    Empty,
}

#[derive(Debug, thiserror::Error)]
pub enum SynthesisError {
    #[error("synthesis request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("synthesis service returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Transcriber: Send + Sync {
    /// Converts WAV audio into text.
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, TranscriptionError>;
}

#[cfg_attr(test, automock)]
#[async_trait]
pub trait Synthesizer: Send + Sync {
    /// Converts text into WAV audio.
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError>;
}

/// Decodes a base64 audio payload, accepting an optional `data:...;base64,` prefix.
pub fn decode_base64_audio(payload: &str) -> Result<Vec<u8>, TranscriptionError> {
    let encoded = match payload.split_once(',') {
        Some((_, data)) => data,
        None => payload,
    };
    let bytes = STANDARD
        .decode(encoded.trim())
        .map_err(|e| TranscriptionError::Decode(e.to_string()))?;
    if bytes.is_empty() {
        return Err(TranscriptionError::Decode("audio payload is empty".to_string()));
    }
    Ok(bytes)
}

/// Wraps WAV bytes in a data URL a browser can play directly.
pub fn audio_data_url(audio: &[u8]) -> String {
    format!("data:audio/wav;base64,{}", STANDARD.encode(audio))
}

#[derive(Debug, Deserialize)]
struct TranscriptionResponse {
    text: String,
}

#[derive(Debug, Serialize)]
struct SpeechRequest<'a> {
    model: &'a str,
    voice: &'a str,
    input: &'a str,
    response_format: &'a str,
}

/// Whisper transcription and TTS over the OpenAI audio endpoints.
pub struct OpenAiSpeech {
    client: Client,
    api_key: SecretString,
    base_url: String,
    transcription_model: String,
    speech_model: String,
    voice: String,
}

impl OpenAiSpeech {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            client: Client::new(),
            api_key,
            base_url: OPENAI_API_BASE.to_string(),
            transcription_model: "whisper-1".to_string(),
            speech_model: "tts-1".to_string(),
            voice: "alloy".to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }
}

#[async_trait]
impl Transcriber for OpenAiSpeech {
    async fn transcribe(&self, audio: Vec<u8>) -> Result<String, TranscriptionError> {
        let file = Part::bytes(audio)
            .file_name("audio.wav")
            .mime_str("audio/wav")?;
        let form = Form::new()
            .text("model", self.transcription_model.clone())
            .text("language", "en")
            .part("file", file);

        let resp = self
            .client
            .post(format!("{}/audio/transcriptions", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .multipart(form)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(TranscriptionError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let text = resp.json::<TranscriptionResponse>().await?.text;
        let text = text.trim();
        if text.is_empty() {
            return Err(TranscriptionError::Empty);
        }
        Ok(text.to_string())
    }
}

#[async_trait]
impl Synthesizer for OpenAiSpeech {
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>, SynthesisError> {
        let body = SpeechRequest {
            model: &self.speech_model,
            voice: &self.voice,
            input: text,
            response_format: "wav",
        };

        let resp = self
            .client
            .post(format!("{}/audio/speech", self.base_url))
            .bearer_auth(self.api_key.expose_secret())
            .json(&body)
            .send()
            .await?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(SynthesisError::Status {
                status: status.as_u16(),
                body,
            });
        }

        Ok(resp.bytes().await?.to_vec())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_plain_base64() {
        let bytes = decode_base64_audio("UklGRg==").unwrap();
        assert_eq!(bytes, b"RIFF");
    }

    #[test]
    fn test_decode_strips_data_url_prefix() {
        let bytes = decode_base64_audio("data:audio/wav;base64,UklGRg==").unwrap();
        assert_eq!(bytes, b"RIFF");
    }

    #[test]
    fn test_decode_rejects_garbage_and_empty() {
        assert!(matches!(
            decode_base64_audio("not base64 at all!"),
            Err(TranscriptionError::Decode(_))
        ));
        assert!(matches!(
            decode_base64_audio(""),
            Err(TranscriptionError::Decode(_))
        ));
    }

    #[test]
    fn test_data_url_round_trips_through_decoder() {
        let url = audio_data_url(b"RIFF");
        assert!(url.starts_with("data:audio/wav;base64,"));
        assert_eq!(decode_base64_audio(&url).unwrap(), b"RIFF");
    }
}
