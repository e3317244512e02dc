//! Configuration shared by every runtime that hosts the interview core.
//!
//! `InterviewConfig` carries the dialogue tuning knobs and `ProviderConfig`
//! selects and authenticates the completion and speech collaborators. Both
//! can be read from the environment (after loading a `.env` file) or from any
//! key lookup, which keeps them testable without touching process state.

use crate::completion::{CompletionModel, OpenAiChatModel};
use crate::gemini::GeminiChatModel;
use crate::offline::OfflineInterviewer;
use crate::speech::OpenAiSpeech;
use secrecy::{ExposeSecret, SecretString};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

/// A custom error type for configuration loading failures.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingVar(String),
    #[error("Invalid value for environment variable {0}: {1}")]
    InvalidValue(String, String),
}

/// Tuning knobs for the dialogue state machine and session lifecycle.
#[derive(Debug, Clone, PartialEq)]
pub struct InterviewConfig {
    /// How many history entries follow the system context in a prompt.
    pub history_window: usize,
    /// Answered questions after which the interview ends.
    pub question_limit: u32,
    pub completion_timeout: Duration,
    /// Idle time after which a session is evicted.
    pub session_timeout: Duration,
    /// Interviewer utterances must be longer than this (in chars) to count as questions.
    pub min_question_len: usize,
    pub sweep_interval: Duration,
}

impl Default for InterviewConfig {
    fn default() -> Self {
        Self {
            history_window: 10,
            question_limit: 8,
            completion_timeout: Duration::from_secs(30),
            session_timeout: Duration::from_secs(1800),
            min_question_len: 10,
            sweep_interval: Duration::from_secs(60),
        }
    }
}

impl InterviewConfig {
    /// Reads overrides for the defaults:
    ///
    /// *   `HISTORY_WINDOW`: history entries per prompt. Defaults to 10.
    /// *   `MAX_QUESTIONS`: answered questions before the interview ends. Defaults to 8.
    /// *   `COMPLETION_TIMEOUT_SECS`: model call timeout. Defaults to 30.
    /// *   `SESSION_TIMEOUT_SECS`: idle session expiry. Defaults to 1800.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let question_limit = parse_or(&lookup, "MAX_QUESTIONS", defaults.question_limit)?;
        if question_limit < 1 {
            return Err(ConfigError::InvalidValue(
                "MAX_QUESTIONS".to_string(),
                "must be at least 1".to_string(),
            ));
        }
        Ok(Self {
            history_window: parse_or(&lookup, "HISTORY_WINDOW", defaults.history_window)?,
            question_limit,
            completion_timeout: Duration::from_secs(parse_or(
                &lookup,
                "COMPLETION_TIMEOUT_SECS",
                defaults.completion_timeout.as_secs(),
            )?),
            session_timeout: Duration::from_secs(parse_or(
                &lookup,
                "SESSION_TIMEOUT_SECS",
                defaults.session_timeout.as_secs(),
            )?),
            ..defaults
        })
    }
}

/// Supported completion backends.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    OpenAI,
    Gemini,
    /// Canned interviewer that never leaves the process.
    Offline,
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "openai" => Ok(Provider::OpenAI),
            "gemini" | "google" => Ok(Provider::Gemini),
            "offline" => Ok(Provider::Offline),
            other => Err(ConfigError::InvalidValue(
                "INTERVIEW_PROVIDER".to_string(),
                format!("unknown provider '{other}'"),
            )),
        }
    }
}

/// Which collaborators to build and how to reach them.
pub struct ProviderConfig {
    pub provider: Provider,
    pub openai_api_key: Option<SecretString>,
    pub gemini_api_key: Option<SecretString>,
    pub chat_model: String,
    pub openai_base_url: Option<String>,
    pub speech_enabled: bool,
    pub prompts_dir: Option<PathBuf>,
}

impl ProviderConfig {
    /// Loads provider settings from the process environment.
    ///
    /// *   `INTERVIEW_PROVIDER`: "openai", "gemini" or "offline". Defaults to "openai".
    /// *   `OPENAI_API_KEY`: required for "openai"; also enables speech.
    /// *   `GEMINI_API_KEY` (or `GOOGLE_API_KEY`): required for "gemini".
    /// *   `CHAT_MODEL`: (Optional) model name. Defaults per provider.
    /// *   `OPENAI_BASE_URL`: (Optional) alternative OpenAI-compatible endpoint.
    /// *   `SPEECH_ENABLED`: (Optional) "false" disables transcription and synthesis.
    /// *   `PROMPTS_DIR`: (Optional) directory of `*.md` prompt overrides.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let provider = match non_empty(&lookup, "INTERVIEW_PROVIDER") {
            Some(value) => value.parse::<Provider>()?,
            None => Provider::OpenAI,
        };

        let openai_api_key = non_empty(&lookup, "OPENAI_API_KEY").map(SecretString::from);
        let gemini_api_key = non_empty(&lookup, "GEMINI_API_KEY")
            .or_else(|| non_empty(&lookup, "GOOGLE_API_KEY"))
            .map(SecretString::from);

        let chat_model = non_empty(&lookup, "CHAT_MODEL").unwrap_or_else(|| match provider {
            Provider::Gemini => "gemini-2.0-flash".to_string(),
            Provider::OpenAI | Provider::Offline => "gpt-4o".to_string(),
        });

        let speech_enabled = parse_or(&lookup, "SPEECH_ENABLED", true)?;

        // Validate that the required API key is present for the selected provider.
        match provider {
            Provider::OpenAI if openai_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "OPENAI_API_KEY must be set for 'openai' provider".to_string(),
                ));
            }
            Provider::Gemini if gemini_api_key.is_none() => {
                return Err(ConfigError::MissingVar(
                    "GEMINI_API_KEY must be set for 'gemini' provider".to_string(),
                ));
            }
            _ => {}
        }

        Ok(Self {
            provider,
            openai_api_key,
            gemini_api_key,
            chat_model,
            openai_base_url: non_empty(&lookup, "OPENAI_BASE_URL"),
            speech_enabled,
            prompts_dir: non_empty(&lookup, "PROMPTS_DIR").map(PathBuf::from),
        })
    }

    /// Builds the completion collaborator for the configured provider.
    pub fn build_model(&self) -> Result<Arc<dyn CompletionModel>, ConfigError> {
        match self.provider {
            Provider::OpenAI => {
                let key = self
                    .openai_api_key
                    .as_ref()
                    .map(reveal)
                    .ok_or_else(|| ConfigError::MissingVar("OPENAI_API_KEY".to_string()))?;
                let mut model = OpenAiChatModel::new(key, self.chat_model.clone());
                if let Some(base_url) = &self.openai_base_url {
                    model = model.with_base_url(base_url);
                }
                Ok(Arc::new(model))
            }
            Provider::Gemini => {
                let key = self
                    .gemini_api_key
                    .as_ref()
                    .map(reveal)
                    .ok_or_else(|| ConfigError::MissingVar("GEMINI_API_KEY".to_string()))?;
                Ok(Arc::new(GeminiChatModel::new(key, self.chat_model.clone())))
            }
            Provider::Offline => Ok(Arc::new(OfflineInterviewer)),
        }
    }

    /// Builds the speech collaborator when an OpenAI key is available and
    /// speech has not been switched off.
    pub fn build_speech(&self) -> Option<Arc<OpenAiSpeech>> {
        if !self.speech_enabled {
            return None;
        }
        let key = self.openai_api_key.as_ref().map(reveal)?;
        let mut speech = OpenAiSpeech::new(key);
        if let Some(base_url) = &self.openai_base_url {
            speech = speech.with_base_url(base_url);
        }
        Some(Arc::new(speech))
    }
}

// Re-wraps a secret for a collaborator that takes ownership of its key.
fn reveal(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}

fn non_empty<F>(lookup: &F, key: &str) -> Option<String>
where
    F: Fn(&str) -> Option<String>,
{
    lookup(key)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn parse_or<F, T>(lookup: &F, key: &str, default: T) -> Result<T, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
    T::Err: std::fmt::Display,
{
    match non_empty(lookup, key) {
        Some(raw) => raw
            .parse::<T>()
            .map_err(|e| ConfigError::InvalidValue(key.to_string(), e.to_string())),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_interview_config_defaults() {
        let config = InterviewConfig::from_lookup(lookup_from(&[])).unwrap();
        assert_eq!(config, InterviewConfig::default());
        assert_eq!(config.history_window, 10);
        assert_eq!(config.question_limit, 8);
        assert_eq!(config.session_timeout, Duration::from_secs(1800));
    }

    #[test]
    fn test_interview_config_overrides() {
        let config = InterviewConfig::from_lookup(lookup_from(&[
            ("HISTORY_WINDOW", "4"),
            ("MAX_QUESTIONS", "5"),
            ("COMPLETION_TIMEOUT_SECS", "3"),
        ]))
        .unwrap();
        assert_eq!(config.history_window, 4);
        assert_eq!(config.question_limit, 5);
        assert_eq!(config.completion_timeout, Duration::from_secs(3));
    }

    #[test]
    fn test_interview_config_rejects_garbage() {
        let err = InterviewConfig::from_lookup(lookup_from(&[("MAX_QUESTIONS", "eight")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "MAX_QUESTIONS"));
    }

    #[test]
    fn test_zero_question_limit_is_rejected() {
        let err =
            InterviewConfig::from_lookup(lookup_from(&[("MAX_QUESTIONS", "0")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue(key, _) if key == "MAX_QUESTIONS"));
    }

    #[test]
    fn test_openai_provider_requires_key() {
        let err = ProviderConfig::from_lookup(lookup_from(&[])).err().unwrap();
        assert!(matches!(err, ConfigError::MissingVar(_)));
    }

    #[test]
    fn test_gemini_falls_back_to_google_key() {
        let config = ProviderConfig::from_lookup(lookup_from(&[
            ("INTERVIEW_PROVIDER", "gemini"),
            ("GOOGLE_API_KEY", "g-key"),
        ]))
        .unwrap();
        assert_eq!(config.provider, Provider::Gemini);
        assert!(config.gemini_api_key.is_some());
        assert_eq!(config.chat_model, "gemini-2.0-flash");
        assert!(config.build_speech().is_none());
    }

    #[test]
    fn test_offline_provider_needs_no_keys() {
        let config =
            ProviderConfig::from_lookup(lookup_from(&[("INTERVIEW_PROVIDER", "offline")]))
                .unwrap();
        assert_eq!(config.provider, Provider::Offline);
        assert!(config.build_model().is_ok());
    }

    #[test]
    fn test_speech_can_be_disabled() {
        let config = ProviderConfig::from_lookup(lookup_from(&[
            ("OPENAI_API_KEY", "sk-test"),
            ("SPEECH_ENABLED", "false"),
        ]))
        .unwrap();
        assert!(config.build_speech().is_none());
    }

    #[test]
    fn test_unknown_provider_is_rejected() {
        let err = ProviderConfig::from_lookup(lookup_from(&[("INTERVIEW_PROVIDER", "llama")]))
            .err()
            .unwrap();
        assert!(matches!(err, ConfigError::InvalidValue(..)));
    }
}
