use anyhow::{Context, Result};
use interview_core::{InterviewConfig, ProviderConfig};
use tracing::Level;

/// Everything the terminal runner reads from the environment.
pub struct Config {
    pub log_level: Level,
    pub provider: ProviderConfig,
    pub interview: InterviewConfig,
}

impl Config {
    /// Loads `.env` and the usual provider and interview variables.
    ///
    /// `offline` forces the network-free interviewer regardless of
    /// `INTERVIEW_PROVIDER`, so no API key is required.
    pub fn from_env(offline: bool) -> Result<Self> {
        dotenvy::dotenv().ok();

        let log_level_str = std::env::var("RUST_LOG").unwrap_or_else(|_| "WARN".to_string());
        let log_level = log_level_str
            .parse::<Level>()
            .with_context(|| format!("'{}' is not a valid log level", log_level_str))?;

        let provider = ProviderConfig::from_lookup(|key| {
            if offline && key == "INTERVIEW_PROVIDER" {
                Some("offline".to_string())
            } else {
                std::env::var(key).ok()
            }
        })
        .context("Failed to load provider configuration")?;
        let interview = InterviewConfig::from_lookup(|key| std::env::var(key).ok())
            .context("Failed to load interview configuration")?;

        Ok(Self {
            log_level,
            provider,
            interview,
        })
    }
}
