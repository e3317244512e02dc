pub mod completion;
pub mod config;
pub mod context;
pub mod error;
pub mod feedback;
pub mod gemini;
pub mod message;
pub mod offline;
pub mod prompt_loader;
pub mod prompts;
pub mod service;
pub mod session;
pub mod speech;
pub mod stage;
pub mod store;
pub mod turn;

pub use completion::{CompletionModel, ModelError};
pub use config::{ConfigError, InterviewConfig, Provider, ProviderConfig};
pub use error::{InterviewError, Result};
pub use feedback::{DetailedFeedback, FeedbackResult};
pub use message::{Speaker, Utterance};
pub use prompts::PromptSet;
pub use service::{InterviewService, StartedInterview, TurnReply};
pub use session::{ExperienceLevel, InterviewRole, QaPair, Session, SessionSummary};
pub use stage::{Continuation, InterviewStage};
pub use turn::TurnOutcome;
