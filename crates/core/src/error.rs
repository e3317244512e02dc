use crate::speech::TranscriptionError;
use thiserror::Error;

/// Errors surfaced to callers of the interview boundary operations.
///
/// Completion failures never reach this type: turns absorb them into a
/// fallback utterance and feedback into a zero-score result. Synthesis
/// failures only drop the audio from a reply.
#[derive(Debug, Error)]
pub enum InterviewError {
    #[error("Session not found: {0}")]
    NotFound(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Interview {0} has already ended")]
    AlreadyEnded(String),

    #[error("Could not transcribe audio: {0}")]
    Transcription(#[from] TranscriptionError),
}

impl InterviewError {
    pub fn not_found(session_id: impl Into<String>) -> Self {
        Self::NotFound(session_id.into())
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

pub type Result<T, E = InterviewError> = std::result::Result<T, E>;
