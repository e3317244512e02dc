use crate::completion::{CompletionModel, ModelError};
use crate::config::InterviewConfig;
use crate::context::ContextBuilder;
use crate::message::Utterance;
use crate::prompts::PromptSet;
use crate::session::Session;
use crate::stage::{Continuation, ContinuationPolicy, InterviewStage};
use chrono::Utc;
use serde::Serialize;
use std::sync::Arc;

/// Substituted when the model answers with nothing usable.
pub const EMPTY_REPLY_FALLBACK: &str = "Could you please elaborate on your previous answer?";

/// Substituted when the model call fails or times out.
pub const ERROR_REPLY_FALLBACK: &str = "I apologize for the technical difficulty. \
Let's continue with the interview. Could you tell me more about your background?";

/// What a caller learns from one advanced turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnOutcome {
    pub utterance: String,
    pub stage: InterviewStage,
    pub question_number: u32,
    pub continuation: Continuation,
    /// True when the utterance is a fallback rather than model output.
    pub fallback: bool,
}

/// Drives the interview state machine one turn at a time.
///
/// Completion failures never escape `advance`: they are logged and replaced
/// by a fallback utterance, and the counters move exactly as they would have
/// with a real reply.
pub struct TurnController {
    model: Arc<dyn CompletionModel>,
    prompts: Arc<PromptSet>,
    config: InterviewConfig,
    policy: ContinuationPolicy,
}

impl TurnController {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        prompts: Arc<PromptSet>,
        config: InterviewConfig,
    ) -> Self {
        let policy = ContinuationPolicy::new(config.question_limit);
        Self {
            model,
            prompts,
            config,
            policy,
        }
    }

    /// Runs one turn. `candidate_input` of `None` (or blank text) is an
    /// interviewer-only turn and leaves the question counter untouched.
    pub async fn advance(
        &self,
        session: &mut Session,
        candidate_input: Option<String>,
    ) -> TurnOutcome {
        let answered = match candidate_input {
            Some(text) if !text.trim().is_empty() => {
                session.record_candidate(text);
                true
            }
            _ => false,
        };

        let messages =
            ContextBuilder::new(&self.prompts, self.config.history_window).build(session);

        let (utterance, fallback) = match self.complete_with_timeout(&messages).await {
            Ok(text) if !text.trim().is_empty() => (text.trim().to_string(), false),
            Ok(_) => {
                tracing::warn!(
                    "Empty completion for session {}; using fallback",
                    session.session_id()
                );
                (EMPTY_REPLY_FALLBACK.to_string(), true)
            }
            Err(e) => {
                tracing::error!(
                    "Completion failed for session {}: {}. Using fallback",
                    session.session_id(),
                    e
                );
                (ERROR_REPLY_FALLBACK.to_string(), true)
            }
        };

        session.record_interviewer(utterance.clone(), self.config.min_question_len);
        if answered {
            session.advance_question();
        }
        session.sync_stage();

        let continuation = self.policy.should_continue(session.question_number());
        if continuation == Continuation::End {
            session.mark_completed();
        }
        session.touch(Utc::now());

        tracing::info!(
            "Session {} advanced: stage={}, question={}, continuation={:?}",
            session.session_id(),
            session.stage(),
            session.question_number(),
            continuation
        );

        TurnOutcome {
            utterance,
            stage: session.stage(),
            question_number: session.question_number(),
            continuation,
            fallback,
        }
    }

    async fn complete_with_timeout(
        &self,
        messages: &[Utterance],
    ) -> Result<String, ModelError> {
        let limit = self.config.completion_timeout;
        match tokio::time::timeout(limit, self.model.complete(messages)).await {
            Ok(result) => result,
            Err(_) => Err(ModelError::Timeout(limit)),
        }
    }
}
