//! Boundary operations of the interview core.
//!
//! `InterviewService` is what the HTTP server and the terminal runner talk
//! to. It owns the session store and the collaborators, looks sessions up,
//! rejects bad requests and delegates the dialogue itself to
//! [`TurnController`] and [`FeedbackReducer`]. Every operation on one
//! session runs under that session's lock, so two turns for the same
//! interview are applied one after the other.

use crate::completion::CompletionModel;
use crate::config::InterviewConfig;
use crate::error::{InterviewError, Result};
use crate::feedback::{FeedbackReducer, FeedbackResult};
use crate::prompts::PromptSet;
use crate::session::{ExperienceLevel, InterviewRole, Session, SessionSummary};
use crate::speech::{Synthesizer, Transcriber, TranscriptionError, audio_data_url, decode_base64_audio};
use crate::stage::{Continuation, InterviewStage};
use crate::store::{InMemorySessionStore, SessionHandle, SessionStore};
use crate::turn::{TurnController, TurnOutcome};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tokio::task::JoinHandle;

/// Result of `start`: the fresh session plus the interviewer's greeting.
#[derive(Debug, Clone, Serialize)]
pub struct StartedInterview {
    pub session: Session,
    pub opening: TurnOutcome,
}

/// What the candidate gets back for one submitted turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TurnReply {
    pub session_id: String,
    pub text_response: String,
    /// `data:audio/wav;base64,...` when speech synthesis is available.
    pub audio_url: Option<String>,
    pub stage: InterviewStage,
    pub question_number: u32,
    pub continuation: Continuation,
    /// The recognized text for voice turns.
    pub transcript: Option<String>,
}

pub struct InterviewService {
    store: Arc<dyn SessionStore>,
    turns: TurnController,
    feedback: FeedbackReducer,
    transcriber: Option<Arc<dyn Transcriber>>,
    synthesizer: Option<Arc<dyn Synthesizer>>,
    config: InterviewConfig,
}

impl InterviewService {
    pub fn new(
        model: Arc<dyn CompletionModel>,
        prompts: PromptSet,
        config: InterviewConfig,
    ) -> Self {
        let prompts = Arc::new(prompts);
        Self {
            store: Arc::new(InMemorySessionStore::new()),
            turns: TurnController::new(model.clone(), prompts.clone(), config.clone()),
            feedback: FeedbackReducer::new(model, prompts, config.completion_timeout),
            transcriber: None,
            synthesizer: None,
            config,
        }
    }

    pub fn with_store(mut self, store: Arc<dyn SessionStore>) -> Self {
        self.store = store;
        self
    }

    pub fn with_transcriber(mut self, transcriber: Arc<dyn Transcriber>) -> Self {
        self.transcriber = Some(transcriber);
        self
    }

    pub fn with_synthesizer(mut self, synthesizer: Arc<dyn Synthesizer>) -> Self {
        self.synthesizer = Some(synthesizer);
        self
    }

    /// Creates a session and runs the opening turn, so the greeting is part
    /// of the response.
    pub async fn start(
        &self,
        role: InterviewRole,
        level: ExperienceLevel,
        candidate_name: Option<String>,
    ) -> StartedInterview {
        self.sweep_expired().await;

        let mut session = Session::new(role, level, candidate_name);
        tracing::info!(
            "Starting new interview session: {} ({} / {})",
            session.session_id(),
            role,
            level
        );
        let opening = self.turns.advance(&mut session, None).await;
        let snapshot = session.clone();
        self.store.put(session).await;

        tracing::info!(
            "Interview session {} started successfully",
            snapshot.session_id()
        );
        StartedInterview {
            session: snapshot,
            opening,
        }
    }

    pub async fn submit_turn(&self, session_id: &str, utterance: &str) -> Result<TurnReply> {
        let handle = self.handle(session_id).await?;
        if utterance.trim().is_empty() {
            return Err(InterviewError::invalid_input("Message cannot be empty"));
        }
        tracing::info!("Processing text message for session {}", session_id);

        let outcome = self.advance_locked(&handle, session_id, utterance).await?;
        let audio_url = self.synthesize(&outcome.utterance).await;
        Ok(reply(session_id, outcome, audio_url, None))
    }

    /// Transcribes base64 WAV audio and submits the text as a turn.
    pub async fn submit_voice_turn(&self, session_id: &str, audio_base64: &str) -> Result<TurnReply> {
        let handle = self.handle(session_id).await?;
        if handle.lock().await.is_terminal() {
            return Err(InterviewError::AlreadyEnded(session_id.to_string()));
        }
        tracing::info!("Processing voice message for session {}", session_id);

        let transcriber = self
            .transcriber
            .as_ref()
            .ok_or(TranscriptionError::Unavailable)?;
        let audio = decode_base64_audio(audio_base64)?;
        let text = transcriber.transcribe(audio).await.inspect_err(|e| {
            tracing::error!("Audio processing error for session {}: {}", session_id, e);
        })?;
        let text = text.trim().to_string();
        if text.is_empty() {
            tracing::warn!("Transcription for session {} was empty", session_id);
            return Err(TranscriptionError::Empty.into());
        }
        tracing::debug!("Transcribed {} chars for session {}", text.len(), session_id);

        let outcome = self.advance_locked(&handle, session_id, &text).await?;
        let audio_url = self.synthesize(&outcome.utterance).await;
        Ok(reply(session_id, outcome, audio_url, Some(text)))
    }

    pub async fn get_feedback(&self, session_id: &str) -> Result<FeedbackResult> {
        let handle = self.handle(session_id).await?;
        let (questions, answers, role, level) = {
            let session = handle.lock().await;
            (
                session.questions_asked().to_vec(),
                session.answers_given().to_vec(),
                session.role(),
                session.experience_level(),
            )
        };
        tracing::info!("Generating feedback for session {}", session_id);
        Ok(self
            .feedback
            .summarize(&questions, &answers, role, level)
            .await)
    }

    pub async fn get_session(&self, session_id: &str) -> Result<Session> {
        let handle = self.handle(session_id).await?;
        let session = handle.lock().await.clone();
        Ok(session)
    }

    /// Marks the session ended. Ending twice keeps the first timestamp.
    pub async fn end_session(&self, session_id: &str) -> Result<DateTime<Utc>> {
        let handle = self.handle(session_id).await?;
        let ended_at = handle.lock().await.end(Utc::now());
        tracing::info!("Interview session {} ended", session_id);
        Ok(ended_at)
    }

    pub async fn delete_session(&self, session_id: &str) -> Result<()> {
        if self.store.delete(session_id).await {
            tracing::info!("Interview session {} deleted", session_id);
            Ok(())
        } else {
            Err(InterviewError::not_found(session_id))
        }
    }

    pub async fn list_active_sessions(&self) -> Vec<SessionSummary> {
        self.sweep_expired().await;
        self.store.list_active().await
    }

    /// Evicts idle sessions and returns how many were removed.
    pub async fn sweep_expired(&self) -> usize {
        self.store
            .sweep_expired(Utc::now(), self.config.session_timeout)
            .await
            .len()
    }

    /// Sweeps idle sessions every `sweep_interval` until the task is aborted.
    pub fn spawn_sweeper(self: &Arc<Self>) -> JoinHandle<()> {
        let service = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(service.config.sweep_interval);
            loop {
                interval.tick().await;
                let evicted = service.sweep_expired().await;
                if evicted > 0 {
                    tracing::info!("Session sweep evicted {} idle sessions", evicted);
                }
            }
        })
    }

    async fn handle(&self, session_id: &str) -> Result<SessionHandle> {
        self.store
            .get(session_id)
            .await
            .ok_or_else(|| InterviewError::not_found(session_id))
    }

    async fn advance_locked(
        &self,
        handle: &SessionHandle,
        session_id: &str,
        utterance: &str,
    ) -> Result<TurnOutcome> {
        let mut session = handle.lock().await;
        // The session may have been swept or deleted while we waited.
        let current = self.store.get(session_id).await;
        if !current.is_some_and(|current| Arc::ptr_eq(&current, handle)) {
            return Err(InterviewError::not_found(session_id));
        }
        if session.is_terminal() {
            return Err(InterviewError::AlreadyEnded(session_id.to_string()));
        }
        Ok(self
            .turns
            .advance(&mut session, Some(utterance.to_string()))
            .await)
    }

    // Synthesis never blocks the text reply: failures degrade to no audio.
    async fn synthesize(&self, text: &str) -> Option<String> {
        let synthesizer = self.synthesizer.as_ref()?;
        match synthesizer.synthesize(text).await {
            Ok(audio) if !audio.is_empty() => Some(audio_data_url(&audio)),
            Ok(_) => None,
            Err(e) => {
                tracing::warn!("TTS error: {}", e);
                None
            }
        }
    }
}

fn reply(
    session_id: &str,
    outcome: TurnOutcome,
    audio_url: Option<String>,
    transcript: Option<String>,
) -> TurnReply {
    TurnReply {
        session_id: session_id.to_string(),
        text_response: outcome.utterance,
        audio_url,
        stage: outcome.stage,
        question_number: outcome.question_number,
        continuation: outcome.continuation,
        transcript,
    }
}
