use crate::error::ApiError;
use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use chrono::{DateTime, Utc};
use interview_core::{
    Continuation, ExperienceLevel, FeedbackResult, InterviewRole, InterviewService,
    InterviewStage, Session, SessionSummary, TurnReply,
};
use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::sync::Arc;

pub type AppState = Arc<InterviewService>;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/health", get(health))
        .route("/api/interview/start", post(start_interview))
        .route("/api/interview/text", post(process_text_message))
        .route("/api/interview/voice", post(process_voice_message))
        .route("/api/interview/sessions/active", get(active_sessions))
        .route("/api/interview/{session_id}/feedback", get(interview_feedback))
        .route("/api/interview/{session_id}/end", post(end_interview))
        .route(
            "/api/interview/{session_id}",
            get(get_session).delete(delete_session),
        )
        .with_state(state)
}

#[derive(Debug, Default, Deserialize)]
pub struct StartRequest {
    pub role: Option<String>,
    pub experience_level: Option<String>,
    pub user_name: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct TextMessageRequest {
    pub session_id: String,
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct VoiceMessageRequest {
    pub session_id: String,
    /// Base64 WAV, optionally as a data URL.
    pub audio_data: String,
}

/// Session snapshot as returned by `start` and `get`.
#[derive(Debug, Serialize, Deserialize)]
pub struct SessionView {
    pub session_id: String,
    pub role: InterviewRole,
    pub experience_level: ExperienceLevel,
    pub candidate_name: String,
    pub questions_asked: Vec<String>,
    pub answers_given: Vec<String>,
    pub current_stage: InterviewStage,
    pub question_number: u32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub completed: bool,
    /// The interviewer's opening line; only present on `start`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub greeting: Option<String>,
}

impl From<&Session> for SessionView {
    fn from(session: &Session) -> Self {
        Self {
            session_id: session.session_id().to_string(),
            role: session.role(),
            experience_level: session.experience_level(),
            candidate_name: session.candidate_name().to_string(),
            questions_asked: session.questions_asked().to_vec(),
            answers_given: session.answers_given().to_vec(),
            current_stage: session.stage(),
            question_number: session.question_number(),
            start_time: session.started_at(),
            end_time: session.ended_at(),
            completed: session.is_completed(),
            greeting: None,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct InterviewResponse {
    pub text_response: String,
    pub audio_url: Option<String>,
    pub session_id: String,
    pub current_stage: InterviewStage,
    pub question_number: u32,
    pub interview_complete: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub transcript: Option<String>,
}

impl From<TurnReply> for InterviewResponse {
    fn from(reply: TurnReply) -> Self {
        Self {
            text_response: reply.text_response,
            audio_url: reply.audio_url,
            session_id: reply.session_id,
            current_stage: reply.stage,
            question_number: reply.question_number,
            interview_complete: reply.continuation == Continuation::End,
            transcript: reply.transcript,
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ActiveSessions {
    pub total_active_sessions: usize,
    pub sessions: Vec<SessionSummary>,
}

async fn root() -> Json<Value> {
    Json(json!({
        "message": "Mock Interview Agent API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "start_interview": "/api/interview/start",
            "voice_message": "/api/interview/voice",
            "text_message": "/api/interview/text",
            "get_feedback": "/api/interview/{session_id}/feedback",
            "active_sessions": "/api/interview/sessions/active",
        }
    }))
}

async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy" }))
}

async fn start_interview(
    State(service): State<AppState>,
    Json(request): Json<StartRequest>,
) -> Result<Json<SessionView>, ApiError> {
    let role = match request.role.as_deref() {
        Some(role) => role.parse::<InterviewRole>()?,
        None => InterviewRole::default(),
    };
    let level = match request.experience_level.as_deref() {
        Some(level) => level.parse::<ExperienceLevel>()?,
        None => ExperienceLevel::default(),
    };

    let started = service.start(role, level, request.user_name).await;
    let mut view = SessionView::from(&started.session);
    view.greeting = Some(started.opening.utterance);
    Ok(Json(view))
}

async fn process_text_message(
    State(service): State<AppState>,
    Json(request): Json<TextMessageRequest>,
) -> Result<Json<InterviewResponse>, ApiError> {
    let reply = service
        .submit_turn(&request.session_id, &request.message)
        .await?;
    Ok(Json(reply.into()))
}

async fn process_voice_message(
    State(service): State<AppState>,
    Json(request): Json<VoiceMessageRequest>,
) -> Result<Json<InterviewResponse>, ApiError> {
    let reply = service
        .submit_voice_turn(&request.session_id, &request.audio_data)
        .await?;
    Ok(Json(reply.into()))
}

async fn interview_feedback(
    State(service): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<FeedbackResult>, ApiError> {
    Ok(Json(service.get_feedback(&session_id).await?))
}

async fn get_session(
    State(service): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<SessionView>, ApiError> {
    let session = service.get_session(&session_id).await?;
    Ok(Json(SessionView::from(&session)))
}

async fn end_interview(
    State(service): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    let end_time = service.end_session(&session_id).await?;
    Ok(Json(json!({
        "message": "Interview ended successfully",
        "session_id": session_id,
        "end_time": end_time,
    })))
}

async fn delete_session(
    State(service): State<AppState>,
    Path(session_id): Path<String>,
) -> Result<Json<Value>, ApiError> {
    service.delete_session(&session_id).await?;
    Ok(Json(json!({
        "message": "Session deleted successfully",
        "session_id": session_id,
    })))
}

async fn active_sessions(State(service): State<AppState>) -> Json<ActiveSessions> {
    let sessions = service.list_active_sessions().await;
    Json(ActiveSessions {
        total_active_sessions: sessions.len(),
        sessions,
    })
}
