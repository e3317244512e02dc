use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use interview_core::InterviewError;
use serde_json::json;

/// An interview failure on its way out as an HTTP response.
#[derive(Debug)]
pub struct ApiError(pub InterviewError);

impl ApiError {
    pub fn status_code(&self) -> StatusCode {
        match &self.0 {
            InterviewError::NotFound(_) => StatusCode::NOT_FOUND,
            InterviewError::InvalidInput(_) | InterviewError::Transcription(_) => {
                StatusCode::BAD_REQUEST
            }
            InterviewError::AlreadyEnded(_) => StatusCode::CONFLICT,
        }
    }
}

impl From<InterviewError> for ApiError {
    fn from(err: InterviewError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        tracing::debug!("Request rejected ({}): {}", status, self.0);
        (status, Json(json!({ "error": self.0.to_string() }))).into_response()
    }
}
