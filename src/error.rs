use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use tracing::error;

/// Failures surfaced to portal callers as short text messages.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("User already exists")]
    Conflict,
    #[error("Unauthorized")]
    Unauthorized,
    #[error("Invalid credentials.")]
    InvalidCredentials,
    #[error("Invalid YouTube URL")]
    InvalidReference,
    #[error("No transcript found for this video. Please try a video with closed captions.")]
    NoTranscript,
    #[error("Failed to generate notes: {0}")]
    GenerationFailed(String),
    #[error("Not found")]
    NotFound,
    #[error("{0}")]
    NotApproved(&'static str),
    #[error("{0}")]
    Validation(String),
    #[error(transparent)]
    Internal(#[from] anyhow::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Conflict => StatusCode::CONFLICT,
            AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Unauthorized | AppError::NotApproved(_) => StatusCode::FORBIDDEN,
            AppError::InvalidReference | AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::NoTranscript => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::GenerationFailed(_) => StatusCode::BAD_GATEWAY,
            AppError::NotFound => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match &self {
            AppError::Internal(e) => {
                error!(error = ?e, "unexpected failure");
                "Something went wrong.".to_string()
            }
            other => other.to_string(),
        };
        (status, message).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn internal_errors_hide_their_cause() {
        let res = AppError::Internal(anyhow::anyhow!("db password is hunter2")).into_response();
        assert_eq!(res.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn generation_failure_carries_upstream_message() {
        let err = AppError::GenerationFailed("quota exceeded".into());
        assert_eq!(err.to_string(), "Failed to generate notes: quota exceeded");
        assert_eq!(err.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn admin_violations_are_forbidden() {
        assert_eq!(AppError::Unauthorized.status(), StatusCode::FORBIDDEN);
        assert_eq!(AppError::Conflict.status(), StatusCode::CONFLICT);
    }
}
