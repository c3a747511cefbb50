use crate::config::ConfigError;
use crate::submissions::{RepositoryError, SubmissionServiceError};
use crate::telemetry::TelemetryError;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;
use std::fmt;
use tracing::error;

#[derive(Debug)]
pub enum AppError {
    Config(ConfigError),
    Telemetry(TelemetryError),
    Io(std::io::Error),
    Server(axum::Error),
    Storage(RepositoryError),
    BadRequest(String),
    /// A service failure; `context` is the message returned if storage was at fault.
    Submission {
        context: &'static str,
        source: SubmissionServiceError,
    },
}

impl AppError {
    pub fn during(context: &'static str) -> impl FnOnce(SubmissionServiceError) -> Self {
        move |source| Self::Submission { context, source }
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Config(err) => write!(f, "configuration error: {}", err),
            AppError::Telemetry(err) => write!(f, "telemetry error: {}", err),
            AppError::Io(err) => write!(f, "io error: {}", err),
            AppError::Server(err) => write!(f, "server error: {}", err),
            AppError::Storage(err) => write!(f, "storage error: {}", err),
            AppError::BadRequest(message) => write!(f, "bad request: {}", message),
            AppError::Submission { context, source } => write!(f, "{}: {}", context, source),
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Config(err) => Some(err),
            AppError::Telemetry(err) => Some(err),
            AppError::Io(err) => Some(err),
            AppError::Server(err) => Some(err),
            AppError::Storage(err) => Some(err),
            AppError::BadRequest(_) => None,
            AppError::Submission { source, .. } => Some(source),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match &self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message.clone()),
            AppError::Submission { source, context } => match source {
                SubmissionServiceError::Validation(err) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                SubmissionServiceError::InvalidPair(err) => {
                    (StatusCode::BAD_REQUEST, err.to_string())
                }
                SubmissionServiceError::NotFound(_)
                | SubmissionServiceError::Repository(RepositoryError::NotFound(_)) => {
                    (StatusCode::NOT_FOUND, "Submission not found".to_string())
                }
                SubmissionServiceError::Repository(err) => {
                    error!(error = %err, "{context}");
                    (StatusCode::INTERNAL_SERVER_ERROR, context.to_string())
                }
            },
            AppError::Storage(RepositoryError::NotFound(_)) => {
                (StatusCode::NOT_FOUND, "Submission not found".to_string())
            }
            AppError::Config(_)
            | AppError::Telemetry(_)
            | AppError::Io(_)
            | AppError::Server(_)
            | AppError::Storage(_) => {
                error!(error = %self, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(json!({ "message": message }))).into_response()
    }
}

impl From<ConfigError> for AppError {
    fn from(value: ConfigError) -> Self {
        Self::Config(value)
    }
}

impl From<TelemetryError> for AppError {
    fn from(value: TelemetryError) -> Self {
        Self::Telemetry(value)
    }
}

impl From<std::io::Error> for AppError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<axum::Error> for AppError {
    fn from(value: axum::Error) -> Self {
        Self::Server(value)
    }
}

impl From<RepositoryError> for AppError {
    fn from(value: RepositoryError) -> Self {
        Self::Storage(value)
    }
}

impl From<SubmissionServiceError> for AppError {
    fn from(value: SubmissionServiceError) -> Self {
        Self::during("Submission request failed")(value)
    }
}
