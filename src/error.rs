use axum::{Json, http::StatusCode, response::IntoResponse};
use serde::Serialize;
use sqlx::Error as SqlxError;
use thiserror::Error as ThisError;

use crate::middleware::session::{self, FlashLevel};

#[derive(Debug, ThisError)]
pub enum RitualError {
    #[error("Please provide username & password.")]
    MissingCredentials,

    #[error("Passwords do not match.")]
    PasswordMismatch,

    #[error("Username already exists.")]
    UsernameTaken,

    #[error("Invalid username or password.")]
    InvalidCredentials,

    #[error("Please log in first.")]
    AuthRequired,

    #[error("Habit name cannot be empty.")]
    EmptyHabitName,

    #[error("Habit not found.")]
    HabitNotFound,

    #[error("Database error: {0}")]
    Database(#[from] SqlxError),

    #[error("Password hashing error: {0}")]
    PasswordHash(String),
}

impl IntoResponse for RitualError {
    fn into_response(self) -> axum::response::Response {
        // Domain errors are recovered at the request boundary: flash the
        // message and send the browser back to the page it came from.
        let (level, target) = match &self {
            RitualError::MissingCredentials
            | RitualError::PasswordMismatch
            | RitualError::UsernameTaken => (FlashLevel::Danger, "/register"),

            RitualError::InvalidCredentials => (FlashLevel::Danger, "/login"),

            RitualError::AuthRequired => (FlashLevel::Warning, "/login"),

            RitualError::EmptyHabitName | RitualError::HabitNotFound => {
                (FlashLevel::Danger, "/dashboard")
            }

            RitualError::Database(_) | RitualError::PasswordHash(_) => {
                tracing::error!(error = %self, "internal error");
                let body = ApiErrorBody {
                    code: "INTERNAL_ERROR".to_string(),
                    message: "An internal server error occurred.".to_string(),
                };
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ApiErrorResponse { error: body }),
                )
                    .into_response();
            }
        };

        session::flash_redirect(level, &self.to_string(), target)
    }
}

/// Standardized error response body for non-recoverable failures.
#[derive(Serialize)]
pub struct ApiErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Serialize)]
pub struct ApiErrorResponse {
    pub error: ApiErrorBody,
}
