use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use vanish_core::SecretError;

#[derive(Debug)]
pub enum AppError {
    /// Internal errors - logged but return generic 500 to user
    Internal(anyhow::Error),
    /// User-facing errors - message is safe to show
    External(StatusCode, &'static str),
    /// Validation errors - safe to show
    Validation(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match self {
            AppError::Internal(err) => {
                tracing::error!("internal error: {:?}", err);
                sentry::capture_error(
                    err.as_ref() as &(dyn std::error::Error + Send + Sync + 'static)
                );

                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error").into_response()
            }
            AppError::External(status, msg) => (status, msg).into_response(),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
        }
    }
}

impl From<SecretError> for AppError {
    fn from(err: SecretError) -> Self {
        match err {
            SecretError::Validation(e) => Self::Validation(e.to_string()),
            // One uniform answer for unknown, expired, and consumed keys.
            SecretError::NotFound => Self::External(StatusCode::NOT_FOUND, "Secret not found"),
            SecretError::GenerationExhausted(_) => Self::External(
                StatusCode::SERVICE_UNAVAILABLE,
                "Temporarily unable to store secrets, please retry",
            ),
            SecretError::Internal(e) => Self::Internal(e),
        }
    }
}
