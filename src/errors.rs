use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

/// Failures reported by the external auth/row/storage/maps collaborators.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The requested row does not exist. Not a failure for profile lookups.
    #[error("not found")]
    NotFound,

    #[error("connection error: {0}")]
    Connection(String),

    /// The provider answered but refused the request (bad credentials, RLS, ...).
    #[error("{0}")]
    Rejected(String),

    #[error("request timed out")]
    Timeout,
}

impl ProviderError {
    pub fn connection(err: impl std::fmt::Display) -> Self {
        ProviderError::Connection(err.to_string())
    }
}

impl From<anyhow::Error> for ProviderError {
    fn from(err: anyhow::Error) -> Self {
        ProviderError::Connection(format!("{err:#}"))
    }
}

/// Form-level problems. Reported inline, never touch orchestrator state.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    #[error("{0} is required")]
    MissingField(&'static str),

    #[error("password must be at least {0} characters")]
    PasswordTooShort(usize),

    #[error("passwords do not match")]
    PasswordMismatch,

    #[error("please accept the terms and conditions to continue")]
    TermsNotAccepted,

    #[error("bio must be at most {0} characters")]
    BioTooLong(usize),

    #[error("invalid image: {0}")]
    InvalidImage(String),
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Provider(#[from] ProviderError),

    #[error("not signed in")]
    Unauthorized,

    #[error("invalid state: {0}")]
    InvalidState(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::Config(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Provider(ProviderError::NotFound) => StatusCode::NOT_FOUND,
            AppError::Provider(ProviderError::Rejected(_)) => StatusCode::BAD_REQUEST,
            AppError::Provider(ProviderError::Timeout) => StatusCode::GATEWAY_TIMEOUT,
            AppError::Provider(ProviderError::Connection(_)) => StatusCode::BAD_GATEWAY,
            AppError::Unauthorized => StatusCode::UNAUTHORIZED,
            AppError::InvalidState(_) => StatusCode::CONFLICT,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
