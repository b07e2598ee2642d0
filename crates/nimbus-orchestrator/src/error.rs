use async_graphql::ErrorExtensions;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("phase not found: {0}")]
    PhaseNotFound(String),

    #[error("invalid request: {0}")]
    InvalidRequest(String),

    #[error("internal error: {0}")]
    Internal(String),
}

impl ApiError {
    /// Attach a structured error code, mirroring the container platform's
    /// `ApiError::extend` so client tooling can branch on `code` instead
    /// of parsing messages.
    pub fn extend(self) -> async_graphql::Error {
        let (code, message) = match &self {
            ApiError::PhaseNotFound(_) => ("PHASE_NOT_FOUND", self.to_string()),
            ApiError::InvalidRequest(_) => ("BAD_REQUEST", self.to_string()),
            ApiError::Internal(ref detail) => {
                tracing::error!("internal error: {}", detail);
                ("INTERNAL_SERVER_ERROR", "an internal error occurred".to_string())
            }
        };

        async_graphql::Error::new(message).extend_with(|_err, e| e.set("code", code))
    }
}
