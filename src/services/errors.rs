use thiserror::Error;

/// Failures raised by the assessment, tutoring and evaluation workflows.
#[derive(Debug, Error)]
pub(crate) enum WorkflowError {
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Conflict(String),
    /// A collaborator answered with a non-success status, or could not be reached (`status: None`).
    #[error("{service} request failed ({status:?}): {body}")]
    Upstream { service: &'static str, status: Option<u16>, body: String },
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
    #[error("{0}")]
    Invalid(String),
    #[error("{0}")]
    Unavailable(String),
}

impl WorkflowError {
    pub(crate) fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub(crate) fn invalid(detail: impl Into<String>) -> Self {
        Self::Invalid(detail.into())
    }

    pub(crate) fn transport(service: &'static str, err: reqwest::Error) -> Self {
        Self::Upstream { service, status: None, body: err.to_string() }
    }
}
