use crate::QuestionId;

/// Structural problems that make a survey definition unusable for a session.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionError {
    #[error("Question #{index} has a blank identifier")]
    BlankQuestionId { index: usize },

    #[error("Question identifier '{0}' is used more than once")]
    DuplicateQuestion(QuestionId),
}

/// Error type for collaborator service calls.
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// The call did not finish within its deadline.
    #[error("Service call timed out")]
    Timeout,

    /// The service answered, but refused the request.
    #[error("Service rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The submission or question is unknown to the service.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Transport or decoding failure.
    #[error("Backend error: {0}")]
    Backend(#[from] anyhow::Error),
}

impl ServiceError {
    /// Create a backend error from any error type.
    pub fn backend(err: impl Into<anyhow::Error>) -> Self {
        Self::Backend(err.into())
    }

    /// Check if this error represents a timeout.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout)
    }

    /// Whether retrying the same call later might succeed.
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Timeout | Self::Backend(_) => true,
            Self::Rejected { status, .. } => *status >= 500 || *status == 429,
            Self::NotFound(_) => false,
        }
    }
}
