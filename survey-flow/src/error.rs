use survey_flow_types::{DefinitionError, IntakeError, QuestionId, ServiceError};

/// Error type for flow controller operations.
///
/// Configuration problems and transient service failures during routing are
/// not errors: navigation recovers from them and reports a `Diagnostic`.
#[derive(Debug, thiserror::Error)]
pub enum FlowError {
    /// Navigation before `start_survey`.
    #[error("The survey has not been started")]
    NotStarted,

    #[error("The survey has already been started")]
    AlreadyStarted,

    /// Any navigation or answer after completion.
    #[error("The survey is already complete")]
    SessionComplete,

    /// The respondent left; the session and any pending result are discarded.
    #[error("The session was abandoned")]
    Abandoned,

    /// Answers can only be recorded for the question currently shown.
    #[error("Answer is for '{got}', but the current question is '{expected}'")]
    NotCurrentQuestion { expected: QuestionId, got: QuestionId },

    /// The respondent has to fix the answer before moving on.
    #[error("Invalid answer for '{question_id}': {reason}")]
    Validation {
        question_id: QuestionId,
        reason: String,
    },

    #[error(transparent)]
    Intake(#[from] IntakeError),

    #[error(transparent)]
    Definition(#[from] DefinitionError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

impl FlowError {
    /// Check if this error should be shown to the respondent as something to fix.
    pub fn is_validation(&self) -> bool {
        matches!(self, Self::Validation { .. } | Self::Intake(_))
    }

    /// Check if this error is an attempt to navigate a finished session.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::SessionComplete | Self::Abandoned)
    }
}
