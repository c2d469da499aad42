//! Non-blocking events raised while navigating.
//!
//! A diagnostic never stops the respondent. It is logged when raised and
//! returned with the navigation result so callers can surface or record it.

use survey_flow_types::QuestionId;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum Diagnostic {
    #[error("rule #{rule} on '{question}' jumps to unknown question '{target}'; continuing in order")]
    UnknownJumpTarget {
        question: QuestionId,
        rule: usize,
        target: QuestionId,
    },

    #[error("routing for '{question}' jumps to the question itself; continuing in order")]
    SelfJump { question: QuestionId },

    #[error(
        "routing service sent question index {index} for '{question}' but the survey has {total} questions; continuing in order"
    )]
    RouteIndexOutOfRange {
        question: QuestionId,
        index: usize,
        total: usize,
    },

    #[error("routing service failed for '{question}': {reason}; continuing in order")]
    ResolutionFailed { question: QuestionId, reason: String },

    #[error("routing service timed out for '{question}'; continuing in order")]
    ResolutionTimedOut { question: QuestionId },

    #[error("answer to '{question}' is recorded but not yet saved: {reason}")]
    AnswerSyncFailed { question: QuestionId, reason: String },

    #[error("{unsaved} answer(s) not saved; routing for '{question}' decided locally")]
    ResolvedLocally { question: QuestionId, unsaved: usize },

    #[error("progress refresh failed: {reason}")]
    ProgressRefreshFailed { reason: String },

    #[error(
        "progress service reports {remote_current}/{remote_total} (completed: {remote_completed}), session is at {local_current}/{local_total} (completed: {local_completed})"
    )]
    ProgressMismatch {
        remote_current: usize,
        remote_total: usize,
        remote_completed: bool,
        local_current: usize,
        local_total: usize,
        local_completed: bool,
    },

    #[error("submission could not be marked complete: {reason}")]
    CompletionNotRecorded { reason: String },
}

impl Diagnostic {
    /// Check if the diagnostic points at a mistake in the survey definition
    /// (as opposed to a service failure).
    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            Self::UnknownJumpTarget { .. } | Self::SelfJump { .. } | Self::RouteIndexOutOfRange { .. }
        )
    }

    /// Log the diagnostic and hand it back.
    pub(crate) fn emit(self) -> Self {
        if self.is_configuration() {
            tracing::warn!(diagnostic = %self, "routing configuration error");
        } else {
            tracing::warn!(diagnostic = %self, "collaborator service problem");
        }
        self
    }
}
