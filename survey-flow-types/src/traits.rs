use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::{Answer, QuestionId, RespondentIntake, ServiceError};

/// Identifier of one respondent's submission, issued by the submission service.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubmissionId(pub String);

impl SubmissionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubmissionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// The routing service's answer to "where next?".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RouteDecision {
    /// Continue with the next question in order.
    Continue,

    /// Jump to the question at this 0-based position.
    GotoQuestion { question_index: usize },

    /// Finish the survey.
    EndSurvey,
}

/// Progress as reported by the progress service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProgressReport {
    pub current_question: usize,
    pub total_questions: usize,
    pub is_completed: bool,
}

/// Persists submissions and their answers.
#[async_trait]
pub trait SubmissionService: Send + Sync {
    /// Open a submission for a survey once personal information is collected.
    async fn start_submission(
        &self,
        survey_id: &str,
        intake: &RespondentIntake,
    ) -> Result<SubmissionId, ServiceError>;

    /// Persist one answer. Saving the same question again replaces the value.
    async fn save_answer(
        &self,
        submission: &SubmissionId,
        answer: &Answer,
    ) -> Result<(), ServiceError>;

    /// Mark the submission as finished.
    async fn complete_submission(&self, submission: &SubmissionId) -> Result<(), ServiceError>;
}

/// Resolves routing rules server-side, using the answers it has stored.
#[async_trait]
pub trait RoutingService: Send + Sync {
    /// Decide where to go after `question` was answered.
    ///
    /// Only called for questions that carry at least one routing rule.
    async fn resolve_route(
        &self,
        submission: &SubmissionId,
        question: &QuestionId,
    ) -> Result<RouteDecision, ServiceError>;
}

/// Reports submission progress.
#[async_trait]
pub trait ProgressService: Send + Sync {
    async fn progress(&self, submission: &SubmissionId) -> Result<ProgressReport, ServiceError>;
}

/// Everything a flow controller needs from the outside world.
///
/// Implemented automatically for any type providing all three services.
pub trait FlowBackend: SubmissionService + RoutingService + ProgressService {}

impl<T> FlowBackend for T where T: SubmissionService + RoutingService + ProgressService + ?Sized {}
