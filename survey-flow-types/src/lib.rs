//! Core types for the survey-flow crate.
//!
//! This crate provides the foundational types for branching surveys:
//! - `SurveyDefinition` - The ordered question sequence
//! - `Question` and `QuestionKind` - Individual questions and their types
//! - `RoutingRule`, `RoutingCondition`, `RoutingAction` - Conditional branching
//! - `Answers` and `QuestionId` - Collected data and its keys
//! - `SubmissionService`, `RoutingService`, `ProgressService` - Collaborator contracts

mod question_id;
pub use question_id::QuestionId;

mod answer_value;
pub use answer_value::{AnswerValue, MediaRef};

mod answers;
pub use answers::{Answer, AnswerError, Answers};

mod routing;
pub use routing::{ConditionValue, Operator, RoutingAction, RoutingCondition, RoutingRule};

mod question;
pub use question::{MediaAttachment, MediaKind, Question, QuestionKind};

mod survey_definition;
pub use survey_definition::{DefinitionIssue, SurveyDefinition};

mod intake;
pub use intake::{IntakeError, RespondentIntake};

mod error;
pub use error::{DefinitionError, ServiceError};

mod traits;
pub use traits::{
    FlowBackend, ProgressReport, ProgressService, RouteDecision, RoutingService, SubmissionId,
    SubmissionService,
};
