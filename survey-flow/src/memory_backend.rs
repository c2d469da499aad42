//! In-process implementation of the collaborator services.
//!
//! `MemoryBackend` keeps submissions in memory, resolves routes with the same
//! rules the controller uses locally, and can be told to misbehave. It backs
//! the CLI simulator and the tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use survey_flow::{FlowConfig, FlowController, MemoryBackend};
//!
//! let backend = Arc::new(MemoryBackend::new());
//! backend.register(Arc::clone(&definition));
//! backend.set_routing_fault(Some(Fault::Fail));
//!
//! let mut flow = FlowController::new(definition, backend, FlowConfig::default())?;
//! ```

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use survey_flow_types::{
    Answer, Answers, ProgressReport, ProgressService, QuestionId, RespondentIntake, RouteDecision,
    RoutingService, ServiceError, SubmissionId, SubmissionService, SurveyDefinition,
};

use crate::resolver::RuleResolver;

/// Misbehaviour injected into one service.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Fault {
    /// Fail with a backend error.
    Fail,

    /// Reject with this status code.
    Reject(u16),

    /// Wait this long, then answer normally.
    Delay(Duration),
}

impl Fault {
    async fn apply(fault: Option<Fault>) -> Result<(), ServiceError> {
        match fault {
            None => Ok(()),
            Some(Fault::Fail) => Err(ServiceError::backend(anyhow::anyhow!("injected failure"))),
            Some(Fault::Reject(status)) => Err(ServiceError::Rejected {
                status,
                message: "injected rejection".to_string(),
            }),
            Some(Fault::Delay(delay)) => {
                tokio::time::sleep(delay).await;
                Ok(())
            }
        }
    }
}

#[derive(Debug, Clone)]
struct Submission {
    survey: Arc<SurveyDefinition>,
    intake: RespondentIntake,
    answers: Answers,
    /// Position of the most recently saved answer.
    position: usize,
    completed: bool,
}

#[derive(Debug, Default)]
struct Faults {
    submission: Option<Fault>,
    routing: Option<Fault>,
    progress: Option<Fault>,
}

/// Services backed by process memory.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    surveys: Mutex<HashMap<String, Arc<SurveyDefinition>>>,
    submissions: Mutex<HashMap<SubmissionId, Submission>>,
    faults: Mutex<Faults>,
    route_override: Mutex<Option<RouteDecision>>,
    next_id: AtomicUsize,
    routing_calls: AtomicUsize,
    save_calls: AtomicUsize,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make a survey available for submissions.
    pub fn register(&self, definition: Arc<SurveyDefinition>) {
        self.surveys.lock().insert(definition.id.clone(), definition);
    }

    /// Registers a survey and returns `self`, for chaining.
    pub fn with_survey(self, definition: Arc<SurveyDefinition>) -> Self {
        self.register(definition);
        self
    }

    /// Applies to `start_submission`, `save_answer` and `complete_submission`.
    pub fn set_submission_fault(&self, fault: Option<Fault>) {
        self.faults.lock().submission = fault;
    }

    pub fn set_routing_fault(&self, fault: Option<Fault>) {
        self.faults.lock().routing = fault;
    }

    pub fn set_progress_fault(&self, fault: Option<Fault>) {
        self.faults.lock().progress = fault;
    }

    /// Answer every routing request with `decision` instead of evaluating rules.
    pub fn set_route_override(&self, decision: Option<RouteDecision>) {
        *self.route_override.lock() = decision;
    }

    pub fn routing_calls(&self) -> usize {
        self.routing_calls.load(Ordering::SeqCst)
    }

    pub fn save_calls(&self) -> usize {
        self.save_calls.load(Ordering::SeqCst)
    }

    /// Answers saved for a submission so far.
    pub fn saved_answers(&self, submission: &SubmissionId) -> Answers {
        self.submissions
            .lock()
            .get(submission)
            .map(|record| record.answers.clone())
            .unwrap_or_default()
    }

    pub fn intake(&self, submission: &SubmissionId) -> Option<RespondentIntake> {
        self.submissions
            .lock()
            .get(submission)
            .map(|record| record.intake.clone())
    }

    pub fn is_completed(&self, submission: &SubmissionId) -> bool {
        self.submissions
            .lock()
            .get(submission)
            .is_some_and(|record| record.completed)
    }

    fn not_found(submission: &SubmissionId) -> ServiceError {
        ServiceError::NotFound(format!("submission {}", submission))
    }

    fn decide(&self, submission: &SubmissionId, question: &QuestionId) -> Result<RouteDecision, ServiceError> {
        if let Some(decision) = self.route_override.lock().clone() {
            return Ok(decision);
        }

        let submissions = self.submissions.lock();
        let record = submissions
            .get(submission)
            .ok_or_else(|| Self::not_found(submission))?;
        let current = record
            .survey
            .question(question.as_str())
            .ok_or_else(|| ServiceError::NotFound(format!("question {}", question)))?;

        let resolution = RuleResolver::new(&record.survey).resolve(current, &record.answers);
        if let Some(diagnostic) = &resolution.diagnostic {
            tracing::debug!(%diagnostic, "memory backend ignored a rule");
        }
        Ok(RouteDecision::from(&resolution.route))
    }
}

#[async_trait]
impl SubmissionService for MemoryBackend {
    async fn start_submission(
        &self,
        survey_id: &str,
        intake: &RespondentIntake,
    ) -> Result<SubmissionId, ServiceError> {
        let fault = self.faults.lock().submission;
        Fault::apply(fault).await?;

        let survey = self
            .surveys
            .lock()
            .get(survey_id)
            .cloned()
            .ok_or_else(|| ServiceError::NotFound(format!("survey {}", survey_id)))?;

        let id = SubmissionId::new(format!(
            "sub-{}",
            self.next_id.fetch_add(1, Ordering::SeqCst) + 1
        ));
        self.submissions.lock().insert(
            id.clone(),
            Submission {
                survey,
                intake: intake.clone(),
                answers: Answers::new(),
                position: 0,
                completed: false,
            },
        );
        tracing::debug!(submission = %id, survey = survey_id, "memory backend opened submission");
        Ok(id)
    }

    async fn save_answer(
        &self,
        submission: &SubmissionId,
        answer: &Answer,
    ) -> Result<(), ServiceError> {
        self.save_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.faults.lock().submission;
        Fault::apply(fault).await?;

        let mut submissions = self.submissions.lock();
        let record = submissions
            .get_mut(submission)
            .ok_or_else(|| Self::not_found(submission))?;
        if record.completed {
            return Err(ServiceError::Rejected {
                status: 409,
                message: "submission already completed".to_string(),
            });
        }
        if let Some(position) = record.survey.position(answer.question_id.as_str()) {
            record.position = position;
        }
        record
            .answers
            .insert(answer.question_id.clone(), answer.value.clone());
        Ok(())
    }

    async fn complete_submission(&self, submission: &SubmissionId) -> Result<(), ServiceError> {
        let fault = self.faults.lock().submission;
        Fault::apply(fault).await?;

        let mut submissions = self.submissions.lock();
        let record = submissions
            .get_mut(submission)
            .ok_or_else(|| Self::not_found(submission))?;
        record.completed = true;
        record.position = record.survey.len();
        Ok(())
    }
}

#[async_trait]
impl RoutingService for MemoryBackend {
    async fn resolve_route(
        &self,
        submission: &SubmissionId,
        question: &QuestionId,
    ) -> Result<RouteDecision, ServiceError> {
        self.routing_calls.fetch_add(1, Ordering::SeqCst);
        let fault = self.faults.lock().routing;
        Fault::apply(fault).await?;
        self.decide(submission, question)
    }
}

#[async_trait]
impl ProgressService for MemoryBackend {
    async fn progress(&self, submission: &SubmissionId) -> Result<ProgressReport, ServiceError> {
        let fault = self.faults.lock().progress;
        Fault::apply(fault).await?;

        let submissions = self.submissions.lock();
        let record = submissions
            .get(submission)
            .ok_or_else(|| Self::not_found(submission))?;
        Ok(ProgressReport {
            current_question: record.position,
            total_questions: record.survey.len(),
            is_completed: record.completed,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_flow_types::{AnswerValue, Question, QuestionKind, RoutingAction, RoutingCondition, RoutingRule};

    fn backend() -> MemoryBackend {
        let survey = SurveyDefinition::new(
            "pets",
            vec![
                Question::new("has_pet", "Any pets?", QuestionKind::SingleChoice)
                    .with_options(["Yes", "No"])
                    .with_rule(
                        RoutingRule::new(RoutingAction::EndSurvey)
                            .when(RoutingCondition::equals("has_pet", "No")),
                    ),
                Question::new("name", "Pet name?", QuestionKind::FreeText),
            ],
        );
        MemoryBackend::new().with_survey(Arc::new(survey))
    }

    #[tokio::test]
    async fn routes_with_saved_answers() {
        let backend = backend();
        let id = backend
            .start_submission("pets", &RespondentIntake::new("Ada"))
            .await
            .unwrap();

        let decision = backend.resolve_route(&id, &"has_pet".into()).await.unwrap();
        assert_eq!(decision, RouteDecision::Continue);

        backend
            .save_answer(&id, &Answer::new("has_pet", AnswerValue::Choice("No".into())))
            .await
            .unwrap();
        let decision = backend.resolve_route(&id, &"has_pet".into()).await.unwrap();
        assert_eq!(decision, RouteDecision::EndSurvey);
        assert_eq!(backend.routing_calls(), 2);
    }

    #[tokio::test]
    async fn unknown_survey_and_submission() {
        let backend = backend();
        let err = backend
            .start_submission("cats", &RespondentIntake::new("Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));

        let err = backend.progress(&SubmissionId::new("nope")).await.unwrap_err();
        assert!(matches!(err, ServiceError::NotFound(_)));
    }

    #[tokio::test]
    async fn progress_follows_answers_and_completion() {
        let backend = backend();
        let id = backend
            .start_submission("pets", &RespondentIntake::new("Ada"))
            .await
            .unwrap();
        backend.save_answer(&id, &Answer::new("name", "Rex")).await.unwrap();

        let report = backend.progress(&id).await.unwrap();
        assert_eq!(report.current_question, 1);
        assert_eq!(report.total_questions, 2);
        assert!(!report.is_completed);

        backend.complete_submission(&id).await.unwrap();
        assert!(backend.is_completed(&id));
        assert!(backend.progress(&id).await.unwrap().is_completed);

        let late = backend.save_answer(&id, &Answer::new("name", "Max")).await;
        assert!(matches!(late, Err(ServiceError::Rejected { status: 409, .. })));
    }

    #[tokio::test]
    async fn injected_faults() {
        let backend = backend();
        backend.set_submission_fault(Some(Fault::Reject(503)));
        let err = backend
            .start_submission("pets", &RespondentIntake::new("Ada"))
            .await
            .unwrap_err();
        assert!(matches!(err, ServiceError::Rejected { status: 503, .. }));

        backend.set_submission_fault(None);
        let id = backend
            .start_submission("pets", &RespondentIntake::new("Ada"))
            .await
            .unwrap();

        backend.set_routing_fault(Some(Fault::Fail));
        let err = backend.resolve_route(&id, &"has_pet".into()).await.unwrap_err();
        assert!(matches!(err, ServiceError::Backend(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn delay_fault_answers_late() {
        let backend = backend();
        let id = backend
            .start_submission("pets", &RespondentIntake::new("Ada"))
            .await
            .unwrap();
        backend.set_progress_fault(Some(Fault::Delay(Duration::from_secs(30))));

        let started = tokio::time::Instant::now();
        backend.progress(&id).await.unwrap();
        assert!(started.elapsed() >= Duration::from_secs(30));
    }

    #[tokio::test]
    async fn override_replaces_rules() {
        let backend = backend();
        let id = backend
            .start_submission("pets", &RespondentIntake::new("Ada"))
            .await
            .unwrap();
        backend.set_route_override(Some(RouteDecision::GotoQuestion { question_index: 7 }));
        let decision = backend.resolve_route(&id, &"has_pet".into()).await.unwrap();
        assert_eq!(decision, RouteDecision::GotoQuestion { question_index: 7 });
    }
}
