//! The navigation state machine.

use std::collections::BTreeSet;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use survey_flow_types::{
    Answer, AnswerValue, Answers, FlowBackend, Question, QuestionId, RespondentIntake,
    RouteDecision, ServiceError, SubmissionId, SurveyDefinition,
};
use tokio_util::sync::CancellationToken;

use crate::config::{FlowConfig, ResolutionMode};
use crate::progress::{Progress, ProgressTracker};
use crate::resolver::{Route, RuleResolver};
use crate::session::SurveySession;
use crate::{Diagnostic, FlowError};

/// Where a controller is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum FlowState {
    /// Waiting for the respondent's personal information.
    PersonalInfoPending,
    InProgress {
        index: usize,
    },
    Complete,
    Abandoned,
}

/// The move a navigation call made.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum Step {
    /// Sequential continuation.
    Next { index: usize },

    /// A routing rule sent the respondent elsewhere.
    Jump { index: usize },

    Back { index: usize },

    /// Retreat at the first question.
    Stay { index: usize },

    /// `ended_early` is set when a rule ended the survey.
    Complete { ended_early: bool },
}

/// Result of `advance` or `retreat`.
#[derive(Debug, Clone, PartialEq)]
pub struct Navigation {
    /// Index of the question navigated away from.
    pub from: usize,
    pub step: Step,
    pub progress: Progress,
    pub diagnostics: Vec<Diagnostic>,
}

impl Navigation {
    pub fn is_complete(&self) -> bool {
        matches!(self.step, Step::Complete { .. })
    }

    /// Index of the question now shown, if any.
    pub fn index(&self) -> Option<usize> {
        match self.step {
            Step::Next { index }
            | Step::Jump { index }
            | Step::Back { index }
            | Step::Stay { index } => Some(index),
            Step::Complete { .. } => None,
        }
    }
}

/// Result of `submit_answer`.
#[derive(Debug, Clone, PartialEq)]
pub struct AnswerReceipt {
    pub question_id: QuestionId,

    /// Whether the submission service has saved the answer.
    pub persisted: bool,
    pub diagnostics: Vec<Diagnostic>,
}

/// Drives one respondent through a survey.
///
/// All navigation takes `&mut self`, so one owner can never have two
/// resolutions in flight. Use [`SessionHandle`](crate::SessionHandle) to share
/// a controller between tasks.
pub struct FlowController<B: FlowBackend + ?Sized> {
    definition: Arc<SurveyDefinition>,
    backend: Arc<B>,
    config: FlowConfig,
    session: Option<SurveySession>,
    tracker: ProgressTracker,
    cancel: CancellationToken,
}

impl<B: FlowBackend + ?Sized> std::fmt::Debug for FlowController<B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FlowController")
            .field("survey", &self.definition.id)
            .field("config", &self.config)
            .field("state", &self.state())
            .finish_non_exhaustive()
    }
}

impl<B: FlowBackend + ?Sized> FlowController<B> {
    /// Create a controller for one respondent.
    ///
    /// Fails on a structurally broken definition. Lint issues are logged and
    /// otherwise handled at navigation time.
    pub fn new(
        definition: Arc<SurveyDefinition>,
        backend: Arc<B>,
        config: FlowConfig,
    ) -> Result<Self, FlowError> {
        definition.validate()?;
        for issue in definition.lint() {
            tracing::warn!(survey = %definition.id, %issue, "survey definition issue");
        }
        if config.resolution == ResolutionMode::Remote && !config.persist_answers {
            tracing::warn!(
                survey = %definition.id,
                "remote resolution without persisted answers; the routing service will not see new answers"
            );
        }

        let tracker = ProgressTracker::new(definition.len());
        Ok(Self {
            definition,
            backend,
            config,
            session: None,
            tracker,
            cancel: CancellationToken::new(),
        })
    }

    pub fn definition(&self) -> &SurveyDefinition {
        &self.definition
    }

    pub fn config(&self) -> &FlowConfig {
        &self.config
    }

    /// Token cancelled when the session is abandoned.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    pub fn state(&self) -> FlowState {
        if self.is_abandoned() {
            return FlowState::Abandoned;
        }
        match &self.session {
            None => FlowState::PersonalInfoPending,
            Some(session) if session.is_complete() => FlowState::Complete,
            Some(session) => FlowState::InProgress {
                index: session.index(),
            },
        }
    }

    pub fn progress(&self) -> Progress {
        self.tracker.current()
    }

    pub fn session(&self) -> Option<&SurveySession> {
        self.live_session()
    }

    pub fn submission(&self) -> Option<&SubmissionId> {
        self.live_session().map(SurveySession::submission)
    }

    pub fn current_question(&self) -> Option<&Question> {
        self.live_session()?.current_question()
    }

    /// The answer recorded for the current question, for pre-filling after a
    /// retreat.
    pub fn current_answer(&self) -> Option<&AnswerValue> {
        self.live_session()?.current_answer()
    }

    pub fn answers(&self) -> Option<&Answers> {
        self.live_session().map(SurveySession::answers)
    }

    /// Discard the session. Anything still in flight is dropped on arrival.
    ///
    /// A completed session is kept as it is.
    pub fn abandon(&mut self) {
        if self.session.as_ref().is_some_and(SurveySession::is_complete) {
            return;
        }
        if !self.cancel.is_cancelled() {
            tracing::info!(survey = %self.definition.id, "session abandoned");
        }
        self.cancel.cancel();
        self.session = None;
    }

    /// Open a submission with the respondent's personal information and show
    /// the first question.
    pub async fn start_survey(&mut self, intake: RespondentIntake) -> Result<Progress, FlowError> {
        self.ensure_live()?;
        if self.session.is_some() {
            return Err(FlowError::AlreadyStarted);
        }
        intake.validate()?;

        let submission = guarded(
            &self.cancel,
            self.config.service_timeout(),
            self.backend.start_submission(&self.definition.id, &intake),
        )
        .await?;
        self.ensure_live()?;

        tracing::info!(survey = %self.definition.id, %submission, "survey started");
        let session = SurveySession::new(submission, Arc::clone(&self.definition));
        let complete = session.is_complete();
        self.session = Some(session);
        self.tracker = ProgressTracker::new(self.definition.len());

        if complete {
            let mut diagnostics = Vec::new();
            self.finish(&mut diagnostics).await?;
        }
        Ok(self.tracker.current())
    }

    /// Record an answer to the current question.
    ///
    /// The index does not move. The answer is kept even when saving it fails;
    /// it is sent again before the next remote resolution.
    pub async fn submit_answer(&mut self, answer: Answer) -> Result<AnswerReceipt, FlowError> {
        self.ensure_live()?;
        let session = self.session.as_mut().ok_or(FlowError::NotStarted)?;
        let question_id = answer.question_id.clone();
        session.record(answer)?;
        tracing::debug!(question = %question_id, "answer recorded");

        if !self.config.persist_answers {
            session.mark_synced(&question_id);
            return Ok(AnswerReceipt {
                question_id,
                persisted: false,
                diagnostics: Vec::new(),
            });
        }

        let mut diagnostics = Vec::new();
        self.flush_answers(&mut diagnostics).await?;
        let persisted = self
            .session
            .as_ref()
            .is_some_and(|session| !session.unsynced().any(|id| id == &question_id));

        Ok(AnswerReceipt {
            question_id,
            persisted,
            diagnostics,
        })
    }

    /// Leave the current question going forward.
    ///
    /// Blocks with `FlowError::Validation` while a required question has no
    /// answer. Routing problems never block: they continue in order and are
    /// reported in `Navigation::diagnostics`.
    pub async fn advance(&mut self) -> Result<Navigation, FlowError> {
        self.ensure_live()?;
        let session = self.session.as_ref().ok_or(FlowError::NotStarted)?;
        if session.is_complete() {
            return Err(FlowError::SessionComplete);
        }
        session.check_required()?;

        let from = session.index();
        let submission = session.submission().clone();
        let definition = Arc::clone(&self.definition);
        let question = definition
            .question_at(from)
            .ok_or(FlowError::SessionComplete)?;

        let mut diagnostics = Vec::new();
        let route = if !question.has_routing_rules() {
            Route::Continue
        } else {
            match self.config.resolution {
                ResolutionMode::Local => {
                    resolve_local(&definition, question, session.answers(), &mut diagnostics)
                }
                ResolutionMode::Remote => {
                    self.flush_answers(&mut diagnostics).await?;
                    let session = self.session.as_ref().ok_or(FlowError::Abandoned)?;
                    if session.has_unsynced() {
                        // The service would route on an incomplete answer set.
                        diagnostics.push(
                            Diagnostic::ResolvedLocally {
                                question: question.id().clone(),
                                unsaved: session.unsynced().count(),
                            }
                            .emit(),
                        );
                        resolve_local(&definition, question, session.answers(), &mut diagnostics)
                    } else {
                        self.resolve_remote(&submission, from, question, &mut diagnostics)
                            .await?
                    }
                }
            }
        };
        self.ensure_live()?;

        let session = self.session.as_mut().ok_or(FlowError::Abandoned)?;
        let step = match route {
            Route::Continue => {
                session.step_forward();
                if session.is_complete() {
                    Step::Complete { ended_early: false }
                } else {
                    Step::Next {
                        index: session.index(),
                    }
                }
            }
            Route::Jump { index, .. } => {
                session.jump_to(index);
                Step::Jump { index }
            }
            Route::End => {
                session.end();
                Step::Complete { ended_early: true }
            }
        };
        tracing::debug!(question = %question.id(), from, ?step, "advanced");

        let progress = match step {
            Step::Complete { .. } => self.finish(&mut diagnostics).await?,
            Step::Next { index } | Step::Jump { index } | Step::Back { index } | Step::Stay { index } => {
                self.tracker.forward(index)
            }
        };
        if self.config.remote_progress {
            self.refresh_progress(&submission, &mut diagnostics).await?;
        }
        dedup_sync_failures(&mut diagnostics);

        Ok(Navigation {
            from,
            step,
            progress,
            diagnostics,
        })
    }

    /// Go back one question. A no-op at the first question.
    ///
    /// Recorded answers are kept and offered again through `current_answer`.
    pub fn retreat(&mut self) -> Result<Navigation, FlowError> {
        self.ensure_live()?;
        let session = self.session.as_mut().ok_or(FlowError::NotStarted)?;
        if session.is_complete() {
            return Err(FlowError::SessionComplete);
        }

        let from = session.index();
        let (step, progress) = if session.step_back() {
            let index = session.index();
            (Step::Back { index }, self.tracker.back(index))
        } else {
            (Step::Stay { index: from }, self.tracker.current())
        };
        tracing::debug!(from, ?step, "retreated");

        Ok(Navigation {
            from,
            step,
            progress,
            diagnostics: Vec::new(),
        })
    }

    /// Submit an answer and advance in one go.
    pub async fn respond(&mut self, answer: Answer) -> Result<Navigation, FlowError> {
        let receipt = self.submit_answer(answer).await?;
        let mut navigation = self.advance().await?;
        let mut diagnostics = receipt.diagnostics;
        diagnostics.append(&mut navigation.diagnostics);
        dedup_sync_failures(&mut diagnostics);
        navigation.diagnostics = diagnostics;
        Ok(navigation)
    }

    /// Cancellation only counts until the session completes.
    fn is_abandoned(&self) -> bool {
        self.cancel.is_cancelled() && !self.session.as_ref().is_some_and(SurveySession::is_complete)
    }

    fn live_session(&self) -> Option<&SurveySession> {
        if self.is_abandoned() {
            return None;
        }
        self.session.as_ref()
    }

    fn ensure_live(&self) -> Result<(), FlowError> {
        if self.is_abandoned() {
            Err(FlowError::Abandoned)
        } else {
            Ok(())
        }
    }

    /// Save every unsynced answer. Failures become diagnostics.
    async fn flush_answers(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Result<(), FlowError> {
        if !self.config.persist_answers {
            return Ok(());
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(());
        };

        for answer in session.pending_answers() {
            let saved = guarded(
                &self.cancel,
                self.config.service_timeout(),
                self.backend.save_answer(session.submission(), &answer),
            )
            .await;
            match saved {
                Ok(()) => session.mark_synced(&answer.question_id),
                Err(FlowError::Service(err)) => diagnostics.push(
                    Diagnostic::AnswerSyncFailed {
                        question: answer.question_id,
                        reason: err.to_string(),
                    }
                    .emit(),
                ),
                Err(err) => return Err(err),
            }
        }
        Ok(())
    }

    async fn resolve_remote(
        &self,
        submission: &SubmissionId,
        from: usize,
        question: &Question,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<Route, FlowError> {
        let decision = guarded(
            &self.cancel,
            self.config.resolution_timeout(),
            self.backend.resolve_route(submission, question.id()),
        )
        .await;

        let decision = match decision {
            Ok(decision) => decision,
            Err(FlowError::Service(ServiceError::Timeout)) => {
                diagnostics.push(
                    Diagnostic::ResolutionTimedOut {
                        question: question.id().clone(),
                    }
                    .emit(),
                );
                return Ok(Route::Continue);
            }
            Err(FlowError::Service(err)) => {
                diagnostics.push(
                    Diagnostic::ResolutionFailed {
                        question: question.id().clone(),
                        reason: err.to_string(),
                    }
                    .emit(),
                );
                return Ok(Route::Continue);
            }
            Err(err) => return Err(err),
        };
        tracing::debug!(question = %question.id(), ?decision, "routing service decided");

        Ok(match decision {
            RouteDecision::Continue => Route::Continue,
            RouteDecision::EndSurvey => Route::End,
            RouteDecision::GotoQuestion { question_index } if question_index == from => {
                diagnostics.push(
                    Diagnostic::SelfJump {
                        question: question.id().clone(),
                    }
                    .emit(),
                );
                Route::Continue
            }
            RouteDecision::GotoQuestion { question_index } => {
                match self.definition.question_at(question_index) {
                    Some(target) => Route::Jump {
                        index: question_index,
                        target: target.id().clone(),
                    },
                    None => {
                        diagnostics.push(
                            Diagnostic::RouteIndexOutOfRange {
                                question: question.id().clone(),
                                index: question_index,
                                total: self.definition.len(),
                            }
                            .emit(),
                        );
                        Route::Continue
                    }
                }
            }
        })
    }

    /// Settle a completed session: save what is left and close the submission.
    async fn finish(&mut self, diagnostics: &mut Vec<Diagnostic>) -> Result<Progress, FlowError> {
        let progress = self.tracker.complete();
        self.flush_answers(diagnostics).await?;

        let Some(session) = self.session.as_ref() else {
            return Err(FlowError::Abandoned);
        };
        let completed = guarded(
            &self.cancel,
            self.config.service_timeout(),
            self.backend.complete_submission(session.submission()),
        )
        .await;
        match completed {
            Ok(()) => {}
            Err(FlowError::Service(err)) => diagnostics.push(
                Diagnostic::CompletionNotRecorded {
                    reason: err.to_string(),
                }
                .emit(),
            ),
            Err(err) => return Err(err),
        }

        tracing::info!(
            survey = %self.definition.id,
            submission = %session.submission(),
            answered = session.answers().len(),
            "survey complete"
        );
        Ok(progress)
    }

    async fn refresh_progress(
        &self,
        submission: &SubmissionId,
        diagnostics: &mut Vec<Diagnostic>,
    ) -> Result<(), FlowError> {
        let report = guarded(
            &self.cancel,
            self.config.service_timeout(),
            self.backend.progress(submission),
        )
        .await;
        match report {
            Ok(report) => diagnostics.extend(self.tracker.check_report(&report).map(Diagnostic::emit)),
            Err(FlowError::Service(err)) => diagnostics.push(
                Diagnostic::ProgressRefreshFailed {
                    reason: err.to_string(),
                }
                .emit(),
            ),
            Err(err) => return Err(err),
        }
        Ok(())
    }
}

/// Run a service call, bounded by `limit` and dropped if the session is
/// abandoned first.
async fn guarded<T>(
    cancel: &CancellationToken,
    limit: Duration,
    call: impl Future<Output = Result<T, ServiceError>>,
) -> Result<T, FlowError> {
    tokio::select! {
        biased;
        _ = cancel.cancelled() => Err(FlowError::Abandoned),
        result = tokio::time::timeout(limit, call) => match result {
            Ok(result) => Ok(result?),
            Err(_) => Err(ServiceError::Timeout.into()),
        },
    }
}

fn resolve_local(
    definition: &SurveyDefinition,
    question: &Question,
    answers: &Answers,
    diagnostics: &mut Vec<Diagnostic>,
) -> Route {
    let resolution = RuleResolver::new(definition).resolve(question, answers);
    diagnostics.extend(resolution.diagnostic.map(Diagnostic::emit));
    resolution.route
}

/// Keep the first sync failure per question; later retries repeat it.
fn dedup_sync_failures(diagnostics: &mut Vec<Diagnostic>) {
    let mut seen = BTreeSet::new();
    diagnostics.retain(|diagnostic| match diagnostic {
        Diagnostic::AnswerSyncFailed { question, .. } => seen.insert(question.clone()),
        _ => true,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryBackend;
    use survey_flow_types::{QuestionKind, RoutingAction, RoutingCondition, RoutingRule};

    fn yes_no_survey() -> Arc<SurveyDefinition> {
        Arc::new(SurveyDefinition::new(
            "yes-no",
            vec![
                Question::new("q1", "First?", QuestionKind::SingleChoice).with_options(["Yes", "No"]),
                Question::new("q2", "Continue?", QuestionKind::SingleChoice)
                    .with_options(["Yes", "No"])
                    .with_rule(
                        RoutingRule::new(RoutingAction::EndSurvey)
                            .when(RoutingCondition::equals("q2", "Yes")),
                    ),
                Question::new("q3", "Last", QuestionKind::FreeText).optional(),
            ],
        ))
    }

    fn controller(config: FlowConfig) -> FlowController<MemoryBackend> {
        let definition = yes_no_survey();
        let backend = Arc::new(MemoryBackend::new());
        backend.register(Arc::clone(&definition));
        FlowController::new(definition, backend, config).unwrap()
    }

    fn choice(question: &str, value: &str) -> Answer {
        Answer::new(question, AnswerValue::Choice(value.into()))
    }

    #[tokio::test]
    async fn navigation_before_start() {
        let mut flow = controller(FlowConfig::local());
        assert_eq!(flow.state(), FlowState::PersonalInfoPending);
        assert!(matches!(flow.advance().await, Err(FlowError::NotStarted)));
        assert!(matches!(flow.retreat(), Err(FlowError::NotStarted)));
        assert!(matches!(
            flow.submit_answer(choice("q1", "Yes")).await,
            Err(FlowError::NotStarted)
        ));
    }

    #[tokio::test]
    async fn invalid_intake_keeps_pending() {
        let mut flow = controller(FlowConfig::local());
        let err = flow.start_survey(RespondentIntake::new("  ")).await.unwrap_err();
        assert!(err.is_validation());
        assert_eq!(flow.state(), FlowState::PersonalInfoPending);
    }

    #[tokio::test]
    async fn start_twice_is_rejected() {
        let mut flow = controller(FlowConfig::local());
        flow.start_survey(RespondentIntake::new("Ada")).await.unwrap();
        assert_eq!(flow.state(), FlowState::InProgress { index: 0 });
        assert!(matches!(
            flow.start_survey(RespondentIntake::new("Ada")).await,
            Err(FlowError::AlreadyStarted)
        ));
    }

    #[tokio::test]
    async fn end_survey_rule_completes_early() {
        let mut flow = controller(FlowConfig::local());
        flow.start_survey(RespondentIntake::new("Ada")).await.unwrap();

        let nav = flow.respond(choice("q1", "No")).await.unwrap();
        assert_eq!(nav.step, Step::Next { index: 1 });

        let nav = flow.respond(choice("q2", "Yes")).await.unwrap();
        assert_eq!(nav.step, Step::Complete { ended_early: true });
        assert!(nav.progress.is_complete);
        assert_eq!(flow.state(), FlowState::Complete);
        assert!(flow.current_question().is_none());
    }

    #[tokio::test]
    async fn completion_is_one_way() {
        let mut flow = controller(FlowConfig::local());
        flow.start_survey(RespondentIntake::new("Ada")).await.unwrap();
        flow.respond(choice("q1", "No")).await.unwrap();
        flow.respond(choice("q2", "Yes")).await.unwrap();

        assert!(matches!(flow.advance().await, Err(FlowError::SessionComplete)));
        assert!(matches!(flow.retreat(), Err(FlowError::SessionComplete)));
        let err = flow.submit_answer(choice("q2", "No")).await.unwrap_err();
        assert!(err.is_terminal());
        assert_eq!(flow.answers().and_then(|a| a.get_choice("q2").ok()), Some("Yes"));
    }

    #[tokio::test]
    async fn abandon_after_completion_keeps_session() {
        let mut flow = controller(FlowConfig::local());
        flow.start_survey(RespondentIntake::new("Ada")).await.unwrap();
        flow.respond(choice("q1", "No")).await.unwrap();
        flow.respond(choice("q2", "Yes")).await.unwrap();

        flow.abandon();
        assert_eq!(flow.state(), FlowState::Complete);
        assert!(!flow.cancellation_token().is_cancelled());
        assert_eq!(flow.answers().and_then(|a| a.get_choice("q2").ok()), Some("Yes"));

        // Cancelling through a shared token does not reopen it either.
        flow.cancellation_token().cancel();
        assert_eq!(flow.state(), FlowState::Complete);
        assert!(flow.answers().is_some());
        assert!(matches!(flow.advance().await, Err(FlowError::SessionComplete)));
    }

    #[tokio::test]
    async fn abandon_rejects_everything() {
        let mut flow = controller(FlowConfig::local());
        flow.start_survey(RespondentIntake::new("Ada")).await.unwrap();
        flow.abandon();

        assert_eq!(flow.state(), FlowState::Abandoned);
        assert!(flow.answers().is_none());
        assert!(matches!(flow.advance().await, Err(FlowError::Abandoned)));
        assert!(matches!(flow.retreat(), Err(FlowError::Abandoned)));
    }

    #[tokio::test]
    async fn without_persistence_nothing_is_saved() {
        let definition = yes_no_survey();
        let backend = Arc::new(MemoryBackend::new());
        backend.register(Arc::clone(&definition));
        let config = FlowConfig {
            persist_answers: false,
            ..FlowConfig::local()
        };
        let mut flow = FlowController::new(definition, Arc::clone(&backend), config).unwrap();
        flow.start_survey(RespondentIntake::new("Ada")).await.unwrap();

        let receipt = flow.submit_answer(choice("q1", "Yes")).await.unwrap();
        assert!(!receipt.persisted);
        let submission = flow.submission().unwrap().clone();
        assert!(backend.saved_answers(&submission).is_empty());
    }

    #[test]
    fn broken_definition_is_rejected() {
        let definition = Arc::new(SurveyDefinition::new(
            "dup",
            vec![
                Question::new("q1", "One", QuestionKind::FreeText),
                Question::new("q1", "Again", QuestionKind::FreeText),
            ],
        ));
        let err = FlowController::new(definition, Arc::new(MemoryBackend::new()), FlowConfig::default())
            .unwrap_err();
        assert!(matches!(err, FlowError::Definition(_)));
    }
}
