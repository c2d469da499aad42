//! One respondent's traversal of a survey.

use std::collections::BTreeSet;
use std::sync::Arc;

use survey_flow_types::{
    Answer, AnswerValue, Answers, Question, QuestionId, SubmissionId, SurveyDefinition,
};

use crate::FlowError;

/// Owned state of one session: where the respondent is and what they answered.
///
/// Created by `FlowController::start_survey`. Navigation methods are crate
/// private so only the controller moves the cursor.
#[derive(Debug, Clone)]
pub struct SurveySession {
    submission: SubmissionId,
    definition: Arc<SurveyDefinition>,
    index: usize,
    answers: Answers,
    /// Recorded answers the submission service has not confirmed yet.
    unsynced: BTreeSet<QuestionId>,
    complete: bool,
}

impl SurveySession {
    pub fn new(submission: SubmissionId, definition: Arc<SurveyDefinition>) -> Self {
        let complete = definition.is_empty();
        Self {
            submission,
            definition,
            index: 0,
            answers: Answers::new(),
            unsynced: BTreeSet::new(),
            complete,
        }
    }

    pub fn submission(&self) -> &SubmissionId {
        &self.submission
    }

    pub fn definition(&self) -> &SurveyDefinition {
        &self.definition
    }

    /// 0-based position of the current question.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn len(&self) -> usize {
        self.definition.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definition.is_empty()
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    /// The question being shown, or `None` once complete.
    pub fn current_question(&self) -> Option<&Question> {
        if self.complete {
            return None;
        }
        self.definition.question_at(self.index)
    }

    pub fn answers(&self) -> &Answers {
        &self.answers
    }

    /// The recorded answer for the current question, for pre-filling.
    pub fn current_answer(&self) -> Option<&AnswerValue> {
        self.current_question()
            .and_then(|question| self.answers.get(question.id().as_str()))
    }

    /// Answers recorded locally but not yet saved remotely.
    pub fn unsynced(&self) -> impl Iterator<Item = &QuestionId> {
        self.unsynced.iter()
    }

    pub fn has_unsynced(&self) -> bool {
        !self.unsynced.is_empty()
    }

    /// Record an answer to the current question.
    ///
    /// Replaces any earlier answer to the same question. The answer starts out
    /// unsynced.
    pub(crate) fn record(&mut self, answer: Answer) -> Result<(), FlowError> {
        if self.complete {
            return Err(FlowError::SessionComplete);
        }
        let question = self
            .definition
            .question_at(self.index)
            .ok_or(FlowError::SessionComplete)?;
        if question.id() != &answer.question_id {
            return Err(FlowError::NotCurrentQuestion {
                expected: question.id().clone(),
                got: answer.question_id,
            });
        }
        question
            .validate_answer(&answer.value)
            .map_err(|reason| FlowError::Validation {
                question_id: answer.question_id.clone(),
                reason,
            })?;

        self.unsynced.insert(answer.question_id.clone());
        self.answers.insert(answer.question_id, answer.value);
        Ok(())
    }

    /// Check the current question may be left going forward.
    pub(crate) fn check_required(&self) -> Result<(), FlowError> {
        let Some(question) = self.current_question() else {
            return Ok(());
        };
        if question.is_required() && !self.answers.has_value(question.id().as_str()) {
            return Err(FlowError::Validation {
                question_id: question.id().clone(),
                reason: "An answer is required".to_string(),
            });
        }
        Ok(())
    }

    /// Move to the next question in order, completing after the last one.
    pub(crate) fn step_forward(&mut self) {
        if self.index + 1 >= self.len() {
            self.complete = true;
        } else {
            self.index += 1;
        }
    }

    pub(crate) fn jump_to(&mut self, index: usize) {
        debug_assert!(index < self.len());
        self.index = index;
    }

    pub(crate) fn end(&mut self) {
        self.complete = true;
    }

    /// Move back one question. Returns `false` at the first question.
    pub(crate) fn step_back(&mut self) -> bool {
        if self.index == 0 {
            return false;
        }
        self.index -= 1;
        true
    }

    pub(crate) fn mark_synced(&mut self, question: &QuestionId) {
        self.unsynced.remove(question);
    }

    /// Answers that still need saving, cloned so the session can be mutated
    /// while they are sent.
    pub(crate) fn pending_answers(&self) -> Vec<Answer> {
        self.unsynced
            .iter()
            .filter_map(|id| {
                self.answers
                    .get(id.as_str())
                    .map(|value| Answer::new(id.clone(), value.clone()))
            })
            .collect()
    }
}
