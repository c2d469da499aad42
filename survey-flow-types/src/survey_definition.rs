use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::{DefinitionError, Operator, Question, QuestionId, RoutingAction};

/// The top-level structure containing all questions and metadata for a survey.
///
/// The question order is the sequential order a respondent walks through
/// when no routing rule says otherwise.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurveyDefinition {
    /// Identifier of the survey, used when starting a submission.
    pub id: String,

    /// Human-readable title.
    #[serde(default)]
    pub title: String,

    /// Optional message shown before the first question.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prelude: Option<String>,

    /// All questions in the survey, in sequential order.
    pub questions: Vec<Question>,

    /// Optional message shown after the survey completes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub epilogue: Option<String>,
}

impl SurveyDefinition {
    /// Create a new survey definition with the given questions.
    pub fn new(id: impl Into<String>, questions: Vec<Question>) -> Self {
        Self {
            id: id.into(),
            title: String::new(),
            prelude: None,
            questions,
            epilogue: None,
        }
    }

    /// Set the title.
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Set the prelude message.
    pub fn with_prelude(mut self, prelude: impl Into<String>) -> Self {
        self.prelude = Some(prelude.into());
        self
    }

    /// Set the epilogue message.
    pub fn with_epilogue(mut self, epilogue: impl Into<String>) -> Self {
        self.epilogue = Some(epilogue.into());
        self
    }

    /// Get the questions.
    pub fn questions(&self) -> &[Question] {
        &self.questions
    }

    /// Check if the survey has any questions.
    pub fn is_empty(&self) -> bool {
        self.questions.is_empty()
    }

    /// Get the number of questions.
    pub fn len(&self) -> usize {
        self.questions.len()
    }

    /// Find a question by identifier.
    pub fn question(&self, id: &str) -> Option<&Question> {
        self.questions.iter().find(|q| q.id().as_str() == id)
    }

    /// Position of a question in the sequence.
    pub fn position(&self, id: &str) -> Option<usize> {
        self.questions.iter().position(|q| q.id().as_str() == id)
    }

    /// Get the question at a position.
    pub fn question_at(&self, index: usize) -> Option<&Question> {
        self.questions.get(index)
    }

    /// Checks the structural requirements a session relies on.
    ///
    /// Every question needs a non-blank identifier and identifiers must be unique.
    pub fn validate(&self) -> Result<(), DefinitionError> {
        let mut seen = HashSet::new();
        for (index, question) in self.questions.iter().enumerate() {
            if question.id().is_blank() {
                return Err(DefinitionError::BlankQuestionId { index });
            }
            if !seen.insert(question.id().as_str()) {
                return Err(DefinitionError::DuplicateQuestion(question.id().clone()));
            }
        }
        Ok(())
    }

    /// Reports routing and option misconfiguration.
    ///
    /// None of these stop a session: navigation recovers from each of them at
    /// runtime by continuing sequentially. The report exists so they can be
    /// fixed before a survey is published.
    pub fn lint(&self) -> Vec<DefinitionIssue> {
        let mut issues = Vec::new();

        for question in &self.questions {
            let id = question.id();

            if question.kind().is_choice() && question.options().is_empty() {
                issues.push(DefinitionIssue::MissingOptions(id.clone()));
            }
            if !question.kind().is_choice() && !question.options().is_empty() {
                issues.push(DefinitionIssue::UnexpectedOptions(id.clone()));
            }

            for (rule_index, rule) in question.routing_rules().iter().enumerate() {
                if let RoutingAction::GotoQuestion { target } = &rule.action {
                    if target == id {
                        issues.push(DefinitionIssue::SelfJump {
                            question: id.clone(),
                            rule: rule_index,
                        });
                    } else if self.position(target.as_str()).is_none() {
                        issues.push(DefinitionIssue::UnknownJumpTarget {
                            question: id.clone(),
                            rule: rule_index,
                            target: target.clone(),
                        });
                    }
                }

                for condition in &rule.conditions {
                    if self.position(condition.question_id.as_str()).is_none() {
                        issues.push(DefinitionIssue::UnknownConditionQuestion {
                            question: id.clone(),
                            rule: rule_index,
                            referenced: condition.question_id.clone(),
                        });
                    }
                    match (condition.operator.needs_value(), condition.value.is_some()) {
                        (true, false) => issues.push(DefinitionIssue::MissingConditionValue {
                            question: id.clone(),
                            rule: rule_index,
                            operator: condition.operator,
                        }),
                        (false, true) => issues.push(DefinitionIssue::UnusedConditionValue {
                            question: id.clone(),
                            rule: rule_index,
                            operator: condition.operator,
                        }),
                        _ => {}
                    }
                }
            }
        }

        if let Err(err) = self.validate() {
            issues.insert(0, DefinitionIssue::Structure(err.to_string()));
        }
        issues
    }
}

/// A configuration problem found by [`SurveyDefinition::lint`].
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum DefinitionIssue {
    #[error("{0}")]
    Structure(String),

    #[error("question '{question}' rule #{rule} jumps to unknown question '{target}'")]
    UnknownJumpTarget {
        question: QuestionId,
        rule: usize,
        target: QuestionId,
    },

    #[error("question '{question}' rule #{rule} jumps to itself")]
    SelfJump { question: QuestionId, rule: usize },

    #[error("question '{question}' rule #{rule} tests unknown question '{referenced}'")]
    UnknownConditionQuestion {
        question: QuestionId,
        rule: usize,
        referenced: QuestionId,
    },

    #[error("question '{question}' rule #{rule}: operator '{operator}' needs a value")]
    MissingConditionValue {
        question: QuestionId,
        rule: usize,
        operator: Operator,
    },

    #[error("question '{question}' rule #{rule}: operator '{operator}' ignores its value")]
    UnusedConditionValue {
        question: QuestionId,
        rule: usize,
        operator: Operator,
    },

    #[error("choice question '{0}' has no options")]
    MissingOptions(QuestionId),

    #[error("question '{0}' declares options but is not a choice question")]
    UnexpectedOptions(QuestionId),
}
