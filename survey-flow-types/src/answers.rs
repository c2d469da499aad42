use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::{AnswerValue, QuestionId};

/// Error type for answer access operations.
#[derive(Debug, thiserror::Error)]
pub enum AnswerError {
    #[error("Missing answer for question: {0}")]
    Missing(QuestionId),

    #[error("Type mismatch for question '{question_id}': expected {expected}, got {actual}")]
    TypeMismatch {
        question_id: QuestionId,
        expected: &'static str,
        actual: &'static str,
    },
}

/// One submitted answer, bound to the question it answers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Answer {
    pub question_id: QuestionId,
    pub value: AnswerValue,
}

impl Answer {
    /// Create an answer for the given question.
    pub fn new(question_id: impl Into<QuestionId>, value: impl Into<AnswerValue>) -> Self {
        Self {
            question_id: question_id.into(),
            value: value.into(),
        }
    }
}

/// Answers collected in one session, keyed by question.
///
/// Serializes as a plain JSON object `{ "q1": {"type": ..., "value": ...}, ... }`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Answers {
    values: HashMap<QuestionId, AnswerValue>,
}

impl Answers {
    /// Create a new empty answer collection.
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    /// Record a value for the given question, replacing any previous one.
    pub fn insert(&mut self, question_id: impl Into<QuestionId>, value: impl Into<AnswerValue>) {
        self.values.insert(question_id.into(), value.into());
    }

    /// Get the recorded value for a question.
    pub fn get(&self, question_id: &str) -> Option<&AnswerValue> {
        self.values.get(question_id)
    }

    /// Check if a value is recorded for a question (it may be empty).
    pub fn contains(&self, question_id: &str) -> bool {
        self.values.contains_key(question_id)
    }

    /// Remove the recorded value for a question.
    pub fn remove(&mut self, question_id: &str) -> Option<AnswerValue> {
        self.values.remove(question_id)
    }

    /// Get an iterator over all recorded answers.
    pub fn iter(&self) -> impl Iterator<Item = (&QuestionId, &AnswerValue)> {
        self.values.iter()
    }

    /// Get the number of recorded answers.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if there are no recorded answers.
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Merge another answer collection into this one.
    pub fn extend(&mut self, other: Answers) {
        self.values.extend(other.values);
    }

    // === Convenience accessors ===

    /// Get a free-text answer.
    pub fn get_text(&self, question_id: &str) -> Result<&str, AnswerError> {
        match self.get(question_id) {
            Some(AnswerValue::Text(s)) => Ok(s),
            Some(other) => Err(AnswerError::TypeMismatch {
                question_id: question_id.into(),
                expected: "Text",
                actual: other.type_name(),
            }),
            None => Err(AnswerError::Missing(question_id.into())),
        }
    }

    /// Get a single-choice answer.
    pub fn get_choice(&self, question_id: &str) -> Result<&str, AnswerError> {
        match self.get(question_id) {
            Some(AnswerValue::Choice(s)) => Ok(s),
            Some(other) => Err(AnswerError::TypeMismatch {
                question_id: question_id.into(),
                expected: "Choice",
                actual: other.type_name(),
            }),
            None => Err(AnswerError::Missing(question_id.into())),
        }
    }

    /// Get a multi-choice answer.
    pub fn get_choices(&self, question_id: &str) -> Result<&[String], AnswerError> {
        match self.get(question_id) {
            Some(AnswerValue::Choices(items)) => Ok(items),
            Some(other) => Err(AnswerError::TypeMismatch {
                question_id: question_id.into(),
                expected: "Choices",
                actual: other.type_name(),
            }),
            None => Err(AnswerError::Missing(question_id.into())),
        }
    }

    /// Check if a question has a recorded, non-empty answer.
    ///
    /// Returns `false` if the answer is missing OR if it is empty
    /// (blank text, no options chosen, media without a location).
    pub fn has_value(&self, question_id: &str) -> bool {
        self.get(question_id).is_some_and(|value| !value.is_empty())
    }
}

impl FromIterator<Answer> for Answers {
    fn from_iter<I: IntoIterator<Item = Answer>>(iter: I) -> Self {
        let mut answers = Answers::new();
        for answer in iter {
            answers.insert(answer.question_id, answer.value);
        }
        answers
    }
}

impl IntoIterator for Answers {
    type Item = (QuestionId, AnswerValue);
    type IntoIter = std::collections::hash_map::IntoIter<QuestionId, AnswerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.into_iter()
    }
}

impl<'a> IntoIterator for &'a Answers {
    type Item = (&'a QuestionId, &'a AnswerValue);
    type IntoIter = std::collections::hash_map::Iter<'a, QuestionId, AnswerValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.values.iter()
    }
}
