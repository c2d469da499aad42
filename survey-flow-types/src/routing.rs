use std::fmt;

use serde::{Deserialize, Serialize};

use crate::QuestionId;

/// Comparison applied by a routing condition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Operator {
    Equals,
    NotEquals,
    Contains,
    NotContains,
    ContainsAny,
    ContainsAll,
    GreaterThan,
    LessThan,
    IsAnswered,
    IsNotAnswered,
}

impl Operator {
    /// Whether the operator compares against a value.
    ///
    /// Only `is_answered` and `is_not_answered` work without one.
    pub fn needs_value(self) -> bool {
        !matches!(self, Self::IsAnswered | Self::IsNotAnswered)
    }

    /// The snake_case name used in survey definitions.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Equals => "equals",
            Self::NotEquals => "not_equals",
            Self::Contains => "contains",
            Self::NotContains => "not_contains",
            Self::ContainsAny => "contains_any",
            Self::ContainsAll => "contains_all",
            Self::GreaterThan => "greater_than",
            Self::LessThan => "less_than",
            Self::IsAnswered => "is_answered",
            Self::IsNotAnswered => "is_not_answered",
        }
    }
}

impl fmt::Display for Operator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The value a condition compares the answer against.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ConditionValue {
    Number(f64),
    Text(String),
    List(Vec<String>),
}

impl ConditionValue {
    /// The value flattened to a single string.
    ///
    /// Numbers use their shortest decimal form (`5`, `2.5`), lists are joined with `,`.
    pub fn text_form(&self) -> String {
        match self {
            Self::Number(n) => n.to_string(),
            Self::Text(s) => s.clone(),
            Self::List(items) => items.join(","),
        }
    }

    /// The value viewed as a list. Scalars become a one-element list.
    pub fn items(&self) -> Vec<String> {
        match self {
            Self::List(items) => items.clone(),
            other => vec![other.text_form()],
        }
    }

    /// The value as a number, parsing text when needed.
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Self::Number(n) => Some(*n),
            Self::Text(s) => s.trim().parse().ok(),
            Self::List(_) => None,
        }
    }
}

impl From<&str> for ConditionValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for ConditionValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<f64> for ConditionValue {
    fn from(n: f64) -> Self {
        Self::Number(n)
    }
}

impl From<i32> for ConditionValue {
    fn from(n: i32) -> Self {
        Self::Number(f64::from(n))
    }
}

impl From<Vec<&str>> for ConditionValue {
    fn from(items: Vec<&str>) -> Self {
        Self::List(items.into_iter().map(str::to_string).collect())
    }
}

impl From<Vec<String>> for ConditionValue {
    fn from(items: Vec<String>) -> Self {
        Self::List(items)
    }
}

/// One test against a recorded answer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingCondition {
    /// The question whose answer is tested. Usually the current one.
    pub question_id: QuestionId,

    pub operator: Operator,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<ConditionValue>,
}

impl RoutingCondition {
    /// Create a condition comparing against a value.
    pub fn new(
        question_id: impl Into<QuestionId>,
        operator: Operator,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self {
            question_id: question_id.into(),
            operator,
            value: Some(value.into()),
        }
    }

    /// `question_id` has a non-empty answer.
    pub fn answered(question_id: impl Into<QuestionId>) -> Self {
        Self {
            question_id: question_id.into(),
            operator: Operator::IsAnswered,
            value: None,
        }
    }

    /// `question_id` has no answer, or an empty one.
    pub fn not_answered(question_id: impl Into<QuestionId>) -> Self {
        Self {
            question_id: question_id.into(),
            operator: Operator::IsNotAnswered,
            value: None,
        }
    }

    pub fn equals(question_id: impl Into<QuestionId>, value: impl Into<ConditionValue>) -> Self {
        Self::new(question_id, Operator::Equals, value)
    }

    pub fn contains_any(
        question_id: impl Into<QuestionId>,
        value: impl Into<ConditionValue>,
    ) -> Self {
        Self::new(question_id, Operator::ContainsAny, value)
    }
}

/// What happens when a rule matches.
///
/// Serialized under the `action` key, with `target` alongside for jumps:
/// `{"action": "goto_question", "target": "q4"}`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum RoutingAction {
    /// Move to the next question in declared order.
    #[default]
    Continue,

    /// Move to a specific question.
    GotoQuestion { target: QuestionId },

    /// Finish the survey, skipping any remaining questions.
    EndSurvey,
}

impl RoutingAction {
    pub fn goto(target: impl Into<QuestionId>) -> Self {
        Self::GotoQuestion {
            target: target.into(),
        }
    }
}

/// A conditional branch attached to a question.
///
/// All conditions must hold (AND). Rules on one question are tried in
/// declaration order and the first match wins.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RoutingRule {
    #[serde(default)]
    pub conditions: Vec<RoutingCondition>,

    #[serde(flatten)]
    pub action: RoutingAction,
}

impl RoutingRule {
    /// Create a rule with no conditions yet. Without conditions it always matches.
    pub fn new(action: RoutingAction) -> Self {
        Self {
            conditions: Vec::new(),
            action,
        }
    }

    /// Add a condition.
    pub fn when(mut self, condition: RoutingCondition) -> Self {
        self.conditions.push(condition);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rule_json_shape() {
        let json = serde_json::json!({
            "conditions": [
                {"question_id": "q1", "operator": "contains_any", "value": ["A", "B"]}
            ],
            "action": "goto_question",
            "target": "q4"
        });
        let rule: RoutingRule = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(rule.action, RoutingAction::goto("q4"));
        assert_eq!(rule.conditions[0].operator, Operator::ContainsAny);
        assert_eq!(
            rule.conditions[0].value,
            Some(ConditionValue::List(vec!["A".into(), "B".into()]))
        );
        assert_eq!(serde_json::to_value(&rule).unwrap(), json);
    }

    #[test]
    fn goto_without_target_is_rejected() {
        let json = serde_json::json!({"conditions": [], "action": "goto_question"});
        assert!(serde_json::from_value::<RoutingRule>(json).is_err());
    }

    #[test]
    fn answered_condition_has_no_value() {
        let json = serde_json::json!({"question_id": "q2", "operator": "is_answered"});
        let condition: RoutingCondition = serde_json::from_value(json).unwrap();
        assert_eq!(condition, RoutingCondition::answered("q2"));
    }

    #[test]
    fn number_text_form() {
        assert_eq!(ConditionValue::Number(5.0).text_form(), "5");
        assert_eq!(ConditionValue::Number(2.5).text_form(), "2.5");
        assert_eq!(ConditionValue::Text(" 7 ".into()).as_number(), Some(7.0));
    }

    #[test]
    fn needs_value() {
        assert!(Operator::Equals.needs_value());
        assert!(!Operator::IsNotAnswered.needs_value());
    }
}
