//! Condition evaluation.
//!
//! Evaluation never fails. A missing answer, a value of the wrong shape or a
//! number that does not parse all make the condition false, so a malformed
//! rule can only ever fall through to the next rule.

use survey_flow_types::{AnswerValue, Answers, ConditionValue, Operator, RoutingCondition};

/// Evaluates one condition against the collected answers.
pub fn evaluate(condition: &RoutingCondition, answers: &Answers) -> bool {
    let answer = answers.get(condition.question_id.as_str());
    match condition.operator {
        Operator::IsAnswered => answer.is_some_and(|value| !value.is_empty()),
        Operator::IsNotAnswered => answer.is_none_or(AnswerValue::is_empty),
        operator => match (answer, condition.value.as_ref()) {
            (Some(answer), Some(value)) => compare(operator, answer, value),
            _ => false,
        },
    }
}

fn compare(operator: Operator, answer: &AnswerValue, value: &ConditionValue) -> bool {
    match operator {
        Operator::Equals => answer.text_form() == value.text_form(),
        Operator::NotEquals => answer.text_form() != value.text_form(),
        Operator::Contains => contains(answer, value).unwrap_or(false),
        Operator::NotContains => contains(answer, value).is_some_and(|found| !found),
        Operator::ContainsAny => match answer.items() {
            Some(items) => value.items().iter().any(|wanted| items.contains(&wanted.as_str())),
            None => false,
        },
        Operator::ContainsAll => match answer.items() {
            Some(items) => value.items().iter().all(|wanted| items.contains(&wanted.as_str())),
            None => false,
        },
        Operator::GreaterThan => numbers(answer, value).is_some_and(|(a, b)| a > b),
        Operator::LessThan => numbers(answer, value).is_some_and(|(a, b)| a < b),
        // handled before a value is looked at
        Operator::IsAnswered | Operator::IsNotAnswered => false,
    }
}

/// `None` when the comparison does not apply to the value shapes.
fn contains(answer: &AnswerValue, value: &ConditionValue) -> Option<bool> {
    if matches!(value, ConditionValue::List(_)) {
        return None;
    }
    let needle = value.text_form();
    match answer {
        AnswerValue::Text(text) => Some(text.contains(needle.as_str())),
        AnswerValue::Choice(choice) => Some(*choice == needle),
        AnswerValue::Choices(items) => Some(items.iter().any(|item| *item == needle)),
        AnswerValue::Media(_) => None,
    }
}

fn numbers(answer: &AnswerValue, value: &ConditionValue) -> Option<(f64, f64)> {
    let lhs = match answer {
        AnswerValue::Text(s) | AnswerValue::Choice(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    let rhs = value.as_number()?;
    Some((lhs, rhs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_flow_types::{MediaRef, RoutingCondition};

    fn answers() -> Answers {
        let mut answers = Answers::new();
        answers.insert("single", AnswerValue::Choice("Yes".into()));
        answers.insert("multi", AnswerValue::from(vec!["B", "C"]));
        answers.insert("text", "the roof leaks badly");
        answers.insert("count", "12");
        answers.insert("blank", "   ");
        answers.insert("photo", MediaRef::new("s3://site/1.jpg"));
        answers
    }

    fn check(question: &str, operator: Operator, value: Option<ConditionValue>) -> bool {
        let condition = RoutingCondition {
            question_id: question.into(),
            operator,
            value,
        };
        evaluate(&condition, &answers())
    }

    fn text(s: &str) -> Option<ConditionValue> {
        Some(ConditionValue::Text(s.into()))
    }

    fn list(items: &[&str]) -> Option<ConditionValue> {
        Some(ConditionValue::List(items.iter().map(|s| s.to_string()).collect()))
    }

    #[test]
    fn equals_and_not_equals() {
        assert!(check("single", Operator::Equals, text("Yes")));
        assert!(!check("single", Operator::Equals, text("yes")));
        assert!(check("single", Operator::NotEquals, text("No")));
        assert!(!check("single", Operator::NotEquals, text("Yes")));
        assert!(check("count", Operator::Equals, Some(ConditionValue::Number(12.0))));
    }

    #[test]
    fn contains_on_collections_and_text() {
        assert!(check("multi", Operator::Contains, text("B")));
        assert!(!check("multi", Operator::Contains, text("A")));
        assert!(check("multi", Operator::NotContains, text("A")));
        assert!(check("text", Operator::Contains, text("roof")));
        assert!(check("single", Operator::Contains, text("Yes")));
    }

    #[test]
    fn contains_with_list_value_is_false_both_ways() {
        assert!(!check("multi", Operator::Contains, list(&["B"])));
        assert!(!check("multi", Operator::NotContains, list(&["B"])));
    }

    #[test]
    fn contains_any_and_all() {
        assert!(check("multi", Operator::ContainsAny, list(&["A", "B"])));
        assert!(!check("multi", Operator::ContainsAny, list(&["A", "D"])));
        assert!(check("multi", Operator::ContainsAll, list(&["C", "B"])));
        assert!(!check("multi", Operator::ContainsAll, list(&["B", "D"])));
        assert!(check("multi", Operator::ContainsAll, list(&[])));
        assert!(check("single", Operator::ContainsAny, text("Yes")));
    }

    #[test]
    fn numeric_comparisons() {
        assert!(check("count", Operator::GreaterThan, Some(ConditionValue::Number(10.0))));
        assert!(!check("count", Operator::GreaterThan, Some(ConditionValue::Number(12.0))));
        assert!(check("count", Operator::LessThan, text("12.5")));
        assert!(!check("text", Operator::GreaterThan, Some(ConditionValue::Number(0.0))));
        assert!(!check("count", Operator::LessThan, text("many")));
        assert!(!check("multi", Operator::GreaterThan, Some(ConditionValue::Number(0.0))));
    }

    #[test]
    fn answered_family() {
        assert!(check("single", Operator::IsAnswered, None));
        assert!(check("photo", Operator::IsAnswered, None));
        assert!(!check("blank", Operator::IsAnswered, None));
        assert!(check("blank", Operator::IsNotAnswered, None));
    }

    #[test]
    fn media_only_answers_the_answered_family() {
        assert!(!check("photo", Operator::ContainsAny, list(&["s3://site/1.jpg"])));
        assert!(!check("photo", Operator::Contains, text("site")));
        assert!(!check("photo", Operator::NotContains, text("site")));
    }

    #[test]
    fn missing_answer_is_false_except_not_answered() {
        let all = [
            (Operator::Equals, text("x")),
            (Operator::NotEquals, text("x")),
            (Operator::Contains, text("x")),
            (Operator::NotContains, text("x")),
            (Operator::ContainsAny, list(&["x"])),
            (Operator::ContainsAll, list(&["x"])),
            (Operator::GreaterThan, Some(ConditionValue::Number(1.0))),
            (Operator::LessThan, Some(ConditionValue::Number(1.0))),
            (Operator::IsAnswered, None),
        ];
        for (operator, value) in all {
            assert!(!check("missing", operator, value), "{operator} on a missing answer");
        }
        assert!(check("missing", Operator::IsNotAnswered, None));
    }

    #[test]
    fn missing_value_is_false() {
        assert!(!check("single", Operator::Equals, None));
        assert!(!check("single", Operator::NotEquals, None));
    }
}
