//! Routing rule resolution.

use survey_flow_types::{
    Answers, Question, QuestionId, RouteDecision, RoutingAction, RoutingRule, SurveyDefinition,
};

use crate::Diagnostic;
use crate::evaluator::evaluate;

/// Where navigation goes after a question, with jump targets already located.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Continue,
    Jump { index: usize, target: QuestionId },
    End,
}

impl From<&Route> for RouteDecision {
    fn from(route: &Route) -> Self {
        match route {
            Route::Continue => RouteDecision::Continue,
            Route::Jump { index, .. } => RouteDecision::GotoQuestion {
                question_index: *index,
            },
            Route::End => RouteDecision::EndSurvey,
        }
    }
}

/// Result of resolving one question's rules.
#[derive(Debug, Clone, PartialEq)]
pub struct Resolution {
    pub route: Route,

    /// Position of the rule that matched, if any.
    pub matched_rule: Option<usize>,

    /// Set when the matched rule could not be followed.
    pub diagnostic: Option<Diagnostic>,
}

/// Returns the first rule whose conditions all hold, with its position.
///
/// Conditions within a rule short-circuit on the first false one; later rules
/// are not looked at once one matches.
pub fn first_matching_rule<'a>(
    rules: &'a [RoutingRule],
    answers: &Answers,
) -> Option<(usize, &'a RoutingRule)> {
    rules
        .iter()
        .enumerate()
        .find(|(_, rule)| rule.conditions.iter().all(|c| evaluate(c, answers)))
}

/// Resolves routing rules against one survey's question sequence.
#[derive(Debug, Clone, Copy)]
pub struct RuleResolver<'a> {
    definition: &'a SurveyDefinition,
}

impl<'a> RuleResolver<'a> {
    pub fn new(definition: &'a SurveyDefinition) -> Self {
        Self { definition }
    }

    /// Decides the route after `question`, given every answer collected so far.
    ///
    /// No rules, or no matching rule, continues in order. A jump to a question
    /// that is not in the survey, or to the question itself, also continues in
    /// order and carries a diagnostic.
    pub fn resolve(&self, question: &Question, answers: &Answers) -> Resolution {
        let Some((rule, matched)) = first_matching_rule(question.routing_rules(), answers) else {
            tracing::debug!(question = %question.id(), "no routing rule matched");
            return Resolution {
                route: Route::Continue,
                matched_rule: None,
                diagnostic: None,
            };
        };
        tracing::debug!(question = %question.id(), rule, action = ?matched.action, "routing rule matched");

        let (route, diagnostic) = match &matched.action {
            RoutingAction::Continue => (Route::Continue, None),
            RoutingAction::EndSurvey => (Route::End, None),
            RoutingAction::GotoQuestion { target } if target == question.id() => (
                Route::Continue,
                Some(Diagnostic::SelfJump {
                    question: question.id().clone(),
                }),
            ),
            RoutingAction::GotoQuestion { target } => match self.definition.position(target.as_str()) {
                Some(index) => (
                    Route::Jump {
                        index,
                        target: target.clone(),
                    },
                    None,
                ),
                None => (
                    Route::Continue,
                    Some(Diagnostic::UnknownJumpTarget {
                        question: question.id().clone(),
                        rule,
                        target: target.clone(),
                    }),
                ),
            },
        };

        Resolution {
            route,
            matched_rule: Some(rule),
            diagnostic,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_flow_types::{AnswerValue, QuestionKind, RoutingCondition};

    fn question(rules: Vec<RoutingRule>) -> Question {
        rules.into_iter().fold(
            Question::new("q1", "Pick", QuestionKind::MultiChoice).with_options(["A", "B", "C"]),
            Question::with_rule,
        )
    }

    fn survey(q1: Question) -> SurveyDefinition {
        SurveyDefinition::new(
            "s",
            vec![
                q1,
                Question::new("q2", "Two", QuestionKind::FreeText),
                Question::new("q3", "Three", QuestionKind::FreeText),
                Question::new("q4", "Four", QuestionKind::FreeText),
            ],
        )
    }

    fn answered(items: Vec<&str>) -> Answers {
        let mut answers = Answers::new();
        answers.insert("q1", AnswerValue::from(items));
        answers
    }

    #[test]
    fn first_match_wins_over_later_matches() {
        let q1 = question(vec![
            RoutingRule::new(RoutingAction::goto("q3")).when(RoutingCondition::contains_any("q1", vec!["Z"])),
            RoutingRule::new(RoutingAction::goto("q4")).when(RoutingCondition::contains_any("q1", vec!["B"])),
            RoutingRule::new(RoutingAction::EndSurvey).when(RoutingCondition::answered("q1")),
        ]);
        let definition = survey(q1.clone());
        let resolution = RuleResolver::new(&definition).resolve(&q1, &answered(vec!["B", "C"]));

        assert_eq!(resolution.matched_rule, Some(1));
        assert_eq!(
            resolution.route,
            Route::Jump {
                index: 3,
                target: "q4".into()
            }
        );
        assert!(resolution.diagnostic.is_none());
    }

    #[test]
    fn all_conditions_must_hold() {
        let q1 = question(vec![
            RoutingRule::new(RoutingAction::EndSurvey)
                .when(RoutingCondition::contains_any("q1", vec!["B"]))
                .when(RoutingCondition::answered("q2")),
        ]);
        let definition = survey(q1.clone());
        let resolution = RuleResolver::new(&definition).resolve(&q1, &answered(vec!["B"]));
        assert_eq!(resolution.route, Route::Continue);
        assert_eq!(resolution.matched_rule, None);
    }

    #[test]
    fn no_rules_continues() {
        let q1 = question(vec![]);
        let definition = survey(q1.clone());
        let resolution = RuleResolver::new(&definition).resolve(&q1, &Answers::new());
        assert_eq!(resolution.route, Route::Continue);
    }

    #[test]
    fn rule_without_conditions_always_matches() {
        let q1 = question(vec![RoutingRule::new(RoutingAction::EndSurvey)]);
        let definition = survey(q1.clone());
        let resolution = RuleResolver::new(&definition).resolve(&q1, &Answers::new());
        assert_eq!(resolution.route, Route::End);
    }

    #[test]
    fn unknown_target_continues_with_diagnostic() {
        let q1 = question(vec![RoutingRule::new(RoutingAction::goto("q9"))]);
        let definition = survey(q1.clone());
        let resolution = RuleResolver::new(&definition).resolve(&q1, &Answers::new());

        assert_eq!(resolution.route, Route::Continue);
        assert_eq!(resolution.matched_rule, Some(0));
        assert!(matches!(
            resolution.diagnostic,
            Some(Diagnostic::UnknownJumpTarget { ref target, .. }) if target.as_str() == "q9"
        ));
    }

    #[test]
    fn self_jump_continues_with_diagnostic() {
        let q1 = question(vec![RoutingRule::new(RoutingAction::goto("q1"))]);
        let definition = survey(q1.clone());
        let resolution = RuleResolver::new(&definition).resolve(&q1, &Answers::new());
        assert_eq!(resolution.route, Route::Continue);
        assert!(matches!(resolution.diagnostic, Some(Diagnostic::SelfJump { .. })));
    }

    #[test]
    fn first_matching_rule_is_independent_of_list_length() {
        let mut rules = vec![RoutingRule::new(RoutingAction::goto("q2")).when(RoutingCondition::answered("q1"))];
        for _ in 0..50 {
            rules.push(RoutingRule::new(RoutingAction::EndSurvey));
        }
        let (index, rule) = first_matching_rule(&rules, &answered(vec!["A"])).unwrap();
        assert_eq!(index, 0);
        assert_eq!(rule.action, RoutingAction::goto("q2"));

        let (index, _) = first_matching_rule(&rules, &Answers::new()).unwrap();
        assert_eq!(index, 1);
    }

    #[test]
    fn route_to_decision() {
        let jump = Route::Jump {
            index: 2,
            target: "q3".into(),
        };
        assert_eq!(
            RouteDecision::from(&jump),
            RouteDecision::GotoQuestion { question_index: 2 }
        );
        assert_eq!(RouteDecision::from(&Route::End), RouteDecision::EndSurvey);
    }
}
