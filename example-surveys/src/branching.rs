//! Small surveys that each show one routing behaviour.

use survey_flow::{
    Question, QuestionKind, RoutingAction, RoutingCondition, RoutingRule, SurveyDefinition,
};

/// Answering "Yes" to the second question ends the survey early.
pub fn early_exit() -> SurveyDefinition {
    SurveyDefinition::new(
        "early-exit",
        vec![
            Question::new("visited", "Have you visited us before?", QuestionKind::SingleChoice)
                .with_options(["Yes", "No"])
                .required(),
            Question::new("satisfied", "Was everything to your satisfaction?", QuestionKind::SingleChoice)
                .with_options(["Yes", "No"])
                .required()
                .with_rule(
                    RoutingRule::new(RoutingAction::EndSurvey)
                        .when(RoutingCondition::equals("satisfied", "Yes")),
                ),
            Question::new("improve", "What should we improve?", QuestionKind::FreeText),
        ],
    )
    .with_title("Visitor feedback")
    .with_epilogue("Thanks for your feedback!")
}

/// Picking any outdoor activity skips the indoor questions.
pub fn skip_ahead() -> SurveyDefinition {
    SurveyDefinition::new(
        "skip-ahead",
        vec![
            Question::new("activities", "What do you do on weekends?", QuestionKind::MultiChoice)
                .with_options(["Hiking", "Cycling", "Reading", "Gaming"])
                .required()
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("outdoor_hours"))
                        .when(RoutingCondition::contains_any("activities", vec!["Hiking", "Cycling"])),
                ),
            Question::new("favourite_book", "Favourite book?", QuestionKind::FreeText),
            Question::new("favourite_game", "Favourite game?", QuestionKind::FreeText),
            Question::new("outdoor_hours", "Hours spent outdoors per weekend?", QuestionKind::FreeText),
        ],
    )
    .with_title("Weekend habits")
}

#[cfg(test)]
mod tests {
    use super::*;
    use survey_flow::{Answers, RuleResolver, Route};

    #[test]
    fn early_exit_routes() {
        let survey = early_exit();
        let question = survey.question("satisfied").unwrap();

        let mut answers = Answers::new();
        answers.insert("satisfied", survey_flow::AnswerValue::Choice("Yes".into()));
        assert_eq!(RuleResolver::new(&survey).resolve(question, &answers).route, Route::End);

        answers.insert("satisfied", survey_flow::AnswerValue::Choice("No".into()));
        assert_eq!(RuleResolver::new(&survey).resolve(question, &answers).route, Route::Continue);
    }

    #[test]
    fn skip_ahead_routes() {
        let survey = skip_ahead();
        let question = survey.question("activities").unwrap();

        let mut answers = Answers::new();
        answers.insert("activities", vec!["Cycling", "Gaming"]);
        let resolution = RuleResolver::new(&survey).resolve(question, &answers);
        assert_eq!(
            resolution.route,
            Route::Jump {
                index: 3,
                target: "outdoor_hours".into()
            }
        );
    }
}
