use survey_flow::{
    MediaAttachment, Operator, Question, QuestionKind, RoutingAction, RoutingCondition,
    RoutingRule, SurveyDefinition,
};

pub const HAZARDS: [&str; 5] = ["Asbestos", "Exposed wiring", "Water damage", "Mould", "None"];

/// Building inspection checklist with photo and video evidence.
///
/// Uses every question kind and every operator family:
/// - industrial sites go straight to the hazard checklist
/// - vacant sites skip the fire exit and access questions
/// - blocked exits in a crowded building escalate immediately
/// - "locked" access notes ask for a photo of the entrance
/// - the hazard mix decides between video evidence, escalation or the summary
pub fn site_inspection() -> SurveyDefinition {
    SurveyDefinition::new(
        "site-inspection",
        vec![
            Question::new("site_type", "What kind of site is this?", QuestionKind::SingleChoice)
                .with_options(["Residential", "Commercial", "Industrial"])
                .required()
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("hazards"))
                        .when(RoutingCondition::equals("site_type", "Industrial")),
                ),
            Question::new("occupants", "How many people use the building daily?", QuestionKind::FreeText)
                .required()
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("hazards"))
                        .when(RoutingCondition::new("occupants", Operator::LessThan, 1)),
                ),
            Question::new("fire_exits", "State of the fire exits?", QuestionKind::SingleChoice)
                .with_options(["Clear", "Blocked", "Missing"])
                .required()
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("escalation"))
                        .when(RoutingCondition::new("fire_exits", Operator::NotEquals, "Clear"))
                        .when(RoutingCondition::new("occupants", Operator::GreaterThan, 50)),
                ),
            Question::new("access_notes", "Anything unusual about site access?", QuestionKind::FreeText)
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("entry_photo"))
                        .when(RoutingCondition::new("access_notes", Operator::Contains, "locked")),
                ),
            Question::new("hazards", "Which hazards are present?", QuestionKind::MultiChoice)
                .with_options(HAZARDS)
                .required()
                .with_media(MediaAttachment::image("https://example.com/guides/hazard-signs.png"))
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("escalation")).when(RoutingCondition::new(
                        "hazards",
                        Operator::ContainsAll,
                        vec!["Asbestos", "Water damage"],
                    )),
                )
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("hazard_video")).when(
                        RoutingCondition::contains_any("hazards", vec!["Exposed wiring", "Mould"]),
                    ),
                )
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("summary"))
                        .when(RoutingCondition::new("hazards", Operator::Contains, "None"))
                        .when(RoutingCondition::new("hazards", Operator::NotContains, "Asbestos")),
                ),
            Question::new("entry_photo", "Photograph the entrance.", QuestionKind::Photo).with_rule(
                RoutingRule::new(RoutingAction::goto("hazards"))
                    .when(RoutingCondition::answered("entry_photo"))
                    .when(RoutingCondition::not_answered("hazards")),
            ),
            Question::new("hazard_video", "Record a short walkthrough of the hazard.", QuestionKind::Video)
                .with_rule(
                    RoutingRule::new(RoutingAction::goto("summary"))
                        .when(RoutingCondition::not_answered("hazard_video")),
                ),
            Question::new("escalation", "Describe the immediate risk for the safety officer.", QuestionKind::FreeText)
                .required()
                .with_rule(RoutingRule::new(RoutingAction::EndSurvey).when(RoutingCondition::new(
                    "escalation",
                    Operator::Contains,
                    "evacuate",
                ))),
            Question::new("summary", "Anything else to note?", QuestionKind::FreeText),
        ],
    )
    .with_title("Site inspection")
    .with_prelude("Walk the site before answering. Photos and videos are uploaded separately.")
    .with_epilogue("Inspection recorded.")
}
