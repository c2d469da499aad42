use serde::{Deserialize, Serialize};

use crate::{AnswerValue, QuestionId, RoutingRule};

/// A single question in a survey.
///
/// Questions are immutable once a session has started; the builder methods
/// are meant for assembling a definition.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Identifier, unique within the survey.
    id: QuestionId,

    /// The prompt text shown to the respondent.
    prompt: String,

    /// The kind of question (determines the expected answer shape).
    #[serde(rename = "type")]
    kind: QuestionKind,

    /// Whether navigation is blocked until the question has a non-empty answer.
    #[serde(default)]
    required: bool,

    /// Allowed options, in display order. Only meaningful for choice kinds.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    options: Vec<String>,

    /// Routing rules, tried in order after the question is answered.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    routing_rules: Vec<RoutingRule>,

    /// Media shown alongside the prompt.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    media: Option<MediaAttachment>,
}

impl Question {
    /// Create a new optional question without options or rules.
    pub fn new(id: impl Into<QuestionId>, prompt: impl Into<String>, kind: QuestionKind) -> Self {
        Self {
            id: id.into(),
            prompt: prompt.into(),
            kind,
            required: false,
            options: Vec::new(),
            routing_rules: Vec::new(),
            media: None,
        }
    }

    /// Mark the question as required.
    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    /// Mark the question as optional.
    pub fn optional(mut self) -> Self {
        self.required = false;
        self
    }

    /// Set the allowed options.
    pub fn with_options<I, S>(mut self, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options = options.into_iter().map(Into::into).collect();
        self
    }

    /// Append a routing rule.
    pub fn with_rule(mut self, rule: RoutingRule) -> Self {
        self.routing_rules.push(rule);
        self
    }

    /// Attach media to the prompt.
    pub fn with_media(mut self, media: MediaAttachment) -> Self {
        self.media = Some(media);
        self
    }

    pub fn id(&self) -> &QuestionId {
        &self.id
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn kind(&self) -> QuestionKind {
        self.kind
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn options(&self) -> &[String] {
        &self.options
    }

    pub fn routing_rules(&self) -> &[RoutingRule] {
        &self.routing_rules
    }

    /// Check if any routing rule is attached.
    pub fn has_routing_rules(&self) -> bool {
        !self.routing_rules.is_empty()
    }

    pub fn media(&self) -> Option<&MediaAttachment> {
        self.media.as_ref()
    }

    /// Validates an answer value against the question.
    ///
    /// Checks the value shape matches the kind and, for choice questions with
    /// declared options, that every chosen option is allowed. Empty values pass;
    /// whether an empty answer is acceptable is decided by `is_required` at
    /// navigation time.
    ///
    /// # Returns
    /// * `Ok(())` if the value is acceptable
    /// * `Err(message)` describing the problem otherwise
    pub fn validate_answer(&self, value: &AnswerValue) -> Result<(), String> {
        if value.is_empty() {
            return Ok(());
        }
        match (self.kind, value) {
            (QuestionKind::FreeText, AnswerValue::Text(_)) => Ok(()),
            (QuestionKind::SingleChoice, AnswerValue::Choice(choice)) => self.check_option(choice),
            (QuestionKind::MultiChoice, AnswerValue::Choices(choices)) => {
                choices.iter().try_for_each(|choice| self.check_option(choice))
            }
            (QuestionKind::Photo | QuestionKind::Video, AnswerValue::Media(_)) => Ok(()),
            (kind, other) => Err(format!(
                "A {} question cannot take a {} answer",
                kind,
                other.type_name()
            )),
        }
    }

    fn check_option(&self, choice: &str) -> Result<(), String> {
        if self.options.is_empty() || self.options.iter().any(|option| option == choice) {
            Ok(())
        } else {
            Err(format!("'{}' is not one of the allowed options", choice))
        }
    }
}

/// The kind of question, determining the expected answer shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QuestionKind {
    /// Free text, answered with `AnswerValue::Text`.
    FreeText,

    /// Pick one option, answered with `AnswerValue::Choice`.
    SingleChoice,

    /// Pick any number of options, answered with `AnswerValue::Choices`.
    MultiChoice,

    /// Upload a photo, answered with `AnswerValue::Media`.
    Photo,

    /// Upload a video, answered with `AnswerValue::Media`.
    Video,
}

impl QuestionKind {
    /// Check if this kind picks from declared options.
    pub fn is_choice(self) -> bool {
        matches!(self, Self::SingleChoice | Self::MultiChoice)
    }

    /// Check if this kind is answered with an upload.
    pub fn is_media(self) -> bool {
        matches!(self, Self::Photo | Self::Video)
    }
}

impl std::fmt::Display for QuestionKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::FreeText => "free-text",
            Self::SingleChoice => "single-choice",
            Self::MultiChoice => "multi-choice",
            Self::Photo => "photo",
            Self::Video => "video",
        };
        f.write_str(name)
    }
}

/// Media shown with a question prompt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaAttachment {
    pub url: String,
    pub kind: MediaKind,
}

impl MediaAttachment {
    pub fn image(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Image,
        }
    }

    pub fn video(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            kind: MediaKind::Video,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediaKind {
    Image,
    Video,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{MediaRef, RoutingAction, RoutingCondition};

    fn colour() -> Question {
        Question::new("colour", "Favourite colour?", QuestionKind::SingleChoice)
            .with_options(["Red", "Green"])
            .required()
    }

    #[test]
    fn choice_must_be_an_option() {
        let q = colour();
        assert!(q.validate_answer(&AnswerValue::Choice("Red".into())).is_ok());
        assert!(q.validate_answer(&AnswerValue::Choice("Blue".into())).is_err());
    }

    #[test]
    fn kind_mismatch_is_rejected() {
        let q = colour();
        let err = q.validate_answer(&AnswerValue::Text("Red".into())).unwrap_err();
        assert!(err.contains("single-choice"));
    }

    #[test]
    fn multi_choice_checks_every_option() {
        let q = Question::new("tags", "Tags", QuestionKind::MultiChoice).with_options(["A", "B"]);
        assert!(q.validate_answer(&vec!["A", "B"].into()).is_ok());
        assert!(q.validate_answer(&vec!["A", "Z"].into()).is_err());
    }

    #[test]
    fn media_kinds_take_media() {
        let q = Question::new("photo", "Photo of the site", QuestionKind::Photo);
        assert!(q.validate_answer(&MediaRef::new("s3://bucket/p.jpg").into()).is_ok());
    }

    #[test]
    fn empty_values_are_left_to_required_check() {
        let q = colour();
        assert!(q.validate_answer(&AnswerValue::Choice(String::new())).is_ok());
    }

    #[test]
    fn json_shape() {
        let q = colour().with_rule(
            RoutingRule::new(RoutingAction::EndSurvey).when(RoutingCondition::equals("colour", "Red")),
        );
        let json = serde_json::to_value(&q).unwrap();
        assert_eq!(json["type"], "single_choice");
        assert_eq!(json["required"], true);
        assert_eq!(json["routing_rules"][0]["action"], "end_survey");
        assert!(json.get("media").is_none());

        let back: Question = serde_json::from_value(json).unwrap();
        assert_eq!(back, q);
    }
}
