use serde::{Deserialize, Serialize};

/// Reference to an uploaded photo or video.
///
/// Uploading is handled elsewhere; the answer only carries where the media lives.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaRef {
    /// Location of the uploaded file.
    pub uri: String,

    /// MIME type, when known (e.g. `image/jpeg`).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_type: Option<String>,
}

impl MediaRef {
    /// Create a media reference without a content type.
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            content_type: None,
        }
    }

    /// Set the content type.
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }
}

/// A single answer value collected from a respondent.
///
/// This is the value stored in `Answers` for each answered question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum AnswerValue {
    /// Free text.
    Text(String),

    /// The chosen option of a single-choice question.
    Choice(String),

    /// The chosen options of a multi-choice question, in selection order.
    Choices(Vec<String>),

    /// An uploaded photo or video.
    Media(MediaRef),
}

impl AnswerValue {
    /// Try to get this value as free text.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as a single chosen option.
    pub fn as_choice(&self) -> Option<&str> {
        match self {
            Self::Choice(s) => Some(s),
            _ => None,
        }
    }

    /// Try to get this value as chosen options.
    pub fn as_choices(&self) -> Option<&[String]> {
        match self {
            Self::Choices(items) => Some(items),
            _ => None,
        }
    }

    /// Try to get this value as a media reference.
    pub fn as_media(&self) -> Option<&MediaRef> {
        match self {
            Self::Media(media) => Some(media),
            _ => None,
        }
    }

    /// Whether the value carries nothing a respondent actually entered.
    ///
    /// Whitespace-only text counts as empty.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Text(s) => s.trim().is_empty(),
            Self::Choice(s) => s.is_empty(),
            Self::Choices(items) => items.is_empty(),
            Self::Media(media) => media.uri.trim().is_empty(),
        }
    }

    /// The value flattened to a single string.
    ///
    /// Chosen options are joined with `,`; media is represented by its URI.
    pub fn text_form(&self) -> String {
        match self {
            Self::Text(s) | Self::Choice(s) => s.clone(),
            Self::Choices(items) => items.join(","),
            Self::Media(media) => media.uri.clone(),
        }
    }

    /// The value viewed as a collection of strings.
    ///
    /// Scalars are a one-element collection. Media has no collection view.
    pub fn items(&self) -> Option<Vec<&str>> {
        match self {
            Self::Text(s) | Self::Choice(s) => Some(vec![s.as_str()]),
            Self::Choices(items) => Some(items.iter().map(String::as_str).collect()),
            Self::Media(_) => None,
        }
    }

    /// Get the type name of this value for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Text(_) => "Text",
            Self::Choice(_) => "Choice",
            Self::Choices(_) => "Choices",
            Self::Media(_) => "Media",
        }
    }
}

impl From<String> for AnswerValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for AnswerValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<Vec<String>> for AnswerValue {
    fn from(items: Vec<String>) -> Self {
        Self::Choices(items)
    }
}

impl From<Vec<&str>> for AnswerValue {
    fn from(items: Vec<&str>) -> Self {
        Self::Choices(items.into_iter().map(str::to_string).collect())
    }
}

impl From<MediaRef> for AnswerValue {
    fn from(media: MediaRef) -> Self {
        Self::Media(media)
    }
}
