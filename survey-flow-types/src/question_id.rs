use std::borrow::Borrow;
use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a question, unique within one survey, e.g. `"site_condition"`.
///
/// Used as the key in `Answers` and as the target of routing rules.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuestionId {
    id: String,
}

impl QuestionId {
    /// Create a new identifier.
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }

    /// Get the identifier as a string slice.
    pub fn as_str(&self) -> &str {
        &self.id
    }

    /// Check if the identifier is empty (or whitespace only).
    pub fn is_blank(&self) -> bool {
        self.id.trim().is_empty()
    }
}

impl fmt::Display for QuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl Borrow<str> for QuestionId {
    fn borrow(&self) -> &str {
        &self.id
    }
}

impl AsRef<str> for QuestionId {
    fn as_ref(&self) -> &str {
        &self.id
    }
}

impl From<&str> for QuestionId {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for QuestionId {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

impl From<&String> for QuestionId {
    fn from(s: &String) -> Self {
        Self::new(s.clone())
    }
}

impl From<&QuestionId> for QuestionId {
    fn from(id: &QuestionId) -> Self {
        id.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new() {
        let id = QuestionId::new("q1");
        assert_eq!(id.as_str(), "q1");
    }

    #[test]
    fn blank() {
        assert!(QuestionId::new("   ").is_blank());
        assert!(!QuestionId::new("q1").is_blank());
    }

    #[test]
    fn display() {
        let id = QuestionId::new("site_condition");
        assert_eq!(format!("{}", id), "site_condition");
    }

    #[test]
    fn serializes_as_plain_string() {
        let id = QuestionId::new("q4");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"q4\"");
        let back: QuestionId = serde_json::from_str("\"q4\"").unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn lookup_by_str() {
        let mut map = std::collections::HashMap::new();
        map.insert(QuestionId::new("q1"), 1);
        assert_eq!(map.get("q1"), Some(&1));
    }
}
