use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Error type for personal-info intake validation.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum IntakeError {
    #[error("A respondent name is required")]
    MissingName,

    #[error("'{0}' is not a valid email address")]
    InvalidEmail(String),
}

/// Personal information collected before the first question.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RespondentIntake {
    pub name: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    /// Any further fields the intake form collects.
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
}

impl RespondentIntake {
    /// Create an intake with just a name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_phone(mut self, phone: impl Into<String>) -> Self {
        self.phone = Some(phone.into());
        self
    }

    pub fn with_attribute(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.attributes.insert(key.into(), value.into());
        self
    }

    /// Checks the intake is complete enough to start a submission.
    pub fn validate(&self) -> Result<(), IntakeError> {
        if self.name.trim().is_empty() {
            return Err(IntakeError::MissingName);
        }
        if let Some(email) = &self.email
            && !is_plausible_email(email)
        {
            return Err(IntakeError::InvalidEmail(email.clone()));
        }
        Ok(())
    }
}

fn is_plausible_email(email: &str) -> bool {
    match email.trim().split_once('@') {
        Some((local, domain)) => !local.is_empty() && domain.contains('.') && !domain.starts_with('.'),
        None => false,
    }
}
