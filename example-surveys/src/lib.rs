//! Ready-made survey definitions for demos, the CLI and tests.

pub mod branching;
pub mod site_inspection;

pub use branching::{early_exit, skip_ahead};
pub use site_inspection::site_inspection;

use survey_flow::SurveyDefinition;

/// Names accepted by [`by_name`].
pub const NAMES: &[&str] = &["early-exit", "skip-ahead", "site-inspection"];

/// Look up a bundled survey by name.
pub fn by_name(name: &str) -> Option<SurveyDefinition> {
    match name {
        "early-exit" => Some(early_exit()),
        "skip-ahead" => Some(skip_ahead()),
        "site-inspection" => Some(site_inspection()),
        _ => None,
    }
}

/// Every bundled survey, with its name.
pub fn all() -> Vec<(&'static str, SurveyDefinition)> {
    NAMES
        .iter()
        .filter_map(|name| by_name(name).map(|survey| (*name, survey)))
        .collect()
}
