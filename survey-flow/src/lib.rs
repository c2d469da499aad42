//! # survey-flow
//!
//! Navigation engine for branching surveys. Given a `SurveyDefinition`, a
//! `FlowController` walks one respondent through it: collecting personal
//! information, recording answers, evaluating routing rules to decide which
//! question comes next, and tracking progress.
//!
//! ## Usage
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use survey_flow::{Answer, AnswerValue, FlowConfig, FlowController, MemoryBackend, RespondentIntake};
//!
//! let definition = Arc::new(definition);
//! let backend = Arc::new(MemoryBackend::new().with_survey(Arc::clone(&definition)));
//! let mut flow = FlowController::new(definition, backend, FlowConfig::default())?;
//!
//! flow.start_survey(RespondentIntake::new("Alice")).await?;
//! flow.submit_answer(Answer::new("q1", AnswerValue::Choice("Yes".into()))).await?;
//! let navigation = flow.advance().await?;
//! println!("{} -> {:?} ({})", navigation.from, navigation.step, navigation.progress);
//! ```
//!
//! ## Resolution
//!
//! Questions without routing rules always continue in order. For questions
//! with rules, `ResolutionMode::Remote` asks the routing service and falls
//! back to sequential order when it fails or times out, while
//! `ResolutionMode::Local` evaluates the rules in-process. Neither mode ever
//! leaves the respondent stuck: problems are reported as `Diagnostic`s.
//!
//! ## Backends
//!
//! The controller talks to anything implementing `FlowBackend`:
//! - `MemoryBackend` - in-process, with fault injection for tests
//! - `HttpBackend` - JSON over HTTP (feature `http`)

pub use survey_flow_types::*;

mod error;
pub use error::FlowError;

mod diagnostics;
pub use diagnostics::Diagnostic;

mod evaluator;
pub use evaluator::evaluate;

mod resolver;
pub use resolver::{Resolution, Route, RuleResolver, first_matching_rule};

mod progress;
pub use progress::{Progress, ProgressTracker};

mod config;
pub use config::{ConfigError, FlowConfig, ResolutionMode};

mod session;
pub use session::SurveySession;

mod controller;
pub use controller::{AnswerReceipt, FlowController, FlowState, Navigation, Step};

mod handle;
pub use handle::SessionHandle;

mod memory_backend;
pub use memory_backend::{Fault, MemoryBackend};

#[cfg(feature = "http")]
mod http;
#[cfg(feature = "http")]
pub use http::HttpBackend;
