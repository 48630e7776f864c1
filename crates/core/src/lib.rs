//! Core domain types for the lightsout scheduler.
//!
//! Everything in this crate is pure data and pure functions: resource
//! references, tag sets, schedule directive parsing, and the eligibility
//! evaluator. No I/O and no cloud SDK types: those live behind the capability
//! interface in `lightsout-provider`.

pub mod eligibility;
pub mod error;
pub mod outcome;
pub mod request;
pub mod resource;
pub mod schedule;
pub mod scope;
pub mod tags;

pub use eligibility::{Eligibility, evaluate};
pub use error::RunError;
pub use outcome::{ActionErrorKind, ActionFailure, ActionResult, RunSummary, RunWarning};
pub use request::ActionRequest;
pub use resource::{ResourceKind, ResourceRef};
pub use schedule::{ScheduleAction, ScheduleDirective, TimeWindow};
pub use scope::CredentialScope;
pub use tags::{SCHEDULE_TAG_KEY, SUSPENSION_MARKER_TAG_KEY, TagSet};
