use serde::{Deserialize, Serialize};

use crate::request::ActionRequest;
use crate::resource::ResourceRef;
use crate::schedule::ScheduleAction;

/// Category of a per-resource failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionErrorKind {
    /// Transient failures exhausted the retry budget.
    Throttled,
    /// The resource cannot take the action (already in the target state,
    /// or mid-transition). Never retried.
    InvalidState,
    /// The resource no longer exists.
    NotFound,
    /// The credential scope was rejected or lapsed mid-run.
    Authorization,
    /// Any other permanent provider failure.
    Provider,
}

/// Failure detail attached to an [`ActionResult`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionFailure {
    /// Failure category.
    pub kind: ActionErrorKind,
    /// Human-readable message from the provider.
    pub message: String,
}

/// Per-resource outcome of one applied action.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionResult {
    /// The resource the action targeted.
    pub resource: ResourceRef,
    /// Whether a provider call was issued at all (false for dry runs and
    /// cancellation).
    pub attempted: bool,
    /// Whether the action took effect.
    pub succeeded: bool,
    /// Failure detail when `succeeded` is false and the call was attempted.
    #[serde(default)]
    pub error: Option<ActionFailure>,
    /// Number of retries consumed (zero when the first attempt decided).
    pub retries: u32,
}

impl ActionResult {
    /// Successful outcome.
    pub fn succeeded(resource: ResourceRef, retries: u32) -> Self {
        Self {
            resource,
            attempted: true,
            succeeded: true,
            error: None,
            retries,
        }
    }

    /// Failed outcome with detail.
    pub fn failed(resource: ResourceRef, kind: ActionErrorKind, message: String, retries: u32) -> Self {
        Self {
            resource,
            attempted: true,
            succeeded: false,
            error: Some(ActionFailure { kind, message }),
            retries,
        }
    }

    /// Outcome for a resource that was never attempted (dry run, cancelled
    /// before issue).
    pub fn skipped(resource: ResourceRef) -> Self {
        Self {
            resource,
            attempted: false,
            succeeded: false,
            error: None,
            retries: 0,
        }
    }
}

/// Non-fatal condition accumulated into the run summary.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum RunWarning {
    /// A schedule tag could not be parsed; the resource was skipped.
    Config {
        /// Identifier of the affected resource.
        resource: String,
        /// Parse failure reason.
        message: String,
    },
    /// Autoscaling suspend/resume degraded to best effort.
    Coordination {
        /// Affected group name.
        group: String,
        /// What went wrong.
        message: String,
    },
}

/// Aggregate report for one reconciliation run.
///
/// Returned to the caller for logging and alerting; partial failures are
/// reflected here, never raised as errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    /// Action the run applied.
    pub action: ScheduleAction,
    /// Region the run reconciled.
    pub region: String,
    /// Whether this was a dry run.
    pub dry_run: bool,
    /// Resources returned by discovery.
    pub discovered: usize,
    /// Resources eligible for the action.
    pub eligible: usize,
    /// Resources skipped because their tag did not authorize the action.
    pub skipped_ineligible: usize,
    /// Resources skipped because their tag was malformed.
    pub skipped_malformed: usize,
    /// Actions that took effect.
    pub succeeded: usize,
    /// Actions that failed permanently or exhausted retries.
    pub failed: usize,
    /// Per-resource outcomes, in discovery order.
    pub results: Vec<ActionResult>,
    /// Accumulated non-fatal warnings.
    pub warnings: Vec<RunWarning>,
}

impl RunSummary {
    /// Empty summary for a run of the given request.
    pub fn for_request(request: &ActionRequest) -> Self {
        Self {
            action: request.action,
            region: request.region.clone(),
            dry_run: request.dry_run,
            discovered: 0,
            eligible: 0,
            skipped_ineligible: 0,
            skipped_malformed: 0,
            succeeded: 0,
            failed: 0,
            results: Vec::new(),
            warnings: Vec::new(),
        }
    }

    /// Fold a batch of executor results into the counts.
    pub fn record_results(&mut self, results: Vec<ActionResult>) {
        for result in &results {
            if result.succeeded {
                self.succeeded += 1;
            } else if result.attempted {
                self.failed += 1;
            }
        }
        self.results.extend(results);
    }

    /// Record a non-fatal warning.
    pub fn warn(&mut self, warning: RunWarning) {
        self.warnings.push(warning);
    }
}
