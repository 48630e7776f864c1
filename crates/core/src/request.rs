use serde::{Deserialize, Serialize};

use crate::schedule::ScheduleAction;

/// The unit of work passed into the scheduler by the external time trigger.
///
/// Consumed by exactly one run and never mutated. Deserializable from the
/// trigger's JSON payload; every field except `action` and `region` has a
/// default so minimal payloads stay valid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionRequest {
    /// Action to apply to eligible resources.
    pub action: ScheduleAction,

    /// Region to reconcile.
    pub region: String,

    /// Opt-in (`true`, default) requires tags to explicitly authorize the
    /// action; opt-out (`false`) manages every tagged resource that has not
    /// opted out.
    #[serde(default = "default_opt_in")]
    pub opt_in: bool,

    /// Cross-account role to assume. Absent means the caller's own identity.
    #[serde(default)]
    pub role_arn: Option<String>,

    /// Session label recorded in the identity provider's audit trail.
    #[serde(default)]
    pub session_name: Option<String>,

    /// Report what would happen without issuing any mutating call.
    #[serde(default)]
    pub dry_run: bool,
}

fn default_opt_in() -> bool {
    true
}

impl ActionRequest {
    /// Request with opt-in defaults for the given action and region.
    pub fn new(action: ScheduleAction, region: impl Into<String>) -> Self {
        Self {
            action,
            region: region.into(),
            opt_in: true,
            role_arn: None,
            session_name: None,
            dry_run: false,
        }
    }

    /// Set the cross-account role to assume.
    #[must_use]
    pub fn with_role_arn(mut self, role_arn: impl Into<String>) -> Self {
        self.role_arn = Some(role_arn.into());
        self
    }

    /// Set the audit session label.
    #[must_use]
    pub fn with_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.session_name = Some(session_name.into());
        self
    }

    /// Switch between opt-in and opt-out eligibility.
    #[must_use]
    pub fn with_opt_in(mut self, opt_in: bool) -> Self {
        self.opt_in = opt_in;
        self
    }

    /// Enable dry-run mode.
    #[must_use]
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }
}
