use serde::{Deserialize, Serialize};

/// Kind of a manageable compute resource.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    /// A single compute instance.
    Instance,
    /// An autoscaling group.
    AutoScalingGroup,
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Instance => f.write_str("instance"),
            Self::AutoScalingGroup => f.write_str("autoscaling-group"),
        }
    }
}

/// Identifies one manageable unit within a run.
///
/// A `ResourceRef` is immutable once produced by discovery. The invariant
/// that every acted-on resource was discovered in the same run is enforced
/// by construction: only the discovery service builds these, and the
/// orchestrator passes them forward unchanged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Resource kind.
    pub kind: ResourceKind,
    /// Provider-assigned identifier (instance id or group name).
    pub id: String,
    /// Region the resource lives in.
    pub region: String,
    /// Owning account id, or `"local"` when running under the caller's own
    /// identity and the account id is not known.
    pub account: String,
}

impl ResourceRef {
    /// Reference to a compute instance.
    pub fn instance(
        id: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            kind: ResourceKind::Instance,
            id: id.into(),
            region: region.into(),
            account: account.into(),
        }
    }

    /// Reference to an autoscaling group.
    pub fn group(
        id: impl Into<String>,
        region: impl Into<String>,
        account: impl Into<String>,
    ) -> Self {
        Self {
            kind: ResourceKind::AutoScalingGroup,
            id: id.into(),
            region: region.into(),
            account: account.into(),
        }
    }
}

impl std::fmt::Display for ResourceRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {} ({})", self.kind, self.id, self.region)
    }
}
