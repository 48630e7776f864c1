use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Credential scope a run operates under.
///
/// Either the caller's own identity or a temporarily assumed identity in a
/// target account. A scope is resolved at the start of a run, shared
/// read-only by everything in that run, and never cached across runs: an
/// assumed session has a bounded validity window and the provider must fail
/// fast once it lapses.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CredentialScope {
    /// The caller's native identity.
    Local {
        /// Owning account id when known.
        account: Option<String>,
    },
    /// A temporarily assumed identity in a target account.
    Assumed {
        /// Target account id.
        account: String,
        /// Role that was assumed.
        role_arn: String,
        /// Session label used for audit trails.
        session_name: String,
        /// End of the session's validity window.
        expires_at: DateTime<Utc>,
    },
}

impl CredentialScope {
    /// Local scope with an unknown account id.
    pub fn local() -> Self {
        Self::Local { account: None }
    }

    /// Owning account id, or `"local"` when not known.
    pub fn account(&self) -> &str {
        match self {
            Self::Local { account } => account.as_deref().unwrap_or("local"),
            Self::Assumed { account, .. } => account,
        }
    }

    /// Whether the scope's validity window has lapsed at `now`.
    ///
    /// Local scopes never expire; assumed sessions expire at the instant
    /// the identity provider granted.
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        match self {
            Self::Local { .. } => false,
            Self::Assumed { expires_at, .. } => now >= *expires_at,
        }
    }
}

impl std::fmt::Debug for CredentialScope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Local { account } => f.debug_struct("Local").field("account", account).finish(),
            Self::Assumed {
                account,
                session_name,
                expires_at,
                ..
            } => f
                .debug_struct("Assumed")
                .field("account", account)
                .field("role_arn", &"[REDACTED]")
                .field("session_name", session_name)
                .field("expires_at", expires_at)
                .finish(),
        }
    }
}
