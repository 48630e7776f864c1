use serde::{Deserialize, Serialize};

/// Deployment-level settings for the AWS scope resolver.
///
/// Per-run inputs (region, role ARN, session label) arrive on the
/// `ActionRequest`; this config carries what is fixed per deployment: the
/// endpoint override for local development (`LocalStack`), the external id
/// for cross-account trust policies, and the fallback audit session name.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct AwsResolverConfig {
    /// Endpoint URL override for local development.
    #[serde(default)]
    pub endpoint_url: Option<String>,

    /// External ID required by some cross-account trust policies.
    #[serde(default)]
    pub external_id: Option<String>,

    /// Session name used when the request does not carry one.
    #[serde(default)]
    pub default_session_name: Option<String>,
}

impl std::fmt::Debug for AwsResolverConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsResolverConfig")
            .field("endpoint_url", &self.endpoint_url)
            .field("external_id", &self.external_id.as_ref().map(|_| "[REDACTED]"))
            .field("default_session_name", &self.default_session_name)
            .finish()
    }
}

impl AwsResolverConfig {
    /// Config with no overrides.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the endpoint URL override.
    #[must_use]
    pub fn with_endpoint_url(mut self, endpoint_url: impl Into<String>) -> Self {
        self.endpoint_url = Some(endpoint_url.into());
        self
    }

    /// Set the external ID for cross-account trust policies.
    #[must_use]
    pub fn with_external_id(mut self, external_id: impl Into<String>) -> Self {
        self.external_id = Some(external_id.into());
        self
    }

    /// Set the fallback audit session name.
    #[must_use]
    pub fn with_default_session_name(mut self, session_name: impl Into<String>) -> Self {
        self.default_session_name = Some(session_name.into());
        self
    }
}
