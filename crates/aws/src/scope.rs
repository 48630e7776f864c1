use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use aws_config::retry::RetryConfig;
use aws_config::timeout::TimeoutConfig;
use chrono::{DateTime, Utc};
use tracing::{debug, info};

use lightsout_core::{ActionRequest, CredentialScope, RunError};
use lightsout_provider::{DynCloudProvider, ScopeResolver};

use crate::cloud::AwsCloud;
use crate::config::AwsResolverConfig;

/// Session name used when neither the request nor the config carries one.
const DEFAULT_SESSION_NAME: &str = "lightsout-scheduler";

/// Upper bound on any single SDK operation. The engine layers its own
/// retry-with-backoff on top, so SDK-internal retries are disabled.
const OPERATION_TIMEOUT: Duration = Duration::from_secs(30);

fn call_settings() -> (TimeoutConfig, RetryConfig) {
    let timeouts = TimeoutConfig::builder()
        .operation_timeout(OPERATION_TIMEOUT)
        .build();
    (timeouts, RetryConfig::disabled())
}

/// Resolves a run's credential scope against AWS.
///
/// Without a role ARN on the request, the standard SDK credential chain is
/// used as-is. With one, an explicit STS `AssumeRole` exchange is performed
/// and the returned session credentials (bounded, never auto-refreshed)
/// back the run's clients, so the scope's expiry is inspectable and a
/// lapsed session fails fast instead of silently renewing.
#[derive(Debug, Default)]
pub struct AwsScopeResolver {
    config: AwsResolverConfig,
}

impl AwsScopeResolver {
    /// Resolver with default config.
    pub fn new() -> Self {
        Self::default()
    }

    /// Resolver with deployment-level overrides.
    pub fn with_config(config: AwsResolverConfig) -> Self {
        Self { config }
    }

    async fn load_base_config(&self, region: &str) -> aws_config::SdkConfig {
        let (timeouts, retries) = call_settings();
        let mut loader = aws_config::from_env()
            .region(aws_config::Region::new(region.to_owned()))
            .timeout_config(timeouts)
            .retry_config(retries);
        if let Some(endpoint) = &self.config.endpoint_url {
            debug!(endpoint = %endpoint, "using custom AWS endpoint");
            loader = loader.endpoint_url(endpoint);
        }
        loader.load().await
    }

    async fn assume_role(
        &self,
        base: &aws_config::SdkConfig,
        request: &ActionRequest,
        role_arn: &str,
    ) -> Result<(CredentialScope, aws_config::SdkConfig), RunError> {
        let session_name = request
            .session_name
            .as_deref()
            .or(self.config.default_session_name.as_deref())
            .unwrap_or(DEFAULT_SESSION_NAME);

        info!(session_name = %session_name, "assuming IAM role via STS");

        let sts = aws_sdk_sts::Client::new(base);
        let mut call = sts
            .assume_role()
            .role_arn(role_arn)
            .role_session_name(session_name);
        if let Some(external_id) = &self.config.external_id {
            call = call.external_id(external_id);
        }

        // Trust-relationship rejections are not transient; any failure here
        // is fatal for the run.
        let response = call
            .send()
            .await
            .map_err(|e| RunError::Authorization(e.to_string()))?;

        let credentials = response.credentials().ok_or_else(|| {
            RunError::Authorization("assume-role response carried no credentials".to_owned())
        })?;

        let expiration = credentials.expiration();
        let expires_at: DateTime<Utc> =
            DateTime::from_timestamp(expiration.secs(), expiration.subsec_nanos())
                .ok_or_else(|| {
                    RunError::Authorization("assume-role expiry out of range".to_owned())
                })?;

        let account = account_from_role_arn(role_arn)
            .unwrap_or("unknown")
            .to_owned();

        let scope = CredentialScope::Assumed {
            account,
            role_arn: role_arn.to_owned(),
            session_name: session_name.to_owned(),
            expires_at,
        };

        // Static session credentials, deliberately: the session must not
        // auto-refresh past the validity window the run was granted.
        let session_credentials = aws_credential_types::Credentials::new(
            credentials.access_key_id(),
            credentials.secret_access_key(),
            Some(credentials.session_token().to_owned()),
            std::time::SystemTime::try_from(*expiration).ok(),
            "lightsout-assume-role",
        );

        let (timeouts, retries) = call_settings();
        let mut loader = aws_config::from_env()
            .region(aws_config::Region::new(request.region.clone()))
            .credentials_provider(session_credentials)
            .timeout_config(timeouts)
            .retry_config(retries);
        if let Some(endpoint) = &self.config.endpoint_url {
            loader = loader.endpoint_url(endpoint);
        }

        info!(expires_at = %expires_at, "assumed-role session established");
        Ok((scope, loader.load().await))
    }
}

#[async_trait]
impl ScopeResolver for AwsScopeResolver {
    async fn resolve(
        &self,
        request: &ActionRequest,
    ) -> Result<Arc<dyn DynCloudProvider>, RunError> {
        let base = self.load_base_config(&request.region).await;

        let (scope, sdk_config) = match &request.role_arn {
            None => (CredentialScope::local(), base),
            Some(role_arn) => self.assume_role(&base, request, role_arn).await?,
        };

        Ok(Arc::new(AwsCloud::new(
            scope,
            &sdk_config,
            request.region.clone(),
        )))
    }
}

/// Account id embedded in an IAM role ARN
/// (`arn:aws:iam::123456789012:role/name`).
fn account_from_role_arn(arn: &str) -> Option<&str> {
    let account = arn.split(':').nth(4)?;
    if account.is_empty() { None } else { Some(account) }
}
