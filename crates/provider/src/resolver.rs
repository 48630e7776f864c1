use std::sync::Arc;

use async_trait::async_trait;
use lightsout_core::{ActionRequest, RunError};

use crate::provider::DynCloudProvider;

/// Produces a scoped cloud provider for one run.
///
/// The local-identity and assumed-identity paths share this contract: the
/// orchestrator neither knows nor cares which one it got, only that every
/// call on the returned provider runs under the resolved scope. A resolver
/// must perform the credential exchange per call, since scopes are never cached
/// across runs.
#[async_trait]
pub trait ScopeResolver: Send + Sync {
    /// Resolve the request's credential scope and build a provider bound to
    /// it.
    ///
    /// Fails with [`RunError::Authorization`] when the trust relationship
    /// rejects the exchange; this is fatal for the run and never retried.
    async fn resolve(&self, request: &ActionRequest) -> Result<Arc<dyn DynCloudProvider>, RunError>;
}
