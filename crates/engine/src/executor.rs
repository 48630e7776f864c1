use std::sync::Arc;

use tokio::sync::Semaphore;
use tokio_util::sync::CancellationToken;
use tracing::{debug, instrument, warn};

use lightsout_core::{ActionResult, ResourceRef, ScheduleAction};
use lightsout_provider::{DynCloudProvider, ProviderError};

use crate::config::ExecutorConfig;

/// Applies start/stop calls to a filtered resource set.
///
/// Every resource is attempted independently: one failure is captured in
/// its own [`ActionResult`] and never aborts the rest of the batch. A
/// semaphore bounds how many provider calls run at once, each attempt runs
/// under a timeout, and transient failures retry with backoff until the
/// budget runs out.
pub struct ActionExecutor {
    config: ExecutorConfig,
    semaphore: Arc<Semaphore>,
    cancel: CancellationToken,
}

impl ActionExecutor {
    /// Executor with the given tuning and no external cancellation.
    pub fn new(config: ExecutorConfig) -> Self {
        let semaphore = Arc::new(Semaphore::new(config.max_concurrent));
        Self {
            config,
            semaphore,
            cancel: CancellationToken::new(),
        }
    }

    /// Attach a cancellation token (e.g. an invocation deadline). Once
    /// cancelled, no new actions are issued; in-flight attempts complete or
    /// fail cleanly.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Executor tuning.
    pub fn config(&self) -> &ExecutorConfig {
        &self.config
    }

    /// Apply `action` to every resource, returning one result per input in
    /// the same order.
    #[instrument(skip(self, resources, provider), fields(action = %action, count = resources.len()))]
    pub async fn apply(
        &self,
        action: ScheduleAction,
        resources: &[ResourceRef],
        provider: &dyn DynCloudProvider,
    ) -> Vec<ActionResult> {
        let attempts = resources
            .iter()
            .map(|resource| self.apply_one(action, resource, provider));
        futures::future::join_all(attempts).await
    }

    async fn apply_one(
        &self,
        action: ScheduleAction,
        resource: &ResourceRef,
        provider: &dyn DynCloudProvider,
    ) -> ActionResult {
        if self.cancel.is_cancelled() {
            return ActionResult::skipped(resource.clone());
        }

        // Cancel-safe: dropping the future while waiting never acquires.
        let _permit = self
            .semaphore
            .acquire()
            .await
            .expect("semaphore is never closed");

        // The run may have been cancelled while this task queued for a
        // permit; issuing the call now would violate the deadline.
        if self.cancel.is_cancelled() {
            return ActionResult::skipped(resource.clone());
        }

        let mut attempt: u32 = 0;
        loop {
            debug!(
                resource = %resource,
                attempt,
                max_retries = self.config.max_retries,
                "issuing action"
            );

            let call = async {
                match action {
                    ScheduleAction::Start => provider.start_instance(&resource.id).await,
                    ScheduleAction::Stop => provider.stop_instance(&resource.id).await,
                }
            };

            let err = match tokio::time::timeout(self.config.attempt_timeout, call).await {
                Ok(Ok(())) => {
                    debug!(resource = %resource, attempt, "action applied");
                    return ActionResult::succeeded(resource.clone(), attempt);
                }
                Ok(Err(err)) => err,
                Err(_elapsed) => ProviderError::Timeout(self.config.attempt_timeout),
            };

            let may_retry =
                err.is_retryable() && attempt < self.config.max_retries && !self.cancel.is_cancelled();

            if may_retry {
                let delay = self.config.retry_strategy.delay_for(attempt);
                warn!(
                    resource = %resource,
                    attempt,
                    error = %err,
                    delay_ms = %delay.as_millis(),
                    "transient failure, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            } else {
                warn!(
                    resource = %resource,
                    attempt,
                    error = %err,
                    retryable = err.is_retryable(),
                    "action failed"
                );
                return ActionResult::failed(
                    resource.clone(),
                    err.result_kind(),
                    err.to_string(),
                    attempt,
                );
            }
        }
    }
}
