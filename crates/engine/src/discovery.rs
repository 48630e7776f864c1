use tracing::{debug, info, instrument, warn};

use lightsout_core::{RunError, SCHEDULE_TAG_KEY};
use lightsout_provider::{DiscoveredResource, DynCloudProvider, ProviderError};

use crate::retry::RetryStrategy;

/// Queries the schedule-tagged inventory for a region.
///
/// Instances and autoscaling groups are listed through the capability
/// interface; pagination happens inside the provider, so the caller always
/// receives the full materialized inventory. Transient listing failures are
/// retried; exhaustion is fatal for the run, because without an inventory
/// there is no safe action set.
#[derive(Debug, Clone)]
pub struct DiscoveryService {
    max_retries: u32,
    retry_strategy: RetryStrategy,
}

impl Default for DiscoveryService {
    fn default() -> Self {
        Self {
            max_retries: 3,
            retry_strategy: RetryStrategy::default(),
        }
    }
}

impl DiscoveryService {
    /// Discovery with default retry tuning.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the retry budget for listing calls.
    #[must_use]
    pub fn with_max_retries(mut self, max_retries: u32) -> Self {
        self.max_retries = max_retries;
        self
    }

    /// Set the backoff curve between listing retries.
    #[must_use]
    pub fn with_retry_strategy(mut self, retry_strategy: RetryStrategy) -> Self {
        self.retry_strategy = retry_strategy;
        self
    }

    /// Produce the full schedule-tagged inventory for the provider's region.
    ///
    /// Instances that belong to an autoscaling group are included
    /// individually; the coordinator cross-references them by group
    /// membership later instead of excluding them here.
    #[instrument(skip(self, provider), fields(region = %provider.region()))]
    pub async fn discover(
        &self,
        provider: &dyn DynCloudProvider,
    ) -> Result<Vec<DiscoveredResource>, RunError> {
        let mut inventory = self
            .list_with_retry(provider, Kind::Instances)
            .await?;
        let groups = self.list_with_retry(provider, Kind::Groups).await?;
        inventory.extend(groups);

        info!(count = inventory.len(), "inventory discovered");
        Ok(inventory)
    }

    async fn list_with_retry(
        &self,
        provider: &dyn DynCloudProvider,
        kind: Kind,
    ) -> Result<Vec<DiscoveredResource>, RunError> {
        let mut attempt: u32 = 0;
        loop {
            debug!(?kind, attempt, "listing tagged resources");
            let result = match kind {
                Kind::Instances => provider.list_tagged_instances(SCHEDULE_TAG_KEY).await,
                Kind::Groups => provider.list_tagged_groups(SCHEDULE_TAG_KEY).await,
            };

            let err: ProviderError = match result {
                Ok(resources) => return Ok(resources),
                Err(err) => err,
            };

            if err.is_retryable() && attempt < self.max_retries {
                let delay = self.retry_strategy.delay_for(attempt);
                warn!(
                    ?kind,
                    attempt,
                    error = %err,
                    delay_ms = %delay.as_millis(),
                    "transient discovery failure, will retry"
                );
                tokio::time::sleep(delay).await;
                attempt += 1;
            } else {
                return Err(RunError::Discovery(format!(
                    "listing {} failed after {} attempt(s): {err}",
                    kind.noun(),
                    attempt + 1
                )));
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Kind {
    Instances,
    Groups,
}

impl Kind {
    fn noun(self) -> &'static str {
        match self {
            Self::Instances => "instances",
            Self::Groups => "autoscaling groups",
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use lightsout_core::ResourceKind;

    use super::*;
    use crate::testutil::{FakeCloud, FakeState};

    fn fast() -> DiscoveryService {
        DiscoveryService::new().with_retry_strategy(RetryStrategy::Constant {
            delay: Duration::from_millis(1),
        })
    }

    #[tokio::test]
    async fn untagged_resources_never_surface() {
        let cloud = FakeCloud::new()
            .with_instance("i-tagged", Some("always_on"), None, FakeState::Running)
            .with_instance("i-untagged", None, None, FakeState::Running);

        let inventory = fast().discover(&cloud).await.unwrap();
        assert_eq!(inventory.len(), 1);
        assert_eq!(inventory[0].resource.id, "i-tagged");
    }

    #[tokio::test]
    async fn instances_in_groups_are_included_individually() {
        let cloud = FakeCloud::new()
            .with_instance("i-member", Some("always_on"), Some("web-asg"), FakeState::Running)
            .with_group("web-asg", Some("always_on"), &[]);

        let inventory = fast().discover(&cloud).await.unwrap();
        assert_eq!(inventory.len(), 2);

        let member = inventory
            .iter()
            .find(|r| r.resource.kind == ResourceKind::Instance)
            .unwrap();
        assert_eq!(member.group_name.as_deref(), Some("web-asg"));

        let group = inventory
            .iter()
            .find(|r| r.resource.kind == ResourceKind::AutoScalingGroup)
            .unwrap();
        assert_eq!(group.resource.id, "web-asg");
    }

    #[tokio::test]
    async fn transient_failures_are_retried() {
        let cloud = FakeCloud::new()
            .with_instance("i-1", Some("always_on"), None, FakeState::Running)
            .with_list_failures(2);

        let inventory = fast().discover(&cloud).await.unwrap();
        assert_eq!(inventory.len(), 1);
    }

    #[tokio::test]
    async fn exhausted_retries_are_fatal() {
        let cloud = FakeCloud::new()
            .with_instance("i-1", Some("always_on"), None, FakeState::Running)
            .with_list_failures(10);

        let err = fast()
            .with_max_retries(2)
            .discover(&cloud)
            .await
            .unwrap_err();
        assert!(matches!(err, RunError::Discovery(_)));
    }
}
