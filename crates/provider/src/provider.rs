use std::collections::BTreeSet;

use async_trait::async_trait;
use lightsout_core::{CredentialScope, ResourceRef, TagSet};
use serde::{Deserialize, Serialize};

use crate::error::ProviderError;

/// A resource returned by tag-filtered discovery, with the tags it carried
/// at that moment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscoveredResource {
    /// The resource itself.
    pub resource: ResourceRef,
    /// Tags attached at discovery time; read-only within the run.
    pub tags: TagSet,
    /// Name of the autoscaling group the resource belongs to, when it is an
    /// instance managed by one.
    #[serde(default)]
    pub group_name: Option<String>,
}

/// Point-in-time detail of one autoscaling group, fetched by the
/// coordinator outside of discovery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupDetail {
    /// Group name.
    pub name: String,
    /// Scaling processes currently suspended on the group.
    pub suspended_processes: BTreeSet<String>,
    /// Tags attached to the group.
    pub tags: TagSet,
}

/// Strongly-typed cloud capability interface with native `async fn`.
///
/// This trait is **not** object-safe because its methods desugar to opaque
/// `impl Future` return types. For dynamic dispatch use
/// [`DynCloudProvider`]; every `CloudProvider` implements it via a blanket
/// implementation.
pub trait CloudProvider: Send + Sync {
    /// Unique name of this provider, for logs.
    fn name(&self) -> &str;

    /// Credential scope every call on this provider runs under.
    fn scope(&self) -> &CredentialScope;

    /// Region this provider targets.
    fn region(&self) -> &str;

    /// All compute instances in the region carrying the given tag key.
    /// Pagination is transparent: the returned list is fully materialized.
    fn list_tagged_instances(
        &self,
        tag_key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DiscoveredResource>, ProviderError>> + Send;

    /// All autoscaling groups in the region carrying the given tag key.
    fn list_tagged_groups(
        &self,
        tag_key: &str,
    ) -> impl std::future::Future<Output = Result<Vec<DiscoveredResource>, ProviderError>> + Send;

    /// Start one instance.
    fn start_instance(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Stop one instance.
    fn stop_instance(
        &self,
        id: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Current suspension posture and tags of one group.
    fn describe_group(
        &self,
        name: &str,
    ) -> impl std::future::Future<Output = Result<GroupDetail, ProviderError>> + Send;

    /// Suspend the named scaling processes on a group.
    fn suspend_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Resume the named scaling processes on a group.
    fn resume_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Set a tag on a group.
    fn tag_group(
        &self,
        group: &str,
        key: &str,
        value: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;

    /// Remove a tag from a group.
    fn untag_group(
        &self,
        group: &str,
        key: &str,
    ) -> impl std::future::Future<Output = Result<(), ProviderError>> + Send;
}

/// Object-safe capability interface for use behind `Arc<dyn DynCloudProvider>`.
///
/// Uses [`macro@async_trait`] to enable dynamic dispatch of async methods.
/// Implement [`CloudProvider`] instead and rely on the blanket
/// implementation.
#[async_trait]
pub trait DynCloudProvider: Send + Sync {
    /// Unique name of this provider, for logs.
    fn name(&self) -> &str;

    /// Credential scope every call on this provider runs under.
    fn scope(&self) -> &CredentialScope;

    /// Region this provider targets.
    fn region(&self) -> &str;

    /// All compute instances in the region carrying the given tag key.
    async fn list_tagged_instances(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError>;

    /// All autoscaling groups in the region carrying the given tag key.
    async fn list_tagged_groups(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError>;

    /// Start one instance.
    async fn start_instance(&self, id: &str) -> Result<(), ProviderError>;

    /// Stop one instance.
    async fn stop_instance(&self, id: &str) -> Result<(), ProviderError>;

    /// Current suspension posture and tags of one group.
    async fn describe_group(&self, name: &str) -> Result<GroupDetail, ProviderError>;

    /// Suspend the named scaling processes on a group.
    async fn suspend_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError>;

    /// Resume the named scaling processes on a group.
    async fn resume_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError>;

    /// Set a tag on a group.
    async fn tag_group(&self, group: &str, key: &str, value: &str) -> Result<(), ProviderError>;

    /// Remove a tag from a group.
    async fn untag_group(&self, group: &str, key: &str) -> Result<(), ProviderError>;
}

/// Blanket implementation bridging the static and dynamic dispatch worlds.
#[async_trait]
impl<T: CloudProvider + Sync> DynCloudProvider for T {
    fn name(&self) -> &str {
        CloudProvider::name(self)
    }

    fn scope(&self) -> &CredentialScope {
        CloudProvider::scope(self)
    }

    fn region(&self) -> &str {
        CloudProvider::region(self)
    }

    async fn list_tagged_instances(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError> {
        CloudProvider::list_tagged_instances(self, tag_key).await
    }

    async fn list_tagged_groups(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError> {
        CloudProvider::list_tagged_groups(self, tag_key).await
    }

    async fn start_instance(&self, id: &str) -> Result<(), ProviderError> {
        CloudProvider::start_instance(self, id).await
    }

    async fn stop_instance(&self, id: &str) -> Result<(), ProviderError> {
        CloudProvider::stop_instance(self, id).await
    }

    async fn describe_group(&self, name: &str) -> Result<GroupDetail, ProviderError> {
        CloudProvider::describe_group(self, name).await
    }

    async fn suspend_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError> {
        CloudProvider::suspend_processes(self, group, processes).await
    }

    async fn resume_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError> {
        CloudProvider::resume_processes(self, group, processes).await
    }

    async fn tag_group(&self, group: &str, key: &str, value: &str) -> Result<(), ProviderError> {
        CloudProvider::tag_group(self, group, key, value).await
    }

    async fn untag_group(&self, group: &str, key: &str) -> Result<(), ProviderError> {
        CloudProvider::untag_group(self, group, key).await
    }
}
