use std::collections::BTreeSet;

use chrono::Utc;
use tracing::{debug, error, info, instrument};

use lightsout_core::{CredentialScope, ResourceRef, TagSet};
use lightsout_provider::{CloudProvider, DiscoveredResource, GroupDetail, ProviderError};

use crate::error::classify_sdk_error;

/// Tag key AWS attaches to instances that belong to an autoscaling group.
const ASG_MEMBERSHIP_TAG: &str = "aws:autoscaling:groupName";

/// Resource type string the Auto Scaling tagging API expects.
const ASG_RESOURCE_TYPE: &str = "auto-scaling-group";

/// AWS-backed cloud provider over EC2 and Auto Scaling.
///
/// Every call is guarded against the credential scope's validity window:
/// once an assumed session lapses mid-run, further calls fail fast with an
/// authorization error instead of retrying against dead credentials.
pub struct AwsCloud {
    scope: CredentialScope,
    region: String,
    ec2: aws_sdk_ec2::Client,
    autoscaling: aws_sdk_autoscaling::Client,
}

impl std::fmt::Debug for AwsCloud {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AwsCloud")
            .field("scope", &self.scope)
            .field("region", &self.region)
            .field("ec2", &"<Ec2Client>")
            .field("autoscaling", &"<AutoScalingClient>")
            .finish()
    }
}

impl AwsCloud {
    /// Build a provider from a resolved scope and SDK configuration.
    pub fn new(
        scope: CredentialScope,
        sdk_config: &aws_config::SdkConfig,
        region: impl Into<String>,
    ) -> Self {
        Self {
            scope,
            region: region.into(),
            ec2: aws_sdk_ec2::Client::new(sdk_config),
            autoscaling: aws_sdk_autoscaling::Client::new(sdk_config),
        }
    }

    /// Fail fast when the scope's validity window has lapsed.
    fn guard_scope(&self) -> Result<(), ProviderError> {
        if self.scope.is_expired(Utc::now()) {
            error!("credential scope expired mid-run");
            return Err(ProviderError::Authorization(
                "credential scope expired mid-run".to_owned(),
            ));
        }
        Ok(())
    }

    fn instance_tags(instance: &aws_sdk_ec2::types::Instance) -> TagSet {
        instance
            .tags()
            .iter()
            .filter_map(|t| Some((t.key()?, t.value()?)))
            .collect()
    }

    fn group_tags(group: &aws_sdk_autoscaling::types::AutoScalingGroup) -> TagSet {
        group
            .tags()
            .iter()
            .filter_map(|t| Some((t.key()?, t.value()?)))
            .collect()
    }
}

impl CloudProvider for AwsCloud {
    #[allow(clippy::unnecessary_literal_bound)]
    fn name(&self) -> &str {
        "aws"
    }

    fn scope(&self) -> &CredentialScope {
        &self.scope
    }

    fn region(&self) -> &str {
        &self.region
    }

    #[instrument(skip(self), fields(provider = "aws", region = %self.region))]
    async fn list_tagged_instances(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError> {
        self.guard_scope()?;
        debug!(tag_key, "listing tagged EC2 instances");

        let filter = aws_sdk_ec2::types::Filter::builder()
            .name("tag-key")
            .values(tag_key)
            .build();

        let mut resources = Vec::new();
        let mut pages = self
            .ec2
            .describe_instances()
            .filters(filter)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                let err_str = e.to_string();
                error!(error = %err_str, "describe_instances failed");
                classify_sdk_error(&err_str)
            })?;

            for reservation in page.reservations() {
                for instance in reservation.instances() {
                    let Some(id) = instance.instance_id() else {
                        continue;
                    };
                    let tags = Self::instance_tags(instance);
                    let group_name = tags.get(ASG_MEMBERSHIP_TAG).map(ToOwned::to_owned);
                    resources.push(DiscoveredResource {
                        resource: ResourceRef::instance(id, &self.region, self.scope.account()),
                        tags,
                        group_name,
                    });
                }
            }
        }

        info!(count = resources.len(), "tagged EC2 instances listed");
        Ok(resources)
    }

    #[instrument(skip(self), fields(provider = "aws", region = %self.region))]
    async fn list_tagged_groups(
        &self,
        tag_key: &str,
    ) -> Result<Vec<DiscoveredResource>, ProviderError> {
        self.guard_scope()?;
        debug!(tag_key, "listing tagged Auto Scaling groups");

        let filter = aws_sdk_autoscaling::types::Filter::builder()
            .name("tag-key")
            .values(tag_key)
            .build();

        let mut resources = Vec::new();
        let mut pages = self
            .autoscaling
            .describe_auto_scaling_groups()
            .filters(filter)
            .into_paginator()
            .send();

        while let Some(page) = pages.next().await {
            let page = page.map_err(|e| {
                let err_str = e.to_string();
                error!(error = %err_str, "describe_auto_scaling_groups failed");
                classify_sdk_error(&err_str)
            })?;

            for group in page.auto_scaling_groups() {
                let Some(name) = group.auto_scaling_group_name() else {
                    continue;
                };
                resources.push(DiscoveredResource {
                    resource: ResourceRef::group(name, &self.region, self.scope.account()),
                    tags: Self::group_tags(group),
                    group_name: None,
                });
            }
        }

        info!(count = resources.len(), "tagged Auto Scaling groups listed");
        Ok(resources)
    }

    #[instrument(skip(self), fields(provider = "aws", region = %self.region))]
    async fn start_instance(&self, id: &str) -> Result<(), ProviderError> {
        self.guard_scope()?;
        debug!(instance_id = %id, "starting EC2 instance");

        let result = self
            .ec2
            .start_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(instance_id = %id, error = %err_str, "start_instances failed");
                classify_sdk_error(&err_str)
            })?;

        // A start against an already-running instance is a silent no-op on
        // the wire; surface it as an invalid transition instead.
        if let Some(change) = result.starting_instances().first() {
            let previous = change.previous_state().and_then(|s| s.name());
            if matches!(previous, Some(aws_sdk_ec2::types::InstanceStateName::Running)) {
                return Err(ProviderError::InvalidState(format!(
                    "instance {id} is already running"
                )));
            }
        }

        info!(instance_id = %id, "EC2 instance starting");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws", region = %self.region))]
    async fn stop_instance(&self, id: &str) -> Result<(), ProviderError> {
        self.guard_scope()?;
        debug!(instance_id = %id, "stopping EC2 instance");

        let result = self
            .ec2
            .stop_instances()
            .instance_ids(id)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(instance_id = %id, error = %err_str, "stop_instances failed");
                classify_sdk_error(&err_str)
            })?;

        if let Some(change) = result.stopping_instances().first() {
            let previous = change.previous_state().and_then(|s| s.name());
            if matches!(previous, Some(aws_sdk_ec2::types::InstanceStateName::Stopped)) {
                return Err(ProviderError::InvalidState(format!(
                    "instance {id} is already stopped"
                )));
            }
        }

        info!(instance_id = %id, "EC2 instance stopping");
        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws", region = %self.region))]
    async fn describe_group(&self, name: &str) -> Result<GroupDetail, ProviderError> {
        self.guard_scope()?;
        debug!(group = %name, "describing Auto Scaling group");

        let result = self
            .autoscaling
            .describe_auto_scaling_groups()
            .auto_scaling_group_names(name)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(group = %name, error = %err_str, "describe_auto_scaling_groups failed");
                classify_sdk_error(&err_str)
            })?;

        let Some(group) = result.auto_scaling_groups().first() else {
            return Err(ProviderError::NotFound(format!(
                "auto scaling group '{name}' does not exist"
            )));
        };

        let suspended_processes: BTreeSet<String> = group
            .suspended_processes()
            .iter()
            .filter_map(|p| p.process_name().map(ToOwned::to_owned))
            .collect();

        Ok(GroupDetail {
            name: name.to_owned(),
            suspended_processes,
            tags: Self::group_tags(group),
        })
    }

    #[instrument(skip(self, processes), fields(provider = "aws", region = %self.region))]
    async fn suspend_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError> {
        self.guard_scope()?;
        debug!(group = %group, ?processes, "suspending scaling processes");

        self.autoscaling
            .suspend_processes()
            .auto_scaling_group_name(group)
            .set_scaling_processes(Some(processes.to_vec()))
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(group = %group, error = %err_str, "suspend_processes failed");
                classify_sdk_error(&err_str)
            })?;

        info!(group = %group, count = processes.len(), "scaling processes suspended");
        Ok(())
    }

    #[instrument(skip(self, processes), fields(provider = "aws", region = %self.region))]
    async fn resume_processes(
        &self,
        group: &str,
        processes: &[String],
    ) -> Result<(), ProviderError> {
        self.guard_scope()?;
        debug!(group = %group, ?processes, "resuming scaling processes");

        self.autoscaling
            .resume_processes()
            .auto_scaling_group_name(group)
            .set_scaling_processes(Some(processes.to_vec()))
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(group = %group, error = %err_str, "resume_processes failed");
                classify_sdk_error(&err_str)
            })?;

        info!(group = %group, count = processes.len(), "scaling processes resumed");
        Ok(())
    }

    #[instrument(skip(self, value), fields(provider = "aws", region = %self.region))]
    async fn tag_group(&self, group: &str, key: &str, value: &str) -> Result<(), ProviderError> {
        self.guard_scope()?;
        debug!(group = %group, key, "tagging Auto Scaling group");

        let tag = aws_sdk_autoscaling::types::Tag::builder()
            .resource_id(group)
            .resource_type(ASG_RESOURCE_TYPE)
            .key(key)
            .value(value)
            .propagate_at_launch(false)
            .build()
            .map_err(|e| ProviderError::Service(e.to_string()))?;

        self.autoscaling
            .create_or_update_tags()
            .tags(tag)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(group = %group, error = %err_str, "create_or_update_tags failed");
                classify_sdk_error(&err_str)
            })?;

        Ok(())
    }

    #[instrument(skip(self), fields(provider = "aws", region = %self.region))]
    async fn untag_group(&self, group: &str, key: &str) -> Result<(), ProviderError> {
        self.guard_scope()?;
        debug!(group = %group, key, "untagging Auto Scaling group");

        let tag = aws_sdk_autoscaling::types::Tag::builder()
            .resource_id(group)
            .resource_type(ASG_RESOURCE_TYPE)
            .key(key)
            .build()
            .map_err(|e| ProviderError::Service(e.to_string()))?;

        self.autoscaling
            .delete_tags()
            .tags(tag)
            .send()
            .await
            .map_err(|e| {
                let err_str = e.to_string();
                error!(group = %group, error = %err_str, "delete_tags failed");
                classify_sdk_error(&err_str)
            })?;

        Ok(())
    }
}
