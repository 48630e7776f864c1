use std::collections::BTreeSet;

use chrono::Utc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, instrument};

use lightsout_core::{
    ActionRequest, ActionResult, Eligibility, ResourceKind, ResourceRef, RunError, RunSummary,
    RunWarning, ScheduleAction, evaluate,
};
use lightsout_provider::ScopeResolver;

use crate::config::ExecutorConfig;
use crate::coordinator::AutoscalingCoordinator;
use crate::discovery::DiscoveryService;
use crate::executor::ActionExecutor;

/// Entry point for one reconciliation run.
///
/// Sequences the pipeline (resolve credentials, discover, evaluate
/// eligibility, coordinate autoscaling, execute, summarize) for a single
/// region and optional cross-account scope. Only credential resolution and
/// discovery can fail the run, and both happen before any mutating call, so
/// a run either fully attempts its filtered action set or mutates nothing.
pub struct Orchestrator<R> {
    resolver: R,
    discovery: DiscoveryService,
    executor_config: ExecutorConfig,
    cancel: CancellationToken,
}

impl<R: ScopeResolver> Orchestrator<R> {
    /// Orchestrator with default tuning.
    pub fn new(resolver: R) -> Self {
        Self {
            resolver,
            discovery: DiscoveryService::new(),
            executor_config: ExecutorConfig::default(),
            cancel: CancellationToken::new(),
        }
    }

    /// Replace the discovery tuning.
    #[must_use]
    pub fn with_discovery(mut self, discovery: DiscoveryService) -> Self {
        self.discovery = discovery;
        self
    }

    /// Replace the executor tuning.
    #[must_use]
    pub fn with_executor_config(mut self, executor_config: ExecutorConfig) -> Self {
        self.executor_config = executor_config;
        self
    }

    /// Attach a cancellation token for the whole run.
    #[must_use]
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Execute one run for the given request.
    #[instrument(
        skip(self, request),
        fields(action = %request.action, region = %request.region, dry_run = request.dry_run)
    )]
    pub async fn run(&self, request: &ActionRequest) -> Result<RunSummary, RunError> {
        let provider = self.resolver.resolve(request).await?;
        let inventory = self.discovery.discover(provider.as_ref()).await?;

        let mut summary = RunSummary::for_request(request);
        summary.discovered = inventory.len();

        let now = Utc::now();
        let mut eligible_instances: Vec<ResourceRef> = Vec::new();
        let mut affected_groups: BTreeSet<String> = BTreeSet::new();

        for item in &inventory {
            match evaluate(&item.tags, request.action, request.opt_in, now) {
                Eligibility::Eligible => {
                    summary.eligible += 1;
                    match item.resource.kind {
                        ResourceKind::Instance => {
                            if let Some(group) = &item.group_name {
                                affected_groups.insert(group.clone());
                            }
                            eligible_instances.push(item.resource.clone());
                        }
                        ResourceKind::AutoScalingGroup => {
                            affected_groups.insert(item.resource.id.clone());
                        }
                    }
                }
                Eligibility::Ineligible(reason) => {
                    debug!(resource = %item.resource, reason = %reason, "resource not eligible");
                    summary.skipped_ineligible += 1;
                }
                Eligibility::MalformedTag(reason) => {
                    summary.skipped_malformed += 1;
                    summary.warn(RunWarning::Config {
                        resource: item.resource.id.clone(),
                        message: reason,
                    });
                }
            }
        }

        info!(
            discovered = summary.discovered,
            eligible = summary.eligible,
            groups = affected_groups.len(),
            "eligibility evaluated"
        );

        if request.dry_run {
            info!(
                would_affect = eligible_instances.len(),
                "dry run, no actions issued"
            );
            summary.record_results(
                eligible_instances
                    .into_iter()
                    .map(ActionResult::skipped)
                    .collect(),
            );
            return Ok(summary);
        }

        let executor =
            ActionExecutor::new(self.executor_config.clone()).with_cancellation(self.cancel.clone());
        let coordinator = AutoscalingCoordinator::new();
        let groups: Vec<String> = affected_groups.into_iter().collect();

        match request.action {
            // Suspension must complete (or be attempted) before member
            // stops are issued.
            ScheduleAction::Stop => {
                let report = coordinator
                    .suspend_for_stop(provider.as_ref(), &groups)
                    .await;
                for warning in report.warnings {
                    summary.warn(warning);
                }

                let results = executor
                    .apply(ScheduleAction::Stop, &eligible_instances, provider.as_ref())
                    .await;
                summary.record_results(results);
            }
            // Resumption is issued only after member starts complete.
            ScheduleAction::Start => {
                let results = executor
                    .apply(ScheduleAction::Start, &eligible_instances, provider.as_ref())
                    .await;
                summary.record_results(results);

                let report = coordinator
                    .restore_after_start(provider.as_ref(), &groups)
                    .await;
                for warning in report.warnings {
                    summary.warn(warning);
                }
            }
        }

        info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            warnings = summary.warnings.len(),
            "run complete"
        );
        Ok(summary)
    }
}
