use std::collections::BTreeSet;

use tracing::{debug, info, instrument, warn};

use lightsout_core::{RunWarning, SUSPENSION_MARKER_TAG_KEY};
use lightsout_provider::DynCloudProvider;

/// Scaling processes suspended ahead of a stop, so the autoscaler does not
/// replace instances the scheduler is about to stop.
const MANAGED_PROCESSES: [&str; 2] = ["Launch", "HealthCheck"];

/// Per-group coordination state within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GroupPosture {
    /// Initial state; also where a group stays when coordination degrades.
    Unmanaged,
    /// The scheduler suspended scaling processes ahead of a stop.
    SuspendedForStop,
    /// The scheduler restored the group's prior suspension posture.
    Restored,
}

/// What the coordinator did to one group.
#[derive(Debug, Clone)]
pub struct GroupCoordination {
    /// Group name.
    pub group: String,
    /// Processes that were already suspended before the scheduler acted.
    pub original_processes: BTreeSet<String>,
    /// Processes this run suspended or resumed.
    pub touched_processes: Vec<String>,
    /// Terminal state the group reached.
    pub posture: GroupPosture,
}

/// Outcome of a coordination pass over the affected groups.
#[derive(Debug, Default)]
pub struct CoordinationReport {
    /// Per-group records.
    pub groups: Vec<GroupCoordination>,
    /// Non-fatal degradations, for the run summary.
    pub warnings: Vec<RunWarning>,
}

impl CoordinationReport {
    fn warn(&mut self, group: &str, message: String) {
        warn!(group = %group, message = %message, "autoscaling coordination degraded");
        self.warnings.push(RunWarning::Coordination {
            group: group.to_owned(),
            message,
        });
    }
}

/// Keeps autoscaling groups from fighting the scheduler.
///
/// Before a stop the affected groups get their `Launch` and `HealthCheck`
/// processes suspended; the delta actually suspended is recorded as a
/// marker tag on the group, because runs are stateless and the later start
/// run must restore exactly the prior posture. After a start the marker is
/// read back, exactly those processes are resumed, and the marker is
/// removed. Every failure degrades to best effort: member instances are
/// still started and stopped directly.
#[derive(Debug, Default)]
pub struct AutoscalingCoordinator;

impl AutoscalingCoordinator {
    pub fn new() -> Self {
        Self
    }

    /// Suspend scaling on the affected groups ahead of member stop calls.
    #[instrument(skip(self, provider, groups))]
    pub async fn suspend_for_stop(
        &self,
        provider: &dyn DynCloudProvider,
        groups: &[String],
    ) -> CoordinationReport {
        let mut report = CoordinationReport::default();

        for group in groups {
            let detail = match provider.describe_group(group).await {
                Ok(detail) => detail,
                Err(err) => {
                    report.warn(group, format!("describe failed: {err}"));
                    continue;
                }
            };

            let original_processes = detail.suspended_processes.clone();
            let to_suspend: Vec<String> = MANAGED_PROCESSES
                .iter()
                .map(|p| (*p).to_owned())
                .filter(|p| !original_processes.contains(p))
                .collect();

            if to_suspend.is_empty() {
                debug!(group = %group, "managed processes already suspended, leaving as-is");
                report.groups.push(GroupCoordination {
                    group: group.clone(),
                    original_processes,
                    touched_processes: Vec::new(),
                    posture: GroupPosture::Unmanaged,
                });
                continue;
            }

            if let Err(err) = provider.suspend_processes(group, &to_suspend).await {
                report.warn(group, format!("suspend failed: {err}"));
                continue;
            }

            // The marker is what lets the next start run restore the prior
            // posture; losing it means the group stays suspended until an
            // operator intervenes, so its failure is worth its own warning.
            let marker = to_suspend.join(",");
            if let Err(err) = provider
                .tag_group(group, SUSPENSION_MARKER_TAG_KEY, &marker)
                .await
            {
                report.warn(group, format!("suspension marker not recorded: {err}"));
            }

            info!(group = %group, suspended = ?to_suspend, "scaling suspended for stop");
            report.groups.push(GroupCoordination {
                group: group.clone(),
                original_processes,
                touched_processes: to_suspend,
                posture: GroupPosture::SuspendedForStop,
            });
        }

        report
    }

    /// Restore the groups' prior suspension posture after member start
    /// calls have completed.
    #[instrument(skip(self, provider, groups))]
    pub async fn restore_after_start(
        &self,
        provider: &dyn DynCloudProvider,
        groups: &[String],
    ) -> CoordinationReport {
        let mut report = CoordinationReport::default();

        for group in groups {
            let detail = match provider.describe_group(group).await {
                Ok(detail) => detail,
                Err(err) => {
                    report.warn(group, format!("describe failed: {err}"));
                    continue;
                }
            };

            let Some(marker) = detail.tags.get(SUSPENSION_MARKER_TAG_KEY) else {
                debug!(group = %group, "no suspension marker, leaving posture alone");
                continue;
            };

            let to_resume: Vec<String> = marker
                .split(',')
                .map(str::trim)
                .filter(|p| !p.is_empty())
                .map(ToOwned::to_owned)
                .collect();

            if let Err(err) = provider.resume_processes(group, &to_resume).await {
                // Marker stays in place so a later run can retry the restore.
                report.warn(group, format!("resume failed: {err}"));
                continue;
            }

            if let Err(err) = provider.untag_group(group, SUSPENSION_MARKER_TAG_KEY).await {
                report.warn(group, format!("suspension marker not removed: {err}"));
            }

            let original_processes: BTreeSet<String> = detail
                .suspended_processes
                .iter()
                .filter(|p| !to_resume.contains(p))
                .cloned()
                .collect();

            info!(group = %group, resumed = ?to_resume, "scaling restored after start");
            report.groups.push(GroupCoordination {
                group: group.clone(),
                original_processes,
                touched_processes: to_resume,
                posture: GroupPosture::Restored,
            });
        }

        report
    }
}
