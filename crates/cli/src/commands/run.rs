use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, bail};
use clap::Args;
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use lightsout_aws::{AwsResolverConfig, AwsScopeResolver};
use lightsout_core::{ActionRequest, RunSummary, RunWarning, ScheduleAction};
use lightsout_engine::{ExecutorConfig, Orchestrator};

use crate::OutputFormat;

/// Arguments for `lightsout run`.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Action to apply to eligible resources.
    #[arg(long, value_enum)]
    action: Option<ActionArg>,

    /// Region to reconcile.
    #[arg(long, env = "LIGHTSOUT_REGION")]
    region: Option<String>,

    /// Manage every tagged resource that has not opted out, instead of
    /// requiring tags to explicitly authorize the action.
    #[arg(long)]
    opt_out: bool,

    /// Cross-account role to assume for the run.
    #[arg(long, env = "LIGHTSOUT_ROLE_ARN")]
    role_arn: Option<String>,

    /// Session label recorded in the identity provider's audit trail.
    #[arg(long)]
    session_name: Option<String>,

    /// Report what would happen without issuing any mutating call.
    #[arg(long)]
    dry_run: bool,

    /// JSON trigger payload file. Overrides the individual request flags.
    #[arg(long)]
    event: Option<PathBuf>,

    /// Endpoint URL override for local development.
    #[arg(long, env = "LIGHTSOUT_ENDPOINT_URL")]
    endpoint_url: Option<String>,

    /// External ID for cross-account trust policies.
    #[arg(long, env = "LIGHTSOUT_EXTERNAL_ID")]
    external_id: Option<String>,

    /// Maximum provider calls in flight at once.
    #[arg(long, default_value_t = 8)]
    max_concurrent: usize,

    /// Stop issuing new actions after this many seconds; in-flight calls
    /// complete cleanly.
    #[arg(long)]
    deadline_secs: Option<u64>,
}

#[derive(Debug, Clone, Copy, clap::ValueEnum)]
enum ActionArg {
    Start,
    Stop,
}

impl From<ActionArg> for ScheduleAction {
    fn from(action: ActionArg) -> Self {
        match action {
            ActionArg::Start => Self::Start,
            ActionArg::Stop => Self::Stop,
        }
    }
}

pub async fn run(args: &RunArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let request = build_request(args)?;

    let mut resolver_config = AwsResolverConfig::new();
    if let Some(endpoint_url) = &args.endpoint_url {
        resolver_config = resolver_config.with_endpoint_url(endpoint_url);
    }
    if let Some(external_id) = &args.external_id {
        resolver_config = resolver_config.with_external_id(external_id);
    }

    let cancel = CancellationToken::new();
    if let Some(secs) = args.deadline_secs {
        let deadline_cancel = cancel.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_secs(secs)).await;
            warn!(deadline_secs = secs, "invocation deadline reached, cancelling run");
            deadline_cancel.cancel();
        });
    }
    let interrupt_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("interrupt received, cancelling run");
            interrupt_cancel.cancel();
        }
    });

    let orchestrator = Orchestrator::new(AwsScopeResolver::with_config(resolver_config))
        .with_executor_config(
            ExecutorConfig::default().with_max_concurrent(args.max_concurrent),
        )
        .with_cancellation(cancel);

    info!(action = %request.action, region = %request.region, "starting run");
    let summary = orchestrator.run(&request).await?;

    print_summary(&summary, format)?;
    Ok(())
}

/// Build the request from the event payload or from the individual flags.
fn build_request(args: &RunArgs) -> anyhow::Result<ActionRequest> {
    if let Some(event) = &args.event {
        let payload = std::fs::read_to_string(event)
            .with_context(|| format!("reading trigger payload {}", event.display()))?;
        let request: ActionRequest =
            serde_json::from_str(&payload).context("parsing trigger payload")?;
        return Ok(request);
    }

    let Some(action) = args.action else {
        bail!("--action is required unless --event is given");
    };
    let Some(region) = args.region.clone() else {
        bail!("--region is required unless --event is given");
    };

    let mut request = ActionRequest::new(action.into(), region)
        .with_opt_in(!args.opt_out)
        .with_dry_run(args.dry_run);
    if let Some(role_arn) = &args.role_arn {
        request = request.with_role_arn(role_arn);
    }
    if let Some(session_name) = &args.session_name {
        request = request.with_session_name(session_name);
    }
    Ok(request)
}

fn print_summary(summary: &RunSummary, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(summary)?);
        }
        OutputFormat::Text => {
            let mode = if summary.dry_run { " (dry run)" } else { "" };
            println!(
                "{} in {}{mode}: discovered {}, eligible {}, succeeded {}, failed {}",
                summary.action,
                summary.region,
                summary.discovered,
                summary.eligible,
                summary.succeeded,
                summary.failed
            );
            if summary.skipped_ineligible + summary.skipped_malformed > 0 {
                println!(
                    "skipped: {} ineligible, {} malformed",
                    summary.skipped_ineligible, summary.skipped_malformed
                );
            }
            for result in &summary.results {
                if let Some(failure) = &result.error {
                    println!(
                        "  FAILED {} [{:?}] after {} retries: {}",
                        result.resource, failure.kind, result.retries, failure.message
                    );
                }
            }
            for warning in &summary.warnings {
                match warning {
                    RunWarning::Config { resource, message } => {
                        println!("  WARN config {resource}: {message}");
                    }
                    RunWarning::Coordination { group, message } => {
                        println!("  WARN coordination {group}: {message}");
                    }
                }
            }
        }
    }
    Ok(())
}
