//! The lightsout reconciliation engine.
//!
//! One run flows strictly forward: resolve credentials, discover
//! schedule-tagged resources, evaluate eligibility, coordinate autoscaling
//! groups, apply the action with bounded concurrency and retry, summarize.
//! Nothing here persists between runs; the pass is recomputed from tagged
//! resource state every time.

pub mod config;
pub mod coordinator;
pub mod discovery;
pub mod executor;
pub mod orchestrator;
pub mod retry;

#[cfg(test)]
mod testutil;

pub use config::ExecutorConfig;
pub use coordinator::{AutoscalingCoordinator, CoordinationReport, GroupCoordination, GroupPosture};
pub use discovery::DiscoveryService;
pub use executor::ActionExecutor;
pub use orchestrator::Orchestrator;
pub use retry::RetryStrategy;
