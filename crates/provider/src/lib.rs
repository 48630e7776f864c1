//! Cloud capability interface for the lightsout scheduler.
//!
//! The engine drives the cloud platform exclusively through
//! [`CloudProvider`] (statically dispatched, native `async fn`) or its
//! object-safe sibling [`DynCloudProvider`]. Implementations classify their
//! failures only as transient-vs-permanent via
//! [`ProviderError::is_retryable`]; the engine assumes nothing else about
//! the platform's error taxonomy.

pub mod error;
pub mod provider;
pub mod resolver;

pub use error::ProviderError;
pub use provider::{CloudProvider, DiscoveredResource, DynCloudProvider, GroupDetail};
pub use resolver::ScopeResolver;
