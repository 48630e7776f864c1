//! AWS implementation of the lightsout capability interface.
//!
//! [`AwsScopeResolver`] performs the credential exchange for a run (the
//! caller's own identity, or an STS assume-role session in a target account
//! with a bounded validity window) and hands back an [`AwsCloud`] provider
//! whose every call is guarded against that window lapsing. Discovery is
//! tag-key filtered server-side and paginated transparently.

pub mod cloud;
pub mod config;
pub mod error;
pub mod scope;

pub use cloud::AwsCloud;
pub use config::AwsResolverConfig;
pub use error::classify_sdk_error;
pub use scope::AwsScopeResolver;
