use std::time::Duration;

use lightsout_core::ActionErrorKind;
use thiserror::Error;

/// Errors a cloud provider implementation can surface.
///
/// The engine only distinguishes transient from permanent: transient errors
/// enter the retry path, permanent ones are recorded immediately.
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The platform rejected the request due to rate limiting.
    #[error("request throttled")]
    Throttled,

    /// The call did not complete within the allowed duration.
    #[error("timeout after {0:?}")]
    Timeout(Duration),

    /// A network or transport-level error occurred.
    #[error("connection error: {0}")]
    Connection(String),

    /// The resource cannot take the requested transition (already in the
    /// target state, or mid-transition).
    #[error("invalid state: {0}")]
    InvalidState(String),

    /// The resource does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// The credential scope was rejected or has lapsed.
    #[error("authorization failed: {0}")]
    Authorization(String),

    /// Any other service-side failure.
    #[error("service error: {0}")]
    Service(String),
}

impl ProviderError {
    /// Returns `true` if the error is transient and the operation may
    /// succeed on retry.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::Throttled | Self::Timeout(_) | Self::Connection(_)
        )
    }

    /// Category this error lands in on a per-resource result.
    ///
    /// Transient variants map to [`ActionErrorKind::Throttled`]; the
    /// executor only records them once the retry budget is exhausted.
    pub fn result_kind(&self) -> ActionErrorKind {
        match self {
            Self::Throttled | Self::Timeout(_) | Self::Connection(_) => ActionErrorKind::Throttled,
            Self::InvalidState(_) => ActionErrorKind::InvalidState,
            Self::NotFound(_) => ActionErrorKind::NotFound,
            Self::Authorization(_) => ActionErrorKind::Authorization,
            Self::Service(_) => ActionErrorKind::Provider,
        }
    }
}
