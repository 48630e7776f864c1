use thiserror::Error;

/// Fatal conditions that abort a run before any mutating action is issued.
///
/// Everything else (throttling, invalid states, coordination failures,
/// malformed tags) is non-fatal and lands in the run summary instead.
#[derive(Debug, Error)]
pub enum RunError {
    /// Role assumption was rejected by the identity provider. Not transient:
    /// the trust relationship does not permit the caller, so retrying cannot
    /// help.
    #[error("role assumption rejected: {0}")]
    Authorization(String),

    /// The resource inventory could not be established after retries. With
    /// no inventory there is no safe action set, so the run stops here.
    #[error("discovery failed: {0}")]
    Discovery(String),
}
