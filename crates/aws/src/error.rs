use std::time::Duration;

use lightsout_provider::ProviderError;

/// Timeout attributed to SDK errors that report one without a duration.
const SDK_CALL_TIMEOUT: Duration = Duration::from_secs(30);

/// Classify an AWS SDK error string into a [`ProviderError`].
///
/// The SDK surfaces service errors as display strings; this helper inspects
/// them for the patterns that matter to the engine (throttling, timeouts,
/// connection failures, authorization rejections, and invalid instance
/// state transitions) and maps everything else to a permanent service
/// error.
pub fn classify_sdk_error(error_str: &str) -> ProviderError {
    let lower = error_str.to_lowercase();
    if lower.contains("throttl")
        || lower.contains("rate exceed")
        || lower.contains("too many")
        || lower.contains("requestlimitexceeded")
    {
        ProviderError::Throttled
    } else if lower.contains("timeout") || lower.contains("timed out") {
        ProviderError::Timeout(SDK_CALL_TIMEOUT)
    } else if lower.contains("accessdenied")
        || lower.contains("unauthorized")
        || lower.contains("not authorized")
        || lower.contains("expiredtoken")
        || lower.contains("requestexpired")
    {
        ProviderError::Authorization(error_str.to_owned())
    } else if lower.contains("incorrectinstancestate")
        || lower.contains("incorrect state")
        || lower.contains("invalid state")
        || lower.contains("unsupportedoperation")
    {
        ProviderError::InvalidState(error_str.to_owned())
    } else if lower.contains("notfound") || lower.contains("does not exist") {
        ProviderError::NotFound(error_str.to_owned())
    } else if lower.contains("connection")
        || lower.contains("connect")
        || lower.contains("dns")
        || lower.contains("network")
    {
        ProviderError::Connection(error_str.to_owned())
    } else {
        ProviderError::Service(error_str.to_owned())
    }
}
