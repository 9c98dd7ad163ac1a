use crate::forecast::ForecastRequest;

pub const SUMMARY_REQUIRED: &str = "Summary is required.";

/// Check a request for a new forecast. Only the summary is constrained: it
/// must be present and contain something other than whitespace.
pub fn validate_new_forecast(request: &ForecastRequest) -> Result<(), String> {
    match request.summary.as_deref() {
        Some(summary) if !summary.trim().is_empty() => Ok(()),
        _ => Err(SUMMARY_REQUIRED.to_string()),
    }
}
