use thiserror::Error;

/// Failures talking to the hosting platform API.
///
/// Timeouts and "never found" are not errors; the waiter reports those as
/// [`crate::workflows::WaitOutcome`] variants.
#[derive(Debug, Error)]
pub enum PlatformError {
    #[error("Invalid site environment '{input}': expected <site>.<env>")]
    InvalidSiteEnv { input: String },
    #[error("Site not found: {site}")]
    SiteNotFound { site: String },
    #[error("Environment '{env}' not found on site {site}")]
    EnvironmentNotFound { site: String, env: String },
    #[error("Platform authentication failed (HTTP {status}); check WORKFLOW_WAIT_API__TOKEN or TERMINUS_SESSION")]
    Unauthorized { status: u16 },
    #[error("Platform rate limit exceeded")]
    RateLimited,
    #[error("Platform API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },
    #[error("Network error: {source}")]
    Network {
        #[from]
        source: reqwest::Error,
    },
    #[error("Invalid response from platform API: {message}")]
    InvalidResponse { message: String },
}

impl PlatformError {
    /// Map a non-success HTTP status and response body to an error.
    pub fn from_status(status: u16, body: &str) -> Self {
        match status {
            401 | 403 => PlatformError::Unauthorized { status },
            429 => PlatformError::RateLimited,
            _ => PlatformError::Api {
                status,
                message: extract_message(body),
            },
        }
    }
}

// The API answers errors with either a JSON string or plain text.
fn extract_message(body: &str) -> String {
    let trimmed = body.trim();
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::String(message)) => message,
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(|m| m.as_str())
            .map(str::to_string)
            .unwrap_or_else(|| trimmed.to_string()),
        _ => trimmed.to_string(),
    }
}
