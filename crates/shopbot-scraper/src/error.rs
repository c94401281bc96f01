use thiserror::Error;

/// Failures raised by a [`crate::BrowsingSession`].
///
/// The orchestrator downgrades every one of these to an `Unavailable` field;
/// only the coordinator sees `Connect`, when a session cannot be opened.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("timed out after {timeout_secs}s loading {url}")]
    NavigationTimeout { url: String, timeout_secs: u64 },

    #[error("failed to load {url}: {reason}")]
    Navigation { url: String, reason: String },

    #[error("element not found: {locator}")]
    ElementNotFound { locator: String },

    #[error("timed out after {timeout_secs}s waiting for {locator}")]
    WaitTimeout { locator: String, timeout_secs: u64 },

    #[error("failed to start browser session at {endpoint}: {reason}")]
    Connect { endpoint: String, reason: String },

    #[error("browser command failed: {0}")]
    Command(String),
}
