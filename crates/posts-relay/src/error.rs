use thiserror::Error;

/// Errors that can occur within the trigger relay.
#[derive(Debug, Error)]
pub enum RelayError {
    /// The cron expression could not be parsed.
    #[error("Invalid schedule: {0}")]
    InvalidSchedule(String),

    /// Transport-level failure talking to the target endpoint.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The target answered with a non-2xx status.
    #[error("Scheduled task failed: {status}")]
    Status { status: reqwest::StatusCode },
}

pub type Result<T> = std::result::Result<T, RelayError>;
