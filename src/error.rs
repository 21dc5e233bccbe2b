//! Error taxonomy for the client.
//!
//! Every network or parse failure is mapped into one of these kinds at the
//! boundary where it happens. Only `Submission` resets the session.

use thiserror::Error;

/// Generic message shown when a job could not be created.
pub const SUBMISSION_FAILED_MESSAGE: &str = "Failed to start generation";

/// Message shown when the progress stream drops before a terminal event.
pub const CONNECTION_LOST_MESSAGE: &str = "Lost connection to the progress stream";

#[derive(Debug, Error)]
pub enum ClientError {
    /// Job creation was rejected or never reached the server.
    #[error("job submission failed: {0}")]
    Submission(String),

    /// A stream message could not be decoded into a progress event.
    #[error("malformed stream message: {0}")]
    Parse(String),

    /// The progress stream connection failed or ended early.
    #[error("progress stream transport error: {0}")]
    Transport(String),

    #[error("download failed: {0}")]
    Download(String),

    #[error("clipboard write failed: {0}")]
    Clipboard(String),

    #[error("task info request failed: {0}")]
    TaskInfo(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display_includes_detail() {
        let err = ClientError::Submission("HTTP 500".into());
        assert_eq!(err.to_string(), "job submission failed: HTTP 500");
    }
}
