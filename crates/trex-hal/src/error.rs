//! Backend errors.

use thiserror::Error;

/// Failures at the backend boundary.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HalError {
    /// The backend refused the submission.
    #[error("submission rejected: {0}")]
    SubmissionFailed(String),

    /// The circuit is wider than the backend supports.
    #[error("circuit too large: {0}")]
    CircuitTooLarge(String),

    /// No job with this id is known to the backend.
    #[error("unknown job {0}")]
    JobNotFound(String),

    /// The job ended in failure.
    #[error("job failed: {0}")]
    JobFailed(String),

    /// The job was cancelled before producing counts.
    #[error("job cancelled")]
    JobCancelled,

    /// The job did not finish within the wait policy.
    #[error("gave up waiting for job {0}")]
    Timeout(String),
}

/// Result type for backend operations.
pub type HalResult<T> = Result<T, HalError>;
