//! Backend trait.
//!
//! ```text
//!   submit() ──→ status() ──→ result()
//!   (async)      (async)      (async)
//! ```
//!
//! The mitigation layer only ever needs "run this circuit for N shots and
//! hand back counts"; [`Backend::run`] packages the full lifecycle for that.

use std::time::Duration;

use async_trait::async_trait;
use tracing::debug;

use trex_ir::Circuit;

use crate::error::{HalError, HalResult};
use crate::job::{JobId, JobStatus};
use crate::result::ExecutionResult;

/// Polling policy used by [`Backend::wait`].
#[derive(Debug, Clone, Copy)]
pub struct WaitPolicy {
    /// Delay between status polls.
    pub poll_interval: Duration,
    /// Maximum number of polls before giving up.
    pub max_polls: u32,
}

impl Default for WaitPolicy {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(500),
            max_polls: 600, // 5 minutes
        }
    }
}

/// Trait for quantum backends.
///
/// - `submit()` returns a job that starts in `Queued`.
/// - `result()` is only valid once `status()` reports `Completed`.
/// - Implementations must be `Send + Sync` so runners can share them.
#[async_trait]
pub trait Backend: Send + Sync {
    /// Get the name of this backend.
    fn name(&self) -> &str;

    /// Maximum circuit width this backend accepts.
    fn max_qubits(&self) -> u32;

    /// Submit a circuit for execution.
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId>;

    /// Get the status of a job.
    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus>;

    /// Get the result of a completed job.
    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult>;

    /// Cancel a running job.
    async fn cancel(&self, job_id: &JobId) -> HalResult<()>;

    /// Polling policy for [`Backend::wait`].
    fn wait_policy(&self) -> WaitPolicy {
        WaitPolicy::default()
    }

    /// Wait for a job to complete and return its result.
    async fn wait(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        let policy = self.wait_policy();

        for _ in 0..policy.max_polls {
            match self.status(job_id).await? {
                JobStatus::Completed => return self.result(job_id).await,
                JobStatus::Failed(msg) => return Err(HalError::JobFailed(msg)),
                JobStatus::Cancelled => return Err(HalError::JobCancelled),
                JobStatus::Queued | JobStatus::Running => {
                    tokio::time::sleep(policy.poll_interval).await;
                }
            }
        }

        Err(HalError::Timeout(job_id.0.clone()))
    }

    /// Submit, wait, and return the result.
    async fn run(&self, circuit: &Circuit, shots: u32) -> HalResult<ExecutionResult> {
        if circuit.num_qubits() > self.max_qubits() as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but {} only supports {}",
                circuit.num_qubits(),
                self.name(),
                self.max_qubits()
            )));
        }
        let job_id = self.submit(circuit, shots).await?;
        debug!(backend = self.name(), %job_id, shots, "submitted circuit");
        self.wait(&job_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::result::Counts;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Backend that reports `Running` a fixed number of times before completing.
    struct SlowBackend {
        polls_until_done: u32,
        polls: AtomicU32,
        cancelled: Mutex<bool>,
    }

    #[async_trait]
    impl Backend for SlowBackend {
        fn name(&self) -> &str {
            "slow"
        }

        fn max_qubits(&self) -> u32 {
            2
        }

        fn wait_policy(&self) -> WaitPolicy {
            WaitPolicy {
                poll_interval: Duration::from_millis(10),
                max_polls: 5,
            }
        }

        async fn submit(&self, _circuit: &Circuit, _shots: u32) -> HalResult<JobId> {
            Ok(JobId::new("job-1"))
        }

        async fn status(&self, _job_id: &JobId) -> HalResult<JobStatus> {
            if *self.cancelled.lock().unwrap() {
                return Ok(JobStatus::Cancelled);
            }
            let n = self.polls.fetch_add(1, Ordering::SeqCst);
            if n >= self.polls_until_done {
                Ok(JobStatus::Completed)
            } else {
                Ok(JobStatus::Running)
            }
        }

        async fn result(&self, _job_id: &JobId) -> HalResult<ExecutionResult> {
            Ok(ExecutionResult::new(Counts::from_pairs([("00", 10)]), 10))
        }

        async fn cancel(&self, _job_id: &JobId) -> HalResult<()> {
            *self.cancelled.lock().unwrap() = true;
            Ok(())
        }
    }

    fn slow(polls_until_done: u32) -> SlowBackend {
        SlowBackend {
            polls_until_done,
            polls: AtomicU32::new(0),
            cancelled: Mutex::new(false),
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_run_polls_until_complete() {
        let backend = slow(3);
        let circuit = Circuit::bell().unwrap();
        let result = backend.run(&circuit, 10).await.unwrap();
        assert_eq!(result.counts.get("00"), 10);
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_times_out() {
        let backend = slow(100);
        let err = backend.wait(&JobId::new("job-1")).await.unwrap_err();
        assert!(matches!(err, HalError::Timeout(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_wait_reports_cancellation() {
        let backend = slow(100);
        let id = JobId::new("job-1");
        backend.cancel(&id).await.unwrap();
        assert!(matches!(backend.wait(&id).await, Err(HalError::JobCancelled)));
    }

    #[tokio::test]
    async fn test_run_rejects_wide_circuit() {
        let backend = slow(0);
        let circuit = Circuit::ghz(3).unwrap();
        assert!(matches!(
            backend.run(&circuit, 10).await,
            Err(HalError::CircuitTooLarge(_))
        ));
    }
}
