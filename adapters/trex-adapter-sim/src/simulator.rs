//! Simulator backend implementation.

use async_trait::async_trait;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use rustc_hash::FxHashMap;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Instant;
use tracing::{debug, instrument};
use uuid::Uuid;

use trex_hal::{Backend, Counts, ExecutionResult, HalError, HalResult, Job, JobId, JobStatus};
use trex_ir::Circuit;

use crate::error::{SimError, SimResult};
use crate::statevector::Statevector;

/// Job data for the simulator.
struct SimJob {
    job: Job,
    result: Option<ExecutionResult>,
}

/// Symmetric per-qubit readout bit-flip model.
///
/// Every measured bit of qubit `q` is flipped independently with
/// probability `flip[q]`; qubits past the end of the list use `default`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReadoutNoise {
    default: f64,
    flip: Vec<f64>,
}

impl ReadoutNoise {
    /// Noise-free readout.
    pub fn ideal() -> Self {
        Self::default()
    }

    /// The same flip probability on every qubit.
    pub fn uniform(p: f64) -> SimResult<Self> {
        check_probability(usize::MAX, p)?;
        Ok(Self {
            default: p,
            flip: vec![],
        })
    }

    /// Individual flip probabilities for qubits `0..n`.
    pub fn per_qubit(flip: Vec<f64>) -> SimResult<Self> {
        for (q, &p) in flip.iter().enumerate() {
            check_probability(q, p)?;
        }
        Ok(Self { default: 0.0, flip })
    }

    /// Flip probability of a qubit.
    pub fn flip_probability(&self, qubit: usize) -> f64 {
        self.flip.get(qubit).copied().unwrap_or(self.default)
    }

    fn is_ideal(&self) -> bool {
        self.default == 0.0 && self.flip.iter().all(|&p| p == 0.0)
    }
}

fn check_probability(qubit: usize, value: f64) -> SimResult<()> {
    if (0.0..0.5).contains(&value) {
        Ok(())
    } else {
        Err(SimError::InvalidReadoutError { qubit, value })
    }
}

/// Local simulator backend.
///
/// Circuits are simulated once per job as a statevector; shots are then
/// sampled from the final distribution and passed through the configured
/// [`ReadoutNoise`]. The RNG is seedable so runs are reproducible.
pub struct SimulatorBackend {
    name: String,
    max_qubits: u32,
    noise: ReadoutNoise,
    rng: Mutex<SmallRng>,
    jobs: Arc<Mutex<FxHashMap<String, SimJob>>>,
}

impl SimulatorBackend {
    /// Create a noise-free simulator with default settings.
    pub fn new() -> Self {
        Self {
            name: "simulator".to_string(),
            max_qubits: 20,
            noise: ReadoutNoise::ideal(),
            rng: Mutex::new(SmallRng::from_entropy()),
            jobs: Arc::new(Mutex::new(FxHashMap::default())),
        }
    }

    /// Set the maximum number of qubits.
    #[must_use]
    pub fn with_max_qubits(mut self, max_qubits: u32) -> Self {
        self.max_qubits = max_qubits;
        self
    }

    /// Set the readout noise model.
    #[must_use]
    pub fn with_readout_noise(mut self, noise: ReadoutNoise) -> Self {
        self.noise = noise;
        self
    }

    /// Seed the sampling RNG.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.rng = Mutex::new(SmallRng::seed_from_u64(seed));
        self
    }

    /// Run simulation synchronously.
    #[instrument(skip(self, circuit), fields(circuit = circuit.name()))]
    fn run_simulation(&self, circuit: &Circuit, shots: u32) -> ExecutionResult {
        let start = Instant::now();
        let num_qubits = circuit.num_qubits();

        let mut sv = Statevector::new(num_qubits);
        for inst in circuit.instructions() {
            sv.apply(inst);
        }

        let mut acc = 0.0;
        let cumulative: Vec<f64> = sv
            .probabilities()
            .into_iter()
            .map(|p| {
                acc += p;
                acc
            })
            .collect();

        let mut rng = self.rng.lock().unwrap_or_else(PoisonError::into_inner);
        let mut counts = Counts::new();
        for _ in 0..shots {
            let mut outcome = Statevector::sample_cumulative(&cumulative, &mut *rng);
            if !self.noise.is_ideal() {
                for q in 0..num_qubits {
                    if rng.gen_bool(self.noise.flip_probability(q)) {
                        outcome ^= 1 << q;
                    }
                }
            }
            counts.insert(sv.outcome_to_bitstring(outcome), 1);
        }

        let elapsed = start.elapsed();
        debug!(num_qubits, shots, ?elapsed, "simulation completed");

        ExecutionResult::new(counts, shots).with_execution_time(elapsed.as_millis() as u64)
    }

    fn lock_jobs(&self) -> std::sync::MutexGuard<'_, FxHashMap<String, SimJob>> {
        self.jobs.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for SimulatorBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Backend for SimulatorBackend {
    fn name(&self) -> &str {
        &self.name
    }

    fn max_qubits(&self) -> u32 {
        self.max_qubits
    }

    #[instrument(skip(self, circuit))]
    async fn submit(&self, circuit: &Circuit, shots: u32) -> HalResult<JobId> {
        if circuit.num_qubits() > self.max_qubits as usize {
            return Err(HalError::CircuitTooLarge(format!(
                "Circuit has {} qubits but simulator only supports {}",
                circuit.num_qubits(),
                self.max_qubits
            )));
        }
        if shots == 0 {
            return Err(HalError::SubmissionFailed(
                "shots must be at least 1".to_string(),
            ));
        }

        let job_id = JobId::new(Uuid::new_v4().to_string());
        let job = Job::new(job_id.clone(), shots).with_backend(self.name.clone());
        self.lock_jobs()
            .insert(job_id.0.clone(), SimJob { job, result: None });

        // Local simulation completes synchronously.
        let result = self.run_simulation(circuit, shots);

        if let Some(sim_job) = self.lock_jobs().get_mut(&job_id.0) {
            sim_job.result = Some(result);
            sim_job.job = sim_job.job.clone().with_status(JobStatus::Completed);
        }

        debug!("Submitted job: {}", job_id);
        Ok(job_id)
    }

    async fn status(&self, job_id: &JobId) -> HalResult<JobStatus> {
        self.lock_jobs()
            .get(&job_id.0)
            .map(|j| j.job.status.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn result(&self, job_id: &JobId) -> HalResult<ExecutionResult> {
        self.lock_jobs()
            .get(&job_id.0)
            .and_then(|j| j.result.clone())
            .ok_or_else(|| HalError::JobNotFound(job_id.0.clone()))
    }

    async fn cancel(&self, job_id: &JobId) -> HalResult<()> {
        let mut jobs = self.lock_jobs();
        match jobs.get_mut(&job_id.0) {
            Some(sim_job) => {
                sim_job.job = sim_job.job.clone().with_status(JobStatus::Cancelled);
                Ok(())
            }
            None => Err(HalError::JobNotFound(job_id.0.clone())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_simulator_bell_state() {
        let backend = SimulatorBackend::new().with_seed(7);

        let circuit = Circuit::bell().unwrap();
        let result = backend.run(&circuit, 1000).await.unwrap();
        assert_eq!(result.shots, 1000);

        let counts = &result.counts;
        assert_eq!(counts.get("00") + counts.get("11"), 1000);
        assert_eq!(counts.get("01") + counts.get("10"), 0);
    }

    #[tokio::test]
    async fn test_readout_noise_flips_bits() {
        let backend = SimulatorBackend::new()
            .with_seed(11)
            .with_readout_noise(ReadoutNoise::uniform(0.1).unwrap());

        let circuit = Circuit::with_size("zero", 1);
        let result = backend.run(&circuit, 10_000).await.unwrap();
        let flipped = result.counts.get("1") as f64 / 10_000.0;
        assert!((flipped - 0.1).abs() < 0.02, "flip rate {flipped}");
    }

    #[tokio::test]
    async fn test_completed_job_stays_completed() {
        let backend = SimulatorBackend::new();
        let circuit = Circuit::ghz(2).unwrap();
        let job_id = backend.submit(&circuit, 10).await.unwrap();
        backend.cancel(&job_id).await.unwrap();
        assert!(backend.status(&job_id).await.unwrap().is_success());
    }

    #[tokio::test]
    async fn test_simulator_too_many_qubits() {
        let backend = SimulatorBackend::new().with_max_qubits(5);
        let circuit = Circuit::with_size("test", 10);
        let result = backend.submit(&circuit, 100).await;
        assert!(matches!(result, Err(HalError::CircuitTooLarge(_))));
    }

    #[tokio::test]
    async fn test_unknown_job() {
        let backend = SimulatorBackend::new();
        let missing = JobId::new("missing");
        assert!(matches!(
            backend.result(&missing).await,
            Err(HalError::JobNotFound(_))
        ));
    }

    #[test]
    fn test_invalid_readout_error() {
        assert!(ReadoutNoise::uniform(0.5).is_err());
        assert!(matches!(
            ReadoutNoise::per_qubit(vec![0.01, -0.1]),
            Err(SimError::InvalidReadoutError { qubit: 1, .. })
        ));
        let noise = ReadoutNoise::per_qubit(vec![0.02]).unwrap();
        assert_eq!(noise.flip_probability(0), 0.02);
        assert_eq!(noise.flip_probability(3), 0.0);
    }
}
