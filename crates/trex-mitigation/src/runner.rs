//! End-to-end twirled readout mitigation against a [`Backend`].

use rand::SeedableRng;
use rand::rngs::SmallRng;
use serde::Serialize;
use tracing::{debug, info, instrument};
use trex_hal::{Backend, Counts};
use trex_ir::{Circuit, Instruction, PauliOp, PauliString, QubitId, StandardGate};

use crate::aggregate::TwirlAggregator;
use crate::config::MitigationConfig;
use crate::distribution::Distribution;
use crate::error::{MitigationError, MitigationResult};
use crate::grouping::group_qubit_wise_commuting;
use crate::mask::FlipMask;
use crate::sparse::SparseReadoutMitigator;
use crate::twirl::twirl_circuit;

/// Estimates of one observable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ObservableEstimate {
    /// The measured Pauli string.
    pub pauli: PauliString,
    /// Mitigated expectation value.
    pub mitigated: f64,
    /// Un-twirled but uncorrected expectation value.
    pub raw: f64,
    /// Gamma factors of the inverse used (empty for the identity).
    pub gammas: Vec<f64>,
    /// Shot overhead of the inverse used.
    pub sampling_overhead: f64,
}

/// Outcome of a [`ReadoutTwirlRunner::run`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MitigationReport {
    /// Backend the circuits ran on.
    pub backend: String,
    /// Twirls per circuit.
    pub n_twirls: usize,
    /// Total shots per circuit, split across the twirls.
    pub shots: u32,
    /// Aggregated calibration distribution of the all-zero state.
    pub reference: Distribution,
    /// One entry per requested observable, in request order.
    pub observables: Vec<ObservableEstimate>,
}

impl MitigationReport {
    /// Mitigated expectation values in request order.
    pub fn expectations(&self) -> Vec<f64> {
        self.observables.iter().map(|o| o.mitigated).collect()
    }

    /// Raw expectation values in request order.
    pub fn raw_expectations(&self) -> Vec<f64> {
        self.observables.iter().map(|o| o.raw).collect()
    }
}

/// One executed twirl: the counts and the mask that produced them.
#[derive(Debug, Clone)]
pub struct TwirlSample {
    /// Measured counts.
    pub counts: Counts,
    /// Flip mask of the twirl.
    pub mask: FlipMask,
}

/// Drives calibration and twirled measurement through a backend.
pub struct ReadoutTwirlRunner<B: Backend> {
    backend: B,
    config: MitigationConfig,
    rng: SmallRng,
}

impl<B: Backend> ReadoutTwirlRunner<B> {
    /// Create a runner. The config is validated here.
    pub fn new(backend: B, config: MitigationConfig) -> MitigationResult<Self> {
        config.validate()?;
        let rng = match config.seed {
            Some(seed) => SmallRng::seed_from_u64(seed),
            None => SmallRng::from_entropy(),
        };
        Ok(Self {
            backend,
            config,
            rng,
        })
    }

    /// The backend.
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// The run configuration.
    pub fn config(&self) -> &MitigationConfig {
        &self.config
    }

    /// Run `n_twirls` independent twirls of `circuit` over all of its qubits.
    pub async fn execute_twirled(&mut self, circuit: &Circuit) -> MitigationResult<Vec<TwirlSample>> {
        let qubits: Vec<QubitId> = circuit.qubits().collect();
        let mut samples = Vec::with_capacity(self.config.n_twirls);

        for i in 0..self.config.n_twirls {
            let twirled = twirl_circuit(circuit, &qubits, &mut self.rng)?;
            let shots = self.config.shots_for_twirl(i);
            let result = self.backend.run(&twirled.circuit, shots).await?;
            debug!(twirl = i, mask = %twirled.mask, "twirl executed");
            samples.push(TwirlSample {
                counts: result.counts,
                mask: twirled.flip_mask(),
            });
        }
        Ok(samples)
    }

    /// Measure the twirled all-zero state and aggregate it into a reference
    /// distribution.
    #[instrument(skip(self))]
    pub async fn calibrate(&mut self, num_qubits: u32) -> MitigationResult<Distribution> {
        let mut circuit = Circuit::with_size("readout_calibration", num_qubits);
        circuit.measure_all()?;

        let mut aggregator = TwirlAggregator::new();
        for sample in self.execute_twirled(&circuit).await? {
            aggregator.add(&sample.counts, &sample.mask)?;
        }
        info!(
            samples = aggregator.samples(),
            shots = aggregator.shots(),
            "calibration complete"
        );
        aggregator.probabilities()
    }

    /// Calibrate, then estimate every observable on `circuit`.
    ///
    /// Observables are grouped into qubit-wise commuting sets; each set gets
    /// one basis change and one batch of twirls.
    #[instrument(skip(self, circuit, observables), fields(circuit = circuit.name(), observables = observables.len()))]
    pub async fn run(
        &mut self,
        circuit: &Circuit,
        observables: &[PauliString],
    ) -> MitigationResult<MitigationReport> {
        let width = circuit.num_qubits();
        if let Some(bad) = observables.iter().find(|p| p.len() != width) {
            return Err(MitigationError::shape("observable width", width, bad.len()));
        }

        let reference = self.calibrate(width as u32).await?;
        let mitigator = SparseReadoutMitigator::new(&reference, self.config.second_order)?;
        let groups = group_qubit_wise_commuting(observables)?;
        info!(groups = groups.len(), "measuring observable groups");

        let mut estimates: Vec<Option<ObservableEstimate>> = vec![None; observables.len()];
        for group in &groups {
            let basis = group.measurement_basis();
            let measured = with_measurement_basis(circuit, &basis)?;

            let samples = self.execute_twirled(&measured).await?;
            let results = samples
                .iter()
                .map(|s| Distribution::from_counts(&s.counts))
                .collect::<MitigationResult<Vec<_>>>()?;
            let masks: Vec<FlipMask> = samples.into_iter().map(|s| s.mask).collect();
            let indices: Vec<usize> = (0..results.len()).collect();

            for (&member, pauli) in group.members.iter().zip(&group.paulis) {
                let mitigated = mitigator.process_multiple(&results, &indices, pauli, &masks)?;
                let raw = mitigator.raw_multiple(&results, &indices, pauli, &masks)?;
                let positions = pauli.non_trivial_positions();
                let (gammas, sampling_overhead) = if positions.is_empty() {
                    (vec![], 1.0)
                } else {
                    let quasi = mitigator.quasi_for(&positions)?;
                    (quasi.gammas().to_vec(), quasi.sampling_overhead())
                };
                debug!(%pauli, mitigated, raw, "observable estimated");
                estimates[member] = Some(ObservableEstimate {
                    pauli: pauli.clone(),
                    mitigated,
                    raw,
                    gammas,
                    sampling_overhead,
                });
            }
        }

        Ok(MitigationReport {
            backend: self.backend.name().to_string(),
            n_twirls: self.config.n_twirls,
            shots: self.config.shots,
            reference,
            observables: estimates.into_iter().flatten().collect(),
        })
    }
}

/// Rotate each qubit so that measuring Z measures the label in `basis`:
/// `H` for X, `Sdg` then `H` for Y. A circuit without measurements gets a
/// full-register measurement.
pub fn with_measurement_basis(circuit: &Circuit, basis: &PauliString) -> MitigationResult<Circuit> {
    if basis.len() != circuit.num_qubits() {
        return Err(MitigationError::shape(
            "measurement basis",
            circuit.num_qubits(),
            basis.len(),
        ));
    }

    let mut rotations = Vec::new();
    for (q, op) in basis.ops().iter().enumerate() {
        let qubit = QubitId::from(q);
        match op {
            PauliOp::X => rotations.push(Instruction::single_qubit_gate(StandardGate::H, qubit)),
            PauliOp::Y => {
                rotations.push(Instruction::single_qubit_gate(StandardGate::Sdg, qubit));
                rotations.push(Instruction::single_qubit_gate(StandardGate::H, qubit));
            }
            PauliOp::I | PauliOp::Z => {}
        }
    }

    let mut measured = circuit.clone();
    measured.insert_before_measurements(rotations)?;
    if !measured.has_measurements() {
        measured.measure_all()?;
    }
    Ok(measured)
}

#[cfg(test)]
mod tests {
    use super::*;
    use trex_adapter_sim::{ReadoutNoise, SimulatorBackend};

    fn config(seed: u64) -> MitigationConfig {
        MitigationConfig {
            n_twirls: 8,
            shots: 16_000,
            second_order: false,
            seed: Some(seed),
        }
    }

    #[test]
    fn test_basis_change_before_measurement() {
        let circuit = Circuit::bell().unwrap();
        let measured = with_measurement_basis(&circuit, &"XY".parse().unwrap()).unwrap();
        let names: Vec<_> = measured.instructions().iter().map(|i| i.name().to_string()).collect();
        assert_eq!(&names[2..5], &["h", "sdg", "h"]);
        assert!(measured.instructions().last().unwrap().is_measure());
    }

    #[test]
    fn test_basis_change_adds_measurement() {
        let circuit = Circuit::with_size("bare", 2);
        let measured = with_measurement_basis(&circuit, &"ZI".parse().unwrap()).unwrap();
        assert!(measured.has_measurements());
        assert_eq!(measured.num_ops(), 0);
    }

    #[test]
    fn test_runner_rejects_invalid_config() {
        let bad = MitigationConfig {
            n_twirls: 0,
            ..Default::default()
        };
        assert!(matches!(
            ReadoutTwirlRunner::new(SimulatorBackend::new(), bad),
            Err(MitigationError::Config(_))
        ));
    }

    #[tokio::test]
    async fn test_twirls_use_every_shot() {
        let config = MitigationConfig {
            n_twirls: 3,
            shots: 1000,
            second_order: false,
            seed: Some(4),
        };
        let mut runner = ReadoutTwirlRunner::new(SimulatorBackend::new().with_seed(4), config).unwrap();
        let samples = runner.execute_twirled(&Circuit::bell().unwrap()).await.unwrap();
        let per_twirl: Vec<u64> = samples.iter().map(|s| s.counts.total_shots()).collect();
        assert_eq!(per_twirl, vec![334, 333, 333]);
    }

    #[tokio::test]
    async fn test_calibration_of_noiseless_backend() {
        let backend = SimulatorBackend::new().with_seed(1);
        let mut runner = ReadoutTwirlRunner::new(backend, config(3)).unwrap();
        let reference = runner.calibrate(3).await.unwrap();
        assert_eq!(reference.get("000"), 1.0);
    }

    #[tokio::test]
    async fn test_mitigation_recovers_basis_state() {
        let noise = ReadoutNoise::per_qubit(vec![0.05, 0.08]).unwrap();
        let backend = SimulatorBackend::new().with_seed(11).with_readout_noise(noise);
        let mut runner = ReadoutTwirlRunner::new(backend, config(5)).unwrap();

        let mut circuit = Circuit::with_size("flip", 2);
        circuit.x(QubitId(0)).unwrap();
        circuit.measure_all().unwrap();

        let observables: Vec<PauliString> = ["ZI", "IZ", "ZZ"].iter().map(|s| s.parse().unwrap()).collect();
        let report = runner.run(&circuit, &observables).await.unwrap();

        let ideal = [-1.0, 1.0, -1.0];
        for (estimate, want) in report.observables.iter().zip(ideal) {
            assert!((estimate.mitigated - want).abs() < 0.05, "{estimate:?}");
            assert!(estimate.raw.abs() < estimate.mitigated.abs(), "{estimate:?}");
        }
        assert_eq!(report.expectations().len(), 3);
        assert_eq!(report.observables[2].gammas.len(), 2);
    }

    #[tokio::test]
    async fn test_bell_state_in_three_bases() {
        let noise = ReadoutNoise::uniform(0.04).unwrap();
        let backend = SimulatorBackend::new().with_seed(21).with_readout_noise(noise);
        let mut runner = ReadoutTwirlRunner::new(backend, config(8)).unwrap();

        let observables: Vec<PauliString> = ["XX", "YY", "ZZ"].iter().map(|s| s.parse().unwrap()).collect();
        let report = runner.run(&Circuit::bell().unwrap(), &observables).await.unwrap();

        let ideal = [1.0, -1.0, 1.0];
        for (value, want) in report.expectations().into_iter().zip(ideal) {
            assert!((value - want).abs() < 0.06, "got {value}, want {want}");
        }
    }
}
