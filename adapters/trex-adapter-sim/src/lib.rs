//! TREX Local Statevector Simulator
//!
//! A small exact simulator used as the stand-in for real hardware in tests,
//! demos and the CLI:
//!
//! - **Exact Simulation**: full statevector, limited to ~20 qubits
//! - **Readout Noise**: symmetric per-qubit bit flips on every sampled shot
//! - **Reproducible**: the sampling RNG can be seeded
//! - **Unitaries**: dense unitaries of small circuits for equivalence checks
//!
//! # Example
//!
//! ```ignore
//! use trex_adapter_sim::{ReadoutNoise, SimulatorBackend};
//! use trex_hal::Backend;
//! use trex_ir::Circuit;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let backend = SimulatorBackend::new()
//!         .with_seed(42)
//!         .with_readout_noise(ReadoutNoise::uniform(0.03)?);
//!
//!     let result = backend.run(&Circuit::bell()?, 1000).await?;
//!     println!("Results: {:?}", result.counts);
//!     Ok(())
//! }
//! ```

mod error;
mod simulator;
mod statevector;
pub mod unitary;

pub use error::{SimError, SimResult};
pub use simulator::{ReadoutNoise, SimulatorBackend};
pub use statevector::Statevector;
pub use unitary::{Unitary, circuit_unitary, trace_overlap};
