//! TREX Readout Error Mitigation
//!
//! Twirled readout error extinction: random Pauli twirls turn arbitrary
//! readout bias into symmetric bit-flip noise, which is then inverted with a
//! quasi-probability distribution built from a calibration run.
//!
//! # Pipeline
//!
//! 1. [`twirl_circuit`] / [`apply_readout_twirl`] insert a random Pauli layer
//!    before measurement and record its [`FlipMask`].
//! 2. Results are un-twirled and summed by [`TwirlAggregator`].
//! 3. [`build_quasi_distribution`] inverts the calibration marginals
//!    (first or second order).
//! 4. [`SparseReadoutMitigator`] corrects Pauli expectation values, caching
//!    one inverse per set of measured positions.
//!
//! [`ReadoutTwirlRunner`] drives the whole pipeline through any
//! [`trex_hal::Backend`].
//!
//! # Example
//!
//! ```rust
//! use trex_mitigation::{Distribution, FlipMask, SparseReadoutMitigator};
//!
//! // Calibration: qubit 0 misreads 10% of the time.
//! let reference = Distribution::from_weights([("00", 0.9), ("10", 0.1)]).unwrap();
//! let mitigator = SparseReadoutMitigator::new(&reference, false).unwrap();
//!
//! // A |10> state measured through the same noise, twirled by X on qubit 1.
//! let result = Distribution::from_weights([("11", 0.9), ("01", 0.1)]).unwrap();
//! let masks = vec!["IX".parse::<FlipMask>().unwrap()];
//!
//! let z0 = mitigator.process_single(&result, 0, &"ZI".parse().unwrap(), &masks).unwrap();
//! assert!((z0 + 1.0).abs() < 1e-9);
//! ```

pub mod aggregate;
pub mod config;
pub mod distribution;
pub mod error;
pub mod grouping;
pub mod mask;
pub mod quasi;
pub mod runner;
pub mod sparse;
pub mod twirl;

pub use aggregate::{TwirlAggregator, aggregate_twirled, untwirl};
pub use config::{ConfigError, MitigationConfig};
pub use distribution::Distribution;
pub use error::{MitigationError, MitigationResult};
pub use grouping::{PauliGroup, group_qubit_wise_commuting};
pub use mask::FlipMask;
pub use quasi::{QuasiDistribution, build_quasi_distribution};
pub use runner::{
    MitigationReport, ObservableEstimate, ReadoutTwirlRunner, TwirlSample, with_measurement_basis,
};
pub use sparse::SparseReadoutMitigator;
pub use twirl::{
    TwirlOutput, TwirlTarget, TwirledCircuit, apply_readout_twirl, random_mask, twirl_circuit,
};
