//! Error types for the simulator adapter.

use thiserror::Error;

/// Errors produced by local simulation.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SimError {
    /// Circuit is too wide for dense simulation.
    #[error("Circuit has {num_qubits} qubits but the simulator supports at most {max_qubits}")]
    TooManyQubits {
        /// Width of the offending circuit.
        num_qubits: usize,
        /// Configured limit.
        max_qubits: usize,
    },

    /// Readout flip probability outside `[0, 0.5)`.
    #[error("Readout error {value} for qubit {qubit} must lie in [0, 0.5)")]
    InvalidReadoutError {
        /// Qubit index.
        qubit: usize,
        /// Rejected probability.
        value: f64,
    },

    /// Matrices of different dimension were compared.
    #[error("Cannot compare unitaries of dimension {left} and {right}")]
    DimensionMismatch {
        /// Left operand dimension.
        left: usize,
        /// Right operand dimension.
        right: usize,
    },
}

/// Result type for simulation operations.
pub type SimResult<T> = Result<T, SimError>;
