//! Error types for readout mitigation.

use thiserror::Error;
use trex_hal::HalError;
use trex_ir::IrError;

use crate::config::ConfigError;

/// Errors that can occur while twirling, aggregating or correcting.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum MitigationError {
    /// Two things that must have the same width do not.
    #[error("Shape mismatch in {context}: expected {expected}, got {got}")]
    ShapeMismatch {
        /// What was being compared.
        context: String,
        /// Expected width or length.
        expected: usize,
        /// Actual width or length.
        got: usize,
    },

    /// A key contains something other than '0' and '1'.
    #[error("Invalid bitstring '{0}': only '0' and '1' are allowed")]
    InvalidBitstring(String),

    /// A twirl mask contains an unknown label.
    #[error("Invalid mask label '{label}' at position {position}")]
    InvalidMaskLabel {
        /// The rejected character.
        label: char,
        /// Position in the mask.
        position: usize,
    },

    /// A twirl mask index points past the end of the mask list.
    #[error("Mask index {index} out of range for {len} masks")]
    MaskIndexOutOfRange {
        /// Requested index.
        index: usize,
        /// Number of masks available.
        len: usize,
    },

    /// The marginal probability of reading '0' is too close to one half to invert.
    #[error("Marginal P(0) = {p0} on qubit {qubit} is too close to 0.5 to invert")]
    DegenerateMarginal {
        /// Position within the inverted subset.
        qubit: usize,
        /// Observed marginal probability of '0'.
        p0: f64,
    },

    /// The second-order expansion does not converge.
    #[error("Error threshold exceeded: second-order zero-string weight {p} gives 2p - 1 <= 0")]
    ErrorThresholdExceeded {
        /// Zero-string weight of the first-order correction.
        p: f64,
    },

    /// A twirl target is neither a single circuit nor a batch.
    #[error("Unsupported container type '{0}': expected a circuit object or an array of circuits")]
    UnsupportedContainer(String),

    /// A distribution with zero total weight was used as a probability distribution.
    #[error("Distribution has zero total weight")]
    EmptyDistribution,

    /// An average over an empty list of results was requested.
    #[error("Cannot average over an empty batch of results")]
    EmptyBatch,

    /// Circuit construction failed.
    #[error("IR error: {0}")]
    Ir(#[from] IrError),

    /// Backend execution failed.
    #[error("Backend error: {0}")]
    Hal(#[from] HalError),

    /// Invalid run configuration.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),
}

impl MitigationError {
    pub(crate) fn shape(context: impl Into<String>, expected: usize, got: usize) -> Self {
        MitigationError::ShapeMismatch {
            context: context.into(),
            expected,
            got,
        }
    }
}

/// Result type for mitigation operations.
pub type MitigationResult<T> = Result<T, MitigationError>;
