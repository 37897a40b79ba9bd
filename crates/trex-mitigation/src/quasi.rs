//! Quasi-probability inverse of symmetric readout noise.
//!
//! Twirled readout noise on `n` qubits is modelled as independent symmetric
//! bit flips: measuring bit `j` is an XOR with `p0·δ(0) + (1 − p0)·δ(1)` where
//! `p0` is the probability that a prepared `0` reads as `0`. That channel has
//! the signed inverse `(p0·δ(0) − (1 − p0)·δ(1)) / (2·p0 − 1)` under
//! XOR-convolution. The first-order inverse is the tensor product of the
//! per-qubit inverses, built from the single-qubit marginals of a reference
//! distribution measured on the all-zero state.
//!
//! The second-order step corrects for correlations the product model misses:
//! with `C = Q ⊛ R` and `p = C[0…0]`, the correction
//! `T = γ₂·(p·δ(0) − (C − p·δ(0)))` with `γ₂ = 1 / (2p − 1)` is convolved
//! into `Q`.

use serde::Serialize;
use tracing::{debug, instrument, warn};

use crate::distribution::Distribution;
use crate::error::{MitigationError, MitigationResult};

/// Values of `|2·p0 − 1|` below this are treated as uninvertible.
pub const DEGENERACY_TOLERANCE: f64 = 1e-12;

/// A signed inverse distribution plus its gamma factors.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuasiDistribution {
    quasi: Distribution,
    gammas: Vec<f64>,
}

impl QuasiDistribution {
    /// The signed weights.
    pub fn quasi(&self) -> &Distribution {
        &self.quasi
    }

    /// One gamma per qubit, plus one more for a second-order build.
    pub fn gammas(&self) -> &[f64] {
        &self.gammas
    }

    /// Key width in bits.
    pub fn width(&self) -> usize {
        self.quasi.width()
    }

    /// Product of all gamma factors.
    pub fn gamma_product(&self) -> f64 {
        self.gammas.iter().product()
    }

    /// Multiplicative shot overhead of estimating with this inverse: the
    /// squared 1-norm of the quasi-distribution.
    pub fn sampling_overhead(&self) -> f64 {
        self.quasi.one_norm().powi(2)
    }

    /// Correct a measured distribution: `dist ⊛ Q`.
    pub fn apply(&self, dist: &Distribution) -> MitigationResult<Distribution> {
        dist.xor_convolve(&self.quasi)
    }
}

/// Build the inverse quasi-distribution for `reference`.
///
/// `reference` is normalized first, so raw counts are accepted. A zero-total
/// reference gives [`MitigationError::EmptyDistribution`].
#[instrument(skip(reference), fields(width = reference.width()))]
pub fn build_quasi_distribution(
    reference: &Distribution,
    second_order: bool,
) -> MitigationResult<QuasiDistribution> {
    let reference = reference.normalized()?;
    let width = reference.width();
    let zero = "0".repeat(width);

    let mut quasi = Distribution::point(&zero)?;
    let mut gammas = Vec::with_capacity(width + usize::from(second_order));

    for qubit in 0..width {
        let p0 = reference.bit_zero_probability(qubit);
        let denom = 2.0 * p0 - 1.0;
        if denom.abs() < DEGENERACY_TOLERANCE {
            return Err(MitigationError::DegenerateMarginal { qubit, p0 });
        }
        let gamma = 1.0 / denom;
        if gamma < 0.0 {
            warn!(qubit, p0, gamma, "readout is worse than random; inverse flips the sign");
        }

        let mut next = Distribution::new(width);
        for (key, weight) in quasi.iter() {
            next.accumulate(with_bit(key, qubit, b'0'), weight * p0 * gamma);
            next.accumulate(with_bit(key, qubit, b'1'), -weight * (1.0 - p0) * gamma);
        }
        quasi = next;
        gammas.push(gamma);
    }

    if second_order {
        let composed = quasi.xor_convolve(&reference)?;
        let p = composed.get(&zero);
        if 2.0 * p - 1.0 <= 0.0 {
            return Err(MitigationError::ErrorThresholdExceeded { p });
        }
        let gamma = 1.0 / (2.0 * p - 1.0);

        let mut correction = Distribution::new(width);
        for (key, weight) in composed.iter() {
            let sign = if key == zero { 1.0 } else { -1.0 };
            correction.accumulate(key.to_string(), gamma * weight * sign);
        }
        quasi = correction.xor_convolve(&quasi)?;
        gammas.push(gamma);
    }

    debug!(
        entries = quasi.len(),
        gamma_product = gammas.iter().product::<f64>(),
        "built quasi-distribution"
    );
    Ok(QuasiDistribution { quasi, gammas })
}

fn with_bit(key: &str, position: usize, bit: u8) -> String {
    let mut bytes = key.as_bytes().to_vec();
    bytes[position] = bit;
    bytes.into_iter().map(char::from).collect()
}
