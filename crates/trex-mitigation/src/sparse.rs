//! Mitigated Pauli expectation values from twirled results.

use std::sync::{Arc, Mutex, PoisonError};

use rustc_hash::FxHashMap;
use tracing::{debug, instrument};
use trex_hal::Counts;
use trex_ir::PauliString;

use crate::distribution::Distribution;
use crate::error::{MitigationError, MitigationResult};
use crate::mask::FlipMask;
use crate::quasi::{QuasiDistribution, build_quasi_distribution};

type QuasiCache = FxHashMap<Vec<usize>, Arc<QuasiDistribution>>;

/// Corrects Pauli expectation values using a calibrated readout reference.
///
/// The reference distribution is measured on the twirled all-zero state.
/// For each Pauli string only the marginal on its non-identity positions is
/// corrected, with an inverse built from the reference marginal on the same
/// positions. Inverses are cached per position set for the lifetime of the
/// mitigator; calibrating again means creating a new mitigator.
///
/// X and Y labels are treated like Z: results must already be measured in
/// the matching basis.
pub struct SparseReadoutMitigator {
    reference: Distribution,
    second_order: bool,
    cache: Mutex<QuasiCache>,
}

impl SparseReadoutMitigator {
    /// Create a mitigator from a reference distribution (counts or probabilities).
    pub fn new(reference: &Distribution, second_order: bool) -> MitigationResult<Self> {
        Ok(Self {
            reference: reference.normalized()?,
            second_order,
            cache: Mutex::new(FxHashMap::default()),
        })
    }

    /// Create a mitigator from reference counts.
    pub fn from_counts(reference: &Counts, second_order: bool) -> MitigationResult<Self> {
        Self::new(&Distribution::from_counts(reference)?, second_order)
    }

    /// Register width.
    pub fn width(&self) -> usize {
        self.reference.width()
    }

    /// The normalized reference distribution.
    pub fn reference(&self) -> &Distribution {
        &self.reference
    }

    /// Whether inverses are built to second order.
    pub fn second_order(&self) -> bool {
        self.second_order
    }

    /// The inverse for a sorted set of positions, built on first use.
    pub fn quasi_for(&self, positions: &[usize]) -> MitigationResult<Arc<QuasiDistribution>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(quasi) = cache.get(positions) {
            debug!(?positions, "quasi-distribution cache hit");
            return Ok(Arc::clone(quasi));
        }

        let marginal = self.reference.marginal(positions)?;
        let quasi = Arc::new(build_quasi_distribution(&marginal, self.second_order)?);
        cache.insert(positions.to_vec(), Arc::clone(&quasi));
        Ok(quasi)
    }

    /// Position sets with a cached inverse, sorted.
    pub fn cached_subsets(&self) -> Vec<Vec<usize>> {
        let cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        let mut subsets: Vec<_> = cache.keys().cloned().collect();
        subsets.sort();
        subsets
    }

    /// Mitigated expectation of `pauli` on one twirled result.
    ///
    /// `result` is un-twirled with `bit_masks[index]` and normalized. An
    /// all-identity string returns the total weight (1) without building an
    /// inverse.
    #[instrument(skip_all, fields(pauli = %pauli, index = index))]
    pub fn process_single(
        &self,
        result: &Distribution,
        index: usize,
        pauli: &PauliString,
        bit_masks: &[FlipMask],
    ) -> MitigationResult<f64> {
        let untwirled = self.untwirled(result, index, pauli, bit_masks)?;
        let positions = pauli.non_trivial_positions();
        if positions.is_empty() {
            return Ok(untwirled.total());
        }

        let marginal = untwirled.marginal(&positions)?;
        let quasi = self.quasi_for(&positions)?;
        Ok(quasi.apply(&marginal)?.parity_expectation())
    }

    /// Unmitigated expectation of `pauli` on one twirled result: the parity
    /// average after un-twirling, with no inverse applied.
    pub fn raw_single(
        &self,
        result: &Distribution,
        index: usize,
        pauli: &PauliString,
        bit_masks: &[FlipMask],
    ) -> MitigationResult<f64> {
        let untwirled = self.untwirled(result, index, pauli, bit_masks)?;
        Ok(untwirled
            .marginal(&pauli.non_trivial_positions())?
            .parity_expectation())
    }

    /// Mean of [`process_single`](Self::process_single) over a batch.
    ///
    /// `indices[i]` selects the mask for `results[i]`.
    pub fn process_multiple(
        &self,
        results: &[Distribution],
        indices: &[usize],
        pauli: &PauliString,
        bit_masks: &[FlipMask],
    ) -> MitigationResult<f64> {
        self.batch_mean(results, indices, |result, index| {
            self.process_single(result, index, pauli, bit_masks)
        })
    }

    /// Mean of [`raw_single`](Self::raw_single) over a batch.
    pub fn raw_multiple(
        &self,
        results: &[Distribution],
        indices: &[usize],
        pauli: &PauliString,
        bit_masks: &[FlipMask],
    ) -> MitigationResult<f64> {
        self.batch_mean(results, indices, |result, index| {
            self.raw_single(result, index, pauli, bit_masks)
        })
    }

    /// Mitigated expectation of a weighted sum of Pauli strings.
    pub fn process_observable(
        &self,
        terms: &[(f64, PauliString)],
        results: &[Distribution],
        indices: &[usize],
        bit_masks: &[FlipMask],
    ) -> MitigationResult<f64> {
        terms
            .iter()
            .try_fold(0.0, |acc, (coefficient, pauli)| -> MitigationResult<f64> {
                Ok(acc + coefficient * self.process_multiple(results, indices, pauli, bit_masks)?)
            })
    }

    fn batch_mean(
        &self,
        results: &[Distribution],
        indices: &[usize],
        mut single: impl FnMut(&Distribution, usize) -> MitigationResult<f64>,
    ) -> MitigationResult<f64> {
        if results.len() != indices.len() {
            return Err(MitigationError::shape(
                "mask indices for results",
                results.len(),
                indices.len(),
            ));
        }
        if results.is_empty() {
            return Err(MitigationError::EmptyBatch);
        }
        let mut sum = 0.0;
        for (result, &index) in results.iter().zip(indices) {
            sum += single(result, index)?;
        }
        Ok(sum / results.len() as f64)
    }

    fn untwirled(
        &self,
        result: &Distribution,
        index: usize,
        pauli: &PauliString,
        bit_masks: &[FlipMask],
    ) -> MitigationResult<Distribution> {
        let width = self.width();
        if pauli.len() != width {
            return Err(MitigationError::shape("pauli string", width, pauli.len()));
        }
        if result.width() != width {
            return Err(MitigationError::shape("result width", width, result.width()));
        }
        let mask = bit_masks
            .get(index)
            .ok_or(MitigationError::MaskIndexOutOfRange {
                index,
                len: bit_masks.len(),
            })?;
        result.xor_mask(mask)?.normalized()
    }
}
