//! Un-twirling and aggregation of twirled measurement results.

use trex_hal::Counts;

use crate::distribution::Distribution;
use crate::error::{MitigationError, MitigationResult};
use crate::mask::FlipMask;

/// Undo a twirl: XOR every key of `dist` with `mask`.
pub fn untwirl(dist: &Distribution, mask: &FlipMask) -> MitigationResult<Distribution> {
    dist.xor_mask(mask)
}

/// Incremental accumulator for twirled samples of one circuit.
///
/// Each sample is un-twirled with its own mask and summed. The result is
/// independent of the order in which samples are added.
#[derive(Debug, Clone, Default)]
pub struct TwirlAggregator {
    totals: Option<Distribution>,
    shots: u64,
    samples: usize,
}

impl TwirlAggregator {
    /// Create an empty aggregator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Un-twirl one sample and add it.
    pub fn add(&mut self, counts: &Counts, mask: &FlipMask) -> MitigationResult<()> {
        self.add_distribution(&Distribution::from_counts(counts)?, mask)
    }

    /// Like [`add`](Self::add) for weighted (possibly fractional) results.
    ///
    /// A rejected sample leaves the aggregator unchanged. An empty sample is
    /// still checked against the register width through its mask.
    pub fn add_distribution(&mut self, dist: &Distribution, mask: &FlipMask) -> MitigationResult<()> {
        let untwirled = if dist.is_empty() {
            Distribution::new(mask.width())
        } else {
            untwirl(dist, mask)?
        };
        if let Some(totals) = &self.totals {
            if totals.width() != untwirled.width() {
                return Err(MitigationError::shape(
                    "aggregated sample width",
                    totals.width(),
                    untwirled.width(),
                ));
            }
        }

        let totals = self
            .totals
            .get_or_insert_with(|| Distribution::new(untwirled.width()));
        for (key, weight) in untwirled.iter() {
            totals.accumulate(key.to_string(), weight);
        }
        self.shots += untwirled.total().round() as u64;
        self.samples += 1;
        Ok(())
    }

    /// Summed un-twirled weights.
    pub fn counts(&self) -> Distribution {
        self.totals.clone().unwrap_or_default()
    }

    /// Summed weights divided by the total over all samples.
    pub fn probabilities(&self) -> MitigationResult<Distribution> {
        self.totals
            .as_ref()
            .ok_or(MitigationError::EmptyDistribution)?
            .normalized()
    }

    /// Total shots seen.
    pub fn shots(&self) -> u64 {
        self.shots
    }

    /// Number of samples added.
    pub fn samples(&self) -> usize {
        self.samples
    }
}

/// Un-twirl and sum `(counts, mask)` pairs, returning probabilities.
pub fn aggregate_twirled<'a>(
    pairs: impl IntoIterator<Item = (&'a Counts, &'a FlipMask)>,
) -> MitigationResult<Distribution> {
    let mut aggregator = TwirlAggregator::new();
    for (counts, mask) in pairs {
        aggregator.add(counts, mask)?;
    }
    aggregator.probabilities()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(s: &str) -> FlipMask {
        s.parse().unwrap()
    }

    #[test]
    fn test_untwirl_zero_mask_is_identity() {
        let d = Distribution::from_weights([("01", 0.25), ("10", 0.75)]).unwrap();
        assert_eq!(untwirl(&d, &FlipMask::zeros(2)).unwrap(), d);
    }

    #[test]
    fn test_aggregate_two_samples() {
        // Mostly |01> once each sample's twirl is undone.
        let a = Counts::from_pairs([("01", 60), ("11", 40)]);
        let b = Counts::from_pairs([("11", 70), ("01", 30)]);
        let (ma, mb) = (mask("IZ"), mask("XI"));

        let mut agg = TwirlAggregator::new();
        agg.add(&a, &ma).unwrap();
        agg.add(&b, &mb).unwrap();

        assert_eq!(agg.samples(), 2);
        assert_eq!(agg.shots(), 200);
        let counts = agg.counts();
        assert_eq!(counts.get("01"), 130.0);
        assert_eq!(counts.get("11"), 70.0);
        let probs = agg.probabilities().unwrap();
        assert!((probs.get("01") - 0.65).abs() < 1e-12);
    }

    #[test]
    fn test_mask_length_mismatch_fails() {
        let counts = Counts::from_pairs([("010", 5)]);
        let err = aggregate_twirled([(&counts, &mask("01"))]).unwrap_err();
        assert!(matches!(
            err,
            MitigationError::ShapeMismatch {
                expected: 3,
                got: 2,
                ..
            }
        ));
    }

    #[test]
    fn test_sample_width_mismatch_fails() {
        let mut agg = TwirlAggregator::new();
        agg.add(&Counts::from_pairs([("01", 1)]), &mask("00")).unwrap();
        assert!(agg
            .add(&Counts::from_pairs([("011", 1)]), &mask("000"))
            .is_err());
    }

    #[test]
    fn test_rejected_sample_is_not_counted() {
        let mut agg = TwirlAggregator::new();
        agg.add(&Counts::from_pairs([("01", 4)]), &mask("00")).unwrap();

        assert!(agg.add(&Counts::from_pairs([("010", 1)]), &mask("00")).is_err());
        assert!(agg.add(&Counts::new(), &mask("0000000")).is_err());
        assert_eq!(agg.samples(), 1);
        assert_eq!(agg.shots(), 4);

        agg.add(&Counts::new(), &mask("11")).unwrap();
        assert_eq!(agg.samples(), 2);
        assert_eq!(agg.counts().get("01"), 4.0);
    }

    #[test]
    fn test_empty_aggregate() {
        assert!(matches!(
            aggregate_twirled(std::iter::empty::<(&Counts, &FlipMask)>()),
            Err(MitigationError::EmptyDistribution)
        ));
    }
}
