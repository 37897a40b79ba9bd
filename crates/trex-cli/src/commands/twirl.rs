//! Twirl command implementation.

use anyhow::Result;
use rand::SeedableRng;
use rand::rngs::SmallRng;

use trex_mitigation::{TwirlTarget, apply_readout_twirl};

use super::common::{load_json, write_output};

/// Execute the twirl command.
pub fn execute(input: &str, samples: usize, seed: Option<u64>, output: Option<&str>) -> Result<()> {
    let target = TwirlTarget::from_json(load_json(input)?)?;
    let mut rng = match seed {
        Some(seed) => SmallRng::seed_from_u64(seed),
        None => SmallRng::from_entropy(),
    };

    let twirled = apply_readout_twirl(&target, samples, &mut rng)?;
    write_output(&serde_json::to_string_pretty(&twirled)?, output)
}
