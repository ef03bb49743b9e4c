//! Utility functions for the Spikeport framework.
//!
//! Seeded generator construction shared by the connectors and the
//! spike-train generators.

use rand::rngs::StdRng;
use rand::SeedableRng;

/// Create a generator from an optional seed.
///
/// `None` draws the seed from operating-system entropy, so results are not
/// reproducible.
///
/// # Examples
///
/// ```
/// use spikeport::utils::rng_from_seed;
/// use rand::Rng;
///
/// let a: u64 = rng_from_seed(Some(7)).gen();
/// let b: u64 = rng_from_seed(Some(7)).gen();
/// assert_eq!(a, b);
/// ```
pub fn rng_from_seed(seed: Option<u64>) -> StdRng {
    match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    }
}
