//! Weighted random colour selection.

use rand::Rng;

use crate::chart::HitColour;
use crate::error::{GeneratorError, Result};

/// Colour weights derived from the configured centre/rim ratio.
///
/// The rim weight is the ratio itself, clamped to `[0, 1]`; the centre
/// weight is the remainder. Weights carry no other state, so they can be
/// rebuilt from the ratio whenever configuration changes between runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ColourWeights {
    centre: f64,
    rim: f64,
}

impl ColourWeights {
    pub fn from_ratio(rim_ratio: f64) -> Self {
        let rim = rim_ratio.clamp(0.0, 1.0);
        Self {
            centre: 1.0 - rim,
            rim,
        }
    }

    /// Draw one colour. A uniform draw in `[0, centre + rim)` is walked
    /// across the two weights; falling past both is an invariant
    /// violation (malformed weights) and fails loudly rather than
    /// defaulting to either colour.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R) -> Result<HitColour> {
        let weights = [(HitColour::Centre, self.centre), (HitColour::Rim, self.rim)];
        let total: f64 = weights.iter().map(|(_, w)| w).sum();
        let mut threshold = rng.random::<f64>() * total;

        for (colour, weight) in weights {
            if threshold < weight {
                return Ok(colour);
            }
            threshold -= weight;
        }

        Err(GeneratorError::ColourSelection {
            centre: self.centre,
            rim: self.rim,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_extreme_ratios_force_one_colour() {
        let mut rng = StdRng::seed_from_u64(7);
        let all_rim = ColourWeights::from_ratio(1.0);
        let all_centre = ColourWeights::from_ratio(0.0);
        for _ in 0..100 {
            assert_eq!(all_rim.select(&mut rng).unwrap(), HitColour::Rim);
            assert_eq!(all_centre.select(&mut rng).unwrap(), HitColour::Centre);
        }
    }

    #[test]
    fn test_ratio_out_of_range_is_clamped() {
        assert_eq!(ColourWeights::from_ratio(3.0), ColourWeights::from_ratio(1.0));
        assert_eq!(ColourWeights::from_ratio(-1.0), ColourWeights::from_ratio(0.0));
    }

    #[test]
    fn test_empirical_fraction_converges_to_ratio() {
        let ratio = 0.7;
        let weights = ColourWeights::from_ratio(ratio);
        let mut rng = StdRng::seed_from_u64(1234);

        let samples = 20_000;
        let rims = (0..samples)
            .filter(|_| weights.select(&mut rng).unwrap() == HitColour::Rim)
            .count();

        let fraction = rims as f64 / samples as f64;
        assert!(
            (fraction - ratio).abs() < 0.02,
            "fraction {fraction} too far from ratio {ratio}"
        );
    }

    #[test]
    fn test_same_seed_draws_identically() {
        let weights = ColourWeights::from_ratio(0.4);
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..200 {
            assert_eq!(
                weights.select(&mut a).unwrap(),
                weights.select(&mut b).unwrap()
            );
        }
    }

    #[test]
    fn test_malformed_weights_fail_loudly() {
        let weights = ColourWeights::from_ratio(f64::NAN);
        let mut rng = StdRng::seed_from_u64(0);
        assert!(weights.select(&mut rng).is_err());
    }
}
