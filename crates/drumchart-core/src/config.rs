//! Generator configuration.
//!
//! A [`GeneratorConfig`] is a read-only snapshot for one generation run.
//! Seeds may be absent; [`GeneratorConfig::resolve_seeds`] replaces each
//! missing one with a freshly drawn value and writes it back, so a run
//! started without chosen seeds is still reproducible afterwards. The
//! generator core itself only ever sees the concrete [`Seeds`].

use rand::Rng;
use serde::{Deserialize, Serialize};

/// Longest pattern length that a single run may roll.
///
/// Lengths are always odd. `Unlimited` degenerates every run to a single
/// hit and removes the half-beat rest between runs, producing one
/// continuous quarter-beat stream.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PatternLength {
    One,
    Three,
    Five,
    #[default]
    Seven,
    Nine,
    Eleven,
    Unlimited,
}

impl PatternLength {
    pub fn is_unlimited(self) -> bool {
        matches!(self, PatternLength::Unlimited)
    }

    /// Upper bound for the pattern-length roll. `Unlimited` is treated as
    /// a single hit; the run spacing handles the rest.
    pub fn max_len(self) -> usize {
        match self {
            PatternLength::One | PatternLength::Unlimited => 1,
            PatternLength::Three => 3,
            PatternLength::Five => 5,
            PatternLength::Seven => 7,
            PatternLength::Nine => 9,
            PatternLength::Eleven => 11,
        }
    }

    /// Parse a numeric odd length; `0` means unlimited.
    pub fn from_length(len: u32) -> Option<Self> {
        match len {
            0 => Some(PatternLength::Unlimited),
            1 => Some(PatternLength::One),
            3 => Some(PatternLength::Three),
            5 => Some(PatternLength::Five),
            7 => Some(PatternLength::Seven),
            9 => Some(PatternLength::Nine),
            11 => Some(PatternLength::Eleven),
            _ => None,
        }
    }
}

/// Concrete seeds for the four independent random streams of one run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Seeds {
    pub colour: u64,
    pub pattern_length: u64,
    pub insertion: u64,
    pub triplet_colour: u64,
}

/// Read-only input for one generation run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    pub pattern_length: PatternLength,

    pub colour_seed: Option<u64>,
    pub pattern_length_seed: Option<u64>,
    pub insertion_seed: Option<u64>,
    pub triplet_colour_seed: Option<u64>,

    /// Longest allowed run of identical colours, or `None` for unlimited.
    pub max_consecutive_monocolours: Option<u32>,

    /// Fill intensity sections with continuous quarter-beat streams.
    pub stream_conversion: bool,
    /// Generate at double the chart's tempo.
    pub double_bpm: bool,

    /// Occasionally replace a quarter-beat slot with a sixth-beat triplet.
    pub insert_triplets: bool,
    /// Per-hit probability of a triplet insertion, clamped to `[0, 0.5]`.
    pub triplet_insertion_chance: f64,
    /// Extend an inserted triplet by three more hits at half probability.
    pub longer_triplets: bool,

    /// Force a colour change on the hit that starts a triplet.
    pub invert_colour_on_rhythm_change_start: bool,
    /// Force a colour change on the first regular hit after a triplet.
    pub invert_colour_after_rhythm_change: bool,

    /// Rim share of generated colours, in `[0, 1]`.
    pub rim_ratio: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            pattern_length: PatternLength::default(),
            colour_seed: None,
            pattern_length_seed: None,
            insertion_seed: None,
            triplet_colour_seed: None,
            max_consecutive_monocolours: None,
            stream_conversion: false,
            double_bpm: false,
            insert_triplets: false,
            triplet_insertion_chance: 0.05,
            longer_triplets: false,
            invert_colour_on_rhythm_change_start: true,
            invert_colour_after_rhythm_change: true,
            rim_ratio: 0.5,
        }
    }
}

impl GeneratorConfig {
    /// Fill in any missing seed with a freshly drawn one and return the
    /// concrete set. The drawn values are persisted on the config so the
    /// next run with the same config reproduces this one.
    pub fn resolve_seeds(&mut self) -> Seeds {
        let mut source = rand::rng();
        Seeds {
            colour: *self.colour_seed.get_or_insert_with(|| source.random()),
            pattern_length: *self
                .pattern_length_seed
                .get_or_insert_with(|| source.random()),
            insertion: *self.insertion_seed.get_or_insert_with(|| source.random()),
            triplet_colour: *self
                .triplet_colour_seed
                .get_or_insert_with(|| source.random()),
        }
    }

    /// The monocolour limit with the zero value coerced to one. A limit
    /// of zero is meaningless (every hit would invert) and the original
    /// settings surface silently bumped it.
    pub fn max_monocolours(&self) -> Option<u32> {
        self.max_consecutive_monocolours.map(|m| m.max(1))
    }

    /// Insertion chance clamped to its valid range.
    pub fn triplet_chance(&self) -> f64 {
        self.triplet_insertion_chance.clamp(0.0, 0.5)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pattern_length_bounds() {
        assert_eq!(PatternLength::Seven.max_len(), 7);
        assert_eq!(PatternLength::Unlimited.max_len(), 1);
        assert!(PatternLength::Unlimited.is_unlimited());
        assert_eq!(PatternLength::from_length(9), Some(PatternLength::Nine));
        assert_eq!(PatternLength::from_length(0), Some(PatternLength::Unlimited));
        assert_eq!(PatternLength::from_length(4), None);
    }

    #[test]
    fn test_resolve_seeds_persists_drawn_values() {
        let mut config = GeneratorConfig {
            colour_seed: Some(42),
            ..GeneratorConfig::default()
        };

        let first = config.resolve_seeds();
        assert_eq!(first.colour, 42);
        assert_eq!(config.pattern_length_seed, Some(first.pattern_length));

        // A second resolution returns the now-persisted seeds unchanged.
        let second = config.resolve_seeds();
        assert_eq!(first, second);
    }

    #[test]
    fn test_zero_monocolour_limit_coerced_to_one() {
        let config = GeneratorConfig {
            max_consecutive_monocolours: Some(0),
            ..GeneratorConfig::default()
        };
        assert_eq!(config.max_monocolours(), Some(1));

        let unlimited = GeneratorConfig::default();
        assert_eq!(unlimited.max_monocolours(), None);
    }

    #[test]
    fn test_triplet_chance_clamped() {
        let config = GeneratorConfig {
            triplet_insertion_chance: 0.9,
            ..GeneratorConfig::default()
        };
        assert_eq!(config.triplet_chance(), 0.5);
    }
}
