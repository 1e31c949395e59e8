//! Online hit-timing statistics.
//!
//! Maintains running mean and sum-of-squared-deviation over the timing
//! offsets of scored events, using Welford's online algorithm, for the
//! combined stream and for each colour partition. Results resume
//! incrementally from a previous [`UnstableRateResult`] as long as the
//! event log only grew; any rewind forces a recompute from scratch.

use serde::{Deserialize, Serialize};

use crate::chart::HitColour;

/// One judged hit from a play session.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScoreEvent {
    /// How far off the player hit, in milliseconds (negative = early).
    pub time_offset: f64,
    /// Playback rate the offset was measured at. Offsets scale with the
    /// rate, so deviation values are normalised by it.
    pub gameplay_rate: f64,
    pub colour: HitColour,
    /// Whether this event's judgement counts toward timing statistics.
    pub counts: bool,
}

/// Incremental deviation state, returned by [`unstable_rate`] and passed
/// back in to process only the new tail of a growing event log.
///
/// The resume position relies on the events forming one consecutive
/// sequence from a single session; results from an old session must be
/// discarded when a new one starts.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct UnstableRateResult {
    event_count: usize,
    centre_count: usize,
    rim_count: usize,

    mean: f64,
    centre_mean: f64,
    rim_mean: f64,

    sum_sq: f64,
    centre_sum_sq: f64,
    rim_sum_sq: f64,
}

impl UnstableRateResult {
    /// Unstable rate over every qualifying event.
    pub fn overall(&self) -> f64 {
        Self::magnitude(self.sum_sq, self.event_count)
    }

    pub fn for_centre(&self) -> f64 {
        Self::magnitude(self.centre_sum_sq, self.centre_count)
    }

    pub fn for_rim(&self) -> f64 {
        Self::magnitude(self.rim_sum_sq, self.rim_count)
    }

    /// Raw running mean deviation of the combined stream.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    pub fn centre_mean(&self) -> f64 {
        self.centre_mean
    }

    pub fn rim_mean(&self) -> f64 {
        self.rim_mean
    }

    pub fn event_count(&self) -> usize {
        self.event_count
    }

    fn magnitude(sum_sq: f64, count: usize) -> f64 {
        if count == 0 {
            0.0
        } else {
            10.0 * (sum_sq / count as f64).sqrt()
        }
    }

    fn accumulate(&mut self, value: f64, colour: HitColour) {
        match colour {
            HitColour::Centre => {
                self.centre_count += 1;
                let next = self.centre_mean + (value - self.centre_mean) / self.centre_count as f64;
                self.centre_sum_sq += (value - self.centre_mean) * (value - next);
                self.centre_mean = next;
            }
            HitColour::Rim => {
                self.rim_count += 1;
                let next = self.rim_mean + (value - self.rim_mean) / self.rim_count as f64;
                self.rim_sum_sq += (value - self.rim_mean) * (value - next);
                self.rim_mean = next;
            }
        }

        self.event_count += 1;
        let next = self.mean + (value - self.mean) / self.event_count as f64;
        self.sum_sq += (value - self.mean) * (value - next);
        self.mean = next;
    }
}

/// Compute (or incrementally extend) the unstable rate over `events`.
///
/// Passing the previous call's result resumes from where it stopped. A
/// shorter event list than the one that produced `previous` means the
/// caller rewound, which resets the state and recomputes everything.
/// Returns `None` when no qualifying event exists; downstream consumers
/// must treat that as "not available", not as zero.
pub fn unstable_rate(
    events: &[ScoreEvent],
    previous: Option<UnstableRateResult>,
) -> Option<UnstableRateResult> {
    let mut result = previous.unwrap_or_default();

    if events.len() < result.event_count + 1 {
        result = UnstableRateResult::default();
    }

    for event in &events[result.event_count..] {
        if !event.counts {
            continue;
        }
        // Offsets scale with gameplay rate, so deviations are compared
        // in normalised time.
        result.accumulate(event.time_offset / event.gameplay_rate, event.colour);
    }

    if result.event_count == 0 {
        return None;
    }
    Some(result)
}

/// Average raw hit offset over qualifying events; negative means the
/// player hit early on average. `None` when nothing qualifies.
pub fn average_hit_error(events: &[ScoreEvent]) -> Option<f64> {
    mean_offset(events.iter().filter(|e| e.counts))
}

/// Average raw hit offset restricted to one colour partition.
pub fn average_hit_error_for(events: &[ScoreEvent], colour: HitColour) -> Option<f64> {
    mean_offset(events.iter().filter(|e| e.counts && e.colour == colour))
}

fn mean_offset<'a>(events: impl Iterator<Item = &'a ScoreEvent>) -> Option<f64> {
    let mut sum = 0.0;
    let mut count = 0usize;
    for event in events {
        sum += event.time_offset;
        count += 1;
    }
    if count == 0 {
        None
    } else {
        Some(sum / count as f64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn event(offset: f64, colour: HitColour) -> ScoreEvent {
        ScoreEvent {
            time_offset: offset,
            gameplay_rate: 1.0,
            colour,
            counts: true,
        }
    }

    #[test]
    fn test_no_qualifying_events_is_unavailable() {
        assert!(unstable_rate(&[], None).is_none());

        let ignored = ScoreEvent {
            counts: false,
            ..event(50.0, HitColour::Centre)
        };
        assert!(unstable_rate(&[ignored], None).is_none());
        assert!(average_hit_error(&[ignored]).is_none());
    }

    #[test]
    fn test_known_variance() {
        // Offsets +/-10 around a zero mean: population variance 100,
        // unstable rate 10 * sqrt(100) = 100.
        let events = [
            event(10.0, HitColour::Centre),
            event(-10.0, HitColour::Centre),
            event(10.0, HitColour::Rim),
            event(-10.0, HitColour::Rim),
        ];
        let result = unstable_rate(&events, None).unwrap();

        assert!((result.overall() - 100.0).abs() < 1e-9);
        assert!((result.for_centre() - 100.0).abs() < 1e-9);
        assert!((result.for_rim() - 100.0).abs() < 1e-9);
        assert!(result.mean().abs() < 1e-9);
        assert_eq!(result.event_count(), 4);
    }

    #[test]
    fn test_gameplay_rate_normalises_offsets() {
        let mut fast = event(30.0, HitColour::Centre);
        fast.gameplay_rate = 1.5;
        let result = unstable_rate(&[fast], None).unwrap();
        assert!((result.mean() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_incremental_extension_matches_full_recompute() {
        let events: Vec<ScoreEvent> = (0..40)
            .map(|i| {
                event(
                    (i as f64) * 1.7 - 20.0,
                    if i % 3 == 0 {
                        HitColour::Rim
                    } else {
                        HitColour::Centre
                    },
                )
            })
            .collect();

        let partial = unstable_rate(&events[..25], None);
        let resumed = unstable_rate(&events, partial).unwrap();
        let full = unstable_rate(&events, None).unwrap();

        assert!((resumed.overall() - full.overall()).abs() < 1e-9);
        assert!((resumed.for_rim() - full.for_rim()).abs() < 1e-9);
        assert_eq!(resumed.event_count(), full.event_count());
    }

    #[test]
    fn test_rewind_resets_and_recomputes() {
        let events: Vec<ScoreEvent> = (0..20)
            .map(|i| event(i as f64, HitColour::Centre))
            .collect();

        let long = unstable_rate(&events, None);
        // A shorter input than the state was built from forces a reset.
        let rewound = unstable_rate(&events[..8], long).unwrap();
        let scratch = unstable_rate(&events[..8], None).unwrap();

        assert_eq!(rewound, scratch);
    }

    #[test]
    fn test_average_hit_error_partitions() {
        let events = [
            event(-10.0, HitColour::Centre),
            event(30.0, HitColour::Rim),
            event(-20.0, HitColour::Centre),
        ];

        assert!((average_hit_error(&events).unwrap() - 0.0).abs() < 1e-9);
        assert!(
            (average_hit_error_for(&events, HitColour::Centre).unwrap() + 15.0).abs() < 1e-9
        );
        assert!((average_hit_error_for(&events, HitColour::Rim).unwrap() - 30.0).abs() < 1e-9);
    }
}
