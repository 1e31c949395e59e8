//! Tempo tracking during a generation pass.
//!
//! [`BeatLengths`] derives the four usable subdivisions from a tempo
//! marker, and [`TempoCursor`] tracks which marker is active at the
//! generation cursor, detecting boundary crossings between hits.

use crate::control_points::{ControlPointStore, TempoMarker};

/// The beat subdivisions the generator places hits on.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BeatLengths {
    /// One whole beat (1/1) in milliseconds.
    pub whole: f64,
    pub half: f64,
    pub quarter: f64,
    pub sixth: f64,
}

impl BeatLengths {
    /// Derive subdivisions from a marker, optionally at double tempo.
    pub fn derive(marker: &TempoMarker, double_bpm: bool) -> Self {
        let whole = if double_bpm {
            marker.beat_length / 2.0
        } else {
            marker.beat_length
        };
        Self {
            whole,
            half: whole / 2.0,
            quarter: whole / 4.0,
            sixth: whole / 6.0,
        }
    }
}

/// Tracks the active tempo marker at the generation cursor.
///
/// Holds two marker indices: the currently active one, and a snapshot
/// taken when the previous hit was created. Comparing the two answers
/// "has the tempo changed since the last hit" without cloning markers.
#[derive(Clone, Copy, Debug)]
pub struct TempoCursor {
    current: usize,
    last_used: usize,
}

impl TempoCursor {
    pub fn new(store: &ControlPointStore, time: f64) -> Self {
        let index = store.timing_point_at(time);
        Self {
            current: index,
            last_used: index,
        }
    }

    /// The currently active marker.
    pub fn marker<'a>(&self, store: &'a ControlPointStore) -> &'a TempoMarker {
        store.marker(self.current)
    }

    /// Record the active marker as "the one the previous hit used".
    pub fn snapshot(&mut self) {
        self.last_used = self.current;
    }

    /// Whether the active marker differs from the last snapshot.
    pub fn changed_since_snapshot(&self) -> bool {
        self.current != self.last_used
    }

    /// Re-resolve the active marker at `time`. Returns true if a boundary
    /// was crossed (and the cursor now points at the new marker).
    pub fn refresh(&mut self, store: &ControlPointStore, time: f64) -> bool {
        let index = store.timing_point_at(time);
        if index != self.current {
            self.current = index;
            true
        } else {
            false
        }
    }

    /// Whether a different marker becomes active within `horizon`
    /// milliseconds after `time`.
    pub fn will_change_within(&self, store: &ControlPointStore, time: f64, horizon: f64) -> bool {
        store.timing_point_at(time + horizon) != self.current
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store() -> ControlPointStore {
        ControlPointStore::new(
            vec![
                TempoMarker {
                    time: 0.0,
                    beat_length: 600.0,
                },
                TempoMarker {
                    time: 5_000.0,
                    beat_length: 300.0,
                },
            ],
            vec![],
        )
    }

    #[test]
    fn test_beat_lengths_subdivisions() {
        let marker = TempoMarker {
            time: 0.0,
            beat_length: 600.0,
        };
        let beat = BeatLengths::derive(&marker, false);
        assert_eq!(beat.whole, 600.0);
        assert_eq!(beat.half, 300.0);
        assert_eq!(beat.quarter, 150.0);
        assert_eq!(beat.sixth, 100.0);

        let doubled = BeatLengths::derive(&marker, true);
        assert_eq!(doubled.whole, 300.0);
        assert_eq!(doubled.quarter, 75.0);
    }

    #[test]
    fn test_cursor_detects_boundary() {
        let store = store();
        let mut cursor = TempoCursor::new(&store, 0.0);

        cursor.snapshot();
        assert!(!cursor.refresh(&store, 4_999.0));
        assert!(!cursor.changed_since_snapshot());

        assert!(cursor.refresh(&store, 5_000.0));
        assert!(cursor.changed_since_snapshot());
        assert_eq!(cursor.marker(&store).beat_length, 300.0);

        cursor.snapshot();
        assert!(!cursor.changed_since_snapshot());
    }

    #[test]
    fn test_will_change_within_horizon() {
        let store = store();
        let cursor = TempoCursor::new(&store, 0.0);
        assert!(!cursor.will_change_within(&store, 3_000.0, 1_000.0));
        assert!(cursor.will_change_within(&store, 4_500.0, 1_200.0));
    }
}
