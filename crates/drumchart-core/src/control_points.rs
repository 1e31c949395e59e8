//! Externally supplied tempo and effect markers, queryable by time.
//!
//! The generator never owns these; it consumes them through a
//! [`ControlPointStore`] built once per chart. Markers are value types
//! and the store keeps them sorted by time so "active marker at T" is
//! well defined.

use serde::{Deserialize, Serialize};

/// Beat length used when a chart carries no tempo markers at all.
pub const DEFAULT_BEAT_LENGTH: f64 = 1000.0;

/// A tempo marker: from `time` onwards one whole beat lasts `beat_length`
/// milliseconds.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct TempoMarker {
    pub time: f64,
    pub beat_length: f64,
}

/// An effect marker toggling an intensity section on or off.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct EffectMarker {
    pub time: f64,
    pub intensity: bool,
}

/// Sorted, read-only view over a chart's tempo and effect markers.
#[derive(Clone, Debug)]
pub struct ControlPointStore {
    timing: Vec<TempoMarker>,
    effects: Vec<EffectMarker>,
}

impl ControlPointStore {
    /// Build a store from raw marker lists, sorting them by time.
    ///
    /// An empty tempo list is replaced by a single default marker at time
    /// zero, so the store can always answer tempo queries.
    pub fn new(mut timing: Vec<TempoMarker>, mut effects: Vec<EffectMarker>) -> Self {
        if timing.is_empty() {
            timing.push(TempoMarker {
                time: 0.0,
                beat_length: DEFAULT_BEAT_LENGTH,
            });
        }
        timing.sort_by(|a, b| a.time.total_cmp(&b.time));
        effects.sort_by(|a, b| a.time.total_cmp(&b.time));
        Self { timing, effects }
    }

    /// Index of the tempo marker active at `time`: the last marker at or
    /// before it, falling back to the first marker for times that precede
    /// them all.
    pub fn timing_point_at(&self, time: f64) -> usize {
        self.timing
            .iter()
            .rposition(|m| m.time <= time)
            .unwrap_or(0)
    }

    /// The tempo marker at a previously obtained index.
    pub fn marker(&self, index: usize) -> &TempoMarker {
        &self.timing[index]
    }

    pub fn timing_markers(&self) -> &[TempoMarker] {
        &self.timing
    }

    pub fn effect_markers(&self) -> &[EffectMarker] {
        &self.effects
    }

    /// Snap `time` to the closest beat-grid position of the tempo active
    /// there, with the grid subdivided `divisor` times per whole beat.
    pub fn closest_snapped_time(&self, time: f64, divisor: u32) -> f64 {
        let marker = self.marker(self.timing_point_at(time));
        let step = marker.beat_length / divisor.max(1) as f64;
        let beats = ((time - marker.time) / step).round();
        marker.time + beats * step
    }
}
