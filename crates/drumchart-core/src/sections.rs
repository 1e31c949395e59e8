//! Intensity-section discovery for stream conversion.
//!
//! Effect markers toggle "intensity" on and off. When stream conversion
//! is enabled, each on/off pair becomes an [`IntensitySection`] that the
//! generator fills with a continuous quarter-beat stream. Marker times
//! are often placed off-beat to control visual effects, so both ends are
//! snapped to the whole-beat grid before use; a section that would start
//! on an off-beat divisor would knock every following pattern off-beat.

use crate::control_points::ControlPointStore;
use crate::tempo::BeatLengths;

/// Minimum usable section length in milliseconds. Anything shorter is
/// not worth treating as a stream.
pub const MIN_SECTION_MS: f64 = 3000.0;

/// A derived start/end pair, owned by a single generation pass.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntensitySection {
    pub start_time: f64,
    pub end_time: f64,
}

/// The filtered, snapped sections of one chart, in marker order.
#[derive(Clone, Debug, Default)]
pub struct SectionMap {
    sections: Vec<IntensitySection>,
}

impl SectionMap {
    pub fn empty() -> Self {
        Self::default()
    }

    /// Pre-scan the store's effect markers into usable sections.
    ///
    /// Each intensity-on marker is paired with the first later off
    /// marker. A section that never switches off runs to `chart_end`
    /// unsnapped and skips the duration check. For all other sections the
    /// duration threshold is measured between the raw marker times, while
    /// the stored section uses the snapped times. The asymmetry is
    /// deliberate and load-bearing: snapping can move either end by up to
    /// half a beat, and the threshold has to judge the section the chart
    /// author actually wrote.
    pub fn locate(store: &ControlPointStore, chart_end: f64, double_bpm: bool) -> Self {
        let effects = store.effect_markers();
        let mut sections = Vec::new();

        for start in effects.iter().filter(|e| e.intensity) {
            let snapped_start = store.closest_snapped_time(start.time, 1);

            let Some(end) = effects
                .iter()
                .find(|e| e.time > start.time && !e.intensity)
            else {
                sections.push(IntensitySection {
                    start_time: snapped_start,
                    end_time: chart_end,
                });
                continue;
            };

            // A section has to last at least five whole beats (minus a
            // quarter-beat margin) or three seconds, whichever is longer,
            // judged at the tempo active where it starts.
            let marker = store.marker(store.timing_point_at(start.time));
            let beat = BeatLengths::derive(marker, double_bpm);
            let threshold = MIN_SECTION_MS.max(beat.whole * 5.0 - beat.quarter);

            if end.time - start.time >= threshold {
                sections.push(IntensitySection {
                    start_time: snapped_start,
                    end_time: store.closest_snapped_time(end.time, 1),
                });
            }
        }

        Self { sections }
    }

    /// The first section containing `time` (inclusive on both ends).
    pub fn containing(&self, time: f64) -> Option<&IntensitySection> {
        self.sections
            .iter()
            .find(|s| time >= s.start_time && time <= s.end_time)
    }

    /// The first section strictly ahead of `time`. Note the strict
    /// comparisons: a time sitting exactly on a section start is "inside"
    /// for [`containing`](Self::containing) but has no "next" section
    /// here. Unifying the two operators changes which hits get
    /// stream-converted at exact boundary timestamps.
    pub fn next_ahead(&self, time: f64) -> Option<&IntensitySection> {
        self.sections
            .iter()
            .find(|s| time < s.start_time && time < s.end_time)
    }

    pub fn is_inside(&self, time: f64) -> bool {
        self.containing(time).is_some()
    }

    pub fn sections(&self) -> &[IntensitySection] {
        &self.sections
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::control_points::{EffectMarker, TempoMarker};

    fn store(effects: Vec<EffectMarker>) -> ControlPointStore {
        // 120 BPM: whole beat 500ms.
        ControlPointStore::new(
            vec![TempoMarker {
                time: 0.0,
                beat_length: 500.0,
            }],
            effects,
        )
    }

    #[test]
    fn test_section_ends_are_snapped_to_whole_beats() {
        let store = store(vec![
            EffectMarker {
                time: 1_020.0,
                intensity: true,
            },
            EffectMarker {
                time: 5_960.0,
                intensity: false,
            },
        ]);
        let map = SectionMap::locate(&store, 60_000.0, false);

        assert_eq!(map.sections().len(), 1);
        let section = map.sections()[0];
        assert!((section.start_time - 1_000.0).abs() < 1e-9);
        assert!((section.end_time - 6_000.0).abs() < 1e-9);
    }

    #[test]
    fn test_short_sections_are_discarded() {
        // 2.9 seconds between the raw markers, under the 3s floor.
        let store = store(vec![
            EffectMarker {
                time: 1_000.0,
                intensity: true,
            },
            EffectMarker {
                time: 3_900.0,
                intensity: false,
            },
        ]);
        let map = SectionMap::locate(&store, 60_000.0, false);
        assert!(map.is_empty());
    }

    #[test]
    fn test_duration_check_uses_unsnapped_marker_times() {
        // Raw duration is 2_990ms (discarded) even though the snapped
        // section would span a full 3_000ms.
        let store = store(vec![
            EffectMarker {
                time: 1_010.0,
                intensity: true,
            },
            EffectMarker {
                time: 4_000.0,
                intensity: false,
            },
        ]);
        let map = SectionMap::locate(&store, 60_000.0, false);
        assert!(map.is_empty());
    }

    #[test]
    fn test_unterminated_section_runs_to_chart_end() {
        let store = store(vec![EffectMarker {
            time: 1_000.0,
            intensity: true,
        }]);
        let map = SectionMap::locate(&store, 2_000.0, false);

        // No duration check in the fallback: even a short tail section
        // is kept, ending at the chart end without snapping.
        assert_eq!(map.sections().len(), 1);
        assert_eq!(map.sections()[0].end_time, 2_000.0);
    }

    #[test]
    fn test_slow_tempo_raises_threshold_above_floor() {
        // 30 BPM: whole beat 2_000ms, so five beats minus a quarter is
        // 9_500ms, well above the 3s floor.
        let store = ControlPointStore::new(
            vec![TempoMarker {
                time: 0.0,
                beat_length: 2_000.0,
            }],
            vec![
                EffectMarker {
                    time: 2_000.0,
                    intensity: true,
                },
                EffectMarker {
                    time: 8_000.0,
                    intensity: false,
                },
                EffectMarker {
                    time: 20_000.0,
                    intensity: true,
                },
                EffectMarker {
                    time: 30_000.0,
                    intensity: false,
                },
            ],
        );
        let map = SectionMap::locate(&store, 60_000.0, false);

        // 6s section discarded, 10s section kept.
        assert_eq!(map.sections().len(), 1);
        assert_eq!(map.sections()[0].start_time, 20_000.0);
    }

    #[test]
    fn test_boundary_lookup_asymmetry() {
        let store = store(vec![
            EffectMarker {
                time: 1_000.0,
                intensity: true,
            },
            EffectMarker {
                time: 6_000.0,
                intensity: false,
            },
        ]);
        let map = SectionMap::locate(&store, 60_000.0, false);

        // Exactly on the start: inside, and no longer "ahead".
        assert!(map.containing(1_000.0).is_some());
        assert!(map.next_ahead(1_000.0).is_none());

        // Just before the start: not inside, but ahead.
        assert!(map.containing(999.9).is_none());
        assert!(map.next_ahead(999.9).is_some());

        // Exactly on the end: still inside.
        assert!(map.containing(6_000.0).is_some());
    }
}
