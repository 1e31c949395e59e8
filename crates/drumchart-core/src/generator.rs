//! The pattern generator: a single forward-time pass that replaces a
//! chart's hits with freshly rolled patterns.
//!
//! The generator walks from the first to the last anchor hit, rolling a
//! pattern length, placing quarter-beat-spaced hits, and resting half a
//! beat between runs. Intensity sections can override whole runs into
//! continuous streams, sixth-beat triplets can interrupt the quarter
//! grid, and tempo boundaries truncate runs and re-anchor the cursor.
//! All of that state lives in one call-local [`Generator`] value that is
//! dropped when the pass returns.

use std::collections::HashSet;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::chart::{Chart, Hit, HitColour};
use crate::colour::ColourWeights;
use crate::config::{GeneratorConfig, Seeds};
use crate::control_points::ControlPointStore;
use crate::error::Result;
use crate::sections::SectionMap;
use crate::tempo::{BeatLengths, TempoCursor};

/// Regenerate the chart's hit list in place.
///
/// Requires at least two anchor hits to derive the generation window;
/// with fewer the chart is left untouched and the call silently
/// succeeds. That no-op is contractual (if debatable) and is decided
/// here at the entry point, never deeper in the call chain.
///
/// Seeds missing from `config` are resolved and written back, so an
/// unseeded invocation can still be reproduced afterwards.
pub fn regenerate(
    chart: &mut Chart,
    store: &ControlPointStore,
    config: &mut GeneratorConfig,
) -> Result<()> {
    let (Some(start), Some(end)) = (chart.first_anchor_time(), chart.last_anchor_time()) else {
        log::debug!("skipping generation: chart has no anchor hits");
        return Ok(());
    };
    if chart.anchor_count() < 2 {
        log::debug!("skipping generation: fewer than two anchor hits");
        return Ok(());
    }

    let seeds = config.resolve_seeds();
    let generator = Generator::new(store, config, seeds, start, end);
    let hits = generator.run()?;

    log::debug!(
        "regenerated {} hits across {:.0}ms",
        hits.len(),
        end - start
    );
    chart.replace_with_hits(hits);
    Ok(())
}

/// The four independent random streams of one run.
struct Streams {
    colour: StdRng,
    pattern_length: StdRng,
    insertion: StdRng,
    triplet_colour: StdRng,
}

impl Streams {
    fn from_seeds(seeds: Seeds) -> Self {
        Self {
            colour: StdRng::seed_from_u64(seeds.colour),
            pattern_length: StdRng::seed_from_u64(seeds.pattern_length),
            insertion: StdRng::seed_from_u64(seeds.insertion),
            triplet_colour: StdRng::seed_from_u64(seeds.triplet_colour),
        }
    }
}

/// Which stream colours a hit draw.
#[derive(Clone, Copy)]
enum ColourStream {
    Regular,
    Triplet,
}

/// Output index and time of the most recently created hit, kept for the
/// stacked-hit check at tempo boundaries.
#[derive(Clone, Copy)]
struct LastHit {
    index: usize,
    time: f64,
}

/// Mutable working set of one generation pass.
struct Generator<'a> {
    store: &'a ControlPointStore,
    config: &'a GeneratorConfig,
    streams: Streams,
    weights: ColourWeights,
    sections: SectionMap,

    cursor: TempoCursor,
    beat: BeatLengths,
    current_time: f64,
    end_time: f64,

    /// Completed runs, in placement order.
    output: Vec<Hit>,
    /// The run currently being generated.
    pattern: Vec<Hit>,

    last_created: Option<LastHit>,
    /// Output indices flagged for removal by the stacked-hit check.
    faulty: Vec<usize>,

    /// Colour of the previous hit, as recorded before any triplet
    /// inversion touched it. Drives the monocolour limiter.
    current_colour: Option<HitColour>,
    /// Identical-colour run length. Persists across runs; only a forced
    /// inversion or a triplet insertion resets it.
    mono_count: u32,

    /// Set while the next regular hit should skip triplet insertion
    /// because one just ended.
    triplet_just_inserted: bool,
    /// Colour of the last regular hit, for the triplet-start inversion.
    last_regular_colour: Option<HitColour>,
    /// Colour of the last hit of the most recent triplet, for the
    /// after-triplet inversion.
    last_triplet_colour: Option<HitColour>,
}

impl<'a> Generator<'a> {
    fn new(
        store: &'a ControlPointStore,
        config: &'a GeneratorConfig,
        seeds: Seeds,
        start_time: f64,
        end_time: f64,
    ) -> Self {
        let cursor = TempoCursor::new(store, start_time);
        // Resolve tempo at the first anchor rather than time zero: charts
        // sometimes carry extreme early markers for scroll effects.
        let beat = BeatLengths::derive(cursor.marker(store), config.double_bpm);
        let sections = if config.stream_conversion {
            SectionMap::locate(store, end_time, config.double_bpm)
        } else {
            SectionMap::empty()
        };

        Self {
            store,
            config,
            streams: Streams::from_seeds(seeds),
            weights: ColourWeights::from_ratio(config.rim_ratio),
            sections,
            cursor,
            beat,
            current_time: start_time,
            end_time,
            output: Vec::new(),
            pattern: Vec::new(),
            last_created: None,
            faulty: Vec::new(),
            current_colour: None,
            mono_count: 1,
            triplet_just_inserted: false,
            last_regular_colour: None,
            last_triplet_colour: None,
        }
    }

    fn run(mut self) -> Result<Vec<Hit>> {
        let unlimited = self.config.pattern_length.is_unlimited();
        let max_len = self.config.pattern_length.max_len();

        while self.within_bounds() {
            self.generate_run(max_len)?;

            // Runs are separated by a half-beat rest. Unlimited pattern
            // length means one continuous stream instead, so the spacing
            // drops to the in-run quarter beat.
            let spacing = if unlimited {
                self.beat.quarter
            } else {
                self.beat.half
            };
            self.advance(spacing);
        }

        self.remove_faulty();
        Ok(self.output)
    }

    /// One pattern: roll a length, place its hits, append to the output.
    fn generate_run(&mut self, max_len: usize) -> Result<()> {
        self.pattern.clear();

        // The roll happens even when a section override replaces it; the
        // pattern-length stream must advance identically either way.
        let mut length = self.streams.pattern_length.random_range(1..=max_len);
        if self.config.stream_conversion {
            length = self.override_length_if_in_section(length);
        }
        if length % 2 == 0 {
            length += 1;
        }

        let chance = self.config.triplet_chance();

        let mut i = 0usize;
        while i < length {
            // Close to a section start, truncate the run so it cannot
            // overlap into the stream. Checked on even indices only so a
            // half-placed pair still completes.
            if self.config.stream_conversion && self.approaching_section() && i % 2 == 0 {
                length = 1;
            }

            let Some(mut hit) = self.create_hit(ColourStream::Regular)? else {
                // Ran out of playable time mid-run; normal termination.
                break;
            };

            // Monocolour limiter: the count only moves on identical
            // colours, and only a breach resets it.
            if let Some(max) = self.config.max_monocolours() {
                if Some(hit.colour) == self.current_colour {
                    self.mono_count += 1;
                    if self.mono_count > max {
                        self.mono_count = 1;
                        hit.colour = hit.colour.flipped();
                    }
                }
            }
            self.current_colour = Some(hit.colour);

            let hit_index = self.pattern.len();
            self.pattern.push(hit);

            // A tempo change always truncates the current run; letting it
            // continue would stack hits against the re-anchored cursor.
            if self.cursor.changed_since_snapshot() {
                break;
            }

            if !self.too_late_for_triplet() {
                if self.triplet_just_inserted {
                    // Keep at least one quarter-beat hit between
                    // triplets; optionally force it onto the opposite
                    // colour of the triplet's last hit.
                    self.triplet_just_inserted = false;
                    if self.config.invert_colour_after_rhythm_change {
                        self.invert_against(hit_index, self.last_triplet_colour);
                    }
                } else if self.config.insert_triplets
                    && !self.cursor.will_change_within(
                        self.store,
                        self.current_time,
                        self.beat.whole * 2.0,
                    )
                    && self.streams.insertion.random::<f64>() < chance
                {
                    self.mono_count = 1;
                    self.triplet_just_inserted = true;

                    if self.config.invert_colour_on_rhythm_change_start {
                        self.invert_against(hit_index, self.last_regular_colour);
                    }

                    self.last_triplet_colour = self.add_triplet()?;
                    // Inside an active stream a triplet replaces one
                    // quarter-beat slot; its third note already lands on
                    // the next quarter, so skip two slots, not three.
                    if self.config.stream_conversion && self.sections.is_inside(self.current_time) {
                        i += 2;
                    }

                    if self.config.longer_triplets
                        && self.streams.insertion.random::<f64>() < chance / 2.0
                    {
                        self.last_triplet_colour = self.add_triplet()?;
                        if self.config.stream_conversion
                            && self.sections.is_inside(self.current_time)
                        {
                            i += 2;
                        }
                    }
                }
            } else if self.config.stream_conversion
                && self.triplet_just_inserted
                && self.config.invert_colour_on_rhythm_change_start
                && self.config.invert_colour_after_rhythm_change
            {
                // Too close to a section edge to insert anything, but a
                // triplet just ended and the inversion options still owe
                // this hit a colour change.
                self.invert_against(hit_index, self.last_triplet_colour);
            }

            // Everything within a run sits on the quarter grid, except
            // after the final hit.
            if i < length - 1 {
                self.advance(self.beat.quarter);
            }

            self.last_regular_colour = Some(self.pattern[hit_index].colour);
            i += 1;
        }

        self.output.append(&mut self.pattern);
        Ok(())
    }

    fn within_bounds(&self) -> bool {
        self.current_time <= self.end_time
    }

    fn advance(&mut self, step: f64) {
        self.current_time += step;
    }

    /// Create one hit at the cursor, or `None` once the window is
    /// exhausted.
    ///
    /// Detects tempo-boundary crossings first: the cursor snaps to the
    /// new marker's declared time, and if that lands within a sixth beat
    /// of the previous hit, the previous hit is flagged for removal
    /// rather than leaving a near-stacked pair. Off-beat markers can
    /// still produce small gaps; that is the accepted trade-off.
    fn create_hit(&mut self, stream: ColourStream) -> Result<Option<Hit>> {
        self.cursor.snapshot();

        if !self.within_bounds() {
            return Ok(None);
        }

        if self.cursor.refresh(self.store, self.current_time) {
            let marker = self.cursor.marker(self.store);
            self.current_time = marker.time;

            if let Some(last) = self.last_created {
                if self.current_time - last.time < self.beat.sixth {
                    self.faulty.push(last.index);
                }
            }

            self.beat = BeatLengths::derive(marker, self.config.double_bpm);
        }

        let rng = match stream {
            ColourStream::Regular => &mut self.streams.colour,
            ColourStream::Triplet => &mut self.streams.triplet_colour,
        };
        let colour = self.weights.select(rng)?;

        let hit = Hit {
            time: self.current_time,
            colour,
        };
        self.last_created = Some(LastHit {
            index: self.output.len() + self.pattern.len(),
            time: self.current_time,
        });
        Ok(Some(hit))
    }

    /// Append three hits spaced a sixth beat apart, advancing the cursor
    /// before each. Returns the colour of the last hit, or `None` when
    /// the window ran out mid-triplet (the final note of a chart can
    /// roll one).
    fn add_triplet(&mut self) -> Result<Option<HitColour>> {
        let mut last = None;
        for _ in 0..3 {
            self.advance(self.beat.sixth);
            match self.create_hit(ColourStream::Triplet)? {
                Some(hit) => {
                    last = Some(hit.colour);
                    self.pattern.push(hit);
                }
                None => return Ok(None),
            }
        }
        Ok(last)
    }

    /// Invert the pattern hit at `index` if it matches `previous`.
    fn invert_against(&mut self, index: usize, previous: Option<HitColour>) {
        let Some(previous) = previous else { return };
        let hit = &mut self.pattern[index];
        if hit.colour == previous {
            hit.colour = hit.colour.flipped();
        }
    }

    /// Inside a section, a run becomes a stream sized to whatever of the
    /// section remains ahead of the cursor.
    fn override_length_if_in_section(&self, length: usize) -> usize {
        let Some(section) = self.sections.containing(self.current_time) else {
            return length;
        };
        // The previous run may have ended past the section start; size
        // the stream from the cursor, not from the section start.
        let remaining =
            section.end_time - section.start_time - (self.current_time - section.start_time);
        (remaining / self.beat.quarter) as usize
    }

    /// Whether the cursor sits within one whole beat before the next
    /// section's start (and outside any section).
    fn approaching_section(&self) -> bool {
        let Some(next) = self.sections.next_ahead(self.current_time) else {
            return false;
        };
        !self.sections.is_inside(self.current_time)
            && next.start_time - self.current_time <= self.beat.whole
    }

    /// Whether a triplet would collide with a section boundary: within a
    /// whole beat of the next section's start while outside, or of the
    /// current section's end while inside. Only meaningful with stream
    /// conversion on; otherwise there is never a "too late".
    fn too_late_for_triplet(&self) -> bool {
        if !self.config.stream_conversion {
            return false;
        }

        if !self.sections.is_inside(self.current_time) {
            if let Some(next) = self.sections.next_ahead(self.current_time) {
                return self.too_close_to(next.start_time);
            }
        }

        match self.sections.containing(self.current_time) {
            Some(section) => self.too_close_to(section.end_time),
            None => false,
        }
    }

    fn too_close_to(&self, reference: f64) -> bool {
        self.current_time <= reference && reference - self.current_time <= self.beat.whole
    }

    /// Drop every hit flagged at a tempo boundary.
    fn remove_faulty(&mut self) {
        if self.faulty.is_empty() {
            return;
        }
        log::debug!(
            "removing {} hits stacked against tempo changes",
            self.faulty.len()
        );

        let faulty: HashSet<usize> = self.faulty.drain(..).collect();
        let mut index = 0;
        self.output.retain(|_| {
            let keep = !faulty.contains(&index);
            index += 1;
            keep
        });
    }
}
