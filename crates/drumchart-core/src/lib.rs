//! drumchart-core - Chart model and procedural pattern generation.
//!
//! This crate provides the building blocks for regenerating two-colour
//! rhythm charts:
//!
//! - **Chart** - Hit events, hold events, and anchor bounds
//! - **Control points** - Externally supplied tempo/effect markers,
//!   queryable by time
//! - **Tempo** - Beat subdivisions and boundary-crossing detection
//! - **Sections** - Intensity-section discovery for stream conversion
//! - **Colour** - Weighted random colour selection
//! - **Generator** - The forward-time pattern generation pass
//! - **Stats** - Online hit-timing deviation statistics
//!
//! # Architecture
//!
//! [`regenerate`] is the single entry point for generation: it consumes
//! a [`Chart`], a [`ControlPointStore`], and a [`GeneratorConfig`], and
//! rebuilds the chart's hit list in one synchronous pass. All transient
//! state (the four random streams, located sections, the tempo cursor)
//! is scoped to that one call; nothing leaks across runs. The statistics
//! side is independent of generation and operates on [`ScoreEvent`]
//! logs.

pub mod chart;
pub mod colour;
pub mod config;
pub mod control_points;
pub mod error;
pub mod generator;
pub mod sections;
pub mod stats;
pub mod tempo;

// Re-export main types for convenience
pub use chart::{Chart, ChartEvent, Hit, HitColour};
pub use colour::ColourWeights;
pub use config::{GeneratorConfig, PatternLength, Seeds};
pub use control_points::{ControlPointStore, EffectMarker, TempoMarker};
pub use error::{GeneratorError, Result};
pub use generator::regenerate;
pub use sections::{IntensitySection, SectionMap};
pub use stats::{
    average_hit_error, average_hit_error_for, unstable_rate, ScoreEvent, UnstableRateResult,
};
pub use tempo::{BeatLengths, TempoCursor};
