//! Chart model: coloured hit events on a timeline.
//!
//! A [`Chart`] is an ordered list of [`ChartEvent`]s. Zero-duration
//! [`Hit`]s are the "anchors" that bound regeneration; [`ChartEvent::Hold`]
//! events (drum rolls, held notes) are carried along but never count as
//! anchors.

use serde::{Deserialize, Serialize};

/// One of the two interchangeable hit colours.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HitColour {
    Centre,
    Rim,
}

impl HitColour {
    /// The other colour.
    pub fn flipped(self) -> Self {
        match self {
            HitColour::Centre => HitColour::Rim,
            HitColour::Rim => HitColour::Centre,
        }
    }
}

/// A single zero-duration hit. Immutable once placed in a chart.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct Hit {
    /// Start time in milliseconds.
    pub time: f64,
    pub colour: HitColour,
}

/// An event on the chart timeline.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartEvent {
    /// A zero-duration coloured hit.
    Hit(Hit),
    /// A held event with a duration. Excluded from anchor bounds.
    Hold { time: f64, duration: f64 },
}

impl ChartEvent {
    /// Start time of the event in milliseconds.
    pub fn time(&self) -> f64 {
        match self {
            ChartEvent::Hit(hit) => hit.time,
            ChartEvent::Hold { time, .. } => *time,
        }
    }

    /// Whether this event bounds the generation window.
    pub fn is_anchor(&self) -> bool {
        matches!(self, ChartEvent::Hit(_))
    }
}

/// An ordered sequence of chart events.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Chart {
    pub events: Vec<ChartEvent>,
}

impl Chart {
    pub fn new(events: Vec<ChartEvent>) -> Self {
        Self { events }
    }

    /// Number of anchor hits in the chart.
    pub fn anchor_count(&self) -> usize {
        self.events.iter().filter(|e| e.is_anchor()).count()
    }

    /// Start time of the first anchor hit, if any.
    pub fn first_anchor_time(&self) -> Option<f64> {
        self.events.iter().find(|e| e.is_anchor()).map(|e| e.time())
    }

    /// Start time of the last anchor hit, if any.
    pub fn last_anchor_time(&self) -> Option<f64> {
        self.events
            .iter()
            .rev()
            .find(|e| e.is_anchor())
            .map(|e| e.time())
    }

    /// Drop every existing event and replace the chart with plain hits.
    pub fn replace_with_hits(&mut self, hits: Vec<Hit>) {
        self.events = hits.into_iter().map(ChartEvent::Hit).collect();
    }
}
