//! Error types for the drumchart-core crate.

use thiserror::Error;

/// Errors that can occur during chart generation.
///
/// Almost everything the generator encounters (tempo snaps, stacked hits,
/// running out of playable time) is handled locally by adjusting state.
/// Only genuine invariant violations surface here.
#[derive(Error, Debug)]
pub enum GeneratorError {
    /// Weighted colour selection walked past every weight without picking
    /// a colour. Only reachable with malformed weights (e.g. NaN ratio),
    /// so this is a programming error rather than a chart problem.
    #[error("weighted colour selection exhausted all weights (centre={centre}, rim={rim})")]
    ColourSelection { centre: f64, rim: f64 },
}

/// Result type alias using GeneratorError.
pub type Result<T> = std::result::Result<T, GeneratorError>;
