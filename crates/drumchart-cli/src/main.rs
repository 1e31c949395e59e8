//! drumchart CLI - The `drumchart` command.
//!
//! Two subcommands:
//!
//! - **generate**: load a chart from JSON, regenerate its hit list with
//!   the configured seeds and toggles, and write the result back out.
//! - **stats**: compute unstable rate and average hit error over a JSON
//!   log of score events.

use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

use drumchart_core::{
    average_hit_error, average_hit_error_for, regenerate, unstable_rate, Chart, ChartEvent,
    ControlPointStore, EffectMarker, GeneratorConfig, HitColour, PatternLength, ScoreEvent,
    TempoMarker,
};

/// drumchart - procedural rhythm-chart regeneration
#[derive(Parser, Debug)]
#[command(name = "drumchart")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Regenerate two-colour rhythm charts", long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Regenerate a chart file
    Generate {
        /// Path to the chart JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Output path (defaults to overwriting the input)
        #[arg(short, long, value_name = "FILE")]
        output: Option<PathBuf>,

        /// Longest pattern length (odd, 1-11; 0 = unlimited)
        #[arg(long, default_value_t = 7)]
        pattern_length: u32,

        #[arg(long)]
        colour_seed: Option<u64>,

        #[arg(long)]
        pattern_length_seed: Option<u64>,

        #[arg(long)]
        insertion_seed: Option<u64>,

        #[arg(long)]
        triplet_colour_seed: Option<u64>,

        /// Longest allowed run of identical colours
        #[arg(long)]
        max_monocolours: Option<u32>,

        /// Turn intensity sections into continuous streams
        #[arg(long)]
        streams: bool,

        /// Generate at double tempo
        #[arg(long)]
        double_bpm: bool,

        /// Insert sixth-beat triplets
        #[arg(long)]
        triplets: bool,

        /// Triplet insertion chance (0.0-0.5)
        #[arg(long, default_value_t = 0.05)]
        triplet_chance: f64,

        /// Allow six-hit triplets at half the insertion chance
        #[arg(long)]
        longer_triplets: bool,

        /// Keep the colour unchanged when a triplet starts
        #[arg(long)]
        no_invert_on_triplet_start: bool,

        /// Keep the colour unchanged after a triplet ends
        #[arg(long)]
        no_invert_after_triplet: bool,

        /// Rim share of generated colours (0.0-1.0)
        #[arg(long, default_value_t = 0.5)]
        rim_ratio: f64,
    },

    /// Print timing statistics for a score-event log
    Stats {
        /// Path to the score-event JSON file
        #[arg(value_name = "FILE")]
        file: PathBuf,
    },
}

/// On-disk chart representation: events plus the control points the
/// generator queries.
#[derive(Debug, Serialize, Deserialize)]
struct ChartFile {
    events: Vec<ChartEvent>,
    #[serde(default)]
    timing_points: Vec<TempoMarker>,
    #[serde(default)]
    effect_points: Vec<EffectMarker>,
}

fn main() -> Result<()> {
    env_logger::init();
    let args = Args::parse();

    match args.command {
        Commands::Generate {
            file,
            output,
            pattern_length,
            colour_seed,
            pattern_length_seed,
            insertion_seed,
            triplet_colour_seed,
            max_monocolours,
            streams,
            double_bpm,
            triplets,
            triplet_chance,
            longer_triplets,
            no_invert_on_triplet_start,
            no_invert_after_triplet,
            rim_ratio,
        } => {
            let pattern_length = PatternLength::from_length(pattern_length)
                .context("pattern length must be odd and at most 11, or 0 for unlimited")?;

            let config = GeneratorConfig {
                pattern_length,
                colour_seed,
                pattern_length_seed,
                insertion_seed,
                triplet_colour_seed,
                max_consecutive_monocolours: max_monocolours,
                stream_conversion: streams,
                double_bpm,
                insert_triplets: triplets,
                triplet_insertion_chance: triplet_chance,
                longer_triplets,
                invert_colour_on_rhythm_change_start: !no_invert_on_triplet_start,
                invert_colour_after_rhythm_change: !no_invert_after_triplet,
                rim_ratio,
            };

            let out = output.unwrap_or_else(|| file.clone());
            generate_chart(&file, &out, config)
        }
        Commands::Stats { file } => print_stats(&file),
    }
}

fn generate_chart(input: &PathBuf, output: &PathBuf, mut config: GeneratorConfig) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read chart file {}", input.display()))?;
    let mut chart_file: ChartFile =
        serde_json::from_str(&raw).context("failed to parse chart JSON")?;

    let store = ControlPointStore::new(
        chart_file.timing_points.clone(),
        chart_file.effect_points.clone(),
    );
    let mut chart = Chart::new(std::mem::take(&mut chart_file.events));

    let before = chart.anchor_count();
    regenerate(&mut chart, &store, &mut config)?;
    log::info!(
        "regenerated {} hits (input had {} anchors)",
        chart.events.len(),
        before
    );

    // The resolved seeds make an unseeded run repeatable.
    println!(
        "seeds: colour={} pattern-length={} insertion={} triplet-colour={}",
        config.colour_seed.unwrap_or_default(),
        config.pattern_length_seed.unwrap_or_default(),
        config.insertion_seed.unwrap_or_default(),
        config.triplet_colour_seed.unwrap_or_default(),
    );

    chart_file.events = chart.events;
    let json = serde_json::to_string_pretty(&chart_file)?;
    fs::write(output, json)
        .with_context(|| format!("failed to write chart file {}", output.display()))?;

    println!("wrote {}", output.display());
    Ok(())
}

fn print_stats(input: &PathBuf) -> Result<()> {
    let raw = fs::read_to_string(input)
        .with_context(|| format!("failed to read event log {}", input.display()))?;
    let events: Vec<ScoreEvent> =
        serde_json::from_str(&raw).context("failed to parse score-event JSON")?;

    match unstable_rate(&events, None) {
        Some(result) => {
            println!("unstable rate:   {:.2}", result.overall());
            println!("  centre:        {:.2}", result.for_centre());
            println!("  rim:           {:.2}", result.for_rim());
        }
        None => println!("unstable rate:   n/a"),
    }

    println!("avg hit error:   {}", format_error(average_hit_error(&events)));
    println!(
        "  centre:        {}",
        format_error(average_hit_error_for(&events, HitColour::Centre))
    );
    println!(
        "  rim:           {}",
        format_error(average_hit_error_for(&events, HitColour::Rim))
    );
    Ok(())
}

fn format_error(value: Option<f64>) -> String {
    match value {
        Some(v) => format!("{v:+.2}ms"),
        None => "n/a".to_string(),
    }
}
