//! Command-line interface for Spellforge

use clap::Parser;
use std::path::PathBuf;

/// Headless spellcasting scenario runner
#[derive(Parser, Debug)]
#[command(name = "spellforge")]
#[command(about = "Headless spellcasting scenario runner")]
#[command(version)]
pub struct Args {
    /// JSON scenario file to run
    #[arg(long, value_name = "SCENARIO_FILE")]
    pub scenario: PathBuf,

    /// Output path for the combat log (overrides the scenario's output_path)
    #[arg(long, value_name = "OUTPUT_PATH")]
    pub output: Option<PathBuf>,

    /// Cap on simulated seconds (shortens longer scenarios)
    #[arg(long)]
    pub max_duration: Option<f32>,
}

pub fn parse_args() -> Args {
    Args::parse()
}
