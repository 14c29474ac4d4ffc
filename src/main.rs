//! Spellforge - headless spellcasting scenario runner
//!
//! Loads a JSON scenario, runs it on a fixed time step and prints the result
//! as JSON.

use bevy::log::LogPlugin;
use std::process::ExitCode;

use spellforge::cli;
use spellforge::combat::log::CombatLog;
use spellforge::headless::runner::{build_scenario_app, run_scenario_app};
use spellforge::headless::ScenarioConfig;
use spellforge::settings::EngineSettings;

fn main() -> ExitCode {
    let args = cli::parse_args();

    let mut config = match ScenarioConfig::load_from_file(&args.scenario) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("Invalid scenario {}: {}", args.scenario.display(), e);
            return ExitCode::FAILURE;
        }
    };
    if let Some(max) = args.max_duration {
        if max > 0.0 {
            config.duration_secs = config.duration_secs.min(max);
        }
    }
    config.settings_or(EngineSettings::load);
    let output = args
        .output
        .or_else(|| config.output_path.as_ref().map(Into::into));

    let mut app = match build_scenario_app(config) {
        Ok(app) => app,
        Err(e) => {
            eprintln!("Failed to set up scenario: {}", e);
            return ExitCode::FAILURE;
        }
    };
    app.add_plugins(LogPlugin::default());

    let result = match run_scenario_app(&mut app) {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Scenario failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    if let Some(path) = output {
        if let Err(e) = app.world().resource::<CombatLog>().save_to_file(&path) {
            eprintln!("{}", e);
        } else {
            println!("Combat log saved to: {}", path.display());
        }
    }

    match serde_json::to_string_pretty(&result) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Failed to serialize result: {}", e);
            ExitCode::FAILURE
        }
    }
}
