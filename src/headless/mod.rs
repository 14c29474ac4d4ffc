//! Headless mode for scripted testing
//!
//! This module runs spellcasting scenarios without any graphical output,
//! suitable for automated testing and balance checks.
//!
//! ## Usage
//!
//! ```bash
//! # Run a scenario and print the JSON result
//! cargo run --release -- --scenario scenario.json
//! ```
//!
//! ## JSON Configuration
//!
//! ```json
//! {
//!   "learned": ["Fireball", "Mend"],
//!   "hotbar": ["Fireball", "Mend"],
//!   "dummies": [{ "id": 1, "position": [0.0, 1.0, 10.0] }],
//!   "timeline": [{ "at": 0.0, "action": { "type": "CastSlot", "slot": 0 } }],
//!   "duration_secs": 3.0
//! }
//! ```

pub mod config;
pub mod runner;

pub use config::{ScenarioAction, ScenarioConfig, TimedAction};
pub use runner::{run_scenario, CastRecord, DummyResult, Rejection, ScenarioResult};
