//! Spellforge - player spellcasting engine
//!
//! Known spells, hotbar, cooldown and mana accounting, the cast state
//! machine, projectiles, and the buffs, shields and periodic effects active
//! on a caster.
//!
//! This library exposes the engine plus its Bevy integration and headless
//! runner for testing and reuse.

pub mod arena;
pub mod cli;
pub mod combat;
pub mod headless;
pub mod settings;
pub mod spells;

// Re-export commonly used types
pub use arena::{ManaPool, SpellArena, TrainingCaster, TrainingDummy};
pub use combat::log::{CombatLog, CombatLogEventType};
pub use combat::SpellcastingPlugin;
pub use headless::ScenarioConfig;
pub use settings::{EngineSettings, TargetSelection};
pub use spells::{AbilityBook, AbilityCatalog, CastExecutor, SpellError, SpellEvent, SpellId, Spellcaster};
