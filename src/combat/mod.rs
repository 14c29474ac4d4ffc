//! Combat integration
//!
//! Hooks the spell engine into a Bevy app:
//! - advances the `SpellArena` every frame
//! - republishes engine notifications as Bevy events
//! - records them in the combat log

use bevy::prelude::*;

pub mod log;
pub mod systems;

use crate::spells::SpellEvent;
use systems::*;

/// Plugin for the spellcasting systems
pub struct SpellcastingPlugin;

impl Plugin for SpellcastingPlugin {
    fn build(&self, app: &mut App) {
        app
            // Engine notifications
            .add_event::<SpellEvent>()
            // Resources
            .init_resource::<log::CombatLog>()
            .init_resource::<SimulationSpeed>()
            // Systems
            .add_systems(Update, (
                advance_spell_arena,
                forward_spell_events,
                record_combat_log,
            ).chain());
    }
}

/// Scales the arena clock; 0.0 freezes every timer and projectile.
#[derive(Resource, Debug, Clone, Copy, PartialEq)]
pub struct SimulationSpeed {
    pub multiplier: f32,
}

impl Default for SimulationSpeed {
    fn default() -> Self {
        Self { multiplier: 1.0 }
    }
}

impl SimulationSpeed {
    /// Highest multiplier accepted by `set`
    pub const MAX_MULTIPLIER: f32 = 8.0;

    /// Set the multiplier, clamped to `0.0..=MAX_MULTIPLIER`. NaN pauses.
    pub fn set(&mut self, multiplier: f32) {
        self.multiplier = if multiplier.is_nan() {
            0.0
        } else {
            multiplier.clamp(0.0, Self::MAX_MULTIPLIER)
        };
    }

    pub fn pause(&mut self) {
        self.multiplier = 0.0;
    }

    pub fn is_paused(&self) -> bool {
        self.multiplier <= 0.0
    }

    /// Frame delta in arena seconds
    pub fn scale(&self, dt: f32) -> f32 {
        dt * self.multiplier
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_speed_is_clamped() {
        let mut speed = SimulationSpeed::default();
        speed.set(100.0);
        assert_eq!(speed.multiplier, SimulationSpeed::MAX_MULTIPLIER);
        speed.set(-1.0);
        assert!(speed.is_paused());
        speed.set(f32::NAN);
        assert!(speed.is_paused());
    }

    #[test]
    fn test_scale_applies_multiplier() {
        let mut speed = SimulationSpeed::default();
        assert_eq!(speed.scale(0.5), 0.5);
        speed.set(2.0);
        assert_eq!(speed.scale(0.5), 1.0);
        speed.pause();
        assert_eq!(speed.scale(0.5), 0.0);
    }
}
