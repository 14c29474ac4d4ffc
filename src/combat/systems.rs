//! Spellcasting systems
//!
//! ECS systems that drive the spell arena from Bevy's clock.

use bevy::prelude::*;

use super::log::CombatLog;
use super::SimulationSpeed;
use crate::arena::SpellArena;
use crate::spells::SpellEvent;

/// Advance the arena by the frame's delta, scaled by simulation speed
pub fn advance_spell_arena(
    time: Res<Time>,
    speed: Res<SimulationSpeed>,
    arena: Option<ResMut<SpellArena>>,
    mut combat_log: ResMut<CombatLog>,
) {
    let Some(mut arena) = arena else {
        return;
    };
    let dt = speed.scale(time.delta_secs());
    if dt <= 0.0 {
        return;
    }
    combat_log.time += dt;
    arena.update(dt);
}

/// Drain the engine's event channel into Bevy events
pub fn forward_spell_events(arena: Option<ResMut<SpellArena>>, mut writer: EventWriter<SpellEvent>) {
    let Some(mut arena) = arena else {
        return;
    };
    for event in arena.drain_events() {
        writer.send(event);
    }
}

/// Record forwarded spell events in the combat log
pub fn record_combat_log(mut events: EventReader<SpellEvent>, mut combat_log: ResMut<CombatLog>) {
    for event in events.read() {
        combat_log.record(event);
    }
}
