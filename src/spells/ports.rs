//! Interfaces the spell engine consumes from the rest of the game.
//!
//! The engine owns none of these; the caller hands them in on every call
//! that needs them.

use bevy::prelude::*;

use super::types::{DamageType, ScalingStat, TargetId};

/// Spendable casting resource (mana).
pub trait ResourcePool {
    fn can_afford(&self, cost: f32) -> bool;
    fn spend(&mut self, cost: f32);
    /// Returns the amount actually restored (capped by the pool's maximum).
    fn restore(&mut self, amount: f32) -> f32;
    fn current(&self) -> f32;
}

/// Anything spells can damage.
pub trait CombatTarget {
    fn target_id(&self) -> TargetId;
    fn position(&self) -> Vec3;
    fn is_alive(&self) -> bool;
    /// Returns the damage actually taken after the target's own mitigation.
    fn apply_damage(&mut self, amount: f32, damage_type: Option<DamageType>) -> f32;
}

/// Movement/combat controller flags that block casting.
pub trait CasterStateQuery {
    fn is_dead(&self) -> bool;
    fn is_dodging(&self) -> bool;
    fn is_melee_attacking(&self) -> bool;
}

/// The casting character's body: where it is, what it has, and its health.
pub trait Caster: CasterStateQuery {
    fn position(&self) -> Vec3;
    /// Facing direction; does not need to be normalized
    fn facing(&self) -> Vec3;
    fn stat(&self, stat: ScalingStat) -> f32;
    /// Returns the amount actually healed
    fn heal(&mut self, amount: f32) -> f32;
    /// Health damage that already went through shields and reductions
    fn take_damage(&mut self, amount: f32);
}
