//! Projectile simulation
//!
//! Projectiles fly in a straight line at constant velocity. Damage is fixed
//! when they spawn, so buffs that expire mid-flight do not change the hit.

use bevy::prelude::*;

use super::ports::CombatTarget;
use super::types::{DamageType, SpellId};
use crate::settings::{EngineSettings, TargetSelection};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Projectile {
    pub id: u32,
    pub ability: SpellId,
    pub position: Vec3,
    pub velocity: Vec3,
    /// Direct-hit damage, already scaled and floored
    pub damage: f32,
    /// Caster healing on a direct hit (life drain), 0.0 for none
    pub heal_on_hit: f32,
    pub damage_type: Option<DamageType>,
    pub distance_traveled: f32,
    pub max_distance: f32,
    /// Explosion radius on termination (0.0 = none)
    pub aoe_radius: f32,
}

/// Why a projectile stopped.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Termination {
    /// Collided with the target at this index
    Hit(usize),
    RangeExceeded,
    Ground,
}

impl Projectile {
    /// Move one step along the velocity.
    pub fn advance(&mut self, dt: f32) {
        let step = self.velocity * dt;
        self.position += step;
        self.distance_traveled += step.length();
    }

    /// Checks collision, then range, then the ground plane.
    pub fn check_termination<T: CombatTarget>(
        &self,
        targets: &[T],
        settings: &EngineSettings,
    ) -> Option<Termination> {
        if let Some(index) = self.pick_target(targets, settings) {
            return Some(Termination::Hit(index));
        }
        if self.distance_traveled >= self.max_distance {
            return Some(Termination::RangeExceeded);
        }
        if self.position.y < settings.ground_level {
            return Some(Termination::Ground);
        }
        None
    }

    fn pick_target<T: CombatTarget>(&self, targets: &[T], settings: &EngineSettings) -> Option<usize> {
        let in_reach = targets
            .iter()
            .enumerate()
            .filter(|(_, target)| target.is_alive())
            .map(|(index, target)| (index, target.position().distance(self.position)))
            .filter(|(_, distance)| *distance < settings.hit_radius);

        match settings.target_selection {
            TargetSelection::FirstInOrder => in_reach.map(|(index, _)| index).next(),
            TargetSelection::Nearest => in_reach
                .min_by(|a, b| a.1.total_cmp(&b.1))
                .map(|(index, _)| index),
        }
    }
}
