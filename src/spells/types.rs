//! Spell System - Types and Enums
//!
//! Identifiers and small enums shared by the catalog, the ability book and the
//! cast executor. Actual spell definitions are loaded from
//! `assets/config/abilities.ron` via the `catalog` module.

use serde::{Deserialize, Serialize};

/// Number of hotbar slots a caster can bind spells to.
pub const HOTBAR_SLOTS: usize = 6;

/// Enum representing every spell the game knows about.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Debug, Serialize, Deserialize)]
pub enum SpellId {
    // Offensive
    Fireball,     // Exploding projectile
    FrostBolt,    // Single-target projectile
    ArcaneBolt,   // Fast projectile, locks onto "enemy" (falls back to facing)
    DrainLife,    // Projectile that heals the caster on hit
    FlameNova,    // Burst around the caster
    Meteor,       // Long cast, lands ahead of the caster
    // Healing
    Mend,         // Instant-ish direct heal
    Renew,        // Heal over time
    // Defensive
    ManaShield,   // Damage absorb
    StoneSkin,    // Damage reduction
    // Buffs
    Empower,      // Spell damage
    Haste,        // Movement speed
    Battlecry,    // Weapon damage
}

impl SpellId {
    /// Every spell the default catalog is expected to define.
    pub fn all() -> [SpellId; 13] {
        [
            SpellId::Fireball,
            SpellId::FrostBolt,
            SpellId::ArcaneBolt,
            SpellId::DrainLife,
            SpellId::FlameNova,
            SpellId::Meteor,
            SpellId::Mend,
            SpellId::Renew,
            SpellId::ManaShield,
            SpellId::StoneSkin,
            SpellId::Empower,
            SpellId::Haste,
            SpellId::Battlecry,
        ]
    }
}

/// Broad grouping used for tooltips and for routing self-targeted effects.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum SpellCategory {
    Offensive,
    Defensive,
    Healing,
    Buff,
}

/// How a spell picks where its effect lands.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum TargetShape {
    /// Affects only the caster
    OnSelf,
    /// Fires a projectile along the caster's facing
    Direction,
    /// Area centered on the caster
    AreaAroundSelf,
    /// Area placed ahead of the caster along its facing
    AreaAtPoint,
    /// Single enemy; there is no lock-on, so this travels like `Direction`
    Enemy,
}

impl TargetShape {
    /// Shapes that resolve by spawning a projectile
    pub fn is_projectile(&self) -> bool {
        matches!(self, TargetShape::Direction | TargetShape::Enemy)
    }

    /// Shapes that resolve by immediate area damage
    pub fn is_area(&self) -> bool {
        matches!(self, TargetShape::AreaAroundSelf | TargetShape::AreaAtPoint)
    }
}

/// Types of damage
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DamageType {
    Physical,
    Fire,
    Frost,
    Arcane,
    Shadow,
    Holy,
}

/// What caster stat a spell scales with for damage/healing
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum ScalingStat {
    /// Scales with Spell Power (most offensive spells)
    SpellPower,
    /// Scales with Intellect (heals and shields)
    Intellect,
    /// Scales with Strength (physical buffs)
    Strength,
    /// Doesn't scale with any stat
    None,
}

/// Which combat stat a buff modifies.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub enum BuffKind {
    /// Multiplies outgoing spell damage (magnitude 0.2 = +20%)
    SpellDamage,
    /// Multiplies movement speed
    Speed,
    /// Multiplies outgoing weapon damage
    Damage,
    /// Reduces incoming damage (magnitude 0.25 = 25% less)
    DamageReduction,
}

/// Identifies a damageable target for hit notifications.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, Serialize, Deserialize)]
pub struct TargetId(pub u32);

/// Why the caster is currently unable to cast.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum CasterState {
    Dead,
    Dodging,
    MeleeAttacking,
    Casting(SpellId),
}
