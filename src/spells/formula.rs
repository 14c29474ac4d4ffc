//! Damage and healing formulas.

use super::catalog::AbilityDefinition;

/// Fraction of damage lost at the very edge of an area effect.
pub const AREA_EDGE_FALLOFF: f64 = 0.3;

/// Absorbs f32 representation noise so 31.9999998 floors to 32.
const FLOOR_EPSILON: f64 = 1e-4;

/// Floors an amount to a whole number, tolerating float noise.
pub fn floor_amount(value: f64) -> f32 {
    (value + FLOOR_EPSILON).floor() as f32
}

/// `value * (1 + stat * rate)`, floored.
pub fn scaled(base: f32, stat_value: f32, scaling_rate: f32) -> f32 {
    floor_amount(base as f64 * (1.0 + stat_value as f64 * scaling_rate as f64))
}

/// Outgoing damage for a spell, applied as a whole number.
pub fn spell_damage(def: &AbilityDefinition, stat_value: f32, spell_damage_bonus: f32) -> f32 {
    floor_amount(scaled(def.base_damage, stat_value, def.scaling_rate) as f64 * spell_damage_bonus as f64)
}

/// Healing for a spell. Spell damage buffs do not apply.
pub fn spell_healing(def: &AbilityDefinition, stat_value: f32) -> f32 {
    scaled(def.base_healing, stat_value, def.scaling_rate)
}

/// Linear falloff from 1.0 at the center to 0.7 at the edge.
///
/// Returns `None` beyond the radius so callers skip the target entirely.
pub fn area_falloff(distance: f32, radius: f32) -> Option<f32> {
    falloff_f64(distance, radius).map(|multiplier| multiplier as f32)
}

fn falloff_f64(distance: f32, radius: f32) -> Option<f64> {
    if radius <= 0.0 || distance > radius {
        return None;
    }
    Some(1.0 - AREA_EDGE_FALLOFF * (distance as f64 / radius as f64))
}

/// Area damage a target receives at `distance` from the center.
pub fn area_damage(damage: f32, distance: f32, radius: f32) -> Option<f32> {
    falloff_f64(distance, radius).map(|multiplier| floor_amount(damage as f64 * multiplier))
}
