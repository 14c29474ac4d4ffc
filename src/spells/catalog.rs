//! Data-Driven Spell Catalog
//!
//! Spell definitions are loaded from RON instead of being hardcoded.
//! The shipped table lives in `assets/config/abilities.ron` and is also
//! embedded into the binary so tests and tools never depend on the working
//! directory.
//!
//! ## Usage
//! ```ignore
//! let catalog = AbilityCatalog::embedded()?;
//! let fireball = catalog.get(&SpellId::Fireball).unwrap();
//! println!("Fireball cast time: {}", fireball.cast_time);
//! ```

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;

use super::types::{BuffKind, DamageType, ScalingStat, SpellCategory, SpellId, TargetShape};

/// Default location of the catalog on disk
pub const CATALOG_PATH: &str = "assets/config/abilities.ron";

const EMBEDDED_CATALOG: &str = include_str!("../../assets/config/abilities.ron");

/// Stat modifier granted by a buff spell.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct BuffEffect {
    pub kind: BuffKind,
    /// Fractional strength (0.2 = 20%)
    pub magnitude: f32,
}

/// Complete spell configuration loaded from RON.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct AbilityDefinition {
    /// Display name of the spell
    pub name: String,
    pub category: SpellCategory,
    pub target_shape: TargetShape,
    #[serde(default)]
    pub damage_type: Option<DamageType>,

    // === Casting ===
    /// Resource (mana) cost
    #[serde(default)]
    pub resource_cost: f32,
    /// Cooldown after cast in seconds
    #[serde(default)]
    pub cooldown: f32,
    /// Cast time in seconds (0.0 = instant)
    #[serde(default)]
    pub cast_time: f32,

    // === Magnitudes ===
    #[serde(default)]
    pub base_damage: f32,
    #[serde(default)]
    pub base_healing: f32,
    #[serde(default)]
    pub shield_amount: f32,
    /// Duration of buffs, shields and heal-over-time effects
    #[serde(default)]
    pub duration: f32,

    // === Geometry ===
    /// Maximum projectile travel / placement range in units
    #[serde(default)]
    pub range: f32,
    /// Projectile travel speed in units/second
    #[serde(default)]
    pub projectile_speed: f32,
    /// Explosion / area radius (0.0 = no area)
    #[serde(default)]
    pub aoe_radius: f32,

    // === Scaling ===
    #[serde(default = "default_scaling_none")]
    pub scales_with: ScalingStat,
    /// Multiplier per stat point: value = base * (1 + stat * rate)
    #[serde(default)]
    pub scaling_rate: f32,

    /// Stat modifier for buff and defensive spells
    #[serde(default)]
    pub buff: Option<BuffEffect>,
}

fn default_scaling_none() -> ScalingStat {
    ScalingStat::None
}

impl AbilityDefinition {
    /// Returns true if this spell deals damage
    pub fn is_damage(&self) -> bool {
        self.base_damage > 0.0
    }

    /// Returns true if this spell heals
    pub fn is_heal(&self) -> bool {
        self.base_healing > 0.0
    }

    /// Damage spell that also restores the caster's health on hit
    pub fn is_life_drain(&self) -> bool {
        self.target_shape.is_projectile() && self.is_damage() && self.is_heal()
    }

    /// Collects every data problem with this definition.
    fn problems(&self, id: SpellId) -> Vec<String> {
        let mut problems = Vec::new();
        let non_negative = [
            ("resource_cost", self.resource_cost),
            ("cooldown", self.cooldown),
            ("cast_time", self.cast_time),
            ("base_damage", self.base_damage),
            ("base_healing", self.base_healing),
            ("shield_amount", self.shield_amount),
            ("duration", self.duration),
            ("range", self.range),
            ("aoe_radius", self.aoe_radius),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                problems.push(format!("{:?}: {} must be non-negative, got {}", id, field, value));
            }
        }
        if self.target_shape.is_projectile() && (self.projectile_speed <= 0.0 || self.range <= 0.0) {
            problems.push(format!("{:?}: projectile spells need positive projectile_speed and range", id));
        }
        if self.target_shape.is_area() && self.aoe_radius <= 0.0 {
            problems.push(format!("{:?}: area spells need a positive aoe_radius", id));
        }
        if self.target_shape == TargetShape::AreaAtPoint && self.range <= 0.0 {
            problems.push(format!("{:?}: AreaAtPoint spells need a positive range", id));
        }
        problems
    }
}

/// Root structure for the abilities.ron file
#[derive(Debug, Serialize, Deserialize)]
pub struct CatalogFile {
    pub abilities: HashMap<SpellId, AbilityDefinition>,
}

/// Read-only table of every spell definition.
///
/// Built once at startup; callers share it behind an `Arc`.
#[derive(Resource, Debug, Clone)]
pub struct AbilityCatalog {
    definitions: HashMap<SpellId, AbilityDefinition>,
}

impl AbilityCatalog {
    /// Create from already-parsed definitions without checking completeness.
    /// Field-level validation still applies.
    pub fn new(definitions: HashMap<SpellId, AbilityDefinition>) -> Result<Self, String> {
        let catalog = Self { definitions };
        let problems = catalog.field_problems();
        if problems.is_empty() {
            Ok(catalog)
        } else {
            Err(problems.join("; "))
        }
    }

    /// The catalog compiled into the binary.
    pub fn embedded() -> Result<Self, String> {
        Self::from_ron_str(EMBEDDED_CATALOG).map_err(|e| format!("Embedded catalog: {}", e))
    }

    /// Parse and fully validate a catalog from RON text.
    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let file: CatalogFile =
            ron::from_str(contents).map_err(|e| format!("Failed to parse catalog: {}", e))?;
        let catalog = Self::new(file.abilities)?;
        catalog
            .validate()
            .map_err(|missing| format!("Missing ability definitions: {:?}", missing))?;
        Ok(catalog)
    }

    /// Load and validate a catalog file from disk.
    pub fn load_from_path(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read {}: {}", path.display(), e))?;
        let catalog = Self::from_ron_str(&contents)
            .map_err(|e| format!("{}: {}", path.display(), e))?;
        info!("Loaded {} ability definitions from {}", catalog.len(), path.display());
        Ok(catalog)
    }

    pub fn get(&self, id: &SpellId) -> Option<&AbilityDefinition> {
        self.definitions.get(id)
    }

    pub fn contains(&self, id: &SpellId) -> bool {
        self.definitions.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.definitions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.definitions.is_empty()
    }

    /// All defined spell ids, in stable order
    pub fn ids(&self) -> Vec<SpellId> {
        let mut ids: Vec<SpellId> = self.definitions.keys().copied().collect();
        ids.sort();
        ids
    }

    /// Check that every spell the game ships with is defined
    pub fn validate(&self) -> Result<(), Vec<SpellId>> {
        let missing: Vec<SpellId> = SpellId::all()
            .into_iter()
            .filter(|id| !self.definitions.contains_key(id))
            .collect();

        if missing.is_empty() {
            Ok(())
        } else {
            Err(missing)
        }
    }

    fn field_problems(&self) -> Vec<String> {
        let mut problems: Vec<String> = self
            .definitions
            .iter()
            .flat_map(|(id, def)| def.problems(*id))
            .collect();
        problems.sort();
        problems
    }
}
