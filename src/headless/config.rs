//! JSON configuration parsing for headless mode
//!
//! A scenario describes one caster, a handful of training dummies and a
//! timeline of scripted actions.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

use crate::arena::{ManaPool, TrainingCaster, TrainingDummy};
use crate::settings::EngineSettings;
use crate::spells::{DamageType, SpellId, HOTBAR_SLOTS};

/// Largest frame step accepted; Bevy clamps longer virtual frames
pub const MAX_FRAME_DT: f32 = 0.25;

/// Headless scenario configuration loaded from JSON
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScenarioConfig {
    /// Spells known at the start, in learn order
    #[serde(default)]
    pub learned: Vec<SpellId>,
    /// Initial hotbar (at most 6 entries, `null` for empty)
    #[serde(default)]
    pub hotbar: Vec<Option<SpellId>>,
    #[serde(default)]
    pub caster: CasterConfig,
    #[serde(default)]
    pub dummies: Vec<DummyConfig>,
    #[serde(default)]
    pub timeline: Vec<TimedAction>,
    /// Simulated seconds to run (default: 10)
    #[serde(default = "default_duration")]
    pub duration_secs: f32,
    /// Fixed frame step in seconds (default: 1/60)
    #[serde(default = "default_frame_dt")]
    pub frame_dt: f32,
    /// Catalog file to use instead of the embedded one
    #[serde(default)]
    pub catalog_path: Option<String>,
    /// Engine tunables (defaults when absent)
    #[serde(default)]
    pub settings: Option<EngineSettings>,
    /// Custom output path for the combat log (optional)
    #[serde(default)]
    pub output_path: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CasterConfig {
    pub health: f32,
    pub max_health: f32,
    pub mana: f32,
    pub max_mana: f32,
    pub mana_regen: f32,
    pub spell_power: f32,
    pub intellect: f32,
    pub strength: f32,
    pub position: [f32; 3],
    pub facing: [f32; 3],
}

impl Default for CasterConfig {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            mana: 100.0,
            max_mana: 100.0,
            mana_regen: 0.0,
            spell_power: 0.0,
            intellect: 0.0,
            strength: 0.0,
            position: [0.0, 0.0, 0.0],
            facing: [0.0, 0.0, 1.0],
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DummyConfig {
    pub id: u32,
    pub position: [f32; 3],
    #[serde(default = "default_dummy_health")]
    pub health: f32,
    #[serde(default)]
    pub resistance: Option<ResistanceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResistanceConfig {
    pub damage_type: DamageType,
    pub fraction: f32,
}

/// An action fired once simulated time reaches `at`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TimedAction {
    pub at: f32,
    pub action: ScenarioAction,
}

/// Scripted input, JSON-tagged by `type`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum ScenarioAction {
    Cast { spell: SpellId },
    CastSlot { slot: usize },
    Equip { spell: Option<SpellId>, slot: usize },
    Interrupt,
    DamageCaster { amount: f32 },
    Face { direction: [f32; 3] },
    SetDodging { dodging: bool },
}

fn default_duration() -> f32 {
    10.0
}

fn default_frame_dt() -> f32 {
    1.0 / 60.0
}

fn default_dummy_health() -> f32 {
    1000.0
}

impl ScenarioConfig {
    /// Load configuration from a JSON file
    pub fn load_from_file(path: &Path) -> Result<Self, String> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| format!("Failed to read config file: {}", e))?;
        Self::from_json_str(&contents)
    }

    pub fn from_json_str(contents: &str) -> Result<Self, String> {
        let config: ScenarioConfig = serde_json::from_str(contents)
            .map_err(|e| format!("Failed to parse JSON: {}", e))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.duration_secs <= 0.0 {
            return Err("duration_secs must be positive".to_string());
        }
        if !(self.frame_dt > 0.0 && self.frame_dt <= MAX_FRAME_DT) {
            return Err(format!(
                "frame_dt must be in (0, {}], got {}",
                MAX_FRAME_DT, self.frame_dt
            ));
        }

        if self.hotbar.len() > HOTBAR_SLOTS {
            return Err(format!(
                "hotbar has {} entries but there are only {} slots",
                self.hotbar.len(),
                HOTBAR_SLOTS
            ));
        }
        let mut bound = HashSet::new();
        for spell in self.hotbar.iter().flatten() {
            if !self.learned.contains(spell) {
                return Err(format!("hotbar spell {:?} is not in learned", spell));
            }
            if !bound.insert(*spell) {
                return Err(format!("hotbar binds {:?} more than once", spell));
            }
        }

        if self.caster.max_health <= 0.0 || self.caster.max_mana < 0.0 {
            return Err("caster max_health must be positive and max_mana non-negative".to_string());
        }

        let mut ids = HashSet::new();
        for dummy in &self.dummies {
            if !ids.insert(dummy.id) {
                return Err(format!("duplicate dummy id {}", dummy.id));
            }
            if dummy.health <= 0.0 {
                return Err(format!("dummy {} must start with positive health", dummy.id));
            }
        }

        for timed in &self.timeline {
            if timed.at < 0.0 {
                return Err(format!("timeline action {:?} has negative time", timed.action));
            }
            if let ScenarioAction::CastSlot { slot } | ScenarioAction::Equip { slot, .. } = timed.action {
                if slot >= HOTBAR_SLOTS {
                    return Err(format!("timeline slot {} is out of range", slot));
                }
            }
        }

        if let Some(settings) = &self.settings {
            settings.validate()?;
        }

        Ok(())
    }

    /// Use `fallback` unless the scenario carries its own settings
    pub fn settings_or(&mut self, fallback: impl FnOnce() -> EngineSettings) {
        if self.settings.is_none() {
            self.settings = Some(fallback());
        }
    }

    pub fn engine_settings(&self) -> EngineSettings {
        self.settings.unwrap_or_default()
    }

    pub fn mana_pool(&self) -> ManaPool {
        let mut pool = ManaPool::new(self.caster.max_mana).with_regen(self.caster.mana_regen);
        pool.current = self.caster.mana.clamp(0.0, self.caster.max_mana);
        pool
    }

    pub fn training_caster(&self) -> TrainingCaster {
        TrainingCaster {
            health: self.caster.health.min(self.caster.max_health),
            max_health: self.caster.max_health,
            position: Vec3::from_array(self.caster.position),
            facing: Vec3::from_array(self.caster.facing),
            spell_power: self.caster.spell_power,
            intellect: self.caster.intellect,
            strength: self.caster.strength,
            ..Default::default()
        }
    }

    pub fn training_dummies(&self) -> Vec<TrainingDummy> {
        self.dummies
            .iter()
            .map(|config| {
                let dummy = TrainingDummy::new(config.id, Vec3::from_array(config.position), config.health);
                match &config.resistance {
                    Some(resist) => dummy.with_resistance(resist.damage_type, resist.fraction),
                    None => dummy,
                }
            })
            .collect()
    }

    /// Timeline sorted by time, scripted order kept for equal times
    pub fn sorted_timeline(&self) -> Vec<TimedAction> {
        let mut timeline = self.timeline.clone();
        timeline.sort_by(|a, b| a.at.total_cmp(&b.at));
        timeline
    }
}
