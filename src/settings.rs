//! Engine settings and configuration
//!
//! Tunables that are not part of any one spell: projectile collision,
//! launch geometry, periodic tick spacing and target selection.

use bevy::prelude::*;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// How a projectile picks its victim when several live targets are in reach.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetSelection {
    /// First target in the order the caller supplied them
    #[default]
    FirstInOrder,
    /// Closest target to the projectile
    Nearest,
}

/// Engine-wide tunables
#[derive(Resource, Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// A projectile hits a target closer than this
    pub hit_radius: f32,
    /// Projectiles below this height hit the ground
    pub ground_level: f32,
    /// Projectiles spawn this far above the caster's feet
    pub launch_height: f32,
    /// AreaAtPoint spells land at `range * fraction` ahead of the caster
    pub area_point_range_fraction: f32,
    /// Seconds between heal-over-time ticks
    pub regen_tick_interval: f32,
    pub target_selection: TargetSelection,
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            hit_radius: 1.0,
            ground_level: 0.0,
            launch_height: 1.0,
            area_point_range_fraction: 0.5,
            regen_tick_interval: 1.0,
            target_selection: TargetSelection::FirstInOrder,
        }
    }
}

impl EngineSettings {
    /// Get the path to the settings file
    fn settings_path() -> PathBuf {
        PathBuf::from("spellforge.ron")
    }

    /// Load settings from `spellforge.ron`, or return default if the file
    /// doesn't exist or can't be used
    pub fn load() -> Self {
        Self::load_from(&Self::settings_path())
    }

    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No settings file found, using defaults");
            return Self::default();
        }
        match fs::read_to_string(path) {
            Ok(contents) => match Self::from_ron_str(&contents) {
                Ok(settings) => {
                    info!("Loaded settings from {:?}", path);
                    settings
                }
                Err(e) => {
                    warn!("Failed to parse settings file: {}", e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read settings file: {}", e);
                Self::default()
            }
        }
    }

    pub fn from_ron_str(contents: &str) -> Result<Self, String> {
        let settings: Self = ron::from_str(contents).map_err(|e| e.to_string())?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), String> {
        if !(self.hit_radius > 0.0) {
            return Err(format!("hit_radius must be positive, got {}", self.hit_radius));
        }
        if !(self.regen_tick_interval > 0.0) {
            return Err(format!(
                "regen_tick_interval must be positive, got {}",
                self.regen_tick_interval
            ));
        }
        if !(0.0..=1.0).contains(&self.area_point_range_fraction) {
            return Err(format!(
                "area_point_range_fraction must be within 0..=1, got {}",
                self.area_point_range_fraction
            ));
        }
        Ok(())
    }

    /// Save settings to `path`
    pub fn save_to(&self, path: &Path) -> Result<(), Box<dyn std::error::Error>> {
        let contents = ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())?;
        fs::write(path, contents)?;
        info!("Saved settings to {:?}", path);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_fields_fall_back_to_defaults() {
        let settings = EngineSettings::from_ron_str("(target_selection: Nearest)").unwrap();
        assert_eq!(settings.target_selection, TargetSelection::Nearest);
        assert_eq!(settings.hit_radius, 1.0);
        assert_eq!(settings.area_point_range_fraction, 0.5);
    }

    #[test]
    fn test_zero_hit_radius_rejected() {
        assert!(EngineSettings::from_ron_str("(hit_radius: 0.0)").is_err());
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let settings = EngineSettings::load_from(&dir.path().join("absent.ron"));
        assert_eq!(settings, EngineSettings::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("spellforge.ron");
        let settings = EngineSettings { launch_height: 1.5, ..Default::default() };
        settings.save_to(&path).unwrap();
        assert_eq!(EngineSettings::load_from(&path), settings);
    }
}
