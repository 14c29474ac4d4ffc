//! Combat logging
//!
//! Records spell events for display and post-session analysis.

use bevy::prelude::*;
use std::collections::HashMap;
use std::path::Path;

use crate::spells::{SpellEvent, SpellId, TargetId};

/// A single entry in the combat log
#[derive(Debug, Clone, PartialEq)]
pub struct CombatLogEntry {
    /// Timestamp in simulation time (seconds since the log was cleared)
    pub timestamp: f32,
    /// The type of event
    pub event_type: CombatLogEventType,
    /// Human-readable description of the event
    pub message: String,
    pub ability: Option<SpellId>,
    pub target: Option<TargetId>,
    /// Damage dealt or health restored
    pub amount: Option<f32>,
}

/// Types of combat log events for filtering
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CombatLogEventType {
    /// A timed cast began
    CastStart,
    /// A cast finished and its effect resolved
    AbilityUsed,
    /// Damage dealt
    Damage,
    /// Healing done
    Healing,
    /// Buff or shield applied
    AuraApplied,
    /// Buff or shield removed
    AuraRemoved,
    /// Cast cancelled before it resolved
    Interrupt,
    /// Learned spells or hotbar changed
    Loadout,
}

impl CombatLogEventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            CombatLogEventType::CastStart => "CAST",
            CombatLogEventType::AbilityUsed => "USED",
            CombatLogEventType::Damage => "DAMAGE",
            CombatLogEventType::Healing => "HEAL",
            CombatLogEventType::AuraApplied => "AURA+",
            CombatLogEventType::AuraRemoved => "AURA-",
            CombatLogEventType::Interrupt => "INTERRUPT",
            CombatLogEventType::Loadout => "LOADOUT",
        }
    }
}

/// The combat log resource storing all events
#[derive(Resource, Default, Debug)]
pub struct CombatLog {
    /// All log entries in chronological order
    pub entries: Vec<CombatLogEntry>,
    /// Current simulation time
    pub time: f32,
    /// Buffs seen in the last buff list, to tell new ones from refreshes
    active_buffs: Vec<SpellId>,
}

impl CombatLog {
    /// Clear the log for a new session
    pub fn clear(&mut self) {
        self.entries.clear();
        self.active_buffs.clear();
        self.time = 0.0;
    }

    /// Add a new entry to the log
    pub fn log(&mut self, event_type: CombatLogEventType, message: String) {
        self.push(event_type, message, None, None, None);
    }

    fn push(
        &mut self,
        event_type: CombatLogEventType,
        message: String,
        ability: Option<SpellId>,
        target: Option<TargetId>,
        amount: Option<f32>,
    ) {
        self.entries.push(CombatLogEntry {
            timestamp: self.time,
            event_type,
            message,
            ability,
            target,
            amount,
        });
    }

    /// Record an engine event. Cooldown ticks are not logged.
    pub fn record(&mut self, event: &SpellEvent) {
        use CombatLogEventType as Kind;
        match event {
            SpellEvent::AbilityLearned(id) => {
                self.push(Kind::Loadout, format!("Learned {:?}", id), Some(*id), None, None)
            }
            SpellEvent::HotbarChanged(slots) => {
                let bound: Vec<String> = slots
                    .iter()
                    .enumerate()
                    .filter_map(|(slot, id)| id.map(|id| format!("{}={:?}", slot, id)))
                    .collect();
                self.log(Kind::Loadout, format!("Hotbar [{}]", bound.join(", ")));
            }
            SpellEvent::CooldownChanged { .. } => {}
            SpellEvent::BuffsChanged(buffs) => {
                for buff in buffs {
                    if !self.active_buffs.contains(&buff.ability) {
                        self.push(
                            Kind::AuraApplied,
                            format!("{:?} applied ({:.1}s)", buff.ability, buff.remaining),
                            Some(buff.ability),
                            None,
                            None,
                        );
                    }
                }
                self.active_buffs = buffs.iter().map(|buff| buff.ability).collect();
            }
            SpellEvent::CastStarted(id) => {
                self.push(Kind::CastStart, format!("Casting {:?}", id), Some(*id), None, None)
            }
            SpellEvent::CastCompleted(id) => {
                self.push(Kind::AbilityUsed, format!("{:?} cast", id), Some(*id), None, None)
            }
            SpellEvent::CastInterrupted(id) => {
                self.push(Kind::Interrupt, format!("{:?} interrupted", id), Some(*id), None, None)
            }
            SpellEvent::BuffExpired(id) => {
                self.active_buffs.retain(|active| active != id);
                self.push(Kind::AuraRemoved, format!("{:?} faded", id), Some(*id), None, None)
            }
            SpellEvent::ShieldApplied { ability, capacity } => self.push(
                Kind::AuraApplied,
                format!("{:?} shield ({:.0})", ability, capacity),
                Some(*ability),
                None,
                Some(*capacity),
            ),
            SpellEvent::ShieldExpired(id) => {
                self.push(Kind::AuraRemoved, format!("{:?} shield gone", id), Some(*id), None, None)
            }
            SpellEvent::SpellHit { ability, target, damage } => self.push(
                Kind::Damage,
                format!("{:?} hits target {} for {:.0}", ability, target.0, damage),
                Some(*ability),
                Some(*target),
                Some(*damage),
            ),
            SpellEvent::CasterHealed { source, amount } => self.push(
                Kind::Healing,
                format!("{:?} heals for {:.0}", source, amount),
                Some(*source),
                None,
                Some(*amount),
            ),
        }
    }

    /// Get entries filtered by event type
    pub fn filter_by_type(&self, event_type: CombatLogEventType) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| e.event_type == event_type)
            .collect()
    }

    /// Get only HP-changing events (damage and healing)
    pub fn hp_changes_only(&self) -> Vec<&CombatLogEntry> {
        self.entries
            .iter()
            .filter(|e| {
                matches!(
                    e.event_type,
                    CombatLogEventType::Damage | CombatLogEventType::Healing
                )
            })
            .collect()
    }

    /// Total damage dealt per spell
    pub fn damage_by_ability(&self) -> HashMap<SpellId, f32> {
        let mut totals = HashMap::new();
        for entry in self.filter_by_type(CombatLogEventType::Damage) {
            if let (Some(ability), Some(amount)) = (entry.ability, entry.amount) {
                *totals.entry(ability).or_insert(0.0) += amount;
            }
        }
        totals
    }

    /// Total damage dealt to one target
    pub fn damage_to(&self, target: TargetId) -> f32 {
        self.filter_by_type(CombatLogEventType::Damage)
            .into_iter()
            .filter(|e| e.target == Some(target))
            .filter_map(|e| e.amount)
            .fold(0.0, |total, amount| total + amount)
    }

    pub fn total_damage(&self) -> f32 {
        self.filter_by_type(CombatLogEventType::Damage)
            .into_iter()
            .filter_map(|e| e.amount)
            .fold(0.0, |total, amount| total + amount)
    }

    pub fn total_healing(&self) -> f32 {
        self.filter_by_type(CombatLogEventType::Healing)
            .into_iter()
            .filter_map(|e| e.amount)
            .fold(0.0, |total, amount| total + amount)
    }

    /// Get the last N entries
    pub fn recent(&self, count: usize) -> Vec<&CombatLogEntry> {
        self.entries.iter().rev().take(count).rev().collect()
    }

    /// One line per entry: `[  12.34] DAMAGE    Fireball hits target 1 for 40`
    pub fn to_text(&self) -> String {
        let mut text = String::new();
        for entry in &self.entries {
            text.push_str(&format!(
                "[{:>7.2}] {:<9} {}\n",
                entry.timestamp,
                entry.event_type.as_str(),
                entry.message
            ));
        }
        text
    }

    /// Write `to_text` output to `path`
    pub fn save_to_file(&self, path: &Path) -> Result<(), String> {
        std::fs::write(path, self.to_text())
            .map_err(|e| format!("Failed to write combat log to {}: {}", path.display(), e))?;
        info!("Saved {} combat log entries to {}", self.entries.len(), path.display());
        Ok(())
    }
}
