//! Unit tests for combat log recording, queries and export
//!
//! These tests verify that the CombatLog correctly:
//! - Turns spell events into typed entries
//! - Aggregates damage by spell and by target
//! - Tells newly applied buffs from refreshes
//! - Exports one formatted line per entry

use regex::Regex;
use spellforge::combat::log::{CombatLog, CombatLogEventType};
use spellforge::spells::{BuffSummary, SpellEvent, SpellId, TargetId};

fn create_test_log() -> CombatLog {
    CombatLog::default()
}

fn hit(ability: SpellId, target: u32, damage: f32) -> SpellEvent {
    SpellEvent::SpellHit { ability, target: TargetId(target), damage }
}

// =============================================================================
// Damage Aggregation Tests
// =============================================================================

#[test]
fn test_damage_by_ability_empty_log() {
    let log = create_test_log();
    assert!(log.damage_by_ability().is_empty(), "Empty log should return empty damage map");
    assert_eq!(log.total_damage(), 0.0);
    assert!(log.total_damage().is_sign_positive(), "empty total should not print as -0");
    assert!(log.total_healing().is_sign_positive());
}

#[test]
fn test_damage_by_ability_sums_per_spell() {
    let mut log = create_test_log();
    log.record(&hit(SpellId::Fireball, 1, 40.0));
    log.record(&hit(SpellId::Fireball, 2, 32.0));
    log.record(&hit(SpellId::FrostBolt, 1, 35.0));

    let damage = log.damage_by_ability();

    assert_eq!(damage.len(), 2, "Should have 2 different spells");
    assert_eq!(damage.get(&SpellId::Fireball), Some(&72.0));
    assert_eq!(damage.get(&SpellId::FrostBolt), Some(&35.0));
    assert_eq!(log.total_damage(), 107.0);
}

#[test]
fn test_damage_to_single_target() {
    let mut log = create_test_log();
    log.record(&hit(SpellId::Fireball, 1, 40.0));
    log.record(&hit(SpellId::Fireball, 2, 32.0));
    log.record(&hit(SpellId::FlameNova, 1, 21.0));

    assert_eq!(log.damage_to(TargetId(1)), 61.0);
    assert_eq!(log.damage_to(TargetId(2)), 32.0);
    assert_eq!(log.damage_to(TargetId(9)), 0.0);
}

// =============================================================================
// Event Classification Tests
// =============================================================================

#[test]
fn test_cast_lifecycle_entries() {
    let mut log = create_test_log();
    log.record(&SpellEvent::CastStarted(SpellId::Meteor));
    log.record(&SpellEvent::CastInterrupted(SpellId::Meteor));
    log.record(&SpellEvent::CastStarted(SpellId::Mend));
    log.record(&SpellEvent::CastCompleted(SpellId::Mend));

    assert_eq!(log.filter_by_type(CombatLogEventType::CastStart).len(), 2);
    assert_eq!(log.filter_by_type(CombatLogEventType::Interrupt).len(), 1);
    let used = log.filter_by_type(CombatLogEventType::AbilityUsed);
    assert_eq!(used.len(), 1);
    assert_eq!(used[0].ability, Some(SpellId::Mend));
}

#[test]
fn test_cooldown_changes_are_not_logged() {
    let mut log = create_test_log();
    log.record(&SpellEvent::CooldownChanged { slot: 0, remaining: 3.0, total: 3.0 });
    assert!(log.entries.is_empty());
}

#[test]
fn test_buff_refresh_logged_once() {
    let mut log = create_test_log();
    let applied = vec![BuffSummary { ability: SpellId::Haste, remaining: 8.0 }];
    log.record(&SpellEvent::BuffsChanged(applied.clone()));
    log.record(&SpellEvent::BuffsChanged(applied));
    assert_eq!(log.filter_by_type(CombatLogEventType::AuraApplied).len(), 1);

    log.record(&SpellEvent::BuffExpired(SpellId::Haste));
    log.record(&SpellEvent::BuffsChanged(vec![BuffSummary { ability: SpellId::Haste, remaining: 8.0 }]));
    assert_eq!(
        log.filter_by_type(CombatLogEventType::AuraApplied).len(),
        2,
        "recast after expiry is a new application"
    );
    assert_eq!(log.filter_by_type(CombatLogEventType::AuraRemoved).len(), 1);
}

#[test]
fn test_shield_applied_logged_as_aura() {
    let mut log = create_test_log();
    log.record(&SpellEvent::ShieldApplied { ability: SpellId::ManaShield, capacity: 50.0 });
    log.record(&SpellEvent::ShieldExpired(SpellId::ManaShield));

    let applied = log.filter_by_type(CombatLogEventType::AuraApplied);
    assert_eq!(applied.len(), 1);
    assert_eq!(applied[0].message, "ManaShield shield (50)");
    assert_eq!(log.filter_by_type(CombatLogEventType::AuraRemoved).len(), 1);
    assert_eq!(log.total_damage(), 0.0, "shield capacity is not damage");
}

#[test]
fn test_hp_changes_only() {
    let mut log = create_test_log();
    log.record(&hit(SpellId::DrainLife, 1, 25.0));
    log.record(&SpellEvent::CasterHealed { source: SpellId::DrainLife, amount: 12.0 });
    log.record(&SpellEvent::ShieldExpired(SpellId::ManaShield));
    log.record(&SpellEvent::AbilityLearned(SpellId::Renew));

    assert_eq!(log.hp_changes_only().len(), 2);
    assert_eq!(log.total_healing(), 12.0);
}

// =============================================================================
// Timestamps, Recent & Export
// =============================================================================

#[test]
fn test_entries_use_current_time() {
    let mut log = create_test_log();
    log.time = 1.5;
    log.record(&SpellEvent::CastStarted(SpellId::Meteor));
    log.time = 3.5;
    log.record(&SpellEvent::CastCompleted(SpellId::Meteor));

    assert_eq!(log.entries[0].timestamp, 1.5);
    assert_eq!(log.entries[1].timestamp, 3.5);
}

#[test]
fn test_recent_returns_last_entries_in_order() {
    let mut log = create_test_log();
    for damage in [10.0, 20.0, 30.0, 40.0] {
        log.record(&hit(SpellId::ArcaneBolt, 1, damage));
    }
    let recent: Vec<f32> = log.recent(2).iter().filter_map(|e| e.amount).collect();
    assert_eq!(recent, vec![30.0, 40.0]);
}

#[test]
fn test_clear_resets_time_and_entries() {
    let mut log = create_test_log();
    log.time = 9.0;
    log.record(&hit(SpellId::Fireball, 1, 40.0));
    log.clear();
    assert!(log.entries.is_empty());
    assert_eq!(log.time, 0.0);
}

#[test]
fn test_text_export_line_format() {
    let mut log = create_test_log();
    log.time = 2.25;
    log.record(&hit(SpellId::Fireball, 3, 40.0));
    log.record(&SpellEvent::HotbarChanged([Some(SpellId::Fireball), None, None, None, None, None]));

    let text = log.to_text();
    let line = Regex::new(r"^\[\s*\d+\.\d{2}\] [A-Z+\-]+\s+.+$").unwrap();
    for row in text.lines() {
        assert!(line.is_match(row), "malformed log line: {:?}", row);
    }
    assert!(text.contains("Fireball hits target 3 for 40"));
    assert!(text.contains("Hotbar [0=Fireball]"));
}

#[test]
fn test_save_to_file() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("combat.log");
    let mut log = create_test_log();
    log.record(&SpellEvent::CastCompleted(SpellId::Renew));

    log.save_to_file(&path).unwrap();

    let contents = std::fs::read_to_string(&path).unwrap();
    assert_eq!(contents, log.to_text());
}
