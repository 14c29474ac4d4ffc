//! Integration tests for the spell engine
//!
//! These tests verify that:
//! - Casting spends mana and starts cooldowns atomically
//! - Interrupted casts resolve nothing and refund nothing
//! - Projectile explosions apply area falloff
//! - Hotbar slots and shields keep their invariants over many operations

use bevy::math::Vec3;
use std::collections::HashMap;
use std::sync::Arc;

use spellforge::arena::{ManaPool, TrainingCaster, TrainingDummy};
use spellforge::settings::{EngineSettings, TargetSelection};
use spellforge::spells::{
    AbilityCatalog, AbilityDefinition, CastExecutor, CastStatus, CasterStateQuery,
    ResourcePool, ScalingStat, SpellCategory, SpellError, SpellEvent, SpellId, Spellcaster,
    TargetShape, DamageType, HOTBAR_SLOTS,
};

fn catalog() -> Arc<AbilityCatalog> {
    Arc::new(AbilityCatalog::embedded().expect("embedded catalog"))
}

/// Caster with every spell learned and a full 100 mana pool
fn setup(spells: &[SpellId]) -> (Spellcaster, ManaPool, TrainingCaster) {
    let mut spellcaster = Spellcaster::new(catalog(), EngineSettings::default());
    for spell in spells {
        spellcaster.book_mut().learn(*spell);
    }
    (spellcaster, ManaPool::new(100.0), TrainingCaster::default())
}

// =============================================================================
// Scenarios
// =============================================================================

#[test]
fn test_instant_cast_spends_and_starts_cooldown() {
    let (mut sc, mut mana, mut caster) = setup(&[SpellId::Fireball]);
    let mut dummies: Vec<TrainingDummy> = Vec::new();

    sc.cast(SpellId::Fireball, &mut mana, &mut caster, &mut dummies).unwrap();

    assert_eq!(mana.current(), 75.0, "Fireball costs 25");
    assert_eq!(sc.book().cooldown_remaining(SpellId::Fireball), 3.0);
    assert_eq!(sc.executor().status(), CastStatus::Idle, "instant cast resolves same tick");
    assert_eq!(sc.executor().projectiles().len(), 1, "projectile already in flight");
}

#[test]
fn test_interrupt_resolves_nothing_and_keeps_cost() {
    let (mut sc, mut mana, mut caster) = setup(&[SpellId::Mend]);
    let mut dummies: Vec<TrainingDummy> = Vec::new();
    caster.health = 40.0;

    sc.cast(SpellId::Mend, &mut mana, &mut caster, &mut dummies).unwrap();
    sc.update(0.3, &mut mana, &mut caster, &mut dummies);
    assert_eq!(sc.interrupt(), Some(SpellId::Mend));
    sc.update(1.0, &mut mana, &mut caster, &mut dummies);

    assert_eq!(sc.executor().status(), CastStatus::Idle);
    assert_eq!(caster.health, 40.0, "no heal applied");
    assert_eq!(mana.current(), 80.0, "Mend's 20 mana is not refunded");
    assert!(sc.book().cooldown_remaining(SpellId::Mend) > 0.0, "cooldown still runs");
}

fn test_bomb() -> AbilityDefinition {
    AbilityDefinition {
        name: "Test Bomb".to_string(),
        category: SpellCategory::Offensive,
        target_shape: TargetShape::Direction,
        damage_type: Some(DamageType::Fire),
        resource_cost: 0.0,
        cooldown: 0.0,
        cast_time: 0.0,
        base_damage: 40.0,
        base_healing: 0.0,
        shield_amount: 0.0,
        duration: 0.0,
        range: 30.0,
        projectile_speed: 20.0,
        aoe_radius: 3.0,
        scales_with: ScalingStat::None,
        scaling_rate: 0.0,
        buff: None,
    }
}

#[test]
fn test_explosion_two_units_off_center() {
    let catalog = Arc::new(AbilityCatalog::new(HashMap::from([(SpellId::Fireball, test_bomb())])).unwrap());
    let mut sc = Spellcaster::new(catalog, EngineSettings::default());
    sc.book_mut().learn(SpellId::Fireball);
    let (mut mana, mut caster) = (ManaPool::new(100.0), TrainingCaster::default());
    // Launched from (0, 1, 0) along +Z, the bomb stops at (0, 1, 30)
    let mut dummies = vec![TrainingDummy::new(1, Vec3::new(2.0, 1.0, 30.0), 500.0)];

    sc.cast(SpellId::Fireball, &mut mana, &mut caster, &mut dummies).unwrap();
    for _ in 0..3 {
        sc.update(0.5, &mut mana, &mut caster, &mut dummies);
    }

    // floor(40 * (1 - 0.3 * 2/3))
    assert_eq!(dummies[0].damage_taken, 32.0);
    assert!(sc.executor().projectiles().is_empty());
}

#[test]
fn test_equip_over_occupied_slot_moves_spell() {
    let (mut sc, _, _) = setup(&[SpellId::FrostBolt, SpellId::Mend]);
    let book = sc.book_mut();
    book.equip_to_hotbar(Some(SpellId::FrostBolt), 0).unwrap();
    book.equip_to_hotbar(Some(SpellId::Mend), 1).unwrap();

    book.equip_to_hotbar(Some(SpellId::FrostBolt), 1).unwrap();

    assert_eq!(book.hotbar()[0], None);
    assert_eq!(book.hotbar()[1], Some(SpellId::FrostBolt));
}

#[test]
fn test_shield_takes_two_hits() {
    let (mut sc, mut mana, mut caster) = setup(&[SpellId::ManaShield]);
    let mut dummies: Vec<TrainingDummy> = Vec::new();
    let sub = sc.book_mut().events_mut().subscribe();
    sc.cast(SpellId::ManaShield, &mut mana, &mut caster, &mut dummies).unwrap();

    assert_eq!(sc.receive_damage(30.0, &mut caster), 0.0);
    assert_eq!(sc.book().shield_capacity(), 20.0);
    assert_eq!(sc.receive_damage(30.0, &mut caster), 10.0);

    assert!(sc.book().shields().is_empty());
    assert_eq!(caster.health, 90.0);
    let events = sc.book_mut().events_mut().drain(sub);
    assert!(events.contains(&SpellEvent::ShieldExpired(SpellId::ManaShield)));
}

// =============================================================================
// Properties
// =============================================================================

#[test]
fn test_rejected_casts_never_mutate() {
    let (mut sc, _, mut caster) = setup(&[SpellId::Meteor, SpellId::Fireball]);
    let mut mana = ManaPool::new(30.0);
    let mut dummies: Vec<TrainingDummy> = Vec::new();

    let before = (mana.current(), sc.book().snapshot());
    assert!(matches!(
        sc.cast(SpellId::Meteor, &mut mana, &mut caster, &mut dummies),
        Err(SpellError::InsufficientResource { .. })
    ));
    assert_eq!(
        sc.cast(SpellId::Haste, &mut mana, &mut caster, &mut dummies),
        Err(SpellError::NotLearned(SpellId::Haste))
    );
    caster.melee_attacking = true;
    assert!(matches!(
        sc.cast(SpellId::Fireball, &mut mana, &mut caster, &mut dummies),
        Err(SpellError::InvalidCasterState(_))
    ));

    assert_eq!((mana.current(), sc.book().snapshot()), before);
    assert_eq!(sc.book().cooldown_remaining(SpellId::Fireball), 0.0);
    assert_eq!(sc.book().cooldown_remaining(SpellId::Meteor), 0.0);
}

#[test]
fn test_cooldown_blocks_until_elapsed() {
    let (mut sc, mut mana, mut caster) = setup(&[SpellId::ArcaneBolt]);
    let mut dummies: Vec<TrainingDummy> = Vec::new();
    mana = ManaPool { current: 1000.0, max: 1000.0, ..mana };

    sc.cast(SpellId::ArcaneBolt, &mut mana, &mut caster, &mut dummies).unwrap();
    sc.update(0.25, &mut mana, &mut caster, &mut dummies);
    assert!(matches!(
        sc.cast(SpellId::ArcaneBolt, &mut mana, &mut caster, &mut dummies),
        Err(SpellError::OnCooldown { .. })
    ));
    sc.update(0.25, &mut mana, &mut caster, &mut dummies);
    assert!(sc.cast(SpellId::ArcaneBolt, &mut mana, &mut caster, &mut dummies).is_ok());
}

#[test]
fn test_zero_cast_time_never_enters_casting() {
    let catalog = catalog();
    for spell in SpellId::all() {
        if catalog.get(&spell).unwrap().cast_time > 0.0 {
            continue;
        }
        let (mut sc, mut mana, mut caster) = setup(&[spell]);
        let mut dummies: Vec<TrainingDummy> = Vec::new();
        sc.cast(spell, &mut mana, &mut caster, &mut dummies).unwrap();
        assert!(!sc.executor().is_casting(), "{:?} entered Casting", spell);
    }
}

#[test]
fn test_hotbar_uniqueness_over_random_walk() {
    let (mut sc, _, _) = setup(&SpellId::all());
    let book = sc.book_mut();
    let spells = SpellId::all();
    let mut seed: u32 = 7;
    for _ in 0..200 {
        seed = seed.wrapping_mul(1_103_515_245).wrapping_add(12_345);
        let spell = spells[(seed >> 8) as usize % spells.len()];
        let slot = (seed >> 16) as usize % HOTBAR_SLOTS;
        let entry = if seed % 5 == 0 { None } else { Some(spell) };
        book.equip_to_hotbar(entry, slot).unwrap();

        for spell in spells {
            let bound = book.hotbar().iter().filter(|s| **s == Some(spell)).count();
            assert!(bound <= 1, "{:?} bound {} times", spell, bound);
        }
    }
}

#[test]
fn test_expiry_reported_after_all_timers_advance() {
    let (mut sc, mut mana, mut caster) = setup(&[SpellId::Haste, SpellId::ManaShield]);
    let mut dummies: Vec<TrainingDummy> = Vec::new();
    mana = ManaPool { current: 1000.0, max: 1000.0, ..mana };
    sc.cast(SpellId::Haste, &mut mana, &mut caster, &mut dummies).unwrap();
    sc.cast(SpellId::ManaShield, &mut mana, &mut caster, &mut dummies).unwrap();
    let sub = sc.book_mut().events_mut().subscribe();

    // Both run out inside one frame
    sc.update(20.0, &mut mana, &mut caster, &mut dummies);

    let events = sc.book_mut().events_mut().drain(sub);
    assert!(events.contains(&SpellEvent::BuffExpired(SpellId::Haste)));
    assert!(events.contains(&SpellEvent::ShieldExpired(SpellId::ManaShield)));
    assert!(sc.book().active_buffs().is_empty());
    assert!(sc.book().shields().is_empty());
}

#[test]
fn test_nearest_target_selection() {
    let settings = EngineSettings { target_selection: TargetSelection::Nearest, ..Default::default() };
    let mut sc = Spellcaster::new(catalog(), settings);
    sc.book_mut().learn(SpellId::FrostBolt);
    let (mut mana, mut caster) = (ManaPool::new(100.0), TrainingCaster::default());
    let mut dummies = vec![
        TrainingDummy::new(1, Vec3::new(0.9, 1.0, 10.0), 500.0),
        TrainingDummy::new(2, Vec3::new(0.0, 1.0, 10.0), 500.0),
    ];

    sc.cast(SpellId::FrostBolt, &mut mana, &mut caster, &mut dummies).unwrap();
    // 1.2s cast, then the bolt flies 1.25 units per frame
    for _ in 0..60 {
        sc.update(0.05, &mut mana, &mut caster, &mut dummies);
    }

    assert_eq!(dummies[0].damage_taken, 0.0);
    assert_eq!(dummies[1].damage_taken, 35.0);
}

#[test]
fn test_dodging_caster_cannot_cast() {
    let (sc, mana, mut caster) = setup(&[SpellId::Fireball]);
    caster.dodging = true;
    assert!(caster.is_dodging());
    let err = sc.book().can_cast(SpellId::Fireball, &mana, &caster, sc.executor().casting());
    assert_eq!(err.map_err(|e| e.code()), Err("invalid_caster_state"));
}

#[test]
fn test_executor_defaults_to_idle() {
    let executor = CastExecutor::new(EngineSettings::default());
    assert_eq!(executor.status(), CastStatus::Idle);
    assert_eq!(executor.cast_progress(), None);
}
