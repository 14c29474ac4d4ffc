//! Training arena
//!
//! Concrete stand-ins for the game-side pieces the spell engine talks to:
//! a mana pool, a caster body and training dummies. Used by the Bevy plugin,
//! the headless runner and tests.

use bevy::prelude::*;
use std::sync::Arc;

use crate::settings::EngineSettings;
use crate::spells::{
    AbilityCatalog, CastOutcome, Caster, CasterStateQuery, CombatTarget, DamageType, ResourcePool,
    ScalingStat, SpellError, SpellEvent, SpellId, Spellcaster, Subscription, TargetId,
};

/// Mana with optional passive regeneration
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ManaPool {
    pub current: f32,
    pub max: f32,
    /// Mana restored per second by `tick`
    pub regen_per_second: f32,
}

impl ManaPool {
    /// Full pool without regeneration
    pub fn new(max: f32) -> Self {
        Self { current: max, max, regen_per_second: 0.0 }
    }

    pub fn with_regen(mut self, per_second: f32) -> Self {
        self.regen_per_second = per_second.max(0.0);
        self
    }

    pub fn tick(&mut self, dt: f32) {
        if self.regen_per_second > 0.0 && dt > 0.0 {
            self.restore(self.regen_per_second * dt);
        }
    }
}

impl ResourcePool for ManaPool {
    fn can_afford(&self, cost: f32) -> bool {
        self.current >= cost
    }

    fn spend(&mut self, cost: f32) {
        self.current = (self.current - cost).max(0.0);
    }

    fn restore(&mut self, amount: f32) -> f32 {
        let before = self.current;
        self.current = (self.current + amount.max(0.0)).min(self.max);
        self.current - before
    }

    fn current(&self) -> f32 {
        self.current
    }
}

/// The player character as the spell engine sees it.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingCaster {
    pub health: f32,
    pub max_health: f32,
    pub position: Vec3,
    pub facing: Vec3,
    pub spell_power: f32,
    pub intellect: f32,
    pub strength: f32,
    pub dead: bool,
    pub dodging: bool,
    pub melee_attacking: bool,
}

impl Default for TrainingCaster {
    fn default() -> Self {
        Self {
            health: 100.0,
            max_health: 100.0,
            position: Vec3::ZERO,
            facing: Vec3::Z,
            spell_power: 0.0,
            intellect: 0.0,
            strength: 0.0,
            dead: false,
            dodging: false,
            melee_attacking: false,
        }
    }
}

impl CasterStateQuery for TrainingCaster {
    fn is_dead(&self) -> bool {
        self.dead || self.health <= 0.0
    }

    fn is_dodging(&self) -> bool {
        self.dodging
    }

    fn is_melee_attacking(&self) -> bool {
        self.melee_attacking
    }
}

impl Caster for TrainingCaster {
    fn position(&self) -> Vec3 {
        self.position
    }

    fn facing(&self) -> Vec3 {
        self.facing
    }

    fn stat(&self, stat: ScalingStat) -> f32 {
        match stat {
            ScalingStat::SpellPower => self.spell_power,
            ScalingStat::Intellect => self.intellect,
            ScalingStat::Strength => self.strength,
            ScalingStat::None => 0.0,
        }
    }

    fn heal(&mut self, amount: f32) -> f32 {
        if self.is_dead() {
            return 0.0;
        }
        let before = self.health;
        self.health = (self.health + amount.max(0.0)).min(self.max_health);
        self.health - before
    }

    fn take_damage(&mut self, amount: f32) {
        self.health = (self.health - amount.max(0.0)).max(0.0);
    }
}

/// Target that tallies what it has taken.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingDummy {
    pub id: TargetId,
    pub position: Vec3,
    pub health: f32,
    pub max_health: f32,
    pub damage_taken: f32,
    /// Fraction of damage of one type ignored (0.5 = half)
    pub resistance: Option<(DamageType, f32)>,
}

impl TrainingDummy {
    pub fn new(id: u32, position: Vec3, health: f32) -> Self {
        Self {
            id: TargetId(id),
            position,
            health,
            max_health: health,
            damage_taken: 0.0,
            resistance: None,
        }
    }

    pub fn with_resistance(mut self, damage_type: DamageType, fraction: f32) -> Self {
        self.resistance = Some((damage_type, fraction.clamp(0.0, 1.0)));
        self
    }
}

impl CombatTarget for TrainingDummy {
    fn target_id(&self) -> TargetId {
        self.id
    }

    fn position(&self) -> Vec3 {
        self.position
    }

    fn is_alive(&self) -> bool {
        self.health > 0.0
    }

    fn apply_damage(&mut self, amount: f32, damage_type: Option<DamageType>) -> f32 {
        if !self.is_alive() {
            return 0.0;
        }
        let mitigated = match (self.resistance, damage_type) {
            (Some((resisted, fraction)), Some(incoming)) if resisted == incoming => {
                (amount * (1.0 - fraction)).floor()
            }
            _ => amount,
        };
        let dealt = mitigated.max(0.0).min(self.health);
        self.health -= dealt;
        self.damage_taken += dealt;
        dealt
    }
}

/// One caster and its surroundings, owned by the Bevy world.
#[derive(Resource)]
pub struct SpellArena {
    pub spellcaster: Spellcaster,
    pub mana: ManaPool,
    pub caster: TrainingCaster,
    pub dummies: Vec<TrainingDummy>,
    /// Simulated seconds since the arena was created
    pub elapsed: f32,
    /// Opened at construction so nothing emitted before the first frame is lost
    event_subscription: Subscription,
}

impl SpellArena {
    pub fn new(catalog: Arc<AbilityCatalog>, settings: EngineSettings, mana: ManaPool) -> Self {
        let mut spellcaster = Spellcaster::new(catalog, settings);
        let event_subscription = spellcaster.book_mut().events_mut().subscribe();
        Self {
            spellcaster,
            mana,
            caster: TrainingCaster::default(),
            dummies: Vec::new(),
            elapsed: 0.0,
            event_subscription,
        }
    }

    /// Engine events since the last drain, including those from setup
    pub fn drain_events(&mut self) -> Vec<SpellEvent> {
        let subscription = self.event_subscription;
        self.spellcaster.book_mut().events_mut().drain(subscription)
    }

    pub fn update(&mut self, dt: f32) {
        if dt <= 0.0 {
            return;
        }
        self.elapsed += dt;
        self.mana.tick(dt);
        self.spellcaster
            .update(dt, &mut self.mana, &mut self.caster, &mut self.dummies);
    }

    pub fn cast(&mut self, id: SpellId) -> Result<CastOutcome, SpellError> {
        self.spellcaster
            .cast(id, &mut self.mana, &mut self.caster, &mut self.dummies)
    }

    pub fn cast_slot(&mut self, slot: usize) -> Result<CastOutcome, SpellError> {
        self.spellcaster
            .cast_slot(slot, &mut self.mana, &mut self.caster, &mut self.dummies)
    }

    pub fn receive_damage(&mut self, amount: f32) -> f32 {
        self.spellcaster.receive_damage(amount, &mut self.caster)
    }

    pub fn interrupt(&mut self) -> Option<SpellId> {
        self.spellcaster.interrupt()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mana_restore_is_capped() {
        let mut pool = ManaPool::new(100.0);
        pool.spend(30.0);
        assert_eq!(pool.restore(50.0), 30.0);
        assert_eq!(pool.current(), 100.0);
    }

    #[test]
    fn test_mana_regen_ticks() {
        let mut pool = ManaPool::new(100.0).with_regen(5.0);
        pool.spend(20.0);
        pool.tick(2.0);
        assert_eq!(pool.current(), 90.0);
    }

    #[test]
    fn test_dummy_resistance_only_matches_type() {
        let mut dummy = TrainingDummy::new(1, Vec3::ZERO, 100.0).with_resistance(DamageType::Fire, 0.5);
        assert_eq!(dummy.apply_damage(40.0, Some(DamageType::Fire)), 20.0);
        assert_eq!(dummy.apply_damage(40.0, Some(DamageType::Frost)), 40.0);
        assert_eq!(dummy.damage_taken, 60.0);
    }

    #[test]
    fn test_dummy_cannot_drop_below_zero() {
        let mut dummy = TrainingDummy::new(1, Vec3::ZERO, 10.0);
        assert_eq!(dummy.apply_damage(40.0, None), 10.0);
        assert!(!dummy.is_alive());
        assert_eq!(dummy.apply_damage(40.0, None), 0.0);
    }

    #[test]
    fn test_setup_events_reach_first_drain() {
        let catalog = Arc::new(AbilityCatalog::embedded().unwrap());
        let mut arena = SpellArena::new(catalog, EngineSettings::default(), ManaPool::new(100.0));
        arena.spellcaster.book_mut().learn(SpellId::FlameNova);
        arena.dummies.push(TrainingDummy::new(1, Vec3::new(1.0, 0.0, 0.0), 100.0));
        arena.cast(SpellId::FlameNova).unwrap();

        let events = arena.drain_events();
        assert_eq!(events[0], SpellEvent::AbilityLearned(SpellId::FlameNova));
        assert!(events.contains(&SpellEvent::SpellHit {
            ability: SpellId::FlameNova,
            target: TargetId(1),
            damage: 28.0,
        }));
        assert!(arena.drain_events().is_empty());
    }

    #[test]
    fn test_dead_caster_cannot_be_healed() {
        let mut caster = TrainingCaster::default();
        caster.take_damage(500.0);
        assert!(caster.is_dead());
        assert_eq!(caster.heal(50.0), 0.0);
    }
}
