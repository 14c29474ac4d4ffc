//! Cast Executor
//!
//! Drives the cast state machine and resolves spells into effects:
//!
//! `Idle` → `cast_spell` (cast time > 0) → `Casting` → `update` accumulates
//! elapsed time → resolve once → `Idle`
//!
//! Instant spells resolve inside `cast_spell` and never enter `Casting`.
//! `interrupt_cast` drops back to `Idle` without resolving; the mana spent
//! when the cast began stays spent.

use bevy::prelude::*;
use std::sync::Arc;

use super::book::AbilityBook;
use super::catalog::AbilityDefinition;
use super::effects::TIMER_EPSILON;
use super::error::SpellError;
use super::events::{SpellEvent, SpellEvents};
use super::formula::{area_damage, spell_damage, spell_healing};
use super::ports::{Caster, CombatTarget, ResourcePool};
use super::projectiles::{Projectile, Termination};
use super::types::{DamageType, SpellId, TargetShape};
use crate::settings::EngineSettings;

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CastStatus {
    #[default]
    Idle,
    Casting {
        ability: SpellId,
        elapsed: f32,
        total: f32,
    },
}

/// What a successful `cast_spell` did.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CastOutcome {
    /// Entered `Casting`; resolves after `cast_time` seconds
    Started { ability: SpellId, cast_time: f32 },
    /// Instant spell, already resolved
    Resolved(SpellId),
}

/// Everything a cast touches that the executor does not own.
pub struct CastContext<'a, T: CombatTarget> {
    pub book: &'a mut AbilityBook,
    pub resources: &'a mut dyn ResourcePool,
    pub caster: &'a mut dyn Caster,
    pub targets: &'a mut [T],
}

#[derive(Debug, Default)]
pub struct CastExecutor {
    status: CastStatus,
    /// Set while a completed cast is being resolved
    resolving: bool,
    projectiles: Vec<Projectile>,
    next_projectile_id: u32,
    settings: EngineSettings,
}

impl CastExecutor {
    pub fn new(settings: EngineSettings) -> Self {
        Self {
            settings,
            ..Default::default()
        }
    }

    pub fn status(&self) -> CastStatus {
        self.status
    }

    pub fn is_casting(&self) -> bool {
        matches!(self.status, CastStatus::Casting { .. })
    }

    /// Spell currently being cast, if any
    pub fn casting(&self) -> Option<SpellId> {
        match self.status {
            CastStatus::Casting { ability, .. } => Some(ability),
            CastStatus::Idle => None,
        }
    }

    /// Cast bar fill in `0.0..=1.0`
    pub fn cast_progress(&self) -> Option<f32> {
        match self.status {
            CastStatus::Casting { elapsed, total, .. } => Some((elapsed / total).clamp(0.0, 1.0)),
            CastStatus::Idle => None,
        }
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    /// Start casting `id`. Only one cast can be in flight.
    pub fn cast_spell<T: CombatTarget>(
        &mut self,
        id: SpellId,
        ctx: &mut CastContext<'_, T>,
    ) -> Result<CastOutcome, SpellError> {
        if let CastStatus::Casting { ability, .. } = self.status {
            return Err(SpellError::AlreadyCasting(ability));
        }

        ctx.book.begin_cast(id, &mut *ctx.resources, &*ctx.caster, None)?;

        let cast_time = ctx
            .book
            .catalog()
            .get(&id)
            .map_or(0.0, |def| def.cast_time);

        ctx.book.events_mut().emit(SpellEvent::CastStarted(id));

        if cast_time <= 0.0 {
            self.resolve_spell(id, ctx);
            ctx.book.events_mut().emit(SpellEvent::CastCompleted(id));
            return Ok(CastOutcome::Resolved(id));
        }

        self.status = CastStatus::Casting { ability: id, elapsed: 0.0, total: cast_time };
        debug!("Casting {:?} ({:.1}s)", id, cast_time);
        Ok(CastOutcome::Started { ability: id, cast_time })
    }

    /// Cancel the cast in progress. No refund. Returns the cancelled spell.
    pub fn interrupt_cast(&mut self, events: &mut SpellEvents) -> Option<SpellId> {
        let ability = self.casting()?;
        self.status = CastStatus::Idle;
        events.emit(SpellEvent::CastInterrupted(ability));
        info!("{:?} interrupted", ability);
        Some(ability)
    }

    /// Advance the cast timer, then every projectile in flight.
    pub fn update<T: CombatTarget>(&mut self, dt: f32, ctx: &mut CastContext<'_, T>) {
        if let CastStatus::Casting { ability, elapsed, total } = self.status {
            if ctx.caster.is_dead() {
                self.interrupt_cast(ctx.book.events_mut());
            } else {
                let elapsed = elapsed + dt;
                self.status = CastStatus::Casting { ability, elapsed, total };
                if elapsed + TIMER_EPSILON >= total && !self.resolving {
                    self.resolving = true;
                    self.status = CastStatus::Idle;
                    self.resolve_spell(ability, ctx);
                    ctx.book.events_mut().emit(SpellEvent::CastCompleted(ability));
                    self.resolving = false;
                }
            }
        }

        self.update_projectiles(dt, ctx);
    }

    fn resolve_spell<T: CombatTarget>(&mut self, id: SpellId, ctx: &mut CastContext<'_, T>) {
        let catalog = Arc::clone(ctx.book.catalog());
        let Some(def) = catalog.get(&id) else {
            warn!("Resolving {:?} with no definition", id);
            return;
        };

        match def.target_shape {
            TargetShape::OnSelf => resolve_on_self(id, def, ctx),
            TargetShape::Direction | TargetShape::Enemy => self.spawn_projectile(id, def, ctx),
            TargetShape::AreaAroundSelf => {
                let center = ctx.caster.position();
                let damage = outgoing_damage(def, ctx);
                apply_area(id, center, def.aoe_radius, damage, def.damage_type, ctx);
            }
            TargetShape::AreaAtPoint => {
                let facing = ctx.caster.facing();
                let ahead = Vec3::new(facing.x, 0.0, facing.z).normalize_or_zero();
                let ahead = if ahead == Vec3::ZERO { Vec3::Z } else { ahead };
                let center = ctx.caster.position()
                    + ahead * def.range * self.settings.area_point_range_fraction;
                let damage = outgoing_damage(def, ctx);
                apply_area(id, center, def.aoe_radius, damage, def.damage_type, ctx);
            }
        }
    }

    fn spawn_projectile<T: CombatTarget>(
        &mut self,
        id: SpellId,
        def: &AbilityDefinition,
        ctx: &mut CastContext<'_, T>,
    ) {
        let direction = ctx.caster.facing().normalize_or_zero();
        let direction = if direction == Vec3::ZERO { Vec3::Z } else { direction };

        let heal_on_hit = if def.is_life_drain() {
            spell_healing(def, ctx.caster.stat(def.scales_with))
        } else {
            0.0
        };

        self.next_projectile_id += 1;
        let projectile = Projectile {
            id: self.next_projectile_id,
            ability: id,
            position: ctx.caster.position() + Vec3::Y * self.settings.launch_height,
            velocity: direction * def.projectile_speed,
            damage: outgoing_damage(def, ctx),
            heal_on_hit,
            damage_type: def.damage_type,
            distance_traveled: 0.0,
            max_distance: def.range,
            aoe_radius: def.aoe_radius,
        };
        debug!("Spawned {:?} projectile #{} ({} damage)", id, projectile.id, projectile.damage);
        self.projectiles.push(projectile);
    }

    fn update_projectiles<T: CombatTarget>(&mut self, dt: f32, ctx: &mut CastContext<'_, T>) {
        if self.projectiles.is_empty() || dt <= 0.0 {
            return;
        }
        let settings = self.settings;
        let mut projectiles = std::mem::take(&mut self.projectiles);
        projectiles.retain_mut(|projectile| {
            projectile.advance(dt);
            match projectile.check_termination(&*ctx.targets, &settings) {
                None => true,
                Some(termination) => {
                    detonate(projectile, termination, &mut *ctx);
                    false
                }
            }
        });
        self.projectiles = projectiles;
    }
}

/// Scaled, buffed, floored damage for `def` as the caster stands right now.
fn outgoing_damage<T: CombatTarget>(def: &AbilityDefinition, ctx: &CastContext<'_, T>) -> f32 {
    spell_damage(def, ctx.caster.stat(def.scales_with), ctx.book.spell_damage_bonus())
}

fn resolve_on_self<T: CombatTarget>(id: SpellId, def: &AbilityDefinition, ctx: &mut CastContext<'_, T>) {
    if def.is_heal() && def.duration > 0.0 {
        let total = spell_healing(def, ctx.caster.stat(def.scales_with));
        ctx.book.apply_regen(id, total / def.duration, def.duration);
    } else if def.is_heal() {
        let amount = spell_healing(def, ctx.caster.stat(def.scales_with));
        let healed = ctx.caster.heal(amount);
        ctx.book.events_mut().emit(SpellEvent::CasterHealed { source: id, amount: healed });
    } else if def.shield_amount > 0.0 {
        if let Err(e) = ctx.book.apply_shield(id) {
            warn!("Failed to apply shield: {}", e);
        }
    } else if let Err(e) = ctx.book.apply_buff(id) {
        warn!("Failed to apply buff: {}", e);
    }
}

fn detonate<T: CombatTarget>(projectile: &Projectile, termination: Termination, ctx: &mut CastContext<'_, T>) {
    if let Termination::Hit(index) = termination {
        if let Some(target) = ctx.targets.get_mut(index) {
            let dealt = target.apply_damage(projectile.damage, projectile.damage_type);
            let target = target.target_id();
            ctx.book.events_mut().emit(SpellEvent::SpellHit {
                ability: projectile.ability,
                target,
                damage: dealt,
            });
            if projectile.heal_on_hit > 0.0 {
                let healed = ctx.caster.heal(projectile.heal_on_hit);
                ctx.book.events_mut().emit(SpellEvent::CasterHealed {
                    source: projectile.ability,
                    amount: healed,
                });
            }
        }
    }
    debug!("Projectile #{} ended: {:?}", projectile.id, termination);

    if projectile.aoe_radius > 0.0 {
        apply_area(
            projectile.ability,
            projectile.position,
            projectile.aoe_radius,
            projectile.damage,
            projectile.damage_type,
            ctx,
        );
    }
}

fn apply_area<T: CombatTarget>(
    ability: SpellId,
    center: Vec3,
    radius: f32,
    damage: f32,
    damage_type: Option<DamageType>,
    ctx: &mut CastContext<'_, T>,
) {
    for target in ctx.targets.iter_mut() {
        if !target.is_alive() {
            continue;
        }
        let distance = target.position().distance(center);
        let Some(amount) = area_damage(damage, distance, radius) else {
            continue;
        };
        let dealt = target.apply_damage(amount, damage_type);
        ctx.book.events_mut().emit(SpellEvent::SpellHit {
            ability,
            target: target.target_id(),
            damage: dealt,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::arena::{ManaPool, TrainingCaster, TrainingDummy};
    use crate::spells::catalog::AbilityCatalog;

    struct Rig {
        book: AbilityBook,
        pool: ManaPool,
        caster: TrainingCaster,
        dummies: Vec<TrainingDummy>,
        executor: CastExecutor,
    }

    impl Rig {
        fn new(spells: &[SpellId]) -> Self {
            let catalog = Arc::new(AbilityCatalog::embedded().unwrap());
            let mut book = AbilityBook::new(catalog);
            for spell in spells {
                book.learn(*spell);
            }
            Self {
                book,
                pool: ManaPool::new(100.0),
                caster: TrainingCaster::default(),
                dummies: Vec::new(),
                executor: CastExecutor::new(EngineSettings::default()),
            }
        }

        fn cast(&mut self, id: SpellId) -> Result<CastOutcome, SpellError> {
            let mut ctx = CastContext {
                book: &mut self.book,
                resources: &mut self.pool,
                caster: &mut self.caster,
                targets: &mut self.dummies,
            };
            self.executor.cast_spell(id, &mut ctx)
        }

        fn update(&mut self, dt: f32) {
            let mut ctx = CastContext {
                book: &mut self.book,
                resources: &mut self.pool,
                caster: &mut self.caster,
                targets: &mut self.dummies,
            };
            self.executor.update(dt, &mut ctx);
        }
    }

    #[test]
    fn test_instant_cast_never_enters_casting() {
        let mut rig = Rig::new(&[SpellId::Empower]);
        assert_eq!(rig.cast(SpellId::Empower), Ok(CastOutcome::Resolved(SpellId::Empower)));
        assert!(!rig.executor.is_casting());
        assert!(rig.book.has_buff(SpellId::Empower));
    }

    #[test]
    fn test_second_cast_rejected_while_casting() {
        let mut rig = Rig::new(&[SpellId::Meteor, SpellId::Fireball]);
        rig.cast(SpellId::Meteor).unwrap();
        let mana = rig.pool.current();

        assert_eq!(rig.cast(SpellId::Fireball), Err(SpellError::AlreadyCasting(SpellId::Meteor)));
        assert_eq!(rig.pool.current(), mana, "rejected cast must not spend");
    }

    #[test]
    fn test_timed_cast_resolves_exactly_once() {
        let mut rig = Rig::new(&[SpellId::Mend]);
        rig.caster.health = 10.0;
        let sub = rig.book.events_mut().subscribe();

        rig.cast(SpellId::Mend).unwrap();
        for _ in 0..20 {
            rig.update(0.1);
        }

        assert_eq!(rig.caster.health, 70.0);
        let completions = rig
            .book
            .events_mut()
            .drain(sub)
            .into_iter()
            .filter(|e| matches!(e, SpellEvent::CastCompleted(_)))
            .count();
        assert_eq!(completions, 1);
    }

    #[test]
    fn test_interrupt_when_idle_is_noop() {
        let mut rig = Rig::new(&[]);
        assert_eq!(rig.executor.interrupt_cast(rig.book.events_mut()), None);
        assert_eq!(rig.executor.status(), CastStatus::Idle);
    }

    #[test]
    fn test_caster_death_cancels_cast() {
        let mut rig = Rig::new(&[SpellId::Meteor]);
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(0.0, 0.0, 12.0), 500.0));
        rig.cast(SpellId::Meteor).unwrap();
        rig.update(0.5);
        rig.caster.dead = true;
        rig.update(5.0);

        assert!(!rig.executor.is_casting());
        assert_eq!(rig.dummies[0].damage_taken, 0.0, "cancelled cast must not land");
    }

    #[test]
    fn test_meteor_lands_ahead_of_caster() {
        let mut rig = Rig::new(&[SpellId::Meteor]);
        // Meteor range 24, lands at half range
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(0.0, 0.0, 12.0), 500.0));
        rig.dummies.push(TrainingDummy::new(2, Vec3::new(0.0, 0.0, 30.0), 500.0));
        rig.cast(SpellId::Meteor).unwrap();
        rig.update(2.0);

        assert_eq!(rig.dummies[0].damage_taken, 90.0);
        assert_eq!(rig.dummies[1].damage_taken, 0.0);
    }

    #[test]
    fn test_flame_nova_falloff_around_caster() {
        let mut rig = Rig::new(&[SpellId::FlameNova]);
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(0.0, 0.0, 0.0), 500.0));
        rig.dummies.push(TrainingDummy::new(2, Vec3::new(6.0, 0.0, 0.0), 500.0));
        rig.dummies.push(TrainingDummy::new(3, Vec3::new(7.0, 0.0, 0.0), 500.0));
        rig.cast(SpellId::FlameNova).unwrap();

        assert_eq!(rig.dummies[0].damage_taken, 30.0);
        assert_eq!(rig.dummies[1].damage_taken, 21.0, "70% at the edge");
        assert_eq!(rig.dummies[2].damage_taken, 0.0);
    }

    #[test]
    fn test_projectile_damage_fixed_at_spawn() {
        let mut rig = Rig::new(&[SpellId::Empower, SpellId::FrostBolt]);
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(0.0, 1.0, 20.0), 500.0));
        rig.cast(SpellId::Empower).unwrap();
        rig.cast(SpellId::FrostBolt).unwrap();
        for _ in 0..12 {
            rig.update(0.1);
        }
        assert_eq!(rig.executor.projectiles().len(), 1);

        // Drop the buff while the bolt is in flight
        rig.book = {
            let mut book = AbilityBook::new(Arc::clone(rig.book.catalog()));
            book.learn(SpellId::FrostBolt);
            book
        };
        for _ in 0..10 {
            rig.update(0.1);
        }

        // 35 * 1.2 = 42
        assert_eq!(rig.dummies[0].damage_taken, 42.0);
        assert!(rig.executor.projectiles().is_empty());
    }

    #[test]
    fn test_drain_life_heals_on_hit() {
        let mut rig = Rig::new(&[SpellId::DrainLife]);
        rig.caster.health = 50.0;
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(0.0, 1.0, 5.0), 500.0));
        rig.cast(SpellId::DrainLife).unwrap();
        assert_eq!(rig.caster.health, 50.0, "no heal at cast time");

        for _ in 0..20 {
            rig.update(0.1);
        }

        assert_eq!(rig.dummies[0].damage_taken, 25.0);
        assert_eq!(rig.caster.health, 62.0);
    }

    #[test]
    fn test_enemy_shape_fires_along_facing() {
        let mut rig = Rig::new(&[SpellId::ArcaneBolt]);
        rig.caster.facing = Vec3::new(2.0, 0.0, 0.0);
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(5.0, 1.0, 0.0), 500.0));
        assert_eq!(rig.cast(SpellId::ArcaneBolt), Ok(CastOutcome::Resolved(SpellId::ArcaneBolt)));

        let bolt = rig.executor.projectiles()[0];
        assert_eq!(bolt.velocity, Vec3::new(35.0, 0.0, 0.0), "normalized facing times speed");
        assert_eq!(bolt.position, Vec3::new(0.0, 1.0, 0.0));
        assert_eq!(bolt.max_distance, 25.0);

        for _ in 0..5 {
            rig.update(0.05);
        }
        assert_eq!(rig.dummies[0].damage_taken, 18.0);
        assert!(rig.executor.projectiles().is_empty());
    }

    #[test]
    fn test_projectile_explodes_on_ground() {
        let mut rig = Rig::new(&[SpellId::Fireball]);
        rig.caster.facing = Vec3::new(0.0, -1.0, 1.0);
        // Off to the side, out of direct-hit reach of the impact point
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(2.0, 0.0, 1.4142135), 500.0));
        let sub = rig.book.events_mut().subscribe();
        rig.cast(SpellId::Fireball).unwrap();

        rig.update(0.1);

        assert!(rig.executor.projectiles().is_empty(), "projectile below ground ends");
        // 40 * (1 - 0.3 * 2.04 / 3) = 31.8
        assert_eq!(rig.dummies[0].damage_taken, 31.0);
        let hits = rig
            .book
            .events_mut()
            .drain(sub)
            .into_iter()
            .filter(|e| matches!(e, SpellEvent::SpellHit { .. }))
            .count();
        assert_eq!(hits, 1, "area damage only, no direct hit");
    }

    #[test]
    fn test_projectile_explodes_at_max_range() {
        let mut rig = Rig::new(&[SpellId::Fireball]);
        rig.dummies.push(TrainingDummy::new(1, Vec3::new(0.0, 1.0, 32.0), 500.0));
        rig.cast(SpellId::Fireball).unwrap();

        for _ in 0..14 {
            rig.update(0.1);
        }
        assert_eq!(rig.executor.projectiles().len(), 1, "still short of range 30");
        rig.update(0.1);

        assert!(rig.executor.projectiles().is_empty());
        // Detonates at z = 30, 2 units short of the dummy
        assert_eq!(rig.dummies[0].damage_taken, 32.0);
    }
}
