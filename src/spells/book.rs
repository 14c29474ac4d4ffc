//! Ability Book
//!
//! Per-caster spell state and the single authority on whether a spell can be
//! cast right now. Owns:
//! - the learned set (append-only) and the six hotbar slots
//! - cooldown clocks
//! - active buffs, damage shields and periodic heal/damage effects
//!
//! Every public mutator either applies completely or returns an error and
//! leaves the book untouched.

use bevy::prelude::*;
use smallvec::SmallVec;
use std::collections::HashMap;
use std::sync::Arc;

use super::catalog::AbilityCatalog;
use super::effects::{ActiveBuff, ActiveShield, Cooldown, PeriodicEffect, PeriodicKind, TIMER_EPSILON};
use super::error::SpellError;
use super::events::{BuffSummary, SpellEvent, SpellEvents};
use super::ports::{Caster, CasterStateQuery, ResourcePool};
use super::storage::{LoadoutSnapshot, Storage, StorageError, LOADOUT_KEY};
use super::types::{BuffKind, CasterState, SpellId, HOTBAR_SLOTS};

/// Default spacing between heal-over-time ticks, in seconds.
pub const DEFAULT_REGEN_TICK_INTERVAL: f32 = 1.0;

pub struct AbilityBook {
    catalog: Arc<AbilityCatalog>,
    learned: Vec<SpellId>,
    hotbar: [Option<SpellId>; HOTBAR_SLOTS],
    active_slot: usize,
    cooldowns: HashMap<SpellId, Cooldown>,
    buffs: Vec<ActiveBuff>,
    /// Creation order; absorption walks this front to back
    shields: Vec<ActiveShield>,
    periodic: Vec<PeriodicEffect>,
    regen_tick_interval: f32,
    events: SpellEvents,
}

impl AbilityBook {
    pub fn new(catalog: Arc<AbilityCatalog>) -> Self {
        Self {
            catalog,
            learned: Vec::new(),
            hotbar: [None; HOTBAR_SLOTS],
            active_slot: 0,
            cooldowns: HashMap::new(),
            buffs: Vec::new(),
            shields: Vec::new(),
            periodic: Vec::new(),
            regen_tick_interval: DEFAULT_REGEN_TICK_INTERVAL,
            events: SpellEvents::new(),
        }
    }

    pub fn with_regen_tick_interval(mut self, interval: f32) -> Self {
        if interval > 0.0 {
            self.regen_tick_interval = interval;
        }
        self
    }

    pub fn catalog(&self) -> &Arc<AbilityCatalog> {
        &self.catalog
    }

    pub fn events(&self) -> &SpellEvents {
        &self.events
    }

    pub fn events_mut(&mut self) -> &mut SpellEvents {
        &mut self.events
    }

    // ========================================================================
    // Learning & hotbar
    // ========================================================================

    /// Returns true only when `id` exists and was not already known.
    pub fn learn(&mut self, id: SpellId) -> bool {
        if !self.catalog.contains(&id) || self.is_learned(id) {
            return false;
        }
        self.learned.push(id);
        self.events.emit(SpellEvent::AbilityLearned(id));
        info!("Learned {:?}", id);
        true
    }

    pub fn is_learned(&self, id: SpellId) -> bool {
        self.learned.contains(&id)
    }

    /// Learned spells in the order they were learned
    pub fn learned(&self) -> &[SpellId] {
        &self.learned
    }

    /// Bind `id` to `slot`, or clear the slot with `None`.
    ///
    /// A spell lives in at most one slot, so binding it elsewhere first
    /// clears its previous slot.
    pub fn equip_to_hotbar(&mut self, id: Option<SpellId>, slot: usize) -> Result<(), SpellError> {
        if slot >= HOTBAR_SLOTS {
            return Err(SpellError::InvalidSlot(slot));
        }
        if let Some(id) = id {
            if !self.catalog.contains(&id) {
                return Err(SpellError::UnknownAbility(id));
            }
            if !self.is_learned(id) {
                return Err(SpellError::NotLearned(id));
            }
            if let Some(previous) = self.slot_of(id) {
                self.hotbar[previous] = None;
            }
        }
        self.hotbar[slot] = id;
        self.events.emit(SpellEvent::HotbarChanged(self.hotbar));
        Ok(())
    }

    pub fn hotbar(&self) -> &[Option<SpellId>; HOTBAR_SLOTS] {
        &self.hotbar
    }

    pub fn slot_of(&self, id: SpellId) -> Option<usize> {
        self.hotbar.iter().position(|slot| *slot == Some(id))
    }

    pub fn spell_in_slot(&self, slot: usize) -> Result<Option<SpellId>, SpellError> {
        self.hotbar.get(slot).copied().ok_or(SpellError::InvalidSlot(slot))
    }

    pub fn active_slot(&self) -> usize {
        self.active_slot
    }

    pub fn set_active_slot(&mut self, slot: usize) -> Result<(), SpellError> {
        if slot >= HOTBAR_SLOTS {
            return Err(SpellError::InvalidSlot(slot));
        }
        self.active_slot = slot;
        Ok(())
    }

    // ========================================================================
    // Cast legality & reservation
    // ========================================================================

    /// First failing reason, in order: exists, learned, off cooldown,
    /// affordable, caster free to cast. Never mutates anything.
    pub fn can_cast<P, S>(
        &self,
        id: SpellId,
        pool: &P,
        state: &S,
        casting: Option<SpellId>,
    ) -> Result<(), SpellError>
    where
        P: ResourcePool + ?Sized,
        S: CasterStateQuery + ?Sized,
    {
        let Some(def) = self.catalog.get(&id) else {
            return Err(SpellError::UnknownAbility(id));
        };
        if !self.is_learned(id) {
            return Err(SpellError::NotLearned(id));
        }
        if let Some(cooldown) = self.cooldowns.get(&id) {
            return Err(SpellError::OnCooldown { ability: id, remaining: cooldown.remaining });
        }
        if !pool.can_afford(def.resource_cost) {
            return Err(SpellError::InsufficientResource { ability: id, cost: def.resource_cost });
        }
        let blocked = if state.is_dead() {
            Some(CasterState::Dead)
        } else if state.is_dodging() {
            Some(CasterState::Dodging)
        } else if state.is_melee_attacking() {
            Some(CasterState::MeleeAttacking)
        } else {
            casting.map(CasterState::Casting)
        };
        match blocked {
            Some(reason) => Err(SpellError::InvalidCasterState(reason)),
            None => Ok(()),
        }
    }

    /// Spend the cost and start the cooldown together, or do neither.
    pub fn begin_cast<P, S>(
        &mut self,
        id: SpellId,
        pool: &mut P,
        state: &S,
        casting: Option<SpellId>,
    ) -> Result<(), SpellError>
    where
        P: ResourcePool + ?Sized,
        S: CasterStateQuery + ?Sized,
    {
        if let Err(reason) = self.can_cast(id, &*pool, state, casting) {
            debug!("Rejected {:?}: {}", id, reason);
            return Err(reason);
        }
        let Some(def) = self.catalog.get(&id) else {
            return Err(SpellError::UnknownAbility(id));
        };
        let (cost, cooldown) = (def.resource_cost, def.cooldown);
        pool.spend(cost);
        self.start_cooldown(id, cooldown);
        Ok(())
    }

    fn start_cooldown(&mut self, id: SpellId, seconds: f32) {
        if seconds <= 0.0 {
            return;
        }
        self.cooldowns.insert(id, Cooldown { remaining: seconds, total: seconds });
        if let Some(slot) = self.slot_of(id) {
            self.events.emit(SpellEvent::CooldownChanged { slot, remaining: seconds, total: seconds });
        }
    }

    /// Seconds until `id` can be cast again (0.0 when ready)
    pub fn cooldown_remaining(&self, id: SpellId) -> f32 {
        self.cooldowns.get(&id).map_or(0.0, |cd| cd.remaining)
    }

    pub fn cooldown(&self, id: SpellId) -> Option<Cooldown> {
        self.cooldowns.get(&id).copied()
    }

    // ========================================================================
    // Buffs, shields, periodic effects
    // ========================================================================

    /// Install or refresh the buff defined by `id`.
    pub fn apply_buff(&mut self, id: SpellId) -> Result<(), SpellError> {
        let Some(def) = self.catalog.get(&id) else {
            return Err(SpellError::UnknownAbility(id));
        };
        let (duration, effect) = (def.duration, def.buff);
        match self.buffs.iter_mut().find(|buff| buff.ability == id) {
            Some(existing) => {
                existing.remaining = duration;
                existing.effect = effect;
            }
            None => self.buffs.push(ActiveBuff { ability: id, remaining: duration, effect }),
        }
        self.events.emit(SpellEvent::BuffsChanged(self.active_buffs()));
        Ok(())
    }

    /// Install or refresh the shield defined by `id`.
    ///
    /// A refreshed shield keeps its original position in the absorb order.
    pub fn apply_shield(&mut self, id: SpellId) -> Result<(), SpellError> {
        let Some(def) = self.catalog.get(&id) else {
            return Err(SpellError::UnknownAbility(id));
        };
        let (capacity, remaining) = (def.shield_amount, def.duration);
        match self.shields.iter_mut().find(|shield| shield.ability == id) {
            Some(existing) => {
                existing.capacity = capacity;
                existing.remaining = remaining;
            }
            None => self.shields.push(ActiveShield { ability: id, capacity, remaining }),
        }
        self.events.emit(SpellEvent::ShieldApplied { ability: id, capacity });
        Ok(())
    }

    /// Heal `heal_per_second` for `duration` seconds, one tick per regen
    /// interval. Recasting from the same source replaces the old effect.
    pub fn apply_regen(&mut self, source: SpellId, heal_per_second: f32, duration: f32) {
        let interval = self.regen_tick_interval;
        let ticks = ((duration / interval).round() as u32).max(1);
        let effect = PeriodicEffect::new(source, PeriodicKind::Heal, heal_per_second * interval, ticks, interval);
        self.replace_periodic(effect);
    }

    /// Incoming damage-over-time. Ticks go through shields before health.
    pub fn apply_periodic_damage(&mut self, source: SpellId, per_tick: f32, ticks: u32, interval: f32) {
        if ticks == 0 || interval <= 0.0 {
            return;
        }
        self.replace_periodic(PeriodicEffect::new(source, PeriodicKind::Damage, per_tick, ticks, interval));
    }

    fn replace_periodic(&mut self, effect: PeriodicEffect) {
        match self
            .periodic
            .iter_mut()
            .find(|existing| existing.source == effect.source && existing.kind == effect.kind)
        {
            Some(existing) => *existing = effect,
            None => self.periodic.push(effect),
        }
    }

    /// Run `amount` through every shield in creation order and return what
    /// got through. Depleted shields are removed and reported once the whole
    /// pass is done.
    pub fn absorb_damage(&mut self, amount: f32) -> f32 {
        let mut unabsorbed = amount.max(0.0);
        for shield in self.shields.iter_mut() {
            if unabsorbed <= 0.0 {
                break;
            }
            let absorbed = shield.capacity.min(unabsorbed);
            shield.capacity -= absorbed;
            unabsorbed -= absorbed;
        }

        let depleted: SmallVec<[SpellId; 4]> = self
            .shields
            .iter()
            .filter(|shield| shield.capacity <= 0.0)
            .map(|shield| shield.ability)
            .collect();
        self.shields.retain(|shield| shield.capacity > 0.0);
        for ability in depleted {
            self.events.emit(SpellEvent::ShieldExpired(ability));
        }

        unabsorbed
    }

    /// Full incoming-damage path: damage reduction, shields, then health.
    /// Returns the health damage dealt.
    pub fn take_hit(&mut self, amount: f32, caster: &mut dyn Caster) -> f32 {
        let reduced = amount.max(0.0) * (1.0 - self.damage_reduction());
        let through = self.absorb_damage(reduced);
        if through > 0.0 {
            caster.take_damage(through);
        }
        through
    }

    // ========================================================================
    // Frame update
    // ========================================================================

    /// Advance every timer by `dt`.
    ///
    /// All numeric state is updated first; periodic ticks are applied and
    /// expiry notifications emitted afterwards.
    pub fn update(&mut self, dt: f32, caster: &mut dyn Caster) {
        if dt <= 0.0 {
            return;
        }

        let mut finished_cooldowns: SmallVec<[(SpellId, f32); 4]> = SmallVec::new();
        self.cooldowns.retain(|id, cooldown| {
            cooldown.remaining -= dt;
            if cooldown.remaining <= TIMER_EPSILON {
                finished_cooldowns.push((*id, cooldown.total));
                false
            } else {
                true
            }
        });
        finished_cooldowns.sort_by_key(|(id, _)| *id);

        let mut expired_buffs: SmallVec<[SpellId; 4]> = SmallVec::new();
        for buff in self.buffs.iter_mut() {
            buff.remaining -= dt;
            if buff.remaining <= TIMER_EPSILON {
                expired_buffs.push(buff.ability);
            }
        }
        self.buffs.retain(|buff| buff.remaining > TIMER_EPSILON);

        let mut expired_shields: SmallVec<[SpellId; 4]> = SmallVec::new();
        for shield in self.shields.iter_mut() {
            shield.remaining -= dt;
            if shield.remaining <= TIMER_EPSILON {
                expired_shields.push(shield.ability);
            }
        }
        self.shields.retain(|shield| shield.remaining > TIMER_EPSILON);

        let mut ticks: SmallVec<[(SpellId, PeriodicKind, f32); 4]> = SmallVec::new();
        for effect in self.periodic.iter_mut() {
            for _ in 0..effect.advance(dt) {
                ticks.push((effect.source, effect.kind, effect.amount_per_tick));
            }
        }
        self.periodic.retain(|effect| !effect.is_finished());

        for (source, kind, amount) in ticks {
            match kind {
                PeriodicKind::Heal => {
                    let healed = caster.heal(amount);
                    self.events.emit(SpellEvent::CasterHealed { source, amount: healed });
                }
                PeriodicKind::Damage => {
                    self.take_hit(amount, caster);
                }
            }
        }

        for (id, total) in finished_cooldowns {
            if let Some(slot) = self.slot_of(id) {
                self.events.emit(SpellEvent::CooldownChanged { slot, remaining: 0.0, total });
            }
        }
        for ability in expired_shields {
            self.events.emit(SpellEvent::ShieldExpired(ability));
        }
        if !expired_buffs.is_empty() {
            for ability in &expired_buffs {
                self.events.emit(SpellEvent::BuffExpired(*ability));
            }
            self.events.emit(SpellEvent::BuffsChanged(self.active_buffs()));
        }
    }

    // ========================================================================
    // Buff aggregation
    // ========================================================================

    fn buff_magnitudes(&self, kind: BuffKind) -> impl Iterator<Item = f32> + '_ {
        self.buffs
            .iter()
            .filter_map(|buff| buff.effect)
            .filter(move |effect| effect.kind == kind)
            .map(|effect| effect.magnitude)
    }

    /// Outgoing spell damage multiplier (1.0 = unbuffed)
    pub fn spell_damage_bonus(&self) -> f32 {
        self.buff_magnitudes(BuffKind::SpellDamage).map(|m| 1.0 + m).product()
    }

    /// Movement speed multiplier (1.0 = unbuffed)
    pub fn speed_bonus(&self) -> f32 {
        self.buff_magnitudes(BuffKind::Speed).map(|m| 1.0 + m).product()
    }

    /// Outgoing weapon damage multiplier (1.0 = unbuffed)
    pub fn damage_bonus(&self) -> f32 {
        self.buff_magnitudes(BuffKind::Damage).map(|m| 1.0 + m).product()
    }

    /// Fraction of incoming damage prevented. Reductions stack
    /// multiplicatively, so two 25% reductions give 43.75%.
    pub fn damage_reduction(&self) -> f32 {
        let taken: f32 = self
            .buff_magnitudes(BuffKind::DamageReduction)
            .map(|m| 1.0 - m.clamp(0.0, 1.0))
            .product();
        1.0 - taken
    }

    // ========================================================================
    // Inspection
    // ========================================================================

    pub fn active_buffs(&self) -> Vec<BuffSummary> {
        self.buffs
            .iter()
            .map(|buff| BuffSummary { ability: buff.ability, remaining: buff.remaining })
            .collect()
    }

    pub fn has_buff(&self, id: SpellId) -> bool {
        self.buffs.iter().any(|buff| buff.ability == id)
    }

    pub fn shields(&self) -> &[ActiveShield] {
        &self.shields
    }

    /// Total absorption left across all shields
    pub fn shield_capacity(&self) -> f32 {
        self.shields.iter().map(|shield| shield.capacity).sum()
    }

    pub fn periodic_effects(&self) -> &[PeriodicEffect] {
        &self.periodic
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    pub fn snapshot(&self) -> LoadoutSnapshot {
        LoadoutSnapshot {
            learned: self.learned.clone(),
            hotbar: self.hotbar,
            active_slot: self.active_slot,
        }
    }

    /// Replace the learned set and hotbar with `snapshot`.
    ///
    /// Spells missing from the catalog are dropped, as are hotbar entries
    /// that are not learned or appear twice.
    pub fn restore(&mut self, snapshot: &LoadoutSnapshot) {
        let mut learned: Vec<SpellId> = Vec::with_capacity(snapshot.learned.len());
        for id in &snapshot.learned {
            if !self.catalog.contains(id) {
                warn!("Dropping unknown spell {:?} from saved loadout", id);
            } else if !learned.contains(id) {
                learned.push(*id);
            }
        }

        let mut hotbar = [None; HOTBAR_SLOTS];
        for (slot, entry) in snapshot.hotbar.iter().enumerate() {
            let Some(id) = entry else { continue };
            if learned.contains(id) && !hotbar.contains(&Some(*id)) {
                hotbar[slot] = Some(*id);
            } else {
                warn!("Clearing invalid hotbar slot {} ({:?}) from saved loadout", slot, id);
            }
        }

        self.learned = learned;
        self.hotbar = hotbar;
        self.active_slot = if snapshot.active_slot < HOTBAR_SLOTS { snapshot.active_slot } else { 0 };
        self.events.emit(SpellEvent::HotbarChanged(self.hotbar));
    }

    pub fn save(&self, storage: &mut dyn Storage) -> Result<(), StorageError> {
        storage.save(LOADOUT_KEY, &self.snapshot().to_ron()?)
    }

    /// Restore from `storage`. Returns false when nothing was saved yet.
    pub fn load(&mut self, storage: &dyn Storage) -> Result<bool, StorageError> {
        let Some(contents) = storage.load(LOADOUT_KEY)? else {
            return Ok(false);
        };
        let snapshot = LoadoutSnapshot::from_ron(&contents)?;
        self.restore(&snapshot);
        info!("Restored loadout with {} learned spells", self.learned.len());
        Ok(true)
    }
}
