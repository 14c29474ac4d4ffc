//! One caster's complete spell state: its ability book plus its cast executor.

use std::sync::Arc;

use super::book::AbilityBook;
use super::catalog::AbilityCatalog;
use super::error::SpellError;
use super::executor::{CastContext, CastExecutor, CastOutcome};
use super::ports::{Caster, CombatTarget, ResourcePool};
use super::types::SpellId;
use crate::settings::EngineSettings;

pub struct Spellcaster {
    book: AbilityBook,
    executor: CastExecutor,
}

impl Spellcaster {
    pub fn new(catalog: Arc<AbilityCatalog>, settings: EngineSettings) -> Self {
        Self {
            book: AbilityBook::new(catalog).with_regen_tick_interval(settings.regen_tick_interval),
            executor: CastExecutor::new(settings),
        }
    }

    pub fn book(&self) -> &AbilityBook {
        &self.book
    }

    pub fn book_mut(&mut self) -> &mut AbilityBook {
        &mut self.book
    }

    pub fn executor(&self) -> &CastExecutor {
        &self.executor
    }

    /// Per-frame driver. Book timers first, then the cast and projectiles.
    pub fn update<T: CombatTarget>(
        &mut self,
        dt: f32,
        resources: &mut dyn ResourcePool,
        caster: &mut dyn Caster,
        targets: &mut [T],
    ) {
        self.book.update(dt, caster);
        let mut ctx = CastContext { book: &mut self.book, resources, caster, targets };
        self.executor.update(dt, &mut ctx);
    }

    pub fn cast<T: CombatTarget>(
        &mut self,
        id: SpellId,
        resources: &mut dyn ResourcePool,
        caster: &mut dyn Caster,
        targets: &mut [T],
    ) -> Result<CastOutcome, SpellError> {
        let mut ctx = CastContext { book: &mut self.book, resources, caster, targets };
        self.executor.cast_spell(id, &mut ctx)
    }

    /// Cast whatever is bound to `slot`.
    pub fn cast_slot<T: CombatTarget>(
        &mut self,
        slot: usize,
        resources: &mut dyn ResourcePool,
        caster: &mut dyn Caster,
        targets: &mut [T],
    ) -> Result<CastOutcome, SpellError> {
        let id = self.book.spell_in_slot(slot)?.ok_or(SpellError::EmptySlot(slot))?;
        self.cast(id, resources, caster, targets)
    }

    pub fn set_active_slot(&mut self, slot: usize) -> Result<(), SpellError> {
        self.book.set_active_slot(slot)
    }

    pub fn cast_active_slot<T: CombatTarget>(
        &mut self,
        resources: &mut dyn ResourcePool,
        caster: &mut dyn Caster,
        targets: &mut [T],
    ) -> Result<CastOutcome, SpellError> {
        let slot = self.book.active_slot();
        self.cast_slot(slot, resources, caster, targets)
    }

    pub fn interrupt(&mut self) -> Option<SpellId> {
        self.executor.interrupt_cast(self.book.events_mut())
    }

    /// Incoming hit on the caster. Any health damage breaks the current cast.
    /// Returns the health damage dealt.
    pub fn receive_damage(&mut self, amount: f32, caster: &mut dyn Caster) -> f32 {
        let through = self.book.take_hit(amount, caster);
        if through > 0.0 {
            self.interrupt();
        }
        through
    }
}
