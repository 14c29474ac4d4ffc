//! Timed state owned by the ability book: cooldowns, buffs, shields and
//! periodic heal/damage effects.

use super::catalog::BuffEffect;
use super::types::SpellId;

/// Timers within this margin of zero count as elapsed.
pub const TIMER_EPSILON: f32 = 1e-4;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Cooldown {
    pub remaining: f32,
    pub total: f32,
}

/// One buff per spell; recasting replaces the remaining time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveBuff {
    pub ability: SpellId,
    pub remaining: f32,
    /// `None` for buffs that exist only as a timed marker
    pub effect: Option<BuffEffect>,
}

/// Damage absorption pool. Removed when either capacity or time runs out.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ActiveShield {
    pub ability: SpellId,
    pub capacity: f32,
    pub remaining: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PeriodicKind {
    Heal,
    Damage,
}

/// Heal or damage that lands every `tick_interval` seconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PeriodicEffect {
    pub source: SpellId,
    pub kind: PeriodicKind,
    pub amount_per_tick: f32,
    pub ticks_remaining: u32,
    pub tick_interval: f32,
    pub time_to_next_tick: f32,
}

impl PeriodicEffect {
    pub fn new(source: SpellId, kind: PeriodicKind, amount_per_tick: f32, ticks: u32, tick_interval: f32) -> Self {
        Self {
            source,
            kind,
            amount_per_tick,
            ticks_remaining: ticks,
            tick_interval,
            time_to_next_tick: tick_interval,
        }
    }

    /// Advance the tick timer and return how many ticks fired.
    ///
    /// A long frame can fire several ticks at once; never more than remain.
    pub fn advance(&mut self, dt: f32) -> u32 {
        self.time_to_next_tick -= dt;
        let mut fired = 0;
        while self.time_to_next_tick <= TIMER_EPSILON && self.ticks_remaining > 0 {
            fired += 1;
            self.ticks_remaining -= 1;
            self.time_to_next_tick += self.tick_interval;
        }
        fired
    }

    pub fn is_finished(&self) -> bool {
        self.ticks_remaining == 0
    }
}
