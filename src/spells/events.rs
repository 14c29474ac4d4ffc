//! Spell notifications
//!
//! The engine never calls UI or audio code directly. Everything observable is
//! pushed into a [`SpellEvents`] channel; any number of subscribers each get
//! their own copy of every event emitted after they subscribed.

use bevy::prelude::*;

use super::types::{SpellId, TargetId, HOTBAR_SLOTS};

/// A buff as reported to listeners.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BuffSummary {
    pub ability: SpellId,
    pub remaining: f32,
}

/// Everything the spell engine reports to the outside world.
#[derive(Event, Debug, Clone, PartialEq)]
pub enum SpellEvent {
    AbilityLearned(SpellId),
    /// A bound spell's cooldown started or finished (`remaining == 0.0`)
    CooldownChanged {
        slot: usize,
        remaining: f32,
        total: f32,
    },
    HotbarChanged([Option<SpellId>; HOTBAR_SLOTS]),
    BuffsChanged(Vec<BuffSummary>),
    CastStarted(SpellId),
    CastCompleted(SpellId),
    CastInterrupted(SpellId),
    BuffExpired(SpellId),
    /// A shield was installed or refreshed with this much absorption
    ShieldApplied {
        ability: SpellId,
        capacity: f32,
    },
    ShieldExpired(SpellId),
    SpellHit {
        ability: SpellId,
        target: TargetId,
        damage: f32,
    },
    /// Health restored to the caster by a spell or periodic effect
    CasterHealed {
        source: SpellId,
        amount: f32,
    },
}

/// Handle returned by [`SpellEvents::subscribe`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Subscription(usize);

/// Multi-subscriber event channel.
///
/// Emitting with no subscribers drops the event.
#[derive(Debug, Default)]
pub struct SpellEvents {
    queues: Vec<Option<Vec<SpellEvent>>>,
}

impl SpellEvents {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new listener. It only sees events emitted from now on.
    pub fn subscribe(&mut self) -> Subscription {
        if let Some(index) = self.queues.iter().position(Option::is_none) {
            self.queues[index] = Some(Vec::new());
            return Subscription(index);
        }
        self.queues.push(Some(Vec::new()));
        Subscription(self.queues.len() - 1)
    }

    /// Stop delivering to `subscription`; pending events are discarded.
    pub fn unsubscribe(&mut self, subscription: Subscription) {
        if let Some(queue) = self.queues.get_mut(subscription.0) {
            *queue = None;
        }
    }

    pub fn emit(&mut self, event: SpellEvent) {
        for queue in self.queues.iter_mut().flatten() {
            queue.push(event.clone());
        }
    }

    /// Take every event queued for `subscription`, oldest first.
    pub fn drain(&mut self, subscription: Subscription) -> Vec<SpellEvent> {
        self.queues
            .get_mut(subscription.0)
            .and_then(Option::as_mut)
            .map(std::mem::take)
            .unwrap_or_default()
    }

    pub fn subscriber_count(&self) -> usize {
        self.queues.iter().flatten().count()
    }
}
