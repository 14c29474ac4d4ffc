//! Rejection reasons for spell operations.

use thiserror::Error;

use super::types::{CasterState, SpellId, HOTBAR_SLOTS};

/// Every way a cast or hotbar operation can be refused.
///
/// Rejections are ordinary values: the operation that returned one left all
/// state untouched.
#[derive(Error, Debug, Clone, Copy, PartialEq)]
pub enum SpellError {
    #[error("{0:?} is not in the ability catalog")]
    UnknownAbility(SpellId),

    #[error("{0:?} has not been learned")]
    NotLearned(SpellId),

    #[error("{ability:?} is on cooldown ({remaining:.1}s remaining)")]
    OnCooldown { ability: SpellId, remaining: f32 },

    #[error("not enough mana for {ability:?} (needs {cost:.0})")]
    InsufficientResource { ability: SpellId, cost: f32 },

    #[error("cannot cast while {0:?}")]
    InvalidCasterState(CasterState),

    #[error("already casting {0:?}")]
    AlreadyCasting(SpellId),

    #[error("hotbar slot {0} is out of range (0..{max})", max = HOTBAR_SLOTS)]
    InvalidSlot(usize),

    #[error("hotbar slot {0} is empty")]
    EmptySlot(usize),
}

impl SpellError {
    /// Stable machine-readable code for UI feedback.
    pub fn code(&self) -> &'static str {
        match self {
            SpellError::UnknownAbility(_) => "unknown_ability",
            SpellError::NotLearned(_) => "not_learned",
            SpellError::OnCooldown { .. } => "on_cooldown",
            SpellError::InsufficientResource { .. } => "insufficient_resource",
            SpellError::InvalidCasterState(_) => "invalid_caster_state",
            SpellError::AlreadyCasting(_) => "already_casting",
            SpellError::InvalidSlot(_) => "invalid_slot",
            SpellError::EmptySlot(_) => "empty_slot",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cooldown_message_includes_remaining_seconds() {
        let err = SpellError::OnCooldown { ability: SpellId::Fireball, remaining: 2.46 };
        assert_eq!(err.to_string(), "Fireball is on cooldown (2.5s remaining)");
        assert_eq!(err.code(), "on_cooldown");
    }

    #[test]
    fn test_invalid_slot_message() {
        assert_eq!(
            SpellError::InvalidSlot(7).to_string(),
            "hotbar slot 7 is out of range (0..6)"
        );
    }
}
