//! Spell engine
//!
//! - `catalog`: read-only ability definitions loaded from RON
//! - `book`: learned spells, hotbar, cooldowns, buffs, shields, periodic effects
//! - `executor`: cast state machine, projectiles, direct and area damage
//! - `caster`: the two combined behind one per-frame driver
//!
//! The engine owns no game objects. Mana, the caster's body and targets are
//! reached through the traits in `ports`; persistence through `storage`.

pub mod book;
pub mod caster;
pub mod catalog;
pub mod effects;
pub mod error;
pub mod events;
pub mod executor;
pub mod formula;
pub mod ports;
pub mod projectiles;
pub mod storage;
pub mod types;

pub use book::AbilityBook;
pub use caster::Spellcaster;
pub use catalog::{AbilityCatalog, AbilityDefinition, BuffEffect};
pub use error::SpellError;
pub use events::{BuffSummary, SpellEvent, SpellEvents, Subscription};
pub use executor::{CastContext, CastExecutor, CastOutcome, CastStatus};
pub use ports::{Caster, CasterStateQuery, CombatTarget, ResourcePool};
pub use projectiles::{Projectile, Termination};
pub use storage::{FileStorage, LoadoutSnapshot, MemoryStorage, Storage, StorageError};
pub use types::*;
