//! Headless scenario execution
//!
//! Runs a scripted spellcasting session in a windowless Bevy app with a fixed
//! frame step, suitable for automated testing.

use bevy::prelude::*;
use bevy::time::TimeUpdateStrategy;
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use crate::arena::SpellArena;
use crate::combat::log::{CombatLog, CombatLogEventType};
use crate::combat::systems::advance_spell_arena;
use crate::combat::SpellcastingPlugin;
use crate::spells::{AbilityCatalog, CastOutcome, CombatTarget, ResourcePool, SpellError, SpellId};

use super::config::{ScenarioAction, ScenarioConfig, TimedAction};

/// Actions due within this margin of the current time fire this frame
const SCHEDULE_EPSILON: f32 = 1e-4;

/// Result of a completed headless scenario
///
/// This struct provides programmatic access to results for testing and analysis.
#[derive(Debug, Clone, Serialize)]
pub struct ScenarioResult {
    /// Simulated seconds that elapsed
    pub elapsed: f32,
    pub caster_health: f32,
    pub caster_mana: f32,
    pub dummies: Vec<DummyResult>,
    /// Casts that were accepted, in order
    pub casts: Vec<CastRecord>,
    /// Scripted actions the engine refused
    pub rejections: Vec<Rejection>,
    pub total_damage: f32,
    pub total_healing: f32,
}

#[derive(Debug, Clone, Serialize)]
pub struct DummyResult {
    pub id: u32,
    pub health: f32,
    pub damage_taken: f32,
    pub alive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CastRecord {
    pub at: f32,
    pub spell: SpellId,
    /// False when the cast entered a cast bar
    pub instant: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Rejection {
    pub at: f32,
    pub code: String,
    pub message: String,
}

/// Resource to track headless scenario state
#[derive(Resource)]
pub struct ScenarioState {
    pub duration: f32,
    timeline: Vec<TimedAction>,
    next_action: usize,
    pub casts: Vec<CastRecord>,
    pub rejections: Vec<Rejection>,
    pub complete: bool,
}

impl ScenarioState {
    fn reject(&mut self, at: f32, error: SpellError) {
        debug!("Scripted action rejected at {:.2}s: {}", at, error);
        self.rejections.push(Rejection {
            at,
            code: error.code().to_string(),
            message: error.to_string(),
        });
    }
}

/// Plugin for headless scenario execution
pub struct HeadlessPlugin {
    pub config: ScenarioConfig,
    pub catalog: Arc<AbilityCatalog>,
}

impl Plugin for HeadlessPlugin {
    fn build(&self, app: &mut App) {
        let mut arena = SpellArena::new(
            Arc::clone(&self.catalog),
            self.config.engine_settings(),
            self.config.mana_pool(),
        );
        arena.caster = self.config.training_caster();
        arena.dummies = self.config.training_dummies();

        let book = arena.spellcaster.book_mut();
        for spell in &self.config.learned {
            book.learn(*spell);
        }
        for (slot, spell) in self.config.hotbar.iter().enumerate() {
            if let Err(e) = book.equip_to_hotbar(*spell, slot) {
                warn!("Skipping hotbar slot {}: {}", slot, e);
            }
        }

        app.insert_resource(arena)
            .insert_resource(ScenarioState {
                duration: self.config.duration_secs,
                timeline: self.config.sorted_timeline(),
                next_action: 0,
                casts: Vec::new(),
                rejections: Vec::new(),
                complete: false,
            })
            .insert_resource(TimeUpdateStrategy::ManualDuration(Duration::from_secs_f32(
                self.config.frame_dt,
            )))
            .add_plugins(SpellcastingPlugin)
            .add_systems(Startup, headless_setup_scenario)
            .add_systems(Update, run_timeline_actions.before(advance_spell_arena))
            .add_systems(PostUpdate, headless_check_scenario_end);
    }
}

/// Open the combat log
fn headless_setup_scenario(
    arena: Res<SpellArena>,
    mut combat_log: ResMut<CombatLog>,
    state: Res<ScenarioState>,
) {
    combat_log.clear();
    combat_log.log(CombatLogEventType::Loadout, "Scenario started (headless mode)".to_string());
    info!(
        "Headless scenario setup complete: {} dummies, {} scripted actions, {:.1}s",
        arena.dummies.len(),
        state.timeline.len(),
        state.duration
    );
}

/// Fire every scripted action that is due
fn run_timeline_actions(mut arena: ResMut<SpellArena>, mut state: ResMut<ScenarioState>) {
    let now = arena.elapsed;
    while let Some(timed) = state.timeline.get(state.next_action).cloned() {
        if timed.at > now + SCHEDULE_EPSILON {
            break;
        }
        state.next_action += 1;
        apply_action(&mut arena, &mut state, now, &timed.action);
    }
}

fn apply_action(arena: &mut SpellArena, state: &mut ScenarioState, now: f32, action: &ScenarioAction) {
    match action {
        ScenarioAction::Cast { spell } => record_cast(state, now, arena.cast(*spell)),
        ScenarioAction::CastSlot { slot } => record_cast(state, now, arena.cast_slot(*slot)),
        ScenarioAction::Equip { spell, slot } => {
            if let Err(e) = arena.spellcaster.book_mut().equip_to_hotbar(*spell, *slot) {
                state.reject(now, e);
            }
        }
        ScenarioAction::Interrupt => {
            arena.interrupt();
        }
        ScenarioAction::DamageCaster { amount } => {
            arena.receive_damage(*amount);
        }
        ScenarioAction::Face { direction } => {
            arena.caster.facing = Vec3::from_array(*direction);
        }
        ScenarioAction::SetDodging { dodging } => {
            arena.caster.dodging = *dodging;
        }
    }
}

fn record_cast(state: &mut ScenarioState, now: f32, result: Result<CastOutcome, SpellError>) {
    match result {
        Ok(CastOutcome::Resolved(spell)) => state.casts.push(CastRecord { at: now, spell, instant: true }),
        Ok(CastOutcome::Started { ability, .. }) => {
            state.casts.push(CastRecord { at: now, spell: ability, instant: false })
        }
        Err(e) => state.reject(now, e),
    }
}

/// Mark the scenario complete once its duration has elapsed
fn headless_check_scenario_end(arena: Res<SpellArena>, mut state: ResMut<ScenarioState>) {
    if !state.complete && arena.elapsed + SCHEDULE_EPSILON >= state.duration {
        info!("Scenario finished after {:.2}s", arena.elapsed);
        state.complete = true;
    }
}

/// Build the app for `config` without running it
pub fn build_scenario_app(config: ScenarioConfig) -> Result<App, String> {
    let catalog = match &config.catalog_path {
        Some(path) => AbilityCatalog::load_from_path(Path::new(path))?,
        None => AbilityCatalog::embedded()?,
    };

    let mut app = App::new();
    app.add_plugins(MinimalPlugins)
        .add_plugins(HeadlessPlugin { config, catalog: Arc::new(catalog) });
    Ok(app)
}

/// Step `app` until its scenario completes and collect the result
pub fn run_scenario_app(app: &mut App) -> Result<ScenarioResult, String> {
    app.finish();
    app.cleanup();

    let (duration, frame_dt) = {
        let state = app.world().resource::<ScenarioState>();
        let frame_dt = match app.world().resource::<TimeUpdateStrategy>() {
            TimeUpdateStrategy::ManualDuration(step) => step.as_secs_f32(),
            _ => return Err("headless scenarios need a manual time step".to_string()),
        };
        (state.duration, frame_dt)
    };
    // Headroom for frames where the virtual clock lags the manual step
    let max_frames = (duration / frame_dt).ceil() as usize * 2 + 10;

    for _ in 0..max_frames {
        app.update();
        if app.world().resource::<ScenarioState>().complete {
            break;
        }
    }

    if !app.world().resource::<ScenarioState>().complete {
        return Err(format!("Scenario did not finish within {} frames", max_frames));
    }
    Ok(build_scenario_result(app.world()))
}

fn build_scenario_result(world: &World) -> ScenarioResult {
    let arena = world.resource::<SpellArena>();
    let state = world.resource::<ScenarioState>();
    let combat_log = world.resource::<CombatLog>();

    ScenarioResult {
        elapsed: arena.elapsed,
        caster_health: arena.caster.health,
        caster_mana: arena.mana.current(),
        dummies: arena
            .dummies
            .iter()
            .map(|dummy| DummyResult {
                id: dummy.id.0,
                health: dummy.health,
                damage_taken: dummy.damage_taken,
                alive: dummy.is_alive(),
            })
            .collect(),
        casts: state.casts.clone(),
        rejections: state.rejections.clone(),
        total_damage: combat_log.total_damage(),
        total_healing: combat_log.total_healing(),
    }
}

/// Run a headless scenario with the given configuration
pub fn run_scenario(config: ScenarioConfig) -> Result<ScenarioResult, String> {
    let output_path = config.output_path.clone();
    let mut app = build_scenario_app(config)?;
    let result = run_scenario_app(&mut app)?;

    if let Some(path) = output_path {
        app.world()
            .resource::<CombatLog>()
            .save_to_file(Path::new(&path))?;
    }
    Ok(result)
}
