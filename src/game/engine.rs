//! Game Engine
//!
//! Owns the match state, the command queue, and the ordered system
//! pipeline, and advances the simulation one fixed step at a time.
//! Registration order is execution order; the default pipeline runs
//! commands, movement, combat, timers, then round bookkeeping, so hit
//! detection always sees post-movement positions.

use tracing::debug;

use crate::core::hash::StateHash;
use crate::game::command::{Command, CommandPayload, CommandQueue};
use crate::game::config::MatchConfig;
use crate::game::events::{MatchEvent, MatchEventData};
use crate::game::state::{FighterSlot, MatchState};
use crate::game::systems::{CommandSystem, MovementSystem, RoundSystem, TimerSystem};
use crate::game::telemetry::MatchTelemetryEntry;
use crate::TICK_STEP_MS;

/// Everything a system may touch during one tick.
///
/// Systems mutate state first and emit events after, so no event ever
/// describes a mutation that has not happened yet.
pub struct SystemContext<'a> {
    /// Commands drained for this tick, in arrival order
    pub commands: &'a [Command],
    /// The match being simulated
    pub state: &'a mut MatchState,
    /// Match tuning
    pub config: &'a MatchConfig,
    pub(crate) events: &'a mut Vec<MatchEvent>,
    pub(crate) telemetry: &'a mut Vec<MatchTelemetryEntry>,
}

impl SystemContext<'_> {
    /// Append an event stamped with the current frame and simulated time.
    pub fn emit(&mut self, data: MatchEventData) {
        self.events
            .push(MatchEvent::new(self.state.frame, self.state.time_ms, data));
    }

    /// Append a telemetry entry.
    pub fn record(&mut self, entry: MatchTelemetryEntry) {
        self.telemetry.push(entry);
    }
}

/// One stage of the simulation pipeline.
pub trait System: Send {
    /// Name for logging.
    fn name(&self) -> &'static str;

    /// Run this system for one tick.
    fn apply(&mut self, ctx: &mut SystemContext);
}

/// Fixed-step match simulation engine.
pub struct GameEngine {
    state: MatchState,
    config: MatchConfig,
    queue: CommandQueue,
    systems: Vec<Box<dyn System>>,
    events: Vec<MatchEvent>,
    telemetry: Vec<MatchTelemetryEntry>,
}

impl GameEngine {
    /// Create an engine with an empty pipeline.
    pub fn new(match_id: [u8; 16], seed: u64, config: MatchConfig) -> Self {
        let state = MatchState::new(match_id, seed, &config);
        Self {
            state,
            config,
            queue: CommandQueue::new(),
            systems: Vec::new(),
            events: Vec::new(),
            telemetry: Vec::new(),
        }
    }

    /// Create an engine with the standard pipeline registered.
    pub fn with_default_pipeline(match_id: [u8; 16], seed: u64, config: MatchConfig) -> Self {
        let mut engine = Self::new(match_id, seed, config);
        engine.register_system(Box::new(CommandSystem));
        engine.register_system(Box::new(MovementSystem));
        engine.register_system(Box::new(crate::game::combat::CombatSystem));
        engine.register_system(Box::new(TimerSystem));
        engine.register_system(Box::new(RoundSystem));
        engine
    }

    /// Append a system to the pipeline. Order of registration is order
    /// of execution.
    pub fn register_system(&mut self, system: Box<dyn System>) {
        debug!(system = system.name(), "registering system");
        self.systems.push(system);
    }

    /// Buffer a command for the next tick. Returns its sequence number.
    pub fn enqueue_command(
        &mut self,
        slot: FighterSlot,
        payload: CommandPayload,
        issued_at_ms: i64,
    ) -> u64 {
        self.queue.enqueue(slot, payload, issued_at_ms)
    }

    /// Advance the simulation by exactly one tick.
    ///
    /// Drains the command queue, advances frame and simulated time, and
    /// runs every registered system in order. Returns the frame just
    /// simulated.
    ///
    /// The frame counter advances before the systems run, so everything
    /// a tick produces carries the post-advance frame: events and
    /// attack activations from the first step are stamped frame 1, and
    /// `state.frame` names the frame the tick computed, never the one
    /// it started from.
    pub fn step(&mut self) -> u32 {
        let commands = self.queue.drain_for_tick();

        self.state.frame += 1;
        self.state.time_ms += TICK_STEP_MS;

        let mut ctx = SystemContext {
            commands: &commands,
            state: &mut self.state,
            config: &self.config,
            events: &mut self.events,
            telemetry: &mut self.telemetry,
        };

        for system in &mut self.systems {
            system.apply(&mut ctx);
        }

        self.state.frame
    }

    /// Take all events accumulated since the last drain.
    pub fn drain_events(&mut self) -> Vec<MatchEvent> {
        std::mem::take(&mut self.events)
    }

    /// Take all telemetry accumulated since the last drain.
    pub fn drain_telemetry(&mut self) -> Vec<MatchTelemetryEntry> {
        std::mem::take(&mut self.telemetry)
    }

    /// Current match state.
    pub fn state(&self) -> &MatchState {
        &self.state
    }

    /// Match tuning in effect.
    pub fn config(&self) -> &MatchConfig {
        &self.config
    }

    /// Current frame counter.
    pub fn frame(&self) -> u32 {
        self.state.frame
    }

    /// Hash of the current state, for divergence checks.
    pub fn state_hash(&self) -> StateHash {
        self.state.compute_hash()
    }

    /// Replace the entire match state, discarding buffered commands.
    ///
    /// Used by the online synchronizer when adopting an authoritative
    /// snapshot.
    pub fn replace_state(&mut self, state: MatchState) {
        self.queue.drain_for_tick();
        self.state = state;
    }
}

// =============================================================================
// TESTS
// =============================================================================
