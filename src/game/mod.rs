//! Match simulation: state, commands, events, and the system pipeline.

pub mod combat;
pub mod command;
pub mod config;
pub mod cpu;
pub mod engine;
pub mod events;
pub mod state;
pub mod systems;
pub mod telemetry;

pub use combat::CombatSystem;
pub use command::{Command, CommandKind, CommandPayload, CommandQueue};
pub use config::MatchConfig;
pub use cpu::CpuDriver;
pub use engine::{GameEngine, System, SystemContext};
pub use events::{HitReport, MatchEvent, MatchEventData};
pub use state::{
    ActiveAttack, Facing, FighterSlot, FighterState, GamePhase, MatchState, MeterKind, MoveType,
};
pub use systems::{CommandSystem, MovementSystem, RoundSystem, TimerSystem};
pub use telemetry::MatchTelemetryEntry;
