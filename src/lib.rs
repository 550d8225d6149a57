//! # Duel Engine
//!
//! Deterministic fixed-step simulation core for a two-player 3D fighting
//! game. The same engine drives single-player matches against the CPU,
//! local versus, and online play kept aligned by snapshot resync.
//!
//! ## Architecture
//!
//! ```text
//! +---------------------------------------------------------------+
//! |                         GameEngine                            |
//! |                                                               |
//! |  CommandQueue --> CommandSystem  --> MovementSystem           |
//! |                       |                   |                   |
//! |                       v                   v                   |
//! |                  CombatSystem  -->  TimerSystem --> Rounds    |
//! |                       |                                       |
//! |                       v                                       |
//! |              events + telemetry (drained per tick)            |
//! +---------------------------------------------------------------+
//!          |                                        ^
//!          v                                        |
//!   MatchState (hashable)  <-->  OnlineSynchronizer (resync)
//! ```
//!
//! ## Determinism
//!
//! Everything in the tick loop is integer arithmetic: Q16.16 fixed-point
//! math, an explicitly seeded Xorshift128+ PRNG, and SHA-256 state
//! hashes. Two machines fed the same seed and the same command sequence
//! produce bit-identical states on every frame.

pub mod core;
pub mod game;
pub mod net;

pub use crate::core::{DeterministicRng, Fixed, FixedVec3, StateHash, FIXED_ONE};
pub use crate::game::{
    CommandPayload, CpuDriver, FighterSlot, GameEngine, GamePhase, MatchConfig, MatchEvent,
    MatchEventData, MatchState, MoveType,
};
pub use crate::net::{
    InputMap, MatchDescriptor, MatchMode, NetMessage, OnlineSynchronizer, PeerRole, SyncNotice,
};

/// Crate version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Simulation rate in ticks per second.
pub const TICK_RATE: u32 = 60;

/// Simulated milliseconds added per tick.
pub const TICK_STEP_MS: u64 = 16;
