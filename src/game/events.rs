//! Match Event Bus
//!
//! Systems append events to a per-tick log; the engine hands the log to
//! the caller after each step. Events record facts about the simulation
//! after the corresponding state mutation has already happened, so a
//! consumer never observes an event ahead of its effect.

use serde::{Deserialize, Serialize};

use crate::core::fixed::Fixed;
use crate::core::vec3::FixedVec3;
use crate::game::command::CommandKind;
use crate::game::state::{FighterSlot, GamePhase, MeterKind, MoveType};

/// The outcome of one resolved hit.
///
/// Shared by the `HitLanded` event and the telemetry log so both report
/// exactly the numbers the combat resolver applied.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HitReport {
    /// Move that landed
    pub move_type: MoveType,
    /// Health removed from the defender
    pub damage: Fixed,
    /// Guard meter removed (zero when unblocked)
    pub guard_damage: Fixed,
    /// Knockback velocity applied to the defender
    pub knockback: FixedVec3,
    /// Hitlag applied to both fighters, in ticks
    pub hitlag_ticks: u32,
    /// Defender was committed to an action when struck
    pub counter_hit: bool,
    /// Hit tripped the defender
    pub trip: bool,
    /// Hit launched the defender airborne
    pub launched: bool,
    /// Defender blocked and the hit chipped through
    pub blocked: bool,
}

/// What a match event describes.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum MatchEventData {
    /// A buffered command was validated and applied
    CommandProcessed { slot: FighterSlot, kind: CommandKind },
    /// An attack connected with the defender
    HitLanded {
        attacker: FighterSlot,
        defender: FighterSlot,
        hit: HitReport,
    },
    /// A hit extended the attacker's combo
    ComboExtended { slot: FighterSlot, combo_count: u32 },
    /// A combo window expired without a follow-up hit
    ComboDropped { slot: FighterSlot, combo_count: u32 },
    /// A meter reached zero this tick
    MeterDepleted { slot: FighterSlot, meter: MeterKind },
    /// The match moved to a new phase
    PhaseChanged { from: GamePhase, to: GamePhase },
    /// A round concluded; `winner` is `None` on a timeout draw
    RoundEnded {
        winner: Option<FighterSlot>,
        round: u8,
    },
    /// The match concluded
    MatchEnded { winner: FighterSlot },
}

/// One entry in the per-tick event log.
///
/// Stamped with the frame and simulated time of the tick that produced it.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchEvent {
    /// Frame the event occurred on
    pub frame: u32,
    /// Simulated time in milliseconds
    pub time_ms: u64,
    /// What happened
    pub data: MatchEventData,
}

impl MatchEvent {
    /// Create an event stamped for the given tick.
    pub fn new(frame: u32, time_ms: u64, data: MatchEventData) -> Self {
        Self {
            frame,
            time_ms,
            data,
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================
