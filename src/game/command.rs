//! Command Queue
//!
//! Player intents enter the simulation exclusively as commands. Commands
//! are buffered between ticks and handed to the pipeline in arrival order
//! at the start of each tick. The queue never mutates state itself; the
//! command system validates and applies each command during the tick.

use serde::{Deserialize, Serialize};

use crate::core::fixed::Fixed;
use crate::game::state::{FighterSlot, MoveType};

/// The action a command requests, with its parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CommandPayload {
    /// Begin the match (Menu -> Fighting)
    Start,
    /// Horizontal movement intent, components in [-1.0, 1.0] fixed-point
    Move { dx: Fixed, dz: Fixed },
    /// Jump (or mid-air jump if one remains)
    Jump,
    /// Begin an attack of the given move type
    Attack { move_type: MoveType },
    /// Raise or drop the guard
    Block { engaged: bool },
    /// Invulnerable dodge
    Dodge,
    /// Unblockable grab attempt
    Grab,
    /// Meter-spending special attack
    Special,
    /// Taunt, leaving the fighter committed
    Taunt,
}

/// Discriminant of a command payload, used for event reporting.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandKind {
    Start,
    Move,
    Jump,
    Attack,
    Block,
    Dodge,
    Grab,
    Special,
    Taunt,
}

impl CommandPayload {
    /// The kind of this payload, without its parameters.
    pub fn kind(&self) -> CommandKind {
        match self {
            CommandPayload::Start => CommandKind::Start,
            CommandPayload::Move { .. } => CommandKind::Move,
            CommandPayload::Jump => CommandKind::Jump,
            CommandPayload::Attack { .. } => CommandKind::Attack,
            CommandPayload::Block { .. } => CommandKind::Block,
            CommandPayload::Dodge => CommandKind::Dodge,
            CommandPayload::Grab => CommandKind::Grab,
            CommandPayload::Special => CommandKind::Special,
            CommandPayload::Taunt => CommandKind::Taunt,
        }
    }
}

/// A single buffered player intent.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Command {
    /// Which fighter issued this command
    pub slot: FighterSlot,
    /// What the command requests
    pub payload: CommandPayload,
    /// Wall-clock enqueue time in unix milliseconds (not simulated time)
    pub issued_at_ms: i64,
    /// Queue-assigned sequence number, strictly increasing
    pub seq: u64,
}

/// Buffer of commands awaiting the next tick.
///
/// `drain_for_tick` hands the whole buffer to the caller and leaves the
/// queue empty, so a command is consumed by exactly one tick.
#[derive(Debug, Default)]
pub struct CommandQueue {
    pending: Vec<Command>,
    next_seq: u64,
}

impl CommandQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Buffer a command for the next tick. Returns its sequence number.
    pub fn enqueue(
        &mut self,
        slot: FighterSlot,
        payload: CommandPayload,
        issued_at_ms: i64,
    ) -> u64 {
        let seq = self.next_seq;
        self.next_seq += 1;
        self.pending.push(Command {
            slot,
            payload,
            issued_at_ms,
            seq,
        });
        seq
    }

    /// Take all pending commands in arrival order, leaving the queue empty.
    pub fn drain_for_tick(&mut self) -> Vec<Command> {
        std::mem::take(&mut self.pending)
    }

    /// Number of buffered commands.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    /// Whether the queue is empty.
    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }
}

// =============================================================================
// TESTS
// =============================================================================
