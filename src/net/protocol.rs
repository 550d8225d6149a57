//! Wire Protocol
//!
//! Message types exchanged between two peers in an online match, plus the
//! match descriptor both sides agree on before the first tick. Messages
//! serialize to JSON for debugging and to bincode for the wire; both
//! encodings cover every message type.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use uuid::Uuid;

use crate::game::command::CommandPayload;
use crate::game::state::{FighterSlot, MatchState, MoveType};

/// Protocol codec and validation failures.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("json codec error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("binary codec error: {0}")]
    Binary(#[from] bincode::Error),
}

/// Descriptor validation failures.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum DescriptorError {
    #[error("matches are strictly two-player, got max_players={0}")]
    BadPlayerCount(u8),

    #[error("guest profile must differ from host profile")]
    DuplicateProfile,

    #[error("online matches require a guest profile")]
    MissingGuest,
}

// =============================================================================
// INPUT MAP
// =============================================================================

/// One frame of controls for one fighter.
///
/// This is the unit the synchronizer exchanges and predicts. It converts
/// into zero or more commands at the start of the local tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InputMap {
    pub left: bool,
    pub right: bool,
    pub toward_camera: bool,
    pub away_camera: bool,
    pub jump: bool,
    pub light: bool,
    pub heavy: bool,
    pub launcher: bool,
    pub sweep: bool,
    pub grab: bool,
    pub block: bool,
    pub dodge: bool,
    pub special: bool,
    pub taunt: bool,
}

impl InputMap {
    /// A frame with no controls held.
    pub const NEUTRAL: InputMap = InputMap {
        left: false,
        right: false,
        toward_camera: false,
        away_camera: false,
        jump: false,
        light: false,
        heavy: false,
        launcher: false,
        sweep: false,
        grab: false,
        block: false,
        dodge: false,
        special: false,
        taunt: false,
    };

    /// Expand held controls into tick commands.
    ///
    /// At most one movement command and one action command per frame;
    /// action priority is fixed so expansion is deterministic. The map
    /// is level-triggered: a frame without `block` held always carries
    /// the guard release, ordered first so commands the release enables
    /// apply on the same tick. The command system drops the release as
    /// a no-op when the guard is already down.
    pub fn to_commands(self) -> Vec<CommandPayload> {
        use crate::core::fixed::FIXED_ONE;

        let mut commands = Vec::new();

        if !self.block {
            commands.push(CommandPayload::Block { engaged: false });
        }

        let dx = match (self.left, self.right) {
            (true, false) => -FIXED_ONE,
            (false, true) => FIXED_ONE,
            _ => 0,
        };
        let dz = match (self.toward_camera, self.away_camera) {
            (true, false) => -FIXED_ONE,
            (false, true) => FIXED_ONE,
            _ => 0,
        };
        if dx != 0 || dz != 0 {
            commands.push(CommandPayload::Move { dx, dz });
        }

        if self.jump {
            commands.push(CommandPayload::Jump);
        }

        if self.dodge {
            commands.push(CommandPayload::Dodge);
        } else if self.block {
            commands.push(CommandPayload::Block { engaged: true });
        } else if self.grab {
            commands.push(CommandPayload::Grab);
        } else if self.special {
            commands.push(CommandPayload::Special);
        } else if self.light {
            commands.push(CommandPayload::Attack {
                move_type: MoveType::Light,
            });
        } else if self.heavy {
            commands.push(CommandPayload::Attack {
                move_type: MoveType::Heavy,
            });
        } else if self.launcher {
            commands.push(CommandPayload::Attack {
                move_type: MoveType::Launcher,
            });
        } else if self.sweep {
            commands.push(CommandPayload::Attack {
                move_type: MoveType::Sweep,
            });
        } else if self.taunt {
            commands.push(CommandPayload::Taunt);
        }

        commands
    }
}

// =============================================================================
// SNAPSHOT
// =============================================================================

/// Authoritative snapshot of a match at one frame.
///
/// Carries the full match state, the inputs in effect, and the host's
/// hash of the state so the receiver can verify the copy it decoded.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct OnlineMatchSnapshot {
    /// Complete match state at `state.frame`
    pub state: MatchState,
    /// Input frames in effect, indexed by `FighterSlot`
    pub inputs: [InputMap; 2],
    /// Hex-encoded SHA-256 of `state`, computed by the sender
    pub state_hash: String,
}

impl OnlineMatchSnapshot {
    /// Capture a snapshot of the given state.
    pub fn capture(state: &MatchState, inputs: [InputMap; 2]) -> Self {
        let state_hash = hex::encode(state.compute_hash());
        Self {
            state: state.clone(),
            inputs,
            state_hash,
        }
    }

    /// Frame this snapshot was taken at.
    pub fn frame(&self) -> u32 {
        self.state.frame
    }

    /// Recompute the state hash and compare with the sender's.
    pub fn hash_matches(&self) -> bool {
        hex::encode(self.state.compute_hash()) == self.state_hash
    }

    /// Input frame for one slot.
    pub fn input_for(&self, slot: FighterSlot) -> InputMap {
        self.inputs[slot.index()]
    }
}

// =============================================================================
// MESSAGES
// =============================================================================

/// A message between online peers.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum NetMessage {
    /// Guest requests to join a hosted match
    Join { match_id: Uuid, profile_id: Uuid },
    /// Local input frame for a given simulation frame
    Inputs { frame: u32, inputs: InputMap },
    /// Periodic authoritative state from the host
    State { snapshot: OnlineMatchSnapshot },
    /// Forced resynchronization after divergence
    Resync { snapshot: OnlineMatchSnapshot },
    /// Peer is leaving the match
    Leave { reason: Option<String> },
}

impl NetMessage {
    /// Encode to JSON.
    pub fn to_json(&self) -> Result<String, ProtocolError> {
        Ok(serde_json::to_string(self)?)
    }

    /// Decode from JSON.
    pub fn from_json(json: &str) -> Result<Self, ProtocolError> {
        Ok(serde_json::from_str(json)?)
    }

    /// Encode to the binary wire format.
    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtocolError> {
        Ok(bincode::serialize(&WireMessage::from(self.clone()))?)
    }

    /// Decode from the binary wire format.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ProtocolError> {
        Ok(bincode::deserialize::<WireMessage>(bytes)?.into())
    }
}

/// Externally tagged mirror of [`NetMessage`] for the binary codec.
///
/// Internally tagged enums do not survive bincode's non-self-describing
/// format, so bytes go through this shape instead.
#[derive(Serialize, Deserialize)]
enum WireMessage {
    Join { match_id: Uuid, profile_id: Uuid },
    Inputs { frame: u32, inputs: InputMap },
    State { snapshot: OnlineMatchSnapshot },
    Resync { snapshot: OnlineMatchSnapshot },
    Leave { reason: Option<String> },
}

impl From<NetMessage> for WireMessage {
    fn from(message: NetMessage) -> Self {
        match message {
            NetMessage::Join {
                match_id,
                profile_id,
            } => WireMessage::Join {
                match_id,
                profile_id,
            },
            NetMessage::Inputs { frame, inputs } => WireMessage::Inputs { frame, inputs },
            NetMessage::State { snapshot } => WireMessage::State { snapshot },
            NetMessage::Resync { snapshot } => WireMessage::Resync { snapshot },
            NetMessage::Leave { reason } => WireMessage::Leave { reason },
        }
    }
}

impl From<WireMessage> for NetMessage {
    fn from(message: WireMessage) -> Self {
        match message {
            WireMessage::Join {
                match_id,
                profile_id,
            } => NetMessage::Join {
                match_id,
                profile_id,
            },
            WireMessage::Inputs { frame, inputs } => NetMessage::Inputs { frame, inputs },
            WireMessage::State { snapshot } => NetMessage::State { snapshot },
            WireMessage::Resync { snapshot } => NetMessage::Resync { snapshot },
            WireMessage::Leave { reason } => NetMessage::Leave { reason },
        }
    }
}

// =============================================================================
// MATCH DESCRIPTOR
// =============================================================================

/// How the match is being played.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchMode {
    /// One player against the CPU
    Single,
    /// Two players, one machine
    Local,
    /// Two players over the network
    Online,
}

/// The agreement both peers share before the first tick.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MatchDescriptor {
    /// Match identifier
    pub id: Uuid,
    /// When the host created the match
    pub created_at: DateTime<Utc>,
    /// Host's profile
    pub host_profile_id: Uuid,
    /// Guest's profile, once joined
    pub guest_profile_id: Option<Uuid>,
    /// Seed both simulations start from
    pub seed: u64,
    /// Play mode
    pub mode: MatchMode,
    /// Always 2; kept explicit for forward compatibility
    pub max_players: u8,
}

impl MatchDescriptor {
    /// Create a descriptor for a new match.
    pub fn new(host_profile_id: Uuid, mode: MatchMode, seed: u64) -> Self {
        Self {
            id: Uuid::new_v4(),
            created_at: Utc::now(),
            host_profile_id,
            guest_profile_id: None,
            seed,
            mode,
            max_players: 2,
        }
    }

    /// Validate the descriptor before simulation starts.
    pub fn validate(&self) -> Result<(), DescriptorError> {
        if self.max_players != 2 {
            return Err(DescriptorError::BadPlayerCount(self.max_players));
        }
        if let Some(guest) = self.guest_profile_id {
            if guest == self.host_profile_id {
                return Err(DescriptorError::DuplicateProfile);
            }
        } else if self.mode == MatchMode::Online {
            return Err(DescriptorError::MissingGuest);
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
