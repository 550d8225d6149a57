//! Online Synchronizer
//!
//! Keeps two peer simulations aligned without rollback. Each peer runs
//! the same deterministic engine; remote inputs arrive late, so the
//! synchronizer predicts them by repeating the last known input frame.
//! Prediction is bounded: past the budget the simulation stops and waits
//! for an authoritative snapshot. Divergence is detected by comparing
//! state hashes and repaired by replacing the state wholesale, never by
//! rewinding.

use std::collections::{BTreeMap, VecDeque};

use thiserror::Error;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::game::engine::GameEngine;
use crate::game::state::FighterSlot;
use crate::net::protocol::{InputMap, NetMessage, OnlineMatchSnapshot};

/// Which end of the connection this synchronizer drives.
///
/// The host is authoritative: its snapshots overwrite the guest's state,
/// never the reverse.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PeerRole {
    Host,
    Guest,
}

impl PeerRole {
    /// The slot this peer's local player occupies.
    pub fn local_slot(self) -> FighterSlot {
        match self {
            PeerRole::Host => FighterSlot::Player,
            PeerRole::Guest => FighterSlot::Opponent,
        }
    }
}

/// Connection lifecycle notices surfaced to the caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SyncNotice {
    /// The remote peer joined the match
    PeerJoined { profile_id: Uuid },
    /// The remote peer left
    PeerLeft { reason: Option<String> },
    /// Local and remote state hashes disagreed at the same frame
    DivergenceDetected { frame: u32 },
    /// An authoritative snapshot was adopted
    Resynced { frame: u32 },
}

/// Synchronization failures.
#[derive(Debug, Error)]
pub enum SyncError {
    #[error("join for match {got} but this synchronizer serves {expected}")]
    WrongMatch { expected: Uuid, got: Uuid },

    #[error("snapshot at frame {frame} failed hash verification")]
    CorruptSnapshot { frame: u32 },
}

/// Default frames of prediction before the simulation stalls.
pub const DEFAULT_PREDICTION_BUDGET: u32 = 12;

/// Default interval between authoritative host snapshots, in frames.
pub const DEFAULT_SNAPSHOT_INTERVAL: u32 = 60;

/// Drives one peer's engine in an online match.
pub struct OnlineSynchronizer {
    role: PeerRole,
    match_id: Uuid,
    peer_connected: bool,
    waiting_resync: bool,

    pending: VecDeque<NetMessage>,
    remote_inputs: BTreeMap<u32, InputMap>,
    last_remote_input: InputMap,
    newest_input_frame: u32,
    predicted_frames: u32,
    prediction_budget: u32,

    last_snapshot_frame: u32,
    snapshot_interval: u32,

    outbox: Vec<NetMessage>,
    notices: Vec<SyncNotice>,
}

impl OnlineSynchronizer {
    /// Create a synchronizer for one end of the connection.
    pub fn new(role: PeerRole, match_id: Uuid) -> Self {
        Self {
            role,
            match_id,
            peer_connected: false,
            waiting_resync: false,
            pending: VecDeque::new(),
            remote_inputs: BTreeMap::new(),
            last_remote_input: InputMap::NEUTRAL,
            newest_input_frame: 0,
            predicted_frames: 0,
            prediction_budget: DEFAULT_PREDICTION_BUDGET,
            last_snapshot_frame: 0,
            snapshot_interval: DEFAULT_SNAPSHOT_INTERVAL,
            outbox: Vec::new(),
            notices: Vec::new(),
        }
    }

    /// Override the prediction budget.
    pub fn with_prediction_budget(mut self, frames: u32) -> Self {
        self.prediction_budget = frames;
        self
    }

    /// Override the host snapshot interval.
    pub fn with_snapshot_interval(mut self, frames: u32) -> Self {
        self.snapshot_interval = frames;
        self
    }

    /// This peer's role.
    pub fn role(&self) -> PeerRole {
        self.role
    }

    /// Whether the remote peer is connected.
    pub fn peer_connected(&self) -> bool {
        self.peer_connected
    }

    /// Whether the simulation is stalled waiting for a snapshot.
    pub fn is_waiting_resync(&self) -> bool {
        self.waiting_resync
    }

    /// Frame of the newest snapshot adopted or sent.
    pub fn last_snapshot_frame(&self) -> u32 {
        self.last_snapshot_frame
    }

    /// Queue a guest join request (guest side).
    pub fn join(&mut self, profile_id: Uuid) {
        self.outbox.push(NetMessage::Join {
            match_id: self.match_id,
            profile_id,
        });
    }

    /// Queue a leave notification for the remote peer.
    pub fn leave(&mut self, reason: Option<String>) {
        self.outbox.push(NetMessage::Leave { reason });
    }

    /// Validate and buffer an incoming message.
    ///
    /// Messages are applied only at the next tick boundary, so mid-tick
    /// arrivals can never tear the state.
    pub fn queue_message(&mut self, message: NetMessage) -> Result<(), SyncError> {
        match &message {
            NetMessage::Join { match_id, .. } if *match_id != self.match_id => {
                return Err(SyncError::WrongMatch {
                    expected: self.match_id,
                    got: *match_id,
                });
            }
            NetMessage::State { snapshot } | NetMessage::Resync { snapshot } => {
                if !snapshot.hash_matches() {
                    return Err(SyncError::CorruptSnapshot {
                        frame: snapshot.frame(),
                    });
                }
            }
            _ => {}
        }
        self.pending.push_back(message);
        Ok(())
    }

    /// Advance the local engine by one tick if possible.
    ///
    /// Applies buffered messages, resolves the remote input for the next
    /// frame (actual or predicted), enqueues both fighters' commands, and
    /// steps the engine. Returns false when the simulation held still:
    /// no peer yet, or the prediction budget ran out.
    pub fn advance(&mut self, engine: &mut GameEngine, local_input: InputMap) -> bool {
        self.apply_pending(engine);

        if !self.peer_connected || self.waiting_resync {
            return false;
        }

        let next_frame = engine.frame() + 1;

        let remote_input = match self.remote_inputs.get(&next_frame) {
            Some(&input) => {
                self.predicted_frames = 0;
                self.last_remote_input = input;
                input
            }
            None => {
                if self.predicted_frames >= self.prediction_budget {
                    info!(
                        frame = next_frame,
                        budget = self.prediction_budget,
                        "prediction budget exhausted, waiting for snapshot"
                    );
                    self.waiting_resync = true;
                    return false;
                }
                self.predicted_frames += 1;
                self.last_remote_input
            }
        };
        // Inputs at or before the frame just resolved are dead
        self.remote_inputs = self.remote_inputs.split_off(&(next_frame + 1));

        let local_slot = self.role.local_slot();
        for payload in local_input.to_commands() {
            engine.enqueue_command(local_slot, payload, 0);
        }
        for payload in remote_input.to_commands() {
            engine.enqueue_command(local_slot.other(), payload, 0);
        }

        self.outbox.push(NetMessage::Inputs {
            frame: next_frame,
            inputs: local_input,
        });

        engine.step();

        if self.role == PeerRole::Host && engine.frame() % self.snapshot_interval == 0 {
            self.send_snapshot(engine, local_input, false);
        }

        true
    }

    /// Push an authoritative snapshot to the peer (host side).
    pub fn force_resync(&mut self, engine: &GameEngine, local_input: InputMap) {
        self.send_snapshot(engine, local_input, true);
    }

    /// Messages to transmit to the peer.
    pub fn drain_outbox(&mut self) -> Vec<NetMessage> {
        std::mem::take(&mut self.outbox)
    }

    /// Lifecycle notices since the last drain.
    pub fn drain_notices(&mut self) -> Vec<SyncNotice> {
        std::mem::take(&mut self.notices)
    }

    fn send_snapshot(&mut self, engine: &GameEngine, local_input: InputMap, resync: bool) {
        let mut inputs = [InputMap::NEUTRAL; 2];
        inputs[self.role.local_slot().index()] = local_input;
        inputs[self.role.local_slot().other().index()] = self.last_remote_input;

        let snapshot = OnlineMatchSnapshot::capture(engine.state(), inputs);
        self.last_snapshot_frame = self.last_snapshot_frame.max(snapshot.frame());
        self.outbox.push(if resync {
            NetMessage::Resync { snapshot }
        } else {
            NetMessage::State { snapshot }
        });
    }

    fn apply_pending(&mut self, engine: &mut GameEngine) {
        while let Some(message) = self.pending.pop_front() {
            match message {
                NetMessage::Join { profile_id, .. } => {
                    self.peer_connected = true;
                    self.notices.push(SyncNotice::PeerJoined { profile_id });
                    if self.role == PeerRole::Host {
                        // Seed the guest with the current authoritative state
                        self.send_snapshot(engine, InputMap::NEUTRAL, true);
                    }
                }
                NetMessage::Leave { reason } => {
                    self.peer_connected = false;
                    self.notices.push(SyncNotice::PeerLeft { reason });
                }
                NetMessage::Inputs { frame, inputs } => {
                    // Any input arrival proves the peer is alive and
                    // refreshes the prediction source
                    self.predicted_frames = 0;
                    self.waiting_resync = false;
                    if frame > self.newest_input_frame {
                        self.newest_input_frame = frame;
                        self.last_remote_input = inputs;
                    }
                    if frame <= engine.frame() {
                        debug!(frame, local = engine.frame(), "input frame already simulated");
                    } else {
                        self.remote_inputs.insert(frame, inputs);
                    }
                }
                NetMessage::State { snapshot } => {
                    self.handle_snapshot(engine, snapshot, false);
                }
                NetMessage::Resync { snapshot } => {
                    self.handle_snapshot(engine, snapshot, true);
                }
            }
        }
    }

    fn handle_snapshot(
        &mut self,
        engine: &mut GameEngine,
        snapshot: OnlineMatchSnapshot,
        forced: bool,
    ) {
        if self.role == PeerRole::Host {
            debug!("host ignores remote snapshots");
            return;
        }

        let frame = snapshot.frame();

        // Snapshot frames only move forward
        if frame < self.last_snapshot_frame {
            debug!(
                frame,
                newest = self.last_snapshot_frame,
                "discarding out-of-order snapshot"
            );
            return;
        }

        let local_frame = engine.frame();
        if frame == local_frame {
            if hex::encode(engine.state_hash()) == snapshot.state_hash {
                // In agreement; nothing to repair
                self.last_snapshot_frame = frame;
                self.peer_connected = true;
                if !forced {
                    return;
                }
            } else {
                warn!(frame, "state divergence detected");
                self.notices.push(SyncNotice::DivergenceDetected { frame });
            }
        } else if frame < local_frame && !forced {
            // Behind us with no hash to compare against; only a forced
            // resync may rewind the guest
            debug!(frame, local_frame, "ignoring old periodic snapshot");
            return;
        }

        self.adopt(engine, snapshot);
    }

    /// Replace the local state with the authoritative snapshot.
    fn adopt(&mut self, engine: &mut GameEngine, snapshot: OnlineMatchSnapshot) {
        let frame = snapshot.frame();
        let remote_slot = self.role.local_slot().other();

        self.last_remote_input = snapshot.input_for(remote_slot);
        self.remote_inputs = self.remote_inputs.split_off(&(frame + 1));
        self.predicted_frames = 0;
        self.waiting_resync = false;
        self.last_snapshot_frame = frame;
        self.peer_connected = true;

        engine.replace_state(snapshot.state);

        info!(frame, "adopted authoritative snapshot");
        self.notices.push(SyncNotice::Resynced { frame });
    }
}

// =============================================================================
// TESTS
// =============================================================================
