//! Combat Telemetry
//!
//! A flat log of resolved hits, recorded by the combat resolver alongside
//! the event bus. Telemetry is for analysis and balancing; nothing in the
//! simulation reads it back.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::game::events::HitReport;
use crate::game::state::{FighterSlot, MoveType};

/// One resolved hit, as recorded for offline analysis.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchTelemetryEntry {
    /// Fighter that landed the hit
    pub attacker: FighterSlot,
    /// Fighter that was struck
    pub defender: FighterSlot,
    /// Move that landed
    pub source: MoveType,
    /// Attacker's combo count after this hit
    pub combo_count: u32,
    /// Frame the hit resolved on
    pub frame: u32,
    /// Wall-clock time of recording (not part of simulation state)
    pub recorded_at: DateTime<Utc>,
    /// Full numbers the resolver applied
    pub hit: HitReport,
}

impl MatchTelemetryEntry {
    /// Record a hit at the current wall-clock time.
    pub fn record(
        attacker: FighterSlot,
        defender: FighterSlot,
        combo_count: u32,
        frame: u32,
        hit: HitReport,
    ) -> Self {
        Self {
            attacker,
            defender,
            source: hit.move_type,
            combo_count,
            frame,
            recorded_at: Utc::now(),
            hit,
        }
    }
}
