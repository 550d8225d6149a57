//! Match Configuration
//!
//! All tuning for a match flows through `MatchConfig`. Meter bounds and
//! the combo window are parameters rather than hardcoded constants so the
//! combat resolver can be tuned per game mode.

use serde::{Deserialize, Serialize};

use crate::core::fixed::Fixed;

/// Configuration for match simulation.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MatchConfig {
    /// Maximum fighter health
    pub max_health: Fixed,

    /// Upper bound for guard/stamina/special meters
    pub meter_max: Fixed,

    /// Fraction of damage that chips through a block (fixed-point ratio)
    pub guard_chip_ratio: Fixed,

    /// Ticks a combo stays alive between hits
    pub combo_window_ticks: u32,

    /// Damage multiplier on counter-hits (fixed-point, >= 1.0)
    pub counter_damage_mult: Fixed,

    /// Knockback multiplier on counter-hits (fixed-point, >= 1.0)
    pub counter_knockback_mult: Fixed,

    /// Launch share above which a hit makes the defender airborne
    pub launch_threshold: Fixed,

    /// Special meter gained by the attacker per landed hit
    pub special_gain_on_hit: Fixed,

    /// Special meter gained by the defender per hit taken
    pub special_gain_on_taken: Fixed,

    /// Special meter cost of a Special move
    pub special_cost: Fixed,

    /// Stamina regenerated per tick while not acting
    pub stamina_regen: Fixed,

    /// Guard meter regenerated per tick while not blocking
    pub guard_regen: Fixed,

    /// Stamina cost of a dodge
    pub dodge_stamina_cost: Fixed,

    /// Dodge invulnerability duration in ticks
    pub dodge_iframe_ticks: u32,

    /// Dodge cooldown in ticks
    pub dodge_cooldown_ticks: u32,

    /// Movement lockout after being tripped, in ticks
    pub trip_lockout_ticks: u32,

    /// Taunt recovery in ticks
    pub taunt_ticks: u32,

    /// Special meter gained by a full taunt
    pub taunt_special_gain: Fixed,

    /// Mid-air jumps available after the initial jump
    pub max_air_jumps: u8,

    /// Round clock in ticks (99 seconds at 60 Hz)
    pub round_clock_ticks: u32,

    /// Intermission between rounds, in ticks
    pub intermission_ticks: u32,

    /// Rounds needed to win the match
    pub rounds_to_win: u8,
}

impl Default for MatchConfig {
    fn default() -> Self {
        Self {
            max_health: 6553600,        // 100.0
            meter_max: 6553600,         // 100.0
            guard_chip_ratio: 16384,    // 0.25
            combo_window_ticks: 45,     // 0.75s at 60 Hz
            counter_damage_mult: 98304, // 1.5x
            counter_knockback_mult: 81920, // 1.25x
            launch_threshold: 32768,    // 0.5
            special_gain_on_hit: 524288,   // 8.0
            special_gain_on_taken: 262144, // 4.0
            special_cost: 3276800,      // 50.0
            stamina_regen: 26214,       // ~0.4 per tick = 24/s
            guard_regen: 16384,         // 0.25 per tick = 15/s
            dodge_stamina_cost: 1310720, // 20.0
            dodge_iframe_ticks: 14,
            dodge_cooldown_ticks: 30,
            trip_lockout_ticks: 24,
            taunt_ticks: 45,
            taunt_special_gain: 655360, // 10.0
            max_air_jumps: 1,
            round_clock_ticks: 5940,    // 99 seconds at 60 Hz
            intermission_ticks: 180,    // 3 seconds
            rounds_to_win: 2,
        }
    }
}
