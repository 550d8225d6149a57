//! Match State Definitions
//!
//! All state types for the match simulation: fighters, phases, move types.
//! Exactly one `MatchState` is live per match; it is mutated only by the
//! system pipeline during a tick and replaced wholesale on resync.

use serde::{Deserialize, Serialize};

use crate::core::fixed::{
    fixed_clamp, Fixed, FIXED_ONE, HURTBOX_RADIUS, SPAWN_OFFSET_X,
};
use crate::core::hash::{compute_state_hash, StateHash, StateHasher};
use crate::core::vec3::FixedVec3;
use crate::game::config::MatchConfig;

// =============================================================================
// FIGHTER SLOT
// =============================================================================

/// Which side of the match a fighter occupies.
///
/// Implements Ord so iteration over slots is always Player-first,
/// which keeps tie-breaking deterministic.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum FighterSlot {
    /// The local player's fighter.
    Player = 0,
    /// The CPU or remote opponent's fighter.
    Opponent = 1,
}

impl FighterSlot {
    /// Both slots in deterministic order.
    pub const BOTH: [FighterSlot; 2] = [FighterSlot::Player, FighterSlot::Opponent];

    /// The other slot.
    #[inline]
    pub fn other(self) -> FighterSlot {
        match self {
            FighterSlot::Player => FighterSlot::Opponent,
            FighterSlot::Opponent => FighterSlot::Player,
        }
    }

    /// Array index for per-slot bookkeeping.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }
}

// =============================================================================
// FACING
// =============================================================================

/// Horizontal facing direction along the fight axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Facing {
    /// Facing +X
    Right,
    /// Facing -X
    Left,
}

impl Facing {
    /// Sign as fixed-point (+1.0 or -1.0), for knockback and reach math.
    #[inline]
    pub fn sign(self) -> Fixed {
        match self {
            Facing::Right => FIXED_ONE,
            Facing::Left => -FIXED_ONE,
        }
    }

    /// Facing toward a target x coordinate from a source x coordinate.
    #[inline]
    pub fn toward(from_x: Fixed, to_x: Fixed) -> Facing {
        if to_x >= from_x {
            Facing::Right
        } else {
            Facing::Left
        }
    }
}

// =============================================================================
// MOVE TYPE
// =============================================================================

/// Category of attack, driving damage, knockback and combo/cancel rules.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
#[repr(u8)]
pub enum MoveType {
    /// Fast jab, low damage, short reach
    Light = 0,
    /// Slow strike, high damage
    Heavy = 1,
    /// Upward strike that launches for air combos
    Launcher = 2,
    /// Low sweep that trips
    Sweep = 3,
    /// Throw that ignores block
    Grab = 4,
    /// Meter-powered special move
    Special = 5,
}

impl MoveType {
    /// Base damage dealt on a clean hit.
    pub fn damage(self) -> Fixed {
        match self {
            MoveType::Light => 327680,    // 5.0
            MoveType::Heavy => 720896,    // 11.0
            MoveType::Launcher => 524288, // 8.0
            MoveType::Sweep => 393216,    // 6.0
            MoveType::Grab => 458752,     // 7.0
            MoveType::Special => 983040,  // 15.0
        }
    }

    /// Guard meter damage when the hit is blocked.
    pub fn guard_damage(self) -> Fixed {
        match self {
            MoveType::Light => 262144,    // 4.0
            MoveType::Heavy => 589824,    // 9.0
            MoveType::Launcher => 393216, // 6.0
            MoveType::Sweep => 327680,    // 5.0
            MoveType::Grab => 0,          // unblockable, no guard interaction
            MoveType::Special => 786432,  // 12.0
        }
    }

    /// Hitbox reach in front of the attacker.
    pub fn reach(self) -> Fixed {
        match self {
            MoveType::Light => 78643,     // 1.2
            MoveType::Heavy => 98304,     // 1.5
            MoveType::Launcher => 85196,  // 1.3
            MoveType::Sweep => 91750,     // 1.4
            MoveType::Grab => 65536,      // 1.0
            MoveType::Special => 117964,  // 1.8
        }
    }

    /// Hitbox radius.
    pub fn hitbox_radius(self) -> Fixed {
        match self {
            MoveType::Heavy | MoveType::Special => 49152, // 0.75
            _ => 39321,                                   // 0.6
        }
    }

    /// Knockback magnitude on a clean hit.
    pub fn knockback(self) -> Fixed {
        match self {
            MoveType::Light => 131072,    // 2.0
            MoveType::Heavy => 294912,    // 4.5
            MoveType::Launcher => 196608, // 3.0
            MoveType::Sweep => 163840,    // 2.5
            MoveType::Grab => 229376,     // 3.5
            MoveType::Special => 393216,  // 6.0
        }
    }

    /// Vertical share of knockback (0 = horizontal, FIXED_ONE = straight up).
    /// Drives air-combo eligibility.
    pub fn launch(self) -> Fixed {
        match self {
            MoveType::Launcher => 49152, // 0.75
            MoveType::Special => 32768,  // 0.5
            _ => 0,
        }
    }

    /// Hit-lag applied to the defender, in ticks.
    pub fn hitlag_ticks(self) -> u32 {
        match self {
            MoveType::Light => 6,
            MoveType::Heavy => 12,
            MoveType::Launcher => 10,
            MoveType::Sweep => 8,
            MoveType::Grab => 10,
            MoveType::Special => 14,
        }
    }

    /// Whether this move category trips the defender.
    pub fn causes_trip(self) -> bool {
        matches!(self, MoveType::Sweep)
    }

    /// Whether the move connects through a block.
    pub fn ignores_block(self) -> bool {
        matches!(self, MoveType::Grab)
    }

    /// Stamina cost to perform the move (Special draws on the special
    /// meter instead).
    pub fn stamina_cost(self) -> Fixed {
        match self {
            MoveType::Light => 524288,    // 8.0
            MoveType::Heavy => 1048576,   // 16.0
            MoveType::Launcher => 917504, // 14.0
            MoveType::Sweep => 786432,    // 12.0
            MoveType::Grab => 655360,     // 10.0
            MoveType::Special => 0,
        }
    }

    /// Recovery ticks before the fighter can attack again.
    pub fn cooldown_ticks(self) -> u32 {
        match self {
            MoveType::Light => 18,
            MoveType::Heavy => 36,
            MoveType::Launcher => 42,
            MoveType::Sweep => 30,
            MoveType::Grab => 40,
            MoveType::Special => 48,
        }
    }
}

// =============================================================================
// METERS
// =============================================================================

/// One of the three bounded fighter meters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MeterKind {
    /// Absorbs blocked hits; empty guard means a guard break.
    Guard,
    /// Spent by attacks and dodges.
    Stamina,
    /// Built by landing and taking hits; spent by Special.
    Special,
}

// =============================================================================
// ACTIVE ATTACK
// =============================================================================

/// An attack activation in flight.
///
/// Attacks are edge-triggered: the combat resolver consumes the activation
/// exactly once, so one attack instance can never hit twice even though
/// `is_attacking` stays set through recovery.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveAttack {
    /// Which move was activated
    pub move_type: MoveType,
    /// Frame the attack started
    pub started_frame: u32,
    /// Whether the resolver has already processed this activation
    pub resolved: bool,
}

// =============================================================================
// FIGHTER STATE
// =============================================================================

/// Complete per-tick state of one fighter.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FighterState {
    /// Which side this fighter occupies
    pub slot: FighterSlot,

    /// Current health, clamped to [0, max_health]
    pub health: Fixed,

    /// Position on the stage
    pub position: FixedVec3,

    /// Current velocity
    pub velocity: FixedVec3,

    /// Horizontal facing
    pub facing: Facing,

    /// Airborne from a jump or launch
    pub is_jumping: bool,
    /// Attack in startup or recovery
    pub is_attacking: bool,
    /// Guard engaged
    pub is_blocking: bool,
    /// Dodge i-frames active
    pub is_dodging: bool,
    /// Grab in progress
    pub is_grabbing: bool,
    /// Taunting (builds special meter, leaves fighter open)
    pub is_taunting: bool,
    /// Attacking while airborne
    pub is_air_attacking: bool,

    /// Remaining mid-air jumps
    pub air_jumps_left: u8,

    /// Guard meter, [0, meter_max]
    pub guard_meter: Fixed,
    /// Stamina meter, [0, meter_max]
    pub stamina_meter: Fixed,
    /// Special meter, [0, meter_max]
    pub special_meter: Fixed,

    /// Ticks until the next attack is allowed
    pub attack_cooldown: u32,
    /// Ticks until the next dodge is allowed
    pub dodge_cooldown: u32,
    /// Ticks until the next grab is allowed
    pub grab_cooldown: u32,
    /// Ticks of movement lockout (hit-lag, trips, taunt recovery)
    pub move_cooldown: u32,

    /// Remaining dodge invulnerability ticks
    pub dodge_iframes: u32,

    /// Consecutive hits in the current combo
    pub combo_count: u32,
    /// Ticks left before the combo drops
    pub combo_timer: u32,

    /// Most recent move performed, for combo/cancel rules
    pub last_move_type: Option<MoveType>,

    /// Attack activation pending or in recovery
    pub active_attack: Option<ActiveAttack>,
}

impl FighterState {
    /// Create a fighter at its spawn position, facing the opponent.
    pub fn new(slot: FighterSlot, config: &MatchConfig) -> Self {
        let (spawn_x, facing) = match slot {
            FighterSlot::Player => (-SPAWN_OFFSET_X, Facing::Right),
            FighterSlot::Opponent => (SPAWN_OFFSET_X, Facing::Left),
        };

        Self {
            slot,
            health: config.max_health,
            position: FixedVec3::new(spawn_x, 0, 0),
            velocity: FixedVec3::ZERO,
            facing,
            is_jumping: false,
            is_attacking: false,
            is_blocking: false,
            is_dodging: false,
            is_grabbing: false,
            is_taunting: false,
            is_air_attacking: false,
            air_jumps_left: config.max_air_jumps,
            guard_meter: config.meter_max,
            stamina_meter: config.meter_max,
            special_meter: 0,
            attack_cooldown: 0,
            dodge_cooldown: 0,
            grab_cooldown: 0,
            move_cooldown: 0,
            dodge_iframes: 0,
            combo_count: 0,
            combo_timer: 0,
            last_move_type: None,
            active_attack: None,
        }
    }

    /// Reset for the next round. Meters, position and flags return to
    /// spawn values; nothing carries over between rounds.
    pub fn reset_for_round(&mut self, config: &MatchConfig) {
        *self = FighterState::new(self.slot, config);
    }

    /// Hurtbox radius (fixed volume, not mesh-accurate by design).
    #[inline]
    pub fn hurtbox_radius(&self) -> Fixed {
        HURTBOX_RADIUS
    }

    /// True while the fighter is committed to an action but not guarded:
    /// the window in which an incoming hit is a counter-hit.
    #[inline]
    pub fn is_committed(&self) -> bool {
        (self.is_attacking || self.is_grabbing || self.is_taunting)
            && !self.is_blocking
            && !self.is_dodging
    }

    /// True if the fighter is on the ground.
    #[inline]
    pub fn is_grounded(&self) -> bool {
        self.position.y <= 0 && !self.is_jumping
    }

    /// Apply damage, clamping health at zero.
    pub fn apply_damage(&mut self, amount: Fixed) {
        self.health = fixed_clamp(self.health.saturating_sub(amount), 0, self.health);
    }

    /// Add to a meter, clamped to [0, meter_max]. Returns true if the
    /// meter hit zero from a positive value.
    pub fn adjust_meter(&mut self, kind: MeterKind, delta: Fixed, meter_max: Fixed) -> bool {
        let meter = match kind {
            MeterKind::Guard => &mut self.guard_meter,
            MeterKind::Stamina => &mut self.stamina_meter,
            MeterKind::Special => &mut self.special_meter,
        };
        let before = *meter;
        *meter = fixed_clamp(before.saturating_add(delta), 0, meter_max);
        before > 0 && *meter == 0
    }

    /// Hash this fighter's state for verification.
    pub fn hash_into(&self, hasher: &mut StateHasher) {
        hasher.update_u8(self.slot as u8);
        hasher.update_fixed(self.health);
        hasher.update_vec3(self.position);
        hasher.update_vec3(self.velocity);
        hasher.update_fixed(self.facing.sign());
        hasher.update_bool(self.is_jumping);
        hasher.update_bool(self.is_attacking);
        hasher.update_bool(self.is_blocking);
        hasher.update_bool(self.is_dodging);
        hasher.update_bool(self.is_grabbing);
        hasher.update_bool(self.is_taunting);
        hasher.update_bool(self.is_air_attacking);
        hasher.update_u8(self.air_jumps_left);
        hasher.update_fixed(self.guard_meter);
        hasher.update_fixed(self.stamina_meter);
        hasher.update_fixed(self.special_meter);
        hasher.update_u32(self.attack_cooldown);
        hasher.update_u32(self.dodge_cooldown);
        hasher.update_u32(self.grab_cooldown);
        hasher.update_u32(self.move_cooldown);
        hasher.update_u32(self.dodge_iframes);
        hasher.update_u32(self.combo_count);
        hasher.update_u32(self.combo_timer);
        hasher.update_u8(self.last_move_type.map(|m| m as u8 + 1).unwrap_or(0));
        match &self.active_attack {
            Some(attack) => {
                hasher.update_u8(attack.move_type as u8 + 1);
                hasher.update_u32(attack.started_frame);
                hasher.update_bool(attack.resolved);
            }
            None => hasher.update_u8(0),
        }
    }
}

// =============================================================================
// GAME PHASE
// =============================================================================

/// Current phase of the match.
///
/// Strict progression: `menu` is initial, `match_end` terminal. Phase
/// transitions are driven by systems, never by the engine itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GamePhase {
    /// Pre-match menu; simulation idles
    #[default]
    Menu,
    /// Active round
    Fighting,
    /// Round over, intermission running
    RoundEnd,
    /// Match decided; terminal
    MatchEnd,
}

impl GamePhase {
    /// Whether moving to `next` is a legal phase transition.
    pub fn allows(self, next: GamePhase) -> bool {
        matches!(
            (self, next),
            (GamePhase::Menu, GamePhase::Fighting)
                | (GamePhase::Fighting, GamePhase::RoundEnd)
                | (GamePhase::RoundEnd, GamePhase::Fighting)
                | (GamePhase::RoundEnd, GamePhase::MatchEnd)
        )
    }
}

// =============================================================================
// MATCH STATE
// =============================================================================

/// Complete state of a match: both fighters plus match metadata.
///
/// Replaced wholesale on resync, never partially patched.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchState {
    /// Match identifier (UUID bytes)
    pub match_id: [u8; 16],

    /// Seed for all pipeline pseudo-randomness (part of the
    /// determinism contract)
    pub seed: u64,

    /// Monotonic frame counter; +1 per tick
    pub frame: u32,

    /// Elapsed simulated time in milliseconds
    pub time_ms: u64,

    /// Current phase
    pub phase: GamePhase,

    /// Current round number (1-based once fighting starts)
    pub round: u8,

    /// Rounds won, indexed by `FighterSlot`
    pub rounds_won: [u8; 2],

    /// Ticks remaining on the round clock
    pub round_clock_ticks: u32,

    /// Ticks remaining in the round-end intermission
    pub intermission_ticks: u32,

    /// The local player's fighter
    pub player: FighterState,

    /// The CPU or remote opponent's fighter
    pub opponent: FighterState,
}

impl MatchState {
    /// Create a fresh match in the menu phase.
    pub fn new(match_id: [u8; 16], seed: u64, config: &MatchConfig) -> Self {
        Self {
            match_id,
            seed,
            frame: 0,
            time_ms: 0,
            phase: GamePhase::Menu,
            round: 0,
            rounds_won: [0, 0],
            round_clock_ticks: config.round_clock_ticks,
            intermission_ticks: 0,
            player: FighterState::new(FighterSlot::Player, config),
            opponent: FighterState::new(FighterSlot::Opponent, config),
        }
    }

    /// Get a fighter by slot.
    #[inline]
    pub fn fighter(&self, slot: FighterSlot) -> &FighterState {
        match slot {
            FighterSlot::Player => &self.player,
            FighterSlot::Opponent => &self.opponent,
        }
    }

    /// Get a fighter mutably by slot.
    #[inline]
    pub fn fighter_mut(&mut self, slot: FighterSlot) -> &mut FighterState {
        match slot {
            FighterSlot::Player => &mut self.player,
            FighterSlot::Opponent => &mut self.opponent,
        }
    }

    /// Split-borrow (attacker, defender) for combat resolution.
    #[inline]
    pub fn pair_mut(&mut self, attacker: FighterSlot) -> (&mut FighterState, &mut FighterState) {
        match attacker {
            FighterSlot::Player => (&mut self.player, &mut self.opponent),
            FighterSlot::Opponent => (&mut self.opponent, &mut self.player),
        }
    }

    /// Attempt a phase transition; illegal transitions are rejected.
    pub fn transition(&mut self, next: GamePhase) -> bool {
        if self.phase.allows(next) {
            self.phase = next;
            true
        } else {
            false
        }
    }

    /// Check if the match has reached its terminal phase.
    #[inline]
    pub fn is_ended(&self) -> bool {
        matches!(self.phase, GamePhase::MatchEnd)
    }

    /// Compute the hash of the current state for divergence detection
    /// and replay verification.
    pub fn compute_hash(&self) -> StateHash {
        compute_state_hash(self.frame, self.seed, |hasher| {
            hasher.update_uuid(&self.match_id);
            hasher.update_u64(self.time_ms);
            hasher.update_u8(match self.phase {
                GamePhase::Menu => 0,
                GamePhase::Fighting => 1,
                GamePhase::RoundEnd => 2,
                GamePhase::MatchEnd => 3,
            });
            hasher.update_u8(self.round);
            hasher.update_u8(self.rounds_won[0]);
            hasher.update_u8(self.rounds_won[1]);
            hasher.update_u32(self.round_clock_ticks);
            hasher.update_u32(self.intermission_ticks);
            self.player.hash_into(hasher);
            self.opponent.hash_into(hasher);
        })
    }
}

// =============================================================================
// TESTS
// =============================================================================
