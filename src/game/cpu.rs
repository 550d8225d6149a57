//! CPU Opponent
//!
//! A deterministic command source for single-player matches. The driver
//! owns its own PRNG, so given the same seed and the same observed state
//! sequence it always issues the same commands. It lives outside the
//! simulation: it only reads state and enqueues commands like any other
//! player would.

use crate::core::fixed::{fixed_abs, to_fixed, Fixed, FIXED_ONE};
use crate::core::rng::DeterministicRng;
use crate::game::command::CommandPayload;
use crate::game::state::{FighterSlot, GamePhase, MatchState, MoveType};

/// Distance at which the CPU considers itself in striking range.
const STRIKE_RANGE: Fixed = 98304; // 1.5

/// Deterministic CPU command source.
pub struct CpuDriver {
    rng: DeterministicRng,
    slot: FighterSlot,
}

impl CpuDriver {
    /// Create a driver for the given slot.
    ///
    /// Seed it from the match seed so replays reproduce the CPU exactly.
    pub fn new(seed: u64, slot: FighterSlot) -> Self {
        Self {
            rng: DeterministicRng::new(seed),
            slot,
        }
    }

    /// The slot this driver plays.
    pub fn slot(&self) -> FighterSlot {
        self.slot
    }

    /// Decide the command for this tick, if any.
    pub fn decide(&mut self, state: &MatchState) -> Option<CommandPayload> {
        if state.phase != GamePhase::Fighting {
            return None;
        }

        let me = state.fighter(self.slot);
        let them = state.fighter(self.slot.other());

        // Busy fighters wait out their commitment
        if me.move_cooldown > 0 || me.is_attacking || me.is_dodging || me.is_grabbing {
            return None;
        }

        let gap = fixed_abs(them.position.x - me.position.x);

        if gap > STRIKE_RANGE {
            // Close the distance, with an occasional jump-in
            if me.is_grounded() && self.rng.chance(1, 20) {
                return Some(CommandPayload::Jump);
            }
            let dx = if them.position.x > me.position.x {
                FIXED_ONE
            } else {
                -FIXED_ONE
            };
            return Some(CommandPayload::Move { dx, dz: 0 });
        }

        // In range: mix of offense and defense
        if me.is_blocking {
            return Some(CommandPayload::Block { engaged: false });
        }
        if them.is_attacking && self.rng.chance(2, 5) {
            return if self.rng.chance(1, 2) {
                Some(CommandPayload::Block { engaged: true })
            } else {
                Some(CommandPayload::Dodge)
            };
        }
        if me.special_meter >= to_fixed(50.0) && self.rng.chance(1, 4) {
            return Some(CommandPayload::Special);
        }
        if them.is_blocking && self.rng.chance(1, 3) {
            return Some(CommandPayload::Grab);
        }

        let move_type = match self.rng.next_int(10) {
            0..=3 => MoveType::Light,
            4..=6 => MoveType::Heavy,
            7 => MoveType::Launcher,
            8 => MoveType::Sweep,
            _ => MoveType::Grab,
        };
        if move_type == MoveType::Grab {
            Some(CommandPayload::Grab)
        } else {
            Some(CommandPayload::Attack { move_type })
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::config::MatchConfig;
    use crate::game::engine::GameEngine;

    fn drive(seed: u64) -> Vec<Option<CommandPayload>> {
        let config = MatchConfig::default();
        let mut engine = GameEngine::with_default_pipeline([4u8; 16], seed, config);
        let mut cpu = CpuDriver::new(seed, FighterSlot::Opponent);

        engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);
        engine.step();

        let mut decisions = Vec::new();
        for _ in 0..300 {
            let decision = cpu.decide(engine.state());
            if let Some(payload) = decision {
                engine.enqueue_command(FighterSlot::Opponent, payload, 0);
            }
            decisions.push(decision);
            engine.step();
        }
        decisions
    }

    #[test]
    fn test_cpu_is_deterministic() {
        assert_eq!(drive(42), drive(42));
    }

    #[test]
    fn test_cpu_closes_distance() {
        let config = MatchConfig::default();
        let mut engine = GameEngine::with_default_pipeline([4u8; 16], 9, config);
        let mut cpu = CpuDriver::new(9, FighterSlot::Opponent);

        engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);
        engine.step();
        let start_gap = fixed_abs(
            engine.state().opponent.position.x - engine.state().player.position.x,
        );

        for _ in 0..120 {
            if let Some(payload) = cpu.decide(engine.state()) {
                engine.enqueue_command(FighterSlot::Opponent, payload, 0);
            }
            engine.step();
        }

        let end_gap = fixed_abs(
            engine.state().opponent.position.x - engine.state().player.position.x,
        );
        assert!(end_gap < start_gap);
    }

    #[test]
    fn test_cpu_idles_outside_fighting() {
        let config = MatchConfig::default();
        let engine = GameEngine::with_default_pipeline([4u8; 16], 9, config);
        let mut cpu = CpuDriver::new(9, FighterSlot::Opponent);
        assert_eq!(cpu.decide(engine.state()), None);
    }
}
