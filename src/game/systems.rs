//! Simulation Systems
//!
//! The pipeline stages other than combat: command validation, movement
//! integration, timers and meter regeneration, and round/phase
//! bookkeeping. Each system touches state only through the
//! `SystemContext` it is handed for the tick.

use tracing::debug;

use crate::core::fixed::{
    fixed_clamp, fixed_mul, Fixed, DODGE_SPEED, FIXED_ONE, GRAVITY, JUMP_VELOCITY,
    STAGE_HALF_DEPTH, STAGE_HALF_WIDTH, TICK_DT, WALK_SPEED,
};
use crate::game::command::{Command, CommandPayload};
use crate::game::engine::{System, SystemContext};
use crate::game::events::MatchEventData;
use crate::game::state::{ActiveAttack, Facing, FighterSlot, GamePhase, MeterKind, MoveType};

/// Horizontal velocity retained per tick on the ground.
const GROUND_FRICTION: Fixed = 55705; // 0.85

/// Air control is half of ground control.
const AIR_CONTROL: Fixed = 32768; // 0.5

// =============================================================================
// COMMAND SYSTEM
// =============================================================================

/// Validates and applies buffered commands in arrival order.
///
/// A command that fails validation is a no-op: it mutates nothing and
/// emits nothing. Only applied commands produce `CommandProcessed`.
pub struct CommandSystem;

impl System for CommandSystem {
    fn name(&self) -> &'static str {
        "commands"
    }

    fn apply(&mut self, ctx: &mut SystemContext) {
        for command in ctx.commands.iter().copied().collect::<Vec<_>>() {
            if apply_command(ctx, command) {
                ctx.emit(MatchEventData::CommandProcessed {
                    slot: command.slot,
                    kind: command.payload.kind(),
                });
            } else {
                debug!(slot = ?command.slot, payload = ?command.payload, "command rejected");
            }
        }
    }
}

/// Apply one command. Returns false if it was rejected.
fn apply_command(ctx: &mut SystemContext, command: Command) -> bool {
    if let CommandPayload::Start = command.payload {
        return apply_start(ctx);
    }

    if ctx.state.phase != GamePhase::Fighting {
        return false;
    }

    let config = ctx.config;
    let frame = ctx.state.frame;
    let slot = command.slot;

    match command.payload {
        CommandPayload::Start => unreachable!("handled above"),

        CommandPayload::Move { dx, dz } => {
            let fighter = ctx.state.fighter_mut(slot);
            if fighter.move_cooldown > 0
                || fighter.is_attacking
                || fighter.is_blocking
                || fighter.is_dodging
                || fighter.is_grabbing
                || fighter.is_taunting
            {
                return false;
            }
            let dx = fixed_clamp(dx, -FIXED_ONE, FIXED_ONE);
            let dz = fixed_clamp(dz, -FIXED_ONE, FIXED_ONE);
            let control = if fighter.is_grounded() {
                FIXED_ONE
            } else {
                AIR_CONTROL
            };
            fighter.velocity.x = fixed_mul(fixed_mul(dx, WALK_SPEED), control);
            fighter.velocity.z = fixed_mul(fixed_mul(dz, WALK_SPEED), control);
            true
        }

        CommandPayload::Jump => {
            let fighter = ctx.state.fighter_mut(slot);
            if fighter.move_cooldown > 0
                || fighter.is_attacking
                || fighter.is_blocking
                || fighter.is_dodging
            {
                return false;
            }
            if fighter.is_grounded() {
                fighter.velocity.y = JUMP_VELOCITY;
                fighter.is_jumping = true;
                true
            } else if fighter.air_jumps_left > 0 {
                fighter.air_jumps_left -= 1;
                fighter.velocity.y = JUMP_VELOCITY;
                true
            } else {
                false
            }
        }

        CommandPayload::Attack { move_type } => {
            // The special move has its own command and meter
            if move_type == MoveType::Special {
                return false;
            }
            start_strike(ctx, slot, move_type, frame)
        }

        CommandPayload::Block { engaged } => {
            let fighter = ctx.state.fighter_mut(slot);
            if engaged {
                if fighter.is_attacking
                    || fighter.is_dodging
                    || fighter.is_grabbing
                    || fighter.is_taunting
                    || !fighter.is_grounded()
                {
                    return false;
                }
                fighter.is_blocking = true;
                fighter.velocity.x = 0;
                fighter.velocity.z = 0;
            } else {
                if !fighter.is_blocking {
                    return false;
                }
                fighter.is_blocking = false;
            }
            true
        }

        CommandPayload::Dodge => {
            let stamina_cost = config.dodge_stamina_cost;
            let fighter = ctx.state.fighter_mut(slot);
            if fighter.dodge_cooldown > 0
                || fighter.move_cooldown > 0
                || fighter.is_attacking
                || fighter.is_dodging
                || !fighter.is_grounded()
                || fighter.stamina_meter < stamina_cost
            {
                return false;
            }
            let depleted =
                fighter.adjust_meter(MeterKind::Stamina, -stamina_cost, config.meter_max);
            fighter.is_dodging = true;
            fighter.is_blocking = false;
            fighter.dodge_iframes = config.dodge_iframe_ticks;
            fighter.dodge_cooldown = config.dodge_cooldown_ticks;
            // Dodge slips backward, away from the current facing
            fighter.velocity.x = fixed_mul(-fighter.facing.sign(), DODGE_SPEED);
            if depleted {
                ctx.emit(MatchEventData::MeterDepleted {
                    slot,
                    meter: MeterKind::Stamina,
                });
            }
            true
        }

        CommandPayload::Grab => {
            let fighter = ctx.state.fighter(slot);
            if fighter.grab_cooldown > 0 || !fighter.is_grounded() {
                return false;
            }
            start_strike(ctx, slot, MoveType::Grab, frame)
        }

        CommandPayload::Special => {
            let cost = config.special_cost;
            let fighter = ctx.state.fighter_mut(slot);
            if fighter.attack_cooldown > 0
                || fighter.move_cooldown > 0
                || fighter.is_attacking
                || fighter.is_blocking
                || fighter.is_dodging
                || fighter.is_grabbing
                || fighter.special_meter < cost
            {
                return false;
            }
            let depleted = fighter.adjust_meter(MeterKind::Special, -cost, config.meter_max);
            activate(fighter, MoveType::Special, frame);
            if depleted {
                ctx.emit(MatchEventData::MeterDepleted {
                    slot,
                    meter: MeterKind::Special,
                });
            }
            true
        }

        CommandPayload::Taunt => {
            let gain = config.taunt_special_gain;
            let taunt_ticks = config.taunt_ticks;
            let meter_max = config.meter_max;
            let fighter = ctx.state.fighter_mut(slot);
            if fighter.move_cooldown > 0
                || fighter.is_attacking
                || fighter.is_blocking
                || fighter.is_dodging
                || fighter.is_grabbing
                || !fighter.is_grounded()
            {
                return false;
            }
            fighter.is_taunting = true;
            fighter.move_cooldown = taunt_ticks;
            fighter.velocity.x = 0;
            fighter.velocity.z = 0;
            fighter.adjust_meter(MeterKind::Special, gain, meter_max);
            true
        }
    }
}

/// Start the match from the menu.
fn apply_start(ctx: &mut SystemContext) -> bool {
    if !ctx.state.transition(GamePhase::Fighting) {
        return false;
    }
    ctx.state.round = 1;
    ctx.state.round_clock_ticks = ctx.config.round_clock_ticks;
    ctx.emit(MatchEventData::PhaseChanged {
        from: GamePhase::Menu,
        to: GamePhase::Fighting,
    });
    true
}

/// Validate and activate a strike (attack, grab or special).
fn start_strike(
    ctx: &mut SystemContext,
    slot: FighterSlot,
    move_type: MoveType,
    frame: u32,
) -> bool {
    let stamina_cost = move_type.stamina_cost();
    let meter_max = ctx.config.meter_max;
    let fighter = ctx.state.fighter_mut(slot);

    if fighter.attack_cooldown > 0
        || fighter.move_cooldown > 0
        || fighter.is_attacking
        || fighter.is_dodging
        || fighter.is_grabbing
        || fighter.is_blocking
        || fighter.stamina_meter < stamina_cost
    {
        return false;
    }

    let depleted = fighter.adjust_meter(MeterKind::Stamina, -stamina_cost, meter_max);
    activate(fighter, move_type, frame);
    if depleted {
        ctx.emit(MatchEventData::MeterDepleted {
            slot,
            meter: MeterKind::Stamina,
        });
    }
    true
}

/// Set the attack flags and activation record for a strike.
fn activate(fighter: &mut crate::game::state::FighterState, move_type: MoveType, frame: u32) {
    if move_type == MoveType::Grab {
        fighter.is_grabbing = true;
        fighter.grab_cooldown = move_type.cooldown_ticks();
    } else {
        fighter.is_attacking = true;
        fighter.is_air_attacking = !fighter.is_grounded();
        fighter.attack_cooldown = move_type.cooldown_ticks();
    }
    // Commitment window; also the counter-hit window
    fighter.move_cooldown = fighter.move_cooldown.max(move_type.hitlag_ticks() * 2);
    fighter.last_move_type = Some(move_type);
    fighter.active_attack = Some(ActiveAttack {
        move_type,
        started_frame: frame,
        resolved: false,
    });
}

// =============================================================================
// MOVEMENT SYSTEM
// =============================================================================

/// Integrates velocity, gravity, landings, facing and stage bounds.
///
/// Runs before combat so hit detection always sees this tick's positions.
pub struct MovementSystem;

impl System for MovementSystem {
    fn name(&self) -> &'static str {
        "movement"
    }

    fn apply(&mut self, ctx: &mut SystemContext) {
        if ctx.state.phase != GamePhase::Fighting {
            return;
        }

        let max_air_jumps = ctx.config.max_air_jumps;
        let positions = [ctx.state.player.position.x, ctx.state.opponent.position.x];

        for slot in FighterSlot::BOTH {
            let other_x = positions[slot.other().index()];
            let fighter = ctx.state.fighter_mut(slot);

            // Fighters track each other while free on the ground
            if fighter.is_grounded() && !fighter.is_attacking && !fighter.is_grabbing {
                fighter.facing = Facing::toward(fighter.position.x, other_x);
            }

            let airborne = !fighter.is_grounded();
            if airborne {
                fighter.velocity.y -= fixed_mul(GRAVITY, TICK_DT);
            }

            fighter.position = fighter.position + fighter.velocity.scale(TICK_DT);

            // Landing
            if airborne && fighter.position.y <= 0 {
                fighter.position.y = 0;
                fighter.velocity.y = 0;
                fighter.is_jumping = false;
                fighter.is_air_attacking = false;
                fighter.air_jumps_left = max_air_jumps;
            }

            if fighter.is_grounded() {
                fighter.velocity.x = fixed_mul(fighter.velocity.x, GROUND_FRICTION);
                fighter.velocity.z = fixed_mul(fighter.velocity.z, GROUND_FRICTION);
            }

            // Stage bounds; velocity dies at the wall
            if fighter.position.x.abs() > STAGE_HALF_WIDTH {
                fighter.position.x = fixed_clamp(fighter.position.x, -STAGE_HALF_WIDTH, STAGE_HALF_WIDTH);
                fighter.velocity.x = 0;
            }
            if fighter.position.z.abs() > STAGE_HALF_DEPTH {
                fighter.position.z = fixed_clamp(fighter.position.z, -STAGE_HALF_DEPTH, STAGE_HALF_DEPTH);
                fighter.velocity.z = 0;
            }
        }
    }
}

// =============================================================================
// TIMER SYSTEM
// =============================================================================

/// Ticks down cooldowns and timers, regenerates meters, and clears
/// expired action flags.
pub struct TimerSystem;

impl System for TimerSystem {
    fn name(&self) -> &'static str {
        "timers"
    }

    fn apply(&mut self, ctx: &mut SystemContext) {
        if ctx.state.phase != GamePhase::Fighting {
            return;
        }

        let config = ctx.config;
        let mut dropped: Vec<(FighterSlot, u32)> = Vec::new();

        for slot in FighterSlot::BOTH {
            let fighter = ctx.state.fighter_mut(slot);

            fighter.attack_cooldown = fighter.attack_cooldown.saturating_sub(1);
            fighter.dodge_cooldown = fighter.dodge_cooldown.saturating_sub(1);
            fighter.grab_cooldown = fighter.grab_cooldown.saturating_sub(1);
            fighter.move_cooldown = fighter.move_cooldown.saturating_sub(1);
            fighter.dodge_iframes = fighter.dodge_iframes.saturating_sub(1);

            if fighter.is_dodging && fighter.dodge_iframes == 0 {
                fighter.is_dodging = false;
            }

            // Commitment ends with the move lockout
            if fighter.move_cooldown == 0 {
                if fighter.is_attacking || fighter.is_grabbing {
                    fighter.is_attacking = false;
                    fighter.is_grabbing = false;
                    fighter.active_attack = None;
                    if fighter.is_grounded() {
                        fighter.is_air_attacking = false;
                    }
                }
                fighter.is_taunting = false;
            }

            if fighter.combo_timer > 0 {
                fighter.combo_timer -= 1;
                if fighter.combo_timer == 0 && fighter.combo_count > 0 {
                    dropped.push((slot, fighter.combo_count));
                    fighter.combo_count = 0;
                }
            }

            // Regeneration
            if !fighter.is_blocking {
                fighter.adjust_meter(MeterKind::Guard, config.guard_regen, config.meter_max);
            }
            if !fighter.is_attacking && !fighter.is_dodging && !fighter.is_grabbing {
                fighter.adjust_meter(MeterKind::Stamina, config.stamina_regen, config.meter_max);
            }
        }

        for (slot, combo_count) in dropped {
            ctx.emit(MatchEventData::ComboDropped { slot, combo_count });
        }
    }
}

// =============================================================================
// ROUND SYSTEM
// =============================================================================

/// Drives rounds: KO and timeout detection, intermissions, round resets,
/// and the final match result.
pub struct RoundSystem;

impl System for RoundSystem {
    fn name(&self) -> &'static str {
        "rounds"
    }

    fn apply(&mut self, ctx: &mut SystemContext) {
        match ctx.state.phase {
            GamePhase::Fighting => self.check_round_over(ctx),
            GamePhase::RoundEnd => self.run_intermission(ctx),
            GamePhase::Menu | GamePhase::MatchEnd => {}
        }
    }
}

impl RoundSystem {
    fn check_round_over(&self, ctx: &mut SystemContext) {
        let player_ko = ctx.state.player.health == 0;
        let opponent_ko = ctx.state.opponent.health == 0;

        let winner = if player_ko || opponent_ko {
            match (player_ko, opponent_ko) {
                (true, true) => None,
                (true, false) => Some(FighterSlot::Opponent),
                (false, true) => Some(FighterSlot::Player),
                (false, false) => unreachable!(),
            }
        } else {
            ctx.state.round_clock_ticks = ctx.state.round_clock_ticks.saturating_sub(1);
            if ctx.state.round_clock_ticks > 0 {
                return;
            }
            // Timeout: higher remaining health takes the round
            match ctx.state.player.health.cmp(&ctx.state.opponent.health) {
                std::cmp::Ordering::Greater => Some(FighterSlot::Player),
                std::cmp::Ordering::Less => Some(FighterSlot::Opponent),
                std::cmp::Ordering::Equal => None,
            }
        };

        let round = ctx.state.round;
        if let Some(winner) = winner {
            ctx.state.rounds_won[winner.index()] += 1;
        }
        ctx.state.transition(GamePhase::RoundEnd);
        ctx.state.intermission_ticks = ctx.config.intermission_ticks;

        ctx.emit(MatchEventData::PhaseChanged {
            from: GamePhase::Fighting,
            to: GamePhase::RoundEnd,
        });
        ctx.emit(MatchEventData::RoundEnded { winner, round });
    }

    fn run_intermission(&self, ctx: &mut SystemContext) {
        ctx.state.intermission_ticks = ctx.state.intermission_ticks.saturating_sub(1);
        if ctx.state.intermission_ticks > 0 {
            return;
        }

        let rounds_to_win = ctx.config.rounds_to_win;
        let champion = FighterSlot::BOTH
            .into_iter()
            .find(|slot| ctx.state.rounds_won[slot.index()] >= rounds_to_win);

        if let Some(winner) = champion {
            ctx.state.transition(GamePhase::MatchEnd);
            ctx.emit(MatchEventData::PhaseChanged {
                from: GamePhase::RoundEnd,
                to: GamePhase::MatchEnd,
            });
            ctx.emit(MatchEventData::MatchEnded { winner });
        } else {
            let config = ctx.config;
            ctx.state.round += 1;
            ctx.state.round_clock_ticks = config.round_clock_ticks;
            ctx.state.player.reset_for_round(config);
            ctx.state.opponent.reset_for_round(config);
            ctx.state.transition(GamePhase::Fighting);
            ctx.emit(MatchEventData::PhaseChanged {
                from: GamePhase::RoundEnd,
                to: GamePhase::Fighting,
            });
        }
    }
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::fixed::to_fixed;
    use crate::game::command::{CommandKind, CommandQueue};
    use crate::game::config::MatchConfig;
    use crate::game::engine::GameEngine;
    use crate::game::state::MatchState;

    fn started_engine() -> GameEngine {
        let mut engine =
            GameEngine::with_default_pipeline([9u8; 16], 1234, MatchConfig::default());
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);
        engine.step();
        engine.drain_events();
        engine
    }

    #[test]
    fn test_start_transitions_menu_to_fighting() {
        let mut engine =
            GameEngine::with_default_pipeline([9u8; 16], 1234, MatchConfig::default());
        assert_eq!(engine.state().phase, GamePhase::Menu);

        engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);
        engine.step();

        assert_eq!(engine.state().phase, GamePhase::Fighting);
        assert_eq!(engine.state().round, 1);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            MatchEventData::PhaseChanged {
                from: GamePhase::Menu,
                to: GamePhase::Fighting,
            }
        )));
    }

    #[test]
    fn test_commands_rejected_in_menu() {
        let mut engine =
            GameEngine::with_default_pipeline([9u8; 16], 1234, MatchConfig::default());
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Jump, 0);
        engine.step();

        assert!(engine.state().player.is_grounded());
        assert!(engine.drain_events().is_empty());
    }

    #[test]
    fn test_move_command_walks_fighter() {
        let mut engine = started_engine();
        let start_x = engine.state().player.position.x;

        for _ in 0..30 {
            engine.enqueue_command(
                FighterSlot::Player,
                CommandPayload::Move {
                    dx: FIXED_ONE,
                    dz: 0,
                },
                0,
            );
            engine.step();
        }

        assert!(engine.state().player.position.x > start_x);
    }

    #[test]
    fn test_jump_and_landing_cycle() {
        let mut engine = started_engine();
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Jump, 0);
        engine.step();

        assert!(engine.state().player.is_jumping);
        assert!(engine.state().player.velocity.y > 0);

        // Gravity brings the fighter back down within a couple of seconds
        for _ in 0..120 {
            engine.step();
            if engine.state().player.is_grounded() {
                break;
            }
        }
        let player = &engine.state().player;
        assert!(player.is_grounded());
        assert_eq!(player.position.y, 0);
        assert_eq!(player.air_jumps_left, engine.config().max_air_jumps);
    }

    #[test]
    fn test_air_jumps_are_limited() {
        let mut engine = started_engine();
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Jump, 0);
        engine.step();
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Jump, 0);
        engine.step();
        assert_eq!(engine.state().player.air_jumps_left, 0);

        // Third jump rejected mid-air
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Jump, 0);
        engine.step();
        let events = engine.drain_events();
        let jumps = events
            .iter()
            .filter(|e| {
                matches!(
                    e.data,
                    MatchEventData::CommandProcessed {
                        kind: CommandKind::Jump,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(jumps, 2);
    }

    #[test]
    fn test_attack_spends_stamina_and_sets_cooldown() {
        let mut engine = started_engine();
        engine.enqueue_command(
            FighterSlot::Player,
            CommandPayload::Attack {
                move_type: MoveType::Heavy,
            },
            0,
        );
        engine.step();

        let player = &engine.state().player;
        assert!(player.is_attacking);
        assert!(player.stamina_meter < engine.config().meter_max);
        assert!(player.attack_cooldown > 0);
        assert_eq!(player.last_move_type, Some(MoveType::Heavy));
    }

    #[test]
    fn test_attack_rejected_while_on_cooldown() {
        let mut engine = started_engine();
        for _ in 0..2 {
            engine.enqueue_command(
                FighterSlot::Player,
                CommandPayload::Attack {
                    move_type: MoveType::Light,
                },
                0,
            );
            engine.step();
        }

        let events = engine.drain_events();
        let attacks = events
            .iter()
            .filter(|e| {
                matches!(
                    e.data,
                    MatchEventData::CommandProcessed {
                        kind: CommandKind::Attack,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(attacks, 1);
    }

    #[test]
    fn test_attack_via_special_variant_rejected() {
        let mut engine = started_engine();
        engine.enqueue_command(
            FighterSlot::Player,
            CommandPayload::Attack {
                move_type: MoveType::Special,
            },
            0,
        );
        engine.step();
        assert!(!engine.state().player.is_attacking);
    }

    #[test]
    fn test_special_requires_meter() {
        let mut engine = started_engine();
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Special, 0);
        engine.step();
        assert!(!engine.state().player.is_attacking);
    }

    #[test]
    fn test_special_spends_meter_and_reports_depletion() {
        let mut engine = started_engine();
        // Hand the player exactly enough meter
        let cost = engine.config().special_cost;
        let mut state = engine.state().clone();
        state.player.special_meter = cost;
        engine.replace_state(state);

        engine.enqueue_command(FighterSlot::Player, CommandPayload::Special, 0);
        engine.step();

        assert!(engine.state().player.is_attacking);
        assert_eq!(engine.state().player.special_meter, 0);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            MatchEventData::MeterDepleted {
                slot: FighterSlot::Player,
                meter: MeterKind::Special,
            }
        )));
    }

    #[test]
    fn test_dodge_grants_iframes_and_cooldown() {
        let mut engine = started_engine();
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Dodge, 0);
        engine.step();

        let player = &engine.state().player;
        assert!(player.is_dodging);
        assert!(player.dodge_iframes > 0);
        assert!(player.dodge_cooldown > 0);
        assert!(player.stamina_meter < engine.config().meter_max);

        // Dodge state ends when the i-frames run out
        for _ in 0..engine.config().dodge_iframe_ticks {
            engine.step();
        }
        assert!(!engine.state().player.is_dodging);
        assert_eq!(engine.state().player.dodge_iframes, 0);
    }

    #[test]
    fn test_block_engage_and_release() {
        let mut engine = started_engine();
        engine.enqueue_command(
            FighterSlot::Player,
            CommandPayload::Block { engaged: true },
            0,
        );
        engine.step();
        assert!(engine.state().player.is_blocking);

        engine.enqueue_command(
            FighterSlot::Player,
            CommandPayload::Block { engaged: false },
            0,
        );
        engine.step();
        assert!(!engine.state().player.is_blocking);
    }

    #[test]
    fn test_block_released_through_input_map_disengages() {
        use crate::net::protocol::InputMap;

        let mut engine = started_engine();
        let held = InputMap {
            block: true,
            ..InputMap::NEUTRAL
        };
        for payload in held.to_commands() {
            engine.enqueue_command(FighterSlot::Player, payload, 0);
        }
        engine.step();
        assert!(engine.state().player.is_blocking);

        // Neutral frames carry the guard release, so letting go of the
        // control is enough to drop the guard
        for payload in InputMap::NEUTRAL.to_commands() {
            engine.enqueue_command(FighterSlot::Player, payload, 0);
        }
        engine.step();
        assert!(!engine.state().player.is_blocking);

        // Further neutral frames are no-ops, not repeated events
        for payload in InputMap::NEUTRAL.to_commands() {
            engine.enqueue_command(FighterSlot::Player, payload, 0);
        }
        engine.step();
        assert!(!engine.state().player.is_blocking);
        let events = engine.drain_events();
        let releases = events
            .iter()
            .filter(|e| {
                matches!(
                    e.data,
                    MatchEventData::CommandProcessed {
                        kind: CommandKind::Block,
                        ..
                    }
                )
            })
            .count();
        assert_eq!(releases, 2); // engage + one release
    }

    #[test]
    fn test_special_rejected_while_blocking() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.player.special_meter = engine.config().meter_max;
        engine.replace_state(state);

        engine.enqueue_command(
            FighterSlot::Player,
            CommandPayload::Block { engaged: true },
            0,
        );
        engine.step();
        assert!(engine.state().player.is_blocking);

        engine.enqueue_command(FighterSlot::Player, CommandPayload::Special, 0);
        engine.step();

        let player = &engine.state().player;
        assert!(player.is_blocking);
        assert!(!player.is_attacking);
        assert_eq!(player.special_meter, engine.config().meter_max);
    }

    #[test]
    fn test_taunt_builds_special_and_commits() {
        let mut engine = started_engine();
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Taunt, 0);
        engine.step();

        let player = &engine.state().player;
        assert!(player.is_taunting);
        assert!(player.is_committed());
        assert_eq!(player.special_meter, engine.config().taunt_special_gain);
        assert!(player.move_cooldown > 0);
    }

    #[test]
    fn test_facing_tracks_opponent() {
        let mut engine = started_engine();
        // Walk the player past the opponent
        for _ in 0..240 {
            engine.enqueue_command(
                FighterSlot::Player,
                CommandPayload::Move {
                    dx: FIXED_ONE,
                    dz: 0,
                },
                0,
            );
            engine.step();
            if engine.state().player.position.x > engine.state().opponent.position.x {
                break;
            }
        }
        assert!(engine.state().player.position.x > engine.state().opponent.position.x);
        engine.step();
        assert_eq!(engine.state().player.facing, Facing::Left);
        assert_eq!(engine.state().opponent.facing, Facing::Right);
    }

    #[test]
    fn test_stage_bounds_clamp_position() {
        let mut engine = started_engine();
        for _ in 0..1200 {
            engine.enqueue_command(
                FighterSlot::Player,
                CommandPayload::Move {
                    dx: -FIXED_ONE,
                    dz: -FIXED_ONE,
                },
                0,
            );
            engine.step();
        }
        let pos = engine.state().player.position;
        assert_eq!(pos.x, -STAGE_HALF_WIDTH);
        assert_eq!(pos.z, -STAGE_HALF_DEPTH);
    }

    #[test]
    fn test_combo_drops_after_window() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.player.combo_count = 3;
        state.player.combo_timer = 2;
        engine.replace_state(state);

        engine.step();
        engine.step();

        assert_eq!(engine.state().player.combo_count, 0);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            MatchEventData::ComboDropped {
                slot: FighterSlot::Player,
                combo_count: 3,
            }
        )));
    }

    #[test]
    fn test_meters_regenerate_within_bounds() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.player.stamina_meter = 0;
        state.player.guard_meter = 0;
        engine.replace_state(state);

        for _ in 0..600 {
            engine.step();
        }

        let player = &engine.state().player;
        assert!(player.stamina_meter > 0);
        assert!(player.guard_meter > 0);
        assert!(player.stamina_meter <= engine.config().meter_max);
        assert!(player.guard_meter <= engine.config().meter_max);
    }

    #[test]
    fn test_ko_ends_round_and_scores_winner() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.opponent.health = 0;
        engine.replace_state(state);
        engine.step();

        assert_eq!(engine.state().phase, GamePhase::RoundEnd);
        assert_eq!(engine.state().rounds_won[FighterSlot::Player.index()], 1);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            MatchEventData::RoundEnded {
                winner: Some(FighterSlot::Player),
                round: 1,
            }
        )));
    }

    #[test]
    fn test_timeout_draw_awards_no_round() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.round_clock_ticks = 1;
        engine.replace_state(state);
        engine.step();

        assert_eq!(engine.state().phase, GamePhase::RoundEnd);
        assert_eq!(engine.state().rounds_won, [0, 0]);
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            MatchEventData::RoundEnded {
                winner: None,
                round: 1,
            }
        )));
    }

    #[test]
    fn test_intermission_resets_next_round() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.opponent.health = 0;
        state.player.health = to_fixed(40.0);
        engine.replace_state(state);
        engine.step();
        assert_eq!(engine.state().phase, GamePhase::RoundEnd);

        for _ in 0..engine.config().intermission_ticks {
            engine.step();
        }

        let state = engine.state();
        assert_eq!(state.phase, GamePhase::Fighting);
        assert_eq!(state.round, 2);
        assert_eq!(state.player.health, engine.config().max_health);
        assert_eq!(state.opponent.health, engine.config().max_health);
        assert_eq!(state.round_clock_ticks, engine.config().round_clock_ticks);
    }

    #[test]
    fn test_match_ends_after_required_rounds() {
        let mut engine = started_engine();
        let mut state = engine.state().clone();
        state.rounds_won[FighterSlot::Player.index()] =
            engine.config().rounds_to_win - 1;
        state.opponent.health = 0;
        engine.replace_state(state);
        engine.step();

        for _ in 0..engine.config().intermission_ticks {
            engine.step();
        }

        assert_eq!(engine.state().phase, GamePhase::MatchEnd);
        assert!(engine.state().is_ended());
        let events = engine.drain_events();
        assert!(events.iter().any(|e| matches!(
            e.data,
            MatchEventData::MatchEnded {
                winner: FighterSlot::Player,
            }
        )));

        // Terminal phase: further steps change nothing but the clock
        let hash_before = engine.state().compute_hash();
        engine.step();
        assert_eq!(engine.state().phase, GamePhase::MatchEnd);
        assert_ne!(engine.state().compute_hash(), hash_before);
    }

    #[test]
    fn test_full_match_replay_is_bit_identical() {
        let run = |seed: u64| -> Vec<crate::core::hash::StateHash> {
            let mut engine =
                GameEngine::with_default_pipeline([5u8; 16], seed, MatchConfig::default());
            engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);
            engine.step();
            let mut hashes = Vec::new();
            for frame in 1..600u32 {
                if frame % 13 == 0 {
                    engine.enqueue_command(
                        FighterSlot::Player,
                        CommandPayload::Attack {
                            move_type: MoveType::Light,
                        },
                        0,
                    );
                }
                if frame % 9 == 0 {
                    engine.enqueue_command(
                        FighterSlot::Opponent,
                        CommandPayload::Move {
                            dx: -FIXED_ONE,
                            dz: 0,
                        },
                        0,
                    );
                }
                if frame % 50 == 0 {
                    engine.enqueue_command(FighterSlot::Opponent, CommandPayload::Dodge, 0);
                }
                engine.step();
                hashes.push(engine.state_hash());
            }
            hashes
        };

        assert_eq!(run(77), run(77));
        assert_ne!(run(77), run(78));
    }

    #[test]
    fn test_rejected_command_leaves_state_untouched() {
        let config = MatchConfig::default();
        let mut state = MatchState::new([2u8; 16], 3, &config);
        state.phase = GamePhase::Fighting;
        state.player.move_cooldown = 10;
        let before = state.clone();

        let mut events = Vec::new();
        let mut telemetry = Vec::new();
        let commands = {
            let mut queue = CommandQueue::new();
            queue.enqueue(FighterSlot::Player, CommandPayload::Dodge, 0);
            queue.drain_for_tick()
        };
        let mut ctx = SystemContext {
            commands: &commands,
            state: &mut state,
            config: &config,
            events: &mut events,
            telemetry: &mut telemetry,
        };
        CommandSystem.apply(&mut ctx);

        assert_eq!(state, before);
        assert!(events.is_empty());
    }
}
