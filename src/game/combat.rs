//! Combat Resolver
//!
//! Resolves attack activations against the defender: sphere overlap,
//! block and chip, counter-hits, knockback and launches, trips, combo
//! bookkeeping and meter flow. Each activation is consumed exactly once,
//! so an attack can never hit twice.
//!
//! Resolution order is always Player first, then Opponent. On the rare
//! tick where both fighters' attacks become active, both resolve against
//! the pre-tick positions the movement system produced, so simultaneous
//! trades are possible and deterministic.

use tracing::trace;

use crate::core::fixed::{fixed_mul, Fixed, FIXED_ONE};
use crate::core::vec3::FixedVec3;
use crate::game::engine::{System, SystemContext};
use crate::game::events::{HitReport, MatchEventData};
use crate::game::state::{FighterSlot, GamePhase, MeterKind, MoveType};
use crate::game::telemetry::MatchTelemetryEntry;

/// Resolves pending attack activations each tick.
pub struct CombatSystem;

/// What one resolved activation produced, gathered before any events are
/// emitted so mutations always precede their events.
struct Resolution {
    attacker: FighterSlot,
    hit: HitReport,
    combo_count: u32,
    dropped_defender_combo: Option<u32>,
    guard_broken: bool,
}

impl System for CombatSystem {
    fn name(&self) -> &'static str {
        "combat"
    }

    fn apply(&mut self, ctx: &mut SystemContext) {
        if ctx.state.phase != GamePhase::Fighting {
            return;
        }

        for attacker_slot in FighterSlot::BOTH {
            let pending = match ctx.state.fighter(attacker_slot).active_attack {
                Some(attack) if !attack.resolved => attack.move_type,
                _ => continue,
            };

            // Consume the activation whether or not it connects
            if let Some(attack) = ctx.state.fighter_mut(attacker_slot).active_attack.as_mut() {
                attack.resolved = true;
            }

            if let Some(resolution) = resolve_attack(ctx, attacker_slot, pending) {
                let frame = ctx.state.frame;
                let defender = resolution.attacker.other();

                ctx.record(MatchTelemetryEntry::record(
                    resolution.attacker,
                    defender,
                    resolution.combo_count,
                    frame,
                    resolution.hit,
                ));

                if let Some(dropped) = resolution.dropped_defender_combo {
                    ctx.emit(MatchEventData::ComboDropped {
                        slot: defender,
                        combo_count: dropped,
                    });
                }
                if resolution.guard_broken {
                    ctx.emit(MatchEventData::MeterDepleted {
                        slot: defender,
                        meter: MeterKind::Guard,
                    });
                }
                if !resolution.hit.blocked {
                    ctx.emit(MatchEventData::ComboExtended {
                        slot: resolution.attacker,
                        combo_count: resolution.combo_count,
                    });
                }
                ctx.emit(MatchEventData::HitLanded {
                    attacker: resolution.attacker,
                    defender,
                    hit: resolution.hit,
                });
            }
        }
    }
}

/// Resolve one activation. Returns `None` on a whiff or a dodge.
fn resolve_attack(
    ctx: &mut SystemContext,
    attacker_slot: FighterSlot,
    move_type: MoveType,
) -> Option<Resolution> {
    let config = ctx.config;
    let (attacker, defender) = ctx.state.pair_mut(attacker_slot);

    // Dodge i-frames beat everything, including grabs
    if defender.dodge_iframes > 0 {
        trace!(slot = ?attacker_slot, ?move_type, "attack dodged");
        return None;
    }

    // Hitbox sphere sits in front of the attacker along its facing
    let hitbox_center = attacker.position
        + FixedVec3::new(fixed_mul(attacker.facing.sign(), move_type.reach()), 0, 0);
    let radius_sum = move_type.hitbox_radius() + defender.hurtbox_radius();
    if hitbox_center.distance_squared(defender.position) > fixed_mul(radius_sum, radius_sum) {
        trace!(slot = ?attacker_slot, ?move_type, "attack whiffed");
        return None;
    }

    let blocked = defender.is_blocking && !move_type.ignores_block();
    let counter_hit = !blocked && defender.is_committed();

    let mut damage = move_type.damage();
    let mut knockback_mag = move_type.knockback();
    if counter_hit {
        damage = fixed_mul(damage, config.counter_damage_mult);
        knockback_mag = fixed_mul(knockback_mag, config.counter_knockback_mult);
    }

    let mut guard_damage: Fixed = 0;
    let mut guard_broken = false;
    if blocked {
        // Chip through the guard, and charge the guard meter
        damage = fixed_mul(damage, config.guard_chip_ratio);
        guard_damage = move_type.guard_damage();
        guard_broken = defender.adjust_meter(MeterKind::Guard, -guard_damage, config.meter_max);
        // Blocked hits push back without launching
        knockback_mag /= 4;
    }

    let launch_share = if blocked { 0 } else { move_type.launch() };
    let launched = launch_share >= config.launch_threshold;
    let trip = !blocked && move_type.causes_trip() && defender.is_grounded();

    let knockback = FixedVec3::new(
        fixed_mul(
            attacker.facing.sign(),
            fixed_mul(knockback_mag, FIXED_ONE - launch_share),
        ),
        fixed_mul(knockback_mag, launch_share),
        0,
    );

    let hitlag_ticks = move_type.hitlag_ticks();

    // Apply everything to the defender before any event is emitted
    defender.apply_damage(damage);
    defender.velocity = knockback;
    defender.move_cooldown = defender.move_cooldown.max(hitlag_ticks);
    attacker.move_cooldown = attacker.move_cooldown.max(hitlag_ticks / 2);

    if guard_broken {
        // Guard break: the guard drops and the stun doubles
        defender.is_blocking = false;
        defender.move_cooldown = defender.move_cooldown.max(hitlag_ticks * 2);
    }
    if launched {
        defender.is_jumping = true;
    }
    if trip {
        defender.move_cooldown = defender.move_cooldown.max(config.trip_lockout_ticks);
    }

    let mut dropped_defender_combo = None;
    if !blocked {
        // An unblocked hit interrupts whatever the defender was doing
        defender.is_attacking = false;
        defender.is_grabbing = false;
        defender.is_taunting = false;
        defender.active_attack = None;

        if defender.combo_count > 0 {
            dropped_defender_combo = Some(defender.combo_count);
            defender.combo_count = 0;
            defender.combo_timer = 0;
        }

        attacker.combo_count += 1;
        attacker.combo_timer = config.combo_window_ticks;

        defender.adjust_meter(MeterKind::Special, config.special_gain_on_taken, config.meter_max);
    }
    attacker.adjust_meter(MeterKind::Special, config.special_gain_on_hit, config.meter_max);

    Some(Resolution {
        attacker: attacker_slot,
        hit: HitReport {
            move_type,
            damage,
            guard_damage,
            knockback,
            hitlag_ticks,
            counter_hit,
            trip,
            launched,
            blocked,
        },
        combo_count: attacker.combo_count,
        dropped_defender_combo,
        guard_broken,
    })
}

// =============================================================================
// TESTS
// =============================================================================
