//! Demo binary: runs a self-playing match, verifies replay determinism,
//! and exercises the online synchronizer with a forced resync.

use anyhow::{anyhow, Result};
use tracing::info;
use uuid::Uuid;

use duel_engine::core::rng::derive_match_seed;
use duel_engine::game::{
    CommandPayload, CpuDriver, FighterSlot, GameEngine, MatchConfig, MatchEventData,
};
use duel_engine::net::{InputMap, MatchDescriptor, MatchMode, OnlineSynchronizer, PeerRole};
use duel_engine::{StateHash, VERSION};

/// Hard cap so a defensive stalemate cannot run forever.
const MAX_DEMO_TICKS: u32 = 60 * 60 * 5;

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "duel_engine=info".into()),
        )
        .init();

    info!(version = VERSION, "duel engine demo");

    let host_profile = Uuid::new_v4();
    let guest_profile = Uuid::new_v4();

    let mut descriptor = MatchDescriptor::new(host_profile, MatchMode::Single, 0);
    descriptor.seed = derive_match_seed(
        descriptor.id.as_bytes(),
        &[*host_profile.as_bytes(), *guest_profile.as_bytes()],
    );
    descriptor.validate()?;

    let final_hash = run_cpu_match(&descriptor)?;

    info!("replaying with the same seed to verify determinism");
    let replay_hash = run_cpu_match(&descriptor)?;
    if final_hash != replay_hash {
        return Err(anyhow!("replay diverged from the original match"));
    }
    info!(hash = %hex::encode(final_hash), "replay hash matches");

    run_online_demo(&descriptor)?;
    Ok(())
}

/// Run one CPU-vs-CPU match to completion and return the final state hash.
fn run_cpu_match(descriptor: &MatchDescriptor) -> Result<StateHash> {
    let mut engine = GameEngine::with_default_pipeline(
        *descriptor.id.as_bytes(),
        descriptor.seed,
        MatchConfig::default(),
    );
    // Distinct per-slot streams derived from the match seed
    let mut drivers = [
        CpuDriver::new(descriptor.seed ^ 1, FighterSlot::Player),
        CpuDriver::new(descriptor.seed ^ 2, FighterSlot::Opponent),
    ];

    engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);

    while !engine.state().is_ended() && engine.frame() < MAX_DEMO_TICKS {
        for driver in &mut drivers {
            if let Some(payload) = driver.decide(engine.state()) {
                engine.enqueue_command(driver.slot(), payload, 0);
            }
        }
        engine.step();

        for event in engine.drain_events() {
            match event.data {
                MatchEventData::HitLanded { attacker, hit, .. } => {
                    info!(
                        frame = event.frame,
                        ?attacker,
                        move_type = ?hit.move_type,
                        counter = hit.counter_hit,
                        blocked = hit.blocked,
                        "hit landed"
                    );
                }
                MatchEventData::RoundEnded { winner, round } => {
                    info!(round, ?winner, "round over");
                }
                MatchEventData::MatchEnded { winner } => {
                    info!(?winner, frame = event.frame, "match over");
                }
                _ => {}
            }
        }
    }

    let telemetry = engine.drain_telemetry();
    info!(hits = telemetry.len(), frame = engine.frame(), "match finished");
    Ok(engine.state_hash())
}

/// Two in-memory peers: lockstep play, an injected divergence, and the
/// forced resync that repairs it.
fn run_online_demo(descriptor: &MatchDescriptor) -> Result<()> {
    info!("starting in-memory online demo");

    let match_id = *descriptor.id.as_bytes();
    let make_engine = || {
        let mut engine =
            GameEngine::with_default_pipeline(match_id, descriptor.seed, MatchConfig::default());
        engine.enqueue_command(FighterSlot::Player, CommandPayload::Start, 0);
        engine.step();
        engine
    };
    let mut host_engine = make_engine();
    let mut guest_engine = make_engine();

    let mut host = OnlineSynchronizer::new(PeerRole::Host, descriptor.id);
    let mut guest = OnlineSynchronizer::new(PeerRole::Guest, descriptor.id);

    guest.join(Uuid::new_v4());
    for message in guest.drain_outbox() {
        host.queue_message(message)?;
    }

    let host_input = InputMap {
        right: true,
        ..InputMap::NEUTRAL
    };
    let guest_input = InputMap {
        left: true,
        block: true,
        ..InputMap::NEUTRAL
    };

    for _ in 0..300 {
        host.advance(&mut host_engine, host_input);
        for message in host.drain_outbox() {
            guest.queue_message(message)?;
        }
        guest.advance(&mut guest_engine, guest_input);
        for message in guest.drain_outbox() {
            host.queue_message(message)?;
        }
    }
    info!(
        host_frame = host_engine.frame(),
        guest_frame = guest_engine.frame(),
        "lockstep phase complete"
    );

    // Inject a divergence on the guest, then repair it from the host
    let mut corrupted = guest_engine.state().clone();
    corrupted.player.position.x += 1;
    guest_engine.replace_state(corrupted);

    host.force_resync(&host_engine, host_input);
    for message in host.drain_outbox() {
        guest.queue_message(message)?;
    }
    guest.advance(&mut guest_engine, guest_input);

    for notice in guest.drain_notices() {
        info!(?notice, "sync notice");
    }
    info!(
        resynced_frame = guest.last_snapshot_frame(),
        "online demo complete"
    );
    Ok(())
}
