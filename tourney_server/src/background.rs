//! Background interval tasks: auto-confirm sweep, ritual-gate timeout
//! sweep, and audit-log flush. Grounded on squire_core's `main.rs`, which
//! spawns a `tokio::spawn(async move { loop { interval.tick().await; ... } })`
//! per concern rather than one monolithic scheduler.

use std::time::Duration as StdDuration;

use tourney_lib::{
    controllers::{GameLifecycle, Ports},
    controllers_team::RitualCoordinator,
    game::GameState,
    notifier::{Audience, Payload},
};

/// Every 24h-timeout confirm check is cheap to retry at this cadence; the
/// real gate is `Game::auto_confirm_due`, which `GameLifecycle::auto_confirm`
/// checks before doing anything.
const AUTO_CONFIRM_SWEEP_INTERVAL: StdDuration = StdDuration::from_secs(300);

pub fn spawn_auto_confirm_sweep(ports: Ports) {
    let lifecycle = GameLifecycle::new(ports.clone());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(AUTO_CONFIRM_SWEEP_INTERVAL);
        loop {
            interval.tick().await;
            let Ok(events) = ports.store.list_events().await else { continue };
            for event in events {
                let Ok(games) = ports.store.list_games_by_event(event.id).await else { continue };
                for game in games.into_iter().filter(|g| g.state == GameState::Submitted) {
                    if let Err(e) = lifecycle.auto_confirm(game.id).await {
                        tracing::warn!(game_id = ?game.id, error = ?e, "auto-confirm sweep failed");
                    }
                }
            }
        }
    });
}

pub fn spawn_ritual_timeout_sweep(ports: Ports) {
    let coordinator = RitualCoordinator::new(ports.clone());
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(tourney_lib::clock::RITUAL_POLL_INTERVAL);
        loop {
            interval.tick().await;
            let Ok(events) = ports.store.list_events().await else { continue };
            for event in events {
                let Ok(states) = ports.store.list_pairing_in_progress(event.id).await else { continue };
                for state in states {
                    if coordinator.timed_out(&state).await {
                        ports
                            .notifier
                            .notify(
                                Audience::Role("crew".into()),
                                Payload::JudgeAlert {
                                    event_id: event.id,
                                    judge_call_id: None,
                                    message: format!(
                                        "ritual gate on team round {} has been open past its 10-minute cap",
                                        state.team_round_id
                                    ),
                                },
                            )
                            .await;
                    }
                }
            }
        }
    });
}

pub fn spawn_audit_flush(ports: Ports, batch_minutes: u64) {
    tokio::spawn(async move {
        let mut interval = tokio::time::interval(StdDuration::from_secs(batch_minutes.max(1) * 60));
        loop {
            interval.tick().await;
            for line in ports.audit.drain() {
                ports
                    .notifier
                    .notify(Audience::Audit, Payload::AuditLogLine { event_id: line.event_id, line: line.message })
                    .await;
            }
        }
    });
}

pub fn spawn_all(ports: Ports, log_batch_minutes: u64) {
    spawn_auto_confirm_sweep(ports.clone());
    spawn_ritual_timeout_sweep(ports.clone());
    spawn_audit_flush(ports, log_batch_minutes);
}
