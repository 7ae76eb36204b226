//! Process entry point: wires the in-memory reference `Store`/`Clock`/
//! `Notifier` behind their port traits, spawns the background sweeps, and
//! idles. Grounded on squire_core's `main.rs`, which builds its `AppState`
//! the same way (concrete adapters constructed once, handed to the rest of
//! the process as `Arc<dyn _>`s) before spawning its own background tasks.

mod background;
mod clock;
mod config;
mod notifier;
mod store;

use std::sync::Arc;

use tourney_lib::audit::AuditQueue;
use tourney_lib::controllers::Ports;

use crate::clock::TokioClock;
use crate::config::Config;
use crate::notifier::LogNotifier;
use crate::store::MemoryStore;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let config = Config::from_env()?;
    tracing::info!(guild_id = %config.guild_id, "starting tourney_server");

    let ports = Ports {
        store: Arc::new(MemoryStore::new()),
        clock: Arc::new(TokioClock),
        notifier: Arc::new(LogNotifier),
        audit: Arc::new(AuditQueue::new()),
    };

    background::spawn_all(ports.clone(), config.log_batch_minutes);

    tracing::info!("background sweeps running; entering idle loop");
    std::future::pending::<()>().await;
    Ok(())
}
