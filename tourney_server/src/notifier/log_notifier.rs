//! Reference `Notifier` implementation that logs every payload via
//! `tracing` instead of delivering it to a real chat surface. Stands in for
//! the Discord-bot notifier squire_core's `state/mod.rs` wires a
//! `squire_sdk` client into; this crate has no chat-surface dependency, so
//! the port is satisfied by structured logging until one is plugged in.

use tourney_lib::notifier::{Audience, Notifier, Payload};
use tracing::info;

#[derive(Debug, Clone, Copy, Default)]
pub struct LogNotifier;

#[async_trait::async_trait]
impl Notifier for LogNotifier {
    async fn notify(&self, audience: Audience, payload: Payload) {
        info!(?audience, ?payload, "notify");
    }
}
