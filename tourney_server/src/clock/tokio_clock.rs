//! `Clock` port implementation over the wall clock. Grounded on
//! squire_core's `main.rs` background-interval pattern, which drives its
//! scheduling off `tokio::time` directly; this just wraps `Utc::now()`
//! behind the port trait so `tourney_lib` never calls it directly.

use chrono::{DateTime, Utc};
use tourney_lib::clock::Clock;

#[derive(Debug, Clone, Copy, Default)]
pub struct TokioClock;

impl Clock for TokioClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}
