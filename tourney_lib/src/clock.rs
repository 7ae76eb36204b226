use chrono::{DateTime, Duration, Utc};

/// The only source of "now" in the core (spec §2/§6). A monotonic + wall
/// clock port: `now()` is used for ordering within one process, and
/// `at`/`after` schedule the ritual-gate and auto-confirm timeouts.
///
/// Implementations live in `tourney_server` (a `tokio::time`-backed one for
/// production, a manually-advanced fake for tests).
pub trait Clock: Send + Sync {
    /// The current wall-clock time.
    fn now(&self) -> DateTime<Utc>;
}

/// A `Clock` that always returns a fixed instant, for deterministic tests.
#[derive(Debug, Clone, Copy)]
pub struct FixedClock(pub DateTime<Utc>);

impl Clock for FixedClock {
    fn now(&self) -> DateTime<Utc> {
        self.0
    }
}

/// The ritual gate timeout (spec §4.4/§5): 10 minutes with no both-sides
/// commit raises `RitualTimeout`.
pub const RITUAL_GATE_TIMEOUT: Duration = Duration::minutes(10);

/// The game auto-confirm timeout (spec §4.5/§5): a `submitted` game with no
/// opponent action is auto-confirmed 24 hours after submission.
pub const AUTO_CONFIRM_TIMEOUT: Duration = Duration::hours(24);

/// The ritual's coarse poll granularity (spec §5): "~3s" between state reads
/// while a gate awaits both sides. Purely advisory for poll-based
/// coordinators; edge-triggered notification implementations may ignore it.
pub const RITUAL_POLL_INTERVAL: std::time::Duration = std::time::Duration::from_secs(3);
