use std::fmt;

use serde::{Deserialize, Serialize};

/// Everything that can go wrong inside a state-transition operation.
///
/// This taxonomy is closed and stable across deployments: a caller match on
/// `CoreError` and never see a variant not listed here. `Store(String)` is
/// the sole escape hatch for a `Store` port implementation to surface a
/// backend-specific message without this crate depending on any particular
/// backend's error type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum CoreError {
    /// No row exists for the given id.
    NotFound,
    /// The caller is not one of the principals allowed to perform this operation.
    PermissionDenied,
    /// The entity isn't in a state this operation can act on.
    InvalidState {
        /// The state(s) the operation required.
        want: String,
        /// The state the entity was actually in.
        have: String,
    },
    /// The event's approved roster is already at `max_players`.
    RosterFull,
    /// The registration/list-review window has closed.
    ListsLocked,
    /// A write-once field already has a value; the new write was rejected.
    AlreadySubmitted,
    /// A ritual gate did not receive both sides' commits in time.
    RitualTimeout,
    /// No player/team is eligible for the operation (e.g. pairing an empty pool).
    NoEligiblePlayers,
    /// The requested format isn't supported by this operation.
    FormatUnsupported,
    /// A team with this name already exists in the event.
    DuplicateTeamName,
    /// A team does not have enough active, non-substitute members to proceed.
    BelowMinimumRoster,
    /// Not every game in the round has reached a terminal state.
    RoundIncomplete,
    /// The requested score adjustment isn't a legal retroactive change.
    IllegalAdjustment,
    /// A compare-and-set write lost a race; the caller may retry once.
    StoreConflict,
    /// A `Store` port implementation's backend-specific failure.
    Store(String),
}

impl fmt::Display for CoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        use CoreError::*;
        match self {
            NotFound => write!(f, "not found"),
            PermissionDenied => write!(f, "permission denied"),
            InvalidState { want, have } => {
                write!(f, "invalid state: wanted {want}, found {have}")
            }
            RosterFull => write!(f, "roster is full"),
            ListsLocked => write!(f, "lists are locked"),
            AlreadySubmitted => write!(f, "already submitted"),
            RitualTimeout => write!(f, "ritual gate timed out"),
            NoEligiblePlayers => write!(f, "no eligible players"),
            FormatUnsupported => write!(f, "format unsupported for this operation"),
            DuplicateTeamName => write!(f, "duplicate team name"),
            BelowMinimumRoster => write!(f, "team is below the minimum roster"),
            RoundIncomplete => write!(f, "round is not yet complete"),
            IllegalAdjustment => write!(f, "illegal score adjustment"),
            StoreConflict => write!(f, "store conflict"),
            Store(msg) => write!(f, "store error: {msg}"),
        }
    }
}

impl std::error::Error for CoreError {}

impl CoreError {
    /// A short reason string suitable for a notification payload (spec §7:
    /// "each error carries a short reason string"; no stack trace ever
    /// escapes the core).
    pub fn reason(&self) -> String {
        self.to_string()
    }

    pub fn invalid_state(want: impl Into<String>, have: impl Into<String>) -> Self {
        CoreError::InvalidState {
            want: want.into(),
            have: have.into(),
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
