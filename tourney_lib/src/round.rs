use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    identifiers::{EventId, RoundId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundState {
    Pending,
    InProgress,
    Complete,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Round {
    pub id: RoundId,
    pub event_id: EventId,
    pub round_number: u32,
    pub day_number: u32,
    pub state: RoundState,
    pub started_at: Option<DateTime<Utc>>,
    pub deadline_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub pairings_msg_ref: Option<String>,
}

impl Round {
    /// `start_round(event, duration)` (spec §4.6): allocates the next
    /// round number and opens it. Rejecting `round_number > round_count`
    /// and building the pairings themselves are the `RoundController`'s
    /// (Store-backed) job; this just represents the opened round row.
    pub fn open(
        id: RoundId,
        event_id: EventId,
        round_number: u32,
        day_number: u32,
        now: DateTime<Utc>,
        duration: Duration,
    ) -> Self {
        Round {
            id,
            event_id,
            round_number,
            day_number,
            state: RoundState::InProgress,
            started_at: Some(now),
            deadline_at: Some(now + duration),
            completed_at: None,
            pairings_msg_ref: None,
        }
    }

    pub fn pending(id: RoundId, event_id: EventId, round_number: u32, day_number: u32) -> Self {
        Round {
            id,
            event_id,
            round_number,
            day_number,
            state: RoundState::Pending,
            started_at: None,
            deadline_at: None,
            completed_at: None,
            pairings_msg_ref: None,
        }
    }

    /// `complete_round(event)` (spec §4.6): the caller has already checked
    /// every non-bye game is `Complete` (`RoundIncomplete` otherwise) and
    /// applied the bye VP; this only performs the state transition.
    pub fn complete(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.state != RoundState::InProgress {
            return Err(CoreError::invalid_state("InProgress", format!("{:?}", self.state)));
        }
        self.state = RoundState::Complete;
        self.completed_at = Some(now);
        Ok(())
    }

    /// `repair_round(event)` (spec §4.6): only permitted while the round
    /// is still `InProgress` with nothing complete yet — the caller checks
    /// that against the games table; this leaves the round itself open so
    /// it can be re-paired in place.
    pub fn repair(&mut self) -> CoreResult<()> {
        if self.state != RoundState::InProgress {
            return Err(CoreError::invalid_state("InProgress", format!("{:?}", self.state)));
        }
        Ok(())
    }
}
