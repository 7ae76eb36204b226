use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    identifiers::{EventId, GameId, PlayerId, RoundId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GameState {
    Pending,
    Submitted,
    Complete,
    Disputed,
    Bye,
}

/// The outcome of a completed, non-bye game, as seen by the Standings
/// Aggregator (spec §4.8). A draw is its own variant rather than a `Win`
/// with equal VPs so `apply`/`reverse` never have to re-derive it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win {
        winner: WhichPlayer,
        winner_vp: u32,
        loser_vp: u32,
    },
    Draw {
        p1_vp: u32,
        p2_vp: u32,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WhichPlayer {
    P1,
    P2,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Game {
    pub id: GameId,
    pub round_id: RoundId,
    pub event_id: EventId,
    pub room_number: Option<u32>,
    pub p1: PlayerId,
    pub p2: Option<PlayerId>,
    pub is_bye: bool,
    pub p1_vp: Option<u32>,
    pub p2_vp: Option<u32>,
    pub winner_id: Option<PlayerId>,
    pub state: GameState,
    pub submitted_at: Option<DateTime<Utc>>,
    pub confirmed_at: Option<DateTime<Utc>>,
    pub adj_note: Option<String>,
}

const MAX_VP: u32 = 200;

impl Game {
    pub fn new_pairing(
        id: GameId,
        round_id: RoundId,
        event_id: EventId,
        p1: PlayerId,
        p2: PlayerId,
        room_number: Option<u32>,
    ) -> Self {
        Game {
            id,
            round_id,
            event_id,
            room_number,
            p1,
            p2: Some(p2),
            is_bye: false,
            p1_vp: None,
            p2_vp: None,
            winner_id: None,
            state: GameState::Pending,
            submitted_at: None,
            confirmed_at: None,
            adj_note: None,
        }
    }

    pub fn new_bye(id: GameId, round_id: RoundId, event_id: EventId, bye_player: PlayerId) -> Self {
        Game {
            id,
            round_id,
            event_id,
            room_number: None,
            p1: bye_player,
            p2: None,
            is_bye: true,
            p1_vp: None,
            p2_vp: None,
            winner_id: None,
            state: GameState::Bye,
            submitted_at: None,
            confirmed_at: None,
            adj_note: None,
        }
    }

    /// `submit(game, submitter, own_vp, opp_vp)` (spec §4.5). Only the two
    /// players in the game may submit; `own_vp`/`opp_vp` are given relative
    /// to `submitter`, oriented here to `p1`/`p2`.
    pub fn submit(
        &mut self,
        submitter: &PlayerId,
        own_vp: u32,
        opp_vp: u32,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.require(GameState::Pending)?;
        let (p1_vp, p2_vp) = if *submitter == self.p1 {
            (own_vp, opp_vp)
        } else if Some(submitter) == self.p2.as_ref() {
            (opp_vp, own_vp)
        } else {
            return Err(CoreError::PermissionDenied);
        };
        self.p1_vp = Some(p1_vp.min(MAX_VP));
        self.p2_vp = Some(p2_vp.min(MAX_VP));
        // winner_id is still recorded as p1 on a tie; standings treat the
        // tie as a draw regardless (spec §4.5).
        self.winner_id = Some(if p1_vp >= p2_vp {
            self.p1.clone()
        } else {
            self.p2.clone().expect("non-bye game has p2")
        });
        self.state = GameState::Submitted;
        self.submitted_at = Some(now);
        Ok(())
    }

    /// `confirm(game, confirmer)` (spec §4.5). Only the opponent of the
    /// submitter or a TO may confirm; the caller enforces that permission
    /// check (this entity doesn't know who submitted which side once both
    /// VPs are set), so it only guards the state transition itself.
    pub fn confirm(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.require(GameState::Submitted)?;
        self.state = GameState::Complete;
        self.confirmed_at = Some(now);
        Ok(())
    }

    pub fn dispute(&mut self) -> CoreResult<()> {
        self.require(GameState::Submitted)?;
        self.state = GameState::Disputed;
        Ok(())
    }

    /// `override(game, TO)` (spec §4.5): `Submitted|Disputed -> Complete`.
    pub fn to_override(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        match self.state {
            GameState::Submitted | GameState::Disputed => {
                self.state = GameState::Complete;
                self.confirmed_at = Some(now);
                Ok(())
            }
            other => Err(CoreError::invalid_state("Submitted or Disputed", format!("{other:?}"))),
        }
    }

    /// Whether `auto_confirm` should fire: `submitted_at + 24h` has passed
    /// and the state hasn't moved since (spec §4.5: "Idempotent: if state
    /// has since moved, no-op").
    pub fn auto_confirm_due(&self, now: DateTime<Utc>, timeout: chrono::Duration) -> bool {
        self.state == GameState::Submitted
            && self.submitted_at.map(|at| now >= at + timeout).unwrap_or(false)
    }

    /// `adjust(game, new_p1_vp, new_p2_vp, note)` (spec §4.5): only legal
    /// once the game is `Complete`. Returns the prior outcome so the caller
    /// can run `reverse` against standings before `apply`-ing the new one.
    pub fn adjust(
        &mut self,
        new_p1_vp: u32,
        new_p2_vp: u32,
        note: String,
    ) -> CoreResult<Outcome> {
        self.require(GameState::Complete)?;
        let prior = self
            .outcome()
            .ok_or_else(|| CoreError::invalid_state("complete with VPs set", "complete, VPs missing"))?;
        self.p1_vp = Some(new_p1_vp.min(MAX_VP));
        self.p2_vp = Some(new_p2_vp.min(MAX_VP));
        self.winner_id = Some(if new_p1_vp >= new_p2_vp {
            self.p1.clone()
        } else {
            self.p2.clone().expect("non-bye game has p2")
        });
        self.adj_note = Some(note);
        Ok(prior)
    }

    /// Derives the `Outcome` the Standings Aggregator should `apply`/
    /// `reverse` for this game, if it has a terminal result. `None` for
    /// bye games (bye VP is computed by the Round Controller at round
    /// close, spec §4.6) and for games with no VPs recorded yet.
    pub fn outcome(&self) -> Option<Outcome> {
        if self.is_bye {
            return None;
        }
        let (p1_vp, p2_vp) = (self.p1_vp?, self.p2_vp?);
        Some(if p1_vp == p2_vp {
            Outcome::Draw { p1_vp, p2_vp }
        } else if p1_vp > p2_vp {
            Outcome::Win {
                winner: WhichPlayer::P1,
                winner_vp: p1_vp,
                loser_vp: p2_vp,
            }
        } else {
            Outcome::Win {
                winner: WhichPlayer::P2,
                winner_vp: p2_vp,
                loser_vp: p1_vp,
            }
        })
    }

    fn require(&self, want: GameState) -> CoreResult<()> {
        if self.state != want {
            return Err(CoreError::invalid_state(
                format!("{want:?}"),
                format!("{:?}", self.state),
            ));
        }
        Ok(())
    }
}
