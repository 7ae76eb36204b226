use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    catalog,
    error::{CoreError, CoreResult},
    identifiers::EventId,
    schedule::{build_schedule, ScheduleSlot},
};

/// The tournament formats this core administers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Format {
    Singles,
    #[serde(rename = "2v2")]
    TwoVTwo,
    Teams3,
    Teams5,
    Teams8,
}

impl Format {
    /// `FMT.team_size` (spec §3 GLOSSARY / `original_source/state.py`).
    pub fn team_size(self) -> usize {
        match self {
            Format::Singles => 1,
            Format::TwoVTwo => 2,
            Format::Teams3 => 3,
            Format::Teams5 => 5,
            Format::Teams8 => 8,
        }
    }

    /// `FMT.phase_count` — the number of ritual phases this format runs
    /// (spec §4.3/§4.4). 2v2 and singles run no ritual.
    pub fn phase_count(self) -> usize {
        match self {
            Format::Singles | Format::TwoVTwo => 0,
            Format::Teams3 => 1,
            Format::Teams5 => 2,
            Format::Teams8 => 3,
        }
    }

    /// `FMT.individual_points` — the per-player points-limit default.
    pub fn individual_points(self) -> u32 {
        match self {
            Format::TwoVTwo => 1000,
            _ => 2000,
        }
    }

    /// Whether this format runs the Ritual Engine at all (spec §4.3).
    pub fn runs_ritual(self) -> bool {
        self.phase_count() > 0
    }

    pub fn is_team_format(self) -> bool {
        !matches!(self, Format::Singles)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MaxPlayers {
    Eight = 8,
    Sixteen = 16,
    ThirtyTwo = 32,
}

impl MaxPlayers {
    pub fn as_u32(self) -> u32 {
        self as u32
    }

    /// `round_count = 5 if max_players=32 else 3` (spec §3, an explicit,
    /// unambiguous invariant — takes precedence over
    /// `original_source/threads.py`'s finer-grained `calculate_rounds`
    /// table; see DESIGN.md).
    pub fn round_count(self) -> u32 {
        match self {
            MaxPlayers::ThirtyTwo => 5,
            MaxPlayers::Eight | MaxPlayers::Sixteen => 3,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScoringMode {
    Ntl,
    Wtc,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventStatus {
    Announced,
    Interest,
    Registration,
    InProgress,
    Complete,
}

impl EventStatus {
    fn can_advance_to(self, next: EventStatus) -> bool {
        use EventStatus::*;
        matches!(
            (self, next),
            (Announced, Interest)
                | (Interest, Registration)
                | (Registration, InProgress)
                | (InProgress, Complete)
        )
    }
}

/// A named layout, identified by the number it's referenced by elsewhere
/// (`TeamPairing::layout_number`).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Layout {
    pub number: u32,
    pub name: String,
}

/// A named mission, restricted to the layouts it's legal on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Mission {
    pub code: String,
    pub valid_layouts: Vec<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: EventId,
    pub name: String,
    pub format: Format,
    pub points_limit: u32,
    pub individual_points: u32,
    pub max_players: MaxPlayers,
    pub round_count: u32,
    pub rounds_per_day: u32,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub rules_cutoff: DateTime<Utc>,
    pub reg_deadline: DateTime<Utc>,
    pub state: EventStatus,
    pub created_by: String,
    pub schedule_slots: Vec<ScheduleSlot>,
    pub event_layouts: Vec<Layout>,
    pub event_missions: Vec<Mission>,
    pub scoring_mode: ScoringMode,
}

impl Event {
    /// `create_event(...)` (spec §4.7). Only `Format::Singles` is accepted
    /// at creation; other formats are deferred (spec §4.7: "Only singles is
    /// accepted at creation").
    pub fn create(
        id: EventId,
        name: String,
        max_players: MaxPlayers,
        start_date: DateTime<Utc>,
        created_by: String,
        scoring_mode: ScoringMode,
    ) -> CoreResult<Self> {
        let round_count = max_players.round_count();
        let rules_cutoff = start_date - Duration::days(7);
        let reg_deadline = start_date - Duration::days(2);
        let schedule_slots = build_schedule(round_count);
        let rounds_per_day = if round_count == 5 { 3 } else { round_count };
        let end_date = start_date
            + Duration::days(if round_count == 5 { 1 } else { 0 });

        Ok(Event {
            id,
            name,
            format: Format::Singles,
            points_limit: 2000,
            individual_points: Format::Singles.individual_points(),
            max_players,
            round_count,
            rounds_per_day,
            start_date,
            end_date,
            rules_cutoff,
            reg_deadline,
            state: EventStatus::Announced,
            created_by,
            schedule_slots,
            event_layouts: catalog::default_layouts(),
            event_missions: catalog::default_missions(),
            scoring_mode,
        })
    }

    pub fn open_interest(&mut self) -> CoreResult<()> {
        self.advance(EventStatus::Interest)
    }

    pub fn open_registration(&mut self) -> CoreResult<()> {
        self.advance(EventStatus::Registration)
    }

    /// `lock_lists(event)` (spec §4.7): transitions the event into
    /// `in_progress`-ready at `reg_deadline`. Archiving review channels and
    /// publishing approved lists is the caller's (Notifier-driven) job;
    /// this only performs the state transition itself.
    pub fn lock_lists(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if now < self.reg_deadline {
            return Err(CoreError::invalid_state(
                "at or past reg_deadline",
                "before reg_deadline",
            ));
        }
        self.advance(EventStatus::InProgress)
    }

    /// `finish_event(event)` (spec §4.7). The caller must have already
    /// verified every round is `complete`; this only performs the
    /// transition (`RoundController`/`EventController` owns that check).
    pub fn finish(&mut self) -> CoreResult<()> {
        self.advance(EventStatus::Complete)
    }

    fn advance(&mut self, next: EventStatus) -> CoreResult<()> {
        if !self.state.can_advance_to(next) {
            return Err(CoreError::invalid_state(
                format!("{next:?}"),
                format!("{:?}", self.state),
            ));
        }
        self.state = next;
        Ok(())
    }

    /// Whether the event is still accepting list submissions (spec §4.1:
    /// `submit_list` fails with `ListsLocked` past `reg_deadline` or once
    /// `state=in_progress` or later).
    pub fn lists_are_open(&self, now: DateTime<Utc>) -> bool {
        now < self.reg_deadline && matches!(self.state, EventStatus::Registration)
    }
}
