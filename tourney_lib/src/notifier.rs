use serde::{Deserialize, Serialize};

use crate::{
    game::Game,
    identifiers::{EventId, GameId, JudgeCallId, PlayerId, TeamRoundId},
    ritual::RitualStep,
    scoring::Standing,
};

/// Who a `Payload` is addressed to. The core never renders a message; it
/// only ever names a recipient and hands the `Notifier` port a typed
/// payload (spec §6: "the core never renders; it emits logical payloads").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Audience {
    /// A single principal (a player or a captain).
    Principal(PlayerId),
    /// Everyone holding a named role for the event (e.g. "crew", "captains").
    Role(String),
    /// The event's audit channel.
    Audit,
}

/// A reply to a previously-sent prompt, keyed by `(kind, reply_token)` per
/// spec §6. The `Notifier` port's caller (the chat surface) decodes the
/// reply and routes it back into the matching controller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplyToken {
    pub kind: String,
    pub token: String,
}

/// The logical payload kinds a `Notifier` implementation must be able to
/// carry, per spec §6.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Payload {
    /// Prompt to register interest in an event.
    InterestPrompt { event_id: EventId },
    /// A list-review card for a TO to approve/relegate/reject.
    ListReviewCard {
        event_id: EventId,
        player_id: PlayerId,
        review_token: String,
    },
    /// A round's pairing sheet.
    PairingCard { event_id: EventId, round_number: u32 },
    /// A ritual-gate prompt to a captain, naming the step and the choices
    /// available to them (players eligible as defender/attacker, the layout
    /// or mission options still on the table, etc).
    RitualPrompt {
        team_round_id: TeamRoundId,
        step: RitualStep,
        options: Vec<String>,
    },
    /// A result-confirmation card shown to the opponent of a submitted game.
    ResultConfirmCard { game: GameForNotify },
    /// An alert that requires TO attention (ritual timeout, judge call, ...).
    JudgeAlert {
        event_id: EventId,
        judge_call_id: Option<JudgeCallId>,
        message: String,
    },
    /// A refreshed standings snapshot.
    StandingsCard {
        event_id: EventId,
        standings: Vec<Standing>,
    },
    /// A single audit-log line, batched and flushed per `log_batch_minutes`.
    AuditLogLine { event_id: EventId, line: String },
    /// Event-close bulk submission to an external ranking body (spec §4.7:
    /// "a bulk external-ranking submission covering all complete, non-bye
    /// games"), alongside the final `StandingsCard`.
    ExternalRankingSubmission {
        event_id: EventId,
        games: Vec<GameForNotify>,
    },
}

/// A notification-friendly projection of `Game`, carrying only what a
/// result-confirm card needs to render.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GameForNotify {
    pub game_id: GameId,
    pub p1: PlayerId,
    pub p2: Option<PlayerId>,
    pub p1_vp: Option<u32>,
    pub p2_vp: Option<u32>,
}

impl From<&Game> for GameForNotify {
    fn from(g: &Game) -> Self {
        GameForNotify {
            game_id: g.id,
            p1: g.p1.clone(),
            p2: g.p2.clone(),
            p1_vp: g.p1_vp,
            p2_vp: g.p2_vp,
        }
    }
}

/// Delivers principal-, role-, or audit-addressed prompts and (eventually)
/// accepts asynchronous replies keyed by a `ReplyToken` (spec §2/§6).
///
/// This crate never implements `Notifier` itself — a reference
/// implementation lives in `tourney_server::notifier`.
#[async_trait::async_trait]
pub trait Notifier: Send + Sync {
    /// Delivers a payload to the given audience. Errors are logged by the
    /// caller, not propagated into a controller's `CoreResult` — a failed
    /// notification never blocks a state transition that already
    /// succeeded against the `Store`.
    async fn notify(&self, audience: Audience, payload: Payload);
}
