//! The Store port (spec §2/§6): transactional persistence for every entity
//! in spec §3, with compare-and-set on state columns as its sole
//! concurrency primitive. Grounded on squire_core's `ServerState`/
//! `AppState` (`state/mod.rs`) shape — a thin async trait over a document
//! store — generalized from a single-tournament-document actor to this
//! spec's relational entity set.
//!
//! This crate defines only the trait; concrete implementations (an
//! in-memory `dashmap`-backed reference, and optionally a `mongodb`-backed
//! one) live in `tourney_server`.

use chrono::{DateTime, Utc};

use crate::{
    error::CoreResult,
    event::Event,
    game::{Game, GameState},
    identifiers::{
        EventId, GameId, JudgeCallId, PairingStateId, RegistrationId, RoundId, TeamId,
        TeamPairingId, TeamRoundId,
    },
    judge_call::JudgeCall,
    registration::{Registration, RegistrationState},
    ritual::PairingState,
    round::Round,
    scoring::{Standing, TeamStanding},
    team::{Team, TeamMember, TeamPairing, TeamRound},
};

/// Transactional KV-plus-relations over the entity set in spec §3.
///
/// Every `cas_*` method takes the caller's expected prior state and only
/// commits if the stored row is still in that state, otherwise returning
/// `CoreError::StoreConflict` — spec §7: "`StoreConflict` triggers one
/// local retry on the CAS path; a second conflict surfaces", a policy the
/// controllers built on top of this trait implement, not this trait
/// itself.
#[async_trait::async_trait]
pub trait Store: Send + Sync {
    // -- events --
    async fn get_event(&self, id: EventId) -> CoreResult<Event>;
    /// Every event, for the background sweeps (spec §4.5/§4.4) to
    /// enumerate what they scan; no relation in spec §3 narrower than
    /// "all events" fits, since a sweep has no event in hand to start from.
    async fn list_events(&self) -> CoreResult<Vec<Event>>;
    async fn put_event(&self, event: Event) -> CoreResult<()>;

    // -- registrations --
    async fn get_registration(&self, id: RegistrationId) -> CoreResult<Registration>;
    async fn find_registration(&self, event_id: EventId, player: &str) -> CoreResult<Option<Registration>>;
    async fn list_registrations(&self, event_id: EventId) -> CoreResult<Vec<Registration>>;
    async fn list_registrations_in_state(
        &self,
        event_id: EventId,
        state: RegistrationState,
    ) -> CoreResult<Vec<Registration>>;
    async fn put_registration(&self, registration: Registration) -> CoreResult<()>;
    /// CAS on `Registration::state`: commits only if the stored row's
    /// state still equals `expected`.
    async fn cas_registration(
        &self,
        id: RegistrationId,
        expected: RegistrationState,
        new: Registration,
    ) -> CoreResult<()>;
    /// The one genuinely cross-row atomic operation this spec names (§4.1,
    /// §5 guarantee 3): drops `dropping` and, in the same transaction,
    /// promotes the oldest-submitted `Interested` row to `Pending` if the
    /// drop vacates roster room. Returns the dropped row and the promoted
    /// row, if any.
    async fn drop_and_promote(
        &self,
        event_id: EventId,
        dropping: RegistrationId,
        now: DateTime<Utc>,
    ) -> CoreResult<(Registration, Option<Registration>)>;

    // -- rounds --
    async fn get_round(&self, id: RoundId) -> CoreResult<Round>;
    async fn list_rounds(&self, event_id: EventId) -> CoreResult<Vec<Round>>;
    async fn put_round(&self, round: Round) -> CoreResult<()>;

    // -- games --
    async fn get_game(&self, id: GameId) -> CoreResult<Game>;
    async fn list_games_by_round(&self, round_id: RoundId) -> CoreResult<Vec<Game>>;
    async fn list_games_by_event(&self, event_id: EventId) -> CoreResult<Vec<Game>>;
    async fn put_game(&self, game: Game) -> CoreResult<()>;
    /// CAS on `Game::state`.
    async fn cas_game(&self, id: GameId, expected: GameState, new: Game) -> CoreResult<()>;
    /// Removes every still-`pending` game for a round, for
    /// `repair_round` (spec §4.6) re-pairing from a clean slate. Games
    /// already `submitted`/`complete` are untouched (and `repair_round`'s
    /// caller has already refused to repair a round with any of those).
    async fn clear_pending_games(&self, round_id: RoundId) -> CoreResult<()>;

    // -- teams --
    async fn get_team(&self, id: TeamId) -> CoreResult<Team>;
    async fn list_teams(&self, event_id: EventId) -> CoreResult<Vec<Team>>;
    async fn put_team(&self, team: Team) -> CoreResult<()>;
    async fn list_team_members(&self, team_id: TeamId) -> CoreResult<Vec<TeamMember>>;
    async fn put_team_member(&self, member: TeamMember) -> CoreResult<()>;

    // -- team rounds / pairings --
    async fn get_team_round(&self, id: TeamRoundId) -> CoreResult<TeamRound>;
    async fn list_team_rounds(&self, round_id: RoundId) -> CoreResult<Vec<TeamRound>>;
    async fn put_team_round(&self, team_round: TeamRound) -> CoreResult<()>;
    async fn list_team_pairings(&self, team_round_id: TeamRoundId) -> CoreResult<Vec<TeamPairing>>;
    async fn put_team_pairing(&self, pairing: TeamPairing) -> CoreResult<()>;
    /// CAS on an individual `TeamPairing` write-once field set
    /// (`layout_number`/`mission_code`); commits only if the stored row's
    /// id matches and hasn't been concurrently overwritten.
    async fn cas_team_pairing(&self, id: TeamPairingId, new: TeamPairing) -> CoreResult<()>;

    // -- ritual state --
    async fn get_pairing_state(&self, id: PairingStateId) -> CoreResult<PairingState>;
    async fn get_pairing_state_for_round(&self, team_round_id: TeamRoundId) -> CoreResult<PairingState>;
    async fn put_pairing_state(&self, state: PairingState) -> CoreResult<()>;
    /// CAS keyed to the whole row's `updated_at`, satisfying spec §5
    /// guarantee 4 ("Ritual write-once fields use CAS on (team_round_id,
    /// field)") at row granularity — `PairingState`'s own write-once
    /// field guards (spec §3) make per-field collisions within a single
    /// writer's local mutation impossible; this CAS only protects against
    /// a second writer's concurrent read-modify-write of the same row.
    async fn cas_pairing_state(
        &self,
        id: PairingStateId,
        expected_updated_at: DateTime<Utc>,
        new: PairingState,
    ) -> CoreResult<()>;
    /// Every `TeamRound` with `state=pairing`, for ritual-coordinator
    /// recovery on restart (spec §4.4 "Recovery").
    async fn list_pairing_in_progress(&self, event_id: EventId) -> CoreResult<Vec<PairingState>>;

    // -- standings --
    async fn get_standing(&self, event_id: EventId, player: &str) -> CoreResult<Standing>;
    async fn list_standings(&self, event_id: EventId) -> CoreResult<Vec<Standing>>;
    async fn put_standing(&self, standing: Standing) -> CoreResult<()>;
    async fn get_team_standing(&self, event_id: EventId, team_id: TeamId) -> CoreResult<TeamStanding>;
    async fn list_team_standings(&self, event_id: EventId) -> CoreResult<Vec<TeamStanding>>;
    async fn put_team_standing(&self, standing: TeamStanding) -> CoreResult<()>;

    // -- judge calls --
    async fn get_judge_call(&self, id: JudgeCallId) -> CoreResult<JudgeCall>;
    async fn list_judge_calls(&self, event_id: EventId) -> CoreResult<Vec<JudgeCall>>;
    async fn put_judge_call(&self, call: JudgeCall) -> CoreResult<()>;
}
