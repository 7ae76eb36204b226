//! In-memory reference `Store` implementation, `dashmap`-backed.
//! Grounded on squire_core's `TOURNS_MAP`/`DashMap<TournamentId, _>`
//! global-registry pattern (`main.rs`/`state/mod.rs`): one `DashMap` per
//! entity collection, no external database. A real deployment swaps
//! this module for a persistent `Store` impl; nothing else in
//! `tourney_lib` depends on it being in-memory.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tokio::sync::Mutex;

use tourney_lib::{
    error::{CoreError, CoreResult},
    event::Event,
    game::{Game, GameState},
    identifiers::{
        EventId, GameId, JudgeCallId, PairingStateId, PlayerId, RegistrationId, RoundId, TeamId,
        TeamPairingId, TeamRoundId,
    },
    judge_call::JudgeCall,
    registration::{Registration, RegistrationState},
    ritual::PairingState,
    round::Round,
    scoring::{Standing, TeamStanding},
    store::Store,
    team::{Team, TeamMember, TeamPairing, TeamRound},
};

/// Every collection this reference store holds, plus a single
/// coarse-grained lock for the one genuinely cross-row transaction
/// (`drop_and_promote`). Per-row CAS methods use each `DashMap`'s own
/// entry-level locking and don't need the coarse lock.
#[derive(Default)]
pub struct MemoryStore {
    events: DashMap<EventId, Event>,
    registrations: DashMap<RegistrationId, Registration>,
    rounds: DashMap<RoundId, Round>,
    games: DashMap<GameId, Game>,
    teams: DashMap<TeamId, Team>,
    team_members: DashMap<(TeamId, String), TeamMember>,
    team_rounds: DashMap<TeamRoundId, TeamRound>,
    team_pairings: DashMap<TeamPairingId, TeamPairing>,
    pairing_states: DashMap<PairingStateId, PairingState>,
    standings: DashMap<(EventId, String), Standing>,
    team_standings: DashMap<(EventId, TeamId), TeamStanding>,
    judge_calls: DashMap<JudgeCallId, JudgeCall>,
    txn_lock: Mutex<()>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for MemoryStore {
    async fn get_event(&self, id: EventId) -> CoreResult<Event> {
        self.events.get(&id).map(|e| e.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_events(&self) -> CoreResult<Vec<Event>> {
        Ok(self.events.iter().map(|e| e.clone()).collect())
    }

    async fn put_event(&self, event: Event) -> CoreResult<()> {
        self.events.insert(event.id, event);
        Ok(())
    }

    async fn get_registration(&self, id: RegistrationId) -> CoreResult<Registration> {
        self.registrations.get(&id).map(|r| r.clone()).ok_or(CoreError::NotFound)
    }

    async fn find_registration(&self, event_id: EventId, player: &str) -> CoreResult<Option<Registration>> {
        Ok(self
            .registrations
            .iter()
            .find(|r| r.event_id == event_id && r.player_id.0 == player)
            .map(|r| r.clone()))
    }

    async fn list_registrations(&self, event_id: EventId) -> CoreResult<Vec<Registration>> {
        Ok(self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn list_registrations_in_state(
        &self,
        event_id: EventId,
        state: RegistrationState,
    ) -> CoreResult<Vec<Registration>> {
        Ok(self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.state == state)
            .map(|r| r.clone())
            .collect())
    }

    async fn put_registration(&self, registration: Registration) -> CoreResult<()> {
        self.registrations.insert(registration.id, registration);
        Ok(())
    }

    async fn cas_registration(
        &self,
        id: RegistrationId,
        expected: RegistrationState,
        new: Registration,
    ) -> CoreResult<()> {
        let mut row = self.registrations.get_mut(&id).ok_or(CoreError::NotFound)?;
        if row.state != expected {
            return Err(CoreError::StoreConflict);
        }
        *row = new;
        Ok(())
    }

    async fn drop_and_promote(
        &self,
        event_id: EventId,
        dropping: RegistrationId,
        now: DateTime<Utc>,
    ) -> CoreResult<(Registration, Option<Registration>)> {
        let _guard = self.txn_lock.lock().await;

        let mut row = self.registrations.get_mut(&dropping).ok_or(CoreError::NotFound)?;
        let was_confirmed_or_chopped = matches!(row.state, RegistrationState::Approved | RegistrationState::Pending);
        row.drop(now);
        let dropped = row.clone();
        drop(row);

        if !was_confirmed_or_chopped {
            return Ok((dropped, None));
        }

        // Oldest-submitted Interested row for this event gets promoted to
        // Pending (spec §4.1/§5 guarantee 3), ties broken lexicographically
        // by player_id.
        let mut candidates: Vec<Registration> = self
            .registrations
            .iter()
            .filter(|r| r.event_id == event_id && r.state == RegistrationState::Interested)
            .map(|r| r.clone())
            .collect();
        candidates.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.player_id.0.cmp(&b.player_id.0)));

        let Some(mut next) = candidates.into_iter().next() else {
            return Ok((dropped, None));
        };
        next.state = RegistrationState::Pending;
        self.registrations.insert(next.id, next.clone());
        Ok((dropped, Some(next)))
    }

    async fn get_round(&self, id: RoundId) -> CoreResult<Round> {
        self.rounds.get(&id).map(|r| r.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_rounds(&self, event_id: EventId) -> CoreResult<Vec<Round>> {
        let mut rounds: Vec<Round> = self
            .rounds
            .iter()
            .filter(|r| r.event_id == event_id)
            .map(|r| r.clone())
            .collect();
        rounds.sort_by_key(|r| r.round_number);
        Ok(rounds)
    }

    async fn put_round(&self, round: Round) -> CoreResult<()> {
        self.rounds.insert(round.id, round);
        Ok(())
    }

    async fn get_game(&self, id: GameId) -> CoreResult<Game> {
        self.games.get(&id).map(|g| g.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_games_by_round(&self, round_id: RoundId) -> CoreResult<Vec<Game>> {
        Ok(self
            .games
            .iter()
            .filter(|g| g.round_id == round_id)
            .map(|g| g.clone())
            .collect())
    }

    async fn list_games_by_event(&self, event_id: EventId) -> CoreResult<Vec<Game>> {
        Ok(self
            .games
            .iter()
            .filter(|g| g.event_id == event_id)
            .map(|g| g.clone())
            .collect())
    }

    async fn put_game(&self, game: Game) -> CoreResult<()> {
        self.games.insert(game.id, game);
        Ok(())
    }

    async fn cas_game(&self, id: GameId, expected: GameState, new: Game) -> CoreResult<()> {
        let mut row = self.games.get_mut(&id).ok_or(CoreError::NotFound)?;
        if row.state != expected {
            return Err(CoreError::StoreConflict);
        }
        *row = new;
        Ok(())
    }

    async fn clear_pending_games(&self, round_id: RoundId) -> CoreResult<()> {
        self.games
            .retain(|_, g| !(g.round_id == round_id && g.state == GameState::Pending));
        Ok(())
    }

    async fn get_team(&self, id: TeamId) -> CoreResult<Team> {
        self.teams.get(&id).map(|t| t.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_teams(&self, event_id: EventId) -> CoreResult<Vec<Team>> {
        Ok(self.teams.iter().filter(|t| t.event_id == event_id).map(|t| t.clone()).collect())
    }

    async fn put_team(&self, team: Team) -> CoreResult<()> {
        self.teams.insert(team.id, team);
        Ok(())
    }

    async fn list_team_members(&self, team_id: TeamId) -> CoreResult<Vec<TeamMember>> {
        Ok(self
            .team_members
            .iter()
            .filter(|m| m.team_id == team_id)
            .map(|m| m.clone())
            .collect())
    }

    async fn put_team_member(&self, member: TeamMember) -> CoreResult<()> {
        self.team_members.insert((member.team_id, member.player_id.0.clone()), member);
        Ok(())
    }

    async fn get_team_round(&self, id: TeamRoundId) -> CoreResult<TeamRound> {
        self.team_rounds.get(&id).map(|r| r.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_team_rounds(&self, round_id: RoundId) -> CoreResult<Vec<TeamRound>> {
        Ok(self
            .team_rounds
            .iter()
            .filter(|r| r.round_id == round_id)
            .map(|r| r.clone())
            .collect())
    }

    async fn put_team_round(&self, team_round: TeamRound) -> CoreResult<()> {
        self.team_rounds.insert(team_round.id, team_round);
        Ok(())
    }

    async fn list_team_pairings(&self, team_round_id: TeamRoundId) -> CoreResult<Vec<TeamPairing>> {
        let mut pairings: Vec<TeamPairing> = self
            .team_pairings
            .iter()
            .filter(|p| p.team_round_id == team_round_id)
            .map(|p| p.clone())
            .collect();
        pairings.sort_by_key(|p| p.slot);
        Ok(pairings)
    }

    async fn put_team_pairing(&self, pairing: TeamPairing) -> CoreResult<()> {
        self.team_pairings.insert(pairing.id, pairing);
        Ok(())
    }

    async fn cas_team_pairing(&self, id: TeamPairingId, new: TeamPairing) -> CoreResult<()> {
        let mut row = self.team_pairings.get_mut(&id).ok_or(CoreError::NotFound)?;
        *row = new;
        Ok(())
    }

    async fn get_pairing_state(&self, id: PairingStateId) -> CoreResult<PairingState> {
        self.pairing_states.get(&id).map(|s| s.clone()).ok_or(CoreError::NotFound)
    }

    async fn get_pairing_state_for_round(&self, team_round_id: TeamRoundId) -> CoreResult<PairingState> {
        self.pairing_states
            .iter()
            .find(|s| s.team_round_id == team_round_id)
            .map(|s| s.clone())
            .ok_or(CoreError::NotFound)
    }

    async fn put_pairing_state(&self, state: PairingState) -> CoreResult<()> {
        self.pairing_states.insert(state.id, state);
        Ok(())
    }

    async fn cas_pairing_state(
        &self,
        id: PairingStateId,
        expected_updated_at: DateTime<Utc>,
        new: PairingState,
    ) -> CoreResult<()> {
        let mut row = self.pairing_states.get_mut(&id).ok_or(CoreError::NotFound)?;
        if row.updated_at != expected_updated_at {
            return Err(CoreError::StoreConflict);
        }
        *row = new;
        Ok(())
    }

    async fn list_pairing_in_progress(&self, event_id: EventId) -> CoreResult<Vec<PairingState>> {
        let round_ids: std::collections::HashSet<TeamRoundId> = self
            .team_rounds
            .iter()
            .filter(|r| r.event_id == event_id && r.state == tourney_lib::team::TeamRoundState::Pairing)
            .map(|r| r.id)
            .collect();
        Ok(self
            .pairing_states
            .iter()
            .filter(|s| round_ids.contains(&s.team_round_id))
            .map(|s| s.clone())
            .collect())
    }

    async fn get_standing(&self, event_id: EventId, player: &str) -> CoreResult<Standing> {
        self.standings
            .get(&(event_id, player.to_owned()))
            .map(|s| s.clone())
            .ok_or(CoreError::NotFound)
    }

    async fn list_standings(&self, event_id: EventId) -> CoreResult<Vec<Standing>> {
        Ok(self
            .standings
            .iter()
            .filter(|s| s.key().0 == event_id)
            .map(|s| s.clone())
            .collect())
    }

    async fn put_standing(&self, standing: Standing) -> CoreResult<()> {
        self.standings.insert((standing.event_id, standing.player_id.0.clone()), standing);
        Ok(())
    }

    async fn get_team_standing(&self, event_id: EventId, team_id: TeamId) -> CoreResult<TeamStanding> {
        self.team_standings.get(&(event_id, team_id)).map(|s| s.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_team_standings(&self, event_id: EventId) -> CoreResult<Vec<TeamStanding>> {
        Ok(self
            .team_standings
            .iter()
            .filter(|s| s.key().0 == event_id)
            .map(|s| s.clone())
            .collect())
    }

    async fn put_team_standing(&self, standing: TeamStanding) -> CoreResult<()> {
        self.team_standings.insert((standing.event_id, standing.team_id), standing);
        Ok(())
    }

    async fn get_judge_call(&self, id: JudgeCallId) -> CoreResult<JudgeCall> {
        self.judge_calls.get(&id).map(|c| c.clone()).ok_or(CoreError::NotFound)
    }

    async fn list_judge_calls(&self, event_id: EventId) -> CoreResult<Vec<JudgeCall>> {
        Ok(self
            .judge_calls
            .iter()
            .filter(|c| c.event_id == event_id)
            .map(|c| c.clone())
            .collect())
    }

    async fn put_judge_call(&self, call: JudgeCall) -> CoreResult<()> {
        self.judge_calls.insert(call.id, call);
        Ok(())
    }
}
