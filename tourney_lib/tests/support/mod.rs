//! A minimal `Store` test double for `tourney_lib`'s own integration tests
//! (no `dashmap`/tokio-mutex concurrency story needed here — that's
//! `tourney_server::store::MemoryStore`'s job; this is a plain
//! `std::sync::Mutex<HashMap<_>>` per collection, good enough to drive the
//! controllers through a scenario end-to-end).

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};

use tourney_lib::{
    audit::AuditQueue,
    clock::FixedClock,
    controllers::Ports,
    error::{CoreError, CoreResult},
    event::Event,
    game::{Game, GameState},
    identifiers::{
        EventId, GameId, JudgeCallId, PairingStateId, RegistrationId, RoundId, TeamId,
        TeamPairingId, TeamRoundId,
    },
    judge_call::JudgeCall,
    notifier::{Audience, Notifier, Payload},
    registration::{Registration, RegistrationState},
    ritual::PairingState,
    round::Round,
    scoring::{Standing, TeamStanding},
    store::Store,
    team::{Team, TeamMember, TeamPairing, TeamRound, TeamRoundState},
};
use std::sync::Arc;

#[derive(Default)]
pub struct FakeStore {
    events: Mutex<HashMap<EventId, Event>>,
    registrations: Mutex<HashMap<RegistrationId, Registration>>,
    rounds: Mutex<HashMap<RoundId, Round>>,
    games: Mutex<HashMap<GameId, Game>>,
    teams: Mutex<HashMap<TeamId, Team>>,
    team_members: Mutex<HashMap<(TeamId, String), TeamMember>>,
    team_rounds: Mutex<HashMap<TeamRoundId, TeamRound>>,
    team_pairings: Mutex<HashMap<TeamPairingId, TeamPairing>>,
    pairing_states: Mutex<HashMap<PairingStateId, PairingState>>,
    standings: Mutex<HashMap<(EventId, String), Standing>>,
    team_standings: Mutex<HashMap<(EventId, TeamId), TeamStanding>>,
    judge_calls: Mutex<HashMap<JudgeCallId, JudgeCall>>,
}

impl FakeStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait::async_trait]
impl Store for FakeStore {
    async fn get_event(&self, id: EventId) -> CoreResult<Event> {
        self.events.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_events(&self) -> CoreResult<Vec<Event>> {
        Ok(self.events.lock().unwrap().values().cloned().collect())
    }

    async fn put_event(&self, event: Event) -> CoreResult<()> {
        self.events.lock().unwrap().insert(event.id, event);
        Ok(())
    }

    async fn get_registration(&self, id: RegistrationId) -> CoreResult<Registration> {
        self.registrations.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn find_registration(&self, event_id: EventId, player: &str) -> CoreResult<Option<Registration>> {
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .values()
            .find(|r| r.event_id == event_id && r.player_id.0 == player)
            .cloned())
    }

    async fn list_registrations(&self, event_id: EventId) -> CoreResult<Vec<Registration>> {
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect())
    }

    async fn list_registrations_in_state(
        &self,
        event_id: EventId,
        state: RegistrationState,
    ) -> CoreResult<Vec<Registration>> {
        Ok(self
            .registrations
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.event_id == event_id && r.state == state)
            .cloned()
            .collect())
    }

    async fn put_registration(&self, registration: Registration) -> CoreResult<()> {
        self.registrations.lock().unwrap().insert(registration.id, registration);
        Ok(())
    }

    async fn cas_registration(
        &self,
        id: RegistrationId,
        expected: RegistrationState,
        new: Registration,
    ) -> CoreResult<()> {
        let mut map = self.registrations.lock().unwrap();
        let row = map.get(&id).ok_or(CoreError::NotFound)?;
        if row.state != expected {
            return Err(CoreError::StoreConflict);
        }
        map.insert(id, new);
        Ok(())
    }

    async fn drop_and_promote(
        &self,
        event_id: EventId,
        dropping: RegistrationId,
        now: DateTime<Utc>,
    ) -> CoreResult<(Registration, Option<Registration>)> {
        let mut map = self.registrations.lock().unwrap();
        let row = map.get_mut(&dropping).ok_or(CoreError::NotFound)?;
        let was_confirmed_or_chopped = matches!(row.state, RegistrationState::Approved | RegistrationState::Pending);
        row.drop(now);
        let dropped = row.clone();

        if !was_confirmed_or_chopped {
            return Ok((dropped, None));
        }
        let mut candidates: Vec<Registration> = map
            .values()
            .filter(|r| r.event_id == event_id && r.state == RegistrationState::Interested)
            .cloned()
            .collect();
        candidates.sort_by(|a, b| a.submitted_at.cmp(&b.submitted_at).then(a.player_id.0.cmp(&b.player_id.0)));
        let Some(mut next) = candidates.into_iter().next() else {
            return Ok((dropped, None));
        };
        next.state = RegistrationState::Pending;
        map.insert(next.id, next.clone());
        Ok((dropped, Some(next)))
    }

    async fn get_round(&self, id: RoundId) -> CoreResult<Round> {
        self.rounds.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_rounds(&self, event_id: EventId) -> CoreResult<Vec<Round>> {
        let mut rounds: Vec<Round> = self
            .rounds
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.event_id == event_id)
            .cloned()
            .collect();
        rounds.sort_by_key(|r| r.round_number);
        Ok(rounds)
    }

    async fn put_round(&self, round: Round) -> CoreResult<()> {
        self.rounds.lock().unwrap().insert(round.id, round);
        Ok(())
    }

    async fn get_game(&self, id: GameId) -> CoreResult<Game> {
        self.games.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_games_by_round(&self, round_id: RoundId) -> CoreResult<Vec<Game>> {
        Ok(self.games.lock().unwrap().values().filter(|g| g.round_id == round_id).cloned().collect())
    }

    async fn list_games_by_event(&self, event_id: EventId) -> CoreResult<Vec<Game>> {
        Ok(self.games.lock().unwrap().values().filter(|g| g.event_id == event_id).cloned().collect())
    }

    async fn put_game(&self, game: Game) -> CoreResult<()> {
        self.games.lock().unwrap().insert(game.id, game);
        Ok(())
    }

    async fn cas_game(&self, id: GameId, expected: GameState, new: Game) -> CoreResult<()> {
        let mut map = self.games.lock().unwrap();
        let row = map.get(&id).ok_or(CoreError::NotFound)?;
        if row.state != expected {
            return Err(CoreError::StoreConflict);
        }
        map.insert(id, new);
        Ok(())
    }

    async fn clear_pending_games(&self, round_id: RoundId) -> CoreResult<()> {
        self.games.lock().unwrap().retain(|_, g| !(g.round_id == round_id && g.state == GameState::Pending));
        Ok(())
    }

    async fn get_team(&self, id: TeamId) -> CoreResult<Team> {
        self.teams.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_teams(&self, event_id: EventId) -> CoreResult<Vec<Team>> {
        Ok(self.teams.lock().unwrap().values().filter(|t| t.event_id == event_id).cloned().collect())
    }

    async fn put_team(&self, team: Team) -> CoreResult<()> {
        self.teams.lock().unwrap().insert(team.id, team);
        Ok(())
    }

    async fn list_team_members(&self, team_id: TeamId) -> CoreResult<Vec<TeamMember>> {
        Ok(self.team_members.lock().unwrap().values().filter(|m| m.team_id == team_id).cloned().collect())
    }

    async fn put_team_member(&self, member: TeamMember) -> CoreResult<()> {
        self.team_members.lock().unwrap().insert((member.team_id, member.player_id.0.clone()), member);
        Ok(())
    }

    async fn get_team_round(&self, id: TeamRoundId) -> CoreResult<TeamRound> {
        self.team_rounds.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_team_rounds(&self, round_id: RoundId) -> CoreResult<Vec<TeamRound>> {
        Ok(self.team_rounds.lock().unwrap().values().filter(|r| r.round_id == round_id).cloned().collect())
    }

    async fn put_team_round(&self, team_round: TeamRound) -> CoreResult<()> {
        self.team_rounds.lock().unwrap().insert(team_round.id, team_round);
        Ok(())
    }

    async fn list_team_pairings(&self, team_round_id: TeamRoundId) -> CoreResult<Vec<TeamPairing>> {
        let mut pairings: Vec<TeamPairing> = self
            .team_pairings
            .lock()
            .unwrap()
            .values()
            .filter(|p| p.team_round_id == team_round_id)
            .cloned()
            .collect();
        pairings.sort_by_key(|p| p.slot);
        Ok(pairings)
    }

    async fn put_team_pairing(&self, pairing: TeamPairing) -> CoreResult<()> {
        self.team_pairings.lock().unwrap().insert(pairing.id, pairing);
        Ok(())
    }

    async fn cas_team_pairing(&self, id: TeamPairingId, new: TeamPairing) -> CoreResult<()> {
        let mut map = self.team_pairings.lock().unwrap();
        if !map.contains_key(&id) {
            return Err(CoreError::NotFound);
        }
        map.insert(id, new);
        Ok(())
    }

    async fn get_pairing_state(&self, id: PairingStateId) -> CoreResult<PairingState> {
        self.pairing_states.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn get_pairing_state_for_round(&self, team_round_id: TeamRoundId) -> CoreResult<PairingState> {
        self.pairing_states
            .lock()
            .unwrap()
            .values()
            .find(|s| s.team_round_id == team_round_id)
            .cloned()
            .ok_or(CoreError::NotFound)
    }

    async fn put_pairing_state(&self, state: PairingState) -> CoreResult<()> {
        self.pairing_states.lock().unwrap().insert(state.id, state);
        Ok(())
    }

    async fn cas_pairing_state(
        &self,
        id: PairingStateId,
        expected_updated_at: DateTime<Utc>,
        new: PairingState,
    ) -> CoreResult<()> {
        let mut map = self.pairing_states.lock().unwrap();
        let row = map.get(&id).ok_or(CoreError::NotFound)?;
        if row.updated_at != expected_updated_at {
            return Err(CoreError::StoreConflict);
        }
        map.insert(id, new);
        Ok(())
    }

    async fn list_pairing_in_progress(&self, event_id: EventId) -> CoreResult<Vec<PairingState>> {
        let round_ids: std::collections::HashSet<TeamRoundId> = self
            .team_rounds
            .lock()
            .unwrap()
            .values()
            .filter(|r| r.event_id == event_id && r.state == TeamRoundState::Pairing)
            .map(|r| r.id)
            .collect();
        Ok(self
            .pairing_states
            .lock()
            .unwrap()
            .values()
            .filter(|s| round_ids.contains(&s.team_round_id))
            .cloned()
            .collect())
    }

    async fn get_standing(&self, event_id: EventId, player: &str) -> CoreResult<Standing> {
        self.standings
            .lock()
            .unwrap()
            .get(&(event_id, player.to_owned()))
            .cloned()
            .ok_or(CoreError::NotFound)
    }

    async fn list_standings(&self, event_id: EventId) -> CoreResult<Vec<Standing>> {
        Ok(self.standings.lock().unwrap().values().filter(|s| s.event_id == event_id).cloned().collect())
    }

    async fn put_standing(&self, standing: Standing) -> CoreResult<()> {
        self.standings.lock().unwrap().insert((standing.event_id, standing.player_id.0.clone()), standing);
        Ok(())
    }

    async fn get_team_standing(&self, event_id: EventId, team_id: TeamId) -> CoreResult<TeamStanding> {
        self.team_standings.lock().unwrap().get(&(event_id, team_id)).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_team_standings(&self, event_id: EventId) -> CoreResult<Vec<TeamStanding>> {
        Ok(self.team_standings.lock().unwrap().values().filter(|s| s.event_id == event_id).cloned().collect())
    }

    async fn put_team_standing(&self, standing: TeamStanding) -> CoreResult<()> {
        self.team_standings.lock().unwrap().insert((standing.event_id, standing.team_id), standing);
        Ok(())
    }

    async fn get_judge_call(&self, id: JudgeCallId) -> CoreResult<JudgeCall> {
        self.judge_calls.lock().unwrap().get(&id).cloned().ok_or(CoreError::NotFound)
    }

    async fn list_judge_calls(&self, event_id: EventId) -> CoreResult<Vec<JudgeCall>> {
        Ok(self.judge_calls.lock().unwrap().values().filter(|c| c.event_id == event_id).cloned().collect())
    }

    async fn put_judge_call(&self, call: JudgeCall) -> CoreResult<()> {
        self.judge_calls.lock().unwrap().insert(call.id, call);
        Ok(())
    }
}

#[derive(Default)]
pub struct NoopNotifier;

#[async_trait::async_trait]
impl Notifier for NoopNotifier {
    async fn notify(&self, _audience: Audience, _payload: Payload) {}
}

/// A `Ports` handle over a fresh `FakeStore`, a clock fixed at `now`, and a
/// `Notifier` that discards everything -- enough to drive a controller
/// through a scenario and inspect the resulting rows.
pub fn ports_at(now: DateTime<Utc>) -> Ports {
    Ports {
        store: Arc::new(FakeStore::new()),
        clock: Arc::new(FixedClock(now)),
        notifier: Arc::new(NoopNotifier),
        audit: Arc::new(AuditQueue::new()),
    }
}
