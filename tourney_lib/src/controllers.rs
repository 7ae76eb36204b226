//! The five stateful controllers from spec §2/§4: Registration, Round,
//! Game Lifecycle, Event, and the pairing-driven glue between them. These
//! are the Store/Clock/Notifier-aware layer on top of the pure entity
//! types in `event`/`registration`/`round`/`game`/`team`/`ritual`/
//! `scoring`/`pairing`.

use std::{collections::HashSet, sync::Arc};

use chrono::Duration;

use crate::{
    audit::{AuditLine, AuditQueue},
    clock::{Clock, AUTO_CONFIRM_TIMEOUT},
    error::{CoreError, CoreResult},
    event::Event,
    game::{Game, GameState, WhichPlayer},
    identifiers::{EventId, GameId, PlayerId, RegistrationId, RoundId, TeamId},
    notifier::{Audience, GameForNotify, Notifier, Payload},
    pairing::{self, HistoryKey, RankedEntrant},
    registration::{Registration, RegistrationState},
    round::{Round, RoundState},
    scoring::{self, SideOutcome, Standing},
    store::Store,
};

/// Shared handle every controller closes over: the `Store`/`Clock`/
/// `Notifier` ports plus the in-process audit queue. Cloned cheaply
/// (everything behind an `Arc`), mirroring squire_core's `AppState`.
#[derive(Clone)]
pub struct Ports {
    pub store: Arc<dyn Store>,
    pub clock: Arc<dyn Clock>,
    pub notifier: Arc<dyn Notifier>,
    pub audit: Arc<AuditQueue>,
}

impl Ports {
    fn log(&self, event_id: EventId, message: impl Into<String>) {
        self.audit.enqueue(AuditLine {
            event_id,
            at: self.clock.now(),
            message: message.into(),
        });
    }
}

pub struct RegistrationController {
    ports: Ports,
}

impl RegistrationController {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    /// `submit_interest(event, player)` (spec §4.1): idempotent.
    #[tracing::instrument(skip(self))]
    pub async fn submit_interest(
        &self,
        event_id: EventId,
        player_id: PlayerId,
        username: String,
    ) -> CoreResult<Registration> {
        if let Some(existing) = self.ports.store.find_registration(event_id, &player_id.0).await? {
            return Ok(existing);
        }
        let now = self.ports.clock.now();
        let reg = Registration::new_interested(
            RegistrationId::new_random(),
            event_id,
            player_id,
            username,
            now,
            uuid::Uuid::new_v4().to_string(),
        );
        self.ports.store.put_registration(reg.clone()).await?;
        self.ports
            .notifier
            .notify(Audience::Principal(reg.player_id.clone()), Payload::InterestPrompt { event_id })
            .await;
        Ok(reg)
    }

    /// `submit_list(event, player, army, detachment, list_text)` (spec
    /// §4.1): fails with `ListsLocked` past `reg_deadline` or once the
    /// event is `in_progress` or later.
    #[tracing::instrument(skip(self, list_text))]
    pub async fn submit_list(
        &self,
        event_id: EventId,
        player_id: PlayerId,
        army: String,
        detachment: String,
        list_text: String,
    ) -> CoreResult<Registration> {
        let event = self.ports.store.get_event(event_id).await?;
        let now = self.ports.clock.now();
        if !event.lists_are_open(now) {
            return Err(CoreError::ListsLocked);
        }
        let mut reg = self
            .ports
            .store
            .find_registration(event_id, &player_id.0)
            .await?
            .unwrap_or_else(|| {
                Registration::new_interested(
                    RegistrationId::new_random(),
                    event_id,
                    player_id.clone(),
                    player_id.0.clone(),
                    now,
                    uuid::Uuid::new_v4().to_string(),
                )
            });
        reg.submit_list(army, detachment, list_text, now);
        self.ports.store.put_registration(reg.clone()).await?;
        self.ports
            .notifier
            .notify(
                Audience::Role("crew".into()),
                Payload::ListReviewCard {
                    event_id,
                    player_id: reg.player_id.clone(),
                    review_token: reg.review_token.clone(),
                },
            )
            .await;
        Ok(reg)
    }

    /// `approve(event, player)` (spec §4.1): `pending -> approved`, creates
    /// the player's `Standing`, enforces the roster cap.
    #[tracing::instrument(skip(self))]
    pub async fn approve(&self, event_id: EventId, registration_id: RegistrationId) -> CoreResult<Registration> {
        let event = self.ports.store.get_event(event_id).await?;
        let approved = self
            .ports
            .store
            .list_registrations_in_state(event_id, RegistrationState::Approved)
            .await?;
        if approved.len() as u32 + 1 > event.max_players.as_u32() {
            return Err(CoreError::RosterFull);
        }
        let mut reg = self.ports.store.get_registration(registration_id).await?;
        let prior = reg.state;
        let now = self.ports.clock.now();
        reg.approve(now)?;
        self.ports.store.cas_registration(registration_id, prior, reg.clone()).await?;
        self.ports
            .store
            .put_standing(Standing::new(event_id, reg.player_id.clone()))
            .await?;
        self.ports
            .notifier
            .notify(Audience::Principal(reg.player_id.clone()), Payload::InterestPrompt { event_id })
            .await;
        self.ports.log(event_id, format!("approved {}", reg.player_id));
        Ok(reg)
    }

    /// `relegate(event, player)` (spec §4.1): `pending -> interested`.
    pub async fn relegate(&self, registration_id: RegistrationId) -> CoreResult<Registration> {
        let mut reg = self.ports.store.get_registration(registration_id).await?;
        let prior = reg.state;
        reg.relegate()?;
        self.ports.store.cas_registration(registration_id, prior, reg.clone()).await?;
        Ok(reg)
    }

    /// `reject(event, player, reason)` (spec §4.1). Per spec §9's open
    /// question resolution (see DESIGN.md): reject is non-promoting.
    pub async fn reject(&self, registration_id: RegistrationId, reason: String) -> CoreResult<Registration> {
        let mut reg = self.ports.store.get_registration(registration_id).await?;
        let prior = reg.state;
        reg.reject(reason.clone())?;
        self.ports.store.cas_registration(registration_id, prior, reg.clone()).await?;
        self.ports
            .notifier
            .notify(
                Audience::Principal(reg.player_id.clone()),
                Payload::ListReviewCard {
                    event_id: reg.event_id,
                    player_id: reg.player_id.clone(),
                    review_token: reg.review_token.clone(),
                },
            )
            .await;
        Ok(reg)
    }

    /// `drop(event, player)` (spec §4.1): atomic with Reserve Promotion
    /// (spec §5 guarantee 3). The actual cross-row atomicity lives in
    /// `Store::drop_and_promote`; this just drives the side effects
    /// (standings deactivation, notifications) around it.
    #[tracing::instrument(skip(self))]
    pub async fn drop(
        &self,
        event_id: EventId,
        registration_id: RegistrationId,
    ) -> CoreResult<(Registration, Option<Registration>)> {
        let now = self.ports.clock.now();
        let (dropped, promoted) = self.ports.store.drop_and_promote(event_id, registration_id, now).await?;

        if matches!(dropped.state, RegistrationState::Dropped) {
            // The prior approval, if any, deactivates the player's Standing
            // (spec §4.1: "results preserved").
            if let Ok(mut standing) = self.ports.store.get_standing(event_id, &dropped.player_id.0).await {
                standing.active = false;
                self.ports.store.put_standing(standing).await?;
            }
        }

        if let Some(promoted) = &promoted {
            self.ports
                .notifier
                .notify(
                    Audience::Principal(promoted.player_id.clone()),
                    Payload::ListReviewCard {
                        event_id,
                        player_id: promoted.player_id.clone(),
                        review_token: promoted.review_token.clone(),
                    },
                )
                .await;
        }
        self.ports.log(event_id, format!("dropped {}", dropped.player_id));
        Ok((dropped, promoted))
    }
}

pub struct RoundController {
    ports: Ports,
}

impl RoundController {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    /// `start_round(event, duration)` (spec §4.6): builds the pool from
    /// active standings, runs the singles Pairing Engine, records `Game`
    /// rows, opens the round.
    #[tracing::instrument(skip(self))]
    pub async fn start_round(&self, event_id: EventId, duration: Duration, rooms: &[u32]) -> CoreResult<Round> {
        let event = self.ports.store.get_event(event_id).await?;
        let existing = self.ports.store.list_rounds(event_id).await?;
        let round_number = existing.len() as u32 + 1;
        if round_number > event.round_count {
            return Err(CoreError::invalid_state(
                format!("round_number <= {}", event.round_count),
                round_number.to_string(),
            ));
        }

        let now = self.ports.clock.now();
        let day_number = if event.round_count == 5 && round_number > 3 { 2 } else { 1 };
        let round = Round::open(RoundId::new_random(), event_id, round_number, day_number, now, duration);
        self.ports.store.put_round(round.clone()).await?;

        if event.format.is_team_format() {
            self.start_team_round_pairings(event_id, event.format, round.id).await?;
        } else {
            let standings = self.ports.store.list_standings(event_id).await?;
            let active: Vec<Standing> = standings.into_iter().filter(|s| s.active).collect();
            if active.is_empty() {
                return Err(CoreError::NoEligiblePlayers);
            }
            let history = self.previous_pairs(event_id).await?;

            let mut ranked: Vec<Standing> = active;
            ranked.sort_by_key(|s| s.rank_key());
            let entrants: Vec<RankedEntrant<PlayerId>> = ranked
                .iter()
                .map(|s| RankedEntrant {
                    id: s.player_id.clone(),
                    had_bye: s.had_bye,
                })
                .collect();
            let result = pairing::pair(&entrants, &history);

            let room_assignments = pairing::assign_rooms(result.pairings.len(), rooms);
            for (pairing, room) in result.pairings.iter().zip(room_assignments) {
                let game = Game::new_pairing(
                    GameId::new_random(),
                    round.id,
                    event_id,
                    pairing.a.clone(),
                    pairing.b.clone(),
                    room,
                );
                self.ports.store.put_game(game).await?;
            }
            if let Some(bye_player) = result.bye {
                let game = Game::new_bye(GameId::new_random(), round.id, event_id, bye_player);
                self.ports.store.put_game(game).await?;
            }
        }

        self.ports
            .notifier
            .notify(
                Audience::Role("player".into()),
                Payload::PairingCard { event_id, round_number },
            )
            .await;
        Ok(round)
    }

    async fn previous_pairs(&self, event_id: EventId) -> CoreResult<HashSet<HistoryKey<PlayerId>>> {
        let games = self.ports.store.list_games_by_event(event_id).await?;
        Ok(games
            .iter()
            .filter(|g| !g.is_bye)
            .filter_map(|g| g.p2.as_ref().map(|p2| pairing::history_key(&g.p1, p2)))
            .collect())
    }

    /// Team-Swiss (spec §4.3): same rank-vector walk as singles, over
    /// `TeamStanding`s instead of `Standing`s. A bye team gets a walkover
    /// (`TP=2`, `GP=team_bye_walkover_gp(team_size)`) credited directly to
    /// its `TeamStanding`, no `TeamRound` created. Every other pairing
    /// becomes a `TeamRound`, handed to the Ritual Engine (or `pair_2v2`
    /// for format `TwoVTwo`) via `RitualCoordinator::start_team_round`.
    async fn start_team_round_pairings(&self, event_id: EventId, format: crate::event::Format, round_id: RoundId) -> CoreResult<()> {
        let teams = self.ports.store.list_teams(event_id).await?;
        let ready: Vec<_> = teams.into_iter().filter(|t| t.state == crate::team::TeamState::Ready).collect();
        if ready.is_empty() {
            return Err(CoreError::NoEligiblePlayers);
        }
        let mut ranked = Vec::with_capacity(ready.len());
        for team in &ready {
            let standing = self.ports.store.get_team_standing(event_id, team.id).await?;
            ranked.push(standing);
        }
        ranked.sort_by_key(|s| s.rank_key());
        let had_byes = self.team_had_byes(event_id, round_id).await?;
        let entrants: Vec<RankedEntrant<TeamId>> = ranked
            .iter()
            .map(|s| RankedEntrant {
                id: s.team_id,
                had_bye: had_byes.contains(&s.team_id),
            })
            .collect();
        let history = self.previous_team_pairs(event_id).await?;
        let result = pairing::pair(&entrants, &history);

        let coordinator = crate::controllers_team::RitualCoordinator::new(self.ports.clone());
        for pairing in &result.pairings {
            coordinator
                .start_team_round(round_id, event_id, pairing.a, pairing.b, format)
                .await?;
        }
        if let Some(bye_team) = result.bye {
            let mut standing = self.ports.store.get_team_standing(event_id, bye_team).await?;
            standing.team_wins += 1;
            standing.team_points += 2;
            standing.game_points += scoring::team_bye_walkover_gp(format.team_size() as u32);
            self.ports.store.put_team_standing(standing).await?;
        }
        Ok(())
    }

    async fn previous_team_pairs(&self, event_id: EventId) -> CoreResult<HashSet<HistoryKey<TeamId>>> {
        let rounds = self.ports.store.list_rounds(event_id).await?;
        let mut history = HashSet::new();
        for round in rounds {
            for team_round in self.ports.store.list_team_rounds(round.id).await? {
                if let Some(team_b_id) = team_round.team_b_id {
                    history.insert(pairing::history_key(&team_round.team_a_id, &team_b_id));
                }
            }
        }
        Ok(history)
    }

    /// Teams that have already received a bye walkover this event (no
    /// `TeamRound` recorded for a round they were absent from) — the same
    /// role `Standing.had_bye` plays for singles, derived rather than
    /// stored since a walkover never creates a `TeamRound` to read it off.
    async fn team_had_byes(&self, event_id: EventId, current_round_id: RoundId) -> CoreResult<HashSet<TeamId>> {
        let rounds = self.ports.store.list_rounds(event_id).await?;
        let teams = self.ports.store.list_teams(event_id).await?;
        let mut paired_by_round: Vec<HashSet<TeamId>> = Vec::new();
        for round in rounds.iter().filter(|r| r.id != current_round_id) {
            let mut paired = HashSet::new();
            for team_round in self.ports.store.list_team_rounds(round.id).await? {
                paired.insert(team_round.team_a_id);
                if let Some(b) = team_round.team_b_id {
                    paired.insert(b);
                }
            }
            paired_by_round.push(paired);
        }
        Ok(teams
            .iter()
            .filter(|t| t.state == crate::team::TeamState::Ready)
            .filter(|t| paired_by_round.iter().any(|paired| !paired.contains(&t.id)))
            .map(|t| t.id)
            .collect())
    }

    /// `repair_round(event)` (spec §4.6): only if no game in the round is
    /// `Complete`; deletes `pending` games and re-pairs.
    pub async fn repair_round(&self, round_id: RoundId, rooms: &[u32]) -> CoreResult<()> {
        let mut round = self.ports.store.get_round(round_id).await?;
        let games = self.ports.store.list_games_by_round(round_id).await?;
        if games.iter().any(|g| g.state == GameState::Complete) {
            return Err(CoreError::invalid_state("no completed games", "a game is complete"));
        }
        round.repair()?;
        self.ports.store.clear_pending_games(round_id).await?;

        let history = self.previous_pairs(round.event_id).await?;
        let standings = self.ports.store.list_standings(round.event_id).await?;
        let active: Vec<Standing> = standings.into_iter().filter(|s| s.active).collect();
        let mut ranked = active;
        ranked.sort_by_key(|s| s.rank_key());
        let entrants: Vec<RankedEntrant<PlayerId>> = ranked
            .iter()
            .map(|s| RankedEntrant {
                id: s.player_id.clone(),
                had_bye: s.had_bye,
            })
            .collect();
        let result = pairing::pair(&entrants, &history);
        let room_assignments = pairing::assign_rooms(result.pairings.len(), rooms);
        for (pairing, room) in result.pairings.iter().zip(room_assignments) {
            let game = Game::new_pairing(
                GameId::new_random(),
                round_id,
                round.event_id,
                pairing.a.clone(),
                pairing.b.clone(),
                room,
            );
            self.ports.store.put_game(game).await?;
        }
        if let Some(bye_player) = result.bye {
            let game = Game::new_bye(GameId::new_random(), round_id, round.event_id, bye_player);
            self.ports.store.put_game(game).await?;
        }
        self.ports.store.put_round(round).await?;
        Ok(())
    }

    /// `complete_round(event)` (spec §4.6): requires all non-bye games
    /// complete, awards bye VP as a win, transitions the round, refreshes
    /// standings.
    #[tracing::instrument(skip(self))]
    pub async fn complete_round(&self, round_id: RoundId) -> CoreResult<()> {
        let mut round = self.ports.store.get_round(round_id).await?;
        let games = self.ports.store.list_games_by_round(round_id).await?;
        let non_bye_incomplete = games
            .iter()
            .filter(|g| !g.is_bye)
            .any(|g| g.state != GameState::Complete);
        if non_bye_incomplete {
            return Err(CoreError::RoundIncomplete);
        }

        let completed_vps: Vec<u32> = games
            .iter()
            .filter(|g| !g.is_bye)
            .flat_map(|g| [g.p1_vp, g.p2_vp].into_iter().flatten())
            .collect();
        let award = scoring::bye_vp(&completed_vps);

        for game in games.iter().filter(|g| g.is_bye) {
            let mut bye_game = game.clone();
            let mut standing = self.ports.store.get_standing(round.event_id, &bye_game.p1.0).await?;
            scoring::apply(&mut standing, SideOutcome::Bye { vp: award });
            self.ports.store.put_standing(standing).await?;
            bye_game.state = GameState::Complete;
            bye_game.p1_vp = Some(award);
            self.ports.store.put_game(bye_game).await?;
        }

        let now = self.ports.clock.now();
        round.complete(now)?;
        self.ports.store.put_round(round).await?;
        Ok(())
    }
}

pub struct GameLifecycle {
    ports: Ports,
}

impl GameLifecycle {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self))]
    pub async fn submit(&self, game_id: GameId, submitter: PlayerId, own_vp: u32, opp_vp: u32) -> CoreResult<Game> {
        let mut game = self.ports.store.get_game(game_id).await?;
        let prior = game.state;
        let now = self.ports.clock.now();
        game.submit(&submitter, own_vp, opp_vp, now)?;
        self.ports.store.cas_game(game_id, prior, game.clone()).await?;
        let opponent = if submitter == game.p1 { game.p2.clone() } else { Some(game.p1.clone()) };
        if let Some(opponent) = opponent {
            self.ports
                .notifier
                .notify(
                    Audience::Principal(opponent),
                    Payload::ResultConfirmCard { game: GameForNotify::from(&game) },
                )
                .await;
        }
        Ok(game)
    }

    /// `confirm(game, confirmer)` (spec §4.5): applies to standings exactly
    /// once, guarded by the `Submitted -> Complete` CAS (spec §5
    /// guarantee 2).
    #[tracing::instrument(skip(self))]
    pub async fn confirm(&self, game_id: GameId) -> CoreResult<Game> {
        let mut game = self.ports.store.get_game(game_id).await?;
        let prior = game.state;
        let now = self.ports.clock.now();
        game.confirm(now)?;
        self.ports.store.cas_game(game_id, prior, game.clone()).await?;
        self.apply_outcome(&game).await?;
        Ok(game)
    }

    pub async fn dispute(&self, game_id: GameId) -> CoreResult<Game> {
        let mut game = self.ports.store.get_game(game_id).await?;
        let prior = game.state;
        game.dispute()?;
        self.ports.store.cas_game(game_id, prior, game.clone()).await?;
        self.ports
            .notifier
            .notify(
                Audience::Role("crew".into()),
                Payload::JudgeAlert {
                    event_id: game.event_id,
                    judge_call_id: None,
                    message: format!("game {} disputed", game.id),
                },
            )
            .await;
        Ok(game)
    }

    /// `override(game, TO)` (spec §4.5).
    pub async fn to_override(&self, game_id: GameId) -> CoreResult<Game> {
        let mut game = self.ports.store.get_game(game_id).await?;
        let prior = game.state;
        let now = self.ports.clock.now();
        game.to_override(now)?;
        self.ports.store.cas_game(game_id, prior, game.clone()).await?;
        self.apply_outcome(&game).await?;
        Ok(game)
    }

    /// `auto_confirm(game)` (spec §4.5/§5): fires `submitted_at + 24h`;
    /// idempotent no-op if the state has since moved.
    pub async fn auto_confirm(&self, game_id: GameId) -> CoreResult<()> {
        let game = self.ports.store.get_game(game_id).await?;
        let now = self.ports.clock.now();
        if !game.auto_confirm_due(now, AUTO_CONFIRM_TIMEOUT) {
            return Ok(());
        }
        self.confirm(game_id).await?;
        Ok(())
    }

    /// `adjust(game, new_p1_vp, new_p2_vp, note)` (spec §4.5): reverses the
    /// previously posted delta, then applies the new one.
    #[tracing::instrument(skip(self, note))]
    pub async fn adjust(&self, game_id: GameId, new_p1_vp: u32, new_p2_vp: u32, note: String) -> CoreResult<Game> {
        let mut game = self.ports.store.get_game(game_id).await?;
        if game.state != GameState::Complete {
            return Err(CoreError::invalid_state("Complete", format!("{:?}", game.state)));
        }
        let prior_outcome = game.outcome().ok_or(CoreError::IllegalAdjustment)?;
        self.reverse_outcome(&game, prior_outcome).await?;
        game.adjust(new_p1_vp, new_p2_vp, note)?;
        self.ports.store.put_game(game.clone()).await?;
        self.apply_outcome(&game).await?;
        self.ports.log(
            game.event_id,
            format!("adjusted game {}: {:?} -> p1={new_p1_vp} p2={new_p2_vp}", game.id, prior_outcome),
        );
        Ok(game)
    }

    async fn apply_outcome(&self, game: &Game) -> CoreResult<()> {
        let Some(outcome) = game.outcome() else { return Ok(()) };
        let mut p1_standing = self.ports.store.get_standing(game.event_id, &game.p1.0).await?;
        scoring::apply(&mut p1_standing, scoring::side_outcome_for(outcome, WhichPlayer::P1));
        self.ports.store.put_standing(p1_standing).await?;
        if let Some(p2) = &game.p2 {
            let mut p2_standing = self.ports.store.get_standing(game.event_id, &p2.0).await?;
            scoring::apply(&mut p2_standing, scoring::side_outcome_for(outcome, WhichPlayer::P2));
            self.ports.store.put_standing(p2_standing).await?;
        }
        Ok(())
    }

    async fn reverse_outcome(&self, game: &Game, outcome: crate::game::Outcome) -> CoreResult<()> {
        let mut p1_standing = self.ports.store.get_standing(game.event_id, &game.p1.0).await?;
        scoring::reverse(&mut p1_standing, scoring::side_outcome_for(outcome, WhichPlayer::P1));
        self.ports.store.put_standing(p1_standing).await?;
        if let Some(p2) = &game.p2 {
            let mut p2_standing = self.ports.store.get_standing(game.event_id, &p2.0).await?;
            scoring::reverse(&mut p2_standing, scoring::side_outcome_for(outcome, WhichPlayer::P2));
            self.ports.store.put_standing(p2_standing).await?;
        }
        Ok(())
    }
}

pub struct EventController {
    ports: Ports,
}

impl EventController {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    #[tracing::instrument(skip(self))]
    pub async fn create_event(&self, event: Event) -> CoreResult<Event> {
        if event.format != crate::event::Format::Singles {
            return Err(CoreError::FormatUnsupported);
        }
        self.ports.store.put_event(event.clone()).await?;
        Ok(event)
    }

    /// `lock_lists(event)` (spec §4.7): archives review channels, publishes
    /// approved lists, transitions to `in_progress`-ready.
    pub async fn lock_lists(&self, event_id: EventId) -> CoreResult<Event> {
        let mut event = self.ports.store.get_event(event_id).await?;
        let now = self.ports.clock.now();
        event.lock_lists(now)?;
        self.ports.store.put_event(event.clone()).await?;

        let approved = self
            .ports
            .store
            .list_registrations_in_state(event_id, RegistrationState::Approved)
            .await?;
        for reg in approved {
            self.ports
                .notifier
                .notify(
                    Audience::Principal(reg.player_id.clone()),
                    Payload::ListReviewCard {
                        event_id,
                        player_id: reg.player_id,
                        review_token: reg.review_token,
                    },
                )
                .await;
        }
        Ok(event)
    }

    /// `finish_event(event)` (spec §4.7): requires all rounds complete;
    /// emits final standings and a bulk external-ranking submission
    /// covering every `complete`, non-bye game of the event.
    pub async fn finish_event(&self, event_id: EventId) -> CoreResult<Event> {
        let rounds = self.ports.store.list_rounds(event_id).await?;
        if rounds.iter().any(|r| r.state != RoundState::Complete) {
            return Err(CoreError::RoundIncomplete);
        }
        let mut event = self.ports.store.get_event(event_id).await?;
        event.finish()?;
        self.ports.store.put_event(event.clone()).await?;

        let standings = self.ports.store.list_standings(event_id).await?;
        self.ports
            .notifier
            .notify(Audience::Audit, Payload::StandingsCard { event_id, standings })
            .await;

        let games = self.ports.store.list_games_by_event(event_id).await?;
        let ranked_games: Vec<GameForNotify> = games
            .iter()
            .filter(|g| !g.is_bye && g.state == GameState::Complete)
            .map(GameForNotify::from)
            .collect();
        self.ports
            .notifier
            .notify(
                Audience::Audit,
                Payload::ExternalRankingSubmission { event_id, games: ranked_games },
            )
            .await;
        Ok(event)
    }
}
