//! Team formation and the Ritual Engine's orchestration layer (spec
//! §4.3/§4.4): the Store/Clock/Notifier-aware coordinator sitting on top
//! of the pure `team`/`ritual` state machines, the way `controllers.rs`
//! sits on top of `registration`/`round`/`game`.

use crate::{
    clock::{Clock, RITUAL_GATE_TIMEOUT},
    controllers::{GameLifecycle, Ports},
    error::{CoreError, CoreResult},
    event::{Format, ScoringMode},
    game::{Game, GameState, Outcome, WhichPlayer},
    identifiers::{EventId, GameId, RoundId, TeamId, TeamPairingId, TeamRoundId},
    notifier::{Audience, Payload},
    ritual::{self, PairingState, RitualStep, Side},
    scoring::{self, TeamStanding},
    team::{self, Team, TeamMember, TeamPairing, TeamRole, TeamRound, TeamRoundState, TeamState},
};

pub struct TeamController {
    ports: Ports,
}

impl TeamController {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    pub async fn form_team(&self, event_id: crate::identifiers::EventId, name: String, captain: crate::identifiers::PlayerId) -> CoreResult<Team> {
        let existing = self.ports.store.list_teams(event_id).await?;
        if existing.iter().any(|t| t.name.eq_ignore_ascii_case(&name)) {
            return Err(CoreError::DuplicateTeamName);
        }
        let team = Team::new(TeamId::new_random(), event_id, name, captain.clone());
        self.ports.store.put_team(team.clone()).await?;
        self.add_member(team.id, captain, TeamRole::Captain).await?;
        Ok(team)
    }

    pub async fn add_member(&self, team_id: TeamId, player_id: crate::identifiers::PlayerId, role: TeamRole) -> CoreResult<TeamMember> {
        let member = TeamMember {
            team_id,
            player_id,
            role,
            army: None,
            detachment: None,
            list_text: None,
            list_approved: false,
            active: true,
        };
        self.ports.store.put_team_member(member.clone()).await?;
        self.recompute(team_id).await?;
        Ok(member)
    }

    pub async fn submit_member_list(
        &self,
        team_id: TeamId,
        player_id: crate::identifiers::PlayerId,
        army: String,
        detachment: String,
        list_text: String,
    ) -> CoreResult<()> {
        let mut members = self.ports.store.list_team_members(team_id).await?;
        let member = members
            .iter_mut()
            .find(|m| m.player_id == player_id)
            .ok_or(CoreError::NotFound)?;
        member.army = Some(army);
        member.detachment = Some(detachment);
        member.list_text = Some(list_text);
        member.list_approved = false;
        self.ports.store.put_team_member(member.clone()).await?;
        self.recompute(team_id).await?;
        Ok(())
    }

    pub async fn approve_member_list(&self, team_id: TeamId, player_id: crate::identifiers::PlayerId) -> CoreResult<()> {
        let mut members = self.ports.store.list_team_members(team_id).await?;
        let member = members
            .iter_mut()
            .find(|m| m.player_id == player_id)
            .ok_or(CoreError::NotFound)?;
        member.list_approved = true;
        self.ports.store.put_team_member(member.clone()).await?;
        self.recompute(team_id).await?;
        Ok(())
    }

    pub async fn drop_team(&self, team_id: TeamId) -> CoreResult<()> {
        let mut team = self.ports.store.get_team(team_id).await?;
        team.drop();
        self.ports.store.put_team(team).await?;
        Ok(())
    }

    async fn recompute(&self, team_id: TeamId) -> CoreResult<()> {
        let mut team = self.ports.store.get_team(team_id).await?;
        let event = self.ports.store.get_event(team.event_id).await?;
        let members = self.ports.store.list_team_members(team_id).await?;
        let was_ready = team.state == TeamState::Ready;
        team.recompute_state(&members, event.format);
        // A team's `TeamStanding` is created the first time it goes
        // `Ready` (mirrors `Standing::new` on player approval, spec §3).
        if team.state == TeamState::Ready
            && !was_ready
            && self.ports.store.get_team_standing(team.event_id, team.id).await.is_err()
        {
            self.ports
                .store
                .put_team_standing(TeamStanding::new(team.event_id, team.id))
                .await?;
        }
        self.ports.store.put_team(team).await
    }
}

/// Coordinates a single `TeamRound`'s ritual from roll-off through every
/// phase's reveal to the format-specific closer slot (spec §4.4). 2v2
/// skips this entirely (`team::pair_2v2` assigns roster-order, no ritual).
pub struct RitualCoordinator {
    ports: Ports,
}

impl RitualCoordinator {
    pub fn new(ports: Ports) -> Self {
        Self { ports }
    }

    async fn active_roster(&self, team_id: TeamId) -> CoreResult<Vec<crate::identifiers::PlayerId>> {
        let members = self.ports.store.list_team_members(team_id).await?;
        Ok(members
            .into_iter()
            .filter(|m| m.active && m.role != TeamRole::Substitute)
            .map(|m| m.player_id)
            .collect())
    }

    #[tracing::instrument(skip(self))]
    pub async fn start_team_round(
        &self,
        round_id: RoundId,
        event_id: crate::identifiers::EventId,
        team_a_id: TeamId,
        team_b_id: TeamId,
        format: Format,
    ) -> CoreResult<TeamRound> {
        let mut team_round =
            TeamRound::new_pairing(TeamRoundId::new_random(), round_id, event_id, team_a_id, Some(team_b_id));

        if format == Format::TwoVTwo {
            let roster_a = self.active_roster(team_a_id).await?;
            let roster_b = self.active_roster(team_b_id).await?;
            let pairings = team::pair_2v2(team_round.id, team_a_id, team_b_id, &roster_a, &roster_b, |_| {
                TeamPairingId::new_random()
            })?;
            for p in pairings {
                self.ports.store.put_team_pairing(p).await?;
            }
            return self.enter_play(team_round).await;
        }

        if !format.runs_ritual() {
            return Err(CoreError::FormatUnsupported);
        }
        let now = self.ports.clock.now();
        let state = PairingState::new(crate::identifiers::PairingStateId::new_random(), team_round.id, now);
        self.ports.store.put_pairing_state(state).await?;
        self.ports.store.put_team_round(team_round.clone()).await?;
        self.ports
            .notifier
            .notify(
                Audience::Role("captains".into()),
                Payload::RitualPrompt {
                    team_round_id: team_round.id,
                    step: RitualStep::AwaitRolloff,
                    options: vec!["1".into(), "2".into(), "3".into(), "4".into(), "5".into(), "6".into()],
                },
            )
            .await;
        Ok(team_round)
    }

    async fn load_state(&self, team_round_id: TeamRoundId) -> CoreResult<PairingState> {
        self.ports.store.get_pairing_state_for_round(team_round_id).await
    }

    async fn save_state(&self, prior_updated_at: chrono::DateTime<chrono::Utc>, state: PairingState) -> CoreResult<()> {
        self.ports.store.cas_pairing_state(state.id, prior_updated_at, state).await
    }

    pub async fn submit_rolloff(&self, team_round_id: TeamRoundId, side: Side, value: u8) -> CoreResult<()> {
        let mut state = self.load_state(team_round_id).await?;
        let prior_updated_at = state.updated_at;
        let now = self.ports.clock.now();
        state.submit_rolloff(side, value, now)?;
        self.save_state(prior_updated_at, state).await
    }

    pub async fn submit_defender(&self, team_round_id: TeamRoundId, side: Side, player: crate::identifiers::PlayerId) -> CoreResult<()> {
        let mut state = self.load_state(team_round_id).await?;
        let prior_updated_at = state.updated_at;
        let now = self.ports.clock.now();
        state.submit_defender(side, player, now)?;
        self.save_state(prior_updated_at, state).await
    }

    pub async fn submit_attackers(
        &self,
        team_round_id: TeamRoundId,
        side: Side,
        attackers: Vec<crate::identifiers::PlayerId>,
    ) -> CoreResult<()> {
        let mut state = self.load_state(team_round_id).await?;
        let prior_updated_at = state.updated_at;
        let now = self.ports.clock.now();
        state.submit_attackers(side, attackers, now)?;
        self.save_state(prior_updated_at, state).await
    }

    /// `submit_choice` is also where the phase's two `TeamPairing` rows get
    /// derived and persisted (spec §4.4 "Derivations at choice-reveal").
    #[tracing::instrument(skip(self))]
    pub async fn submit_choice(
        &self,
        team_round: &TeamRound,
        side: Side,
        choice: crate::identifiers::PlayerId,
    ) -> CoreResult<()> {
        let mut state = self.load_state(team_round.id).await?;
        let prior_updated_at = state.updated_at;
        let now = self.ports.clock.now();
        let phase = state.current_phase;
        state.submit_choice(side, choice, now)?;

        if matches!(state.current_step, RitualStep::AwaitLayout(_)) && state.pending_slots.is_empty() {
            let (defender_a, defender_b, attackers_a, attackers_b, choice_a, choice_b) = (
                state.defender_a.clone().ok_or(CoreError::NotFound)?,
                state.defender_b.clone().ok_or(CoreError::NotFound)?,
                state.attackers_a.clone().ok_or(CoreError::NotFound)?,
                state.attackers_b.clone().ok_or(CoreError::NotFound)?,
                state.choice_a.clone().ok_or(CoreError::NotFound)?,
                state.choice_b.clone().ok_or(CoreError::NotFound)?,
            );
            let winner = state.rolloff_winner.ok_or(CoreError::NotFound)?;
            let slots = ritual::derive_phase_slots(
                phase,
                &defender_a,
                &defender_b,
                &attackers_a,
                &attackers_b,
                &choice_a,
                &choice_b,
            );
            let format = self.ports.store.get_event(team_round.event_id).await?.format;
            let mut slot_numbers = Vec::with_capacity(slots.len());
            for s in slots {
                // Slot 1 is always team A's defender facing team B's pick,
                // slot 2 always team B's defender facing team A's pick --
                // fixed by the derivation, independent of who won the
                // roll-off.
                let (defender_team, attacker_team) = if s.slot % 2 == 1 {
                    (team_round.team_a_id, self.side_team(team_round, Side::B))
                } else {
                    (self.side_team(team_round, Side::B), team_round.team_a_id)
                };
                let pickers = ritual::layout_mission_pickers(format, s.slot, winner);
                let (layout_picker_team, mission_picker_team) = match pickers {
                    Some((l, m)) => (Some(self.side_team(team_round, l)), Some(self.side_team(team_round, m))),
                    None => (None, None),
                };
                slot_numbers.push(s.slot);
                let pairing = TeamPairing {
                    id: TeamPairingId::new_random(),
                    team_round_id: team_round.id,
                    slot: s.slot,
                    game_id: None,
                    defender_player: s.defender,
                    defender_team,
                    attacker_player: s.attacker,
                    attacker_team,
                    refused_player: s.refused.into_iter().next(),
                    layout_number: None,
                    mission_code: None,
                    layout_picker_team,
                    mission_picker_team,
                };
                self.ports.store.put_team_pairing(pairing).await?;
            }
            state.begin_slot_gates(format, slot_numbers, false);
        }
        self.save_state(prior_updated_at, state).await
    }

    fn side_team(&self, team_round: &TeamRound, side: Side) -> TeamId {
        match side {
            Side::A => team_round.team_a_id,
            Side::B => team_round.team_b_id.expect("team round has both sides"),
        }
    }

    pub async fn submit_layout(&self, team_round_id: TeamRoundId, slot: u32, layout_number: u32) -> CoreResult<()> {
        let mut state = self.load_state(team_round_id).await?;
        let prior_updated_at = state.updated_at;
        if !matches!(state.current_step, RitualStep::AwaitLayout(_)) || state.pending_slots.first() != Some(&slot) {
            return Err(CoreError::invalid_state(
                format!("AwaitLayout(slot {slot})"),
                format!("{:?} pending={:?}", state.current_step, state.pending_slots),
            ));
        }
        let mut pairings = self.ports.store.list_team_pairings(team_round_id).await?;
        let row = pairings.iter_mut().find(|p| p.slot == slot).ok_or(CoreError::NotFound)?;
        if row.layout_number.is_some() {
            return Err(CoreError::AlreadySubmitted);
        }
        row.layout_number = Some(layout_number);
        self.ports.store.cas_team_pairing(row.id, row.clone()).await?;
        let team_round = self.ports.store.get_team_round(team_round_id).await?;
        let format = self.ports.store.get_event(team_round.event_id).await?.format;
        state.mark_layout_done(format);
        self.save_state(prior_updated_at, state).await
    }

    pub async fn submit_mission(&self, team_round: &TeamRound, slot: u32, mission_code: String) -> CoreResult<()> {
        let mut state = self.load_state(team_round.id).await?;
        let prior_updated_at = state.updated_at;
        if !matches!(state.current_step, RitualStep::AwaitMission(_)) || state.pending_slots.first() != Some(&slot) {
            return Err(CoreError::invalid_state(
                format!("AwaitMission(slot {slot})"),
                format!("{:?} pending={:?}", state.current_step, state.pending_slots),
            ));
        }
        let mut pairings = self.ports.store.list_team_pairings(team_round.id).await?;
        let row = pairings.iter_mut().find(|p| p.slot == slot).ok_or(CoreError::NotFound)?;
        if row.mission_code.is_some() {
            return Err(CoreError::AlreadySubmitted);
        }
        row.mission_code = Some(mission_code);
        self.ports.store.cas_team_pairing(row.id, row.clone()).await?;

        let format = self.ports.store.get_event(team_round.event_id).await?.format;
        let now = self.ports.clock.now();
        state.mark_mission_done(format);
        if state.current_step == RitualStep::Complete {
            if state.closing {
                self.enter_play(team_round.clone()).await?;
            } else if state.current_phase < format.phase_count() as u32 {
                state.reset_phase(state.current_phase + 1, now);
            } else {
                self.close_final_slot(team_round, format, &mut state).await?;
            }
        }
        self.save_state(prior_updated_at, state).await
    }

    /// Pairs off whichever roster members neither phase assigned, into the
    /// format's trailing slot (spec §4.4: teams_3 slot 3, teams_5's phase-5
    /// scrum, teams_8 slot 8), then runs that slot through its own
    /// layout/mission gate (spec §4.4's picker table has an entry for the
    /// closer slot too) before play can begin.
    async fn close_final_slot(&self, team_round: &TeamRound, format: Format, state: &mut PairingState) -> CoreResult<()> {
        let final_slot = format.team_size() as u32;
        let existing = self.ports.store.list_team_pairings(team_round.id).await?;
        if existing.iter().any(|p| p.slot == final_slot) {
            self.enter_play(team_round.clone()).await?;
            return Ok(());
        }
        // A refused candidate never actually played this `TeamRound` -- the
        // closer slot is exactly where they and the other side's refused
        // candidate end up facing each other -- so only real assignments
        // (defender/attacker) count as used, on either side of the table.
        let used: Vec<_> = existing
            .iter()
            .flat_map(|p| [p.defender_player.clone(), p.attacker_player.clone()])
            .collect();
        let roster_a = self.active_roster(team_round.team_a_id).await?;
        let roster_b = self.active_roster(team_round.team_b_id.expect("team round has both sides")).await?;
        let remaining_a = ritual::eligible_pool(&roster_a, &used);
        let remaining_b = ritual::eligible_pool(&roster_b, &used);
        if let (Some(a), Some(b)) = (remaining_a.into_iter().next(), remaining_b.into_iter().next()) {
            let winner = state.rolloff_winner.unwrap_or(Side::A);
            let pickers = ritual::layout_mission_pickers(format, final_slot, winner);
            let (layout_picker_team, mission_picker_team) = match pickers {
                Some((l, m)) => (Some(self.side_team(team_round, l)), Some(self.side_team(team_round, m))),
                None => (None, None),
            };
            let pairing = TeamPairing {
                id: TeamPairingId::new_random(),
                team_round_id: team_round.id,
                slot: final_slot,
                game_id: None,
                defender_player: a,
                defender_team: team_round.team_a_id,
                attacker_player: b,
                attacker_team: team_round.team_b_id.expect("team round has both sides"),
                refused_player: None,
                layout_number: None,
                mission_code: None,
                layout_picker_team,
                mission_picker_team,
            };
            self.ports.store.put_team_pairing(pairing).await?;
            state.begin_slot_gates(format, vec![final_slot], true);
        } else {
            self.enter_play(team_round.clone()).await?;
        }
        Ok(())
    }

    /// Materializes a real `Game` row for each of a `TeamRound`'s pairings
    /// that doesn't already have one, so captains' picks turn into ordinary
    /// games players `submit`/`confirm` through `GameLifecycle`, then flips
    /// the round to `Playing` (spec §4.3).
    async fn enter_play(&self, mut team_round: TeamRound) -> CoreResult<TeamRound> {
        let mut pairings = self.ports.store.list_team_pairings(team_round.id).await?;
        for pairing in pairings.iter_mut().filter(|p| p.game_id.is_none()) {
            let game_id = GameId::new_random();
            let game = Game::new_pairing(
                game_id,
                team_round.round_id,
                team_round.event_id,
                pairing.defender_player.clone(),
                pairing.attacker_player.clone(),
                None,
            );
            self.ports.store.put_game(game).await?;
            pairing.game_id = Some(game_id);
            self.ports.store.cas_team_pairing(pairing.id, pairing.clone()).await?;
        }
        team_round.begin_play()?;
        self.ports.store.put_team_round(team_round.clone()).await?;
        Ok(team_round)
    }

    /// Confirms one slot's game (spec §4.5) and rolls the per-game WTC GP
    /// onto both the players' `wtc_gp` and the `TeamRound`'s running score
    /// (spec §4.8); once every slot's game is `Complete`, finishes the
    /// `TeamRound` and posts its result to both sides' `TeamStanding`.
    #[tracing::instrument(skip(self))]
    pub async fn confirm_team_game(&self, team_round_id: TeamRoundId, slot: u32) -> CoreResult<()> {
        let event_id = self.ports.store.get_team_round(team_round_id).await?.event_id;
        let event = self.ports.store.get_event(event_id).await?;
        let pairings = self.ports.store.list_team_pairings(team_round_id).await?;
        let pairing = pairings.iter().find(|p| p.slot == slot).ok_or(CoreError::NotFound)?.clone();
        let game_id = pairing.game_id.ok_or(CoreError::NotFound)?;

        let lifecycle = GameLifecycle::new(self.ports.clone());
        let game = lifecycle.confirm(game_id).await?;

        let Some(outcome) = game.outcome() else { return Ok(()) };
        // `Game::new_pairing`'s p1/p2 are this pairing's defender/attacker.
        let (defender_gp, attacker_gp) = match outcome {
            Outcome::Win { winner, winner_vp, loser_vp } => {
                let (winner_gp, loser_gp) = scoring::wtc_game_points(winner_vp, loser_vp);
                match winner {
                    WhichPlayer::P1 => (winner_gp, loser_gp),
                    WhichPlayer::P2 => (loser_gp, winner_gp),
                }
            }
            Outcome::Draw { p1_vp, p2_vp } => {
                let (hi_gp, lo_gp) = scoring::wtc_game_points(p1_vp.max(p2_vp), p1_vp.min(p2_vp));
                if p1_vp >= p2_vp {
                    (hi_gp, lo_gp)
                } else {
                    (lo_gp, hi_gp)
                }
            }
        };

        let mut defender_standing = self.ports.store.get_standing(event_id, &pairing.defender_player.0).await?;
        defender_standing.wtc_gp += defender_gp;
        self.ports.store.put_standing(defender_standing).await?;

        let mut attacker_standing = self.ports.store.get_standing(event_id, &pairing.attacker_player.0).await?;
        attacker_standing.wtc_gp += attacker_gp;
        self.ports.store.put_standing(attacker_standing).await?;

        let mut round = self.ports.store.get_team_round(team_round_id).await?;
        if pairing.defender_team == round.team_a_id {
            round.team_a_score += defender_gp;
            round.team_b_score += attacker_gp;
        } else {
            round.team_a_score += attacker_gp;
            round.team_b_score += defender_gp;
        }
        self.ports.store.put_team_round(round.clone()).await?;

        self.maybe_complete_team_round(round, event.scoring_mode, event.format).await
    }

    /// Finishes the `TeamRound` once every slot's game is `Complete`, then
    /// rolls the result into both sides' `TeamStanding` (spec §4.8): WTC
    /// compares the two accumulated scores directly, NTL classifies each
    /// side independently against its own proportional threshold.
    async fn maybe_complete_team_round(&self, mut round: TeamRound, scoring_mode: ScoringMode, format: Format) -> CoreResult<()> {
        let pairings = self.ports.store.list_team_pairings(round.id).await?;
        let mut games = Vec::with_capacity(pairings.len());
        for p in &pairings {
            let Some(game_id) = p.game_id else { return Ok(()) };
            games.push(self.ports.store.get_game(game_id).await?);
        }
        if games.iter().any(|g| g.state != GameState::Complete) {
            return Ok(());
        }

        let (team_a_score, team_b_score) = (round.team_a_score, round.team_b_score);
        round.complete(team_a_score, team_b_score)?;
        self.ports.store.put_team_round(round.clone()).await?;

        let max_gp = format.team_size() as u32 * 20;
        let (result_a, result_b) = match scoring_mode {
            ScoringMode::Wtc => {
                let result = team_a_score.cmp(&team_b_score);
                (result, result.reverse())
            }
            ScoringMode::Ntl => (
                scoring::ntl_team_result(team_a_score, max_gp),
                scoring::ntl_team_result(team_b_score, max_gp),
            ),
        };
        self.apply_team_result(round.event_id, round.team_a_id, team_a_score, result_a).await?;
        if let Some(team_b_id) = round.team_b_id {
            self.apply_team_result(round.event_id, team_b_id, team_b_score, result_b).await?;
        }
        Ok(())
    }

    async fn apply_team_result(
        &self,
        event_id: EventId,
        team_id: TeamId,
        game_points: u32,
        result: std::cmp::Ordering,
    ) -> CoreResult<()> {
        let mut standing = self.ports.store.get_team_standing(event_id, team_id).await?;
        standing.game_points += game_points;
        match result {
            std::cmp::Ordering::Greater => {
                standing.team_wins += 1;
                standing.team_points += 2;
            }
            std::cmp::Ordering::Equal => {
                standing.team_draws += 1;
                standing.team_points += 1;
            }
            std::cmp::Ordering::Less => standing.team_losses += 1,
        }
        self.ports.store.put_team_standing(standing).await
    }

    /// Ritual-gate timeout sweep (spec §4.4: 10-minute cap per gate); the
    /// background driver in `tourney_server` polls this against every
    /// in-progress `PairingState` (`Store::list_pairing_in_progress`).
    pub async fn timed_out(&self, state: &PairingState) -> bool {
        let now = self.ports.clock.now();
        state.current_step != RitualStep::Complete && now - state.updated_at >= RITUAL_GATE_TIMEOUT
    }
}
