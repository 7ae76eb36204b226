//! End-to-end exercise of the Teams Pairing Engine and team-scoring
//! aggregation (spec §4.3/§4.8) against a real `Store`: team-Swiss pairing
//! into `TeamRound`s, playing every slot's game through the ordinary
//! `GameLifecycle`, and rolling WTC game points up into both sides'
//! `TeamStanding` -- distinct from `pairing.rs`/`scoring.rs`'s pure-function
//! unit tests and `ritual_walkthrough.rs`'s ritual-only coverage.

mod support;

use chrono::{DateTime, Utc};

use tourney_lib::{
    controllers::{GameLifecycle, RoundController},
    controllers_team::{RitualCoordinator, TeamController},
    event::{Event, Format, MaxPlayers, ScoringMode},
    identifiers::{EventId, PlayerId},
    team::{TeamRole, TeamRoundState},
};

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

async fn ready_2v2_team(teams: &TeamController, event_id: EventId, name: &str, p1: &str, p2: &str) -> tourney_lib::team::Team {
    let team = teams.form_team(event_id, name.into(), PlayerId::from(p1)).await.unwrap();
    teams.add_member(team.id, PlayerId::from(p2), TeamRole::Player).await.unwrap();
    for player in [p1, p2] {
        teams
            .submit_member_list(team.id, PlayerId::from(player), "Army".into(), "Detachment".into(), "list".into())
            .await
            .unwrap();
        teams.approve_member_list(team.id, PlayerId::from(player)).await.unwrap();
    }
    team
}

#[tokio::test]
async fn team_swiss_pairs_two_ready_teams_and_rolls_up_wtc_scoring() {
    let ports = support::ports_at(ts(0));
    let event_id = EventId::new_random();
    let mut event = Event::create(event_id, "Team GT".into(), MaxPlayers::Eight, ts(0), "to_alice".into(), ScoringMode::Wtc).unwrap();
    event.format = Format::TwoVTwo;
    ports.store.put_event(event).await.unwrap();

    let teams = TeamController::new(ports.clone());
    let team_a = ready_2v2_team(&teams, event_id, "Alpha", "a1", "a2").await;
    let team_b = ready_2v2_team(&teams, event_id, "Beta", "b1", "b2").await;

    // `recompute` creates a `TeamStanding` the moment a team reaches Ready.
    ports.store.get_team_standing(event_id, team_a.id).await.unwrap();
    ports.store.get_team_standing(event_id, team_b.id).await.unwrap();

    let rounds = RoundController::new(ports.clone());
    let round = rounds.start_round(event_id, chrono::Duration::hours(2), &[]).await.unwrap();

    let team_rounds = ports.store.list_team_rounds(round.id).await.unwrap();
    assert_eq!(team_rounds.len(), 1, "two ready teams pair off into exactly one TeamRound, no bye");
    let team_round = &team_rounds[0];
    assert_eq!(team_round.state, TeamRoundState::Playing, "2v2 auto-pairs straight into play, no ritual");

    let pairings = ports.store.list_team_pairings(team_round.id).await.unwrap();
    assert_eq!(pairings.len(), 2, "2v2 zips both rosters slot-for-slot");
    for p in &pairings {
        assert!(p.game_id.is_some(), "enter_play materializes a real Game per slot");
    }

    let lifecycle = GameLifecycle::new(ports.clone());
    let coordinator = RitualCoordinator::new(ports.clone());

    let slot1 = pairings.iter().find(|p| p.slot == 1).unwrap();
    let slot2 = pairings.iter().find(|p| p.slot == 2).unwrap();

    // Slot 1: defender (team A) wins 100-50, diff=50 -> WTC (13, 7).
    lifecycle.submit(slot1.game_id.unwrap(), slot1.defender_player.clone(), 100, 50).await.unwrap();
    lifecycle.confirm(slot1.game_id.unwrap()).await.unwrap();
    coordinator.confirm_team_game(team_round.id, 1).await.unwrap();

    // Slot 2: attacker (team B) wins 65-60, diff=5 -> WTC (11, 9).
    lifecycle.submit(slot2.game_id.unwrap(), slot2.attacker_player.clone(), 65, 60).await.unwrap();
    lifecycle.confirm(slot2.game_id.unwrap()).await.unwrap();
    coordinator.confirm_team_game(team_round.id, 2).await.unwrap();

    let finished_round = ports.store.get_team_round(team_round.id).await.unwrap();
    assert_eq!(finished_round.state, TeamRoundState::Complete, "both slots' games confirmed");
    assert_eq!(finished_round.team_a_score, 22, "13 (slot 1 defender) + 9 (slot 2 defender)");
    assert_eq!(finished_round.team_b_score, 18, "7 (slot 1 attacker) + 11 (slot 2 attacker)");
    assert_eq!(finished_round.team_a_win, Some(true));

    let standing_a = ports.store.get_team_standing(event_id, team_a.id).await.unwrap();
    assert_eq!(standing_a.team_wins, 1);
    assert_eq!(standing_a.team_points, 2);
    assert_eq!(standing_a.game_points, 22);

    let standing_b = ports.store.get_team_standing(event_id, team_b.id).await.unwrap();
    assert_eq!(standing_b.team_losses, 1);
    assert_eq!(standing_b.team_points, 0);
    assert_eq!(standing_b.game_points, 18);

    let a1_standing = ports.store.get_standing(event_id, "a1").await.unwrap();
    assert_eq!(a1_standing.wtc_gp, 13, "defender's wtc_gp accumulates from slot 1");
    let b2_standing = ports.store.get_standing(event_id, "b2").await.unwrap();
    assert_eq!(b2_standing.wtc_gp, 11, "attacker's wtc_gp accumulates from slot 2");
}

#[tokio::test]
async fn odd_team_count_awards_a_walkover_bye() {
    let ports = support::ports_at(ts(0));
    let event_id = EventId::new_random();
    let mut event = Event::create(event_id, "Team GT".into(), MaxPlayers::Eight, ts(0), "to_alice".into(), ScoringMode::Wtc).unwrap();
    event.format = Format::TwoVTwo;
    ports.store.put_event(event).await.unwrap();

    let teams = TeamController::new(ports.clone());
    let team_a = ready_2v2_team(&teams, event_id, "Alpha", "a1", "a2").await;
    let team_b = ready_2v2_team(&teams, event_id, "Beta", "b1", "b2").await;
    let team_c = ready_2v2_team(&teams, event_id, "Gamma", "c1", "c2").await;

    let rounds = RoundController::new(ports.clone());
    let round = rounds.start_round(event_id, chrono::Duration::hours(2), &[]).await.unwrap();

    let team_rounds = ports.store.list_team_rounds(round.id).await.unwrap();
    assert_eq!(team_rounds.len(), 1, "three teams: one pairing, one bye");

    let paired_ids = [team_rounds[0].team_a_id, team_rounds[0].team_b_id.unwrap()];
    let bye_team = [team_a.id, team_b.id, team_c.id]
        .into_iter()
        .find(|id| !paired_ids.contains(id))
        .expect("exactly one team sits out");

    let bye_standing = ports.store.get_team_standing(event_id, bye_team).await.unwrap();
    assert_eq!(bye_standing.team_wins, 1);
    assert_eq!(bye_standing.team_points, 2);
    assert_eq!(bye_standing.game_points, 20, "round(80 * 2 * 20 / 160) = 20 for team_size=2");
}
