//! The Standings Aggregator (spec §4.8): pure `apply`/`reverse` functions
//! over a per-player `Standing`, plus the WTC game-point table and the NTL
//! proportional threshold for team-result classification.
//!
//! Grounded on `squire_lib/src/standard_scoring.rs`'s `ScoreCounter`
//! accumulate-per-round pattern, simplified: this spec's `Standing` has no
//! match/game-win-percentage or opponent-percentage fields, so those are
//! dropped rather than carried over unused.

use serde::{Deserialize, Serialize};

use crate::{
    game::{Outcome, WhichPlayer},
    identifiers::{EventId, PlayerId, TeamId},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Standing {
    pub event_id: EventId,
    pub player_id: PlayerId,
    pub wins: u32,
    pub losses: u32,
    pub draws: u32,
    pub vp_total: i64,
    pub vp_against: i64,
    pub vp_diff: i64,
    pub had_bye: bool,
    pub active: bool,
    pub wtc_gp: u32,
    pub team_id: Option<TeamId>,
}

impl Standing {
    /// Created on approval (spec §3: "created on approval; never deleted").
    pub fn new(event_id: EventId, player_id: PlayerId) -> Self {
        Standing {
            event_id,
            player_id,
            wins: 0,
            losses: 0,
            draws: 0,
            vp_total: 0,
            vp_against: 0,
            vp_diff: 0,
            had_bye: false,
            active: true,
            wtc_gp: 0,
            team_id: None,
        }
    }

    /// The ordering used for display (spec §4.8): `(wins DESC, vp_diff
    /// DESC, vp_total DESC)`.
    pub fn rank_key(&self) -> (std::cmp::Reverse<u32>, std::cmp::Reverse<i64>, std::cmp::Reverse<i64>) {
        (
            std::cmp::Reverse(self.wins),
            std::cmp::Reverse(self.vp_diff),
            std::cmp::Reverse(self.vp_total),
        )
    }
}

/// A game-outcome, oriented to a single standing's perspective (which side
/// of the `Outcome` this player was on). The Game Lifecycle derives one of
/// these per participant from a `Game::outcome()`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SideOutcome {
    Win { own_vp: u32, opp_vp: u32 },
    Loss { own_vp: u32, opp_vp: u32 },
    Draw { own_vp: u32, opp_vp: u32 },
    /// A round-close bye award (spec §4.6): credited as a win at the
    /// rounded average VP of the round's completed non-bye games.
    Bye { vp: u32 },
}

pub fn side_outcome_for(outcome: Outcome, side: WhichPlayer) -> SideOutcome {
    match outcome {
        Outcome::Draw { p1_vp, p2_vp } => {
            let (own_vp, opp_vp) = match side {
                WhichPlayer::P1 => (p1_vp, p2_vp),
                WhichPlayer::P2 => (p2_vp, p1_vp),
            };
            SideOutcome::Draw { own_vp, opp_vp }
        }
        Outcome::Win {
            winner,
            winner_vp,
            loser_vp,
        } => {
            if winner == side {
                SideOutcome::Win {
                    own_vp: winner_vp,
                    opp_vp: loser_vp,
                }
            } else {
                SideOutcome::Loss {
                    own_vp: loser_vp,
                    opp_vp: winner_vp,
                }
            }
        }
    }
}

/// Applies a single game's result to one side's standing (spec §4.8/§4.5).
/// Idempotence of `confirm` is the caller's job (apply exactly once per
/// confirmed game); this function itself is unconditional.
pub fn apply(standing: &mut Standing, outcome: SideOutcome) {
    match outcome {
        SideOutcome::Win { own_vp, opp_vp } => {
            standing.wins += 1;
            standing.vp_total += own_vp as i64;
            standing.vp_against += opp_vp as i64;
            standing.vp_diff += own_vp as i64 - opp_vp as i64;
        }
        SideOutcome::Loss { own_vp, opp_vp } => {
            standing.losses += 1;
            standing.vp_total += own_vp as i64;
            standing.vp_against += opp_vp as i64;
            standing.vp_diff += own_vp as i64 - opp_vp as i64;
        }
        SideOutcome::Draw { own_vp, opp_vp } => {
            standing.draws += 1;
            standing.vp_total += own_vp as i64;
            standing.vp_against += opp_vp as i64;
            // vp_diff += 0, per spec §4.5 scenario 4 — written out for clarity.
            standing.vp_diff += own_vp as i64 - opp_vp as i64;
        }
        SideOutcome::Bye { vp } => {
            standing.wins += 1;
            standing.vp_total += vp as i64;
            standing.had_bye = true;
        }
    }
}

/// The exact inverse of `apply` (spec §4.8/§8 invariant 4:
/// `apply(reverse(s, g), g) = s`, used by `adjust`'s reversal step).
pub fn reverse(standing: &mut Standing, outcome: SideOutcome) {
    match outcome {
        SideOutcome::Win { own_vp, opp_vp } => {
            standing.wins -= 1;
            standing.vp_total -= own_vp as i64;
            standing.vp_against -= opp_vp as i64;
            standing.vp_diff -= own_vp as i64 - opp_vp as i64;
        }
        SideOutcome::Loss { own_vp, opp_vp } => {
            standing.losses -= 1;
            standing.vp_total -= own_vp as i64;
            standing.vp_against -= opp_vp as i64;
            standing.vp_diff -= own_vp as i64 - opp_vp as i64;
        }
        SideOutcome::Draw { own_vp, opp_vp } => {
            standing.draws -= 1;
            standing.vp_total -= own_vp as i64;
            standing.vp_against -= opp_vp as i64;
            standing.vp_diff -= own_vp as i64 - opp_vp as i64;
        }
        SideOutcome::Bye { vp } => {
            standing.wins -= 1;
            standing.vp_total -= vp as i64;
            standing.had_bye = false;
        }
    }
}

/// Per-team aggregate (spec §3: "Team standing... additionally
/// `{team_wins, team_losses, team_draws, team_points, game_points}`").
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TeamStanding {
    pub event_id: EventId,
    pub team_id: TeamId,
    pub team_wins: u32,
    pub team_losses: u32,
    pub team_draws: u32,
    pub team_points: u32,
    pub game_points: u32,
    pub vp_diff: i64,
}

impl TeamStanding {
    pub fn new(event_id: EventId, team_id: TeamId) -> Self {
        TeamStanding {
            event_id,
            team_id,
            team_wins: 0,
            team_losses: 0,
            team_draws: 0,
            team_points: 0,
            game_points: 0,
            vp_diff: 0,
        }
    }

    /// Team ordering (spec §4.8): `(team_points DESC, game_points DESC,
    /// vp_diff DESC)`.
    pub fn rank_key(&self) -> (std::cmp::Reverse<u32>, std::cmp::Reverse<u32>, std::cmp::Reverse<i64>) {
        (
            std::cmp::Reverse(self.team_points),
            std::cmp::Reverse(self.game_points),
            std::cmp::Reverse(self.vp_diff),
        )
    }
}

/// The published WTC game-point table: `(winner_vp - loser_vp) ->
/// (winner_gp, loser_gp)`, always summing to 20 (spec §4.8). Differentials
/// beyond the table's range clamp to the most lopsided entry.
const WTC_TABLE: &[(u32, u32, u32)] = &[
    (0, 10, 10),
    (1, 11, 9),
    (21, 12, 8),
    (36, 13, 7),
    (51, 14, 6),
    (66, 15, 5),
    (86, 16, 4),
    (106, 17, 3),
    (126, 18, 2),
    (146, 19, 1),
    (166, 20, 0),
];

/// `(winner_gp, loser_gp)` for a game decided by `winner_vp - loser_vp`.
pub fn wtc_game_points(winner_vp: u32, loser_vp: u32) -> (u32, u32) {
    let diff = winner_vp.saturating_sub(loser_vp);
    let mut result = (WTC_TABLE[0].1, WTC_TABLE[0].2);
    for &(threshold, wgp, lgp) in WTC_TABLE {
        if diff >= threshold {
            result = (wgp, lgp);
        } else {
            break;
        }
    }
    result
}

/// NTL's proportional team-result threshold (spec §4.8): `win if
/// team_gp/max_gp >= 86/160`, `draw if >= 75/160`, else `loss`.
pub fn ntl_team_result(team_gp: u32, max_gp: u32) -> std::cmp::Ordering {
    if max_gp == 0 {
        return std::cmp::Ordering::Equal;
    }
    // Cross-multiply to stay in integer arithmetic.
    if team_gp * 160 >= 86 * max_gp {
        std::cmp::Ordering::Greater
    } else if team_gp * 160 >= 75 * max_gp {
        std::cmp::Ordering::Equal
    } else {
        std::cmp::Ordering::Less
    }
}

/// Team-bye walkover game points (spec §4.3): `round(80 * team_size * 20 /
/// 160)`. Written out as the literal formula rather than its simplified
/// `10 * team_size` so a future change to either constant stays obvious.
pub fn team_bye_walkover_gp(team_size: u32) -> u32 {
    ((80.0 * team_size as f64 * 20.0) / 160.0).round() as u32
}

/// The bye VP award for a round close (spec §4.6): the rounded average VP
/// across the round's completed non-bye games; `0` if none completed.
pub fn bye_vp(completed_vps: &[u32]) -> u32 {
    if completed_vps.is_empty() {
        return 0;
    }
    let sum: u64 = completed_vps.iter().map(|&v| v as u64).sum();
    let avg = sum as f64 / completed_vps.len() as f64;
    avg.round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn standing() -> Standing {
        Standing::new(EventId::new_random(), PlayerId::from("p1"))
    }

    #[test]
    fn apply_reverse_round_trip_is_identity() {
        let before = standing();
        let mut s = before.clone();
        let outcome = SideOutcome::Win { own_vp: 80, opp_vp: 60 };
        apply(&mut s, outcome);
        reverse(&mut s, outcome);
        assert_eq!(s, before);
    }

    #[test]
    fn draw_does_not_touch_wins_or_losses() {
        let mut s = standing();
        apply(&mut s, SideOutcome::Draw { own_vp: 70, opp_vp: 70 });
        assert_eq!(s.wins, 0);
        assert_eq!(s.losses, 0);
        assert_eq!(s.draws, 1);
        assert_eq!(s.vp_diff, 0);
    }

    #[test]
    fn bye_vp_rounds_average_of_completed_non_bye_games() {
        // spec §8 scenario 3: 78/55, 60/60, 82/40 -> round(62.5) = 63
        let vps = [78, 55, 60, 60, 82, 40];
        assert_eq!(bye_vp(&vps), 63);
    }

    #[test]
    fn bye_vp_is_zero_with_no_completions() {
        assert_eq!(bye_vp(&[]), 0);
    }

    #[test]
    fn wtc_table_sums_to_twenty() {
        for &(_, w, l) in WTC_TABLE {
            assert_eq!(w + l, 20);
        }
    }

    #[test]
    fn ntl_thresholds_match_spec_fractions() {
        use std::cmp::Ordering::*;
        assert_eq!(ntl_team_result(86, 160), Greater);
        assert_eq!(ntl_team_result(75, 160), Equal);
        assert_eq!(ntl_team_result(74, 160), Less);
    }

    #[test]
    fn adjust_reversal_matches_clean_apply() {
        // spec §8 scenario 6.
        let mut p1 = standing();
        let mut p2 = Standing::new(p1.event_id, PlayerId::from("p2"));
        apply(&mut p1, SideOutcome::Win { own_vp: 80, opp_vp: 60 });
        apply(&mut p2, SideOutcome::Loss { own_vp: 60, opp_vp: 80 });

        reverse(&mut p1, SideOutcome::Win { own_vp: 80, opp_vp: 60 });
        reverse(&mut p2, SideOutcome::Loss { own_vp: 60, opp_vp: 80 });

        apply(&mut p1, SideOutcome::Loss { own_vp: 65, opp_vp: 70 });
        apply(&mut p2, SideOutcome::Win { own_vp: 70, opp_vp: 65 });

        let mut clean_p1 = standing();
        let mut clean_p2 = Standing::new(clean_p1.event_id, PlayerId::from("p2"));
        apply(&mut clean_p1, SideOutcome::Loss { own_vp: 65, opp_vp: 70 });
        apply(&mut clean_p2, SideOutcome::Win { own_vp: 70, opp_vp: 65 });

        assert_eq!(p1, clean_p1);
        assert_eq!(p2, clean_p2);
    }
}
