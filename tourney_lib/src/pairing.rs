//! The Pairing Engine, singles and teams (spec §4.2/§4.3).
//!
//! Grounded on `squire_lib/src/swiss_pairings.rs`'s `pair` method: the
//! teacher retries up to 100 times across a `cycle_map::GroupMap`-bucketed
//! search for a pluggable pairing algorithm. This spec's rule is fully
//! deterministic (front-to-back greedy with forced-rematch fallback), so
//! the retry loop has nothing to retry against — the `pair` shape
//! (rank, pull a bye, walk the ranked pool pairing off history) is kept,
//! the bucketed multi-attempt search is dropped.
//!
//! Singles pairs `PlayerId`s and teams pair `TeamId`s off the same rank
//! vector walk (spec §4.3: "the same odd-count bye selection and
//! front-to-back rematch-avoidance algorithm apply on teams"), so the
//! whole engine is generic over the entrant id rather than duplicated.

use std::collections::HashSet;
use std::hash::Hash;

use serde::{Deserialize, Serialize};

/// An unordered previously-played pair, for rematch-avoidance lookups.
pub type HistoryKey<Id> = (Id, Id);

pub fn history_key<Id: Clone + Ord>(a: &Id, b: &Id) -> HistoryKey<Id> {
    if a <= b {
        (a.clone(), b.clone())
    } else {
        (b.clone(), a.clone())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pairing<Id> {
    pub a: Id,
    pub b: Id,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PairingResult<Id> {
    pub pairings: Vec<Pairing<Id>>,
    pub bye: Option<Id>,
}

/// A ranked pool entry: a player (or team, represented by its id) plus
/// whether they've already had a bye this event.
#[derive(Debug, Clone)]
pub struct RankedEntrant<Id> {
    pub id: Id,
    pub had_bye: bool,
}

/// `pair(ranked_players, previous_pairs) -> (pairings, bye?)` (spec §4.2,
/// §4.3 for `Id = TeamId`).
///
/// `ranked` must already be sorted by the caller per spec's ranking rule
/// (`(wins DESC, vp_diff DESC)` for singles, `(team_points DESC,
/// game_points DESC, vp_diff DESC)` for teams) — this function only
/// implements the bye-selection and front-to-back pairing walk, which is
/// rank-order-agnostic.
pub fn pair<Id: Clone + Eq + Ord + Hash>(
    ranked: &[RankedEntrant<Id>],
    previous_pairs: &HashSet<HistoryKey<Id>>,
) -> PairingResult<Id> {
    let mut pool: Vec<&RankedEntrant<Id>> = ranked.iter().collect();

    let bye = if pool.len() % 2 == 1 {
        // Lowest-ranked player whose had_bye=false; else lowest-ranked overall.
        let idx = pool
            .iter()
            .rposition(|e| !e.had_bye)
            .unwrap_or(pool.len() - 1);
        Some(pool.remove(idx).id.clone())
    } else {
        None
    };

    let mut pairings = Vec::with_capacity(pool.len() / 2);
    let mut remaining: Vec<&RankedEntrant<Id>> = pool;
    while remaining.len() >= 2 {
        let a = remaining.remove(0);
        // First subsequent player not a previous opponent; else forced rematch
        // with the very next player in rank order (spec §4.2 rule 2).
        let pick = remaining
            .iter()
            .position(|b| !previous_pairs.contains(&history_key(&a.id, &b.id)))
            .unwrap_or(0);
        let b = remaining.remove(pick);
        pairings.push(Pairing {
            a: a.id.clone(),
            b: b.id.clone(),
        });
    }

    PairingResult { pairings, bye }
}

/// Assigns room numbers in ascending order to pairings in pairing order
/// (spec §4.2). Rooms beyond the supplied list are left `None`.
pub fn assign_rooms(pairing_count: usize, rooms: &[u32]) -> Vec<Option<u32>> {
    (0..pairing_count)
        .map(|i| rooms.get(i).copied())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::identifiers::PlayerId;

    fn entrant(id: &str, had_bye: bool) -> RankedEntrant<PlayerId> {
        RankedEntrant {
            id: PlayerId::from(id),
            had_bye,
        }
    }

    #[test]
    fn swiss_no_rematch_prefers_unplayed_opponents() {
        // spec §8 scenario 2: A,B,C,D ranked; history {(A,B)}.
        let ranked = vec![
            entrant("A", false),
            entrant("B", false),
            entrant("C", false),
            entrant("D", false),
        ];
        let mut history = HashSet::new();
        history.insert(history_key(&PlayerId::from("A"), &PlayerId::from("B")));

        let result = pair(&ranked, &history);
        assert_eq!(result.bye, None);
        assert_eq!(
            result.pairings,
            vec![
                Pairing { a: PlayerId::from("A"), b: PlayerId::from("C") },
                Pairing { a: PlayerId::from("B"), b: PlayerId::from("D") },
            ]
        );
    }

    #[test]
    fn forced_rematch_when_all_remaining_are_prior_opponents() {
        let ranked = vec![entrant("A", false), entrant("B", false)];
        let mut history = HashSet::new();
        history.insert(history_key(&PlayerId::from("A"), &PlayerId::from("B")));
        let result = pair(&ranked, &history);
        assert_eq!(result.pairings.len(), 1);
        assert_eq!(result.pairings[0].a, PlayerId::from("A"));
        assert_eq!(result.pairings[0].b, PlayerId::from("B"));
    }

    #[test]
    fn odd_pool_gives_bye_to_lowest_rank_without_prior_bye() {
        let ranked = vec![
            entrant("A", false),
            entrant("B", false),
            entrant("C", true),
        ];
        let result = pair(&ranked, &HashSet::new());
        // C is lowest-ranked but already had a bye; B is next lowest without one.
        assert_eq!(result.bye, Some(PlayerId::from("B")));
        assert_eq!(result.pairings.len(), 1);
    }

    #[test]
    fn odd_pool_all_had_byes_gives_bye_to_lowest_rank() {
        let ranked = vec![
            entrant("A", true),
            entrant("B", true),
            entrant("C", true),
        ];
        let result = pair(&ranked, &HashSet::new());
        assert_eq!(result.bye, Some(PlayerId::from("C")));
    }

    #[test]
    fn rooms_assigned_in_ascending_order() {
        let rooms = assign_rooms(3, &[5, 2, 9]);
        assert_eq!(rooms, vec![Some(5), Some(2), Some(9)]);
        let short = assign_rooms(3, &[5]);
        assert_eq!(short, vec![Some(5), None, None]);
    }

    #[test]
    fn pairs_teams_by_the_same_algorithm() {
        use crate::identifiers::TeamId;
        let t: Vec<TeamId> = (0..4).map(|_| TeamId::new_random()).collect();
        let ranked = vec![
            RankedEntrant { id: t[0], had_bye: false },
            RankedEntrant { id: t[1], had_bye: false },
            RankedEntrant { id: t[2], had_bye: false },
            RankedEntrant { id: t[3], had_bye: false },
        ];
        let result = pair(&ranked, &HashSet::new());
        assert_eq!(result.bye, None);
        assert_eq!(result.pairings.len(), 2);
    }
}
