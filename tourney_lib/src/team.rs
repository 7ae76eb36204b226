use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    event::Format,
    identifiers::{EventId, GameId, PlayerId, RoundId, TeamId, TeamPairingId, TeamRoundId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamState {
    Forming,
    Ready,
    Dropped,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamRole {
    Captain,
    Player,
    Substitute,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Team {
    pub id: TeamId,
    pub event_id: EventId,
    pub name: String,
    pub captain_id: PlayerId,
    pub state: TeamState,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamMember {
    pub team_id: TeamId,
    pub player_id: PlayerId,
    pub role: TeamRole,
    pub army: Option<String>,
    pub detachment: Option<String>,
    pub list_text: Option<String>,
    pub list_approved: bool,
    pub active: bool,
}

impl Team {
    pub fn new(id: TeamId, event_id: EventId, name: String, captain_id: PlayerId) -> Self {
        Team {
            id,
            event_id,
            name,
            captain_id,
            state: TeamState::Forming,
        }
    }

    /// Recomputes `state` from its members (spec §3): `Ready` iff the count
    /// of active non-substitute members equals `format.team_size()` and
    /// all of those members' lists are approved; else `Forming`
    /// (`Dropped` is sticky and never recomputed back to `Forming`).
    pub fn recompute_state(&mut self, members: &[TeamMember], format: Format) {
        if self.state == TeamState::Dropped {
            return;
        }
        let roster: Vec<&TeamMember> = members
            .iter()
            .filter(|m| m.team_id == self.id && m.active && m.role != TeamRole::Substitute)
            .collect();
        let ready = roster.len() == format.team_size() && roster.iter().all(|m| m.list_approved);
        self.state = if ready { TeamState::Ready } else { TeamState::Forming };
    }

    pub fn drop(&mut self) {
        self.state = TeamState::Dropped;
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TeamRoundState {
    Pairing,
    Playing,
    Complete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LayoutPicker {
    TeamA,
    TeamB,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamRound {
    pub id: TeamRoundId,
    pub round_id: RoundId,
    pub event_id: EventId,
    pub team_a_id: TeamId,
    pub team_b_id: Option<TeamId>,
    pub state: TeamRoundState,
    pub team_a_score: u32,
    pub team_b_score: u32,
    pub team_a_win: Option<bool>,
    pub layout_picker: Option<LayoutPicker>,
}

impl TeamRound {
    pub fn new_pairing(
        id: TeamRoundId,
        round_id: RoundId,
        event_id: EventId,
        team_a_id: TeamId,
        team_b_id: Option<TeamId>,
    ) -> Self {
        TeamRound {
            id,
            round_id,
            event_id,
            team_a_id,
            team_b_id,
            state: TeamRoundState::Pairing,
            team_a_score: 0,
            team_b_score: 0,
            team_a_win: None,
            layout_picker: None,
        }
    }

    pub fn begin_play(&mut self) -> CoreResult<()> {
        if self.state != TeamRoundState::Pairing {
            return Err(CoreError::invalid_state("Pairing", format!("{:?}", self.state)));
        }
        self.state = TeamRoundState::Playing;
        Ok(())
    }

    pub fn complete(&mut self, team_a_score: u32, team_b_score: u32) -> CoreResult<()> {
        if self.state != TeamRoundState::Playing {
            return Err(CoreError::invalid_state("Playing", format!("{:?}", self.state)));
        }
        self.team_a_score = team_a_score;
        self.team_b_score = team_b_score;
        self.team_a_win = Some(team_a_score > team_b_score);
        self.state = TeamRoundState::Complete;
        Ok(())
    }
}

/// One sub-game within a `TeamRound` — the 2v2 roster-order auto-slots, or
/// a ritual-derived slot (spec §3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TeamPairing {
    pub id: TeamPairingId,
    pub team_round_id: TeamRoundId,
    pub slot: u32,
    pub game_id: Option<GameId>,
    pub defender_player: PlayerId,
    pub defender_team: TeamId,
    pub attacker_player: PlayerId,
    pub attacker_team: TeamId,
    pub refused_player: Option<PlayerId>,
    pub layout_number: Option<u32>,
    pub mission_code: Option<String>,
    pub layout_picker_team: Option<TeamId>,
    pub mission_picker_team: Option<TeamId>,
}

/// Auto-assigns 2v2 sub-games slot-for-slot in roster order (spec §4.3:
/// "members of each team are paired in roster order (non-substitutes
/// only) slot-for-slot; no ritual is run").
pub fn pair_2v2(
    team_round_id: TeamRoundId,
    team_a: TeamId,
    team_b: TeamId,
    roster_a: &[PlayerId],
    roster_b: &[PlayerId],
    mut id_for_slot: impl FnMut(u32) -> TeamPairingId,
) -> CoreResult<Vec<TeamPairing>> {
    if roster_a.len() != 2 || roster_b.len() != 2 {
        return Err(CoreError::BelowMinimumRoster);
    }
    Ok(roster_a
        .iter()
        .zip(roster_b.iter())
        .enumerate()
        .map(|(i, (a, b))| TeamPairing {
            id: id_for_slot(i as u32 + 1),
            team_round_id,
            slot: i as u32 + 1,
            game_id: None,
            defender_player: a.clone(),
            defender_team: team_a,
            attacker_player: b.clone(),
            attacker_team: team_b,
            refused_player: None,
            layout_number: None,
            mission_code: None,
            layout_picker_team: None,
            mission_picker_team: None,
        })
        .collect())
}
