//! The Ritual Engine (spec §4.4) — the hardest subsystem here. A per-
//! `TeamRound` state machine coordinating two captains through phases of
//! secret simultaneous commits with reveals: defenders, attackers, choice,
//! then deterministic layout/mission picking and format-specific closers.
//!
//! Grounded on `squire_lib/src/operations.rs`'s op-log CAS-applied-operation
//! pattern (an operation only ever applies once against a snapshot)
//! generalized here to a two-sided write-once gate, and directly on
//! `original_source/ritual.py` for the phase table, eligibility
//! computation, layout/mission picker table, and roll-off semantics.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    event::Format,
    identifiers::{PairingStateId, PlayerId, TeamId, TeamRoundId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Side {
    A,
    B,
}

impl Side {
    pub fn other(self) -> Side {
        match self {
            Side::A => Side::B,
            Side::B => Side::A,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RitualStep {
    AwaitRolloff,
    AwaitDefenders,
    AwaitAttackers,
    AwaitChoice,
    AwaitLayout(Side),
    AwaitMission(Side),
    Complete,
}

/// One team-round's ritual cursor (spec §3: "one per TeamRound"). Every
/// `Option` field here is write-once per phase: set once by `submit_*`,
/// cleared only by an explicit `reset_phase` (spec §3: "resetting a phase
/// explicitly clears them"). Crash-safety (spec §4.4 "Recovery"): a
/// coordinator rebinding to a `TeamRound` with `state=pairing` reads this
/// struct back from the `Store` and resumes at `current_step` — every
/// field here is exactly what's needed to do that, nothing is held only
/// in the coordinator's local memory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PairingState {
    pub id: PairingStateId,
    pub team_round_id: TeamRoundId,
    pub current_phase: u32,
    pub current_step: RitualStep,
    pub rolloff_a: Option<u8>,
    pub rolloff_b: Option<u8>,
    pub rolloff_winner: Option<Side>,
    pub defender_a: Option<PlayerId>,
    pub defender_b: Option<PlayerId>,
    pub attackers_a: Option<Vec<PlayerId>>,
    pub attackers_b: Option<Vec<PlayerId>>,
    pub choice_a: Option<PlayerId>,
    pub choice_b: Option<PlayerId>,
    /// Slots still owed a layout + mission pick in the current gate run
    /// (spec §4.4: every phase derives two slots, each with its own
    /// `(layout_picker, mission_picker)` pair, and the format's closer
    /// slot runs the same gate alone). Front of the queue is the slot
    /// `current_step` is currently gating; emptied one slot at a time by
    /// `mark_mission_done`.
    pub pending_slots: Vec<u32>,
    /// Whether `pending_slots` belongs to the format's closer slot rather
    /// than a numbered phase — `submit_mission` uses this to decide
    /// whether finishing the gate starts play instead of the next phase.
    pub closing: bool,
    pub updated_at: DateTime<Utc>,
}

fn write_once<T>(slot: &mut Option<T>, value: T) -> CoreResult<()> {
    if slot.is_some() {
        return Err(CoreError::AlreadySubmitted);
    }
    *slot = Some(value);
    Ok(())
}

impl PairingState {
    pub fn new(id: PairingStateId, team_round_id: TeamRoundId, now: DateTime<Utc>) -> Self {
        PairingState {
            id,
            team_round_id,
            current_phase: 1,
            current_step: RitualStep::AwaitRolloff,
            rolloff_a: None,
            rolloff_b: None,
            rolloff_winner: None,
            defender_a: None,
            defender_b: None,
            attackers_a: None,
            attackers_b: None,
            choice_a: None,
            choice_b: None,
            pending_slots: Vec::new(),
            closing: false,
            updated_at: now,
        }
    }

    /// Roll-off commit (SPEC_FULL.md supplemental item 5): a uniform 1..6
    /// roll per side. "Re-entrant: if either captain submits twice, only
    /// the first value is kept" (spec §4.4) — so a repeat submission is a
    /// silent no-op rather than `AlreadySubmitted`, matching
    /// `original_source/ritual.py`'s `RollOffView` idempotence.
    pub fn submit_rolloff(&mut self, side: Side, value: u8, now: DateTime<Utc>) -> CoreResult<()> {
        if self.current_step != RitualStep::AwaitRolloff {
            return Err(CoreError::invalid_state("AwaitRolloff", format!("{:?}", self.current_step)));
        }
        let slot = match side {
            Side::A => &mut self.rolloff_a,
            Side::B => &mut self.rolloff_b,
        };
        if slot.is_none() {
            *slot = Some(value);
            self.updated_at = now;
        }
        self.try_resolve_rolloff();
        Ok(())
    }

    fn try_resolve_rolloff(&mut self) {
        if let (Some(a), Some(b)) = (self.rolloff_a, self.rolloff_b) {
            if a == b {
                // Ties reroll.
                self.rolloff_a = None;
                self.rolloff_b = None;
            } else {
                self.rolloff_winner = Some(if a > b { Side::A } else { Side::B });
                self.current_step = RitualStep::AwaitDefenders;
            }
        }
    }

    pub fn submit_defender(&mut self, side: Side, player: PlayerId, now: DateTime<Utc>) -> CoreResult<()> {
        self.expect_step(RitualStep::AwaitDefenders)?;
        match side {
            Side::A => write_once(&mut self.defender_a, player)?,
            Side::B => write_once(&mut self.defender_b, player)?,
        }
        self.updated_at = now;
        if self.defender_a.is_some() && self.defender_b.is_some() {
            self.current_step = RitualStep::AwaitAttackers;
        }
        Ok(())
    }

    pub fn submit_attackers(
        &mut self,
        side: Side,
        attackers: Vec<PlayerId>,
        now: DateTime<Utc>,
    ) -> CoreResult<()> {
        self.expect_step(RitualStep::AwaitAttackers)?;
        match side {
            Side::A => write_once(&mut self.attackers_a, attackers)?,
            Side::B => write_once(&mut self.attackers_b, attackers)?,
        }
        self.updated_at = now;
        if self.attackers_a.is_some() && self.attackers_b.is_some() {
            self.current_step = RitualStep::AwaitChoice;
        }
        Ok(())
    }

    pub fn submit_choice(&mut self, side: Side, choice: PlayerId, now: DateTime<Utc>) -> CoreResult<()> {
        self.expect_step(RitualStep::AwaitChoice)?;
        match side {
            Side::A => write_once(&mut self.choice_a, choice)?,
            Side::B => write_once(&mut self.choice_b, choice)?,
        }
        self.updated_at = now;
        if self.choice_a.is_some() && self.choice_b.is_some() {
            self.current_step = RitualStep::AwaitLayout(self.layout_leader());
        }
        Ok(())
    }

    /// Which side picks layout first for this phase's first slot — the
    /// picker table (spec §4.4) keys off the roll-off winner/loser, so
    /// this is only meaningful once `rolloff_winner` is set.
    fn layout_leader(&self) -> Side {
        self.rolloff_winner.unwrap_or(Side::A)
    }

    /// Explicitly clears a phase's commit fields to start the next phase
    /// (spec §3: "resetting a phase explicitly clears them").
    pub fn reset_phase(&mut self, next_phase: u32, now: DateTime<Utc>) {
        self.current_phase = next_phase;
        self.current_step = RitualStep::AwaitDefenders;
        self.defender_a = None;
        self.defender_b = None;
        self.attackers_a = None;
        self.attackers_b = None;
        self.choice_a = None;
        self.choice_b = None;
        self.pending_slots = Vec::new();
        self.closing = false;
        self.updated_at = now;
    }

    /// Starts (or restarts, for the closer slot) the layout/mission gate
    /// run over `slots`, in order. Called once choice-reveal has derived a
    /// phase's two `TeamPairing` rows, or once the closer slot's single
    /// row has been derived.
    pub fn begin_slot_gates(&mut self, format: Format, slots: Vec<u32>, closing: bool) {
        self.pending_slots = slots;
        self.closing = closing;
        self.current_step = self.layout_gate(format);
    }

    fn current_slot(&self) -> u32 {
        *self.pending_slots.first().expect("slot gate active with a pending slot")
    }

    fn layout_gate(&self, format: Format) -> RitualStep {
        let winner = self.layout_leader();
        let slot = self.current_slot();
        let (layout_picker, _) = layout_mission_pickers(format, slot, winner).unwrap_or((winner, winner.other()));
        RitualStep::AwaitLayout(layout_picker)
    }

    fn mission_gate(&self, format: Format) -> RitualStep {
        let winner = self.layout_leader();
        let slot = self.current_slot();
        let (_, mission_picker) = layout_mission_pickers(format, slot, winner).unwrap_or((winner, winner.other()));
        RitualStep::AwaitMission(mission_picker)
    }

    pub fn mark_layout_done(&mut self, format: Format) {
        if matches!(self.current_step, RitualStep::AwaitLayout(_)) {
            self.current_step = self.mission_gate(format);
        }
    }

    /// Pops the slot that just got its mission pick. If another slot is
    /// still queued, the gate restarts at that slot's own layout picker
    /// (spec §4.4: every slot of a phase, not just the first, gets an
    /// independent layout + mission pick); otherwise the phase (or closer
    /// slot) is `Complete`.
    pub fn mark_mission_done(&mut self, format: Format) {
        if !matches!(self.current_step, RitualStep::AwaitMission(_)) {
            return;
        }
        if !self.pending_slots.is_empty() {
            self.pending_slots.remove(0);
        }
        self.current_step = if self.pending_slots.is_empty() {
            RitualStep::Complete
        } else {
            self.layout_gate(format)
        };
    }

    fn expect_step(&self, want: RitualStep) -> CoreResult<()> {
        if self.current_step != want {
            return Err(CoreError::invalid_state(
                format!("{want:?}"),
                format!("{:?}", self.current_step),
            ));
        }
        Ok(())
    }
}

/// Derived slot assignments at choice-reveal (spec §4.4 "Derivations at
/// choice-reveal"). `defenders`/`attackers_a`/`attackers_b`/`choice_a`/
/// `choice_b` come straight from a completed `PairingState` phase.
pub struct SlotDerivation {
    pub slot: u32,
    pub defender: PlayerId,
    pub attacker: PlayerId,
    pub refused: Vec<PlayerId>,
}

pub fn derive_phase_slots(
    phase: u32,
    defender_a: &PlayerId,
    defender_b: &PlayerId,
    attackers_a: &[PlayerId],
    attackers_b: &[PlayerId],
    choice_a: &PlayerId,
    choice_b: &PlayerId,
) -> [SlotDerivation; 2] {
    let slot1 = 2 * (phase - 1) + 1;
    let slot2 = slot1 + 1;
    let refused_b: Vec<PlayerId> = attackers_b.iter().filter(|p| *p != choice_a).cloned().collect();
    let refused_a: Vec<PlayerId> = attackers_a.iter().filter(|p| *p != choice_b).cloned().collect();
    [
        SlotDerivation {
            slot: slot1,
            defender: defender_a.clone(),
            attacker: choice_a.clone(),
            refused: refused_b,
        },
        SlotDerivation {
            slot: slot2,
            defender: defender_b.clone(),
            attacker: choice_b.clone(),
            refused: refused_a,
        },
    ]
}

/// A side's eligible pool at a ritual step (spec §4.4 "Eligibility at a
/// step"): active non-substitute members minus everyone who has already
/// actually played (as a defender or a chosen attacker) in this
/// `TeamRound`. A refused candidate hasn't played yet, so they remain
/// eligible -- the closer slot is exactly where two refused candidates
/// end up facing each other.
pub fn eligible_pool(roster: &[PlayerId], already_assigned: &[PlayerId]) -> Vec<PlayerId> {
    roster
        .iter()
        .filter(|p| !already_assigned.contains(p))
        .cloned()
        .collect()
}

/// `min(2, |eligible_after_defender|)` (spec §4.4).
pub fn attacker_count(eligible_after_defender: usize) -> usize {
    eligible_after_defender.min(2)
}

/// `(layout_picker, mission_picker)` per slot, per the per-format table in
/// spec §4.4, given the roll-off winner side.
pub fn layout_mission_pickers(format: Format, slot: u32, winner: Side) -> Option<(Side, Side)> {
    let loser = winner.other();
    match format {
        Format::Teams3 => match slot {
            1 => Some((winner, loser)),
            2 | 3 => Some((loser, winner)),
            _ => None,
        },
        Format::Teams5 => {
            if slot % 2 == 1 {
                Some((winner, loser))
            } else {
                Some((loser, winner))
            }
        }
        Format::Teams8 => match slot {
            1 | 4 | 5 => Some((winner, loser)),
            2 | 3 | 6 | 7 => Some((loser, winner)),
            // Slot 8 (scrum): no layout pick; loser (team_b of the roll-off)
            // picks mission only (spec §4.4).
            8 => Some((loser, loser)),
            _ => None,
        },
        _ => None,
    }
}

/// The layout picker's candidate set from `event_layouts`, excluding
/// layouts already used in this `TeamRound` (spec §4.4), falling back to
/// the full list if filtering empties it. The picker (a captain, via the
/// Notifier prompt) chooses one of the returned candidates.
pub fn layout_candidates<'a>(
    event_layouts: &'a [crate::event::Layout],
    used_in_round: &[u32],
) -> Vec<&'a crate::event::Layout> {
    let filtered: Vec<&crate::event::Layout> = event_layouts
        .iter()
        .filter(|l| !used_in_round.contains(&l.number))
        .collect();
    if filtered.is_empty() {
        event_layouts.iter().collect()
    } else {
        filtered
    }
}

/// The mission picker's candidate set from `event_missions`, filtered to
/// those valid on `chosen_layout`, falling back to the full event list,
/// then to the global catalog (spec §4.4).
pub fn mission_candidates<'a>(
    event_missions: &'a [crate::event::Mission],
    chosen_layout: u32,
) -> Vec<&'a crate::event::Mission> {
    let filtered: Vec<&crate::event::Mission> = event_missions
        .iter()
        .filter(|m| m.valid_layouts.contains(&chosen_layout))
        .collect();
    if !filtered.is_empty() {
        return filtered;
    }
    if !event_missions.is_empty() {
        return event_missions.iter().collect();
    }
    crate::catalog::GLOBAL_MISSIONS
        .iter()
        .filter(|m| m.valid_layouts.contains(&chosen_layout))
        .collect()
}
