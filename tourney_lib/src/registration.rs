use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    identifiers::{EventId, PlayerId, RegistrationId},
};

/// Waitlist tiers, named per spec §3: "Chop" maps to `Pending`, "Reserve"
/// to `Interested`, "Confirmed" to `Approved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RegistrationState {
    Interested,
    Pending,
    Approved,
    Rejected,
    Dropped,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    pub id: RegistrationId,
    pub event_id: EventId,
    pub player_id: PlayerId,
    pub username: String,
    pub army: Option<String>,
    pub detachment: Option<String>,
    pub list_text: Option<String>,
    pub state: RegistrationState,
    pub submitted_at: DateTime<Utc>,
    pub approved_at: Option<DateTime<Utc>>,
    pub dropped_at: Option<DateTime<Utc>>,
    pub rejection_reason: Option<String>,
    pub review_token: String,
}

impl Registration {
    pub fn new_interested(
        id: RegistrationId,
        event_id: EventId,
        player_id: PlayerId,
        username: String,
        now: DateTime<Utc>,
        review_token: String,
    ) -> Self {
        Registration {
            id,
            event_id,
            player_id,
            username,
            army: None,
            detachment: None,
            list_text: None,
            state: RegistrationState::Interested,
            submitted_at: now,
            approved_at: None,
            dropped_at: None,
            rejection_reason: None,
            review_token,
        }
    }

    /// `submit_list` (spec §4.1): upserts to `Pending` ("Chop"), setting the
    /// list fields. The `ListsLocked` check (event deadline/state) is the
    /// caller's (`RegistrationController`'s) job since it needs the `Event`.
    pub fn submit_list(
        &mut self,
        army: String,
        detachment: String,
        list_text: String,
        now: DateTime<Utc>,
    ) {
        self.army = Some(army);
        self.detachment = Some(detachment);
        self.list_text = Some(list_text);
        self.state = RegistrationState::Pending;
        self.submitted_at = now;
    }

    pub fn approve(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        self.require(RegistrationState::Pending)?;
        self.state = RegistrationState::Approved;
        self.approved_at = Some(now);
        Ok(())
    }

    /// `relegate` (spec §4.1): `Pending -> Interested` ("Reserve"). Does not
    /// promote anyone else.
    pub fn relegate(&mut self) -> CoreResult<()> {
        self.require(RegistrationState::Pending)?;
        self.state = RegistrationState::Interested;
        Ok(())
    }

    pub fn reject(&mut self, reason: String) -> CoreResult<()> {
        self.state = RegistrationState::Rejected;
        self.rejection_reason = Some(reason);
        Ok(())
    }

    /// `drop` (spec §4.1): any state to `Dropped`. The caller is
    /// responsible for the reserve-promotion side effect and for flipping
    /// the player's `Standing.active` when the prior state was `Approved`.
    pub fn drop(&mut self, now: DateTime<Utc>) -> RegistrationState {
        let prior = self.state;
        self.state = RegistrationState::Dropped;
        self.dropped_at = Some(now);
        prior
    }

    fn require(&self, want: RegistrationState) -> CoreResult<()> {
        if self.state != want {
            return Err(CoreError::invalid_state(
                format!("{want:?}"),
                format!("{:?}", self.state),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    fn reg(state: RegistrationState) -> Registration {
        let mut r = Registration::new_interested(
            RegistrationId::new_random(),
            EventId::new_random(),
            PlayerId::from("p1"),
            "Alice".into(),
            ts(1),
            "tok".into(),
        );
        r.state = state;
        r
    }

    #[test]
    fn approve_requires_pending() {
        let mut r = reg(RegistrationState::Interested);
        assert!(r.approve(ts(2)).is_err());
        r.state = RegistrationState::Pending;
        r.approve(ts(2)).unwrap();
        assert_eq!(r.state, RegistrationState::Approved);
    }

    #[test]
    fn relegate_does_not_touch_other_rows() {
        let mut r = reg(RegistrationState::Pending);
        r.relegate().unwrap();
        assert_eq!(r.state, RegistrationState::Interested);
    }

    #[test]
    fn drop_reports_prior_state() {
        let mut r = reg(RegistrationState::Approved);
        let prior = r.drop(ts(5));
        assert_eq!(prior, RegistrationState::Approved);
        assert_eq!(r.state, RegistrationState::Dropped);
    }
}
