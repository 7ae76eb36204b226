//! Judge-call tracking (SPEC_FULL.md supplemental item 1). The core treats
//! judge acknowledgement purely as a CAS on this row — which judges are
//! physically "available" is the voice-presence inference spec §9
//! explicitly excludes. Grounded on
//! `original_source/database.py::db_create_judge_call`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::{
    error::{CoreError, CoreResult},
    identifiers::{EventId, JudgeCallId, PlayerId},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum JudgeCallState {
    Open,
    Acknowledged,
    Resolved,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JudgeCall {
    pub id: JudgeCallId,
    pub event_id: EventId,
    pub room_number: Option<u32>,
    pub raised_by: PlayerId,
    pub state: JudgeCallState,
    pub raised_at: DateTime<Utc>,
    pub acknowledged_at: Option<DateTime<Utc>>,
    pub resolved_at: Option<DateTime<Utc>>,
}

impl JudgeCall {
    pub fn raise(
        id: JudgeCallId,
        event_id: EventId,
        room_number: Option<u32>,
        raised_by: PlayerId,
        now: DateTime<Utc>,
    ) -> Self {
        JudgeCall {
            id,
            event_id,
            room_number,
            raised_by,
            state: JudgeCallState::Open,
            raised_at: now,
            acknowledged_at: None,
            resolved_at: None,
        }
    }

    pub fn acknowledge(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.state != JudgeCallState::Open {
            return Err(CoreError::invalid_state("Open", format!("{:?}", self.state)));
        }
        self.state = JudgeCallState::Acknowledged;
        self.acknowledged_at = Some(now);
        Ok(())
    }

    pub fn resolve(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.state == JudgeCallState::Resolved {
            return Err(CoreError::invalid_state("Open or Acknowledged", "Resolved"));
        }
        self.state = JudgeCallState::Resolved;
        self.resolved_at = Some(now);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ts(secs: i64) -> DateTime<Utc> {
        DateTime::from_timestamp(secs, 0).unwrap()
    }

    #[test]
    fn lifecycle_is_ordered() {
        let mut jc = JudgeCall::raise(
            JudgeCallId::new_random(),
            EventId::new_random(),
            Some(3),
            PlayerId::from("p1"),
            ts(0),
        );
        assert!(jc.resolve(ts(1)).is_ok());
        assert!(jc.resolve(ts(2)).is_err());
    }

    #[test]
    fn acknowledge_requires_open() {
        let mut jc = JudgeCall::raise(
            JudgeCallId::new_random(),
            EventId::new_random(),
            None,
            PlayerId::from("p1"),
            ts(0),
        );
        jc.acknowledge(ts(1)).unwrap();
        assert!(jc.acknowledge(ts(2)).is_err());
    }
}
