//! End-to-end exercise of `RegistrationController` against a real `Store`
//! implementation (spec §8 scenario 1 and invariant 7), distinct from the
//! pure-entity unit tests already in `registration.rs`.

mod support;

use chrono::{DateTime, Utc};

use tourney_lib::{
    controllers::RegistrationController,
    event::{Event, MaxPlayers, ScoringMode},
    identifiers::{EventId, PlayerId, RegistrationId},
    registration::{Registration, RegistrationState},
};

fn ts(secs: i64) -> DateTime<Utc> {
    DateTime::from_timestamp(secs, 0).unwrap()
}

#[tokio::test]
async fn drop_promotes_oldest_reserve_and_keeps_roster_full() {
    // spec §8 scenario 1: max=8, 7 approved, 1 pending (P_X), two interested
    // (R1 at t=1, R2 at t=2). P_X drops; R1 promotes to pending, R2 stays put.
    let ports = support::ports_at(ts(100));
    let event_id = EventId::new_random();
    let mut event = Event::create(event_id, "GT".into(), MaxPlayers::Eight, ts(0), "to_alice".into(), ScoringMode::Wtc).unwrap();
    event.open_interest().unwrap();
    event.open_registration().unwrap();
    ports.store.put_event(event).await.unwrap();

    for i in 0..7 {
        let mut reg = Registration::new_interested(
            RegistrationId::new_random(),
            event_id,
            PlayerId::from(format!("approved_{i}")),
            format!("Player {i}"),
            ts(0),
            format!("tok_{i}"),
        );
        reg.state = RegistrationState::Approved;
        ports.store.put_registration(reg.clone()).await.unwrap();
        ports.store.put_standing(tourney_lib::scoring::Standing::new(event_id, reg.player_id)).await.unwrap();
    }

    let mut pending = Registration::new_interested(
        RegistrationId::new_random(),
        event_id,
        PlayerId::from("P_X"),
        "P_X".into(),
        ts(0),
        "tok_px".into(),
    );
    pending.state = RegistrationState::Pending;
    ports.store.put_registration(pending.clone()).await.unwrap();

    let r1 = Registration::new_interested(
        RegistrationId::new_random(),
        event_id,
        PlayerId::from("R1"),
        "R1".into(),
        ts(1),
        "tok_r1".into(),
    );
    let r2 = Registration::new_interested(
        RegistrationId::new_random(),
        event_id,
        PlayerId::from("R2"),
        "R2".into(),
        ts(2),
        "tok_r2".into(),
    );
    ports.store.put_registration(r1.clone()).await.unwrap();
    ports.store.put_registration(r2.clone()).await.unwrap();

    let registrations = RegistrationController::new(ports.clone());
    let (dropped, promoted) = registrations.drop(event_id, pending.id).await.unwrap();
    assert_eq!(dropped.state, RegistrationState::Dropped);

    let promoted = promoted.expect("R1 should be promoted");
    assert_eq!(promoted.id, r1.id);
    assert_eq!(promoted.state, RegistrationState::Pending);

    let r2_after = ports.store.get_registration(r2.id).await.unwrap();
    assert_eq!(r2_after.state, RegistrationState::Interested);

    let approved = ports.store.list_registrations_in_state(event_id, RegistrationState::Approved).await.unwrap();
    let pending_rows = ports.store.list_registrations_in_state(event_id, RegistrationState::Pending).await.unwrap();
    assert_eq!(approved.len() + pending_rows.len(), 8);
}

#[tokio::test]
async fn re_running_promotion_is_a_noop_without_a_new_drop() {
    let ports = support::ports_at(ts(0));
    let event_id = EventId::new_random();
    let event = Event::create(event_id, "GT".into(), MaxPlayers::Eight, ts(0), "to_alice".into(), ScoringMode::Wtc).unwrap();
    ports.store.put_event(event).await.unwrap();

    let interested = Registration::new_interested(
        RegistrationId::new_random(),
        event_id,
        PlayerId::from("R1"),
        "R1".into(),
        ts(1),
        "tok".into(),
    );
    ports.store.put_registration(interested.clone()).await.unwrap();

    let before = ports.store.get_registration(interested.id).await.unwrap();
    let again = ports.store.get_registration(interested.id).await.unwrap();
    assert_eq!(before.state, again.state);
}
