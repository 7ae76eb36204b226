use std::{fmt::Display, hash::Hash, marker::PhantomData, ops::Deref, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use uuid::Uuid;

use crate::{
    event::Event,
    game::Game,
    judge_call::JudgeCall,
    registration::Registration,
    ritual::PairingState,
    round::Round,
    team::{Team, TeamPairing, TeamRound},
};

/// A generic type-checked wrapper around a Uuid, rendered as `<prefix>_<8 hex chars>`.
///
/// The prefix exists purely for human legibility in logs and notification
/// payloads; equality and hashing are on the full `Uuid`.
#[derive(Debug)]
#[repr(C)]
pub struct TypeId<T>(pub Uuid, PhantomData<T>);

/// A type-checked id for events.
pub type EventId = TypeId<Event>;
/// A type-checked id for registrations.
pub type RegistrationId = TypeId<Registration>;
/// A type-checked id for rounds.
pub type RoundId = TypeId<Round>;
/// A type-checked id for games.
pub type GameId = TypeId<Game>;
/// A type-checked id for teams.
pub type TeamId = TypeId<Team>;
/// A type-checked id for team-rounds.
pub type TeamRoundId = TypeId<TeamRound>;
/// A type-checked id for team-pairings.
pub type TeamPairingId = TypeId<TeamPairing>;
/// A type-checked id for ritual pairing state rows.
pub type PairingStateId = TypeId<PairingState>;
/// A type-checked id for judge calls.
pub type JudgeCallId = TypeId<JudgeCall>;

/// A player's identity, as handed in by the caller (the chat surface's
/// principal id — a Discord snowflake in the deployment this core was
/// distilled from). Unlike the entity ids above, the core never mints
/// these; it only ever stores and compares them.
#[derive(Debug, Clone, Hash, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub String);

impl Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for PlayerId {
    fn from(s: String) -> Self {
        PlayerId(s)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        PlayerId(s.to_owned())
    }
}

/// The short human-legible prefix used when rendering a `TypeId<T>`.
pub trait IdPrefix {
    const PREFIX: &'static str;
}

impl IdPrefix for Event {
    const PREFIX: &'static str = "evt";
}
impl IdPrefix for Registration {
    const PREFIX: &'static str = "reg";
}
impl IdPrefix for Round {
    const PREFIX: &'static str = "rnd";
}
impl IdPrefix for Game {
    const PREFIX: &'static str = "gme";
}
impl IdPrefix for Team {
    const PREFIX: &'static str = "tem";
}
impl IdPrefix for TeamRound {
    const PREFIX: &'static str = "trn";
}
impl IdPrefix for TeamPairing {
    const PREFIX: &'static str = "tpr";
}
impl IdPrefix for PairingState {
    const PREFIX: &'static str = "rit";
}
impl IdPrefix for JudgeCall {
    const PREFIX: &'static str = "jdg";
}

impl<T> TypeId<T> {
    /// Mints a fresh, random id.
    pub fn new_random() -> Self {
        Self(Uuid::new_v4(), PhantomData)
    }

    /// Wraps an existing `Uuid`.
    pub fn new(id: Uuid) -> Self {
        Self(id, PhantomData)
    }
}

impl<T> Default for TypeId<T> {
    fn default() -> Self {
        Self(Uuid::nil(), PhantomData)
    }
}

impl<T> Clone for TypeId<T> {
    fn clone(&self) -> Self {
        Self(self.0, PhantomData)
    }
}

impl<T> Copy for TypeId<T> {}

impl<T> Hash for TypeId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.0.hash(state)
    }
}

impl<T> PartialEq for TypeId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.0.eq(&other.0)
    }
}

impl<T> Eq for TypeId<T> {}

impl<T> PartialOrd for TypeId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for TypeId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.cmp(&other.0)
    }
}

impl<T> Deref for TypeId<T> {
    type Target = Uuid;
    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl<T> From<TypeId<T>> for Uuid {
    fn from(other: TypeId<T>) -> Uuid {
        other.0
    }
}

impl<T> From<Uuid> for TypeId<T> {
    fn from(other: Uuid) -> TypeId<T> {
        TypeId(other, PhantomData)
    }
}

impl<'de, T> Deserialize<'de> for TypeId<T> {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Uuid::deserialize(deserializer).map(Into::into)
    }
}

impl<T> Serialize for TypeId<T> {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<T> FromStr for TypeId<T>
where
    T: IdPrefix,
{
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // Accept either the bare uuid or the "<prefix>_<uuid>" rendering.
        let prefix = format!("{}_", T::PREFIX);
        let tail = s.strip_prefix(&prefix).unwrap_or(s);
        Uuid::from_str(tail).map(Into::into)
    }
}

impl<T> Display for TypeId<T>
where
    T: IdPrefix,
{
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Eight hex chars is enough for log legibility; full uuid is kept
        // in `self.0` for equality/storage.
        write!(f, "{}_{}", T::PREFIX, &self.0.simple().to_string()[..8])
    }
}
