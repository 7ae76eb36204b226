//! Process configuration (spec §6), read once at startup. Grounded on
//! squire_core's `AppStateBuilder`, which refuses to `build()` without a
//! DB address/name — generalized here to "read every required env var
//! up front, fail fast if one is missing" rather than a builder with
//! defaults, since every field spec §6 lists is mandatory for this
//! deployment.

use std::env;

#[derive(Debug, Clone)]
pub struct Config {
    pub guild_id: String,
    pub event_channel_id: String,
    pub spectator_channel_id: String,
    pub audit_channel_id: String,
    pub crew_role_id: String,
    pub captains_role_id: String,
    pub player_role_id: String,
    pub log_batch_minutes: u64,
    pub database_url: String,
}

#[derive(Debug)]
pub struct ConfigError(String);

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "configuration error: {}", self.0)
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Ok(Config {
            guild_id: required("GUILD_ID")?,
            event_channel_id: required("EVENT_CHANNEL_ID")?,
            spectator_channel_id: required("SPECTATOR_CHANNEL_ID")?,
            audit_channel_id: required("AUDIT_CHANNEL_ID")?,
            crew_role_id: required("CREW_ROLE_ID")?,
            captains_role_id: required("CAPTAINS_ROLE_ID")?,
            player_role_id: required("PLAYER_ROLE_ID")?,
            log_batch_minutes: optional("LOG_BATCH_MINUTES", 5)?,
            database_url: env::var("DATABASE_URL").unwrap_or_else(|_| "memory://".into()),
        })
    }
}

fn required(key: &str) -> Result<String, ConfigError> {
    env::var(key).map_err(|_| ConfigError(format!("missing required env var {key}")))
}

fn optional(key: &str, default: u64) -> Result<u64, ConfigError> {
    match env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|_| ConfigError(format!("{key} must be a positive integer, got {raw:?}"))),
        Err(_) => Ok(default),
    }
}
