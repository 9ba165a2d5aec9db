use std::net::SocketAddr;
use std::str::FromStr;
use std::time::Duration;

use shared::constants::{DEFAULT_BANKRUPT_RESET_MS, DEFAULT_STAKE};
use shared::{Color, GameSettings};
use thiserror::Error;

const DEFAULT_BIND_ADDR: &str = "127.0.0.1:3000";
const DEFAULT_SESSION_IDLE_SECS: u64 = 1800;

#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("{key} has invalid value `{value}`")]
    Invalid { key: &'static str, value: String },
    #[error("{key} must list at least one color")]
    EmptyColorList { key: &'static str },
}

#[derive(Debug, Clone)]
pub struct ServerSettings {
    pub bind_addr: SocketAddr,
    pub game: GameSettings,
    pub default_stake: u64,
    pub bankrupt_reset: Duration,
    /// Tables untouched for this long are dropped when new ones are opened.
    pub session_idle: Duration,
    pub rng_seed: Option<u64>,
}

impl ServerSettings {
    /// Reads `ROULETTE_*` variables from the process environment.
    pub fn from_env() -> Result<Self, SettingsError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, SettingsError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = GameSettings::default();

        let default_color = match lookup("ROULETTE_DEFAULT_COLOR") {
            Some(value) if value.trim().eq_ignore_ascii_case("none") => None,
            Some(value) => Some(parse_color("ROULETTE_DEFAULT_COLOR", &value)?),
            None => defaults.default_color.clone(),
        };

        let game = GameSettings {
            initial_balance: parse_or(&lookup, "ROULETTE_INITIAL_BALANCE", defaults.initial_balance)?,
            segment_count: parse_or(&lookup, "ROULETTE_SEGMENT_COUNT", defaults.segment_count)?,
            segment_colors: match lookup("ROULETTE_SEGMENT_COLORS") {
                Some(value) => parse_colors("ROULETTE_SEGMENT_COLORS", &value)?,
                None => defaults.segment_colors.clone(),
            },
            segment_map: lookup("ROULETTE_SEGMENT_MAP")
                .map(|value| parse_colors("ROULETTE_SEGMENT_MAP", &value))
                .transpose()?,
            extra_rotations: parse_or(&lookup, "ROULETTE_EXTRA_ROTATIONS", defaults.extra_rotations)?,
            spin_duration_ms: parse_or(&lookup, "ROULETTE_SPIN_DURATION_MS", defaults.spin_duration_ms)?,
            default_color,
        };

        Ok(Self {
            bind_addr: parse_value(
                "ROULETTE_BIND_ADDR",
                &lookup("ROULETTE_BIND_ADDR").unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
            )?,
            game,
            default_stake: parse_or(&lookup, "ROULETTE_DEFAULT_STAKE", DEFAULT_STAKE)?,
            bankrupt_reset: Duration::from_millis(parse_or(
                &lookup,
                "ROULETTE_BANKRUPT_RESET_MS",
                DEFAULT_BANKRUPT_RESET_MS,
            )?),
            session_idle: Duration::from_secs(parse_or(
                &lookup,
                "ROULETTE_SESSION_IDLE_SECS",
                DEFAULT_SESSION_IDLE_SECS,
            )?),
            rng_seed: lookup("ROULETTE_RNG_SEED")
                .map(|value| parse_value("ROULETTE_RNG_SEED", &value))
                .transpose()?,
        })
    }
}

fn parse_value<T: FromStr>(key: &'static str, value: &str) -> Result<T, SettingsError> {
    value.trim().parse::<T>().map_err(|_| SettingsError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_or<F, T>(lookup: &F, key: &'static str, default: T) -> Result<T, SettingsError>
where
    F: Fn(&str) -> Option<String>,
    T: FromStr,
{
    match lookup(key) {
        Some(value) => parse_value(key, &value),
        None => Ok(default),
    }
}

fn parse_color(key: &'static str, value: &str) -> Result<Color, SettingsError> {
    Color::new(value).map_err(|_| SettingsError::Invalid {
        key,
        value: value.to_string(),
    })
}

fn parse_colors(key: &'static str, value: &str) -> Result<Vec<Color>, SettingsError> {
    if value.trim().is_empty() {
        return Err(SettingsError::EmptyColorList { key });
    }
    value.split(',').map(|name| parse_color(key, name)).collect()
}
