//! Process configuration.
//!
//! Layered in this order, later layers winning:
//!
//! 1. built-in defaults ([`Config::default`]);
//! 2. a JSON file, [`DEFAULT_PATH`] unless told otherwise;
//! 3. the `JASOOS_TOKEN` and `JASOOS_WORDS` environment variables.

use std::path::{Path, PathBuf};

use jasoos_room::RoomConfig;
use serde::{Deserialize, Serialize};

/// Where [`Config::load`] looks when no path is given.
pub const DEFAULT_PATH: &str = "config.json";

/// Prefix of the environment overrides.
pub const ENV_PREFIX: &str = "JASOOS_";

const DEFAULT_WORDS: &[&str] = &[
    "airport",
    "bank",
    "beach",
    "cinema",
    "embassy",
    "hospital",
    "hotel",
    "library",
    "museum",
    "restaurant",
    "school",
    "submarine",
    "supermarket",
    "theater",
    "train",
];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("word list is empty")]
    NoWords,

    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),
}

/// Everything the process needs to run.
///
/// Missing fields in the file fall back to their defaults.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Platform credentials. Unused by the in-memory platform.
    pub token: Option<String>,
    /// Secret words; one is picked per round.
    pub words: Vec<String>,
    pub room: RoomConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            token: None,
            words: DEFAULT_WORDS.iter().map(|w| w.to_string()).collect(),
            room: RoomConfig::default(),
        }
    }
}

impl Config {
    /// Loads all layers from `path` and the process environment, then
    /// validates the result.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let mut config = Self::from_file(path)?;
        config.apply_env(std::env::vars());
        let config = config.validated()?;
        tracing::info!(
            words = config.words.len(),
            token = config.token.is_some(),
            room_timeout_secs = config.room.room_timeout_secs,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Defaults overlaid with `path`.
    ///
    /// A missing file is logged and yields the defaults. An unreadable or
    /// malformed one is an error.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        match std::fs::read_to_string(path) {
            Ok(text) => serde_json::from_str(&text).map_err(|source| ConfigError::Parse {
                path: path.to_path_buf(),
                source,
            }),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::error!(path = %path.display(), "config file not found, using defaults");
                Ok(Self::default())
            }
            Err(source) => Err(ConfigError::Read {
                path: path.to_path_buf(),
                source,
            }),
        }
    }

    /// Applies `JASOOS_*` overrides from `vars`.
    ///
    /// `JASOOS_WORDS` is comma-separated; blank entries are dropped.
    pub fn apply_env(&mut self, vars: impl IntoIterator<Item = (String, String)>) {
        for (key, value) in vars {
            let Some(name) = key.strip_prefix(ENV_PREFIX) else {
                continue;
            };
            match name {
                "TOKEN" => self.token = Some(value),
                "WORDS" => {
                    self.words = value
                        .split(',')
                        .map(str::trim)
                        .filter(|w| !w.is_empty())
                        .map(String::from)
                        .collect();
                }
                _ => {}
            }
        }
    }

    /// Rejects configurations no room could run with.
    pub fn validated(self) -> Result<Self, ConfigError> {
        if self.words.is_empty() {
            return Err(ConfigError::NoWords);
        }
        let room = &self.room;
        let durations = [
            ("join.duration_secs", room.join.duration_secs),
            ("discuss.duration_secs", room.discuss.duration_secs),
            ("vote.duration_secs", room.vote.duration_secs),
            ("room_timeout_secs", room.room_timeout_secs),
        ];
        if let Some((name, _)) = durations.iter().find(|(_, secs)| *secs == 0) {
            return Err(ConfigError::ZeroDuration(*name));
        }
        if room.room_timeout() <= room.play_time() {
            tracing::warn!(
                room_timeout_secs = room.room_timeout_secs,
                play_secs = room.play_time().as_secs(),
                "room timeout is shorter than a full game"
            );
        }
        Ok(self)
    }
}
