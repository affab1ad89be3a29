//! Session configuration loaded from TOML.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use neural_terra_core::{NodeId, DEFAULT_MAX_DURATION_HOURS};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Timeline length used before any run is loaded.
pub const DEFAULT_DURATION_HOURS: u32 = 168;

/// Wall-clock milliseconds between playback ticks at normal speed.
pub const DEFAULT_TICK_INTERVAL_MS: u64 = 200;

const DEFAULT_HOTSPOTS: [&str; 7] = [
    "suez_canal",
    "rotterdam",
    "los_angeles",
    "singapore",
    "eu_central",
    "us_east",
    "us_west",
];

/// Tunables for a simulation session.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SessionConfig {
    /// Timeline length used before any run and after a session reset.
    pub default_duration_hours: u32,
    /// Longest run, local or remote, the session accepts.
    pub max_duration_hours: u32,
    /// Whether a successful run starts playback immediately.
    pub autoplay_on_run: bool,
    /// Wall-clock milliseconds between ticks at normal speed.
    pub tick_interval_ms: u64,
    /// Node ids synthesised in local heuristic mode.
    pub hotspots: Vec<NodeId>,
    /// Optional transition rule table replacing the builtin one.
    pub rules_path: Option<PathBuf>,
    /// Optional world graph replacing the builtin one.
    pub world_graph_path: Option<PathBuf>,
}

impl SessionConfig {
    /// Parses a TOML document; missing keys take their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self, SessionConfigError> {
        let config = toml::from_str(contents)?;
        Ok(config)
    }

    /// Reads a TOML document, resolving relative paths against its directory.
    pub fn from_file(path: &Path) -> Result<Self, SessionConfigError> {
        let contents = fs::read_to_string(path).map_err(|source| SessionConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&contents)?;
        if let Some(base) = path.parent() {
            config.rules_path = config.rules_path.map(|relative| base.join(relative));
            config.world_graph_path = config.world_graph_path.map(|relative| base.join(relative));
        }
        Ok(config)
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            default_duration_hours: DEFAULT_DURATION_HOURS,
            max_duration_hours: DEFAULT_MAX_DURATION_HOURS,
            autoplay_on_run: true,
            tick_interval_ms: DEFAULT_TICK_INTERVAL_MS,
            hotspots: DEFAULT_HOTSPOTS.into_iter().map(NodeId::from).collect(),
            rules_path: None,
            world_graph_path: None,
        }
    }
}

/// Failure to load a session configuration.
#[derive(Debug, Error)]
pub enum SessionConfigError {
    /// The document was not valid TOML or carried unknown keys.
    #[error("failed to parse session config: {0}")]
    Parse(#[from] toml::de::Error),
    /// The document could not be read.
    #[error("failed to read session config from {path:?}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
