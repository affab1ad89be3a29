//! Per-field update modes applied by scenario transitions.

use std::{
    collections::BTreeMap,
    fs, io,
    path::{Path, PathBuf},
};

use neural_terra_core::ScenarioKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Builtin rule table embedded in the crate.
pub const BUILTIN_TRANSITION_RULES: &str = include_str!("data/transition_rules.json");

/// How a scenario effect combines with the current value of a field.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UpdateMode {
    /// Field becomes baseline plus effect, discarding the current value.
    Overwrite,
    /// Effect is added onto the current value.
    Accumulate,
    /// Field becomes baseline plus effect only when that is higher.
    Raise,
}

impl UpdateMode {
    /// Combines `current` with `effect` measured from `baseline`.
    #[must_use]
    pub fn combine(self, current: f64, baseline: f64, effect: f64) -> f64 {
        match self {
            Self::Overwrite => baseline + effect,
            Self::Accumulate => current + effect,
            Self::Raise => current.max(baseline + effect),
        }
    }
}

/// Update modes of the three numeric fields for one scenario kind.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldModes {
    /// Mode applied to the temperature.
    pub temperature: UpdateMode,
    /// Mode applied to the energy demand multiplier.
    pub energy_demand: UpdateMode,
    /// Mode applied to the shipping delay.
    pub shipping_delay: UpdateMode,
}

#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct FieldModesOverride {
    temperature: Option<UpdateMode>,
    energy_demand: Option<UpdateMode>,
    shipping_delay: Option<UpdateMode>,
}

impl FieldModesOverride {
    fn apply_to(&self, modes: &mut FieldModes) {
        if let Some(mode) = self.temperature {
            modes.temperature = mode;
        }
        if let Some(mode) = self.energy_demand {
            modes.energy_demand = mode;
        }
        if let Some(mode) = self.shipping_delay {
            modes.shipping_delay = mode;
        }
    }

    fn complete(&self) -> Option<FieldModes> {
        Some(FieldModes {
            temperature: self.temperature?,
            energy_demand: self.energy_demand?,
            shipping_delay: self.shipping_delay?,
        })
    }
}

type RulesDocument = BTreeMap<ScenarioKind, FieldModesOverride>;

/// Rule table selecting an [`UpdateMode`] for every scenario kind and field.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransitionRules {
    modes: BTreeMap<ScenarioKind, FieldModes>,
}

impl TransitionRules {
    /// Parses the embedded rule table.
    #[must_use]
    pub fn builtin() -> Self {
        let document: RulesDocument = serde_json::from_str(BUILTIN_TRANSITION_RULES)
            .expect("builtin transition rules should parse");
        let modes = ScenarioKind::ALL
            .into_iter()
            .map(|kind| {
                let modes = document
                    .get(&kind)
                    .and_then(FieldModesOverride::complete)
                    .expect("builtin transition rules should cover every kind and field");
                (kind, modes)
            })
            .collect();
        Self { modes }
    }

    /// Parses a rule table, falling back to the builtin modes for missing entries.
    pub fn from_json_str(json: &str) -> Result<Self, TransitionRulesError> {
        let document: RulesDocument = serde_json::from_str(json)?;
        let mut rules = Self::builtin();
        for (kind, overrides) in &document {
            if let Some(modes) = rules.modes.get_mut(kind) {
                overrides.apply_to(modes);
            }
        }
        Ok(rules)
    }

    /// Reads and parses a rule table from disk.
    pub fn from_file(path: &Path) -> Result<Self, TransitionRulesError> {
        let contents = fs::read_to_string(path).map_err(|source| TransitionRulesError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let rules = Self::from_json_str(&contents)?;
        tracing::info!(
            target: "neural_terra::scenario",
            path = %path.display(),
            "transition_rules.loaded=file"
        );
        Ok(rules)
    }

    /// Update modes for the provided scenario kind.
    #[must_use]
    pub fn modes(&self, kind: ScenarioKind) -> FieldModes {
        self.modes
            .get(&kind)
            .copied()
            .unwrap_or_else(|| Self::builtin().modes(kind))
    }

    /// Replaces the update modes for one scenario kind.
    pub fn set_modes(&mut self, kind: ScenarioKind, modes: FieldModes) {
        let _ = self.modes.insert(kind, modes);
    }
}

impl Default for TransitionRules {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Failure to load a transition rule table.
#[derive(Debug, Error)]
pub enum TransitionRulesError {
    /// The document was not valid JSON or named an unknown kind, field or mode.
    #[error("failed to parse transition rules: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document could not be read.
    #[error("failed to read transition rules from {path:?}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
}
