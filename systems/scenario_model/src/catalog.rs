//! Named scenario presets that expand into fully specified run requests.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use neural_terra_core::{NodeId, RunRequest, ScenarioId, ScenarioInput, ValidationError};
use serde::Deserialize;
use thiserror::Error;

/// Builtin preset catalog embedded in the crate.
pub const BUILTIN_SCENARIO_PRESETS: &str = include_str!("data/scenario_presets.json");

/// Named, fully parameterised scenario.
#[derive(Clone, Debug, PartialEq, Deserialize)]
pub struct ScenarioPreset {
    /// Preset identifier, reused as the run's scenario id.
    pub id: String,
    /// Human-readable name.
    pub name: String,
    /// One-line description.
    #[serde(default)]
    pub description: String,
    /// Scenario applied to the physical state.
    pub scenario: ScenarioInput,
    /// Nodes directly targeted by the disruption.
    #[serde(default)]
    pub target_ids: Vec<NodeId>,
}

impl ScenarioPreset {
    /// Expands the preset into a run request.
    #[must_use]
    pub fn to_request(&self) -> RunRequest {
        RunRequest {
            scenario_id: ScenarioId::new(self.id.clone()),
            scenario: self.scenario.clone(),
            target_ids: self.target_ids.clone(),
            start_timestamp: None,
        }
    }
}

#[derive(Debug, Deserialize)]
struct PresetCatalogFile {
    presets: Vec<ScenarioPreset>,
}

/// Ordered collection of scenario presets.
#[derive(Clone, Debug, PartialEq)]
pub struct PresetCatalog {
    presets: Vec<ScenarioPreset>,
}

impl PresetCatalog {
    /// Parses the embedded catalog.
    #[must_use]
    pub fn builtin() -> Self {
        Self::from_json_str(BUILTIN_SCENARIO_PRESETS).expect("builtin scenario presets should parse")
    }

    /// Parses a catalog, rejecting duplicate ids and invalid scenarios.
    pub fn from_json_str(json: &str) -> Result<Self, PresetCatalogError> {
        let parsed: PresetCatalogFile = serde_json::from_str(json)?;
        for (index, preset) in parsed.presets.iter().enumerate() {
            if parsed.presets[..index]
                .iter()
                .any(|earlier| earlier.id == preset.id)
            {
                return Err(PresetCatalogError::DuplicateId {
                    id: preset.id.clone(),
                });
            }
            preset
                .scenario
                .validate()
                .map_err(|source| PresetCatalogError::InvalidScenario {
                    id: preset.id.clone(),
                    source,
                })?;
        }
        Ok(Self {
            presets: parsed.presets,
        })
    }

    /// Reads and parses a catalog from disk.
    pub fn from_file(path: &Path) -> Result<Self, PresetCatalogError> {
        let contents = fs::read_to_string(path).map_err(|source| PresetCatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_json_str(&contents)
    }

    /// Looks up a preset by id.
    pub fn get(&self, id: &str) -> Result<&ScenarioPreset, ValidationError> {
        self.presets
            .iter()
            .find(|preset| preset.id == id)
            .ok_or_else(|| ValidationError::UnknownPreset { id: id.to_owned() })
    }

    /// Expands the preset `id` into a run request.
    pub fn request(&self, id: &str) -> Result<RunRequest, ValidationError> {
        self.get(id).map(ScenarioPreset::to_request)
    }

    /// Iterator over presets in catalog order.
    pub fn iter(&self) -> impl Iterator<Item = &ScenarioPreset> {
        self.presets.iter()
    }

    /// Number of presets.
    #[must_use]
    pub fn len(&self) -> usize {
        self.presets.len()
    }

    /// Reports whether the catalog is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.presets.is_empty()
    }
}

impl Default for PresetCatalog {
    fn default() -> Self {
        Self::builtin()
    }
}

/// Failure to load a preset catalog.
#[derive(Debug, Error)]
pub enum PresetCatalogError {
    /// The document was not valid JSON.
    #[error("failed to parse scenario presets: {0}")]
    Parse(#[from] serde_json::Error),
    /// The document could not be read.
    #[error("failed to read scenario presets from {path:?}: {source}")]
    Read {
        /// Path that failed to load.
        path: PathBuf,
        /// Underlying IO error.
        #[source]
        source: io::Error,
    },
    /// Two presets share an id.
    #[error("duplicate scenario preset `{id}`")]
    DuplicateId {
        /// Repeated identifier.
        id: String,
    },
    /// A preset carries an out-of-range scenario.
    #[error("scenario preset `{id}` is invalid: {source}")]
    InvalidScenario {
        /// Offending preset.
        id: String,
        /// Validation failure.
        #[source]
        source: ValidationError,
    },
}
