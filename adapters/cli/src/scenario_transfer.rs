#![allow(clippy::missing_errors_doc)]

use std::{error::Error, fmt};

use base64::{engine::general_purpose::STANDARD_NO_PAD, Engine as _};
use neural_terra_core::{
    NodeId, RunRequest, ScenarioId, ScenarioInput, ScenarioKind, ValidationError,
};
use serde::{Deserialize, Serialize};

const SHARE_DOMAIN: &str = "terra";
const SHARE_VERSION: &str = "v1";

/// Identifier prefix emitted before the scenario kind and payload.
pub(crate) const SHARE_HEADER: &str = "terra:v1";
/// Delimiter used to separate the prefix, scenario kind and payload.
const FIELD_DELIMITER: char = ':';

/// Scenario parameters exchanged as a single-line share string.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct ScenarioShare {
    /// Scenario carried by the share string.
    pub(crate) scenario: ScenarioInput,
    /// Nodes directly targeted by the scenario.
    pub(crate) target_ids: Vec<NodeId>,
}

impl ScenarioShare {
    /// Encodes the scenario into a single-line string suitable for pasting.
    #[must_use]
    pub(crate) fn encode(&self) -> String {
        let payload = SerializableShare {
            region: self.scenario.region.clone(),
            magnitude: self.scenario.magnitude,
            duration_hours: self.scenario.duration_hours,
            target_ids: self.target_ids.clone(),
        };
        let json = serde_json::to_vec(&payload).expect("scenario share serialization never fails");
        let encoded = STANDARD_NO_PAD.encode(json);
        format!("{SHARE_HEADER}:{}:{encoded}", self.scenario.kind)
    }

    /// Decodes and validates a scenario from its share string.
    pub(crate) fn decode(value: &str) -> Result<Self, ScenarioTransferError> {
        let trimmed = value.trim();
        if trimmed.is_empty() {
            return Err(ScenarioTransferError::EmptyPayload);
        }

        let mut parts = trimmed.split(FIELD_DELIMITER);
        let domain = parts.next().ok_or(ScenarioTransferError::MissingPrefix)?;
        let version = parts.next().ok_or(ScenarioTransferError::MissingVersion)?;
        let kind = parts.next().ok_or(ScenarioTransferError::MissingKind)?;
        let payload = parts.next().ok_or(ScenarioTransferError::MissingPayload)?;

        if domain != SHARE_DOMAIN {
            return Err(ScenarioTransferError::InvalidPrefix(domain.to_owned()));
        }
        if version != SHARE_VERSION {
            return Err(ScenarioTransferError::UnsupportedVersion(version.to_owned()));
        }

        let kind: ScenarioKind = kind.parse().map_err(ScenarioTransferError::InvalidScenario)?;
        let bytes = STANDARD_NO_PAD
            .decode(payload.as_bytes())
            .map_err(ScenarioTransferError::InvalidEncoding)?;
        let decoded: SerializableShare =
            serde_json::from_slice(&bytes).map_err(ScenarioTransferError::InvalidPayload)?;

        let scenario = ScenarioInput::new(
            kind,
            decoded.region,
            decoded.magnitude,
            decoded.duration_hours,
        );
        scenario
            .validate()
            .map_err(ScenarioTransferError::InvalidScenario)?;

        Ok(Self {
            scenario,
            target_ids: decoded.target_ids,
        })
    }

    /// Expands the shared scenario into a run request.
    #[must_use]
    pub(crate) fn into_request(self) -> RunRequest {
        RunRequest {
            scenario_id: ScenarioId::new(format!("shared_{}", self.scenario.kind)),
            scenario: self.scenario,
            target_ids: self.target_ids,
            start_timestamp: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
struct SerializableShare {
    region: String,
    magnitude: f64,
    duration_hours: u32,
    #[serde(default)]
    target_ids: Vec<NodeId>,
}

/// Errors that can occur while decoding scenario share strings.
#[derive(Debug)]
pub(crate) enum ScenarioTransferError {
    /// The provided string was empty or contained only whitespace.
    EmptyPayload,
    /// The prefix segment was missing from the share string.
    MissingPrefix,
    /// The share string did not contain a version segment.
    MissingVersion,
    /// The share string did not include the scenario kind.
    MissingKind,
    /// The share string did not include the payload segment.
    MissingPayload,
    /// The share string used an unexpected prefix segment.
    InvalidPrefix(String),
    /// The share string used an unsupported version identifier.
    UnsupportedVersion(String),
    /// The base64 payload could not be decoded.
    InvalidEncoding(base64::DecodeError),
    /// The decoded payload could not be deserialised.
    InvalidPayload(serde_json::Error),
    /// The kind or parameters failed scenario validation.
    InvalidScenario(ValidationError),
}

impl fmt::Display for ScenarioTransferError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyPayload => write!(f, "share string was empty"),
            Self::MissingPrefix => write!(f, "share string is missing the prefix"),
            Self::MissingVersion => write!(f, "share string is missing the version"),
            Self::MissingKind => write!(f, "share string is missing the scenario type"),
            Self::MissingPayload => write!(f, "share string is missing the payload"),
            Self::InvalidPrefix(prefix) => write!(f, "share prefix '{prefix}' is not supported"),
            Self::UnsupportedVersion(version) => {
                write!(f, "share version '{version}' is not supported")
            }
            Self::InvalidEncoding(error) => {
                write!(f, "could not decode share payload: {error}")
            }
            Self::InvalidPayload(error) => {
                write!(f, "could not parse share payload: {error}")
            }
            Self::InvalidScenario(error) => {
                write!(f, "shared scenario is invalid ({}): {error}", error.field())
            }
        }
    }
}

impl Error for ScenarioTransferError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::InvalidEncoding(error) => Some(error),
            Self::InvalidPayload(error) => Some(error),
            Self::InvalidScenario(error) => Some(error),
            _ => None,
        }
    }
}
