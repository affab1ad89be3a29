#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the Neural Terra simulation.
//!
//! This crate defines the message surface that connects adapters, the
//! authoritative simulation session, and pure systems. Adapters submit
//! [`Command`] values describing desired mutations, the session executes those
//! commands via its `apply` entry point, and then broadcasts [`Event`] values
//! describing what changed. Systems never own session state; they are handed
//! immutable snapshots and return freshly built values.

use std::{collections::BTreeMap, convert::Infallible, fmt, str::FromStr};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Global average temperature of the untouched world, in degrees Celsius.
pub const BASELINE_TEMPERATURE: f64 = 15.0;

/// Energy demand multiplier of the untouched world.
pub const BASELINE_ENERGY_DEMAND: f64 = 1.0;

/// Shipping delay of the untouched world, in percent.
pub const BASELINE_SHIPPING_DELAY: f64 = 0.0;

/// Upper bound for the shipping delay percentage.
pub const MAX_SHIPPING_DELAY: f64 = 100.0;

/// Longest run accepted by default, one year of hourly samples.
pub const DEFAULT_MAX_DURATION_HOURS: u32 = 8760;

/// Commands that express all permissible session mutations.
#[derive(Clone, Debug, PartialEq)]
pub enum Command {
    /// Runs a scenario against the session, replacing the active impact series.
    RunScenario {
        /// Structured run request describing the scenario and its targets.
        request: RunRequest,
        /// Strategy used to obtain the per-node impact series.
        source: ImpactSource,
    },
    /// Restores the physical state to its baseline and clears all alerts.
    ResetPhysicalState,
    /// Drops the active run, stops playback and rewinds the clock.
    ResetSession,
    /// Starts playback when a run is loaded and the clock has not reached the end.
    Play,
    /// Pauses playback at the current time.
    Pause,
    /// Flips between playing and paused.
    TogglePlayback,
    /// Moves the clock to the requested time, clamped to the run bounds.
    ScrubTo {
        /// Requested simulated time in hours; any real value is accepted.
        hours: f64,
    },
    /// Scrubs one hour towards the start of the run.
    StepBackward,
    /// Scrubs one hour towards the end of the run.
    StepForward,
    /// Advances playback by one simulated hour when playing.
    Tick,
}

/// Events broadcast by the session after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// Reports that a run request was malformed and nothing was mutated.
    RunRejected {
        /// Scenario the rejected request referred to.
        scenario_id: ScenarioId,
        /// Validation failure naming the offending field.
        error: ValidationError,
    },
    /// Reports that the remote impact source failed; the previous run stays active.
    RunFailed {
        /// Scenario the failed request referred to.
        scenario_id: ScenarioId,
        /// Description of the upstream failure.
        failure: UpstreamFailure,
    },
    /// Announces the physical state committed by a successful run.
    PhysicalStateChanged {
        /// Snapshot of the physical state after the transition.
        state: PhysicalState,
    },
    /// Announces an alert appended to the physical state.
    AlertRaised {
        /// Alert text as stored in the physical state.
        message: String,
    },
    /// Announces that the impact level escalated.
    ImpactLevelRaised {
        /// Level held before the transition.
        from: ImpactLevel,
        /// Level held after the transition.
        to: ImpactLevel,
    },
    /// Confirms that the active impact series was replaced wholesale.
    SeriesReplaced {
        /// Scenario that produced the new series.
        scenario_id: ScenarioId,
        /// Strategy that produced the series.
        mode: SeriesMode,
        /// Number of simulated hours covered by the series.
        duration_hours: u32,
        /// Summary statistics derived from the new series.
        kpis: Kpis,
    },
    /// Confirms that the physical state returned to its baseline.
    PhysicalStateReset,
    /// Confirms that the active run was dropped and the clock rewound.
    SessionReset,
    /// Confirms that playback started.
    PlaybackStarted {
        /// Simulated time at which playback started.
        at: f64,
    },
    /// Confirms that playback paused.
    PlaybackPaused {
        /// Simulated time at which playback paused.
        at: f64,
    },
    /// Indicates that the playback clock advanced on a tick.
    TimeAdvanced {
        /// Simulated time after the tick.
        current_time: f64,
    },
    /// Indicates that the clock was moved explicitly.
    TimeScrubbed {
        /// Time requested by the caller before clamping.
        requested: f64,
        /// Time held by the clock after clamping.
        current_time: f64,
    },
}

/// Closed set of disruption kinds understood by the scenario model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ScenarioKind {
    /// Prolonged temperature spike.
    Heatwave,
    /// Closure of a shipping canal.
    CanalClosure,
    /// Severe storm system.
    Storm,
    /// Extended water shortage.
    Drought,
}

impl ScenarioKind {
    /// Every scenario kind in declaration order.
    pub const ALL: [ScenarioKind; 4] = [
        ScenarioKind::Heatwave,
        ScenarioKind::CanalClosure,
        ScenarioKind::Storm,
        ScenarioKind::Drought,
    ];

    /// Snake-case tag used on the wire and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Heatwave => "heatwave",
            Self::CanalClosure => "canal_closure",
            Self::Storm => "storm",
            Self::Drought => "drought",
        }
    }
}

impl fmt::Display for ScenarioKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ScenarioKind {
    type Err = ValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim();
        Self::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ValidationError::UnknownScenarioKind {
                tag: tag.to_owned(),
            })
    }
}

/// Parameterised disruption applied to the simulated world.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ScenarioInput {
    /// Kind of disruption.
    #[serde(rename = "type")]
    pub kind: ScenarioKind,
    /// Free-form region identifier used in alert text.
    pub region: String,
    /// Severity in the closed range `[0, 1]`.
    pub magnitude: f64,
    /// Length of the scenario in whole hours; must be positive.
    #[serde(rename = "duration")]
    pub duration_hours: u32,
}

impl ScenarioInput {
    /// Creates a new scenario input without validating it.
    #[must_use]
    pub fn new(
        kind: ScenarioKind,
        region: impl Into<String>,
        magnitude: f64,
        duration_hours: u32,
    ) -> Self {
        Self {
            kind,
            region: region.into(),
            magnitude,
            duration_hours,
        }
    }

    /// Checks the magnitude and duration bounds.
    pub fn validate(&self) -> Result<(), ValidationError> {
        if !self.magnitude.is_finite() || !(0.0..=1.0).contains(&self.magnitude) {
            return Err(ValidationError::MagnitudeOutOfRange {
                magnitude: self.magnitude,
            });
        }
        if self.duration_hours == 0 {
            return Err(ValidationError::NonPositiveDuration {
                duration_hours: self.duration_hours,
            });
        }
        Ok(())
    }

    /// Validates the input and additionally caps the duration at `max_hours`.
    pub fn validate_within(&self, max_hours: u32) -> Result<(), ValidationError> {
        self.validate()?;
        if self.duration_hours > max_hours {
            return Err(ValidationError::DurationTooLong {
                duration_hours: self.duration_hours,
                max_hours,
            });
        }
        Ok(())
    }
}

/// Identifier attached to a scenario run.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScenarioId(String);

impl ScenarioId {
    /// Creates a scenario identifier from the provided text.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ScenarioId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Identifier of a node in the world graph.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeId(String);

impl NodeId {
    /// Creates a node identifier from the provided text.
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Borrows the identifier text.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for NodeId {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl FromStr for NodeId {
    type Err = Infallible;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Ok(Self::new(value.trim()))
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Ordered severity of the coupled physical state.
///
/// Within a session the level only ever rises; [`ImpactLevel::raise_to`] is the
/// sole escalation path and [`PhysicalState::reset`] the sole way back down.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum ImpactLevel {
    /// No notable disruption.
    #[default]
    Low,
    /// Noticeable disruption.
    Medium,
    /// Serious disruption.
    High,
    /// Severe disruption.
    Critical,
}

impl ImpactLevel {
    /// Raises the level to `level` when it is higher, returning whether it changed.
    pub fn raise_to(&mut self, level: ImpactLevel) -> bool {
        if level > *self {
            *self = level;
            true
        } else {
            false
        }
    }

    /// Lowercase tag used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

impl fmt::Display for ImpactLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Coupled physical and economic state mutated by scenario runs.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PhysicalState {
    temperature: f64,
    energy_demand: f64,
    shipping_delay: f64,
    alerts: Vec<String>,
    impact_level: ImpactLevel,
}

impl PhysicalState {
    /// Creates the baseline state of an untouched world.
    #[must_use]
    pub const fn baseline() -> Self {
        Self {
            temperature: BASELINE_TEMPERATURE,
            energy_demand: BASELINE_ENERGY_DEMAND,
            shipping_delay: BASELINE_SHIPPING_DELAY,
            alerts: Vec::new(),
            impact_level: ImpactLevel::Low,
        }
    }

    /// Global average temperature in degrees Celsius.
    #[must_use]
    pub const fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Energy demand multiplier, never below `1.0`.
    #[must_use]
    pub const fn energy_demand(&self) -> f64 {
        self.energy_demand
    }

    /// Shipping delay percentage within `[0, 100]`.
    #[must_use]
    pub const fn shipping_delay(&self) -> f64 {
        self.shipping_delay
    }

    /// Alerts in insertion order.
    #[must_use]
    pub fn alerts(&self) -> &[String] {
        &self.alerts
    }

    /// Current impact level.
    #[must_use]
    pub const fn impact_level(&self) -> ImpactLevel {
        self.impact_level
    }

    /// Temperature difference from the baseline.
    #[must_use]
    pub fn temperature_anomaly(&self) -> f64 {
        self.temperature - BASELINE_TEMPERATURE
    }

    /// Sets the temperature. No floor is applied.
    pub fn set_temperature(&mut self, value: f64) {
        self.temperature = value;
    }

    /// Sets the energy demand, flooring it at the baseline multiplier.
    pub fn set_energy_demand(&mut self, value: f64) {
        self.energy_demand = value.max(BASELINE_ENERGY_DEMAND);
    }

    /// Sets the shipping delay, clamping it to `[0, 100]`.
    pub fn set_shipping_delay(&mut self, value: f64) {
        self.shipping_delay = if value.is_nan() {
            BASELINE_SHIPPING_DELAY
        } else {
            value.clamp(0.0, MAX_SHIPPING_DELAY)
        };
    }

    /// Appends an alert after every existing one.
    pub fn push_alert(&mut self, message: impl Into<String>) {
        self.alerts.push(message.into());
    }

    /// Escalates the impact level, returning whether it changed.
    pub fn raise_impact_level(&mut self, level: ImpactLevel) -> bool {
        self.impact_level.raise_to(level)
    }

    /// Restores every field to its baseline and empties the alert list.
    pub fn reset(&mut self) {
        *self = Self::baseline();
    }
}

impl Default for PhysicalState {
    fn default() -> Self {
        Self::baseline()
    }
}

/// Category of infrastructure represented by a world node.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssetType {
    /// Shipping port or canal.
    Port,
    /// Power grid region.
    Grid,
    /// Off-world settlement.
    Colony,
    /// Off-world life-support installation.
    LifeSupport,
    /// Anything else, including unrecognised tags.
    #[serde(other)]
    Other,
}

/// Planet a world node belongs to.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Planet {
    /// The default planet.
    #[default]
    Earth,
    /// The off-world planet.
    Mars,
}

impl Planet {
    /// Lowercase tag used on the wire.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Earth => "earth",
            Self::Mars => "mars",
        }
    }
}

impl FromStr for Planet {
    type Err = ParseTagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "earth" => Ok(Self::Earth),
            "mars" => Ok(Self::Mars),
            other => Err(ParseTagError::new("planet", other)),
        }
    }
}

/// Static node of the world graph supplied by the host.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldNode {
    /// Unique node identifier.
    pub id: NodeId,
    /// Human-readable name.
    #[serde(alias = "name")]
    pub display_name: String,
    /// Latitude in degrees.
    #[serde(alias = "lat")]
    pub latitude: f64,
    /// Longitude in degrees.
    #[serde(alias = "lon")]
    pub longitude: f64,
    /// Infrastructure category.
    pub asset_type: AssetType,
    /// Planet the node sits on.
    #[serde(default)]
    pub planet: Planet,
}

/// Directed coupling between two world nodes along which shocks ripple.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct GraphEdge {
    /// Node the impact flows out of.
    pub source: NodeId,
    /// Node the impact flows into.
    pub target: NodeId,
    /// Share of the source impact passed on per hour.
    pub weight: f64,
    /// Hours before the source impact reaches the target.
    #[serde(default)]
    pub delay_hours: u32,
    /// Exponential attenuation rate applied over elapsed run time.
    #[serde(default = "default_edge_decay")]
    pub decay: f64,
}

fn default_edge_decay() -> f64 {
    0.1
}

/// Overlay layers that can be toggled by the host.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layer {
    /// Catch-all weather layer.
    Weather,
    /// Port assets.
    Ports,
    /// Grid assets.
    Grid,
    /// Alert feed.
    Alerts,
}

impl Layer {
    /// Every layer in declaration order.
    pub const ALL: [Layer; 4] = [Layer::Weather, Layer::Ports, Layer::Grid, Layer::Alerts];

    /// Lowercase tag used on the wire and on the command line.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Weather => "weather",
            Self::Ports => "ports",
            Self::Grid => "grid",
            Self::Alerts => "alerts",
        }
    }
}

impl FromStr for Layer {
    type Err = ParseTagError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let tag = value.trim();
        Self::ALL
            .into_iter()
            .find(|layer| layer.as_str().eq_ignore_ascii_case(tag))
            .ok_or_else(|| ParseTagError::new("layer", tag))
    }
}

/// Host-owned layer switches consumed read-only by the overlay projector.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(default)]
pub struct LayerToggles {
    /// Weather layer switch.
    pub weather: bool,
    /// Ports layer switch.
    pub ports: bool,
    /// Grid layer switch.
    pub grid: bool,
    /// Alerts layer switch.
    pub alerts: bool,
}

impl LayerToggles {
    /// Toggle set with every layer disabled.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            weather: false,
            ports: false,
            grid: false,
            alerts: false,
        }
    }

    /// Toggle set with only the listed layers enabled.
    #[must_use]
    pub fn only(layers: &[Layer]) -> Self {
        let mut toggles = Self::none();
        for layer in layers {
            toggles.set(*layer, true);
        }
        toggles
    }

    /// Reports whether the layer is enabled.
    #[must_use]
    pub const fn is_enabled(&self, layer: Layer) -> bool {
        match layer {
            Layer::Weather => self.weather,
            Layer::Ports => self.ports,
            Layer::Grid => self.grid,
            Layer::Alerts => self.alerts,
        }
    }

    /// Sets the layer switch.
    pub fn set(&mut self, layer: Layer, enabled: bool) {
        match layer {
            Layer::Weather => self.weather = enabled,
            Layer::Ports => self.ports = enabled,
            Layer::Grid => self.grid = enabled,
            Layer::Alerts => self.alerts = enabled,
        }
    }

    /// Flips the layer switch.
    pub fn toggle(&mut self, layer: Layer) {
        let enabled = self.is_enabled(layer);
        self.set(layer, !enabled);
    }
}

impl Default for LayerToggles {
    /// Only the weather layer starts enabled.
    fn default() -> Self {
        Self {
            weather: true,
            ..Self::none()
        }
    }
}

/// Per-node hourly impact values produced by a single run.
///
/// Every stored sequence holds exactly `duration_hours + 1` values within
/// `[0, 1]`; [`ImpactSeries::insert`] refuses anything else.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImpactSeries {
    duration_hours: u32,
    series: BTreeMap<NodeId, Vec<f64>>,
}

impl ImpactSeries {
    /// Creates an empty series covering `duration_hours` hours.
    #[must_use]
    pub fn new(duration_hours: u32) -> Self {
        Self {
            duration_hours,
            series: BTreeMap::new(),
        }
    }

    /// Number of simulated hours covered.
    #[must_use]
    pub const fn duration_hours(&self) -> u32 {
        self.duration_hours
    }

    /// Number of samples per node, hour zero included.
    #[must_use]
    pub fn horizon(&self) -> usize {
        usize::try_from(self.duration_hours)
            .unwrap_or(usize::MAX)
            .saturating_add(1)
    }

    /// Stores the values for `id`, replacing any previous sequence.
    pub fn insert(&mut self, id: NodeId, values: Vec<f64>) -> Result<(), SeriesShapeError> {
        let expected = self.horizon();
        if values.len() != expected {
            return Err(SeriesShapeError::LengthMismatch {
                id,
                expected,
                actual: values.len(),
            });
        }
        if let Some((index, value)) = values
            .iter()
            .copied()
            .enumerate()
            .find(|(_, value)| !(0.0..=1.0).contains(value))
        {
            return Err(SeriesShapeError::ValueOutOfRange { id, index, value });
        }
        let _ = self.series.insert(id, values);
        Ok(())
    }

    /// Values stored for `id`, if any.
    #[must_use]
    pub fn get(&self, id: &NodeId) -> Option<&[f64]> {
        self.series.get(id).map(Vec::as_slice)
    }

    /// Impact of `id` at simulated time `hours`; zero for unknown nodes.
    ///
    /// The time is floored to a whole hour and held at the last sample.
    #[must_use]
    pub fn value_at(&self, id: &NodeId, hours: f64) -> f64 {
        self.series
            .get(id)
            .and_then(|values| {
                sample_index(values.len(), hours).map(|index| clamp_unit(values[index]))
            })
            .unwrap_or(0.0)
    }

    /// Iterator over node sequences in identifier order.
    pub fn iter(&self) -> impl Iterator<Item = (&NodeId, &[f64])> {
        self.series.iter().map(|(id, values)| (id, values.as_slice()))
    }

    /// Number of nodes with a stored sequence.
    #[must_use]
    pub fn len(&self) -> usize {
        self.series.len()
    }

    /// Reports whether no node has a stored sequence.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.series.is_empty()
    }
}

/// Clamps a value to `[0, 1]`, mapping NaN to zero.
#[must_use]
pub fn clamp_unit(value: f64) -> f64 {
    if value.is_nan() {
        0.0
    } else {
        value.clamp(0.0, 1.0)
    }
}

fn sample_index(len: usize, hours: f64) -> Option<usize> {
    let last = len.checked_sub(1)?;
    if hours.is_nan() || hours <= 0.0 {
        return Some(0);
    }
    let floored = hours.floor();
    if floored >= last as f64 {
        Some(last)
    } else {
        Some(floored as usize)
    }
}

/// Strategy that produced an impact series.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    /// Synthesised locally from the physical state.
    LocalHeuristic,
    /// Supplied by a remote impact source.
    ServerProvided,
    /// Propagated from the targeted nodes along world graph edges.
    Ripple,
}

/// Summary statistics derived from a complete impact series.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Kpis {
    /// Largest impact observed on any port node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_trade_index_delta: Option<f64>,
    /// Largest impact observed on any grid node.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub regional_energy_stress_delta: Option<f64>,
    /// Largest impact observed on any node at any hour.
    pub peak_impact: f64,
    /// First hour at which the peak impact occurs.
    #[serde(rename = "peak_impact_time_hours")]
    pub peak_impact_hour: u32,
}

/// Structured request to run a scenario.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    /// Identifier attached to the run.
    pub scenario_id: ScenarioId,
    /// Scenario applied to the physical state.
    pub scenario: ScenarioInput,
    /// Nodes directly targeted by the disruption.
    #[serde(default)]
    pub target_ids: Vec<NodeId>,
    /// Optional ISO-8601 start timestamp forwarded to remote sources.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_timestamp: Option<String>,
}

/// Raw impact table returned by a remote impact source.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RemoteImpactTable {
    /// Identifier the remote assigned to the run, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scenario_id: Option<ScenarioId>,
    /// Raw per-node values of arbitrary sign and range.
    pub impact_series: BTreeMap<NodeId, Vec<f64>>,
    /// Number of simulated hours the remote covered.
    pub duration_hours: u32,
}

/// Where a run obtains its impact series from.
#[derive(Clone, Debug, PartialEq)]
pub enum ImpactSource {
    /// Synthesise the series from the physical state.
    Local,
    /// Use the outcome of a remote call made by the host.
    Remote(Result<RemoteImpactTable, UpstreamFailure>),
    /// Seed the targeted nodes with the scenario magnitude and spread it
    /// along the world graph edges.
    Ripple,
}

/// Complete result of a committed run.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RunResult {
    /// Identifier attached to the run.
    pub scenario_id: ScenarioId,
    /// Strategy that produced the series.
    pub mode: SeriesMode,
    /// Per-node hourly impact values.
    pub impact_series: ImpactSeries,
    /// Summary statistics derived from the series.
    pub kpis: Kpis,
    /// Number of simulated hours covered.
    pub duration_hours: u32,
}

/// Read-only snapshot of the playback clock.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct PlaybackState {
    /// Current simulated time in hours.
    pub current_time: f64,
    /// Upper bound of the clock in hours.
    pub duration_hours: u32,
    /// Whether ticks currently advance the clock.
    pub is_playing: bool,
}

/// Malformed scenario input, rejected before any mutation.
#[derive(Clone, Debug, PartialEq, Error, Serialize, Deserialize)]
pub enum ValidationError {
    /// Magnitude fell outside `[0, 1]` or was not a finite number.
    #[error("magnitude {magnitude} is outside the range [0, 1]")]
    MagnitudeOutOfRange {
        /// Offending magnitude.
        magnitude: f64,
    },
    /// Duration was not a positive number of hours.
    #[error("duration must be a positive number of hours, got {duration_hours}")]
    NonPositiveDuration {
        /// Offending duration.
        duration_hours: u32,
    },
    /// Duration exceeded the longest run the session accepts.
    #[error("duration of {duration_hours} hours exceeds the limit of {max_hours} hours")]
    DurationTooLong {
        /// Offending duration.
        duration_hours: u32,
        /// Configured ceiling.
        max_hours: u32,
    },
    /// Scenario type tag was not recognised.
    #[error("unknown scenario type `{tag}`")]
    UnknownScenarioKind {
        /// Offending tag.
        tag: String,
    },
    /// Scenario preset identifier was not recognised.
    #[error("unknown scenario preset `{id}`")]
    UnknownPreset {
        /// Offending preset identifier.
        id: String,
    },
}

impl ValidationError {
    /// Name of the input field that failed validation.
    #[must_use]
    pub const fn field(&self) -> &'static str {
        match self {
            Self::MagnitudeOutOfRange { .. } => "magnitude",
            Self::NonPositiveDuration { .. } | Self::DurationTooLong { .. } => "duration",
            Self::UnknownScenarioKind { .. } => "type",
            Self::UnknownPreset { .. } => "preset",
        }
    }
}

/// Failure of the remote impact source.
#[derive(Clone, Debug, PartialEq, Eq, Error, Serialize, Deserialize)]
pub enum UpstreamFailure {
    /// The source could not be reached or timed out.
    #[error("impact source unreachable: {reason}")]
    Unreachable {
        /// Description supplied by the host.
        reason: String,
    },
    /// The source answered with data that cannot be used.
    #[error("impact source returned malformed data: {reason}")]
    Malformed {
        /// Description of the defect.
        reason: String,
    },
}

/// Violation of the [`ImpactSeries`] shape invariant.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum SeriesShapeError {
    /// Sequence length differs from `duration_hours + 1`.
    #[error("series for `{id}` has {actual} samples, expected {expected}")]
    LengthMismatch {
        /// Node whose sequence was rejected.
        id: NodeId,
        /// Required number of samples.
        expected: usize,
        /// Supplied number of samples.
        actual: usize,
    },
    /// A sample lies outside `[0, 1]`.
    #[error("series for `{id}` holds {value} at hour {index}, outside [0, 1]")]
    ValueOutOfRange {
        /// Node whose sequence was rejected.
        id: NodeId,
        /// Hour of the offending sample.
        index: usize,
        /// Offending sample.
        value: f64,
    },
}

/// Unrecognised textual tag for a small closed enum.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("unknown {kind} `{tag}`")]
pub struct ParseTagError {
    kind: &'static str,
    tag: String,
}

impl ParseTagError {
    fn new(kind: &'static str, tag: &str) -> Self {
        Self {
            kind,
            tag: tag.to_owned(),
        }
    }

    /// Offending tag.
    #[must_use]
    pub fn tag(&self) -> &str {
        &self.tag
    }
}
