#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Builds per-node hourly impact series from the physical state, a remote
//! table, or a shock rippling through the world graph.
//!
//! Every strategy allocates `duration + 1` samples per node, so callers bound
//! the duration before building. [`build_remote`] enforces the bound itself
//! because the remote duration arrives unvalidated.

pub mod ripple;

use std::f64::consts::FRAC_PI_2;

use neural_terra_core::{
    clamp_unit, AssetType, ImpactSeries, NodeId, PhysicalState, RemoteImpactTable, SeriesMode,
    UpstreamFailure, WorldNode, BASELINE_ENERGY_DEMAND, DEFAULT_MAX_DURATION_HOURS,
    MAX_SHIPPING_DELAY,
};

pub use ripple::propagate;

/// Pure builder that turns a physical state or remote table into an [`ImpactSeries`].
#[derive(Clone, Debug)]
pub struct ImpactSeriesBuilder {
    hotspots: Vec<WorldNode>,
    max_duration_hours: u32,
}

impl ImpactSeriesBuilder {
    /// Creates a builder whose local mode covers the provided hotspot nodes.
    #[must_use]
    pub fn new(hotspots: Vec<WorldNode>) -> Self {
        Self {
            hotspots,
            max_duration_hours: DEFAULT_MAX_DURATION_HOURS,
        }
    }

    /// Replaces the longest remote duration the builder accepts.
    #[must_use]
    pub fn with_max_duration_hours(mut self, max_duration_hours: u32) -> Self {
        self.max_duration_hours = max_duration_hours;
        self
    }

    /// Longest remote duration the builder accepts.
    #[must_use]
    pub const fn max_duration_hours(&self) -> u32 {
        self.max_duration_hours
    }

    /// Hotspot nodes synthesised in local heuristic mode.
    #[must_use]
    pub fn hotspots(&self) -> &[WorldNode] {
        &self.hotspots
    }

    /// Builds a series, preferring the remote table when one is supplied.
    pub fn build(
        &self,
        state: &PhysicalState,
        duration_hours: u32,
        remote: Option<&RemoteImpactTable>,
    ) -> Result<(SeriesMode, ImpactSeries), UpstreamFailure> {
        match remote {
            Some(table) => Ok((
                SeriesMode::ServerProvided,
                build_remote(table, self.max_duration_hours)?,
            )),
            None => Ok((
                SeriesMode::LocalHeuristic,
                build_local(state, &self.hotspots, duration_hours),
            )),
        }
    }
}

impl Default for ImpactSeriesBuilder {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

/// Terminal impact of a node of the given asset type under `state`.
#[must_use]
pub fn terminal_impact(state: &PhysicalState, asset_type: AssetType) -> f64 {
    let energy_excess = state.energy_demand() - BASELINE_ENERGY_DEMAND;
    let thermal = state.temperature_anomaly().abs() / 10.0;
    let raw = match asset_type {
        AssetType::Port => state.shipping_delay() / MAX_SHIPPING_DELAY,
        AssetType::Grid => energy_excess,
        AssetType::Colony | AssetType::LifeSupport => energy_excess.max(thermal),
        AssetType::Other => thermal,
    };
    clamp_unit(raw)
}

/// Eases from zero at hour zero to `terminal` at `duration_hours`.
///
/// A zero-hour duration yields the single sample `[0.0]`.
#[must_use]
pub fn ramp(terminal: f64, duration_hours: u32) -> Vec<f64> {
    if duration_hours == 0 {
        return vec![0.0];
    }
    let duration = f64::from(duration_hours);
    (0..=duration_hours)
        .map(|hour| clamp_unit(terminal * (FRAC_PI_2 * f64::from(hour) / duration).sin()))
        .collect()
}

/// Synthesises ramps for every hotspot from the physical state.
#[must_use]
pub fn build_local(
    state: &PhysicalState,
    hotspots: &[WorldNode],
    duration_hours: u32,
) -> ImpactSeries {
    let mut series = ImpactSeries::new(duration_hours);
    for node in hotspots {
        let terminal = terminal_impact(state, node.asset_type);
        if let Err(error) = series.insert(node.id.clone(), ramp(terminal, duration_hours)) {
            tracing::warn!(
                target: "neural_terra::impact_series",
                node = %node.id,
                error = %error,
                "impact_series.hotspot_rejected"
            );
        }
    }
    series
}

/// Normalises a remote table into a series covering its own duration.
///
/// Values are clamped independently, short sequences hold their last value,
/// long ones are truncated and empty ones become flat zero. Durations of zero
/// or above `max_duration_hours` are malformed.
pub fn build_remote(
    table: &RemoteImpactTable,
    max_duration_hours: u32,
) -> Result<ImpactSeries, UpstreamFailure> {
    if table.duration_hours == 0 {
        return Err(UpstreamFailure::Malformed {
            reason: "duration_hours must be positive".to_owned(),
        });
    }
    if table.duration_hours > max_duration_hours {
        return Err(UpstreamFailure::Malformed {
            reason: format!(
                "duration_hours {} exceeds the limit of {max_duration_hours}",
                table.duration_hours
            ),
        });
    }

    let mut series = ImpactSeries::new(table.duration_hours);
    let horizon = series.horizon();
    for (id, raw) in &table.impact_series {
        let values = normalise(id, raw, horizon)?;
        series
            .insert(id.clone(), values)
            .map_err(|error| UpstreamFailure::Malformed {
                reason: error.to_string(),
            })?;
    }
    Ok(series)
}

fn normalise(id: &NodeId, raw: &[f64], horizon: usize) -> Result<Vec<f64>, UpstreamFailure> {
    if let Some(hour) = raw.iter().position(|value| !value.is_finite()) {
        return Err(UpstreamFailure::Malformed {
            reason: format!("non-finite impact for `{id}` at hour {hour}"),
        });
    }

    let mut values: Vec<f64> = raw.iter().take(horizon).copied().map(clamp_unit).collect();
    let hold = values.last().copied().unwrap_or(0.0);
    values.resize(horizon, hold);
    Ok(values)
}
