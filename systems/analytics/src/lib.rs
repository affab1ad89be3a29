#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic analytics that summarise a complete impact series.

pub mod metrics;

use neural_terra_core::{AssetType, ImpactSeries, Kpis, NodeId};

pub use metrics::{max_for_asset_type, peak, top_impacts, RankedImpact};

/// Derives the KPI block for a complete series.
///
/// `asset_type_of` resolves node ids against the world graph. Ids it does not
/// know only contribute to the peak.
pub fn compute_kpis<F>(series: &ImpactSeries, asset_type_of: F) -> Kpis
where
    F: Fn(&NodeId) -> Option<AssetType>,
{
    let (peak_impact, peak_impact_hour) = peak(series);
    Kpis {
        global_trade_index_delta: max_for_asset_type(series, AssetType::Port, &asset_type_of),
        regional_energy_stress_delta: max_for_asset_type(series, AssetType::Grid, &asset_type_of),
        peak_impact,
        peak_impact_hour,
    }
}
