//! Pure metric helpers over complete impact series.

use std::cmp::Ordering;

use neural_terra_core::{AssetType, ImpactSeries, NodeId};

/// Node ranked by the largest impact it reaches during a run.
#[derive(Clone, Debug, PartialEq)]
pub struct RankedImpact {
    /// Ranked node.
    pub node_id: NodeId,
    /// Largest value in the node's series.
    pub max_impact: f64,
}

/// Largest value across every series and the first hour it occurs.
///
/// Nodes are visited in identifier order, so ties resolve to the
/// lexicographically smallest id and then the earliest hour. An empty series
/// yields `(0.0, 0)`.
#[must_use]
pub fn peak(series: &ImpactSeries) -> (f64, u32) {
    let mut best = (0.0, 0);
    for (_, values) in series.iter() {
        for (hour, value) in values.iter().copied().enumerate() {
            if value > best.0 {
                best = (value, u32::try_from(hour).unwrap_or(u32::MAX));
            }
        }
    }
    best
}

/// Largest value reached by any node of `asset_type`, if any such node has a series.
pub fn max_for_asset_type<F>(
    series: &ImpactSeries,
    asset_type: AssetType,
    asset_type_of: F,
) -> Option<f64>
where
    F: Fn(&NodeId) -> Option<AssetType>,
{
    series
        .iter()
        .filter(|(id, _)| asset_type_of(id) == Some(asset_type))
        .map(|(_, values)| series_max(values))
        .reduce(f64::max)
}

/// Ranks nodes by their series maximum, highest first, ties broken by id.
#[must_use]
pub fn top_impacts(series: &ImpactSeries, limit: usize) -> Vec<RankedImpact> {
    let mut ranked: Vec<RankedImpact> = series
        .iter()
        .map(|(id, values)| RankedImpact {
            node_id: id.clone(),
            max_impact: series_max(values),
        })
        .collect();
    ranked.sort_by(|a, b| {
        b.max_impact
            .partial_cmp(&a.max_impact)
            .unwrap_or(Ordering::Equal)
            .then_with(|| a.node_id.cmp(&b.node_id))
    });
    ranked.truncate(limit);
    ranked
}

fn series_max(values: &[f64]) -> f64 {
    values.iter().copied().fold(0.0, f64::max)
}
