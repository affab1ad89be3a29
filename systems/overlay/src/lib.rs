#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Decides which world nodes are drawn and how strongly at a point in time.

use neural_terra_core::{
    AssetType, ImpactSeries, Layer, LayerToggles, NodeId, PhysicalState, WorldNode,
};

/// Impact above which a node is shown regardless of layer toggles.
pub const HIGH_IMPACT_THRESHOLD: f64 = 0.1;

/// Impact above which a visible node glows.
pub const GLOW_THRESHOLD: f64 = 0.5;

/// Why a node ended up visible or hidden.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VisibilityReason {
    /// Impact exceeded [`HIGH_IMPACT_THRESHOLD`].
    HighImpact,
    /// The layer matching the node's asset type is enabled.
    LayerEnabled(Layer),
    /// Colony and life-support nodes are always drawn.
    AlwaysShown,
    /// The weather layer acts as a catch-all.
    WeatherFallback,
    /// Nothing made the node visible.
    Hidden,
}

/// Projection of one node at the requested time.
#[derive(Clone, Debug, PartialEq)]
pub struct OverlayEntry {
    /// Projected node.
    pub node_id: NodeId,
    /// Display intensity in `[0, 1]`.
    pub intensity: f64,
    /// Whether the node is drawn.
    pub visible: bool,
    /// Rule that decided visibility.
    pub reason: VisibilityReason,
    /// Whether the node should be highlighted.
    pub glow: bool,
}

/// Projects every node against the toggles and the series sampled at `hours`.
///
/// Missing series or unknown ids count as zero impact. Output follows the
/// order of `nodes`.
#[must_use]
pub fn project(
    nodes: &[WorldNode],
    toggles: &LayerToggles,
    series: Option<&ImpactSeries>,
    hours: f64,
) -> Vec<OverlayEntry> {
    nodes
        .iter()
        .map(|node| {
            let impact = series.map_or(0.0, |series| series.value_at(&node.id, hours));
            project_node(node, toggles, impact)
        })
        .collect()
}

/// Projects a single node with an already sampled impact.
#[must_use]
pub fn project_node(node: &WorldNode, toggles: &LayerToggles, impact: f64) -> OverlayEntry {
    let reason = if impact > HIGH_IMPACT_THRESHOLD {
        VisibilityReason::HighImpact
    } else {
        fallback_reason(node.asset_type, toggles)
    };
    OverlayEntry {
        node_id: node.id.clone(),
        intensity: impact,
        visible: reason != VisibilityReason::Hidden,
        reason,
        glow: impact > GLOW_THRESHOLD,
    }
}

fn fallback_reason(asset_type: AssetType, toggles: &LayerToggles) -> VisibilityReason {
    match asset_type {
        AssetType::Port if toggles.ports => VisibilityReason::LayerEnabled(Layer::Ports),
        AssetType::Grid if toggles.grid => VisibilityReason::LayerEnabled(Layer::Grid),
        AssetType::Colony | AssetType::LifeSupport => VisibilityReason::AlwaysShown,
        _ if toggles.weather => VisibilityReason::WeatherFallback,
        _ => VisibilityReason::Hidden,
    }
}

/// Alerts to display, empty unless the alerts layer is enabled.
#[must_use]
pub fn visible_alerts<'a>(state: &'a PhysicalState, toggles: &LayerToggles) -> &'a [String] {
    if toggles.is_enabled(Layer::Alerts) {
        state.alerts()
    } else {
        &[]
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use neural_terra_core::Planet;

    fn node(asset_type: AssetType) -> WorldNode {
        WorldNode {
            id: NodeId::from("node"),
            display_name: "Node".to_owned(),
            latitude: 0.0,
            longitude: 0.0,
            asset_type,
            planet: Planet::Earth,
        }
    }

    #[test]
    fn weather_toggle_catches_other_asset_types() {
        let toggles = LayerToggles::only(&[Layer::Weather]);
        let entry = project_node(&node(AssetType::Port), &toggles, 0.0);
        assert_eq!(entry.reason, VisibilityReason::WeatherFallback);
        assert!(entry.visible);
    }

    #[test]
    fn glow_requires_impact_above_half() {
        let toggles = LayerToggles::none();
        assert!(!project_node(&node(AssetType::Grid), &toggles, 0.5).glow);
        assert!(project_node(&node(AssetType::Grid), &toggles, 0.51).glow);
    }
}
