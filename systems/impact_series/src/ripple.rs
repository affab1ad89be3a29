//! Shock propagation along weighted, delayed world graph edges.

use std::collections::HashMap;

use neural_terra_core::{clamp_unit, GraphEdge, ImpactSeries, NodeId, WorldNode};

#[derive(Clone, Copy, Debug)]
struct Inflow {
    source: usize,
    weight: f64,
    delay: usize,
    decay: f64,
}

/// Spreads `magnitude` from `targets` through `edges` over `duration_hours` hours.
///
/// Hour zero holds `magnitude` at every known target and zero elsewhere. Each
/// later hour `t` keeps the previous value and adds, per incoming edge, the
/// source impact `delay_hours` earlier scaled by `weight * exp(-decay * t)`,
/// saturating at one. Sources are read from completed hours only, so a zero
/// delay behaves like a one-hour delay and the result does not depend on node
/// order. An edge contributes nothing until its delay has elapsed.
#[must_use]
pub fn propagate(
    nodes: &[WorldNode],
    edges: &[GraphEdge],
    targets: &[NodeId],
    magnitude: f64,
    duration_hours: u32,
) -> ImpactSeries {
    let index: HashMap<&NodeId, usize> = nodes
        .iter()
        .enumerate()
        .map(|(position, node)| (&node.id, position))
        .collect();

    let mut inflows: Vec<Vec<Inflow>> = vec![Vec::new(); nodes.len()];
    for edge in edges {
        let (Some(&source), Some(&target)) = (index.get(&edge.source), index.get(&edge.target))
        else {
            continue;
        };
        inflows[target].push(Inflow {
            source,
            weight: edge.weight,
            delay: usize::try_from(edge.delay_hours).unwrap_or(usize::MAX),
            decay: edge.decay,
        });
    }

    let mut series = ImpactSeries::new(duration_hours);
    let horizon = series.horizon();
    let mut values: Vec<Vec<f64>> = vec![Vec::with_capacity(horizon); nodes.len()];
    for sequence in &mut values {
        sequence.push(0.0);
    }
    let seed = clamp_unit(magnitude);
    for id in targets {
        match index.get(id) {
            Some(&position) => values[position][0] = seed,
            None => tracing::warn!(
                target: "neural_terra::impact_series",
                node = %id,
                "ripple.unknown_target"
            ),
        }
    }

    for hour in 1..horizon {
        let elapsed = hour as f64;
        for node in 0..nodes.len() {
            let current = values[node][hour - 1];
            let inflow: f64 = inflows[node]
                .iter()
                .filter(|inflow| hour >= inflow.delay)
                .map(|inflow| {
                    let sample = (hour - inflow.delay).min(hour - 1);
                    values[inflow.source][sample]
                        * inflow.weight
                        * (-inflow.decay * elapsed).exp()
                })
                .sum();
            values[node].push(clamp_unit(current + inflow));
        }
    }

    for (node, sequence) in nodes.iter().zip(values) {
        if let Err(error) = series.insert(node.id.clone(), sequence) {
            tracing::warn!(
                target: "neural_terra::impact_series",
                node = %node.id,
                error = %error,
                "ripple.node_rejected"
            );
        }
    }
    series
}
