use neural_terra_core::{AssetType, ImpactSeries, NodeId};
use neural_terra_system_analytics::{compute_kpis, peak, top_impacts};

fn series_with(entries: &[(&str, [f64; 4])]) -> ImpactSeries {
    let mut series = ImpactSeries::new(3);
    for (id, values) in entries {
        series
            .insert(NodeId::from(*id), values.to_vec())
            .expect("valid series");
    }
    series
}

fn asset_type_of(id: &NodeId) -> Option<AssetType> {
    match id.as_str() {
        "rotterdam" | "suez_canal" => Some(AssetType::Port),
        "eu_central" => Some(AssetType::Grid),
        _ => None,
    }
}

#[test]
fn kpis_split_trade_and_energy_by_asset_type() {
    let series = series_with(&[
        ("rotterdam", [0.0, 0.1, 0.2, 0.3]),
        ("suez_canal", [0.0, 0.2, 0.4, 0.4]),
        ("eu_central", [0.0, 0.05, 0.1, 0.15]),
        ("unmapped", [0.0, 0.9, 0.1, 0.0]),
    ]);

    let kpis = compute_kpis(&series, asset_type_of);

    assert_eq!(kpis.global_trade_index_delta, Some(0.4));
    assert_eq!(kpis.regional_energy_stress_delta, Some(0.15));
    assert_eq!(kpis.peak_impact, 0.9);
    assert_eq!(kpis.peak_impact_hour, 1);
}

#[test]
fn missing_asset_types_leave_deltas_empty() {
    let series = series_with(&[("unmapped", [0.0, 0.1, 0.2, 0.3])]);
    let kpis = compute_kpis(&series, asset_type_of);

    assert_eq!(kpis.global_trade_index_delta, None);
    assert_eq!(kpis.regional_energy_stress_delta, None);
}

#[test]
fn peak_reports_first_hour_of_maximum() {
    let series = series_with(&[
        ("a", [0.0, 0.5, 0.5, 0.5]),
        ("b", [0.0, 0.0, 0.5, 0.5]),
    ]);
    assert_eq!(peak(&series), (0.5, 1));
}

#[test]
fn top_impacts_rank_descending_with_id_ties() {
    let series = series_with(&[
        ("singapore", [0.0, 0.1, 0.2, 0.3]),
        ("rotterdam", [0.0, 0.1, 0.2, 0.3]),
        ("suez_canal", [0.0, 0.2, 0.4, 0.6]),
        ("eu_central", [0.0, 0.0, 0.0, 0.1]),
    ]);

    let ranked = top_impacts(&series, 3);
    let ids: Vec<&str> = ranked.iter().map(|entry| entry.node_id.as_str()).collect();

    assert_eq!(ids, ["suez_canal", "rotterdam", "singapore"]);
    assert_eq!(ranked[0].max_impact, 0.6);
}
