use neural_terra_core::{LayerToggles, Planet};
use neural_terra_system_playback::format_hours;
use neural_terra_system_scenario_model::PresetCatalog;
use neural_terra_world::{query, Session};

const TOP_IMPACT_COUNT: usize = 3;

/// Prints one line per preset in catalog order.
pub(crate) fn print_presets(catalog: &PresetCatalog) {
    for preset in catalog.iter() {
        let scenario = &preset.scenario;
        println!(
            "{:<18} {:<14} m={:.2} {:>7}  {}: {}",
            preset.id,
            scenario.kind,
            scenario.magnitude,
            format_hours(f64::from(scenario.duration_hours)),
            preset.name,
            preset.description
        );
    }
}

/// Prints the timeline position after a playback tick.
pub(crate) fn print_progress(session: &Session) {
    let clock = query::playback_state(session);
    println!(
        "t = {} / {}",
        format_hours(clock.current_time),
        format_hours(f64::from(clock.duration_hours))
    );
}

/// Prints the physical state, KPIs, top impacts and overlay of the session.
pub(crate) fn print_session(session: &Session, toggles: &LayerToggles, planet: Planet) {
    let state = query::physical_state(session);
    println!("physical state");
    println!("  temperature     {:.2} °C", state.temperature());
    println!("  energy demand   {:.3}x", state.energy_demand());
    println!("  shipping delay  {:.1}%", state.shipping_delay());
    println!("  impact level    {}", state.impact_level());
    for alert in query::alerts(session, toggles) {
        println!("  alert           {alert}");
    }

    let Some(run) = query::active_run(session) else {
        println!("no active run");
        return;
    };

    let kpis = &run.kpis;
    println!("run {} ({:?})", run.scenario_id, run.mode);
    if let Some(delta) = kpis.global_trade_index_delta {
        println!("  trade impact    {:.1}%", delta * 100.0);
    }
    if let Some(delta) = kpis.regional_energy_stress_delta {
        println!("  energy stress   {:.1}%", delta * 100.0);
    }
    println!(
        "  peak impact     {:.1}% at {}",
        kpis.peak_impact * 100.0,
        format_hours(f64::from(kpis.peak_impact_hour))
    );
    for ranked in query::top_impacts_of_active_run(session, TOP_IMPACT_COUNT) {
        println!(
            "  top             {:<14} {:.1}%",
            ranked.node_id,
            ranked.max_impact * 100.0
        );
    }

    let clock = query::playback_state(session);
    println!(
        "overlay on {} at {}",
        planet.as_str(),
        format_hours(clock.current_time)
    );
    for entry in query::overlay(session, toggles, planet) {
        if !entry.visible {
            continue;
        }
        let marker = if entry.glow { "*" } else { " " };
        println!(
            "  {marker} {:<14} {:.3}  {:?}",
            entry.node_id, entry.intensity, entry.reason
        );
    }
}
