use std::collections::BTreeMap;

use neural_terra_core::{
    Command, Event, ImpactLevel, ImpactSource, Layer, LayerToggles, NodeId, Planet,
    RemoteImpactTable, RunRequest, ScenarioId, ScenarioInput, ScenarioKind, SeriesMode,
    UpstreamFailure, ValidationError,
};
use neural_terra_world::{self as world, query, Session, SessionConfig, WorldGraph};
use neural_terra_system_scenario_model::TransitionRules;

fn request(kind: ScenarioKind, region: &str, magnitude: f64, duration_hours: u32) -> RunRequest {
    RunRequest {
        scenario_id: ScenarioId::new(format!("{kind}_{region}")),
        scenario: ScenarioInput::new(kind, region, magnitude, duration_hours),
        target_ids: vec![NodeId::from(region)],
        start_timestamp: None,
    }
}

fn run(session: &mut Session, request: RunRequest, source: ImpactSource) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(session, Command::RunScenario { request, source }, &mut events);
    events
}

fn send(session: &mut Session, command: Command) -> Vec<Event> {
    let mut events = Vec::new();
    world::apply(session, command, &mut events);
    events
}

fn manual_session() -> Session {
    let config = SessionConfig {
        autoplay_on_run: false,
        ..SessionConfig::default()
    };
    Session::with_parts(config, WorldGraph::builtin(), TransitionRules::builtin())
}

#[test]
fn suez_run_commits_state_series_and_kpis() {
    let mut session = Session::new();
    let events = run(
        &mut session,
        request(ScenarioKind::CanalClosure, "suez_canal", 0.4, 168),
        ImpactSource::Local,
    );

    let state = query::physical_state(&session);
    assert!((state.shipping_delay() - 16.0).abs() < 1e-9);
    assert!((state.energy_demand() - 1.06).abs() < 1e-9);
    assert!((state.temperature() - 15.12).abs() < 1e-9);
    assert_eq!(state.impact_level(), ImpactLevel::Low);

    let active = query::active_run(&session).expect("run is active");
    assert_eq!(active.mode, SeriesMode::LocalHeuristic);
    assert_eq!(active.duration_hours, 168);
    let suez = active
        .impact_series
        .get(&NodeId::from("suez_canal"))
        .expect("hotspot series");
    assert_eq!(suez.len(), 169);
    assert_eq!(active.kpis.global_trade_index_delta, Some(suez[168]));
    assert_eq!(active.kpis.peak_impact_hour, 168);

    assert!(matches!(events[0], Event::PhysicalStateChanged { .. }));
    assert!(events
        .iter()
        .any(|event| matches!(event, Event::SeriesReplaced { duration_hours: 168, .. })));
    assert_eq!(
        events.last(),
        Some(&Event::PlaybackStarted { at: 0.0 }),
        "runs autoplay by default"
    );
}

#[test]
fn severe_storm_reports_alert_and_level() {
    let mut session = Session::new();
    let events = run(
        &mut session,
        request(ScenarioKind::Storm, "atlantic", 0.9, 24),
        ImpactSource::Local,
    );

    assert!(events.contains(&Event::ImpactLevelRaised {
        from: ImpactLevel::Low,
        to: ImpactLevel::Critical,
    }));
    assert!(events.contains(&Event::AlertRaised {
        message: "atlantic: Severe Storm Warning".to_owned(),
    }));
    assert_eq!(
        query::physical_state(&session).alerts(),
        ["atlantic: Severe Storm Warning"]
    );
}

#[test]
fn successive_runs_compound_until_reset() {
    let mut session = Session::new();
    let _ = run(
        &mut session,
        request(ScenarioKind::Storm, "atlantic", 0.9, 24),
        ImpactSource::Local,
    );
    let _ = run(
        &mut session,
        request(ScenarioKind::Drought, "sahel", 0.2, 24),
        ImpactSource::Local,
    );

    let state = query::physical_state(&session);
    assert_eq!(state.impact_level(), ImpactLevel::Critical);
    assert!((state.temperature() - 13.5).abs() < 1e-9);

    let events = send(&mut session, Command::ResetPhysicalState);
    assert_eq!(events, vec![Event::PhysicalStateReset]);
    assert_eq!(query::physical_state(&session).impact_level(), ImpactLevel::Low);
    assert!(query::physical_state(&session).alerts().is_empty());
    assert!(
        query::active_run(&session).is_some(),
        "physical reset keeps the series"
    );
}

#[test]
fn invalid_run_leaves_everything_untouched() {
    let mut session = Session::new();
    let _ = run(
        &mut session,
        request(ScenarioKind::Drought, "sahel", 0.7, 48),
        ImpactSource::Local,
    );
    let _ = send(&mut session, Command::ScrubTo { hours: 12.0 });
    let state_before = query::physical_state(&session).clone();
    let run_before = query::active_run(&session).expect("run is active");
    let clock_before = query::playback_state(&session);

    let events = run(
        &mut session,
        request(ScenarioKind::Heatwave, "europe", 1.5, 48),
        ImpactSource::Local,
    );

    match &events[..] {
        [Event::RunRejected { error, .. }] => assert_eq!(error.field(), "magnitude"),
        other => panic!("unexpected events: {other:?}"),
    }
    assert_eq!(query::physical_state(&session), &state_before);
    let run_after = query::active_run(&session).expect("run is still active");
    assert!(std::sync::Arc::ptr_eq(&run_before, &run_after));
    assert_eq!(query::playback_state(&session), clock_before);
}

#[test]
fn upstream_failure_keeps_previous_series() {
    let mut session = Session::new();
    let _ = run(
        &mut session,
        request(ScenarioKind::CanalClosure, "suez_canal", 0.4, 168),
        ImpactSource::Local,
    );
    let previous = query::active_run(&session).expect("run is active");
    let state_before = query::physical_state(&session).clone();

    let events = run(
        &mut session,
        request(ScenarioKind::Storm, "los_angeles", 1.0, 24),
        ImpactSource::Remote(Err(UpstreamFailure::Unreachable {
            reason: "timed out".to_owned(),
        })),
    );

    assert!(matches!(&events[..], [Event::RunFailed { .. }]));
    let current = query::active_run(&session).expect("previous run survives");
    assert!(std::sync::Arc::ptr_eq(&previous, &current));
    assert_eq!(query::physical_state(&session), &state_before);
}

#[test]
fn malformed_remote_table_is_an_upstream_failure() {
    let mut session = Session::new();
    let table = RemoteImpactTable {
        scenario_id: None,
        impact_series: BTreeMap::new(),
        duration_hours: 0,
    };

    let events = run(
        &mut session,
        request(ScenarioKind::Storm, "los_angeles", 1.0, 24),
        ImpactSource::Remote(Ok(table)),
    );

    assert!(matches!(
        &events[..],
        [Event::RunFailed {
            failure: UpstreamFailure::Malformed { .. },
            ..
        }]
    ));
    assert!(query::active_run(&session).is_none());
}

#[test]
fn remote_table_drives_duration_and_series() {
    let mut session = manual_session();
    let mut impact_series = BTreeMap::new();
    let _ = impact_series.insert(NodeId::from("los_angeles"), vec![0.0, 0.4, 0.9]);
    let table = RemoteImpactTable {
        scenario_id: Some(ScenarioId::new("la_port_shutdown")),
        impact_series,
        duration_hours: 6,
    };

    let _ = run(
        &mut session,
        request(ScenarioKind::Storm, "los_angeles", 1.0, 24),
        ImpactSource::Remote(Ok(table)),
    );

    let active = query::active_run(&session).expect("run is active");
    assert_eq!(active.mode, SeriesMode::ServerProvided);
    assert_eq!(query::playback_state(&session).duration_hours, 6);
    assert_eq!(
        active.impact_series.get(&NodeId::from("los_angeles")),
        Some(&[0.0, 0.4, 0.9, 0.9, 0.9, 0.9, 0.9][..])
    );
    assert_eq!(active.kpis.global_trade_index_delta, Some(0.9));
    assert_eq!(active.kpis.peak_impact_hour, 2);
    assert!(!query::playback_state(&session).is_playing);
}

#[test]
fn overlong_local_run_is_rejected_before_building() {
    let mut session = Session::new();
    let events = run(
        &mut session,
        request(ScenarioKind::Drought, "sahel", 0.5, u32::MAX),
        ImpactSource::Local,
    );

    match &events[..] {
        [Event::RunRejected { error, .. }] => {
            assert_eq!(error.field(), "duration");
            assert!(matches!(error, ValidationError::DurationTooLong { .. }));
        }
        other => panic!("unexpected events: {other:?}"),
    }
    assert!(query::active_run(&session).is_none());
}

#[test]
fn duration_limit_follows_config() {
    let config = SessionConfig {
        max_duration_hours: 48,
        ..SessionConfig::default()
    };
    let mut session =
        Session::with_parts(config, WorldGraph::builtin(), TransitionRules::builtin());

    let events = run(
        &mut session,
        request(ScenarioKind::Storm, "los_angeles", 0.5, 72),
        ImpactSource::Local,
    );
    assert!(matches!(&events[..], [Event::RunRejected { .. }]));

    let mut impact_series = BTreeMap::new();
    let _ = impact_series.insert(NodeId::from("los_angeles"), vec![0.5]);
    let table = RemoteImpactTable {
        scenario_id: None,
        impact_series,
        duration_hours: u32::MAX,
    };
    let events = run(
        &mut session,
        request(ScenarioKind::Storm, "los_angeles", 0.5, 24),
        ImpactSource::Remote(Ok(table)),
    );
    assert!(matches!(
        &events[..],
        [Event::RunFailed {
            failure: UpstreamFailure::Malformed { .. },
            ..
        }]
    ));
    assert!(query::active_run(&session).is_none());
}

#[test]
fn ripple_run_spreads_from_targets_along_edges() {
    let mut session = manual_session();
    let _ = run(
        &mut session,
        request(ScenarioKind::CanalClosure, "suez_canal", 0.4, 168),
        ImpactSource::Ripple,
    );

    let active = query::active_run(&session).expect("run is active");
    assert_eq!(active.mode, SeriesMode::Ripple);
    assert_eq!(active.impact_series.len(), query::world_graph(&session).len());

    let series = |id: &str| {
        active
            .impact_series
            .get(&NodeId::from(id))
            .expect("every graph node has a series")
            .to_vec()
    };
    let suez = series("suez_canal");
    assert!(suez.iter().all(|value| (value - 0.4).abs() < 1e-12));

    let rotterdam = series("rotterdam");
    assert_eq!(rotterdam[47], 0.0);
    let arrival = 0.4 * 0.6 * (-0.01f64 * 48.0).exp();
    assert!((rotterdam[48] - arrival).abs() < 1e-12);

    let eu_central = series("eu_central");
    assert_eq!(eu_central[59], 0.0);
    assert!(eu_central[60] > 0.0);

    assert!(series("los_angeles").iter().all(|value| *value == 0.0));
    assert_eq!(active.kpis.global_trade_index_delta, Some(1.0));
}

#[test]
fn playback_requires_a_run() {
    let mut session = manual_session();
    assert!(send(&mut session, Command::Play).is_empty());
    assert!(send(&mut session, Command::Tick).is_empty());

    let events = send(&mut session, Command::ScrubTo { hours: 500.0 });
    assert_eq!(
        events,
        vec![Event::TimeScrubbed {
            requested: 500.0,
            current_time: 168.0,
        }]
    );
}

#[test]
fn ticks_stop_at_duration_without_pausing() {
    let mut session = manual_session();
    let _ = run(
        &mut session,
        request(ScenarioKind::Storm, "atlantic", 0.5, 2),
        ImpactSource::Local,
    );
    assert_eq!(
        send(&mut session, Command::TogglePlayback),
        vec![Event::PlaybackStarted { at: 0.0 }]
    );

    for expected in [1.0, 2.0, 2.0, 2.0] {
        assert_eq!(
            send(&mut session, Command::Tick),
            vec![Event::TimeAdvanced {
                current_time: expected
            }]
        );
    }
    assert!(query::playback_state(&session).is_playing);

    assert_eq!(
        send(&mut session, Command::Pause),
        vec![Event::PlaybackPaused { at: 2.0 }]
    );
    assert!(send(&mut session, Command::Play).is_empty(), "at end of run");
}

#[test]
fn step_commands_scrub_by_one_hour() {
    let mut session = manual_session();
    let _ = run(
        &mut session,
        request(ScenarioKind::Drought, "sahel", 0.3, 10),
        ImpactSource::Local,
    );

    let _ = send(&mut session, Command::StepForward);
    let _ = send(&mut session, Command::StepForward);
    assert_eq!(query::playback_state(&session).current_time, 2.0);

    let events = send(&mut session, Command::StepBackward);
    assert_eq!(
        events,
        vec![Event::TimeScrubbed {
            requested: 1.0,
            current_time: 1.0,
        }]
    );
    let _ = send(&mut session, Command::StepBackward);
    let _ = send(&mut session, Command::StepBackward);
    assert_eq!(query::playback_state(&session).current_time, 0.0);
}

#[test]
fn session_reset_drops_run_and_rewinds() {
    let mut session = Session::new();
    let _ = run(
        &mut session,
        request(ScenarioKind::CanalClosure, "suez_canal", 0.8, 24),
        ImpactSource::Local,
    );
    let _ = send(&mut session, Command::Tick);

    assert_eq!(send(&mut session, Command::ResetSession), vec![Event::SessionReset]);
    let clock = query::playback_state(&session);
    assert_eq!(clock.current_time, 0.0);
    assert_eq!(clock.duration_hours, 168);
    assert!(!clock.is_playing);
    assert!(query::active_run(&session).is_none());
    assert_eq!(
        query::physical_state(&session).impact_level(),
        ImpactLevel::High,
        "session reset keeps the physical state"
    );
}

#[test]
fn overlay_follows_clock_and_planet() {
    let mut session = manual_session();
    let _ = run(
        &mut session,
        request(ScenarioKind::CanalClosure, "suez_canal", 1.0, 10),
        ImpactSource::Local,
    );
    let toggles = LayerToggles::none();

    let at_start = query::overlay(&session, &toggles, Planet::Earth);
    assert!(at_start
        .iter()
        .filter(|entry| entry.node_id.as_str() == "suez_canal")
        .all(|entry| !entry.visible));

    let _ = send(&mut session, Command::ScrubTo { hours: 10.0 });
    let at_end = query::overlay(&session, &toggles, Planet::Earth);
    let suez = at_end
        .iter()
        .find(|entry| entry.node_id.as_str() == "suez_canal")
        .expect("suez is on earth");
    assert!(suez.visible);
    assert!((suez.intensity - 0.4).abs() < 1e-9);

    let mars = query::overlay(&session, &toggles, Planet::Mars);
    assert_eq!(mars.len(), 3);
    assert!(mars
        .iter()
        .filter(|entry| entry.node_id.as_str() != "launch_pad")
        .all(|entry| entry.visible));

    let alerts = query::alerts(&session, &LayerToggles::only(&[Layer::Alerts]));
    assert_eq!(alerts, ["suez_canal: Major Shipping Disruption"]);
    assert!(query::alerts(&session, &toggles).is_empty());

    let top = query::top_impacts_of_active_run(&session, 3);
    let ids: Vec<&str> = top.iter().map(|entry| entry.node_id.as_str()).collect();
    assert_eq!(ids, ["los_angeles", "rotterdam", "singapore"]);
    assert!(top.iter().all(|entry| (entry.max_impact - 0.4).abs() < 1e-9));
}
