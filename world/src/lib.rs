#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative simulation session for Neural Terra.
//!
//! The [`Session`] owns the physical state, the active run and the playback
//! clock. Every mutation goes through [`apply`], which reports what changed as
//! [`Event`] values; reads go through the [`query`] module.

pub mod config;
pub mod graph;

use std::sync::Arc;

use neural_terra_core::{
    Command, Event, ImpactSource, PhysicalState, RunRequest, RunResult, ScenarioId, SeriesMode,
    UpstreamFailure, ValidationError,
};
use neural_terra_system_analytics::compute_kpis;
use neural_terra_system_impact_series::{propagate, ImpactSeriesBuilder};
use neural_terra_system_playback::PlaybackClock;
use neural_terra_system_scenario_model::{
    self as scenario_model, TransitionRules, TransitionRulesError,
};
use thiserror::Error;

pub use config::{SessionConfig, SessionConfigError};
pub use graph::{WorldGraph, WorldGraphError};

/// Simulation session owning all mutable state.
#[derive(Debug)]
pub struct Session {
    config: SessionConfig,
    graph: WorldGraph,
    rules: TransitionRules,
    builder: ImpactSeriesBuilder,
    state: PhysicalState,
    active_run: Option<Arc<RunResult>>,
    clock: PlaybackClock,
}

impl Session {
    /// Creates a session with the builtin graph, builtin rules and default config.
    #[must_use]
    pub fn new() -> Self {
        Self::with_parts(
            SessionConfig::default(),
            WorldGraph::builtin(),
            TransitionRules::builtin(),
        )
    }

    /// Creates a session from already loaded parts.
    #[must_use]
    pub fn with_parts(config: SessionConfig, graph: WorldGraph, rules: TransitionRules) -> Self {
        let builder = ImpactSeriesBuilder::new(graph.resolve(&config.hotspots))
            .with_max_duration_hours(config.max_duration_hours);
        let clock = PlaybackClock::new(config.default_duration_hours);
        Self {
            config,
            graph,
            rules,
            builder,
            state: PhysicalState::baseline(),
            active_run: None,
            clock,
        }
    }

    /// Creates a session, loading the rule table and world graph the config points at.
    pub fn from_config(config: SessionConfig) -> Result<Self, SessionError> {
        let rules = match &config.rules_path {
            Some(path) => TransitionRules::from_file(path)?,
            None => TransitionRules::builtin(),
        };
        let graph = match &config.world_graph_path {
            Some(path) => WorldGraph::from_file(path)?,
            None => WorldGraph::builtin(),
        };
        Ok(Self::with_parts(config, graph, rules))
    }
}

impl Default for Session {
    fn default() -> Self {
        Self::new()
    }
}

/// Failure to assemble a session from its configuration.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The configured transition rules could not be loaded.
    #[error(transparent)]
    Rules(#[from] TransitionRulesError),
    /// The configured world graph could not be loaded.
    #[error(transparent)]
    Graph(#[from] WorldGraphError),
}

/// Applies the provided command to the session, mutating state deterministically.
pub fn apply(session: &mut Session, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::RunScenario { request, source } => {
            run_scenario(session, request, source, out_events);
        }
        Command::ResetPhysicalState => {
            scenario_model::reset(&mut session.state);
            out_events.push(Event::PhysicalStateReset);
        }
        Command::ResetSession => {
            session.active_run = None;
            session.clock.unload(session.config.default_duration_hours);
            tracing::debug!(target: "neural_terra::session", "session.reset");
            out_events.push(Event::SessionReset);
        }
        Command::Play => {
            if session.clock.play() {
                let at = session.clock.current_time();
                tracing::debug!(target: "neural_terra::playback", at, "playback.started");
                out_events.push(Event::PlaybackStarted { at });
            }
        }
        Command::Pause => {
            if session.clock.pause() {
                let at = session.clock.current_time();
                tracing::debug!(target: "neural_terra::playback", at, "playback.paused");
                out_events.push(Event::PlaybackPaused { at });
            }
        }
        Command::TogglePlayback => {
            let was_playing = session.clock.is_playing();
            let is_playing = session.clock.toggle();
            let at = session.clock.current_time();
            match (was_playing, is_playing) {
                (false, true) => out_events.push(Event::PlaybackStarted { at }),
                (true, false) => out_events.push(Event::PlaybackPaused { at }),
                _ => {}
            }
        }
        Command::ScrubTo { hours } => scrub(session, hours, out_events),
        Command::StepBackward => {
            let requested = session.clock.current_time() - 1.0;
            scrub(session, requested, out_events);
        }
        Command::StepForward => {
            let requested = session.clock.current_time() + 1.0;
            scrub(session, requested, out_events);
        }
        Command::Tick => {
            if let Some(current_time) = session.clock.tick() {
                out_events.push(Event::TimeAdvanced { current_time });
            }
        }
    }
}

fn scrub(session: &mut Session, requested: f64, out_events: &mut Vec<Event>) {
    let current_time = session.clock.scrub_to(requested);
    tracing::debug!(
        target: "neural_terra::playback",
        requested,
        current_time,
        "playback.scrubbed"
    );
    out_events.push(Event::TimeScrubbed {
        requested,
        current_time,
    });
}

fn run_scenario(
    session: &mut Session,
    request: RunRequest,
    source: ImpactSource,
    out_events: &mut Vec<Event>,
) {
    let scenario_id = request.scenario_id;

    if let Err(error) = request
        .scenario
        .validate_within(session.config.max_duration_hours)
    {
        report_rejection(scenario_id, error, out_events);
        return;
    }

    let mut next_state = session.state.clone();
    let transition = match scenario_model::apply(&mut next_state, &request.scenario, &session.rules)
    {
        Ok(transition) => transition,
        Err(error) => {
            report_rejection(scenario_id, error, out_events);
            return;
        }
    };

    let duration_hours = request.scenario.duration_hours;
    let built = match source {
        ImpactSource::Local => session.builder.build(&next_state, duration_hours, None),
        ImpactSource::Remote(Ok(table)) => {
            session
                .builder
                .build(&next_state, duration_hours, Some(&table))
        }
        ImpactSource::Remote(Err(failure)) => Err(failure),
        ImpactSource::Ripple => Ok((
            SeriesMode::Ripple,
            propagate(
                session.graph.nodes(),
                session.graph.edges(),
                &request.target_ids,
                request.scenario.magnitude,
                duration_hours,
            ),
        )),
    };

    let (mode, impact_series) = match built {
        Ok(built) => built,
        Err(failure) => {
            report_failure(scenario_id, failure, out_events);
            return;
        }
    };

    let graph = &session.graph;
    let kpis = compute_kpis(&impact_series, |id| graph.asset_type_of(id));
    let duration_hours = impact_series.duration_hours();

    session.state = next_state;
    session.active_run = Some(Arc::new(RunResult {
        scenario_id: scenario_id.clone(),
        mode,
        impact_series,
        kpis: kpis.clone(),
        duration_hours,
    }));
    session.clock.load(duration_hours);

    tracing::info!(
        target: "neural_terra::session",
        scenario = %scenario_id,
        kind = %request.scenario.kind,
        mode = ?mode,
        duration_hours,
        targets = request.target_ids.len(),
        peak_impact = kpis.peak_impact,
        impact_level = %session.state.impact_level(),
        "run.committed"
    );

    out_events.push(Event::PhysicalStateChanged {
        state: session.state.clone(),
    });
    if let Some((from, to)) = transition.level_change {
        out_events.push(Event::ImpactLevelRaised { from, to });
    }
    for message in transition.alerts_added {
        out_events.push(Event::AlertRaised { message });
    }
    out_events.push(Event::SeriesReplaced {
        scenario_id,
        mode,
        duration_hours,
        kpis,
    });

    if session.config.autoplay_on_run && session.clock.play() {
        out_events.push(Event::PlaybackStarted {
            at: session.clock.current_time(),
        });
    }
}

fn report_rejection(
    scenario_id: ScenarioId,
    error: ValidationError,
    out_events: &mut Vec<Event>,
) {
    tracing::warn!(
        target: "neural_terra::session",
        scenario = %scenario_id,
        field = error.field(),
        error = %error,
        "run.rejected"
    );
    out_events.push(Event::RunRejected { scenario_id, error });
}

fn report_failure(
    scenario_id: ScenarioId,
    failure: UpstreamFailure,
    out_events: &mut Vec<Event>,
) {
    tracing::warn!(
        target: "neural_terra::session",
        scenario = %scenario_id,
        error = %failure,
        "run.upstream_failed"
    );
    out_events.push(Event::RunFailed {
        scenario_id,
        failure,
    });
}

/// Query functions that provide read-only access to the session.
pub mod query {
    use std::sync::Arc;

    use neural_terra_core::{
        LayerToggles, NodeId, PhysicalState, PlaybackState, Planet, RunResult,
    };
    use neural_terra_system_analytics::{top_impacts, RankedImpact};
    use neural_terra_system_overlay::{project, visible_alerts, OverlayEntry};

    use super::{Session, SessionConfig, WorldGraph};

    /// Provides read-only access to the coupled physical state.
    #[must_use]
    pub fn physical_state(session: &Session) -> &PhysicalState {
        &session.state
    }

    /// Shares the active run, if any.
    ///
    /// The returned handle stays valid after later runs replace it.
    #[must_use]
    pub fn active_run(session: &Session) -> Option<Arc<RunResult>> {
        session.active_run.clone()
    }

    /// Captures the playback clock.
    #[must_use]
    pub fn playback_state(session: &Session) -> PlaybackState {
        session.clock.state()
    }

    /// Provides read-only access to the world graph.
    #[must_use]
    pub fn world_graph(session: &Session) -> &WorldGraph {
        &session.graph
    }

    /// Provides read-only access to the session configuration.
    #[must_use]
    pub fn config(session: &Session) -> &SessionConfig {
        &session.config
    }

    /// Impact of every node with a series at the current clock time.
    #[must_use]
    pub fn snapshot(session: &Session) -> Vec<(NodeId, f64)> {
        let hours = session.clock.current_time();
        session
            .active_run
            .as_deref()
            .map(|run| {
                run.impact_series
                    .iter()
                    .map(|(id, _)| (id.clone(), run.impact_series.value_at(id, hours)))
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Projects the nodes of `planet` at the current clock time.
    #[must_use]
    pub fn overlay(session: &Session, toggles: &LayerToggles, planet: Planet) -> Vec<OverlayEntry> {
        let nodes = session.graph.on_planet(planet);
        let series = session.active_run.as_deref().map(|run| &run.impact_series);
        project(&nodes, toggles, series, session.clock.current_time())
    }

    /// Alerts to display under the provided toggles.
    #[must_use]
    pub fn alerts<'a>(session: &'a Session, toggles: &LayerToggles) -> &'a [String] {
        visible_alerts(&session.state, toggles)
    }

    /// Nodes of the active run ranked by their peak impact.
    #[must_use]
    pub fn top_impacts_of_active_run(session: &Session, limit: usize) -> Vec<RankedImpact> {
        session
            .active_run
            .as_deref()
            .map(|run| top_impacts(&run.impact_series, limit))
            .unwrap_or_default()
    }
}
