#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that runs Neural Terra scenarios and prints the outcome.

mod report;
mod scenario_transfer;

use std::{
    fs,
    path::{Path, PathBuf},
    thread,
    time::{Duration, Instant},
};

use anyhow::{bail, Context, Result};
use clap::{Args, Parser, Subcommand};
use neural_terra_core::{
    Command, Event, ImpactSource, Layer, LayerToggles, NodeId, Planet, RemoteImpactTable,
    RunRequest, ScenarioId, ScenarioInput, ScenarioKind, UpstreamFailure,
};
use neural_terra_system_playback::Cadence;
use neural_terra_system_scenario_model::PresetCatalog;
use neural_terra_world::{self as world, query, Session, SessionConfig};

use crate::scenario_transfer::ScenarioShare;

/// Scenario simulation over a small world graph of ports, grids and colonies.
#[derive(Debug, Parser)]
#[command(name = "neural-terra", version)]
struct Cli {
    /// Scenario preset catalog in JSON, replacing the builtin presets.
    #[arg(long, global = true)]
    catalog: Option<PathBuf>,

    #[command(subcommand)]
    command: CliCommand,
}

impl Cli {
    fn load_catalog(&self) -> Result<PresetCatalog> {
        match &self.catalog {
            Some(path) => PresetCatalog::from_file(path)
                .with_context(|| format!("failed to load preset catalog {}", path.display())),
            None => Ok(PresetCatalog::builtin()),
        }
    }
}

#[derive(Debug, Subcommand)]
enum CliCommand {
    /// Run a scenario and print the physical state, KPIs and overlay.
    Run(RunArgs),
    /// Print a share string for a scenario.
    Share(ScenarioArgs),
    /// List the builtin scenario presets.
    Presets,
}

#[derive(Debug, Args)]
struct ScenarioArgs {
    /// Builtin preset to run.
    #[arg(long, conflicts_with = "kind")]
    preset: Option<String>,

    /// Scenario type: heatwave, canal_closure, storm or drought.
    #[arg(long)]
    kind: Option<ScenarioKind>,

    /// Region named in alert text.
    #[arg(long, default_value = "global")]
    region: String,

    /// Severity in [0, 1].
    #[arg(long, default_value_t = 0.5, allow_negative_numbers = true)]
    magnitude: f64,

    /// Scenario length in hours.
    #[arg(long, default_value_t = 24)]
    duration: u32,

    /// Node directly targeted by the scenario; repeatable.
    #[arg(long = "target")]
    targets: Vec<NodeId>,
}

impl ScenarioArgs {
    fn to_request(&self, catalog: &PresetCatalog) -> Result<RunRequest> {
        if let Some(preset) = &self.preset {
            return Ok(catalog.request(preset)?);
        }
        let Some(kind) = self.kind else {
            bail!("either --preset or --kind must be given");
        };
        let scenario = ScenarioInput::new(kind, self.region.clone(), self.magnitude, self.duration);
        Ok(RunRequest {
            scenario_id: ScenarioId::new(format!("{kind}_{}", self.region)),
            scenario,
            target_ids: self.targets.clone(),
            start_timestamp: None,
        })
    }
}

#[derive(Debug, Args)]
struct RunArgs {
    #[command(flatten)]
    scenario: ScenarioArgs,

    /// Share string produced by the `share` subcommand.
    #[arg(long, conflicts_with_all = ["preset", "kind"])]
    share: Option<String>,

    /// JSON impact table returned by a remote impact source.
    #[arg(long)]
    remote: Option<PathBuf>,

    /// Spread the shock from the targets along the world graph edges.
    #[arg(long, conflicts_with = "remote")]
    ripple: bool,

    /// Session configuration in TOML.
    #[arg(long)]
    config: Option<PathBuf>,

    /// Play the run in real time instead of jumping to the end.
    #[arg(long)]
    play: bool,

    /// Playback speed multiplier used with --play.
    #[arg(long, default_value_t = 1.0)]
    speed: f64,

    /// Simulated hour to inspect; defaults to the end of the run.
    #[arg(long, conflicts_with = "play", allow_negative_numbers = true)]
    scrub: Option<f64>,

    /// Enabled overlay layers.
    #[arg(long, value_delimiter = ',', default_value = "weather")]
    layers: Vec<Layer>,

    /// Planet whose nodes are projected.
    #[arg(long, default_value = "earth")]
    planet: Planet,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();

    let cli = Cli::parse();
    let catalog = cli.load_catalog()?;
    match &cli.command {
        CliCommand::Run(args) => run(args, &catalog),
        CliCommand::Share(args) => share(args, &catalog),
        CliCommand::Presets => {
            report::print_presets(&catalog);
            Ok(())
        }
    }
}

fn run(args: &RunArgs, catalog: &PresetCatalog) -> Result<()> {
    let config = match &args.config {
        Some(path) => SessionConfig::from_file(path)
            .with_context(|| format!("failed to load session config {}", path.display()))?,
        None => SessionConfig::default(),
    };
    let tick_interval = Duration::from_millis(config.tick_interval_ms);
    let mut session = Session::from_config(config).context("failed to set up session")?;

    let request = match &args.share {
        Some(share) => ScenarioShare::decode(share)
            .context("failed to decode share string")?
            .into_request(),
        None => args.scenario.to_request(catalog)?,
    };
    let source = match &args.remote {
        Some(path) => ImpactSource::Remote(load_remote_table(path)),
        None if args.ripple => ImpactSource::Ripple,
        None => ImpactSource::Local,
    };

    let mut events = Vec::new();
    world::apply(
        &mut session,
        Command::RunScenario { request, source },
        &mut events,
    );
    for event in &events {
        match event {
            Event::RunRejected { error, .. } => {
                bail!("scenario rejected ({}): {error}", error.field())
            }
            Event::RunFailed { failure, .. } => bail!("scenario failed: {failure}"),
            _ => {}
        }
    }

    if args.play {
        play_to_end(&mut session, tick_interval, args.speed);
    } else {
        let end = f64::from(query::playback_state(&session).duration_hours);
        let mut ignored = Vec::new();
        world::apply(&mut session, Command::Pause, &mut ignored);
        world::apply(
            &mut session,
            Command::ScrubTo {
                hours: args.scrub.unwrap_or(end),
            },
            &mut ignored,
        );
    }

    let toggles = LayerToggles::only(&args.layers);
    report::print_session(&session, &toggles, args.planet);
    Ok(())
}

fn share(args: &ScenarioArgs, catalog: &PresetCatalog) -> Result<()> {
    let request = args.to_request(catalog)?;
    request.scenario.validate()?;
    let share = ScenarioShare {
        scenario: request.scenario,
        target_ids: request.target_ids,
    };
    println!("{}", share.encode());
    Ok(())
}

fn load_remote_table(path: &Path) -> Result<RemoteImpactTable, UpstreamFailure> {
    let contents = fs::read_to_string(path).map_err(|error| UpstreamFailure::Unreachable {
        reason: format!("{}: {error}", path.display()),
    })?;
    serde_json::from_str(&contents).map_err(|error| UpstreamFailure::Malformed {
        reason: format!("{}: {error}", path.display()),
    })
}

fn play_to_end(session: &mut Session, tick_interval: Duration, speed: f64) {
    let mut events = Vec::new();
    world::apply(session, Command::Play, &mut events);

    let mut cadence = Cadence::new(tick_interval);
    cadence.set_speed(speed);
    cadence.arm(Instant::now());

    loop {
        let state = query::playback_state(session);
        if !state.is_playing || state.current_time >= f64::from(state.duration_hours) {
            cadence.disarm();
            break;
        }
        if let Some(due) = cadence.next_due() {
            thread::sleep(due.saturating_duration_since(Instant::now()));
        }
        if cadence.poll(Instant::now()) {
            events.clear();
            world::apply(session, Command::Tick, &mut events);
            report::print_progress(session);
        }
    }
}
