#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Command-line adapter that plays a headless wave director match.

mod scenario;

use std::{fmt, path::PathBuf};

use anyhow::{ensure, Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use wave_director::{query, Director};
use wave_director_arena::{Arena, EnemyFate};
use wave_director_core::{Clock, Event, FixedStepClock, Phase, WinCause};
use wave_director_system_spawning::RngSource;

use crate::scenario::{ensure_lethality, Scenario};

/// Offset separating the arena's random stream from the director's.
const ARENA_STREAM: u64 = 0x9e37_79b9_7f4a_7c15;

/// Command-line arguments for the headless match.
#[derive(Debug, Parser)]
#[command(
    name = "wave-director",
    version,
    about = "Runs a wave director match against a simulated arena"
)]
struct CliArgs {
    /// Scenario file in TOML format. The bundled scenario is used when omitted.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Seed shared by the director and the arena.
    #[arg(long, default_value_t = 0)]
    seed: u64,
    /// Simulated frames per second.
    #[arg(long, default_value_t = 60)]
    tick_rate: u32,
    /// Stops the run once this much game time has elapsed.
    #[arg(long, default_value_t = 600.0, value_name = "SECONDS")]
    max_seconds: f64,
    /// Overrides the scenario's probability that an enemy dies on its way.
    #[arg(long)]
    lethality: Option<f64>,
    /// Fires the win signal at the given game time.
    #[arg(long, value_name = "SECONDS")]
    force_win_at: Option<f64>,
}

/// Entry point for the wave director command-line interface.
fn main() -> Result<()> {
    init_tracing();
    let args = CliArgs::parse();

    let mut scenario = match &args.config {
        Some(path) => Scenario::load(path)?,
        None => Scenario::bundled()?,
    };
    if let Some(lethality) = args.lethality {
        ensure_lethality(lethality)?;
        scenario.arena.lethality = lethality;
    }
    ensure!(args.tick_rate > 0, "tick rate must be positive");
    ensure!(
        args.max_seconds.is_finite() && args.max_seconds > 0.0,
        "max seconds must be positive, got {}",
        args.max_seconds
    );

    let summary = run(scenario, &args)?;
    println!("{summary}");
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

fn run(scenario: Scenario, args: &CliArgs) -> Result<RunSummary> {
    let mut clock = FixedStepClock::from_rate(args.tick_rate);
    let mut director = Director::new(scenario.director, RngSource::seeded(args.seed), clock.now())
        .context("scenario cannot drive the wave director")?;
    let mut arena = Arena::new(
        scenario.arena,
        RngSource::seeded(args.seed.wrapping_add(ARENA_STREAM)),
    );
    tracing::info!(
        seed = args.seed,
        waves = query::wave_count(&director),
        lethality = scenario.arena.lethality,
        "match started"
    );

    let mut summary = RunSummary::default();
    let mut events = Vec::new();
    while !query::has_won(&director) {
        let now = clock.advance();
        if now > args.max_seconds {
            tracing::warn!(
                phase = %query::phase(&director),
                wave = query::wave_index(&director).get(),
                "time limit reached before the match was won"
            );
            break;
        }

        for resolution in arena.advance(now) {
            match resolution.fate {
                EnemyFate::Died => {
                    summary.died += 1;
                    director.on_enemy_died(&mut events);
                }
                EnemyFate::ReachedGoal => {
                    summary.reached_goal += 1;
                    director.on_enemy_reached_goal(&mut events);
                }
            }
        }
        if args.force_win_at.is_some_and(|at| now >= at) {
            director.force_win(&mut events);
        }
        director
            .tick(now, &mut arena, &mut events)
            .with_context(|| format!("director tick failed at {now:.3}s"))?;

        for event in events.drain(..) {
            summary.record(&event);
        }
        summary.ended_at = now;
    }

    summary.final_phase = query::phase(&director);
    Ok(summary)
}

/// Tallies gathered from the director's event stream.
#[derive(Debug, Default)]
struct RunSummary {
    spawned: u32,
    died: u32,
    reached_goal: u32,
    waves_started: u32,
    overflows: u32,
    final_phase: Phase,
    outcome: Option<WinCause>,
    ended_at: f64,
}

impl RunSummary {
    fn record(&mut self, event: &Event) {
        match event {
            Event::EnemySpawned { .. } => self.spawned += 1,
            Event::PhaseChanged {
                to: Phase::WaveActive,
                ..
            } => self.waves_started += 1,
            Event::PhaseChanged { .. } | Event::WaveAdvanced { .. } => {}
            Event::GameWon { cause } => self.outcome = Some(*cause),
            Event::ResolutionOverflow { .. } => self.overflows += 1,
        }
    }
}

impl fmt::Display for RunSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let outcome = match self.outcome {
            Some(WinCause::AllEnemiesCleared) => "won",
            Some(WinCause::ManualOverride) => "won (manual override)",
            None => "unresolved",
        };
        writeln!(f, "outcome: {outcome}")?;
        writeln!(f, "phase: {}", self.final_phase)?;
        writeln!(f, "waves started: {}", self.waves_started)?;
        writeln!(f, "enemies spawned: {}", self.spawned)?;
        writeln!(f, "enemies killed: {}", self.died)?;
        writeln!(f, "enemies at goal: {}", self.reached_goal)?;
        if self.overflows > 0 {
            writeln!(f, "resolution overflows: {}", self.overflows)?;
        }
        write!(f, "elapsed: {:.2}s", self.ended_at)
    }
}
