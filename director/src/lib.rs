#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative wave director state for a single match.
//!
//! The [`Director`] owns the phase machine, the per-wave counters, the spawn
//! gate and the outcome signal. Engine adapters drive it either through the
//! direct methods ([`Director::tick`], [`Director::on_enemy_died`],
//! [`Director::on_enemy_reached_goal`], [`Director::force_win`]) or by feeding
//! [`Command`] values to [`apply`]. Every call appends the resulting [`Event`]
//! values to a caller-supplied buffer.
//!
//! Each tick runs the current phase's action first and then evaluates the
//! phase's transition predicate once against the post-action state. A tick
//! therefore commits at most one transition.

use wave_director_core::{
    Command, ConfigurationError, DirectorConfig, EnemyHost, Event, Phase, SpawnRequest,
    UniformSource, WaveCounters, WaveIndex, WinCause,
};
use wave_director_system_spawning::SpawnScheduler;

mod outcome;

pub use outcome::{ListenerId, OutcomeSignal};

/// Wave director for one match, drawing randomness from `R`.
#[derive(Debug)]
pub struct Director<R> {
    config: DirectorConfig,
    rng: R,
    phase: Phase,
    wave: WaveIndex,
    counters: WaveCounters,
    wave_started_at: f64,
    scheduler: SpawnScheduler,
    outcome: OutcomeSignal,
}

impl<R: UniformSource> Director<R> {
    /// Creates a director whose first wave starts at `started_at`.
    ///
    /// The configuration is validated up front so that malformed tables fail
    /// before the first tick.
    pub fn new(config: DirectorConfig, rng: R, started_at: f64) -> Result<Self, ConfigurationError> {
        config.validate()?;
        tracing::debug!(
            waves = config.waves.len(),
            paths = config.paths.len(),
            goals = config.goals.len(),
            "wave director configured"
        );
        Ok(Self {
            config,
            rng,
            phase: Phase::PreWave,
            wave: WaveIndex::FIRST,
            counters: WaveCounters::default(),
            wave_started_at: started_at,
            scheduler: SpawnScheduler::new(started_at),
            outcome: OutcomeSignal::default(),
        })
    }

    /// Runs one frame: the current phase's action, then one transition check.
    pub fn tick<H>(
        &mut self,
        now: f64,
        host: &mut H,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ConfigurationError>
    where
        H: EnemyHost + ?Sized,
    {
        self.perform_action(now, host, out_events)?;

        let next = self.evaluate_transition(now)?;
        if next != self.phase {
            tracing::debug!(
                from = %self.phase,
                to = %next,
                wave = self.wave.get(),
                "phase transition"
            );
            out_events.push(Event::PhaseChanged {
                from: self.phase,
                to: next,
                wave: self.wave,
            });
            self.phase = next;
        }
        Ok(())
    }

    /// Records that an enemy of the current wave died.
    pub fn on_enemy_died(&mut self, out_events: &mut Vec<Event>) {
        self.counters.dead = self.counters.dead.saturating_add(1);
        self.check_resolution(out_events);
    }

    /// Records that an enemy of the current wave reached its goal.
    pub fn on_enemy_reached_goal(&mut self, out_events: &mut Vec<Event>) {
        self.counters.reached_goal = self.counters.reached_goal.saturating_add(1);
        self.check_resolution(out_events);
    }

    /// Fires the outcome signal immediately, regardless of phase.
    pub fn force_win(&mut self, out_events: &mut Vec<Event>) {
        tracing::warn!(
            phase = %self.phase,
            wave = self.wave.get(),
            "outcome signal forced by manual override"
        );
        self.outcome.fire(WinCause::ManualOverride, out_events);
    }

    /// Registers a listener notified when the match is won.
    pub fn subscribe_win<F>(&mut self, listener: F) -> ListenerId
    where
        F: FnMut(WinCause) + 'static,
    {
        self.outcome.subscribe(listener)
    }

    /// Removes a win listener. Returns `false` when the handle is unknown.
    pub fn unsubscribe_win(&mut self, id: ListenerId) -> bool {
        self.outcome.unsubscribe(id)
    }

    fn perform_action<H>(
        &mut self,
        now: f64,
        host: &mut H,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ConfigurationError>
    where
        H: EnemyHost + ?Sized,
    {
        match self.phase {
            Phase::PreWave | Phase::SpawnComplete => Ok(()),
            Phase::WaveActive => self.try_spawn(now, host, out_events),
            Phase::WaveComplete => self.start_next_wave(now, out_events),
            Phase::GameOver => {
                if host.live_enemy_count() == 0
                    && self.outcome.fire_once(WinCause::AllEnemiesCleared, out_events)
                {
                    tracing::info!(waves = self.config.waves.len(), "match won");
                }
                Ok(())
            }
        }
    }

    fn evaluate_transition(&self, now: f64) -> Result<Phase, ConfigurationError> {
        let wave = self.config.wave(self.wave)?;
        let next = match self.phase {
            Phase::PreWave if now - self.wave_started_at > wave.start_delay => Phase::WaveActive,
            Phase::WaveActive if self.counters.spawned >= wave.enemy_count => Phase::SpawnComplete,
            Phase::SpawnComplete if self.counters.resolved() >= wave.enemy_count => {
                if self.config.is_last_wave(self.wave) {
                    Phase::GameOver
                } else {
                    Phase::WaveComplete
                }
            }
            Phase::WaveComplete => Phase::PreWave,
            phase => phase,
        };
        Ok(next)
    }

    fn try_spawn<H>(
        &mut self,
        now: f64,
        host: &mut H,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ConfigurationError>
    where
        H: EnemyHost + ?Sized,
    {
        let wave = self.config.wave(self.wave)?;
        if self.counters.spawned >= wave.enemy_count {
            return Ok(());
        }

        let Some(plan) =
            self.scheduler
                .poll(now, self.wave, wave, &self.config.paths, &mut self.rng)?
        else {
            return Ok(());
        };

        let request = SpawnRequest {
            wave: self.wave,
            prototype: plan.prototype,
            path: plan.path,
            goal: plan.path.goal,
            position: plan.position,
        };
        let _handle = host.spawn(&request);
        self.counters.spawned = self.counters.spawned.saturating_add(1);

        tracing::debug!(
            wave = self.wave.get(),
            prototype = %plan.prototype,
            path = plan.path.id.get(),
            goal = plan.path.goal.get(),
            spawned = self.counters.spawned,
            "enemy spawned"
        );
        out_events.push(Event::EnemySpawned {
            wave: self.wave,
            prototype: plan.prototype.clone(),
            path: plan.path.id,
            goal: plan.path.goal,
        });
        Ok(())
    }

    fn start_next_wave(
        &mut self,
        now: f64,
        out_events: &mut Vec<Event>,
    ) -> Result<(), ConfigurationError> {
        let next = self.wave.next();
        let _ = self.config.wave(next)?;

        self.wave = next;
        self.counters = WaveCounters::default();
        self.wave_started_at = now;
        self.scheduler.restart(now);

        tracing::info!(wave = next.get(), at = now, "wave advanced");
        out_events.push(Event::WaveAdvanced { wave: next });
        Ok(())
    }

    fn check_resolution(&self, out_events: &mut Vec<Event>) {
        let Ok(wave) = self.config.wave(self.wave) else {
            return;
        };
        let resolved = self.counters.resolved();
        if resolved > wave.enemy_count {
            tracing::warn!(
                wave = self.wave.get(),
                resolved,
                enemy_count = wave.enemy_count,
                "more enemies resolved than the wave contains"
            );
            out_events.push(Event::ResolutionOverflow {
                wave: self.wave,
                resolved,
                enemy_count: wave.enemy_count,
            });
        }
    }
}

/// Applies the provided command to the director.
pub fn apply<R, H>(
    director: &mut Director<R>,
    command: Command,
    host: &mut H,
    out_events: &mut Vec<Event>,
) -> Result<(), ConfigurationError>
where
    R: UniformSource,
    H: EnemyHost + ?Sized,
{
    match command {
        Command::Tick { now } => director.tick(now, host, out_events)?,
        Command::EnemyDied => director.on_enemy_died(out_events),
        Command::EnemyReachedGoal => director.on_enemy_reached_goal(out_events),
        Command::ForceWin => director.force_win(out_events),
    }
    Ok(())
}

/// Query functions that provide read-only access to the director state.
pub mod query {
    use wave_director_core::{DirectorConfig, Phase, WaveCounters, WaveIndex};

    use super::Director;

    /// Immutable copy of the director state.
    #[derive(Clone, Copy, Debug, PartialEq)]
    pub struct DirectorSnapshot {
        /// Current phase.
        pub phase: Phase,
        /// Wave in progress.
        pub wave: WaveIndex,
        /// Tallies for the wave in progress.
        pub counters: WaveCounters,
        /// Time the wave in progress started.
        pub wave_started_at: f64,
        /// Time of the most recent spawn, or of the wave start.
        pub last_spawn_attempt: f64,
        /// Delay that must elapse before the next spawn.
        pub next_spawn_delay: f64,
        /// Whether the outcome signal has fired.
        pub won: bool,
    }

    /// Phase the director is currently in.
    #[must_use]
    pub fn phase<R>(director: &Director<R>) -> Phase {
        director.phase
    }

    /// Wave currently in progress.
    #[must_use]
    pub fn wave_index<R>(director: &Director<R>) -> WaveIndex {
        director.wave
    }

    /// Number of configured waves.
    #[must_use]
    pub fn wave_count<R>(director: &Director<R>) -> usize {
        director.config.waves.len()
    }

    /// Tallies for the wave in progress.
    #[must_use]
    pub fn counters<R>(director: &Director<R>) -> WaveCounters {
        director.counters
    }

    /// Reports whether the outcome signal has fired.
    #[must_use]
    pub fn has_won<R>(director: &Director<R>) -> bool {
        director.outcome.has_fired()
    }

    /// Configuration the director was built from.
    #[must_use]
    pub fn config<R>(director: &Director<R>) -> &DirectorConfig {
        &director.config
    }

    /// Captures the complete director state.
    #[must_use]
    pub fn snapshot<R>(director: &Director<R>) -> DirectorSnapshot {
        DirectorSnapshot {
            phase: director.phase,
            wave: director.wave,
            counters: director.counters,
            wave_started_at: director.wave_started_at,
            last_spawn_attempt: director.scheduler.last_attempt(),
            next_spawn_delay: director.scheduler.next_delay(),
            won: director.outcome.has_fired(),
        }
    }
}
