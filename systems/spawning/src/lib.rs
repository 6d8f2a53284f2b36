#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Spawn scheduler that paces enemy emission within an active wave.
//!
//! The scheduler owns only its timing state. Wave tables and paths are
//! borrowed per call and randomness is drawn from an injected
//! [`UniformSource`], so identical inputs replay identically.

use rand::{Rng, RngCore, SeedableRng};
use rand_chacha::ChaCha8Rng;

use wave_director_core::{
    ConfigurationError, EnemyWeight, PathDefinition, Position, PrototypeId, UniformSource,
    WaveConfig, WaveIndex,
};

/// Enemy the scheduler decided to emit on this tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnPlan<'c> {
    /// Prototype picked by weighted choice.
    pub prototype: &'c PrototypeId,
    /// Path picked uniformly at random.
    pub path: &'c PathDefinition,
    /// First waypoint of the path.
    pub position: Position,
}

/// Timing state deciding when the next enemy of a wave is due.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpawnScheduler {
    last_attempt: f64,
    next_delay: f64,
}

impl SpawnScheduler {
    /// Creates a scheduler whose first attempt is due immediately after `started_at`.
    #[must_use]
    pub const fn new(started_at: f64) -> Self {
        Self {
            last_attempt: started_at,
            next_delay: 0.0,
        }
    }

    /// Restarts the gate at `now` for a new wave.
    ///
    /// The delay sampled after the previous wave's last spawn stays in effect.
    pub fn restart(&mut self, now: f64) {
        self.last_attempt = now;
    }

    /// Time of the most recent spawn, or of the last restart.
    #[must_use]
    pub const fn last_attempt(&self) -> f64 {
        self.last_attempt
    }

    /// Seconds that must elapse after [`SpawnScheduler::last_attempt`].
    #[must_use]
    pub const fn next_delay(&self) -> f64 {
        self.next_delay
    }

    /// Reports whether a spawn is allowed at `now`.
    #[must_use]
    pub fn is_due(&self, now: f64) -> bool {
        now - self.last_attempt >= self.next_delay
    }

    /// Decides whether to emit an enemy at `now`, and which one.
    ///
    /// Returns `Ok(None)` while the gate is closed. When a plan is returned the
    /// gate is re-armed with a freshly sampled delay; the caller is expected to
    /// hand the plan to its host.
    pub fn poll<'c, R>(
        &mut self,
        now: f64,
        wave_index: WaveIndex,
        wave: &'c WaveConfig,
        paths: &'c [PathDefinition],
        rng: &mut R,
    ) -> Result<Option<SpawnPlan<'c>>, ConfigurationError>
    where
        R: UniformSource + ?Sized,
    {
        if !self.is_due(now) {
            return Ok(None);
        }

        let path = choose_uniform(paths, rng).ok_or(ConfigurationError::NoPaths)?;
        let entry = weighted_choice(wave_index, &wave.enemies, rng)?;
        let position = path
            .spawn_point()
            .ok_or(ConfigurationError::EmptyPath { path: path.id })?;

        self.last_attempt = now;
        self.next_delay = next_spawn_delay(wave.mean_spawn_interval, wave.spawn_variance, rng);
        tracing::trace!(
            wave = wave_index.get(),
            next_delay = self.next_delay,
            "spawn gate re-armed"
        );

        Ok(Some(SpawnPlan {
            prototype: &entry.prototype,
            path,
            position,
        }))
    }
}

/// Picks an element uniformly at random, or `None` when `items` is empty.
pub fn choose_uniform<'a, T, R>(items: &'a [T], rng: &mut R) -> Option<&'a T>
where
    R: UniformSource + ?Sized,
{
    let last = items.len().checked_sub(1)?;
    let draw = rng.uniform(0.0, items.len() as f64).floor();
    let index = (draw as usize).min(last);
    items.get(index)
}

/// Picks an entry with probability proportional to its weight.
///
/// Draws `r` in `[0, total)` and returns the first entry whose cumulative
/// weight exceeds `r`. A draw that falls through every entry through rounding
/// yields the last entry.
pub fn weighted_choice<'e, R>(
    wave: WaveIndex,
    entries: &'e [EnemyWeight],
    rng: &mut R,
) -> Result<&'e EnemyWeight, ConfigurationError>
where
    R: UniformSource + ?Sized,
{
    let Some(last) = entries.last() else {
        return Err(ConfigurationError::NoEnemies { wave });
    };

    let total: f64 = entries.iter().map(|entry| entry.weight).sum();
    if !total.is_finite() || total <= 0.0 {
        return Err(ConfigurationError::NonPositiveTotalWeight { wave });
    }

    let draw = rng.uniform(0.0, total);
    let mut cumulative = 0.0;
    for entry in entries {
        cumulative += entry.weight;
        if draw < cumulative {
            return Ok(entry);
        }
    }

    Ok(last)
}

/// Samples the delay before the next spawn of a wave.
///
/// Results are uniform in `[(1 - variance) * mean, (1 + variance) * mean)`.
pub fn next_spawn_delay<R>(mean: f64, variance: f64, rng: &mut R) -> f64
where
    R: UniformSource + ?Sized,
{
    2.0 * variance * mean * rng.uniform(0.0, 1.0) + (1.0 - variance) * mean
}

/// [`UniformSource`] backed by a `rand` generator.
#[derive(Clone, Debug)]
pub struct RngSource<R> {
    rng: R,
}

impl<R: RngCore> RngSource<R> {
    /// Wraps the provided generator.
    #[must_use]
    pub const fn new(rng: R) -> Self {
        Self { rng }
    }

    /// Consumes the wrapper, yielding the generator.
    #[must_use]
    pub fn into_inner(self) -> R {
        self.rng
    }
}

impl RngSource<ChaCha8Rng> {
    /// Creates a deterministic source from a seed.
    #[must_use]
    pub fn seeded(seed: u64) -> Self {
        Self::new(ChaCha8Rng::seed_from_u64(seed))
    }
}

impl<R: RngCore> UniformSource for RngSource<R> {
    fn uniform(&mut self, low: f64, high: f64) -> f64 {
        if !(high > low) {
            return low;
        }
        self.rng.gen_range(low..high)
    }
}
