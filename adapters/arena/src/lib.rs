#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless enemy host used to exercise the wave director without an engine.
//!
//! Every enemy walks its path at a constant speed. When it is instantiated the
//! arena decides its fate up front: with probability `lethality` it dies at a
//! uniformly drawn moment before reaching the goal, otherwise it reaches the
//! goal once it has walked the whole path.

use wave_director_core::{EnemyHost, GoalId, PrototypeId, SpawnRequest, UniformSource, WaveIndex};

/// Shortest time an enemy spends in the arena, for single-waypoint paths.
const MIN_TRAVEL_SECONDS: f64 = 0.5;

/// Identifier of an enemy instantiated by the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EnemyHandle(u32);

impl EnemyHandle {
    /// Retrieves the numeric representation of the handle.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

/// Tunables of the simulated arena.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ArenaSettings {
    /// World units walked per second.
    pub speed: f64,
    /// Probability in `[0, 1]` that an enemy dies before reaching its goal.
    pub lethality: f64,
}

impl Default for ArenaSettings {
    fn default() -> Self {
        Self {
            speed: 4.0,
            lethality: 0.8,
        }
    }
}

/// How an enemy left the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnemyFate {
    /// The enemy was killed on its way.
    Died,
    /// The enemy completed its path.
    ReachedGoal,
}

/// Enemy that left the arena during [`Arena::advance`].
#[derive(Clone, Debug, PartialEq)]
pub struct Resolution {
    /// Handle returned when the enemy was spawned.
    pub handle: EnemyHandle,
    /// Wave the enemy was spawned for.
    pub wave: WaveIndex,
    /// Prototype the enemy was instantiated from.
    pub prototype: PrototypeId,
    /// Goal the enemy was heading for.
    pub goal: GoalId,
    /// What happened to it.
    pub fate: EnemyFate,
}

#[derive(Clone, Debug)]
struct Enemy {
    handle: EnemyHandle,
    wave: WaveIndex,
    prototype: PrototypeId,
    goal: GoalId,
    resolves_at: f64,
    fate: EnemyFate,
}

/// Simulated world that owns live enemies.
#[derive(Debug)]
pub struct Arena<R> {
    settings: ArenaSettings,
    rng: R,
    now: f64,
    next_handle: u32,
    enemies: Vec<Enemy>,
}

impl<R: UniformSource> Arena<R> {
    /// Creates an empty arena drawing enemy fates from `rng`.
    #[must_use]
    pub fn new(settings: ArenaSettings, rng: R) -> Self {
        Self {
            settings,
            rng,
            now: 0.0,
            next_handle: 0,
            enemies: Vec::new(),
        }
    }

    /// Moves the arena clock to `now` and removes every enemy whose fate came due.
    ///
    /// Resolutions are reported in the order they happened.
    pub fn advance(&mut self, now: f64) -> Vec<Resolution> {
        self.now = now;

        let mut due = Vec::new();
        self.enemies.retain(|enemy| {
            if enemy.resolves_at <= now {
                due.push(enemy.clone());
                false
            } else {
                true
            }
        });
        due.sort_by(|a, b| {
            a.resolves_at
                .total_cmp(&b.resolves_at)
                .then(a.handle.cmp(&b.handle))
        });

        due.into_iter()
            .map(|enemy| Resolution {
                handle: enemy.handle,
                wave: enemy.wave,
                prototype: enemy.prototype,
                goal: enemy.goal,
                fate: enemy.fate,
            })
            .collect()
    }

    /// Current arena time.
    #[must_use]
    pub const fn now(&self) -> f64 {
        self.now
    }

    fn travel_time(&self, request: &SpawnRequest<'_>) -> f64 {
        let length: f64 = request
            .path
            .waypoints
            .windows(2)
            .map(|pair| {
                let dx = f64::from(pair[1].x - pair[0].x);
                let dy = f64::from(pair[1].y - pair[0].y);
                let dz = f64::from(pair[1].z - pair[0].z);
                (dx * dx + dy * dy + dz * dz).sqrt()
            })
            .sum();
        if self.settings.speed > 0.0 {
            (length / self.settings.speed).max(MIN_TRAVEL_SECONDS)
        } else {
            MIN_TRAVEL_SECONDS
        }
    }
}

impl<R: UniformSource> EnemyHost for Arena<R> {
    type Handle = EnemyHandle;

    fn spawn(&mut self, request: &SpawnRequest<'_>) -> EnemyHandle {
        let handle = EnemyHandle(self.next_handle);
        self.next_handle = self.next_handle.wrapping_add(1);

        let travel = self.travel_time(request);
        let (fate, resolves_at) = if self.rng.uniform(0.0, 1.0) < self.settings.lethality {
            (EnemyFate::Died, self.now + self.rng.uniform(0.0, travel))
        } else {
            (EnemyFate::ReachedGoal, self.now + travel)
        };

        tracing::trace!(
            handle = handle.get(),
            prototype = %request.prototype,
            goal = request.goal.get(),
            ?fate,
            resolves_at,
            "enemy entered arena"
        );
        self.enemies.push(Enemy {
            handle,
            wave: request.wave,
            prototype: request.prototype.clone(),
            goal: request.goal,
            resolves_at,
            fate,
        });
        handle
    }

    fn live_enemy_count(&self) -> usize {
        self.enemies.len()
    }
}
