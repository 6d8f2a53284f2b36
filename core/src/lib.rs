#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Core contracts shared across the wave director workspace.
//!
//! This crate defines the message surface that connects engine adapters, the
//! authoritative director, and the pure spawning system. Adapters submit
//! [`Command`] values describing what happened on their side of the frame loop
//! (a tick elapsed, an enemy died, an enemy reached its goal), the director
//! executes those commands through its `apply` entry point, and then broadcasts
//! [`Event`] values describing the resulting phase changes and spawns.
//!
//! Collaborators that the director never owns are expressed as traits:
//! [`UniformSource`] for random draws, [`EnemyHost`] for instantiating enemies,
//! and [`Clock`] for the monotonic game clock.

use std::fmt;

use serde::{Deserialize, Serialize};

mod config;

pub use config::{
    ConfigurationError, DirectorConfig, EnemyWeight, GoalDefinition, PathDefinition, WaveConfig,
};

/// Lifecycle phase of the wave director.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Phase {
    /// Waiting for the current wave's start delay to elapse.
    #[default]
    PreWave,
    /// Spawning enemies for the current wave.
    WaveActive,
    /// Every enemy of the wave was spawned; waiting for all of them to resolve.
    SpawnComplete,
    /// The wave resolved and another wave remains; advances on its next tick.
    WaveComplete,
    /// The final wave resolved. Terminal.
    GameOver,
}

impl Phase {
    /// Reports whether the phase never transitions again.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::GameOver)
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::PreWave => "pre-wave",
            Self::WaveActive => "wave-active",
            Self::SpawnComplete => "spawn-complete",
            Self::WaveComplete => "wave-complete",
            Self::GameOver => "game-over",
        };
        f.write_str(label)
    }
}

/// Zero-based index of a wave within the configured wave table.
#[derive(
    Clone, Copy, Debug, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct WaveIndex(u32);

impl WaveIndex {
    /// Index of the opening wave.
    pub const FIRST: Self = Self(0);

    /// Creates a new wave index with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the index.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }

    /// Returns the index of the wave that follows this one.
    #[must_use]
    pub const fn next(self) -> Self {
        Self(self.0.saturating_add(1))
    }

    /// Converts the index into a position usable for slice lookups.
    #[must_use]
    pub fn as_usize(self) -> usize {
        usize::try_from(self.0).unwrap_or(usize::MAX)
    }
}

impl fmt::Display for WaveIndex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Opaque reference to an enemy prototype understood by the host.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PrototypeId(String);

impl PrototypeId {
    /// Creates a prototype reference from the provided name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// Name the host uses to resolve the prototype.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PrototypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Unique identifier assigned to a path definition.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct PathId(u32);

impl PathId {
    /// Creates a new path identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for PathId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Unique identifier assigned to a defended goal.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct GoalId(u32);

impl GoalId {
    /// Creates a new goal identifier with the provided numeric value.
    #[must_use]
    pub const fn new(value: u32) -> Self {
        Self(value)
    }

    /// Retrieves the numeric representation of the identifier.
    #[must_use]
    pub const fn get(&self) -> u32 {
        self.0
    }
}

impl fmt::Display for GoalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Location in host world space.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Position {
    /// Horizontal coordinate.
    pub x: f32,
    /// Vertical coordinate.
    pub y: f32,
    /// Depth coordinate; zero for flat maps.
    #[serde(default)]
    pub z: f32,
}

impl Position {
    /// Creates a new position from its components.
    #[must_use]
    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }
}

/// Aggregate per-wave tallies used as transition predicates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WaveCounters {
    /// Enemies instantiated during the current wave.
    pub spawned: u32,
    /// Enemies reported dead during the current wave.
    pub dead: u32,
    /// Enemies reported at their goal during the current wave.
    pub reached_goal: u32,
}

impl WaveCounters {
    /// Number of enemies that reached a terminal outcome.
    #[must_use]
    pub const fn resolved(&self) -> u32 {
        self.dead.saturating_add(self.reached_goal)
    }
}

/// Why the outcome signal fired.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WinCause {
    /// The final wave resolved and no enemy remains alive.
    AllEnemiesCleared,
    /// The debug override fired the signal regardless of state.
    ManualOverride,
}

/// Commands that express every input the director reacts to.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Command {
    /// Runs one frame of director logic at the provided game time.
    Tick {
        /// Monotonic game time in seconds.
        now: f64,
    },
    /// An enemy attributed to the current wave died.
    EnemyDied,
    /// An enemy attributed to the current wave reached its goal.
    EnemyReachedGoal,
    /// Fires the outcome signal, bypassing every state check.
    ForceWin,
}

/// Events broadcast by the director after processing commands.
#[derive(Clone, Debug, PartialEq)]
pub enum Event {
    /// The director committed a phase transition.
    PhaseChanged {
        /// Phase active before the transition.
        from: Phase,
        /// Phase active after the transition.
        to: Phase,
        /// Wave in progress when the transition happened.
        wave: WaveIndex,
    },
    /// The director asked the host to instantiate an enemy.
    EnemySpawned {
        /// Wave the enemy belongs to.
        wave: WaveIndex,
        /// Prototype selected by weighted choice.
        prototype: PrototypeId,
        /// Path the enemy follows.
        path: PathId,
        /// Goal the enemy attacks at the end of its path.
        goal: GoalId,
    },
    /// The director moved on to the next configured wave.
    WaveAdvanced {
        /// Index of the wave that just began.
        wave: WaveIndex,
    },
    /// The match was won.
    GameWon {
        /// What triggered the outcome signal.
        cause: WinCause,
    },
    /// More enemies resolved than the wave contains.
    ResolutionOverflow {
        /// Wave whose tallies overflowed.
        wave: WaveIndex,
        /// Dead plus goal-reached enemies recorded so far.
        resolved: u32,
        /// Configured enemy count of the wave.
        enemy_count: u32,
    },
}

/// Source of uniformly distributed random numbers.
pub trait UniformSource {
    /// Draws a value in the half-open range `[low, high)`.
    ///
    /// Implementations return `low` when the range is empty.
    fn uniform(&mut self, low: f64, high: f64) -> f64;
}

/// Everything the host needs to instantiate a single enemy.
#[derive(Clone, Copy, Debug)]
pub struct SpawnRequest<'a> {
    /// Wave the enemy belongs to.
    pub wave: WaveIndex,
    /// Prototype to instantiate.
    pub prototype: &'a PrototypeId,
    /// Path the enemy should follow.
    pub path: &'a PathDefinition,
    /// Goal the enemy attacks when it completes the path.
    pub goal: GoalId,
    /// Initial placement, the first waypoint of the path.
    pub position: Position,
}

/// Engine collaborator that owns live enemy entities.
pub trait EnemyHost {
    /// Handle the host returns for an instantiated enemy.
    type Handle;

    /// Instantiates an enemy configured with the request's path and goal.
    fn spawn(&mut self, request: &SpawnRequest<'_>) -> Self::Handle;

    /// Number of enemies currently alive in the host world.
    fn live_enemy_count(&self) -> usize;
}

/// Monotonic game clock.
pub trait Clock {
    /// Current game time in seconds.
    fn now(&self) -> f64;
}

/// Clock that advances by a fixed step per frame, for headless runs.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FixedStepClock {
    step: f64,
    now: f64,
}

impl FixedStepClock {
    /// Creates a clock starting at zero that advances by `step` seconds.
    #[must_use]
    pub const fn new(step: f64) -> Self {
        Self { step, now: 0.0 }
    }

    /// Creates a clock that advances `rate` frames per second.
    #[must_use]
    pub fn from_rate(rate: u32) -> Self {
        Self::new(1.0 / f64::from(rate.max(1)))
    }

    /// Seconds added by each call to [`FixedStepClock::advance`].
    #[must_use]
    pub const fn step(&self) -> f64 {
        self.step
    }

    /// Moves the clock forward by one step and returns the new time.
    pub fn advance(&mut self) -> f64 {
        self.now += self.step;
        self.now
    }
}

impl Clock for FixedStepClock {
    fn now(&self) -> f64 {
        self.now
    }
}
