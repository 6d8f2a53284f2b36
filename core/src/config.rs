//! Structural configuration consumed by the director.
//!
//! Wave tables, paths and goals are plain data supplied once at construction
//! and never mutated afterwards. [`DirectorConfig::validate`] rejects tables
//! the director could not run to completion.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::{GoalId, PathId, Position, PrototypeId, WaveIndex};

/// Weighted entry of a wave's enemy table.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EnemyWeight {
    /// Prototype the host instantiates when this entry is selected.
    pub prototype: PrototypeId,
    /// Relative selection weight; must be positive.
    pub weight: f64,
}

impl EnemyWeight {
    /// Creates a new weighted entry.
    #[must_use]
    pub fn new(prototype: PrototypeId, weight: f64) -> Self {
        Self { prototype, weight }
    }
}

/// Definition of a single wave.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct WaveConfig {
    /// Seconds between the wave starting and its first spawn attempt.
    pub start_delay: f64,
    /// Total number of enemies spawned during the wave.
    pub enemy_count: u32,
    /// Mean number of seconds between successive spawns.
    pub mean_spawn_interval: f64,
    /// Fraction in `[0, 1]` controlling how far intervals stray from the mean.
    #[serde(default)]
    pub spawn_variance: f64,
    /// Enemy table sampled by weighted choice, in declaration order.
    pub enemies: Vec<EnemyWeight>,
}

impl WaveConfig {
    /// Sum of every entry's weight.
    #[must_use]
    pub fn total_weight(&self) -> f64 {
        self.enemies.iter().map(|entry| entry.weight).sum()
    }

    fn validate(&self, wave: WaveIndex) -> Result<(), ConfigurationError> {
        if !self.start_delay.is_finite() || self.start_delay < 0.0 {
            return Err(ConfigurationError::InvalidStartDelay { wave });
        }
        if !self.mean_spawn_interval.is_finite() || self.mean_spawn_interval < 0.0 {
            return Err(ConfigurationError::InvalidInterval { wave });
        }
        if !(0.0..=1.0).contains(&self.spawn_variance) {
            return Err(ConfigurationError::InvalidVariance { wave });
        }
        if self.enemies.is_empty() {
            return Err(ConfigurationError::NoEnemies { wave });
        }
        if let Some(entry) = self
            .enemies
            .iter()
            .find(|entry| !entry.weight.is_finite() || entry.weight <= 0.0)
        {
            return Err(ConfigurationError::InvalidWeight {
                wave,
                prototype: entry.prototype.clone(),
            });
        }
        let total = self.total_weight();
        if !total.is_finite() || total <= 0.0 {
            return Err(ConfigurationError::NonPositiveTotalWeight { wave });
        }
        Ok(())
    }
}

/// Defended target an enemy attacks at the end of its path.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoalDefinition {
    /// Identifier paths use to reference the goal.
    pub id: GoalId,
    /// Human readable label.
    #[serde(default)]
    pub name: String,
}

/// Ordered waypoints leading to a goal.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PathDefinition {
    /// Identifier of the path.
    pub id: PathId,
    /// Goal attacked by enemies that complete the path.
    pub goal: GoalId,
    /// Waypoints in travel order; enemies spawn at the first one.
    pub waypoints: Vec<Position>,
}

impl PathDefinition {
    /// Position at which enemies following this path are instantiated.
    #[must_use]
    pub fn spawn_point(&self) -> Option<Position> {
        self.waypoints.first().copied()
    }
}

/// Complete structural configuration of a match.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DirectorConfig {
    /// Waves in play order.
    pub waves: Vec<WaveConfig>,
    /// Paths enemies may be routed along.
    pub paths: Vec<PathDefinition>,
    /// Goals paths lead to.
    pub goals: Vec<GoalDefinition>,
}

impl DirectorConfig {
    /// Checks that the director can run every configured wave.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        if self.waves.is_empty() {
            return Err(ConfigurationError::NoWaves);
        }
        if self.paths.is_empty() {
            return Err(ConfigurationError::NoPaths);
        }
        for path in &self.paths {
            if path.waypoints.is_empty() {
                return Err(ConfigurationError::EmptyPath { path: path.id });
            }
            if !self.goals.iter().any(|goal| goal.id == path.goal) {
                return Err(ConfigurationError::UnknownGoal {
                    path: path.id,
                    goal: path.goal,
                });
            }
        }
        for (index, wave) in self.waves.iter().enumerate() {
            let index = u32::try_from(index).map_err(|_| ConfigurationError::WaveIndexOutOfRange {
                wave: WaveIndex::new(u32::MAX),
                waves: self.waves.len(),
            })?;
            wave.validate(WaveIndex::new(index))?;
        }
        Ok(())
    }

    /// Looks up the wave stored at `index`.
    pub fn wave(&self, index: WaveIndex) -> Result<&WaveConfig, ConfigurationError> {
        self.waves
            .get(index.as_usize())
            .ok_or(ConfigurationError::WaveIndexOutOfRange {
                wave: index,
                waves: self.waves.len(),
            })
    }

    /// Reports whether `index` refers to the final configured wave or beyond.
    #[must_use]
    pub fn is_last_wave(&self, index: WaveIndex) -> bool {
        index.as_usize().saturating_add(1) >= self.waves.len()
    }
}

/// Reasons a configuration cannot drive the director.
#[derive(Clone, Debug, PartialEq, Error)]
pub enum ConfigurationError {
    /// The wave table is empty.
    #[error("no waves configured")]
    NoWaves,
    /// A wave has no enemy entries to choose from.
    #[error("wave {wave} has no enemies configured")]
    NoEnemies {
        /// Offending wave.
        wave: WaveIndex,
    },
    /// An entry carries a zero, negative, or non-finite weight.
    #[error("wave {wave} assigns an invalid weight to prototype `{prototype}`")]
    InvalidWeight {
        /// Offending wave.
        wave: WaveIndex,
        /// Prototype whose weight is invalid.
        prototype: PrototypeId,
    },
    /// The weights of a wave do not sum to a positive value.
    #[error("wave {wave} has a non-positive total weight")]
    NonPositiveTotalWeight {
        /// Offending wave.
        wave: WaveIndex,
    },
    /// No path is configured.
    #[error("no paths configured")]
    NoPaths,
    /// A path carries no waypoints to spawn at.
    #[error("path {path} has no waypoints")]
    EmptyPath {
        /// Offending path.
        path: PathId,
    },
    /// A path references a goal that does not exist.
    #[error("path {path} leads to unknown goal {goal}")]
    UnknownGoal {
        /// Offending path.
        path: PathId,
        /// Goal the path references.
        goal: GoalId,
    },
    /// Spawn variance lies outside `[0, 1]`.
    #[error("wave {wave} has a spawn variance outside [0, 1]")]
    InvalidVariance {
        /// Offending wave.
        wave: WaveIndex,
    },
    /// Mean spawn interval is negative or non-finite.
    #[error("wave {wave} has an invalid mean spawn interval")]
    InvalidInterval {
        /// Offending wave.
        wave: WaveIndex,
    },
    /// Start delay is negative or non-finite.
    #[error("wave {wave} has an invalid start delay")]
    InvalidStartDelay {
        /// Offending wave.
        wave: WaveIndex,
    },
    /// The director looked up a wave past the end of the table.
    #[error("wave {wave} is out of range for {waves} configured waves")]
    WaveIndexOutOfRange {
        /// Requested wave.
        wave: WaveIndex,
        /// Number of configured waves.
        waves: usize,
    },
}
