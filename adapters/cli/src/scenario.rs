//! Scenario files describing a complete headless match.

use std::{fs, path::Path};

use anyhow::{bail, ensure, Context, Result};
use serde::Deserialize;
use wave_director_arena::ArenaSettings;
use wave_director_core::{DirectorConfig, GoalDefinition, PathDefinition, WaveConfig};

const SUPPORTED_SCENARIO_VERSION: u32 = 1;
const BUNDLED_SCENARIO: &str = include_str!("../config/default.toml");

/// Director tables plus arena tunables for a single run.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Scenario {
    pub(crate) director: DirectorConfig,
    pub(crate) arena: ArenaSettings,
}

impl Scenario {
    /// Reads and validates the scenario stored at `path`.
    pub(crate) fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario at {}", path.display()))?;
        Self::parse(&contents)
            .with_context(|| format!("invalid scenario at {}", path.display()))
    }

    /// Scenario compiled into the binary.
    pub(crate) fn bundled() -> Result<Self> {
        Self::parse(BUNDLED_SCENARIO).context("bundled scenario is invalid")
    }

    fn parse(contents: &str) -> Result<Self> {
        let file: ScenarioFile =
            toml::from_str(contents).context("failed to parse scenario toml contents")?;
        if file.version != SUPPORTED_SCENARIO_VERSION {
            bail!(
                "unsupported scenario version {}; expected {}",
                file.version,
                SUPPORTED_SCENARIO_VERSION
            );
        }

        let arena = ArenaSettings {
            speed: file.arena.speed,
            lethality: file.arena.lethality,
        };
        ensure!(
            arena.speed.is_finite() && arena.speed > 0.0,
            "arena speed must be positive, got {}",
            arena.speed
        );
        ensure_lethality(arena.lethality)?;

        let director = DirectorConfig {
            waves: file.waves,
            paths: file.paths,
            goals: file.goals,
        };
        director
            .validate()
            .context("scenario cannot drive the wave director")?;

        Ok(Self { director, arena })
    }
}

/// Rejects probabilities outside `[0, 1]`.
pub(crate) fn ensure_lethality(lethality: f64) -> Result<()> {
    ensure!(
        (0.0..=1.0).contains(&lethality),
        "lethality must lie in [0, 1], got {lethality}"
    );
    Ok(())
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    version: u32,
    #[serde(default)]
    arena: ArenaSection,
    goals: Vec<GoalDefinition>,
    paths: Vec<PathDefinition>,
    waves: Vec<WaveConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(default)]
struct ArenaSection {
    speed: f64,
    lethality: f64,
}

impl Default for ArenaSection {
    fn default() -> Self {
        let settings = ArenaSettings::default();
        Self {
            speed: settings.speed,
            lethality: settings.lethality,
        }
    }
}

#[cfg(test)]
mod tests {
    use wave_director_core::{GoalId, PathId, Position};

    use super::*;

    const MINIMAL: &str = r#"
        version = 1

        [[goals]]
        id = 4

        [[paths]]
        id = 2
        goal = 4
        waypoints = [{ x = 1.0, y = 2.0 }]

        [[waves]]
        start_delay = 0.5
        enemy_count = 3
        mean_spawn_interval = 1.0
        enemies = [{ prototype = "grunt", weight = 1.0 }]
    "#;

    #[test]
    fn bundled_scenario_is_valid() {
        let scenario = Scenario::bundled().expect("bundled scenario");
        assert_eq!(scenario.director.waves.len(), 3);
        assert_eq!(scenario.director.paths.len(), 2);
        assert_eq!(scenario.director.goals.len(), 2);
        assert!((scenario.arena.lethality - 0.85).abs() < f64::EPSILON);
    }

    #[test]
    fn omitted_sections_fall_back_to_defaults() {
        let scenario = Scenario::parse(MINIMAL).expect("minimal scenario");
        assert_eq!(scenario.arena, ArenaSettings::default());
        assert_eq!(scenario.director.goals[0].id, GoalId::new(4));
        assert!(scenario.director.goals[0].name.is_empty());

        let path = &scenario.director.paths[0];
        assert_eq!(path.id, PathId::new(2));
        assert_eq!(path.spawn_point(), Some(Position::new(1.0, 2.0, 0.0)));
        assert_eq!(scenario.director.waves[0].spawn_variance, 0.0);
    }

    #[test]
    fn unknown_version_is_rejected() {
        let contents = MINIMAL.replacen("version = 1", "version = 7", 1);
        let error = Scenario::parse(&contents).expect_err("version mismatch");
        assert!(error.to_string().contains("unsupported scenario version 7"));
    }

    #[test]
    fn invalid_tables_are_rejected() {
        let contents = MINIMAL.replacen("goal = 4", "goal = 5", 1);
        let error = Scenario::parse(&contents).expect_err("dangling goal");
        assert!(format!("{error:#}").contains("unknown goal 5"));
    }

    #[test]
    fn lethality_outside_unit_interval_is_rejected() {
        assert!(ensure_lethality(0.0).is_ok());
        assert!(ensure_lethality(1.0).is_ok());
        assert!(ensure_lethality(1.5).is_err());
        assert!(ensure_lethality(-0.1).is_err());
    }
}
