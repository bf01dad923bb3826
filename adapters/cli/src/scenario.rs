//! JSON scenarios replayed against a fresh battle.

use std::{fs, path::Path};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tactics_grid_core::{Command, ConfigError, Event, GridConfig, Team, TerrainKind, UnitId};
use tactics_grid_system_engagement::Engagement;
use tactics_grid_world::{apply, query, Battle};
use thiserror::Error;

/// Grid configuration plus the ordered commands to replay on it.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub(crate) struct Scenario {
    pub(crate) config: GridConfig,
    #[serde(default)]
    pub(crate) terrain_seed: u64,
    #[serde(default)]
    pub(crate) commands: Vec<Command>,
}

/// Errors that can occur while decoding a scenario.
#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    /// The payload is not a well-formed scenario document.
    #[error("scenario is not valid JSON: {0}")]
    InvalidJson(#[from] serde_json::Error),
    /// The grid configuration fails validation.
    #[error("scenario grid configuration is invalid: {0}")]
    InvalidConfig(#[from] ConfigError),
}

impl Scenario {
    /// Decodes and validates a scenario from its JSON representation.
    pub(crate) fn decode(value: &str) -> Result<Self, ScenarioError> {
        let scenario: Self = serde_json::from_str(value)?;
        scenario.config.validate()?;
        Ok(scenario)
    }

    pub(crate) fn load(path: &Path) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path)
            .with_context(|| format!("failed to read scenario {}", path.display()))?;
        Self::decode(&text).with_context(|| format!("failed to decode scenario {}", path.display()))
    }

    /// Configures a battle from the scenario and applies every command in order.
    pub(crate) fn replay(&self) -> Report {
        let mut battle = Battle::default();
        let mut events = Vec::new();
        apply(
            &mut battle,
            Command::ConfigureGrid {
                config: self.config,
                terrain_seed: self.terrain_seed,
            },
            &mut events,
        );
        for command in &self.commands {
            apply(&mut battle, command.clone(), &mut events);
        }
        log::info!(
            "replayed {} commands into {} events",
            self.commands.len(),
            events.len()
        );

        let mut engaged = Vec::new();
        let mut engagement = Engagement::new();
        engagement.handle(
            &events,
            query::settings(&battle),
            |position, unit, size| query::can_be_attacked_by_melee(&battle, position, unit, size),
            &mut engaged,
        );

        Report {
            size: query::grid(&battle).size(),
            terrain: query::terrain(&battle),
            board: query::grid(&battle).to_string(),
            matrix: top_first(query::matrix(&battle)),
            lower_aggression: top_first(query::aggression_for_team(&battle, Team::Lower).rows()),
            upper_aggression: top_first(query::aggression_for_team(&battle, Team::Upper).rows()),
            engaged,
            events,
        }
    }
}

/// Final state of a replayed scenario.
///
/// Row vectors are listed top row first so they read like the board.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub(crate) struct Report {
    pub(crate) size: u32,
    pub(crate) terrain: TerrainKind,
    pub(crate) board: String,
    pub(crate) matrix: Vec<Vec<i32>>,
    pub(crate) lower_aggression: Vec<Vec<i32>>,
    pub(crate) upper_aggression: Vec<Vec<i32>>,
    pub(crate) engaged: Vec<UnitId>,
    pub(crate) events: Vec<Event>,
}

fn top_first(mut rows: Vec<Vec<i32>>) -> Vec<Vec<i32>> {
    rows.reverse();
    rows
}
