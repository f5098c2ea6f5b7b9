use std::fs;
use std::path::{Path, PathBuf};

use engine::{
    CycleDirection, GameState, GridPathfinder, HotspotDefDatabase, HotspotId, HotspotWorld,
    InputEvent, ItemId, SceneCamera, Tilemap, TilemapError, Vec2, Vec3,
};
use serde::Deserialize;
use thiserror::Error;

const DEFAULT_PLAYER_SPEED: f32 = 0.25;

/// Scripted headless session: a scene plus one entry per simulated step.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct Scenario {
    #[serde(default)]
    pub(crate) name: String,
    pub(crate) tilemap: TilemapSpec,
    #[serde(default)]
    pub(crate) player_start: Vec3,
    #[serde(default = "default_player_speed")]
    pub(crate) player_speed: f32,
    #[serde(default)]
    pub(crate) items: Vec<ItemSpec>,
    pub(crate) hotspots: Vec<HotspotPlacement>,
    pub(crate) steps: Vec<ScenarioStep>,
}

fn default_player_speed() -> f32 {
    DEFAULT_PLAYER_SPEED
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct TilemapSpec {
    #[serde(default)]
    pub(crate) origin: Vec2,
    /// Top row first.
    pub(crate) rows: Vec<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct ItemSpec {
    pub(crate) id: ItemId,
    pub(crate) label: String,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub(crate) struct HotspotPlacement {
    pub(crate) def: String,
    pub(crate) position: Vec3,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub(crate) struct ScenarioStep {
    pub(crate) pointer_world: Option<Vec2>,
    pub(crate) event: InputEvent,
    pub(crate) cycle: Option<CycleDirection>,
    pub(crate) select_item: Option<ItemId>,
    pub(crate) clear_item: bool,
    pub(crate) game_state: Option<GameState>,
    /// Placement index of a hotspot whose menu a script opens before this step.
    pub(crate) open_menu: Option<usize>,
    pub(crate) menu_slot: Option<usize>,
    /// Extra idle steps run after this one with the same pointer and no event.
    pub(crate) hold: u32,
}

#[derive(Debug, Error)]
pub(crate) enum ScenarioError {
    #[error("failed to read scenario {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse scenario {path} at {at}: {source}")]
    Parse {
        path: PathBuf,
        at: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("scenario tilemap is invalid: {0}")]
    Tilemap(#[from] TilemapError),
    #[error("scenario places unknown hotspot def '{def}' (hotspots[{index}])")]
    UnknownHotspotDef { def: String, index: usize },
    #[error("player_speed must be finite and > 0, got {0}")]
    InvalidPlayerSpeed(f32),
}

pub(crate) fn load_scenario(path: &Path) -> Result<Scenario, ScenarioError> {
    let raw = fs::read_to_string(path).map_err(|source| ScenarioError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    parse_scenario(path, &raw)
}

pub(crate) fn parse_scenario(path: &Path, raw: &str) -> Result<Scenario, ScenarioError> {
    let mut deserializer = serde_json::Deserializer::from_str(raw);
    let scenario: Scenario =
        serde_path_to_error::deserialize(&mut deserializer).map_err(|error| {
            let at = error.path().to_string();
            ScenarioError::Parse {
                path: path.to_path_buf(),
                at: if at.is_empty() { ".".to_string() } else { at },
                source: error.into_inner(),
            }
        })?;
    if !scenario.player_speed.is_finite() || scenario.player_speed <= 0.0 {
        return Err(ScenarioError::InvalidPlayerSpeed(scenario.player_speed));
    }
    Ok(scenario)
}

/// World state built from a scenario: the registered hotspots in placement
/// order and the navigation grid.
pub(crate) struct DemoScene {
    pub(crate) world: HotspotWorld,
    pub(crate) hotspots: Vec<HotspotId>,
    pub(crate) pathfinder: GridPathfinder,
}

pub(crate) fn build_scene(
    scenario: &Scenario,
    defs: &HotspotDefDatabase,
) -> Result<DemoScene, ScenarioError> {
    let tilemap = Tilemap::from_rows(scenario.tilemap.origin, &scenario.tilemap.rows)?;
    let mut world = HotspotWorld::new(SceneCamera::default());
    let mut hotspots = Vec::with_capacity(scenario.hotspots.len());
    for (index, placement) in scenario.hotspots.iter().enumerate() {
        let id = defs
            .spawn(&mut world, &placement.def, placement.position)
            .ok_or_else(|| ScenarioError::UnknownHotspotDef {
                def: placement.def.clone(),
                index,
            })?;
        hotspots.push(id);
    }
    Ok(DemoScene {
        world,
        hotspots,
        pathfinder: GridPathfinder::new(&tilemap),
    })
}
