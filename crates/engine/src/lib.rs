use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use thiserror::Error;

pub mod content;
pub mod detection;
pub mod events;
pub mod geometry;
pub mod hotspot;
pub mod indexer;
pub mod input;
pub mod label;
pub mod nav;
pub mod requests;
pub mod resolver;
pub mod runtime;
pub mod services;
pub mod session;
pub mod settings;

pub use content::{
    compile_hotspot_defs, parse_hotspot_defs, ContentCompileError, ContentErrorCode, HotspotDef,
    HotspotDefDatabase, HotspotDefId, SourceLocation,
};
pub use events::{
    Notification, NotificationCounts, NotificationKind, ObserverId, ObserverRegistry,
    ObserverScope,
};
pub use geometry::{
    Camera2D, Camera3D, Ray, SceneCamera, Vec2, Vec3, Viewport, PIXELS_PER_WORLD,
};
pub use hotspot::{
    Button, Collider, DispatchTarget, DoubleClickPolicy, Handler, Hotspot, HotspotId,
    HotspotWorld, IconId, InteractionKind, InteractionRef, InteractiveBoundary, ItemId, Marker,
    PlayerAction,
};
pub use input::{CycleDirection, InputEvent, InputSnapshot};
pub use nav::{GridPathfinder, Tilemap, TilemapError, NAV_BLOCKED_TILE_ID};
pub use requests::{InteractionRequest, RequestQueue};
pub use runtime::{GameState, InteractionRuntime, StepReport};
pub use services::{
    DispatchError, DispatchParams, InteractionDispatcher, Inventory, ParameterValue, Pathfinder,
    PlayerCharacter, Services,
};
pub use session::{SessionState, SessionStatus};
pub use settings::{
    load_settings, InteractionMethod, InteractionSettings, SeeInteractions, SelectInteractions,
    SettingsError,
};

pub const ROOT_ENV_VAR: &str = "HOTSPOT_ROOT";
pub const SETTINGS_ENV_VAR: &str = "HOTSPOT_SETTINGS";

#[derive(Debug, Clone)]
pub struct AppPaths {
    pub root: PathBuf,
    pub settings_path: PathBuf,
    pub hotspot_defs_dir: PathBuf,
    pub scenarios_dir: PathBuf,
}

#[derive(Debug, Error)]
pub enum StartupError {
    #[error("failed to read environment variable {var}: {source}")]
    EnvVar {
        var: &'static str,
        #[source]
        source: env::VarError,
    },
    #[error("failed to resolve current executable path: {0}")]
    CurrentExe(#[source] std::io::Error),
    #[error("current executable path has no parent directory: {0}")]
    ExeHasNoParent(PathBuf),
    #[error(
        "HOTSPOT_ROOT is set but does not point to a valid project root: {path}\n\
A valid root must contain Cargo.toml and either crates/ or assets/."
    )]
    InvalidEnvRoot { path: PathBuf },
    #[error(
        "Could not detect project root by walking upward from executable directory: {start_dir}\n\
Expected a directory containing Cargo.toml and either crates/ or assets/.\n\
Set {env_var} explicitly, for example:\n\
Bash/zsh: export {env_var}=\"/path/to/hotspot-engine\""
    )]
    RootNotFound {
        start_dir: PathBuf,
        env_var: &'static str,
    },
}

pub fn resolve_app_paths() -> Result<AppPaths, StartupError> {
    let root = resolve_root()?;
    let assets = root.join("assets");
    let settings_path = match env::var(SETTINGS_ENV_VAR) {
        Ok(value) => PathBuf::from(value),
        Err(env::VarError::NotPresent) => assets.join("settings.json"),
        Err(source) => {
            return Err(StartupError::EnvVar {
                var: SETTINGS_ENV_VAR,
                source,
            })
        }
    };

    Ok(AppPaths {
        hotspot_defs_dir: assets.join("hotspots"),
        scenarios_dir: assets.join("scenarios"),
        settings_path,
        root,
    })
}

fn resolve_root() -> Result<PathBuf, StartupError> {
    match env::var(ROOT_ENV_VAR) {
        Ok(value) => {
            let normalized = normalize_path(&PathBuf::from(value));
            if is_repo_marker(&normalized) {
                Ok(normalized)
            } else {
                Err(StartupError::InvalidEnvRoot { path: normalized })
            }
        }
        Err(env::VarError::NotPresent) => {
            let exe = env::current_exe().map_err(StartupError::CurrentExe)?;
            let exe_dir = exe
                .parent()
                .map(Path::to_path_buf)
                .ok_or_else(|| StartupError::ExeHasNoParent(exe.clone()))?;
            find_root_upward(&exe_dir).ok_or_else(|| StartupError::RootNotFound {
                start_dir: normalize_path(&exe_dir),
                env_var: ROOT_ENV_VAR,
            })
        }
        Err(source) => Err(StartupError::EnvVar {
            var: ROOT_ENV_VAR,
            source,
        }),
    }
}

fn find_root_upward(start: &Path) -> Option<PathBuf> {
    start
        .ancestors()
        .find(|candidate| is_repo_marker(candidate))
        .map(normalize_path)
}

fn is_repo_marker(path: &Path) -> bool {
    let cargo_toml = path.join("Cargo.toml").is_file();
    let has_crates = path.join("crates").is_dir();
    let has_assets = path.join("assets").is_dir();

    cargo_toml && (has_crates || has_assets)
}

fn normalize_path(path: &Path) -> PathBuf {
    fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn repo_marker_requires_cargo_toml() {
        let cwd = env::current_dir().expect("cwd");
        assert!(!is_repo_marker(&cwd.join("definitely_not_a_marker")));
    }

    #[test]
    fn root_is_found_from_nested_directory() {
        let temp = TempDir::new().expect("temp");
        let root = temp.path();
        fs::write(root.join("Cargo.toml"), "[workspace]").expect("write");
        fs::create_dir_all(root.join("assets")).expect("assets");
        let nested = root.join("target").join("debug");
        fs::create_dir_all(&nested).expect("nested");

        let found = find_root_upward(&nested).expect("root");
        assert_eq!(found, normalize_path(root));
    }
}
