use std::env;
use std::path::PathBuf;

use engine::{
    compile_hotspot_defs, load_settings, resolve_app_paths, ContentCompileError,
    HotspotDefDatabase, InteractionSettings, SettingsError, StartupError,
};
use thiserror::Error;
use tracing::info;
use tracing_subscriber::EnvFilter;

use super::scenario::{load_scenario, Scenario, ScenarioError};

const SCENARIO_ENV_VAR: &str = "HOTSPOT_SCENARIO";
const DEFAULT_SCENARIO_FILE: &str = "demo.json";

#[derive(Debug, Error)]
pub(crate) enum BootstrapError {
    #[error(transparent)]
    Startup(#[from] StartupError),
    #[error(transparent)]
    Settings(#[from] SettingsError),
    #[error(transparent)]
    Content(#[from] ContentCompileError),
    #[error(transparent)]
    Scenario(#[from] ScenarioError),
}

pub(crate) struct AppWiring {
    pub(crate) settings: InteractionSettings,
    pub(crate) defs: HotspotDefDatabase,
    pub(crate) scenario: Scenario,
}

pub(crate) fn build_app() -> Result<AppWiring, BootstrapError> {
    init_tracing();
    info!("=== Hotspot Demo Startup ===");

    let paths = resolve_app_paths()?;
    info!(root = %paths.root.display(), settings = %paths.settings_path.display(), "paths_resolved");

    let settings = load_settings(&paths.settings_path)?;
    info!(
        method = ?settings.interaction_method,
        detection = ?settings.hotspot_detection,
        "settings_loaded"
    );
    let defs = compile_hotspot_defs(&paths.hotspot_defs_dir)?;
    let scenario_path = scenario_path_from_env().unwrap_or_else(|| {
        paths.scenarios_dir.join(DEFAULT_SCENARIO_FILE)
    });
    let scenario = load_scenario(&scenario_path)?;
    info!(path = %scenario_path.display(), steps = scenario.steps.len(), "scenario_loaded");

    Ok(AppWiring {
        settings,
        defs,
        scenario,
    })
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_names(true)
        .compact()
        .init();
}

fn scenario_path_from_env() -> Option<PathBuf> {
    env::var(SCENARIO_ENV_VAR)
        .ok()
        .map(|raw| raw.trim().to_string())
        .filter(|raw| !raw.is_empty())
        .map(PathBuf::from)
}
