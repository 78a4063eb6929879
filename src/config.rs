//! Configuration for packbot paths and planner tunables.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (PACKBOT_HOME, PACKBOT_DB)
//! 2. Config file (.packbot/config.yaml)
//! 3. Defaults (~/.packbot, orders.db inside it)
//!
//! Config file discovery searches the current directory and its
//! parents; paths in the file are relative to the directory holding
//! `.packbot/`.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::Deserialize;

use crate::core::planner::PlannerSettings;
use crate::core::policy::SelectionLimits;

/// Raw config file schema (matches the YAML structure)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub planner: PlannerConfig,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to the config file's base)
    pub home: Option<String>,
    /// Orders database (relative to the config file's base)
    pub db: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PlannerConfig {
    /// Planning timeout in seconds
    pub timeout_seconds: Option<u64>,
    /// Exact-solver size limits
    pub limits: Option<SelectionLimits>,
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory
    pub home: PathBuf,
    /// Orders database path
    pub db_path: PathBuf,
    /// Config file the values came from, if one was found
    pub config_file: Option<PathBuf>,
    /// Planner settings
    pub planner: PlannerSettings,
}

/// Load and resolve configuration from the environment and config file.
pub fn load() -> Result<ResolvedConfig> {
    let config_file = find_config_file();

    let file_cfg: ConfigFile = match &config_file {
        Some(path) => {
            let raw = std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read config file: {}", path.display()))?;
            serde_yaml::from_str(&raw)
                .with_context(|| format!("Failed to parse config file: {}", path.display()))?
        }
        None => ConfigFile::default(),
    };

    // Paths in the file are relative to the directory containing .packbot/
    let base = config_file
        .as_ref()
        .and_then(|p| p.parent())
        .and_then(|p| p.parent())
        .map(PathBuf::from);

    let env_home = std::env::var("PACKBOT_HOME").ok().map(PathBuf::from);
    let env_db = std::env::var("PACKBOT_DB").ok().map(PathBuf::from);

    Ok(resolve(file_cfg, base, config_file, env_home, env_db))
}

fn resolve(
    file: ConfigFile,
    base: Option<PathBuf>,
    config_file: Option<PathBuf>,
    env_home: Option<PathBuf>,
    env_db: Option<PathBuf>,
) -> ResolvedConfig {
    let default_home = dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(".packbot");

    let home = env_home
        .or_else(|| join_base(&base, file.paths.home.as_deref()))
        .unwrap_or(default_home);

    let db_path = env_db
        .or_else(|| join_base(&base, file.paths.db.as_deref()))
        .unwrap_or_else(|| home.join("orders.db"));

    let mut planner = PlannerSettings::default();
    if let Some(secs) = file.planner.timeout_seconds {
        planner.timeout = Duration::from_secs(secs);
    }
    if let Some(limits) = file.planner.limits {
        planner.limits = limits;
    }

    ResolvedConfig {
        home,
        db_path,
        config_file,
        planner,
    }
}

fn join_base(base: &Option<PathBuf>, rel: Option<&str>) -> Option<PathBuf> {
    let rel = PathBuf::from(rel?);
    if rel.is_absolute() {
        Some(rel)
    } else {
        Some(
            base.clone()
                .unwrap_or_else(|| PathBuf::from("."))
                .join(rel),
        )
    }
}

/// Find a config file by searching the current directory and parents.
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;
    loop {
        let candidate = current.join(".packbot").join("config.yaml");
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}
