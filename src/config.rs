use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{MentionGraphError, Result};
use crate::types::DEFAULT_INTERACTION_TYPES;

/// Name of the configuration file stored inside the `.mentiongraph` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory holding the configuration and database.
pub const MENTIONGRAPH_DIR: &str = ".mentiongraph";

/// Configuration for a mention store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MentionGraphConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Database file; relative paths resolve against the `.mentiongraph` directory.
    pub database_path: String,
    /// Entry types treated as interactions.
    pub interaction_types: Vec<String>,
    /// Whether resolved mentions carry their removed targets.
    pub track_removed_targets: bool,
    /// Default `tracing` filter directive.
    pub log_filter: String,
    /// Number of example mentions generated when a request does not say.
    pub example_count: usize,
}

impl Default for MentionGraphConfig {
    fn default() -> Self {
        Self {
            version: 1,
            database_path: "mentions.db".to_string(),
            interaction_types: DEFAULT_INTERACTION_TYPES
                .iter()
                .map(|t| t.to_string())
                .collect(),
            track_removed_targets: false,
            log_filter: "mentiongraph=info".to_string(),
            example_count: 10,
        }
    }
}

/// Returns the path to the `.mentiongraph` directory within the given root.
pub fn get_mentiongraph_dir(project_root: &Path) -> PathBuf {
    project_root.join(MENTIONGRAPH_DIR)
}

/// Returns the path to the configuration file within the `.mentiongraph` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_mentiongraph_dir(project_root).join(CONFIG_FILENAME)
}

/// Returns where the database for `config` lives.
pub fn get_database_path(project_root: &Path, config: &MentionGraphConfig) -> PathBuf {
    let path = Path::new(&config.database_path);
    if path.is_absolute() {
        path.to_path_buf()
    } else {
        get_mentiongraph_dir(project_root).join(path)
    }
}

/// Loads the mention store configuration, falling back to defaults when no
/// `config.json` exists yet.
pub fn load_config(project_root: &Path) -> Result<MentionGraphConfig> {
    let config_path = get_config_path(project_root);
    if !config_path.exists() {
        return Ok(MentionGraphConfig::default());
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| MentionGraphError::Config {
        message: format!("cannot read mention store config at '{}': {e}", config_path.display()),
    })?;

    let config: MentionGraphConfig =
        serde_json::from_str(&contents).map_err(|e| MentionGraphError::Config {
            message: format!("mention store config at '{}' is not valid JSON: {e}", config_path.display()),
        })?;

    if config.interaction_types.iter().any(|t| t.trim().is_empty()) {
        return Err(MentionGraphError::Config {
            message: format!("blank interaction type in '{}'", config_path.display()),
        });
    }
    Ok(config)
}

/// Persists the configuration into the `.mentiongraph` directory, replacing
/// `config.json` only once the new contents are fully written.
pub fn save_config(project_root: &Path, config: &MentionGraphConfig) -> Result<()> {
    let dir = get_mentiongraph_dir(project_root);
    fs::create_dir_all(&dir).map_err(|e| MentionGraphError::Config {
        message: format!("failed to create {MENTIONGRAPH_DIR} directory '{}': {e}", dir.display()),
    })?;

    let json = serde_json::to_string_pretty(config).map_err(|e| MentionGraphError::Config {
        message: format!("failed to encode mention store config: {e}"),
    })?;

    let config_path = get_config_path(project_root);
    let staged = config_path.with_extension("json.tmp");
    fs::write(&staged, json).map_err(|e| MentionGraphError::Config {
        message: format!("failed to stage mention store config '{}': {e}", staged.display()),
    })?;

    fs::rename(&staged, &config_path).map_err(|e| MentionGraphError::Config {
        message: format!(
            "failed to move staged config '{}' into place at '{}': {e}",
            staged.display(),
            config_path.display()
        ),
    })
}
