//! Configuration file loading and validation.

use crate::error::ConfigError;
use crate::types::ProjectConfig;
use std::path::Path;

/// Name of the configuration file at the project root.
pub const CONFIG_FILE: &str = "featc.toml";

/// Loads and validates `featc.toml` from a project directory.
pub fn load_config(project_dir: &Path) -> Result<ProjectConfig, ConfigError> {
    load_config_file(&project_dir.join(CONFIG_FILE))
}

/// Loads and validates a configuration file at an explicit path.
pub fn load_config_file(path: &Path) -> Result<ProjectConfig, ConfigError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| ConfigError::from_io(path.to_path_buf(), e))?;
    load_config_from_str(&content)
}

/// Parses and validates a `featc.toml` configuration from a string.
///
/// Useful for testing without filesystem dependencies.
pub fn load_config_from_str(content: &str) -> Result<ProjectConfig, ConfigError> {
    let config: ProjectConfig =
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))?;
    validate_config(&config)?;
    Ok(config)
}

/// Rejects empty required values and a malformed cache budget.
fn validate_config(config: &ProjectConfig) -> Result<(), ConfigError> {
    let required = [
        ("project.name", &config.project.name),
        ("compiler.target", &config.compiler.target),
        ("compiler.tool_version", &config.compiler.tool_version),
    ];
    if let Some(&(field, _)) = required.iter().find(|(_, value)| value.trim().is_empty()) {
        return Err(ConfigError::MissingField(field));
    }
    config
        .cache
        .max_size_bytes()
        .map_err(|e| ConfigError::InvalidValue {
            field: "cache.max_size",
            reason: e.to_string(),
        })?;
    Ok(())
}
