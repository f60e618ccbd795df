use crate::error::ReportError;
use crate::models::ReportConfig;
use std::fs;
use std::path::{Path, PathBuf};

const CONFIG_FILE_NAME: &str = ".techdebtrc";

/// Load configuration from file or use defaults
///
/// Search order:
/// 1. Custom path if provided via --config
/// 2. .techdebtrc in current directory
/// 3. ~/.techdebtrc in home directory
/// 4. Built-in defaults
pub fn load_config(custom_path: Option<&Path>) -> Result<ReportConfig, ReportError> {
    if let Some(path) = custom_path {
        return load_config_from_file(path);
    }

    let current_config = PathBuf::from(CONFIG_FILE_NAME);
    if current_config.exists() {
        match load_config_from_file(&current_config) {
            Ok(config) => return Ok(config),
            Err(e) => tracing::warn!("Ignoring {}", e),
        }
    }

    if let Some(home_config) = get_home_config_path() {
        if home_config.exists() {
            match load_config_from_file(&home_config) {
                Ok(config) => return Ok(config),
                Err(e) => tracing::warn!("Ignoring {}", e),
            }
        }
    }

    Ok(ReportConfig::default())
}

/// Load config from a specific file
fn load_config_from_file(path: &Path) -> Result<ReportConfig, ReportError> {
    let contents = fs::read_to_string(path).map_err(|e| ReportError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    toml::from_str(&contents).map_err(|e| ReportError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })
}

fn get_home_config_path() -> Option<PathBuf> {
    dirs::home_dir().map(|home| home.join(CONFIG_FILE_NAME))
}

/// Write a config file, used by `init` to produce a starting point
pub fn save_config(config: &ReportConfig, path: &Path) -> Result<(), ReportError> {
    let toml_string = toml::to_string_pretty(config).map_err(|e| ReportError::Config {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    fs::write(path, toml_string).map_err(|source| ReportError::Write {
        path: path.to_path_buf(),
        source,
    })
}
