//! module for handling file-based (TOML) configuration for historian.

use std::fs;

use crate::util;

use super::{ConfigResult, Deserialize, LogFormat, LogLevel};

#[derive(Debug, thiserror::Error)]
pub enum TomlConfigError {
    #[error("failed to read config file")]
    Io(#[from] std::io::Error),

    #[error("invalid config file")]
    Toml(#[from] toml::de::Error),
}

#[derive(Debug, Default, Deserialize)]
pub(crate) struct TomlConfig {
    #[serde(default)]
    pub core: CoreConfig,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub(crate) struct CoreConfig {
    pub log_level: Option<LogLevel>,
    pub log_format: Option<LogFormat>,
    pub events: Option<String>,
}

/// Read the TOML configuration file, if present in the `config` sub-directory under the
/// root historian directory.
pub(super) fn read_config(root_dir: &str) -> ConfigResult<Option<TomlConfig>> {
    let Some(config_file) = util::get_toml_config_file(root_dir, "config") else {
        return Ok(None);
    };

    if !config_file.exists() {
        return Ok(None);
    }

    let contents = fs::read_to_string(config_file).map_err(TomlConfigError::from)?;
    let config = toml::from_str(&contents).map_err(TomlConfigError::from)?;

    Ok(Some(config))
}
