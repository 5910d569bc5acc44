//! Configuration for historian - using the CLI (clap), env (clap), and configuration file (toml).

mod clap_config;
mod toml_config;

use clap::{parser::ValueSource, ArgMatches, ValueEnum};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("toml config error")]
    TomlConfig(#[from] toml_config::TomlConfigError),

    #[error(transparent)]
    Clap(#[from] clap::Error),
}

pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

#[derive(Debug)]
pub struct Config {
    pub command: HistorianCommand,

    /// Root directory where configuration is stored
    pub root_dir: String,

    /// Log level
    pub log_level: LogLevel,

    /// Log format
    pub log_format: LogFormat,

    /// Path to the append event log
    pub events: Option<String>,
}

impl Config {
    pub fn new() -> ConfigResult<Self> {
        Self::from_matches(&clap_config::command().get_matches())
    }

    #[cfg(test)]
    pub fn try_from_args<I, T>(args: I) -> ConfigResult<Self>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        Self::from_matches(&clap_config::command().try_get_matches_from(args)?)
    }

    fn from_matches(matches: &ArgMatches) -> ConfigResult<Self> {
        let mut config = Config::from(matches);
        config.merge_toml_core_config(matches)?;
        Ok(config)
    }

    fn was_supplied_by_user(key: &str, matches: &ArgMatches) -> bool {
        !matches!(
            matches.value_source(key),
            Some(ValueSource::DefaultValue) | None
        )
    }

    /// The order of priority is (in decreasing order):
    /// cli -> env -> toml -> default
    ///
    /// Fields with a default value are only taken from the TOML config if the user did not supply
    /// them. Optional fields are taken from the TOML config if they are still unset.
    fn merge_toml_core_config(&mut self, matches: &ArgMatches) -> ConfigResult<()> {
        let Some(toml_config) = toml_config::read_config(&self.root_dir)? else {
            return Ok(());
        };
        let core = toml_config.core;

        if let Some(log_level) = core.log_level {
            if !Self::was_supplied_by_user("log-level", matches) {
                self.log_level = log_level;
            }
        }

        if let Some(log_format) = core.log_format {
            if !Self::was_supplied_by_user("log-format", matches) {
                self.log_format = log_format;
            }
        }

        if self.events.is_none() {
            self.events = core.events;
        }

        Ok(())
    }
}

// `clap` does not provide an automated way to build this in builder mode
impl From<&ArgMatches> for Config {
    fn from(am: &ArgMatches) -> Self {
        let string = |am: &ArgMatches, key: &str| am.get_one::<String>(key).cloned();

        let command = match am.subcommand() {
            Some(("commit", sub)) => HistorianCommand::Commit {
                value: string(sub, "value").unwrap_or_default(),
                salt: string(sub, "salt").unwrap_or_default(),
            },
            Some(("prove", sub)) => HistorianCommand::Prove {
                value: string(sub, "value").unwrap_or_default(),
                salt: string(sub, "salt").unwrap_or_default(),
                root: string(sub, "root"),
            },
            Some(("verify", sub)) => HistorianCommand::Verify {
                proof: string(sub, "proof").unwrap_or_default(),
            },
            _ => HistorianCommand::Replay,
        };

        Config {
            command,
            root_dir: string(am, "root-dir").unwrap_or_default(),
            log_level: am.get_one::<LogLevel>("log-level").copied().unwrap_or_default(),
            log_format: am
                .get_one::<LogFormat>("log-format")
                .copied()
                .unwrap_or_default(),
            events: string(am, "events"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistorianCommand {
    /// Print the digests of a commitment
    Commit { value: String, salt: String },
    /// Replay the event log
    Replay,
    /// Prove a committed value is included
    Prove {
        value: String,
        salt: String,
        root: Option<String>,
    },
    /// Check a proof
    Verify { proof: String },
}

#[derive(Copy, Debug, Default, Clone, PartialEq, Eq, PartialOrd, Ord, Deserialize, ValueEnum)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogLevel {
    #[serde(rename = "DEBUG")]
    Debug,
    #[default]
    #[serde(rename = "INFO")]
    Info,
    #[serde(rename = "ERROR")]
    Error,
}

impl LogLevel {
    /// The `tracing` filter directive for this level
    pub fn as_directive(self) -> &'static str {
        match self {
            LogLevel::Debug => "debug",
            LogLevel::Info => "info",
            LogLevel::Error => "error",
        }
    }
}

#[derive(Copy, Default, Clone, PartialEq, Eq, PartialOrd, Ord, ValueEnum, Debug, Deserialize)]
#[clap(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum LogFormat {
    #[default]
    #[serde(rename = "PRETTY")]
    Pretty,
    #[serde(rename = "JSON")]
    Json,
}

#[cfg(test)]
mod tests {
    use std::fs;

    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    use super::*;

    fn root_dir(toml: Option<&str>) -> TempDir {
        let dir = tempfile::tempdir().unwrap();
        if let Some(toml) = toml {
            fs::create_dir_all(dir.path().join("config")).unwrap();
            fs::write(dir.path().join("config/config.toml"), toml).unwrap();
        }
        dir
    }

    fn parse(dir: &TempDir, args: &[&str]) -> ConfigResult<Config> {
        let root = dir.path().to_string_lossy().into_owned();
        let mut all = vec!["historian".to_string(), "--root-dir".to_string(), root];
        all.extend(args.iter().map(ToString::to_string));

        Config::try_from_args(all)
    }

    #[test]
    fn defaults_to_replay() {
        let dir = root_dir(None);
        let config = parse(&dir, &[]).unwrap();

        assert_eq!(config.command, HistorianCommand::Replay);
        assert_eq!(config.log_level, LogLevel::Info);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.events, None);
    }

    #[test]
    fn parses_subcommands() {
        let dir = root_dir(None);

        let config = parse(&dir, &["commit", "--value", "yes", "--salt", "42"]).unwrap();
        assert_eq!(
            config.command,
            HistorianCommand::Commit {
                value: "yes".to_string(),
                salt: "42".to_string()
            }
        );

        let config = parse(
            &dir,
            &["prove", "--value", "yes", "--salt", "42", "--events", "log.json"],
        )
        .unwrap();
        assert_eq!(
            config.command,
            HistorianCommand::Prove {
                value: "yes".to_string(),
                salt: "42".to_string(),
                root: None,
            }
        );
        assert_eq!(config.events.as_deref(), Some("log.json"));

        let config = parse(&dir, &["verify", "--proof", "proof.json"]).unwrap();
        assert_eq!(
            config.command,
            HistorianCommand::Verify {
                proof: "proof.json".to_string()
            }
        );
    }

    #[test]
    fn missing_required_args_are_rejected() {
        let dir = root_dir(None);
        assert!(matches!(
            parse(&dir, &["commit", "--value", "yes"]),
            Err(ConfigError::Clap(_))
        ));
    }

    #[test]
    fn toml_fills_in_defaults() {
        let dir = root_dir(Some(
            r#"
            [core]
            log-level = "DEBUG"
            log-format = "JSON"
            events = "events.json"
            "#,
        ));

        let config = parse(&dir, &[]).unwrap();
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.events.as_deref(), Some("events.json"));
    }

    #[test]
    fn cli_beats_toml() {
        let dir = root_dir(Some(
            r#"
            [core]
            log-level = "DEBUG"
            events = "events.json"
            "#,
        ));

        let config = parse(&dir, &["--log-level", "ERROR", "--events", "other.json"]).unwrap();
        assert_eq!(config.log_level, LogLevel::Error);
        assert_eq!(config.log_format, LogFormat::Pretty);
        assert_eq!(config.events.as_deref(), Some("other.json"));
    }

    #[test]
    fn invalid_toml_is_an_error() {
        let dir = root_dir(Some("[core]\nlog-level = 3\n"));
        assert!(matches!(
            parse(&dir, &[]),
            Err(ConfigError::TomlConfig(_))
        ));
    }
}
