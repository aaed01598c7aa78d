use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use log::LevelFilter;
use serde::Deserialize;
use thiserror::Error;

use crate::filter::{KindFilter, KindSet};
use crate::invocation::{InvocationTemplate, ProgramNumbering};
use crate::midi_model::EventKind;

pub const DEFAULT_EXECUTABLE: &str = "./loadpreset";
pub const DEFAULT_CLIENT_NAME: &str = "midipc2cmd";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("could not read config file {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("accepted_kinds must name at least one event kind")]
    NoAcceptedKinds,
    #[error("executable_path must not be empty")]
    EmptyExecutable,
    #[error("client_name must not be empty")]
    EmptyClientName,
    #[error("unknown log level '{0}'")]
    InvalidLogLevel(String),
}

/// Startup configuration. Read once; the engine never sees it change.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub executable_path: PathBuf,
    /// Placed before the event value on every invocation.
    pub args: Vec<String>,
    pub accepted_kinds: Vec<EventKind>,
    /// Substring of the input port name. The first port is used when unset.
    pub midi_port: Option<String>,
    pub client_name: String,
    pub program_numbering: ProgramNumbering,
    pub log_level: String,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            executable_path: PathBuf::from(DEFAULT_EXECUTABLE),
            args: Vec::new(),
            accepted_kinds: vec![EventKind::ProgramChange],
            midi_port: None,
            client_name: DEFAULT_CLIENT_NAME.to_string(),
            program_numbering: ProgramNumbering::ZeroBased,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|d| d.join("midipc2cmd").join("config.toml"))
    }

    /// Loads `explicit` if given, otherwise the per-user config file if it
    /// exists, otherwise the defaults. Returns the file actually read.
    pub fn load(explicit: Option<&Path>) -> Result<(Config, Option<PathBuf>), ConfigError> {
        let path = match explicit {
            Some(path) => Some(path.to_path_buf()),
            None => Config::default_path().filter(|path| path.exists()),
        };

        match path {
            Some(path) => Ok((Config::from_file(&path)?, Some(path))),
            None => Ok((Config::default(), None)),
        }
    }

    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let contents = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;

        toml::from_str(&contents).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.accepted_kinds.is_empty() {
            return Err(ConfigError::NoAcceptedKinds);
        }
        if self.executable_path.as_os_str().is_empty() {
            return Err(ConfigError::EmptyExecutable);
        }
        if self.client_name.trim().is_empty() {
            return Err(ConfigError::EmptyClientName);
        }
        self.level_filter()?;
        Ok(())
    }

    pub fn level_filter(&self) -> Result<LevelFilter, ConfigError> {
        LevelFilter::from_str(&self.log_level)
            .map_err(|_| ConfigError::InvalidLogLevel(self.log_level.clone()))
    }

    pub fn accepted(&self) -> KindSet {
        self.accepted_kinds.iter().copied().collect()
    }

    pub fn filter(&self) -> KindFilter {
        KindFilter::new(self.accepted())
    }

    pub fn template(&self) -> InvocationTemplate {
        InvocationTemplate::new(
            self.executable_path.clone(),
            self.args.clone(),
            self.program_numbering,
        )
    }
}
