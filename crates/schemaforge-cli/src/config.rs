//! Configuration file loading and placeholder properties.
//!
//! The TOML file supplies defaults; command-line flags only ever switch
//! behavior on, so a flag always wins over the file.

use crate::cli::Args;
use schemaforge_core::{
    DatabaseKind, ExecutorConfig, ScriptMappingConfig, TypeNameMap, TypeNameOverrides,
};
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse config file {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid property '{0}': expected KEY=VALUE")]
    InvalidProperty(String),
}

/// Contents of the `--config` file.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CliConfig {
    pub executor: ExecutorConfig,
    /// Extra type names per classification, e.g. `varchar = ["VARCHAR2"]`.
    pub type_names: TypeNameOverrides,
    pub scripts: ScriptMappingConfig,

    /// Directory relative script paths are resolved against.
    #[serde(skip)]
    pub base_dir: PathBuf,
}

impl CliConfig {
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.base_dir = path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Ok(config)
    }

    pub fn parse(content: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(content)
    }

    /// Load `--config` when given, defaults otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::from_file(path),
            None => Ok(Self::default()),
        }
    }

    /// Target database: `--database`, then the URL scheme, then the file.
    pub fn resolve_database(&self, args: &Args) -> DatabaseKind {
        if let Some(database) = args.database {
            return database.into();
        }
        #[cfg(feature = "database")]
        let from_url = args
            .url()
            .and_then(crate::database::DatabaseType::from_url)
            .map(|db_type| db_type.kind());
        #[cfg(not(feature = "database"))]
        let from_url: Option<DatabaseKind> = None;

        from_url.unwrap_or(self.executor.database)
    }

    /// Executor settings with the command-line switches applied.
    pub fn executor_config(&self, args: &Args, database: DatabaseKind) -> ExecutorConfig {
        let mut config = self.executor.clone();
        config.database = database;
        config.continue_on_error |= args.continue_on_error;
        config.strip_foreign_keys |= args.strip_foreign_keys;
        config.cascade_constraints |= args.cascade_constraints;
        config
    }

    pub fn type_names(&self, database: DatabaseKind) -> TypeNameMap {
        TypeNameMap::for_database(database).with_overrides(&self.type_names)
    }
}

/// `--property` values, consulted before the process environment when
/// resolving `{name}` placeholders in script paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Properties(BTreeMap<String, String>);

impl Properties {
    pub fn parse(raw: &[String]) -> Result<Self, ConfigError> {
        raw.iter()
            .map(|entry| {
                let (key, value) = entry
                    .split_once('=')
                    .ok_or_else(|| ConfigError::InvalidProperty(entry.clone()))?;
                let key = key.trim();
                if key.is_empty() {
                    return Err(ConfigError::InvalidProperty(entry.clone()));
                }
                Ok((key.to_string(), value.to_string()))
            })
            .collect::<Result<_, _>>()
            .map(Self)
    }

    pub fn lookup(&self, name: &str) -> Option<String> {
        self.0
            .get(name)
            .cloned()
            .or_else(|| std::env::var(name).ok())
    }
}
