//! Runtime configuration read from environment variables. Values can also be
//! provided through a `.env` file in the working directory or a per-user
//! `config.env`; variables already present in the environment always win.

use std::env;
use std::path::PathBuf;

use directories::BaseDirs;

use crate::error::{Error, Result};

/// Folder name used beneath the user's config directory.
const CONFIG_DIR_NAME: &str = "library-inspect";
/// Environment file stored inside the config directory.
const CONFIG_FILE_NAME: &str = "config.env";

pub const MONGO_URI_VAR: &str = "LIBRARY_MONGO_URI";
pub const MONGO_DATABASE_VAR: &str = "LIBRARY_MONGO_DATABASE";
pub const DISPLAY_LIMIT_VAR: &str = "LIBRARY_DISPLAY_LIMIT";

/// Local server on the default port, which is where the ingestion process
/// writes.
pub const DEFAULT_MONGO_URI: &str = "mongodb://localhost:27017";
pub const DEFAULT_DATABASE: &str = "library";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub mongo_uri: String,
    pub database: String,
    /// Maximum number of file records to print. `None` prints all of them.
    pub display_limit: Option<i64>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            mongo_uri: DEFAULT_MONGO_URI.to_string(),
            database: DEFAULT_DATABASE.to_string(),
            display_limit: None,
        }
    }
}

impl Config {
    /// Read the process environment. Call [`load_env_files`] first if `.env`
    /// files should be taken into account; this only sees what is already set.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Build a config from an arbitrary key lookup. Blank values count as
    /// unset.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let get = |key: &str| {
            lookup(key)
                .map(|value| value.trim().to_string())
                .filter(|value| !value.is_empty())
        };

        let defaults = Self::default();
        let display_limit = get(DISPLAY_LIMIT_VAR)
            .map(|raw| parse_limit(&raw))
            .transpose()?;

        Ok(Self {
            mongo_uri: get(MONGO_URI_VAR).unwrap_or(defaults.mongo_uri),
            database: get(MONGO_DATABASE_VAR).unwrap_or(defaults.database),
            display_limit,
        })
    }
}

fn parse_limit(raw: &str) -> Result<i64> {
    let limit: i64 = raw.parse().map_err(|_| Error::Config {
        key: DISPLAY_LIMIT_VAR,
        reason: format!("`{raw}` is not a number"),
    })?;

    if limit <= 0 {
        return Err(Error::Config {
            key: DISPLAY_LIMIT_VAR,
            reason: format!("must be a positive number, got {limit}"),
        });
    }

    Ok(limit)
}

/// Load `.env` from the working directory and then the per-user config file.
/// Returns the files that were actually read. Called before logging is set up
/// so that `RUST_LOG` can live in either file.
pub fn load_env_files() -> Vec<PathBuf> {
    let mut loaded = Vec::new();

    if let Ok(path) = dotenvy::dotenv() {
        loaded.push(path);
    }

    if let Some(path) = user_config_path().filter(|path| path.is_file()) {
        if dotenvy::from_path(&path).is_ok() {
            loaded.push(path);
        }
    }

    loaded
}

/// Resolve the absolute path to the per-user environment file.
pub fn user_config_path() -> Option<PathBuf> {
    let base_dirs = BaseDirs::new()?;
    Some(
        base_dirs
            .config_dir()
            .join(CONFIG_DIR_NAME)
            .join(CONFIG_FILE_NAME),
    )
}
