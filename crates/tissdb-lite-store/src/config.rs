//! Store configuration.

use std::env;
use std::path::PathBuf;

use tissdb_lite_query::QueryConfig;
use tissdb_lite_query::config::parse_bool;

/// Name of the data file inside the data directory.
pub const DATA_FILE_NAME: &str = "tissdb.json";

/// Store configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    /// Directory holding the data file (default: `lite_data`).
    pub data_dir: PathBuf,
    /// Write every mutation to disk (default: true).
    pub persistence: bool,
    /// Condition engine settings.
    pub query: QueryConfig,
}

impl StoreConfig {
    /// Create configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Create configuration from an arbitrary key lookup.
    #[must_use]
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        Self {
            data_dir: lookup("TISSDB_DATA_DIR").map_or(defaults.data_dir, PathBuf::from),
            persistence: lookup("TISSDB_PERSISTENCE")
                .map_or(defaults.persistence, |v| parse_bool(&v)),
            query: QueryConfig::from_lookup(&lookup),
        }
    }

    /// A configuration that never touches disk.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            persistence: false,
            ..Self::default()
        }
    }

    /// Full path of the data file.
    #[must_use]
    pub fn data_file(&self) -> PathBuf {
        self.data_dir.join(DATA_FILE_NAME)
    }
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from("lite_data"),
            persistence: true,
            query: QueryConfig::default(),
        }
    }
}
