// SPDX-License-Identifier: Apache-2.0
// © James Ross Ω FLYING•ROBOTS <https://github.com/flyingrobots>
//! User defaults for the dump tool, stored as JSON.

use std::fs;
use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

use crate::walk::DumpOptions;

/// Key the dump defaults are stored under.
pub const PREFS_KEY: &str = "gwydump";

/// Storage port for raw config blobs keyed by logical name.
pub trait ConfigStore {
    /// Loads a raw blob. Returns `NotFound` when missing.
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError>;
    /// Persists a raw blob.
    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError>;
}

/// Error type for config operations.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Key not present in store.
    #[error("not found")]
    NotFound,
    /// I/O error while reading or writing.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    /// Malformed JSON.
    #[error("serde error: {0}")]
    Serde(#[from] serde_json::Error),
    /// Catch-all error variant.
    #[error("other: {0}")]
    Other(String),
}

/// Serializes config values and delegates storage to a [`ConfigStore`].
pub struct ConfigService<S> {
    store: S,
}

impl<S> ConfigService<S> {
    /// Creates a service over `store`.
    pub fn new(store: S) -> Self {
        Self { store }
    }
}

impl<S: ConfigStore> ConfigService<S> {
    /// Loads the value under `key`; `Ok(None)` if missing or empty.
    pub fn load<T: DeserializeOwned>(&self, key: &str) -> Result<Option<T>, ConfigError> {
        match self.store.load_raw(key) {
            Ok(bytes) if bytes.is_empty() => Ok(None),
            Ok(bytes) => Ok(Some(serde_json::from_slice(&bytes)?)),
            Err(ConfigError::NotFound) => Ok(None),
            Err(e) => Err(e),
        }
    }

    /// Serializes and stores `value` under `key`.
    pub fn save<T: Serialize>(&self, key: &str, value: &T) -> Result<(), ConfigError> {
        let data = serde_json::to_vec_pretty(value)?;
        self.store.save_raw(key, &data)
    }
}

/// Stores `<key>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct FsConfigStore {
    base: PathBuf,
}

impl FsConfigStore {
    /// Store under the platform config directory, e.g. `~/.config/gwydump`.
    pub fn new() -> Result<Self, ConfigError> {
        let dirs = ProjectDirs::from("net", "gwyddion", "gwydump")
            .ok_or_else(|| ConfigError::Other("could not resolve config dir".into()))?;
        Ok(Self::at(dirs.config_dir()))
    }

    /// Store rooted at an explicit directory.
    pub fn at(base: impl Into<PathBuf>) -> Self {
        Self { base: base.into() }
    }

    /// Directory holding the files.
    pub fn base(&self) -> &Path {
        &self.base
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.base.join(format!("{key}.json"))
    }
}

impl ConfigStore for FsConfigStore {
    fn load_raw(&self, key: &str) -> Result<Vec<u8>, ConfigError> {
        match fs::read(self.path_for(key)) {
            Ok(bytes) => Ok(bytes),
            Err(err) if err.kind() == std::io::ErrorKind::NotFound => Err(ConfigError::NotFound),
            Err(err) => Err(ConfigError::Io(err)),
        }
    }

    fn save_raw(&self, key: &str, data: &[u8]) -> Result<(), ConfigError> {
        let path = self.path_for(key);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, data)?;
        Ok(())
    }
}

/// Display defaults. Every field may be omitted from the JSON document.
///
/// `length` and `depth` use `-1` for unlimited, as on the command line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DumpPrefs {
    /// Spaces per nesting level.
    pub indent: usize,
    /// Print offsets.
    pub offsets: bool,
    /// Print type tags.
    pub types: bool,
    /// Print values.
    pub values: bool,
    /// Print object sizes.
    pub sizes: bool,
    /// Print full paths.
    pub paths: bool,
    /// Array items printed, `-1` for all.
    pub length: i64,
    /// Deepest path printed, `-1` for all.
    pub depth: i64,
}

impl Default for DumpPrefs {
    fn default() -> Self {
        let options = DumpOptions::default();
        Self {
            indent: options.indent,
            offsets: options.offsets,
            types: options.types,
            values: options.values,
            sizes: options.sizes,
            paths: options.paths,
            length: -1,
            depth: -1,
        }
    }
}

impl DumpPrefs {
    /// Loads the stored defaults, falling back to built-ins on any problem.
    pub fn load_or_default<S: ConfigStore>(service: &ConfigService<S>) -> Self {
        match service.load::<Self>(PREFS_KEY) {
            Ok(Some(prefs)) => {
                debug!(?prefs, "loaded dump defaults");
                prefs
            }
            Ok(None) => Self::default(),
            Err(err) => {
                warn!("ignoring unreadable config: {err}");
                Self::default()
            }
        }
    }

    /// Converts to walker options, without an extraction target.
    pub fn to_options(&self) -> DumpOptions {
        DumpOptions {
            indent: self.indent,
            offsets: self.offsets,
            types: self.types,
            values: self.values,
            sizes: self.sizes,
            paths: self.paths,
            length: limit(self.length),
            depth: limit(self.depth),
            extract: None,
        }
    }
}

/// Maps the `-1 = unlimited` convention onto `Option`.
pub fn limit(value: i64) -> Option<usize> {
    usize::try_from(value).ok()
}
