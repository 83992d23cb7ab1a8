//! # Configuration
//!
//! Layered settings: built-in defaults, then an optional TOML file, then CLI
//! flags (applied by the caller through `apply_overrides`).
//!
//! ```toml
//! [server]
//! host = "0.0.0.0"
//! port = 9000
//!
//! [storage]
//! database = "/var/lib/helix/graph.redb"
//!
//! [graph]
//! walk_depth = 2
//!
//! [graph.hooks]
//! metrics = true
//! weave = true
//! prune = false
//! ```

use helix_core::primitives::{DEFAULT_WALK_DEPTH, MAX_WALK_DEPTH};
use helix_core::{HelixError, Hook, hooks};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// File looked up in the working directory when no `--config` is given.
pub const DEFAULT_CONFIG_FILE: &str = "helix.toml";

#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct HelixConfig {
    pub server: ServerConfig,
    pub storage: StorageConfig,
    pub graph: GraphConfig,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// redb database file.
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from("helix.redb"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct GraphConfig {
    /// Depth used by walks that do not ask for one.
    pub walk_depth: usize,
    pub hooks: HooksConfig,
}

impl Default for GraphConfig {
    fn default() -> Self {
        Self {
            walk_depth: DEFAULT_WALK_DEPTH,
            hooks: HooksConfig::default(),
        }
    }
}

/// Which default insert hooks get wired in.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct HooksConfig {
    pub metrics: bool,
    pub weave: bool,
    pub prune: bool,
}

impl Default for HooksConfig {
    fn default() -> Self {
        Self {
            metrics: true,
            weave: true,
            prune: true,
        }
    }
}

impl HooksConfig {
    /// Enabled hooks in the default order: metrics, weave, prune.
    pub fn insert_hooks<P: 'static>(&self) -> Vec<Hook<P>> {
        let mut chain = Vec::new();
        if self.metrics {
            chain.push(hooks::metric_update());
        }
        if self.weave {
            chain.push(hooks::weave_by_tag());
        }
        if self.prune {
            chain.push(hooks::prune_dangling());
        }
        chain
    }
}

/// CLI values that win over the file.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    pub database: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
}

impl HelixConfig {
    /// Load from `path`, or from `helix.toml` if it exists, or use defaults.
    ///
    /// An explicit path that cannot be read is an error; a missing default
    /// file is not.
    pub fn load(path: Option<&Path>) -> Result<Self, HelixError> {
        let config = match path {
            Some(path) => Self::from_file(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).is_file() => {
                Self::from_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };
        config.validate()?;
        Ok(config)
    }

    /// Parse a TOML file.
    pub fn from_file(path: &Path) -> Result<Self, HelixError> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            HelixError::IoError(format!(
                "Failed to read config file {}: {}",
                path.display(),
                e
            ))
        })?;
        let config = Self::from_toml(&content)?;
        tracing::debug!(path = %path.display(), "loaded configuration");
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, HelixError> {
        toml::from_str(content).map_err(|e| {
            HelixError::DeserializationError(format!("Failed to parse config file: {}", e))
        })
    }

    /// Apply CLI flags on top of the loaded values.
    #[must_use]
    pub fn apply_overrides(mut self, overrides: Overrides) -> Self {
        if let Some(database) = overrides.database {
            self.storage.database = database;
        }
        if let Some(host) = overrides.host {
            self.server.host = host;
        }
        if let Some(port) = overrides.port {
            self.server.port = port;
        }
        self
    }

    pub fn validate(&self) -> Result<(), HelixError> {
        if self.graph.walk_depth > MAX_WALK_DEPTH {
            return Err(HelixError::DeserializationError(format!(
                "graph.walk_depth {} exceeds maximum {}",
                self.graph.walk_depth, MAX_WALK_DEPTH
            )));
        }
        if self.server.host.trim().is_empty() {
            return Err(HelixError::DeserializationError(
                "server.host must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    /// `host:port` for the listener.
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
