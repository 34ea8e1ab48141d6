use std::path::{Path, PathBuf};
use std::time::Duration;

use cw_dispatch::DispatchConfig;
use cw_types::IndexType;
use serde::{Deserialize, Serialize};

use crate::error::{EngineError, EngineResult};
use crate::filter::CategoryFilter;

/// Engine configuration, loaded from TOML. Every field is optional in the
/// file.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Directory holding one subdirectory per cache version.
    pub caches_root: PathBuf,
    /// Where pages and reports are written.
    pub output_root: PathBuf,
    /// Maximum number of entries compared at once.
    pub max_concurrency: usize,
    /// Per-listener deadline in seconds.
    pub handler_timeout_secs: Option<u64>,
    pub include: Vec<IndexType>,
    pub exclude: Vec<IndexType>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            caches_root: PathBuf::from("caches"),
            output_root: PathBuf::from("out"),
            max_concurrency: 16,
            handler_timeout_secs: None,
            include: Vec::new(),
            exclude: Vec::new(),
        }
    }
}

impl EngineConfig {
    /// Load a config file. A missing file is an error.
    pub async fn load(path: &Path) -> EngineResult<Self> {
        let text = tokio::fs::read_to_string(path)
            .await
            .map_err(|source| EngineError::Read {
                path: path.to_path_buf(),
                source,
            })?;
        Self::from_toml(&text).map_err(|reason| EngineError::Config {
            path: path.to_path_buf(),
            reason,
        })
    }

    pub fn from_toml(text: &str) -> Result<Self, String> {
        let config: Self = toml::from_str(text).map_err(|e| e.to_string())?;
        if config.max_concurrency == 0 {
            return Err("max_concurrency must be at least 1".into());
        }
        Ok(config)
    }

    pub fn filter(&self) -> CategoryFilter {
        CategoryFilter::new(self.include.iter().copied(), self.exclude.iter().copied())
    }

    pub fn dispatch_config(&self) -> DispatchConfig {
        DispatchConfig {
            handler_timeout: self.handler_timeout_secs.map(Duration::from_secs),
        }
    }
}
