mod file_config;

pub use file_config::FileConfig;

use anyhow::{bail, Result};
use std::path::PathBuf;

pub(crate) const DEFAULT_LIVE_CHANNEL_CAPACITY: usize = 32;

/// Resolved backend configuration.
#[derive(Debug, Clone)]
pub struct ForumConfig {
    /// Directory holding the sqlite database file.
    pub db_dir: PathBuf,
    /// Per-connection buffer of the live push channel. A client falling
    /// further behind than this misses payloads instead of blocking the
    /// sender.
    pub live_channel_capacity: usize,
}

impl ForumConfig {
    /// Resolve configuration from caller arguments and an optional TOML
    /// file config. File values override caller values where present.
    pub fn resolve(db_dir: Option<PathBuf>, file_config: Option<FileConfig>) -> Result<Self> {
        let file = file_config.unwrap_or_default();

        let db_dir = file
            .db_dir
            .map(PathBuf::from)
            .or(db_dir)
            .ok_or_else(|| anyhow::anyhow!("db_dir must be specified"))?;

        if !db_dir.exists() {
            bail!("Database directory does not exist: {:?}", db_dir);
        }
        if !db_dir.is_dir() {
            bail!("db_dir is not a directory: {:?}", db_dir);
        }

        let live_channel_capacity = file
            .live_channel_capacity
            .unwrap_or(DEFAULT_LIVE_CHANNEL_CAPACITY);
        if live_channel_capacity == 0 {
            bail!("live_channel_capacity must be positive");
        }

        Ok(Self {
            db_dir,
            live_channel_capacity,
        })
    }
}
