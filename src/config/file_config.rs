use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Optional TOML file configuration. Every field may be omitted.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FileConfig {
    pub db_dir: Option<String>,
    pub live_channel_capacity: Option<usize>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())
            .with_context(|| format!("Failed to read config file {:?}", path.as_ref()))?;
        toml::from_str(&content)
            .with_context(|| format!("Failed to parse config file {:?}", path.as_ref()))
    }
}
