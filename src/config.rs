use anyhow::{Context, Result};
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

/// Namespace label for prefixed titles whose prefix is not in the table
pub const FALLBACK_NAMESPACE: &str = "wikipedia";

/// Namespace label for titles without a namespace prefix
pub const ARTICLE_NAMESPACE: &str = "article";

/// Channel assumed for raw feed lines when none is given
pub const DEFAULT_CHANNEL: &str = "#en.wikipedia";

/// Lines decoded in parallel per batch
pub const DECODE_BATCH_SIZE: usize = 1024;

/// Progress update interval (tick every N lines)
pub const PROGRESS_INTERVAL: u64 = 1000;

/// Construction parameters for an edit decoder, as found in a JSON config file.
///
/// ```json
/// { "namespaces": { "Talk": "talk", "User": "user" }, "geoDbFile": "geo.csv" }
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DecoderConfig {
    #[serde(default)]
    pub namespaces: FxHashMap<String, String>,
    #[serde(default)]
    pub geo_db_file: Option<PathBuf>,
}

impl DecoderConfig {
    pub fn from_path(path: &Path) -> Result<Self> {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("Failed to read decoder config: {:?}", path))?;
        serde_json::from_str(&raw)
            .with_context(|| format!("Failed to parse decoder config: {:?}", path))
    }
}
