//! Application configuration for speakerunify.
//!
//! User config lives at `~/.speakerunify/speakerunify.toml`.
//! CLI flags (and their environment variables) override config file values,
//! which override defaults.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{Result, UnifyError};
use crate::types::Source;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "speakerunify.toml";

/// Default config directory name under the user's home.
const CONFIG_DIR_NAME: &str = ".speakerunify";

// ---------------------------------------------------------------------------
// Config structs (matching speakerunify.toml schema)
// ---------------------------------------------------------------------------

/// Top-level application config, deserialized from TOML.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    /// Document store settings.
    #[serde(default)]
    pub store: StoreConfig,

    /// Topic canonicalization settings.
    #[serde(default)]
    pub topics: TopicsConfig,

    /// Per-source overrides. Sources without an entry use their defaults.
    #[serde(default)]
    pub sources: Vec<SourceOverride>,
}

/// `[store]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoreConfig {
    /// Root directory of the local databases; each database `<name>` lives
    /// at `<url>/<name>.db`.
    #[serde(default = "default_store_url")]
    pub url: String,

    /// Database receiving the canonical speaker collection.
    #[serde(default = "default_target_database")]
    pub target_database: String,

    /// Write operations buffered before a flush.
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            url: default_store_url(),
            target_database: default_target_database(),
            batch_size: default_batch_size(),
        }
    }
}

fn default_store_url() -> String {
    "var/data".into()
}
fn default_target_database() -> String {
    "speaker_database".into()
}
fn default_batch_size() -> usize {
    1000
}

/// `[topics]` section.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopicsConfig {
    /// JSON file mapping each canonical topic to its literal variants.
    #[serde(default = "default_mapping_path")]
    pub mapping_path: String,
}

impl Default for TopicsConfig {
    fn default() -> Self {
        Self {
            mapping_path: default_mapping_path(),
        }
    }
}

fn default_mapping_path() -> String {
    "config/topic_mapping.json".into()
}

/// `[[sources]]` entry: relocate or disable one source.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SourceOverride {
    /// Which source this entry applies to.
    pub source: Source,
    /// Database name, if not the scraper's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,
    /// Collection name, if not the scraper's default.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    /// Set to `false` to leave this source out of runs.
    #[serde(default = "default_true")]
    pub enabled: bool,
}

fn default_true() -> bool {
    true
}

// ---------------------------------------------------------------------------
// Run config (runtime, merged from config + CLI flags)
// ---------------------------------------------------------------------------

/// Where one source's native documents live.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceBinding {
    pub source: Source,
    pub database: String,
    pub collection: String,
}

/// Runtime unification configuration, merged from config file + CLI flags.
#[derive(Debug, Clone)]
pub struct RunConfig {
    /// Root directory holding the source and target databases.
    pub store_root: PathBuf,
    /// Target database name.
    pub target_database: String,
    /// Operations buffered per flush.
    pub batch_size: usize,
    /// Topic mapping file.
    pub mapping_path: PathBuf,
    /// Enabled sources in processing order.
    pub sources: Vec<SourceBinding>,
}

impl From<&AppConfig> for RunConfig {
    fn from(config: &AppConfig) -> Self {
        let sources = Source::ALL
            .into_iter()
            .filter_map(|source| {
                let overrides = config.sources.iter().find(|o| o.source == source);
                if overrides.is_some_and(|o| !o.enabled) {
                    return None;
                }
                Some(SourceBinding {
                    source,
                    database: overrides
                        .and_then(|o| o.database.clone())
                        .unwrap_or_else(|| source.default_database().to_string()),
                    collection: overrides
                        .and_then(|o| o.collection.clone())
                        .unwrap_or_else(|| source.default_collection().to_string()),
                })
            })
            .collect();

        Self {
            store_root: PathBuf::from(&config.store.url),
            target_database: config.store.target_database.clone(),
            batch_size: config.store.batch_size,
            mapping_path: PathBuf::from(&config.topics.mapping_path),
            sources,
        }
    }
}

impl RunConfig {
    /// Keep only the listed sources (processing order is unchanged).
    pub fn restrict_to(&mut self, only: &[Source]) {
        if !only.is_empty() {
            self.sources.retain(|b| only.contains(&b.source));
        }
    }
}

// ---------------------------------------------------------------------------
// Config loading
// ---------------------------------------------------------------------------

/// Get the path to the config directory (`~/.speakerunify/`).
pub fn config_dir() -> Result<PathBuf> {
    let home =
        dirs::home_dir().ok_or_else(|| UnifyError::config("could not determine home directory"))?;
    Ok(home.join(CONFIG_DIR_NAME))
}

/// Get the path to the config file (`~/.speakerunify/speakerunify.toml`).
pub fn config_file_path() -> Result<PathBuf> {
    Ok(config_dir()?.join(CONFIG_FILE_NAME))
}

/// Load the application config from disk. Returns defaults if the file does not exist.
pub fn load_config() -> Result<AppConfig> {
    let path = config_file_path()?;

    if !path.exists() {
        tracing::debug!(?path, "config file not found, using defaults");
        return Ok(AppConfig::default());
    }

    load_config_from(&path)
}

/// Load the application config from a specific file path.
pub fn load_config_from(path: &Path) -> Result<AppConfig> {
    let content = std::fs::read_to_string(path).map_err(|e| UnifyError::io(path, e))?;

    toml::from_str(&content)
        .map_err(|e| UnifyError::config(format!("failed to parse {}: {e}", path.display())))
}

/// Create the config directory and write a default config file.
/// Returns the path to the created file.
pub fn init_config() -> Result<PathBuf> {
    let dir = config_dir()?;
    std::fs::create_dir_all(&dir).map_err(|e| UnifyError::io(&dir, e))?;

    let path = dir.join(CONFIG_FILE_NAME);
    let config = AppConfig::default();
    let content = toml::to_string_pretty(&config).map_err(|e| UnifyError::config(e.to_string()))?;

    std::fs::write(&path, content).map_err(|e| UnifyError::io(&path, e))?;
    tracing::info!(?path, "created default config file");

    Ok(path)
}

/// Reject settings a run cannot work with.
pub fn validate_config(config: &AppConfig) -> Result<()> {
    if config.store.batch_size == 0 {
        return Err(UnifyError::config("store.batch_size must be at least 1"));
    }
    if config.store.url.trim().is_empty() {
        return Err(UnifyError::config("store.url is empty"));
    }
    let target = &config.store.target_database;
    if target.is_empty() || target.contains(['/', '\\']) || target.starts_with('.') {
        return Err(UnifyError::config(format!(
            "store.target_database '{target}' must be a bare database name"
        )));
    }
    if config.topics.mapping_path.trim().is_empty() {
        return Err(UnifyError::config("topics.mapping_path is empty"));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize default config");
        assert!(toml_str.contains("target_database"));
        assert!(toml_str.contains("topic_mapping.json"));
    }

    #[test]
    fn config_roundtrip() {
        let config = AppConfig::default();
        let toml_str = toml::to_string_pretty(&config).expect("serialize");
        let parsed: AppConfig = toml::from_str(&toml_str).expect("deserialize");
        assert_eq!(parsed.store.batch_size, 1000);
        assert_eq!(parsed.store.target_database, "speaker_database");
    }

    #[test]
    fn config_with_source_overrides() {
        let toml_str = r#"
[store]
url = "/srv/speakers"

[[sources]]
source = "sessionize"
collection = "profiles_v2"

[[sources]]
source = "tsh"
enabled = false
"#;
        let config: AppConfig = toml::from_str(toml_str).expect("parse");
        let run = RunConfig::from(&config);

        assert_eq!(run.store_root, PathBuf::from("/srv/speakers"));
        assert_eq!(run.sources.len(), 8);
        assert!(run.sources.iter().all(|b| b.source != Source::Tsh));

        let sessionize = run
            .sources
            .iter()
            .find(|b| b.source == Source::Sessionize)
            .expect("sessionize binding");
        assert_eq!(sessionize.collection, "profiles_v2");
        assert_eq!(sessionize.database, "sessionize_scraper");
    }

    #[test]
    fn run_config_keeps_processing_order() {
        let mut run = RunConfig::from(&AppConfig::default());
        assert_eq!(run.sources.first().map(|b| b.source), Some(Source::ASpeakers));
        assert_eq!(run.sources.last().map(|b| b.source), Some(Source::Tsh));

        run.restrict_to(&[Source::Tsh, Source::BigSpeak]);
        let order: Vec<Source> = run.sources.iter().map(|b| b.source).collect();
        assert_eq!(order, vec![Source::BigSpeak, Source::Tsh]);
    }

    #[test]
    fn validation_rejects_bad_values() {
        let mut config = AppConfig::default();
        assert!(validate_config(&config).is_ok());

        config.store.batch_size = 0;
        assert!(validate_config(&config).is_err());

        config.store.batch_size = 10;
        config.store.target_database = "../elsewhere".into();
        let err = validate_config(&config).unwrap_err();
        assert!(err.to_string().contains("bare database name"));
    }
}
