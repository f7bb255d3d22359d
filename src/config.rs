//! Configuration for correlation runs.
//!
//! Settings are layered:
//! - Default values
//! - TOML configuration file (`.lsif-correlate/settings.toml`)
//! - Environment variable overrides
//! - CLI argument overrides
//!
//! # Environment Variables
//!
//! Environment variables must be prefixed with `LSIF_` and use double
//! underscores to separate nested levels:
//! - `LSIF_CORRELATION__ROOT=web` sets `correlation.root`
//! - `LSIF_GROUPING__RESULTS_PER_RESULT_CHUNK=250` sets `grouping.results_per_result_chunk`
//! - `LSIF_LOGGING__DEFAULT=debug` sets `logging.default`

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

const CONFIG_DIR: &str = ".lsif-correlate";
const CONFIG_FILE: &str = "settings.toml";
const ENV_PREFIX: &str = "LSIF_";

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Settings {
    /// Version of the configuration schema
    #[serde(default = "default_version")]
    pub version: u32,

    #[serde(default)]
    pub logging: LoggingConfig,

    #[serde(default)]
    pub correlation: CorrelationConfig,

    #[serde(default)]
    pub grouping: GroupingConfig,

    #[serde(default)]
    pub storage: StorageConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct LoggingConfig {
    /// Level applied to every module without an override
    #[serde(default = "default_log_level")]
    pub default: String,

    /// Per-module level overrides, e.g. `lsif_correlate::grouping = "debug"`
    #[serde(default)]
    pub modules: HashMap<String, String>,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct CorrelationConfig {
    /// Repository subdirectory the dump's project root corresponds to
    #[serde(default)]
    pub root: String,

    /// Identifier stamped on packages and package references
    #[serde(default)]
    pub dump_id: i64,

    /// Drop documents missing from the repository tree
    #[serde(default = "default_true")]
    pub prune: bool,

    /// Treat gitignored files as absent when listing a working tree
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct GroupingConfig {
    /// Target number of definition/reference results per result chunk
    #[serde(default = "default_results_per_result_chunk")]
    pub results_per_result_chunk: usize,

    /// Upper bound on the number of result chunks
    #[serde(default = "default_max_num_result_chunks")]
    pub max_num_result_chunks: usize,

    /// False-positive rate of package reference bloom filters
    #[serde(default = "default_bloom_false_positive_rate")]
    pub bloom_false_positive_rate: f64,
}

#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct StorageConfig {
    /// Directory bundles are written to
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
}

// Default value functions
fn default_version() -> u32 { 1 }
fn default_true() -> bool { true }
fn default_log_level() -> String { "warn".to_string() }
fn default_results_per_result_chunk() -> usize { 500 }
fn default_max_num_result_chunks() -> usize { 1000 }
fn default_bloom_false_positive_rate() -> f64 { 0.01 }
fn default_output_dir() -> PathBuf { PathBuf::from(".lsif-correlate/bundles") }

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: default_version(),
            logging: LoggingConfig::default(),
            correlation: CorrelationConfig::default(),
            grouping: GroupingConfig::default(),
            storage: StorageConfig::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            default: default_log_level(),
            modules: HashMap::new(),
        }
    }
}

impl Default for CorrelationConfig {
    fn default() -> Self {
        Self {
            root: String::new(),
            dump_id: 0,
            prune: true,
            respect_gitignore: true,
        }
    }
}

impl Default for GroupingConfig {
    fn default() -> Self {
        Self {
            results_per_result_chunk: default_results_per_result_chunk(),
            max_num_result_chunks: default_max_num_result_chunks(),
            bloom_false_positive_rate: default_bloom_false_positive_rate(),
        }
    }
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            output_dir: default_output_dir(),
        }
    }
}

impl Settings {
    /// Load configuration from all sources
    pub fn load() -> Result<Self, Box<figment::Error>> {
        let config_path = Self::find_workspace_config()
            .unwrap_or_else(|| PathBuf::from(CONFIG_DIR).join(CONFIG_FILE));

        Self::figment(config_path).extract().map_err(Box::new)
    }

    /// Load configuration from a specific file
    pub fn load_from(path: impl AsRef<Path>) -> Result<Self, Box<figment::Error>> {
        Self::figment(path.as_ref().to_path_buf())
            .extract()
            .map_err(Box::new)
    }

    fn figment(config_path: PathBuf) -> Figment {
        Figment::new()
            .merge(Serialized::defaults(Settings::default()))
            .merge(Toml::file(config_path))
            // Double underscore (__) separates nested levels; single
            // underscores stay part of the field name
            .merge(Env::prefixed(ENV_PREFIX).map(|key| {
                key.as_str().to_lowercase().replace("__", ".").into()
            }))
    }

    /// Find the settings file by looking for the config directory from the
    /// current directory up to the filesystem root
    fn find_workspace_config() -> Option<PathBuf> {
        let current = std::env::current_dir().ok()?;

        for ancestor in current.ancestors() {
            let config_dir = ancestor.join(CONFIG_DIR);
            if config_dir.is_dir() {
                return Some(config_dir.join(CONFIG_FILE));
            }
        }

        None
    }

    /// Save current configuration to file
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), Box<dyn std::error::Error>> {
        let parent = path.as_ref().parent().ok_or("Invalid path")?;
        std::fs::create_dir_all(parent)?;

        let toml_string = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_string)?;

        Ok(())
    }

    /// Create a default settings file in the current directory
    pub fn init_config_file(force: bool) -> Result<PathBuf, Box<dyn std::error::Error>> {
        let config_path = PathBuf::from(CONFIG_DIR).join(CONFIG_FILE);

        if !force && config_path.exists() {
            return Err("Configuration file already exists. Use --force to overwrite".into());
        }

        Settings::default().save(&config_path)?;
        Ok(config_path)
    }
}
