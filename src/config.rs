//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! form the base layer; the optional `<source>/config.toml` is merged on top
//! key by key, so a user file only needs the values it changes.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! site_title = "postmill"   # {{SITE_TITLE}} on every page
//! base_url = ""             # {{BASE_URL}} on every page
//!
//! [pages]
//! recent_posts = 10         # Posts listed on the home page
//!
//! [compression]
//! enabled = true            # Write .br siblings
//! quality = 11              # Brotli quality (0-11)
//! window = 22               # Brotli window bits (10-24)
//! extensions = ["html", "css", "js", "json", "svg", "txt", "xml"]
//!
//! [processing]
//! max_processes = 4         # Max parallel workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Site configuration loaded from `config.toml`.
///
/// All fields have defaults. Unknown keys are rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Site name substituted for `{{SITE_TITLE}}`.
    pub site_title: String,
    /// URL prefix substituted for `{{BASE_URL}}`.
    pub base_url: String,
    /// Page generation settings.
    pub pages: PagesConfig,
    /// Brotli sibling settings.
    pub compression: CompressionConfig,
    /// Parallel processing settings.
    pub processing: ProcessingConfig,
}

impl Default for SiteConfig {
    fn default() -> Self {
        Self {
            site_title: "postmill".to_string(),
            base_url: String::new(),
            pages: PagesConfig::default(),
            compression: CompressionConfig::default(),
            processing: ProcessingConfig::default(),
        }
    }
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.pages.recent_posts == 0 {
            return Err(ConfigError::Validation(
                "pages.recent_posts must be at least 1".into(),
            ));
        }
        if self.compression.quality > 11 {
            return Err(ConfigError::Validation(
                "compression.quality must be 0-11".into(),
            ));
        }
        if !(10..=24).contains(&self.compression.window) {
            return Err(ConfigError::Validation(
                "compression.window must be 10-24".into(),
            ));
        }
        if self
            .compression
            .extensions
            .iter()
            .any(|ext| ext.is_empty() || ext.starts_with('.'))
        {
            return Err(ConfigError::Validation(
                "compression.extensions must be bare extensions like \"html\"".into(),
            ));
        }
        Ok(())
    }
}

/// Page generation settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PagesConfig {
    /// Number of newest posts listed on the home page.
    pub recent_posts: usize,
}

impl Default for PagesConfig {
    fn default() -> Self {
        Self { recent_posts: 10 }
    }
}

/// Brotli sibling settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CompressionConfig {
    /// When false no `.br` files are written at all.
    pub enabled: bool,
    /// Brotli quality (0 = fastest, 11 = smallest).
    pub quality: u32,
    /// Brotli sliding window, as log2 of its size.
    pub window: u32,
    /// File extensions (without the dot) that get a `.br` sibling.
    pub extensions: Vec<String>,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            quality: 11,
            window: 22,
            extensions: ["html", "css", "js", "json", "svg", "txt", "xml"]
                .iter()
                .map(|ext| ext.to_string())
                .collect(),
        }
    }
}

impl CompressionConfig {
    /// Whether a file at `path` should get a `.br` sibling.
    pub fn applies_to(&self, path: &Path) -> bool {
        if !self.enabled {
            return false;
        }
        let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
            return false;
        };
        self.extensions.iter().any(|e| e.eq_ignore_ascii_case(ext))
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> toml::Value {
    toml::Value::try_from(SiteConfig::default()).expect("default config must serialize")
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
pub fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                let merged = match base_table.remove(&key) {
                    Some(base_val) => merge_toml(base_val, overlay_val),
                    None => overlay_val,
                };
                base_table.insert(key, merged);
            }
            toml::Value::Table(base_table)
        }
        (_, overlay) => overlay,
    }
}

/// Load `config.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if no `config.toml` exists in the directory.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = path.join("config.toml");
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path)?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<SiteConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: SiteConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `config.toml` in the given directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(root: &Path) -> Result<SiteConfig, ConfigError> {
    let base = stock_defaults_value();
    let overlay = load_raw_config(root)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# postmill configuration
# ======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults.
#
# Place this file at <source>/config.toml. Unknown keys cause an error.

# Site name, substituted for {{SITE_TITLE}} in every template.
site_title = "postmill"

# URL prefix, substituted for {{BASE_URL}} in every template.
base_url = ""

# ---------------------------------------------------------------------------
# Pages
# ---------------------------------------------------------------------------
[pages]
# Number of newest posts listed on the home page.
recent_posts = 10

# ---------------------------------------------------------------------------
# Compression
# ---------------------------------------------------------------------------
[compression]
# Write a Brotli-compressed .br sibling next to each text artifact. A sibling
# is only kept when it is smaller than the original.
enabled = true

# Brotli quality, 0 (fastest) to 11 (smallest).
quality = 11

# Brotli window size as log2 bytes, 10 to 24.
window = 22

# Extensions (without the dot) that get a .br sibling.
extensions = ["html", "css", "js", "json", "svg", "txt", "xml"]

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel workers for ingestion and indexing.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
