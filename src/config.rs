//! Site configuration module.
//!
//! Handles loading, validating, and merging `config.toml`. Stock defaults
//! are the base layer; the user file only needs the keys it overrides.
//!
//! Editorial switches (global sitemap inclusion, layout style) are not
//! configured here. They live in the entity store as options so that admin
//! actions can change them at runtime.
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! [site]
//! base_url = "http://localhost"  # Public origin used in sitemap URLs
//! faq_slug = "kiss-faq"          # Path segment for single FAQ pages
//! title = "FAQs"                 # Title of generated standalone pages
//!
//! [store]
//! path = "faqs.json"             # JSON snapshot of the FAQ store
//!
//! [sitemap]
//! output = "dist/sitemap.xml"    # Where `kiss-faqs sitemap` writes
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

/// Configuration loaded from `config.toml`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteConfig {
    /// Public site settings used when building URLs and pages.
    pub site: SiteSection,
    /// Location of the store snapshot.
    pub store: StoreSection,
    /// Sitemap output settings.
    pub sitemap: SitemapSection,
}

impl SiteConfig {
    /// Validate config values are within acceptable ranges.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let base = &self.site.base_url;
        if !(base.starts_with("http://") || base.starts_with("https://")) {
            return Err(ConfigError::Validation(
                "site.base_url must start with http:// or https://".into(),
            ));
        }
        let slug = self.site.faq_slug.trim_matches('/');
        if slug.is_empty() || slug.chars().any(char::is_whitespace) {
            return Err(ConfigError::Validation(
                "site.faq_slug must be a non-empty path segment without spaces".into(),
            ));
        }
        if self.store.path.trim().is_empty() {
            return Err(ConfigError::Validation("store.path must not be empty".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SiteSection {
    /// Public origin, e.g. `https://example.com`.
    pub base_url: String,
    /// Path segment under which single FAQ pages are served.
    pub faq_slug: String,
    /// Title used by standalone pages.
    pub title: String,
}

impl Default for SiteSection {
    fn default() -> Self {
        Self {
            base_url: "http://localhost".to_string(),
            faq_slug: "kiss-faq".to_string(),
            title: "FAQs".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct StoreSection {
    pub path: String,
}

impl Default for StoreSection {
    fn default() -> Self {
        Self {
            path: "faqs.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SitemapSection {
    pub output: String,
}

impl Default for SitemapSection {
    fn default() -> Self {
        Self {
            output: "dist/sitemap.xml".to_string(),
        }
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
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

/// Read a config file as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
pub fn load_raw_config(path: &Path) -> Result<Option<toml::Value>, ConfigError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)?;
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

/// Load config from the given file, falling back to stock defaults when the
/// file is absent.
pub fn load_config(path: &Path) -> Result<SiteConfig, ConfigError> {
    let overlay = load_raw_config(path)?;
    if overlay.is_none() {
        tracing::debug!(path = %path.display(), "no config file, using defaults");
    }
    resolve_config(stock_defaults_value(), overlay)
}

/// Returns a fully-commented stock `config.toml` with all keys and explanations.
///
/// Used by the `gen-config` CLI command.
pub fn stock_config_toml() -> &'static str {
    r##"# KISS FAQs Configuration
# =======================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys will cause an error.
#
# The global sitemap switch and the layout style are stored in the FAQ
# store; change them with `kiss-faqs settings`.

# ---------------------------------------------------------------------------
# Site
# ---------------------------------------------------------------------------
[site]
# Public origin used to build sitemap URLs.
base_url = "http://localhost"

# Path segment for single FAQ pages: <base_url>/<faq_slug>/<id>/
faq_slug = "kiss-faq"

# Title of standalone pages produced by `kiss-faqs page`.
title = "FAQs"

# ---------------------------------------------------------------------------
# Store
# ---------------------------------------------------------------------------
[store]
# JSON snapshot holding FAQs, categories, metadata and options.
path = "faqs.json"

# ---------------------------------------------------------------------------
# Sitemap
# ---------------------------------------------------------------------------
[sitemap]
# Output file for `kiss-faqs sitemap`.
output = "dist/sitemap.xml"
"##
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn default_config_values() {
        let config = SiteConfig::default();
        assert_eq!(config.site.base_url, "http://localhost");
        assert_eq!(config.site.faq_slug, "kiss-faq");
        assert_eq!(config.store.path, "faqs.json");
        assert_eq!(config.sitemap.output, "dist/sitemap.xml");
    }

    #[test]
    fn parse_partial_config() {
        let config: SiteConfig = toml::from_str(
            r#"
[site]
base_url = "https://example.com"
"#,
        )
        .unwrap();
        assert_eq!(config.site.base_url, "https://example.com");
        // Defaults preserved
        assert_eq!(config.site.faq_slug, "kiss-faq");
        assert_eq!(config.store.path, "faqs.json");
    }

    #[test]
    fn load_config_returns_default_when_no_file() {
        let tmp = TempDir::new().unwrap();
        let config = load_config(&tmp.path().join("config.toml")).unwrap();
        assert_eq!(config.site.base_url, "http://localhost");
    }

    #[test]
    fn load_config_reads_file() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(
            &path,
            r#"
[site]
base_url = "https://faq.example.org"
faq_slug = "help"

[store]
path = "data/store.json"
"#,
        )
        .unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.site.base_url, "https://faq.example.org");
        assert_eq!(config.site.faq_slug, "help");
        assert_eq!(config.store.path, "data/store.json");
        assert_eq!(config.sitemap.output, "dist/sitemap.xml");
    }

    #[test]
    fn load_config_invalid_toml_is_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "this is not valid toml [[[").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Toml(_))));
    }

    #[test]
    fn unknown_key_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str(
            r#"
[site]
base_ulr = "https://example.com"
"#,
        );
        let err = result.unwrap_err().to_string();
        assert!(err.contains("unknown field"));
    }

    #[test]
    fn unknown_section_rejected() {
        let result: Result<SiteConfig, _> = toml::from_str("[layout]\nstyle = \"x\"\n");
        assert!(result.is_err());
    }

    #[test]
    fn validate_default_config_passes() {
        assert!(SiteConfig::default().validate().is_ok());
    }

    #[test]
    fn validate_base_url_scheme() {
        let mut config = SiteConfig::default();
        config.site.base_url = "example.com".into();
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn validate_faq_slug() {
        let mut config = SiteConfig::default();
        config.site.faq_slug = "/".into();
        assert!(config.validate().is_err());
        config.site.faq_slug = "my faqs".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn validate_store_path() {
        let mut config = SiteConfig::default();
        config.store.path = "  ".into();
        assert!(config.validate().is_err());
    }

    #[test]
    fn load_config_validates_values() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("config.toml");
        fs::write(&path, "[site]\nbase_url = \"ftp://nope\"\n").unwrap();
        assert!(matches!(load_config(&path), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn merge_toml_table_merge() {
        let base: toml::Value = toml::from_str(
            r#"
[site]
base_url = "http://localhost"
faq_slug = "kiss-faq"
"#,
        )
        .unwrap();
        let overlay: toml::Value = toml::from_str("[site]\nfaq_slug = \"help\"\n").unwrap();
        let merged = merge_toml(base, overlay);
        let site = merged.get("site").unwrap();
        assert_eq!(site.get("faq_slug").unwrap().as_str(), Some("help"));
        assert_eq!(site.get("base_url").unwrap().as_str(), Some("http://localhost"));
    }

    #[test]
    fn merge_toml_scalar_override() {
        let base: toml::Value = toml::from_str("a = 1\nb = 2").unwrap();
        let overlay: toml::Value = toml::from_str("a = 10").unwrap();
        let merged = merge_toml(base, overlay);
        assert_eq!(merged.get("a").unwrap().as_integer(), Some(10));
        assert_eq!(merged.get("b").unwrap().as_integer(), Some(2));
    }

    #[test]
    fn resolve_config_rejects_invalid_values() {
        let overlay: toml::Value = toml::from_str("[store]\npath = \"\"\n").unwrap();
        let result = resolve_config(stock_defaults_value(), Some(overlay));
        assert!(matches!(result, Err(ConfigError::Validation(_))));
    }

    #[test]
    fn stock_config_toml_roundtrips_to_defaults() {
        let config: SiteConfig = toml::from_str(stock_config_toml()).unwrap();
        assert_eq!(config.site.base_url, "http://localhost");
        assert_eq!(config.site.faq_slug, "kiss-faq");
        assert_eq!(config.site.title, "FAQs");
        assert_eq!(config.store.path, "faqs.json");
        assert_eq!(config.sitemap.output, "dist/sitemap.xml");
    }

    #[test]
    fn stock_defaults_value_has_all_sections() {
        let val = stock_defaults_value();
        assert!(val.is_table());
        assert!(val.get("site").is_some());
        assert!(val.get("store").is_some());
        assert!(val.get("sitemap").is_some());
    }
}
