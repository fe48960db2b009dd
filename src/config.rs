//! # Configuration Module
//!
//! Controller settings, loaded from an optional YAML file and overridden
//! from environment variables.
//!
//! ## Environment Variables
//!
//! | Variable | Field | Default |
//! |---|---|---|
//! | `CORSGATE_ANNOTATION_PREFIX` | `annotation_prefix` | `k8s.apisix.apache.org/` |
//! | `CORSGATE_INGRESS_CLASS` | `ingress_class` | `apisix` |
//! | `CORSGATE_WATCH_UNCLASSIFIED` | `watch_unclassified` | `false` |
//! | `CORSGATE_SYNC_INTERVAL_MS` | `sync_interval_ms` | `100` |
//!
//! Unparseable values are ignored with a warning and the current value is
//! kept.
//!
//! ## Example File
//!
//! ```yaml
//! annotation_prefix: "k8s.apisix.apache.org/"
//! ingress_class: apisix
//! watch_unclassified: false
//! sync_interval_ms: 100
//! ```
//!
//! ## Usage
//!
//! ```rust
//! use corsgate::config::ControllerConfig;
//!
//! let config = ControllerConfig::from_env();
//! println!("watching class {}", config.ingress_class);
//! ```

use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;
use std::time::Duration;
use tracing::warn;

use crate::annotations::DEFAULT_ANNOTATION_PREFIX;

pub const DEFAULT_INGRESS_CLASS: &str = "apisix";
pub const DEFAULT_SYNC_INTERVAL_MS: u64 = 100;

/// Settings shared by the controller, the config sync and the CLI
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ControllerConfig {
    /// Prefix every CORS annotation key carries
    pub annotation_prefix: String,
    /// Ingress class this controller reconciles
    pub ingress_class: String,
    /// Also reconcile resources that declare no class at all
    pub watch_unclassified: bool,
    /// How often the config sync checks the store for changes
    pub sync_interval_ms: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            annotation_prefix: DEFAULT_ANNOTATION_PREFIX.to_string(),
            ingress_class: DEFAULT_INGRESS_CLASS.to_string(),
            watch_unclassified: false,
            sync_interval_ms: DEFAULT_SYNC_INTERVAL_MS,
        }
    }
}

impl ControllerConfig {
    /// Defaults with environment overrides applied
    #[must_use]
    pub fn from_env() -> Self {
        let mut config = Self::default();
        config.apply_overrides(|name| env::var(name).ok());
        config
    }

    /// Read a YAML file, then apply environment overrides
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid config.
    pub fn load(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading config file {}", path.display()))?;
        let mut config = Self::from_yaml(&text)
            .with_context(|| format!("parsing config file {}", path.display()))?;
        config.apply_overrides(|name| env::var(name).ok());
        Ok(config)
    }

    /// Parse YAML text; an empty document yields the defaults
    ///
    /// # Errors
    ///
    /// Returns an error on invalid YAML or unknown fields.
    pub fn from_yaml(text: &str) -> anyhow::Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(text)?)
    }

    /// Apply `CORSGATE_*` overrides read through `lookup`
    pub fn apply_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(prefix) = lookup("CORSGATE_ANNOTATION_PREFIX") {
            self.annotation_prefix = prefix;
        }
        if let Some(class) = lookup("CORSGATE_INGRESS_CLASS") {
            self.ingress_class = class;
        }
        if let Some(raw) = lookup("CORSGATE_WATCH_UNCLASSIFIED") {
            match parse_bool(&raw) {
                Some(value) => self.watch_unclassified = value,
                None => warn!(value = %raw, "ignoring invalid CORSGATE_WATCH_UNCLASSIFIED"),
            }
        }
        if let Some(raw) = lookup("CORSGATE_SYNC_INTERVAL_MS") {
            match raw.trim().parse::<u64>() {
                Ok(ms) if ms > 0 => self.sync_interval_ms = ms,
                _ => warn!(value = %raw, "ignoring invalid CORSGATE_SYNC_INTERVAL_MS"),
            }
        }
    }

    #[must_use]
    pub fn sync_interval(&self) -> Duration {
        Duration::from_millis(self.sync_interval_ms.max(1))
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
