//! Per-node configuration and logging handle, decoupled from the executor
//! core.
//!
//! A config lookup that prefers an in-memory map over a namespaced
//! environment variable, plus an optional YAML file merged in at
//! construction time.

use std::env;

use indexmap::IndexMap;
use serde_yaml::Value as YamlValue;
use thiserror::Error;

/// Namespace prefix for environment-variable configuration lookups, kept as
/// one named constant so re-namespacing is a one-line change.
pub const ENV_PREFIX: &str = "DATAFLOW_RT_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Io(String, #[source] std::io::Error),

    #[error("failed to parse config file {0}: {1}")]
    Parse(String, #[source] serde_yaml::Error),
}

/// Configuration and logger handle supplied to every node.
///
/// Cheap to clone: the config map is small and meant to be passed by value
/// (or as a merged copy) to each node constructor.
#[derive(Debug, Clone, Default)]
pub struct Context {
    config: IndexMap<String, YamlValue>,
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: IndexMap<String, YamlValue>) -> Self {
        Self { config }
    }

    /// Load `<config_name>.yaml`, flatten nested maps with underscore-joined
    /// keys, and merge the result into a new `Context`. A missing file is
    /// not an error — it returns an empty context.
    pub fn from_yaml_file(config_name: &str) -> Result<Self, ConfigError> {
        let path = format!("{config_name}.yaml");
        if !std::path::Path::new(&path).exists() {
            return Ok(Self::new());
        }
        let contents =
            std::fs::read_to_string(&path).map_err(|e| ConfigError::Io(path.clone(), e))?;
        let raw: YamlValue =
            serde_yaml::from_str(&contents).map_err(|e| ConfigError::Parse(path.clone(), e))?;
        let mut flattened = IndexMap::new();
        flatten_into(&mut flattened, None, raw);
        Ok(Self::with_config(flattened))
    }

    /// Merge `other`'s entries on top of `self`'s, returning a new context.
    pub fn merged_with(&self, other: &Context) -> Self {
        let mut config = self.config.clone();
        for (k, v) in &other.config {
            config.insert(k.clone(), v.clone());
        }
        Self { config }
    }

    /// Look up `key`, preferring the in-memory config map, then the
    /// environment variable `DATAFLOW_RT_<KEY>`, then `default`.
    pub fn getenv(&self, key: &str, default: Option<&str>) -> Option<String> {
        if let Some(value) = self.config.get(key) {
            return Some(yaml_value_to_string(value));
        }
        let env_key = format!("{ENV_PREFIX}{}", key.to_uppercase());
        env::var(env_key).ok().or_else(|| default.map(String::from))
    }

    pub fn create_logger(&self, name: &str) -> NodeLogger {
        NodeLogger {
            target: name.to_string(),
        }
    }
}

fn yaml_value_to_string(value: &YamlValue) -> String {
    match value {
        YamlValue::String(s) => s.clone(),
        other => serde_yaml::to_string(other)
            .unwrap_or_default()
            .trim()
            .to_string(),
    }
}

fn flatten_into(out: &mut IndexMap<String, YamlValue>, prefix: Option<&str>, value: YamlValue) {
    match value {
        YamlValue::Mapping(map) => {
            for (k, v) in map {
                let key = match k.as_str() {
                    Some(k) => k.to_string(),
                    None => continue,
                };
                let full_key = match prefix {
                    Some(p) => format!("{p}_{key}"),
                    None => key,
                };
                flatten_into(out, Some(&full_key), v);
            }
        }
        leaf => {
            if let Some(p) = prefix {
                out.insert(p.to_string(), leaf);
            }
        }
    }
}

/// A per-node logging handle returned by [`Context::create_logger`].
///
/// `log` is a process-wide facade, so this is a thin newtype that tags every
/// record with the owning node's name via the `target` field rather than a
/// distinct logger instance.
#[derive(Debug, Clone)]
pub struct NodeLogger {
    target: String,
}

impl NodeLogger {
    pub fn debug(&self, msg: &str) {
        log::debug!(target: &self.target, "{msg}");
    }

    pub fn info(&self, msg: &str) {
        log::info!(target: &self.target, "{msg}");
    }

    pub fn warn(&self, msg: &str) {
        log::warn!(target: &self.target, "{msg}");
    }

    pub fn error(&self, msg: &str) {
        log::error!(target: &self.target, "{msg}");
    }
}
