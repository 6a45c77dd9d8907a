//! # Router Configuration
//!
//! Settings that shape how handler trees are built. They can be loaded from
//! environment variables or from a YAML file; anything not set keeps its
//! default.
//!
//! ## Environment Variables
//!
//! ### `RESRT_ID_VARIABLE`
//!
//! Name of the template variable bound to a collection instance id, so
//! instance routes are registered as `base/{<name>}`.
//!
//! Default: `id`
//!
//! ### `RESRT_MAX_DEPTH`
//!
//! Maximum nesting of sub-paths below the root provider. Building a deeper
//! tree fails, which also stops accessors that keep returning each other.
//! Accepts decimal (`32`) or hexadecimal (`0x20`).
//!
//! Default: `32`
//!
//! ### `RESRT_DUMP_ROUTES`
//!
//! When `true` or `1`, the finished route table is logged at `info`.
//!
//! Default: `false`
//!
//! ## Usage
//!
//! ```rust
//! use resrouter::config::RouterConfig;
//!
//! let config = RouterConfig::from_env();
//! assert!(!config.id_variable.is_empty());
//! ```
//!
//! ## YAML
//!
//! ```yaml
//! id_variable: userId
//! max_depth: 8
//! dump_routes: true
//! ```

use anyhow::Context as _;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::Path;

const DEFAULT_ID_VARIABLE: &str = "id";
const DEFAULT_MAX_DEPTH: usize = 32;

/// Tree-building configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RouterConfig {
    /// Template variable naming a collection instance (default: `id`)
    pub id_variable: String,
    /// Maximum sub-path nesting depth (default: 32)
    pub max_depth: usize,
    /// Log the finished route table (default: false)
    pub dump_routes: bool,
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self {
            id_variable: DEFAULT_ID_VARIABLE.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
            dump_routes: false,
        }
    }
}

impl RouterConfig {
    /// Load configuration from environment variables.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    ///
    /// Unparseable values fall back to their defaults.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let id_variable = lookup("RESRT_ID_VARIABLE")
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .unwrap_or(defaults.id_variable);
        let max_depth = lookup("RESRT_MAX_DEPTH")
            .and_then(|v| parse_usize(&v))
            .unwrap_or(defaults.max_depth);
        let dump_routes = lookup("RESRT_DUMP_ROUTES")
            .map(|v| matches!(v.trim().to_ascii_lowercase().as_str(), "1" | "true" | "yes"))
            .unwrap_or(defaults.dump_routes);
        Self {
            id_variable,
            max_depth,
            dump_routes,
        }
    }

    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl AsRef<Path>) -> anyhow::Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading router config {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&text)
            .with_context(|| format!("parsing router config {}", path.display()))?;
        Ok(config)
    }
}

fn parse_usize(val: &str) -> Option<usize> {
    let val = val.trim();
    match val.strip_prefix("0x") {
        Some(hex) => usize::from_str_radix(hex, 16).ok(),
        None => val.parse().ok(),
    }
}
