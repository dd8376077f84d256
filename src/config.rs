//! Runtime tuning
//!
//! Settings are per thread, like the heap they tune. Build a [`Config`]
//! from JSON or the environment and call [`Config::apply`] on the thread
//! that runs scripts.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::Error;
use crate::gc;
use crate::value::{self, DEFAULT_MAX_DISPLAY_DEPTH};

/// Environment variable for [`Config::gc_threshold`]
pub const ENV_GC_THRESHOLD: &str = "ANYSCRIPT_GC_THRESHOLD";
/// Environment variable for [`Config::max_display_depth`]
pub const ENV_MAX_DISPLAY_DEPTH: &str = "ANYSCRIPT_MAX_DISPLAY_DEPTH";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Registrations between automatic cycle collections (0 = never)
    pub gc_threshold: usize,
    /// Object nesting printed before `[Object]` / `[Array]`
    pub max_display_depth: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            gc_threshold: gc::DEFAULT_GC_THRESHOLD,
            max_display_depth: DEFAULT_MAX_DISPLAY_DEPTH,
        }
    }
}

impl Config {
    /// Parse from JSON; missing keys take their defaults
    pub fn from_json(text: &str) -> Result<Self, Error> {
        serde_json::from_str(text).map_err(|e| Error::config(e.to_string()))
    }

    /// Defaults overridden by `ANYSCRIPT_*` environment variables
    pub fn from_env() -> Result<Self, Error> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns for each variable
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, Error> {
        let mut config = Self::default();
        if let Some(value) = lookup(ENV_GC_THRESHOLD) {
            config.gc_threshold = parse_var(ENV_GC_THRESHOLD, &value)?;
        }
        if let Some(value) = lookup(ENV_MAX_DISPLAY_DEPTH) {
            config.max_display_depth = parse_var(ENV_MAX_DISPLAY_DEPTH, &value)?;
        }
        Ok(config)
    }

    /// Install these settings on the current thread
    pub fn apply(&self) {
        debug!(
            gc_threshold = self.gc_threshold,
            max_display_depth = self.max_display_depth,
            "applying config"
        );
        gc::set_gc_threshold(self.gc_threshold);
        value::set_max_display_depth(self.max_display_depth);
    }
}

fn parse_var(name: &str, value: &str) -> Result<usize, Error> {
    value
        .trim()
        .parse()
        .map_err(|_| Error::config(format!("{name} must be a non-negative integer, got {value:?}")))
}
