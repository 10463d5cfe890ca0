// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration, from code, JSON or environment variables.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default capacity of the resolved-resource cache.
pub const DEFAULT_INSTANCE_CACHE_SIZE: usize = 100;

/// How placements are delivered.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FilterUsage {
    /// Build transform nodes directly in the output graph.
    #[default]
    Normal,
    /// Record placements in an instruction list for a later consumer.
    ZeroWorkCallbackBased,
}

impl FilterUsage {
    fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "normal" | "direct" => Some(FilterUsage::Normal),
            "zero_work_callback_based" | "deferred" => Some(FilterUsage::ZeroWorkCallbackBased),
            _ => None,
        }
    }
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Flatten placed instances into merged meshes.
    pub cluster: bool,
    /// Convert placed instances to GPU-instanced draws.
    pub use_draw_instanced: bool,
    /// Merge geometry when clustering.
    pub merge: bool,
    pub usage: FilterUsage,
    /// Expression naming each placement transform.
    pub feature_name_expr: Option<String>,
    /// Capacity of the resolved-resource cache.
    pub instance_cache_size: usize,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            cluster: false,
            use_draw_instanced: true,
            merge: true,
            usage: FilterUsage::Normal,
            feature_name_expr: None,
            instance_cache_size: DEFAULT_INSTANCE_CACHE_SIZE,
        }
    }
}

impl EngineConfig {
    /// Load configuration from environment variables, falling back to the
    /// defaults for unset or unparseable values.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            cluster: env_flag("INSTANCER_CLUSTER").unwrap_or(defaults.cluster),
            use_draw_instanced: env_flag("INSTANCER_DRAW_INSTANCED")
                .unwrap_or(defaults.use_draw_instanced),
            merge: env_flag("INSTANCER_MERGE").unwrap_or(defaults.merge),
            usage: std::env::var("INSTANCER_USAGE")
                .ok()
                .and_then(|v| FilterUsage::parse(&v))
                .unwrap_or(defaults.usage),
            feature_name_expr: std::env::var("INSTANCER_FEATURE_NAME")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .or(defaults.feature_name_expr),
            instance_cache_size: std::env::var("INSTANCER_CACHE_SIZE")
                .ok()
                .and_then(|v| v.trim().parse().ok())
                .unwrap_or(defaults.instance_cache_size),
        }
    }

    /// Parse a JSON document. Missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn to_json(&self) -> Result<String> {
        serde_json::to_string_pretty(self).map_err(|e| Error::Config(e.to_string()))
    }

    pub fn is_deferred(&self) -> bool {
        self.usage == FilterUsage::ZeroWorkCallbackBased
    }
}

fn env_flag(name: &str) -> Option<bool> {
    parse_flag(&std::env::var(name).ok()?)
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
