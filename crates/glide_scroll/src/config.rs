//! Default scroll options
//!
//! The values every unset [`crate::ScrollOptions`] field falls back to. An
//! application can replace them per [`crate::SmoothScroll`] instance, either
//! in code or from a TOML file:
//!
//! ```toml
//! duration = 600
//! offset = 40
//! easing = "easeOutCubic"
//! stop_for_interruptions = true
//! ```

use std::fs;
use std::path::Path;

use glide_animation::Easing;
use serde::{Deserialize, Serialize};

use crate::error::{Result, ScrollError};

/// Default animation length in milliseconds
pub const DEFAULT_DURATION_MS: f64 = 800.0;

/// Process-level defaults for scroll options
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScrollDefaults {
    /// Animation length in milliseconds
    pub duration: f64,
    /// Pixels subtracted from the target offset
    pub offset: f64,
    pub easing: Easing,
    pub stop_for_interruptions: bool,
    /// Container to scroll when the options name none
    #[serde(skip_serializing_if = "Option::is_none")]
    pub container_id: Option<String>,
}

impl Default for ScrollDefaults {
    fn default() -> Self {
        Self {
            duration: DEFAULT_DURATION_MS,
            offset: 0.0,
            easing: Easing::EaseInOutQuart,
            stop_for_interruptions: false,
            container_id: None,
        }
    }
}

impl ScrollDefaults {
    /// Load defaults from a TOML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| ScrollError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let defaults = Self::from_toml_str(&content)?;
        tracing::debug!("ScrollDefaults: loaded {}", path.display());
        Ok(defaults)
    }

    /// Parse defaults from TOML; missing keys keep their built-in values
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let defaults: ScrollDefaults = toml::from_str(content)?;
        if !defaults.duration.is_finite() || !defaults.offset.is_finite() {
            return Err(ScrollError::InvalidOption {
                option: "duration/offset".to_string(),
                value: format!("{}/{}", defaults.duration, defaults.offset),
            });
        }
        Ok(defaults)
    }

    /// Serialize to a TOML string
    pub fn to_toml(&self) -> Result<String> {
        Ok(toml::to_string_pretty(self)?)
    }
}
