//! Configuration management for waynorm
//!
//! This module handles loading, parsing, and validating configuration
//! from TOML files. It combines settings for click classification, wheel
//! rotation, scale conversion, dispatching and logging.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::input::Modifiers;

/// Main configuration struct containing all normalizer settings
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
pub struct NormalizerConfig {
    /// Click counting and drag detection
    #[serde(default)]
    pub click: ClickConfig,

    /// Wheel rotation conversion
    #[serde(default)]
    pub wheel: WheelConfig,

    /// Coordinate conversion policy
    #[serde(default)]
    pub scale: ScaleConfig,

    /// Transport/dispatch handoff
    #[serde(default)]
    pub dispatch: DispatchConfig,

    /// General settings
    #[serde(default)]
    pub general: GeneralConfig,
}

/// Click counting and drag detection
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ClickConfig {
    /// Maximum time between presses of a multi-click (milliseconds)
    #[serde(default = "ClickConfig::default_multi_click_time")]
    pub multi_click_time_ms: u32,

    /// Motion beyond this distance turns a press into a drag (logical px)
    #[serde(default = "ClickConfig::default_drag_threshold")]
    pub drag_threshold_px: u32,

    /// How far a follow-up press may land from the previous one and still
    /// continue a multi-click (logical px, 0 = exact match)
    #[serde(default)]
    pub click_position_tolerance_px: u32,
}

/// Wheel rotation conversion
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WheelConfig {
    /// Rotations per unit of continuous scroll vector
    #[serde(default = "WheelConfig::default_vector_rotation_factor")]
    pub vector_rotation_factor: f64,

    /// Units scrolled per rotation for wheel (notch) input
    #[serde(default = "WheelConfig::default_notch_scroll_amount")]
    pub notch_scroll_amount: u32,

    /// Units scrolled per rotation for continuous input
    #[serde(default = "WheelConfig::default_vector_scroll_amount")]
    pub vector_scroll_amount: u32,

    /// 1/120ths of a detent that make up one rotation
    #[serde(default = "WheelConfig::default_notches_per_rotation")]
    pub notches_per_rotation: i32,

    /// Modifier that turns vertical scrolling horizontal (empty = never)
    #[serde(default = "WheelConfig::default_horizontal_scroll_modifier")]
    pub horizontal_scroll_modifier: Modifiers,
}

/// Coordinate conversion policy
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct ScaleConfig {
    /// Treat logical and protocol units as identical regardless of scale
    #[serde(default)]
    pub identity_conversions: bool,
}

/// Transport/dispatch handoff
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DispatchConfig {
    /// Maximum wait between transport reads while idle (milliseconds)
    #[serde(default = "DispatchConfig::default_idle_timeout")]
    pub idle_timeout_ms: u64,
}

/// General settings
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct GeneralConfig {
    /// Enable debug logging
    #[serde(default)]
    pub debug: bool,
}

impl Default for ClickConfig {
    fn default() -> Self {
        Self {
            multi_click_time_ms: Self::default_multi_click_time(),
            drag_threshold_px: Self::default_drag_threshold(),
            click_position_tolerance_px: 0,
        }
    }
}

impl Default for WheelConfig {
    fn default() -> Self {
        Self {
            vector_rotation_factor: Self::default_vector_rotation_factor(),
            notch_scroll_amount: Self::default_notch_scroll_amount(),
            vector_scroll_amount: Self::default_vector_scroll_amount(),
            notches_per_rotation: Self::default_notches_per_rotation(),
            horizontal_scroll_modifier: Self::default_horizontal_scroll_modifier(),
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            idle_timeout_ms: Self::default_idle_timeout(),
        }
    }
}

impl ClickConfig {
    fn default_multi_click_time() -> u32 {
        500
    }
    fn default_drag_threshold() -> u32 {
        4
    }
}

impl WheelConfig {
    fn default_vector_rotation_factor() -> f64 {
        0.28
    }
    fn default_notch_scroll_amount() -> u32 {
        3
    }
    fn default_vector_scroll_amount() -> u32 {
        1
    }
    fn default_notches_per_rotation() -> i32 {
        120
    }
    fn default_horizontal_scroll_modifier() -> Modifiers {
        Modifiers::SHIFT
    }
}

impl DispatchConfig {
    fn default_idle_timeout() -> u64 {
        50
    }

    pub fn idle_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.idle_timeout_ms)
    }
}

impl NormalizerConfig {
    /// Load configuration from a TOML file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Expand ~ to home directory
        let expanded_path = if path.to_string_lossy().starts_with('~') {
            let home = std::env::var("HOME").context("Failed to get HOME environment variable")?;
            Path::new(&home).join(path.strip_prefix("~").unwrap_or(path))
        } else {
            path.to_path_buf()
        };

        let contents = fs::read_to_string(&expanded_path)
            .with_context(|| format!("Failed to read config file: {}", expanded_path.display()))?;

        let config: NormalizerConfig = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config file: {}", expanded_path.display()))?;

        config.validate()?;

        Ok(config)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        if self.click.multi_click_time_ms == 0 || self.click.multi_click_time_ms > 5000 {
            anyhow::bail!("Invalid multi_click_time_ms: must be between 1 and 5000");
        }

        if self.click.drag_threshold_px > 1000 {
            anyhow::bail!("Invalid drag_threshold_px: must be at most 1000");
        }

        if !self.wheel.vector_rotation_factor.is_finite() || self.wheel.vector_rotation_factor <= 0.0
        {
            anyhow::bail!("Invalid vector_rotation_factor: must be a positive number");
        }

        if self.wheel.notches_per_rotation <= 0 {
            anyhow::bail!("Invalid notches_per_rotation: must be positive");
        }

        if self.wheel.notch_scroll_amount == 0 || self.wheel.vector_scroll_amount == 0 {
            anyhow::bail!("Invalid scroll amount: must be at least 1");
        }

        if self
            .wheel
            .horizontal_scroll_modifier
            .intersects(Modifiers::POINTER_MASK)
        {
            anyhow::bail!("Invalid horizontal_scroll_modifier: only keyboard modifiers are allowed");
        }

        if self.dispatch.idle_timeout_ms == 0 {
            anyhow::bail!("Invalid idle_timeout_ms: must be positive");
        }

        Ok(())
    }

    /// Save configuration to a TOML file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let contents = toml::to_string_pretty(self).context("Failed to serialize configuration")?;

        fs::write(path, contents).context("Failed to write configuration file")?;

        Ok(())
    }

    /// Merge a partial configuration into this one
    /// Sections of the partial config that differ from the defaults override this config
    pub fn merge_partial(mut self, partial: NormalizerConfig) -> Self {
        let default_config = NormalizerConfig::default();

        if partial.click != default_config.click {
            self.click = partial.click;
        }
        if partial.wheel != default_config.wheel {
            self.wheel = partial.wheel;
        }
        if partial.scale != default_config.scale {
            self.scale = partial.scale;
        }
        if partial.dispatch != default_config.dispatch {
            self.dispatch = partial.dispatch;
        }
        if partial.general != default_config.general {
            self.general = partial.general;
        }

        self
    }
}


#[cfg(test)]
mod property_tests;
