// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Engine configuration loaded from environment variables.

use gridstage_core::Rgb;
use gridstage_geometry::{DEFAULT_ORIENTATION_SAMPLES, DEFAULT_STOREY_BUFFER};
use gridstage_grid::{MapperConfig, DEFAULT_AREA_TOLERANCE, DEFAULT_VIRTUAL_SPACING};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::zones::DEFAULT_ZONE_SIZE;

/// Highlight color and opacity for one class of playback stage.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StageStyle {
    pub color: Rgb,
    pub opacity: f32,
}

/// Engine configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct EngineConfig {
    /// Margin below a floor level that still belongs to that floor.
    pub storey_buffer: f64,
    /// Maximum vertices sampled for orientation estimation.
    pub orientation_samples: usize,
    /// Fraction of the model extent outside which axes are not drawn.
    pub axis_margin: f64,
    /// Every n-th axis is a major line.
    pub major_every: usize,
    /// Slack around selected axes for grid-area queries.
    pub area_tolerance: f64,
    /// Axis spacing of the synthesized grid for models without one.
    pub virtual_grid_spacing: f64,
    /// Target edge length of automatically detected erection zones.
    pub zone_size: f64,
    /// Style of stages already completed during playback.
    pub completed_stage: StageStyle,
    /// Style of the stage being played.
    pub current_stage: StageStyle,
}

impl EngineConfig {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable values keep their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            storey_buffer: env_or("GRIDSTAGE_STOREY_BUFFER", defaults.storey_buffer),
            orientation_samples: env_or(
                "GRIDSTAGE_ORIENTATION_SAMPLES",
                defaults.orientation_samples,
            ),
            axis_margin: env_or("GRIDSTAGE_AXIS_MARGIN", defaults.axis_margin),
            major_every: env_or("GRIDSTAGE_MAJOR_EVERY", defaults.major_every),
            area_tolerance: env_or("GRIDSTAGE_AREA_TOLERANCE", defaults.area_tolerance),
            virtual_grid_spacing: env_or(
                "GRIDSTAGE_VIRTUAL_GRID_SPACING",
                defaults.virtual_grid_spacing,
            ),
            zone_size: env_or("GRIDSTAGE_ZONE_SIZE", defaults.zone_size),
            completed_stage: StageStyle {
                color: color_or("GRIDSTAGE_COMPLETED_COLOR", defaults.completed_stage.color),
                opacity: env_or("GRIDSTAGE_COMPLETED_OPACITY", defaults.completed_stage.opacity),
            },
            current_stage: StageStyle {
                color: color_or("GRIDSTAGE_CURRENT_COLOR", defaults.current_stage.color),
                opacity: env_or("GRIDSTAGE_CURRENT_OPACITY", defaults.current_stage.opacity),
            },
        }
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<()> {
        non_negative("storey buffer", self.storey_buffer)?;
        if self.orientation_samples < 2 {
            return Err(Error::Config("orientation needs at least 2 samples".to_string()));
        }
        non_negative("axis margin", self.axis_margin)?;
        non_negative("area tolerance", self.area_tolerance)?;
        positive("virtual grid spacing", self.virtual_grid_spacing)?;
        positive("zone size", self.zone_size)?;
        for (name, style) in [
            ("completed", &self.completed_stage),
            ("current", &self.current_stage),
        ] {
            if !(0.0..=1.0).contains(&style.opacity) {
                return Err(Error::Config(format!(
                    "{name} stage opacity {} is outside [0, 1]",
                    style.opacity
                )));
            }
        }
        Ok(())
    }

    pub fn mapper(&self) -> MapperConfig {
        MapperConfig {
            margin: self.axis_margin,
            major_every: self.major_every,
        }
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            storey_buffer: DEFAULT_STOREY_BUFFER,
            orientation_samples: DEFAULT_ORIENTATION_SAMPLES,
            axis_margin: 0.1,
            major_every: 5,
            area_tolerance: DEFAULT_AREA_TOLERANCE,
            virtual_grid_spacing: DEFAULT_VIRTUAL_SPACING,
            zone_size: DEFAULT_ZONE_SIZE,
            completed_stage: StageStyle {
                color: Rgb::NEUTRAL_GREY,
                opacity: 0.3,
            },
            current_stage: StageStyle {
                color: Rgb::ATTENTION_ORANGE,
                opacity: 1.0,
            },
        }
    }
}

fn non_negative(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} {value} must be a non-negative number")))
    }
}

fn positive(name: &str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::Config(format!("{name} {value} must be positive")))
    }
}

fn env_or<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.trim().parse().ok())
        .unwrap_or(default)
}

fn color_or(key: &str, default: Rgb) -> Rgb {
    std::env::var(key)
        .ok()
        .and_then(|v| Rgb::parse(&v))
        .unwrap_or(default)
}
