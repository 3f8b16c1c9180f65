use std::path::Path;

use anyhow::Context as _;

use crate::{
    animation::{driver::DEFAULT_ANIMATION_SPEED, interp::ARC_HEIGHT_SCALE},
    foundation::error::{TrafficError, TrafficResult},
};

/// Serializable layer options. Every field has a default, so `{}` is a valid config.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LayerConfig {
    /// Progress increment per frame tick.
    pub animation_speed: f64,
    /// Emit trail primitives.
    pub show_trail: bool,
    /// Emit point primitives.
    pub show_point: bool,
    /// Trailing window width, in progress units.
    pub trail_length: f64,
    /// Apply the fade-out opacity law past progress 1.
    pub fade_out: bool,
    /// Restart automatically on completion.
    #[serde(rename = "loop")]
    pub looping: bool,
    /// Peak bump height.
    pub arc_height: f64,
    /// Point radius in map units.
    pub point_radius: f64,
    /// Lower bound on the on-screen point radius.
    pub point_radius_min_pixels: f64,
    /// Reject events without an explicit id instead of deriving one from coordinates.
    pub require_ids: bool,
}

impl Default for LayerConfig {
    fn default() -> Self {
        Self {
            animation_speed: DEFAULT_ANIMATION_SPEED,
            show_trail: true,
            show_point: true,
            trail_length: 0.3,
            fade_out: true,
            looping: false,
            arc_height: ARC_HEIGHT_SCALE,
            point_radius: 4.0,
            point_radius_min_pixels: 3.0,
            require_ids: false,
        }
    }
}

impl LayerConfig {
    /// Reject values the driver or assembler cannot work with.
    pub fn validate(&self) -> TrafficResult<()> {
        if !(self.animation_speed.is_finite() && self.animation_speed > 0.0) {
            return Err(TrafficError::validation(
                "animation_speed must be finite and > 0",
            ));
        }
        if !(self.trail_length.is_finite() && self.trail_length >= 0.0) {
            return Err(TrafficError::validation(
                "trail_length must be finite and >= 0",
            ));
        }
        if !self.arc_height.is_finite() {
            return Err(TrafficError::validation("arc_height must be finite"));
        }
        if !(self.point_radius >= 0.0 && self.point_radius_min_pixels >= 0.0) {
            return Err(TrafficError::validation("point radii must be >= 0"));
        }
        Ok(())
    }

    /// Parse and validate.
    pub fn from_json_str(s: &str) -> TrafficResult<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Read, parse and validate a JSON config file.
    pub fn from_path(path: &Path) -> TrafficResult<Self> {
        let s = std::fs::read_to_string(path)
            .with_context(|| format!("read layer config '{}'", path.display()))?;
        Self::from_json_str(&s)
    }
}
