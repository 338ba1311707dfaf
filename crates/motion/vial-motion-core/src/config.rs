//! Tunables for the motion engines.
//!
//! Every section defaults field by field so hosts can pass partial JSON
//! (`{ "carousel": { "autoplay_duration_ms": 8000 } }`).

use serde::{Deserialize, Serialize};

use crate::error::MotionError;

/// Top-level configuration shared by a [`Stage`](crate::stage::Stage).
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub sampler: SamplerCfg,
    pub carousel: CarouselCfg,
    pub parallax: ParallaxCfg,
    pub effects: EffectsCfg,
}

impl Config {
    pub fn from_json(s: &str) -> Result<Self, MotionError> {
        serde_json::from_str(s).map_err(|e| MotionError::Config(e.to_string()))
    }
}

/// Scroll thresholds in pixels of "scrolled" distance, measured from the
/// moment the element's top edge meets the viewport bottom. `end > start`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SamplerCfg {
    pub start: f64,
    pub end: f64,
}

impl Default for SamplerCfg {
    fn default() -> Self {
        Self {
            start: 0.0,
            end: 600.0,
        }
    }
}

impl SamplerCfg {
    pub fn new(start: f64, end: f64) -> Self {
        Self { start, end }
    }

    /// Boundary check used by the stage; the sampler itself assumes it holds.
    pub fn validate(&self) -> Result<(), MotionError> {
        if self.start.is_finite() && self.end.is_finite() && self.end > self.start {
            Ok(())
        } else {
            Err(MotionError::InvalidThresholds {
                start: self.start,
                end: self.end,
            })
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CarouselCfg {
    /// Time a slide stays up before autoplay advances.
    pub autoplay_duration_ms: f64,
    /// Quiet period after the last manual interaction before autoplay resumes.
    pub override_quiet_ms: f64,
    /// Horizontal travel a touch must exceed to count as a swipe.
    pub swipe_threshold_px: f64,
    /// Horizontal offset of the outgoing slide during the cross-fade.
    pub exit_drift_px: f64,
    /// Accent used by slides without their own.
    pub default_accent: String,
}

impl Default for CarouselCfg {
    fn default() -> Self {
        Self {
            autoplay_duration_ms: 6000.0,
            override_quiet_ms: 2500.0,
            swipe_threshold_px: 50.0,
            exit_drift_px: 20.0,
            default_accent: "#E53935".to_string(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ParallaxCfg {
    /// Speed coefficient for content rows (the "near", faster layer).
    pub row_speed: f64,
    /// Speed coefficient for icons (the "far", slower layer).
    pub icon_speed: f64,
    /// Multiplier applied to both speeds under reduced motion.
    pub reduced_motion_factor: f64,
}

impl Default for ParallaxCfg {
    fn default() -> Self {
        Self {
            row_speed: 0.12,
            icon_speed: 0.06,
            reduced_motion_factor: 0.25,
        }
    }
}

/// Ranges for the derived visual effects in [`effects`](crate::effects).
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EffectsCfg {
    pub hero: HeroCfg,
    /// Progress at or above which the hero video plays.
    pub video_play_threshold: f64,
    /// Whether pausing the hero video also rewinds it to the start.
    pub video_rewind_on_pause: bool,
    /// Intersection ratio at which the reveal block becomes visible.
    pub reveal_threshold: f64,
    /// Page scroll offset past which the sticky header gets its shadow.
    pub header_shadow_offset: f64,
    /// Amplitudes of the active slide image drift.
    pub drift_x_px: f64,
    pub drift_y_px: f64,
}

impl Default for EffectsCfg {
    fn default() -> Self {
        Self {
            hero: HeroCfg::default(),
            video_play_threshold: 0.95,
            video_rewind_on_pause: true,
            reveal_threshold: 0.18,
            header_shadow_offset: 5.0,
            drift_x_px: 10.0,
            drift_y_px: 6.0,
        }
    }
}

/// Hero media card ranges, mapped linearly from sampler progress.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HeroCfg {
    pub scale_from: f64,
    pub scale_to: f64,
    pub opacity_from: f64,
    pub opacity_to: f64,
    pub translate_y_px: f64,
}

impl Default for HeroCfg {
    fn default() -> Self {
        Self {
            scale_from: 0.9,
            scale_to: 1.3,
            opacity_from: 0.8,
            opacity_to: 1.0,
            translate_y_px: 50.0,
        }
    }
}
