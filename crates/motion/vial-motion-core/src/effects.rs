//! Visual effects derived from engine outputs.
//!
//! These are small mappings the page applies on top of progress values; none
//! of them reads layout or owns a frame loop.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::{EffectsCfg, HeroCfg};
use crate::layout::Rect;

#[inline]
fn lerp(from: f64, to: f64, t: f64) -> f64 {
    from + t * (to - from)
}

/// Transform of the hero media card.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct HeroTransform {
    pub scale: f64,
    pub opacity: f64,
    pub translate_y: f64,
}

impl HeroTransform {
    pub fn from_progress(progress: f64, cfg: &HeroCfg) -> Self {
        let p = progress.clamp(0.0, 1.0);
        Self {
            scale: lerp(cfg.scale_from, cfg.scale_to, p),
            opacity: lerp(cfg.opacity_from, cfg.opacity_to, p),
            translate_y: p * cfg.translate_y_px,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VideoCommand {
    Play,
    Pause { rewind: bool },
}

/// Plays the hero video once the card is (nearly) fully grown, pauses it
/// otherwise. Commands are only issued on transitions.
#[derive(Clone, Debug, PartialEq)]
pub struct VideoGate {
    threshold: f64,
    rewind_on_pause: bool,
    playing: Option<bool>,
}

impl VideoGate {
    pub fn new(threshold: f64, rewind_on_pause: bool) -> Self {
        Self {
            threshold,
            rewind_on_pause,
            playing: None,
        }
    }

    pub fn is_playing(&self) -> bool {
        self.playing.unwrap_or(false)
    }

    pub fn update(&mut self, progress: f64) -> Option<VideoCommand> {
        let play = progress >= self.threshold;
        if self.playing == Some(play) {
            return None;
        }
        // the first update only reports a pause if something could be playing
        let first = self.playing.is_none();
        self.playing = Some(play);
        match (play, first) {
            (true, _) => Some(VideoCommand::Play),
            (false, true) => None,
            (false, false) => Some(VideoCommand::Pause {
                rewind: self.rewind_on_pause,
            }),
        }
    }
}

/// Fraction of `rect` inside a viewport of the given height.
pub fn intersection_ratio(rect: Rect, viewport_height: f64) -> f64 {
    if rect.height <= 0.0 {
        return 0.0;
    }
    let top = rect.top.max(0.0);
    let bottom = (rect.top + rect.height).min(viewport_height);
    ((bottom - top) / rect.height).clamp(0.0, 1.0)
}

/// Reveal-on-scroll toggle. Visible while at least `threshold` of the
/// element is on screen, hidden again once it drops below.
#[derive(Clone, Debug, PartialEq)]
pub struct RevealTracker {
    threshold: f64,
    visible: bool,
}

impl RevealTracker {
    pub fn new(threshold: f64) -> Self {
        Self {
            threshold,
            visible: false,
        }
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    /// Returns the new visibility when it changed.
    pub fn update(&mut self, ratio: f64) -> Option<bool> {
        let visible = ratio > 0.0 && ratio >= self.threshold;
        if visible == self.visible {
            None
        } else {
            self.visible = visible;
            Some(visible)
        }
    }
}

/// Sticky header gets its shadow once the page left the very top.
#[inline]
pub fn header_shadow(scroll_y: f64, offset: f64) -> bool {
    scroll_y > offset
}

/// Slow drift of the active slide image while its autoplay timer runs.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct ImageDrift {
    pub dx: f64,
    pub dy: f64,
}

impl ImageDrift {
    pub fn from_progress(progress: f64, cfg: &EffectsCfg) -> Self {
        let p = progress.min(1.0);
        Self {
            dx: (p * PI).sin() * cfg.drift_x_px,
            dy: (p * PI).cos() * cfg.drift_y_px,
        }
    }
}
