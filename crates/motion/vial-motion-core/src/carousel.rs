//! Autoplay carousel state machine.
//!
//! Pause reasons are retained as facts (hover, a pending quiet period and its
//! cause) and the reported [`AutoplayState`] is derived from them with a fixed
//! precedence:
//!
//! | slides | quiet period        | hovered | state                |
//! |--------|---------------------|---------|----------------------|
//! | <= 1   | any                 | any     | `Inert`              |
//! | > 1    | armed by visibility | any     | `PausedByVisibility` |
//! | > 1    | armed by input      | any     | `PausedByOverride`   |
//! | > 1    | none                | yes     | `PausedByHover`      |
//! | > 1    | none                | no      | `Running`            |
//!
//! A quiet period therefore wins over hover until it drains, and leaving the
//! carousel with the pointer never cuts it short.

use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::config::CarouselCfg;
use crate::data::Slide;
use crate::host::Key;
use crate::ids::ElementHandle;
use crate::outputs::{Signal, SignalQueue};

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AutoplayState {
    Running,
    PausedByHover,
    PausedByOverride,
    PausedByVisibility,
    /// Fewer than two slides: nothing to cycle through.
    Inert,
}

impl AutoplayState {
    #[inline]
    pub fn is_running(self) -> bool {
        matches!(self, AutoplayState::Running)
    }
}

/// What moved the active slide.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NavCause {
    Autoplay,
    Next,
    Previous,
    GoTo,
    Keyboard,
    Swipe,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OverrideCause {
    Input,
    Visibility,
}

#[derive(Copy, Clone, Debug, PartialEq)]
struct QuietPeriod {
    cause: OverrideCause,
    remaining_ms: f64,
}

/// Render tier of one slide.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LayerTier {
    /// Current slide, fully opaque on top.
    Active,
    /// Slide that just left, fading out with a small horizontal drift.
    Exiting,
    /// Everything else: transparent and inert.
    Hidden,
}

#[derive(Copy, Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SlideLayer {
    pub index: usize,
    pub tier: LayerTier,
    pub opacity: f64,
    pub offset_x: f64,
    pub z_index: u8,
    pub pointer_events: bool,
    pub aria_hidden: bool,
    /// Mirrors onto the matching navigation dot.
    pub aria_current: bool,
}

#[derive(Debug, Clone)]
pub struct AutoplayCarousel {
    cfg: CarouselCfg,
    slides: Vec<Slide>,
    root: Option<ElementHandle>,

    active_index: usize,
    /// Running time spent on the active slide; progress is `elapsed / duration`.
    elapsed_ms: f64,
    hovered: bool,
    quiet: Option<QuietPeriod>,
    drag_origin: Option<f64>,

    last_frame_ms: Option<f64>,
    ran_last_frame: bool,
    state: AutoplayState,

    signals: SignalQueue,
}

impl AutoplayCarousel {
    pub fn new(slides: Vec<Slide>, cfg: CarouselCfg) -> Self {
        if slides.is_empty() {
            warn!("carousel created without slides; it will stay inert");
        }
        if cfg.autoplay_duration_ms.is_nan() || cfg.autoplay_duration_ms <= 0.0 {
            warn!(
                "carousel autoplay duration {} is not positive; autoplay disabled",
                cfg.autoplay_duration_ms
            );
        }
        let mut carousel = Self {
            cfg,
            slides,
            root: None,
            active_index: 0,
            elapsed_ms: 0.0,
            hovered: false,
            quiet: None,
            drag_origin: None,
            last_frame_ms: None,
            ran_last_frame: false,
            state: AutoplayState::Inert,
            signals: SignalQueue::default(),
        };
        carousel.state = carousel.derive_state();
        carousel
    }

    /// Root element the page wires pointer, touch and keyboard handlers to.
    pub fn attach(&mut self, root: ElementHandle) {
        self.root = Some(root);
    }

    pub fn root(&self) -> Option<ElementHandle> {
        self.root
    }

    pub fn config(&self) -> &CarouselCfg {
        &self.cfg
    }

    pub fn slides(&self) -> &[Slide] {
        &self.slides
    }

    #[inline]
    pub fn slide_count(&self) -> usize {
        self.slides.len()
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.active_index
    }

    pub fn active_slide(&self) -> Option<&Slide> {
        self.slides.get(self.active_index)
    }

    /// Accent of the active slide, falling back to the carousel default.
    pub fn accent(&self) -> &str {
        self.active_slide()
            .and_then(|s| s.accent_color.as_deref())
            .unwrap_or(&self.cfg.default_accent)
    }

    /// Fraction of the autoplay interval spent on the active slide, in `[0, 1)`.
    pub fn cyclic_progress(&self) -> f64 {
        if self.cfg.autoplay_duration_ms > 0.0 {
            self.elapsed_ms / self.cfg.autoplay_duration_ms
        } else {
            0.0
        }
    }

    /// Progress bar width in percent.
    pub fn progress_percent(&self) -> f64 {
        self.cyclic_progress().min(1.0) * 100.0
    }

    #[inline]
    pub fn state(&self) -> AutoplayState {
        self.state
    }

    pub fn is_hovered(&self) -> bool {
        self.hovered
    }

    /// Whether a quiet period (manual or visibility) is pending.
    pub fn is_overridden(&self) -> bool {
        self.quiet.is_some()
    }

    pub fn override_remaining_ms(&self) -> Option<f64> {
        self.quiet.map(|q| q.remaining_ms)
    }

    pub fn drag_origin(&self) -> Option<f64> {
        self.drag_origin
    }

    /// Signals produced since the last drain, oldest first.
    pub fn drain_signals(&mut self) -> Vec<Signal> {
        self.signals.drain()
    }

    // ---- navigation ---------------------------------------------------------

    pub fn next(&mut self) {
        self.step_by(1, NavCause::Next);
    }

    pub fn previous(&mut self) {
        self.step_by(-1, NavCause::Previous);
    }

    /// Jump to `index`, wrapping negative and oversized values into range.
    pub fn go_to(&mut self, index: i64) {
        self.navigate(index, NavCause::GoTo);
    }

    fn step_by(&mut self, delta: i64, cause: NavCause) {
        let target = self.active_index as i64 + delta;
        self.navigate(target, cause);
    }

    fn navigate(&mut self, index: i64, cause: NavCause) {
        let n = self.slides.len();
        if n == 0 {
            return;
        }
        let target = index.rem_euclid(n as i64) as usize;
        self.arm_quiet_period(OverrideCause::Input);
        self.set_active(target, cause);
        self.refresh_state();
    }

    fn set_active(&mut self, target: usize, cause: NavCause) {
        let from = self.active_index;
        self.active_index = target;
        self.elapsed_ms = 0.0;
        if from != target {
            debug!("carousel: slide {} -> {} ({:?})", from, target, cause);
            self.signals.push(Signal::SlideChanged {
                from,
                to: target,
                cause,
            });
        }
    }

    fn arm_quiet_period(&mut self, cause: OverrideCause) {
        self.quiet = Some(QuietPeriod {
            cause,
            remaining_ms: self.cfg.override_quiet_ms,
        });
    }

    // ---- host input ---------------------------------------------------------

    pub fn set_hovered(&mut self, hovered: bool) {
        if self.slides.is_empty() {
            return;
        }
        self.hovered = hovered;
        self.refresh_state();
    }

    /// Hidden tabs pause like a manual interaction. Becoming visible again
    /// leaves the quiet period to run out on its own.
    pub fn set_document_hidden(&mut self, hidden: bool) {
        if hidden && !self.slides.is_empty() {
            self.arm_quiet_period(OverrideCause::Visibility);
            self.refresh_state();
        }
    }

    pub fn touch_start(&mut self, x: f64) {
        if self.slides.is_empty() {
            return;
        }
        self.drag_origin = Some(x);
        self.arm_quiet_period(OverrideCause::Input);
        self.refresh_state();
    }

    /// One gesture fires at most one navigation: the origin is cleared as
    /// soon as the travel crosses the threshold.
    pub fn touch_move(&mut self, x: f64) {
        let Some(origin) = self.drag_origin else {
            return;
        };
        let delta = x - origin;
        if delta.abs() > self.cfg.swipe_threshold_px {
            self.drag_origin = None;
            if delta < 0.0 {
                self.step_by(1, NavCause::Swipe);
            } else {
                self.step_by(-1, NavCause::Swipe);
            }
        }
    }

    pub fn touch_end(&mut self) {
        self.drag_origin = None;
    }

    /// Arrow keys only navigate while the carousel root has focus-within.
    /// Returns whether the key was consumed.
    pub fn key_down(&mut self, key: Key, focus_within: bool) -> bool {
        if !focus_within || self.slides.is_empty() {
            return false;
        }
        match key {
            Key::ArrowRight => {
                self.step_by(1, NavCause::Keyboard);
                true
            }
            Key::ArrowLeft => {
                self.step_by(-1, NavCause::Keyboard);
                true
            }
            Key::Other => false,
        }
    }

    // ---- frame --------------------------------------------------------------

    /// Advance with the host's frame timestamp. Time spent paused drains the
    /// quiet period but never the slide timer; the first running frame after
    /// a pause contributes nothing.
    pub fn tick(&mut self, now_ms: f64) {
        let dt = match self.last_frame_ms {
            Some(prev) if now_ms > prev => now_ms - prev,
            _ => 0.0,
        };
        self.last_frame_ms = Some(now_ms);

        if let Some(quiet) = self.quiet.as_mut() {
            quiet.remaining_ms -= dt;
            if quiet.remaining_ms <= 0.0 {
                trace!("carousel: quiet period ({:?}) elapsed", quiet.cause);
                self.quiet = None;
            }
        }
        self.refresh_state();

        let running = self.state.is_running() && self.cfg.autoplay_duration_ms > 0.0;
        if running && self.ran_last_frame && dt > 0.0 {
            self.elapsed_ms += dt;
            if self.elapsed_ms >= self.cfg.autoplay_duration_ms {
                let target = (self.active_index + 1) % self.slides.len();
                self.set_active(target, NavCause::Autoplay);
            }
        }
        self.ran_last_frame = running;
    }

    /// Drop pending timers and gesture state. Called on teardown; safe to
    /// call repeatedly.
    pub fn cancel_timers(&mut self) {
        self.quiet = None;
        self.drag_origin = None;
        self.last_frame_ms = None;
        self.ran_last_frame = false;
        self.refresh_state();
    }

    fn derive_state(&self) -> AutoplayState {
        if self.slides.len() <= 1 {
            return AutoplayState::Inert;
        }
        match self.quiet {
            Some(QuietPeriod {
                cause: OverrideCause::Visibility,
                ..
            }) => AutoplayState::PausedByVisibility,
            Some(_) => AutoplayState::PausedByOverride,
            None if self.hovered => AutoplayState::PausedByHover,
            None => AutoplayState::Running,
        }
    }

    fn refresh_state(&mut self) {
        let next = self.derive_state();
        if next != self.state {
            debug!("carousel: autoplay {:?} -> {:?}", self.state, next);
            self.signals.push(Signal::AutoplayStateChanged {
                from: self.state,
                to: next,
            });
            self.state = next;
        }
        // a pause armed and released between frames must not count its gap
        if !self.state.is_running() {
            self.ran_last_frame = false;
        }
    }

    // ---- presentation -------------------------------------------------------

    #[inline]
    fn previous_index(&self) -> usize {
        let n = self.slides.len();
        (self.active_index + n - 1) % n
    }

    /// Layer for one slide. Only the active and the previous slide ever carry
    /// a visible transition.
    pub fn layer(&self, index: usize) -> SlideLayer {
        let tier = if index == self.active_index {
            LayerTier::Active
        } else if !self.slides.is_empty() && index == self.previous_index() {
            LayerTier::Exiting
        } else {
            LayerTier::Hidden
        };
        let (opacity, offset_x, z_index, pointer_events) = match tier {
            LayerTier::Active => (1.0, 0.0, 2, true),
            LayerTier::Exiting => (0.0, -self.cfg.exit_drift_px, 1, true),
            LayerTier::Hidden => (0.0, 0.0, 0, false),
        };
        SlideLayer {
            index,
            tier,
            opacity,
            offset_x,
            z_index,
            pointer_events,
            aria_hidden: tier != LayerTier::Active,
            aria_current: tier == LayerTier::Active,
        }
    }

    pub fn layers(&self) -> Vec<SlideLayer> {
        (0..self.slides.len()).map(|i| self.layer(i)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn deck(n: usize) -> Vec<Slide> {
        (0..n)
            .map(|i| Slide::new(format!("s{i}"), format!("Slide {i}"), format!("/img/{i}.png")))
            .collect()
    }

    #[test]
    fn state_precedence() {
        let mut c = AutoplayCarousel::new(deck(3), CarouselCfg::default());
        assert_eq!(c.state(), AutoplayState::Running);
        c.set_hovered(true);
        assert_eq!(c.state(), AutoplayState::PausedByHover);
        c.next();
        assert_eq!(c.state(), AutoplayState::PausedByOverride);
        c.set_document_hidden(true);
        assert_eq!(c.state(), AutoplayState::PausedByVisibility);
        c.set_hovered(false);
        assert_eq!(c.state(), AutoplayState::PausedByVisibility);
    }

    #[test]
    fn single_slide_is_inert() {
        let mut c = AutoplayCarousel::new(deck(1), CarouselCfg::default());
        c.tick(0.0);
        c.tick(10_000.0);
        assert_eq!(c.state(), AutoplayState::Inert);
        assert_eq!(c.active_index(), 0);
        assert_eq!(c.cyclic_progress(), 0.0);
    }

    #[test]
    fn empty_deck_is_a_noop() {
        let mut c = AutoplayCarousel::new(Vec::new(), CarouselCfg::default());
        c.next();
        c.go_to(-3);
        c.touch_start(10.0);
        c.touch_move(200.0);
        assert!(!c.key_down(Key::ArrowRight, true));
        c.tick(0.0);
        c.tick(7000.0);
        assert_eq!(c.active_index(), 0);
        assert!(c.layers().is_empty());
        assert!(c.active_slide().is_none());
        assert!(c.drain_signals().is_empty());
    }

    #[test]
    fn layers_follow_three_tiers() {
        let mut c = AutoplayCarousel::new(deck(4), CarouselCfg::default());
        c.go_to(2);
        let layers = c.layers();
        assert_eq!(layers[2].tier, LayerTier::Active);
        assert_eq!(layers[2].opacity, 1.0);
        assert_eq!(layers[2].z_index, 2);
        assert!(!layers[2].aria_hidden);
        assert!(layers[2].aria_current);

        assert_eq!(layers[1].tier, LayerTier::Exiting);
        assert_eq!(layers[1].offset_x, -20.0);
        assert_eq!(layers[1].z_index, 1);

        for i in [0, 3] {
            assert_eq!(layers[i].tier, LayerTier::Hidden);
            assert!(!layers[i].pointer_events);
            assert_eq!(layers[i].opacity, 0.0);
        }

        c.go_to(0);
        assert_eq!(c.layer(3).tier, LayerTier::Exiting);
    }

    #[test]
    fn accent_falls_back_to_default() {
        let mut slides = deck(2);
        slides[1] = slides[1].clone().with_accent("#43A047");
        let mut c = AutoplayCarousel::new(slides, CarouselCfg::default());
        assert_eq!(c.accent(), "#E53935");
        c.next();
        assert_eq!(c.accent(), "#43A047");
    }

    #[test]
    fn cancel_timers_clears_quiet_period() {
        let mut c = AutoplayCarousel::new(deck(3), CarouselCfg::default());
        c.touch_start(100.0);
        assert!(c.is_overridden());
        c.cancel_timers();
        c.cancel_timers();
        assert!(!c.is_overridden());
        assert_eq!(c.drag_origin(), None);
        assert_eq!(c.state(), AutoplayState::Running);
    }

    #[test]
    fn quiet_period_outlasts_hover() {
        let mut c = AutoplayCarousel::new(deck(3), CarouselCfg::default());
        c.tick(0.0);
        c.set_hovered(true);
        c.next();
        assert_eq!(c.state(), AutoplayState::PausedByOverride);
        c.set_hovered(false);
        assert_eq!(c.state(), AutoplayState::PausedByOverride);
        c.tick(2_499.0);
        assert_eq!(c.state(), AutoplayState::PausedByOverride);
        c.tick(2_500.0);
        assert_eq!(c.state(), AutoplayState::Running);
    }

    #[test]
    fn hover_takes_over_when_quiet_period_drains() {
        let mut c = AutoplayCarousel::new(deck(3), CarouselCfg::default());
        c.tick(0.0);
        c.set_hovered(true);
        c.next();
        c.tick(2_500.0);
        assert_eq!(c.state(), AutoplayState::PausedByHover);
        c.tick(20_000.0);
        assert_eq!(c.active_index(), 1);
        c.set_hovered(false);
        assert_eq!(c.state(), AutoplayState::Running);
    }

    #[test]
    fn undrained_signals_stay_bounded() {
        let mut c = AutoplayCarousel::new(deck(3), CarouselCfg::default());
        for _ in 0..200 {
            c.next();
        }
        let signals = c.drain_signals();
        assert_eq!(signals.len(), SignalQueue::CAPACITY);
        assert_eq!(
            signals.last(),
            Some(&Signal::SlideChanged {
                from: 1,
                to: 2,
                cause: NavCause::Next,
            })
        );
        assert!(c.drain_signals().is_empty());
    }
}
