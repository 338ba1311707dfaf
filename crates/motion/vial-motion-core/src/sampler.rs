//! Scroll progress sampling.
//!
//! `scrolled = viewport_height - element_top` is 0 when the element's top
//! edge sits on the viewport bottom and grows as the page scrolls down.
//! Progress maps `scrolled` linearly from `[start, end]` onto `[0, 1]` and is
//! clamped at both ends.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::SamplerCfg;
use crate::ids::ElementHandle;
use crate::layout::LayoutProvider;

/// Latest progress of one sampler.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ProgressSample {
    pub value: f64,
}

/// Pure progress mapping. Requires `end > start`. NaN geometry maps to 0.
#[inline]
pub fn progress_for(scrolled: f64, start: f64, end: f64) -> f64 {
    let p = (scrolled - start) / (end - start);
    if p.is_nan() {
        0.0
    } else {
        p.clamp(0.0, 1.0)
    }
}

#[derive(Debug, Clone)]
pub struct ScrollProgressSampler {
    cfg: SamplerCfg,
    element: Option<ElementHandle>,
    current: ProgressSample,
}

impl ScrollProgressSampler {
    /// The caller guarantees `cfg.end > cfg.start`; see [`SamplerCfg::validate`].
    pub fn new(cfg: SamplerCfg) -> Self {
        debug_assert!(cfg.end > cfg.start, "sampler thresholds out of order");
        Self {
            cfg,
            element: None,
            current: ProgressSample::default(),
        }
    }

    pub fn with_element(mut self, element: ElementHandle) -> Self {
        self.element = Some(element);
        self
    }

    /// Point the sampler at an element. Until the host reports geometry for it
    /// the sampler keeps its last value.
    pub fn attach(&mut self, element: ElementHandle) {
        self.element = Some(element);
    }

    pub fn detach(&mut self) {
        self.element = None;
    }

    pub fn element(&self) -> Option<ElementHandle> {
        self.element
    }

    pub fn config(&self) -> SamplerCfg {
        self.cfg
    }

    #[inline]
    pub fn value(&self) -> f64 {
        self.current.value
    }

    pub fn current(&self) -> ProgressSample {
        self.current
    }

    /// Recompute from the current layout. Returns `None` when there was no
    /// geometry to read (element unset or not yet attached by the host).
    pub fn sample(&mut self, layout: &dyn LayoutProvider) -> Option<ProgressSample> {
        let element = self.element?;
        let Some(rect) = layout.rect(element) else {
            trace!("sampler: element {:?} not attached, skipping", element);
            return None;
        };
        let scrolled = layout.viewport_height() - rect.top;
        self.current = ProgressSample {
            value: progress_for(scrolled, self.cfg.start, self.cfg.end),
        };
        Some(self.current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutSnapshot, Rect};

    #[test]
    fn progress_clamps_and_interpolates() {
        assert_eq!(progress_for(-50.0, 0.0, 800.0), 0.0);
        assert_eq!(progress_for(400.0, 0.0, 800.0), 0.5);
        assert_eq!(progress_for(2000.0, 0.0, 800.0), 1.0);
        // negative start: progress already positive when the element enters
        assert!((progress_for(0.0, -100.0, 600.0) - 100.0 / 700.0).abs() < 1e-12);
    }

    #[test]
    fn nan_geometry_reads_as_zero() {
        assert_eq!(progress_for(f64::NAN, 0.0, 800.0), 0.0);
        assert_eq!(progress_for(f64::INFINITY, 0.0, 800.0), 1.0);
        assert_eq!(progress_for(f64::NEG_INFINITY, 0.0, 800.0), 0.0);

        let el = ElementHandle(1);
        let mut s = ScrollProgressSampler::new(SamplerCfg::new(0.0, 800.0)).with_element(el);
        let mut layout = LayoutSnapshot::new(f64::NAN);
        layout.set_rect(el, Rect::new(600.0, 900.0));
        assert_eq!(s.sample(&layout).map(|p| p.value), Some(0.0));

        let mut layout = LayoutSnapshot::new(1000.0);
        layout.set_rect(el, Rect::new(f64::NAN, 900.0));
        let v = s.sample(&layout).map(|p| p.value);
        assert_eq!(v, Some(0.0));
    }

    #[test]
    fn missing_geometry_keeps_last_value() {
        let el = ElementHandle(1);
        let mut s = ScrollProgressSampler::new(SamplerCfg::new(0.0, 800.0)).with_element(el);
        let mut layout = LayoutSnapshot::new(1000.0);

        assert!(s.sample(&layout).is_none());
        assert_eq!(s.value(), 0.0);

        layout.set_rect(el, Rect::new(600.0, 900.0));
        assert_eq!(s.sample(&layout).map(|p| p.value), Some(0.5));

        layout.detach(el);
        assert!(s.sample(&layout).is_none());
        assert_eq!(s.value(), 0.5);
    }
}
