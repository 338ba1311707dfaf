//! Parallax field over a list of (row, icon) element pairs.
//!
//! Each pair is measured against the viewport's vertical center. Rows and
//! icons move with separate speed coefficients, which is what makes the two
//! layers separate visually. The pair whose row sits closest to the center is
//! the active step.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::config::ParallaxCfg;
use crate::ids::ElementHandle;
use crate::layout::LayoutProvider;
use crate::outputs::{Signal, SignalQueue};

/// One timeline step: a content row and the icon paired with it.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct TrackedPair {
    pub row: ElementHandle,
    pub icon: ElementHandle,
}

impl TrackedPair {
    pub fn new(row: ElementHandle, icon: ElementHandle) -> Self {
        Self { row, icon }
    }
}

/// Per-frame displacements. `near` is the faster row layer, `far` the slower
/// icon layer; both are indexed like the tracked pairs.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ParallaxField {
    pub near: Vec<f64>,
    pub far: Vec<f64>,
    pub active_index: usize,
}

/// `-(offset * speed * factor)`: elements above center drift down, below drift up.
#[inline]
pub fn displacement(center_offset: f64, speed: f64, factor: f64) -> f64 {
    -(center_offset * speed * factor)
}

/// Index of the smallest `|offset|` among present entries; the first one wins
/// a tie. `None` when no entry is present.
pub fn closest_to_center<I>(offsets: I) -> Option<usize>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut best: Option<(usize, f64)> = None;
    for (i, offset) in offsets.into_iter().enumerate() {
        let Some(offset) = offset else { continue };
        let dist = offset.abs();
        match best {
            Some((_, best_dist)) if dist >= best_dist => {}
            _ => best = Some((i, dist)),
        }
    }
    best.map(|(i, _)| i)
}

#[derive(Debug, Clone)]
pub struct ParallaxFieldComputer {
    cfg: ParallaxCfg,
    pairs: Vec<TrackedPair>,
    reduced_motion: bool,
    field: ParallaxField,
    signals: SignalQueue,
}

impl ParallaxFieldComputer {
    pub fn new(pairs: Vec<TrackedPair>, cfg: ParallaxCfg) -> Self {
        let n = pairs.len();
        Self {
            cfg,
            pairs,
            reduced_motion: false,
            field: ParallaxField {
                near: vec![0.0; n],
                far: vec![0.0; n],
                active_index: 0,
            },
            signals: SignalQueue::default(),
        }
    }

    pub fn pairs(&self) -> &[TrackedPair] {
        &self.pairs
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn field(&self) -> &ParallaxField {
        &self.field
    }

    #[inline]
    pub fn active_index(&self) -> usize {
        self.field.active_index
    }

    /// Platform reduced-motion preference, forwarded by the host.
    pub fn set_reduced_motion(&mut self, reduce: bool) {
        self.reduced_motion = reduce;
    }

    pub fn reduced_motion(&self) -> bool {
        self.reduced_motion
    }

    fn motion_factor(&self) -> f64 {
        if self.reduced_motion {
            self.cfg.reduced_motion_factor
        } else {
            1.0
        }
    }

    pub fn drain_signals(&mut self) -> Vec<Signal> {
        self.signals.drain()
    }

    /// Recompute the whole field. Pairs with a missing row or icon get zero
    /// displacement and take no part in picking the active step.
    pub fn compute(&mut self, layout: &dyn LayoutProvider) -> &ParallaxField {
        let factor = self.motion_factor();
        let n = self.pairs.len();
        let mut near = Vec::with_capacity(n);
        let mut far = Vec::with_capacity(n);
        let mut row_offsets = Vec::with_capacity(n);

        for pair in &self.pairs {
            match (layout.center_offset(pair.row), layout.center_offset(pair.icon)) {
                (Some(d_row), Some(d_icon)) => {
                    near.push(displacement(d_row, self.cfg.row_speed, factor));
                    far.push(displacement(d_icon, self.cfg.icon_speed, factor));
                    row_offsets.push(Some(d_row));
                }
                _ => {
                    near.push(0.0);
                    far.push(0.0);
                    row_offsets.push(None);
                }
            }
        }

        let active_index = closest_to_center(row_offsets).unwrap_or(0);
        if active_index != self.field.active_index {
            debug!(
                "parallax: active step {} -> {}",
                self.field.active_index, active_index
            );
            self.signals.push(Signal::ActiveStepChanged {
                from: self.field.active_index,
                to: active_index,
            });
        }
        self.field = ParallaxField {
            near,
            far,
            active_index,
        };
        &self.field
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn closest_prefers_lower_index_on_tie() {
        assert_eq!(closest_to_center([Some(40.0), Some(-10.0), Some(10.0)]), Some(1));
        assert_eq!(closest_to_center([None, Some(5.0), Some(-5.0)]), Some(1));
        assert_eq!(closest_to_center([None, None]), None);
        assert_eq!(closest_to_center(Vec::<Option<f64>>::new()), None);
    }

    #[test]
    fn displacement_sign_opposes_offset() {
        let close = |a: f64, b: f64| (a - b).abs() < 1e-9;
        assert!(close(displacement(100.0, 0.12, 1.0), -12.0));
        assert!(close(displacement(-100.0, 0.06, 1.0), 6.0));
        assert!(close(displacement(100.0, 0.12, 0.25), -3.0));
        assert_eq!(displacement(0.0, 0.12, 1.0), 0.0);
    }
}
