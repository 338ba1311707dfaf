//! Geometry capability.
//!
//! Engines never touch a real layout engine. Each frame the host hands them a
//! [`LayoutProvider`] that answers read-only queries about the viewport and
//! about the elements they track. Nothing here writes layout.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::ids::ElementHandle;

/// Vertical slice of an element's bounding box, in viewport coordinates.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Rect {
    pub top: f64,
    pub height: f64,
}

impl Rect {
    pub fn new(top: f64, height: f64) -> Self {
        Self { top, height }
    }

    #[inline]
    pub fn center(&self) -> f64 {
        self.top + self.height / 2.0
    }
}

/// Read-only layout queries.
pub trait LayoutProvider {
    fn viewport_height(&self) -> f64;

    /// Bounding rect of an element, or `None` while it is not attached.
    fn rect(&self, element: ElementHandle) -> Option<Rect>;

    /// Whether focus currently sits on the element or one of its descendants.
    fn has_focus_within(&self, element: ElementHandle) -> bool;

    /// Signed distance between the element's center and the viewport center.
    fn center_offset(&self, element: ElementHandle) -> Option<f64> {
        let rect = self.rect(element)?;
        Some(rect.center() - self.viewport_height() / 2.0)
    }
}

/// A layout captured once per frame, keyed by element handle.
///
/// This is what the wasm adapter deserializes from the page, and what tests use
/// as a fake geometry source.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct LayoutSnapshot {
    pub viewport_height: f64,
    #[serde(default)]
    pub rects: HashMap<u32, Rect>,
    #[serde(default)]
    pub focus_within: Vec<u32>,
}

impl LayoutSnapshot {
    pub fn new(viewport_height: f64) -> Self {
        Self {
            viewport_height,
            ..Self::default()
        }
    }

    pub fn with_rect(mut self, element: ElementHandle, rect: Rect) -> Self {
        self.rects.insert(element.0, rect);
        self
    }

    pub fn set_rect(&mut self, element: ElementHandle, rect: Rect) {
        self.rects.insert(element.0, rect);
    }

    pub fn detach(&mut self, element: ElementHandle) {
        self.rects.remove(&element.0);
    }

    pub fn set_focus_within(&mut self, element: ElementHandle, focused: bool) {
        self.focus_within.retain(|e| *e != element.0);
        if focused {
            self.focus_within.push(element.0);
        }
    }
}

impl LayoutProvider for LayoutSnapshot {
    fn viewport_height(&self) -> f64 {
        self.viewport_height
    }

    fn rect(&self, element: ElementHandle) -> Option<Rect> {
        self.rects.get(&element.0).copied()
    }

    fn has_focus_within(&self, element: ElementHandle) -> bool {
        self.focus_within.contains(&element.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn center_offset_relative_to_viewport_middle() {
        let layout = LayoutSnapshot::new(800.0)
            .with_rect(ElementHandle(1), Rect::new(300.0, 200.0))
            .with_rect(ElementHandle(2), Rect::new(-100.0, 100.0));
        assert_eq!(layout.center_offset(ElementHandle(1)), Some(0.0));
        assert_eq!(layout.center_offset(ElementHandle(2)), Some(-450.0));
        assert_eq!(layout.center_offset(ElementHandle(3)), None);
    }

    #[test]
    fn focus_within_toggles() {
        let mut layout = LayoutSnapshot::new(600.0);
        let root = ElementHandle(9);
        assert!(!layout.has_focus_within(root));
        layout.set_focus_within(root, true);
        layout.set_focus_within(root, true);
        assert!(layout.has_focus_within(root));
        assert_eq!(layout.focus_within.len(), 1);
        layout.set_focus_within(root, false);
        assert!(!layout.has_focus_within(root));
    }

    #[test]
    fn snapshot_parses_from_host_json() {
        let layout: LayoutSnapshot = serde_json::from_str(
            r#"{ "viewport_height": 900, "rects": { "4": { "top": 120, "height": 40 } } }"#,
        )
        .expect("snapshot json");
        assert_eq!(layout.rect(ElementHandle(4)), Some(Rect::new(120.0, 40.0)));
        assert!(layout.focus_within.is_empty());
    }
}
