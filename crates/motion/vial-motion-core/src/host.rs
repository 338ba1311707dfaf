//! Host capabilities: frame scheduling and the window-level event stream.
//!
//! Engines never register global listeners. They acquire an [`Attachment`]
//! from the host when they start and release it when they stop; the
//! attachment owns the pending frame request and the event subscription.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::ElementHandle;

/// Keys the engines care about. Everything else collapses into `Other`.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum Key {
    ArrowLeft,
    ArrowRight,
    #[serde(other)]
    Other,
}

/// Events delivered by the host. Pointer and touch events carry the element
/// they were wired to so several carousels can share one stream.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum HostEvent {
    Resize,
    VisibilityChanged { hidden: bool },
    KeyDown { key: Key },
    PointerEnter { target: ElementHandle },
    PointerLeave { target: ElementHandle },
    TouchStart { target: ElementHandle, x: f64 },
    TouchMove { target: ElementHandle, x: f64 },
    TouchEnd { target: ElementHandle },
    ReducedMotionChanged { reduce: bool },
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventKind {
    Resize,
    Visibility,
    Keyboard,
    Pointer,
    Touch,
    ReducedMotion,
}

impl HostEvent {
    pub fn kind(&self) -> EventKind {
        match self {
            HostEvent::Resize => EventKind::Resize,
            HostEvent::VisibilityChanged { .. } => EventKind::Visibility,
            HostEvent::KeyDown { .. } => EventKind::Keyboard,
            HostEvent::PointerEnter { .. } | HostEvent::PointerLeave { .. } => EventKind::Pointer,
            HostEvent::TouchStart { .. }
            | HostEvent::TouchMove { .. }
            | HostEvent::TouchEnd { .. } => EventKind::Touch,
            HostEvent::ReducedMotionChanged { .. } => EventKind::ReducedMotion,
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct FrameRequest(pub u64);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
pub struct SubscriptionId(pub u64);

pub trait FrameScheduler {
    fn request_frame(&mut self) -> FrameRequest;
    fn cancel_frame(&mut self, request: FrameRequest);
}

pub trait EventSource {
    fn subscribe(&mut self, kinds: &[EventKind]) -> SubscriptionId;
    fn unsubscribe(&mut self, id: SubscriptionId);
}

/// Everything an engine needs from its host.
pub trait Host: FrameScheduler + EventSource {}

impl<T: FrameScheduler + EventSource> Host for T {}

/// An engine's scoped hold on the host.
#[derive(Debug, Default)]
pub struct Attachment {
    kinds: Vec<EventKind>,
    frame: Option<FrameRequest>,
    subscription: Option<SubscriptionId>,
}

impl Attachment {
    /// Subscribe to `kinds` and request the first frame.
    pub fn acquire(host: &mut dyn Host, kinds: &[EventKind]) -> Self {
        let subscription = if kinds.is_empty() {
            None
        } else {
            Some(host.subscribe(kinds))
        };
        Self {
            kinds: kinds.to_vec(),
            frame: Some(host.request_frame()),
            subscription,
        }
    }

    #[inline]
    pub fn is_active(&self) -> bool {
        self.frame.is_some() || self.subscription.is_some()
    }

    #[inline]
    pub fn has_pending_frame(&self) -> bool {
        self.frame.is_some()
    }

    pub fn listens_to(&self, kind: EventKind) -> bool {
        self.subscription.is_some() && self.kinds.contains(&kind)
    }

    /// Retire the pending request and schedule a fresh one. Used both when the
    /// frame runs and when a resize forces an early recomputation; cancelling a
    /// request that already fired is a no-op on real schedulers.
    pub fn renew_frame(&mut self, host: &mut dyn Host) {
        if let Some(req) = self.frame.take() {
            host.cancel_frame(req);
            self.frame = Some(host.request_frame());
        }
    }

    /// Cancel the frame request and drop the subscription. Safe to call twice.
    pub fn release(&mut self, host: &mut dyn Host) {
        if let Some(req) = self.frame.take() {
            host.cancel_frame(req);
        }
        if let Some(sub) = self.subscription.take() {
            host.unsubscribe(sub);
        }
    }
}

/// Bookkeeping host for adapters that own the real frame loop themselves
/// (the wasm adapter, tests, benches). It only records what engines asked for.
#[derive(Debug, Default)]
pub struct LocalHost {
    next_frame: u64,
    next_sub: u64,
    pending_frames: Vec<FrameRequest>,
    subscriptions: BTreeMap<SubscriptionId, Vec<EventKind>>,
}

impl LocalHost {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether any engine is waiting for a frame.
    pub fn wants_frame(&self) -> bool {
        !self.pending_frames.is_empty()
    }

    pub fn pending_frames(&self) -> usize {
        self.pending_frames.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether anything currently listens to `kind`.
    pub fn is_observed(&self, kind: EventKind) -> bool {
        self.subscriptions.values().any(|kinds| kinds.contains(&kind))
    }
}

impl FrameScheduler for LocalHost {
    fn request_frame(&mut self) -> FrameRequest {
        let req = FrameRequest(self.next_frame);
        self.next_frame = self.next_frame.wrapping_add(1);
        self.pending_frames.push(req);
        req
    }

    fn cancel_frame(&mut self, request: FrameRequest) {
        self.pending_frames.retain(|r| *r != request);
    }
}

impl EventSource for LocalHost {
    fn subscribe(&mut self, kinds: &[EventKind]) -> SubscriptionId {
        let id = SubscriptionId(self.next_sub);
        self.next_sub = self.next_sub.wrapping_add(1);
        self.subscriptions.insert(id, kinds.to_vec());
        id
    }

    fn unsubscribe(&mut self, id: SubscriptionId) {
        self.subscriptions.remove(&id);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn release_is_idempotent() {
        let mut host = LocalHost::new();
        let mut att = Attachment::acquire(&mut host, &[EventKind::Resize]);
        assert!(att.is_active());
        assert_eq!(host.pending_frames(), 1);
        assert_eq!(host.subscription_count(), 1);

        att.release(&mut host);
        att.release(&mut host);
        assert!(!att.is_active());
        assert_eq!(host.pending_frames(), 0);
        assert_eq!(host.subscription_count(), 0);
    }

    #[test]
    fn renew_keeps_exactly_one_request() {
        let mut host = LocalHost::new();
        let mut att = Attachment::acquire(&mut host, &[]);
        att.renew_frame(&mut host);
        att.renew_frame(&mut host);
        assert_eq!(host.pending_frames(), 1);
        assert!(att.has_pending_frame());
        assert!(!host.is_observed(EventKind::Resize));
    }

    #[test]
    fn renew_after_release_stays_released() {
        let mut host = LocalHost::new();
        let mut att = Attachment::acquire(&mut host, &[EventKind::Resize]);
        att.release(&mut host);
        att.renew_frame(&mut host);
        assert!(!host.wants_frame());
    }

    #[test]
    fn event_json_shape() {
        let ev: HostEvent =
            serde_json::from_str(r#"{ "type": "touch_move", "target": 3, "x": 120.5 }"#)
                .expect("event json");
        assert_eq!(
            ev,
            HostEvent::TouchMove {
                target: ElementHandle(3),
                x: 120.5
            }
        );
        assert_eq!(ev.kind(), EventKind::Touch);

        let key: HostEvent =
            serde_json::from_str(r#"{ "type": "key_down", "key": "Enter" }"#).expect("key json");
        assert_eq!(key, HostEvent::KeyDown { key: Key::Other });
    }
}
