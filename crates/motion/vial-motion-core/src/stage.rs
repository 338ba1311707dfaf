//! Stage: side-by-side composition of motion engines.
//!
//! The stage plays the part of the page. It owns the host capability, starts
//! each engine with its own [`Attachment`], hands every engine the same frame
//! and event stream, and gathers one [`Outputs`] per frame. Engines never see
//! each other; the only thing they share is the event stream they observe.

use tracing::{debug, trace, warn};

use crate::carousel::AutoplayCarousel;
use crate::config::{Config, SamplerCfg};
use crate::data::{check_unique_ids, Slide};
use crate::effects::ImageDrift;
use crate::error::MotionError;
use crate::host::{Attachment, EventKind, Host, HostEvent, LocalHost};
use crate::ids::{CarouselId, ElementHandle, EngineId, IdAllocator, ParallaxId, SamplerId};
use crate::layout::LayoutProvider;
use crate::outputs::{CarouselOutput, CoreEvent, Outputs, ParallaxOutput, SampleOutput, Signal};
use crate::parallax::{ParallaxFieldComputer, TrackedPair};
use crate::sampler::ScrollProgressSampler;

/// Per-engine hooks the stage drives.
pub trait MotionEngine {
    /// Event kinds the engine subscribes to while running.
    const EVENTS: &'static [EventKind];

    fn on_frame(&mut self, now_ms: f64, layout: &dyn LayoutProvider);

    /// React to a host event. Returns `true` when the event forced an
    /// immediate recomputation, so the pending frame request is refreshed.
    fn on_event(&mut self, event: &HostEvent, layout: &dyn LayoutProvider) -> bool;

    /// Clear timers and transient state on teardown.
    fn on_stop(&mut self) {}

    fn drain_signals(&mut self) -> Vec<Signal> {
        Vec::new()
    }
}

impl MotionEngine for ScrollProgressSampler {
    const EVENTS: &'static [EventKind] = &[EventKind::Resize];

    fn on_frame(&mut self, _now_ms: f64, layout: &dyn LayoutProvider) {
        self.sample(layout);
    }

    fn on_event(&mut self, event: &HostEvent, layout: &dyn LayoutProvider) -> bool {
        match event {
            HostEvent::Resize => {
                self.sample(layout);
                true
            }
            _ => false,
        }
    }
}

impl MotionEngine for AutoplayCarousel {
    const EVENTS: &'static [EventKind] = &[
        EventKind::Visibility,
        EventKind::Keyboard,
        EventKind::Pointer,
        EventKind::Touch,
    ];

    fn on_frame(&mut self, now_ms: f64, _layout: &dyn LayoutProvider) {
        self.tick(now_ms);
    }

    fn on_event(&mut self, event: &HostEvent, layout: &dyn LayoutProvider) -> bool {
        let root = self.root();
        let is_root = |target: &ElementHandle| root == Some(*target);
        match event {
            HostEvent::VisibilityChanged { hidden } => self.set_document_hidden(*hidden),
            HostEvent::KeyDown { key } => {
                let focus_within = root.is_some_and(|r| layout.has_focus_within(r));
                self.key_down(*key, focus_within);
            }
            HostEvent::PointerEnter { target } if is_root(target) => self.set_hovered(true),
            HostEvent::PointerLeave { target } if is_root(target) => self.set_hovered(false),
            HostEvent::TouchStart { target, x } if is_root(target) => self.touch_start(*x),
            HostEvent::TouchMove { target, x } if is_root(target) => self.touch_move(*x),
            HostEvent::TouchEnd { target } if is_root(target) => self.touch_end(),
            _ => {}
        }
        false
    }

    fn on_stop(&mut self) {
        self.cancel_timers();
    }

    fn drain_signals(&mut self) -> Vec<Signal> {
        AutoplayCarousel::drain_signals(self)
    }
}

impl MotionEngine for ParallaxFieldComputer {
    const EVENTS: &'static [EventKind] = &[EventKind::Resize, EventKind::ReducedMotion];

    fn on_frame(&mut self, _now_ms: f64, layout: &dyn LayoutProvider) {
        self.compute(layout);
    }

    fn on_event(&mut self, event: &HostEvent, layout: &dyn LayoutProvider) -> bool {
        match event {
            HostEvent::Resize => {
                self.compute(layout);
                true
            }
            HostEvent::ReducedMotionChanged { reduce } => {
                self.set_reduced_motion(*reduce);
                false
            }
            _ => false,
        }
    }

    fn drain_signals(&mut self) -> Vec<Signal> {
        ParallaxFieldComputer::drain_signals(self)
    }
}

#[derive(Debug)]
struct Slot<I, E> {
    id: I,
    engine: E,
    attachment: Attachment,
}

impl<I: Copy, E: MotionEngine> Slot<I, E> {
    fn start(id: I, engine: E, host: &mut dyn Host) -> Self {
        Self {
            id,
            engine,
            attachment: Attachment::acquire(host, E::EVENTS),
        }
    }

    #[inline]
    fn is_running(&self) -> bool {
        self.attachment.is_active()
    }

    /// Returns whether this call actually stopped a running engine.
    fn stop(&mut self, host: &mut dyn Host) -> bool {
        if !self.attachment.is_active() {
            return false;
        }
        self.attachment.release(host);
        self.engine.on_stop();
        // anything raised while tearing down is not reported
        let _ = self.engine.drain_signals();
        true
    }

    /// Run the frame if one was requested and ask for the next.
    fn frame(&mut self, now_ms: f64, layout: &dyn LayoutProvider, host: &mut dyn Host) -> bool {
        if !self.attachment.has_pending_frame() {
            return false;
        }
        self.attachment.renew_frame(host);
        self.engine.on_frame(now_ms, layout);
        true
    }

    fn event(&mut self, event: &HostEvent, layout: &dyn LayoutProvider, host: &mut dyn Host) {
        if !self.attachment.listens_to(event.kind()) {
            return;
        }
        if self.engine.on_event(event, layout) {
            self.attachment.renew_frame(host);
        }
    }
}

fn find_slot<I: Copy + PartialEq, E>(slots: &mut [Slot<I, E>], id: I) -> Option<&mut Slot<I, E>> {
    slots.iter_mut().find(|s| s.id == id)
}

fn collect(engine: EngineId, signals: Vec<Signal>, out: &mut Vec<CoreEvent>) {
    out.extend(signals.into_iter().map(|signal| CoreEvent { engine, signal }));
}

#[derive(Debug)]
pub struct Stage<H: Host = LocalHost> {
    cfg: Config,
    host: H,
    ids: IdAllocator,
    samplers: Vec<Slot<SamplerId, ScrollProgressSampler>>,
    carousels: Vec<Slot<CarouselId, AutoplayCarousel>>,
    parallax: Vec<Slot<ParallaxId, ParallaxFieldComputer>>,
    reduced_motion: bool,
    epoch: u64,
    /// Events raised between frames, reported with the next frame.
    pending: Vec<CoreEvent>,
    outputs: Outputs,
}

impl Stage<LocalHost> {
    pub fn new(cfg: Config) -> Self {
        Self::with_host(cfg, LocalHost::new())
    }
}

impl Default for Stage<LocalHost> {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

impl<H: Host> Stage<H> {
    pub fn with_host(cfg: Config, host: H) -> Self {
        Self {
            cfg,
            host,
            ids: IdAllocator::new(),
            samplers: Vec::new(),
            carousels: Vec::new(),
            parallax: Vec::new(),
            reduced_motion: false,
            epoch: 0,
            pending: Vec::new(),
            outputs: Outputs::default(),
        }
    }

    pub fn config(&self) -> &Config {
        &self.cfg
    }

    pub fn host(&self) -> &H {
        &self.host
    }

    pub fn host_mut(&mut self) -> &mut H {
        &mut self.host
    }

    /// Number of frames run so far.
    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    /// Outputs of the most recent frame.
    pub fn outputs(&self) -> &Outputs {
        &self.outputs
    }

    // ---- registration -------------------------------------------------------

    /// Start a sampler on `element`. `cfg` defaults to the stage's sampler section.
    pub fn add_sampler(
        &mut self,
        element: ElementHandle,
        cfg: Option<SamplerCfg>,
    ) -> Result<SamplerId, MotionError> {
        let cfg = cfg.unwrap_or(self.cfg.sampler);
        cfg.validate()?;
        let id = self.ids.alloc_sampler();
        let engine = ScrollProgressSampler::new(cfg).with_element(element);
        self.samplers.push(Slot::start(id, engine, &mut self.host));
        debug!("stage: started sampler {:?} on {:?}", id, element);
        Ok(id)
    }

    /// Start a carousel whose handlers are wired to `root`.
    pub fn add_carousel(
        &mut self,
        root: ElementHandle,
        slides: Vec<Slide>,
    ) -> Result<CarouselId, MotionError> {
        check_unique_ids(&slides)?;
        let id = self.ids.alloc_carousel();
        let mut engine = AutoplayCarousel::new(slides, self.cfg.carousel.clone());
        engine.attach(root);
        self.carousels.push(Slot::start(id, engine, &mut self.host));
        debug!("stage: started carousel {:?} on {:?}", id, root);
        Ok(id)
    }

    pub fn add_parallax(&mut self, pairs: Vec<TrackedPair>) -> ParallaxId {
        let id = self.ids.alloc_parallax();
        let mut engine = ParallaxFieldComputer::new(pairs, self.cfg.parallax);
        engine.set_reduced_motion(self.reduced_motion);
        self.parallax.push(Slot::start(id, engine, &mut self.host));
        debug!("stage: started parallax {:?}", id);
        id
    }

    // ---- lookup -------------------------------------------------------------

    pub fn sampler(&self, id: SamplerId) -> Option<&ScrollProgressSampler> {
        self.samplers.iter().find(|s| s.id == id).map(|s| &s.engine)
    }

    pub fn carousel(&self, id: CarouselId) -> Option<&AutoplayCarousel> {
        self.carousels.iter().find(|s| s.id == id).map(|s| &s.engine)
    }

    pub fn parallax(&self, id: ParallaxId) -> Option<&ParallaxFieldComputer> {
        self.parallax.iter().find(|s| s.id == id).map(|s| &s.engine)
    }

    pub fn contains(&self, engine: EngineId) -> bool {
        match engine {
            EngineId::Sampler(id) => self.sampler(id).is_some(),
            EngineId::Carousel(id) => self.carousel(id).is_some(),
            EngineId::Parallax(id) => self.parallax(id).is_some(),
        }
    }

    pub fn is_running(&self, engine: EngineId) -> bool {
        match engine {
            EngineId::Sampler(id) => self.samplers.iter().any(|s| s.id == id && s.is_running()),
            EngineId::Carousel(id) => self.carousels.iter().any(|s| s.id == id && s.is_running()),
            EngineId::Parallax(id) => self.parallax.iter().any(|s| s.id == id && s.is_running()),
        }
    }

    // ---- carousel controls --------------------------------------------------

    fn with_carousel(
        &mut self,
        id: CarouselId,
        f: impl FnOnce(&mut AutoplayCarousel),
    ) -> Result<usize, MotionError> {
        let Some(slot) = find_slot(&mut self.carousels, id) else {
            warn!("stage: no carousel {:?}", id);
            return Err(MotionError::UnknownEngine(EngineId::Carousel(id)));
        };
        if slot.is_running() {
            f(&mut slot.engine);
            collect(EngineId::Carousel(id), slot.engine.drain_signals(), &mut self.pending);
        } else {
            trace!("stage: carousel {:?} is stopped, ignoring navigation", id);
        }
        Ok(slot.engine.active_index())
    }

    /// Returns the new active index.
    pub fn carousel_next(&mut self, id: CarouselId) -> Result<usize, MotionError> {
        self.with_carousel(id, |c| c.next())
    }

    pub fn carousel_previous(&mut self, id: CarouselId) -> Result<usize, MotionError> {
        self.with_carousel(id, |c| c.previous())
    }

    pub fn carousel_go_to(&mut self, id: CarouselId, index: i64) -> Result<usize, MotionError> {
        self.with_carousel(id, |c| c.go_to(index))
    }

    // ---- host input ---------------------------------------------------------

    /// Route a host event to every running engine subscribed to its kind.
    pub fn dispatch(&mut self, event: &HostEvent, layout: &dyn LayoutProvider) {
        if let HostEvent::ReducedMotionChanged { reduce } = event {
            self.reduced_motion = *reduce;
        }
        let host: &mut dyn Host = &mut self.host;
        for slot in self.samplers.iter_mut() {
            slot.event(event, layout, host);
        }
        for slot in self.carousels.iter_mut() {
            slot.event(event, layout, host);
            collect(
                EngineId::Carousel(slot.id),
                slot.engine.drain_signals(),
                &mut self.pending,
            );
        }
        for slot in self.parallax.iter_mut() {
            slot.event(event, layout, host);
            collect(
                EngineId::Parallax(slot.id),
                slot.engine.drain_signals(),
                &mut self.pending,
            );
        }
    }

    /// Run one frame for every engine with a pending frame request.
    pub fn frame(&mut self, now_ms: f64, layout: &dyn LayoutProvider) -> &Outputs {
        self.epoch = self.epoch.wrapping_add(1);
        self.outputs.clear();
        self.outputs.events.append(&mut self.pending);
        let host: &mut dyn Host = &mut self.host;

        for slot in self.samplers.iter_mut() {
            let before = slot.engine.value();
            if !slot.frame(now_ms, layout, host) {
                continue;
            }
            let value = slot.engine.value();
            self.outputs.samples.push(SampleOutput {
                sampler: slot.id,
                value,
                changed: value != before,
            });
        }

        for slot in self.carousels.iter_mut() {
            if !slot.frame(now_ms, layout, host) {
                continue;
            }
            let c = &mut slot.engine;
            collect(EngineId::Carousel(slot.id), c.drain_signals(), &mut self.outputs.events);
            self.outputs.carousels.push(CarouselOutput {
                carousel: slot.id,
                active_index: c.active_index(),
                progress_percent: c.progress_percent(),
                state: c.state(),
                accent: c.accent().to_string(),
                layers: c.layers(),
                drift: ImageDrift::from_progress(c.cyclic_progress(), &self.cfg.effects),
            });
        }

        for slot in self.parallax.iter_mut() {
            if !slot.frame(now_ms, layout, host) {
                continue;
            }
            collect(
                EngineId::Parallax(slot.id),
                slot.engine.drain_signals(),
                &mut self.outputs.events,
            );
            self.outputs.parallax.push(ParallaxOutput {
                parallax: slot.id,
                field: slot.engine.field().clone(),
            });
        }

        &self.outputs
    }

    // ---- teardown -----------------------------------------------------------

    /// Stop one engine: cancel its frame request, drop its subscription and
    /// clear its timers. Stopping twice is harmless.
    pub fn stop(&mut self, engine: EngineId) -> Result<(), MotionError> {
        let host: &mut dyn Host = &mut self.host;
        let stopped = match engine {
            EngineId::Sampler(id) => find_slot(&mut self.samplers, id).map(|s| s.stop(host)),
            EngineId::Carousel(id) => find_slot(&mut self.carousels, id).map(|s| s.stop(host)),
            EngineId::Parallax(id) => find_slot(&mut self.parallax, id).map(|s| s.stop(host)),
        }
        .ok_or(MotionError::UnknownEngine(engine))?;

        if stopped {
            debug!("stage: stopped {}", engine);
            self.pending.push(CoreEvent {
                engine,
                signal: Signal::Stopped,
            });
        }
        Ok(())
    }

    /// Stop and forget an engine.
    pub fn remove(&mut self, engine: EngineId) -> Result<(), MotionError> {
        self.stop(engine)?;
        match engine {
            EngineId::Sampler(id) => self.samplers.retain(|s| s.id != id),
            EngineId::Carousel(id) => self.carousels.retain(|s| s.id != id),
            EngineId::Parallax(id) => self.parallax.retain(|s| s.id != id),
        }
        Ok(())
    }

    /// Stop every engine. Safe to call from teardown paths that may run twice.
    pub fn teardown(&mut self) {
        let host: &mut dyn Host = &mut self.host;
        let mut stopped = 0usize;
        for slot in self.samplers.iter_mut() {
            stopped += usize::from(slot.stop(host));
        }
        for slot in self.carousels.iter_mut() {
            stopped += usize::from(slot.stop(host));
        }
        for slot in self.parallax.iter_mut() {
            stopped += usize::from(slot.stop(host));
        }
        if stopped > 0 {
            debug!("stage: teardown stopped {} engines", stopped);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::{LayoutSnapshot, Rect};

    #[test]
    fn unknown_engine_is_reported() {
        let mut stage = Stage::default();
        let ghost = EngineId::Carousel(CarouselId(7));
        assert_eq!(stage.stop(ghost), Err(MotionError::UnknownEngine(ghost)));
        assert!(stage.carousel_next(CarouselId(7)).is_err());
    }

    #[test]
    fn invalid_thresholds_are_rejected() {
        let mut stage = Stage::default();
        let err = stage
            .add_sampler(ElementHandle(1), Some(SamplerCfg::new(500.0, 100.0)))
            .unwrap_err();
        assert!(matches!(err, MotionError::InvalidThresholds { .. }));
        assert_eq!(stage.host().subscription_count(), 0);
    }

    #[test]
    fn stopped_sampler_produces_nothing() {
        let el = ElementHandle(1);
        let layout = LayoutSnapshot::new(1000.0).with_rect(el, Rect::new(500.0, 100.0));
        let mut stage = Stage::default();
        let id = stage.add_sampler(el, None).expect("sampler");

        let out = stage.frame(0.0, &layout);
        assert_eq!(out.samples.len(), 1);

        stage.stop(EngineId::Sampler(id)).expect("stop");
        stage.stop(EngineId::Sampler(id)).expect("stop again");
        let out = stage.frame(16.0, &layout);
        assert!(out.samples.is_empty());
        assert_eq!(out.events.len(), 1, "one Stopped event, not two");
        assert!(!stage.host().wants_frame());
    }
}
