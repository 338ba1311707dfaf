//! Output contracts from the stage.
//!
//! One [`Outputs`] value per host frame: the current numbers of every running
//! engine plus the semantic events raised since the previous frame. Adapters
//! render the numbers and forward the events.

use std::collections::VecDeque;

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::carousel::{AutoplayState, NavCause, SlideLayer};
use crate::effects::ImageDrift;
use crate::ids::{CarouselId, EngineId, ParallaxId, SamplerId};
use crate::parallax::ParallaxField;

/// Engine-local signal, raised inside an engine and tagged with its id by the stage.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
#[non_exhaustive]
pub enum Signal {
    SlideChanged {
        from: usize,
        to: usize,
        cause: NavCause,
    },
    AutoplayStateChanged {
        from: AutoplayState,
        to: AutoplayState,
    },
    ActiveStepChanged {
        from: usize,
        to: usize,
    },
    Stopped,
}

/// Pending signals of one engine. A stage drains it every frame; an engine
/// driven directly keeps at most [`SignalQueue::CAPACITY`] entries and drops
/// the oldest beyond that.
#[derive(Clone, Debug, Default)]
pub struct SignalQueue {
    items: VecDeque<Signal>,
}

impl SignalQueue {
    pub const CAPACITY: usize = 64;

    pub fn push(&mut self, signal: Signal) {
        if self.items.len() == Self::CAPACITY {
            trace!("signal queue full; dropping oldest");
            self.items.pop_front();
        }
        self.items.push_back(signal);
    }

    /// Everything queued, oldest first.
    pub fn drain(&mut self) -> Vec<Signal> {
        self.items.drain(..).collect()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CoreEvent {
    pub engine: EngineId,
    #[serde(flatten)]
    pub signal: Signal,
}

#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct SampleOutput {
    pub sampler: SamplerId,
    pub value: f64,
    /// False when the value did not move this frame (or geometry was missing).
    pub changed: bool,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct CarouselOutput {
    pub carousel: CarouselId,
    pub active_index: usize,
    pub progress_percent: f64,
    pub state: AutoplayState,
    pub accent: String,
    pub layers: Vec<SlideLayer>,
    pub drift: ImageDrift,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ParallaxOutput {
    pub parallax: ParallaxId,
    #[serde(flatten)]
    pub field: ParallaxField,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Outputs {
    #[serde(default)]
    pub samples: Vec<SampleOutput>,
    #[serde(default)]
    pub carousels: Vec<CarouselOutput>,
    #[serde(default)]
    pub parallax: Vec<ParallaxOutput>,
    #[serde(default)]
    pub events: Vec<CoreEvent>,
}

impl Outputs {
    #[inline]
    pub fn clear(&mut self) {
        self.samples.clear();
        self.carousels.clear();
        self.parallax.clear();
        self.events.clear();
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
            && self.carousels.is_empty()
            && self.parallax.is_empty()
            && self.events.is_empty()
    }

    pub fn sample(&self, id: SamplerId) -> Option<&SampleOutput> {
        self.samples.iter().find(|s| s.sampler == id)
    }

    pub fn carousel(&self, id: CarouselId) -> Option<&CarouselOutput> {
        self.carousels.iter().find(|c| c.carousel == id)
    }

    pub fn parallax(&self, id: ParallaxId) -> Option<&ParallaxOutput> {
        self.parallax.iter().find(|p| p.parallax == id)
    }

    /// Events raised by one engine, oldest first.
    pub fn events_for(&self, engine: EngineId) -> impl Iterator<Item = &Signal> {
        self.events
            .iter()
            .filter(move |e| e.engine == engine)
            .map(|e| &e.signal)
    }
}
