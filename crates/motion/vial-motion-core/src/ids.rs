//! Identifiers for engines and host elements.

use serde::{Deserialize, Serialize};

/// Opaque handle for a host element (a DOM node, a widget, ...).
/// The host decides what the number means; the core only passes it back
/// to the [`LayoutProvider`](crate::layout::LayoutProvider).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ElementHandle(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct SamplerId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct CarouselId(pub u32);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
pub struct ParallaxId(pub u32);

/// Any engine registered on a stage.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "id", rename_all = "snake_case")]
pub enum EngineId {
    Sampler(SamplerId),
    Carousel(CarouselId),
    Parallax(ParallaxId),
}

impl std::fmt::Display for EngineId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineId::Sampler(id) => write!(f, "sampler:{}", id.0),
            EngineId::Carousel(id) => write!(f, "carousel:{}", id.0),
            EngineId::Parallax(id) => write!(f, "parallax:{}", id.0),
        }
    }
}

/// Monotonic allocator for engine ids. Each kind has its own dense counter.
#[derive(Default, Debug)]
pub struct IdAllocator {
    next_sampler: u32,
    next_carousel: u32,
    next_parallax: u32,
}

impl IdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn alloc_sampler(&mut self) -> SamplerId {
        let id = SamplerId(self.next_sampler);
        self.next_sampler = self.next_sampler.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_carousel(&mut self) -> CarouselId {
        let id = CarouselId(self.next_carousel);
        self.next_carousel = self.next_carousel.wrapping_add(1);
        id
    }

    #[inline]
    pub fn alloc_parallax(&mut self) -> ParallaxId {
        let id = ParallaxId(self.next_parallax);
        self.next_parallax = self.next_parallax.wrapping_add(1);
        id
    }
}
