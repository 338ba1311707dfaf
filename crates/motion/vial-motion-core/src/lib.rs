#![allow(dead_code)]
//! Vial Motion Core (host-agnostic)
//!
//! Scroll-driven motion for the landing page: a scroll progress sampler, an
//! autoplay carousel and a two-layer parallax field, composed side by side on
//! a [`Stage`]. Engines read geometry through [`LayoutProvider`] and talk to
//! the platform through [`Host`]; nothing here touches a DOM.

pub mod carousel;
pub mod config;
pub mod data;
pub mod effects;
pub mod error;
pub mod host;
pub mod ids;
pub mod layout;
pub mod outputs;
pub mod parallax;
pub mod sampler;
pub mod stage;

// Re-exports for consumers (adapters)
pub use carousel::{AutoplayCarousel, AutoplayState, LayerTier, NavCause, SlideLayer};
pub use config::{CarouselCfg, Config, EffectsCfg, HeroCfg, ParallaxCfg, SamplerCfg};
pub use data::{check_unique_ids, parse_slide_deck_json, Slide};
pub use effects::{
    header_shadow, intersection_ratio, HeroTransform, ImageDrift, RevealTracker, VideoCommand,
    VideoGate,
};
pub use error::MotionError;
pub use host::{Attachment, EventKind, Host, HostEvent, Key, LocalHost};
pub use ids::{CarouselId, ElementHandle, EngineId, ParallaxId, SamplerId};
pub use layout::{LayoutProvider, LayoutSnapshot, Rect};
pub use outputs::{
    CarouselOutput, CoreEvent, Outputs, ParallaxOutput, SampleOutput, Signal, SignalQueue,
};
pub use parallax::{ParallaxField, ParallaxFieldComputer, TrackedPair};
pub use sampler::{progress_for, ProgressSample, ScrollProgressSampler};
pub use stage::{MotionEngine, Stage};
