//! Errors raised at the configuration / registration boundary.
//!
//! The engines themselves never fail; see the module docs of each engine for
//! how missing geometry and out-of-range input degrade.

use thiserror::Error;

use crate::ids::EngineId;

#[derive(Debug, Error, Clone, PartialEq)]
#[non_exhaustive]
pub enum MotionError {
    #[error("scroll thresholds must satisfy end > start (start={start}, end={end})")]
    InvalidThresholds { start: f64, end: f64 },

    #[error("unknown engine {0}")]
    UnknownEngine(EngineId),

    #[error("slide deck parse error: {0}")]
    SlideDeck(String),

    #[error("duplicate slide id '{0}'")]
    DuplicateSlide(String),

    #[error("config error: {0}")]
    Config(String),
}
