//! # Rill Core
//!
//! Lazily produced, asynchronously delivered sequences of values and the
//! operators that compose them.
//!
//! A [`Sequence`] describes how to produce values; nothing happens until it
//! is subscribed against a [`SequenceEngine`], which supplies the clock,
//! the worker pool and the configuration. The resulting [`Subscription`]
//! yields [`Signal`]s: any number of values followed by exactly one
//! completion or error.
//!
//! ```no_run
//! use rill_core::prelude::*;
//!
//! # async fn demo() -> rill_core::Result<()> {
//! let engine = SequenceEngine::default();
//! let evens = Sequence::range(1, 10)?.filter(|n| n % 2 == 0).take(3);
//! assert_eq!(evens.subscribe(&engine).collect_values().await?, [2, 4, 6]);
//! # Ok(())
//! # }
//! ```
//!
//! Timers go through [`TimeEffects`] and worker dispatch through
//! [`TaskSpawner`], so tests can substitute a manually advanced clock.
//!
//! [`TimeEffects`]: effects::TimeEffects
//! [`TaskSpawner`]: effects::TaskSpawner

pub mod config;
pub mod effects;
pub mod engine;
pub mod errors;
pub mod handlers;
pub mod logging;
pub mod point;
pub mod samples;
pub mod sequence;

pub use config::EngineConfig;
pub use engine::{EngineBuilder, SequenceEngine};
pub use errors::{Result, SequenceError};
pub use point::Point;
pub use sequence::{Sequence, Signal, SignalStream, Subscription};

/// Everything needed to build and consume sequences.
pub mod prelude {
    pub use crate::config::EngineConfig;
    pub use crate::effects::{TaskGuard, TaskSpawner, TimeEffects, TimeError};
    pub use crate::engine::{EngineBuilder, SequenceEngine};
    pub use crate::errors::{Result, SequenceError};
    pub use crate::point::Point;
    pub use crate::sequence::{Sequence, Signal, Subscription};
}
