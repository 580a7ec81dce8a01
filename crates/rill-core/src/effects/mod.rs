//! Effect traits the engine is parameterised over.
//!
//! Sequences never sleep or spawn directly. Timing operators ask the
//! injected [`TimeEffects`] for deadlines and asynchronous operators hand
//! work to the injected [`TaskSpawner`], which lets tests swap the wall
//! clock for a virtual one.

pub mod task;
pub mod time;

pub use task::{TaskGuard, TaskSpawner};
pub use time::{TimeEffects, TimeError};
