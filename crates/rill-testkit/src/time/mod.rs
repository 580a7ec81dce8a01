//! Deterministic clocks.

mod virtual_clock;

pub use virtual_clock::VirtualClock;
