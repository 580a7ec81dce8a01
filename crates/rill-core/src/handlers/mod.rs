//! Production effect handlers backed by tokio.

mod task;
mod time;

pub use task::TokioSpawner;
pub use time::TokioTimeHandler;
