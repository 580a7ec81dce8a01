//! The context sequences are subscribed against.

use std::fmt;
use std::sync::Arc;

use crate::config::EngineConfig;
use crate::effects::{TaskSpawner, TimeEffects};
use crate::handlers::{TokioSpawner, TokioTimeHandler};
use crate::sequence::{Sequence, Subscription};

/// Clock, worker pool and configuration shared by every subscription.
///
/// Cloning is cheap; all parts are reference counted. Subscribing a
/// [`Sequence`] against an engine builds a fresh operator pipeline whose
/// timers and worker tasks go through the engine's effects.
#[derive(Clone)]
pub struct SequenceEngine {
    clock: Arc<dyn TimeEffects>,
    spawner: Arc<dyn TaskSpawner>,
    config: Arc<EngineConfig>,
}

impl SequenceEngine {
    /// Create an engine from explicit effects.
    pub fn new(
        clock: Arc<dyn TimeEffects>,
        spawner: Arc<dyn TaskSpawner>,
        config: EngineConfig,
    ) -> Self {
        Self {
            clock,
            spawner,
            config: Arc::new(config),
        }
    }

    /// Engine on the tokio clock and the caller's tokio runtime.
    pub fn tokio(config: EngineConfig) -> Self {
        Self::new(
            Arc::new(TokioTimeHandler::new()),
            Arc::new(TokioSpawner::new()),
            config,
        )
    }

    /// Start building an engine; unset parts fall back to the tokio handlers.
    pub fn builder() -> EngineBuilder {
        EngineBuilder::default()
    }

    /// The injected clock.
    pub fn clock(&self) -> &Arc<dyn TimeEffects> {
        &self.clock
    }

    /// The injected worker pool.
    pub fn spawner(&self) -> &Arc<dyn TaskSpawner> {
        &self.spawner
    }

    /// Engine configuration.
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Subscribe `sequence`, materialising its pipeline.
    pub fn subscribe<T: Send + 'static>(&self, sequence: &Sequence<T>) -> Subscription<T> {
        sequence.subscribe(self)
    }
}

impl Default for SequenceEngine {
    fn default() -> Self {
        Self::tokio(EngineConfig::default())
    }
}

impl fmt::Debug for SequenceEngine {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SequenceEngine")
            .field("now", &self.clock.now())
            .field("config", &self.config)
            .finish_non_exhaustive()
    }
}

/// Builder for [`SequenceEngine`].
#[derive(Default)]
pub struct EngineBuilder {
    clock: Option<Arc<dyn TimeEffects>>,
    spawner: Option<Arc<dyn TaskSpawner>>,
    config: EngineConfig,
}

impl EngineBuilder {
    /// Use `clock` for all timers.
    pub fn clock(mut self, clock: impl TimeEffects + 'static) -> Self {
        self.clock = Some(Arc::new(clock));
        self
    }

    /// Use `spawner` for all worker dispatch.
    pub fn spawner(mut self, spawner: impl TaskSpawner + 'static) -> Self {
        self.spawner = Some(Arc::new(spawner));
        self
    }

    /// Replace the configuration.
    pub fn config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    /// Finish the engine.
    pub fn build(self) -> SequenceEngine {
        SequenceEngine::new(
            self.clock
                .unwrap_or_else(|| Arc::new(TokioTimeHandler::new())),
            self.spawner.unwrap_or_else(|| Arc::new(TokioSpawner::new())),
            self.config,
        )
    }
}
