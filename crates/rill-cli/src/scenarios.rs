//! The operator scenarios the binary can replay.
//!
//! Every scenario builds a pipeline, subscribes it against the engine and
//! prints each signal it observes.

use anyhow::Result;
use clap::ValueEnum;
use rill_core::prelude::*;
use rill_core::samples::{FRUITS, POINT_TEXTS};
use std::fmt::Debug;
use std::time::Duration;

use crate::config::CliConfig;

/// Named operator exercise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Scenario {
    /// Fixed list of fruits
    Just,
    /// Integers 1 through 5
    Range,
    /// Five ticks of a periodic timer
    Interval,
    /// Two delayed sequences interleaved by arrival
    Merge,
    /// Numbers paired with their names
    Zip,
    /// Race between a delayed and an immediate sequence
    First,
    /// Skip the first three values
    Skip,
    /// Take the first three values
    Take,
    /// Keep single-word names
    Filter,
    /// Drop repeated animals
    Distinct,
    /// Parse points on worker tasks
    FlatMap,
    /// Batch fruits in threes
    Buffer,
    /// Batch fruits, then uppercase each batch on a worker
    BufferAsync,
    /// Every scenario above, in order
    All,
}

impl Scenario {
    const EVERY: [Scenario; 13] = [
        Scenario::Just,
        Scenario::Range,
        Scenario::Interval,
        Scenario::Merge,
        Scenario::Zip,
        Scenario::First,
        Scenario::Skip,
        Scenario::Take,
        Scenario::Filter,
        Scenario::Distinct,
        Scenario::FlatMap,
        Scenario::Buffer,
        Scenario::BufferAsync,
    ];

    /// Command-line spelling, as derived by clap.
    fn name(self) -> String {
        self.to_possible_value()
            .map(|value| value.get_name().to_string())
            .unwrap_or_default()
    }

    fn expand(self) -> Vec<Scenario> {
        match self {
            Scenario::All => Scenario::EVERY.to_vec(),
            single => vec![single],
        }
    }
}

/// Run `scenario` to completion, printing its signals.
pub async fn run(scenario: Scenario, engine: &SequenceEngine, config: &CliConfig) -> Result<()> {
    for each in scenario.expand() {
        run_one(each, engine, config).await?;
    }
    Ok(())
}

async fn run_one(scenario: Scenario, engine: &SequenceEngine, config: &CliConfig) -> Result<()> {
    let label = scenario.name();
    let name = label.as_str();
    tracing::info!(scenario = name, "running");
    match scenario {
        Scenario::Just => report(name, just(), engine, config).await,
        Scenario::Range => report(name, Sequence::range(1, 5)?, engine, config).await,
        Scenario::Interval => {
            let ticks = Sequence::interval(config.interval_period())?.take(5);
            report(name, ticks, engine, config).await
        }
        Scenario::Merge => report(name, merge(), engine, config).await,
        Scenario::Zip => report(name, zip(), engine, config).await,
        Scenario::First => report(name, first(), engine, config).await,
        Scenario::Skip => {
            let skipped = Sequence::from_values(["1", "2", "3", "4", "5"]).skip(3);
            report(name, skipped, engine, config).await
        }
        Scenario::Take => {
            let taken = Sequence::from_values(["1", "2", "3", "4", "5"]).take(3);
            report(name, taken, engine, config).await
        }
        Scenario::Filter => {
            let names = Sequence::from_values(["Alpha", "Bravo", "Charlie Brown", "Delta"])
                .filter(|entry| !entry.contains(' '));
            report(name, names, engine, config).await
        }
        Scenario::Distinct => {
            let animals =
                Sequence::from_values(["dog", "cat", "bird", "dog", "bird", "anteater"]).distinct();
            report(name, animals, engine, config).await
        }
        Scenario::FlatMap => report(name, flat_map(), engine, config).await,
        Scenario::Buffer => report(name, Sequence::from_values(FRUITS).buffer(3)?, engine, config).await,
        Scenario::BufferAsync => report(name, buffer_async()?, engine, config).await,
        // Expanded by `run`.
        Scenario::All => Ok(()),
    }
}

/// Subscribe and print every signal; an error signal fails the scenario.
async fn report<T>(
    name: &str,
    sequence: Sequence<T>,
    engine: &SequenceEngine,
    config: &CliConfig,
) -> Result<()>
where
    T: Debug + Send + 'static,
{
    let sequence = if config.log_signals {
        sequence.log(name)
    } else {
        sequence
    };

    let mut subscription = sequence.subscribe(engine);
    while let Some(signal) = subscription.next_signal().await {
        match signal {
            Signal::Next(value) => tracing::info!(scenario = name, "next: {value:?}"),
            Signal::Complete => tracing::info!(scenario = name, "complete"),
            Signal::Error(err) => {
                tracing::error!(scenario = name, error = %err, "failed");
                return Err(err.into());
            }
        }
    }
    Ok(())
}

fn just() -> Sequence<&'static str> {
    Sequence::from_values(["Apple", "Orange", "Grape", "Banana", "Strawberry"])
}

fn merge() -> Sequence<&'static str> {
    let numbers = Sequence::from_values(["1", "2", "3"]).delay_elements(Duration::from_millis(500));
    let words = Sequence::from_values(["one", "two", "three"])
        .delay_subscription(Duration::from_millis(250))
        .delay_elements(Duration::from_millis(500));
    numbers.merge_with(words)
}

fn zip() -> Sequence<(&'static str, &'static str)> {
    Sequence::from_values(["1", "2", "3"]).zip(Sequence::from_values(["one", "two", "three"]))
}

fn first() -> Sequence<&'static str> {
    let slow = Sequence::from_values(["a", "b", "c"]).delay_subscription(Duration::from_millis(100));
    let fast = Sequence::from_values(["1", "2", "3"]);
    Sequence::first_with_signal([slow, fast])
}

fn flat_map() -> Sequence<Point> {
    Sequence::from_values(POINT_TEXTS).flat_map_async(|text| text.parse::<Point>())
}

fn buffer_async() -> rill_core::Result<Sequence<String>> {
    Ok(Sequence::from_values(FRUITS).buffer(3)?.flat_map(|batch| {
        Sequence::from_iterable(batch)
            .map(str::to_uppercase)
            .subscribe_on()
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    async fn values<T: Send + 'static>(sequence: Sequence<T>) -> Vec<T> {
        sequence
            .subscribe(&SequenceEngine::default())
            .collect_values()
            .await
            .unwrap()
    }

    #[tokio::test(start_paused = true)]
    async fn test_merge_scenario_order() {
        assert_eq!(
            values(merge()).await,
            ["1", "one", "2", "two", "3", "three"]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_first_scenario_takes_fast_side() {
        assert_eq!(values(first()).await, ["1", "2", "3"]);
    }

    #[tokio::test]
    async fn test_buffer_async_scenario_uppercases_everything() {
        let emitted: HashSet<String> = values(buffer_async().unwrap()).await.into_iter().collect();
        assert_eq!(emitted.len(), FRUITS.len());
        assert!(emitted.contains("STRAWBERRY"));
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_scenario_runs() {
        let config = CliConfig {
            interval_period_ms: 10,
            log_signals: true,
            ..CliConfig::default()
        };
        run(Scenario::All, &SequenceEngine::default(), &config)
            .await
            .unwrap();
    }

    #[test]
    fn test_names_follow_command_line_spelling() {
        assert_eq!(Scenario::FlatMap.name(), "flat-map");
        assert_eq!(Scenario::BufferAsync.name(), "buffer-async");
        assert_eq!(Scenario::All.name(), "all");
    }
}
