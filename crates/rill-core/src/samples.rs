//! Sample payloads shared by the `rill` scenarios and the test suites.

use crate::point::Point;

/// The fruit basket used by the buffering scenarios.
pub const FRUITS: [&str; 5] = ["apple", "orange", "banana", "kiwi", "strawberry"];

/// Coordinates used by the asynchronous mapping scenarios.
pub const POINT_TEXTS: [&str; 4] = ["1 1", "2 2", "3 3", "4 4"];

/// The points [`POINT_TEXTS`] parse into, in the same order.
pub fn expected_points() -> Vec<Point> {
    (1..=4).map(|n| Point::new(n, n)).collect()
}
