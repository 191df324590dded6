//! Counting-line geometry and per-direction crossing tallies.

mod counter;
mod line;

pub use counter::{CountSnapshot, LineCounter, SharedCounts};
pub use line::{CountingLine, Direction, check_crossing};
