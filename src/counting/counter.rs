use std::collections::{BTreeMap, HashSet};
use std::sync::Arc;

use log::info;
use parking_lot::RwLock;
use serde::Serialize;

use crate::counting::line::Direction;
use crate::tracker::ClassVocabulary;

/// Aggregate counts. Every field only grows for the life of the counter.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CountSnapshot {
    pub total_up: u64,
    pub total_down: u64,
    pub by_type_up: BTreeMap<String, u64>,
    pub by_type_down: BTreeMap<String, u64>,
}

impl CountSnapshot {
    fn for_vocabulary(vocabulary: &ClassVocabulary) -> Self {
        let zeros: BTreeMap<String, u64> = vocabulary.iter().map(|c| (c.to_owned(), 0)).collect();
        Self {
            total_up: 0,
            total_down: 0,
            by_type_up: zeros.clone(),
            by_type_down: zeros,
        }
    }
}

/// Counts each `(track_id, direction)` pair at most once.
///
/// A track may contribute one `Up` and one `Down` over its lifetime.
#[derive(Debug, Clone, Default)]
pub struct LineCounter {
    seen: HashSet<(u64, Direction)>,
    counts: CountSnapshot,
}

impl LineCounter {
    pub fn new(vocabulary: &ClassVocabulary) -> Self {
        Self {
            seen: HashSet::new(),
            counts: CountSnapshot::for_vocabulary(vocabulary),
        }
    }

    /// Returns `true` if this crossing was counted, `false` for a repeat.
    pub fn record_crossing(&mut self, track_id: u64, direction: Direction, class_name: &str) -> bool {
        if !self.seen.insert((track_id, direction)) {
            return false;
        }
        let (by_type, total) = match direction {
            Direction::Up => (&mut self.counts.by_type_up, &mut self.counts.total_up),
            Direction::Down => (&mut self.counts.by_type_down, &mut self.counts.total_down),
        };
        *by_type.entry(class_name.to_owned()).or_default() += 1;
        *total += 1;
        info!(
            "Track {track_id} ({class_name}) crossed {direction:?}. Up: {}, Down: {}",
            self.counts.total_up, self.counts.total_down
        );
        true
    }

    pub fn has_counted(&self, track_id: u64, direction: Direction) -> bool {
        self.seen.contains(&(track_id, direction))
    }

    /// Forget dedup keys of tracks that are no longer live. Ids are never
    /// reused, so this cannot cause a double count.
    pub fn retain_tracks(&mut self, is_live: impl Fn(u64) -> bool) {
        self.seen.retain(|(id, _)| is_live(*id));
    }

    pub fn counts(&self) -> &CountSnapshot {
        &self.counts
    }
}

/// Read handle on a worker's latest counts, for monitoring from other threads.
/// The lock guards the snapshot only, never the tracker.
#[derive(Debug, Clone, Default)]
pub struct SharedCounts(Arc<RwLock<CountSnapshot>>);

impl SharedCounts {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn publish(&self, counts: &CountSnapshot) {
        self.0.write().clone_from(counts);
    }

    pub fn snapshot(&self) -> CountSnapshot {
        self.0.read().clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_start_at_zero_for_every_class() {
        let counter = LineCounter::new(&ClassVocabulary::default());
        let counts = counter.counts();
        assert_eq!(counts.total_up, 0);
        assert_eq!(counts.by_type_down.len(), 5);
        assert_eq!(counts.by_type_up.get("bus"), Some(&0));
    }

    #[test]
    fn test_dedup_per_direction() {
        let mut counter = LineCounter::new(&ClassVocabulary::default());
        assert!(counter.record_crossing(7, Direction::Down, "car"));
        assert!(!counter.record_crossing(7, Direction::Down, "car"));
        assert_eq!(counter.counts().total_down, 1);
        assert_eq!(counter.counts().by_type_down["car"], 1);

        assert!(counter.record_crossing(7, Direction::Up, "car"));
        assert_eq!(counter.counts().total_up, 1);
        assert!(counter.has_counted(7, Direction::Up));
        assert!(!counter.has_counted(8, Direction::Up));
    }

    #[test]
    fn test_retain_tracks() {
        let mut counter = LineCounter::new(&ClassVocabulary::default());
        counter.record_crossing(1, Direction::Down, "car");
        counter.record_crossing(2, Direction::Down, "truck");
        counter.retain_tracks(|id| id == 2);
        assert!(!counter.has_counted(1, Direction::Down));
        assert!(counter.has_counted(2, Direction::Down));
        assert_eq!(counter.counts().total_down, 2);
    }

    #[test]
    fn test_shared_counts() {
        let shared = SharedCounts::new();
        let reader = shared.clone();
        let mut counter = LineCounter::new(&ClassVocabulary::default());
        counter.record_crossing(1, Direction::Up, "bus");
        shared.publish(counter.counts());
        assert_eq!(reader.snapshot().total_up, 1);
        assert_eq!(reader.snapshot().by_type_up["bus"], 1);
    }
}
