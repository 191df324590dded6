//! Single persistent track.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use nalgebra::Point2;

use crate::config::TrailConfig;
use crate::tracker::detection::Detection;
use crate::tracker::rect::Rect;
use crate::tracker::track_state::TrackState;
use crate::tracker::trail::{TrailHistory, TrailPoint};

/// Source of track ids. Ids start at 1, increase monotonically and are never reused.
///
/// Clones share the same counter, so one allocator handed to several trackers
/// makes ids unique across all of them.
#[derive(Debug, Clone, Default)]
pub struct TrackIdAllocator(Arc<AtomicU64>);

impl TrackIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the next unique track ID.
    pub fn next_id(&self) -> u64 {
        self.0.fetch_add(1, Ordering::SeqCst) + 1
    }

    /// Highest id issued so far, 0 if none.
    pub fn last_issued(&self) -> u64 {
        self.0.load(Ordering::SeqCst)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Track {
    /// Unique track identifier
    pub id: u64,
    pub state: TrackState,
    /// Last known centroid
    pub center: Point2<f32>,
    pub bbox: Rect,
    pub class_id: usize,
    pub confidence: f32,
    /// Time of the last match, or of the last persisted frame in persist mode
    pub last_seen: f64,
    /// Time of the last real detection match
    pub last_matched: f64,
    pub trail: TrailHistory,
    /// Trail position preceding the one appended this frame
    pub previous_position: Option<Point2<f32>>,
}

impl Track {
    pub fn new(id: u64, detection: &Detection, now: f64) -> Self {
        Self {
            id,
            state: TrackState::Active,
            center: detection.centroid(),
            bbox: detection.bbox,
            class_id: detection.class_id,
            confidence: detection.confidence,
            last_seen: now,
            last_matched: now,
            trail: TrailHistory::new(),
            previous_position: None,
        }
    }

    pub fn apply_match(&mut self, detection: &Detection, now: f64) {
        self.state = self.state.on_match();
        self.center = detection.centroid();
        self.bbox = detection.bbox;
        self.class_id = detection.class_id;
        self.confidence = detection.confidence;
        self.last_seen = now;
        self.last_matched = now;
    }

    /// No detection this frame. The center is left where it was.
    pub fn mark_missed(&mut self, persist: bool, now: f64) {
        self.state = self.state.on_miss(persist);
        if persist {
            self.last_seen = now;
        }
    }

    pub fn mark_removed(&mut self) {
        self.state = self.state.on_expire();
    }

    /// Append the current center to the trail, remembering the prior position.
    pub fn record_position(&mut self, now: f64, config: &TrailConfig) {
        self.trail.prune(now, config.duration_secs);
        self.previous_position = self.trail.last().map(|p| p.position);
        self.trail.push(
            TrailPoint {
                position: self.center,
                time: now,
                class_id: self.class_id,
            },
            config,
        );
    }

    /// Vertical movement since the previous trail point, as `(prev_y, curr_y)`.
    pub fn vertical_step(&self) -> Option<(f32, f32)> {
        self.previous_position.map(|prev| (prev.y, self.center.y))
    }
}
