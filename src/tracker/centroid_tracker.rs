//! Greedy nearest-centroid tracker.

use log::{debug, warn};
use nalgebra::Point2;

use crate::config::{TrackerConfig, TrailConfig};
use crate::error::TrackerError;
use crate::tracker::detection::{ClassVocabulary, Detection};
use crate::tracker::matching::{self, AssignmentResult};
use crate::tracker::track::{Track, TrackIdAllocator};
use crate::tracker::track_state::TrackState;

/// Per-camera tracker state. Not shared: one stream drives one instance.
#[derive(Debug, Clone)]
pub struct CentroidTracker {
    /// Live tracks in creation order, which is also matching priority.
    tracks: Vec<Track>,
    config: TrackerConfig,
    trail: TrailConfig,
    vocabulary: ClassVocabulary,
    ids: TrackIdAllocator,
}

impl CentroidTracker {
    pub fn new(config: TrackerConfig, trail: TrailConfig) -> Self {
        Self {
            tracks: Vec::new(),
            config,
            trail,
            vocabulary: ClassVocabulary::default(),
            ids: TrackIdAllocator::new(),
        }
    }

    pub fn with_vocabulary(mut self, vocabulary: ClassVocabulary) -> Self {
        self.vocabulary = vocabulary;
        self
    }

    /// Draw ids from a shared allocator instead of a private one.
    pub fn with_id_allocator(mut self, ids: TrackIdAllocator) -> Self {
        self.ids = ids;
        self
    }

    /// Match `detections` against the live tracks and return every reported
    /// (active or persisted) track in creation order.
    ///
    /// A zero-sized frame is rejected before any state is touched. Invalid
    /// detections are skipped individually.
    pub fn update(
        &mut self,
        detections: &[Detection],
        frame_width: u32,
        frame_height: u32,
        now: f64,
    ) -> Result<Vec<Track>, TrackerError> {
        if frame_width == 0 || frame_height == 0 {
            return Err(TrackerError::InvalidFrameSize {
                width: frame_width,
                height: frame_height,
            });
        }

        let detections: Vec<&Detection> = detections
            .iter()
            .enumerate()
            .filter_map(|(idx, det)| match det.validate(&self.vocabulary) {
                Ok(()) => Some(det),
                Err(reason) => {
                    warn!("Skipping detection {idx}: {reason}");
                    None
                }
            })
            .collect();

        self.expire_stale(now);

        let track_centers: Vec<Point2<f32>> = self.tracks.iter().map(|t| t.center).collect();
        let det_centers: Vec<Point2<f32>> = detections.iter().map(|d| d.centroid()).collect();
        let dists = matching::centroid_distance(&track_centers, &det_centers);
        let threshold = frame_width.min(frame_height) as f32 * self.config.match_distance_ratio;

        let AssignmentResult {
            matches,
            unmatched_tracks,
            unmatched_detections,
        } = matching::greedy_assignment(&dists, threshold);

        for (itrack, idet) in matches {
            self.tracks[itrack].apply_match(detections[idet], now);
        }
        for itrack in unmatched_tracks {
            self.tracks[itrack].mark_missed(self.config.persist, now);
        }
        for idet in unmatched_detections {
            let id = self.ids.next_id();
            debug!("New track {id} at {:?}", detections[idet].centroid());
            self.tracks.push(Track::new(id, detections[idet], now));
        }

        for track in self.tracks.iter_mut().filter(|t| t.state.is_reported()) {
            track.record_position(now, &self.trail);
        }

        self.enforce_capacity();

        Ok(self
            .tracks
            .iter()
            .filter(|t| t.state.is_reported())
            .cloned()
            .collect())
    }

    /// Remove tracks past their staleness window.
    fn expire_stale(&mut self, now: f64) {
        let config = &self.config;
        self.tracks.retain_mut(|track| {
            let expired = if config.persist {
                config
                    .persist_timeout_secs
                    .is_some_and(|timeout| now - track.last_matched > timeout)
            } else {
                now - track.last_seen > config.max_age_secs
            };
            if expired {
                track.mark_removed();
                debug!("Track {} expired", track.id);
            }
            !expired
        });
    }

    /// Evict the least recently matched tracks beyond `max_tracks`.
    fn enforce_capacity(&mut self) {
        while self.tracks.len() > self.config.max_tracks {
            let Some(oldest) = self
                .tracks
                .iter()
                .enumerate()
                .min_by(|(_, a), (_, b)| {
                    a.last_matched
                        .total_cmp(&b.last_matched)
                        .then(a.id.cmp(&b.id))
                })
                .map(|(idx, _)| idx)
            else {
                break;
            };
            let mut evicted = self.tracks.remove(oldest);
            evicted.mark_removed();
            debug!("Track {} evicted, table at capacity", evicted.id);
        }
    }

    /// All live tracks, including lost ones, in creation order.
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn get(&self, id: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.id == id)
    }

    pub fn len(&self) -> usize {
        self.tracks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tracks.is_empty()
    }

    pub fn vocabulary(&self) -> &ClassVocabulary {
        &self.vocabulary
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// Count of tracks in the given state.
    pub fn count_in(&self, state: TrackState) -> usize {
        self.tracks.iter().filter(|t| t.state == state).count()
    }
}
