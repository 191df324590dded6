mod centroid_tracker;
mod detection;
mod matching;
mod rect;
mod track;
mod track_state;
mod trail;

pub use centroid_tracker::CentroidTracker;
pub use detection::{ClassVocabulary, Detection};
pub use matching::{AssignmentResult, centroid_distance, greedy_assignment};
pub use rect::Rect;
pub use track::{Track, TrackIdAllocator};
pub use track_state::TrackState;
pub use trail::{TrailHistory, TrailPoint};
