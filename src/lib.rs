//! Nearest-centroid vehicle tracking with line-crossing counting.
//!
//! Detections produced by an upstream model are matched frame over frame to
//! persistent track identities, each track keeps a short time-windowed trail,
//! and crossings of a horizontal counting line are tallied per class and
//! direction. Every camera stream drives its own [`CameraPipeline`]; the
//! [`CameraRegistry`] runs one worker thread per camera.

pub mod config;
pub mod counting;
pub mod error;
pub mod integration;
pub mod tracker;

pub use config::{CountingConfig, PipelineConfig, TrackerConfig, TrailConfig, WorkerConfig};
pub use counting::{CountSnapshot, CountingLine, Direction, LineCounter, SharedCounts, check_crossing};
pub use error::{ConfigError, InvalidDetection, PipelineError, TrackerError, WorkerError};
pub use integration::{
    CameraPipeline, CameraRegistry, DetectionBuilder, DetectionSource, FrameInput, FrameReport,
    ReportSink, TrackerPipeline,
};
pub use tracker::{
    CentroidTracker, ClassVocabulary, Detection, Rect, Track, TrackIdAllocator, TrackState,
};
