//! Error types shared by the tracker, the counting pipeline and configuration loading.

use thiserror::Error;

/// Why a single detection was rejected at the input boundary.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidDetection {
    #[error("bounding box has non-finite coordinates")]
    NonFinite,
    #[error("bounding box is empty or inverted ({width}x{height})")]
    Degenerate { width: f32, height: f32 },
    #[error("confidence {0} is outside [0, 1]")]
    Confidence(f32),
    #[error("class id {class_id} is outside the vocabulary of {len} classes")]
    UnknownClass { class_id: usize, len: usize },
}

/// Per-frame failures. None of them are fatal; the frame contributes nothing.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrackerError {
    #[error("frame has zero-sized dimensions {width}x{height}")]
    InvalidFrameSize { width: u32, height: u32 },
}

/// Failure of a detector-fed pipeline, keeping the detector's own error.
#[derive(Debug, Error)]
pub enum PipelineError<E> {
    #[error("detection source failed: {0}")]
    Detection(#[source] E),
    #[error(transparent)]
    Tracker(#[from] TrackerError),
}

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to parse configuration: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Error)]
pub enum WorkerError {
    #[error("registry is shut down")]
    Stopped,
    #[error("worker for camera {camera_id} has exited")]
    Exited { camera_id: String },
    #[error("failed to spawn worker for camera {camera_id}: {source}")]
    Spawn {
        camera_id: String,
        #[source]
        source: std::io::Error,
    },
}
