//! Integration layer: frames in, structured reports out.
//!
//! [`CameraPipeline`] runs tracking and counting for one camera,
//! [`TrackerPipeline`] puts a [`DetectionSource`] in front of it, and
//! [`CameraRegistry`] drives one pipeline per camera on its own worker thread.

mod builder;
mod detector;
mod pipeline;
mod report;
mod worker;

pub use builder::{DetectionBuilder, decode_yolo_rows};
pub use detector::DetectionSource;
pub use pipeline::{CameraPipeline, TrackerPipeline};
pub use report::{
    CrossingEvent, DetectionReport, FrameInput, FrameReport, ImageDimensions, NormalizedBox,
    PositionReport, TrackReport, VehicleCount,
};
pub use worker::{CameraRegistry, ReportSink, Submission};
