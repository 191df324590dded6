//! Per-frame input and output records exchanged with the transport layer.

use std::collections::BTreeMap;

use serde::Serialize;

use crate::counting::{CountSnapshot, CountingLine, Direction};
use crate::tracker::{Detection, Rect, Track};

/// One decoded frame's detections for a camera.
#[derive(Debug, Clone, PartialEq)]
pub struct FrameInput {
    pub camera_id: String,
    pub image_id: String,
    /// Capture timestamp in seconds; drives track ageing and trail times.
    pub created_at: f64,
    pub width: u32,
    pub height: u32,
    pub detections: Vec<Detection>,
    /// Line position chosen by the upstream client, echoed back untouched.
    pub track_line_y: Option<f64>,
}

impl FrameInput {
    pub fn new(
        camera_id: impl Into<String>,
        width: u32,
        height: u32,
        created_at: f64,
        detections: Vec<Detection>,
    ) -> Self {
        Self {
            camera_id: camera_id.into(),
            image_id: String::new(),
            created_at,
            width,
            height,
            detections,
            track_line_y: None,
        }
    }

    pub fn with_image_id(mut self, image_id: impl Into<String>) -> Self {
        self.image_id = image_id.into();
        self
    }

    pub fn with_track_line_y(mut self, track_line_y: f64) -> Self {
        self.track_line_y = Some(track_line_y);
        self
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FrameReport {
    pub camera_id: String,
    pub image_id: String,
    pub created_at: f64,
    pub track_line_y: Option<f64>,
    pub counting_line: Option<CountingLine>,
    pub image_dimensions: ImageDimensions,
    pub detections: Vec<DetectionReport>,
    pub vehicle_count: VehicleCount,
    pub tracks: Vec<TrackReport>,
    pub new_crossings: Vec<CrossingEvent>,
    /// Detector latency in milliseconds, set when the pipeline ran the detector itself.
    pub inference_time: Option<f64>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ImageDimensions {
    pub width: u32,
    pub height: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DetectionReport {
    pub id: u64,
    pub class: String,
    pub confidence: f32,
    pub bbox: NormalizedBox,
}

/// Box coordinates relative to the frame (0..1).
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct NormalizedBox {
    pub x1: f32,
    pub y1: f32,
    pub x2: f32,
    pub y2: f32,
    pub width: f32,
    pub height: f32,
}

impl NormalizedBox {
    pub fn new(bbox: &Rect, frame_width: u32, frame_height: u32) -> Self {
        let [x1, y1, x2, y2] = bbox.normalized(frame_width, frame_height);
        Self {
            x1,
            y1,
            x2,
            y2,
            width: x2 - x1,
            height: y2 - y1,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct VehicleCount {
    #[serde(flatten)]
    pub totals: CountSnapshot,
    /// Objects of each class tracked in this frame.
    pub current: BTreeMap<String, u64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TrackReport {
    pub id: u64,
    pub class: Option<String>,
    pub positions: Vec<PositionReport>,
}

impl TrackReport {
    pub(crate) fn new(track: &Track, class: Option<&str>) -> Self {
        Self {
            id: track.id,
            class: class.map(str::to_owned),
            positions: track
                .trail
                .iter()
                .map(|p| PositionReport {
                    x: p.position.x,
                    y: p.position.y,
                    time: p.time,
                })
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct PositionReport {
    pub x: f32,
    pub y: f32,
    pub time: f64,
}

/// A crossing counted this frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct CrossingEvent {
    #[serde(rename = "id")]
    pub track_id: u64,
    pub direction: Direction,
}
