//! Per-camera tracking and counting, with an optional detector in front.

use std::collections::BTreeMap;
use std::time::Instant;

use log::{debug, info};

use crate::config::PipelineConfig;
use crate::counting::{CountSnapshot, CountingLine, LineCounter};
use crate::error::{PipelineError, TrackerError};
use crate::integration::DetectionSource;
use crate::integration::report::{
    CrossingEvent, DetectionReport, FrameInput, FrameReport, ImageDimensions, NormalizedBox,
    TrackReport, VehicleCount,
};
use crate::tracker::{CentroidTracker, Detection, TrackIdAllocator};

/// Tracker, counter and counting line for a single camera stream.
///
/// Frames must be fed in arrival order from one thread.
#[derive(Debug, Clone)]
pub struct CameraPipeline {
    camera_id: String,
    config: PipelineConfig,
    tracker: CentroidTracker,
    counter: LineCounter,
    line: Option<CountingLine>,
}

impl CameraPipeline {
    pub fn new(camera_id: impl Into<String>, config: PipelineConfig) -> Self {
        let tracker = CentroidTracker::new(config.tracker.clone(), config.trail.clone())
            .with_vocabulary(config.classes.clone());
        let counter = LineCounter::new(&config.classes);
        Self {
            camera_id: camera_id.into(),
            config,
            tracker,
            counter,
            line: None,
        }
    }

    pub fn with_id_allocator(mut self, ids: TrackIdAllocator) -> Self {
        self.tracker = self.tracker.with_id_allocator(ids);
        self
    }

    /// Track one frame, count crossings and build the outgoing report.
    ///
    /// On error the tracker and counters are left exactly as they were.
    pub fn process(&mut self, frame: &FrameInput) -> Result<FrameReport, TrackerError> {
        if self.config.counting.enabled && self.line.is_none() {
            self.line = CountingLine::for_frame(
                frame.width,
                frame.height,
                self.config.counting.position_ratio,
            );
            if let Some(line) = &self.line {
                info!("[Camera {}] Counting line initialized at y={}", self.camera_id, line.y);
            }
        }

        let vocabulary = &self.config.classes;
        let threshold = self.config.confidence_threshold.0;
        let candidates: Vec<Detection> = frame
            .detections
            .iter()
            .filter(|d| d.confidence >= threshold && d.class_id < vocabulary.len())
            .cloned()
            .collect();

        let tracks = self
            .tracker
            .update(&candidates, frame.width, frame.height, frame.created_at)?;

        let mut detections = Vec::with_capacity(tracks.len());
        let mut new_crossings = Vec::new();
        let mut current: BTreeMap<String, u64> = vocabulary.iter().map(|c| (c.to_owned(), 0)).collect();

        for track in &tracks {
            let Some(class) = vocabulary.name(track.class_id) else {
                continue;
            };
            *current.entry(class.to_owned()).or_default() += 1;

            if let (Some(line), Some((prev_y, curr_y))) = (&self.line, track.vertical_step()) {
                if let Some(direction) = line.check(prev_y, curr_y) {
                    if self.counter.record_crossing(track.id, direction, class) {
                        new_crossings.push(CrossingEvent {
                            track_id: track.id,
                            direction,
                        });
                    }
                }
            }

            detections.push(DetectionReport {
                id: track.id,
                class: class.to_owned(),
                confidence: track.confidence,
                bbox: NormalizedBox::new(&track.bbox, frame.width, frame.height),
            });
        }

        let tracker = &self.tracker;
        self.counter.retain_tracks(|id| tracker.get(id).is_some());

        let track_reports = self
            .tracker
            .tracks()
            .iter()
            .filter(|t| !t.trail.is_empty())
            .map(|t| TrackReport::new(t, vocabulary.name(t.class_id)))
            .collect();

        debug!(
            "[Camera {}] Frame {}: {} tracked, {} new crossings",
            self.camera_id,
            frame.image_id,
            detections.len(),
            new_crossings.len()
        );

        Ok(FrameReport {
            camera_id: frame.camera_id.clone(),
            image_id: frame.image_id.clone(),
            created_at: frame.created_at,
            track_line_y: frame.track_line_y,
            counting_line: self.line,
            image_dimensions: ImageDimensions {
                width: frame.width,
                height: frame.height,
            },
            detections,
            vehicle_count: VehicleCount {
                totals: self.counter.counts().clone(),
                current,
            },
            tracks: track_reports,
            new_crossings,
            inference_time: None,
        })
    }

    pub fn camera_id(&self) -> &str {
        &self.camera_id
    }

    pub fn counts(&self) -> &CountSnapshot {
        self.counter.counts()
    }

    pub fn counting_line(&self) -> Option<&CountingLine> {
        self.line.as_ref()
    }

    pub fn tracker(&self) -> &CentroidTracker {
        &self.tracker
    }
}

/// A camera pipeline fed by a detection model.
pub struct TrackerPipeline<D: DetectionSource> {
    detector: D,
    pipeline: CameraPipeline,
}

impl<D: DetectionSource> TrackerPipeline<D> {
    pub fn new(detector: D, pipeline: CameraPipeline) -> Self {
        Self { detector, pipeline }
    }

    /// Run detection on the raw image, then track and count the result.
    ///
    /// The report carries the detector's wall-clock latency in milliseconds.
    pub fn process_frame(
        &mut self,
        input: &[u8],
        width: u32,
        height: u32,
        image_id: &str,
        created_at: f64,
    ) -> Result<FrameReport, PipelineError<D::Error>> {
        let start = Instant::now();
        let detections = self
            .detector
            .detect(input, width, height)
            .map_err(PipelineError::Detection)?;
        let inference_time = start.elapsed().as_secs_f64() * 1000.0;

        let frame = FrameInput::new(self.pipeline.camera_id(), width, height, created_at, detections)
            .with_image_id(image_id);
        let mut report = self.pipeline.process(&frame)?;
        report.inference_time = Some(inference_time);
        Ok(report)
    }

    pub fn detector(&self) -> &D {
        &self.detector
    }

    pub fn detector_mut(&mut self) -> &mut D {
        &mut self.detector
    }

    pub fn pipeline(&self) -> &CameraPipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::counting::Direction;

    struct MockDetector {
        detections: Vec<Detection>,
    }

    impl DetectionSource for MockDetector {
        type Error = std::convert::Infallible;

        fn detect(
            &mut self,
            _input: &[u8],
            _width: u32,
            _height: u32,
        ) -> Result<Vec<Detection>, Self::Error> {
            Ok(self.detections.clone())
        }
    }

    #[derive(Debug, thiserror::Error)]
    #[error("model not loaded")]
    struct ModelNotLoaded;

    struct FailingDetector;

    impl DetectionSource for FailingDetector {
        type Error = ModelNotLoaded;

        fn detect(&mut self, _: &[u8], _: u32, _: u32) -> Result<Vec<Detection>, Self::Error> {
            Err(ModelNotLoaded)
        }
    }

    fn vehicle(cx: f32, cy: f32, class_id: usize) -> Detection {
        Detection::new(cx - 20.0, cy - 15.0, cx + 20.0, cy + 15.0, class_id, 0.9)
    }

    fn frame(time: f64, detections: Vec<Detection>) -> FrameInput {
        FrameInput::new("cam-1", 640, 480, time, detections)
    }

    #[test]
    fn test_tracker_pipeline() {
        let detector = MockDetector {
            detections: vec![vehicle(100.0, 100.0, 0)],
        };
        let mut pipeline =
            TrackerPipeline::new(detector, CameraPipeline::new("cam-1", PipelineConfig::default()));
        let report = pipeline.process_frame(&[], 640, 480, "img-1", 0.0).unwrap();

        assert_eq!(report.camera_id, "cam-1");
        assert_eq!(report.image_id, "img-1");
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].id, 1);
        assert_eq!(report.detections[0].class, "car");
        assert!(report.inference_time.is_some_and(|ms| ms >= 0.0));

        let json = serde_json::to_value(&report).unwrap();
        assert!(json["inference_time"].is_number());
    }

    #[test]
    fn test_detector_error_is_reported() {
        let mut pipeline = TrackerPipeline::new(
            FailingDetector,
            CameraPipeline::new("cam-1", PipelineConfig::default()),
        );
        let err = pipeline.process_frame(&[], 640, 480, "img-1", 0.0).unwrap_err();
        assert!(matches!(err, PipelineError::Detection(ModelNotLoaded)));
        assert_eq!(err.to_string(), "detection source failed: model not loaded");
        assert!(std::error::Error::source(&err).is_some());
    }

    #[test]
    fn test_tracker_error_passes_through_detector_pipeline() {
        let detector = MockDetector {
            detections: vec![vehicle(10.0, 10.0, 0)],
        };
        let mut pipeline =
            TrackerPipeline::new(detector, CameraPipeline::new("cam-1", PipelineConfig::default()));
        let err = pipeline.process_frame(&[], 0, 480, "img-1", 0.0).unwrap_err();
        assert!(matches!(
            err,
            PipelineError::Tracker(TrackerError::InvalidFrameSize { width: 0, height: 480 })
        ));
    }

    #[test]
    fn test_low_confidence_and_unknown_classes_are_filtered() {
        let mut pipeline = CameraPipeline::new("cam-1", PipelineConfig::default());
        let mut weak = vehicle(100.0, 100.0, 0);
        weak.confidence = 0.4;
        let report = pipeline
            .process(&frame(0.0, vec![weak, vehicle(300.0, 300.0, 9)]))
            .unwrap();
        assert!(report.detections.is_empty());
        assert!(pipeline.tracker().is_empty());
    }

    #[test]
    fn test_counting_line_waits_for_valid_dimensions() {
        let mut pipeline = CameraPipeline::new("cam-1", PipelineConfig::default());
        let bad = FrameInput::new("cam-1", 0, 0, 0.0, vec![vehicle(10.0, 10.0, 0)]);
        assert!(pipeline.process(&bad).is_err());
        assert!(pipeline.counting_line().is_none());

        pipeline.process(&frame(0.1, vec![])).unwrap();
        assert_eq!(pipeline.counting_line().map(|l| l.y), Some(240.0));

        // Fixed once computed.
        let bigger = FrameInput::new("cam-1", 1280, 720, 0.2, vec![]);
        pipeline.process(&bigger).unwrap();
        assert_eq!(pipeline.counting_line().map(|l| l.y), Some(240.0));
    }

    #[test]
    fn test_crossing_is_reported_and_counted() {
        let mut pipeline = CameraPipeline::new("cam-1", PipelineConfig::default());
        pipeline.process(&frame(0.0, vec![vehicle(320.0, 220.0, 1)])).unwrap();
        let report = pipeline.process(&frame(0.1, vec![vehicle(320.0, 250.0, 1)])).unwrap();

        assert_eq!(
            report.new_crossings,
            vec![CrossingEvent {
                track_id: 1,
                direction: Direction::Down
            }]
        );
        assert_eq!(report.vehicle_count.totals.total_down, 1);
        assert_eq!(report.vehicle_count.totals.by_type_down["truck"], 1);
        assert_eq!(report.vehicle_count.current["truck"], 1);
        assert_eq!(report.tracks.len(), 1);
        assert_eq!(report.tracks[0].positions.len(), 2);
    }

    #[test]
    fn test_counting_disabled() {
        let mut config = PipelineConfig::default();
        config.counting.enabled = false;
        let mut pipeline = CameraPipeline::new("cam-1", config);
        pipeline.process(&frame(0.0, vec![vehicle(320.0, 220.0, 0)])).unwrap();
        let report = pipeline.process(&frame(0.1, vec![vehicle(320.0, 250.0, 0)])).unwrap();
        assert!(report.counting_line.is_none());
        assert!(report.new_crossings.is_empty());
        assert_eq!(pipeline.counts().total_down, 0);
    }

    #[test]
    fn test_report_json_shape() {
        let mut pipeline = CameraPipeline::new("cam-1", PipelineConfig::default());
        let input = frame(0.0, vec![vehicle(320.0, 240.0, 2)])
            .with_image_id("img-7")
            .with_track_line_y(0.5);
        let report = pipeline.process(&input).unwrap();
        let json = serde_json::to_value(&report).unwrap();

        assert_eq!(json["camera_id"], "cam-1");
        assert_eq!(json["image_id"], "img-7");
        assert_eq!(json["track_line_y"], 0.5);
        assert_eq!(json["image_dimensions"]["width"], 640);
        assert_eq!(json["detections"][0]["class"], "bus");
        assert_eq!(json["vehicle_count"]["total_up"], 0);
        assert_eq!(json["vehicle_count"]["by_type_down"]["bus"], 0);
        assert_eq!(json["vehicle_count"]["current"]["bus"], 1);
        assert_eq!(json["tracks"][0]["positions"][0]["y"], 240.0);
        assert_eq!(json["counting_line"]["y"], 240.0);
        assert!(json["new_crossings"].as_array().unwrap().is_empty());
        assert!(json["inference_time"].is_null());
    }
}
