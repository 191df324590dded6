//! Builders for turning raw model output into [`Detection`]s.

use ndarray::ArrayView2;

use crate::tracker::{Detection, Rect};

/// Builder for creating `Detection` objects from various box formats.
#[derive(Debug, Clone, Default)]
pub struct DetectionBuilder {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
    class_id: usize,
    confidence: f32,
    clip: Option<(u32, u32)>,
}

impl DetectionBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set bounding box in TLBR format (x1, y1, x2, y2).
    pub fn tlbr(mut self, x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        self.x1 = x1;
        self.y1 = y1;
        self.x2 = x2;
        self.y2 = y2;
        self
    }

    /// Set bounding box in XYWH format (center_x, center_y, width, height).
    pub fn xywh(mut self, cx: f32, cy: f32, w: f32, h: f32) -> Self {
        self.x1 = cx - w / 2.0;
        self.y1 = cy - h / 2.0;
        self.x2 = cx + w / 2.0;
        self.y2 = cy + h / 2.0;
        self
    }

    /// Scale a box given in 0..1 units up to a `width` x `height` frame.
    pub fn denormalize(mut self, width: u32, height: u32) -> Self {
        let (w, h) = (width as f32, height as f32);
        self.x1 *= w;
        self.x2 *= w;
        self.y1 *= h;
        self.y2 *= h;
        self
    }

    /// Clamp the final box into a `width` x `height` frame.
    pub fn clip_to(mut self, width: u32, height: u32) -> Self {
        self.clip = Some((width, height));
        self
    }

    pub fn class_id(mut self, class_id: usize) -> Self {
        self.class_id = class_id;
        self
    }

    pub fn confidence(mut self, confidence: f32) -> Self {
        self.confidence = confidence;
        self
    }

    /// Build the final `Detection`.
    pub fn build(self) -> Detection {
        let mut bbox = Rect::from_tlbr(self.x1, self.y1, self.x2, self.y2);
        if let Some((w, h)) = self.clip {
            bbox = bbox.clip(w, h);
        }
        Detection::from_rect(bbox, self.class_id, self.confidence)
    }
}

/// Decode raw YOLO rows of `[cx, cy, w, h, objectness, class scores...]`.
///
/// Rows whose objectness or `objectness * best class score` falls below
/// `conf_threshold` are dropped. Boxes whose four coordinates are all `<= 1`
/// are treated as normalised. Every box is clipped to the frame. NMS is left
/// to the caller.
pub fn decode_yolo_rows(
    rows: ArrayView2<'_, f32>,
    frame_width: u32,
    frame_height: u32,
    conf_threshold: f32,
) -> Vec<Detection> {
    let mut detections = Vec::new();
    if rows.ncols() < 6 {
        return detections;
    }

    for row in rows.rows() {
        let objectness = row[4];
        if objectness < conf_threshold {
            continue;
        }
        let Some((class_id, class_score)) = row
            .iter()
            .skip(5)
            .copied()
            .enumerate()
            .max_by(|(_, a), (_, b)| a.total_cmp(b))
        else {
            continue;
        };
        let confidence = class_score * objectness;
        if confidence < conf_threshold {
            continue;
        }

        let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
        let mut builder = DetectionBuilder::new()
            .xywh(cx, cy, w, h)
            .class_id(class_id)
            .confidence(confidence);
        if cx.max(cy).max(w).max(h) <= 1.0 {
            builder = builder.denormalize(frame_width, frame_height);
        }
        detections.push(builder.clip_to(frame_width, frame_height).build());
    }
    detections
}
