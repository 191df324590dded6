use nalgebra::Point2;

/// Axis-aligned bounding box in pixel coordinates.
///
/// Stored as top-left corner plus extent; detections arrive in TLBR
/// (x1, y1, x2, y2) and are converted with [`Rect::from_tlbr`].
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    /// Top-left x coordinate
    pub x: f32,
    /// Top-left y coordinate
    pub y: f32,
    /// Width of the bounding box
    pub width: f32,
    /// Height of the bounding box
    pub height: f32,
}

impl Rect {
    /// Create a new Rect from top-left coordinates and dimensions (TLWH format).
    #[inline]
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Create a Rect from TLBR format (top-left x, top-left y, bottom-right x, bottom-right y).
    #[inline]
    pub fn from_tlbr(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self {
            x: x1,
            y: y1,
            width: x2 - x1,
            height: y2 - y1,
        }
    }

    /// Convert to TLBR format: (x1, y1, x2, y2).
    #[inline]
    pub fn to_tlbr(&self) -> [f32; 4] {
        [self.x, self.y, self.x + self.width, self.y + self.height]
    }

    /// Centroid of the box, the point the tracker follows.
    #[inline]
    pub fn center(&self) -> Point2<f32> {
        Point2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    #[inline]
    pub fn area(&self) -> f32 {
        self.width * self.height
    }

    /// True when every coordinate is finite and the box has a positive extent.
    pub fn is_valid(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Clamp the box into a `frame_width` x `frame_height` image, keeping at
    /// least one pixel of extent on each axis.
    pub fn clip(&self, frame_width: u32, frame_height: u32) -> Rect {
        let (w, h) = (frame_width as f32, frame_height as f32);
        let [x1, y1, x2, y2] = self.to_tlbr();
        let x1 = x1.min(w - 1.0).max(0.0);
        let y1 = y1.min(h - 1.0).max(0.0);
        let x2 = x2.min(w).max(x1 + 1.0);
        let y2 = y2.min(h).max(y1 + 1.0);
        Rect::from_tlbr(x1, y1, x2, y2)
    }

    /// TLBR coordinates scaled into 0..1 relative to the frame.
    pub fn normalized(&self, frame_width: u32, frame_height: u32) -> [f32; 4] {
        let (w, h) = (frame_width as f32, frame_height as f32);
        let [x1, y1, x2, y2] = self.to_tlbr();
        [x1 / w, y1 / h, x2 / w, y2 / h]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_tlbr() {
        let rect = Rect::from_tlbr(10.0, 20.0, 40.0, 60.0);
        assert_eq!(rect, Rect::new(10.0, 20.0, 30.0, 40.0));
        assert_eq!(rect.to_tlbr(), [10.0, 20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_center_and_area() {
        let rect = Rect::new(10.0, 20.0, 30.0, 40.0);
        assert_eq!(rect.center(), Point2::new(25.0, 40.0));
        assert_eq!(rect.area(), 1200.0);
    }

    #[test]
    fn test_is_valid() {
        assert!(Rect::from_tlbr(0.0, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::from_tlbr(5.0, 0.0, 5.0, 1.0).is_valid());
        assert!(!Rect::from_tlbr(5.0, 5.0, 1.0, 1.0).is_valid());
        assert!(!Rect::from_tlbr(f32::NAN, 0.0, 1.0, 1.0).is_valid());
        assert!(!Rect::from_tlbr(0.0, 0.0, f32::INFINITY, 1.0).is_valid());
    }

    #[test]
    fn test_clip() {
        let rect = Rect::from_tlbr(-20.0, -5.0, 700.0, 500.0).clip(640, 480);
        assert_eq!(rect.to_tlbr(), [0.0, 0.0, 640.0, 480.0]);

        // Entirely outside on the right still keeps one pixel inside the frame.
        let rect = Rect::from_tlbr(900.0, 10.0, 950.0, 20.0).clip(640, 480);
        assert_eq!(rect.to_tlbr(), [639.0, 10.0, 640.0, 20.0]);
    }

    #[test]
    fn test_normalized() {
        let rect = Rect::from_tlbr(64.0, 48.0, 320.0, 240.0);
        assert_eq!(rect.normalized(640, 480), [0.1, 0.1, 0.5, 0.5]);
    }
}
