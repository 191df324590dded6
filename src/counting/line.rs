use serde::Serialize;

/// Direction of travel across the counting line, in image coordinates
/// (y grows downwards).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Direction {
    Up,
    Down,
}

/// Detect a crossing between two consecutive observations.
///
/// The "before" side of the comparison is inclusive and the "after" side is
/// exclusive, so a point resting exactly on the line is counted at most once.
pub fn check_crossing(prev_y: f32, curr_y: f32, line_y: f32) -> Option<Direction> {
    if prev_y <= line_y && curr_y > line_y {
        Some(Direction::Down)
    } else if prev_y >= line_y && curr_y < line_y {
        Some(Direction::Up)
    } else {
        None
    }
}

/// Horizontal counting line spanning the frame width.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct CountingLine {
    pub y: f32,
    pub start_x: f32,
    pub end_x: f32,
}

impl CountingLine {
    /// Line at `floor(height * position_ratio)`, or `None` for a zero-sized frame.
    pub fn for_frame(width: u32, height: u32, position_ratio: f32) -> Option<Self> {
        if width == 0 || height == 0 {
            return None;
        }
        Some(Self {
            y: (height as f32 * position_ratio).floor(),
            start_x: 0.0,
            end_x: width as f32,
        })
    }

    pub fn check(&self, prev_y: f32, curr_y: f32) -> Option<Direction> {
        check_crossing(prev_y, curr_y, self.y)
    }
}
