//! Bounded, time-windowed position history kept per track.

use std::collections::VecDeque;

use nalgebra::Point2;

use crate::config::TrailConfig;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TrailPoint {
    pub position: Point2<f32>,
    pub time: f64,
    pub class_id: usize,
}

/// Ordered oldest to newest. Entries older than the trail duration are pruned
/// and at most `max_points` of the newest entries are retained.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TrailHistory {
    points: VecDeque<TrailPoint>,
}

impl TrailHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point, then prune by age relative to `point.time` and cap the length.
    pub fn push(&mut self, point: TrailPoint, config: &TrailConfig) {
        self.points.push_back(point);
        self.prune(point.time, config.duration_secs);
        while self.points.len() > config.max_points {
            self.points.pop_front();
        }
    }

    /// Drop every point with `now - time > duration_secs`.
    pub fn prune(&mut self, now: f64, duration_secs: f64) {
        while self
            .points
            .front()
            .is_some_and(|p| now - p.time > duration_secs)
        {
            self.points.pop_front();
        }
    }

    pub fn last(&self) -> Option<&TrailPoint> {
        self.points.back()
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &TrailPoint> {
        self.points.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(y: f32, time: f64) -> TrailPoint {
        TrailPoint {
            position: Point2::new(0.0, y),
            time,
            class_id: 0,
        }
    }

    #[test]
    fn test_cap_keeps_newest() {
        let config = TrailConfig {
            duration_secs: 100.0,
            max_points: 3,
        };
        let mut trail = TrailHistory::new();
        for i in 0..5 {
            trail.push(point(i as f32, i as f64), &config);
        }
        assert_eq!(trail.len(), 3);
        let ys: Vec<f32> = trail.iter().map(|p| p.position.y).collect();
        assert_eq!(ys, vec![2.0, 3.0, 4.0]);
    }

    #[test]
    fn test_aging() {
        let config = TrailConfig::default();
        let mut trail = TrailHistory::new();
        trail.push(point(1.0, 0.0), &config);
        trail.push(point(2.0, 4.0), &config);
        assert_eq!(trail.len(), 2);

        // 5.0 exactly is still inside the window.
        trail.push(point(3.0, 5.0), &config);
        assert_eq!(trail.len(), 3);

        trail.push(point(4.0, 5.5), &config);
        assert_eq!(trail.len(), 3);
        assert_eq!(trail.iter().next().map(|p| p.time), Some(4.0));
        assert_eq!(trail.last().map(|p| p.position.y), Some(4.0));
    }

    #[test]
    fn test_prune_to_empty() {
        let mut trail = TrailHistory::new();
        trail.push(point(1.0, 0.0), &TrailConfig::default());
        trail.prune(10.0, 5.0);
        assert!(trail.is_empty());
        assert!(trail.last().is_none());
    }
}
