//! Tunables for tracking, trails, counting and the per-camera workers.
//!
//! Every struct deserialises with `#[serde(default)]`, so a partial JSON
//! document only overrides the fields it names.

use std::time::Duration;

use serde::Deserialize;

use crate::error::ConfigError;
use crate::tracker::ClassVocabulary;

/// Configuration for the [`CentroidTracker`](crate::tracker::CentroidTracker).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    /// Match threshold as a fraction of `min(frame_width, frame_height)`.
    pub match_distance_ratio: f32,
    /// Keep unmatched tracks alive instead of expiring them after `max_age_secs`.
    pub persist: bool,
    /// Staleness window for unmatched tracks when `persist` is off.
    pub max_age_secs: f64,
    /// Absolute timeout for persisted tracks since their last real match.
    /// `None` keeps them until `max_tracks` evicts them.
    pub persist_timeout_secs: Option<f64>,
    /// Upper bound on simultaneously live tracks.
    pub max_tracks: usize,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            match_distance_ratio: 0.1,
            persist: true,
            max_age_secs: 1.0,
            persist_timeout_secs: Some(5.0),
            max_tracks: 256,
        }
    }
}

/// Trail window applied to every track's position history.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct TrailConfig {
    pub duration_secs: f64,
    pub max_points: usize,
}

impl Default for TrailConfig {
    fn default() -> Self {
        Self {
            duration_secs: 5.0,
            max_points: 30,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct CountingConfig {
    pub enabled: bool,
    /// Counting line row as a fraction of the frame height.
    pub position_ratio: f32,
}

impl Default for CountingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            position_ratio: 0.5,
        }
    }
}

/// Everything a [`CameraPipeline`](crate::integration::CameraPipeline) needs.
#[derive(Debug, Clone, PartialEq, Default, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub tracker: TrackerConfig,
    pub trail: TrailConfig,
    pub counting: CountingConfig,
    pub confidence_threshold: ConfidenceThreshold,
    pub classes: ClassVocabulary,
}

/// Minimum detection confidence accepted by the pipeline (default 0.5).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
#[serde(transparent)]
pub struct ConfidenceThreshold(pub f32);

impl Default for ConfidenceThreshold {
    fn default() -> Self {
        Self(0.5)
    }
}

impl PipelineConfig {
    /// Parse and validate a JSON configuration document.
    pub fn from_json_str(json: &str) -> Result<Self, ConfigError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let t = &self.tracker;
        if !(t.match_distance_ratio > 0.0 && t.match_distance_ratio <= 1.0) {
            return Err(invalid(
                "tracker.match_distance_ratio",
                format!("{} not in (0, 1]", t.match_distance_ratio),
            ));
        }
        if !(t.max_age_secs > 0.0) {
            return Err(invalid(
                "tracker.max_age_secs",
                format!("{} must be positive", t.max_age_secs),
            ));
        }
        if let Some(timeout) = t.persist_timeout_secs {
            if !(timeout > 0.0) {
                return Err(invalid(
                    "tracker.persist_timeout_secs",
                    format!("{timeout} must be positive"),
                ));
            }
        }
        if t.max_tracks == 0 {
            return Err(invalid("tracker.max_tracks", "must be at least 1".into()));
        }
        if !(self.trail.duration_secs > 0.0) {
            return Err(invalid(
                "trail.duration_secs",
                format!("{} must be positive", self.trail.duration_secs),
            ));
        }
        if self.trail.max_points == 0 {
            return Err(invalid("trail.max_points", "must be at least 1".into()));
        }
        if !(0.0..=1.0).contains(&self.counting.position_ratio) {
            return Err(invalid(
                "counting.position_ratio",
                format!("{} not in [0, 1]", self.counting.position_ratio),
            ));
        }
        if !(0.0..=1.0).contains(&self.confidence_threshold.0) {
            return Err(invalid(
                "confidence_threshold",
                format!("{} not in [0, 1]", self.confidence_threshold.0),
            ));
        }
        if self.classes.is_empty() {
            return Err(invalid("classes", "vocabulary must not be empty".into()));
        }
        Ok(())
    }
}

/// Queue and polling behaviour of the per-camera workers.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct WorkerConfig {
    pub queue_capacity: usize,
    pub poll_timeout_ms: u64,
}

impl Default for WorkerConfig {
    fn default() -> Self {
        Self {
            queue_capacity: 10,
            poll_timeout_ms: 100,
        }
    }
}

impl WorkerConfig {
    pub fn poll_timeout(&self) -> Duration {
        Duration::from_millis(self.poll_timeout_ms)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.queue_capacity == 0 {
            return Err(invalid("queue_capacity", "must be at least 1".into()));
        }
        Ok(())
    }
}

fn invalid(field: &'static str, reason: String) -> ConfigError {
    ConfigError::Invalid { field, reason }
}
