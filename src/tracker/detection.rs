//! Per-frame detection input and the class vocabulary it is validated against.

use nalgebra::Point2;
use serde::Deserialize;

use crate::error::InvalidDetection;
use crate::tracker::rect::Rect;

/// Detection input for the tracker.
#[derive(Debug, Clone, PartialEq)]
pub struct Detection {
    /// Bounding box in pixel space
    pub bbox: Rect,
    /// Index into the [`ClassVocabulary`]
    pub class_id: usize,
    /// Detection confidence score
    pub confidence: f32,
}

impl Detection {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32, class_id: usize, confidence: f32) -> Self {
        Self {
            bbox: Rect::from_tlbr(x1, y1, x2, y2),
            class_id,
            confidence,
        }
    }

    pub fn from_rect(bbox: Rect, class_id: usize, confidence: f32) -> Self {
        Self {
            bbox,
            class_id,
            confidence,
        }
    }

    #[inline]
    pub fn centroid(&self) -> Point2<f32> {
        self.bbox.center()
    }

    /// Check the detection against the input-boundary rules.
    pub fn validate(&self, vocabulary: &ClassVocabulary) -> Result<(), InvalidDetection> {
        let [x1, y1, x2, y2] = self.bbox.to_tlbr();
        if ![x1, y1, x2, y2].iter().all(|v| v.is_finite()) {
            return Err(InvalidDetection::NonFinite);
        }
        if !self.bbox.is_valid() {
            return Err(InvalidDetection::Degenerate {
                width: self.bbox.width,
                height: self.bbox.height,
            });
        }
        if !(0.0..=1.0).contains(&self.confidence) {
            return Err(InvalidDetection::Confidence(self.confidence));
        }
        if self.class_id >= vocabulary.len() {
            return Err(InvalidDetection::UnknownClass {
                class_id: self.class_id,
                len: vocabulary.len(),
            });
        }
        Ok(())
    }
}

/// Ordered class names; a detection's `class_id` indexes into it.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ClassVocabulary(Vec<String>);

impl Default for ClassVocabulary {
    fn default() -> Self {
        Self::new(["car", "truck", "bus", "motorcycle", "bicycle"])
    }
}

impl ClassVocabulary {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(names.into_iter().map(Into::into).collect())
    }

    pub fn name(&self, class_id: usize) -> Option<&str> {
        self.0.get(class_id).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.0.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_vocabulary() {
        let vocab = ClassVocabulary::default();
        assert_eq!(vocab.name(0), Some("car"));
        assert_eq!(vocab.name(4), Some("bicycle"));
        assert_eq!(vocab.name(5), None);
    }

    #[test]
    fn test_validate() {
        let vocab = ClassVocabulary::default();
        assert!(Detection::new(0.0, 0.0, 10.0, 10.0, 0, 0.9).validate(&vocab).is_ok());

        assert_eq!(
            Detection::new(0.0, f32::NAN, 10.0, 10.0, 0, 0.9).validate(&vocab),
            Err(InvalidDetection::NonFinite)
        );
        assert!(matches!(
            Detection::new(10.0, 0.0, 10.0, 10.0, 0, 0.9).validate(&vocab),
            Err(InvalidDetection::Degenerate { .. })
        ));
        assert_eq!(
            Detection::new(0.0, 0.0, 10.0, 10.0, 0, 1.5).validate(&vocab),
            Err(InvalidDetection::Confidence(1.5))
        );
        assert_eq!(
            Detection::new(0.0, 0.0, 10.0, 10.0, 7, 0.9).validate(&vocab),
            Err(InvalidDetection::UnknownClass { class_id: 7, len: 5 })
        );
    }

    #[test]
    fn test_centroid() {
        let det = Detection::new(0.0, 20.0, 20.0, 60.0, 1, 0.8);
        assert_eq!(det.centroid(), Point2::new(10.0, 40.0));
    }
}
