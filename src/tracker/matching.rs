//! Nearest-centroid matching between live tracks and the current frame's detections.

use nalgebra::Point2;
use ndarray::Array2;

/// Euclidean distance matrix of shape (tracks, detections) between centroids.
pub fn centroid_distance(track_centers: &[Point2<f32>], det_centers: &[Point2<f32>]) -> Array2<f32> {
    let mut dists = Array2::zeros((track_centers.len(), det_centers.len()));
    for (i, t) in track_centers.iter().enumerate() {
        for (j, d) in det_centers.iter().enumerate() {
            dists[[i, j]] = nalgebra::distance(t, d);
        }
    }
    dists
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AssignmentResult {
    pub matches: Vec<(usize, usize)>,
    pub unmatched_tracks: Vec<usize>,
    pub unmatched_detections: Vec<usize>,
}

/// Greedy assignment in row order.
///
/// Each row (track) takes the closest still-unassigned column (detection)
/// whose distance is strictly below `thresh`. Rows earlier in the matrix win
/// contested detections; among equal distances the lower column index wins.
pub fn greedy_assignment(cost_matrix: &Array2<f32>, thresh: f32) -> AssignmentResult {
    let (num_rows, num_cols) = cost_matrix.dim();

    let mut matches = Vec::new();
    let mut unmatched_tracks = Vec::new();
    let mut assigned = vec![false; num_cols];

    for row in 0..num_rows {
        let mut best: Option<(usize, f32)> = None;
        for col in (0..num_cols).filter(|&c| !assigned[c]) {
            let dist = cost_matrix[[row, col]];
            if dist < thresh && best.is_none_or(|(_, min)| dist < min) {
                best = Some((col, dist));
            }
        }
        match best {
            Some((col, _)) => {
                assigned[col] = true;
                matches.push((row, col));
            }
            None => unmatched_tracks.push(row),
        }
    }

    let unmatched_detections = assigned
        .iter()
        .enumerate()
        .filter_map(|(i, &a)| if a { None } else { Some(i) })
        .collect();

    AssignmentResult {
        matches,
        unmatched_tracks,
        unmatched_detections,
    }
}
