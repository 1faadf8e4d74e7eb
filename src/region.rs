use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::detected_points::Keypoint;

/// Closed axis-aligned rectangle in pixel coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct RegionOfInterest {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Default for RegionOfInterest {
    /// Box around the preceding vehicle in the KITTI sequence.
    fn default() -> Self {
        Self {
            x: 535.0,
            y: 180.0,
            width: 180.0,
            height: 150.0,
        }
    }
}

impl RegionOfInterest {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> RegionOfInterest {
        RegionOfInterest {
            x,
            y,
            width,
            height,
        }
    }

    /// Boundary-inclusive.
    pub fn contains(&self, p: Vec2) -> bool {
        p.x >= self.x && p.x <= self.x + self.width && p.y >= self.y && p.y <= self.y + self.height
    }
}

/// Filter output together with the size of the detector output it came from.
#[derive(Debug, Clone, PartialEq)]
pub struct FilteredKeypoints {
    pub keypoints: Vec<Keypoint>,
    pub raw_count: usize,
}

impl FilteredKeypoints {
    pub fn filtered_count(&self) -> usize {
        self.keypoints.len()
    }
}

/// Keeps the keypoints inside `roi`, in their original order.
pub fn filter_keypoints(keypoints: &[Keypoint], roi: &RegionOfInterest) -> FilteredKeypoints {
    FilteredKeypoints {
        keypoints: keypoints
            .iter()
            .filter(|kp| roi.contains(kp.pt))
            .copied()
            .collect(),
        raw_count: keypoints.len(),
    }
}

/// Keeps the `max` strongest keypoints by response. Survivors keep their
/// relative order; ties go to the earlier keypoint.
pub fn retain_strongest(keypoints: Vec<Keypoint>, max: usize) -> Vec<Keypoint> {
    if keypoints.len() <= max {
        return keypoints;
    }
    let mut order: Vec<usize> = (0..keypoints.len()).collect();
    order.sort_by(|&a, &b| keypoints[b].response.total_cmp(&keypoints[a].response));
    let mut keep = vec![false; keypoints.len()];
    for &i in order.iter().take(max) {
        keep[i] = true;
    }
    keypoints
        .into_iter()
        .zip(keep)
        .filter_map(|(kp, k)| k.then_some(kp))
        .collect()
}

/// Region filter plus optional keypoint limit, applied in that order.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct KeypointFilter {
    pub roi: Option<RegionOfInterest>,
    pub max_keypoints: Option<usize>,
}

impl KeypointFilter {
    pub fn new(roi: Option<RegionOfInterest>, max_keypoints: Option<usize>) -> KeypointFilter {
        KeypointFilter { roi, max_keypoints }
    }

    pub fn apply(&self, keypoints: Vec<Keypoint>) -> FilteredKeypoints {
        let mut filtered = match &self.roi {
            Some(roi) => filter_keypoints(&keypoints, roi),
            None => FilteredKeypoints {
                raw_count: keypoints.len(),
                keypoints,
            },
        };
        if let Some(max) = self.max_keypoints {
            filtered.keypoints = retain_strongest(filtered.keypoints, max);
        }
        filtered
    }
}
