use glam::Vec2;

/// A detected keypoint.
///
/// Keypoints carry no identity across frames; a keypoint is addressed by its
/// position in the frame's keypoint list.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Keypoint {
    pub pt: Vec2,
    /// Detector response, higher is stronger.
    pub response: f32,
    /// Diameter of the meaningful neighbourhood in pixels.
    pub size: f32,
    /// Orientation in radians, `None` for detectors without one.
    pub angle: Option<f32>,
}

impl Keypoint {
    pub fn new(x: f32, y: f32, response: f32, size: f32) -> Keypoint {
        Keypoint {
            pt: Vec2::new(x, y),
            response,
            size,
            angle: None,
        }
    }

    pub fn with_angle(mut self, angle: f32) -> Keypoint {
        self.angle = Some(angle);
        self
    }
}

/// Correspondence between a keypoint of the previous frame (`query_idx`) and
/// one of the current frame (`train_idx`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Match {
    pub query_idx: usize,
    pub train_idx: usize,
    pub distance: f32,
}

impl Match {
    pub fn new(query_idx: usize, train_idx: usize, distance: f32) -> Match {
        Match {
            query_idx,
            train_idx,
            distance,
        }
    }
}
