use super::timed;
use crate::algorithms::{AlgorithmRegistry, KeypointDetector};
use crate::error::Result;
use crate::frame_buffer::Frame;
use crate::region::KeypointFilter;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DetectionOutcome {
    pub detection_time_ms: f64,
    pub raw_count: usize,
    pub filtered_count: usize,
}

/// Detects keypoints on a frame and keeps those passing the filter.
///
/// Only the detector call is timed.
pub struct DetectionStage<'a> {
    detector: &'a dyn KeypointDetector,
    filter: KeypointFilter,
}

impl<'a> DetectionStage<'a> {
    pub fn new(detector: &'a dyn KeypointDetector, filter: KeypointFilter) -> DetectionStage<'a> {
        DetectionStage { detector, filter }
    }

    /// Looks the detector up by identifier.
    pub fn resolve(
        registry: &'a AlgorithmRegistry,
        detector_id: &str,
        filter: KeypointFilter,
    ) -> Result<DetectionStage<'a>> {
        Ok(DetectionStage::new(registry.detector(detector_id)?, filter))
    }

    pub fn run(&self, frame: &mut Frame) -> DetectionOutcome {
        let (raw, detection_time_ms) = timed(|| self.detector.detect(&frame.image));
        let filtered = self.filter.apply(raw);
        let outcome = DetectionOutcome {
            detection_time_ms,
            raw_count: filtered.raw_count,
            filtered_count: filtered.filtered_count(),
        };
        log::debug!(
            "#2 : DETECT {} KEYPOINTS; before filtering = {} ({:.3} ms)",
            outcome.filtered_count,
            outcome.raw_count,
            detection_time_ms
        );
        frame.keypoints = Some(filtered.keypoints);
        frame.descriptors = None;
        frame.matches = None;
        outcome
    }
}
