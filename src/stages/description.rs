use super::timed;
use crate::algorithms::{AlgorithmRegistry, DescriptorExtractor};
use crate::error::{BenchError, Result};
use crate::frame_buffer::Frame;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DescriptionOutcome {
    pub description_time_ms: f64,
}

pub struct DescriptionStage<'a> {
    id: &'a str,
    extractor: &'a dyn DescriptorExtractor,
}

impl<'a> DescriptionStage<'a> {
    pub fn new(id: &'a str, extractor: &'a dyn DescriptorExtractor) -> DescriptionStage<'a> {
        DescriptionStage { id, extractor }
    }

    pub fn resolve(registry: &'a AlgorithmRegistry, id: &'a str) -> Result<DescriptionStage<'a>> {
        Ok(DescriptionStage::new(id, registry.descriptor(id)?))
    }

    pub fn extractor(&self) -> &'a dyn DescriptorExtractor {
        self.extractor
    }

    /// Describes the frame's keypoints. Fails if detection has not run on
    /// the frame or if the extractor does not return one row per keypoint.
    pub fn run(&self, frame: &mut Frame) -> Result<DescriptionOutcome> {
        let keypoints = frame.keypoints()?;
        let (descriptors, description_time_ms) =
            timed(|| self.extractor.extract(&frame.image, keypoints));
        if descriptors.rows() != keypoints.len() {
            return Err(BenchError::DescriptorRowMismatch {
                id: self.id.to_string(),
                rows: descriptors.rows(),
                keypoints: keypoints.len(),
            });
        }
        log::debug!("#3 : EXTRACT DESCRIPTORS done ({:.3} ms)", description_time_ms);
        frame.descriptors = Some(descriptors);
        Ok(DescriptionOutcome {
            description_time_ms,
        })
    }
}
