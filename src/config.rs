use serde::{Deserialize, Serialize};

use crate::algorithms::{DistanceNorm, MatcherStrategy, SelectionPolicy};
use crate::data_loader::ImageSequence;
use crate::error::{BenchError, Result};
use crate::frame_buffer::DEFAULT_BUFFER_CAPACITY;
use crate::region::{KeypointFilter, RegionOfInterest};
use crate::types::DescriptorType;

/// How the descriptor distance is chosen for a combination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DistanceNormPolicy {
    /// Hamming for binary descriptors, L2 for float descriptors.
    #[default]
    Auto,
    Hamming,
    L2,
}

impl DistanceNormPolicy {
    /// Norm for a descriptor. An explicit norm that does not fit the
    /// descriptor's output type is an error.
    pub fn resolve(&self, descriptor_id: &str, output: DescriptorType) -> Result<DistanceNorm> {
        let norm = match self {
            DistanceNormPolicy::Auto => return Ok(DistanceNorm::for_output(output)),
            DistanceNormPolicy::Hamming => DistanceNorm::Hamming,
            DistanceNormPolicy::L2 => DistanceNorm::L2,
        };
        if norm.fits(output) {
            Ok(norm)
        } else {
            Err(BenchError::NormMismatch {
                norm,
                descriptor: descriptor_id.to_string(),
                output,
            })
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub images: ImageSequence,
    pub buffer_capacity: usize,
    pub detector_ids: Vec<String>,
    pub descriptor_ids: Vec<String>,
    pub matcher_strategy: MatcherStrategy,
    pub distance_norm: DistanceNormPolicy,
    pub selection: SelectionPolicy,
    /// `None` keeps every detected keypoint.
    pub region_of_interest: Option<RegionOfInterest>,
    pub max_keypoints: Option<usize>,
    pub visualize: bool,
    /// Run independent combinations on the rayon pool.
    pub parallel: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            images: ImageSequence::default(),
            buffer_capacity: DEFAULT_BUFFER_CAPACITY,
            detector_ids: vec!["SHITOMASI".into(), "HARRIS".into(), "FAST".into()],
            descriptor_ids: vec!["BRIEF".into(), "HOG".into()],
            matcher_strategy: MatcherStrategy::BruteForce,
            distance_norm: DistanceNormPolicy::Auto,
            selection: SelectionPolicy::default(),
            region_of_interest: Some(RegionOfInterest::default()),
            max_keypoints: None,
            visualize: false,
            parallel: false,
        }
    }
}

impl SweepConfig {
    pub fn keypoint_filter(&self) -> KeypointFilter {
        KeypointFilter::new(self.region_of_interest, self.max_keypoints)
    }

    /// Checks that do not need the registry.
    pub fn validate(&self) -> Result<()> {
        if self.buffer_capacity < 2 {
            return Err(BenchError::InvalidCapacity(self.buffer_capacity));
        }
        if let SelectionPolicy::KnnRatio { threshold } = self.selection {
            if !(threshold > 0.0 && threshold <= 1.0) {
                return Err(BenchError::InvalidRatio(threshold));
            }
        }
        self.images.validate()
    }
}
