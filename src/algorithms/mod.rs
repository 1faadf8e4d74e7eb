pub mod brief;
pub mod corners;
pub mod fast;
pub mod hog;
pub mod matcher;

use std::collections::HashMap;
use std::fmt;

use image::GrayImage;
use serde::{Deserialize, Serialize};

use crate::detected_points::{Keypoint, Match};
use crate::error::{BenchError, Result};
use crate::types::{DescriptorMatrix, DescriptorType};

pub use brief::BriefExtractor;
pub use corners::{HarrisDetector, ShiTomasiDetector};
pub use fast::FastDetector;
pub use hog::HogExtractor;
pub use matcher::{BruteForceMatcher, IndexedMatcher};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlgorithmKind {
    Detector,
    Descriptor,
}

impl fmt::Display for AlgorithmKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlgorithmKind::Detector => write!(f, "detector"),
            AlgorithmKind::Descriptor => write!(f, "descriptor"),
        }
    }
}

/// Distance used to compare descriptor rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DistanceNorm {
    /// Bit count of the xor, for binary descriptors.
    Hamming,
    /// Euclidean distance, for float descriptors.
    L2,
}

impl DistanceNorm {
    pub fn for_output(output: DescriptorType) -> DistanceNorm {
        match output {
            DescriptorType::Binary => DistanceNorm::Hamming,
            DescriptorType::Float => DistanceNorm::L2,
        }
    }

    pub fn fits(&self, output: DescriptorType) -> bool {
        DistanceNorm::for_output(output) == *self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MatcherStrategy {
    /// Exhaustive linear scan.
    BruteForce,
    /// Approximate search through an index built over the train set.
    Indexed,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum SelectionPolicy {
    NearestNeighbor,
    /// Two nearest candidates, keep the best if `best / second < threshold`.
    KnnRatio { threshold: f32 },
}

pub const DEFAULT_RATIO_THRESHOLD: f32 = 0.8;

impl Default for SelectionPolicy {
    fn default() -> Self {
        SelectionPolicy::KnnRatio {
            threshold: DEFAULT_RATIO_THRESHOLD,
        }
    }
}

pub trait KeypointDetector: Send + Sync {
    fn detect(&self, img: &GrayImage) -> Vec<Keypoint>;
}

pub trait DescriptorExtractor: Send + Sync {
    fn output_type(&self) -> DescriptorType;

    /// One row per keypoint, in keypoint order.
    fn extract(&self, img: &GrayImage, keypoints: &[Keypoint]) -> DescriptorMatrix;
}

pub trait DescriptorMatcher: Send + Sync {
    /// For every query row, up to `k` train candidates sorted by ascending
    /// distance. The outer vector is indexed by query row.
    fn knn_match(
        &self,
        query: &DescriptorMatrix,
        train: &DescriptorMatrix,
        k: usize,
        norm: DistanceNorm,
    ) -> Result<Vec<Vec<Match>>>;
}

/// Identifier to provider lookup for every algorithm a sweep can name.
#[derive(Default)]
pub struct AlgorithmRegistry {
    detectors: HashMap<String, Box<dyn KeypointDetector>>,
    descriptors: HashMap<String, Box<dyn DescriptorExtractor>>,
    matchers: HashMap<MatcherStrategy, Box<dyn DescriptorMatcher>>,
}

impl AlgorithmRegistry {
    pub fn new() -> AlgorithmRegistry {
        AlgorithmRegistry::default()
    }

    /// Registry with the built-in detectors, descriptors and both matchers.
    pub fn with_defaults() -> AlgorithmRegistry {
        let mut registry = AlgorithmRegistry::new();
        registry
            .register_detector("SHITOMASI", ShiTomasiDetector::default())
            .register_detector("HARRIS", HarrisDetector::default())
            .register_detector("FAST", FastDetector::default())
            .register_descriptor("BRIEF", BriefExtractor::default())
            .register_descriptor("HOG", HogExtractor::default())
            .register_matcher(MatcherStrategy::BruteForce, BruteForceMatcher)
            .register_matcher(MatcherStrategy::Indexed, IndexedMatcher::default());
        registry
    }

    pub fn register_detector(
        &mut self,
        id: &str,
        detector: impl KeypointDetector + 'static,
    ) -> &mut Self {
        self.detectors.insert(id.to_string(), Box::new(detector));
        self
    }

    pub fn register_descriptor(
        &mut self,
        id: &str,
        extractor: impl DescriptorExtractor + 'static,
    ) -> &mut Self {
        self.descriptors.insert(id.to_string(), Box::new(extractor));
        self
    }

    pub fn register_matcher(
        &mut self,
        strategy: MatcherStrategy,
        matcher: impl DescriptorMatcher + 'static,
    ) -> &mut Self {
        self.matchers.insert(strategy, Box::new(matcher));
        self
    }

    pub fn detector(&self, id: &str) -> Result<&dyn KeypointDetector> {
        self.detectors
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| BenchError::UnknownAlgorithm {
                kind: AlgorithmKind::Detector,
                id: id.to_string(),
            })
    }

    pub fn descriptor(&self, id: &str) -> Result<&dyn DescriptorExtractor> {
        self.descriptors
            .get(id)
            .map(|d| d.as_ref())
            .ok_or_else(|| BenchError::UnknownAlgorithm {
                kind: AlgorithmKind::Descriptor,
                id: id.to_string(),
            })
    }

    pub fn matcher(&self, strategy: MatcherStrategy) -> Result<&dyn DescriptorMatcher> {
        self.matchers
            .get(&strategy)
            .map(|m| m.as_ref())
            .ok_or(BenchError::UnknownMatcher(strategy))
    }

    /// Registered detector identifiers, sorted.
    pub fn detector_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.detectors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }

    /// Registered descriptor identifiers, sorted.
    pub fn descriptor_ids(&self) -> Vec<&str> {
        let mut ids: Vec<&str> = self.descriptors.keys().map(String::as_str).collect();
        ids.sort_unstable();
        ids
    }
}

/// Clamped pixel read, shared by the built-in providers.
#[inline]
pub(crate) fn pixel_clamped(img: &GrayImage, x: i32, y: i32) -> u8 {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return 0;
    }
    let x = x.clamp(0, w as i32 - 1) as u32;
    let y = y.clamp(0, h as i32 - 1) as u32;
    img.as_raw()[(y * w + x) as usize]
}
