use std::path::PathBuf;

use crate::algorithms::{AlgorithmKind, DistanceNorm};
use crate::types::DescriptorType;

pub type Result<T> = std::result::Result<T, BenchError>;

/// Everything that can stop a sweep.
///
/// Compatibility skips are not errors and never show up here.
#[derive(Debug, thiserror::Error)]
pub enum BenchError {
    #[error("unknown {kind} identifier `{id}`")]
    UnknownAlgorithm { kind: AlgorithmKind, id: String },

    #[error("no matcher registered for strategy {0:?}")]
    UnknownMatcher(crate::algorithms::MatcherStrategy),

    #[error("buffer capacity must be at least 2, got {0}")]
    InvalidCapacity(usize),

    #[error("frame range is empty (start {start}, end {end})")]
    EmptyFrameRange { start: usize, end: usize },

    #[error("image source holds no frames")]
    EmptySource,

    #[error("distance norm {norm:?} cannot compare {output:?} descriptors of `{descriptor}`")]
    NormMismatch {
        norm: DistanceNorm,
        descriptor: String,
        output: DescriptorType,
    },

    #[error("cannot compare {query:?} and {train:?} descriptors under {norm:?}")]
    IncomparableDescriptors {
        norm: DistanceNorm,
        query: DescriptorType,
        train: DescriptorType,
    },

    #[error("descriptor widths differ: query {query}, train {train}")]
    DescriptorWidthMismatch { query: usize, train: usize },

    #[error("ratio test threshold must be in (0, 1], got {0}")]
    InvalidRatio(f32),

    #[error("frame buffer is empty")]
    EmptyBuffer,

    #[error("frame buffer holds {0} frame(s), at least two are required")]
    InsufficientFrames(usize),

    #[error("frame {0} has no keypoints, detection has to run first")]
    MissingKeypoints(usize),

    #[error("frame {0} has no descriptors, description has to run first")]
    MissingDescriptors(usize),

    #[error("descriptor `{id}` returned {rows} rows for {keypoints} keypoints")]
    DescriptorRowMismatch {
        id: String,
        rows: usize,
        keypoints: usize,
    },

    #[error("no image at sequence position {0}")]
    FrameOutOfRange(usize),

    #[error("failed to load image {}: {source}", .path.display())]
    ImageLoad {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("visualization failed: {0}")]
    Visualization(String),

    #[error(transparent)]
    Pattern(#[from] glob::PatternError),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
