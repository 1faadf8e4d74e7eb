use std::collections::VecDeque;

use image::GrayImage;

use crate::detected_points::{Keypoint, Match};
use crate::error::{BenchError, Result};
use crate::types::DescriptorMatrix;

pub const DEFAULT_BUFFER_CAPACITY: usize = 2;

/// Per-image state, filled in by the detection, description and matching
/// stages in that order.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Position of the frame within the current run, starting at 0.
    pub index: usize,
    pub image: GrayImage,
    pub keypoints: Option<Vec<Keypoint>>,
    pub descriptors: Option<DescriptorMatrix>,
    /// Matches against the previous frame. `None` until matching ran.
    pub matches: Option<Vec<Match>>,
}

impl Frame {
    pub fn new(index: usize, image: GrayImage) -> Frame {
        Frame {
            index,
            image,
            keypoints: None,
            descriptors: None,
            matches: None,
        }
    }

    pub fn keypoints(&self) -> Result<&[Keypoint]> {
        self.keypoints
            .as_deref()
            .ok_or(BenchError::MissingKeypoints(self.index))
    }

    pub fn descriptors(&self) -> Result<&DescriptorMatrix> {
        self.descriptors
            .as_ref()
            .ok_or(BenchError::MissingDescriptors(self.index))
    }
}

/// Sliding window over the most recent frames.
///
/// Pushing past capacity drops the oldest frame.
#[derive(Debug)]
pub struct FrameBuffer {
    frames: VecDeque<Frame>,
    capacity: usize,
}

impl FrameBuffer {
    pub fn new(capacity: usize) -> Result<FrameBuffer> {
        if capacity < 2 {
            return Err(BenchError::InvalidCapacity(capacity));
        }
        Ok(FrameBuffer {
            frames: VecDeque::with_capacity(capacity + 1),
            capacity,
        })
    }

    pub fn push(&mut self, frame: Frame) {
        self.frames.push_back(frame);
        while self.frames.len() > self.capacity {
            if let Some(evicted) = self.frames.pop_front() {
                log::trace!("evict frame {}", evicted.index);
            }
        }
    }

    pub fn latest(&self) -> Result<&Frame> {
        self.frames.back().ok_or(BenchError::EmptyBuffer)
    }

    pub fn latest_mut(&mut self) -> Result<&mut Frame> {
        self.frames.back_mut().ok_or(BenchError::EmptyBuffer)
    }

    pub fn second_latest(&self) -> Result<&Frame> {
        let n = self.frames.len();
        if n < 2 {
            return Err(BenchError::InsufficientFrames(n));
        }
        Ok(&self.frames[n - 2])
    }

    /// The two most recent frames as `(previous, current)`.
    pub fn latest_pair(&self) -> Result<(&Frame, &Frame)> {
        Ok((self.second_latest()?, self.latest()?))
    }

    pub fn clear(&mut self) {
        self.frames.clear();
    }

    pub fn len(&self) -> usize {
        self.frames.len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &Frame> {
        self.frames.iter()
    }
}
