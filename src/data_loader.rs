use std::path::{Path, PathBuf};

use glob::glob;
use image::{GrayImage, ImageReader};
use serde::{Deserialize, Serialize};

use crate::error::{BenchError, Result};

/// Ordered supply of grayscale images, addressed by position in the run.
pub trait FrameSource: Send + Sync {
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn load(&self, position: usize) -> Result<GrayImage>;
}

/// Decodes an image file and converts it to 8-bit grayscale.
pub fn load_gray(path: &Path) -> Result<GrayImage> {
    let to_err = |source| BenchError::ImageLoad {
        path: path.to_path_buf(),
        source,
    };
    let img = ImageReader::open(path)
        .map_err(|e| to_err(image::ImageError::IoError(e)))?
        .decode()
        .map_err(to_err)?;
    log::trace!("loaded {} ({}x{})", path.display(), img.width(), img.height());
    Ok(img.to_luma8())
}

/// Numbered image files: `base_path/prefix + zero padded index + extension`,
/// for every index in `start_index..=end_index`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ImageSequence {
    pub base_path: String,
    pub prefix: String,
    pub extension: String,
    pub start_index: usize,
    pub end_index: usize,
    pub fill_width: usize,
}

impl Default for ImageSequence {
    fn default() -> Self {
        Self {
            base_path: "images".to_string(),
            prefix: "KITTI/2011_09_26/image_00/data/000000".to_string(),
            extension: ".png".to_string(),
            start_index: 0,
            end_index: 9,
            fill_width: 4,
        }
    }
}

impl ImageSequence {
    pub fn validate(&self) -> Result<()> {
        if self.start_index > self.end_index {
            return Err(BenchError::EmptyFrameRange {
                start: self.start_index,
                end: self.end_index,
            });
        }
        Ok(())
    }

    pub fn path(&self, position: usize) -> PathBuf {
        let number = format!(
            "{:0width$}",
            self.start_index + position,
            width = self.fill_width
        );
        Path::new(&self.base_path).join(format!("{}{}{}", self.prefix, number, self.extension))
    }
}

impl FrameSource for ImageSequence {
    fn len(&self) -> usize {
        if self.start_index > self.end_index {
            0
        } else {
            self.end_index - self.start_index + 1
        }
    }

    fn load(&self, position: usize) -> Result<GrayImage> {
        if position >= self.len() {
            return Err(BenchError::FrameOutOfRange(position));
        }
        load_gray(&self.path(position))
    }
}

fn img_filter(rp: glob::GlobResult) -> Option<PathBuf> {
    if let Ok(p) = rp {
        for ext in &[".png", ".jpg"] {
            if p.as_os_str().to_string_lossy().ends_with(ext) {
                return Some(p);
            }
        }
    }
    None
}

/// Images matching a glob pattern, in sorted path order.
#[derive(Debug, Clone)]
pub struct GlobSequence {
    paths: Vec<PathBuf>,
}

impl GlobSequence {
    /// `skip` and `step` sample the sorted list the same way the dataset
    /// loaders do.
    pub fn new(pattern: &str, skip: usize, step: usize) -> Result<GlobSequence> {
        let mut sorted_path: Vec<PathBuf> = glob(pattern)?.filter_map(img_filter).collect();
        sorted_path.sort();
        let paths: Vec<PathBuf> = sorted_path
            .into_iter()
            .skip(skip)
            .step_by(step.max(1))
            .collect();
        log::trace!("{} images match {}", paths.len(), pattern);
        Ok(GlobSequence { paths })
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }
}

impl FrameSource for GlobSequence {
    fn len(&self) -> usize {
        self.paths.len()
    }

    fn load(&self, position: usize) -> Result<GrayImage> {
        let path = self
            .paths
            .get(position)
            .ok_or(BenchError::FrameOutOfRange(position))?;
        load_gray(path)
    }
}

/// Images already in memory, mostly for tests and synthetic runs.
impl FrameSource for Vec<GrayImage> {
    fn len(&self) -> usize {
        <[GrayImage]>::len(self)
    }

    fn load(&self, position: usize) -> Result<GrayImage> {
        self.get(position)
            .cloned()
            .ok_or(BenchError::FrameOutOfRange(position))
    }
}
