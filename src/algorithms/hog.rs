use std::f32::consts::PI;

use image::GrayImage;

use super::{pixel_clamped, DescriptorExtractor};
use crate::detected_points::Keypoint;
use crate::types::{DescriptorMatrix, DescriptorType};

/// Gradient orientation histogram descriptor.
///
/// The patch around a keypoint is split into `cells × cells` square cells of
/// `cell_size` pixels; each cell contributes a magnitude-weighted histogram of
/// `bins` orientations. The vector is L2-normalised, clipped at `clip` and
/// normalised again.
#[derive(Debug, Clone)]
pub struct HogExtractor {
    pub cells: usize,
    pub cell_size: usize,
    pub bins: usize,
    pub clip: f32,
}

impl Default for HogExtractor {
    fn default() -> Self {
        Self {
            cells: 4,
            cell_size: 4,
            bins: 8,
            clip: 0.2,
        }
    }
}

impl HogExtractor {
    pub fn dims(&self) -> usize {
        self.cells * self.cells * self.bins
    }

    fn describe(&self, img: &GrayImage, kp: &Keypoint, out: &mut [f32]) {
        let side = (self.cells * self.cell_size) as i32;
        let x0 = kp.pt.x.round() as i32 - side / 2;
        let y0 = kp.pt.y.round() as i32 - side / 2;
        let reference = kp.angle.unwrap_or(0.0);
        for py in 0..side {
            for px in 0..side {
                let (x, y) = (x0 + px, y0 + py);
                let gx = pixel_clamped(img, x + 1, y) as f32 - pixel_clamped(img, x - 1, y) as f32;
                let gy = pixel_clamped(img, x, y + 1) as f32 - pixel_clamped(img, x, y - 1) as f32;
                let magnitude = (gx * gx + gy * gy).sqrt();
                if magnitude == 0.0 {
                    continue;
                }
                let angle = (gy.atan2(gx) - reference).rem_euclid(2.0 * PI);
                let bin = ((angle / (2.0 * PI) * self.bins as f32) as usize).min(self.bins - 1);
                let cell = (py as usize / self.cell_size) * self.cells + px as usize / self.cell_size;
                out[cell * self.bins + bin] += magnitude;
            }
        }
        normalize(out);
        out.iter_mut().for_each(|v| *v = v.min(self.clip));
        normalize(out);
    }
}

fn normalize(v: &mut [f32]) {
    let norm = v.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm > f32::EPSILON {
        v.iter_mut().for_each(|x| *x /= norm);
    }
}

impl DescriptorExtractor for HogExtractor {
    fn output_type(&self) -> DescriptorType {
        DescriptorType::Float
    }

    fn extract(&self, img: &GrayImage, keypoints: &[Keypoint]) -> DescriptorMatrix {
        let dims = self.dims();
        let mut data = vec![0.0f32; keypoints.len() * dims];
        if dims > 0 && img.width() > 0 && img.height() > 0 {
            for (row, kp) in data.chunks_exact_mut(dims).zip(keypoints) {
                self.describe(img, kp, row);
            }
        }
        DescriptorMatrix::Float { dims, data }
    }
}
