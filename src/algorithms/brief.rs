use image::GrayImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

use super::DescriptorExtractor;
use crate::detected_points::Keypoint;
use crate::types::{DescriptorMatrix, DescriptorType};

/// BRIEF binary descriptor: each bit compares the smoothed intensity at two
/// points of a fixed, seeded sampling pattern around the keypoint.
///
/// When a keypoint carries an orientation the pattern is rotated with it.
/// Samples that fall outside the image read the nearest border pixel, so
/// every keypoint yields a row.
#[derive(Debug, Clone)]
pub struct BriefExtractor {
    pub bytes: usize,
    pub patch_radius: i32,
    pub smoothing_radius: i32,
    pattern: Vec<[(i32, i32); 2]>,
}

impl BriefExtractor {
    pub fn new(bytes: usize, patch_radius: i32, smoothing_radius: i32, seed: u64) -> BriefExtractor {
        let mut rng = ChaCha8Rng::seed_from_u64(seed);
        let pattern = (0..bytes * 8)
            .map(|_| {
                let mut p = || {
                    (
                        rng.random_range(-patch_radius..=patch_radius),
                        rng.random_range(-patch_radius..=patch_radius),
                    )
                };
                [p(), p()]
            })
            .collect();
        BriefExtractor {
            bytes,
            patch_radius,
            smoothing_radius,
            pattern,
        }
    }
}

impl Default for BriefExtractor {
    fn default() -> Self {
        BriefExtractor::new(32, 15, 2, 0x00b1_2e5f)
    }
}

/// Summed-area table with one row and column of zero padding.
struct Integral {
    w: i32,
    h: i32,
    sums: Vec<u64>,
}

impl Integral {
    fn new(img: &GrayImage) -> Integral {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let mut sums = vec![0u64; (w + 1) * (h + 1)];
        let data = img.as_raw();
        for y in 0..h {
            let mut row = 0u64;
            for x in 0..w {
                row += data[y * w + x] as u64;
                sums[(y + 1) * (w + 1) + x + 1] = sums[y * (w + 1) + x + 1] + row;
            }
        }
        Integral {
            w: w as i32,
            h: h as i32,
            sums,
        }
    }

    /// Mean over the square of radius `r` centred on the clamped point.
    fn box_mean(&self, x: i32, y: i32, r: i32) -> u64 {
        let x = x.clamp(0, self.w - 1);
        let y = y.clamp(0, self.h - 1);
        let x0 = (x - r).max(0) as usize;
        let y0 = (y - r).max(0) as usize;
        let x1 = ((x + r).min(self.w - 1) + 1) as usize;
        let y1 = ((y + r).min(self.h - 1) + 1) as usize;
        let stride = self.w as usize + 1;
        let s = self.sums[y1 * stride + x1] + self.sums[y0 * stride + x0]
            - self.sums[y0 * stride + x1]
            - self.sums[y1 * stride + x0];
        s / ((x1 - x0) * (y1 - y0)) as u64
    }
}

impl DescriptorExtractor for BriefExtractor {
    fn output_type(&self) -> DescriptorType {
        DescriptorType::Binary
    }

    fn extract(&self, img: &GrayImage, keypoints: &[Keypoint]) -> DescriptorMatrix {
        let mut data = vec![0u8; keypoints.len() * self.bytes];
        if self.bytes > 0 && img.width() > 0 && img.height() > 0 {
            let integral = Integral::new(img);
            for (row, kp) in data.chunks_exact_mut(self.bytes).zip(keypoints) {
                let (cx, cy) = (kp.pt.x.round() as i32, kp.pt.y.round() as i32);
                let (sin, cos) = kp.angle.unwrap_or(0.0).sin_cos();
                let rotate = |(dx, dy): (i32, i32)| {
                    let (dx, dy) = (dx as f32, dy as f32);
                    (
                        cx + (cos * dx - sin * dy).round() as i32,
                        cy + (sin * dx + cos * dy).round() as i32,
                    )
                };
                for (bit, [a, b]) in self.pattern.iter().enumerate() {
                    let (ax, ay) = rotate(*a);
                    let (bx, by) = rotate(*b);
                    if integral.box_mean(ax, ay, self.smoothing_radius)
                        < integral.box_mean(bx, by, self.smoothing_radius)
                    {
                        row[bit / 8] |= 1 << (bit % 8);
                    }
                }
            }
        }
        DescriptorMatrix::Binary {
            bytes_per_row: self.bytes,
            data,
        }
    }
}
