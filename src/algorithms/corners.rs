// Structure-tensor corner detectors (Harris and Shi-Tomasi).
//
// Both share the same front half:
//   1. Sobel gradients Ix, Iy
//   2. Products Ix², Iy², Ix·Iy summed over a (2r+1)² window
//   3. Per pixel 2×2 tensor M = [[Sxx, Sxy], [Sxy, Syy]]
// and differ only in the score taken from M.

use image::GrayImage;

use super::{pixel_clamped, KeypointDetector};
use crate::detected_points::Keypoint;

struct StructureTensor {
    width: usize,
    height: usize,
    sxx: Vec<f32>,
    syy: Vec<f32>,
    sxy: Vec<f32>,
}

impl StructureTensor {
    fn compute(img: &GrayImage, radius: usize) -> StructureTensor {
        let (w, h) = (img.width() as usize, img.height() as usize);
        let mut ixx = vec![0.0f32; w * h];
        let mut iyy = vec![0.0f32; w * h];
        let mut ixy = vec![0.0f32; w * h];
        for y in 0..h as i32 {
            for x in 0..w as i32 {
                let p = |dx: i32, dy: i32| pixel_clamped(img, x + dx, y + dy) as f32;
                let gx = (p(1, -1) + 2.0 * p(1, 0) + p(1, 1)) - (p(-1, -1) + 2.0 * p(-1, 0) + p(-1, 1));
                let gy = (p(-1, 1) + 2.0 * p(0, 1) + p(1, 1)) - (p(-1, -1) + 2.0 * p(0, -1) + p(1, -1));
                let i = y as usize * w + x as usize;
                ixx[i] = gx * gx;
                iyy[i] = gy * gy;
                ixy[i] = gx * gy;
            }
        }
        StructureTensor {
            width: w,
            height: h,
            sxx: box_sum(&ixx, w, h, radius),
            syy: box_sum(&iyy, w, h, radius),
            sxy: box_sum(&ixy, w, h, radius),
        }
    }

    fn map(&self, score: impl Fn(f32, f32, f32) -> f32) -> Vec<f32> {
        (0..self.width * self.height)
            .map(|i| score(self.sxx[i], self.syy[i], self.sxy[i]))
            .collect()
    }
}

/// Separable box sum, window truncated at the image border.
fn box_sum(src: &[f32], w: usize, h: usize, r: usize) -> Vec<f32> {
    let mut tmp = vec![0.0f32; w * h];
    for y in 0..h {
        for x in 0..w {
            let x0 = x.saturating_sub(r);
            let x1 = (x + r).min(w - 1);
            tmp[y * w + x] = src[y * w + x0..=y * w + x1].iter().sum();
        }
    }
    let mut out = vec![0.0f32; w * h];
    for y in 0..h {
        let y0 = y.saturating_sub(r);
        let y1 = (y + r).min(h - 1);
        for x in 0..w {
            out[y * w + x] = (y0..=y1).map(|yy| tmp[yy * w + x]).sum();
        }
    }
    out
}

/// Local maxima of `response` above `threshold`, skipping `border` pixels.
///
/// On plateaus only the first pixel in raster order survives.
fn local_maxima(
    response: &[f32],
    w: usize,
    h: usize,
    border: usize,
    nms_radius: usize,
    threshold: f32,
) -> Vec<(usize, usize, f32)> {
    let mut peaks = Vec::new();
    if w <= 2 * border || h <= 2 * border {
        return peaks;
    }
    let r = nms_radius as isize;
    for y in border..h - border {
        'pixel: for x in border..w - border {
            let v = response[y * w + x];
            if v <= threshold {
                continue;
            }
            for dy in -r..=r {
                for dx in -r..=r {
                    if dx == 0 && dy == 0 {
                        continue;
                    }
                    let nx = x as isize + dx;
                    let ny = y as isize + dy;
                    if nx < 0 || ny < 0 || nx >= w as isize || ny >= h as isize {
                        continue;
                    }
                    let n = response[ny as usize * w + nx as usize];
                    let earlier = dy < 0 || (dy == 0 && dx < 0);
                    if n > v || (earlier && n == v) {
                        continue 'pixel;
                    }
                }
            }
            peaks.push((x, y, v));
        }
    }
    peaks
}

/// Harris corner detector, response `det(M) - k·trace(M)²`.
#[derive(Debug, Clone)]
pub struct HarrisDetector {
    pub k: f32,
    /// Half size of the summation window.
    pub block_radius: usize,
    /// Minimum response relative to the strongest response in the image.
    pub relative_threshold: f32,
    pub nms_radius: usize,
}

impl Default for HarrisDetector {
    fn default() -> Self {
        Self {
            k: 0.04,
            block_radius: 1,
            relative_threshold: 0.01,
            nms_radius: 2,
        }
    }
}

impl KeypointDetector for HarrisDetector {
    fn detect(&self, img: &GrayImage) -> Vec<Keypoint> {
        if img.width() == 0 || img.height() == 0 {
            return Vec::new();
        }
        let tensor = StructureTensor::compute(img, self.block_radius);
        let k = self.k;
        let response = tensor.map(|a, b, c| (a * b - c * c) - k * (a + b) * (a + b));
        let max = response.iter().copied().fold(0.0f32, f32::max);
        let size = (2 * (2 * self.block_radius + 1)) as f32;
        local_maxima(
            &response,
            tensor.width,
            tensor.height,
            self.block_radius + 2,
            self.nms_radius,
            max * self.relative_threshold,
        )
        .into_iter()
        .map(|(x, y, r)| Keypoint::new(x as f32, y as f32, r, size))
        .collect()
    }
}

/// Shi-Tomasi "good features to track": minimum eigenvalue of M with a
/// minimum distance between accepted corners.
///
/// Output is sorted by descending response.
#[derive(Debug, Clone)]
pub struct ShiTomasiDetector {
    pub block_radius: usize,
    /// Minimum response relative to the strongest response in the image.
    pub quality_level: f32,
    pub min_distance: f32,
    pub max_corners: Option<usize>,
}

impl Default for ShiTomasiDetector {
    fn default() -> Self {
        Self {
            block_radius: 2,
            quality_level: 0.01,
            min_distance: 4.0,
            max_corners: None,
        }
    }
}

impl KeypointDetector for ShiTomasiDetector {
    fn detect(&self, img: &GrayImage) -> Vec<Keypoint> {
        if img.width() == 0 || img.height() == 0 {
            return Vec::new();
        }
        let tensor = StructureTensor::compute(img, self.block_radius);
        let response = tensor.map(|a, b, c| {
            let half_trace = 0.5 * (a + b);
            let d = 0.5 * (a - b);
            half_trace - (d * d + c * c).sqrt()
        });
        let max = response.iter().copied().fold(0.0f32, f32::max);
        let mut candidates = local_maxima(
            &response,
            tensor.width,
            tensor.height,
            self.block_radius + 2,
            1,
            max * self.quality_level,
        );
        candidates.sort_by(|a, b| b.2.total_cmp(&a.2));

        let size = (2 * self.block_radius) as f32;
        let min_d2 = self.min_distance * self.min_distance;
        let cell = self.min_distance.max(1.0);
        let grid_w = (tensor.width as f32 / cell).ceil() as usize + 1;
        let grid_h = (tensor.height as f32 / cell).ceil() as usize + 1;
        let mut grid: Vec<Vec<(f32, f32)>> = vec![Vec::new(); grid_w * grid_h];
        let mut keypoints = Vec::new();
        for (x, y, r) in candidates {
            if self.max_corners.is_some_and(|m| keypoints.len() >= m) {
                break;
            }
            let (fx, fy) = (x as f32, y as f32);
            let gx = (fx / cell) as usize;
            let gy = (fy / cell) as usize;
            let crowded = (gy.saturating_sub(1)..=(gy + 1).min(grid_h - 1)).any(|cy| {
                (gx.saturating_sub(1)..=(gx + 1).min(grid_w - 1)).any(|cx| {
                    grid[cy * grid_w + cx]
                        .iter()
                        .any(|&(px, py)| (px - fx).powi(2) + (py - fy).powi(2) < min_d2)
                })
            });
            if crowded {
                continue;
            }
            grid[gy * grid_w + gx].push((fx, fy));
            keypoints.push(Keypoint::new(fx, fy, r, size));
        }
        keypoints
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn box_sum_truncates_at_border() {
        let src = vec![1.0f32; 9];
        let out = box_sum(&src, 3, 3, 1);
        assert_eq!(out[0], 4.0);
        assert_eq!(out[4], 9.0);
        assert_eq!(out[8], 4.0);
    }

    #[test]
    fn plateau_keeps_single_peak() {
        let mut response = vec![0.0f32; 7 * 7];
        response[3 * 7 + 3] = 5.0;
        response[3 * 7 + 4] = 5.0;
        let peaks = local_maxima(&response, 7, 7, 1, 1, 0.0);
        assert_eq!(peaks, vec![(3, 3, 5.0)]);
    }
}
