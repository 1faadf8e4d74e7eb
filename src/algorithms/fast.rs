// FAST segment-test corner detector.
//
// A pixel is a corner when at least `arc_length` contiguous pixels on the
// radius-3 Bresenham circle are all brighter than center + threshold or all
// darker than center - threshold. Contiguity wraps around the circle.

use image::GrayImage;

use super::KeypointDetector;
use crate::detected_points::Keypoint;

/// Clockwise from 12 o'clock.
const CIRCLE: [(i32, i32); 16] = [
    (0, -3),
    (1, -3),
    (2, -2),
    (3, -1),
    (3, 0),
    (3, 1),
    (2, 2),
    (1, 3),
    (0, 3),
    (-1, 3),
    (-2, 2),
    (-3, 1),
    (-3, 0),
    (-3, -1),
    (-2, -2),
    (-1, -3),
];

/// Diameter OpenCV reports for FAST keypoints.
const KEYPOINT_SIZE: f32 = 7.0;

#[derive(Debug, Clone)]
pub struct FastDetector {
    pub threshold: u8,
    /// Required run length on the circle, 9..=12.
    pub arc_length: usize,
    pub non_max_suppression: bool,
}

impl Default for FastDetector {
    fn default() -> Self {
        Self {
            threshold: 30,
            arc_length: 9,
            non_max_suppression: true,
        }
    }
}

/// True if the 16-bit ring mask holds `n` contiguous set bits, wrapping.
fn has_run(mask: u16, n: usize) -> bool {
    let mut ring = (mask as u32) | ((mask as u32) << 16);
    for _ in 1..n {
        ring &= ring >> 1;
    }
    ring & 0xFFFF != 0
}

impl FastDetector {
    /// Corner score at `(x, y)`, 0 when the pixel is not a corner.
    ///
    /// Score is the sum of `|circle - center| - threshold` over the pixels on
    /// the qualifying side.
    fn score(&self, data: &[u8], w: usize, x: usize, y: usize) -> f32 {
        let center = data[y * w + x] as i16;
        let t = self.threshold as i16;
        let mut bright: u16 = 0;
        let mut dark: u16 = 0;
        let mut bright_sum = 0i32;
        let mut dark_sum = 0i32;
        for (i, &(dx, dy)) in CIRCLE.iter().enumerate() {
            let px = (x as i32 + dx) as usize;
            let py = (y as i32 + dy) as usize;
            let diff = data[py * w + px] as i16 - center;
            if diff > t {
                bright |= 1 << i;
                bright_sum += (diff - t) as i32;
            } else if diff < -t {
                dark |= 1 << i;
                dark_sum += (-diff - t) as i32;
            }
        }
        let mut score = 0;
        if has_run(bright, self.arc_length) {
            score = bright_sum;
        }
        if has_run(dark, self.arc_length) {
            score = score.max(dark_sum);
        }
        score as f32
    }
}

impl KeypointDetector for FastDetector {
    fn detect(&self, img: &GrayImage) -> Vec<Keypoint> {
        let (w, h) = (img.width() as usize, img.height() as usize);
        if w <= 6 || h <= 6 {
            return Vec::new();
        }
        let data = img.as_raw();
        let mut scores = vec![0.0f32; w * h];
        for y in 3..h - 3 {
            for x in 3..w - 3 {
                scores[y * w + x] = self.score(data, w, x, y);
            }
        }

        let mut keypoints = Vec::new();
        for y in 3..h - 3 {
            for x in 3..w - 3 {
                let s = scores[y * w + x];
                if s <= 0.0 {
                    continue;
                }
                if self.non_max_suppression {
                    let suppressed = (-1i32..=1).any(|dy| {
                        (-1i32..=1).any(|dx| {
                            let n = scores[(y as i32 + dy) as usize * w + (x as i32 + dx) as usize];
                            let earlier = dy < 0 || (dy == 0 && dx < 0);
                            (dx, dy) != (0, 0) && (n > s || (earlier && n == s))
                        })
                    });
                    if suppressed {
                        continue;
                    }
                }
                keypoints.push(Keypoint::new(x as f32, y as f32, s, KEYPOINT_SIZE));
            }
        }
        keypoints
    }
}
