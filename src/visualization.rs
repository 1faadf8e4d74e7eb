use std::io::Cursor;

use image::GrayImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;
use rerun::RecordingStream;

use crate::error::{BenchError, Result};
use crate::frame_buffer::Frame;

fn rr_err(e: impl std::fmt::Display) -> BenchError {
    BenchError::Visualization(e.to_string())
}

pub fn log_image_as_compressed(
    recording: &RecordingStream,
    topic: &str,
    img: &GrayImage,
    format: image::ImageFormat,
) -> Result<()> {
    let mut bytes: Vec<u8> = Vec::new();
    img.write_to(&mut Cursor::new(&mut bytes), format)
        .map_err(rr_err)?;
    recording
        .log(
            format!("{}/image", topic),
            &rerun::EncodedImage::from_file_contents(bytes),
        )
        .map_err(rr_err)
}

pub fn id_to_color(id: usize) -> (u8, u8, u8, u8) {
    let mut rng = ChaCha8Rng::seed_from_u64(id as u64);
    let color_num = rng.random_range(0..2u32.pow(24));
    (
        ((color_num >> 16) % 256) as u8,
        ((color_num >> 8) % 256) as u8,
        (color_num % 256) as u8,
        255,
    )
}

/// rerun use top left corner as (0, 0)
pub fn rerun_shift(p2ds: &[(f32, f32)]) -> Vec<(f32, f32)> {
    p2ds.iter().map(|(x, y)| (*x + 0.5, *y + 0.5)).collect()
}

/// Previous and current image next to each other, previous on the left.
pub fn side_by_side(left: &GrayImage, right: &GrayImage) -> GrayImage {
    let mut canvas = GrayImage::new(
        left.width() + right.width(),
        left.height().max(right.height()),
    );
    image::imageops::replace(&mut canvas, left, 0, 0);
    image::imageops::replace(&mut canvas, right, left.width() as i64, 0);
    canvas
}

/// Logs both frames side by side with their keypoints and a line per match
/// of the current frame.
pub fn log_match_pair(
    recording: &RecordingStream,
    topic: &str,
    previous: &Frame,
    current: &Frame,
) -> Result<()> {
    let offset = previous.image.width() as f32;
    recording.set_time("frame", rerun::TimeCell::from_sequence(current.index as i64));
    log_image_as_compressed(
        recording,
        topic,
        &side_by_side(&previous.image, &current.image),
        image::ImageFormat::Png,
    )?;

    let prev_kps = previous.keypoints()?;
    let curr_kps = current.keypoints()?;
    let pts: Vec<(f32, f32)> = prev_kps
        .iter()
        .map(|kp| (kp.pt.x, kp.pt.y))
        .chain(curr_kps.iter().map(|kp| (kp.pt.x + offset, kp.pt.y)))
        .collect();
    recording
        .log(
            format!("{}/keypoints", topic),
            &rerun::Points2D::new(rerun_shift(&pts))
                .with_radii([rerun::Radius::new_ui_points(3.0)]),
        )
        .map_err(rr_err)?;

    let matches = current.matches.as_deref().unwrap_or_default();
    let (strips, colors): (Vec<_>, Vec<_>) = matches
        .iter()
        .filter_map(|m| {
            let p = prev_kps.get(m.query_idx)?;
            let c = curr_kps.get(m.train_idx)?;
            Some((
                [[p.pt.x + 0.5, p.pt.y + 0.5], [c.pt.x + offset + 0.5, c.pt.y + 0.5]],
                id_to_color(m.query_idx),
            ))
        })
        .unzip();
    recording
        .log(
            format!("{}/matches", topic),
            &rerun::LineStrips2D::new(strips).with_colors(colors),
        )
        .map_err(rr_err)
}
