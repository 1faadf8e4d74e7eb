use std::path::{Path, PathBuf};

use feature_tracking_benchmark::BenchError;
use feature_tracking_benchmark::data_loader::{FrameSource, GlobSequence, ImageSequence, load_gray};
use image::{GrayImage, Luma, Rgb, RgbImage};

fn sequence_in(dir: &Path, start: usize, end: usize) -> ImageSequence {
    ImageSequence {
        base_path: dir.to_string_lossy().to_string(),
        prefix: "frame_".to_string(),
        extension: ".png".to_string(),
        start_index: start,
        end_index: end,
        fill_width: 4,
    }
}

#[test]
fn test_path_template() {
    let seq = ImageSequence::default();
    assert_eq!(
        seq.path(3),
        PathBuf::from("images/KITTI/2011_09_26/image_00/data/0000000003.png")
    );
    assert_eq!(seq.len(), 10);

    let seq = ImageSequence {
        start_index: 98,
        end_index: 101,
        fill_width: 2,
        ..sequence_in(Path::new("data"), 0, 0)
    };
    assert_eq!(seq.path(0), PathBuf::from("data/frame_98.png"));
    assert_eq!(seq.path(3), PathBuf::from("data/frame_101.png"));
    assert_eq!(seq.len(), 4);
}

#[test]
fn test_empty_range() {
    let seq = sequence_in(Path::new("data"), 5, 4);
    assert!(seq.is_empty());
    assert!(matches!(
        seq.validate(),
        Err(BenchError::EmptyFrameRange { start: 5, end: 4 })
    ));
    assert!(sequence_in(Path::new("data"), 4, 4).validate().is_ok());
}

#[test]
fn test_load_numbered_sequence() {
    let dir = tempfile::tempdir().unwrap();
    for i in 2..5u8 {
        let img = RgbImage::from_pixel(6, 4, Rgb([i * 20, i * 20, i * 20]));
        img.save(dir.path().join(format!("frame_{:04}.png", i))).unwrap();
    }
    let seq = sequence_in(dir.path(), 2, 4);
    assert_eq!(seq.len(), 3);
    let first = seq.load(0).unwrap();
    assert_eq!(first.dimensions(), (6, 4));
    assert_eq!(first.get_pixel(0, 0)[0], 40);
    assert_eq!(seq.load(2).unwrap().get_pixel(5, 3)[0], 80);
    assert!(matches!(seq.load(3), Err(BenchError::FrameOutOfRange(3))));
}

#[test]
fn test_missing_file_is_load_error() {
    let dir = tempfile::tempdir().unwrap();
    let seq = sequence_in(dir.path(), 0, 1);
    match seq.load(1) {
        Err(BenchError::ImageLoad { path, .. }) => {
            assert_eq!(path, dir.path().join("frame_0001.png"));
        }
        other => panic!("expected ImageLoad, got {:?}", other.map(|i| i.dimensions())),
    }
    assert!(load_gray(&dir.path().join("nothing.png")).is_err());
}

#[test]
fn test_glob_sequence() {
    let dir = tempfile::tempdir().unwrap();
    for name in ["c.png", "a.png", "b.jpg", "d.txt", "e.png"] {
        let path = dir.path().join(name);
        if name.ends_with(".txt") {
            std::fs::write(&path, "not an image").unwrap();
        } else {
            GrayImage::from_pixel(3, 3, Luma([name.as_bytes()[0]]))
                .save(&path)
                .unwrap();
        }
    }
    let pattern = format!("{}/*", dir.path().display());
    let all = GlobSequence::new(&pattern, 0, 1).unwrap();
    let names: Vec<String> = all
        .paths()
        .iter()
        .map(|p| p.file_name().unwrap().to_string_lossy().to_string())
        .collect();
    assert_eq!(names, vec!["a.png", "b.jpg", "c.png", "e.png"]);
    assert_eq!(all.load(0).unwrap().get_pixel(1, 1)[0], b'a');

    let sampled = GlobSequence::new(&pattern, 1, 2).unwrap();
    assert_eq!(sampled.len(), 2);
    assert!(sampled.paths()[0].ends_with("b.jpg"));
    assert!(sampled.paths()[1].ends_with("e.png"));
    assert!(matches!(sampled.load(2), Err(BenchError::FrameOutOfRange(2))));
}

#[test]
fn test_in_memory_source() {
    let images = vec![GrayImage::new(2, 2), GrayImage::new(3, 3)];
    assert_eq!(FrameSource::len(&images), 2);
    assert_eq!(images.load(1).unwrap().dimensions(), (3, 3));
    assert!(images.load(2).is_err());
}
