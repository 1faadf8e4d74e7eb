use feature_tracking_benchmark::BenchError;
use feature_tracking_benchmark::frame_buffer::{DEFAULT_BUFFER_CAPACITY, Frame, FrameBuffer};
use image::{GrayImage, Luma};

fn frame(index: usize) -> Frame {
    Frame::new(index, GrayImage::from_pixel(4, 4, Luma([index as u8])))
}

#[test]
fn test_capacity_below_two_is_rejected() {
    assert!(matches!(FrameBuffer::new(0), Err(BenchError::InvalidCapacity(0))));
    assert!(matches!(FrameBuffer::new(1), Err(BenchError::InvalidCapacity(1))));
    assert!(FrameBuffer::new(DEFAULT_BUFFER_CAPACITY).is_ok());
}

#[test]
fn test_push_evicts_oldest() {
    let mut buffer = FrameBuffer::new(2).unwrap();
    for i in 0..5 {
        buffer.push(frame(i));
        assert!(buffer.len() <= buffer.capacity());
    }
    let indices: Vec<usize> = buffer.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![3, 4]);
    assert_eq!(buffer.latest().unwrap().index, 4);
    assert_eq!(buffer.second_latest().unwrap().index, 3);
}

#[test]
fn test_larger_capacity_keeps_order() {
    let mut buffer = FrameBuffer::new(3).unwrap();
    for i in 0..4 {
        buffer.push(frame(i));
    }
    let indices: Vec<usize> = buffer.iter().map(|f| f.index).collect();
    assert_eq!(indices, vec![1, 2, 3]);
    let (previous, current) = buffer.latest_pair().unwrap();
    assert_eq!((previous.index, current.index), (2, 3));
}

#[test]
fn test_access_on_short_buffer() {
    let mut buffer = FrameBuffer::new(2).unwrap();
    assert!(buffer.is_empty());
    assert!(matches!(buffer.latest(), Err(BenchError::EmptyBuffer)));
    assert!(matches!(buffer.latest_mut(), Err(BenchError::EmptyBuffer)));

    buffer.push(frame(0));
    assert!(matches!(
        buffer.second_latest(),
        Err(BenchError::InsufficientFrames(1))
    ));
    assert!(buffer.latest_pair().is_err());
}

#[test]
fn test_clear_resets_buffer() {
    let mut buffer = FrameBuffer::new(2).unwrap();
    buffer.push(frame(0));
    buffer.push(frame(1));
    buffer.clear();
    assert_eq!(buffer.len(), 0);
    assert_eq!(buffer.capacity(), 2);
}

#[test]
fn test_new_frame_has_no_results() {
    let f = frame(7);
    assert!(matches!(f.keypoints(), Err(BenchError::MissingKeypoints(7))));
    assert!(matches!(f.descriptors(), Err(BenchError::MissingDescriptors(7))));
    assert!(f.matches.is_none());
}
