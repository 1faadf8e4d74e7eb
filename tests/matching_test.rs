use feature_tracking_benchmark::BenchError;
use feature_tracking_benchmark::algorithms::{
    BruteForceMatcher, DescriptorMatcher, DistanceNorm, IndexedMatcher, SelectionPolicy,
};
use feature_tracking_benchmark::detected_points::{Keypoint, Match};
use feature_tracking_benchmark::frame_buffer::{Frame, FrameBuffer};
use feature_tracking_benchmark::stages::{MatchingStage, select_matches};
use feature_tracking_benchmark::types::DescriptorMatrix;
use image::GrayImage;
use rand::prelude::*;
use rand_chacha::ChaCha8Rng;

fn binary(rows: &[[u8; 4]]) -> DescriptorMatrix {
    DescriptorMatrix::Binary {
        bytes_per_row: 4,
        data: rows.iter().flatten().copied().collect(),
    }
}

fn random_binary(rng: &mut ChaCha8Rng, rows: usize, bytes: usize) -> DescriptorMatrix {
    DescriptorMatrix::Binary {
        bytes_per_row: bytes,
        data: (0..rows * bytes).map(|_| rng.random()).collect(),
    }
}

fn random_float(rng: &mut ChaCha8Rng, rows: usize, dims: usize) -> DescriptorMatrix {
    DescriptorMatrix::Float {
        dims,
        data: (0..rows * dims).map(|_| rng.random_range(0.0..1.0)).collect(),
    }
}

fn described_frame(index: usize, descriptors: DescriptorMatrix) -> Frame {
    let mut frame = Frame::new(index, GrayImage::new(8, 8));
    frame.keypoints = Some(vec![Keypoint::new(1.0, 1.0, 1.0, 7.0); descriptors.rows()]);
    frame.descriptors = Some(descriptors);
    frame
}

#[test]
fn test_ratio_rejects_equal_zero_distances() {
    let candidates = vec![vec![Match::new(0, 0, 0.0), Match::new(0, 1, 0.0)]];
    assert!(select_matches(candidates, SelectionPolicy::default(), 2).is_empty());
}

#[test]
fn test_ratio_threshold() {
    let policy = SelectionPolicy::KnnRatio { threshold: 0.8 };
    let candidates = vec![
        vec![Match::new(0, 3, 1.0), Match::new(0, 4, 2.0)],
        vec![Match::new(1, 1, 1.0), Match::new(1, 2, 1.0)],
        vec![Match::new(2, 0, 4.0), Match::new(2, 1, 5.0)],
        vec![Match::new(3, 5, 7.0)],
        vec![],
    ];
    let selected = select_matches(candidates, policy, 6);
    assert_eq!(selected, vec![Match::new(0, 3, 1.0)]);
}

#[test]
fn test_ratio_single_candidate_needs_single_row_train() {
    let lone = || vec![vec![Match::new(0, 0, 7.0)]];
    let policy = SelectionPolicy::default();
    assert_eq!(select_matches(lone(), policy, 1), vec![Match::new(0, 0, 7.0)]);
    assert!(select_matches(lone(), policy, 2).is_empty());
    assert_eq!(
        select_matches(lone(), SelectionPolicy::NearestNeighbor, 2),
        vec![Match::new(0, 0, 7.0)]
    );
}

#[test]
fn test_indexed_noise_goes_through_ratio_test() {
    let mut rng = ChaCha8Rng::seed_from_u64(3);
    let query = random_binary(&mut rng, 300, 32);
    let train = random_binary(&mut rng, 300, 32);
    let knn = IndexedMatcher::default()
        .knn_match(&query, &train, 2, DistanceNorm::Hamming)
        .unwrap();
    // every query gets a second distance to test against
    assert!(knn.iter().all(|c| c.len() == 2));

    let policy = SelectionPolicy::default();
    for m in select_matches(knn.clone(), policy, train.rows()) {
        let c = &knn[m.query_idx];
        assert!(c[0].distance < 0.8 * c[1].distance);
    }

    // random rows have no distinctive nearest neighbour
    let stage = MatchingStage::new(&BruteForceMatcher, DistanceNorm::Hamming, policy);
    let mut buffer = FrameBuffer::new(2).unwrap();
    buffer.push(described_frame(0, query));
    buffer.push(described_frame(1, train));
    assert_eq!(stage.run(&mut buffer).unwrap().unwrap().match_count, 0);
}

#[test]
fn test_nearest_neighbor_keeps_best() {
    let candidates = vec![
        vec![Match::new(0, 2, 3.0)],
        vec![],
        vec![Match::new(2, 1, 0.0), Match::new(2, 0, 0.0)],
    ];
    let selected = select_matches(candidates, SelectionPolicy::NearestNeighbor, 3);
    assert_eq!(selected, vec![Match::new(0, 2, 3.0), Match::new(2, 1, 0.0)]);
}

#[test]
fn test_brute_force_hamming() {
    let query = binary(&[[0xff, 0, 0, 0], [0, 0, 0, 0x0f]]);
    let train = binary(&[[0, 0, 0, 0], [0xff, 0x01, 0, 0], [0, 0, 0, 0xff]]);
    let knn = BruteForceMatcher
        .knn_match(&query, &train, 2, DistanceNorm::Hamming)
        .unwrap();
    assert_eq!(knn.len(), 2);
    assert_eq!(knn[0], vec![Match::new(0, 1, 1.0), Match::new(0, 0, 8.0)]);
    assert_eq!(knn[1], vec![Match::new(1, 0, 4.0), Match::new(1, 2, 4.0)]);
}

#[test]
fn test_brute_force_l2() {
    let query = DescriptorMatrix::Float {
        dims: 2,
        data: vec![0.0, 0.0],
    };
    let train = DescriptorMatrix::Float {
        dims: 2,
        data: vec![3.0, 4.0, 1.0, 0.0],
    };
    let knn = BruteForceMatcher
        .knn_match(&query, &train, 1, DistanceNorm::L2)
        .unwrap();
    assert_eq!(knn, vec![vec![Match::new(0, 1, 1.0)]]);
}

#[test]
fn test_norm_must_fit_descriptors() {
    let query = binary(&[[1, 2, 3, 4]]);
    let result = BruteForceMatcher.knn_match(&query, &query, 1, DistanceNorm::L2);
    assert!(matches!(
        result,
        Err(BenchError::IncomparableDescriptors { .. })
    ));

    let wide = DescriptorMatrix::Binary {
        bytes_per_row: 8,
        data: vec![0; 8],
    };
    let result = IndexedMatcher::default().knn_match(&query, &wide, 1, DistanceNorm::Hamming);
    assert!(matches!(
        result,
        Err(BenchError::DescriptorWidthMismatch { query: 4, train: 8 })
    ));
}

#[test]
fn test_empty_train_gives_no_candidates() {
    let query = binary(&[[1, 2, 3, 4]]);
    let train = DescriptorMatrix::empty(query.output_type(), 4);
    for matcher in [
        &BruteForceMatcher as &dyn DescriptorMatcher,
        &IndexedMatcher::default(),
    ] {
        let knn = matcher.knn_match(&query, &train, 2, DistanceNorm::Hamming).unwrap();
        assert_eq!(knn.len(), 1);
        assert!(knn[0].is_empty());
    }
}

#[test]
fn test_indexed_finds_identical_binary_rows() {
    let mut rng = ChaCha8Rng::seed_from_u64(7);
    let train = random_binary(&mut rng, 200, 32);
    let knn = IndexedMatcher::default()
        .knn_match(&train, &train, 1, DistanceNorm::Hamming)
        .unwrap();
    for (q, candidates) in knn.iter().enumerate() {
        assert_eq!(candidates[0].train_idx, q);
        assert_eq!(candidates[0].distance, 0.0);
    }
}

#[test]
fn test_indexed_small_float_set_is_exact() {
    let mut rng = ChaCha8Rng::seed_from_u64(11);
    let train = random_float(&mut rng, 6, 16);
    let query = random_float(&mut rng, 20, 16);
    let exact = BruteForceMatcher
        .knn_match(&query, &train, 2, DistanceNorm::L2)
        .unwrap();
    let indexed = IndexedMatcher::default()
        .knn_match(&query, &train, 2, DistanceNorm::L2)
        .unwrap();
    for (e, i) in exact.iter().zip(&indexed) {
        assert_eq!(e.len(), i.len());
        for (a, b) in e.iter().zip(i) {
            assert_eq!(a.train_idx, b.train_idx);
            approx::assert_relative_eq!(a.distance, b.distance, epsilon = 1e-5);
        }
    }
}

#[test]
fn test_stage_needs_two_frames() {
    let stage = MatchingStage::new(
        &BruteForceMatcher,
        DistanceNorm::Hamming,
        SelectionPolicy::NearestNeighbor,
    );
    let mut buffer = FrameBuffer::new(2).unwrap();
    assert_eq!(stage.run(&mut buffer).unwrap(), None);
    buffer.push(described_frame(0, binary(&[[1, 2, 3, 4]])));
    assert_eq!(stage.run(&mut buffer).unwrap(), None);
    assert!(buffer.latest().unwrap().matches.is_none());
}

#[test]
fn test_stage_matches_previous_against_current() {
    let stage = MatchingStage::new(
        &BruteForceMatcher,
        DistanceNorm::Hamming,
        SelectionPolicy::NearestNeighbor,
    );
    let mut buffer = FrameBuffer::new(2).unwrap();
    buffer.push(described_frame(0, binary(&[[0xff, 0, 0, 0], [0, 0, 0, 0]])));
    buffer.push(described_frame(
        1,
        binary(&[[0, 0, 0, 1], [0, 0, 0, 0xff], [0xfe, 0, 0, 0]]),
    ));
    let outcome = stage.run(&mut buffer).unwrap().unwrap();
    assert_eq!(outcome.match_count, 2);
    assert!(outcome.match_time_ms >= 0.0);

    let current = buffer.latest().unwrap();
    let matches = current.matches.as_ref().unwrap();
    assert_eq!(matches, &vec![Match::new(0, 2, 1.0), Match::new(1, 0, 1.0)]);
    for m in matches {
        assert!(m.query_idx < buffer.second_latest().unwrap().keypoints().unwrap().len());
        assert!(m.train_idx < current.keypoints().unwrap().len());
    }
    assert!(buffer.second_latest().unwrap().matches.is_none());
}

#[test]
fn test_stage_without_descriptors_fails() {
    let stage = MatchingStage::new(
        &BruteForceMatcher,
        DistanceNorm::Hamming,
        SelectionPolicy::default(),
    );
    let mut buffer = FrameBuffer::new(2).unwrap();
    buffer.push(described_frame(0, binary(&[[1, 2, 3, 4]])));
    buffer.push(Frame::new(1, GrayImage::new(8, 8)));
    assert!(matches!(
        stage.run(&mut buffer),
        Err(BenchError::MissingDescriptors(1))
    ));
}
