use feature_tracking_benchmark::detected_points::Keypoint;
use feature_tracking_benchmark::region::{
    KeypointFilter, RegionOfInterest, filter_keypoints, retain_strongest,
};

fn kp(x: f32, y: f32, response: f32) -> Keypoint {
    Keypoint::new(x, y, response, 7.0)
}

#[test]
fn test_default_region() {
    let roi = RegionOfInterest::default();
    assert_eq!(roi, RegionOfInterest::new(535.0, 180.0, 180.0, 150.0));
}

#[test]
fn test_boundary_is_inclusive() {
    let roi = RegionOfInterest::new(10.0, 20.0, 30.0, 40.0);
    let keypoints = vec![
        kp(10.0, 20.0, 1.0),
        kp(40.0, 60.0, 1.0),
        kp(9.999, 30.0, 1.0),
        kp(20.0, 60.001, 1.0),
    ];
    let filtered = filter_keypoints(&keypoints, &roi);
    assert_eq!(filtered.raw_count, 4);
    assert_eq!(filtered.keypoints, keypoints[..2].to_vec());
}

#[test]
fn test_filter_keeps_order() {
    let roi = RegionOfInterest::new(0.0, 0.0, 100.0, 100.0);
    let keypoints = vec![
        kp(50.0, 50.0, 3.0),
        kp(150.0, 50.0, 9.0),
        kp(10.0, 10.0, 1.0),
        kp(99.0, 1.0, 2.0),
    ];
    let filtered = filter_keypoints(&keypoints, &roi);
    let xs: Vec<f32> = filtered.keypoints.iter().map(|k| k.pt.x).collect();
    assert_eq!(xs, vec![50.0, 10.0, 99.0]);
    assert!(filtered.filtered_count() <= filtered.raw_count);
}

#[test]
fn test_empty_input() {
    let filtered = filter_keypoints(&[], &RegionOfInterest::default());
    assert_eq!(filtered.raw_count, 0);
    assert_eq!(filtered.filtered_count(), 0);
}

#[test]
fn test_retain_strongest_keeps_relative_order() {
    let keypoints = vec![
        kp(0.0, 0.0, 1.0),
        kp(1.0, 0.0, 5.0),
        kp(2.0, 0.0, 3.0),
        kp(3.0, 0.0, 5.0),
        kp(4.0, 0.0, 0.5),
    ];
    let kept = retain_strongest(keypoints.clone(), 2);
    let xs: Vec<f32> = kept.iter().map(|k| k.pt.x).collect();
    assert_eq!(xs, vec![1.0, 3.0]);

    let kept = retain_strongest(keypoints.clone(), 3);
    let xs: Vec<f32> = kept.iter().map(|k| k.pt.x).collect();
    assert_eq!(xs, vec![1.0, 2.0, 3.0]);

    assert_eq!(retain_strongest(keypoints.clone(), 10), keypoints);
}

#[test]
fn test_filter_then_limit() {
    let filter = KeypointFilter::new(Some(RegionOfInterest::new(0.0, 0.0, 10.0, 10.0)), Some(1));
    let out = filter.apply(vec![
        kp(20.0, 20.0, 100.0),
        kp(1.0, 1.0, 2.0),
        kp(2.0, 2.0, 4.0),
    ]);
    assert_eq!(out.raw_count, 3);
    assert_eq!(out.filtered_count(), 1);
    assert_eq!(out.keypoints[0].pt.x, 2.0);
}

#[test]
fn test_default_filter_keeps_everything() {
    let keypoints = vec![kp(-5.0, 3.0, 1.0), kp(5000.0, 3.0, 1.0)];
    let out = KeypointFilter::default().apply(keypoints.clone());
    assert_eq!(out.keypoints, keypoints);
    assert_eq!(out.raw_count, 2);
}
