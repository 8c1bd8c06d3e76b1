//! Edge case tests for sampling, smoothing, thresholds and projection


use fishtank_tracking::{
    blob::{Blob, BoundingBox},
    config::Config,
    constants::DEGENERATE_DISTANCE_EPSILON,
    depth::{no_reading, WorldPoint},
    filters::{create_filter, HeadHistory},
    head_locator::sample_scan_line,
    projection::{build_frustum, DisplayPlane},
    segmentation::ThresholdBand,
    tracker::{HeadTracker, TrackerCommand},
};
use test_helpers::{assert_close, assert_projection_finite, FnDepthSource};

#[test]
fn test_scan_line_excludes_invalid_column() {
    let source = FnDepthSource::new(64, 128, |x, _y| {
        if x == 15 {
            no_reading()
        } else {
            WorldPoint::new(x as f32, 100.0, 500.0)
        }
    });
    let blob = Blob {
        centroid: (15.0, 40.0),
        bounding_box: BoundingBox::new(10, 12, 11, 70),
        area: 500,
        hole: false,
    };

    let head = sample_scan_line(&blob, &source, 50, 3000.0).unwrap();

    let columns: Vec<f32> = (10..=14).chain(16..=20).map(|x| x as f32).collect();
    let mean = columns.iter().sum::<f32>() / columns.len() as f32;
    assert_close(head.x, -mean, 1e-4);
    assert_eq!(head.z, 500.0);
}

#[test]
fn test_scan_line_background_bleed_through() {
    // Everything past the cutoff is background
    let source = FnDepthSource::new(64, 128, |x, _y| WorldPoint::new(x as f32 + 1.0, 5.0, 3200.0));
    let blob = Blob {
        centroid: (15.0, 40.0),
        bounding_box: BoundingBox::new(10, 0, 11, 70),
        area: 500,
        hole: false,
    };
    assert!(sample_scan_line(&blob, &source, 50, 3000.0).is_none());
}

#[test]
fn test_sentinel_never_enters_history() {
    let mut history = HeadHistory::new(10);
    for _ in 0..20 {
        history.smooth(no_reading());
    }
    assert!(history.is_empty());

    history.smooth(WorldPoint::new(1.0, 2.0, 3.0));
    history.smooth(no_reading());
    assert_eq!(history.len(), 1);
    assert!(history.iter().all(|p| *p != no_reading()));
}

#[test]
fn test_history_ramps_then_slides() {
    let mut history = HeadHistory::new(10);
    for n in 1..=25usize {
        history.push(WorldPoint::new(n as f32, 0.0, 1.0));
        assert_eq!(history.len(), n.min(10));
    }
    let held: Vec<f32> = history.iter().map(|p| p.x).collect();
    assert_eq!(held, (16..=25).map(|x| x as f32).collect::<Vec<_>>());
    assert_eq!(history.mean().unwrap().x, 20.5);
}

#[test]
fn test_symmetric_frustum_on_central_axis() {
    let plane = DisplayPlane::from_size(300.0, 200.0);
    for z in [100.0, 500.0, 2500.0] {
        let result = build_frustum(&WorldPoint::new(0.0, 0.0, z), &plane, 1.0, 10_000.0);
        assert!(result.frustum.is_symmetric(1e-5), "asymmetric at z={z}: {:?}", result.frustum);
    }
}

#[test]
fn test_eye_on_display_plane() {
    let plane = DisplayPlane::from_size(300.0, 200.0);
    for eye in [
        WorldPoint::new(0.0, 0.0, 0.0),
        WorldPoint::new(150.0, 100.0, 0.0),
        WorldPoint::new(-400.0, 20.0, 0.0),
    ] {
        let result = build_frustum(&eye, &plane, 1.0, 10_000.0);
        assert!(result.clamped);
        assert_eq!(result.distance, DEGENERATE_DISTANCE_EPSILON);
        assert_projection_finite(&result);
    }
}

#[test]
fn test_threshold_keys_saturate() {
    let mut tracker = HeadTracker::from_config(&Config::default()).unwrap();
    for _ in 0..300 {
        tracker.apply(TrackerCommand::NearUp);
        tracker.apply(TrackerCommand::FarDown);
    }
    assert_eq!(tracker.status().near_threshold, 255);
    assert_eq!(tracker.status().far_threshold, 0);

    for _ in 0..600 {
        tracker.apply(TrackerCommand::NearDown);
        tracker.apply(TrackerCommand::FarUp);
    }
    assert_eq!(tracker.status().near_threshold, 0);
    assert_eq!(tracker.status().far_threshold, 255);
}

#[test]
fn test_band_extreme_adjustments() {
    let mut band = ThresholdBand::default();
    band.adjust_near(i32::MAX);
    band.adjust_far(i32::MIN);
    assert_eq!((band.near(), band.far()), (255, 0));
}

#[test]
fn test_filter_extreme_values() {
    let filters = vec!["none", "moving_average:5", "median:5", "exponential:0.8"];

    for filter_str in filters {
        let mut filter = create_filter(filter_str).unwrap();

        let extreme_values = vec![
            WorldPoint::new(f32::INFINITY, f32::NEG_INFINITY, 1.0),
            WorldPoint::new(f32::NAN, f32::NAN, f32::NAN),
            WorldPoint::new(f32::MAX, f32::MIN, 1.0),
            WorldPoint::new(0.0, 0.0, 0.0),
        ];

        for p in extreme_values {
            // Only checking that nothing panics
            let _ = filter.apply(p);
        }
    }
}
