//! Benchmarks for the per-frame tracking pipeline

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use fishtank_tracking::{
    blob::{BlobFinder, ContourFinder},
    config::Config,
    depth::{
        synthetic::{SwayPath, SyntheticScene},
        DepthSource, WorldPoint,
    },
    filters::create_filter,
    projection::{build_frustum, DisplayPlane},
    segmentation::{segment, SegmentMode, ThresholdBand},
    tracker::HeadTracker,
};

/// Resolutions worth tracking at: full Kinect and a quarter-size stream
const RESOLUTIONS: [(u32, u32); 2] = [(640, 480), (320, 240)];

fn rendered_scene(width: u32, height: u32) -> SyntheticScene {
    let mut scene = SyntheticScene::new(width, height);
    scene.update();
    scene
}

fn bench_segmentation(c: &mut Criterion) {
    let mut group = c.benchmark_group("segmentation");
    let band = ThresholdBand::default();

    for (w, h) in RESOLUTIONS {
        let scene = rendered_scene(w, h);
        for mode in [SegmentMode::Masks, SegmentMode::Exclusive] {
            group.bench_with_input(
                BenchmarkId::new(format!("{mode:?}"), format!("{w}x{h}")),
                scene.depth_frame(),
                |b, frame| b.iter(|| black_box(segment(black_box(frame), &band, mode))),
            );
        }
    }

    group.finish();
}

fn bench_contours(c: &mut Criterion) {
    let mut group = c.benchmark_group("contours");
    let band = ThresholdBand::default();

    for (w, h) in RESOLUTIONS {
        let scene = rendered_scene(w, h);
        let mask = segment(scene.depth_frame(), &band, SegmentMode::Masks);
        let max_area = (w * h / 2) as usize;

        for find_holes in [false, true] {
            group.bench_with_input(
                BenchmarkId::new(if find_holes { "with_holes" } else { "outer_only" }, format!("{w}x{h}")),
                &mask,
                |b, mask| {
                    let mut finder = ContourFinder::new();
                    b.iter(|| black_box(finder.find_blobs(black_box(mask), 50, max_area, 1, find_holes)));
                },
            );
        }
    }

    group.finish();
}

fn bench_tracker_tick(c: &mut Criterion) {
    let mut group = c.benchmark_group("tracker_tick");

    for (w, h) in RESOLUTIONS {
        group.bench_function(format!("sway_{w}x{h}"), |b| {
            let mut tracker = HeadTracker::from_config(&Config::default()).unwrap();
            let mut scene = SyntheticScene::new(w, h).with_motion(SwayPath::default());
            b.iter(|| black_box(tracker.tick(&mut scene)));
        });
    }

    group.finish();
}

fn bench_projection(c: &mut Criterion) {
    let plane = DisplayPlane::from_size(300.0, 200.0);
    let eyes: Vec<WorldPoint> = (0..100)
        .map(|_| {
            WorldPoint::new(
                rand::random::<f32>() * 800.0 - 400.0,
                rand::random::<f32>() * 400.0 - 200.0,
                rand::random::<f32>() * 1500.0 + 300.0,
            )
        })
        .collect();

    c.bench_function("build_frustum_100_eyes", |b| {
        b.iter(|| {
            for eye in &eyes {
                black_box(build_frustum(black_box(eye), &plane, 1.0, 10_000.0));
            }
        });
    });
}

fn bench_filters(c: &mut Criterion) {
    let mut group = c.benchmark_group("filters");

    // Noisy head positions around a viewer 1.1 m out
    let samples: Vec<WorldPoint> = (0..100)
        .map(|i| {
            let t = i as f32 * 0.1;
            WorldPoint::new(
                150.0 * t.sin() + 5.0 * rand::random::<f32>(),
                60.0 + 5.0 * rand::random::<f32>(),
                1100.0 + 40.0 * t.cos() + 10.0 * rand::random::<f32>(),
            )
        })
        .collect();

    for spec in ["none", "moving_average:10", "median:5", "exponential:0.5"] {
        group.bench_with_input(BenchmarkId::new("sequence", spec), &samples, |b, samples| {
            let mut filter = create_filter(spec).unwrap();
            b.iter(|| {
                for p in samples {
                    black_box(filter.apply(black_box(*p)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_segmentation,
    bench_contours,
    bench_tracker_tick,
    bench_projection,
    bench_filters
);
criterion_main!(benches);
