use heat_tracker::core_modules::blob::Blob;
use heat_tracker::core_modules::heatmap::HeatmapAccumulator;
use heat_tracker::core_modules::tracker::CentroidTracker;
use heat_tracker::pipeline::CentroidId;
use heat_tracker::{BBox, ClassifierEnsemble, Detector, DetectorConfig};
use image::{Rgb, RgbImage};

fn blob_around(label: u32, cx: i32, cy: i32) -> Blob {
    Blob::from_box(label, BBox::from_coords(cx - 20, cy - 20, cx + 20, cy + 20))
}

#[test]
fn single_batch_enters_and_leaves_the_heatmap() {
    let mut heat = HeatmapAccumulator::new(64, 64, 60, 3);
    heat.add(vec![BBox::from_coords(10, 10, 20, 20)]);

    for y in 0..64 {
        for x in 0..64 {
            let inside = (10..20).contains(&x) && (10..20).contains(&y);
            assert_eq!(heat.counter(x, y), u32::from(inside), "cell ({x}, {y})");
        }
    }

    for _ in 0..60 {
        heat.add(vec![]);
    }
    let total: u32 = (0..64).flat_map(|y| (0..64).map(move |x| (x, y))).map(|(x, y)| heat.counter(x, y)).sum();
    assert_eq!(total, 0);
}

#[test]
fn confirmed_track_outlives_short_gap_and_dies_after_window() {
    let mut tracker = CentroidTracker::new(&DetectorConfig::default());
    for _ in 0..3 {
        tracker.update(&[blob_around(1, 300, 200)]);
    }

    for _ in 0..5 {
        tracker.update(&[]);
    }
    assert_eq!(tracker.len(), 1);
    assert_eq!(tracker.confirmed().count(), 1);

    for _ in 5..59 {
        tracker.update(&[]);
    }
    assert_eq!(tracker.len(), 1);

    let last = tracker.update(&[]);
    assert_eq!(last.dropped, vec![CentroidId(0)]);
    assert!(tracker.is_empty());
    assert_eq!(tracker.confirmed().count(), 0);
}

#[test]
fn two_blobs_within_radius_update_one_centroid_twice() {
    let mut tracker = CentroidTracker::new(&DetectorConfig::default());
    tracker.update(&[blob_around(1, 500, 300)]);

    let first = blob_around(1, 540, 300);
    let second = blob_around(2, 470, 320);
    let association = tracker.update(&[first.clone(), second.clone()]);

    assert!(association.spawned.is_empty());
    assert_eq!(tracker.len(), 1);
    let centroid = tracker.tracked().next().unwrap();
    assert_eq!(centroid.bounding_box(), second.bounding_box);
    assert_eq!(centroid.previous_box(), first.bounding_box);
    assert_eq!(centroid.activation_count(), 3);
}

#[test]
fn replayed_detections_render_only_confirmed_tracks() {
    let config = DetectorConfig {
        track_thickness: 1,
        ..DetectorConfig::for_frame(320, 240)
    };
    let mut detector = Detector::new(config, ClassifierEnsemble::new()).unwrap();

    let car = BBox::from_coords(100, 80, 160, 140);
    let glitch = BBox::from_coords(250, 20, 280, 50);

    for i in 0..10 {
        let mut hot = vec![car, BBox::from_coords(110, 90, 170, 150)];
        if i == 4 {
            hot.push(glitch);
        }
        let report = detector.track(hot);
        assert!(report.blobs.len() <= 1);
    }

    let mut frame = RgbImage::new(320, 240);
    detector.annotate(&mut frame);

    assert_eq!(detector.tracked().count(), 1);
    let track = detector.confirmed().next().unwrap();
    let draw = track.draw_box();
    assert_eq!(frame.get_pixel(draw.min().x as u32, draw.min().y as u32), &Rgb([0, 0, 255]));
    assert_eq!(frame.get_pixel(265, 35), &Rgb([0, 0, 0]));
}

#[test]
fn track_disappears_once_heat_and_inactivity_window_expire() {
    let config = DetectorConfig {
        history_length: 10,
        max_inactivity: 8,
        ..DetectorConfig::for_frame(200, 200)
    };
    let mut detector = Detector::new(config, ClassifierEnsemble::new()).unwrap();

    for _ in 0..6 {
        detector.track(vec![BBox::from_coords(50, 50, 90, 90)]);
    }
    assert_eq!(detector.confirmed().count(), 1);

    let mut frames = 0;
    while detector.tracked().count() > 0 {
        detector.track(vec![]);
        frames += 1;
        assert!(frames < 100);
    }
    // Heat from the six batches outlives the first empty frames, then eight misses.
    assert!(frames > 8);
    assert!(detector.heatmap().pixels().all(|p| p[0] == 0));
}

#[test]
fn short_history_with_high_threshold_keeps_tracking() {
    let config = DetectorConfig {
        history_length: 4,
        heat_threshold: 10,
        max_inactivity: 8,
        ..DetectorConfig::for_frame(200, 200)
    };
    let mut detector = Detector::new(config, ClassifierEnsemble::new()).unwrap();

    for frame in 0..30 {
        let report = detector.track(vec![BBox::from_coords(50, 50, 90, 90)]);
        if frame >= 3 {
            assert_eq!(report.blobs.len(), 1, "frame {frame}");
        }
    }
    assert_eq!(detector.tracked().count(), 1);
    assert_eq!(detector.confirmed().count(), 1);
    assert_eq!(detector.accumulator().effective_threshold(), 3);
}
