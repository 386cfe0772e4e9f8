use approx::assert_relative_eq;
use ballspeed::bbox::BBox;
use ballspeed::extension::{collect_track, DetectionDump, Extension};
use ballspeed::frame::read_frames;
use ballspeed::{Detection, EstimatorConfig, Frame, Track, TrackId, VelocityEstimator};

const FPS: f64 = 30.0;

fn config() -> EstimatorConfig {
    EstimatorConfig::from_json(r#"{"smooth_window": 1}"#).unwrap()
}

fn ball_frames(
    estimator: &VelocityEstimator,
    track_id: TrackId,
    frames: usize,
    distance: impl Fn(f64) -> f64,
) -> Vec<Frame> {
    let calc = estimator.distance_calculator();

    (0..frames)
        .map(|i| {
            let ts = i as f64 / FPS;
            let side = calc.distance_to_pixel_diameter(distance(ts)) as f32;
            let (x, y) = (400.0 + 10.0 * i as f32, 300.0);

            Frame::new(
                ts,
                vec![Detection::new(track_id, BBox::ltrb(x, y, x + side, y + side))],
            )
        })
        .collect()
}

fn merge(a: Vec<Frame>, b: Vec<Frame>) -> Vec<Frame> {
    a.into_iter()
        .zip(b)
        .map(|(mut a, b)| {
            a.detections.extend(b.detections);
            a
        })
        .collect()
}

#[test]
fn serve_from_detections_file() {
    let estimator = VelocityEstimator::new(&config()).unwrap();
    let frames = ball_frames(&estimator, 1, 30, |t| 10.0 - 13.636 * t);

    let mut dump = DetectionDump::new(Vec::new());
    dump.before_processing("serve.mp4").unwrap();
    for frame in &frames {
        dump.process_frame(frame).unwrap();
    }
    dump.after_processing().unwrap();

    let text = dump.into_inner();
    let parsed = read_frames(text.as_slice()).unwrap();
    let track = collect_track("serve.mp4", parsed, &mut []).unwrap();

    assert_eq!(track.len(), 30);
    assert_relative_eq!(
        estimator.estimate_velocity(&track),
        1.1 * 3.6 * 13.636,
        epsilon = 0.05
    );
}

#[test]
fn frames_without_ball_are_dropped() {
    let estimator = VelocityEstimator::new(&config()).unwrap();
    let mut frames = ball_frames(&estimator, 1, 50, |t| 14.0 - 9.0 * t);

    // detector lost the ball for a few irregular frames
    for idx in [7, 8, 21, 33, 34, 35] {
        frames[idx].detections.clear();
    }

    let mut extensions: Vec<Box<dyn Extension>> = Vec::new();
    let track = collect_track("rally.mp4", frames, &mut extensions).unwrap();

    assert_eq!(track.len(), 44);
    assert_relative_eq!(estimator.estimate_velocity(&track), 1.1 * 3.6 * 9.0, epsilon = 1e-2);
}

#[test]
fn misfire_identity_does_not_win() {
    let estimator = VelocityEstimator::new(&config()).unwrap();

    let ball = ball_frames(&estimator, 1, 45, |t| 18.0 - 7.5 * t);
    // a static head detected as a ball, jittering in size
    let head = ball_frames(&estimator, 2, 45, |t| 6.0 + 0.05 * (t * 40.0).sin());

    let track = Track::from_frames(merge(head, ball));

    assert_eq!(track.track_ids().len(), 2);
    assert_relative_eq!(estimator.estimate_velocity(&track), 1.1 * 3.6 * 7.5, epsilon = 1e-2);
}

#[test]
fn no_confident_measurement() {
    let estimator = VelocityEstimator::new(&config()).unwrap();
    let frames = ball_frames(&estimator, 4, 40, |_| 9.0);

    assert_eq!(estimator.estimate_velocity(&Track::from_frames(frames)), 0.0);
}

#[test]
fn estimation_is_reproducible() {
    let estimator = VelocityEstimator::default();
    let frames = ball_frames(&estimator, 1, 60, |t| {
        16.0 - 11.0 * t + if (t * FPS) as usize % 7 == 0 { 0.4 } else { 0.0 }
    });
    let track = Track::from_frames(frames);

    let first = estimator.estimate_velocity(&track);
    let second = estimator.estimate_velocity(&track);

    assert_eq!(first.to_bits(), second.to_bits());
}
