//! End-to-end gesture scenarios.

use gesture_sentinel::collector::{EventPoint, GestureEvent, ModalityHint};
use gesture_sentinel::config::EngineConfig;
use gesture_sentinel::AnalysisResult;
use gesture_sentinel::core::engine::{
    analyze_gesture, DecisionEngine, FinishedGesture, IgnoreReason, ModalitySource, Outcome,
    TargetBounds, Verdict,
};
use gesture_sentinel::core::modality::InputType;
use gesture_sentinel::core::simulate::{human_trace, scripted_trace};
use gesture_sentinel::core::stream::{EntryAnchor, Phase, PointStream, Sample};
use std::sync::{Arc, Mutex};

const P: ModalityHint = ModalityHint::Pointer;
const U: ModalityHint = ModalityHint::Unknown;

fn every_move() -> EngineConfig {
    EngineConfig {
        sample_every: 1,
        ..EngineConfig::default()
    }
}

fn completed(outcome: Outcome) -> AnalysisResult {
    match outcome {
        Outcome::Completed(result) => *result,
        other => panic!("expected a completed gesture, got {other:?}"),
    }
}

fn run_trace(engine: &mut DecisionEngine, events: Vec<GestureEvent>) -> AnalysisResult {
    let mut results = events.into_iter().filter_map(|event| match engine.handle(event) {
        Outcome::Completed(result) => Some(*result),
        _ => None,
    });
    let result = results.next().expect("trace completes one gesture");
    assert!(results.next().is_none());
    result
}

/// A frame-locked straight drag: 60 samples exactly 16.67 ms apart,
/// scored with the default sampling divisor.
#[test]
fn scripted_straight_drag_is_a_bot() {
    let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
    let mut engine = DecisionEngine::new(EngineConfig::default(), target).unwrap();

    let points: Vec<(f64, f64)> = (0..60)
        .map(|i| (100.0 + i as f64 * (300.0 / 59.0), 400.0 + i as f64 * 16.67))
        .collect();

    engine.handle(GestureEvent::entry(100.0, 300.0, 0.0, P));
    engine.handle(GestureEvent::press(points[0].0, 300.0, points[0].1, P));
    for &(x, t) in &points[1..] {
        assert_eq!(engine.handle(GestureEvent::movement(x, 300.0, t, P)), Outcome::Accepted);
    }
    let (x, t) = points[59];
    let result = completed(engine.handle(GestureEvent::release(x, 300.0, t, P)));

    let details = &result.analysis_details;
    // press plus every fifth move, but every timestamp
    assert_eq!(details.sample_count, 12);
    assert_eq!(details.timed_events, 60);
    assert_eq!(details.raw_moves, 59);
    assert!(details.trajectory.jitter.is_white_noise);
    assert!(details.trajectory.temporal.synchronized);
    assert_eq!(result.input_type, InputType::Mouse);
    assert_eq!(result.threshold_used, 0.68);
    assert!(result.probability > 0.68, "p = {}", result.probability);
    assert_eq!(result.verdict, Verdict::Bot);
}

#[test]
fn scripted_straight_drag_without_sampling_is_a_bot() {
    let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
    let mut engine = DecisionEngine::new(every_move(), target).unwrap();

    let result = run_trace(&mut engine, scripted_trace(0, &target));
    assert_eq!(result.analysis_details.sample_count, result.analysis_details.timed_events);
    assert_eq!(result.verdict, Verdict::Bot);
}

#[test]
fn simulated_traces_are_separated_with_default_sampling() {
    let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
    let mut engine = DecisionEngine::new(EngineConfig::default(), target).unwrap();

    for seed in 0..20 {
        let human = run_trace(&mut engine, human_trace(seed, &target));
        let details = &human.analysis_details;
        assert!(details.sample_count < details.timed_events);
        assert!(!details.trajectory.temporal.synchronized, "seed {seed}");
        assert_eq!(human.verdict, Verdict::Human, "seed {seed}: p = {}", human.probability);

        let scripted = run_trace(&mut engine, scripted_trace(seed, &target));
        let temporal = &scripted.analysis_details.trajectory.temporal;
        assert!(temporal.synchronized, "seed {seed}");
        assert_eq!(scripted.analysis_details.trajectory.pauses.count, 0);
        assert_eq!(scripted.verdict, Verdict::Bot, "seed {seed}: p = {}", scripted.probability);
    }
}

/// Irregular timing, right-skewed speeds, three pauses and a wandering heading.
fn human_stream() -> PointStream {
    let iv_base = [
        42.0, 55.0, 38.0, 61.0, 47.0, 52.0, 36.0, 66.0, 44.0, 58.0, 49.0, 40.0, 63.0, 51.0, 45.0,
        57.0, 39.0, 60.0, 48.0, 53.0, 41.0, 64.0, 46.0, 50.0, 37.0, 59.0, 43.0, 56.0, 62.0, 45.0,
        52.0, 38.0, 47.0, 54.0, 41.0, 60.0, 44.0, 49.0, 53.0,
    ];
    let head_off = [
        0.0, 0.6, 0.0, -0.5, 0.0, 0.7, 0.3, 0.0, -0.4, 0.8, 0.0, 0.2, -0.6, 0.0, 0.5, 0.0, -0.3,
        0.9, 0.0, 0.4, -0.5, 0.0, 0.6, 0.0, -0.7, 0.3, 0.0, 0.5, -0.4, 0.0, 0.8, 0.0, -0.3, 0.4,
        0.0, -0.6, 0.5, 0.0, 0.3,
    ];

    let (mut x, mut y, mut t) = (60.0_f64, 320.0_f64, 1000.0_f64);
    let mut stream = PointStream::new();
    stream.push(Sample::new(x, y, t));
    for i in 0..39 {
        let dt = match i {
            4 => 140.0,
            6 => 210.0,
            30 => 170.0,
            _ => iv_base[i],
        };
        let fi = i as f64;
        let speed = 120.0 * (0.55 * (fi * 1.7).sin() + 0.35 * (fi * 0.9).cos()).exp();
        let heading: f64 = -0.45 + head_off[i];
        let step = speed * dt / 1000.0;
        x += step * heading.cos();
        y += step * heading.sin();
        t += dt;
        stream.push(Sample::new(x, y, t));
    }
    stream
}

#[test]
fn natural_drag_is_human() {
    let stream = human_stream();
    assert_eq!(stream.len(), 40);
    let last = *stream.last().unwrap();
    let target = TargetBounds::new(last.x - 20.0, last.y - 20.0, 40.0, 40.0);

    let gesture = FinishedGesture {
        entry: Some(EntryAnchor {
            x: 20.0,
            y: 340.0,
            t: Some(400.0),
        }),
        // 250 ms of contact before release
        press: Some(EventPoint::new(last.x, last.y, last.t - 250.0)),
        end: EventPoint::new(last.x, last.y, last.t),
        stream,
        modality: P,
        raw_moves: 39,
        cancelled: false,
    };
    let result = analyze_gesture(&gesture, &target, &EngineConfig::default());

    let traj = &result.analysis_details.trajectory;
    assert!(traj.speed.skewness > 0.3, "skew = {}", traj.speed.skewness);
    assert!((traj.entropy.normalized - 0.69).abs() < 0.05);
    assert_eq!(traj.pauses.count, 3);
    assert!((0.8..=3.0).contains(&traj.pauses.dispersion));
    assert!(!result.analysis_details.dwell.outside_window);
    assert_eq!(result.input_type, InputType::Mouse);
    assert!(result.probability < 0.68, "p = {}", result.probability);
    assert_eq!(result.verdict, Verdict::Human);
}

#[test]
fn short_unhinted_gesture_falls_back_to_pointer_threshold() {
    let target = TargetBounds::new(200.0, 200.0, 60.0, 30.0);
    let mut engine = DecisionEngine::new(EngineConfig::default(), target).unwrap();

    engine.handle(GestureEvent::entry(150.0, 215.0, 0.0, U));
    engine.handle(GestureEvent::press(150.0, 215.0, 300.0, U));
    for i in 1..=5 {
        let (x, t) = (150.0 + i as f64 * 12.0, 300.0 + i as f64 * 23.0);
        engine.handle(GestureEvent::movement(x, 215.0, t, U));
    }
    let result = completed(engine.handle(GestureEvent::release(212.0, 215.0, 460.0, U)));

    assert_eq!(result.analysis_details.sample_count, 2);
    assert_eq!(result.analysis_details.timed_events, 6);
    assert_eq!(result.input_type, InputType::Unknown);
    assert_eq!(result.analysis_details.modality_source, ModalitySource::Fallback);
    assert_eq!(result.threshold_used, 0.68);
    assert!((0.0..=1.0).contains(&result.probability));
}

#[test]
fn second_press_while_tracking_changes_nothing() {
    let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
    let mut engine = DecisionEngine::new(EngineConfig::default(), target).unwrap();

    engine.handle(GestureEvent::entry(100.0, 300.0, 0.0, P));
    engine.handle(GestureEvent::press(100.0, 300.0, 350.0, P));
    engine.handle(GestureEvent::movement(120.0, 302.0, 370.0, P));
    engine.handle(GestureEvent::movement(150.0, 305.0, 391.0, P));
    let before = engine.context().clone();

    let outcome = engine.handle(GestureEvent::press(400.0, 300.0, 400.0, P));
    assert_eq!(outcome, Outcome::Ignored(IgnoreReason::AlreadyTracking));
    assert_eq!(engine.context(), &before);
    assert_eq!(engine.context().stream.len(), 1);
    assert_eq!(engine.context().stream.timed_len(), 3);
}

#[test]
fn reordered_and_duplicated_events_are_tolerated() {
    let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
    let mut engine = DecisionEngine::new(every_move(), target).unwrap();
    let results = Arc::new(Mutex::new(Vec::new()));
    let sink = results.clone();
    engine.subscribe(move |r| sink.lock().unwrap().push(r.clone()));

    // Stray moves and releases before any press
    assert_eq!(
        engine.handle(GestureEvent::movement(10.0, 10.0, 5.0, P)),
        Outcome::Ignored(IgnoreReason::NotTracking)
    );
    assert_eq!(
        engine.handle(GestureEvent::release(10.0, 10.0, 6.0, P)),
        Outcome::Ignored(IgnoreReason::NotTracking)
    );

    engine.handle(GestureEvent::entry(100.0, 300.0, 0.0, P));
    engine.handle(GestureEvent::press(100.0, 300.0, 400.0, P));
    engine.handle(GestureEvent::movement(140.0, 300.0, 450.0, P));
    // Duplicate delivery of the same move is kept, a stale one is not
    engine.handle(GestureEvent::movement(140.0, 300.0, 450.0, P));
    assert_eq!(
        engine.handle(GestureEvent::movement(120.0, 300.0, 430.0, P)),
        Outcome::Ignored(IgnoreReason::OutOfOrder)
    );
    let result = completed(engine.handle(GestureEvent::release(400.0, 300.0, 900.0, P)));
    assert_eq!(result.analysis_details.sample_count, 3);

    // A duplicated release after completion is ignored
    assert_eq!(
        engine.handle(GestureEvent::release(400.0, 300.0, 900.0, P)),
        Outcome::Ignored(IgnoreReason::NotTracking)
    );
    assert_eq!(engine.phase(), Phase::Idle);
    assert_eq!(results.lock().unwrap().len(), 1);
}

#[test]
fn press_and_immediate_release_scores_without_panicking() {
    let target = TargetBounds::new(0.0, 0.0, 10.0, 10.0);
    let mut engine = DecisionEngine::new(EngineConfig::default(), target).unwrap();

    engine.handle(GestureEvent::press(5.0, 5.0, 100.0, P));
    let result = completed(engine.handle(GestureEvent::release(5.0, 5.0, 100.0, P)));

    let details = &result.analysis_details;
    assert_eq!(details.sample_count, 1);
    assert_eq!(details.trajectory.jitter.cv, 0.2);
    assert!(!details.trajectory.jitter.is_white_noise);
    assert!(details.decision.floored);
    assert!(details.dwell.outside_window);
    assert!(result.probability.is_finite());
}

#[test]
fn cancel_produces_a_result() {
    let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
    let mut engine = DecisionEngine::new(every_move(), target).unwrap();
    engine.handle(GestureEvent::press(100.0, 300.0, 0.0, ModalityHint::Touch));
    engine.handle(GestureEvent::movement(110.0, 300.0, 30.0, ModalityHint::Touch));
    let result = completed(engine.handle(GestureEvent::cancel(110.0, 300.0, 60.0, U)));

    assert!(result.analysis_details.cancelled);
    assert_eq!(result.input_type, InputType::Touch);
    assert_eq!(result.threshold_used, 0.62);
}
