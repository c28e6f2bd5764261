//! The decision engine.
//!
//! Events drive a small state machine over one explicitly owned
//! [`GestureContext`]:
//!
//! ```text
//! IDLE ──entry──▶ ENTERED ──press──▶ TRACKING ──release/cancel──▶ IDLE
//!   └─────────────press──────────────▲    │ ▲
//!                                         └─┘ move
//! ```
//!
//! [`transition`] is the pure step function. When a gesture finishes,
//! [`analyze_gesture`] turns it into an [`AnalysisResult`], and
//! [`DecisionEngine`] publishes that result on its [`ResultBus`].

use crate::collector::types::{EventPoint, GestureEvent, ModalityHint};
use crate::config::EngineConfig;
use crate::core::bus::{ResultBus, Subscription};
use crate::core::features::{FeatureVector, TrajectoryFeatures};
use crate::core::modality::{classify_modality, InputType, ModalityProfile, ModalityScores};
use crate::core::scorer;
use crate::core::stats;
use crate::core::stream::{EntryAnchor, GestureContext, Phase, PointStream, Sample};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

/// Decision times are never reported below this (ms).
pub const DECISION_FLOOR_MS: f64 = 100.0;

/// Decision times at or above this are not suspicious (ms).
const DECISION_RELAXED_MS: f64 = 250.0;

/// Bounding box of the protected control, in page pixels.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TargetBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

impl TargetBounds {
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (f64, f64) {
        (self.x + self.width / 2.0, self.y + self.height / 2.0)
    }

    /// Effective target width for Fitts's law.
    pub fn min_side(&self) -> f64 {
        self.width.min(self.height).max(0.0)
    }

    fn is_usable(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
            && self.width >= 0.0
            && self.height >= 0.0
    }
}

/// Resolves the protected control's geometry.
pub trait TargetGeometry: Send {
    fn bounds(&self) -> Option<TargetBounds>;
}

impl TargetGeometry for TargetBounds {
    fn bounds(&self) -> Option<TargetBounds> {
        Some(*self)
    }
}

impl<F> TargetGeometry for F
where
    F: Fn() -> Option<TargetBounds> + Send,
{
    fn bounds(&self) -> Option<TargetBounds> {
        self()
    }
}

/// Errors raised while building an engine.
#[derive(Debug)]
pub enum EngineError {
    /// The geometry accessor could not resolve the protected control
    MissingTarget,
    InvalidConfig(String),
}

impl std::fmt::Display for EngineError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EngineError::MissingTarget => write!(f, "Target element geometry is unavailable"),
            EngineError::InvalidConfig(e) => write!(f, "Invalid engine configuration: {e}"),
        }
    }
}

impl std::error::Error for EngineError {}

/// Final binary classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    #[default]
    Human,
    Bot,
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::Human => write!(f, "HUMAN"),
            Verdict::Bot => write!(f, "BOT"),
        }
    }
}

/// How the gesture's modality was settled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModalitySource {
    /// The event source said so
    Hint,
    /// Inferred from the trajectory
    Classified,
    /// Neither; pointer defaults apply
    #[default]
    Fallback,
}

/// Fitts's-law plausibility check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct FittsCheck {
    pub distance: f64,
    pub target_width: f64,
    pub index_of_difficulty: f64,
    pub expected_ms: f64,
    pub actual_ms: f64,
    pub violation: bool,
    pub score: f64,
}

/// Contact duration check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DwellCheck {
    pub duration_ms: f64,
    pub min_ms: f64,
    pub max_ms: f64,
    pub outside_window: bool,
    pub score: f64,
}

/// Entry-to-press reaction check.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct DecisionCheck {
    pub decision_ms: f64,
    /// True when the floor was applied or no entry was seen
    pub floored: bool,
    pub score: f64,
}

/// Diagnostic sub-scores behind a result.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AnalysisDetails {
    pub modality_source: ModalitySource,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub modality_scores: Option<ModalityScores>,
    pub sample_count: usize,
    /// Press and move timestamps behind the timing features
    pub timed_events: usize,
    pub raw_moves: u64,
    pub cancelled: bool,
    pub fitts: FittsCheck,
    pub dwell: DwellCheck,
    pub decision: DecisionCheck,
    pub trajectory: TrajectoryFeatures,
    pub features: FeatureVector,
    /// Linear score before squashing
    pub z: f64,
}

/// What the engine hands to subscribers once per gesture.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub probability: f64,
    pub verdict: Verdict,
    pub input_type: InputType,
    pub threshold_used: f64,
    pub analysis_details: AnalysisDetails,
}

/// A completed gesture, detached from the live context.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FinishedGesture {
    pub entry: Option<EntryAnchor>,
    pub press: Option<EventPoint>,
    /// Release or cancel point
    pub end: EventPoint,
    pub stream: PointStream,
    pub modality: ModalityHint,
    pub raw_moves: u64,
    pub cancelled: bool,
}

/// Why an event did not change the context.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum IgnoreReason {
    /// Move or release without an active press
    NotTracking,
    /// Press or entry while a gesture is live
    AlreadyTracking,
    /// Event from a different surface than the live gesture
    ForeignModality,
    /// Timestamp earlier than the last accepted event
    OutOfOrder,
}

impl std::fmt::Display for IgnoreReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            IgnoreReason::NotTracking => "not tracking",
            IgnoreReason::AlreadyTracking => "already tracking",
            IgnoreReason::ForeignModality => "foreign modality",
            IgnoreReason::OutOfOrder => "out of order",
        };
        f.write_str(s)
    }
}

/// Result of one state transition.
#[derive(Debug, Clone, PartialEq)]
pub enum Step {
    Accepted,
    Ignored(IgnoreReason),
    Finished(FinishedGesture),
}

/// Advance the gesture state machine by one event.
pub fn transition(ctx: &mut GestureContext, event: &GestureEvent, config: &EngineConfig) -> Step {
    match *event {
        GestureEvent::Entry { x, y, t, hint } => {
            if ctx.is_tracking() {
                return Step::Ignored(IgnoreReason::AlreadyTracking);
            }
            ctx.reset();
            ctx.phase = Phase::Entered;
            ctx.entry = Some(EntryAnchor { x, y, t });
            ctx.modality = hint;
            Step::Accepted
        }
        GestureEvent::Press { x, y, t, hint } => {
            if ctx.is_tracking() {
                return Step::Ignored(IgnoreReason::AlreadyTracking);
            }
            let previous = ctx.reset();
            let (modality, locked) = if hint.is_known() {
                (hint, true)
            } else {
                (previous.modality, false)
            };
            let press = EventPoint::new(x, y, t);

            ctx.phase = Phase::Tracking;
            ctx.entry = previous.entry;
            ctx.press = Some(press);
            ctx.modality = modality;
            ctx.modality_locked = locked;
            ctx.last_t = Some(t);
            ctx.stream.push(Sample::from(press));
            Step::Accepted
        }
        GestureEvent::Move { x, y, t, hint } => {
            if !ctx.is_tracking() {
                return Step::Ignored(IgnoreReason::NotTracking);
            }
            if ctx.modality_locked && hint.conflicts_with(ctx.modality) {
                return Step::Ignored(IgnoreReason::ForeignModality);
            }
            if ctx.last_t.is_some_and(|last| t < last) {
                return Step::Ignored(IgnoreReason::OutOfOrder);
            }
            resolve_modality(ctx, hint);

            ctx.raw_moves += 1;
            ctx.last_t = Some(t);
            if ctx.raw_moves % u64::from(config.sample_every.max(1)) == 0 {
                ctx.stream.push(Sample::new(x, y, t));
            } else {
                ctx.stream.mark(t);
            }
            Step::Accepted
        }
        GestureEvent::Release { x, y, t, hint } => {
            if !ctx.is_tracking() {
                return Step::Ignored(IgnoreReason::NotTracking);
            }
            if ctx.modality_locked && hint.conflicts_with(ctx.modality) {
                return Step::Ignored(IgnoreReason::ForeignModality);
            }
            Step::Finished(finish(ctx, x, y, t, hint, false))
        }
        GestureEvent::Cancel { x, y, t, hint } => {
            if !ctx.is_tracking() {
                return Step::Ignored(IgnoreReason::NotTracking);
            }
            Step::Finished(finish(ctx, x, y, t, hint, true))
        }
    }
}

fn resolve_modality(ctx: &mut GestureContext, hint: ModalityHint) {
    if !ctx.modality_locked && hint.is_known() {
        ctx.modality = hint;
        ctx.modality_locked = true;
    }
}

fn finish(
    ctx: &mut GestureContext,
    x: f64,
    y: f64,
    t: f64,
    hint: ModalityHint,
    cancelled: bool,
) -> FinishedGesture {
    resolve_modality(ctx, hint);
    let t = ctx.last_t.map_or(t, |last| t.max(last));
    let done = ctx.reset();
    FinishedGesture {
        entry: done.entry,
        press: done.press,
        end: EventPoint::new(x, y, t),
        stream: done.stream,
        modality: done.modality,
        raw_moves: done.raw_moves,
        cancelled,
    }
}

/// Score a finished gesture. Pure: identical inputs give identical results.
pub fn analyze_gesture(
    gesture: &FinishedGesture,
    target: &TargetBounds,
    config: &EngineConfig,
) -> AnalysisResult {
    let stream = &gesture.stream;

    let (input_type, modality_source, modality_scores) = if gesture.modality.is_known() {
        (InputType::from(gesture.modality), ModalitySource::Hint, None)
    } else {
        let estimate = classify_modality(stream);
        match estimate.input_type {
            InputType::Unknown => (InputType::Unknown, ModalitySource::Fallback, None),
            resolved => (resolved, ModalitySource::Classified, estimate.scores),
        }
    };
    let profile = input_type.profile();

    let trajectory = TrajectoryFeatures::extract(stream, profile);

    let press = gesture
        .press
        .or_else(|| stream.first().map(|s| EventPoint::new(s.x, s.y, s.t)))
        .unwrap_or(gesture.end);
    let decision = check_decision(gesture.entry.as_ref(), &press);
    let dwell = check_dwell(press.t, gesture.end.t, profile);
    let fitts = check_fitts(gesture.entry.as_ref(), &press, gesture.end.t, target, profile);

    let features = FeatureVector {
        fitts: stats::unit(fitts.score, 0.0),
        temporal: trajectory.temporal.score,
        decision: stats::unit(decision.score, 0.0),
        jitter: trajectory.jitter.score,
        dwell: stats::unit(dwell.score, 0.0),
        speed: trajectory.speed.score,
        accel: trajectory.accel.score,
        curvature: trajectory.curvature.score,
        entropy: trajectory.entropy.score,
        pauses: trajectory.pauses.score,
    };

    let score = scorer::score(input_type, &features);
    let threshold_used = config.thresholds.for_input(input_type);
    let verdict = if score.probability > threshold_used {
        Verdict::Bot
    } else {
        Verdict::Human
    };

    AnalysisResult {
        probability: score.probability,
        verdict,
        input_type,
        threshold_used,
        analysis_details: AnalysisDetails {
            modality_source,
            modality_scores,
            sample_count: stream.len(),
            timed_events: stream.timed_len(),
            raw_moves: gesture.raw_moves,
            cancelled: gesture.cancelled,
            fitts,
            dwell,
            decision,
            trajectory,
            features,
            z: score.z,
        },
    }
}

/// `max(press − entry, floor)`; no entry time means no measurable gap.
pub fn check_decision(entry: Option<&EntryAnchor>, press: &EventPoint) -> DecisionCheck {
    let raw = entry.and_then(|e| e.t).map(|entry_t| press.t - entry_t);
    let decision_ms = raw.map_or(DECISION_FLOOR_MS, |gap| gap.max(DECISION_FLOOR_MS));
    let floored = raw.map_or(true, |gap| gap <= DECISION_FLOOR_MS);
    let score = ((DECISION_RELAXED_MS - decision_ms) / 300.0).clamp(0.0, 0.5);
    DecisionCheck {
        decision_ms,
        floored,
        score,
    }
}

pub fn check_dwell(press_t: f64, release_t: f64, profile: &ModalityProfile) -> DwellCheck {
    let duration_ms = (release_t - press_t).max(0.0);
    let outside_window = duration_ms < profile.dwell_min_ms || duration_ms > profile.dwell_max_ms;
    DwellCheck {
        duration_ms,
        min_ms: profile.dwell_min_ms,
        max_ms: profile.dwell_max_ms,
        outside_window,
        score: if outside_window { 1.0 } else { 0.0 },
    }
}

/// Flags gestures that reached the target faster than its difficulty allows.
/// Without an entry position the press stands in for it.
pub fn check_fitts(
    entry: Option<&EntryAnchor>,
    press: &EventPoint,
    end_t: f64,
    target: &TargetBounds,
    profile: &ModalityProfile,
) -> FittsCheck {
    let (start_x, start_y, start_t) = match entry {
        Some(e) => (e.x, e.y, e.t.unwrap_or(press.t)),
        None => (press.x, press.y, press.t),
    };
    let (cx, cy) = target.center();
    let distance = (cx - start_x).hypot(cy - start_y);
    let target_width = target.min_side();

    let index_of_difficulty = (2.0 * distance / (target_width + 1.0) + 1.0).log2().max(0.0);
    let expected_ms = index_of_difficulty / profile.fitts_throughput * 1000.0;
    let actual_ms = (end_t - start_t).max(0.0);
    let violation = actual_ms < profile.fitts_fraction * expected_ms;

    let score = if violation {
        1.0
    } else if expected_ms <= 0.0 {
        0.0
    } else {
        (0.5 * profile.fitts_fraction * expected_ms / actual_ms.max(f64::EPSILON)).min(0.5)
    };

    FittsCheck {
        distance,
        target_width,
        index_of_difficulty,
        expected_ms,
        actual_ms,
        violation,
        score,
    }
}

/// What happened to one event handed to the engine.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Accepted,
    Ignored(IgnoreReason),
    Completed(Box<AnalysisResult>),
}

/// Owns the live gesture, the target accessor and the result subscribers.
pub struct DecisionEngine {
    config: EngineConfig,
    target: Box<dyn TargetGeometry>,
    last_bounds: TargetBounds,
    context: GestureContext,
    bus: ResultBus,
}

impl DecisionEngine {
    /// Build an engine. Fails fast when the target cannot be resolved.
    pub fn new<G>(config: EngineConfig, target: G) -> Result<Self, EngineError>
    where
        G: TargetGeometry + 'static,
    {
        config
            .validate()
            .map_err(|e| EngineError::InvalidConfig(e.to_string()))?;
        let bounds = target
            .bounds()
            .filter(TargetBounds::is_usable)
            .ok_or(EngineError::MissingTarget)?;

        Ok(Self {
            config,
            target: Box::new(target),
            last_bounds: bounds,
            context: GestureContext::new(),
            bus: ResultBus::new(),
        })
    }

    /// Feed one event through the state machine.
    pub fn handle(&mut self, event: GestureEvent) -> Outcome {
        match transition(&mut self.context, &event, &self.config) {
            Step::Accepted => Outcome::Accepted,
            Step::Ignored(reason) => {
                debug!(event = event.kind(), %reason, "event ignored");
                Outcome::Ignored(reason)
            }
            Step::Finished(gesture) => {
                let target = self.current_bounds();
                let result = analyze_gesture(&gesture, &target, &self.config);
                debug!(
                    z = result.analysis_details.z,
                    samples = result.analysis_details.sample_count,
                    "gesture scored"
                );
                info!(
                    verdict = %result.verdict,
                    probability = result.probability,
                    input = ?result.input_type,
                    "gesture analyzed"
                );
                self.bus.emit(&result);
                Outcome::Completed(Box::new(result))
            }
        }
    }

    /// Register a result subscriber.
    pub fn subscribe<F>(&mut self, callback: F) -> Subscription
    where
        F: FnMut(&AnalysisResult) + Send + 'static,
    {
        self.bus.subscribe(callback)
    }

    pub fn bus_mut(&mut self) -> &mut ResultBus {
        &mut self.bus
    }

    pub fn context(&self) -> &GestureContext {
        &self.context
    }

    pub fn phase(&self) -> Phase {
        self.context.phase
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn current_bounds(&mut self) -> TargetBounds {
        match self.target.bounds().filter(TargetBounds::is_usable) {
            Some(bounds) => {
                self.last_bounds = bounds;
                bounds
            }
            None => {
                warn!("target geometry unavailable at finalize, using last known bounds");
                self.last_bounds
            }
        }
    }
}

impl std::fmt::Debug for DecisionEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecisionEngine")
            .field("config", &self.config)
            .field("last_bounds", &self.last_bounds)
            .field("phase", &self.context.phase)
            .field("bus", &self.bus)
            .finish()
    }
}
