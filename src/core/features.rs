//! Kinematic feature extraction from a finished point stream.
//!
//! Every extractor is a pure function of the stream and returns its own
//! analysis struct with raw metrics, a `suspicious` flag and a `score` in
//! [0, 1] where 1 means "looks scripted". Streams shorter than an
//! extractor's minimum produce that extractor's `Default`, whose score is
//! [`NEUTRAL_SCORE`].
//!
//! Timing extractors (jitter intervals, pauses, temporal sync) read every
//! recorded timestamp. Kinematic ones read the retained positions only.

use crate::core::modality::ModalityProfile;
use crate::core::stats;
use crate::core::stream::{PointStream, MIN_ELAPSED_MS, MIN_INTERVAL_MS};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::f64::consts::{FRAC_PI_4, FRAC_PI_8, TAU};

/// Score used when there is not enough data to judge.
pub const NEUTRAL_SCORE: f64 = 0.5;

const JITTER_MIN_SAMPLES: usize = 3;
const SPEED_MIN_SAMPLES: usize = 4;
const ACCEL_MIN_SAMPLES: usize = 5;
const CURVATURE_MIN_SAMPLES: usize = 3;
const ENTROPY_MIN_SAMPLES: usize = 3;
const PAUSE_MIN_SAMPLES: usize = 3;
const TEMPORAL_MIN_SAMPLES: usize = 6;

/// Display refresh periods (ms) a frame-locked script tends to hit.
const REFRESH_MULTIPLES_MS: [f64; 3] = [16.67, 33.33, 50.0];
const REFRESH_TOLERANCE_MS: f64 = 1.0;

/// Common input-device report periods (ms): 360, 240, 165, 144, 120, 90, 75, 60, 30, 20 Hz.
const DEVICE_PERIODS_MS: [f64; 10] = [
    2.78, 4.17, 6.06, 6.94, 8.33, 11.11, 13.33, 16.67, 33.33, 50.0,
];
const SYNC_TOLERANCE_MS: f64 = 0.5;

/// Segments shorter than this (px) carry no direction.
const MIN_SEGMENT_PX: f64 = 0.5;

/// Gaps longer than this (ms) count as pauses.
pub const PAUSE_THRESHOLD_MS: f64 = 80.0;
const PAUSE_BIN_MS: f64 = 400.0;
const PAUSE_EPSILON: f64 = 1e-9;

/// Timing regularity and frame locking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct JitterAnalysis {
    /// True when the timing carries the signature of generated input
    pub is_white_noise: bool,
    pub cv: f64,
    /// Variance of instantaneous speed (px²/ms²)
    pub velocity_variance: f64,
    /// Share of intervals landing on a display refresh multiple
    pub refresh_ratio: f64,
    pub score: f64,
}

impl Default for JitterAnalysis {
    fn default() -> Self {
        Self {
            is_white_noise: false,
            cv: 0.2,
            velocity_variance: 0.0,
            refresh_ratio: 0.0,
            score: NEUTRAL_SCORE,
        }
    }
}

pub fn analyze_jitter(stream: &PointStream, profile: &ModalityProfile) -> JitterAnalysis {
    if stream.timed_len() < JITTER_MIN_SAMPLES {
        return JitterAnalysis::default();
    }

    let intervals = stream.intervals(MIN_INTERVAL_MS);
    let cv = stats::coefficient_of_variation(&intervals);
    let velocity_variance = (stream.len() >= JITTER_MIN_SAMPLES)
        .then(|| stats::variance(&stream.speeds_px_per_ms()));
    let refresh_ratio = share(&intervals, |i| {
        REFRESH_MULTIPLES_MS
            .iter()
            .any(|m| (i - m).abs() <= REFRESH_TOLERANCE_MS)
    });

    let too_regular = cv < profile.jitter_cv_threshold;
    let frozen = velocity_variance.is_some_and(|v| v < 1e-3) && cv < 0.2;
    let frame_locked = refresh_ratio > 0.75;
    let is_white_noise = too_regular || frozen || frame_locked;

    let score = if is_white_noise {
        1.0
    } else {
        // cv >= threshold > 0 here
        (0.4 * refresh_ratio / 0.75 + 0.4 * profile.jitter_cv_threshold / cv).min(0.8)
    };

    JitterAnalysis {
        is_white_noise,
        cv,
        velocity_variance: velocity_variance.unwrap_or(0.0),
        refresh_ratio,
        score: stats::unit(score, NEUTRAL_SCORE),
    }
}

/// Shape of the speed distribution.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeedAnalysis {
    pub mean_px_per_sec: f64,
    pub cv: f64,
    pub skewness: f64,
    pub suspicious: bool,
    pub score: f64,
}

impl Default for SpeedAnalysis {
    fn default() -> Self {
        Self {
            mean_px_per_sec: 0.0,
            cv: 0.0,
            skewness: 0.0,
            suspicious: false,
            score: NEUTRAL_SCORE,
        }
    }
}

/// Human ballistic movement has a right-skewed speed distribution with
/// moderate spread.
pub fn analyze_speed(stream: &PointStream) -> SpeedAnalysis {
    if stream.len() < SPEED_MIN_SAMPLES {
        return SpeedAnalysis::default();
    }

    let speeds = stream.speeds_px_per_sec();
    let cv = stats::coefficient_of_variation(&speeds);
    let skewness = stats::skewness(&speeds);

    let skew_part = if skewness > 0.3 {
        0.0
    } else {
        0.5 + (0.3 - skewness).min(0.5)
    };
    let spread_part = if (0.2..=1.5).contains(&cv) { 0.0 } else { 1.0 };
    let score = stats::unit((skew_part + spread_part) / 2.0, NEUTRAL_SCORE);

    SpeedAnalysis {
        mean_px_per_sec: stats::mean(&speeds),
        cv,
        skewness,
        suspicious: score >= 0.5,
        score,
    }
}

/// Acceleration magnitude and smoothness (px/s²).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AccelAnalysis {
    pub peak: f64,
    pub mean: f64,
    pub cv: f64,
    pub out_of_range: bool,
    pub erratic: bool,
    pub score: f64,
}

impl Default for AccelAnalysis {
    fn default() -> Self {
        Self {
            peak: 0.0,
            mean: 0.0,
            cv: 0.0,
            out_of_range: false,
            erratic: false,
            score: NEUTRAL_SCORE,
        }
    }
}

pub fn analyze_acceleration(stream: &PointStream, profile: &ModalityProfile) -> AccelAnalysis {
    if stream.len() < ACCEL_MIN_SAMPLES {
        return AccelAnalysis::default();
    }

    let samples = stream.samples();
    let speeds = stream.speeds_px_per_sec();
    let accels: Vec<f64> = (1..speeds.len())
        .map(|i| {
            let dt_secs = (samples[i + 1].t - samples[i].t).max(MIN_ELAPSED_MS) / 1000.0;
            (speeds[i] - speeds[i - 1]).abs() / dt_secs
        })
        .collect();

    let peak = stats::peak(&accels);
    let cv = stats::coefficient_of_variation(&accels);
    let out_of_range = !(profile.accel_min..=profile.accel_max).contains(&peak);
    let erratic = cv > 2.5;

    let mut score = 0.0;
    if out_of_range {
        score += 0.7;
    }
    if erratic {
        score += 0.4;
    }

    AccelAnalysis {
        peak,
        mean: stats::mean(&accels),
        cv,
        out_of_range,
        erratic,
        score: stats::unit(score, NEUTRAL_SCORE),
    }
}

/// Path bending and directness.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CurvatureAnalysis {
    /// Mean absolute turning angle between segments (radians)
    pub mean_turn: f64,
    pub turn_variance: f64,
    /// Path length over displacement, >= 1
    pub straightness: f64,
    pub suspicious: bool,
    pub score: f64,
}

impl Default for CurvatureAnalysis {
    fn default() -> Self {
        Self {
            mean_turn: 0.0,
            turn_variance: 0.0,
            straightness: 1.0,
            suspicious: false,
            score: NEUTRAL_SCORE,
        }
    }
}

pub fn analyze_curvature(stream: &PointStream) -> CurvatureAnalysis {
    if stream.len() < CURVATURE_MIN_SAMPLES {
        return CurvatureAnalysis::default();
    }

    let segments = segments(stream);
    let turns: Vec<f64> = segments
        .windows(2)
        .map(|pair| {
            let a = pair[0].1.atan2(pair[0].0);
            let b = pair[1].1.atan2(pair[1].0);
            wrap_angle(b - a).abs()
        })
        .collect();

    let mean_turn = stats::mean(&turns);
    let turn_variance = stats::variance(&turns);

    let path: f64 = segments.iter().map(|(dx, dy)| dx.hypot(*dy)).sum();
    let displacement = stream.displacement();
    let straightness = if displacement < 1.0 {
        1.0
    } else {
        path / displacement
    };

    let mut score = 0.0;
    if !(0.2..=1.2).contains(&mean_turn) {
        score += 0.5;
    }
    if turn_variance > 1.5 * mean_turn {
        score += 0.2;
    }
    if straightness < 1.02 {
        score += 0.5;
    }
    let score = stats::unit(score, NEUTRAL_SCORE);

    CurvatureAnalysis {
        mean_turn,
        turn_variance,
        straightness,
        suspicious: score >= 0.5,
        score,
    }
}

/// Shannon entropy of movement direction over 8 compass sectors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DirectionEntropy {
    /// Entropy divided by the maximum for the occupied sector count
    pub normalized: f64,
    pub occupied_bins: usize,
    pub bins: [u32; 8],
    pub suspicious: bool,
    pub score: f64,
}

impl Default for DirectionEntropy {
    fn default() -> Self {
        Self {
            normalized: 0.0,
            occupied_bins: 0,
            bins: [0; 8],
            suspicious: false,
            score: NEUTRAL_SCORE,
        }
    }
}

pub fn analyze_direction_entropy(stream: &PointStream) -> DirectionEntropy {
    if stream.len() < ENTROPY_MIN_SAMPLES {
        return DirectionEntropy::default();
    }

    let mut bins = [0u32; 8];
    for (dx, dy) in segments(stream) {
        let sector = ((dy.atan2(dx) + FRAC_PI_8).rem_euclid(TAU) / FRAC_PI_4) as usize % 8;
        bins[sector] += 1;
    }

    let total: u32 = bins.iter().sum();
    let occupied_bins = bins.iter().filter(|&&b| b > 0).count();
    let normalized = if occupied_bins <= 1 {
        0.0
    } else {
        let entropy: f64 = bins
            .iter()
            .filter(|&&b| b > 0)
            .map(|&b| {
                let p = b as f64 / total as f64;
                -p * p.log2()
            })
            .sum();
        entropy / (occupied_bins as f64).log2()
    };

    let score = if normalized > 0.4 && normalized < 0.95 {
        0.0
    } else if normalized <= 0.4 {
        0.5 + 0.5 * (0.4 - normalized) / 0.4
    } else {
        0.5 + 0.5 * (normalized - 0.95) / 0.05
    };
    let score = stats::unit(score, NEUTRAL_SCORE);

    DirectionEntropy {
        normalized,
        occupied_bins,
        bins,
        suspicious: score >= 0.5,
        score,
    }
}

/// Structure of hesitations within the trajectory.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PauseAnalysis {
    pub count: u32,
    pub mean_duration_ms: f64,
    /// Variance over mean of pause starts per time bin
    pub dispersion: f64,
    pub suspicious: bool,
    pub score: f64,
}

impl Default for PauseAnalysis {
    fn default() -> Self {
        Self {
            count: 0,
            mean_duration_ms: 0.0,
            dispersion: 0.0,
            suspicious: false,
            score: NEUTRAL_SCORE,
        }
    }
}

pub fn analyze_pauses(stream: &PointStream) -> PauseAnalysis {
    if stream.timed_len() < PAUSE_MIN_SAMPLES {
        return PauseAnalysis::default();
    }

    let timestamps = stream.timestamps();
    let pauses: Vec<(f64, f64)> = timestamps
        .windows(2)
        .filter_map(|pair| {
            let gap = pair[1] - pair[0];
            (gap > PAUSE_THRESHOLD_MS).then_some((pair[0], gap))
        })
        .collect();

    if pauses.is_empty() {
        return PauseAnalysis {
            suspicious: true,
            score: 0.7,
            ..PauseAnalysis::default()
        };
    }

    let origin = timestamps[0];
    let starts = pauses.iter().map(|(start, _)| start - origin);
    let dispersion = pause_dispersion(starts, stream.duration_ms());

    let durations: Vec<f64> = pauses.iter().map(|(_, d)| *d).collect();
    let mean_duration_ms = stats::mean(&durations);

    let mut score = 0.0;
    if !(0.8..=3.0).contains(&dispersion) {
        score += 0.5;
    }
    if !(50.0..=500.0).contains(&mean_duration_ms) {
        score += 0.5;
    }
    let score = stats::unit(score, NEUTRAL_SCORE);

    PauseAnalysis {
        count: pauses.len() as u32,
        mean_duration_ms,
        dispersion,
        suspicious: score >= 0.5,
        score,
    }
}

/// Variance over mean of pause starts per [`PAUSE_BIN_MS`] bin. Only
/// occupied bins are stored, so a long-open gesture costs nothing extra.
fn pause_dispersion(starts: impl Iterator<Item = f64>, duration_ms: f64) -> f64 {
    let bin_count = ((duration_ms / PAUSE_BIN_MS).ceil() as u64).max(1);
    let mut occupied: BTreeMap<u64, u32> = BTreeMap::new();
    for offset in starts {
        let bin = ((offset / PAUSE_BIN_MS) as u64).min(bin_count - 1);
        *occupied.entry(bin).or_default() += 1;
    }

    let n = bin_count as f64;
    let total: f64 = occupied.values().map(|&c| f64::from(c)).sum();
    let squares: f64 = occupied.values().map(|&c| f64::from(c).powi(2)).sum();
    let mean = total / n;
    let variance = (squares / n - mean * mean).max(0.0);
    variance / (mean + PAUSE_EPSILON)
}

/// Lock-step timing against device report periods.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemporalSync {
    pub sync_ratio: f64,
    pub interval_cv: f64,
    pub synchronized: bool,
    pub score: f64,
}

impl Default for TemporalSync {
    fn default() -> Self {
        Self {
            sync_ratio: 0.0,
            interval_cv: 0.0,
            synchronized: false,
            score: NEUTRAL_SCORE,
        }
    }
}

pub fn analyze_temporal_sync(stream: &PointStream) -> TemporalSync {
    if stream.timed_len() < TEMPORAL_MIN_SAMPLES {
        return TemporalSync::default();
    }

    let intervals = stream.intervals(MIN_INTERVAL_MS);
    let sync_ratio = share(&intervals, |i| {
        DEVICE_PERIODS_MS.iter().any(|p| {
            (i - p).abs() <= SYNC_TOLERANCE_MS || (i - 2.0 * p).abs() <= SYNC_TOLERANCE_MS
        })
    });
    let interval_cv = stats::coefficient_of_variation(&intervals);
    let synchronized = sync_ratio > 0.65 && interval_cv <= 0.12;

    let score = if synchronized {
        1.0
    } else {
        0.6 * sync_ratio * (1.0 - (interval_cv / 0.5).min(1.0))
    };

    TemporalSync {
        sync_ratio,
        interval_cv,
        synchronized,
        score: stats::unit(score, NEUTRAL_SCORE),
    }
}

/// Everything the extractors derive from the stream alone.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct TrajectoryFeatures {
    pub jitter: JitterAnalysis,
    pub speed: SpeedAnalysis,
    pub accel: AccelAnalysis,
    pub curvature: CurvatureAnalysis,
    pub entropy: DirectionEntropy,
    pub pauses: PauseAnalysis,
    pub temporal: TemporalSync,
}

impl TrajectoryFeatures {
    pub fn extract(stream: &PointStream, profile: &ModalityProfile) -> Self {
        Self {
            jitter: analyze_jitter(stream, profile),
            speed: analyze_speed(stream),
            accel: analyze_acceleration(stream, profile),
            curvature: analyze_curvature(stream),
            entropy: analyze_direction_entropy(stream),
            pauses: analyze_pauses(stream),
            temporal: analyze_temporal_sync(stream),
        }
    }
}

/// Names of the scored dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeatureName {
    Fitts,
    Temporal,
    Decision,
    Jitter,
    Dwell,
    Speed,
    Accel,
    Curvature,
    Entropy,
    Pauses,
}

impl FeatureName {
    pub const ALL: [FeatureName; 10] = [
        FeatureName::Fitts,
        FeatureName::Temporal,
        FeatureName::Decision,
        FeatureName::Jitter,
        FeatureName::Dwell,
        FeatureName::Speed,
        FeatureName::Accel,
        FeatureName::Curvature,
        FeatureName::Entropy,
        FeatureName::Pauses,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FeatureName::Fitts => "fitts",
            FeatureName::Temporal => "temporal",
            FeatureName::Decision => "decision",
            FeatureName::Jitter => "jitter",
            FeatureName::Dwell => "dwell",
            FeatureName::Speed => "speed",
            FeatureName::Accel => "accel",
            FeatureName::Curvature => "curvature",
            FeatureName::Entropy => "entropy",
            FeatureName::Pauses => "pauses",
        }
    }
}

/// Per-dimension suspicion, each in [0, 1].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FeatureVector {
    pub fitts: f64,
    pub temporal: f64,
    pub decision: f64,
    pub jitter: f64,
    pub dwell: f64,
    pub speed: f64,
    pub accel: f64,
    pub curvature: f64,
    pub entropy: f64,
    pub pauses: f64,
}

impl Default for FeatureVector {
    fn default() -> Self {
        Self::uniform(NEUTRAL_SCORE)
    }
}

impl FeatureVector {
    /// Vector with every dimension set to `value`.
    pub fn uniform(value: f64) -> Self {
        Self {
            fitts: value,
            temporal: value,
            decision: value,
            jitter: value,
            dwell: value,
            speed: value,
            accel: value,
            curvature: value,
            entropy: value,
            pauses: value,
        }
    }

    pub fn get(&self, name: FeatureName) -> f64 {
        match name {
            FeatureName::Fitts => self.fitts,
            FeatureName::Temporal => self.temporal,
            FeatureName::Decision => self.decision,
            FeatureName::Jitter => self.jitter,
            FeatureName::Dwell => self.dwell,
            FeatureName::Speed => self.speed,
            FeatureName::Accel => self.accel,
            FeatureName::Curvature => self.curvature,
            FeatureName::Entropy => self.entropy,
            FeatureName::Pauses => self.pauses,
        }
    }

    /// Set one dimension, clamped into [0, 1].
    pub fn set(&mut self, name: FeatureName, value: f64) {
        let value = stats::unit(value, NEUTRAL_SCORE);
        match name {
            FeatureName::Fitts => self.fitts = value,
            FeatureName::Temporal => self.temporal = value,
            FeatureName::Decision => self.decision = value,
            FeatureName::Jitter => self.jitter = value,
            FeatureName::Dwell => self.dwell = value,
            FeatureName::Speed => self.speed = value,
            FeatureName::Accel => self.accel = value,
            FeatureName::Curvature => self.curvature = value,
            FeatureName::Entropy => self.entropy = value,
            FeatureName::Pauses => self.pauses = value,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (FeatureName, f64)> + '_ {
        FeatureName::ALL.iter().map(move |&name| (name, self.get(name)))
    }
}

/// Non-degenerate segment vectors of the path.
fn segments(stream: &PointStream) -> Vec<(f64, f64)> {
    stream
        .samples()
        .windows(2)
        .map(|pair| (pair[1].x - pair[0].x, pair[1].y - pair[0].y))
        .filter(|(dx, dy)| dx.hypot(*dy) > MIN_SEGMENT_PX)
        .collect()
}

fn wrap_angle(mut a: f64) -> f64 {
    while a > std::f64::consts::PI {
        a -= TAU;
    }
    while a < -std::f64::consts::PI {
        a += TAU;
    }
    a
}

fn share(values: &[f64], pred: impl Fn(f64) -> bool) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().filter(|&&v| pred(v)).count() as f64 / values.len() as f64
}
