//! Input modality resolution.
//!
//! When the host cannot say whether a gesture came from a touch screen or a
//! pointing device, the trajectory itself is used: touch digitizers report
//! with irregular timing, a large contact patch and smooth speed changes,
//! while mice report precisely timed, point-like, sharply varying motion.

use crate::collector::types::ModalityHint;
use crate::core::stats;
use crate::core::stream::{PointStream, MIN_INTERVAL_MS};
use serde::{Deserialize, Serialize};

/// Fewer samples than this cannot be classified.
pub const MIN_CLASSIFY_SAMPLES: usize = 10;

/// Max distance from the centroid (px) above which contact looks touch-like.
pub const CONTACT_AREA_THRESHOLD_PX: f64 = 12.0;

/// Resolved input surface of a gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum InputType {
    Mouse,
    Touch,
    #[default]
    Unknown,
}

impl From<ModalityHint> for InputType {
    fn from(hint: ModalityHint) -> Self {
        match hint {
            ModalityHint::Pointer => InputType::Mouse,
            ModalityHint::Touch => InputType::Touch,
            ModalityHint::Unknown => InputType::Unknown,
        }
    }
}

impl InputType {
    /// Thresholds for this modality. Unknown falls back to the pointer set.
    pub fn profile(self) -> &'static ModalityProfile {
        match self {
            InputType::Touch => &TOUCH_PROFILE,
            InputType::Mouse | InputType::Unknown => &POINTER_PROFILE,
        }
    }
}

/// Modality-dependent constants used by the extractors and the engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModalityProfile {
    pub jitter_cv_threshold: f64,
    pub dwell_min_ms: f64,
    pub dwell_max_ms: f64,
    /// Fitts throughput in bits per second
    pub fitts_throughput: f64,
    /// Fraction of the expected movement time below which a gesture is too fast
    pub fitts_fraction: f64,
    pub accel_min: f64,
    pub accel_max: f64,
}

pub const POINTER_PROFILE: ModalityProfile = ModalityProfile {
    jitter_cv_threshold: 0.08,
    dwell_min_ms: 60.0,
    dwell_max_ms: 1500.0,
    fitts_throughput: 4.9,
    fitts_fraction: 0.30,
    accel_min: 50.0,
    accel_max: 5000.0,
};

pub const TOUCH_PROFILE: ModalityProfile = ModalityProfile {
    jitter_cv_threshold: 0.12,
    dwell_min_ms: 40.0,
    dwell_max_ms: 2500.0,
    fitts_throughput: 3.2,
    fitts_fraction: 0.20,
    accel_min: 50.0,
    accel_max: 6000.0,
};

/// Discriminant values behind a classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityScores {
    pub touch_score: f64,
    pub mouse_score: f64,
    pub interval_cv: f64,
    pub speed_cv: f64,
    pub max_centroid_distance: f64,
}

/// Outcome of trajectory-based classification.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ModalityEstimate {
    pub input_type: InputType,
    /// Absent when there were too few samples to score
    pub scores: Option<ModalityScores>,
}

/// Classify a gesture's surface from its trajectory alone.
pub fn classify_modality(stream: &PointStream) -> ModalityEstimate {
    if stream.len() < MIN_CLASSIFY_SAMPLES {
        return ModalityEstimate::default();
    }

    // Timing jitter
    let interval_cv = stats::coefficient_of_variation(&stream.intervals(MIN_INTERVAL_MS));
    let high_variance = (interval_cv / 0.15).min(1.0);
    let precision = (1.0 - interval_cv / 0.08).max(0.0);

    // Contact area proxy
    let max_centroid_distance = max_centroid_distance(stream);
    let large_contact = max_centroid_distance > CONTACT_AREA_THRESHOLD_PX;
    let (touch_area, point_area) = if large_contact { (1.0, 0.0) } else { (0.0, 1.0) };

    // Speed profile
    let speed_cv = stats::coefficient_of_variation(&stream.speeds_px_per_ms());
    let smooth = (speed_cv / 0.5).min(1.0);
    let sharp = (1.0 - speed_cv / 0.3).max(0.0);
    let low_precision = (speed_cv / 0.6).min(1.0);
    let high_precision = (1.0 - speed_cv / 0.4).max(0.0);

    let touch_score = 0.3 * high_variance + 0.3 * touch_area + 0.2 * smooth + 0.2 * low_precision;
    let mouse_score = 0.3 * precision + 0.3 * point_area + 0.2 * sharp + 0.2 * high_precision;

    let input_type = if touch_score > mouse_score {
        InputType::Touch
    } else {
        InputType::Mouse
    };

    ModalityEstimate {
        input_type,
        scores: Some(ModalityScores {
            touch_score,
            mouse_score,
            interval_cv,
            speed_cv,
            max_centroid_distance,
        }),
    }
}

fn max_centroid_distance(stream: &PointStream) -> f64 {
    let samples = stream.samples();
    if samples.is_empty() {
        return 0.0;
    }
    let n = samples.len() as f64;
    let cx = samples.iter().map(|s| s.x).sum::<f64>() / n;
    let cy = samples.iter().map(|s| s.y).sum::<f64>() / n;
    samples
        .iter()
        .map(|s| (s.x - cx).hypot(s.y - cy))
        .fold(0.0, f64::max)
}
