//! Trajectory capture for a single gesture.
//!
//! A gesture's samples live in a [`PointStream`] owned by the one live
//! [`GestureContext`]. The context is replaced wholesale at every gesture
//! boundary so nothing leaks from one gesture into the next.

use crate::collector::types::{EventPoint, ModalityHint};
use serde::{Deserialize, Serialize};

/// Elapsed-time floor for speed and acceleration denominators (ms).
pub const MIN_ELAPSED_MS: f64 = 8.0;

/// Interval floor for timing-regularity statistics (ms).
pub const MIN_INTERVAL_MS: f64 = 0.1;

/// One captured trajectory sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Sample {
    pub x: f64,
    pub y: f64,
    /// Monotonic timestamp in milliseconds
    pub t: f64,
}

impl Sample {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }

    /// Euclidean distance to another sample.
    pub fn distance_to(&self, other: &Sample) -> f64 {
        (other.x - self.x).hypot(other.y - self.y)
    }
}

impl From<EventPoint> for Sample {
    fn from(p: EventPoint) -> Self {
        Self::new(p.x, p.y, p.t)
    }
}

/// Append-only sequence of samples for one gesture.
///
/// Positions may be thinned by the sampling divisor, but the timestamp of
/// every accepted event is kept so timing statistics see the full cadence.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PointStream {
    samples: Vec<Sample>,
    #[serde(default)]
    timing: Vec<f64>,
}

impl PointStream {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a sample. Timestamps earlier than the last recorded one are
    /// raised to it so the stream stays non-decreasing.
    pub fn push(&mut self, mut sample: Sample) {
        sample.t = self.clamp(sample.t);
        self.samples.push(sample);
        self.timing.push(sample.t);
    }

    /// Record the timestamp of an event whose position is not kept.
    pub fn mark(&mut self, t: f64) {
        let t = self.clamp(t);
        self.timing.push(t);
    }

    fn clamp(&self, t: f64) -> f64 {
        self.timing.last().map_or(t, |&last| t.max(last))
    }

    /// Number of retained positional samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Number of recorded timestamps, retained or not.
    pub fn timed_len(&self) -> usize {
        self.timing.len()
    }

    pub fn timestamps(&self) -> &[f64] {
        &self.timing
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn samples(&self) -> &[Sample] {
        &self.samples
    }

    pub fn first(&self) -> Option<&Sample> {
        self.samples.first()
    }

    pub fn last(&self) -> Option<&Sample> {
        self.samples.last()
    }

    /// Time between the first and last recorded event in milliseconds.
    pub fn duration_ms(&self) -> f64 {
        match (self.timing.first(), self.timing.last()) {
            (Some(a), Some(b)) => b - a,
            _ => 0.0,
        }
    }

    /// Gaps between consecutive recorded events, each floored to `floor`.
    pub fn intervals(&self, floor: f64) -> Vec<f64> {
        self.timing
            .windows(2)
            .map(|pair| (pair[1] - pair[0]).max(floor))
            .collect()
    }

    /// Instantaneous speeds in px/ms with time floored to [`MIN_ELAPSED_MS`].
    pub fn speeds_px_per_ms(&self) -> Vec<f64> {
        self.samples
            .windows(2)
            .map(|pair| {
                let elapsed = (pair[1].t - pair[0].t).max(MIN_ELAPSED_MS);
                pair[0].distance_to(&pair[1]) / elapsed
            })
            .collect()
    }

    /// Instantaneous speeds in px/s.
    pub fn speeds_px_per_sec(&self) -> Vec<f64> {
        self.speeds_px_per_ms()
            .into_iter()
            .map(|v| v * 1000.0)
            .collect()
    }

    /// Total travelled distance along the path.
    pub fn path_length(&self) -> f64 {
        self.samples
            .windows(2)
            .map(|pair| pair[0].distance_to(&pair[1]))
            .sum()
    }

    /// Straight-line distance from first to last sample.
    pub fn displacement(&self) -> f64 {
        match (self.samples.first(), self.samples.last()) {
            (Some(a), Some(b)) => a.distance_to(b),
            _ => 0.0,
        }
    }

    pub fn clear(&mut self) {
        self.samples.clear();
        self.timing.clear();
    }
}

impl FromIterator<Sample> for PointStream {
    fn from_iter<I: IntoIterator<Item = Sample>>(iter: I) -> Self {
        let mut stream = PointStream::new();
        for sample in iter {
            stream.push(sample);
        }
        stream
    }
}

/// Where the pointer entered the tracked zone.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EntryAnchor {
    pub x: f64,
    pub y: f64,
    /// Missing when the host could not timestamp the entry
    pub t: Option<f64>,
}

/// Lifecycle phase of the live gesture.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Idle,
    Entered,
    Tracking,
}

/// The single live gesture record.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct GestureContext {
    pub phase: Phase,
    pub entry: Option<EntryAnchor>,
    pub press: Option<EventPoint>,
    pub stream: PointStream,
    /// Resolved or pending input modality
    pub modality: ModalityHint,
    /// Set once the modality came from a contact event and may no longer change
    pub modality_locked: bool,
    /// Every accepted move, including those dropped by the sampling divisor
    pub raw_moves: u64,
    /// Timestamp of the most recent accepted contact event
    pub last_t: Option<f64>,
}

impl GestureContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_tracking(&self) -> bool {
        self.phase == Phase::Tracking
    }

    /// Replace the context with a fresh one, returning the previous state.
    pub fn reset(&mut self) -> GestureContext {
        std::mem::take(self)
    }
}
