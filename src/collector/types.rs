//! Inbound event types for the gesture sentinel.
//!
//! These are the commands the host's event wiring feeds into the decision
//! engine. Coordinates are page pixels, timestamps are monotonic milliseconds.

use serde::{Deserialize, Serialize};

/// Best-effort hint about which physical surface produced an event.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ModalityHint {
    /// Mouse, trackpad or pen driving a cursor
    Pointer,
    /// Finger on a touch screen
    Touch,
    /// The host could not tell
    #[default]
    Unknown,
}

impl ModalityHint {
    /// Whether the hint carries actual information.
    pub fn is_known(self) -> bool {
        self != ModalityHint::Unknown
    }

    /// Two hints conflict only when both are known and differ.
    pub fn conflicts_with(self, other: ModalityHint) -> bool {
        self.is_known() && other.is_known() && self != other
    }
}

/// Position and time of a contact event.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EventPoint {
    pub x: f64,
    pub y: f64,
    /// Monotonic timestamp in milliseconds
    pub t: f64,
}

impl EventPoint {
    pub fn new(x: f64, y: f64, t: f64) -> Self {
        Self { x, y, t }
    }
}

/// One command in the gesture event stream.
///
/// Entry carries an optional timestamp because some hosts can only report
/// the position of a hover.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum GestureEvent {
    /// Pointer entered the tracked zone (hover or touch-contact start)
    Entry {
        x: f64,
        y: f64,
        #[serde(default)]
        t: Option<f64>,
        #[serde(default)]
        hint: ModalityHint,
    },
    /// Contact began
    Press {
        x: f64,
        y: f64,
        t: f64,
        #[serde(default)]
        hint: ModalityHint,
    },
    /// Pointer moved while in contact
    Move {
        x: f64,
        y: f64,
        t: f64,
        #[serde(default)]
        hint: ModalityHint,
    },
    /// Contact ended normally
    Release {
        x: f64,
        y: f64,
        t: f64,
        #[serde(default)]
        hint: ModalityHint,
    },
    /// Contact was interrupted by the host
    Cancel {
        x: f64,
        y: f64,
        t: f64,
        #[serde(default)]
        hint: ModalityHint,
    },
}

impl GestureEvent {
    pub fn entry(x: f64, y: f64, t: f64, hint: ModalityHint) -> Self {
        GestureEvent::Entry {
            x,
            y,
            t: Some(t),
            hint,
        }
    }

    pub fn press(x: f64, y: f64, t: f64, hint: ModalityHint) -> Self {
        GestureEvent::Press { x, y, t, hint }
    }

    pub fn movement(x: f64, y: f64, t: f64, hint: ModalityHint) -> Self {
        GestureEvent::Move { x, y, t, hint }
    }

    pub fn release(x: f64, y: f64, t: f64, hint: ModalityHint) -> Self {
        GestureEvent::Release { x, y, t, hint }
    }

    pub fn cancel(x: f64, y: f64, t: f64, hint: ModalityHint) -> Self {
        GestureEvent::Cancel { x, y, t, hint }
    }

    /// The modality hint attached to this event.
    pub fn hint(&self) -> ModalityHint {
        match self {
            GestureEvent::Entry { hint, .. }
            | GestureEvent::Press { hint, .. }
            | GestureEvent::Move { hint, .. }
            | GestureEvent::Release { hint, .. }
            | GestureEvent::Cancel { hint, .. } => *hint,
        }
    }

    /// Timestamp of the event, if it has one.
    pub fn timestamp(&self) -> Option<f64> {
        match self {
            GestureEvent::Entry { t, .. } => *t,
            GestureEvent::Press { t, .. }
            | GestureEvent::Move { t, .. }
            | GestureEvent::Release { t, .. }
            | GestureEvent::Cancel { t, .. } => Some(*t),
        }
    }

    /// Position and time of a contact event; `None` for entry.
    pub fn point(&self) -> Option<EventPoint> {
        match self {
            GestureEvent::Entry { .. } => None,
            GestureEvent::Press { x, y, t, .. }
            | GestureEvent::Move { x, y, t, .. }
            | GestureEvent::Release { x, y, t, .. }
            | GestureEvent::Cancel { x, y, t, .. } => Some(EventPoint::new(*x, *y, *t)),
        }
    }

    /// Short lowercase name, used in logs.
    pub fn kind(&self) -> &'static str {
        match self {
            GestureEvent::Entry { .. } => "entry",
            GestureEvent::Press { .. } => "press",
            GestureEvent::Move { .. } => "move",
            GestureEvent::Release { .. } => "release",
            GestureEvent::Cancel { .. } => "cancel",
        }
    }
}
