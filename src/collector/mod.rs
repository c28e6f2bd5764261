//! Event intake for the gesture sentinel.
//!
//! The engine consumes [`GestureEvent`]s; this module defines them and
//! provides a line-oriented source that reads recorded or piped traces.

pub mod trace;
pub mod types;

// Re-export commonly used types
pub use trace::{load_trace, parse_trace, CollectorConfig, CollectorError, TraceCollector};
pub use types::{EventPoint, GestureEvent, ModalityHint};
