//! Gesture Sentinel - on-device human/automation classifier for gestures.
//!
//! Each press-to-release gesture on a protected control is scored from its
//! trajectory, timing and target geometry, and classified as `HUMAN` or
//! `BOT` before the host acts on it.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      Gesture Sentinel                        │
//! ├─────────────────────────────────────────────────────────────┤
//! │  ┌─────────────┐   ┌─────────────┐   ┌─────────────┐       │
//! │  │  Collector  │──▶│   Engine    │──▶│  Features   │       │
//! │  │  (events)   │   │ (lifecycle) │   │  + scorer   │       │
//! │  └─────────────┘   └─────────────┘   └─────────────┘       │
//! │                           │                  │              │
//! │                           ▼                  ▼              │
//! │                    ┌─────────────┐   ┌─────────────┐       │
//! │                    │  Audit log  │◀──│ Result bus  │       │
//! │                    └─────────────┘   └─────────────┘       │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Example
//!
//! ```no_run
//! use gesture_sentinel::{
//!     collector::{GestureEvent, ModalityHint},
//!     config::EngineConfig,
//!     core::{DecisionEngine, TargetBounds},
//! };
//!
//! let target = TargetBounds::new(380.0, 280.0, 40.0, 40.0);
//! let mut engine = DecisionEngine::new(EngineConfig::default(), target)
//!     .expect("target is resolvable");
//! engine.subscribe(|result| println!("{} ({:.2})", result.verdict, result.probability));
//!
//! let hint = ModalityHint::Pointer;
//! engine.handle(GestureEvent::entry(100.0, 300.0, 0.0, hint));
//! engine.handle(GestureEvent::press(100.0, 300.0, 420.0, hint));
//! engine.handle(GestureEvent::movement(250.0, 300.0, 600.0, hint));
//! engine.handle(GestureEvent::release(400.0, 300.0, 900.0, hint));
//! ```

pub mod audit;
pub mod collector;
pub mod config;
pub mod core;

// Re-export key types at crate root for convenience
pub use audit::{AuditLog, AuditStats, SharedAuditLog};
pub use collector::{CollectorConfig, CollectorError, GestureEvent, ModalityHint, TraceCollector};
pub use config::{Config, ConfigError, EngineConfig, Thresholds};
pub use core::{
    analyze_gesture, AnalysisResult, DecisionEngine, EngineError, InputType, Outcome,
    ReportBuilder, TargetBounds, Verdict,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
