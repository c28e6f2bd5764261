//! Core functionality for the gesture sentinel.
//!
//! This module contains:
//! - The point stream and live gesture context
//! - Feature extraction and modality classification
//! - Scoring, the decision engine and result delivery
//! - Report building and synthetic trace generation

pub mod bus;
pub mod engine;
pub mod features;
pub mod modality;
pub mod report;
pub mod scorer;
pub mod simulate;
pub mod stats;
pub mod stream;

// Re-export commonly used types
pub use bus::{ResultBus, ScopedSubscription, Subscription};
pub use engine::{
    analyze_gesture, transition, AnalysisDetails, AnalysisResult, DecisionEngine, EngineError,
    FinishedGesture, IgnoreReason, Outcome, Step, TargetBounds, TargetGeometry, Verdict,
};
pub use features::{FeatureName, FeatureVector, TrajectoryFeatures};
pub use modality::{classify_modality, InputType, ModalityEstimate};
pub use report::{GestureReport, ReportBuilder, REPORT_VERSION, PRODUCER_NAME};
pub use scorer::{ModelWeights, Score};
pub use stream::{GestureContext, Phase, PointStream, Sample};
