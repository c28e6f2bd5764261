//! Fixed-weight logistic scoring.
//!
//! Two weight presets exist, one per input modality. They are compile-time
//! constants; nothing in the crate adjusts them at runtime.

use crate::core::features::{FeatureName, FeatureVector};
use crate::core::modality::InputType;
use serde::Serialize;

/// Weights and bias of one preset.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ModelWeights {
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
    pub bias: f64,
}

pub const POINTER_WEIGHTS: ModelWeights = ModelWeights {
    fitts: 0.9,
    temporal: 1.4,
    decision: 0.6,
    jitter: 1.4,
    dwell: 0.8,
    speed: 1.0,
    accel: 0.8,
    curvature: 0.9,
    entropy: 0.9,
    pauses: 0.8,
    bias: -4.75,
};

pub const TOUCH_WEIGHTS: ModelWeights = ModelWeights {
    fitts: 0.7,
    temporal: 1.2,
    decision: 0.5,
    jitter: 1.0,
    dwell: 0.6,
    speed: 1.0,
    accel: 0.9,
    curvature: 0.8,
    entropy: 0.8,
    pauses: 0.7,
    bias: -4.1,
};

impl ModelWeights {
    /// Preset for a modality. Unknown uses the pointer preset.
    pub fn for_input(input: InputType) -> &'static ModelWeights {
        match input {
            InputType::Touch => &TOUCH_WEIGHTS,
            InputType::Mouse | InputType::Unknown => &POINTER_WEIGHTS,
        }
    }

    pub fn weight(&self, name: FeatureName) -> f64 {
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
}

/// Raw linear score `z` and its squashed probability.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Score {
    pub z: f64,
    pub probability: f64,
}

/// `bias + Σ weight·feature`.
pub fn linear_score(weights: &ModelWeights, features: &FeatureVector) -> f64 {
    features
        .iter()
        .fold(weights.bias, |z, (name, value)| z + weights.weight(name) * value)
}

pub fn sigmoid(z: f64) -> f64 {
    let z = if z.is_nan() { 0.0 } else { z.clamp(-100.0, 100.0) };
    1.0 / (1.0 + (-z).exp())
}

/// Score a feature vector with the preset for `input`.
pub fn score(input: InputType, features: &FeatureVector) -> Score {
    let z = linear_score(ModelWeights::for_input(input), features);
    Score {
        z,
        probability: sigmoid(z),
    }
}
