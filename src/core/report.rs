//! Gesture report envelope.
//!
//! Each report wraps one [`AnalysisResult`] with producer metadata so that
//! exported verdicts can be traced back to the build and process that made
//! them.

use crate::core::engine::{AnalysisResult, Verdict};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

/// The current report format version.
pub const REPORT_VERSION: &str = "1.0";

/// The name of this producer.
pub const PRODUCER_NAME: &str = "gesture-sentinel";

/// Producer metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportProducer {
    pub name: String,
    pub version: String,
    /// Unique instance identifier (UUID)
    pub instance_id: String,
}

/// A single exported verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GestureReport {
    pub report_version: String,
    pub producer: ReportProducer,
    pub gesture_id: String,
    /// RFC3339 timestamp of when the report was built
    pub computed_at_utc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    pub result: AnalysisResult,
    /// Flat summary for log shippers that do not descend into `result`
    pub meta: HashMap<String, serde_json::Value>,
}

impl GestureReport {
    pub fn is_bot(&self) -> bool {
        self.result.verdict == Verdict::Bot
    }
}

/// Builder for gesture reports.
pub struct ReportBuilder {
    instance_id: Uuid,
    session_id: Option<String>,
}

impl ReportBuilder {
    pub fn new() -> Self {
        Self {
            instance_id: Uuid::new_v4(),
            session_id: None,
        }
    }

    /// Tag every report from this builder with a session id.
    pub fn with_session_id(mut self, session_id: String) -> Self {
        self.session_id = Some(session_id);
        self
    }

    pub fn instance_id(&self) -> Uuid {
        self.instance_id
    }

    /// Wrap a result in a new report with a fresh gesture id.
    pub fn build(&self, result: &AnalysisResult) -> GestureReport {
        let details = &result.analysis_details;

        let mut meta = HashMap::new();
        let verdict = serde_json::Value::String(result.verdict.to_string());
        meta.insert("verdict".to_string(), verdict);
        meta.insert("probability".to_string(), number(result.probability));
        meta.insert("sample_count".to_string(), details.sample_count.into());
        meta.insert("timed_events".to_string(), details.timed_events.into());
        meta.insert("raw_moves".to_string(), details.raw_moves.into());
        meta.insert("cancelled".to_string(), details.cancelled.into());

        GestureReport {
            report_version: REPORT_VERSION.to_string(),
            producer: ReportProducer {
                name: PRODUCER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                instance_id: self.instance_id.to_string(),
            },
            gesture_id: Uuid::new_v4().to_string(),
            computed_at_utc: Utc::now().to_rfc3339(),
            session_id: self.session_id.clone(),
            result: result.clone(),
            meta,
        }
    }

    /// Build a report and serialize it as pretty JSON.
    pub fn build_json(&self, result: &AnalysisResult) -> String {
        let report = self.build(result);
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| "{}".to_string())
    }
}

impl Default for ReportBuilder {
    fn default() -> Self {
        Self::new()
    }
}

fn number(value: f64) -> serde_json::Value {
    serde_json::Number::from_f64(value)
        .map(serde_json::Value::Number)
        .unwrap_or(serde_json::Value::Null)
}
