//! Verdict audit log.
//!
//! Counts gestures, verdicts and dropped events. Only aggregate counters are
//! kept; trajectories and coordinates never reach this log.

use crate::core::engine::{AnalysisResult, Outcome, Verdict};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tracing::warn;

#[derive(Debug)]
pub struct AuditLog {
    gestures_analyzed: AtomicU64,
    human_verdicts: AtomicU64,
    bot_verdicts: AtomicU64,
    events_ignored: AtomicU64,
    /// Every accepted move, before sampling
    moves_seen: AtomicU64,
    /// Samples that reached the feature extractors
    samples_retained: AtomicU64,
    session_start: DateTime<Utc>,
    persist_path: Option<PathBuf>,
}

impl AuditLog {
    pub fn new() -> Self {
        Self {
            gestures_analyzed: AtomicU64::new(0),
            human_verdicts: AtomicU64::new(0),
            bot_verdicts: AtomicU64::new(0),
            events_ignored: AtomicU64::new(0),
            moves_seen: AtomicU64::new(0),
            samples_retained: AtomicU64::new(0),
            session_start: Utc::now(),
            persist_path: None,
        }
    }

    /// Create an audit log that resumes from, and saves to, `path`.
    pub fn with_persistence(path: PathBuf) -> Self {
        let mut log = Self::new();
        log.persist_path = Some(path);

        if let Err(e) = log.load() {
            warn!(error = %e, "could not load previous audit totals");
        }

        log
    }

    /// Record a finished analysis.
    pub fn record_result(&self, result: &AnalysisResult) {
        self.gestures_analyzed.fetch_add(1, Ordering::Relaxed);
        match result.verdict {
            Verdict::Human => self.human_verdicts.fetch_add(1, Ordering::Relaxed),
            Verdict::Bot => self.bot_verdicts.fetch_add(1, Ordering::Relaxed),
        };
        let details = &result.analysis_details;
        self.moves_seen.fetch_add(details.raw_moves, Ordering::Relaxed);
        self.samples_retained.fetch_add(details.sample_count as u64, Ordering::Relaxed);
    }

    pub fn record_ignored(&self) {
        self.events_ignored.fetch_add(1, Ordering::Relaxed);
    }

    /// Record whatever the engine did with one event.
    pub fn record_outcome(&self, outcome: &Outcome) {
        match outcome {
            Outcome::Accepted => {}
            Outcome::Ignored(_) => self.record_ignored(),
            Outcome::Completed(result) => self.record_result(result),
        }
    }

    pub fn stats(&self) -> AuditStats {
        AuditStats {
            gestures_analyzed: self.gestures_analyzed.load(Ordering::Relaxed),
            human_verdicts: self.human_verdicts.load(Ordering::Relaxed),
            bot_verdicts: self.bot_verdicts.load(Ordering::Relaxed),
            events_ignored: self.events_ignored.load(Ordering::Relaxed),
            moves_seen: self.moves_seen.load(Ordering::Relaxed),
            samples_retained: self.samples_retained.load(Ordering::Relaxed),
            session_start: self.session_start,
            session_duration_secs: (Utc::now() - self.session_start).num_seconds().max(0) as u64,
        }
    }

    /// Get a summary string for display.
    pub fn summary(&self) -> String {
        let stats = self.stats();
        format!(
            "Audit Totals:\n\
             - Gestures analyzed: {}\n\
             - Human verdicts: {}\n\
             - Bot verdicts: {} ({:.1}%)\n\
             - Events ignored: {}\n\
             - Moves seen: {}\n\
             - Samples retained: {}\n\
             - Session duration: {} seconds",
            stats.gestures_analyzed,
            stats.human_verdicts,
            stats.bot_verdicts,
            stats.bot_rate() * 100.0,
            stats.events_ignored,
            stats.moves_seen,
            stats.samples_retained,
            stats.session_duration_secs
        )
    }

    /// Save totals to disk. A log without a path does nothing.
    pub fn save(&self) -> Result<(), std::io::Error> {
        if let Some(ref path) = self.persist_path {
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent)?;
            }

            let stats = self.stats();
            let persisted = PersistedTotals {
                gestures_analyzed: stats.gestures_analyzed,
                human_verdicts: stats.human_verdicts,
                bot_verdicts: stats.bot_verdicts,
                events_ignored: stats.events_ignored,
                moves_seen: stats.moves_seen,
                samples_retained: stats.samples_retained,
                last_updated: Utc::now(),
            };

            let json = serde_json::to_string_pretty(&persisted).map_err(std::io::Error::other)?;
            std::fs::write(path, json)?;
        }
        Ok(())
    }

    fn load(&mut self) -> Result<(), std::io::Error> {
        let Some(ref path) = self.persist_path else {
            return Ok(());
        };
        if !path.exists() {
            return Ok(());
        }

        let content = std::fs::read_to_string(path)?;
        let persisted: PersistedTotals =
            serde_json::from_str(&content).map_err(std::io::Error::other)?;

        self.gestures_analyzed.store(persisted.gestures_analyzed, Ordering::Relaxed);
        self.human_verdicts.store(persisted.human_verdicts, Ordering::Relaxed);
        self.bot_verdicts.store(persisted.bot_verdicts, Ordering::Relaxed);
        self.events_ignored.store(persisted.events_ignored, Ordering::Relaxed);
        self.moves_seen.store(persisted.moves_seen, Ordering::Relaxed);
        self.samples_retained.store(persisted.samples_retained, Ordering::Relaxed);
        Ok(())
    }

    pub fn reset(&self) {
        for counter in [
            &self.gestures_analyzed,
            &self.human_verdicts,
            &self.bot_verdicts,
            &self.events_ignored,
            &self.moves_seen,
            &self.samples_retained,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
    }
}

impl Default for AuditLog {
    fn default() -> Self {
        Self::new()
    }
}

/// Point-in-time copy of the audit counters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditStats {
    pub gestures_analyzed: u64,
    pub human_verdicts: u64,
    pub bot_verdicts: u64,
    pub events_ignored: u64,
    pub moves_seen: u64,
    pub samples_retained: u64,
    pub session_start: DateTime<Utc>,
    pub session_duration_secs: u64,
}

impl AuditStats {
    /// Share of analyzed gestures judged to be bots.
    pub fn bot_rate(&self) -> f64 {
        if self.gestures_analyzed == 0 {
            0.0
        } else {
            self.bot_verdicts as f64 / self.gestures_analyzed as f64
        }
    }
}

#[derive(Debug, Serialize, Deserialize)]
struct PersistedTotals {
    gestures_analyzed: u64,
    human_verdicts: u64,
    bot_verdicts: u64,
    events_ignored: u64,
    #[serde(default)]
    moves_seen: u64,
    #[serde(default)]
    samples_retained: u64,
    last_updated: DateTime<Utc>,
}

/// Thread-safe shared audit log.
pub type SharedAuditLog = Arc<AuditLog>;

pub fn create_shared_log() -> SharedAuditLog {
    Arc::new(AuditLog::new())
}

pub fn create_shared_log_with_persistence(path: PathBuf) -> SharedAuditLog {
    Arc::new(AuditLog::with_persistence(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::engine::{AnalysisDetails, IgnoreReason};
    use crate::core::modality::InputType;

    fn result(verdict: Verdict, samples: usize, moves: u64) -> AnalysisResult {
        AnalysisResult {
            probability: 0.5,
            verdict,
            input_type: InputType::Touch,
            threshold_used: 0.62,
            analysis_details: AnalysisDetails {
                sample_count: samples,
                raw_moves: moves,
                ..AnalysisDetails::default()
            },
        }
    }

    #[test]
    fn test_audit_log_counting() {
        let log = AuditLog::new();
        log.record_result(&result(Verdict::Bot, 12, 55));
        log.record_result(&result(Verdict::Human, 8, 35));
        log.record_outcome(&Outcome::Ignored(IgnoreReason::NotTracking));
        log.record_outcome(&Outcome::Accepted);

        let stats = log.stats();
        assert_eq!(stats.gestures_analyzed, 2);
        assert_eq!(stats.bot_verdicts, 1);
        assert_eq!(stats.human_verdicts, 1);
        assert_eq!(stats.events_ignored, 1);
        assert_eq!(stats.moves_seen, 90);
        assert_eq!(stats.samples_retained, 20);
        assert_eq!(stats.bot_rate(), 0.5);
    }

    #[test]
    fn test_audit_log_reset() {
        let log = AuditLog::new();
        log.record_outcome(&Outcome::Completed(Box::new(result(Verdict::Bot, 3, 3))));
        log.reset();

        let stats = log.stats();
        assert_eq!(stats.gestures_analyzed, 0);
        assert_eq!(stats.bot_rate(), 0.0);
    }

    #[test]
    fn test_summary_format() {
        let summary = AuditLog::new().summary();
        assert!(summary.contains("Gestures analyzed: 0"));
        assert!(summary.contains("Bot verdicts: 0 (0.0%)"));
    }
}
