//! Configuration, audit log and trace files on disk.

use gesture_sentinel::audit::AuditLog;
use gesture_sentinel::collector::{load_trace, CollectorError, GestureEvent, ModalityHint};
use gesture_sentinel::config::{Config, ConfigError};
use gesture_sentinel::core::engine::{AnalysisDetails, AnalysisResult, TargetBounds, Verdict};
use gesture_sentinel::core::modality::InputType;
use gesture_sentinel::core::simulate::scripted_trace;
use tempfile::TempDir;

fn bot_result() -> AnalysisResult {
    AnalysisResult {
        probability: 0.91,
        verdict: Verdict::Bot,
        input_type: InputType::Mouse,
        threshold_used: 0.68,
        analysis_details: AnalysisDetails {
            sample_count: 12,
            raw_moves: 60,
            ..AnalysisDetails::default()
        },
    }
}

#[test]
fn config_round_trips_through_disk() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("nested").join("config.json");

    let mut config = Config::default();
    config.engine.sample_every = 3;
    config.engine.thresholds.touch = 0.7;
    config.target = Some(TargetBounds::new(10.0, 20.0, 120.0, 44.0));
    config.data_path = dir.path().join("data");
    config.save_to(&path).unwrap();

    let loaded = Config::load_from(&path).unwrap();
    assert_eq!(loaded.engine, config.engine);
    assert_eq!(loaded.target, config.target);
    assert_eq!(loaded.audit_log_path(), dir.path().join("data").join("audit.json"));
}

#[test]
fn missing_config_yields_defaults() {
    let dir = TempDir::new().unwrap();
    let loaded = Config::load_from(&dir.path().join("absent.json")).unwrap();
    assert_eq!(loaded.engine.sample_every, 5);
    assert!(loaded.target.is_none());
}

#[test]
fn invalid_config_is_rejected() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("config.json");

    let mut config = Config::default();
    config.engine.sample_every = 0;
    config.save_to(&path).unwrap();
    assert!(matches!(Config::load_from(&path), Err(ConfigError::Invalid(_))));

    std::fs::write(&path, "{ not json").unwrap();
    assert!(matches!(Config::load_from(&path), Err(ConfigError::ParseError(_))));
}

#[test]
fn ensure_directories_creates_paths() {
    let dir = TempDir::new().unwrap();
    let mut config = Config::default();
    config.data_path = dir.path().join("data");
    config.export_path = dir.path().join("data").join("reports");

    config.ensure_directories().unwrap();
    assert!(config.export_path.is_dir());
}

#[test]
fn audit_totals_survive_restart() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.json");

    let log = AuditLog::with_persistence(path.clone());
    log.record_result(&bot_result());
    log.record_result(&bot_result());
    log.record_ignored();
    log.save().unwrap();

    let reopened = AuditLog::with_persistence(path);
    let stats = reopened.stats();
    assert_eq!(stats.gestures_analyzed, 2);
    assert_eq!(stats.bot_verdicts, 2);
    assert_eq!(stats.events_ignored, 1);
    assert_eq!(stats.moves_seen, 120);
    assert_eq!(stats.samples_retained, 24);
}

#[test]
fn corrupt_audit_file_starts_from_zero() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("audit.json");
    std::fs::write(&path, "garbage").unwrap();

    let log = AuditLog::with_persistence(path);
    assert_eq!(log.stats().gestures_analyzed, 0);
}

#[test]
fn simulated_trace_loads_back() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("trace.jsonl");
    let events = scripted_trace(9, &TargetBounds::new(380.0, 280.0, 40.0, 40.0));

    let lines: Vec<String> = events
        .iter()
        .map(|e| serde_json::to_string(e).unwrap())
        .collect();
    std::fs::write(&path, lines.join("\n")).unwrap();

    let loaded = load_trace(&path).unwrap();
    assert_eq!(loaded.len(), events.len());
    for (a, b) in loaded.iter().zip(&events) {
        assert_eq!(a.kind(), b.kind());
        let (ta, tb) = (a.timestamp().unwrap(), b.timestamp().unwrap());
        assert!((ta - tb).abs() < 1e-9);
    }
    assert_eq!(loaded[1].hint(), ModalityHint::Pointer);
    assert!(matches!(loaded[0], GestureEvent::Entry { t: Some(_), .. }));
}

#[test]
fn missing_trace_is_an_io_error() {
    let dir = TempDir::new().unwrap();
    let err = load_trace(&dir.path().join("nope.jsonl")).unwrap_err();
    assert!(matches!(err, CollectorError::IoError(_)));
}
