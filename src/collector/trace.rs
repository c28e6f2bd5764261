//! JSON-lines event source.
//!
//! The host page (or a recording of it) writes one [`GestureEvent`] per line.
//! [`TraceCollector`] reads those lines on a background thread and forwards
//! them over a bounded channel, so the decision engine never blocks on I/O.

use crate::collector::types::GestureEvent;
use crossbeam_channel::{bounded, Receiver, Sender};
use std::io::BufRead;
use std::path::Path;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use tracing::{debug, warn};

/// Configuration for the trace collector.
#[derive(Debug, Clone)]
pub struct CollectorConfig {
    /// Capacity of the event channel
    pub channel_capacity: usize,
}

impl Default for CollectorConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 10_000,
        }
    }
}

/// Errors that can occur during event collection.
#[derive(Debug)]
pub enum CollectorError {
    AlreadyRunning,
    SpawnFailed(String),
    IoError(String),
    ParseError { line: usize, message: String },
}

impl std::fmt::Display for CollectorError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CollectorError::AlreadyRunning => write!(f, "Collector is already running"),
            CollectorError::SpawnFailed(e) => write!(f, "Failed to start reader thread: {e}"),
            CollectorError::IoError(e) => write!(f, "IO error: {e}"),
            CollectorError::ParseError { line, message } => {
                write!(f, "Invalid event on line {line}: {message}")
            }
        }
    }
}

impl std::error::Error for CollectorError {}

/// Reads events from a line-oriented source on its own thread.
pub struct TraceCollector {
    config: CollectorConfig,
    receiver: Option<Receiver<GestureEvent>>,
    running: Arc<AtomicBool>,
    skipped: Arc<AtomicU64>,
    handle: Option<JoinHandle<()>>,
}

impl TraceCollector {
    pub fn new(config: CollectorConfig) -> Self {
        Self {
            config,
            receiver: None,
            running: Arc::new(AtomicBool::new(false)),
            skipped: Arc::new(AtomicU64::new(0)),
            handle: None,
        }
    }

    /// Start reading events from `reader`.
    ///
    /// The receiver disconnects once the reader is exhausted or the
    /// collector is stopped.
    pub fn start<R>(&mut self, reader: R) -> Result<(), CollectorError>
    where
        R: BufRead + Send + 'static,
    {
        if self.running.load(Ordering::SeqCst) {
            return Err(CollectorError::AlreadyRunning);
        }

        let (sender, receiver) = bounded(self.config.channel_capacity.max(1));
        let running = self.running.clone();
        let skipped = self.skipped.clone();
        running.store(true, Ordering::SeqCst);

        let handle = std::thread::Builder::new()
            .name("trace-reader".to_string())
            .spawn(move || {
                pump(reader, &sender, &running, &skipped);
                running.store(false, Ordering::SeqCst);
            })
            .map_err(|e| {
                self.running.store(false, Ordering::SeqCst);
                CollectorError::SpawnFailed(e.to_string())
            })?;

        self.receiver = Some(receiver);
        self.handle = Some(handle);
        Ok(())
    }

    /// Stop forwarding events. A read already in progress finishes first.
    pub fn stop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
        // The reader may be parked on a blocking read; let it exit on its own
        self.handle.take();
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Get the receiver for gesture events, once started.
    pub fn receiver(&self) -> Option<&Receiver<GestureEvent>> {
        self.receiver.as_ref()
    }

    /// Try to receive an event without blocking.
    pub fn try_recv(&self) -> Option<GestureEvent> {
        self.receiver.as_ref()?.try_recv().ok()
    }

    /// Lines that could not be parsed and were dropped.
    pub fn skipped_lines(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }
}

impl Drop for TraceCollector {
    fn drop(&mut self) {
        self.stop();
    }
}

fn pump<R: BufRead>(
    reader: R,
    sender: &Sender<GestureEvent>,
    running: &AtomicBool,
    skipped: &AtomicU64,
) {
    for (index, line) in reader.lines().enumerate() {
        if !running.load(Ordering::SeqCst) {
            debug!("trace reader stopped");
            return;
        }
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                warn!(error = %e, "trace read failed");
                return;
            }
        };
        match parse_line(&line) {
            Ok(Some(event)) => {
                if sender.send(event).is_err() {
                    return;
                }
            }
            Ok(None) => {}
            Err(e) => {
                skipped.fetch_add(1, Ordering::Relaxed);
                warn!(line = index + 1, error = %e, "skipping malformed event");
            }
        }
    }
    debug!("trace exhausted");
}

/// Parse one line. Blank lines and `#` comments yield `None`.
pub fn parse_line(line: &str) -> Result<Option<GestureEvent>, serde_json::Error> {
    let trimmed = line.trim();
    if trimmed.is_empty() || trimmed.starts_with('#') {
        return Ok(None);
    }
    serde_json::from_str(trimmed).map(Some)
}

/// Load a whole trace, either a JSON array or JSON lines.
pub fn load_trace(path: &Path) -> Result<Vec<GestureEvent>, CollectorError> {
    let content =
        std::fs::read_to_string(path).map_err(|e| CollectorError::IoError(e.to_string()))?;
    parse_trace(&content)
}

pub fn parse_trace(content: &str) -> Result<Vec<GestureEvent>, CollectorError> {
    if content.trim_start().starts_with('[') {
        return serde_json::from_str(content).map_err(|e| CollectorError::ParseError {
            line: e.line(),
            message: e.to_string(),
        });
    }

    let mut events = Vec::new();
    for (index, line) in content.lines().enumerate() {
        let parsed = parse_line(line).map_err(|e| CollectorError::ParseError {
            line: index + 1,
            message: e.to_string(),
        })?;
        events.extend(parsed);
    }
    Ok(events)
}
