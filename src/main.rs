//! Gesture Sentinel CLI
//!
//! Scores recorded or live gesture traces and reports human/bot verdicts.

use anyhow::{bail, Context};
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use gesture_sentinel::{
    audit::{create_shared_log_with_persistence, SharedAuditLog},
    collector::{load_trace, CollectorConfig, GestureEvent, TraceCollector},
    config::Config,
    core::{
        simulate::TraceKind, AnalysisResult, DecisionEngine, Outcome, ReportBuilder,
        TargetBounds, Verdict,
    },
    VERSION,
};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "gesture-sentinel")]
#[command(version = VERSION)]
#[command(about = "Human/automation classifier for pointer and touch gestures", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(long, short, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Score every gesture in a recorded trace (JSON array or JSON lines)
    Analyze {
        file: PathBuf,

        /// Target bounds as x,y,width,height (overrides the config)
        #[arg(long, value_parser = parse_target)]
        target: Option<TargetBounds>,

        /// Keep every Nth move (overrides the config)
        #[arg(long)]
        sample_every: Option<u32>,

        /// Write a report per gesture to the export directory
        #[arg(long)]
        export: bool,
    },

    /// Score gestures read as JSON lines from stdin until EOF or Ctrl+C
    Watch {
        /// Target bounds as x,y,width,height (overrides the config)
        #[arg(long, value_parser = parse_target)]
        target: Option<TargetBounds>,

        /// Write a report per gesture to the export directory
        #[arg(long)]
        export: bool,
    },

    /// Generate a synthetic trace
    Simulate {
        #[arg(long, value_enum, default_value = "human")]
        kind: SimulatedKind,

        #[arg(long, default_value = "0")]
        seed: u64,

        /// Target bounds as x,y,width,height
        #[arg(long, value_parser = parse_target, default_value = "380,280,40,40")]
        target: TargetBounds,

        /// Output file (stdout if omitted)
        #[arg(long, short)]
        output: Option<PathBuf>,
    },

    /// Show cumulative audit totals
    Status,

    /// Show configuration
    Config,
}

#[derive(Clone, Copy, ValueEnum)]
enum SimulatedKind {
    Human,
    Scripted,
}

impl From<SimulatedKind> for TraceKind {
    fn from(kind: SimulatedKind) -> Self {
        match kind {
            SimulatedKind::Human => TraceKind::Human,
            SimulatedKind::Scripted => TraceKind::Scripted,
        }
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose {
        "gesture_sentinel=debug"
    } else {
        "gesture_sentinel=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Analyze {
            file,
            target,
            sample_every,
            export,
        } => cmd_analyze(&file, target, sample_every, export),
        Commands::Watch { target, export } => cmd_watch(target, export),
        Commands::Simulate {
            kind,
            seed,
            target,
            output,
        } => cmd_simulate(kind.into(), seed, &target, output.as_deref()),
        Commands::Status => cmd_status(),
        Commands::Config => cmd_config(),
    }
}

/// Parse `x,y,width,height`.
fn parse_target(value: &str) -> Result<TargetBounds, String> {
    let parts: Vec<f64> = value
        .split(',')
        .map(|p| p.trim().parse::<f64>())
        .collect::<Result<_, _>>()
        .map_err(|e| format!("invalid number in target: {e}"))?;
    match parts.as_slice() {
        &[x, y, width, height] if width >= 0.0 && height >= 0.0 => {
            Ok(TargetBounds::new(x, y, width, height))
        }
        [_, _, _, _] => Err("target width and height must be non-negative".to_string()),
        _ => Err("expected x,y,width,height".to_string()),
    }
}

/// Everything a scoring session needs: engine, audit log and optional export.
struct Session {
    engine: DecisionEngine,
    audit: SharedAuditLog,
    reports: Option<ReportSink>,
    gestures: usize,
    bots: usize,
}

impl Session {
    fn open(config: &Config, target: Option<TargetBounds>, export: bool) -> anyhow::Result<Self> {
        let Some(target) = target.or(config.target) else {
            bail!("No target bounds: pass --target x,y,width,height or set `target` in the config");
        };
        if let Err(e) = config.ensure_directories() {
            eprintln!("Warning: Could not create directories: {e}");
        }

        let engine = DecisionEngine::new(config.engine.clone(), target)
            .context("Failed to start the decision engine")?;
        let audit = create_shared_log_with_persistence(config.audit_log_path());
        let reports = if export {
            Some(ReportSink::create(&config.export_path)?)
        } else {
            None
        };

        Ok(Self {
            engine,
            audit,
            reports,
            gestures: 0,
            bots: 0,
        })
    }

    fn feed(&mut self, event: GestureEvent) -> anyhow::Result<()> {
        let outcome = self.engine.handle(event);
        self.audit.record_outcome(&outcome);

        if let Outcome::Completed(result) = outcome {
            self.gestures += 1;
            if result.verdict == Verdict::Bot {
                self.bots += 1;
            }
            print_result(self.gestures, &result);
            if let Some(sink) = self.reports.as_mut() {
                sink.write(&result)?;
            }
        }
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<()> {
        if let Some(sink) = self.reports.take() {
            let path = sink.finish()?;
            println!("Reports written to {path:?}");
        }
        if let Err(e) = self.audit.save() {
            eprintln!("Warning: Could not save audit log: {e}");
        }

        println!();
        println!(
            "Gestures: {}  Bot verdicts: {}  Human verdicts: {}",
            self.gestures,
            self.bots,
            self.gestures - self.bots
        );
        Ok(())
    }
}

/// JSON-lines report file in the export directory.
struct ReportSink {
    builder: ReportBuilder,
    path: PathBuf,
    writer: BufWriter<std::fs::File>,
}

impl ReportSink {
    fn create(dir: &Path) -> anyhow::Result<Self> {
        let stamp = Utc::now().format("%Y%m%d_%H%M%S");
        let path = dir.join(format!("reports_{stamp}.jsonl"));
        let file = std::fs::File::create(&path)
            .with_context(|| format!("Failed to create report file {path:?}"))?;
        Ok(Self {
            builder: ReportBuilder::new(),
            path,
            writer: BufWriter::new(file),
        })
    }

    fn write(&mut self, result: &AnalysisResult) -> anyhow::Result<()> {
        let report = self.builder.build(result);
        serde_json::to_writer(&mut self.writer, &report)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }

    fn finish(mut self) -> anyhow::Result<PathBuf> {
        self.writer.flush()?;
        Ok(self.path)
    }
}

fn print_result(index: usize, result: &AnalysisResult) {
    let details = &result.analysis_details;
    println!(
        "#{index:<4} {:<5} p={:.3} (threshold {:.2}, {:?}, {}/{} samples{})",
        result.verdict.to_string(),
        result.probability,
        result.threshold_used,
        result.input_type,
        details.sample_count,
        details.timed_events,
        if details.cancelled { ", cancelled" } else { "" }
    );
}

fn cmd_analyze(
    file: &Path,
    target: Option<TargetBounds>,
    sample_every: Option<u32>,
    export: bool,
) -> anyhow::Result<()> {
    let mut config = Config::load().unwrap_or_default();
    if let Some(n) = sample_every {
        config.engine.sample_every = n;
    }

    let events = load_trace(file).with_context(|| format!("Failed to read trace {file:?}"))?;
    println!("Gesture Sentinel v{VERSION}");
    println!("Analyzing {} events from {file:?}", events.len());
    println!();

    let mut session = Session::open(&config, target, export)?;
    for event in events {
        session.feed(event)?;
    }
    if session.engine.context().is_tracking() {
        eprintln!("Warning: trace ended with a gesture still in progress");
    }
    session.finish()
}

fn cmd_watch(target: Option<TargetBounds>, export: bool) -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();
    let mut session = Session::open(&config, target, export)?;

    let running = Arc::new(AtomicBool::new(true));
    ctrlc_handler(running.clone())?;

    let mut collector = TraceCollector::new(CollectorConfig::default());
    collector
        .start(std::io::BufReader::new(std::io::stdin()))
        .context("Failed to start the event reader")?;
    let Some(receiver) = collector.receiver().cloned() else {
        bail!("Event reader did not provide a channel");
    };

    eprintln!("Reading gesture events from stdin. Press Ctrl+C to stop.");

    while running.load(Ordering::SeqCst) {
        match receiver.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => session.feed(event)?,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => continue,
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => break,
        }
    }

    collector.stop();
    if collector.skipped_lines() > 0 {
        eprintln!("Skipped {} malformed lines", collector.skipped_lines());
    }
    session.finish()
}

fn cmd_simulate(
    kind: TraceKind,
    seed: u64,
    target: &TargetBounds,
    output: Option<&Path>,
) -> anyhow::Result<()> {
    let events = kind.generate(seed, target);

    let mut writer: Box<dyn Write> = match output {
        Some(path) => Box::new(BufWriter::new(
            std::fs::File::create(path).with_context(|| format!("Failed to create {path:?}"))?,
        )),
        None => Box::new(std::io::stdout().lock()),
    };
    for event in &events {
        serde_json::to_writer(&mut writer, event)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    if let Some(path) = output {
        eprintln!("Wrote {} events to {path:?}", events.len());
    }
    Ok(())
}

fn cmd_status() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Gesture Sentinel Status");
    println!("=======================");
    println!();
    println!("Configuration:");
    println!(
        "  Pointer threshold: {:.2}",
        config.engine.thresholds.pointer
    );
    println!("  Touch threshold: {:.2}", config.engine.thresholds.touch);
    println!("  Sample every: {} moves", config.engine.sample_every);
    match config.target {
        Some(t) => println!(
            "  Target: {}x{} at ({}, {})",
            t.width, t.height, t.x, t.y
        ),
        None => println!("  Target: not set"),
    }
    println!();

    let audit_path = config.audit_log_path();
    if audit_path.exists() {
        let audit = create_shared_log_with_persistence(audit_path);
        println!("{}", audit.summary());
    } else {
        println!("No previous session data found.");
    }
    Ok(())
}

fn cmd_config() -> anyhow::Result<()> {
    let config = Config::load().unwrap_or_default();

    println!("Configuration");
    println!("=============");
    println!();
    println!("Config file: {:?}", Config::config_path());
    println!();
    println!("{}", serde_json::to_string_pretty(&config)?);
    Ok(())
}

/// Set up Ctrl+C handler.
fn ctrlc_handler(running: Arc<AtomicBool>) -> anyhow::Result<()> {
    ctrlc::set_handler(move || {
        running.store(false, Ordering::SeqCst);
    })
    .context("Error setting Ctrl+C handler")
}
