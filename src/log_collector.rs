//! Decoupled diagnostics logging pipeline.
//!
//! A dedicated writer thread, fed by an unbounded crossbeam channel,
//! persists every diagnostic line to disk regardless of which runtime the
//! line was emitted from. The collector registers as the `log` facade's
//! global logger, so poll failures and wizard transitions reach disk
//! without ever blocking the emitting task.
//!
//! Two streams exist:
//! - `logs/diagnostics/<ts>.log` — everything, for the lifetime of the
//!   process.
//! - `logs/builds/<name>.log` — opened per accepted build via
//!   [`LogCollector::start_new_session`]; receives the same lines until the
//!   next session replaces it.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::Write;
use std::path::PathBuf;

use chrono::Local;
use crossbeam_channel::{unbounded, Sender};
use log::{Level, Log, Metadata, Record};

/// Internal message for the writer thread.
enum LogMessage {
    Line(LogLine),
    NewSession {
        filename: String,
        ack: std::sync::mpsc::Sender<Result<PathBuf, String>>,
    },
    /// Flush marker; the ack fires once every prior line hit disk.
    Flush(std::sync::mpsc::Sender<()>),
}

/// A diagnostic line with metadata.
#[derive(Clone, Debug)]
pub struct LogLine {
    pub message: String,
    pub level: Level,
    pub timestamp: String,
}

impl LogLine {
    pub fn new(level: Level, message: String) -> Self {
        LogLine {
            message,
            level,
            timestamp: Local::now().format("%H:%M:%S%.3f").to_string(),
        }
    }

    fn render(&self) -> String {
        format!("[{}] [{}] {}\n", self.timestamp, self.level, self.message)
    }
}

/// Get the global logs path relative to the current working directory: ./logs
pub fn get_global_logs_path() -> Result<PathBuf, String> {
    let cwd = std::env::current_dir()
        .map_err(|e| format!("Failed to get current working directory: {}", e))?;
    Ok(cwd.join("logs"))
}

/// Unified diagnostics logger with guaranteed disk persistence.
#[derive(Clone)]
pub struct LogCollector {
    tx: Sender<LogMessage>,
    log_dir: PathBuf,
}

impl LogCollector {
    /// Create the collector and spawn its writer thread.
    ///
    /// The writer runs on an OS thread, not a tokio task, so lines emitted
    /// from inside (or outside) any runtime are handled identically.
    pub fn new(log_dir: PathBuf) -> Result<Self, String> {
        let diagnostics_dir = log_dir.join("diagnostics");
        let builds_dir = log_dir.join("builds");
        std::fs::create_dir_all(&diagnostics_dir)
            .map_err(|e| format!("Failed to create diagnostics log dir: {}", e))?;
        std::fs::create_dir_all(&builds_dir)
            .map_err(|e| format!("Failed to create builds log dir: {}", e))?;

        let (tx, rx) = unbounded::<LogMessage>();

        std::thread::spawn(move || {
            let mut handles: HashMap<&'static str, File> = HashMap::new();

            let diagnostics_path = diagnostics_dir.join(format!(
                "forge_{}.log",
                Local::now().format("%Y%m%d_%H%M%S")
            ));
            match OpenOptions::new().create(true).append(true).open(&diagnostics_path) {
                Ok(file) => {
                    handles.insert("diagnostics", file);
                }
                Err(e) => {
                    eprintln!(
                        "[Log] Failed to open diagnostics log {}: {}",
                        diagnostics_path.display(),
                        e
                    );
                }
            }

            while let Ok(message) = rx.recv() {
                match message {
                    LogMessage::Line(line) => {
                        let rendered = line.render();
                        if let Some(file) = handles.get_mut("diagnostics") {
                            let _ = file.write_all(rendered.as_bytes());
                        }
                        if let Some(file) = handles.get_mut("session") {
                            let _ = file.write_all(rendered.as_bytes());
                        }
                    }
                    LogMessage::NewSession { filename, ack } => {
                        let path = builds_dir.join(&filename);
                        let result = OpenOptions::new()
                            .create(true)
                            .append(true)
                            .open(&path)
                            .map(|file| {
                                handles.insert("session", file);
                                path
                            })
                            .map_err(|e| format!("Failed to open session log: {}", e));
                        let _ = ack.send(result);
                    }
                    LogMessage::Flush(ack) => {
                        for file in handles.values_mut() {
                            let _ = file.flush();
                        }
                        let _ = ack.send(());
                    }
                }
            }
        });

        Ok(LogCollector { tx, log_dir })
    }

    pub fn log_dir(&self) -> &PathBuf {
        &self.log_dir
    }

    pub fn log_line(&self, level: Level, message: String) {
        let _ = self.tx.send(LogMessage::Line(LogLine::new(level, message)));
    }

    pub fn log_str(&self, message: &str) {
        self.log_line(Level::Info, message.to_string());
    }

    /// Open a dedicated session log for one accepted build. Subsequent
    /// lines are mirrored into it until the next session starts.
    pub fn start_new_session(&self, filename: &str) -> Result<PathBuf, String> {
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        self.tx
            .send(LogMessage::NewSession {
                filename: filename.to_string(),
                ack: ack_tx,
            })
            .map_err(|e| format!("Log writer thread unavailable: {}", e))?;
        ack_rx
            .recv_timeout(std::time::Duration::from_secs(2))
            .map_err(|_| "Timed out waiting for session log".to_string())?
    }

    /// Block until every line sent so far is on disk.
    pub fn flush_to_disk(&self) -> Result<(), String> {
        let (ack_tx, ack_rx) = std::sync::mpsc::channel();
        self.tx
            .send(LogMessage::Flush(ack_tx))
            .map_err(|e| format!("Log writer thread unavailable: {}", e))?;
        ack_rx
            .recv_timeout(std::time::Duration::from_secs(2))
            .map_err(|_| "Timed out waiting for log flush".to_string())
    }

    /// Generate a unique timestamped session filename for a build.
    pub fn session_filename() -> String {
        format!("build_{}.log", Local::now().format("%Y%m%d_%H%M%S%.3f"))
    }
}

impl Log for LogCollector {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= log::max_level()
    }

    fn log(&self, record: &Record) {
        if self.enabled(record.metadata()) {
            self.log_line(record.level(), format!("[{}] {}", record.target(), record.args()));
        }
    }

    fn flush(&self) {
        let _ = self.flush_to_disk();
    }
}

/// Create a collector and register it as the global logger.
pub fn init_global(log_dir: PathBuf) -> Result<std::sync::Arc<LogCollector>, String> {
    let collector = std::sync::Arc::new(LogCollector::new(log_dir)?);
    log::set_boxed_logger(Box::new((*collector).clone()))
        .map_err(|e| format!("Failed to register global logger: {}", e))?;
    log::set_max_level(log::LevelFilter::Info);
    Ok(collector)
}
