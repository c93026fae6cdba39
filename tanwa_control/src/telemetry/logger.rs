//! Telemetry persistence.
//!
//! Producers hand rendered lines to a bounded queue; a writer thread
//! appends them to `<dir>/<prefix><N>.txt`, where `N` is the lowest index
//! not yet taken when the logger starts. A full queue drops the line.

use crate::config::TelemetryConfig;
use crate::error::TanwaError;
use crate::telemetry::record::RECORD_HEADER;
use parking_lot::Mutex;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::mpsc::{self, SyncSender, TrySendError};
use std::thread::{self, JoinHandle};
use std::time::Duration;
use tracing::{debug, error, info, warn};

/// Destination of rendered telemetry lines.
pub trait RecordSink: Send + Sync {
    /// Offer a line. `false` if it was dropped.
    fn push(&self, line: &str) -> bool;
}

pub struct TelemetryLogger {
    tx: Mutex<Option<SyncSender<String>>>,
    writer: Mutex<Option<JoinHandle<()>>>,
    path: PathBuf,
    dropped: AtomicU64,
}

impl TelemetryLogger {
    /// Open the next free log file and start the writer thread.
    pub fn start(config: &TelemetryConfig) -> Result<Self, TanwaError> {
        let (file, path) = open_with_retries(
            &config.log_dir,
            &config.file_prefix,
            config.mount_retries,
            Duration::from_millis(config.mount_retry_delay_ms),
        )?;
        info!(path = %path.display(), "telemetry log opened");

        let (tx, rx) = mpsc::sync_channel::<String>(config.queue_len);
        let log_path = path.clone();
        let writer = thread::Builder::new()
            .name("telemetry-writer".to_string())
            .spawn(move || {
                let mut out = BufWriter::new(file);
                if let Err(e) = writeln!(out, "{RECORD_HEADER}") {
                    error!(path = %log_path.display(), "header write failed: {e}");
                }
                for line in rx {
                    if let Err(e) = writeln!(out, "{line}").and_then(|()| out.flush()) {
                        error!(path = %log_path.display(), "telemetry write failed: {e}");
                    }
                }
                if let Err(e) = out.flush() {
                    error!(path = %log_path.display(), "final flush failed: {e}");
                }
                debug!("telemetry writer finished");
            })
            .map_err(|e| TanwaError::ResourceExhausted(format!("telemetry writer: {e}")))?;

        Ok(Self {
            tx: Mutex::new(Some(tx)),
            writer: Mutex::new(Some(writer)),
            path,
            dropped: AtomicU64::new(0),
        })
    }

    /// Queue a line without blocking.
    pub fn try_push(&self, line: String) -> bool {
        let tx = self.tx.lock();
        let Some(tx) = tx.as_ref() else {
            return false;
        };
        match tx.try_send(line) {
            Ok(()) => true,
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(dropped, "telemetry queue full, sample dropped");
                false
            }
            Err(TrySendError::Disconnected(_)) => false,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Lines dropped on a full queue so far.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    /// Flush queued lines and stop the writer. Idempotent.
    pub fn shutdown(&self) {
        drop(self.tx.lock().take());
        if let Some(handle) = self.writer.lock().take() {
            if handle.join().is_err() {
                error!("telemetry writer panicked");
            }
        }
    }
}

impl RecordSink for TelemetryLogger {
    fn push(&self, line: &str) -> bool {
        self.try_push(line.to_owned())
    }
}

impl Drop for TelemetryLogger {
    fn drop(&mut self) {
        self.shutdown();
    }
}

fn open_with_retries(
    dir: &Path,
    prefix: &str,
    retries: u32,
    delay: Duration,
) -> Result<(File, PathBuf), TanwaError> {
    let attempts = retries.max(1);
    let mut last = None;
    for attempt in 1..=attempts {
        match open_next(dir, prefix) {
            Ok(opened) => return Ok(opened),
            Err(e) => {
                warn!(attempt, attempts, dir = %dir.display(), "log directory not ready: {e}");
                last = Some(e);
                if attempt < attempts {
                    thread::sleep(delay);
                }
            }
        }
    }
    Err(last.map_or_else(
        || TanwaError::InvalidArgument("no open attempt made".to_string()),
        TanwaError::Io,
    ))
}

/// Create `<prefix><N>.txt` with the lowest free `N`.
fn open_next(dir: &Path, prefix: &str) -> io::Result<(File, PathBuf)> {
    fs::create_dir_all(dir)?;
    for index in 0u32.. {
        let path = dir.join(format!("{prefix}{index}.txt"));
        if path.exists() {
            continue;
        }
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(file) => return Ok((file, path)),
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => continue,
            Err(e) => return Err(e),
        }
    }
    Err(io::Error::other("log file index space exhausted"))
}
