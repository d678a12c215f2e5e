//! Logging setup
//!
//! Installs a tracing subscriber driven by the `log_level` and `log_file`
//! settings. Console and file output are JSON lines; the file rotates by size.

use crate::config::Settings;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

/// Default maximum log file size (10MB)
pub const DEFAULT_MAX_FILE_SIZE: u64 = 10 * 1024 * 1024;

/// Default number of rotated files kept next to the live one
pub const DEFAULT_MAX_FILES: usize = 5;

/// Log file writer that rotates once the file exceeds a size limit
///
/// `agent.log` is renamed to `agent.log.1`, `agent.log.1` to `agent.log.2`
/// and so on; files past `max_files` are removed.
#[derive(Debug, Clone)]
pub struct RotatingFileWriter {
    state: Arc<Mutex<RotationState>>,
}

#[derive(Debug)]
struct RotationState {
    path: PathBuf,
    file: Option<File>,
    written: u64,
    max_size: u64,
    max_files: usize,
}

impl RotatingFileWriter {
    pub fn new(path: impl AsRef<Path>, max_size: u64, max_files: usize) -> io::Result<Self> {
        let path = path.as_ref().to_path_buf();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }

        let written = fs::metadata(&path).map(|m| m.len()).unwrap_or(0);
        let file = open_append(&path)?;

        Ok(Self {
            state: Arc::new(Mutex::new(RotationState {
                path,
                file: Some(file),
                written,
                max_size,
                max_files,
            })),
        })
    }

    pub fn with_defaults(path: impl AsRef<Path>) -> io::Result<Self> {
        Self::new(path, DEFAULT_MAX_FILE_SIZE, DEFAULT_MAX_FILES)
    }

    fn lock(&self) -> io::Result<MutexGuard<'_, RotationState>> {
        self.state
            .lock()
            .map_err(|_| io::Error::new(io::ErrorKind::Other, "log writer lock poisoned"))
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

impl RotationState {
    fn rotate(&mut self) -> io::Result<()> {
        self.file = None;

        if self.max_files > 0 {
            let oldest = self.numbered(self.max_files);
            if oldest.exists() {
                fs::remove_file(&oldest)?;
            }
            for index in (1..self.max_files).rev() {
                let from = self.numbered(index);
                if from.exists() {
                    fs::rename(&from, self.numbered(index + 1))?;
                }
            }
            if self.path.exists() {
                fs::rename(&self.path, self.numbered(1))?;
            }
        } else if self.path.exists() {
            fs::remove_file(&self.path)?;
        }

        self.file = Some(open_append(&self.path)?);
        self.written = 0;
        Ok(())
    }

    fn numbered(&self, index: usize) -> PathBuf {
        let mut name = self.path.as_os_str().to_owned();
        name.push(format!(".{}", index));
        PathBuf::from(name)
    }
}

impl Write for RotatingFileWriter {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let mut state = self.lock()?;

        if state.written > 0 && state.written + buf.len() as u64 > state.max_size {
            state.rotate()?;
        }

        let file = state
            .file
            .as_mut()
            .ok_or_else(|| io::Error::new(io::ErrorKind::Other, "log file not open"))?;
        let written = file.write(buf)?;
        state.written += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock()?.file.as_mut() {
            Some(file) => file.flush(),
            None => Ok(()),
        }
    }
}

impl<'a> fmt::MakeWriter<'a> for RotatingFileWriter {
    type Writer = RotatingFileWriter;

    fn make_writer(&'a self) -> Self::Writer {
        self.clone()
    }
}

/// Filter from `RUST_LOG` if set, otherwise from the configured level
///
/// Levels are accepted in any case (`INFO`, `info`).
pub fn env_filter(log_level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level_directive(log_level)))
}

fn level_directive(log_level: &str) -> String {
    log_level.trim().to_lowercase()
}

/// Install the global subscriber
///
/// Logs go to stdout, and also to `settings.log_file` unless it is empty.
/// Fails if the log file cannot be opened or a subscriber is already set.
pub fn init_tracing(settings: &Settings) -> anyhow::Result<()> {
    let console_layer = fmt::layer().json().with_filter(env_filter(&settings.log_level));
    let subscriber = tracing_subscriber::registry().with(console_layer);

    if settings.log_file.trim().is_empty() {
        subscriber.try_init()?;
        return Ok(());
    }

    let writer = RotatingFileWriter::with_defaults(&settings.log_file)?;
    let file_layer = fmt::layer()
        .json()
        .with_ansi(false)
        .with_writer(writer)
        .with_filter(env_filter(&settings.log_level));
    subscriber.with(file_layer).try_init()?;

    tracing::debug!(log_file = %settings.log_file, "File logging enabled");
    Ok(())
}
