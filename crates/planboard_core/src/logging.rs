//! Rolling-file diagnostics for the planboard engine.
//!
//! # Responsibility
//! - Start the process-wide file logger once and report its settings.
//! - Record panics as single-line events before the default hook runs.
//!
//! # Invariants
//! - Repeating init with identical settings is a no-op.
//! - Init with different settings after a successful start is an error.
//! - Log lines carry identifiers and counts, never item titles.

use flexi_logger::{Cleanup, Criterion, FileSpec, Logger, LoggerHandle, Naming, WriteMode};
use log::{error, info};
use once_cell::sync::OnceCell;
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::path::{Path, PathBuf};

const LOG_FILE_BASENAME: &str = "planboard";
const MAX_LOG_FILE_SIZE_BYTES: u64 = 5 * 1024 * 1024;
const MAX_LOG_FILES: usize = 3;
const MAX_PANIC_MESSAGE_CHARS: usize = 200;

static ACTIVE_LOGGER: OnceCell<ActiveLogger> = OnceCell::new();
static PANIC_HOOK: OnceCell<()> = OnceCell::new();

struct ActiveLogger {
    settings: LogSettings,
    _handle: LoggerHandle,
}

/// Level and directory of the running file logger.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogSettings {
    pub level: log::LevelFilter,
    pub log_dir: PathBuf,
}

/// Reasons logging could not be started.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoggingError {
    UnknownLevel(String),
    RelativeDirectory(PathBuf),
    CreateDirectory { dir: PathBuf, message: String },
    Backend(String),
    /// A logger with different settings is already running.
    AlreadyStarted { active: LogSettings },
}

impl Display for LoggingError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownLevel(level) => write!(
                f,
                "unknown log level `{level}`; expected trace, debug, info, warn or error"
            ),
            Self::RelativeDirectory(dir) => {
                write!(f, "log directory must be absolute, got `{}`", dir.display())
            }
            Self::CreateDirectory { dir, message } => {
                write!(f, "cannot create log directory `{}`: {message}", dir.display())
            }
            Self::Backend(message) => write!(f, "logger backend failed: {message}"),
            Self::AlreadyStarted { active } => write!(
                f,
                "logging already started at `{}` with level {}",
                active.log_dir.display(),
                active.level
            ),
        }
    }
}

impl Error for LoggingError {}

/// Starts rolling file logs under `log_dir` at `level`.
///
/// # Errors
/// - [`LoggingError::UnknownLevel`] / [`LoggingError::RelativeDirectory`] for bad input.
/// - [`LoggingError::AlreadyStarted`] when a different configuration is active.
/// - Directory and backend failures are reported, never panicked on.
pub fn init_logging(level: &str, log_dir: &Path) -> Result<(), LoggingError> {
    let requested = LogSettings {
        level: parse_level(level)?,
        log_dir: absolute_dir(log_dir)?,
    };

    let active = ACTIVE_LOGGER.get_or_try_init(|| start_logger(requested.clone()))?;
    if active.settings != requested {
        return Err(LoggingError::AlreadyStarted {
            active: active.settings.clone(),
        });
    }
    Ok(())
}

/// Settings of the running logger, if any.
pub fn logging_status() -> Option<LogSettings> {
    ACTIVE_LOGGER.get().map(|active| active.settings.clone())
}

/// `debug` for debug builds, `info` otherwise.
pub fn default_log_level() -> &'static str {
    if cfg!(debug_assertions) {
        "debug"
    } else {
        "info"
    }
}

fn start_logger(settings: LogSettings) -> Result<ActiveLogger, LoggingError> {
    std::fs::create_dir_all(&settings.log_dir).map_err(|err| LoggingError::CreateDirectory {
        dir: settings.log_dir.clone(),
        message: err.to_string(),
    })?;

    let log_spec = settings.level.to_string().to_ascii_lowercase();
    let handle = Logger::try_with_str(&log_spec)
        .map_err(|err| LoggingError::Backend(err.to_string()))?
        .log_to_file(
            FileSpec::default()
                .directory(settings.log_dir.as_path())
                .basename(LOG_FILE_BASENAME),
        )
        .rotate(
            Criterion::Size(MAX_LOG_FILE_SIZE_BYTES),
            Naming::Numbers,
            Cleanup::KeepLogFiles(MAX_LOG_FILES),
        )
        .write_mode(WriteMode::BufferAndFlush)
        .append()
        .format_for_files(flexi_logger::detailed_format)
        .start()
        .map_err(|err| LoggingError::Backend(err.to_string()))?;

    install_panic_hook();

    info!(
        "event=engine_start module=logging status=ok level={} version={} platform={}",
        settings.level,
        env!("CARGO_PKG_VERSION"),
        std::env::consts::OS
    );

    Ok(ActiveLogger {
        settings,
        _handle: handle,
    })
}

fn parse_level(level: &str) -> Result<log::LevelFilter, LoggingError> {
    match level.trim().to_ascii_lowercase().as_str() {
        "trace" => Ok(log::LevelFilter::Trace),
        "debug" => Ok(log::LevelFilter::Debug),
        "info" => Ok(log::LevelFilter::Info),
        "warn" | "warning" => Ok(log::LevelFilter::Warn),
        "error" => Ok(log::LevelFilter::Error),
        other => Err(LoggingError::UnknownLevel(other.to_string())),
    }
}

fn absolute_dir(log_dir: &Path) -> Result<PathBuf, LoggingError> {
    if !log_dir.is_absolute() {
        return Err(LoggingError::RelativeDirectory(log_dir.to_path_buf()));
    }
    Ok(log_dir.to_path_buf())
}

fn install_panic_hook() {
    if PANIC_HOOK.set(()).is_err() {
        return;
    }

    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |panic_info| {
        let location = panic_info
            .location()
            .map(|loc| format!("{}:{}", loc.file(), loc.line()))
            .unwrap_or_else(|| "unknown".to_string());
        let message = panic_info
            .payload()
            .downcast_ref::<&str>()
            .map(|message| (*message).to_string())
            .or_else(|| panic_info.payload().downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "non-string panic payload".to_string());
        error!(
            "event=panic module=logging status=error location={} message={}",
            location,
            single_line(&message, MAX_PANIC_MESSAGE_CHARS)
        );
        previous(panic_info);
    }));
}

fn single_line(value: &str, max_chars: usize) -> String {
    let flat = value.replace(['\n', '\r'], " ");
    let mut clipped = flat.chars().take(max_chars).collect::<String>();
    if flat.chars().count() > max_chars {
        clipped.push_str("...");
    }
    clipped
}
