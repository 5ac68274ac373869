//! Log writer module
//!
//! Provides thread-safe log writing to files or stdout/stderr.

use std::fs::{File, OpenOptions};
use std::io::{self, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

use super::format::Level;

/// Global log writer instance
static LOG_WRITER: OnceLock<LogWriter> = OnceLock::new();

/// Log output target
enum LogTarget {
    /// Write to stdout
    Stdout,
    /// Write to stderr
    Stderr,
    /// Write to file
    File(Mutex<File>),
}

impl LogTarget {
    fn open(path: Option<&str>, fallback: Self) -> io::Result<Self> {
        match path {
            Some(p) => Ok(Self::File(Mutex::new(open_log_file(p)?))),
            None => Ok(fallback),
        }
    }

    fn write_line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            Self::File(file) => {
                if let Ok(mut f) = file.lock() {
                    let _ = writeln!(f, "{message}");
                }
            }
        }
    }
}

/// Thread-safe log writer
pub struct LogWriter {
    /// Most verbose level that is still written
    max_level: Level,
    /// Info/debug target
    info: LogTarget,
    /// Warning/error target
    error: LogTarget,
}

impl LogWriter {
    fn new(
        max_level: Level,
        info_log_file: Option<&str>,
        error_log_file: Option<&str>,
    ) -> io::Result<Self> {
        Ok(Self {
            max_level,
            info: LogTarget::open(info_log_file, LogTarget::Stdout)?,
            error: LogTarget::open(error_log_file, LogTarget::Stderr)?,
        })
    }

    pub fn enabled(&self, level: Level) -> bool {
        level <= self.max_level
    }

    /// Write an already formatted line to the target for `level`
    pub fn write(&self, level: Level, line: &str) {
        if !self.enabled(level) {
            return;
        }
        if level.is_error_stream() {
            self.error.write_line(line);
        } else {
            self.info.write_line(line);
        }
    }
}

/// Open or create a log file for appending
fn open_log_file(path: &str) -> io::Result<File> {
    // Create parent directories if they don't exist
    if let Some(parent) = Path::new(path).parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    OpenOptions::new().create(true).append(true).open(path)
}

/// Initialize the global log writer
///
/// This should be called once at application startup.
/// Returns error if log files cannot be opened.
pub fn init(
    max_level: Level,
    info_log_file: Option<&str>,
    error_log_file: Option<&str>,
) -> io::Result<()> {
    let writer = LogWriter::new(max_level, info_log_file, error_log_file)?;
    LOG_WRITER.set(writer).map_err(|_| {
        io::Error::new(
            io::ErrorKind::AlreadyExists,
            "Log writer already initialized",
        )
    })
}

/// Get the global log writer, if initialized
pub fn get() -> Option<&'static LogWriter> {
    LOG_WRITER.get()
}
