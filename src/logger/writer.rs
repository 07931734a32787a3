//! Process-wide log sinks
//!
//! Info lines and access lines go to one sink, warnings and errors to another. Each
//! sink is the console or an append-only file flushed per line.

use std::fs::{File, OpenOptions};
use std::io::{self, LineWriter, Write};
use std::path::Path;
use std::sync::{Mutex, OnceLock};

static SINKS: OnceLock<Sinks> = OnceLock::new();

/// Severity, ordered from most to least verbose
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Level {
    Info,
    Warn,
    Error,
}

impl Level {
    /// Parse a configured level; unknown names fall back to `Info`
    pub fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "warn" | "warning" => Self::Warn,
            "error" => Self::Error,
            _ => Self::Info,
        }
    }
}

enum Sink {
    Stdout,
    Stderr,
    File(Mutex<LineWriter<File>>),
}

impl Sink {
    /// The file at `path`, or `console` when none is configured
    fn open(path: Option<&str>, console: Self) -> io::Result<Self> {
        let Some(path) = path else {
            return Ok(console);
        };
        if let Some(dir) = Path::new(path).parent().filter(|d| !d.as_os_str().is_empty()) {
            std::fs::create_dir_all(dir)?;
        }
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self::File(Mutex::new(LineWriter::new(file))))
    }

    fn line(&self, message: &str) {
        match self {
            Self::Stdout => println!("{message}"),
            Self::Stderr => eprintln!("{message}"),
            // A poisoned lock or a full disk drops the line
            Self::File(file) => {
                if let Ok(mut file) = file.lock() {
                    let _ = writeln!(file, "{message}");
                }
            }
        }
    }
}

pub struct Sinks {
    level: Level,
    access: Sink,
    error: Sink,
}

impl Sinks {
    fn open(level: Level, access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<Self> {
        Ok(Self {
            level,
            access: Sink::open(access_log_file, Sink::Stdout)?,
            error: Sink::open(error_log_file, Sink::Stderr)?,
        })
    }

    /// Access lines ignore the level
    pub fn write_access(&self, message: &str) {
        self.access.line(message);
    }

    pub fn write(&self, level: Level, message: &str) {
        if level < self.level {
            return;
        }
        match level {
            Level::Info => self.access.line(message),
            Level::Warn | Level::Error => self.error.line(message),
        }
    }
}

/// Install the process-wide sinks; fails if a file cannot be opened or on a second call
pub fn init(level: Level, access_log_file: Option<&str>, error_log_file: Option<&str>) -> io::Result<()> {
    let sinks = Sinks::open(level, access_log_file, error_log_file)?;
    SINKS
        .set(sinks)
        .map_err(|_| io::Error::new(io::ErrorKind::AlreadyExists, "logger already initialized"))
}

pub fn get() -> Option<&'static Sinks> {
    SINKS.get()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_level_parse() {
        assert_eq!(Level::parse("info"), Level::Info);
        assert_eq!(Level::parse(" WARN "), Level::Warn);
        assert_eq!(Level::parse("warning"), Level::Warn);
        assert_eq!(Level::parse("error"), Level::Error);
        assert_eq!(Level::parse("debug"), Level::Info);
    }

    #[test]
    fn test_file_sinks_respect_level() {
        let dir = TempDir::new().unwrap();
        let access = dir.path().join("logs/access.log");
        let error = dir.path().join("logs/error.log");
        let sinks = Sinks::open(
            Level::Warn,
            Some(access.to_str().unwrap()),
            Some(error.to_str().unwrap()),
        )
        .unwrap();

        sinks.write(Level::Info, "hidden");
        sinks.write(Level::Warn, "[WARN] shown");
        sinks.write(Level::Error, "[ERROR] shown");
        sinks.write_access("GET / 200");

        assert_eq!(std::fs::read_to_string(access).unwrap(), "GET / 200\n");
        assert_eq!(
            std::fs::read_to_string(error).unwrap(),
            "[WARN] shown\n[ERROR] shown\n"
        );
    }
}
