//! Logger module
//!
//! Provides logging utilities for the file manager including:
//! - Server lifecycle logging
//! - Access logging with multiple formats
//! - Error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::{AccessLogEntry, AccessLogFormat};
pub use writer::Level;

use crate::config::Config;
use crate::fileman::Fileman;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    writer::init(
        Level::parse(&config.logging.level),
        config.logging.access_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Write at `level`, falling back to stdout/stderr before `init`
fn write(level: Level, message: &str) {
    match writer::get() {
        Some(writer) => writer.write(level, message),
        None if level == Level::Info => println!("{message}"),
        None => eprintln!("{message}"),
    }
}

/// Write to access log specifically
fn write_access(message: &str) {
    match writer::get() {
        Some(writer) => writer.write_access(message),
        None => println!("{message}"),
    }
}

pub fn log_server_start(addr: &SocketAddr, config: &Config, fileman: &Fileman) {
    log_info("======================================");
    log_info("Fileman server started successfully");
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Serving: {}", fileman.root().display()));
    log_info(&format!("Mounted at: {}", fileman.uri_of("")));
    log_info(&format!(
        "Columns: {}",
        fileman.synthesizer().columns().collect::<Vec<_>>().join(", ")
    ));
    log_info(&format!("Ranges: {}", fileman.accept_ranges()));
    log_info(&format!("Formatter: {}", fileman.formatter().name()));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.access_log_file {
        log_info(&format!("Access log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================\n");
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_info(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

pub fn log_info(message: &str) {
    write(Level::Info, message);
}

pub fn log_error(message: &str) {
    write(Level::Error, &format!("[ERROR] {message}"));
}

pub fn log_warning(message: &str) {
    write(Level::Warn, &format!("[WARN] {message}"));
}

/// One access line in the configured `format`
pub fn log_access(entry: &AccessLogEntry, format: &str) {
    write_access(&entry.render(AccessLogFormat::parse(format)));
}

pub fn log_shutdown(active_connections: usize) {
    log_info(&format!(
        "[Shutdown] Listener closed, {active_connections} connection(s) still finishing"
    ));
}
