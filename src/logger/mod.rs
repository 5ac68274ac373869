//! Logger module
//!
//! Provides logging utilities for the diagnostic server including:
//! - Server lifecycle logging
//! - Request/response hook lines
//! - Leveled error and warning logging
//! - File-based logging support

mod format;
pub mod writer;

pub use format::Level;

use crate::config::Config;
use std::net::SocketAddr;

/// Initialize the logger with configuration
///
/// Should be called once at application startup.
pub fn init(config: &Config) -> std::io::Result<()> {
    let level = Level::parse(&config.logging.level).unwrap_or(Level::Info);
    writer::init(
        level,
        config.logging.info_log_file.as_deref(),
        config.logging.error_log_file.as_deref(),
    )
}

/// Format and write one line at `level`
///
/// Falls back to stdout/stderr at info level when `init()` has not run.
fn emit(level: Level, message: &str) {
    if captured(level, message) {
        return;
    }
    let line = format::format_line(&chrono::Local::now(), level, message);
    match writer::get() {
        Some(w) => w.write(level, &line),
        None if level > Level::Info => {}
        None if level.is_error_stream() => eprintln!("{line}"),
        None => println!("{line}"),
    }
}

#[cfg(test)]
fn captured(level: Level, message: &str) -> bool {
    writer::capture::record(level, message)
}

#[cfg(not(test))]
const fn captured(_level: Level, _message: &str) -> bool {
    false
}

pub fn log_info(message: &str) {
    emit(Level::Info, message);
}

pub fn log_debug(message: &str) {
    emit(Level::Debug, message);
}

pub fn log_warning(message: &str) {
    emit(Level::Warning, message);
}

pub fn log_error(message: &str) {
    emit(Level::Error, message);
}

pub fn log_server_start(addr: &SocketAddr, config: &Config) {
    log_info("======================================");
    log_info(&format!("{} started", config.service.display_name));
    log_info(&format!("Listening on: http://{addr}"));
    log_info(&format!("Environment: {}", config.service.environment));
    log_info(&format!("Log level: {}", config.logging.level));
    if let Some(workers) = config.server.workers {
        log_info(&format!("Worker threads: {workers}"));
    }
    if let Some(ref path) = config.logging.info_log_file {
        log_info(&format!("Info log: {path}"));
    }
    if let Some(ref path) = config.logging.error_log_file {
        log_info(&format!("Error log: {path}"));
    }
    log_info("======================================");
}

pub fn log_routes_header() {
    log_info("Registered routes:");
}

pub fn log_route_registered(pattern: &str, endpoint: &str) {
    log_info(&format!("Route: {pattern} -> {endpoint}"));
}

pub fn log_connection_accepted(peer_addr: &SocketAddr) {
    log_debug(&format!("[Connection] Accepted from: {peer_addr}"));
}

pub fn log_connection_error(err: &impl std::fmt::Debug) {
    log_error(&format!("Failed to serve connection: {err:?}"));
}

/// Pre-handler hook line
pub fn log_request(method: &str, url: &str, remote_addr: &str) {
    log_info(&format!("Request: {method} {url} - IP: {remote_addr}"));
}

/// Post-handler hook line
pub fn log_response(status: u16, method: &str, url: &str) {
    log_info(&format!("Response: {status} for {method} {url}"));
}

pub fn log_shutdown(reason: &str) {
    log_info(&format!("[Shutdown] {reason}, no longer accepting connections"));
}
