//! Logging configuration for auto-stereo
//!
//! Logs are written to both the terminal and a file at:
//! `~/Library/Logs/auto-stereo/auto-stereo.log` on macOS, or
//! `<local data dir>/auto-stereo/logs/auto-stereo.log` elsewhere.

use log::LevelFilter;
use simplelog::{
    ColorChoice, CombinedLogger, Config, ConfigBuilder, SharedLogger, TermLogger, TerminalMode,
    WriteLogger,
};
use std::fs::{self, OpenOptions};
use std::path::PathBuf;

const LOG_FILE_NAME: &str = "auto-stereo.log";
const MAX_LOG_SIZE: u64 = 10 * 1024 * 1024;

/// Get the log directory path
pub fn get_log_directory() -> Option<PathBuf> {
    if cfg!(target_os = "macos") {
        dirs::home_dir().map(|h| h.join("Library").join("Logs").join("auto-stereo"))
    } else {
        dirs::data_local_dir().map(|d| d.join("auto-stereo").join("logs"))
    }
}

fn log_config() -> Config {
    ConfigBuilder::new()
        .set_time_format_rfc3339()
        .set_thread_level(LevelFilter::Off)
        .set_target_level(LevelFilter::Off)
        .build()
}

/// Initialize the logging system
///
/// Terminal output at `terminal_level`; the file always captures debug and
/// above. Returns the path to the log file on success.
pub fn init_logging(terminal_level: LevelFilter) -> Option<PathBuf> {
    let log_dir = match get_log_directory() {
        Some(d) => d,
        None => {
            eprintln!("Warning: Could not determine log directory");
            init_terminal_only(terminal_level);
            return None;
        }
    };

    if let Err(e) = fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Could not create log directory: {}", e);
        init_terminal_only(terminal_level);
        return None;
    }

    let log_path = log_dir.join(LOG_FILE_NAME);

    // Rotate old log if it's too large
    if let Ok(metadata) = fs::metadata(&log_path) {
        if metadata.len() > MAX_LOG_SIZE {
            let backup_path = log_dir.join(format!("{}.old", LOG_FILE_NAME));
            let _ = fs::rename(&log_path, &backup_path);
        }
    }

    let log_file = match OpenOptions::new().create(true).append(true).open(&log_path) {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Warning: Could not open log file: {}", e);
            init_terminal_only(terminal_level);
            return None;
        }
    };

    let config = log_config();
    let loggers: Vec<Box<dyn SharedLogger>> = vec![
        TermLogger::new(terminal_level, config.clone(), TerminalMode::Mixed, ColorChoice::Auto),
        WriteLogger::new(LevelFilter::Debug, config, log_file),
    ];

    if CombinedLogger::init(loggers).is_err() {
        eprintln!("Warning: Logger already initialized");
    }

    log::debug!("=== auto-stereo session started ===");
    log::debug!("Log file: {}", log_path.display());

    Some(log_path)
}

/// Terminal-only logging (fallback if file logging fails)
fn init_terminal_only(level: LevelFilter) {
    let term_logger = TermLogger::new(level, log_config(), TerminalMode::Mixed, ColorChoice::Auto);
    let _ = CombinedLogger::init(vec![term_logger]);
}
