//! Logging Infrastructure

use std::path::Path;

use tracing_subscriber::EnvFilter;

/// File name prefix for rolling log files
const LOG_FILE_PREFIX: &str = "order-server";

/// Initialize the logger with defaults (info, stdout)
pub fn init_logger() {
    init_logger_with_file(None, None, None);
}

/// Initialize the logger with optional JSON format and file output
///
/// `RUST_LOG` takes precedence over `log_level`. When `log_dir` is given it
/// is created if missing and logs rotate daily inside it. Calling this twice
/// is harmless: the second call is ignored.
pub fn init_logger_with_file(log_level: Option<&str>, json: Option<bool>, log_dir: Option<&str>) {
    let level = log_level.unwrap_or("info");
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let json = json.unwrap_or(false);

    let subscriber = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_file(false)
        .with_line_number(false)
        .with_thread_ids(false)
        .with_target(false);

    if let Some(dir) = log_dir {
        let log_path = Path::new(dir);
        if std::fs::create_dir_all(log_path).is_ok() {
            let file_appender = tracing_appender::rolling::daily(log_path, LOG_FILE_PREFIX);
            let subscriber = subscriber.with_writer(file_appender).with_ansi(false);
            let _ = if json {
                subscriber.json().try_init()
            } else {
                subscriber.try_init()
            };
            return;
        }
        eprintln!("Cannot create log directory {}, logging to stdout", dir);
    }

    let _ = if json {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };
}
