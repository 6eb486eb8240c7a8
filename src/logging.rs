use crate::error::{CriticError, Result};
use env_logger::{Builder, Env};
use log::LevelFilter;
use chrono::Local;
use std::io::Write;
use yansi::Paint;

/// Initializes the CLI logging system with the specified log level
///
/// Valid log levels are: off, error, warn, info, debug, trace. Anything
/// else falls back to info. `RUST_LOG` takes precedence when set.
pub fn init(log_level: &str) -> Result<()> {
    let env = Env::default()
        .filter_or("RUST_LOG", default_filter(log_level))
        .write_style_or("RUST_LOG_STYLE", "auto");

    Builder::from_env(env)
        .format(|buf, record| {
            writeln!(buf, "{}", format_log(record))
        })
        .try_init()
        .map_err(|e| CriticError::Config(format!("Failed to initialize logger: {}", e)))
}

/// Formats a log record as `[timestamp] LEVEL [target] message`
pub fn format_log(record: &log::Record) -> String {
    let level = match record.level() {
        log::Level::Error => Paint::red("ERROR").bold(),
        log::Level::Warn => Paint::yellow("WARN ").bold(),
        log::Level::Info => Paint::cyan("INFO ").bold(),
        log::Level::Debug => Paint::blue("DEBUG").bold(),
        log::Level::Trace => Paint::new("TRACE"),
    };

    let timestamp = Local::now().format("%Y-%m-%d %H:%M:%S%.3f");
    let target = if !record.target().is_empty() {
        record.target()
    } else {
        record.module_path().unwrap_or("unknown")
    };

    format!(
        "[{}] {} [{}] {}",
        timestamp,
        level,
        target,
        record.args()
    )
}

/// Filter directive used when `RUST_LOG` is unset.
///
/// env_logger reads an unknown word as a module name, which would hide
/// every record, so the level is normalised first.
fn default_filter(log_level: &str) -> String {
    parse_log_level(log_level).to_string().to_lowercase()
}

/// Parses a log level string into a LevelFilter, defaulting to Info
pub fn parse_log_level(level: &str) -> LevelFilter {
    match level.to_lowercase().as_str() {
        "off" => LevelFilter::Off,
        "error" => LevelFilter::Error,
        "warn" => LevelFilter::Warn,
        "info" => LevelFilter::Info,
        "debug" => LevelFilter::Debug,
        "trace" => LevelFilter::Trace,
        _ => LevelFilter::Info,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_log_level() {
        assert_eq!(parse_log_level("error"), LevelFilter::Error);
        assert_eq!(parse_log_level("WARN"), LevelFilter::Warn);
        assert_eq!(parse_log_level("info"), LevelFilter::Info);
        assert_eq!(parse_log_level("debug"), LevelFilter::Debug);
        assert_eq!(parse_log_level("trace"), LevelFilter::Trace);
        assert_eq!(parse_log_level("off"), LevelFilter::Off);
        assert_eq!(parse_log_level("invalid"), LevelFilter::Info);
    }

    #[test]
    fn test_default_filter_normalises_level() {
        assert_eq!(default_filter("DEBUG"), "debug");
        assert_eq!(default_filter("verbose"), "info");
        assert_eq!(default_filter("off"), "off");
    }

    #[test]
    fn test_format_log_includes_target_and_message() {
        let line = format_log(
            &log::Record::builder()
                .args(format_args!("listing fetched"))
                .level(log::Level::Info)
                .target("codecritic::github")
                .build(),
        );
        assert!(line.contains("[codecritic::github]"));
        assert!(line.ends_with("listing fetched"));
    }
}
