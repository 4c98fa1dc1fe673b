//! CLI inspection entry point.
//!
//! # Responsibility
//! - Verify `dynentity_core` linkage (`ping`, version).
//! - Given a database path, print the introspected entities and row counts.
//! - When `DYNENTITY_LOG_DIR` names an absolute directory, write core logs
//!   there at the build's default level.
//!
//! Output is line-oriented `key=value` text so it stays easy to grep.

use dynentity_core::{
    default_log_level, init_logging, EntityStore, LoggingError, Predicate, StoreOptions,
};
use std::process::ExitCode;

const LOG_DIR_ENV: &str = "DYNENTITY_LOG_DIR";

/// Starts core logging under `log_dir`; returns `Ok(false)` when no directory
/// is configured.
fn init_logging_from(log_dir: Option<&str>) -> Result<bool, LoggingError> {
    match log_dir.map(str::trim) {
        None | Some("") => Ok(false),
        Some(dir) => init_logging(default_log_level(), dir).map(|()| true),
    }
}

fn main() -> ExitCode {
    let log_dir = std::env::var(LOG_DIR_ENV).ok();
    let logging = init_logging_from(log_dir.as_deref());
    match logging {
        Ok(true) => println!(
            "logging level={} dir={}",
            default_log_level(),
            log_dir.as_deref().unwrap_or_default().trim()
        ),
        Ok(false) => {}
        Err(err) => eprintln!("warning: logging disabled, {LOG_DIR_ENV}: {err}"),
    }

    println!("dynentity_core ping={}", dynentity_core::ping());
    println!("dynentity_core version={}", dynentity_core::core_version());

    let Some(path) = std::env::args().nth(1) else {
        return ExitCode::SUCCESS;
    };

    let options = StoreOptions {
        read_only: true,
        ..StoreOptions::default()
    };
    let store = match EntityStore::open_sqlite(&path, &options) {
        Ok(store) => store,
        Err(err) => {
            eprintln!("error_code={} error={err}", err.code());
            return ExitCode::FAILURE;
        }
    };

    for entity in store.schema().entities() {
        match store.count(entity.name(), &Predicate::All) {
            Ok(rows) => println!(
                "entity={} attributes={} rows={}",
                entity.name(),
                entity.attributes().collect::<Vec<_>>().join(","),
                rows
            ),
            Err(err) => {
                eprintln!("entity={} error_code={} error={err}", entity.name(), err.code());
                return ExitCode::FAILURE;
            }
        }
    }

    ExitCode::SUCCESS
}

#[cfg(test)]
mod tests {
    use super::init_logging_from;
    use dynentity_core::LoggingError;

    #[test]
    fn unset_or_blank_log_dir_leaves_logging_off() {
        assert_eq!(init_logging_from(None), Ok(false));
        assert_eq!(init_logging_from(Some("  ")), Ok(false));
    }

    #[test]
    fn relative_log_dir_is_rejected() {
        assert!(matches!(
            init_logging_from(Some("relative/logs")),
            Err(LoggingError::InvalidDirectory(_))
        ));
    }
}
