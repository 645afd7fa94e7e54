//! Structured logging for embedding applications.
//!
//! The library only emits `tracing` events (target `lcm_core::inference`);
//! installing a subscriber is the embedding application's choice.
//!
//! # Usage
//!
//! ```no_run
//! use lcm_core::logging::{init_logging, LogConfig};
//!
//! let config = LogConfig::from_env(None, None);
//! init_logging(&config);
//! ```
//!
//! All log output goes to stderr, as human-readable lines or JSONL.

pub mod config;

pub use config::{LogConfig, LogFormat, LogLevel};

use std::io::IsTerminal;

use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

/// Build the filter.
///
/// RUST_LOG directives are used only when RUST_LOG alone chose the level;
/// otherwise the filter is `lcm_core=<level>`, so LCM_LOG and explicit
/// overrides keep precedence.
pub fn build_filter(config: &LogConfig) -> EnvFilter {
    let from_level = || {
        EnvFilter::default().add_directive(
            format!("lcm_core={}", LevelFilter::from(config.level))
                .parse()
                .unwrap_or_else(|_| LevelFilter::INFO.into()),
        )
    };
    if config.rust_log_directives {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| from_level())
    } else {
        from_level()
    }
}

/// Install the global subscriber.
///
/// Returns `false` if a global subscriber was already installed (e.g. by the
/// host application or an earlier test), in which case nothing changes.
pub fn init_logging(config: &LogConfig) -> bool {
    let filter = build_filter(config);

    match config.format {
        LogFormat::Human => {
            let use_ansi = std::io::stderr().is_terminal();
            let fmt_layer = fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_ansi(use_ansi);

            if config.timestamps {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer)
                    .try_init()
                    .is_ok()
            } else {
                tracing_subscriber::registry()
                    .with(filter)
                    .with(fmt_layer.without_time())
                    .try_init()
                    .is_ok()
            }
        }
        LogFormat::Jsonl => {
            let json_layer = fmt::layer()
                .json()
                .with_writer(std::io::stderr)
                .with_current_span(false);
            tracing_subscriber::registry()
                .with(filter)
                .with(json_layer)
                .try_init()
                .is_ok()
        }
    }
}

/// Initialize logging with defaults (for tests and simple cases).
pub fn init_default_logging() -> bool {
    init_logging(&LogConfig::from_env(None, None))
}
