//! Structured logging setup
//!
//! Logs go to stderr so report JSON on stdout stays clean. Configuration
//! comes from CLI flags or from `DEVPLAN_LOG_LEVEL` / `DEVPLAN_LOG_JSON`;
//! `RUST_LOG` directives are honoured on top of either.

use std::env;
use std::io;
use std::sync::Once;

use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

static INIT: Once = Once::new();

#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Minimum level for this crate's events
    pub level: Level,

    /// Emit one JSON object per event instead of console lines
    pub use_json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::WARN,
            use_json: false,
        }
    }
}

impl LoggingConfig {
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Default::default()
        }
    }
}

/// Parse a level name, falling back to WARN for anything unknown
pub fn parse_level(level_str: &str) -> Level {
    match level_str.trim().to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" | "warning" => Level::WARN,
        "error" => Level::ERROR,
        _ => {
            eprintln!(
                "Invalid log level '{}', defaulting to WARN. Valid levels: trace, debug, info, warn, error",
                level_str
            );
            Level::WARN
        }
    }
}

/// Install the global subscriber. Only the first call has any effect.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut filter = EnvFilter::from_default_env();
        if let Ok(directive) = format!("devplan={}", config.level).parse::<Directive>() {
            filter = filter.add_directive(directive);
        }

        let registry = tracing_subscriber::registry().with(filter);
        let result = if config.use_json {
            registry
                .with(fmt::layer().json().with_writer(io::stderr))
                .try_init()
        } else {
            registry
                .with(fmt::layer().with_target(true).with_writer(io::stderr))
                .try_init()
        };
        if let Err(e) = result {
            eprintln!("Logging already initialised elsewhere: {}", e);
        }
    });
}

/// Read `DEVPLAN_LOG_LEVEL` and `DEVPLAN_LOG_JSON`
pub fn config_from_env() -> LoggingConfig {
    let level = env::var("DEVPLAN_LOG_LEVEL")
        .map(|v| parse_level(&v))
        .unwrap_or(Level::WARN);
    let use_json = env::var("DEVPLAN_LOG_JSON")
        .ok()
        .and_then(|v| v.parse::<bool>().ok())
        .unwrap_or(false);
    LoggingConfig { level, use_json }
}
