//! Structured logging.
//!
//! stdout is reserved for the single JSON result line, so every log event
//! goes to stderr. `RUST_LOG` wins over the configured level.

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::ObservabilityConfig;

/// Install the global subscriber. Safe to call more than once; later calls
/// are ignored.
pub fn init_logging(config: &ObservabilityConfig) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directive(&config.log_level)));

    let registry = tracing_subscriber::registry().with(filter);
    let result = if config.log_format == "json" {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_writer(std::io::stderr),
            )
            .try_init()
    } else {
        registry
            .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
            .try_init()
    };

    if let Err(e) = result {
        eprintln!("logging already initialized: {e}");
    }
}

fn default_directive(level: &str) -> String {
    format!("functions_runner={level},warn")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directive_scopes_crate() {
        assert_eq!(default_directive("debug"), "functions_runner=debug,warn");
    }
}
