//! Logging initialization.

use tracing_subscriber::{
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::{SubscriberInitExt, TryInitError},
    EnvFilter,
};

use crate::config::LoggingConfig;

/// Installs the global subscriber. `RUST_LOG` wins over the configured level.
///
/// Fails if a subscriber is already installed.
pub fn init_logging(config: &LoggingConfig) -> Result<(), TryInitError> {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    if uses_json(config) {
        let json_layer = fmt::layer()
            .json()
            .with_span_events(FmtSpan::CLOSE)
            .with_current_span(true)
            .with_target(true);
        subscriber.with(json_layer).try_init()
    } else {
        let pretty_layer = fmt::layer()
            .pretty()
            .with_span_events(FmtSpan::CLOSE)
            .with_target(true);
        subscriber.with(pretty_layer).try_init()
    }
}

fn uses_json(config: &LoggingConfig) -> bool {
    !config.format.eq_ignore_ascii_case("pretty")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn logging(format: &str) -> LoggingConfig {
        LoggingConfig {
            level: "info".into(),
            format: format.into(),
        }
    }

    #[test]
    fn test_format_selection() {
        assert!(uses_json(&logging("json")));
        assert!(uses_json(&logging("anything")));
        assert!(!uses_json(&logging("pretty")));
        assert!(!uses_json(&logging("PRETTY")));
    }
}
