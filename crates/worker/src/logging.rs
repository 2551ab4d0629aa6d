//! Logging initialization for the worker process.

use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::LoggingConfig;

/// Builds the default filter directives from the configured level.
///
/// The storage SDK and its HTTP stack log request internals at info;
/// they are capped at warn so job-level logs stay readable. `RUST_LOG`
/// overrides all of this.
fn default_directives(level: &str) -> String {
    format!(
        "{},aws_config=warn,aws_smithy_runtime=warn,aws_sdk_s3=warn,hyper=warn",
        level
    )
}

/// Initializes the logging subsystem based on configuration.
pub fn init_logging(config: &LoggingConfig) {
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_directives(&config.level)));

    let subscriber = tracing_subscriber::registry().with(env_filter);

    match config.format.as_str() {
        "json" => {
            let json_layer = fmt::layer().json().with_target(true);
            subscriber.with(json_layer).init();
        }
        _ => {
            let pretty_layer = fmt::layer().pretty().with_target(true);
            subscriber.with(pretty_layer).init();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_directives_start_with_configured_level() {
        let directives = default_directives("debug");
        assert!(directives.starts_with("debug,"));
        assert!(directives.contains("aws_sdk_s3=warn"));
    }

    #[test]
    fn test_default_directives_parse_as_env_filter() {
        assert!(EnvFilter::try_new(default_directives("info")).is_ok());
    }
}
