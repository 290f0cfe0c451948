use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::models::LoggingSettings;

/// Initialize logging from the document's logging settings.
///
/// `RUST_LOG` takes precedence over the configured level when set.
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&settings.level)
            .wrap_err_with(|| format!("Invalid log level: {}", settings.level))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_writer(std::io::stderr);

    if settings.json {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(true)
                    .with_span_list(false),
            )
            .try_init()
            .wrap_err("Failed to install JSON log subscriber")?;
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.compact().with_ansi(true))
            .try_init()
            .wrap_err("Failed to install console log subscriber")?;
    }

    tracing::debug!(level = %settings.level, json = settings.json, "logging initialized");
    Ok(())
}

/// Span scoping log lines to a single route.
pub fn route_span(namespace: &str, name: &str) -> tracing::Span {
    tracing::info_span!("route", route.namespace = namespace, route.name = name)
}

/// Span for one CLI command run against a document.
pub fn command_span(command: &str, document: &str) -> tracing::Span {
    tracing::info_span!(
        "command",
        name = command,
        document = document,
        routes = tracing::field::Empty,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_span() {
        let span = route_span("shop", "storefront");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "route");
        }
    }

    #[test]
    fn test_command_span() {
        let span = command_span("translate", "routes.yaml");
        if let Some(metadata) = span.metadata() {
            assert_eq!(metadata.name(), "command");
        }
    }
}
