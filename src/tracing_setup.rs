use eyre::{Result, WrapErr};
use tracing_subscriber::{EnvFilter, Registry, layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::models::LoggingConfig;

/// Initialize console logging on stderr for the one-shot commands, whose
/// stdout carries the hydrated JSON
pub fn init_console_tracing() -> Result<()> {
    Registry::default()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(true)
                .with_file(true)
                .with_line_number(true),
        )
        .try_init()
        .wrap_err("Failed to install tracing subscriber")?;

    tracing::debug!("Console logging initialized");
    Ok(())
}

/// Initialize tracing from the `logging` section of the configuration.
///
/// `RUST_LOG`, when set, takes precedence over the configured level.
pub fn init_tracing_with_config(logging: &LoggingConfig) -> Result<()> {
    let env_filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(&logging.level)
            .wrap_err_with(|| format!("Invalid log level: {}", logging.level))?,
    };

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let installed = if logging.json {
        Registry::default()
            .with(env_filter)
            .with(
                fmt_layer
                    .json()
                    .with_current_span(logging.include_spans)
                    .with_span_list(logging.include_spans),
            )
            .try_init()
    } else {
        Registry::default()
            .with(env_filter)
            .with(fmt_layer.with_ansi(true))
            .try_init()
    };
    installed.wrap_err("Failed to install tracing subscriber")?;

    tracing::info!(
        level = %logging.level,
        json = logging.json,
        "Hydrator logging initialized"
    );
    Ok(())
}

/// Span wrapping one HTTP request handled by the hydration server
pub fn create_request_span(method: &str, path: &str, request_id: &str) -> tracing::Span {
    tracing::info_span!(
        "request",
        http.method = method,
        http.path = path,
        request.id = request_id,
        dto = tracing::field::Empty,
        http.status_code = tracing::field::Empty,
    )
}
