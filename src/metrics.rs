//! Lightweight metrics helpers for the hydrator.
//!
//! Convenience functions and RAII timers wrapping the `metrics` crate macros.
//! No exporter is embedded; the embedding application installs whichever
//! recorder it wants and these calls become no-ops without one.
//!
//! Provided metrics:
//! * `hydrator_hydrations_total` (counter, labels: dto, outcome)
//! * `hydrator_hydration_duration_seconds` (histogram, labels: dto)
//! * `hydrator_binding_errors_total` (counter, labels: dto, kind)
//! * `hydrator_requests_total` (counter, labels: route, method, status)
//! * `hydrator_registered_dtos` (gauge)
use std::time::{Duration, Instant};

use metrics::{Unit, counter, describe_counter, describe_gauge, describe_histogram, gauge, histogram};
use once_cell::sync::Lazy;

pub const HYDRATIONS_TOTAL: &str = "hydrator_hydrations_total";
pub const HYDRATION_DURATION_SECONDS: &str = "hydrator_hydration_duration_seconds";
pub const BINDING_ERRORS_TOTAL: &str = "hydrator_binding_errors_total";
pub const REQUESTS_TOTAL: &str = "hydrator_requests_total";
pub const REGISTERED_DTOS: &str = "hydrator_registered_dtos";

/// Route label for requests no configured route matched, keeping the label
/// set bounded whatever paths clients send
pub const UNMATCHED_ROUTE: &str = "<unmatched>";

static DESCRIPTIONS: Lazy<()> = Lazy::new(|| {
    describe_counter!(
        HYDRATIONS_TOTAL,
        Unit::Count,
        "Total number of DTO hydrations, by outcome."
    );
    describe_histogram!(
        HYDRATION_DURATION_SECONDS,
        Unit::Seconds,
        "Time spent hydrating a DTO, nested DTOs included."
    );
    describe_counter!(
        BINDING_ERRORS_TOTAL,
        Unit::Count,
        "Hydrations aborted by a binding error, by error kind."
    );
    describe_counter!(
        REQUESTS_TOTAL,
        Unit::Count,
        "HTTP requests answered by the hydration handler."
    );
    describe_gauge!(
        REGISTERED_DTOS,
        "Number of DTO schemas in the active registry."
    );
});

/// Count one finished hydration. `outcome` is `ok` or `error`.
pub fn increment_hydration_total(dto: &str, outcome: &str) {
    counter!(
        HYDRATIONS_TOTAL,
        "dto" => dto.to_string(),
        "outcome" => outcome.to_string()
    )
    .increment(1);
}

pub fn increment_binding_error(dto: &str, kind: &str) {
    counter!(
        BINDING_ERRORS_TOTAL,
        "dto" => dto.to_string(),
        "kind" => kind.to_string()
    )
    .increment(1);
}

pub fn record_hydration_duration(dto: &str, duration: Duration) {
    histogram!(HYDRATION_DURATION_SECONDS, "dto" => dto.to_string()).record(duration.as_secs_f64());
}

/// Count a request answered by the HTTP handler.
pub fn increment_request_total(route: &str, method: &str, status: u16) {
    counter!(
        REQUESTS_TOTAL,
        "route" => route.to_string(),
        "method" => method.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// Publish the size of a freshly installed registry.
pub fn set_registered_dtos(count: usize) {
    gauge!(REGISTERED_DTOS).set(count as f64);
}

/// RAII helper measuring one hydration, recorded on drop so early error
/// returns are timed too.
pub struct HydrationTimer {
    start: Instant,
    dto: String,
}

impl HydrationTimer {
    pub fn new(dto: &str) -> Self {
        Self {
            start: Instant::now(),
            dto: dto.to_string(),
        }
    }
}

impl Drop for HydrationTimer {
    fn drop(&mut self) {
        record_hydration_duration(&self.dto, self.start.elapsed());
    }
}

/// Initialize metric descriptions (idempotent).
pub fn init_metrics() -> eyre::Result<()> {
    tracing::info!("Initializing hydrator metrics");
    Lazy::force(&DESCRIPTIONS);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hydration_timer() {
        let timer = HydrationTimer::new("CreateUser");
        // Timer will record duration when dropped
        drop(timer);
    }

    #[test]
    fn test_init_metrics() {
        assert!(init_metrics().is_ok());
        assert!(init_metrics().is_ok());
    }

    #[test]
    fn test_counters_without_recorder() {
        increment_hydration_total("CreateUser", "ok");
        increment_binding_error("CreateUser", "type_mismatch");
        increment_request_total("/users", "POST", 200);
        set_registered_dtos(3);
    }
}
