/*!
 * Structured Tracing
 * Subscriber setup and per-tick spans using the tracing crate
 */

use crate::core::types::Tick;
use std::time::{Duration, Instant};
use tracing::{debug, info, span, warn, Level};
use tracing_subscriber::{
    fmt::format::FmtSpan, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter,
};
use uuid::Uuid;

/// Initialize structured tracing
///
/// Environment variables:
/// - RUST_LOG: Set log level (default: info)
/// - KERNEL_TRACE_JSON: Enable JSON output (default: false)
///
/// Safe to call more than once; later calls are no-ops.
pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let use_json = std::env::var("KERNEL_TRACE_JSON")
        .map(|v| v == "1" || v == "true")
        .unwrap_or(false);

    let registry = tracing_subscriber::registry().with(env_filter);

    let installed = if use_json {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .json()
                    .with_target(true)
                    .with_current_span(true)
                    .with_span_list(true)
                    .with_span_events(FmtSpan::CLOSE),
            )
            .try_init()
            .is_ok()
    } else {
        registry
            .with(
                tracing_subscriber::fmt::layer()
                    .with_target(true)
                    .with_line_number(true)
                    .compact(),
            )
            .try_init()
            .is_ok()
    };

    if installed {
        info!(json = use_json, "Structured tracing initialized");
    }
}

/// Span covering one scheduler tick
pub struct TickSpan {
    span: tracing::Span,
    start: Instant,
    tick: Tick,
    slow_after: Duration,
    trace_id: String,
}

impl TickSpan {
    pub fn new(tick: Tick, slow_after: Duration) -> Self {
        let trace_id = Uuid::new_v4().to_string();
        let span = span!(
            Level::DEBUG,
            "tick",
            trace_id = %trace_id,
            tick = tick,
            executed = tracing::field::Empty,
            skipped = tracing::field::Empty,
            deferred = tracing::field::Empty,
            duration_us = tracing::field::Empty,
        );

        Self {
            span,
            start: Instant::now(),
            tick,
            slow_after,
            trace_id,
        }
    }

    pub fn trace_id(&self) -> &str {
        &self.trace_id
    }

    pub fn record_counts(&self, executed: usize, skipped: u64, deferred: u64) {
        self.span.record("executed", executed);
        self.span.record("skipped", skipped);
        self.span.record("deferred", deferred);
    }

    pub fn enter(&self) -> tracing::span::Entered<'_> {
        self.span.enter()
    }
}

impl Drop for TickSpan {
    fn drop(&mut self) {
        let duration = self.start.elapsed();
        self.span.record("duration_us", duration.as_micros() as u64);
        let _entered = self.span.enter();

        if duration > self.slow_after {
            warn!(
                trace_id = %self.trace_id,
                tick = self.tick,
                duration_ms = duration.as_millis() as u64,
                slow = true,
                "slow tick detected"
            );
        } else {
            debug!(
                tick = self.tick,
                duration_us = duration.as_micros() as u64,
                "tick completed"
            );
        }
    }
}
