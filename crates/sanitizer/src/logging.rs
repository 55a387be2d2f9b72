// ABOUTME: Injected logging capability for sanitize events keyed by product identifier.
// ABOUTME: TracingLogger forwards to tracing; NoopLogger drops everything.

use std::fmt;

/// Receives informational and error events for one description.
pub trait Logger: fmt::Debug + Send + Sync {
    fn info(&self, product_id: Option<&str>, message: &str);
    fn warn(&self, product_id: Option<&str>, message: &str);
    fn error(&self, product_id: Option<&str>, message: &str);
}

/// Emits `tracing` events with a `product_id` field.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl Logger for TracingLogger {
    fn info(&self, product_id: Option<&str>, message: &str) {
        tracing::info!(product_id = product_id.unwrap_or("-"), "{}", message);
    }

    fn warn(&self, product_id: Option<&str>, message: &str) {
        tracing::warn!(product_id = product_id.unwrap_or("-"), "{}", message);
    }

    fn error(&self, product_id: Option<&str>, message: &str) {
        tracing::error!(product_id = product_id.unwrap_or("-"), "{}", message);
    }
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopLogger;

impl Logger for NoopLogger {
    fn info(&self, _product_id: Option<&str>, _message: &str) {}

    fn warn(&self, _product_id: Option<&str>, _message: &str) {}

    fn error(&self, _product_id: Option<&str>, _message: &str) {}
}
