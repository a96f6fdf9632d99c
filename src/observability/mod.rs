//! Observability for routing
//!
//! - Structured JSON logs, one line per event
//! - Relaxed atomic counters
//!
//! Observability is read-only: nothing logged or counted here ever changes a
//! routing decision.

mod events;
mod logger;
mod metrics;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use metrics::{MetricsRegistry, MetricsSnapshot};

/// Logs an event at its own severity
pub fn log_event(event: Event, fields: &[(&str, &str)]) {
    Logger::log(event.severity(), event.as_str(), fields);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_event_does_not_panic() {
        log_event(Event::RouteResolved, &[("entity", "Order")]);
        log_event(Event::ConfigLoaded, &[]);
    }
}
