//! Observable routing events
//!
//! Events are explicit and typed; the logger only ever sees their string form.

use std::fmt;

use super::logger::Severity;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    /// Datasource configuration loaded and validated
    ConfigLoaded,
    /// Datasource configuration rejected
    ConfigRejected,
    /// A filter resolved to a tail predicate
    RouteResolved,
    /// Nesting exceeded the depth limit; subtree routed to all tails
    RouteDepthLimit,
    /// A key-side value could not be typed into the key domain
    RouteKeyUnsupported,
    /// Literal evaluation failed; resolution aborted
    RouteLiteralFailed,
    /// No tail survived and the caller required one
    RouteNotMatched,
    /// Explain request served
    ExplainComplete,
}

impl Event {
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::ConfigLoaded => "DATASOURCE_CONFIG_LOADED",
            Event::ConfigRejected => "DATASOURCE_CONFIG_REJECTED",
            Event::RouteResolved => "ROUTE_RESOLVED",
            Event::RouteDepthLimit => "ROUTE_DEPTH_LIMIT",
            Event::RouteKeyUnsupported => "ROUTE_KEY_UNSUPPORTED",
            Event::RouteLiteralFailed => "ROUTE_LITERAL_FAILED",
            Event::RouteNotMatched => "ROUTE_NOT_MATCHED",
            Event::ExplainComplete => "EXPLAIN_COMPLETE",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::RouteResolved | Event::RouteKeyUnsupported => Severity::Trace,
            Event::ConfigLoaded | Event::ExplainComplete => Severity::Info,
            Event::RouteDepthLimit | Event::RouteNotMatched => Severity::Warn,
            Event::ConfigRejected | Event::RouteLiteralFailed => Severity::Error,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
