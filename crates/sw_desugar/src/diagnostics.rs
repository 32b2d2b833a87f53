//! Events the transforms report while rewriting a module.
//!
//! Events go to a [`DiagnosticSink`]. The default sink for `transform` is
//! [`NullSink`]; `debug` configurations use [`TracingSink`], and the CLI
//! collects into an [`EventLog`] so it can print positions.

use std::fmt;

use serde::Serialize;
use sw_ast::Transform;
use swc_common::Span;

/// Byte offsets into the source map, as carried by swc spans.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SourceRange {
    pub lo: u32,
    pub hi: u32,
}

impl From<Span> for SourceRange {
    fn from(span: Span) -> Self {
        SourceRange {
            lo: span.lo.0,
            hi: span.hi.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum Event {
    EqualityNormalized {
        range: SourceRange,
        from: &'static str,
        to: &'static str,
    },
    PrintLowered {
        range: SourceRange,
        /// Arguments after the first, which the lowering discards.
        dropped_args: usize,
    },
    PrintSkipped {
        range: SourceRange,
        reason: &'static str,
    },
    DeferDesugared {
        range: SourceRange,
        accumulator: String,
        registrations: usize,
    },
    /// A `defer(...)` call left alone because a local binding shadows it.
    DeferShadowed {
        range: SourceRange,
        binding: &'static str,
    },
    /// A qualifying `defer(...)` call used as a value. The enclosing function
    /// is still wrapped but the call itself is left in place.
    DeferNotStatement { range: SourceRange },
}

impl Event {
    pub fn transform(&self) -> Transform {
        match self {
            Event::EqualityNormalized { .. } => Transform::Equality,
            Event::PrintLowered { .. } | Event::PrintSkipped { .. } => Transform::Println,
            Event::DeferDesugared { .. } | Event::DeferShadowed { .. } | Event::DeferNotStatement { .. } => {
                Transform::Defer
            }
        }
    }

    pub fn range(&self) -> SourceRange {
        match self {
            Event::EqualityNormalized { range, .. }
            | Event::PrintLowered { range, .. }
            | Event::PrintSkipped { range, .. }
            | Event::DeferDesugared { range, .. }
            | Event::DeferShadowed { range, .. }
            | Event::DeferNotStatement { range } => *range,
        }
    }

    /// Whether the event corresponds to a change in the output tree.
    pub fn is_rewrite(&self) -> bool {
        matches!(
            self,
            Event::EqualityNormalized { .. } | Event::PrintLowered { .. } | Event::DeferDesugared { .. }
        )
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Event::EqualityNormalized { from, to, .. } => write!(f, "replaced `{from}` with `{to}`"),
            Event::PrintLowered { dropped_args: 0, .. } => write!(f, "lowered println to console.log"),
            Event::PrintLowered { dropped_args, .. } => write!(
                f,
                "lowered println to console.log, dropping {dropped_args} extra argument(s)"
            ),
            Event::PrintSkipped { reason, .. } => write!(f, "left println call unchanged: {reason}"),
            Event::DeferDesugared {
                accumulator,
                registrations,
                ..
            } => write!(
                f,
                "wrapped function body, {registrations} registration(s) on `{accumulator}`"
            ),
            Event::DeferShadowed { binding, .. } => {
                write!(f, "defer call left unchanged: `defer` is a local {binding}")
            }
            Event::DeferNotStatement { .. } => {
                write!(f, "defer call used as a value is not rewritten")
            }
        }
    }
}

pub trait DiagnosticSink {
    fn record(&mut self, event: Event);
}

/// Discards everything.
#[derive(Debug, Default, Clone, Copy)]
pub struct NullSink;

impl DiagnosticSink for NullSink {
    fn record(&mut self, _event: Event) {}
}

/// Forwards events to `tracing`.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn record(&mut self, event: Event) {
        let range = event.range();
        if event.is_rewrite() {
            tracing::info!(transform = %event.transform(), lo = range.lo, hi = range.hi, "{event}");
        } else {
            tracing::warn!(transform = %event.transform(), lo = range.lo, hi = range.hi, "{event}");
        }
    }
}

/// Keeps events in the order they were recorded.
#[derive(Debug, Default, Clone)]
pub struct EventLog {
    events: Vec<Event>,
}

impl EventLog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> &[Event] {
        &self.events
    }

    pub fn into_events(self) -> Vec<Event> {
        self.events
    }

    pub fn count(&self, transform: Transform) -> usize {
        self.events
            .iter()
            .filter(|e| e.is_rewrite() && e.transform() == transform)
            .count()
    }
}

impl DiagnosticSink for EventLog {
    fn record(&mut self, event: Event) {
        self.events.push(event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn range() -> SourceRange {
        SourceRange { lo: 3, hi: 9 }
    }

    #[test]
    fn serializes_with_event_tag() {
        let event = Event::EqualityNormalized {
            range: range(),
            from: "==",
            to: "===",
        };
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "event": "equality_normalized",
                "range": { "lo": 3, "hi": 9 },
                "from": "==",
                "to": "===",
            })
        );
    }

    #[test]
    fn log_counts_only_rewrites() {
        let mut log = EventLog::new();
        log.record(Event::PrintLowered {
            range: range(),
            dropped_args: 1,
        });
        log.record(Event::PrintSkipped {
            range: range(),
            reason: "spread argument",
        });
        log.record(Event::DeferNotStatement { range: range() });
        assert_eq!(log.events().len(), 3);
        assert_eq!(log.count(Transform::Println), 1);
        assert_eq!(log.count(Transform::Defer), 0);
    }

    #[test]
    fn display_mentions_dropped_arguments() {
        let event = Event::PrintLowered {
            range: range(),
            dropped_args: 2,
        };
        assert_eq!(
            event.to_string(),
            "lowered println to console.log, dropping 2 extra argument(s)"
        );
    }
}
