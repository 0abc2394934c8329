//! Custom tracing layer for sending log events to the dashboard status line

use std::sync::mpsc::Sender;

use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

/// Crates that belong to this project (for filtering)
const PROJECT_CRATES: &[&str] = &[
    "pktdash",
    "pkt_dash",
    "pkt_engine",
    "pkt_capture",
    "pkt_decode",
    "pkt_sim",
];

/// A diagnostic event captured from tracing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiagnosticEvent {
    /// Source of the event (derived from tracing target or custom field)
    pub source: String,
    /// Severity level
    pub level: Level,
    /// Log message
    pub message: String,
}

impl DiagnosticEvent {
    /// One-line form for the status line
    pub fn status_text(&self) -> String {
        format!("{} {}: {}", self.level, self.source, self.message)
    }
}

/// Tracing layer that forwards project events at or above a level over a channel
pub struct DiagnosticsLayer {
    tx: Sender<DiagnosticEvent>,
    min_level: Level,
}

impl DiagnosticsLayer {
    /// Create a layer forwarding WARN and ERROR events
    pub fn new(tx: Sender<DiagnosticEvent>) -> Self {
        Self::with_level(tx, Level::WARN)
    }

    /// Create a layer forwarding events at `min_level` or more severe
    pub fn with_level(tx: Sender<DiagnosticEvent>, min_level: Level) -> Self {
        Self { tx, min_level }
    }
}

impl<S: Subscriber> Layer<S> for DiagnosticsLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        if *metadata.level() > self.min_level || !is_project_target(metadata.target()) {
            return;
        }

        let mut visitor = MessageVisitor::default();
        event.record(&mut visitor);

        // Use custom source if provided, otherwise derive from target
        let source = visitor
            .source
            .unwrap_or_else(|| simplify_target(metadata.target()));

        let diagnostic = DiagnosticEvent {
            source,
            level: *metadata.level(),
            message: visitor.message.unwrap_or_default(),
        };

        // Send to channel (ignore errors if receiver is dropped)
        let _ = self.tx.send(diagnostic);
    }
}

fn is_project_target(target: &str) -> bool {
    PROJECT_CRATES
        .iter()
        .any(|crate_name| target.starts_with(crate_name))
}

/// Visitor to extract message and optional source from tracing fields
#[derive(Default)]
struct MessageVisitor {
    message: Option<String>,
    source: Option<String>,
}

impl Visit for MessageVisitor {
    fn record_str(&mut self, field: &Field, value: &str) {
        match field.name() {
            "message" => self.message = Some(value.to_string()),
            "source" => self.source = Some(value.to_string()),
            _ => {}
        }
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        match field.name() {
            "message" => self.message = Some(format!("{:?}", value)),
            "source" => self.source = Some(format!("{:?}", value)),
            _ => {}
        }
    }
}

/// Simplify a module path target to a user-friendly source name
fn simplify_target(target: &str) -> String {
    // e.g., "pkt_engine::engine" -> "Engine", "pkt_capture::dump" -> "Dump"
    target
        .rsplit("::")
        .next()
        .map(|s| {
            let mut chars = s.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().collect::<String>() + chars.as_str(),
                None => s.to_string(),
            }
        })
        .unwrap_or_else(|| target.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;
    use tracing_subscriber::layer::SubscriberExt;

    #[test]
    fn test_simplify_target() {
        assert_eq!(simplify_target("pkt_engine::engine"), "Engine");
        assert_eq!(simplify_target("pkt_capture::dump"), "Dump");
        assert_eq!(simplify_target("simple"), "Simple");
    }

    #[test]
    fn test_project_target_filter() {
        assert!(is_project_target("pkt_capture::live"));
        assert!(is_project_target("pktdash::app"));
        assert!(!is_project_target("mio::poll"));
    }

    #[test]
    fn test_forwards_warnings_only() {
        let (tx, rx) = mpsc::channel();
        let subscriber = tracing_subscriber::registry().with(DiagnosticsLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            tracing::info!(target: "pkt_engine::engine", "Capture started");
            tracing::warn!(target: "pkt_engine::engine", source = "Dump", "Cannot record to capture.pcap");
            tracing::error!(target: "other_crate", "not ours");
        });

        let events: Vec<_> = rx.try_iter().collect();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].level, Level::WARN);
        assert_eq!(events[0].source, "Dump");
        assert_eq!(events[0].message, "Cannot record to capture.pcap");
        assert_eq!(
            events[0].status_text(),
            "WARN Dump: Cannot record to capture.pcap"
        );
    }

    #[test]
    fn test_source_falls_back_to_target() {
        let (tx, rx) = mpsc::channel();
        let subscriber = tracing_subscriber::registry().with(DiagnosticsLayer::new(tx));

        tracing::subscriber::with_default(subscriber, || {
            tracing::error!(target: "pkt_capture::live", "read failed");
        });

        let event = rx.try_recv().unwrap();
        assert_eq!(event.source, "Live");
        assert_eq!(event.level, Level::ERROR);
    }
}
