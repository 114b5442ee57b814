//! Tracing layer that forwards events to a channel.
//!
//! User-visible notices stay generic ("Upload failed"); the cause behind them
//! is logged with `operation` and `error` fields. This layer hands those
//! events to whoever holds the receiving end, separate from the notices.

use serde_json::Value;
use std::collections::BTreeMap;
use tokio::sync::mpsc;
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::Layer;
use tracing_subscriber::layer::Context;

/// One captured tracing event.
#[derive(Debug, Clone, serde::Serialize)]
pub struct DiagnosticEvent {
    /// Module path of the emitting code (e.g. "chemviz_application::dashboard")
    pub target: String,
    /// Log level (INFO, DEBUG, WARN, ERROR)
    pub level: String,
    pub message: String,
    /// Structured fields, excluding `message`
    pub fields: BTreeMap<String, Value>,
    /// RFC 3339 capture time
    pub timestamp: String,
}

impl DiagnosticEvent {
    /// The `operation` field, when the event carries one.
    pub fn operation(&self) -> Option<&str> {
        self.fields.get("operation").and_then(Value::as_str)
    }

    /// The `error` field, when the event carries one.
    pub fn error(&self) -> Option<&str> {
        self.fields.get("error").and_then(Value::as_str)
    }
}

/// Sends every event at or above `min_level` to a channel.
pub struct DiagnosticLayer {
    sender: mpsc::UnboundedSender<DiagnosticEvent>,
    min_level: Level,
}

impl DiagnosticLayer {
    /// Forwards WARN and ERROR events.
    pub fn new(sender: mpsc::UnboundedSender<DiagnosticEvent>) -> Self {
        Self::with_min_level(sender, Level::WARN)
    }

    pub fn with_min_level(sender: mpsc::UnboundedSender<DiagnosticEvent>, min_level: Level) -> Self {
        Self { sender, min_level }
    }

    /// Creates a layer together with the receiving end of its channel.
    pub fn channel() -> (Self, mpsc::UnboundedReceiver<DiagnosticEvent>) {
        let (sender, receiver) = mpsc::unbounded_channel();
        (Self::new(sender), receiver)
    }
}

impl<S> Layer<S> for DiagnosticLayer
where
    S: Subscriber,
{
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let metadata = event.metadata();
        // Level ordering: TRACE > DEBUG > INFO > WARN > ERROR
        if *metadata.level() > self.min_level {
            return;
        }

        let mut fields = BTreeMap::new();
        event.record(&mut FieldVisitor(&mut fields));

        let message = match fields.remove("message") {
            Some(Value::String(message)) => message,
            Some(other) => other.to_string(),
            None => String::new(),
        };

        let diagnostic = DiagnosticEvent {
            target: metadata.target().to_string(),
            level: metadata.level().to_string(),
            message,
            fields,
            timestamp: chrono::Utc::now().to_rfc3339(),
        };

        // A dropped receiver just means nobody is listening.
        let _ = self.sender.send(diagnostic);
    }
}

/// Collects event fields into a JSON map.
struct FieldVisitor<'a>(&'a mut BTreeMap<String, Value>);

impl Visit for FieldVisitor<'_> {
    fn record_f64(&mut self, field: &Field, value: f64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        self.0.insert(field.name().to_string(), serde_json::json!(value));
    }

    fn record_error(&mut self, field: &Field, value: &(dyn std::error::Error + 'static)) {
        self.0
            .insert(field.name().to_string(), serde_json::json!(value.to_string()));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        // `%value` fields arrive here already formatted with Display.
        self.0
            .insert(field.name().to_string(), serde_json::json!(format!("{:?}", value)));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tracing_subscriber::layer::SubscriberExt;

    fn capture(layer: DiagnosticLayer, emit: impl FnOnce()) {
        let subscriber = tracing_subscriber::registry().with(layer);
        tracing::subscriber::with_default(subscriber, emit);
    }

    #[test]
    fn forwards_warn_with_structured_fields() {
        let (layer, mut receiver) = DiagnosticLayer::channel();

        capture(layer, || {
            tracing::warn!(operation = "upload", error = %"connection reset", attempt = 2u64, "Upload failed");
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.level, "WARN");
        assert_eq!(event.message, "Upload failed");
        assert_eq!(event.operation(), Some("upload"));
        assert_eq!(event.error(), Some("connection reset"));
        assert_eq!(event.fields.get("attempt"), Some(&serde_json::json!(2)));
        assert!(!event.fields.contains_key("message"));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn skips_events_below_min_level() {
        let (layer, mut receiver) = DiagnosticLayer::channel();

        capture(layer, || {
            tracing::info!("Dashboard mounted");
            tracing::debug!("History fetched");
            tracing::error!("Disk full");
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.level, "ERROR");
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn min_level_can_be_lowered() {
        let (sender, mut receiver) = mpsc::unbounded_channel();
        let layer = DiagnosticLayer::with_min_level(sender, Level::DEBUG);

        capture(layer, || {
            tracing::debug!(count = 3u64, "History fetched");
            tracing::trace!("ignored");
        });

        let event = receiver.try_recv().unwrap();
        assert_eq!(event.level, "DEBUG");
        assert_eq!(event.fields.get("count"), Some(&serde_json::json!(3)));
        assert!(receiver.try_recv().is_err());
    }

    #[test]
    fn dropped_receiver_is_ignored() {
        let (layer, receiver) = DiagnosticLayer::channel();
        drop(receiver);

        capture(layer, || {
            tracing::warn!("nobody listening");
        });
    }
}
