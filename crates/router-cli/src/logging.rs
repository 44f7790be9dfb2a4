//! Structured JSON-line logging: a hand-rolled `tracing_subscriber::Layer`
//! (`FieldVisitor`/`Layer` pair, in the style of
//! `crucible-acp::tracing_utils::LogCaptureLayer`) that emits one JSON
//! object per event rather than relying on the stock JSON formatter.
//!
//! Every line written is a single JSON object:
//! `{"timestamp": <ISO-8601 UTC>, "level": "info"|"warn"|"error", "component": <string>,
//!   "message": <string>, "metadata": {..}}` (`metadata` omitted when empty).
//! Lines go to stderr: stdout is reserved for the MCP JSON-RPC stream.

use std::io::Write;

use serde::Serialize;
use serde_json::{Map, Value};
use tracing::field::{Field, Visit};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::layer::Context;
use tracing_subscriber::Layer;

#[derive(Serialize)]
struct LogLine {
    timestamp: String,
    level: &'static str,
    component: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    metadata: Option<Value>,
}

/// Maps a `tracing::Level` to the three levels the router's log lines use
/// (`DEBUG`/`INFO` -> info, `WARN` -> warn, `ERROR` -> error).
fn level_name(level: &Level) -> &'static str {
    match *level {
        Level::ERROR => "error",
        Level::WARN => "warn",
        Level::INFO | Level::DEBUG | Level::TRACE => "info",
    }
}

#[derive(Default)]
struct FieldVisitor {
    message: String,
    metadata: Map<String, Value>,
}

impl Visit for FieldVisitor {
    fn record_debug(&mut self, field: &Field, value: &dyn std::fmt::Debug) {
        let rendered = format!("{value:?}");
        if field.name() == "message" {
            self.message = rendered;
        } else {
            self.metadata.insert(field.name().to_string(), Value::String(rendered));
        }
    }

    fn record_str(&mut self, field: &Field, value: &str) {
        if field.name() == "message" {
            self.message = value.to_string();
        } else {
            self.metadata.insert(field.name().to_string(), Value::String(value.to_string()));
        }
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.metadata.insert(field.name().to_string(), Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.metadata.insert(field.name().to_string(), Value::from(value));
    }

    fn record_f64(&mut self, field: &Field, value: f64) {
        self.metadata.insert(field.name().to_string(), Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.metadata.insert(field.name().to_string(), Value::from(value));
    }
}

/// Emits one JSON line per event to stderr in the router's log schema.
pub struct JsonLogLayer;

impl<S: Subscriber> Layer<S> for JsonLogLayer {
    fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
        let mut visitor = FieldVisitor::default();
        event.record(&mut visitor);

        let metadata = if visitor.metadata.is_empty() {
            None
        } else {
            Some(Value::Object(visitor.metadata))
        };

        let line = LogLine {
            timestamp: chrono::Utc::now().to_rfc3339(),
            level: level_name(event.metadata().level()),
            component: event.metadata().target().to_string(),
            message: visitor.message,
            metadata,
        };

        if let Ok(json) = serde_json::to_string(&line) {
            let _ = writeln!(std::io::stderr(), "{json}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maps_tracing_levels_to_the_three_spec_levels() {
        assert_eq!(level_name(&Level::ERROR), "error");
        assert_eq!(level_name(&Level::WARN), "warn");
        assert_eq!(level_name(&Level::INFO), "info");
        assert_eq!(level_name(&Level::DEBUG), "info");
        assert_eq!(level_name(&Level::TRACE), "info");
    }
}
