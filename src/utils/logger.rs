//! Tracing setup. `console` is the pretty formatter for local runs; `json`
//! writes one OTel-shaped log record per line for collectors.

use std::fmt::Debug;

use chrono::{SecondsFormat, Utc};
use serde_json::{json, Map, Value};
use tracing::field::{Field, Visit};
use tracing::level_filters::LevelFilter;
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::fmt::format::Writer;
use tracing_subscriber::fmt::{FmtContext, FormatEvent, FormatFields};
use tracing_subscriber::registry::LookupSpan;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use crate::config::LoggingConfig;

/// Message text plus the structured fields of one event.
#[derive(Default)]
struct EventFields {
    body: Option<String>,
    attributes: Map<String, Value>,
}

impl EventFields {
    fn put(&mut self, field: &Field, value: Value) {
        match (field.name(), value) {
            ("message", Value::String(text)) => self.body = Some(text),
            (name, value) => {
                self.attributes.insert(name.to_string(), value);
            }
        }
    }
}

impl Visit for EventFields {
    fn record_str(&mut self, field: &Field, value: &str) {
        self.put(field, Value::from(value));
    }

    fn record_i64(&mut self, field: &Field, value: i64) {
        self.put(field, Value::from(value));
    }

    fn record_u64(&mut self, field: &Field, value: u64) {
        self.put(field, Value::from(value));
    }

    fn record_bool(&mut self, field: &Field, value: bool) {
        self.put(field, Value::from(value));
    }

    fn record_debug(&mut self, field: &Field, value: &dyn Debug) {
        self.put(field, Value::from(format!("{:?}", value)));
    }
}

fn severity_number(level: &Level) -> u8 {
    match *level {
        Level::TRACE => 1,
        Level::DEBUG => 5,
        Level::INFO => 9,
        Level::WARN => 13,
        Level::ERROR => 17,
    }
}

/// Formats events as JSON lines. The resource block is built once.
struct JsonLines {
    resource: Value,
}

impl JsonLines {
    fn new(config: &LoggingConfig) -> Self {
        JsonLines {
            resource: json!({
                "service.name": config.service_name,
                "service.version": config.service_version,
            }),
        }
    }
}

impl<S, N> FormatEvent<S, N> for JsonLines
where
    S: Subscriber + for<'lookup> LookupSpan<'lookup>,
    N: for<'writer> FormatFields<'writer> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();
        let mut fields = EventFields::default();
        event.record(&mut fields);

        let mut attributes = fields.attributes;
        attributes.insert("code.target".to_string(), Value::from(metadata.target()));
        if let Some(span) = ctx.lookup_current() {
            attributes.insert("span".to_string(), Value::from(span.name()));
        }

        let record = json!({
            "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true),
            "severity_text": metadata.level().as_str(),
            "severity_number": severity_number(metadata.level()),
            "body": fields.body.unwrap_or_else(|| metadata.name().to_string()),
            "resource": self.resource,
            "attributes": attributes,
        });
        writeln!(writer, "{}", record)
    }
}

/// Installs the global subscriber. `RUST_LOG` directives take precedence
/// over `level`. An unknown `level` is a configuration error; an unknown
/// `format` falls back to console output.
pub fn init_logging(config: &LoggingConfig) -> Result<(), String> {
    let level: LevelFilter = config.level.trim().parse().map_err(|_| {
        format!(
            "Invalid logging.level '{}'. Valid values: trace, debug, info, warn, error",
            config.level
        )
    })?;
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let registry = tracing_subscriber::registry().with(filter);

    let installed = if config.format.trim().eq_ignore_ascii_case("json") {
        registry
            .with(fmt::layer().event_format(JsonLines::new(config)))
            .try_init()
    } else {
        registry.with(fmt::layer().pretty()).try_init()
    };
    installed.map_err(|e| format!("Failed to install log subscriber: {}", e))
}
