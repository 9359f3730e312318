use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use serde_json::{Value, json};
use std::collections::BTreeMap;
use std::time::Duration;

use super::span::{FinishedSpan, HTTP_URL, SpanKind};

pub const CLOUD_ROLE_TAG: &str = "ai.cloud.role";

/// Application Insights ingestion envelope.
#[derive(Debug, Clone, Serialize)]
pub struct Envelope {
    pub name: &'static str,
    pub time: String,
    #[serde(rename = "iKey")]
    pub instrumentation_key: String,
    pub tags: BTreeMap<String, String>,
    pub data: EnvelopeData,
}

#[derive(Debug, Clone, Serialize)]
pub struct EnvelopeData {
    #[serde(rename = "baseType")]
    pub base_type: &'static str,
    #[serde(rename = "baseData")]
    pub base_data: Value,
}

impl Envelope {
    fn new(name: &'static str, time: DateTime<Utc>, base_type: &'static str, base_data: Value) -> Self {
        Self {
            name,
            time: time.to_rfc3339_opts(SecondsFormat::Micros, true),
            instrumentation_key: String::new(),
            tags: BTreeMap::new(),
            data: EnvelopeData {
                base_type,
                base_data,
            },
        }
    }

    pub fn from_span(span: &FinishedSpan) -> Self {
        let name = span
            .attribute("name")
            .and_then(Value::as_str)
            .unwrap_or(span.name.as_str())
            .to_string();
        let url = span.attribute(HTTP_URL).and_then(Value::as_str).unwrap_or_default();
        let status = span.status_code().unwrap_or(0);
        let properties: BTreeMap<&str, String> = span
            .attributes
            .iter()
            .map(|(k, v)| (k.as_str(), attribute_text(v)))
            .collect();

        let mut envelope = match span.kind {
            SpanKind::Server => Envelope::new(
                "Microsoft.ApplicationInsights.Request",
                span.start_time,
                "RequestData",
                json!({
                    "ver": 2,
                    "id": span.span_id,
                    "name": name,
                    "duration": format_duration(span.duration),
                    "responseCode": status.to_string(),
                    "success": status < 400,
                    "url": url,
                    "properties": properties,
                }),
            ),
            SpanKind::Client => Envelope::new(
                "Microsoft.ApplicationInsights.RemoteDependency",
                span.start_time,
                "RemoteDependencyData",
                json!({
                    "ver": 2,
                    "id": span.span_id,
                    "name": name,
                    "duration": format_duration(span.duration),
                    "resultCode": status.to_string(),
                    "success": status < 400,
                    "data": url,
                    "type": "HTTP",
                    "properties": properties,
                }),
            ),
        };
        envelope.tags.insert("ai.operation.id".to_string(), span.trace_id.clone());
        envelope.tags.insert("ai.operation.name".to_string(), name);
        envelope
    }

    pub fn from_log(message: String, level: log::Level, target: &str) -> Self {
        Envelope::new(
            "Microsoft.ApplicationInsights.Message",
            Utc::now(),
            "MessageData",
            json!({
                "ver": 2,
                "message": message,
                "severityLevel": severity_level(level),
                "properties": { "module": target },
            }),
        )
    }
}

fn attribute_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn severity_level(level: log::Level) -> u8 {
    match level {
        log::Level::Error => 3,
        log::Level::Warn => 2,
        log::Level::Info => 1,
        log::Level::Debug | log::Level::Trace => 0,
    }
}

/// `d.hh:mm:ss.fff`, the duration format the ingestion API expects.
pub fn format_duration(duration: Duration) -> String {
    let total_millis = duration.as_millis();
    let millis = total_millis % 1000;
    let total_secs = total_millis / 1000;
    let (secs, mins) = (total_secs % 60, (total_secs / 60) % 60);
    let (hours, days) = ((total_secs / 3600) % 24, total_secs / 86_400);
    format!("{}.{:02}:{:02}:{:02}.{:03}", days, hours, mins, secs, millis)
}
