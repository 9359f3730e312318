use chrono::{DateTime, Utc};
use serde_json::Value;
use std::collections::BTreeMap;
use std::time::{Duration, Instant};
use uuid::Uuid;

pub const HTTP_STATUS_CODE: &str = "http.status_code";
pub const HTTP_URL: &str = "http.url";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpanKind {
    Server,
    Client,
}

#[derive(Debug)]
pub struct Span {
    name: String,
    kind: SpanKind,
    trace_id: String,
    span_id: String,
    start_time: DateTime<Utc>,
    started: Instant,
    attributes: BTreeMap<String, Value>,
}

/// A closed span, ready for export.
#[derive(Debug, Clone)]
pub struct FinishedSpan {
    pub name: String,
    pub kind: SpanKind,
    pub trace_id: String,
    pub span_id: String,
    pub start_time: DateTime<Utc>,
    pub duration: Duration,
    pub attributes: BTreeMap<String, Value>,
}

impl Span {
    pub fn start(name: impl Into<String>, kind: SpanKind) -> Self {
        let span_id = Uuid::new_v4().simple().to_string()[..16].to_string();
        Self {
            name: name.into(),
            kind,
            trace_id: Uuid::new_v4().simple().to_string(),
            span_id,
            start_time: Utc::now(),
            started: Instant::now(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn server(name: impl Into<String>) -> Self {
        Self::start(name, SpanKind::Server)
    }

    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<Value>) {
        self.attributes.insert(key.into(), value.into());
    }

    pub fn finish(self) -> FinishedSpan {
        FinishedSpan {
            name: self.name,
            kind: self.kind,
            trace_id: self.trace_id,
            span_id: self.span_id,
            start_time: self.start_time,
            duration: self.started.elapsed(),
            attributes: self.attributes,
        }
    }
}

impl FinishedSpan {
    pub fn attribute(&self, key: &str) -> Option<&Value> {
        self.attributes.get(key)
    }

    pub fn status_code(&self) -> Option<u16> {
        self.attribute(HTTP_STATUS_CODE)
            .and_then(Value::as_u64)
            .and_then(|code| u16::try_from(code).ok())
    }
}
