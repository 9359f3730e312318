use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tokio::sync::mpsc::{self, Receiver, Sender, error::TrySendError};

use super::CLOUD_ROLE;
use super::envelope::{CLOUD_ROLE_TAG, Envelope};
use super::span::FinishedSpan;
use crate::connection_string::ConnectionString;

const DEFAULT_INGESTION_ENDPOINT: &str = "https://dc.services.visualstudio.com";
const EXPORT_TIMEOUT: Duration = Duration::from_secs(10);
const MAX_BATCH: usize = 64;
const QUEUE_CAPACITY: usize = 4096;

#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

/// Cheap handle for submitting telemetry. Submission never blocks and never
/// fails; envelopes go to a background exporter task through a bounded queue,
/// and are dropped while that queue is full.
#[derive(Clone, Debug)]
pub struct TelemetryClient {
    instrumentation_key: String,
    sender: Option<Sender<Envelope>>,
    dropped: Arc<AtomicU64>,
}

impl TelemetryClient {
    pub fn disabled() -> Self {
        Self {
            instrumentation_key: String::new(),
            sender: None,
            dropped: Arc::default(),
        }
    }

    /// Starts the exporter on the current runtime. An empty instrumentation key
    /// yields a disabled client.
    pub fn start(connection_string: &str) -> Result<Self, ExportError> {
        let conn = ConnectionString::parse(connection_string);
        let Some(instrumentation_key) = conn.get("InstrumentationKey") else {
            return Ok(Self::disabled());
        };

        let endpoint = format!(
            "{}/v2/track",
            conn.get("IngestionEndpoint")
                .unwrap_or(DEFAULT_INGESTION_ENDPOINT)
                .trim_end_matches('/')
        );
        let http = reqwest::Client::builder().timeout(EXPORT_TIMEOUT).build()?;

        let (sender, receiver) = mpsc::channel(QUEUE_CAPACITY);
        actix_web::rt::spawn(run_exporter(receiver, http, endpoint));

        Ok(Self::with_sender(instrumentation_key.to_string(), sender))
    }

    pub fn with_sender(instrumentation_key: String, sender: Sender<Envelope>) -> Self {
        Self {
            instrumentation_key,
            sender: Some(sender),
            dropped: Arc::default(),
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    /// Envelopes discarded because the export queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    pub fn track_span(&self, span: FinishedSpan) {
        if self.is_enabled() {
            self.track(Envelope::from_span(&span));
        }
    }

    pub fn track_log(&self, message: String, level: log::Level, target: &str) {
        if self.is_enabled() {
            self.track(Envelope::from_log(message, level, target));
        }
    }

    fn track(&self, mut envelope: Envelope) {
        let Some(sender) = &self.sender else {
            return;
        };
        envelope.instrumentation_key = self.instrumentation_key.clone();
        envelope.tags.insert(CLOUD_ROLE_TAG.to_string(), CLOUD_ROLE.to_string());
        match sender.try_send(envelope) {
            Ok(()) => {}
            Err(TrySendError::Full(_)) => {
                let dropped = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                if dropped == 1 || dropped % 1000 == 0 {
                    log::warn!("Telemetry queue full, {} items dropped so far", dropped);
                }
            }
            // the exporter is gone; telemetry is best-effort
            Err(TrySendError::Closed(_)) => {}
        }
    }
}

async fn run_exporter(mut receiver: Receiver<Envelope>, http: reqwest::Client, endpoint: String) {
    let mut batch = Vec::with_capacity(MAX_BATCH);

    while let Some(envelope) = receiver.recv().await {
        batch.push(envelope);
        while batch.len() < MAX_BATCH {
            match receiver.try_recv() {
                Ok(envelope) => batch.push(envelope),
                Err(_) => break,
            }
        }

        if let Err(e) = export(&http, &endpoint, &batch).await {
            log::warn!("Dropped {} telemetry items: {}", batch.len(), e);
        }
        batch.clear();
    }
}

async fn export(http: &reqwest::Client, endpoint: &str, batch: &[Envelope]) -> Result<(), ExportError> {
    http.post(endpoint)
        .json(batch)
        .send()
        .await?
        .error_for_status()?;
    Ok(())
}
