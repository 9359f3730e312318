use async_trait::async_trait;

use super::TelemetryClient;
use super::span::{HTTP_STATUS_CODE, HTTP_URL, Span, SpanKind};
use crate::storage::{BlobStore, StorageError};

/// Records a dependency span around every call to the wrapped store.
pub struct TracedBlobStore<S> {
    inner: S,
    client: TelemetryClient,
}

impl<S: BlobStore> TracedBlobStore<S> {
    pub fn new(inner: S, client: TelemetryClient) -> Self {
        Self { inner, client }
    }

    fn record<T>(&self, mut span: Span, path: &str, result: &Result<T, StorageError>) {
        let status: u16 = if result.is_ok() { 200 } else { 500 };
        span.set_attribute(HTTP_STATUS_CODE, status);
        span.set_attribute(HTTP_URL, path);
        self.client.track_span(span.finish());
    }
}

#[async_trait]
impl<S: BlobStore> BlobStore for TracedBlobStore<S> {
    async fn download(&self, path: &str) -> Result<Vec<u8>, StorageError> {
        let span = Span::start(format!("blob download {}", path), SpanKind::Client);
        let result = self.inner.download(path).await;
        self.record(span, path, &result);
        result
    }

    async fn upload(&self, path: &str, data: Vec<u8>) -> Result<String, StorageError> {
        let span = Span::start(format!("blob upload {}", path), SpanKind::Client);
        let result = self.inner.upload(path, data).await;
        self.record(span, path, &result);
        result
    }
}
