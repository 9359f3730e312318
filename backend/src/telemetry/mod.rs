pub mod client;
pub mod envelope;
pub mod logger;
pub mod middleware;
pub mod span;
pub mod traced_store;

pub use client::TelemetryClient;
pub use envelope::Envelope;
pub use logger::TelemetryLogger;
pub use middleware::TelemetryMiddleware;
pub use traced_store::TracedBlobStore;

/// Role label attached to every exported trace and log record.
pub const CLOUD_ROLE: &str = "Analysis API";
