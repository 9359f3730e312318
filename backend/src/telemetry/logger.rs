use log::{Level, Log, Metadata, Record, SetLoggerError};

use super::TelemetryClient;

const CRATE_TARGET: &str = env!("CARGO_CRATE_NAME");
// the exporter logs its own failures; forwarding those would feed them back into it
const TELEMETRY_TARGET: &str = concat!(env!("CARGO_CRATE_NAME"), "::telemetry");

/// `env_logger` output plus forwarding of this crate's records to the
/// monitoring backend.
pub struct TelemetryLogger {
    inner: env_logger::Logger,
    client: TelemetryClient,
    forward_level: Level,
}

impl TelemetryLogger {
    pub fn init(client: TelemetryClient) -> Result<(), SetLoggerError> {
        let inner = env_logger::Builder::from_env(env_logger::Env::new().default_filter_or("info")).build();
        let max_level = inner.filter();
        log::set_boxed_logger(Box::new(Self {
            inner,
            client,
            forward_level: Level::Info,
        }))?;
        log::set_max_level(max_level);
        Ok(())
    }

    fn forwards(&self, metadata: &Metadata) -> bool {
        let target = metadata.target();
        metadata.level() <= self.forward_level
            && target.starts_with(CRATE_TARGET)
            && !target.starts_with(TELEMETRY_TARGET)
    }
}

impl Log for TelemetryLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        self.inner.enabled(metadata)
    }

    fn log(&self, record: &Record) {
        if !self.inner.matches(record) {
            return;
        }
        self.inner.log(record);

        if self.client.is_enabled() && self.forwards(record.metadata()) {
            self.client
                .track_log(record.args().to_string(), record.level(), record.target());
        }
    }

    fn flush(&self) {
        self.inner.flush();
    }
}
