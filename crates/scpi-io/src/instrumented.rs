use crate::metrics::{COMMANDS_SENT, QUERIES_SENT, QUERY_LATENCY, TRANSPORT_ERRORS};
use scpi_core::{Transport, TransportError};
use std::time::Instant;
use tracing::warn;

/// Wraps a transport and feeds the Prometheus counters.
pub struct InstrumentedTransport<T> {
    inner: T,
}

impl<T: Transport> InstrumentedTransport<T> {
    pub fn new(inner: T) -> Self {
        Self { inner }
    }

    fn record<R>(&self, op: &str, result: Result<R, TransportError>) -> Result<R, TransportError> {
        if let Err(e) = &result {
            TRANSPORT_ERRORS.inc();
            warn!(resource = %self.inner.resource(), op, error = %e, "Transport error");
        }
        result
    }
}

impl<T: Transport> Transport for InstrumentedTransport<T> {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        COMMANDS_SENT.inc();
        let result = self.inner.write(command);
        self.record("write", result)
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        QUERIES_SENT.inc();
        let started = Instant::now();
        let result = self.inner.query(command);
        if result.is_ok() {
            QUERY_LATENCY.observe(started.elapsed().as_secs_f64());
        }
        self.record("query", result)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        let result = self.inner.close();
        self.record("close", result)
    }

    fn resource(&self) -> &str {
        self.inner.resource()
    }
}
