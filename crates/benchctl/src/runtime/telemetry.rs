use scpi_io::metrics::{init_metrics, serve_metrics, COMMANDS_SENT, QUERIES_SENT, TRANSPORT_ERRORS};
use std::thread;
use tracing::info;

pub fn init() {
    init_metrics();
}

pub fn start_metrics_server(addr: &Option<String>) -> Option<thread::JoinHandle<()>> {
    addr.as_ref().map(|addr| {
        info!(addr = %addr, "Starting metrics server");
        serve_metrics(addr.clone())
    })
}

/// Log the traffic counters at the end of a run.
pub fn report() {
    info!(
        commands = COMMANDS_SENT.get(),
        queries = QUERIES_SENT.get(),
        transport_errors = TRANSPORT_ERRORS.get(),
        "Instrument traffic"
    );
}
