pub mod instrumented;
pub mod metrics;
pub mod resource;
pub mod tcp;

pub use instrumented::InstrumentedTransport;
pub use metrics::{init_metrics, serve_metrics};
pub use resource::{AddressError, ResourceAddress, RAW_SCPI_PORT};
pub use tcp::{TcpTransport, DEFAULT_TIMEOUT};
