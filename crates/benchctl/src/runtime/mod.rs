mod app;
mod config;
mod logging;
mod telemetry;

pub use app::{execute, run, run_from_args};
pub use config::RuntimeConfig;
pub use logging::init_tracing;
