pub mod error;
pub mod infra;
pub mod link;
pub mod procedure;
pub mod rig;
pub mod runtime;

pub use error::BenchError;
pub use procedure::{Procedure, RunSummary, Runner, Step};
pub use rig::{OpenOptions, Rig, RigConfig};
