use scpi_core::InstrumentError;
use scpi_io::AddressError;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BenchError {
    #[error("Invalid command line: {0}")]
    Usage(String),

    #[error("Failed to read {path}: {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse {path}: {source}")]
    ParseFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("Unknown profile '{0}' (built-in profiles: {builtin})", builtin = scpi_core::profiles::BUILTIN.join(", "))]
    UnknownProfile(String),

    #[error("No instrument named '{0}' in the rig")]
    UnknownInstrument(String),

    #[error("Instrument '{0}' has no address (required unless simulating)")]
    MissingAddress(String),

    #[error(transparent)]
    Address(#[from] AddressError),

    #[error("{instrument}: {source}")]
    Instrument {
        instrument: String,
        #[source]
        source: InstrumentError,
    },

    #[error("Step {index} ({op}) on '{instrument}' failed: {source}")]
    Step {
        index: usize,
        op: &'static str,
        instrument: String,
        #[source]
        source: InstrumentError,
    },

    #[error("Journal error: {0}")]
    Journal(#[from] std::io::Error),
}

impl BenchError {
    pub fn instrument(instrument: &str, source: impl Into<InstrumentError>) -> Self {
        BenchError::Instrument {
            instrument: instrument.to_string(),
            source: source.into(),
        }
    }
}
