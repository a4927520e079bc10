//! Error taxonomy shared by every instrument session.
//!
//! Out-of-range setpoints are not errors: they are clamped by the
//! controller and reported through [`crate::SetpointDecision`].

use thiserror::Error;

/// Failures of the underlying write/query channel.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("I/O error on {resource}: {source}")]
    Io {
        resource: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Timed out after {timeout_ms} ms waiting for response to '{command}'")]
    Timeout { command: String, timeout_ms: u64 },

    #[error("Connection to {resource} closed by the instrument")]
    Disconnected { resource: String },

    #[error("Transport already closed")]
    Closed,

    #[error("Failed to connect to {resource}: {reason}")]
    Connect { resource: String, reason: String },
}

/// Kind of value a response was expected to hold.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Expected {
    Number,
    Bool,
    Text,
}

impl std::fmt::Display for Expected {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Expected::Number => f.write_str("number"),
            Expected::Bool => f.write_str("boolean"),
            Expected::Text => f.write_str("text"),
        }
    }
}

/// A response that could not be interpreted as the expected type.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("Failed to parse response {raw:?} to '{query}' as {expected}")]
pub struct ParseError {
    pub query: String,
    pub raw: String,
    pub expected: Expected,
}

/// Requests rejected before anything reaches the instrument.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum InvalidInput {
    #[error("Requested value for '{parameter}' is not finite: {value}")]
    NonFinite { parameter: String, value: f64 },

    #[error("Unknown parameter '{parameter}' for {model}")]
    UnknownParameter { model: String, parameter: String },

    #[error("Parameter '{parameter}' holds {expected} values")]
    KindMismatch { parameter: String, expected: Expected },

    #[error("'{value}' is not an allowed value for '{parameter}' (allowed: {allowed:?})")]
    NotAllowed {
        parameter: String,
        value: String,
        allowed: Vec<String>,
    },

    #[error("Command text contains a line break: {text:?}")]
    ControlCharacter { text: String },

    #[error("Invalid list program: {reason}")]
    ListProgram { reason: String },

    #[error("{model} does not support {operation}")]
    Unsupported { model: String, operation: String },

    #[error("Invalid argument: {reason}")]
    Argument { reason: String },
}

/// Any failure surfaced by an instrument session.
#[derive(Debug, Error)]
pub enum InstrumentError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    InvalidInput(#[from] InvalidInput),
}

impl InstrumentError {
    pub fn is_transport(&self) -> bool {
        matches!(self, InstrumentError::Transport(_))
    }

    pub fn is_parse(&self) -> bool {
        matches!(self, InstrumentError::Parse(_))
    }
}

pub type Result<T, E = InstrumentError> = std::result::Result<T, E>;
