//! Per-parameter command tables.
//!
//! A [`ParameterDescriptor`] maps a setpoint name onto the SCPI verb that
//! writes it, the query that reads it back and the strategy used to find its
//! valid range. Device variants differ only in these tables.

use crate::command::Command;
use crate::error::InvalidInput;
use serde::{Deserialize, Serialize};

/// Valid range reported by a device or taken from its manual.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Range {
    pub min: f64,
    pub max: f64,
}

impl Range {
    pub const fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }
}

/// How the valid range of a parameter is discovered.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "strategy", rename_all = "snake_case")]
pub enum Bounds {
    /// Any finite value is written as-is.
    #[default]
    Unbounded,
    /// Constants documented in the device manual.
    Fixed { min: f64, max: f64 },
    /// Asked from the device on every set with `<query> MAX` / `<query> MIN`.
    Queried,
}

/// How an out-of-range request is written.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Sentinel {
    /// `<verb> MAX` / `<verb> MIN`
    #[default]
    Keyword,
    /// `<verb> <bound>`
    Value,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ValueKind {
    #[default]
    Number,
    /// Enumerated or free text. An empty `allowed` list accepts any text.
    Text {
        #[serde(default)]
        allowed: Vec<String>,
        #[serde(default)]
        quoted: bool,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterDescriptor {
    pub name: String,
    pub verb: String,
    pub query: String,
    #[serde(default)]
    pub kind: ValueKind,
    #[serde(default)]
    pub bounds: Bounds,
    #[serde(default)]
    pub sentinel: Sentinel,
    /// Commands written before every set of this parameter.
    #[serde(default)]
    pub prelude: Vec<String>,
}

impl ParameterDescriptor {
    /// Numeric parameter read back with `<verb>?`.
    pub fn number(name: &str, verb: &str) -> Self {
        Self {
            name: name.to_string(),
            verb: verb.to_string(),
            query: format!("{}?", verb),
            kind: ValueKind::Number,
            bounds: Bounds::Unbounded,
            sentinel: Sentinel::Keyword,
            prelude: Vec::new(),
        }
    }

    /// Enumerated parameter read back with `<verb>?`.
    pub fn text(name: &str, verb: &str, allowed: &[&str]) -> Self {
        Self {
            kind: ValueKind::Text {
                allowed: allowed.iter().map(|s| s.to_string()).collect(),
                quoted: false,
            },
            ..Self::number(name, verb)
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = query.to_string();
        self
    }

    pub fn fixed(mut self, min: f64, max: f64) -> Self {
        self.bounds = Bounds::Fixed { min, max };
        self
    }

    pub fn queried(mut self) -> Self {
        self.bounds = Bounds::Queried;
        self
    }

    pub fn value_sentinel(mut self) -> Self {
        self.sentinel = Sentinel::Value;
        self
    }

    pub fn quoted(mut self) -> Self {
        if let ValueKind::Text { quoted, .. } = &mut self.kind {
            *quoted = true;
        }
        self
    }

    pub fn with_prelude(mut self, commands: &[&str]) -> Self {
        self.prelude = commands.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self.kind, ValueKind::Number)
    }

    /// Queries used to discover `(max, min)` for [`Bounds::Queried`].
    pub fn bound_queries(&self) -> (String, String) {
        (format!("{} MAX", self.query), format!("{} MIN", self.query))
    }

    /// Match `value` against the allowed list, returning its canonical
    /// spelling.
    pub fn canonical_text(&self, value: &str) -> Result<String, InvalidInput> {
        let allowed = match &self.kind {
            ValueKind::Text { allowed, .. } => allowed,
            ValueKind::Number => {
                return Err(InvalidInput::KindMismatch {
                    parameter: self.name.clone(),
                    expected: crate::Expected::Number,
                })
            }
        };
        let trimmed = value.trim();
        if allowed.is_empty() {
            return Ok(trimmed.to_string());
        }
        allowed
            .iter()
            .find(|candidate| candidate.eq_ignore_ascii_case(trimmed))
            .cloned()
            .ok_or_else(|| InvalidInput::NotAllowed {
                parameter: self.name.clone(),
                value: trimmed.to_string(),
                allowed: allowed.clone(),
            })
    }

    /// Write command for a text value already validated by
    /// [`Self::canonical_text`].
    pub fn text_command(&self, value: &str) -> Result<Command, InvalidInput> {
        let quoted = matches!(self.kind, ValueKind::Text { quoted: true, .. });
        let arg = if quoted {
            crate::command::quote(value)
        } else {
            value.to_string()
        };
        Command::new(&self.verb)?.arg(&arg)
    }
}

/// Which command a numeric request turns into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SetpointDecision {
    Exact(f64),
    /// Request at or below the minimum; carries the bound.
    Min(f64),
    /// Request at or above the maximum; carries the bound.
    Max(f64),
}

impl SetpointDecision {
    /// Compare a request against an optional range. Bounds are inclusive on
    /// the sentinel side: a request equal to `max` is sent as the maximum.
    pub fn decide(requested: f64, range: Option<Range>) -> Self {
        match range {
            Some(range) if requested >= range.max => SetpointDecision::Max(range.max),
            Some(range) if requested <= range.min => SetpointDecision::Min(range.min),
            _ => SetpointDecision::Exact(requested),
        }
    }

    pub fn is_clamped(&self) -> bool {
        !matches!(self, SetpointDecision::Exact(_))
    }

    pub fn command(&self, descriptor: &ParameterDescriptor) -> Result<Command, InvalidInput> {
        let cmd = Command::new(&descriptor.verb)?;
        match (self, descriptor.sentinel) {
            (SetpointDecision::Exact(value), _) => cmd.value(*value),
            (SetpointDecision::Max(_), Sentinel::Keyword) => cmd.arg("MAX"),
            (SetpointDecision::Min(_), Sentinel::Keyword) => cmd.arg("MIN"),
            (SetpointDecision::Max(bound), Sentinel::Value)
            | (SetpointDecision::Min(bound), Sentinel::Value) => cmd.value(*bound),
        }
    }
}
