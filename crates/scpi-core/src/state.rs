use serde::Serialize;
use std::collections::BTreeMap;

/// Last value an instrument reported for a parameter.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Reading {
    Number(f64),
    Text(String),
}

impl Reading {
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Reading::Number(v) => Some(*v),
            Reading::Text(_) => None,
        }
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            Reading::Text(s) => Some(s),
            Reading::Number(_) => None,
        }
    }
}

/// Local mirror of read-back device values.
///
/// Only the session writes here, and only with values the device reported.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CachedState {
    identity: Option<String>,
    output_enabled: Option<bool>,
    switched_on: bool,
    readings: BTreeMap<String, Reading>,
}

impl CachedState {
    pub fn identity(&self) -> Option<&str> {
        self.identity.as_deref()
    }

    /// Last known output state: read at connect when the profile has an
    /// output query, then whatever the session last commanded. `None` if
    /// neither happened.
    pub fn output_enabled(&self) -> Option<bool> {
        self.output_enabled
    }

    /// Whether this session has ever switched the output on.
    pub fn switched_on(&self) -> bool {
        self.switched_on
    }

    pub fn get(&self, parameter: &str) -> Option<&Reading> {
        self.readings.get(parameter)
    }

    pub fn number(&self, parameter: &str) -> Option<f64> {
        self.get(parameter).and_then(Reading::as_number)
    }

    pub fn text(&self, parameter: &str) -> Option<&str> {
        self.get(parameter).and_then(Reading::as_text)
    }

    pub fn readings(&self) -> impl Iterator<Item = (&str, &Reading)> {
        self.readings.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub(crate) fn set_identity(&mut self, identity: String) {
        self.identity = Some(identity);
    }

    pub(crate) fn set_output(&mut self, enabled: bool) {
        self.output_enabled = Some(enabled);
    }

    pub(crate) fn switch_output(&mut self, enabled: bool) {
        self.output_enabled = Some(enabled);
        self.switched_on |= enabled;
    }

    pub(crate) fn record(&mut self, parameter: &str, reading: Reading) {
        self.readings.insert(parameter.to_string(), reading);
    }
}
