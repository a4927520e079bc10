use crate::descriptor::ParameterDescriptor;
use crate::error::InvalidInput;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputCommands {
    pub on: String,
    pub off: String,
    /// Read once at connect time; never used as a read-back after switching.
    #[serde(default)]
    pub query: Option<String>,
}

impl OutputCommands {
    pub fn new(on: &str, off: &str) -> Self {
        Self {
            on: on.to_string(),
            off: off.to_string(),
            query: None,
        }
    }

    pub fn with_query(mut self, query: &str) -> Self {
        self.query = Some(query.to_string());
        self
    }

    pub fn command(&self, enabled: bool) -> &str {
        if enabled {
            &self.on
        } else {
            &self.off
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SetpointValue {
    Number(f64),
    Text(String),
}

/// Setpoint applied through the controller right after connecting.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InitialSetpoint {
    pub parameter: String,
    pub value: SetpointValue,
}

impl InitialSetpoint {
    pub fn number(parameter: &str, value: f64) -> Self {
        Self {
            parameter: parameter.to_string(),
            value: SetpointValue::Number(value),
        }
    }

    pub fn text(parameter: &str, value: &str) -> Self {
        Self {
            parameter: parameter.to_string(),
            value: SetpointValue::Text(value.to_string()),
        }
    }
}

fn default_identify_query() -> String {
    "*IDN?".to_string()
}

/// Everything that distinguishes one instrument model from another.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceProfile {
    pub model: String,
    #[serde(default = "default_identify_query")]
    pub identify_query: String,
    /// Queried once after identification and logged.
    #[serde(default)]
    pub error_query: Option<String>,
    pub parameters: Vec<ParameterDescriptor>,
    #[serde(default)]
    pub output: Option<OutputCommands>,
    #[serde(default)]
    pub on_connect: Vec<String>,
    #[serde(default)]
    pub initial_reads: Vec<String>,
    #[serde(default)]
    pub initial_setpoints: Vec<InitialSetpoint>,
    #[serde(default)]
    pub list_mode: bool,
}

impl DeviceProfile {
    pub fn new(model: &str) -> Self {
        Self {
            model: model.to_string(),
            identify_query: default_identify_query(),
            error_query: None,
            parameters: Vec::new(),
            output: None,
            on_connect: Vec::new(),
            initial_reads: Vec::new(),
            initial_setpoints: Vec::new(),
            list_mode: false,
        }
    }

    pub fn parameter(&self, name: &str) -> Option<&ParameterDescriptor> {
        self.parameters.iter().find(|p| p.name == name)
    }

    pub fn lookup(&self, name: &str) -> Result<&ParameterDescriptor, InvalidInput> {
        self.parameter(name)
            .ok_or_else(|| InvalidInput::UnknownParameter {
                model: self.model.clone(),
                parameter: name.to_string(),
            })
    }

    /// Check that names are unique and that connect-time references resolve.
    pub fn validate(&self) -> Result<(), InvalidInput> {
        for (i, param) in self.parameters.iter().enumerate() {
            if self.parameters[..i].iter().any(|p| p.name == param.name) {
                return Err(InvalidInput::Argument {
                    reason: format!(
                        "duplicate parameter '{}' in profile {}",
                        param.name, self.model
                    ),
                });
            }
        }
        for name in &self.initial_reads {
            self.lookup(name)?;
        }
        for setpoint in &self.initial_setpoints {
            self.lookup(&setpoint.parameter)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_rejects_dangling_reads() {
        let mut profile = DeviceProfile::new("TEST");
        profile
            .parameters
            .push(ParameterDescriptor::number("voltage", "VOLT"));
        profile.initial_reads.push("frequency".to_string());
        assert!(matches!(
            profile.validate(),
            Err(InvalidInput::UnknownParameter { .. })
        ));
    }

    #[test]
    fn validate_rejects_duplicates() {
        let mut profile = DeviceProfile::new("TEST");
        profile
            .parameters
            .push(ParameterDescriptor::number("voltage", "VOLT"));
        profile
            .parameters
            .push(ParameterDescriptor::number("voltage", "VOLT:AC"));
        assert!(profile.validate().is_err());
    }

    #[test]
    fn minimal_profile_from_json() {
        let raw = r#"{
            "model": "Bench PSU",
            "parameters": [{"name": "voltage", "verb": "VOLT", "query": "VOLT?"}],
            "output": {"on": "OUTP ON", "off": "OUTP OFF"},
            "initial_setpoints": [{"parameter": "voltage", "value": 0.0}]
        }"#;
        let profile: DeviceProfile = serde_json::from_str(raw).unwrap();
        assert_eq!(profile.identify_query, "*IDN?");
        assert_eq!(profile.output.as_ref().unwrap().command(false), "OUTP OFF");
        assert_eq!(
            profile.initial_setpoints[0].value,
            SetpointValue::Number(0.0)
        );
        profile.validate().unwrap();
    }
}
