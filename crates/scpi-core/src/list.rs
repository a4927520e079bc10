//! Stepped list-mode programs.

use crate::command::Command;
use crate::error::InvalidInput;
use serde::{Deserialize, Serialize};

/// A sequence of voltage and/or frequency steps with per-step dwell times
/// in seconds, repeated `count` times.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ListProgram {
    pub dwell: Vec<f64>,
    #[serde(default)]
    pub voltage: Vec<f64>,
    #[serde(default)]
    pub frequency: Vec<f64>,
    #[serde(default = "default_count")]
    pub count: u32,
}

fn default_count() -> u32 {
    1
}

impl ListProgram {
    pub fn new(dwell: Vec<f64>) -> Self {
        Self {
            dwell,
            voltage: Vec::new(),
            frequency: Vec::new(),
            count: 1,
        }
    }

    pub fn voltage(mut self, steps: Vec<f64>) -> Self {
        self.voltage = steps;
        self
    }

    pub fn frequency(mut self, steps: Vec<f64>) -> Self {
        self.frequency = steps;
        self
    }

    pub fn count(mut self, count: u32) -> Self {
        self.count = count;
        self
    }

    pub fn validate(&self) -> Result<(), InvalidInput> {
        let invalid =
            |reason: String| -> Result<(), InvalidInput> { Err(InvalidInput::ListProgram { reason }) };

        if self.dwell.is_empty() {
            return invalid("dwell list is empty".to_string());
        }
        if self.count == 0 {
            return invalid("repeat count must be at least 1".to_string());
        }
        for (label, steps) in [("voltage", &self.voltage), ("frequency", &self.frequency)] {
            if !steps.is_empty() && steps.len() != self.dwell.len() {
                return invalid(format!(
                    "{} list has {} steps but dwell list has {}",
                    label,
                    steps.len(),
                    self.dwell.len()
                ));
            }
        }
        let all = self
            .dwell
            .iter()
            .chain(&self.voltage)
            .chain(&self.frequency);
        if let Some(bad) = all.copied().find(|v| !v.is_finite()) {
            return invalid(format!("non-finite step value {}", bad));
        }
        if let Some(bad) = self.dwell.iter().copied().find(|v| *v < 0.0) {
            return invalid(format!("negative dwell time {}", bad));
        }
        Ok(())
    }

    /// Commands in the order the instrument must receive them.
    pub fn commands(&self) -> Result<Vec<Command>, InvalidInput> {
        self.validate()?;

        let mut commands = Vec::new();
        if !self.voltage.is_empty() {
            commands.push(Command::new("VOLT:MODE")?.arg("LIST")?);
        }
        if !self.frequency.is_empty() {
            commands.push(Command::new("FREQ:MODE")?.arg("LIST")?);
        }
        if !self.voltage.is_empty() {
            commands.push(Command::list("LIST:VOLT", &self.voltage)?);
        }
        if !self.frequency.is_empty() {
            commands.push(Command::list("LIST:FREQ", &self.frequency)?);
        }
        commands.push(Command::list("LIST:DWEL", &self.dwell)?);
        commands.push(Command::new("LIST:COUN")?.arg(&self.count.to_string())?);
        commands.push(Command::new("LIST:STEP")?.arg("AUTO")?);
        commands.push(Command::new("INIT")?);
        Ok(commands)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rendered(program: &ListProgram) -> Vec<String> {
        program
            .commands()
            .unwrap()
            .into_iter()
            .map(Command::into_string)
            .collect()
    }

    #[test]
    fn voltage_list_order() {
        let program = ListProgram::new(vec![1.0, 1.0, 1.0]).voltage(vec![10.0, 20.0, 50.0]);
        assert_eq!(
            rendered(&program),
            vec![
                "VOLT:MODE LIST",
                "LIST:VOLT 10, 20, 50",
                "LIST:DWEL 1, 1, 1",
                "LIST:COUN 1",
                "LIST:STEP AUTO",
                "INIT",
            ]
        );
    }

    #[test]
    fn voltage_and_frequency_list() {
        let program = ListProgram::new(vec![0.5, 2.0])
            .voltage(vec![120.0, 230.0])
            .frequency(vec![50.0, 60.0])
            .count(3);
        assert_eq!(
            rendered(&program),
            vec![
                "VOLT:MODE LIST",
                "FREQ:MODE LIST",
                "LIST:VOLT 120, 230",
                "LIST:FREQ 50, 60",
                "LIST:DWEL 0.5, 2",
                "LIST:COUN 3",
                "LIST:STEP AUTO",
                "INIT",
            ]
        );
    }

    #[test]
    fn mismatched_lengths_rejected() {
        let program = ListProgram::new(vec![1.0, 1.0]).voltage(vec![10.0, 20.0, 30.0]);
        assert!(matches!(
            program.commands(),
            Err(InvalidInput::ListProgram { .. })
        ));
    }

    #[test]
    fn empty_dwell_and_zero_count_rejected() {
        assert!(ListProgram::new(vec![]).validate().is_err());
        assert!(ListProgram::new(vec![1.0]).count(0).validate().is_err());
        assert!(ListProgram::new(vec![f64::NAN]).validate().is_err());
        assert!(ListProgram::new(vec![-1.0]).validate().is_err());
    }
}
