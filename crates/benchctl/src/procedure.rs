//! Bench procedures: an ordered list of steps against named instruments.

use crate::error::BenchError;
use crate::infra::journal::{CommandJournal, JournalEventType};
use crate::link::Link;
use crate::rig::Rig;
use scpi_core::{Instrument, InstrumentError, InvalidInput, ListProgram, TimeUnit};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

fn default_channel() -> u8 {
    1
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum Step {
    Set {
        instrument: String,
        parameter: String,
        value: f64,
    },
    SetText {
        instrument: String,
        parameter: String,
        value: String,
    },
    Output {
        instrument: String,
        enabled: bool,
        #[serde(default)]
        delay_ms: u64,
    },
    Wait {
        seconds: f64,
    },
    Write {
        instrument: String,
        command: String,
    },
    Query {
        instrument: String,
        command: String,
    },
    List {
        instrument: String,
        program: ListProgram,
    },
    Timebase {
        instrument: String,
        value: f64,
        #[serde(default = "default_unit")]
        unit: String,
    },
    TriggerLevel {
        instrument: String,
        level: f64,
        #[serde(default = "default_channel")]
        channel: u8,
    },
}

fn default_unit() -> String {
    "S".to_string()
}

impl Step {
    pub fn op(&self) -> &'static str {
        match self {
            Step::Set { .. } => "set",
            Step::SetText { .. } => "set_text",
            Step::Output { .. } => "output",
            Step::Wait { .. } => "wait",
            Step::Write { .. } => "write",
            Step::Query { .. } => "query",
            Step::List { .. } => "list",
            Step::Timebase { .. } => "timebase",
            Step::TriggerLevel { .. } => "trigger_level",
        }
    }

    pub fn instrument(&self) -> Option<&str> {
        match self {
            Step::Wait { .. } => None,
            Step::Set { instrument, .. }
            | Step::SetText { instrument, .. }
            | Step::Output { instrument, .. }
            | Step::Write { instrument, .. }
            | Step::Query { instrument, .. }
            | Step::List { instrument, .. }
            | Step::Timebase { instrument, .. }
            | Step::TriggerLevel { instrument, .. } => Some(instrument),
        }
    }

    fn set(instrument: &str, parameter: &str, value: f64) -> Self {
        Step::Set {
            instrument: instrument.to_string(),
            parameter: parameter.to_string(),
            value,
        }
    }

    fn set_text(instrument: &str, parameter: &str, value: &str) -> Self {
        Step::SetText {
            instrument: instrument.to_string(),
            parameter: parameter.to_string(),
            value: value.to_string(),
        }
    }

    fn output(instrument: &str, enabled: bool) -> Self {
        Step::Output {
            instrument: instrument.to_string(),
            enabled,
            delay_ms: 0,
        }
    }

    fn wait(seconds: f64) -> Self {
        Step::Wait { seconds }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Procedure {
    pub name: String,
    pub steps: Vec<Step>,
}

impl Procedure {
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BenchError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&raw).map_err(|source| BenchError::ParseFile {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Ramp the DC supply into the scope's single-shot trigger: arm at
    /// 310 V on C1, step 0 V to 290 V, then slow-slew to 330 V.
    pub fn default_bench() -> Self {
        Self {
            name: "dc-ramp-capture".to_string(),
            steps: vec![
                Step::Timebase {
                    instrument: "osc".to_string(),
                    value: 2.0,
                    unit: default_unit(),
                },
                Step::set_text("osc", "trigger_mode", "AUTO"),
                Step::wait(1.0),
                Step::set_text("osc", "trigger_mode", "NORMAL"),
                Step::wait(1.0),
                Step::TriggerLevel {
                    instrument: "osc".to_string(),
                    level: 310.0,
                    channel: 1,
                },
                Step::set_text("osc", "trigger_mode", "SINGLE"),
                Step::set("dcp", "voltage", 0.0),
                Step::wait(1.0),
                Step::output("dcp", true),
                Step::set("dcp", "voltage", 290.0),
                Step::wait(5.0),
                Step::set("dcp", "slew", 0.004),
                Step::set("dcp", "voltage", 330.0),
                Step::wait(15.0),
                Step::output("dcp", false),
            ],
        }
    }

    /// Check that every step names an instrument of the rig.
    pub fn check(&self, rig: &Rig) -> Result<(), BenchError> {
        for step in &self.steps {
            if let Some(name) = step.instrument() {
                rig.get(name)?;
            }
        }
        Ok(())
    }
}

/// What a finished run did.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    pub steps_completed: usize,
    pub elapsed: Duration,
}

// Unknown instruments are rejected by `Procedure::check` before the run.
fn session<'r>(rig: &'r mut Rig, name: &str) -> Result<&'r mut Instrument<Link>, InvalidInput> {
    rig.get_mut(name).map_err(|_| InvalidInput::Argument {
        reason: format!("no instrument named '{}'", name),
    })
}

fn wait_duration(seconds: f64) -> Result<Duration, InvalidInput> {
    Duration::try_from_secs_f64(seconds).map_err(|_| InvalidInput::Argument {
        reason: format!("invalid wait of {} s", seconds),
    })
}

pub struct Runner<'a> {
    journal: Option<&'a CommandJournal>,
    skip_waits: bool,
}

impl<'a> Runner<'a> {
    pub fn new(journal: Option<&'a CommandJournal>) -> Self {
        Self {
            journal,
            skip_waits: false,
        }
    }

    /// Treat every `wait` step as already elapsed.
    pub fn skip_waits(mut self, skip: bool) -> Self {
        self.skip_waits = skip;
        self
    }

    fn journal(&self, event_type: JournalEventType, details: serde_json::Value) {
        if let Some(journal) = self.journal {
            if let Err(e) = journal.log_event(event_type, details) {
                warn!(error = %e, "Failed to write journal entry");
            }
        }
    }

    /// Run every step in order, stopping at the first failure.
    ///
    /// Does not close the rig; the caller owns shutdown.
    pub fn run(&self, rig: &mut Rig, procedure: &Procedure) -> Result<RunSummary, BenchError> {
        procedure.check(rig)?;
        let started = Instant::now();
        info!(procedure = %procedure.name, steps = procedure.steps.len(), "Procedure started");
        self.journal(
            JournalEventType::ProcedureStart,
            serde_json::json!({
                "procedure": procedure.name,
                "steps": procedure.steps.len(),
            }),
        );

        for (index, step) in procedure.steps.iter().enumerate() {
            debug!(index, op = step.op(), "Running step");
            match self.run_step(rig, step) {
                Ok(result) => {
                    self.journal(
                        JournalEventType::StepCompleted,
                        serde_json::json!({
                            "index": index,
                            "step": step,
                            "result": result,
                        }),
                    );
                }
                Err(source) => {
                    let instrument = step.instrument().unwrap_or("").to_string();
                    warn!(index, op = step.op(), instrument = %instrument, error = %source, "Step failed");
                    self.journal(
                        JournalEventType::StepFailed,
                        serde_json::json!({
                            "index": index,
                            "step": step,
                            "error": source.to_string(),
                        }),
                    );
                    return Err(BenchError::Step {
                        index,
                        op: step.op(),
                        instrument,
                        source,
                    });
                }
            }
        }

        let summary = RunSummary {
            steps_completed: procedure.steps.len(),
            elapsed: started.elapsed(),
        };
        info!(
            procedure = %procedure.name,
            elapsed_ms = summary.elapsed.as_millis() as u64,
            "Procedure complete"
        );
        Ok(summary)
    }

    fn run_step(&self, rig: &mut Rig, step: &Step) -> Result<serde_json::Value, InstrumentError> {
        let result = match step {
            Step::Wait { seconds } => {
                let delay = wait_duration(*seconds)?;
                if !self.skip_waits {
                    std::thread::sleep(delay);
                }
                serde_json::Value::Null
            }
            Step::Set {
                instrument,
                parameter,
                value,
            } => {
                let actual = session(rig, instrument)?.set_parameter(parameter, *value)?;
                info!(instrument = %instrument, parameter = %parameter, requested = *value, actual, "Setpoint applied");
                serde_json::json!(actual)
            }
            Step::SetText {
                instrument,
                parameter,
                value,
            } => {
                let actual = session(rig, instrument)?.set_text(parameter, value)?;
                info!(instrument = %instrument, parameter = %parameter, actual = %actual, "Setpoint applied");
                serde_json::json!(actual)
            }
            Step::Output {
                instrument,
                enabled,
                delay_ms,
            } => {
                let state = session(rig, instrument)?
                    .set_output(*enabled, Duration::from_millis(*delay_ms))?;
                info!(instrument = %instrument, enabled = state, "Output switched");
                serde_json::json!(state)
            }
            Step::Write {
                instrument,
                command,
            } => {
                session(rig, instrument)?.write(command)?;
                serde_json::Value::Null
            }
            Step::Query {
                instrument,
                command,
            } => {
                let response = session(rig, instrument)?.query(command)?;
                info!(instrument = %instrument, command = %command, response = %response, "Query");
                serde_json::json!(response)
            }
            Step::List {
                instrument,
                program,
            } => {
                session(rig, instrument)?.run_list(program)?;
                serde_json::Value::Null
            }
            Step::Timebase {
                instrument,
                value,
                unit,
            } => {
                let unit: TimeUnit = unit.parse()?;
                let actual = session(rig, instrument)?.set_timebase(*value, unit)?;
                serde_json::json!(actual)
            }
            Step::TriggerLevel {
                instrument,
                level,
                channel,
            } => {
                let actual = session(rig, instrument)?.set_trigger_level(*level, *channel)?;
                serde_json::json!(actual)
            }
        };
        Ok(result)
    }
}
