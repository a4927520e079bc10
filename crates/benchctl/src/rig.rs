//! The set of named instruments a procedure drives.

use crate::error::BenchError;
use crate::infra::journal::{CommandJournal, JournalEventType};
use crate::link::Link;
use scpi_core::{profiles, DeviceProfile, Instrument, SimulatedInstrument};
use scpi_io::{InstrumentedTransport, ResourceAddress, TcpTransport};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use tracing::{info, warn};

/// A built-in profile name, or a complete profile given inline.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProfileRef {
    Builtin(String),
    Inline(Box<DeviceProfile>),
}

impl ProfileRef {
    pub fn resolve(&self) -> Result<DeviceProfile, BenchError> {
        let profile = match self {
            ProfileRef::Builtin(name) => profiles::by_name(name)
                .ok_or_else(|| BenchError::UnknownProfile(name.clone()))?,
            ProfileRef::Inline(profile) => (**profile).clone(),
        };
        profile
            .validate()
            .map_err(|e| BenchError::instrument(&profile.model, e))?;
        Ok(profile)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstrumentEntry {
    pub name: String,
    pub profile: ProfileRef,
    #[serde(default)]
    pub address: Option<ResourceAddress>,
}

impl InstrumentEntry {
    fn builtin(name: &str, profile: &str, address: &str) -> Result<Self, BenchError> {
        Ok(Self {
            name: name.to_string(),
            profile: ProfileRef::Builtin(profile.to_string()),
            address: Some(ResourceAddress::parse(address)?),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RigConfig {
    #[serde(default)]
    pub name: Option<String>,
    pub instruments: Vec<InstrumentEntry>,
}

impl RigConfig {
    pub fn load(path: &Path) -> Result<Self, BenchError> {
        let raw = std::fs::read_to_string(path).map_err(|source| BenchError::ReadFile {
            path: path.to_path_buf(),
            source,
        })?;
        let config: RigConfig =
            serde_json::from_str(&raw).map_err(|source| BenchError::ParseFile {
                path: path.to_path_buf(),
                source,
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Scope, DC supply, AC source and power analyzer on the lab network.
    pub fn default_bench() -> Result<Self, BenchError> {
        Ok(Self {
            name: Some("bench".to_string()),
            instruments: vec![
                InstrumentEntry::builtin("osc", "waverunner", "IP:192.168.0.10")?,
                InstrumentEntry::builtin("dcp", "chroma_62120d", "TCPIP0::192.168.0.35::INSTR")?,
                InstrumentEntry::builtin("acp", "sequoia", "TCPIP0::192.168.0.30::INSTR")?,
                InstrumentEntry::builtin("poa", "wt5000", "TCPIP0::192.168.0.5::INSTR")?,
            ],
        })
    }

    pub fn validate(&self) -> Result<(), BenchError> {
        for (i, entry) in self.instruments.iter().enumerate() {
            if self.instruments[..i].iter().any(|e| e.name == entry.name) {
                return Err(BenchError::Usage(format!(
                    "instrument '{}' is defined twice",
                    entry.name
                )));
            }
            entry.profile.resolve()?;
        }
        Ok(())
    }
}

#[derive(Debug, Clone)]
pub struct OpenOptions {
    pub simulate: bool,
    pub timeout: Duration,
}

impl Default for OpenOptions {
    fn default() -> Self {
        Self {
            simulate: false,
            timeout: scpi_io::DEFAULT_TIMEOUT,
        }
    }
}

pub struct Session {
    pub name: String,
    pub instrument: Instrument<Link>,
}

/// Open sessions in rig order.
#[derive(Default)]
pub struct Rig {
    sessions: Vec<Session>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Connect every instrument of `config`. If one fails, or its
    /// journal entry cannot be written, the sessions opened so far are
    /// shut down before the error is returned.
    pub fn open(
        config: &RigConfig,
        options: &OpenOptions,
        journal: Option<&CommandJournal>,
    ) -> Result<Self, BenchError> {
        let mut rig = Rig::new();
        if let Err(e) = rig.connect_all(config, options, journal) {
            rig.shutdown(journal);
            return Err(e);
        }
        Ok(rig)
    }

    fn connect_all(
        &mut self,
        config: &RigConfig,
        options: &OpenOptions,
        journal: Option<&CommandJournal>,
    ) -> Result<(), BenchError> {
        for entry in &config.instruments {
            let instrument = connect_entry(entry, options).inspect_err(|e| {
                warn!(instrument = %entry.name, error = %e, "Failed to connect");
            })?;
            info!(
                instrument = %entry.name,
                resource = %instrument.resource(),
                identity = instrument.state().identity().unwrap_or(""),
                "Instrument connected"
            );
            let details = serde_json::json!({
                "instrument": entry.name,
                "model": instrument.profile().model,
                "resource": instrument.resource(),
                "identity": instrument.state().identity(),
            });
            self.add(&entry.name, instrument);
            if let Some(journal) = journal {
                journal.log_event(JournalEventType::InstrumentConnected, details)?;
            }
        }
        Ok(())
    }

    pub fn add(&mut self, name: &str, instrument: Instrument<Link>) {
        self.sessions.push(Session {
            name: name.to_string(),
            instrument,
        });
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.sessions.iter().map(|s| s.name.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    pub fn get(&self, name: &str) -> Result<&Instrument<Link>, BenchError> {
        self.sessions
            .iter()
            .find(|s| s.name == name)
            .map(|s| &s.instrument)
            .ok_or_else(|| BenchError::UnknownInstrument(name.to_string()))
    }

    pub fn get_mut(&mut self, name: &str) -> Result<&mut Instrument<Link>, BenchError> {
        self.sessions
            .iter_mut()
            .find(|s| s.name == name)
            .map(|s| &mut s.instrument)
            .ok_or_else(|| BenchError::UnknownInstrument(name.to_string()))
    }

    /// Switch off every output the run switched on and left on, then close
    /// every session in reverse order. Failures are logged and returned;
    /// none stops the remaining sessions from being closed.
    pub fn shutdown(&mut self, journal: Option<&CommandJournal>) -> Vec<BenchError> {
        let mut failures = Vec::new();

        for session in self.sessions.iter_mut() {
            let state = session.instrument.state();
            if !state.switched_on() || state.output_enabled() != Some(true) {
                continue;
            }
            match session.instrument.set_output(false, Duration::ZERO) {
                Ok(_) => {
                    info!(instrument = %session.name, "Output switched off");
                    if let Some(journal) = journal {
                        let _ = journal.log_event(
                            JournalEventType::OutputSafed,
                            serde_json::json!({ "instrument": session.name }),
                        );
                    }
                }
                Err(e) => {
                    warn!(instrument = %session.name, error = %e, "Failed to switch output off");
                    failures.push(BenchError::instrument(&session.name, e));
                }
            }
        }

        while let Some(session) = self.sessions.pop() {
            let name = session.name;
            match session.instrument.close() {
                Ok(()) => {
                    if let Some(journal) = journal {
                        let _ = journal.log_event(
                            JournalEventType::InstrumentClosed,
                            serde_json::json!({ "instrument": name }),
                        );
                    }
                }
                Err(e) => {
                    warn!(instrument = %name, error = %e, "Failed to close session");
                    failures.push(BenchError::instrument(&name, e));
                }
            }
        }

        failures
    }
}

fn connect_entry(entry: &InstrumentEntry, options: &OpenOptions) -> Result<Instrument<Link>, BenchError> {
    let profile = entry.profile.resolve()?;
    let link = if options.simulate {
        Link::Simulated(InstrumentedTransport::new(SimulatedInstrument::for_profile(
            &profile,
        )))
    } else {
        let address = entry
            .address
            .as_ref()
            .ok_or_else(|| BenchError::MissingAddress(entry.name.clone()))?;
        let transport = TcpTransport::connect(address, options.timeout)
            .map_err(|e| BenchError::instrument(&entry.name, e))?;
        Link::Tcp(InstrumentedTransport::new(transport))
    };
    Instrument::connect(link, profile).map_err(|e| BenchError::instrument(&entry.name, e))
}
