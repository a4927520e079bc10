//! The setpoint controller: one session per connected instrument.

use crate::command::Command;
use crate::descriptor::{Bounds, ParameterDescriptor, Range, SetpointDecision, ValueKind};
use crate::error::{Expected, InvalidInput, Result, TransportError};
use crate::list::ListProgram;
use crate::profile::{DeviceProfile, SetpointValue};
use crate::response::{parse_bool, parse_number, parse_text};
use crate::state::{CachedState, Reading};
use crate::transport::Transport;
use log::{debug, info, warn};
use std::time::Duration;

/// An open session with one instrument.
///
/// Owns its transport exclusively. [`Instrument::close`] releases it
/// explicitly; dropping an open session closes it on a best-effort basis.
pub struct Instrument<T: Transport> {
    transport: Option<T>,
    profile: DeviceProfile,
    state: CachedState,
}

impl<T: Transport> Instrument<T> {
    /// Wrap an open transport without talking to the instrument.
    pub fn new(transport: T, profile: DeviceProfile) -> Self {
        Self {
            transport: Some(transport),
            profile,
            state: CachedState::default(),
        }
    }

    /// Open a session and run the profile's connect sequence: identify,
    /// write the connect commands, read initial values and apply initial
    /// setpoints.
    pub fn connect(transport: T, profile: DeviceProfile) -> Result<Self> {
        profile.validate()?;
        let mut instrument = Self::new(transport, profile);

        let identity = instrument.identify()?;
        if identity.is_empty() {
            warn!(
                "{}: empty identification from {}",
                instrument.profile.model,
                instrument.resource()
            );
        } else {
            info!("{}: connected to {}", instrument.resource(), identity);
        }

        if let Some(query) = instrument.profile.error_query.clone() {
            let status = instrument.query(&query)?;
            info!("{}: {} -> {}", instrument.resource(), query, status);
        }

        for command in instrument.profile.on_connect.clone() {
            instrument.write(&command)?;
        }

        if let Some(query) = instrument
            .profile
            .output
            .as_ref()
            .and_then(|o| o.query.clone())
        {
            let raw = instrument.query(&query)?;
            let enabled = parse_bool(&query, &raw)?;
            instrument.state.set_output(enabled);
        }

        for name in instrument.profile.initial_reads.clone() {
            instrument.read_parameter(&name)?;
        }

        for setpoint in instrument.profile.initial_setpoints.clone() {
            match &setpoint.value {
                SetpointValue::Number(v) => {
                    instrument.set_parameter(&setpoint.parameter, *v)?;
                }
                SetpointValue::Text(s) => {
                    instrument.set_text(&setpoint.parameter, s)?;
                }
            }
        }

        Ok(instrument)
    }

    pub fn profile(&self) -> &DeviceProfile {
        &self.profile
    }

    pub fn state(&self) -> &CachedState {
        &self.state
    }

    pub(crate) fn state_mut(&mut self) -> &mut CachedState {
        &mut self.state
    }

    pub fn cached(&self, parameter: &str) -> Option<&Reading> {
        self.state.get(parameter)
    }

    pub fn resource(&self) -> &str {
        self.transport
            .as_ref()
            .map(|t| t.resource())
            .unwrap_or("<closed>")
    }

    fn link(&mut self) -> std::result::Result<&mut T, TransportError> {
        self.transport.as_mut().ok_or(TransportError::Closed)
    }

    /// Send a raw command line.
    pub fn write(&mut self, command: &str) -> Result<()> {
        let command = Command::new(command)?;
        let link = self.link()?;
        debug!("{} <- {}", link.resource(), command);
        link.write(command.as_str())?;
        Ok(())
    }

    /// Send a raw query and return the untrimmed response.
    pub fn query(&mut self, command: &str) -> Result<String> {
        let command = Command::new(command)?;
        let link = self.link()?;
        debug!("{} <- {}", link.resource(), command);
        let response = link.query(command.as_str())?;
        debug!("{} -> {:?}", link.resource(), response);
        Ok(response)
    }

    pub fn query_number(&mut self, command: &str) -> Result<f64> {
        let raw = self.query(command)?;
        Ok(parse_number(command, &raw)?)
    }

    pub fn query_text(&mut self, command: &str) -> Result<String> {
        let raw = self.query(command)?;
        Ok(parse_text(command, &raw)?)
    }

    /// Query the identification string and cache it.
    pub fn identify(&mut self) -> Result<String> {
        let query = self.profile.identify_query.clone();
        let identity = self.query(&query)?.trim().to_string();
        if !identity.is_empty() {
            self.state.set_identity(identity.clone());
        }
        Ok(identity)
    }

    fn descriptor(&self, name: &str) -> Result<ParameterDescriptor> {
        Ok(self.profile.lookup(name)?.clone())
    }

    /// Query the current value of a parameter and cache it.
    pub fn read_parameter(&mut self, name: &str) -> Result<Reading> {
        let descriptor = self.descriptor(name)?;
        let raw = self.query(&descriptor.query)?;
        let reading = match descriptor.kind {
            ValueKind::Number => Reading::Number(parse_number(&descriptor.query, &raw)?),
            ValueKind::Text { .. } => Reading::Text(parse_text(&descriptor.query, &raw)?),
        };
        self.state.record(name, reading.clone());
        Ok(reading)
    }

    /// Current valid range of a numeric parameter, if it has one.
    pub fn bounds(&mut self, name: &str) -> Result<Option<Range>> {
        let descriptor = self.descriptor(name)?;
        self.discover_bounds(&descriptor)
    }

    fn discover_bounds(&mut self, descriptor: &ParameterDescriptor) -> Result<Option<Range>> {
        match descriptor.bounds {
            Bounds::Unbounded => Ok(None),
            Bounds::Fixed { min, max } => Ok(Some(Range::new(min, max))),
            Bounds::Queried => {
                let (max_query, min_query) = descriptor.bound_queries();
                let max = self.query_number(&max_query)?;
                let min = self.query_number(&min_query)?;
                Ok(Some(Range::new(min, max)))
            }
        }
    }

    /// Write a numeric setpoint, clamped to the parameter's current range,
    /// and return the value the instrument reports afterwards.
    pub fn set_parameter(&mut self, name: &str, requested: f64) -> Result<f64> {
        let descriptor = self.descriptor(name)?;
        if !descriptor.is_numeric() {
            return Err(InvalidInput::KindMismatch {
                parameter: name.to_string(),
                expected: Expected::Text,
            }
            .into());
        }
        if !requested.is_finite() {
            return Err(InvalidInput::NonFinite {
                parameter: name.to_string(),
                value: requested,
            }
            .into());
        }

        for command in &descriptor.prelude {
            self.write(command)?;
        }

        let range = self.discover_bounds(&descriptor)?;
        let decision = SetpointDecision::decide(requested, range);
        let command = decision.command(&descriptor)?;
        if decision.is_clamped() {
            info!(
                "{}: {} request {} outside {:?}, sending {}",
                self.profile.model, name, requested, range, command
            );
        }
        self.write(command.as_str())?;

        let actual = self.query_number(&descriptor.query)?;
        self.state.record(name, Reading::Number(actual));
        Ok(actual)
    }

    /// Write an enumerated or text setpoint and return the read-back.
    pub fn set_text(&mut self, name: &str, value: &str) -> Result<String> {
        let descriptor = self.descriptor(name)?;
        let canonical = descriptor.canonical_text(value)?;
        let command = descriptor.text_command(&canonical)?;
        self.write(command.as_str())?;

        let actual = self.query_text(&descriptor.query)?;
        self.state.record(name, Reading::Text(actual.clone()));
        Ok(actual)
    }

    /// Switch the output after waiting `delay`.
    ///
    /// The cached flag follows the command; the instrument is not asked for
    /// its output state afterwards.
    pub fn set_output(&mut self, enabled: bool, delay: Duration) -> Result<bool> {
        let command = self
            .profile
            .output
            .as_ref()
            .map(|o| o.command(enabled).to_string())
            .ok_or_else(|| InvalidInput::Unsupported {
                model: self.profile.model.clone(),
                operation: "output switching".to_string(),
            })?;

        if !delay.is_zero() {
            debug!("{}: waiting {:?} before {}", self.profile.model, delay, command);
            std::thread::sleep(delay);
        }
        self.write(&command)?;
        self.state.switch_output(enabled);
        Ok(enabled)
    }

    /// Program and start a stepped list sequence.
    pub fn run_list(&mut self, program: &ListProgram) -> Result<()> {
        if !self.profile.list_mode {
            return Err(InvalidInput::Unsupported {
                model: self.profile.model.clone(),
                operation: "list mode".to_string(),
            }
            .into());
        }
        for command in program.commands()? {
            self.write(command.as_str())?;
        }
        Ok(())
    }

    /// Close the transport. The session cannot be used afterwards.
    pub fn close(mut self) -> std::result::Result<(), TransportError> {
        match self.transport.take() {
            Some(mut transport) => {
                let resource = transport.resource().to_string();
                transport.close()?;
                debug!("{}: connection closed", resource);
                Ok(())
            }
            None => Ok(()),
        }
    }
}

impl<T: Transport> Drop for Instrument<T> {
    fn drop(&mut self) {
        if let Some(mut transport) = self.transport.take() {
            if let Err(e) = transport.close() {
                warn!("{}: error closing connection: {}", transport.resource(), e);
            }
        }
    }
}
