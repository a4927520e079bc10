//! In-memory instrument used for dry runs and tests.
//!
//! The simulator keeps one stored value per command stem. `VERB x` stores
//! `x`, `VERB?` answers it. Stems with a range clamp written values to it
//! and resolve `MAX`/`MIN` to the bound, the way the bench instruments do.

use crate::command::format_value;
use crate::descriptor::{Bounds, Range, ValueKind};
use crate::error::TransportError;
use crate::profile::DeviceProfile;
use crate::transport::Transport;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

/// Range given to parameters whose bounds are queried from the device.
pub const QUERIED_RANGE: Range = Range::new(0.0, 1.0e6);

#[derive(Debug, Default)]
struct SimState {
    identity: String,
    identify_query: String,
    writes: Vec<String>,
    log: Vec<String>,
    values: HashMap<String, String>,
    bounds: HashMap<String, Range>,
    queries: HashMap<String, String>,
    responses: HashMap<String, String>,
    output: Option<(String, String, String)>,
    output_enabled: bool,
    fail_next_query: bool,
    fail_next_write: bool,
    closed: bool,
}

impl SimState {
    fn stem_for_query(&self, query: &str) -> String {
        if let Some(stem) = self.queries.get(query) {
            return stem.clone();
        }
        query.trim_end_matches('?').to_string()
    }

    fn apply_write(&mut self, line: &str) {
        if let Some((on, off, _)) = &self.output {
            if line.eq_ignore_ascii_case(on) {
                self.output_enabled = true;
                return;
            }
            if line.eq_ignore_ascii_case(off) {
                self.output_enabled = false;
                return;
            }
        }

        let (verb, arg) = match line.split_once(' ') {
            Some((verb, arg)) => (verb.to_ascii_uppercase(), arg.trim()),
            None => return,
        };
        let range = self.bounds.get(&verb).copied();
        let stored = match (arg.to_ascii_uppercase().as_str(), range) {
            ("MAX", Some(r)) => format_value(r.max),
            ("MIN", Some(r)) => format_value(r.min),
            (_, Some(r)) => match arg.parse::<f64>() {
                Ok(v) => format_value(v.clamp(r.min, r.max)),
                Err(_) => arg.to_string(),
            },
            _ => arg.trim_matches('"').to_string(),
        };
        self.values.insert(verb, stored);
    }

    fn answer(&mut self, query: &str) -> Result<String, TransportError> {
        if self.fail_next_query {
            self.fail_next_query = false;
            return Err(timeout(query));
        }
        let key = query.to_ascii_uppercase();
        if let Some(raw) = self.responses.get(&key) {
            return Ok(raw.clone());
        }
        if key == self.identify_query {
            return Ok(self.identity.clone());
        }
        if let Some((_, _, output_query)) = &self.output {
            if key == *output_query {
                return Ok(if self.output_enabled { "1" } else { "0" }.to_string());
            }
        }
        if let Some((base, keyword)) = key.rsplit_once(' ') {
            let range = self.bounds.get(&self.stem_for_query(base)).copied();
            return match (keyword, range) {
                ("MAX", Some(r)) => Ok(format_value(r.max)),
                ("MIN", Some(r)) => Ok(format_value(r.min)),
                _ => Err(timeout(query)),
            };
        }
        let stem = self.stem_for_query(&key);
        self.values
            .get(&stem)
            .cloned()
            .ok_or_else(|| timeout(query))
    }
}

fn timeout(query: &str) -> TransportError {
    TransportError::Timeout {
        command: query.to_string(),
        timeout_ms: 0,
    }
}

/// Shared view into a simulator, kept by tests after the transport has
/// been moved into a session.
#[derive(Debug, Clone)]
pub struct SimHandle {
    inner: Arc<Mutex<SimState>>,
}

impl SimHandle {
    fn lock(&self) -> MutexGuard<'_, SimState> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Every command written, in order.
    pub fn writes(&self) -> Vec<String> {
        self.lock().writes.clone()
    }

    /// Every line sent, writes and queries interleaved.
    pub fn log(&self) -> Vec<String> {
        self.lock().log.clone()
    }

    pub fn last_write(&self) -> Option<String> {
        self.lock().writes.last().cloned()
    }

    pub fn clear_log(&self) {
        let mut state = self.lock();
        state.writes.clear();
        state.log.clear();
    }

    pub fn value(&self, stem: &str) -> Option<String> {
        self.lock().values.get(&stem.to_ascii_uppercase()).cloned()
    }

    pub fn set_value(&self, stem: &str, raw: &str) {
        self.lock()
            .values
            .insert(stem.to_ascii_uppercase(), raw.to_string());
    }

    pub fn set_bounds(&self, stem: &str, range: Range) {
        self.lock().bounds.insert(stem.to_ascii_uppercase(), range);
    }

    /// Answer `query` with `raw` regardless of stored values.
    pub fn respond(&self, query: &str, raw: &str) {
        self.lock()
            .responses
            .insert(query.to_ascii_uppercase(), raw.to_string());
    }

    /// Make the next query time out.
    pub fn fail_next_query(&self) {
        self.lock().fail_next_query = true;
    }

    /// Make the next write fail as if the connection dropped. The failed
    /// command is logged but has no effect.
    pub fn fail_next_write(&self) {
        self.lock().fail_next_write = true;
    }

    pub fn output_enabled(&self) -> bool {
        self.lock().output_enabled
    }

    pub fn is_closed(&self) -> bool {
        self.lock().closed
    }
}

/// [`Transport`] backed by an in-memory device model.
#[derive(Debug)]
pub struct SimulatedInstrument {
    resource: String,
    handle: SimHandle,
}

impl SimulatedInstrument {
    /// A device that answers only `*IDN?`.
    pub fn new(model: &str) -> Self {
        let state = SimState {
            identity: format!("SIMULATED,{},0,1.0", model),
            identify_query: "*IDN?".to_string(),
            ..SimState::default()
        };
        Self {
            resource: format!("SIM::{}", model),
            handle: SimHandle {
                inner: Arc::new(Mutex::new(state)),
            },
        }
    }

    /// A device that knows every parameter of `profile`, starting at zero
    /// (or the first allowed value for enumerated parameters).
    pub fn for_profile(profile: &DeviceProfile) -> Self {
        let sim = Self::new(&profile.model);
        {
            let mut state = sim.handle.lock();
            state.identify_query = profile.identify_query.to_ascii_uppercase();
            if let Some(query) = &profile.error_query {
                state
                    .responses
                    .insert(query.to_ascii_uppercase(), "0,\"No error\"".to_string());
            }
            for param in &profile.parameters {
                let stem = param.verb.to_ascii_uppercase();
                state
                    .queries
                    .insert(param.query.to_ascii_uppercase(), stem.clone());
                let initial = match &param.kind {
                    ValueKind::Number => "0".to_string(),
                    ValueKind::Text { allowed, .. } => allowed
                        .first()
                        .cloned()
                        .unwrap_or_else(|| "NONE".to_string()),
                };
                state.values.insert(stem.clone(), initial);
                match param.bounds {
                    Bounds::Unbounded => {}
                    Bounds::Fixed { min, max } => {
                        state.bounds.insert(stem, Range::new(min, max));
                    }
                    Bounds::Queried => {
                        state.bounds.insert(stem, QUERIED_RANGE);
                    }
                }
            }
            if let Some(output) = &profile.output {
                let query = output
                    .query
                    .as_deref()
                    .unwrap_or("OUTP?")
                    .to_ascii_uppercase();
                state.output = Some((output.on.clone(), output.off.clone(), query));
            }
        }
        sim
    }

    pub fn handle(&self) -> SimHandle {
        self.handle.clone()
    }
}

impl Transport for SimulatedInstrument {
    fn write(&mut self, command: &str) -> Result<(), TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let line = command.trim();
        state.log.push(line.to_string());
        if state.fail_next_write {
            state.fail_next_write = false;
            return Err(TransportError::Disconnected {
                resource: self.resource.clone(),
            });
        }
        state.writes.push(line.to_string());
        state.apply_write(line);
        Ok(())
    }

    fn query(&mut self, command: &str) -> Result<String, TransportError> {
        let mut state = self.handle.lock();
        if state.closed {
            return Err(TransportError::Closed);
        }
        let line = command.trim();
        state.log.push(line.to_string());
        state.answer(line)
    }

    fn close(&mut self) -> Result<(), TransportError> {
        self.handle.lock().closed = true;
        Ok(())
    }

    fn resource(&self) -> &str {
        &self.resource
    }
}
