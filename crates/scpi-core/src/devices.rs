//! Operations specific to one instrument family.
//!
//! Each of these is a short command sequence on top of the generic session;
//! they do not check which profile the session was opened with.

use crate::command::{quote, Command};
use crate::error::{InvalidInput, Result};
use crate::instrument::Instrument;
use crate::state::Reading;
use crate::transport::Transport;
use std::fmt;
use std::str::FromStr;

/// Screen dumps as landscape PNG on a black background, sent over the
/// network port.
pub const HARDCOPY_SETUP: &str =
    "HCSU DEV, PNG, FORMAT, LANDSCAPE, BCKG, BLACK, AREA, FULLSCREEN, PORT, NET";

/// Units accepted by the oscilloscope's `TIME_DIV` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeUnit {
    S,
    Ms,
    Us,
    Ns,
}

impl TimeUnit {
    pub fn suffix(&self) -> &'static str {
        match self {
            TimeUnit::S => "S",
            TimeUnit::Ms => "MS",
            TimeUnit::Us => "US",
            TimeUnit::Ns => "NS",
        }
    }
}

impl fmt::Display for TimeUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

impl FromStr for TimeUnit {
    type Err = InvalidInput;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "S" => Ok(TimeUnit::S),
            "MS" => Ok(TimeUnit::Ms),
            "US" => Ok(TimeUnit::Us),
            "NS" => Ok(TimeUnit::Ns),
            other => Err(InvalidInput::Argument {
                reason: format!("unknown time unit '{}' (expected S, MS, US or NS)", other),
            }),
        }
    }
}

fn finite(parameter: &str, value: f64) -> std::result::Result<(), InvalidInput> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(InvalidInput::NonFinite {
            parameter: parameter.to_string(),
            value,
        })
    }
}

impl<T: Transport> Instrument<T> {
    pub fn setup_hardcopy(&mut self) -> Result<()> {
        self.write(HARDCOPY_SETUP)
    }

    /// Set the horizontal scale per division, e.g. `TIME_DIV 2S`.
    pub fn set_timebase(&mut self, value: f64, unit: TimeUnit) -> Result<String> {
        finite("timebase", value)?;
        let arg = format!("{}{}", crate::command::format_value(value), unit);
        let command = Command::new("TIME_DIV")?.arg(&arg)?;
        self.write(command.as_str())?;

        let actual = self.query_text("TIME_DIV?")?;
        self.state_mut()
            .record("timebase", Reading::Text(actual.clone()));
        Ok(actual)
    }

    /// Set the trigger level of `channel` (1-based) in volts.
    ///
    /// The read-back keeps the unit suffix the scope reports, so it is
    /// cached as text.
    pub fn set_trigger_level(&mut self, level: f64, channel: u8) -> Result<String> {
        finite("trigger_level", level)?;
        if channel == 0 {
            return Err(InvalidInput::Argument {
                reason: "channels are numbered from 1".to_string(),
            }
            .into());
        }
        let verb = format!("C{}:TRIG_LEVEL", channel);
        let command = Command::new(&verb)?.value(level)?;
        self.write(command.as_str())?;

        let actual = self.query_text(&format!("{}?", verb))?;
        self.state_mut()
            .record("trigger_level", Reading::Text(actual.clone()));
        Ok(actual)
    }

    /// Recall a stored front-panel setup from the scope's own disk.
    pub fn recall_panel(&mut self, drive: &str, path: &str) -> Result<()> {
        if path.contains('\'') {
            return Err(InvalidInput::Argument {
                reason: format!("panel path may not contain quotes: {}", path),
            }
            .into());
        }
        let arg = format!("DISK,{},FILE,'{}'", drive.trim(), path.trim());
        let command = Command::new("RCPN")?.arg(&arg)?;
        self.write(command.as_str())
    }

    /// Name used for the next saved screen image.
    pub fn set_screen_name(&mut self, name: &str) -> Result<String> {
        if name.is_empty() || !name.chars().all(|c| c.is_ascii_alphanumeric()) {
            return Err(InvalidInput::Argument {
                reason: format!("screen name must be alphanumeric: {:?}", name),
            }
            .into());
        }
        self.set_text("screen_name", name)
    }

    /// Select drive and folder for saved screens; returns the path the
    /// analyzer reports.
    pub fn set_screen_folder(&mut self, folder: &str, drive: &str) -> Result<String> {
        self.set_text("screen_drive", drive)?;
        let command = Command::new("IMAG:SAVE:CDIR")?.arg(&quote(folder.trim()))?;
        self.write(command.as_str())?;
        self.query_text("FILE:PATH?")
    }

    pub fn save_screen(&mut self) -> Result<()> {
        self.write("IMAG:EXEC")
    }

    /// Set voltage then frequency; returns both read-backs.
    pub fn set_volt_freq(&mut self, voltage: f64, frequency: f64) -> Result<(f64, f64)> {
        let voltage = self.set_parameter("voltage", voltage)?;
        let frequency = self.set_parameter("frequency", frequency)?;
        Ok((voltage, frequency))
    }
}
