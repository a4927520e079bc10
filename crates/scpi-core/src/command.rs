//! Single-line SCPI command construction.
//!
//! Every command produced here is one line of text: no embedded line
//! breaks, no leading or trailing whitespace, exactly one space between the
//! verb and its argument list.

use crate::error::InvalidInput;
use std::fmt;

/// Separator used between values of a list-mode argument.
pub const LIST_SEPARATOR: &str = ", ";

/// Render a number the way it is sent to an instrument.
///
/// Uses the shortest representation that round-trips to the same `f64`, so
/// `350.0` is sent as `350` and `0.004` as `0.004`.
pub fn format_value(value: f64) -> String {
    format!("{}", value)
}

/// Join values with [`LIST_SEPARATOR`].
pub fn join_values(values: &[f64]) -> String {
    values
        .iter()
        .map(|v| format_value(*v))
        .collect::<Vec<_>>()
        .join(LIST_SEPARATOR)
}

/// Wrap text in double quotes for string-typed arguments.
pub fn quote(text: &str) -> String {
    format!("\"{}\"", text)
}

fn check_line(text: &str) -> Result<(), InvalidInput> {
    if text.contains(['\n', '\r']) {
        return Err(InvalidInput::ControlCharacter {
            text: text.to_string(),
        });
    }
    Ok(())
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Command {
    text: String,
}

impl Command {
    /// Start a command from its verb, e.g. `VOLT:AC` or `*IDN?`.
    pub fn new(verb: &str) -> Result<Self, InvalidInput> {
        check_line(verb)?;
        let verb = verb.trim();
        if verb.is_empty() {
            return Err(InvalidInput::Argument {
                reason: "empty command verb".to_string(),
            });
        }
        Ok(Self {
            text: verb.to_string(),
        })
    }

    /// Append a textual argument.
    pub fn arg(mut self, arg: &str) -> Result<Self, InvalidInput> {
        check_line(arg)?;
        let arg = arg.trim();
        if !arg.is_empty() {
            self.text.push(' ');
            self.text.push_str(arg);
        }
        Ok(self)
    }

    /// Append a numeric argument.
    pub fn value(self, value: f64) -> Result<Self, InvalidInput> {
        self.arg(&format_value(value))
    }

    /// `<verb> v1, v2, ...`
    pub fn list(verb: &str, values: &[f64]) -> Result<Self, InvalidInput> {
        Self::new(verb)?.arg(&join_values(values))
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    pub fn into_string(self) -> String {
        self.text
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}

impl AsRef<str> for Command {
    fn as_ref(&self) -> &str {
        &self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integral_values_have_no_fraction() {
        assert_eq!(format_value(350.0), "350");
        assert_eq!(format_value(0.0), "0");
        assert_eq!(format_value(-10.0), "-10");
    }

    #[test]
    fn fractional_values_keep_precision() {
        assert_eq!(format_value(0.004), "0.004");
        assert_eq!(format_value(49.95), "49.95");
        let v = 1.0 / 3.0;
        assert_eq!(format_value(v).parse::<f64>().unwrap(), v);
    }

    #[test]
    fn list_joins_with_comma_space() {
        let cmd = Command::list("LIST:VOLT", &[10.0, 20.0, 50.0]).unwrap();
        assert_eq!(cmd.as_str(), "LIST:VOLT 10, 20, 50");
    }

    #[test]
    fn verb_is_trimmed() {
        let cmd = Command::new("  OUTP ").unwrap().arg(" 1 ").unwrap();
        assert_eq!(cmd.as_str(), "OUTP 1");
    }

    #[test]
    fn rejects_line_breaks() {
        assert!(matches!(
            Command::new("VOLT\n"),
            Err(InvalidInput::ControlCharacter { .. })
        ));
        assert!(matches!(
            Command::new("FUNC").unwrap().arg("SINE\r*RST"),
            Err(InvalidInput::ControlCharacter { .. })
        ));
    }

    #[test]
    fn rejects_empty_verb() {
        assert!(matches!(
            Command::new("   "),
            Err(InvalidInput::Argument { .. })
        ));
    }

    #[test]
    fn quote_wraps_text() {
        let cmd = Command::new("IMAG:SAVE:NAME")
            .unwrap()
            .arg(&quote("TEST001"))
            .unwrap();
        assert_eq!(cmd.as_str(), "IMAG:SAVE:NAME \"TEST001\"");
    }
}
