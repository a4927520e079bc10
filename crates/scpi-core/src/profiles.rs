//! Built-in command tables for the bench instruments.
//!
//! Ranges marked "manual" are constants from the vendor documentation; the
//! others are asked from the instrument on every set.

use crate::descriptor::ParameterDescriptor;
use crate::profile::{DeviceProfile, InitialSetpoint, OutputCommands};

pub const BUILTIN: &[&str] = &[
    "sequoia",
    "chroma_62120d",
    "chroma_61815",
    "waverunner",
    "wt5000",
];

/// Look up a built-in profile by its short name.
pub fn by_name(name: &str) -> Option<DeviceProfile> {
    match name.to_ascii_lowercase().as_str() {
        "sequoia" => Some(sequoia()),
        "chroma_62120d" => Some(chroma_62120d()),
        "chroma_61815" => Some(chroma_61815()),
        "waverunner" => Some(waverunner()),
        "wt5000" => Some(wt5000()),
        _ => None,
    }
}

/// Ametek Sequoia programmable AC/DC source.
pub fn sequoia() -> DeviceProfile {
    let mut profile = DeviceProfile::new("Ametek Sequoia");
    profile.parameters = vec![
        ParameterDescriptor::number("voltage", "VOLT"),
        ParameterDescriptor::number("frequency", "FREQ"),
        ParameterDescriptor::number("current_limit", "CURR"),
        ParameterDescriptor::number("slew", "VOLT:SLEW"),
        ParameterDescriptor::number("voltage_range", "VOLT:RANGE"),
        ParameterDescriptor::number("phases", "SYST:CONF:NOUT")
            .fixed(1.0, 3.0)
            .value_sentinel(),
        ParameterDescriptor::text("function", "FUNC", &[]),
    ];
    profile.output = Some(OutputCommands::new("OUTP 1", "OUTP 0").with_query("OUTP?"));
    profile.on_connect = vec!["VOLT:RANGE 333".to_string()];
    profile.initial_reads = ["phases", "voltage", "frequency", "function", "current_limit"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    profile.initial_setpoints = vec![
        InitialSetpoint::number("current_limit", 40.0),
        InitialSetpoint::number("frequency", 50.0),
        InitialSetpoint::number("slew", 1000.0),
        InitialSetpoint::text("function", "SINE"),
    ];
    profile.list_mode = true;
    profile
}

/// Chroma 62120D-1200 bidirectional DC supply.
pub fn chroma_62120d() -> DeviceProfile {
    let mut profile = DeviceProfile::new("Chroma 62120D-1200");
    profile.parameters = vec![
        ParameterDescriptor::number("voltage", "SOUR:VOLT").queried(),
        ParameterDescriptor::number("slew", "SOUR:VOLT:SLEW").queried(),
        ParameterDescriptor::number("source_current_limit", "SOUR:CURR:LIM:LOW")
            .queried()
            .with_prelude(&["SOUR:CURR:PROT:HIGH MAX", "SOUR:CURR:LIM:HIGH MAX"]),
        ParameterDescriptor::number("load_current_limit", "LOAD:CURR:PROT:HIGH").queried(),
        ParameterDescriptor::text("mode", "SYST:MODE", &["SOURCE-LOAD", "SOUR", "LOAD"]),
    ];
    profile.output = Some(OutputCommands::new("OUTP ON", "OUTP OFF"));
    profile.initial_reads = [
        "voltage",
        "slew",
        "source_current_limit",
        "load_current_limit",
    ]
    .iter()
    .map(|s| s.to_string())
    .collect();
    profile.initial_setpoints = vec![
        InitialSetpoint::number("slew", 1.0),
        InitialSetpoint::number("source_current_limit", 40.0),
        InitialSetpoint::number("load_current_limit", 40.0),
    ];
    profile
}

/// Chroma 61815 regenerative grid simulator.
pub fn chroma_61815() -> DeviceProfile {
    let mut profile = DeviceProfile::new("Chroma 61815");
    profile.error_query = Some("SYST:ERR?".to_string());
    profile.parameters = vec![
        // manual
        ParameterDescriptor::number("voltage", "VOLT:AC")
            .fixed(0.0, 350.0)
            .value_sentinel(),
        // manual
        ParameterDescriptor::number("frequency", "FREQ")
            .fixed(30.0, 100.0)
            .value_sentinel(),
        ParameterDescriptor::number("slew", "OUTP:SLEW:VOLT:AC"),
    ];
    profile.output = Some(OutputCommands::new("OUTP ON", "OUTP OFF").with_query("OUTP?"));
    profile.initial_reads = vec!["voltage".to_string(), "frequency".to_string()];
    profile.initial_setpoints = vec![InitialSetpoint::number("slew", 1.0)];
    profile
}

/// LeCroy WaveRunner oscilloscope.
pub fn waverunner() -> DeviceProfile {
    let mut profile = DeviceProfile::new("LeCroy WaveRunner");
    profile.parameters = vec![ParameterDescriptor::text(
        "trigger_mode",
        "TRMD",
        &["AUTO", "NORMAL", "SINGLE", "STOP"],
    )];
    profile.on_connect = vec![crate::devices::HARDCOPY_SETUP.to_string()];
    profile
}

/// Yokogawa WT5000 power analyzer.
pub fn wt5000() -> DeviceProfile {
    let mut profile = DeviceProfile::new("Yokogawa WT5000");
    profile.parameters = vec![
        ParameterDescriptor::text("remote", "COMM:REM", &["ON", "OFF"]),
        ParameterDescriptor::text("screen_drive", "IMAG:SAVE:DRIV", &["USER", "USB", "NETW", "NETWork"]),
        ParameterDescriptor::text("screen_name", "IMAG:SAVE:NAME", &[]).quoted(),
        ParameterDescriptor::text("screen_format", "IMAG:FORM", &["PNG", "BMP", "JPEG"]),
    ];
    profile
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::{Bounds, Sentinel};

    #[test]
    fn every_builtin_validates() {
        for name in BUILTIN {
            let profile = by_name(name).unwrap();
            profile.validate().unwrap();
        }
    }

    #[test]
    fn lookup_is_case_insensitive() {
        assert_eq!(by_name("WT5000").unwrap().model, "Yokogawa WT5000");
        assert!(by_name("keithley").is_none());
    }

    #[test]
    fn grid_simulator_uses_manual_ranges() {
        let profile = chroma_61815();
        let voltage = profile.parameter("voltage").unwrap();
        assert_eq!(
            voltage.bounds,
            Bounds::Fixed {
                min: 0.0,
                max: 350.0
            }
        );
        assert_eq!(voltage.sentinel, Sentinel::Value);
        assert_eq!(voltage.query, "VOLT:AC?");
    }

    #[test]
    fn dc_supply_queries_ranges() {
        let profile = chroma_62120d();
        assert!(profile
            .parameters
            .iter()
            .filter(|p| p.is_numeric())
            .all(|p| p.bounds == Bounds::Queried));
        assert_eq!(
            profile.parameter("source_current_limit").unwrap().prelude.len(),
            2
        );
    }

    #[test]
    fn builtins_survive_json() {
        for name in BUILTIN {
            let profile = by_name(name).unwrap();
            let json = serde_json::to_string(&profile).unwrap();
            let back: DeviceProfile = serde_json::from_str(&json).unwrap();
            assert_eq!(back, profile);
        }
    }
}
