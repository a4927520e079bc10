#![cfg(feature = "simulation")]

use scpi_core::profiles;
use scpi_core::{
    DeviceProfile, Instrument, InstrumentError, InvalidInput, ListProgram, Range, Reading,
    SimHandle, SimulatedInstrument, TimeUnit, TransportError,
};
use std::time::Duration;

fn session(profile: DeviceProfile) -> (Instrument<SimulatedInstrument>, SimHandle) {
    let sim = SimulatedInstrument::for_profile(&profile);
    let handle = sim.handle();
    (Instrument::new(sim, profile), handle)
}

#[test]
fn grid_simulator_clamps_to_manual_range() {
    let (mut grid, handle) = session(profiles::chroma_61815());

    let actual = grid.set_parameter("voltage", 400.0).unwrap();
    assert_eq!(handle.last_write().as_deref(), Some("VOLT:AC 350"));
    assert_eq!(actual, 350.0);
    assert_eq!(grid.state().number("voltage"), Some(350.0));

    let actual = grid.set_parameter("voltage", -10.0).unwrap();
    assert_eq!(handle.last_write().as_deref(), Some("VOLT:AC 0"));
    assert_eq!(actual, 0.0);
}

#[test]
fn in_range_value_written_verbatim() {
    let (mut grid, handle) = session(profiles::chroma_61815());
    grid.set_parameter("frequency", 49.95).unwrap();
    assert_eq!(handle.writes(), vec!["FREQ 49.95"]);
    assert_eq!(handle.log(), vec!["FREQ 49.95", "FREQ?"]);
}

#[test]
fn repeated_set_is_idempotent() {
    let (mut grid, handle) = session(profiles::chroma_61815());

    grid.set_parameter("voltage", 120.0).unwrap();
    let first_state = grid.state().clone();
    grid.set_parameter("voltage", 120.0).unwrap();

    assert_eq!(handle.writes(), vec!["VOLT:AC 120", "VOLT:AC 120"]);
    assert_eq!(grid.state(), &first_state);
}

#[test]
fn queried_bounds_use_keyword_sentinels() {
    let (mut dc, handle) = session(profiles::chroma_62120d());
    handle.set_bounds("SOUR:VOLT", Range::new(0.0, 1200.0));

    let actual = dc.set_parameter("voltage", 1500.0).unwrap();
    assert_eq!(
        handle.log(),
        vec!["SOUR:VOLT? MAX", "SOUR:VOLT? MIN", "SOUR:VOLT MAX", "SOUR:VOLT?"]
    );
    assert_eq!(actual, 1200.0);

    dc.set_parameter("voltage", 0.0).unwrap();
    assert_eq!(handle.last_write().as_deref(), Some("SOUR:VOLT MIN"));

    dc.set_parameter("voltage", 290.0).unwrap();
    assert_eq!(handle.last_write().as_deref(), Some("SOUR:VOLT 290"));
    assert_eq!(dc.state().number("voltage"), Some(290.0));
}

#[test]
fn prelude_written_before_current_limit() {
    let (mut dc, handle) = session(profiles::chroma_62120d());
    dc.set_parameter("source_current_limit", 40.0).unwrap();
    assert_eq!(
        handle.writes(),
        vec![
            "SOUR:CURR:PROT:HIGH MAX",
            "SOUR:CURR:LIM:HIGH MAX",
            "SOUR:CURR:LIM:LOW 40",
        ]
    );
}

#[test]
fn timeout_leaves_cache_unchanged() {
    let (mut grid, handle) = session(profiles::chroma_61815());
    grid.set_parameter("voltage", 100.0).unwrap();

    handle.fail_next_query();
    let err = grid.set_parameter("voltage", 200.0).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::Transport(TransportError::Timeout { .. })
    ));
    assert_eq!(grid.state().number("voltage"), Some(100.0));
}

#[test]
fn failed_write_leaves_cache_unchanged() {
    let (mut grid, handle) = session(profiles::chroma_61815());
    grid.set_parameter("voltage", 100.0).unwrap();
    handle.clear_log();

    handle.fail_next_write();
    let err = grid.set_parameter("voltage", 200.0).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::Transport(TransportError::Disconnected { .. })
    ));
    assert_eq!(handle.log(), vec!["VOLT:AC 200"]);
    assert_eq!(handle.value("VOLT:AC").as_deref(), Some("100"));
    assert_eq!(grid.state().number("voltage"), Some(100.0));
}

#[test]
fn failed_bound_query_leaves_cache_unchanged() {
    let (mut dc, handle) = session(profiles::chroma_62120d());
    dc.set_parameter("voltage", 290.0).unwrap();
    handle.clear_log();

    handle.fail_next_query();
    let err = dc.set_parameter("voltage", 300.0).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::Transport(TransportError::Timeout { .. })
    ));
    assert_eq!(handle.log(), vec!["SOUR:VOLT? MAX"]);

    handle.respond("SOUR:VOLT? MIN", "OVERRANGE");
    let err = dc.set_parameter("voltage", 300.0).unwrap_err();
    assert!(matches!(err, InstrumentError::Parse(_)));

    assert!(handle.writes().is_empty());
    assert_eq!(dc.state().number("voltage"), Some(290.0));
}

#[test]
fn unparseable_readback_is_a_parse_error() {
    let (mut grid, handle) = session(profiles::chroma_61815());
    handle.respond("VOLT:AC?", "ERR");
    let err = grid.set_parameter("voltage", 100.0).unwrap_err();
    assert!(err.is_parse());
    assert_eq!(grid.cached("voltage"), None);
}

#[test]
fn rejected_requests_never_reach_the_device() {
    let (mut grid, handle) = session(profiles::chroma_61815());

    let err = grid.set_parameter("voltage", f64::NAN).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::InvalidInput(InvalidInput::NonFinite { .. })
    ));
    let err = grid.set_parameter("current", 1.0).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::InvalidInput(InvalidInput::UnknownParameter { .. })
    ));
    assert!(handle.log().is_empty());
}

#[test]
fn connect_runs_profile_sequence() {
    let profile = profiles::chroma_61815();
    let sim = SimulatedInstrument::for_profile(&profile);
    let handle = sim.handle();

    let grid = Instrument::connect(sim, profile).unwrap();
    assert_eq!(
        handle.log(),
        vec![
            "*IDN?",
            "SYST:ERR?",
            "OUTP?",
            "VOLT:AC?",
            "FREQ?",
            "OUTP:SLEW:VOLT:AC 1",
            "OUTP:SLEW:VOLT:AC?",
        ]
    );
    assert_eq!(grid.state().identity(), Some("SIMULATED,Chroma 61815,0,1.0"));
    assert_eq!(grid.state().output_enabled(), Some(false));
    assert_eq!(grid.state().number("slew"), Some(1.0));
}

#[test]
fn ac_source_connect_applies_initial_setpoints() {
    let profile = profiles::sequoia();
    let sim = SimulatedInstrument::for_profile(&profile);
    let handle = sim.handle();

    let ac = Instrument::connect(sim, profile).unwrap();
    assert_eq!(
        handle.writes(),
        vec![
            "VOLT:RANGE 333",
            "CURR 40",
            "FREQ 50",
            "VOLT:SLEW 1000",
            "FUNC SINE",
        ]
    );
    assert_eq!(ac.state().text("function"), Some("SINE"));
    assert_eq!(ac.state().number("frequency"), Some(50.0));
}

#[test]
fn output_toggle_caches_commanded_state() {
    let (mut ac, handle) = session(profiles::sequoia());
    assert_eq!(ac.state().output_enabled(), None);
    assert!(!ac.state().switched_on());

    ac.set_output(true, Duration::ZERO).unwrap();
    assert_eq!(handle.log(), vec!["OUTP 1"]);
    assert_eq!(ac.state().output_enabled(), Some(true));

    ac.set_output(false, Duration::from_millis(5)).unwrap();
    assert_eq!(handle.last_write().as_deref(), Some("OUTP 0"));
    assert_eq!(ac.state().output_enabled(), Some(false));
    assert!(ac.state().switched_on());
}

#[test]
fn scope_has_no_output() {
    let (mut scope, _handle) = session(profiles::waverunner());
    let err = scope.set_output(true, Duration::ZERO).unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::InvalidInput(InvalidInput::Unsupported { .. })
    ));
}

#[test]
fn list_program_order() {
    let (mut ac, handle) = session(profiles::sequoia());
    let program = ListProgram::new(vec![1.0, 1.0, 1.0]).voltage(vec![10.0, 20.0, 50.0]);
    ac.run_list(&program).unwrap();
    assert_eq!(
        handle.writes(),
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
fn list_mode_requires_capable_profile() {
    let (mut grid, handle) = session(profiles::chroma_61815());
    let program = ListProgram::new(vec![1.0]).voltage(vec![10.0]);
    assert!(grid.run_list(&program).is_err());
    assert!(handle.writes().is_empty());
}

#[test]
fn enumerated_text_setpoint() {
    let (mut scope, handle) = session(profiles::waverunner());
    let mode = scope.set_text("trigger_mode", "normal").unwrap();
    assert_eq!(handle.writes(), vec!["TRMD NORMAL"]);
    assert_eq!(mode, "NORMAL");
    assert_eq!(
        scope.cached("trigger_mode"),
        Some(&Reading::Text("NORMAL".to_string()))
    );

    let err = scope.set_text("trigger_mode", "ROLL").unwrap_err();
    assert!(matches!(
        err,
        InstrumentError::InvalidInput(InvalidInput::NotAllowed { .. })
    ));
}

#[test]
fn scope_operations() {
    let (mut scope, handle) = session(profiles::waverunner());
    assert_eq!(scope.set_timebase(2.0, TimeUnit::S).unwrap(), "2S");
    assert_eq!(scope.set_trigger_level(310.0, 1).unwrap(), "310");
    scope.recall_panel("HDD", "D:\\Panels\\bench.lss").unwrap();
    assert_eq!(
        handle.writes(),
        vec![
            "TIME_DIV 2S",
            "C1:TRIG_LEVEL 310",
            "RCPN DISK,HDD,FILE,'D:\\Panels\\bench.lss'",
        ]
    );
    assert_eq!(scope.state().text("timebase"), Some("2S"));
}

#[test]
fn analyzer_screen_capture() {
    let (mut wt, handle) = session(profiles::wt5000());
    handle.respond("FILE:PATH?", "\"USER/SCREENS\"");

    wt.set_screen_name("TEST001").unwrap();
    let path = wt.set_screen_folder("SCREENS", "user").unwrap();
    wt.save_screen().unwrap();

    assert_eq!(path, "\"USER/SCREENS\"");
    assert_eq!(
        handle.writes(),
        vec![
            "IMAG:SAVE:NAME \"TEST001\"",
            "IMAG:SAVE:DRIV USER",
            "IMAG:SAVE:CDIR \"SCREENS\"",
            "IMAG:EXEC",
        ]
    );
    assert!(wt.set_screen_name("bad name").is_err());
}

#[test]
fn analyzer_screen_name_and_drive_checks() {
    let (mut wt, handle) = session(profiles::wt5000());

    for name in [" A", "A ", "", "A-1"] {
        assert!(wt.set_screen_name(name).is_err(), "accepted {:?}", name);
    }
    assert!(handle.writes().is_empty());

    handle.respond("FILE:PATH?", "\"NETW/SCREENS\"");
    wt.set_screen_folder("SCREENS", "NETW").unwrap();
    assert_eq!(handle.writes()[0], "IMAG:SAVE:DRIV NETW");
    assert!(wt.set_screen_folder("SCREENS", "CLOUD").is_err());
}

#[test]
fn close_consumes_session() {
    let (grid, handle) = session(profiles::chroma_61815());
    grid.close().unwrap();
    assert!(handle.is_closed());
}

#[test]
fn drop_closes_session() {
    let (grid, handle) = session(profiles::chroma_61815());
    drop(grid);
    assert!(handle.is_closed());
}
