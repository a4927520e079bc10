#[cfg(test)]
mod proptest_setpoint {
    use crate::command::format_value;
    use crate::descriptor::*;
    use crate::instrument::Instrument;
    use crate::profiles;
    use crate::sim::SimulatedInstrument;
    use proptest::prelude::*;

    fn grid_voltage() -> ParameterDescriptor {
        ParameterDescriptor::number("voltage", "VOLT:AC")
            .fixed(0.0, 350.0)
            .value_sentinel()
    }

    fn keyword_voltage() -> ParameterDescriptor {
        ParameterDescriptor::number("voltage", "SOUR:VOLT").queried()
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(2000))]

        // Requests at or above max become the MAX sentinel
        #[test]
        fn above_max_uses_max_sentinel(
            min in -1000.0f64..0.0,
            span in 1.0f64..2000.0,
            excess in 0.0f64..1.0e6,
        ) {
            let range = Range::new(min, min + span);
            let decision = SetpointDecision::decide(range.max + excess, Some(range));
            prop_assert_eq!(decision, SetpointDecision::Max(range.max));
            let cmd = decision.command(&keyword_voltage()).unwrap();
            prop_assert_eq!(cmd.as_str(), "SOUR:VOLT MAX");
        }

        // Requests at or below min become the MIN sentinel
        #[test]
        fn below_min_uses_min_sentinel(
            min in -1000.0f64..0.0,
            span in 1.0f64..2000.0,
            deficit in 0.0f64..1.0e6,
        ) {
            let range = Range::new(min, min + span);
            let decision = SetpointDecision::decide(range.min - deficit, Some(range));
            prop_assert_eq!(decision, SetpointDecision::Min(range.min));
            let cmd = decision.command(&keyword_voltage()).unwrap();
            prop_assert_eq!(cmd.as_str(), "SOUR:VOLT MIN");
        }

        // In-range requests are sent verbatim and round-trip without loss
        #[test]
        fn in_range_sent_exactly(value in 0.000_001f64..349.999_999) {
            let decision = SetpointDecision::decide(value, Some(Range::new(0.0, 350.0)));
            prop_assert_eq!(decision, SetpointDecision::Exact(value));
            let cmd = decision.command(&grid_voltage()).unwrap();
            let sent = cmd.as_str().strip_prefix("VOLT:AC ").unwrap();
            prop_assert_eq!(sent.parse::<f64>().unwrap(), value);
        }

        // Value sentinels never leave the manual range
        #[test]
        fn value_sentinel_stays_in_range(value in -1.0e6f64..1.0e6) {
            let decision = SetpointDecision::decide(value, Some(Range::new(0.0, 350.0)));
            let cmd = decision.command(&grid_voltage()).unwrap();
            let sent: f64 = cmd.as_str().strip_prefix("VOLT:AC ").unwrap().parse().unwrap();
            prop_assert!((0.0..=350.0).contains(&sent));
        }

        // The cache always holds the device's answer after a set
        #[test]
        fn cache_matches_device_after_set(value in -1000.0f64..1000.0) {
            let profile = profiles::chroma_61815();
            let sim = SimulatedInstrument::for_profile(&profile);
            let handle = sim.handle();
            let mut instrument = Instrument::new(sim, profile);

            let actual = instrument.set_parameter("voltage", value).unwrap();
            let device: f64 = handle.value("VOLT:AC").unwrap().parse().unwrap();
            prop_assert_eq!(actual, device);
            prop_assert_eq!(instrument.state().number("voltage"), Some(device));
            prop_assert_eq!(
                handle.last_write().unwrap(),
                format!("VOLT:AC {}", format_value(value.clamp(0.0, 350.0)))
            );
        }
    }
}
