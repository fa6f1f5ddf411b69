//! Property checks over the plant runtime.

use std::collections::HashMap;

use hz_app::{PlantRuntime, compile_project};
use hz_core::minutes;
use proptest::prelude::*;

const MIXED_PLANT: &str = "\
version: 1
name: mixed plant
plant:
  operation_mode: auto
  flow_mode: advanced
  outside_temp_sensor: sensor.outside
zones:
  - id: living
    name: Living
    circuits: [switch.living]
    temp_sensor: sensor.living
    target_source: number.living
    control:
      type: pwm
  - id: bath
    name: Bath
    circuits: [switch.bath]
    temp_sensor: sensor.bath
    target_source: number.bath
    responsiveness: fast
";

fn runtime() -> PlantRuntime {
    let project = hz_project::from_yaml_str(MIXED_PLANT).expect("project parses");
    PlantRuntime::new(compile_project(&project).expect("project compiles"), 0)
}

proptest! {
    #[test]
    fn zero_dt_ticks_repeat_the_same_report(
        living in 15.0f64..28.0,
        living_target in 18.0f64..25.0,
        bath in 15.0f64..28.0,
        bath_target in 18.0f64..25.0,
        outside in -15.0f64..30.0,
    ) {
        let readings: HashMap<String, f64> = [
            ("sensor.living", living),
            ("number.living", living_target),
            ("sensor.bath", bath),
            ("number.bath", bath_target),
            ("sensor.outside", outside),
        ]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v))
        .collect();

        let mut rt = runtime();
        rt.tick(&readings, minutes(5.0));
        let first = rt.tick(&readings, minutes(0.0));
        let second = rt.tick(&readings, minutes(0.0));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn flow_stays_inside_the_slew_window(
        targets in proptest::collection::vec(18.0f64..25.0, 2..20),
        dt in 0.5f64..10.0,
    ) {
        let mut rt = runtime();
        let cfg = *rt.supervisor().config();
        let mut last: Option<f64> = None;
        for target in targets {
            let readings: HashMap<String, f64> = [
                ("sensor.living", 18.0),
                ("number.living", target),
                ("sensor.bath", 18.0),
                ("number.bath", target),
                ("sensor.outside", 0.0),
            ]
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect();
            let Some(flow) = rt.tick(&readings, minutes(dt)).flow_temp() else {
                continue;
            };
            if let Some(prev) = last {
                prop_assert!(flow - prev <= cfg.slew_up_c_per_5m * dt / 5.0 + 1e-9);
                prop_assert!(prev - flow <= cfg.slew_down_c_per_5m * dt / 5.0 + 1e-9);
            }
            last = Some(flow);
        }
    }
}
