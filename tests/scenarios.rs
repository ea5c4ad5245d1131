use embedded_hal::digital::PinState;
use hf_amp_control as amp;
use hf_amp_control::{
    monotonic::Instant,
    sensors::{DetectorChannel, FrontEnd, PowerDetector, VoltageSensor},
    thermistor::{divider_voltage, DividerSettings},
};

const RELEASED: PinState = PinState::High;
const PRESSED: PinState = PinState::Low;
const TICK_MS: u32 = 5;

const POWER_CURVE: &str = "\
# Detector calibration, 14.2 MHz
FWD,V
0,0.0
25,1.0
100,2.0
400,3.0
";

const THERMISTOR_TABLE: &str = "\
Temperature,32,50,77,104,140
Resistance,32650,19900,10000,5326,2488
";

struct Detector {
    forward: f32,
    reflected: f32,
}

impl PowerDetector for Detector {
    type Error = ();

    fn sample_detector(&mut self, channel: DetectorChannel) -> Result<f32, ()> {
        Ok(match channel {
            DetectorChannel::Forward => self.forward,
            DetectorChannel::Reflected => self.reflected,
        })
    }
}

struct Divider(f32);

impl VoltageSensor for Divider {
    type Error = ();

    fn read_voltage(&mut self) -> Result<f32, ()> {
        Ok(self.0)
    }
}

/// A controller driven at a fixed tick rate.
struct Bench {
    control: amp::AmpControl,
    state: amp::ControlState,
    now: u32,
}

impl Bench {
    fn new(settings: &amp::Settings) -> Self {
        let control = amp::AmpControl::new(settings.control());
        Self {
            state: control.boot_state(),
            control,
            now: 0,
        }
    }

    fn run(&mut self, millis: u32, telemetry: &amp::Telemetry, button: PinState) -> amp::Decision {
        let mut decision = self.state.decision();
        for _ in 0..millis / TICK_MS {
            let (state, output) =
                self.control
                    .step(self.state, telemetry, Instant::from_millis(self.now), button);
            self.state = state;
            decision = output;
            self.now = self.now.wrapping_add(TICK_MS);
        }
        decision
    }

    fn press(&mut self, telemetry: &amp::Telemetry) -> amp::Decision {
        self.run(50, telemetry, PRESSED);
        self.run(50, telemetry, RELEASED)
    }
}

fn nominal() -> amp::Telemetry {
    amp::Telemetry {
        drain_voltage: 28.0,
        drain_current: 3.0,
        supply_voltage: 28.0,
        forward_power: 100.0,
        reflected_power: 2.0,
        swr: 1.3,
        samples: 25,
        temperature: Some(30.0),
    }
}

#[test]
fn boot_enable_trip_and_recover() {
    let mut bench = Bench::new(&amp::Settings::default());

    let decision = bench.run(100, &nominal(), RELEASED);
    assert!(decision.disable, "Amplifier must boot disabled");
    assert!(!decision.amp_enabled);

    let decision = bench.press(&nominal());
    assert!(decision.amp_enabled);
    assert!(!decision.disable);

    // Overcurrent held past the trip debounce.
    let overcurrent = amp::Telemetry {
        drain_current: 9.5,
        ..nominal()
    };
    let decision = bench.run(100, &overcurrent, RELEASED);
    assert!(decision.tripped);
    assert!(!decision.amp_enabled);
    assert!(decision.disable);
    assert_eq!(decision.reason, amp::FaultKind::DrainOvercurrent);

    // Recovering the current does not clear the latch.
    let decision = bench.run(1_000, &nominal(), RELEASED);
    assert!(decision.tripped);
    assert_eq!(decision.reason, amp::FaultKind::DrainOvercurrent);

    let decision = bench.press(&nominal());
    assert!(!decision.tripped);
    assert!(!decision.amp_enabled, "Clearing the latch must leave the amplifier off");
    assert!(decision.disable);
    assert_eq!(decision.reason, amp::FaultKind::Ok);

    let decision = bench.press(&nominal());
    assert!(decision.amp_enabled);
    assert!(!decision.disable);
}

#[test]
fn overtemperature_trips_after_thermal_debounce() {
    let settings = amp::Settings::default();
    let table = amp::calibration::parse_thermistor_table(THERMISTOR_TABLE).unwrap();
    let thermistor = amp::Thermistor::new(&settings.thermistor, &table).unwrap();
    let mut bench = Bench::new(&settings);
    bench.press(&nominal());

    let hot_voltage = divider_voltage(2488.0, &settings.thermistor);
    let mut telemetry = nominal();
    telemetry.apply_temperature(thermistor.read_celsius(&mut Divider(hot_voltage)).unwrap());
    assert!(telemetry.temperature.unwrap() > settings.protection.temperature_max);

    let decision = bench.run(4_900, &telemetry, RELEASED);
    assert!(!decision.tripped);
    assert!(decision.amp_enabled);

    let decision = bench.run(200, &telemetry, RELEASED);
    assert!(decision.tripped);
    assert_eq!(decision.reason, amp::FaultKind::ThermalOvertemp);
}

#[test]
fn measured_pipeline_detects_missing_drive() {
    let settings = amp::Settings::default();
    let curve = amp::calibration::parse_power_curve(POWER_CURVE).unwrap();
    let meter = amp::RfPowerMeter::new(&curve, settings.rf);
    let front_end = FrontEnd::new(&settings.front_end);
    let table = amp::calibration::parse_thermistor_table(THERMISTOR_TABLE).unwrap();
    let thermistor = amp::Thermistor::new(&settings.thermistor, &table).unwrap();

    let measure = |forward: f32, reflected: f32| {
        let mut telemetry = amp::Telemetry {
            drain_voltage: front_end.drain_voltage(1.68),
            drain_current: front_end.drain_current(0.8),
            supply_voltage: front_end.supply_voltage(1.86),
            ..Default::default()
        };
        telemetry.apply_rf(&meter.measure(&mut Detector { forward, reflected }).unwrap());

        let room = divider_voltage(10000.0, &DividerSettings::default());
        telemetry.apply_temperature(thermistor.read_celsius(&mut Divider(room)).unwrap());
        telemetry
    };

    let driven = measure(2.0, 0.2);
    assert!((driven.forward_power - 100.0).abs() < 1e-3);
    assert!((driven.reflected_power - 5.0).abs() < 1e-3);
    assert!(driven.swr > 1.5 && driven.swr < 1.6);
    assert_eq!(driven.samples, 25);
    assert!((driven.temperature.unwrap() - 25.0).abs() < 1e-3);

    let mut bench = Bench::new(&settings);
    let decision = bench.press(&driven);
    assert!(decision.amp_enabled);

    let decision = bench.run(1_000, &driven, RELEASED);
    assert!(!decision.tripped);

    // 10 W forward against roughly 84 W of DC input.
    let undriven = measure(0.4, 0.0);
    assert!((undriven.forward_power - 10.0).abs() < 1e-3);
    assert_eq!(undriven.swr, 1.0);

    let decision = bench.run(100, &undriven, RELEASED);
    assert!(decision.tripped);
    assert_eq!(decision.reason, amp::FaultKind::ForwardPowerLowVsVi);

    let json: heapless::String<128> = serde_json_core::to_string(&decision).unwrap();
    assert!(json.contains(r#""reason":"FORWARD_POWER_LOW_VS_VI""#));
}

#[test]
fn settings_document_configures_controller() {
    let settings = amp::Settings::from_json(
        br#"{"protection":{"trip_debounce_ms":200},"button":{"active_low":false}}"#,
    )
    .unwrap();
    let mut bench = Bench::new(&settings);

    // The button is now active-high.
    bench.run(50, &nominal(), PinState::Low);
    bench.run(50, &nominal(), PinState::High);
    let decision = bench.run(50, &nominal(), PinState::Low);
    assert!(decision.amp_enabled);

    let overvoltage = amp::Telemetry {
        drain_voltage: 40.0,
        ..nominal()
    };
    let decision = bench.run(150, &overvoltage, PinState::Low);
    assert!(!decision.tripped);
    let decision = bench.run(100, &overvoltage, PinState::Low);
    assert!(decision.tripped);
    assert_eq!(decision.reason, amp::FaultKind::DrainOvervoltage);
}

#[test]
fn elapsed_time_survives_counter_wrap() {
    let mut bench = Bench::new(&amp::Settings::default());
    bench.now = u32::MAX - 124;
    bench.press(&nominal());
    assert!(bench.state.amp_enabled());

    let overcurrent = amp::Telemetry {
        drain_current: 12.0,
        ..nominal()
    };
    // The fault starts before the millisecond counter wraps and qualifies after it.
    let decision = bench.run(45, &overcurrent, RELEASED);
    assert!(!decision.tripped);
    let decision = bench.run(10, &overcurrent, RELEASED);
    assert!(decision.tripped);
}
