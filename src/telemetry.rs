//! Amplifier telemetry snapshot
//!
//! A snapshot is assembled by the host once per scheduling tick from the latest supply, RF and
//! thermal readings and handed to the protection logic as a single value.
use serde::{Deserialize, Serialize};

use crate::rf_power::RfMeasurement;

/// Contains amplifier telemetry in SI units.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct Telemetry {
    /// Drain voltage in volts.
    pub drain_voltage: f32,

    /// Drain current in amps.
    pub drain_current: f32,

    /// Supply voltage in volts.
    pub supply_voltage: f32,

    /// Forward RF power in Watts.
    pub forward_power: f32,

    /// Reflected RF power in Watts.
    pub reflected_power: f32,

    /// Standing-wave ratio. Infinite when undefined.
    pub swr: f32,

    /// Number of detector samples behind the RF readings.
    pub samples: u32,

    /// Heatsink temperature in degrees Celsius, if a reading is available.
    pub temperature: Option<f32>,
}

impl Default for Telemetry {
    fn default() -> Self {
        Self {
            drain_voltage: 0.0,
            drain_current: 0.0,
            supply_voltage: 0.0,
            forward_power: 0.0,
            reflected_power: 0.0,
            // Without forward power the standing-wave ratio is undefined.
            swr: f32::INFINITY,
            samples: 0,
            temperature: None,
        }
    }
}

impl Telemetry {
    /// Update the RF readings from a power measurement.
    pub fn apply_rf(&mut self, measurement: &RfMeasurement) {
        self.forward_power = measurement.forward_power;
        self.reflected_power = measurement.reflected_power;
        self.swr = measurement.swr;
        self.samples = measurement.samples;
    }

    /// Update the heatsink temperature in degrees Celsius.
    pub fn apply_temperature(&mut self, celsius: f32) {
        self.temperature = Some(celsius);
    }

    /// DC input power of the amplifier (supply voltage times drain current) in Watts.
    pub fn dc_input_power(&self) -> f32 {
        self.supply_voltage * self.drain_current
    }

    /// Replace readings that are not a number with their defaults.
    ///
    /// # Note
    /// A NaN temperature is treated as a missing reading. Infinite readings are kept, since they
    /// still compare correctly against the protection thresholds.
    pub fn sanitized(&self) -> Self {
        fn or_zero(value: f32) -> f32 {
            if value.is_nan() {
                0.0
            } else {
                value
            }
        }

        Self {
            drain_voltage: or_zero(self.drain_voltage),
            drain_current: or_zero(self.drain_current),
            supply_voltage: or_zero(self.supply_voltage),
            forward_power: or_zero(self.forward_power),
            reflected_power: or_zero(self.reflected_power),
            swr: if self.swr.is_nan() {
                f32::INFINITY
            } else {
                self.swr
            },
            samples: self.samples,
            temperature: self.temperature.filter(|celsius| !celsius.is_nan()),
        }
    }
}
