//! Heatsink thermistor temperature measurement
//!
//! The NTC thermistor sits in the lower leg of a resistor divider:
//!
//! ```text
//! VREF --- R_FIXED --- ADC --- NTC --- GND
//! ```
//!
//! The divider voltage for each calibrated resistance is computed once at construction, giving a
//! voltage to temperature curve that is evaluated directly on every reading.
use heapless::Vec;
use serde::{Deserialize, Serialize};

use crate::{
    calibration::ThermistorTable,
    piecewise_linear::{PiecewiseLinear, MAX_POINTS},
    sensors::VoltageSensor,
    Error,
};

/// Electrical configuration of the thermistor divider.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct DividerSettings {
    /// The voltage at the top of the divider.
    pub reference_voltage: f32,

    /// The fixed upper resistor in Ohms.
    pub fixed_resistance: f32,
}

impl Default for DividerSettings {
    fn default() -> Self {
        Self {
            reference_voltage: 3.3,
            fixed_resistance: 4700.0,
        }
    }
}

impl DividerSettings {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !(self.reference_voltage.is_finite() && self.reference_voltage > 0.0) {
            return Err("Divider reference voltage must be positive");
        }

        if !(self.fixed_resistance.is_finite() && self.fixed_resistance > 0.0) {
            return Err("Divider fixed resistance must be positive");
        }

        Ok(())
    }
}

/// Compute the voltage at the divider tap for a given thermistor resistance.
pub fn divider_voltage(resistance: f32, settings: &DividerSettings) -> f32 {
    settings.reference_voltage * resistance / (settings.fixed_resistance + resistance)
}

/// Convert a temperature from degrees Fahrenheit into degrees Celsius.
pub fn fahrenheit_to_celsius(fahrenheit: f32) -> f32 {
    (fahrenheit - 32.0) * (5.0 / 9.0)
}

/// A calibrated thermistor.
#[derive(Debug, Clone, PartialEq)]
pub struct Thermistor {
    voltage_to_fahrenheit: PiecewiseLinear,
}

impl Thermistor {
    /// Construct a thermistor from its divider configuration and resistance table.
    ///
    /// # Args
    /// * `settings` - The divider the thermistor is placed in.
    /// * `table` - The measured resistance of the thermistor over temperature.
    ///
    /// # Returns
    /// The thermistor, or [Error::InvalidCalibration] if a resistance is not positive.
    pub fn new(settings: &DividerSettings, table: &ThermistorTable) -> Result<Self, Error> {
        let mut voltages: Vec<f32, MAX_POINTS> = Vec::new();
        for &resistance in table.resistances() {
            if !(resistance > 0.0) {
                log::error!("Thermistor resistance {} is not positive", resistance);
                return Err(Error::InvalidCalibration);
            }

            voltages
                .push(divider_voltage(resistance, settings))
                .map_err(|_| Error::InvalidCalibration)?;
        }

        Ok(Self {
            voltage_to_fahrenheit: PiecewiseLinear::new(&voltages, table.temperatures_f())?,
        })
    }

    /// Get the temperature in degrees Fahrenheit for a divider tap voltage.
    pub fn fahrenheit(&self, voltage: f32) -> f32 {
        self.voltage_to_fahrenheit.evaluate(voltage)
    }

    /// Get the temperature in degrees Celsius for a divider tap voltage.
    pub fn celsius(&self, voltage: f32) -> f32 {
        fahrenheit_to_celsius(self.fahrenheit(voltage))
    }

    /// Sample the divider and return the temperature in degrees Fahrenheit.
    pub fn read_fahrenheit<S: VoltageSensor>(&self, sensor: &mut S) -> Result<f32, S::Error> {
        Ok(self.fahrenheit(sensor.read_voltage()?))
    }

    /// Sample the divider and return the temperature in degrees Celsius.
    pub fn read_celsius<S: VoltageSensor>(&self, sensor: &mut S) -> Result<f32, S::Error> {
        Ok(self.celsius(sensor.read_voltage()?))
    }
}
