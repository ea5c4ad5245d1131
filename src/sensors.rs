//! Interfaces to the amplifier's analog front end
//!
//! The ADC drivers themselves live outside of this crate. They are consumed through the traits
//! defined here, which return voltages measured at the converter input.
use embedded_hal::digital::{InputPin, PinState};
use serde::{Deserialize, Serialize};

use crate::linear_transformation::LinearTransformation;

/// A single-ended voltage measurement, such as the thermistor divider tap.
pub trait VoltageSensor {
    type Error;

    /// Perform one conversion and return the input voltage in volts.
    fn read_voltage(&mut self) -> Result<f32, Self::Error>;
}

/// The two outputs of the directional coupler's power detectors.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum DetectorChannel {
    Forward,
    Reflected,
}

/// Provide an interface to sample the RF power detector outputs.
pub trait PowerDetector {
    type Error;

    /// Perform one conversion of a detector output.
    ///
    /// # Args
    /// * `channel` - The detector to sample.
    ///
    /// # Returns
    /// The detector output voltage in volts.
    fn sample_detector(&mut self, channel: DetectorChannel) -> Result<f32, Self::Error>;
}

/// Scaling of the analog supply and bias monitors.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FrontEndSettings {
    /// Drain voltage divider ratio (drain volts per ADC volt).
    pub drain_voltage_scale: f32,

    /// Current-sense output voltage at zero drain current.
    pub current_offset: f32,

    /// Current-sense gain in volts per amp.
    pub current_sensitivity: f32,

    /// Supply voltage divider ratio (supply volts per ADC volt).
    pub supply_voltage_scale: f32,
}

impl Default for FrontEndSettings {
    fn default() -> Self {
        Self {
            drain_voltage_scale: 16.6666,
            current_offset: 0.5,
            current_sensitivity: 0.1,
            supply_voltage_scale: 15.05,
        }
    }
}

impl FrontEndSettings {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if !(self.drain_voltage_scale.is_finite() && self.drain_voltage_scale > 0.0) {
            return Err("Drain voltage scale must be positive");
        }

        if !(self.supply_voltage_scale.is_finite() && self.supply_voltage_scale > 0.0) {
            return Err("Supply voltage scale must be positive");
        }

        if !(self.current_sensitivity.is_finite() && self.current_sensitivity > 0.0) {
            return Err("Current sensitivity must be positive");
        }

        if !self.current_offset.is_finite() {
            return Err("Current offset must be finite");
        }

        Ok(())
    }
}

/// Converts ADC pin voltages of the supply monitors into SI units.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct FrontEnd {
    drain_voltage: LinearTransformation,
    drain_current: LinearTransformation,
    supply_voltage: LinearTransformation,
}

impl FrontEnd {
    pub fn new(settings: &FrontEndSettings) -> Self {
        Self {
            drain_voltage: LinearTransformation::new(settings.drain_voltage_scale, 0.0),
            drain_current: LinearTransformation::from_zero_and_sensitivity(
                settings.current_offset,
                settings.current_sensitivity,
            ),
            supply_voltage: LinearTransformation::new(settings.supply_voltage_scale, 0.0),
        }
    }

    /// Get the drain voltage in volts from the divider tap voltage.
    pub fn drain_voltage(&self, pin_voltage: f32) -> f32 {
        self.drain_voltage.map(pin_voltage)
    }

    /// Get the drain current in amps from the current-sense output voltage.
    ///
    /// # Note
    /// Readings below the zero-current offset are reported as zero.
    pub fn drain_current(&self, pin_voltage: f32) -> f32 {
        self.drain_current.map(pin_voltage).max(0.0)
    }

    /// Get the current-sense output voltage corresponding to a drain current.
    ///
    /// # Note
    /// Used to program a hardware overcurrent comparator with the same threshold as the
    /// protection settings.
    ///
    /// # Args
    /// * `amps` - The drain current in amps.
    pub fn current_sense_voltage(&self, amps: f32) -> f32 {
        self.drain_current.invert(amps)
    }

    /// Get the supply voltage in volts from the divider tap voltage.
    pub fn supply_voltage(&self, pin_voltage: f32) -> f32 {
        self.supply_voltage.map(pin_voltage)
    }
}

/// Sample the raw level of a front-panel button.
pub fn read_button_level<P: InputPin>(pin: &mut P) -> Result<PinState, P::Error> {
    Ok(PinState::from(pin.is_high()?))
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;

    struct FixedPin(bool);

    impl embedded_hal::digital::ErrorType for FixedPin {
        type Error = Infallible;
    }

    impl InputPin for FixedPin {
        fn is_high(&mut self) -> Result<bool, Self::Error> {
            Ok(self.0)
        }

        fn is_low(&mut self) -> Result<bool, Self::Error> {
            Ok(!self.0)
        }
    }

    #[test]
    fn front_end_scaling() {
        let front_end = FrontEnd::new(&FrontEndSettings::default());

        assert!((front_end.drain_voltage(1.8) - 29.99988).abs() < 1e-3);
        assert!((front_end.supply_voltage(2.0) - 30.1).abs() < 1e-4);
        assert!((front_end.drain_current(0.8) - 3.0).abs() < 1e-4);
    }

    #[test]
    fn drain_current_never_negative() {
        let front_end = FrontEnd::new(&FrontEndSettings::default());
        assert_eq!(front_end.drain_current(0.1), 0.0);
    }

    #[test]
    fn current_sense_threshold() {
        let front_end = FrontEnd::new(&FrontEndSettings::default());
        let threshold = front_end.current_sense_voltage(9.0);
        assert!((threshold - 1.4).abs() < 1e-5);
        assert!((front_end.drain_current(threshold) - 9.0).abs() < 1e-4);
    }

    #[test]
    fn button_level() {
        assert_eq!(read_button_level(&mut FixedPin(true)), Ok(PinState::High));
        assert_eq!(read_button_level(&mut FixedPin(false)), Ok(PinState::Low));
    }

    #[test]
    fn rejects_zero_sensitivity() {
        let settings = FrontEndSettings {
            current_sensitivity: 0.0,
            ..Default::default()
        };
        assert!(settings.validate().is_err());
        assert!(FrontEndSettings::default().validate().is_ok());
    }
}
