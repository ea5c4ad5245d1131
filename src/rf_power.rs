//! RF power and standing-wave ratio measurement
//!
//! The forward and reflected detector outputs are averaged over a fixed window, mapped through
//! the calibrated detector curve and combined into a standing-wave ratio. Degenerate power pairs
//! (no forward power, reflected power at or above forward power) are reported as an infinite SWR
//! rather than as an error.
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

use crate::{
    monotonic::Duration,
    piecewise_linear::PiecewiseLinear,
    sensors::{DetectorChannel, PowerDetector},
};

/// Conversion rates supported by the detector ADC.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Sequence)]
pub enum DataRate {
    Sps8,
    Sps16,
    Sps32,
    Sps64,
    Sps128,
    Sps250,
    Sps475,
    Sps860,
}

impl DataRate {
    /// The number of conversions the ADC completes per second.
    pub fn samples_per_second(&self) -> u32 {
        match self {
            DataRate::Sps8 => 8,
            DataRate::Sps16 => 16,
            DataRate::Sps32 => 32,
            DataRate::Sps64 => 64,
            DataRate::Sps128 => 128,
            DataRate::Sps250 => 250,
            DataRate::Sps475 => 475,
            DataRate::Sps860 => 860,
        }
    }
}

/// Settings of the power measurement window.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct RfSettings {
    /// The detector ADC conversion rate.
    pub data_rate: DataRate,

    /// The averaging window in milliseconds.
    pub window_ms: u32,
}

impl Default for RfSettings {
    fn default() -> Self {
        Self {
            data_rate: DataRate::Sps250,
            window_ms: 100,
        }
    }
}

impl RfSettings {
    /// The averaging window.
    pub fn window(&self) -> Duration {
        Duration::from_millis(self.window_ms)
    }

    /// The number of samples taken of each detector per measurement.
    pub fn sample_count(&self) -> u32 {
        sample_count(self.data_rate.samples_per_second(), self.window())
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.window_ms == 0 {
            return Err("RF averaging window must be non-zero");
        }

        Ok(())
    }
}

/// Compute the number of conversions that fit into an averaging window.
///
/// # Args
/// * `rate` - The conversion rate in samples per second.
/// * `window` - The averaging window.
///
/// # Returns
/// The rounded sample count, never less than 1.
pub fn sample_count(rate: u32, window: Duration) -> u32 {
    let samples = libm::round(rate as f64 * window.as_millis() as f64 / 1000.0);
    if samples < 1.0 {
        1
    } else {
        samples as u32
    }
}

/// Compute the standing-wave ratio of a forward/reflected power pair.
///
/// # Args
/// * `forward` - The forward power in Watts.
/// * `reflected` - The reflected power in Watts. Negative values are treated as zero.
///
/// # Returns
/// The SWR, or `f32::INFINITY` if there is no forward power or the reflected power is at least
/// the forward power.
pub fn swr_from_powers(forward: f32, reflected: f32) -> f32 {
    if !(forward > 0.0) {
        return f32::INFINITY;
    }

    let reflected = reflected.max(0.0);
    let ratio = reflected / forward;
    if !(ratio < 1.0) {
        return f32::INFINITY;
    }

    let gamma = libm::sqrtf(ratio);
    let denominator = 1.0 - gamma;
    if denominator <= 0.0 {
        return f32::INFINITY;
    }

    (1.0 + gamma) / denominator
}

/// A single windowed RF power measurement.
#[derive(Serialize, Debug, Copy, Clone, PartialEq)]
pub struct RfMeasurement {
    /// Mean forward detector voltage.
    pub forward_voltage: f32,

    /// Mean reflected detector voltage.
    pub reflected_voltage: f32,

    /// Forward power in Watts.
    pub forward_power: f32,

    /// Reflected power in Watts.
    pub reflected_power: f32,

    /// Power delivered to the load in Watts.
    pub delivered_power: f32,

    /// Standing-wave ratio. Infinite when undefined.
    pub swr: f32,

    /// The number of samples averaged per detector.
    pub samples: u32,
}

/// Measures forward and reflected power through a shared detector calibration.
pub struct RfPowerMeter<'a> {
    curve: &'a PiecewiseLinear,
    settings: RfSettings,
}

impl<'a> RfPowerMeter<'a> {
    /// Construct a power meter.
    ///
    /// # Args
    /// * `curve` - The detector voltage to power (Watts) calibration.
    /// * `settings` - The averaging window settings.
    pub fn new(curve: &'a PiecewiseLinear, settings: RfSettings) -> Self {
        Self { curve, settings }
    }

    /// Sample both detectors over the averaging window and compute power and SWR.
    ///
    /// # Note
    /// Samples are taken sequentially, so this call takes roughly twice the sample count times
    /// the conversion time of the ADC.
    ///
    /// # Args
    /// * `detector` - The detector ADC to sample.
    pub fn measure<D: PowerDetector>(&self, detector: &mut D) -> Result<RfMeasurement, D::Error> {
        let samples = self.settings.sample_count();

        let mut forward_sum = 0.0f32;
        let mut reflected_sum = 0.0f32;
        for _ in 0..samples {
            forward_sum += detector.sample_detector(DetectorChannel::Forward)?;
            reflected_sum += detector.sample_detector(DetectorChannel::Reflected)?;
        }

        Ok(self.convert(
            forward_sum / samples as f32,
            reflected_sum / samples as f32,
            samples,
        ))
    }

    /// Convert mean detector voltages into a power measurement.
    ///
    /// # Args
    /// * `forward_voltage` - The mean forward detector voltage.
    /// * `reflected_voltage` - The mean reflected detector voltage.
    /// * `samples` - The number of samples that went into each mean.
    pub fn convert(&self, forward_voltage: f32, reflected_voltage: f32, samples: u32) -> RfMeasurement {
        let forward_power = self.curve.evaluate(forward_voltage).max(0.0);
        let reflected_power = self.curve.evaluate(reflected_voltage).max(0.0);

        RfMeasurement {
            forward_voltage,
            reflected_voltage,
            forward_power,
            reflected_power,
            delivered_power: (forward_power - reflected_power).max(0.0),
            swr: swr_from_powers(forward_power, reflected_power),
            samples,
        }
    }

    /// The averaging window settings of the meter.
    pub fn settings(&self) -> &RfSettings {
        &self.settings
    }
}
