//! Solid-state HF amplifier controller core
//!
//! This crate contains the hardware-independent decision logic of the amplifier controller:
//!
//! * Calibrated RF power and standing-wave ratio measurement from the directional coupler
//!   detectors.
//! * Heatsink temperature measurement through an NTC thermistor divider.
//! * The latched protection and enable controller driven by a single front-panel button.
//!
//! Hardware is accessed through the traits in [sensors] and through `embedded-hal` input pins, so
//! the same logic runs in firmware and in host-side tests.
#![cfg_attr(not(any(test, feature = "std")), no_std)]

pub mod calibration;
pub mod debounce;
pub mod error;
pub mod linear_transformation;
pub mod monotonic;
pub mod piecewise_linear;
pub mod protection;
pub mod rf_power;
pub mod sensors;
pub mod settings;
pub mod telemetry;
pub mod thermistor;

pub use error::Error;
pub use piecewise_linear::PiecewiseLinear;
pub use protection::{AmpControl, ControlSettings, ControlState, Decision, FaultKind};
pub use rf_power::{RfMeasurement, RfPowerMeter};
pub use settings::Settings;
pub use telemetry::Telemetry;
pub use thermistor::Thermistor;
