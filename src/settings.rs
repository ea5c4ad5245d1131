//! Amplifier controller configuration
//!
//! Every component is configured through its own immutable settings record. The records are
//! grouped here so that a complete configuration can be decoded from a single JSON document and
//! validated before any component is constructed.
use serde::{Deserialize, Serialize};

use crate::{
    protection::{ButtonSettings, ControlSettings, ProtectionSettings},
    rf_power::RfSettings,
    sensors::FrontEndSettings,
    thermistor::DividerSettings,
    Error,
};

/// Complete controller configuration. Missing fields take their defaults.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct Settings {
    pub protection: ProtectionSettings,
    pub button: ButtonSettings,
    pub rf: RfSettings,
    pub thermistor: DividerSettings,
    pub front_end: FrontEndSettings,
}

impl Settings {
    /// Check that all settings are usable.
    ///
    /// # Returns
    /// A description of the first offending setting on failure.
    pub fn validate(&self) -> Result<(), &'static str> {
        self.protection.validate()?;
        self.button.validate()?;
        self.rf.validate()?;
        self.thermistor.validate()?;
        self.front_end.validate()?;
        Ok(())
    }

    /// Decode and validate settings from a JSON document.
    pub fn from_json(data: &[u8]) -> Result<Self, Error> {
        let (settings, _): (Self, usize) = serde_json_core::from_slice(data).map_err(|err| {
            log::error!("Settings could not be decoded: {:?}", err);
            Error::InvalidSettings
        })?;

        settings.validate().map_err(|reason| {
            log::error!("Settings rejected: {}", reason);
            Error::InvalidSettings
        })?;

        Ok(settings)
    }

    /// The settings of the protection controller.
    pub fn control(&self) -> ControlSettings {
        ControlSettings {
            protection: self.protection,
            button: self.button,
        }
    }
}
