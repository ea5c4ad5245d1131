//! Amplifier protection and enable control
//!
//! The controller is stepped once per scheduling tick with the latest telemetry, the current time
//! and the raw level of the front-panel button. It owns three debounce timers:
//!
//! * A fast timer qualifying electrical faults (drain overvoltage, drain overcurrent and low
//!   forward power relative to the DC input power).
//! * A slow timer qualifying heatsink overtemperature.
//! * The button debouncer, producing one event per press.
//!
//! A qualified fault latches the controller into the tripped state, which forces the amplifier
//! off. Only a button press clears the latch, and clearing always leaves the amplifier disabled so
//! that a second, deliberate press is required to enable it again.
use core::str::FromStr;

use embedded_hal::digital::PinState;
use enum_iterator::Sequence;
use serde::{Deserialize, Serialize};

use crate::{
    debounce::{Debouncer, Edge},
    monotonic::{Duration, Instant, MAX_ELAPSED},
    telemetry::Telemetry,
};

/// The reason the amplifier is held off.
#[derive(Debug, Default, Copy, Clone, PartialEq, Eq, Sequence)]
pub enum FaultKind {
    #[default]
    Ok,
    DrainOvervoltage,
    DrainOvercurrent,
    ForwardPowerLowVsVi,
    ThermalOvertemp,
}

impl FaultKind {
    /// The wire name of the fault.
    pub fn as_str(&self) -> &'static str {
        match self {
            FaultKind::Ok => "OK",
            FaultKind::DrainOvervoltage => "DRAIN_OVERVOLTAGE",
            FaultKind::DrainOvercurrent => "DRAIN_OVERCURRENT",
            FaultKind::ForwardPowerLowVsVi => "FORWARD_POWER_LOW_VS_VI",
            FaultKind::ThermalOvertemp => "THERMAL_OVERTEMP",
        }
    }
}

impl core::fmt::Display for FaultKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FaultKind {
    type Err = ();

    fn from_str(name: &str) -> Result<Self, ()> {
        enum_iterator::all::<FaultKind>()
            .find(|kind| kind.as_str() == name)
            .ok_or(())
    }
}

impl Serialize for FaultKind {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

/// Protection thresholds and qualification times.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct ProtectionSettings {
    /// Maximum drain voltage in volts.
    pub drain_voltage_max: f32,

    /// Maximum drain current in amps.
    pub drain_current_max: f32,

    /// Minimum forward power as a fraction of the DC input power.
    pub forward_power_min_fraction: f32,

    /// The forward power check only applies at or above this drain current (amps).
    pub efficiency_check_min_current: f32,

    /// The forward power check only applies at or above this DC input power (Watts).
    pub efficiency_check_min_power: f32,

    /// How long an electrical fault must persist before it trips, in milliseconds.
    pub trip_debounce_ms: u32,

    /// Heatsink overtemperature threshold in degrees Celsius.
    pub temperature_max: f32,

    /// How long an overtemperature must persist before it trips, in milliseconds.
    pub thermal_debounce_ms: u32,
}

impl Default for ProtectionSettings {
    fn default() -> Self {
        Self {
            drain_voltage_max: 35.0,
            drain_current_max: 9.0,
            forward_power_min_fraction: 0.25,
            efficiency_check_min_current: 2.0,
            efficiency_check_min_power: 10.0,
            trip_debounce_ms: 50,
            temperature_max: 40.0,
            thermal_debounce_ms: 5000,
        }
    }
}

impl ProtectionSettings {
    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        let thresholds = [
            self.drain_voltage_max,
            self.drain_current_max,
            self.efficiency_check_min_current,
            self.efficiency_check_min_power,
            self.temperature_max,
        ];
        if thresholds.iter().any(|threshold| !threshold.is_finite()) {
            return Err("Protection thresholds must be finite");
        }

        if !(0.0..=1.0).contains(&self.forward_power_min_fraction) {
            return Err("Forward power fraction out of range");
        }

        if self.trip_debounce() > MAX_ELAPSED || self.thermal_debounce() > MAX_ELAPSED {
            return Err("Debounce time too long");
        }

        Ok(())
    }

    pub fn trip_debounce(&self) -> Duration {
        Duration::from_millis(self.trip_debounce_ms)
    }

    pub fn thermal_debounce(&self) -> Duration {
        Duration::from_millis(self.thermal_debounce_ms)
    }
}

/// Front-panel button configuration.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct ButtonSettings {
    /// The button pulls the input low when pressed.
    pub active_low: bool,

    /// How long the button level must be stable, in milliseconds.
    pub debounce_ms: u32,
}

impl Default for ButtonSettings {
    fn default() -> Self {
        Self {
            active_low: true,
            debounce_ms: 10,
        }
    }
}

impl ButtonSettings {
    /// Check if a raw input level corresponds to the pressed button.
    pub fn is_pressed(&self, level: PinState) -> bool {
        let pressed = if self.active_low {
            PinState::Low
        } else {
            PinState::High
        };

        level == pressed
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub(crate) fn validate(&self) -> Result<(), &'static str> {
        if self.debounce() > MAX_ELAPSED {
            return Err("Button debounce time too long");
        }

        Ok(())
    }
}

/// Settings of the protection controller.
#[derive(Serialize, Deserialize, Debug, Default, Copy, Clone, PartialEq)]
#[serde(default)]
pub struct ControlSettings {
    pub protection: ProtectionSettings,
    pub button: ButtonSettings,
}

/// Determine the electrical fault present in a telemetry snapshot.
///
/// # Note
/// Faults are checked in priority order. Only the first matching fault is reported. Heatsink
/// temperature is not considered here since it is qualified on its own timer.
///
/// # Returns
/// The highest priority fault, or `None` if the readings are within limits.
pub fn fault_reason(settings: &ProtectionSettings, telemetry: &Telemetry) -> Option<FaultKind> {
    if telemetry.drain_voltage > settings.drain_voltage_max {
        return Some(FaultKind::DrainOvervoltage);
    }

    if telemetry.drain_current > settings.drain_current_max {
        return Some(FaultKind::DrainOvercurrent);
    }

    let input_power = telemetry.dc_input_power();
    if telemetry.drain_current >= settings.efficiency_check_min_current
        && input_power >= settings.efficiency_check_min_power
        && telemetry.forward_power < settings.forward_power_min_fraction * input_power
    {
        return Some(FaultKind::ForwardPowerLowVsVi);
    }

    None
}

/// Check if a telemetry snapshot reports a heatsink overtemperature.
pub fn is_overtemperature(settings: &ProtectionSettings, telemetry: &Telemetry) -> bool {
    telemetry
        .temperature
        .map_or(false, |celsius| celsius >= settings.temperature_max)
}

/// The mutable state of the protection controller, threaded through [AmpControl::step].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct ControlState {
    amp_enabled: bool,
    tripped: bool,
    last_reason: FaultKind,
    fault_timer: Debouncer,
    thermal_timer: Debouncer,
    button: Debouncer,
}

impl ControlState {
    fn new(settings: &ControlSettings) -> Self {
        Self {
            amp_enabled: false,
            tripped: false,
            last_reason: FaultKind::Ok,
            fault_timer: Debouncer::new(settings.protection.trip_debounce()),
            thermal_timer: Debouncer::new(settings.protection.thermal_debounce()),
            button: Debouncer::new(settings.button.debounce()),
        }
    }

    /// Check if the operator has requested the amplifier to be enabled.
    pub fn amp_enabled(&self) -> bool {
        self.amp_enabled
    }

    /// Check if a fault is latched.
    pub fn tripped(&self) -> bool {
        self.tripped
    }

    /// The fault that caused the latch, or [FaultKind::Ok] if the latch was cleared.
    pub fn last_reason(&self) -> FaultKind {
        self.last_reason
    }

    /// The time an electrical fault was first observed, if one is pending qualification.
    pub fn fault_debounce_started_at(&self) -> Option<Instant> {
        self.fault_timer.active_since()
    }

    /// The time an overtemperature was first observed, if one is pending qualification.
    pub fn thermal_debounce_started_at(&self) -> Option<Instant> {
        self.thermal_timer.active_since()
    }

    /// Check if the amplifier must be held off.
    pub fn disable(&self) -> bool {
        !self.amp_enabled || self.tripped
    }

    /// Summarize the state for the output stage.
    pub fn decision(&self) -> Decision {
        Decision {
            disable: self.disable(),
            amp_enabled: self.amp_enabled,
            tripped: self.tripped,
            reason: if self.tripped {
                self.last_reason
            } else {
                FaultKind::Ok
            },
        }
    }

    fn latch(&mut self, reason: FaultKind) {
        log::warn!("Amplifier tripped: {}", reason);
        self.tripped = true;
        self.last_reason = reason;
        self.amp_enabled = false;
        self.fault_timer.reset();
        self.thermal_timer.reset();
    }

    fn clear(&mut self) {
        log::info!("Clearing {} latch", self.last_reason);
        self.tripped = false;
        self.last_reason = FaultKind::Ok;
        self.fault_timer.reset();
        self.thermal_timer.reset();
        self.amp_enabled = false;
    }
}

/// The output of a single controller step.
#[derive(Serialize, Debug, Copy, Clone, PartialEq, Eq)]
pub struct Decision {
    /// The amplifier must be forced off.
    pub disable: bool,

    /// The operator has requested the amplifier to be enabled.
    pub amp_enabled: bool,

    /// A fault is latched.
    pub tripped: bool,

    /// The latched fault, or [FaultKind::Ok] if not tripped.
    pub reason: FaultKind,
}

/// The amplifier protection controller.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct AmpControl {
    settings: ControlSettings,
}

impl AmpControl {
    pub fn new(settings: ControlSettings) -> Self {
        Self { settings }
    }

    /// The controller state at power-up: amplifier disabled and nothing latched.
    pub fn boot_state(&self) -> ControlState {
        ControlState::new(&self.settings)
    }

    /// The settings the controller was constructed with.
    pub fn settings(&self) -> &ControlSettings {
        &self.settings
    }

    /// Advance the controller by one tick.
    ///
    /// # Args
    /// * `state` - The state returned by the previous step, or the boot state.
    /// * `telemetry` - The latest amplifier telemetry.
    /// * `now` - The current time.
    /// * `button_level` - The raw level of the front-panel button input.
    ///
    /// # Returns
    /// The updated state and the resulting output decision.
    pub fn step(
        &self,
        mut state: ControlState,
        telemetry: &Telemetry,
        now: Instant,
        button_level: PinState,
    ) -> (ControlState, Decision) {
        let telemetry = telemetry.sanitized();
        let protection = &self.settings.protection;

        if !state.tripped {
            match fault_reason(protection, &telemetry) {
                Some(fault) => {
                    if state.fault_timer.update(now, true) == Some(Edge::Rising) {
                        state.latch(fault);
                    }
                }
                None => state.fault_timer.reset(),
            }
        }

        if !state.tripped && is_overtemperature(protection, &telemetry) {
            if state.thermal_timer.update(now, true) == Some(Edge::Rising) {
                state.latch(FaultKind::ThermalOvertemp);
            }
        } else {
            state.thermal_timer.reset();
        }

        let pressed = self.settings.button.is_pressed(button_level);
        if state.button.update(now, pressed) == Some(Edge::Rising) {
            if state.tripped {
                state.clear();
            } else {
                state.amp_enabled = !state.amp_enabled;
                log::info!(
                    "Amplifier {}",
                    if state.amp_enabled {
                        "enabled"
                    } else {
                        "disabled"
                    }
                );
            }
        }

        (state, state.decision())
    }
}
