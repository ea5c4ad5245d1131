//! Calibration table loaders
//!
//! Two text layouts are supported:
//!
//! * Power curve: one `power, voltage` point per line, as measured with a calibrated wattmeter
//!   against the detector output voltage. Lines that do not start with two numeric fields (such
//!   as a `FWD,V` header) are skipped.
//! * Thermistor table: two rows of equal length, `Temperature, f1, f2, ...` in Fahrenheit and
//!   `Resistance, r1, r2, ...` in Ohms. The leading label cell of each row is discarded.
//!
//! In both layouts blank lines and lines starting with `#` are ignored, and cells that do not
//! parse as a finite number are dropped. A table that does not yield at least two usable points
//! is rejected: there is no safe default curve to fall back on.
use heapless::Vec;

use crate::{
    piecewise_linear::{PiecewiseLinear, MAX_POINTS},
    Error,
};

const COMMENT_MARKER: char = '#';

/// Measured thermistor resistance at a set of temperatures.
#[derive(Debug, Clone, PartialEq)]
pub struct ThermistorTable {
    temperatures_f: Vec<f32, MAX_POINTS>,
    resistances: Vec<f32, MAX_POINTS>,
}

impl ThermistorTable {
    /// The calibration temperatures in degrees Fahrenheit.
    pub fn temperatures_f(&self) -> &[f32] {
        &self.temperatures_f
    }

    /// The thermistor resistance in Ohms at each calibration temperature.
    pub fn resistances(&self) -> &[f32] {
        &self.resistances
    }
}

fn usable_lines(text: &str) -> impl Iterator<Item = &str> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with(COMMENT_MARKER))
}

fn parse_cell(cell: &str) -> Option<f32> {
    cell.trim()
        .parse::<f32>()
        .ok()
        .filter(|value| value.is_finite())
}

/// Parse a detector-voltage to RF-power curve.
///
/// # Args
/// * `text` - The contents of the power calibration file.
///
/// # Returns
/// A curve mapping detector voltage onto power in Watts.
pub fn parse_power_curve(text: &str) -> Result<PiecewiseLinear, Error> {
    let mut power: Vec<f32, MAX_POINTS> = Vec::new();
    let mut voltage: Vec<f32, MAX_POINTS> = Vec::new();

    for line in usable_lines(text) {
        let mut fields = line.split(',');
        let (Some(p), Some(v)) = (
            fields.next().and_then(parse_cell),
            fields.next().and_then(parse_cell),
        ) else {
            log::debug!("Skipping power calibration line `{}`", line);
            continue;
        };

        if power.push(p).is_err() || voltage.push(v).is_err() {
            log::error!("Power calibration exceeds {} points", MAX_POINTS);
            return Err(Error::InvalidCalibration);
        }
    }

    if power.len() < 2 {
        log::error!("Power calibration has {} usable points", power.len());
        return Err(Error::InvalidCalibration);
    }

    // The table is measured as power vs. voltage, but it is consumed as voltage -> power.
    PiecewiseLinear::new(&voltage, &power).map_err(|_| Error::InvalidCalibration)
}

fn parse_row(line: &str) -> Result<Vec<f32, MAX_POINTS>, Error> {
    let mut values: Vec<f32, MAX_POINTS> = Vec::new();
    for value in line.split(',').skip(1).filter_map(parse_cell) {
        values.push(value).map_err(|_| {
            log::error!("Thermistor calibration exceeds {} points", MAX_POINTS);
            Error::InvalidCalibration
        })?;
    }

    Ok(values)
}

/// Parse a two-row thermistor temperature/resistance table.
///
/// # Args
/// * `text` - The contents of the thermistor calibration file.
///
/// # Returns
/// The parsed table.
pub fn parse_thermistor_table(text: &str) -> Result<ThermistorTable, Error> {
    let mut rows = usable_lines(text);
    let (Some(temperature_row), Some(resistance_row)) = (rows.next(), rows.next()) else {
        log::error!("Thermistor calibration requires a temperature and a resistance row");
        return Err(Error::InvalidCalibration);
    };

    if rows.next().is_some() {
        log::warn!("Ignoring thermistor calibration rows after the resistance row");
    }

    let temperatures_f = parse_row(temperature_row)?;
    let resistances = parse_row(resistance_row)?;

    if temperatures_f.len() < 2 || resistances.len() < 2 {
        log::error!("Thermistor calibration has too few numeric points");
        return Err(Error::InvalidCalibration);
    }

    if temperatures_f.len() != resistances.len() {
        log::error!(
            "Thermistor calibration rows differ in length ({} temperatures, {} resistances)",
            temperatures_f.len(),
            resistances.len()
        );
        return Err(Error::InvalidCalibration);
    }

    Ok(ThermistorTable {
        temperatures_f,
        resistances,
    })
}

#[cfg(feature = "std")]
fn read_file(path: &std::path::Path) -> Result<std::string::String, Error> {
    std::fs::read_to_string(path).map_err(|e| {
        log::error!("Failed to read `{}`: {}", path.display(), e);
        Error::Io
    })
}

/// Load a power curve from a calibration file.
#[cfg(feature = "std")]
pub fn load_power_curve(path: impl AsRef<std::path::Path>) -> Result<PiecewiseLinear, Error> {
    parse_power_curve(&read_file(path.as_ref())?)
}

/// Load a thermistor table from a calibration file.
#[cfg(feature = "std")]
pub fn load_thermistor_table(path: impl AsRef<std::path::Path>) -> Result<ThermistorTable, Error> {
    parse_thermistor_table(&read_file(path.as_ref())?)
}
