//! Error type definitions for the amplifier controller core

/// An enumeration of possible errors while bringing up the controller.
///
/// # Note
/// Every variant is a startup-time failure. The per-tick protection update never fails.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
pub enum Error {
    /// Control points were mismatched, too few, too many, or not finite.
    InvalidTable,

    /// A calibration source did not yield a usable table.
    InvalidCalibration,

    /// Settings could not be decoded or were out of range.
    InvalidSettings,

    /// A calibration file could not be read.
    #[cfg(feature = "std")]
    Io,
}

impl core::fmt::Display for Error {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let description = match self {
            Error::InvalidTable => "invalid control-point table",
            Error::InvalidCalibration => "invalid calibration data",
            Error::InvalidSettings => "invalid settings",
            #[cfg(feature = "std")]
            Error::Io => "calibration file could not be read",
        };

        f.write_str(description)
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}
