use core::fmt;

/// Errors raised at the boundary of the acquisition engine.
///
/// Acquisitions themselves never fail; these are raised when a request or a
/// calibration profile is constructed from untrusted values.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error {
    /// Thermocouple channel outside of 1-4
    InvalidChannel(u8),
    /// Calibration divider of zero
    ZeroDivider,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::InvalidChannel(id) => write!(f, "invalid thermocouple channel {id}, expected 1-4"),
            Error::ZeroDivider => f.write_str("calibration divider is zero"),
        }
    }
}
