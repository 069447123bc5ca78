use crate::power::SleepLevel;

/// Settle delay after switching to a thermocouple channel (timer ticks)
pub const SETTLE_TICKS: u16 = 62500;

/// Settle delay after powering the thermistor (timer ticks).
///
/// The thermistor rises in about 3 ms at 24 °C.
pub const THERMISTOR_SETTLE_TICKS: u16 = 10000;

/// Timing of the acquisition sequences
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AcquisitionConfig {
    /// Delay between connecting a channel and sampling it
    pub settle_ticks: u16,
    /// Number of settle delays run back to back before a zero reading
    pub zero_settle_passes: u8,
    /// Delay between powering the thermistor and sampling it
    pub thermistor_settle_ticks: u16,
    /// Level to sleep at during settle delays
    pub settle_level: SleepLevel,
    /// Level to sleep at while a burst is converting
    pub burst_level: SleepLevel,
}

impl AcquisitionConfig {
    pub const DEFAULT: Self = Self {
        settle_ticks: SETTLE_TICKS,
        zero_settle_passes: 2,
        thermistor_settle_ticks: THERMISTOR_SETTLE_TICKS,
        settle_level: SleepLevel::Lpm1,
        burst_level: SleepLevel::Lpm1,
    };
}

impl Default for AcquisitionConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
