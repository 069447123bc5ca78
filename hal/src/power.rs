//! # Low power levels
//!
//! The acquisition routines suspend the core at a numbered low power level while
//! waiting on a settle delay or a conversion burst. Levels 0 and 1 keep the
//! peripheral clocks running (sleep mode), levels 2 and 3 stop the high speed
//! clocks (stop mode) and are only useful when the wake source keeps running
//! from a low speed clock.

/// A low power level the core can be suspended at
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SleepLevel {
    /// Sleep with the main regulator
    #[default]
    Lpm0,
    /// Sleep with the regulator in low power mode
    Lpm1,
    /// Stop mode
    Lpm2,
    /// Stop mode with the internal reference switched off
    Lpm3,
}

impl SleepLevel {
    /// Does this level stop the high speed clocks
    pub const fn is_deep(self) -> bool {
        matches!(self, SleepLevel::Lpm2 | SleepLevel::Lpm3)
    }

    /// Does this level put the voltage regulator into low power mode
    pub const fn low_power_regulator(self) -> bool {
        !matches!(self, SleepLevel::Lpm0)
    }
}
