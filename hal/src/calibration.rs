//! # Calibration
//!
//! Every unit is programmed with a gain factor and offset which correct for
//! the variance of the converter and analog front end. A raw code is adjusted
//! with
//!
//! ```text
//! adjusted = code * gain_factor / divider + offset
//! ```
//!
//! where the divider is fixed at 2^15, so a gain factor just under 0x8000 is close
//! to unity.
//!
//! ## Averaging
//!
//! A reading is the mean of the adjusted codes of one burst, truncated, and
//! then rounded up when the accumulated sum modulo [`ROUNDING_MODULUS`] is 5 or
//! more. The rounding works on the raw sum and not on the remainder of the
//! division, which is only the same thing while a burst is ten samples long.
//!
//! The sum is accumulated in 32 bits but only its low 16 bits are divided. A
//! negative adjusted code wraps the sum, so a burst that averages slightly
//! below zero reads as a large positive value rather than zero.
//!
//! ## Storage
//!
//! The constants live at fixed addresses in the data EEPROM and are read once,
//! see [`CalibrationProfile::factory()`].

use once_cell::sync::OnceCell;

use crate::burst::NUM_SAMPLES;
use crate::error::Error;

/// Divider applied after the gain factor (2^15)
pub const DIVIDER: i32 = 0x8000;

/// Modulus of the round up rule
pub const ROUNDING_MODULUS: u32 = 10;

// The round up rule is only a round-half-up of the mean while these agree.
const _: () = assert!(NUM_SAMPLES as u32 == ROUNDING_MODULUS);

const GAIN_FACTOR_ADDR: usize = 0x0808_0000;
const OFFSET_ADDR: usize = 0x0808_0002;

/// Per unit gain and offset constants
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CalibrationProfile {
    gain_factor: i16,
    offset: i16,
    divider: i32,
}

impl CalibrationProfile {
    /// Unity gain, no offset.
    ///
    /// 2^15 doesn't fit in the gain factor, so unity is -2^15 over a negated
    /// divider.
    pub const IDENTITY: Self = Self {
        gain_factor: i16::MIN,
        offset: 0,
        divider: -DIVIDER,
    };

    /// Build a profile with the standard divider
    pub const fn with_gain_offset(gain_factor: i16, offset: i16) -> Self {
        Self {
            gain_factor,
            offset,
            divider: DIVIDER,
        }
    }

    /// Build a profile with an explicit divider
    pub fn new(gain_factor: i16, offset: i16, divider: i32) -> Result<Self, Error> {
        if divider == 0 {
            return Err(Error::ZeroDivider);
        }

        Ok(Self {
            gain_factor,
            offset,
            divider,
        })
    }

    /// Read the profile programmed into the data EEPROM
    ///
    /// # Safety
    ///
    /// The calibration addresses must be readable, which only holds on the
    /// target.
    pub unsafe fn from_nvm() -> Self {
        let gain_factor = core::ptr::read_volatile(GAIN_FACTOR_ADDR as *const i16);
        let offset = core::ptr::read_volatile(OFFSET_ADDR as *const i16);

        Self::with_gain_offset(gain_factor, offset)
    }

    /// The profile of this unit.
    ///
    /// The data EEPROM is only read on the first call.
    pub fn factory() -> &'static Self {
        static PROFILE: OnceCell<CalibrationProfile> = OnceCell::new();

        PROFILE.get_or_init(|| {
            let profile = unsafe { Self::from_nvm() };

            #[cfg(feature = "defmt")]
            defmt::info!("loaded calibration {}", profile);

            profile
        })
    }

    /// Apply the gain and offset to a single raw code
    pub fn adjust(&self, code: u16) -> i32 {
        // |code * gain| < 2^31, so the product never overflows
        i32::from(code) * i32::from(self.gain_factor) / self.divider + i32::from(self.offset)
    }
}

/// Accumulate the adjusted codes of a burst.
///
/// Negative adjusted codes are added as their two's complement, wrapping the
/// unsigned accumulator.
pub fn accumulate(samples: &[u16; NUM_SAMPLES], profile: &CalibrationProfile) -> u32 {
    samples
        .iter()
        .fold(0u32, |sum, &code| sum.wrapping_add(profile.adjust(code) as u32))
}

/// Turn a burst of raw codes into one calibrated reading
pub fn calibrate(samples: &[u16; NUM_SAMPLES], profile: &CalibrationProfile) -> u16 {
    let sum = accumulate(samples, profile);

    // Truncate to 16 bits before dividing, the round up still sees all 32
    let mut reading = sum as u16 / NUM_SAMPLES as u16;

    if sum % ROUNDING_MODULUS >= 5 {
        reading = reading.wrapping_add(1);
    }

    reading
}

#[cfg(test)]
mod tests {
    use super::*;

    fn burst(code: u16) -> [u16; NUM_SAMPLES] {
        [code; NUM_SAMPLES]
    }

    #[test]
    fn unity_gain_is_identity() {
        let profile = CalibrationProfile::new(i16::MIN, 0, -DIVIDER).unwrap();

        assert_eq!(calibrate(&burst(100), &profile), 100);
        assert_eq!(calibrate(&burst(100), &CalibrationProfile::IDENTITY), 100);
        assert_eq!(calibrate(&burst(4095), &CalibrationProfile::IDENTITY), 4095);
    }

    #[test]
    fn half_gain_with_offset() {
        let profile = CalibrationProfile::with_gain_offset(16384, 10);

        assert_eq!(profile.adjust(200), 110);
        assert_eq!(accumulate(&burst(200), &profile), 1100);
        assert_eq!(calibrate(&burst(200), &profile), 110);
    }

    #[test]
    fn offset_only_burst_of_zero_codes() {
        let profile = CalibrationProfile::new(i16::MIN, 5, -DIVIDER).unwrap();

        assert_eq!(calibrate(&burst(0), &profile), 5);
    }

    #[test]
    fn remainder_of_five_rounds_up() {
        // sum = 105
        let samples = [10, 10, 10, 10, 10, 11, 11, 11, 11, 11];
        let profile = CalibrationProfile::IDENTITY;

        assert_eq!(accumulate(&samples, &profile), 105);
        assert_eq!(calibrate(&samples, &profile), 11);
    }

    #[test]
    fn remainder_of_four_rounds_down() {
        // sum = 104
        let samples = [10, 10, 10, 10, 10, 10, 11, 11, 11, 11];
        let profile = CalibrationProfile::IDENTITY;

        assert_eq!(accumulate(&samples, &profile), 104);
        assert_eq!(calibrate(&samples, &profile), 10);
    }

    #[test]
    fn rounding_uses_the_accumulated_sum() {
        let profile = CalibrationProfile::IDENTITY;

        for extra in 0..10u16 {
            let mut samples = burst(50);
            for slot in samples.iter_mut().take(extra as usize) {
                *slot += 1;
            }

            let expected = if extra >= 5 { 51 } else { 50 };
            assert_eq!(calibrate(&samples, &profile), expected, "sum = {}", 500 + extra);
        }
    }

    #[test]
    fn gain_division_truncates_each_code() {
        // 3 * 16384 / 32768 = 1.5 -> 1
        let profile = CalibrationProfile::with_gain_offset(16384, 0);

        assert_eq!(profile.adjust(3), 1);
        assert_eq!(calibrate(&burst(3), &profile), 1);
    }

    #[test]
    fn extreme_codes_do_not_overflow() {
        let max_gain = CalibrationProfile::with_gain_offset(i16::MAX, i16::MAX);
        assert_eq!(max_gain.adjust(u16::MAX), 65533 + 32767);

        let min_gain = CalibrationProfile::with_gain_offset(i16::MIN, 0);
        assert_eq!(min_gain.adjust(u16::MAX), -65535);
    }

    #[test]
    fn negative_adjusted_codes_wrap_the_sum() {
        // Every code adjusts to -3
        let profile = CalibrationProfile::with_gain_offset(32000, -3);

        assert_eq!(profile.adjust(0), -3);
        assert_eq!(accumulate(&burst(0), &profile), 4_294_967_266);
        // 65506 / 10 = 6550, and the sum ends in 6 so it rounds up
        assert_eq!(calibrate(&burst(0), &profile), 6551);
    }

    #[test]
    fn only_the_low_half_of_the_sum_is_divided() {
        // sum = 70000, which is 4464 in 16 bits
        let samples = burst(7000);
        let profile = CalibrationProfile::IDENTITY;

        assert_eq!(accumulate(&samples, &profile), 70_000);
        assert_eq!(calibrate(&samples, &profile), 446);
    }

    #[test]
    fn calibration_is_deterministic() {
        let samples = [812, 815, 809, 811, 820, 799, 805, 813, 810, 808];
        let profile = CalibrationProfile::with_gain_offset(32000, -12);

        let first = calibrate(&samples, &profile);
        for _ in 0..5 {
            assert_eq!(calibrate(&samples, &profile), first);
        }
    }

    #[test]
    fn zero_divider_is_rejected() {
        assert_eq!(CalibrationProfile::new(100, 0, 0), Err(Error::ZeroDivider));
    }
}
