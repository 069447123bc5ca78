//! # Low power delay
//!
//! Settle delays are served by the low power timer (LPTIM) rather than by
//! spinning. The timer is clocked from the APB clock through a fixed /8
//! prescaler and counts up to a compare value; the compare interrupt wakes the
//! core, which sleeps for the whole delay.
//!
//! The timer is not reentrant, only one delay may be outstanding at a time.
//! This holds naturally as the delay blocks the only context that arms it.
//!
//! The [`on_compare()`] handler must be bound to the `LPTIM1` interrupt.

use core::sync::atomic::{AtomicBool, Ordering};

use stm32l0::stm32l0x3::LPTIM;

use crate::power::SleepLevel;
use crate::system::{self, System};

/// Input divider of the delay timer
pub const PRESCALER: u32 = 8;

// PRESC encoding of /8
const PRESC_DIV8: u8 = 0b011;

static EXPIRED: AtomicBool = AtomicBool::new(false);

/// A one shot sleep
pub trait LowPowerDelay {
    /// Suspend at `level` for `ticks` timer ticks.
    ///
    /// Returns after exactly one wake, with the timer stopped and its interrupt
    /// disabled.
    fn delay(&mut self, ticks: u16, level: SleepLevel);
}

/// LPTIM backed [`LowPowerDelay`]
///
/// A delay of `u16::MAX` ticks is cut one tick short.
pub struct LpDelay(LPTIM);

impl LpDelay {
    /// Configure the LPTIM
    pub fn configure(timer: LPTIM, sys: &mut System) -> Self {
        sys.enable_lptim_clk();

        // CFGR can only be written while the timer is disabled
        timer.cr.modify(|_, w| w.enable().clear_bit());

        // Internal clock, /8 prescaler, software trigger
        timer
            .cfgr
            .write(|w| unsafe { w.presc().bits(PRESC_DIV8) }.cksel().clear_bit());

        Self(timer)
    }

    /// Release the timer
    pub fn free(self) -> LPTIM {
        self.0
    }
}

impl LowPowerDelay for LpDelay {
    fn delay(&mut self, ticks: u16, level: SleepLevel) {
        let ticks = compare_value(ticks);

        #[cfg(feature = "defmt")]
        defmt::trace!("delay {} ticks ({} us) at {}", ticks, ticks_to_micros(ticks), level);

        EXPIRED.store(false, Ordering::Relaxed);

        // IER can only be written while the timer is disabled
        self.0.ier.modify(|_, w| w.cmpmie().set_bit());
        self.0.cr.modify(|_, w| w.enable().set_bit());

        // Clear any stale compare match
        self.0.icr.write(|w| w.cmpmcf().set_bit());

        // Count up through the full range, the compare match ends the delay
        self.0.arr.write(|w| unsafe { w.arr().bits(u16::MAX) });
        while self.0.isr.read().arrok().bit_is_clear() {}
        self.0.icr.write(|w| w.arrokcf().set_bit());

        self.0.cmp.write(|w| unsafe { w.cmp().bits(ticks) });
        while self.0.isr.read().cmpok().bit_is_clear() {}
        self.0.icr.write(|w| w.cmpokcf().set_bit());

        // Start counting
        self.0.cr.modify(|_, w| w.cntstrt().set_bit());

        system::sleep_until(level, &EXPIRED);

        // Stop the timer, which also clears the counter, then drop the
        // interrupt
        self.0.cr.modify(|_, w| w.enable().clear_bit());
        self.0.ier.modify(|_, w| w.cmpmie().clear_bit());
    }
}

/// LPTIM1 interrupt handler
///
/// Wakes the core from any sleep level on a compare match.
pub fn on_compare() {
    // SAFETY: only the read only ISR and write only ICR registers are touched
    let timer = unsafe { &*LPTIM::ptr() };

    if timer.isr.read().cmpm().bit_is_set() {
        timer.icr.write(|w| w.cmpmcf().set_bit());
        EXPIRED.store(true, Ordering::Release);
    }
}

/// Compare value for a delay of `ticks`.
///
/// A compare match only happens while CMP < ARR, and ARR is pinned at
/// `u16::MAX`, so the longest delay is one tick short of the full range.
const fn compare_value(ticks: u16) -> u16 {
    if ticks < u16::MAX {
        ticks
    } else {
        u16::MAX - 1
    }
}

/// Length of a delay in microseconds at the system clock
pub const fn ticks_to_micros(ticks: u16) -> u32 {
    (ticks as u64 * PRESCALER as u64 * 1_000_000 / system::CLK_FREQ as u64) as u32
}
