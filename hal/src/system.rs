use core::sync::atomic::{AtomicBool, Ordering};

use cortex_m::peripheral::SCB;
use stm32l0::stm32l0x3::{PWR, RCC};

use crate::power::SleepLevel;

/// The system clock frequency (Hz)
pub const CLK_FREQ: usize = 1_048_576;

/// # System management
///
/// The clock and power configuration trades a little speed for low power
///
/// * The system clock (MSI) is set to range 4 (~1.048 MHz), which gives the /8
///   delay timer a tick of ~7.6 μs
/// * The voltage regulator is set to range 3 (1.2v)
/// * Deep sleep enters stop mode rather than standby so RAM and registers are
///   retained across a [`SleepLevel::Lpm2`] or [`SleepLevel::Lpm3`] suspend
///
/// The ADC and LPTIM clocks are kept running in sleep mode as both are used to
/// wake the core from it.
pub struct System(RCC);

impl System {
    pub fn configure(rcc: RCC, pwr: &mut PWR) -> Self {
        // Set the MSI clock to 1.048 MHz
        rcc.icscr.modify(|_, w| w.msirange().range4());

        // Enable PWR clock
        rcc.apb1enr.modify(|_, w| w.pwren().enabled());

        // Configure PWR control register
        //
        // * Enable voltage regulator range 3 (1.2V)
        // * Enter stop mode on deepsleep
        pwr.cr
            .modify(|_, w| w.vos().v1_2().pdds().stop_mode());

        // Enable GPIO port B clock for the analog control lines
        rcc.iopenr.modify(|_, w| w.iopben().enabled());

        Self(rcc)
    }

    /// Enable the ADC peripheral clock (PCLK)
    pub(crate) fn enable_adc_clk(&mut self) {
        self.0.apb2enr.modify(|_, w| w.adcen().enabled());

        // Keep the ADC clocked during sleep, bursts convert while the core is
        // suspended
        self.0.apb2smenr.modify(|_, w| w.adcsmen().set_bit());
    }

    /// Enable the LPTIM peripheral clock
    ///
    /// LPTIM1SEL is left at its reset value so the timer counts the APB clock.
    pub(crate) fn enable_lptim_clk(&mut self) {
        self.0.apb1enr.modify(|_, w| w.lptim1en().set_bit());

        // Keep LPTIM clocked during sleep
        self.0.apb1smenr.modify(|_, w| w.lptim1smen().set_bit());
    }
}

/// Suspend the core at `level` until `done` returns true.
///
/// `done` is checked with interrupts masked so a wake that lands between the
/// check and the WFI is not lost; a pending interrupt still ends the WFI and is
/// serviced as soon as the mask is lifted.
pub fn sleep_until(level: SleepLevel, done: &AtomicBool) {
    // SAFETY: only the SLEEPDEEP bit and the low power bits of PWR_CR are
    // touched, neither of which is owned by anything else
    let mut scb = unsafe { cortex_m::Peripherals::steal() }.SCB;
    let pwr = unsafe { &*PWR::ptr() };

    enter(level, &mut scb, pwr);

    loop {
        cortex_m::interrupt::disable();

        if done.load(Ordering::Acquire) {
            unsafe { cortex_m::interrupt::enable() };
            break;
        }

        cortex_m::asm::wfi();
        unsafe { cortex_m::interrupt::enable() };
    }

    scb.clear_sleepdeep();
}

fn enter(level: SleepLevel, scb: &mut SCB, pwr: &stm32l0::stm32l0x3::pwr::RegisterBlock) {
    pwr.cr.modify(|_, w| {
        w.lpsdsr()
            .bit(level.low_power_regulator())
            .ulp()
            .bit(level == SleepLevel::Lpm3)
    });

    if level.is_deep() {
        scb.set_sleepdeep();
    } else {
        scb.clear_sleepdeep();
    }
}
