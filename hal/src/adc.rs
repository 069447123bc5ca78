//! # Analogue to digital converter (ADC)
//!
//! The ADC samples the analog front end on two inputs, the thermocouple
//! amplifier on ADC_IN3 (PA3) and the thermistor divider on ADC_IN7 (PA7).
//! Both pins are left in their reset analog mode.
//!
//! ## Enable lines
//!
//! The front end's discrete controls are all on port B
//!
//! | Pin     | Line          | Active |
//! |---------|---------------|--------|
//! | PB0     | cold junction | low    |
//! | PB1     | reference     | low    |
//! | PB2     | zero path     | high   |
//! | PB12-15 | channel 1-4   | low    |
//!
//! ## Bursts
//!
//! A burst runs the ADC in continuous mode on a single input. Each end of
//! conversion raises `ADC_COMP`, whose handler ([`on_interrupt()`]) appends the
//! result to the sample buffer lent by
//! [`arm_conversion_interrupt()`](AnalogFrontEnd::arm_conversion_interrupt).
//! On the last sample the handler masks end of conversion and flags the burst
//! done, ending the foreground's sleep.
//!
//! ## Sample time
//!
//! With a system clock of 1.048 MHz and an ADC clock prescaler of /2, a
//! standard sample time of 39.5 clock cycles is approx 75μs. The thermistor's
//! extended 160.5 cycles is approx 306μs.

use core::cell::RefCell;
use core::sync::atomic::{AtomicBool, Ordering};

use critical_section::Mutex;
use stm32l0::stm32l0x3::{ADC, GPIOB};

use crate::burst::{InterruptCause, Progress, SampleBuffer};
use crate::frontend::{AnalogFrontEnd, Channel, Input, SampleTime};
use crate::power::SleepLevel;
use crate::system::{self, System};

const COLD_JUNCTION_PIN: u32 = 0;
const REFERENCE_PIN: u32 = 1;
const ZERO_PIN: u32 = 2;
const CHANNEL_PINS: [u32; 4] = [12, 13, 14, 15];

const SMP_STANDARD: u8 = 0b101;
const SMP_EXTENDED: u8 = 0b111;

/// Buffer of the burst in flight
static IN_FLIGHT: Mutex<RefCell<SampleBuffer>> = Mutex::new(RefCell::new(SampleBuffer::new()));

static BURST_DONE: AtomicBool = AtomicBool::new(false);

/// # ADC
///
/// Owns the ADC and the port carrying the front end's enable lines.
///
/// See [`crate::adc`] for more information.
pub struct Adc {
    adc: ADC,
    gpio: GPIOB,
}

impl Adc {
    /// Take ownership of the ADC and its control lines
    ///
    /// The hardware is left untouched until [`AnalogFrontEnd::configure()`].
    pub fn new(adc: ADC, gpio: GPIOB, sys: &mut System) -> Self {
        sys.enable_adc_clk();

        Self { adc, gpio }
    }

    /// Calibrate the ADC.
    ///
    /// This is the converter's own offset calibration, not the per unit
    /// [`CalibrationProfile`](crate::calibration::CalibrationProfile). It must
    /// run with the ADC disabled.
    fn self_calibrate(&mut self) {
        self.adc.cr.modify(|_, w| w.adcal().start_calibration());

        while self.adc.isr.read().eocal().is_not_complete() {}
        self.adc.isr.modify(|_, w| w.eocal().clear());

        // Ensure ADCAL = 0 before continuing
        while self.adc.cr.read().adcal().is_calibrating() {}
    }

    fn drive(&mut self, pin: u32, high: bool) {
        let mask = if high { 1 << pin } else { 1 << (pin + 16) };

        self.gpio.bsrr.write(|w| unsafe { w.bits(mask) });
    }

    /// Release the ADC and port
    pub fn free(self) -> (ADC, GPIOB) {
        (self.adc, self.gpio)
    }
}

impl AnalogFrontEnd for Adc {
    fn configure(&mut self) {
        // Safe states first so nothing floats once the pins become outputs
        self.set_reference(true);
        self.set_zero_path(true);
        self.set_cold_junction(false);
        for channel in Channel::ALL {
            self.set_channel(channel, false);
        }

        // Enable lines are push-pull outputs
        let pins = [COLD_JUNCTION_PIN, REFERENCE_PIN, ZERO_PIN]
            .into_iter()
            .chain(CHANNEL_PINS);
        let (clear, output) = pins.fold((0u32, 0u32), |(clear, output), pin| {
            (clear | 0b11 << (pin * 2), output | 0b01 << (pin * 2))
        });
        self.gpio
            .moder
            .modify(|r, w| unsafe { w.bits(r.bits() & !clear | output) });

        // Use PCLK/2 as the ADC clock
        self.adc.cfgr2.write(|w| w.ckmode().pclk_div2());

        // Enable low frequency mode as PCLK is <3.5 MHz
        self.adc.ccr.write(|w| w.lfmen().enabled());

        self.self_calibrate();

        // Configure ADC configuration register 1
        //
        // * Continuous conversion of the selected input
        // * Overwrite the data register on overrun, the handler always keeps up
        //   while the burst is armed and stops caring once it is complete
        self.adc
            .cfgr1
            .write(|w| w.cont().set_bit().ovrmod().set_bit());

        self.set_sample_time(SampleTime::Standard);

        #[cfg(feature = "defmt")]
        defmt::info!("adc configured");
    }

    fn set_reference(&mut self, enabled: bool) {
        self.drive(REFERENCE_PIN, !enabled);
    }

    fn set_zero_path(&mut self, enabled: bool) {
        self.drive(ZERO_PIN, enabled);
    }

    fn set_cold_junction(&mut self, enabled: bool) {
        self.drive(COLD_JUNCTION_PIN, !enabled);
    }

    fn set_channel(&mut self, channel: Channel, connected: bool) {
        self.drive(CHANNEL_PINS[channel.index()], !connected);
    }

    fn set_sample_time(&mut self, time: SampleTime) {
        let smp = match time {
            SampleTime::Standard => SMP_STANDARD,
            SampleTime::Extended => SMP_EXTENDED,
        };

        self.adc.smpr.write(|w| unsafe { w.smp().bits(smp) });
    }

    fn select_input(&mut self, input: Input) {
        match input {
            Input::Thermocouple => self.adc.chselr.modify(|_, w| w.chsel3().selected()),
            Input::Thermistor => self.adc.chselr.modify(|_, w| w.chsel7().selected()),
        }
    }

    fn deselect_input(&mut self, input: Input) {
        match input {
            Input::Thermocouple => self.adc.chselr.modify(|_, w| w.chsel3().not_selected()),
            Input::Thermistor => self.adc.chselr.modify(|_, w| w.chsel7().not_selected()),
        }
    }

    fn enable_converter(&mut self) {
        self.adc.cr.modify(|_, w| w.aden().enabled());

        // Wait for the ADC to power up
        while self.adc.isr.read().adrdy().is_not_ready() {}
        self.adc.isr.modify(|_, w| w.adrdy().clear());
    }

    fn disable_converter(&mut self) {
        self.adc.ier.modify(|_, w| w.eocie().clear_bit());

        // Stop the continuous conversions and wait for ADSTART = 0
        if self.adc.cr.read().adstart().is_active() {
            self.adc.cr.modify(|_, w| w.adstp().set_bit());
        }
        while self.adc.cr.read().adstart().is_active() {}

        // Disable ADC
        self.adc.cr.modify(|_, w| w.addis().disable());
        while self.adc.cr.read().aden().bit_is_set() {}
    }

    fn select_result_register(&mut self, index: u8) {
        // The ADC has a single data register
        debug_assert_eq!(index, 0);
    }

    fn arm_conversion_interrupt(&mut self, buffer: &mut SampleBuffer) {
        critical_section::with(|cs| core::mem::swap(&mut *IN_FLIGHT.borrow_ref_mut(cs), buffer));
        BURST_DONE.store(false, Ordering::Relaxed);

        // Clear stale end of conversion and overrun flags
        self.adc.isr.write(|w| w.eoc().set_bit().ovr().set_bit());
        self.adc.ier.modify(|_, w| w.eocie().set_bit());
    }

    fn start_burst(&mut self) {
        self.adc.cr.modify(|_, w| w.adstart().start_conversion());
    }

    fn wait_for_burst(&mut self, buffer: &mut SampleBuffer, level: SleepLevel) {
        system::sleep_until(level, &BURST_DONE);

        critical_section::with(|cs| core::mem::swap(&mut *IN_FLIGHT.borrow_ref_mut(cs), buffer));
    }
}

/// ADC_COMP interrupt handler
pub fn on_interrupt() {
    // SAFETY: the foreground doesn't touch ISR, IER or DR while a burst is
    // armed
    let adc = unsafe { &*ADC::ptr() };

    let isr = adc.isr.read();
    let cause = if isr.eoc().bit_is_set() {
        InterruptCause::MemoryFull(0)
    } else if isr.ovr().bit_is_set() {
        adc.isr.write(|w| w.ovr().set_bit());
        InterruptCause::Overflow
    } else {
        InterruptCause::None
    };

    critical_section::with(|cs| {
        let progress = IN_FLIGHT
            .borrow_ref_mut(cs)
            // Reading ADC_DR clears the end of conversion flag
            .on_interrupt(cause, || adc.dr.read().data().bits());

        if progress == Progress::Complete {
            adc.ier.modify(|_, w| w.eocie().clear_bit());
            BURST_DONE.store(true, Ordering::Release);
        }
    });
}
