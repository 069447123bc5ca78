//! # Acquisition
//!
//! [`Thermo`] sequences the front end, the delay timer and the converter to
//! take one reading at a time. Every acquisition has the same shape
//!
//! 1. switch the analog paths to the source and let them settle
//! 2. run a burst, sleeping until the conversion interrupt fills the buffer
//! 3. restore the safe idle state of the paths
//! 4. average the burst through the calibration profile
//!
//! The idle state has the zero path enabled, so the amplifier output never
//! rails, and every thermocouple channel disconnected. A channel is only
//! connected while the zero path is off.

use crate::burst::SampleBuffer;
use crate::calibration::{self, CalibrationProfile};
use crate::config::AcquisitionConfig;
use crate::delay::LowPowerDelay;
use crate::error::Error;
use crate::frontend::{AnalogFrontEnd, Channel, Input, SampleTime};

/// Readings of one full sweep
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Scan {
    pub zero: u16,
    pub thermistor: u16,
    /// Indexed by [`Channel::index()`]
    pub channels: [u16; 4],
}

/// The acquisition engine
pub struct Thermo<F, D> {
    frontend: F,
    delay: D,
    profile: CalibrationProfile,
    config: AcquisitionConfig,
    buffer: SampleBuffer,
    channel_reading: u16,
    zero_reading: u16,
    thermistor_reading: u16,
}

impl<F, D> Thermo<F, D>
where
    F: AnalogFrontEnd,
    D: LowPowerDelay,
{
    /// Configure the front end and take ownership of it.
    ///
    /// The front end is configured exactly once, here.
    pub fn new(
        mut frontend: F,
        delay: D,
        profile: CalibrationProfile,
        config: AcquisitionConfig,
    ) -> Self {
        frontend.configure();

        #[cfg(feature = "defmt")]
        defmt::info!("acquisition ready, {}", config);

        Self {
            frontend,
            delay,
            profile,
            config,
            buffer: SampleBuffer::new(),
            channel_reading: 0,
            zero_reading: 0,
            thermistor_reading: 0,
        }
    }

    /// Read a thermocouple channel
    pub fn read_channel(&mut self, channel: Channel) -> u16 {
        #[cfg(feature = "defmt")]
        defmt::trace!("reading channel {}", channel.number());

        // Connect the channel with the zero path out of the way
        self.frontend.set_zero_path(false);
        self.frontend.set_channel(channel, true);

        // Make sure the reading is independent from the last
        self.delay
            .delay(self.config.settle_ticks, self.config.settle_level);

        self.frontend.select_input(Input::Thermocouple);
        self.frontend.enable_converter();
        self.frontend.select_result_register(0);

        self.burst();

        self.frontend.disable_converter();
        self.frontend.deselect_input(Input::Thermocouple);

        self.frontend.set_zero_path(true);
        self.frontend.set_channel(channel, false);

        self.channel_reading = self.average();
        self.channel_reading
    }

    /// Read a thermocouple channel by number, 1-4
    pub fn read_channel_id(&mut self, id: u8) -> Result<u16, Error> {
        let channel = Channel::try_from(id)?;

        Ok(self.read_channel(channel))
    }

    /// Read the front end offset with no thermocouple in series
    pub fn read_zero_reference(&mut self) -> u16 {
        #[cfg(feature = "defmt")]
        defmt::trace!("reading zero reference");

        self.frontend.select_input(Input::Thermocouple);
        self.frontend.enable_converter();
        self.frontend.select_result_register(0);

        // A longer settle so no trace of the last channel is left
        for _ in 0..self.config.zero_settle_passes {
            self.delay
                .delay(self.config.settle_ticks, self.config.settle_level);
        }

        self.burst();

        self.frontend.disable_converter();
        self.frontend.deselect_input(Input::Thermocouple);

        self.zero_reading = self.average();
        self.zero_reading
    }

    /// Read the cold junction thermistor
    pub fn read_thermistor(&mut self) -> u16 {
        #[cfg(feature = "defmt")]
        defmt::trace!("reading thermistor");

        self.frontend.set_cold_junction(true);
        self.frontend.select_input(Input::Thermistor);
        self.frontend.set_sample_time(SampleTime::Extended);
        self.frontend.enable_converter();
        self.frontend.select_result_register(0);

        self.delay
            .delay(self.config.thermistor_settle_ticks, self.config.settle_level);

        self.burst();

        // Unpower the thermistor first to limit self heating
        self.frontend.set_cold_junction(false);

        self.frontend.disable_converter();
        self.frontend.deselect_input(Input::Thermistor);
        self.frontend.set_sample_time(SampleTime::Standard);

        self.thermistor_reading = self.average();
        self.thermistor_reading
    }

    /// Read the zero reference, the thermistor and then every channel in turn
    pub fn scan(&mut self) -> Scan {
        let zero = self.read_zero_reference();
        let thermistor = self.read_thermistor();

        let mut channels = [0; 4];
        for channel in Channel::ALL {
            channels[channel.index()] = self.read_channel(channel);
        }

        Scan {
            zero,
            thermistor,
            channels,
        }
    }

    /// Last thermocouple channel reading
    pub fn channel_reading(&self) -> u16 {
        self.channel_reading
    }

    /// Last zero reference reading
    pub fn zero_reading(&self) -> u16 {
        self.zero_reading
    }

    /// Last thermistor reading
    pub fn thermistor_reading(&self) -> u16 {
        self.thermistor_reading
    }

    /// Raw codes of the last burst
    pub fn samples(&self) -> &SampleBuffer {
        &self.buffer
    }

    pub fn frontend(&self) -> &F {
        &self.frontend
    }

    /// Release the front end and delay timer
    pub fn release(self) -> (F, D) {
        (self.frontend, self.delay)
    }

    /// Collect one burst into the buffer
    fn burst(&mut self) {
        self.buffer.reset();

        self.frontend.arm_conversion_interrupt(&mut self.buffer);
        self.frontend.start_burst();

        self.frontend
            .wait_for_burst(&mut self.buffer, self.config.burst_level);
    }

    fn average(&self) -> u16 {
        let reading = calibration::calibrate(self.buffer.samples(), &self.profile);

        #[cfg(feature = "defmt")]
        defmt::debug!(
            "reading {} (sum {})",
            reading,
            calibration::accumulate(self.buffer.samples(), &self.profile)
        );

        reading
    }
}
