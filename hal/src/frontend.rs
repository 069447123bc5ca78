//! # Analog front end
//!
//! The front end multiplexes four thermocouple channels, a zero/offset path and
//! a thermistor onto the converter. [`AnalogFrontEnd`] is everything the
//! acquisition engine needs from it: converter control plus the discrete
//! enable lines.
//!
//! ## Enable lines
//!
//! | Line           | Asserted means                                    |
//! |----------------|---------------------------------------------------|
//! | reference      | reference voltage powered                         |
//! | zero path      | converter input held at the offset reference      |
//! | cold junction  | thermistor powered                                |
//! | channel 1-4    | thermocouple connected to the front end           |
//!
//! Electrical polarity is up to the implementation; the engine only ever asks
//! for the logical state.

use crate::burst::SampleBuffer;
use crate::error::Error;
use crate::power::SleepLevel;

/// A thermocouple channel
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Channel {
    Ch1,
    Ch2,
    Ch3,
    Ch4,
}

impl Channel {
    pub const ALL: [Channel; 4] = [Channel::Ch1, Channel::Ch2, Channel::Ch3, Channel::Ch4];

    /// Zero based position of the channel
    pub const fn index(self) -> usize {
        match self {
            Channel::Ch1 => 0,
            Channel::Ch2 => 1,
            Channel::Ch3 => 2,
            Channel::Ch4 => 3,
        }
    }

    /// One based channel number
    pub const fn number(self) -> u8 {
        self.index() as u8 + 1
    }
}

impl TryFrom<u8> for Channel {
    type Error = Error;

    fn try_from(number: u8) -> Result<Self, Self::Error> {
        match number {
            1 => Ok(Channel::Ch1),
            2 => Ok(Channel::Ch2),
            3 => Ok(Channel::Ch3),
            4 => Ok(Channel::Ch4),
            _ => Err(Error::InvalidChannel(number)),
        }
    }
}

/// Converter input
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Input {
    /// Output of the thermocouple amplifier, shared by every channel and the
    /// zero path
    Thermocouple,
    /// Thermistor divider
    Thermistor,
}

/// Sample and hold duration
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum SampleTime {
    /// Enough for the low impedance amplifier output
    #[default]
    Standard,
    /// Widened for the thermistor's source impedance
    Extended,
}

/// Converter and enable line control
pub trait AnalogFrontEnd {
    /// Bring the converter and analog paths to their idle state.
    ///
    /// Standard sample time, repeated conversions of a single input, reference
    /// and zero path enabled, cold junction and every channel off.
    fn configure(&mut self);

    fn set_reference(&mut self, enabled: bool);

    fn set_zero_path(&mut self, enabled: bool);

    fn set_cold_junction(&mut self, enabled: bool);

    fn set_channel(&mut self, channel: Channel, connected: bool);

    fn set_sample_time(&mut self, time: SampleTime);

    fn select_input(&mut self, input: Input);

    fn deselect_input(&mut self, input: Input);

    /// Power the converter up
    fn enable_converter(&mut self);

    /// Stop any running conversions, clear the start and enable bits and power
    /// the converter down
    fn disable_converter(&mut self);

    /// Select the result register conversions are written to
    fn select_result_register(&mut self, index: u8);

    /// Clear pending completions and enable the conversion complete interrupt.
    ///
    /// `buffer` has been reset and is lent to the interrupt until
    /// [`wait_for_burst`](AnalogFrontEnd::wait_for_burst) returns.
    fn arm_conversion_interrupt(&mut self, buffer: &mut SampleBuffer);

    fn start_burst(&mut self);

    /// Suspend at `level` until the interrupt has filled the buffer.
    ///
    /// There is no timeout; a converter that never completes hangs here.
    fn wait_for_burst(&mut self, buffer: &mut SampleBuffer, level: SleepLevel);
}
