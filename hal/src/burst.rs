//! # Conversion bursts
//!
//! A burst is [`NUM_SAMPLES`] back to back conversions of a single input. The
//! samples are collected by the conversion complete interrupt into a
//! [`SampleBuffer`] which the foreground routine owns between bursts.
//!
//! The hand-off is strict: the foreground resets the buffer and lends it to the
//! interrupt before arming the burst, the interrupt appends samples until the
//! quota is met and then disables itself, and only after that does the
//! foreground read the buffer again. The two contexts never touch the buffer at
//! the same time.

/// Number of conversions in a burst
pub const NUM_SAMPLES: usize = 10;

/// Why the converter raised an interrupt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InterruptCause {
    /// No flag pending
    None,
    /// A result was overwritten before it was read
    Overflow,
    /// A conversion was requested before the previous one finished
    TimeOverflow,
    /// The given result register holds a completed conversion
    MemoryFull(u8),
}

/// Outcome of servicing a converter interrupt
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Progress {
    /// The interrupt was acknowledged and nothing was recorded
    Ignored,
    /// A sample was recorded and the burst needs more
    Pending,
    /// The last sample of the burst was recorded; the foreground must be woken
    Complete,
}

/// Raw conversion results of one burst
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SampleBuffer {
    samples: [u16; NUM_SAMPLES],
    cursor: usize,
}

impl SampleBuffer {
    pub const fn new() -> Self {
        Self {
            samples: [0; NUM_SAMPLES],
            cursor: 0,
        }
    }

    /// Zero every slot and rewind the cursor
    pub fn reset(&mut self) {
        self.samples = [0; NUM_SAMPLES];
        self.cursor = 0;
    }

    /// Index the next sample will be written to
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn samples(&self) -> &[u16; NUM_SAMPLES] {
        &self.samples
    }

    /// Append a sample.
    ///
    /// The cursor wraps back to 0 on the sample that fills the buffer, which is
    /// also the only time [`Progress::Complete`] is returned.
    pub fn record(&mut self, code: u16) -> Progress {
        self.samples[self.cursor] = code;
        self.cursor += 1;

        if self.cursor == NUM_SAMPLES {
            self.cursor = 0;
            Progress::Complete
        } else {
            Progress::Pending
        }
    }

    /// Service a converter interrupt.
    ///
    /// Only completions of result register 0 carry a sample; `read` is called
    /// exactly once for those and never for anything else.
    pub fn on_interrupt(&mut self, cause: InterruptCause, read: impl FnOnce() -> u16) -> Progress {
        match cause {
            InterruptCause::MemoryFull(0) => self.record(read()),
            _ => {
                #[cfg(feature = "defmt")]
                defmt::trace!("ignoring converter interrupt {}", cause);

                Progress::Ignored
            }
        }
    }
}

impl Default for SampleBuffer {
    fn default() -> Self {
        Self::new()
    }
}
