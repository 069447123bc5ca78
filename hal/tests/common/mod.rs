//! Recording test doubles for the front end and delay timer.
//!
//! Both doubles append to one shared [`Log`] so the relative order of line
//! changes, delays and bursts can be asserted. The front end simulates the
//! conversion complete interrupt by feeding scripted codes through the real
//! [`SampleBuffer::on_interrupt`] state machine.

#![allow(dead_code)]

use std::cell::RefCell;
use std::rc::Rc;

use thermo_hal::{
    AcquisitionConfig, AnalogFrontEnd, CalibrationProfile, Channel, Input, InterruptCause,
    LowPowerDelay, Progress, SampleBuffer, SampleTime, SleepLevel, Thermo,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Event {
    Configure,
    Reference(bool),
    ZeroPath(bool),
    ColdJunction(bool),
    Channel(Channel, bool),
    SampleTime(SampleTime),
    SelectInput(Input),
    DeselectInput(Input),
    ConverterOn,
    ConverterOff,
    ResultRegister(u8),
    Armed,
    BurstStarted,
    Sleep(SleepLevel),
    InterruptDisabled,
    Wake,
    Delay(u16, SleepLevel),
}

pub type Log = Rc<RefCell<Vec<Event>>>;

pub struct MockFrontEnd {
    log: Log,
    codes: Vec<u16>,
    next: usize,
    noise: bool,
    converting: bool,
    interrupt_enabled: bool,
    /// Buffer as lent to the interrupt, one entry per burst
    pub armed: Vec<SampleBuffer>,
    /// Sample carrying interrupts serviced, one entry per burst
    pub conversions: Vec<usize>,
    /// Interrupts that were acknowledged without a sample
    pub ignored: usize,
}

impl MockFrontEnd {
    /// Conversions return `codes` in order, starting over when exhausted
    pub fn new(log: &Log, codes: &[u16]) -> Self {
        assert!(!codes.is_empty());

        Self {
            log: log.clone(),
            codes: codes.to_vec(),
            next: 0,
            noise: false,
            converting: false,
            interrupt_enabled: false,
            armed: Vec::new(),
            conversions: Vec::new(),
            ignored: 0,
        }
    }

    /// Raise an overflow and a foreign result register completion before
    /// every real conversion
    pub fn with_noise(mut self) -> Self {
        self.noise = true;
        self
    }

    fn record(&self, event: Event) {
        self.log.borrow_mut().push(event);
    }

    fn next_code(&mut self) -> u16 {
        let code = self.codes[self.next % self.codes.len()];
        self.next += 1;
        code
    }
}

impl AnalogFrontEnd for MockFrontEnd {
    fn configure(&mut self) {
        self.record(Event::Configure);
    }

    fn set_reference(&mut self, enabled: bool) {
        self.record(Event::Reference(enabled));
    }

    fn set_zero_path(&mut self, enabled: bool) {
        self.record(Event::ZeroPath(enabled));
    }

    fn set_cold_junction(&mut self, enabled: bool) {
        self.record(Event::ColdJunction(enabled));
    }

    fn set_channel(&mut self, channel: Channel, connected: bool) {
        self.record(Event::Channel(channel, connected));
    }

    fn set_sample_time(&mut self, time: SampleTime) {
        self.record(Event::SampleTime(time));
    }

    fn select_input(&mut self, input: Input) {
        self.record(Event::SelectInput(input));
    }

    fn deselect_input(&mut self, input: Input) {
        self.record(Event::DeselectInput(input));
    }

    fn enable_converter(&mut self) {
        self.record(Event::ConverterOn);
    }

    fn disable_converter(&mut self) {
        self.converting = false;
        self.interrupt_enabled = false;
        self.record(Event::ConverterOff);
    }

    fn select_result_register(&mut self, index: u8) {
        self.record(Event::ResultRegister(index));
    }

    fn arm_conversion_interrupt(&mut self, buffer: &mut SampleBuffer) {
        self.armed.push(buffer.clone());
        self.interrupt_enabled = true;
        self.record(Event::Armed);
    }

    fn start_burst(&mut self) {
        self.converting = true;
        self.record(Event::BurstStarted);
    }

    fn wait_for_burst(&mut self, buffer: &mut SampleBuffer, level: SleepLevel) {
        assert!(self.converting, "sleeping on a burst that was never started");
        self.record(Event::Sleep(level));

        let mut conversions = 0;
        while self.interrupt_enabled {
            if self.noise {
                for cause in [InterruptCause::Overflow, InterruptCause::MemoryFull(1)] {
                    let progress = buffer.on_interrupt(cause, || unreachable!());
                    assert_eq!(progress, Progress::Ignored);
                    self.ignored += 1;
                }
            }

            let progress = buffer.on_interrupt(InterruptCause::MemoryFull(0), || self.next_code());
            conversions += 1;

            if progress == Progress::Complete {
                self.interrupt_enabled = false;
                self.record(Event::InterruptDisabled);
                self.record(Event::Wake);
            }
        }

        self.conversions.push(conversions);
    }
}

pub struct MockDelay {
    log: Log,
}

impl MockDelay {
    pub fn new(log: &Log) -> Self {
        Self { log: log.clone() }
    }
}

impl LowPowerDelay for MockDelay {
    fn delay(&mut self, ticks: u16, level: SleepLevel) {
        self.log.borrow_mut().push(Event::Delay(ticks, level));
    }
}

/// Unity gain with the given offset
pub fn offset_profile(offset: i16) -> CalibrationProfile {
    CalibrationProfile::new(i16::MIN, offset, -0x8000).unwrap()
}

/// An engine with default timing whose conversions return `codes`.
///
/// The configure event is drained from the log.
pub fn engine(
    codes: &[u16],
    profile: CalibrationProfile,
) -> (Thermo<MockFrontEnd, MockDelay>, Log) {
    let log = Log::default();
    let thermo = Thermo::new(
        MockFrontEnd::new(&log, codes),
        MockDelay::new(&log),
        profile,
        AcquisitionConfig::default(),
    );

    assert_eq!(log.borrow_mut().drain(..).collect::<Vec<_>>(), [Event::Configure]);

    (thermo, log)
}

pub fn position(log: &Log, event: Event) -> usize {
    log.borrow()
        .iter()
        .position(|e| *e == event)
        .unwrap_or_else(|| panic!("{event:?} not logged"))
}
