//! # Thermo
//!
//! Analog acquisition for the stm32l0x3 based thermocouple satellite processor.
//!
//! ---
//!
//! The board measures four thermocouple channels, the offset of its front end
//! and a cold junction thermistor. This library turns the raw conversions into
//! calibrated readings while keeping the node asleep as much as possible
//!
//! - Settle delays sleep on the low power timer instead of spinning
//! - Conversions run in bursts driven by the ADC interrupt while the core
//!   sleeps, the foreground only wakes once the burst is complete
//! - The analog paths are only powered for as long as a reading needs them
//!
//! The acquisition engine ([`Thermo`]) is generic over [`AnalogFrontEnd`] and
//! [`LowPowerDelay`]; [`Adc`] and [`LpDelay`] implement them on the hardware.

#![cfg_attr(not(test), no_std)]

pub mod acquisition;
pub mod adc;
pub mod burst;
pub mod calibration;
pub mod config;
pub mod delay;
pub mod error;
pub mod frontend;
pub mod power;
pub mod system;

pub use acquisition::{Scan, Thermo};
pub use adc::Adc;
pub use burst::{InterruptCause, Progress, SampleBuffer, NUM_SAMPLES};
pub use calibration::CalibrationProfile;
pub use config::AcquisitionConfig;
pub use delay::{LowPowerDelay, LpDelay};
pub use error::Error;
pub use frontend::{AnalogFrontEnd, Channel, Input, SampleTime};
pub use power::SleepLevel;
pub use system::System;

pub use stm32l0::stm32l0x3 as pac;
