#![no_std]

pub mod aqi;
pub mod averager;
pub mod calibration;
pub mod clock;
pub mod color;
pub mod config;
pub mod controller;
pub mod coordinate;
pub mod engine;
pub mod events;
pub mod led;
pub mod math8;
pub mod pending;
pub mod rule;
pub mod sampler;
pub mod scheduler;
pub mod sensor;
pub mod transition;

pub use aqi::{AqiBand, AqiFeedback, DisplayMode, ManualLevel, ManualTable};
pub use averager::LuminosityRing;
pub use calibration::{CalibrationRow, CalibrationTable, DEFAULT_CALIBRATION};
pub use clock::{Clock, SystemClock};
pub use config::{ControllerConfig, FeedbackConfig, SamplerConfig, ring_len};
pub use controller::{InitError, LightController};
pub use coordinate::{Coordinate, CoordinateKind};
pub use engine::DimmingEngine;
pub use events::{ControlEvent, ControlEvents, EventSet};
pub use led::{LedOutput, SharedLed};
pub use pending::PendingRuleSlot;
pub use rule::{DimmingRule, RuleError, Stage};
pub use sampler::{DelayEstimates, LuminositySampler, SampleError};
pub use scheduler::CycleTimers;
pub use sensor::{BusSpeed, ChannelLayout, ChannelSample, SampleCounter};
pub use transition::{ExpCurrentCoef, ExpCurrentCoefs};

pub use color::Rgb;
pub use embassy_time::{Duration, Instant};

use color::{Currents, Pwms};

/// LED driver chip capability
///
/// Implement this trait for the concrete chip; the controller only ever
/// touches it through [`SharedLed`].
pub trait LedDriver {
    type Error: core::fmt::Debug;

    /// Whether the chip is present and configured
    fn is_ready(&mut self) -> bool;

    /// Write currents and PWMs for all three channels
    fn write_raw(&mut self, currents: Currents, pwms: Pwms) -> Result<(), Self::Error>;

    /// Read back the PWM registers
    fn read_raw(&mut self) -> Result<Pwms, Self::Error>;

    /// Verify the chip has not silently reset, reconfiguring it if it has.
    ///
    /// Returns `false` when the chip is unhealthy and could not be recovered.
    fn health_check_and_reinit(&mut self) -> bool;

    /// Put the chip into its power-down state
    fn deinit(&mut self) -> Result<(), Self::Error>;
}

/// Free-running multi-channel light sensor capability
pub trait LightSensor {
    type Error: core::fmt::Debug;

    fn is_ready(&mut self) -> bool;

    /// Read the latest sample of a channel.
    ///
    /// Fails transiently while no sample is available.
    fn read_channel(&mut self, channel: u8) -> Result<ChannelSample, Self::Error>;

    /// Duration of a single channel conversion
    fn conversion_time(&self) -> Duration;

    /// Number of channels converted in one round
    fn channels_per_round(&self) -> u8;

    /// Switch the shared bus clock
    fn set_bus_speed(&mut self, speed: BusSpeed);
}
