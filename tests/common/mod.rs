#![allow(dead_code)]

//! Deterministic bench for the controller.
//!
//! One shared simulated clock. Every driver call advances it by that call's
//! latency. The light sensor converts its channels round-robin: channel `c` of
//! round `k` finishes at `(channels * k + c + 1) * conversion` and reports
//! counter `k & 0xF`. The luminosity channel reads `ambient + leak` when the
//! LED was lit at any point of its integration window.

use std::cell::RefCell;
use std::rc::Rc;

use ambient_led_controller::color::{Currents, Pwms};
use ambient_led_controller::{
    BusSpeed, ChannelSample, Clock, Duration, Instant, LedDriver, LedOutput, LightSensor,
};

pub const CONVERSION: u64 = 2000;
pub const CHANNELS: u8 = 4;
pub const LED_WRITE_LATENCY: u64 = 5;
pub const LED_READ_LATENCY: u64 = 5;
pub const SENSOR_READ_LATENCY: u64 = 3;
pub const START: u64 = 1_000_000;
pub const LUMINOSITY_CHANNEL: u8 = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SimError;

/// Misbehavior of the luminosity channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LuminosityGlitch {
    None,
    /// Every read reports a counter five rounds ahead
    CounterJump,
    /// Repeat reads of a dark round report the following round's counter
    RereadCounter,
    /// Repeat reads of a dark round report a slightly different value
    RereadValue,
}

pub struct SimState {
    pub now: u64,
    pub led_write_latency: u64,
    pub led_read_latency: u64,
    pub sensor_read_latency: u64,
    pub conversion: u64,
    pub channels: u8,
    pub ambient: f32,
    pub leak: f32,
    pub luminosity_channel: u8,

    /// Completed LED writes as (time issued, time effective, output)
    pub led_writes: Vec<(u64, u64, LedOutput)>,
    pub led_ready: bool,
    pub led_healthy: bool,
    pub led_fail_writes: bool,
    /// Writes that still succeed before every further write fails
    pub led_writes_until_failure: Option<usize>,
    pub led_fail_reads: bool,
    pub led_deinit: bool,
    pub health_checks: u32,

    pub sensor_ready: bool,
    pub sensor_fail_reads: bool,
    pub sensor_frozen: bool,
    /// Channel whose reads always fail
    pub failing_channel: Option<u8>,
    pub luminosity_glitch: LuminosityGlitch,
    /// Round returned by the previous luminosity read and how often in a row
    pub luminosity_last_round: Option<(u64, u32)>,
    /// Extra ticks every busy-wait overshoots its deadline by
    pub spin_overshoot: u64,
    pub spins: Vec<u64>,
    pub bus_speeds: Vec<BusSpeed>,
}

pub type Sim = Rc<RefCell<SimState>>;

pub fn sim() -> Sim {
    Rc::new(RefCell::new(SimState {
        now: START,
        led_write_latency: LED_WRITE_LATENCY,
        led_read_latency: LED_READ_LATENCY,
        sensor_read_latency: SENSOR_READ_LATENCY,
        conversion: CONVERSION,
        channels: CHANNELS,
        ambient: 120.0,
        leak: 500.0,
        luminosity_channel: LUMINOSITY_CHANNEL,
        led_writes: Vec::new(),
        led_ready: true,
        led_healthy: true,
        led_fail_writes: false,
        led_writes_until_failure: None,
        led_fail_reads: false,
        led_deinit: false,
        health_checks: 0,
        sensor_ready: true,
        sensor_fail_reads: false,
        sensor_frozen: false,
        failing_channel: None,
        luminosity_glitch: LuminosityGlitch::None,
        luminosity_last_round: None,
        spin_overshoot: 0,
        spins: Vec::new(),
        bus_speeds: Vec::new(),
    }))
}

impl SimState {
    /// Output the LED showed at time `t`
    pub fn led_at(&self, t: u64) -> LedOutput {
        self.led_writes
            .iter()
            .rev()
            .find(|(_, effective, _)| *effective <= t)
            .map(|(_, _, output)| *output)
            .unwrap_or(LedOutput::OFF)
    }

    pub fn led_lit_during(&self, start: u64, end: u64) -> bool {
        !self.led_at(start).is_off()
            || self
                .led_writes
                .iter()
                .any(|(_, effective, output)| *effective > start && *effective < end && !output.is_off())
    }

    pub fn current_output(&self) -> LedOutput {
        self.led_at(self.now)
    }

    /// Time channel `channel` of `round` finishes converting
    pub fn completion(&self, round: u64, channel: u8) -> u64 {
        (u64::from(self.channels) * round + u64::from(channel) + 1) * self.conversion
    }

    /// Latest round of `channel` finished at time `t`
    pub fn round_at(&self, t: u64, channel: u8) -> Option<u64> {
        let slots = t / self.conversion;
        let first = u64::from(channel) + 1;
        if slots < first {
            return None;
        }
        Some((slots - first) / u64::from(self.channels))
    }

    fn channel_value(&self, round: u64, channel: u8) -> f32 {
        if channel != self.luminosity_channel {
            return 10.0 + f32::from(channel);
        }
        if self.is_dark_round(round, channel) {
            self.ambient
        } else {
            self.ambient + self.leak
        }
    }

    fn is_dark_round(&self, round: u64, channel: u8) -> bool {
        let end = self.completion(round, channel);
        let start = end - self.conversion;
        !self.led_lit_during(start, end)
    }

    /// Natural luminosity sample with the configured glitch applied
    fn luminosity_sample(&mut self, round: u64, channel: u8) -> ChannelSample {
        let repeats = match self.luminosity_last_round {
            Some((last, count)) if last == round => count + 1,
            _ => 1,
        };
        self.luminosity_last_round = Some((round, repeats));

        let mut value = self.channel_value(round, channel);
        let mut counter = round;
        let repeated_dark = repeats > 1 && self.is_dark_round(round, channel);
        match self.luminosity_glitch {
            LuminosityGlitch::None => {}
            LuminosityGlitch::CounterJump => counter += 5,
            LuminosityGlitch::RereadCounter if repeated_dark => counter += 1,
            LuminosityGlitch::RereadValue if repeated_dark => value += 1.0,
            LuminosityGlitch::RereadCounter | LuminosityGlitch::RereadValue => {}
        }
        ChannelSample::new(value, (counter % 16) as u8)
    }

    /// Blanking writes (all channels zero)
    pub fn blank_writes(&self) -> Vec<(u64, u64)> {
        self.led_writes
            .iter()
            .filter(|(_, _, output)| *output == LedOutput::OFF)
            .map(|(issued, effective, _)| (*issued, *effective))
            .collect()
    }
}

pub struct SimClock(pub Sim);

impl Clock for SimClock {
    fn now(&self) -> Instant {
        Instant::from_ticks(self.0.borrow().now)
    }

    fn spin_until(&self, deadline: Instant) {
        let mut state = self.0.borrow_mut();
        state.spins.push(deadline.as_ticks());
        if state.now < deadline.as_ticks() {
            state.now = deadline.as_ticks();
        }
        state.now += state.spin_overshoot;
    }
}

pub struct SimLed(pub Sim);

impl LedDriver for SimLed {
    type Error = SimError;

    fn is_ready(&mut self) -> bool {
        self.0.borrow().led_ready
    }

    fn write_raw(&mut self, currents: Currents, pwms: Pwms) -> Result<(), SimError> {
        let mut state = self.0.borrow_mut();
        let issued = state.now;
        state.now += state.led_write_latency;
        if state.led_fail_writes {
            return Err(SimError);
        }
        if let Some(remaining) = state.led_writes_until_failure.as_mut() {
            if *remaining == 0 {
                return Err(SimError);
            }
            *remaining -= 1;
        }
        let effective = state.now;
        state.led_writes.push((issued, effective, LedOutput { currents, pwms }));
        Ok(())
    }

    fn read_raw(&mut self) -> Result<Pwms, SimError> {
        let mut state = self.0.borrow_mut();
        state.now += state.led_read_latency;
        if state.led_fail_reads {
            return Err(SimError);
        }
        Ok(state.current_output().pwms)
    }

    fn health_check_and_reinit(&mut self) -> bool {
        let mut state = self.0.borrow_mut();
        state.health_checks += 1;
        state.led_healthy
    }

    fn deinit(&mut self) -> Result<(), SimError> {
        self.0.borrow_mut().led_deinit = true;
        Ok(())
    }
}

pub struct SimSensor(pub Sim);

impl LightSensor for SimSensor {
    type Error = SimError;

    fn is_ready(&mut self) -> bool {
        self.0.borrow().sensor_ready
    }

    fn read_channel(&mut self, channel: u8) -> Result<ChannelSample, SimError> {
        let mut state = self.0.borrow_mut();
        state.now += state.sensor_read_latency;
        if state.sensor_fail_reads
            || channel >= state.channels
            || state.failing_channel == Some(channel)
        {
            return Err(SimError);
        }
        if state.sensor_frozen {
            return Ok(ChannelSample::new(state.channel_value(0, channel), 0));
        }
        let round = state.round_at(state.now, channel).ok_or(SimError)?;
        if channel == state.luminosity_channel {
            return Ok(state.luminosity_sample(round, channel));
        }
        let value = state.channel_value(round, channel);
        Ok(ChannelSample::new(value, (round % 16) as u8))
    }

    fn conversion_time(&self) -> Duration {
        Duration::from_ticks(self.0.borrow().conversion)
    }

    fn channels_per_round(&self) -> u8 {
        self.0.borrow().channels
    }

    fn set_bus_speed(&mut self, speed: BusSpeed) {
        self.0.borrow_mut().bus_speeds.push(speed);
    }
}
