//! Luminosity sampler.
//!
//! The light sensor shares its optical path with the LED, so a clean reading
//! needs the LED dark for the whole integration window of the luminosity
//! channel. The sensor converts its channels round-robin on its own clock and
//! the only view into that cycle is the 4-bit counter attached to each
//! sample. One attempt:
//!
//! 1. Poll the heartbeat channel until its counter changes (round edge).
//! 2. Busy-wait until just before the guard channel finishes converting.
//! 3. Blank the LED and confirm the guard channel has not converted yet.
//! 4. Wait for the luminosity channel to report the blanked slot's counter.
//! 5. Re-read it to make sure the slot was not being overwritten.
//! 6. Restore the LED.

mod delays;
mod error;

pub use delays::DelayEstimates;
pub use error::SampleError;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::clock::Clock;
use crate::config::SamplerConfig;
use crate::led::{LedLink, SharedLed};
use crate::sensor::{BusSpeed, ChannelLayout, SampleCounter};
use crate::{LedDriver, LightSensor};

/// Start of the round observed on the heartbeat channel
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundEdge {
    /// Time the changed counter was observed
    pub at: Instant,
    /// Counter of the new round
    pub counter: SampleCounter,
}

/// Blanking luminosity sampler.
///
/// Holds the bus latencies measured at startup and the timing of the last
/// attempt. Every measurement runs under the LED lock, so periodic LED
/// writes cannot land inside the dark window.
pub struct LuminositySampler {
    config: SamplerConfig,
    delays: DelayEstimates,
    last_blank: Option<Duration>,
    last_blank_deadline: Option<Instant>,
}

impl LuminositySampler {
    /// Create a sampler with already known latencies
    pub const fn new(config: SamplerConfig, delays: DelayEstimates) -> Self {
        Self {
            config,
            delays,
            last_blank: None,
            last_blank_deadline: None,
        }
    }

    /// Measure bus latencies and build a sampler around them
    pub fn calibrated<M, D, S, C>(
        config: SamplerConfig,
        led: &SharedLed<M, D>,
        sensor: &mut S,
        clock: &C,
    ) -> Self
    where
        M: RawMutex,
        D: LedDriver,
        S: LightSensor,
        C: Clock,
    {
        let delays = DelayEstimates::calibrate(
            led,
            sensor,
            clock,
            config.layout.luminosity,
            config.calibration_attempts,
            config.calibration_samples,
        );
        Self::new(config, delays)
    }

    pub const fn delays(&self) -> DelayEstimates {
        self.delays
    }

    pub const fn layout(&self) -> ChannelLayout {
        self.config.layout
    }

    /// How long the LED stayed dark during the last attempt that blanked it
    pub const fn last_blank_duration(&self) -> Option<Duration> {
        self.last_blank
    }

    /// Deadline computed by the last attempt that saw a round edge
    pub const fn last_blank_deadline(&self) -> Option<Instant> {
        self.last_blank_deadline
    }

    /// Instant at which the LED write has to be issued.
    ///
    /// One conversion after the round edge the guard channel completes and
    /// the luminosity channel starts integrating. The write is pulled forward
    /// by its own latency, two sensor reads and the safety margin.
    pub fn blank_deadline(&self, edge: Instant, conversion: Duration) -> Instant {
        let lead = self.delays.led_write_ticks
            + 2 * self.delays.sensor_read_ticks
            + self.config.safety_margin_ticks;
        let target = edge.as_ticks() + conversion.as_ticks();
        Instant::from_ticks(target.saturating_sub(lead))
    }

    /// One blanked measurement of the luminosity channel.
    ///
    /// Holds the LED lock and runs the bus in fast mode for the whole attempt.
    pub fn measure<M, D, S, C>(
        &mut self,
        led: &SharedLed<M, D>,
        sensor: &mut S,
        clock: &C,
    ) -> Result<f32, SampleError>
    where
        M: RawMutex,
        D: LedDriver,
        S: LightSensor,
        C: Clock,
    {
        if !sensor.is_ready() {
            return Err(SampleError::SensorNotReady);
        }

        let result = led.lock(|link| {
            sensor.set_bus_speed(BusSpeed::Fast);
            let result = self.measure_locked(link, sensor, clock);
            sensor.set_bus_speed(BusSpeed::Normal);
            result
        });

        #[cfg(feature = "esp32-log")]
        if let Err(error) = result {
            println!(
                "[LuminositySampler.measure] {} (led off {:?} ticks)",
                error,
                self.last_blank.map(|blank| blank.as_ticks())
            );
        }
        result
    }

    fn measure_locked<D, S, C>(
        &mut self,
        link: &mut LedLink<D>,
        sensor: &mut S,
        clock: &C,
    ) -> Result<f32, SampleError>
    where
        D: LedDriver,
        S: LightSensor,
        C: Clock,
    {
        self.last_blank = None;
        let pwms = link
            .read_pwms()
            .map_err(|_| SampleError::FailedToReadLed)?;

        let mut blanked_at = None;
        let result = self.synchronized_read(link, sensor, clock, &mut blanked_at);

        let restored = link.restore(pwms);
        if let Some(blanked_at) = blanked_at {
            self.last_blank = Some(clock.now().saturating_duration_since(blanked_at));
        }

        match (result, restored) {
            (Err(error), _) => Err(error),
            (Ok(_), Err(_)) => Err(SampleError::FailedToRestoreLed),
            (Ok(value), Ok(())) => Ok(value),
        }
    }

    fn synchronized_read<D, S, C>(
        &mut self,
        link: &mut LedLink<D>,
        sensor: &mut S,
        clock: &C,
        blanked_at: &mut Option<Instant>,
    ) -> Result<f32, SampleError>
    where
        D: LedDriver,
        S: LightSensor,
        C: Clock,
    {
        let layout = self.config.layout;
        let conversion = sensor.conversion_time();

        let edge = self.wait_round_edge(sensor, clock)?;
        let deadline = self.blank_deadline(edge.at, conversion);
        self.last_blank_deadline = Some(deadline);

        clock.spin_until(deadline);
        link.blank().map_err(|_| SampleError::FailedToBlankLed)?;
        *blanked_at = Some(clock.now());

        let guard = sensor
            .read_channel(layout.guard)
            .map_err(|_| SampleError::GuardReadFailed)?;
        let expected = layout.luminosity_counter(edge.counter);
        if guard.counter != layout.guard_counter_before(edge.counter) {
            return Err(SampleError::LuminosityChannelLate);
        }

        let timeout = 2 * conversion.as_ticks() + self.delays.sensor_read_ticks;
        let started = clock.now();
        let sample = loop {
            if let Ok(sample) = sensor.read_channel(layout.luminosity) {
                if sample.counter == expected {
                    break sample;
                }
                if sample.counter != expected.prev() {
                    return Err(SampleError::LuminosityCntChangedUnexpectedly);
                }
            }
            if elapsed_ticks(clock, started) > timeout {
                return Err(SampleError::TimeoutWaitingLuminosity);
            }
        };

        let reread = sensor
            .read_channel(layout.luminosity)
            .map_err(|_| SampleError::RereadFailed)?;
        if reread.counter != sample.counter {
            return Err(SampleError::RereadCntChanged);
        }
        if reread.value.to_bits() != sample.value.to_bits() {
            return Err(SampleError::RereadValChanged);
        }

        Ok(sample.value)
    }

    /// Observe the heartbeat counter change.
    ///
    /// First waits for any successful read, then polls until the counter
    /// differs from it. Each phase has its own timeout of a full round plus
    /// slack.
    pub fn wait_round_edge<S, C>(&self, sensor: &mut S, clock: &C) -> Result<RoundEdge, SampleError>
    where
        S: LightSensor,
        C: Clock,
    {
        let heartbeat = self.config.layout.heartbeat;
        let channels = u64::from(sensor.channels_per_round());
        let timeout = sensor.conversion_time().as_ticks() * (channels + 2)
            + 2 * self.delays.sensor_read_ticks;

        let started = clock.now();
        let initial = loop {
            if let Ok(sample) = sensor.read_channel(heartbeat) {
                break sample.counter;
            }
            if elapsed_ticks(clock, started) > timeout {
                return Err(SampleError::TimeoutReadingHeartbeat);
            }
        };

        let started = clock.now();
        loop {
            if let Ok(sample) = sensor.read_channel(heartbeat) {
                if sample.counter != initial {
                    return Ok(RoundEdge {
                        at: clock.now(),
                        counter: sample.counter,
                    });
                }
            }
            if elapsed_ticks(clock, started) > timeout {
                return Err(SampleError::TimeoutWaitingHeartbeat);
            }
        }
    }

    /// Read the luminosity channel without blanking.
    ///
    /// Used when the LED is driven at fixed levels and the reading does not
    /// need to be compensated. The first successful read wins.
    pub fn measure_direct<S: LightSensor>(&self, sensor: &mut S) -> Result<f32, SampleError> {
        if !sensor.is_ready() {
            return Err(SampleError::SensorNotReady);
        }
        (0..self.config.direct_read_retries)
            .find_map(|_| sensor.read_channel(self.config.layout.luminosity).ok())
            .map(|sample| sample.value)
            .ok_or(SampleError::DirectReadFailed)
    }
}

fn elapsed_ticks<C: Clock>(clock: &C, since: Instant) -> u64 {
    clock.now().saturating_duration_since(since).as_ticks()
}
