//! Startup self-calibration of bus latencies.
//!
//! The blanking deadline is pulled forward by the time an LED write and two
//! sensor reads take. Both are measured once at startup by timing repeated
//! calls and taking the rounded-up mean of the successful ones.

use embassy_sync::blocking_mutex::raw::RawMutex;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::clock::Clock;
use crate::led::{LedOutput, SharedLed};
use crate::sensor::BusSpeed;
use crate::{LedDriver, LightSensor};

/// Measured primitive latencies, in clock ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DelayEstimates {
    pub led_write_ticks: u64,
    pub sensor_read_ticks: u64,
}

/// Running mean over the successful timed calls
#[derive(Debug, Default)]
struct LatencyAccumulator {
    total: u64,
    count: u64,
}

impl LatencyAccumulator {
    fn add(&mut self, ticks: u64) {
        self.total += ticks;
        self.count += 1;
    }

    fn ceil_mean(&self) -> u64 {
        if self.count == 0 {
            0
        } else {
            self.total.div_ceil(self.count)
        }
    }
}

/// Time up to `attempts` calls of `op`, stopping after `samples` successes
fn time_calls<C: Clock, E>(
    clock: &C,
    attempts: usize,
    samples: usize,
    mut op: impl FnMut() -> Result<(), E>,
) -> u64 {
    let mut acc = LatencyAccumulator::default();
    for _ in 0..attempts {
        let started = clock.now();
        let result = op();
        let ticks = clock.now().saturating_duration_since(started).as_ticks();
        if result.is_ok() {
            acc.add(ticks);
            if acc.count as usize >= samples {
                break;
            }
        }
    }
    acc.ceil_mean()
}

impl DelayEstimates {
    /// Measure LED write and sensor read latencies with the bus in fast mode.
    ///
    /// The LED is held dark while writes are timed and its previous PWM state
    /// is restored afterwards.
    pub fn calibrate<M, D, S, C>(
        led: &SharedLed<M, D>,
        sensor: &mut S,
        clock: &C,
        channel: u8,
        attempts: usize,
        samples: usize,
    ) -> Self
    where
        M: RawMutex,
        D: LedDriver,
        S: LightSensor,
        C: Clock,
    {
        sensor.set_bus_speed(BusSpeed::Fast);

        let led_write_ticks = led.lock(|link| {
            let saved = link.read_pwms();
            let ticks = time_calls(clock, attempts, samples, || {
                link.driver()
                    .write_raw(LedOutput::OFF.currents, LedOutput::OFF.pwms)
            });
            match saved {
                Ok(pwms) => {
                    let _ = link.restore(pwms);
                }
                Err(_) => {
                    let last = link.last_output();
                    let _ = link.write(last);
                }
            }
            ticks
        });

        let sensor_read_ticks = time_calls(clock, attempts, samples, || {
            sensor.read_channel(channel).map(|_| ())
        });

        sensor.set_bus_speed(BusSpeed::Normal);

        let estimates = Self {
            led_write_ticks,
            sensor_read_ticks,
        };
        #[cfg(feature = "esp32-log")]
        println!(
            "[DelayEstimates.calibrate] led write {} ticks, sensor read {} ticks",
            estimates.led_write_ticks, estimates.sensor_read_ticks
        );
        estimates
    }
}
