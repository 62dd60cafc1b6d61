//! The control task.
//!
//! Owns the dimming engine, the luminosity sampler with its ring, and the
//! feedback loop. All of them are driven from one event loop; the LED is
//! shared with outside callers through [`SharedLed`].

use core::fmt;

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::aqi::{
    AqiFeedback, BRIGHT_DAY_CURRENTS, DisplayMode, ManualLevel, ManualTable, NIGHT_CURRENTS,
};
use crate::averager::LuminosityRing;
use crate::calibration::CalibrationTable;
use crate::clock::Clock;
use crate::config::ControllerConfig;
use crate::engine::{DimmingEngine, TickOutcome};
use crate::events::{ControlEvent, ControlEvents, EventSet};
use crate::led::SharedLed;
use crate::pending::PendingRuleSlot;
use crate::rule::{DimmingRule, RuleError};
use crate::sampler::{LuminositySampler, SampleError};
use crate::scheduler::CycleTimers;
use crate::sensor::LayoutError;
use crate::transition::ExpCurrentCoefs;
use crate::{LedDriver, LightSensor};

/// Errors that keep the controller from starting
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitError {
    LedNotReady,
    InvalidBootFade(RuleError),
    InvalidChannelLayout(LayoutError),
}

impl InitError {
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::LedNotReady => "LED_NOT_READY",
            Self::InvalidBootFade(_) => "INVALID_BOOT_FADE",
            Self::InvalidChannelLayout(_) => "INVALID_CHANNEL_LAYOUT",
        }
    }
}

impl fmt::Display for InitError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::LedNotReady => f.write_str(self.as_str()),
            Self::InvalidBootFade(error) => write!(f, "{}: {}", self.as_str(), error),
            Self::InvalidChannelLayout(error) => write!(f, "{}: {}", self.as_str(), error),
        }
    }
}

/// Ambient-light compensated LED control task.
///
/// This controller:
/// - Ticks the dimming engine on the control cycle
/// - Samples luminosity with the LED blanked in automatic mode
/// - Feeds the smoothed luminosity and air quality into fade commands
/// - Checks the LED driver's health and powers it down before a reboot
///
/// # Usage
///
/// ```ignore
/// static LED: SharedLed<CriticalSectionRawMutex, Lp5810> = SharedLed::new(Lp5810::new());
/// static PENDING: PendingRuleSlot = PendingRuleSlot::new(Duration::from_millis(1000));
/// static EVENTS: ControlEvents = ControlEvents::new();
///
/// let config = ControllerConfig::default();
/// let mut controller: LightController<'_, _, _, _, _, DEFAULT_RING_LEN> = LightController::new(
///     &LED, &PENDING, &EVENTS, opt4060, SystemClock, &DEFAULT_CALIBRATION, &config,
/// )?;
///
/// controller.run().await;
/// ```
pub struct LightController<'a, M, D, S, C, const RING: usize>
where
    M: RawMutex,
    D: LedDriver,
    S: LightSensor,
    C: Clock,
{
    led: &'a SharedLed<M, D>,
    pending: &'a PendingRuleSlot,
    events: &'a ControlEvents,
    sensor: S,
    clock: C,
    engine: DimmingEngine<'a>,
    sampler: LuminositySampler,
    ring: LuminosityRing<RING>,
    direct_luminosity: f32,
    feedback: AqiFeedback,
    timers: CycleTimers,
    turned_off: bool,
}

impl<'a, M, D, S, C, const RING: usize> LightController<'a, M, D, S, C, RING>
where
    M: RawMutex,
    D: LedDriver,
    S: LightSensor,
    C: Clock,
{
    /// Bring up the controller.
    ///
    /// Fails only if the LED driver is not ready or the configuration is
    /// inconsistent. An unavailable light sensor just yields NaN samples.
    pub fn new(
        led: &'a SharedLed<M, D>,
        pending: &'a PendingRuleSlot,
        events: &'a ControlEvents,
        mut sensor: S,
        clock: C,
        table: &'a CalibrationTable,
        config: &ControllerConfig,
    ) -> Result<Self, InitError> {
        if !led.is_ready() {
            return Err(InitError::LedNotReady);
        }
        config
            .sampler
            .layout
            .validate(sensor.channels_per_round())
            .map_err(InitError::InvalidChannelLayout)?;
        let boot_fade =
            DimmingRule::new(config.boot_fade, true).map_err(InitError::InvalidBootFade)?;

        let coefs = ExpCurrentCoefs::from_bounds(
            NIGHT_CURRENTS,
            BRIGHT_DAY_CURRENTS,
            config.feedback.exp_curve_duration.as_ticks(),
        );
        let mut engine = DimmingEngine::new(table, coefs);
        engine.set_active(boot_fade, pending);

        let sampler = LuminositySampler::calibrated(config.sampler, led, &mut sensor, &clock);
        let now = clock.now();

        Ok(Self {
            led,
            pending,
            events,
            sensor,
            engine,
            sampler,
            ring: LuminosityRing::new(),
            direct_luminosity: f32::NAN,
            feedback: AqiFeedback::new(config.feedback, now, config.boot_fade_timeout),
            timers: CycleTimers::new(
                config.control_cycle,
                config.luminosity_period,
                config.health_check_period,
                now,
            ),
            turned_off: false,
            clock,
        })
    }

    pub const fn engine(&self) -> &DimmingEngine<'a> {
        &self.engine
    }

    pub const fn sampler(&self) -> &LuminositySampler {
        &self.sampler
    }

    pub const fn feedback(&self) -> &AqiFeedback {
        &self.feedback
    }

    pub const fn ring(&self) -> &LuminosityRing<RING> {
        &self.ring
    }

    pub const fn is_turned_off(&self) -> bool {
        self.turned_off
    }

    /// Ambient luminosity for the current mode.
    ///
    /// In automatic mode this is the outlier-filtered mean of the blanked
    /// samples, otherwise the latest direct reading. NaN if unknown.
    pub fn luminosity(&self) -> f32 {
        if self.feedback.uses_blanking() {
            self.ring.robust_mean()
        } else {
            self.direct_luminosity
        }
    }

    /// Record a new air-quality index and refresh the LED command
    pub fn set_aqi(&mut self, index: f32) {
        let now = self.clock.now();
        if self.feedback.set_aqi(index, now) {
            self.events.post(ControlEvent::StopBootFade);
        }
        self.refresh();
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        self.feedback.set_mode(mode);
        self.refresh();
    }

    pub fn set_manual_table(&mut self, level: ManualLevel, table: ManualTable) {
        self.feedback.set_manual_table(level, table);
        self.refresh();
    }

    pub fn reset_manual_table(&mut self, level: ManualLevel) {
        self.feedback.reset_manual_table(level);
        self.refresh();
    }

    fn refresh(&self) {
        if let Err(_error) = self.feedback.refresh(self.pending) {
            #[cfg(feature = "esp32-log")]
            println!("[LightController.refresh] failed to build rule: {}", _error);
        }
    }

    /// Post due timer events, process everything posted and return the next
    /// timer deadline
    pub fn run_once(&mut self) -> Instant {
        let deadline = self.timers.poll(self.clock.now(), self.events);
        let events = self.events.take();
        self.process(events);
        deadline
    }

    /// Run the control task; never returns
    pub async fn run(&mut self) {
        loop {
            let deadline = self.timers.poll(self.clock.now(), self.events);
            let events = match self.events.wait_until(deadline).await {
                Ok(events) => events,
                Err(_) => self.events.take(),
            };
            self.process(events);
        }
    }

    /// Handle a set of events in priority order
    pub fn process(&mut self, events: EventSet) {
        for event in events.iter() {
            if self.turned_off {
                return;
            }
            match event {
                ControlEvent::TurnOffBeforeReboot => self.turn_off(),
                ControlEvent::ControlCycle => {
                    self.control_cycle();
                }
                ControlEvent::MeasureLuminosity => self.measure_luminosity(),
                ControlEvent::HealthCheck => self.health_check(),
                ControlEvent::StopBootFade => self.engine.stop_auto_repeat(),
            }
        }
    }

    fn turn_off(&mut self) {
        let _result = self.led.lock(|link| {
            link.blank()?;
            link.driver().deinit()
        });
        #[cfg(feature = "esp32-log")]
        println!("[LightController.turn_off] LED off before reboot: {:?}", _result);
        self.turned_off = true;
        self.events.acknowledge_turn_off();
    }

    fn control_cycle(&mut self) -> TickOutcome {
        let now = self.clock.now();
        if self.feedback.check_boot_fade_timeout(now) {
            self.events.post(ControlEvent::StopBootFade);
            self.refresh();
        }
        self.engine.tick(now, self.pending, self.led)
    }

    fn measure_luminosity(&mut self) {
        if self.feedback.uses_blanking() {
            let sample = self
                .sampler
                .measure(self.led, &mut self.sensor, &self.clock)
                .unwrap_or(f32::NAN);
            self.ring.push(sample);
            self.feedback.update_luminosity(self.ring.robust_mean());
            self.refresh();
        } else {
            // includes the LED's own light, so it stays out of the moving average
            self.direct_luminosity = match self.sampler.measure_direct(&mut self.sensor) {
                Ok(value) => value,
                Err(_error) => {
                    #[cfg(feature = "esp32-log")]
                    println!("[LightController.measure_luminosity] {}", _error);
                    f32::NAN
                }
            };
        }
    }

    fn health_check(&mut self) {
        if !self.led.health_check_and_reinit() {
            #[cfg(feature = "esp32-log")]
            println!("[LightController.health_check] LED driver unhealthy");
        }
    }

    /// Single blanked measurement outside the periodic schedule
    pub fn measure_now(&mut self) -> Result<f32, SampleError> {
        self.sampler.measure(self.led, &mut self.sensor, &self.clock)
    }
}
