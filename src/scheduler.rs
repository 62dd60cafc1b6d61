//! Periodic event timers.
//!
//! Portable pacing without async or platform timers: [`CycleTimers::poll`]
//! posts the events that are due and returns the next deadline. The caller
//! is responsible for waiting until then.

use embassy_time::{Duration, Instant};

use crate::events::{ControlEvent, ControlEvents, EventSet};

/// One periodic timer with drift correction
#[derive(Debug, Clone, Copy)]
pub struct PeriodicTimer {
    period: Duration,
    next: Instant,
}

impl PeriodicTimer {
    /// Create a timer that first fires at `start`
    pub const fn new(period: Duration, start: Instant) -> Self {
        Self {
            period,
            next: start,
        }
    }

    pub const fn next_deadline(&self) -> Instant {
        self.next
    }

    /// Returns `true` if the timer fired at `now`.
    ///
    /// If more than two periods behind, the backlog is skipped instead of
    /// fired in a burst.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now < self.next {
            return false;
        }
        let max_drift = self.period * 2;
        if now.saturating_duration_since(self.next) > max_drift {
            self.next = now;
        }
        self.next += self.period;
        true
    }
}

/// Timers of the control task
#[derive(Debug, Clone, Copy)]
pub struct CycleTimers {
    control: PeriodicTimer,
    luminosity: PeriodicTimer,
    health: PeriodicTimer,
}

impl CycleTimers {
    /// Create the timers, all firing first at `start`
    pub const fn new(
        control_cycle: Duration,
        luminosity_period: Duration,
        health_check_period: Duration,
        start: Instant,
    ) -> Self {
        Self {
            control: PeriodicTimer::new(control_cycle, start),
            luminosity: PeriodicTimer::new(luminosity_period, start),
            health: PeriodicTimer::new(health_check_period, start),
        }
    }

    /// Events due at `now`
    pub fn due(&mut self, now: Instant) -> EventSet {
        let mut due = EventSet::EMPTY;
        if self.control.poll(now) {
            due = due.with(ControlEvent::ControlCycle);
        }
        if self.luminosity.poll(now) {
            due = due.with(ControlEvent::MeasureLuminosity);
        }
        if self.health.poll(now) {
            due = due.with(ControlEvent::HealthCheck);
        }
        due
    }

    /// Post the due events and return the earliest upcoming deadline
    pub fn poll(&mut self, now: Instant, events: &ControlEvents) -> Instant {
        for event in self.due(now).iter() {
            events.post(event);
        }
        self.next_deadline()
    }

    pub fn next_deadline(&self) -> Instant {
        self.control
            .next_deadline()
            .min(self.luminosity.next_deadline())
            .min(self.health.next_deadline())
    }
}
