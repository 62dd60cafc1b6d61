//! Event bitmask driving the control task.
//!
//! Producers post events from any context; repeated posts of the same event
//! coalesce until the control task takes them. The task processes a taken set
//! in a fixed priority order.

use core::cell::Cell;

use critical_section::Mutex;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::signal::Signal;
use embassy_time::{Instant, TimeoutError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlEvent {
    /// Blank and power down the LED ahead of a restart
    TurnOffBeforeReboot,
    /// Tick the dimming engine
    ControlCycle,
    MeasureLuminosity,
    /// Verify the LED driver has not reset
    HealthCheck,
    /// Let the boot animation finish its loop and retire
    StopBootFade,
}

impl ControlEvent {
    /// Processing order within one wake-up
    pub const PRIORITY: [Self; 5] = [
        Self::TurnOffBeforeReboot,
        Self::ControlCycle,
        Self::MeasureLuminosity,
        Self::HealthCheck,
        Self::StopBootFade,
    ];

    pub const fn bit(self) -> u8 {
        match self {
            Self::TurnOffBeforeReboot => 1 << 0,
            Self::ControlCycle => 1 << 1,
            Self::MeasureLuminosity => 1 << 2,
            Self::HealthCheck => 1 << 3,
            Self::StopBootFade => 1 << 4,
        }
    }
}

/// Set of coalesced events
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventSet(u8);

impl EventSet {
    pub const EMPTY: Self = Self(0);

    pub const fn with(self, event: ControlEvent) -> Self {
        Self(self.0 | event.bit())
    }

    pub const fn contains(self, event: ControlEvent) -> bool {
        self.0 & event.bit() != 0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Events of the set in processing order
    pub fn iter(self) -> impl Iterator<Item = ControlEvent> {
        ControlEvent::PRIORITY
            .into_iter()
            .filter(move |event| self.contains(*event))
    }
}

impl FromIterator<ControlEvent> for EventSet {
    fn from_iter<I: IntoIterator<Item = ControlEvent>>(iter: I) -> Self {
        iter.into_iter().fold(Self::EMPTY, Self::with)
    }
}

pub struct ControlEvents {
    pending: Mutex<Cell<u8>>,
    doorbell: Signal<CriticalSectionRawMutex, ()>,
    turned_off: Signal<CriticalSectionRawMutex, ()>,
}

impl ControlEvents {
    pub const fn new() -> Self {
        Self {
            pending: Mutex::new(Cell::new(0)),
            doorbell: Signal::new(),
            turned_off: Signal::new(),
        }
    }

    pub fn post(&self, event: ControlEvent) {
        critical_section::with(|cs| {
            let pending = self.pending.borrow(cs);
            pending.set(pending.get() | event.bit());
        });
        self.doorbell.signal(());
    }

    /// Take every posted event, leaving the set empty
    pub fn take(&self) -> EventSet {
        critical_section::with(|cs| EventSet(self.pending.borrow(cs).replace(0)))
    }

    /// Wait until at least one event is posted, then take them all
    pub async fn wait(&self) -> EventSet {
        loop {
            let events = self.take();
            if !events.is_empty() {
                return events;
            }
            self.doorbell.wait().await;
        }
    }

    /// Like [`ControlEvents::wait`], giving up at `deadline`
    pub async fn wait_until(&self, deadline: Instant) -> Result<EventSet, TimeoutError> {
        embassy_time::with_deadline(deadline, self.wait()).await
    }

    /// Ask the control task to blank and power down the LED, and wait until
    /// it has done so
    pub async fn turn_off_before_reboot(&self) {
        self.turned_off.reset();
        self.post(ControlEvent::TurnOffBeforeReboot);
        self.turned_off.wait().await;
    }

    /// Called by the control task once the LED is off
    pub(crate) fn acknowledge_turn_off(&self) {
        self.turned_off.signal(());
    }
}

impl Default for ControlEvents {
    fn default() -> Self {
        Self::new()
    }
}
