//! Double-buffered hand-off of dimming rules to the engine.
//!
//! Producers fill the slot under its own critical section, independent of the
//! LED lock, so issuing a command never waits on LED I/O. The engine adopts
//! the pending rule when its active rule retires, or right away when the
//! rule was submitted as forced.

use core::cell::RefCell;

use critical_section::Mutex;
use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::color::{Currents, Pwms, Rgb};
use crate::coordinate::{Coordinate, CoordinateKind};
use crate::rule::{DimmingRule, RuleError};

struct PendingState {
    rule: Option<DimmingRule>,
    forced: bool,
    /// Resting point of the engine's active rule, published on adoption
    active_target: Option<Coordinate>,
    transition: Duration,
}

/// Rule waiting to be adopted by the dimming engine
pub struct PendingRuleSlot {
    inner: Mutex<RefCell<PendingState>>,
}

impl PendingRuleSlot {
    /// Create an empty slot; fades built through it last `transition`
    pub const fn new(transition: Duration) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(PendingState {
                rule: None,
                forced: false,
                active_target: None,
                transition,
            })),
        }
    }

    fn with<R>(&self, f: impl FnOnce(&mut PendingState) -> R) -> R {
        critical_section::with(|cs| f(&mut self.inner.borrow(cs).borrow_mut()))
    }

    /// Replace the pending rule; it is adopted once the active rule retires
    pub fn submit(&self, rule: DimmingRule) {
        self.with(|state| {
            state.rule = Some(rule);
            state.forced = false;
        });
    }

    /// Replace the pending rule and make the engine drop its active one
    pub fn submit_forced(&self, rule: DimmingRule) {
        self.with(|state| {
            state.rule = Some(rule);
            state.forced = true;
        });
    }

    pub fn is_pending(&self) -> bool {
        self.with(|state| state.rule.is_some())
    }

    /// Take the pending rule, if any
    pub fn take(&self) -> Option<DimmingRule> {
        self.with(|state| {
            state.forced = false;
            state.rule.take()
        })
    }

    /// Take the pending rule only if it was submitted as forced
    pub fn take_forced(&self) -> Option<DimmingRule> {
        self.with(|state| {
            if !state.forced {
                return None;
            }
            state.forced = false;
            state.rule.take()
        })
    }

    /// Record where the engine's newly adopted rule will come to rest
    pub fn publish_active_target(&self, target: Coordinate) {
        self.with(|state| state.active_target = Some(target));
    }

    pub fn active_target(&self) -> Option<Coordinate> {
        self.with(|state| state.active_target)
    }

    pub fn transition(&self) -> Duration {
        self.with(|state| state.transition)
    }

    /// Queue a fade from the active rule's resting point to `target`.
    ///
    /// If the active rule uses the other coordinate variant the fade starts
    /// from black of the target's variant.
    pub fn fade_to(&self, target: Coordinate) -> Result<(), RuleError> {
        self.with(|state| {
            let from = match state.active_target {
                Some(active) if active.kind() == target.kind() => active,
                _ => Coordinate::black(target.kind()),
            };
            let rule = DimmingRule::fade(from, target, state.transition)?;
            #[cfg(feature = "esp32-log")]
            println!("[PendingRuleSlot.fade_to] {:?} -> {:?}", from, target);
            state.rule = Some(rule);
            state.forced = false;
            Ok(())
        })
    }

    /// Fade to a calibrated color at the given brightness
    pub fn fade_to_color(&self, brightness: u8, color: Rgb) -> Result<(), RuleError> {
        self.fade_to(Coordinate::color(brightness, color))
    }

    /// Fade to raw driver currents and PWMs
    pub fn fade_to_raw(&self, currents: Currents, pwms: Pwms) -> Result<(), RuleError> {
        self.fade_to(Coordinate::raw(currents, pwms))
    }

    /// Fade to black in the active rule's coordinate variant
    pub fn fade_to_black(&self) -> Result<(), RuleError> {
        let kind = self
            .active_target()
            .map(|target| target.kind())
            .unwrap_or(CoordinateKind::Color);
        self.fade_to(Coordinate::black(kind))
    }
}
