//! Dimming rule engine.
//!
//! Each control tick interpolates the active rule between its current and
//! next stage, pushes the result to the LED and advances the stage once its
//! duration has fully elapsed.

use embassy_sync::blocking_mutex::raw::RawMutex;
use embassy_time::Instant;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::LedDriver;
use crate::calibration::CalibrationTable;
use crate::coordinate::Coordinate;
use crate::led::{LedOutput, SharedLed};
use crate::pending::PendingRuleSlot;
use crate::rule::DimmingRule;
use crate::transition::ExpCurrentCoefs;

/// What a single engine tick did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// No active rule and nothing pending
    Idle,
    /// Output computed and written
    Written(LedOutput),
    /// Output computed while output is suppressed
    Suppressed(LedOutput),
    /// The LED write failed; the stage was not advanced
    WriteFailed,
}

/// Runs the active dimming rule and swaps in pending ones.
///
/// Owns at most one active rule. When a non-repeating rule wraps back to its
/// first stage it retires and the rule waiting in the [`PendingRuleSlot`] is
/// adopted on the same tick.
pub struct DimmingEngine<'a> {
    table: &'a CalibrationTable,
    coefs: ExpCurrentCoefs,
    active: Option<DimmingRule>,
    retired: u32,
}

impl<'a> DimmingEngine<'a> {
    /// Create an idle engine resolving color coordinates through `table`
    pub const fn new(table: &'a CalibrationTable, coefs: ExpCurrentCoefs) -> Self {
        Self {
            table,
            coefs,
            active: None,
            retired: 0,
        }
    }

    /// Install a rule as active, bypassing the pending slot
    pub fn set_active(&mut self, rule: DimmingRule, pending: &PendingRuleSlot) {
        pending.publish_active_target(rule.final_target());
        self.active = Some(rule);
    }

    pub const fn active(&self) -> Option<&DimmingRule> {
        self.active.as_ref()
    }

    /// Number of rules retired so far
    pub const fn retired_count(&self) -> u32 {
        self.retired
    }

    pub const fn coefs(&self) -> &ExpCurrentCoefs {
        &self.coefs
    }

    /// Let the active rule finish its current loop and then retire
    pub fn stop_auto_repeat(&mut self) {
        if let Some(rule) = self.active.as_mut() {
            rule.set_auto_repeat(false);
        }
    }

    fn adopt_pending(&mut self, pending: &PendingRuleSlot) -> bool {
        match pending.take() {
            Some(rule) => {
                pending.publish_active_target(rule.final_target());
                self.active = Some(rule);
                true
            }
            None => false,
        }
    }

    /// Output of the active rule at `now` without touching any state
    pub fn output_at(&self, now: Instant) -> Option<LedOutput> {
        let rule = self.active.as_ref()?;
        let start = if rule.is_started() { rule.stage_start() } else { now };
        let (coordinate, _) = stage_position(rule, start, now, &self.coefs);
        Some(coordinate.resolve(self.table))
    }

    /// Run one control tick
    pub fn tick<M: RawMutex, D: LedDriver>(
        &mut self,
        now: Instant,
        pending: &PendingRuleSlot,
        led: &SharedLed<M, D>,
    ) -> TickOutcome {
        if let Some(rule) = pending.take_forced() {
            #[cfg(feature = "esp32-log")]
            println!("[DimmingEngine.tick] forced rule replaces active rule");
            pending.publish_active_target(rule.final_target());
            self.active = Some(rule);
        }

        if self.active.is_none() && !self.adopt_pending(pending) {
            return TickOutcome::Idle;
        }
        let Some(rule) = self.active.as_mut() else {
            return TickOutcome::Idle;
        };
        if !rule.is_started() {
            rule.start(now);
        }

        let (coordinate, stage_done) = stage_position(rule, rule.stage_start(), now, &self.coefs);
        let output = coordinate.resolve(self.table);

        let outcome = match led.lock(|link| link.write_if_enabled(output)) {
            Ok(true) => TickOutcome::Written(output),
            Ok(false) => TickOutcome::Suppressed(output),
            Err(_error) => {
                #[cfg(feature = "esp32-log")]
                println!("[DimmingEngine.tick] LED write failed: {:?}", _error);
                return TickOutcome::WriteFailed;
            }
        };

        if stage_done && rule.advance(now) && !rule.auto_repeat() {
            self.active = None;
            self.retired = self.retired.wrapping_add(1);
            #[cfg(feature = "esp32-log")]
            println!("[DimmingEngine.tick] rule retired");
            self.adopt_pending(pending);
        }

        outcome
    }
}

/// Interpolated coordinate of the rule's current stage and whether the stage
/// has run its full duration
fn stage_position(
    rule: &DimmingRule,
    start: Instant,
    now: Instant,
    coefs: &ExpCurrentCoefs,
) -> (Coordinate, bool) {
    let stage = rule.current_stage();
    let duration = stage.duration.as_ticks();
    let elapsed = now.saturating_duration_since(start).as_ticks().min(duration);
    let coordinate = Coordinate::interpolate(
        &stage.target,
        &rule.next_stage().target,
        elapsed,
        duration,
        coefs,
    );
    (coordinate, elapsed == duration)
}
