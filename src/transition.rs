//! Interpolation primitives used by the dimming engine.
//!
//! Brightness, PWM and color channels fade linearly. Raw driver currents fade
//! along an exponential curve so the perceived brightness changes evenly.

use crate::color::{Currents, zip_channels};
use crate::math8::round_to_u8;

/// Linear interpolation between `begin` and `end` (truncating).
///
/// `elapsed` is expected in `0..=duration`; a zero duration yields `begin`.
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_possible_wrap)]
pub const fn interpolate_linear(begin: i32, end: i32, elapsed: u64, duration: u64) -> i32 {
    if duration == 0 {
        return begin;
    }
    let delta = end as i64 - begin as i64;
    (begin as i64 + delta * elapsed as i64 / duration as i64) as i32
}

/// Linear interpolation of an 8-bit channel
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub const fn interpolate_u8(begin: u8, end: u8, elapsed: u64, duration: u64) -> u8 {
    interpolate_linear(begin as i32, end as i32, elapsed, duration) as u8
}

/// Exponential fade coefficient of one current channel
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpCurrentCoef {
    current_min: u8,
    current_max: u8,
    duration_ticks: u64,
    alpha: f32,
}

impl ExpCurrentCoef {
    /// Build the coefficient for a channel spanning `current_min..=current_max`
    #[allow(clippy::cast_precision_loss)]
    pub fn new(current_min: u8, current_max: u8, duration_ticks: u64) -> Self {
        let span = f32::from(current_max.saturating_sub(current_min)) + 1.0;
        let alpha = if duration_ticks == 0 {
            0.0
        } else {
            libm::logf(span) / duration_ticks as f32
        };
        Self {
            current_min,
            current_max,
            duration_ticks,
            alpha,
        }
    }

    pub const fn current_min(&self) -> u8 {
        self.current_min
    }

    pub const fn current_max(&self) -> u8 {
        self.current_max
    }

    pub const fn duration_ticks(&self) -> u64 {
        self.duration_ticks
    }

    pub const fn alpha(&self) -> f32 {
        self.alpha
    }

    /// Interpolate a current between `begin` and `end`.
    ///
    /// Both endpoints are mapped into log space relative to `current_min`,
    /// interpolated linearly there and mapped back. Begin values below the
    /// floor snap to the floor; targets below it are clamped to it.
    #[allow(clippy::cast_precision_loss)]
    pub fn interpolate(&self, begin: u8, end: u8, elapsed: u64, duration: u64) -> u8 {
        if begin < self.current_min {
            return self.current_min;
        }
        let end = end.max(self.current_min);
        if duration == 0 || begin == end {
            return begin;
        }
        if self.alpha <= 0.0 {
            // Degenerate span, fall back to a straight ramp
            return interpolate_u8(begin, end, elapsed, duration);
        }

        let floor = f32::from(self.current_min);
        let x1 = libm::logf(f32::from(begin) - floor + 1.0) / self.alpha;
        let x2 = libm::logf(f32::from(end) - floor + 1.0) / self.alpha;
        let x = x1 + (x2 - x1) * elapsed as f32 / duration as f32;

        round_to_u8(libm::expf(self.alpha * x) + floor - 1.0)
    }
}

/// Exponential coefficients for the red, green and blue currents
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExpCurrentCoefs([ExpCurrentCoef; 3]);

impl ExpCurrentCoefs {
    /// Derive the per-channel coefficients from the lowest and highest
    /// currents the controller will ever drive.
    pub fn from_bounds(min: Currents, max: Currents, duration_ticks: u64) -> Self {
        Self([
            ExpCurrentCoef::new(min.r, max.r, duration_ticks),
            ExpCurrentCoef::new(min.g, max.g, duration_ticks),
            ExpCurrentCoef::new(min.b, max.b, duration_ticks),
        ])
    }

    pub const fn channel(&self, index: usize) -> &ExpCurrentCoef {
        &self.0[index]
    }

    /// Interpolate all three currents
    pub fn interpolate(&self, begin: Currents, end: Currents, elapsed: u64, duration: u64) -> Currents {
        zip_channels(begin, end, |index, begin, end| {
            self.0[index].interpolate(begin, end, elapsed, duration)
        })
    }
}
