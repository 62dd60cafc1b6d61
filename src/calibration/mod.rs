//! Brightness calibration.
//!
//! Converts a `{brightness, color}` request into the driver chip's per-channel
//! current and PWM settings using a 101-row lookup table (one row per percent).

mod table;

pub use table::DEFAULT_CALIBRATION;

use crate::color::{Currents, Rgb, rgb_from_array, zip_channels};
use crate::led::LedOutput;
use crate::math8::{level_to_percent, scale8_rounded};

/// Number of rows in a calibration table (0-100 percent inclusive)
pub const CALIBRATION_ROWS: usize = 101;

/// One row of the calibration curve
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CalibrationRow {
    /// Base driver currents for this brightness level
    pub currents: Currents,
    /// PWM dimming coefficient per channel (0-255)
    pub pwm_dim: Rgb,
}

impl CalibrationRow {
    pub const fn from_arrays(currents: [u8; 3], pwm_dim: [u8; 3]) -> Self {
        Self {
            currents: rgb_from_array(currents),
            pwm_dim: rgb_from_array(pwm_dim),
        }
    }
}

/// Immutable brightness calibration table
#[derive(Debug, Clone)]
pub struct CalibrationTable {
    rows: [CalibrationRow; CALIBRATION_ROWS],
}

impl CalibrationTable {
    pub const fn new(rows: [CalibrationRow; CALIBRATION_ROWS]) -> Self {
        Self { rows }
    }

    /// Row used for an 8-bit brightness level
    pub const fn row_for(&self, brightness: u8) -> &CalibrationRow {
        &self.rows[level_to_percent(brightness) as usize]
    }

    pub const fn rows(&self) -> &[CalibrationRow; CALIBRATION_ROWS] {
        &self.rows
    }

    /// Map a color at a given brightness to driver currents and PWMs.
    ///
    /// Pure lookup: currents come straight from the brightness row, each PWM is
    /// the input color channel scaled by that row's dimming coefficient.
    pub fn brightness_to_currents_and_pwms(&self, color: Rgb, brightness: u8) -> LedOutput {
        let row = self.row_for(brightness);
        LedOutput {
            currents: row.currents,
            pwms: zip_channels(color, row.pwm_dim, |_, value, dim| {
                scale8_rounded(value, dim)
            }),
        }
    }
}
