use crate::calibration::CalibrationTable;
use crate::color::{BLACK, Currents, Pwms, Rgb, zip_channels};
use crate::led::LedOutput;
use crate::transition::{ExpCurrentCoefs, interpolate_u8};

/// A point the LED output can be driven to.
///
/// A dimming rule keeps all of its stages in one variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Coordinate {
    /// Calibrated brightness (0-255) applied to a color
    Color { brightness: u8, color: Rgb },
    /// Driver currents and PWMs written as-is
    Raw { currents: Currents, pwms: Pwms },
}

/// Which [`Coordinate`] variant a value belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CoordinateKind {
    Color,
    Raw,
}

impl Coordinate {
    pub const fn color(brightness: u8, color: Rgb) -> Self {
        Self::Color { brightness, color }
    }

    pub const fn raw(currents: Currents, pwms: Pwms) -> Self {
        Self::Raw { currents, pwms }
    }

    pub const fn kind(&self) -> CoordinateKind {
        match self {
            Self::Color { .. } => CoordinateKind::Color,
            Self::Raw { .. } => CoordinateKind::Raw,
        }
    }

    /// The dark point of the given variant
    pub const fn black(kind: CoordinateKind) -> Self {
        match kind {
            CoordinateKind::Color => Self::Color {
                brightness: 0,
                color: BLACK,
            },
            CoordinateKind::Raw => Self::Raw {
                currents: BLACK,
                pwms: BLACK,
            },
        }
    }

    /// Interpolate from `begin` towards `end` after `elapsed` of `duration` ticks.
    ///
    /// Mixed variants never occur inside a rule; if they do, `begin` is held.
    pub fn interpolate(
        begin: &Self,
        end: &Self,
        elapsed: u64,
        duration: u64,
        coefs: &ExpCurrentCoefs,
    ) -> Self {
        match (*begin, *end) {
            (
                Self::Color {
                    brightness: b0,
                    color: c0,
                },
                Self::Color {
                    brightness: b1,
                    color: c1,
                },
            ) => Self::Color {
                brightness: interpolate_u8(b0, b1, elapsed, duration),
                color: zip_channels(c0, c1, |_, a, b| interpolate_u8(a, b, elapsed, duration)),
            },
            (
                Self::Raw {
                    currents: i0,
                    pwms: p0,
                },
                Self::Raw {
                    currents: i1,
                    pwms: p1,
                },
            ) => Self::Raw {
                currents: coefs.interpolate(i0, i1, elapsed, duration),
                pwms: zip_channels(p0, p1, |_, a, b| interpolate_u8(a, b, elapsed, duration)),
            },
            _ => *begin,
        }
    }

    /// Resolve to the hardware output, going through calibration for colors
    pub fn resolve(&self, table: &CalibrationTable) -> LedOutput {
        match *self {
            Self::Color { brightness, color } => {
                table.brightness_to_currents_and_pwms(color, brightness)
            }
            Self::Raw { currents, pwms } => LedOutput { currents, pwms },
        }
    }
}
