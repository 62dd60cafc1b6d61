use smart_leds::RGB8;

use crate::math8::scale8_truncated;

pub type Rgb = RGB8;

/// Per-channel driver currents (red, green, blue).
pub type Currents = Rgb;

/// Per-channel PWM duty cycles (red, green, blue).
pub type Pwms = Rgb;

pub const BLACK: Rgb = Rgb { r: 0, g: 0, b: 0 };

/// Build a color from its channel array
#[inline]
pub const fn rgb_from_array(channels: [u8; 3]) -> Rgb {
    Rgb {
        r: channels[0],
        g: channels[1],
        b: channels[2],
    }
}

/// Split a color into its channel array
#[inline]
pub const fn rgb_to_array(color: Rgb) -> [u8; 3] {
    [color.r, color.g, color.b]
}

/// Combine two colors channel by channel.
///
/// The closure receives the channel index (0 = red, 1 = green, 2 = blue)
/// so callers can look up per-channel parameters.
#[inline]
pub fn zip_channels(a: Rgb, b: Rgb, mut f: impl FnMut(usize, u8, u8) -> u8) -> Rgb {
    let a = rgb_to_array(a);
    let b = rgb_to_array(b);
    rgb_from_array([f(0, a[0], b[0]), f(1, a[1], b[1]), f(2, a[2], b[2])])
}

/// Scale every channel of `color` by `dim` (0-255), rounding down
#[inline]
pub fn scale_color(color: Rgb, dim: u8) -> Rgb {
    Rgb {
        r: scale8_truncated(color.r, dim),
        g: scale8_truncated(color.g, dim),
        b: scale8_truncated(color.b, dim),
    }
}
