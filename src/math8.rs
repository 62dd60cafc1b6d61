/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0), rounding to nearest
///
/// Unlike a shift-based scale this maps `scale == 255` to the identity and
/// `value == 0` to zero for every scale.
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn scale8_rounded(value: u8, scale: u8) -> u8 {
    ((value as u16 * scale as u16 + 127) / 255) as u8
}

/// Scale an 8-bit value by a factor (0-255 = 0.0-1.0), rounding down
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn scale8_truncated(value: u8, scale: u8) -> u8 {
    (value as u16 * scale as u16 / 255) as u8
}

/// Map an 8-bit level (0-255) to the nearest whole percent (0-100)
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn level_to_percent(level: u8) -> u8 {
    let percent = (level as u16 * 100 + 127) / 255;
    if percent > 100 { 100 } else { percent as u8 }
}

/// Round a non-negative float into the 0-255 range
#[inline]
#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
pub fn round_to_u8(value: f32) -> u8 {
    if value.is_nan() {
        return 0;
    }
    libm::roundf(value).clamp(0.0, 255.0) as u8
}
