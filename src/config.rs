//! Controller configuration, fixed at init.

use embassy_time::Duration;

use crate::color::Rgb;
use crate::coordinate::Coordinate;
use crate::rule::Stage;
use crate::sensor::ChannelLayout;

/// Ring length for a sampling rate and averaging window
pub const fn ring_len(measurements_per_second: usize, window_secs: usize) -> usize {
    measurements_per_second * window_secs
}

/// Luminosity measurements per second with the default configuration
pub const DEFAULT_MEASUREMENTS_PER_SECOND: u64 = 5;

/// Ring length with the default rate and a ten second window
pub const DEFAULT_RING_LEN: usize = ring_len(DEFAULT_MEASUREMENTS_PER_SECOND as usize, 10);

const BOOT_FADE_BRIGHTNESS: u8 = 100;
const BOOT_FADE_DIM: Rgb = Rgb { r: 0, g: 0, b: 10 };
const BOOT_FADE_FULL: Rgb = Rgb { r: 0, g: 0, b: 255 };

/// Blue breathing animation shown until the first air-quality reading
pub static BOOT_FADE_STAGES: [Stage; 4] = [
    Stage::new(
        Duration::from_millis(500),
        Coordinate::color(BOOT_FADE_BRIGHTNESS, BOOT_FADE_DIM),
    ),
    Stage::new(
        Duration::from_millis(100),
        Coordinate::color(BOOT_FADE_BRIGHTNESS, BOOT_FADE_FULL),
    ),
    Stage::new(
        Duration::from_millis(500),
        Coordinate::color(BOOT_FADE_BRIGHTNESS, BOOT_FADE_FULL),
    ),
    Stage::new(
        Duration::from_millis(0),
        Coordinate::color(BOOT_FADE_BRIGHTNESS, BOOT_FADE_DIM),
    ),
];

/// Luminosity sampler settings
#[derive(Debug, Clone, Copy)]
pub struct SamplerConfig {
    pub layout: ChannelLayout,
    /// Extra lead subtracted from the blanking deadline
    pub safety_margin_ticks: u64,
    /// Upper bound of timed calls per primitive during self-calibration
    pub calibration_attempts: usize,
    /// Successful timed calls averaged per primitive
    pub calibration_samples: usize,
    /// Read attempts of an unblanked measurement
    pub direct_read_retries: usize,
}

impl Default for SamplerConfig {
    fn default() -> Self {
        Self {
            layout: ChannelLayout::RGBL,
            safety_margin_ticks: 15,
            calibration_attempts: 100,
            calibration_samples: 50,
            direct_read_retries: 3,
        }
    }
}

/// Ambient light response of the automatic mode
#[derive(Debug, Clone, Copy)]
pub struct FeedbackConfig {
    /// Brightness reached in bright surroundings
    pub max_auto_brightness: u8,
    /// Readings above this are clamped before smoothing (lux)
    pub max_luminosity: f32,
    /// Weight of a new reading in the moving average
    pub ema_alpha: f32,
    /// Moving average value before the first reading (lux)
    pub initial_luminosity: f32,
    /// Time base of the exponential current coefficients
    pub exp_curve_duration: Duration,
    /// Brightness floor of the manual percentage mode
    pub percentage_min_brightness: u8,
}

impl Default for FeedbackConfig {
    fn default() -> Self {
        Self {
            max_auto_brightness: 255,
            max_luminosity: 2000.0,
            ema_alpha: 0.1,
            initial_luminosity: 200.0,
            exp_curve_duration: Duration::from_millis(1000),
            percentage_min_brightness: 10,
        }
    }
}

/// Top-level controller configuration
#[derive(Debug, Clone)]
pub struct ControllerConfig {
    /// Period of the dimming engine tick
    pub control_cycle: Duration,
    /// Period of the luminosity measurement
    pub luminosity_period: Duration,
    /// Period of the LED driver health check
    pub health_check_period: Duration,
    /// Length of fades issued by the feedback loop
    pub transition: Duration,
    /// Boot animation is retired this long after boot without air-quality data
    pub boot_fade_timeout: Duration,
    pub boot_fade: &'static [Stage],
    pub sampler: SamplerConfig,
    pub feedback: FeedbackConfig,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            control_cycle: Duration::from_millis(20),
            luminosity_period: Duration::from_millis(1000 / DEFAULT_MEASUREMENTS_PER_SECOND),
            health_check_period: Duration::from_millis(500),
            transition: Duration::from_millis(1000),
            boot_fade_timeout: Duration::from_secs(30),
            boot_fade: &BOOT_FADE_STAGES,
            sampler: SamplerConfig::default(),
            feedback: FeedbackConfig::default(),
        }
    }
}
