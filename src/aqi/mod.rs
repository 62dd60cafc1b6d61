//! Air-quality feedback loop.
//!
//! Turns the current air-quality index, the display mode and the smoothed
//! ambient luminosity into a fade command for the dimming engine.

mod tables;

pub use tables::{
    AUTO_COLORS, BRIGHT_DAY_CURRENTS, DAY_CURRENTS, NIGHT_CURRENTS, default_manual_table,
};

use core::f32::consts::E;

use embassy_time::{Duration, Instant};

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::color::{Currents, Rgb, scale_color};
use crate::config::FeedbackConfig;
use crate::coordinate::Coordinate;
use crate::math8::round_to_u8;
use crate::pending::PendingRuleSlot;
use crate::rule::RuleError;

/// Number of air-quality bands including "no data"
pub const BAND_COUNT: usize = 6;

/// Highest value of the manual percentage mode (tenths of a percent)
pub const PERCENTAGE_MAX: u16 = 1000;

/// Percentage below which only PWM dimming is used
const PERCENTAGE_DIM_SPLIT: u16 = 250;

/// Luminosity coefficient above which brightness follows the light directly
const BRIGHT_REGIME: f32 = 0.2;
/// Luminosity coefficient above which brightness is held at the transitional level
const TRANSITIONAL_REGIME: f32 = 0.02;
const DARK_BRIGHTNESS_SHARE: f32 = 0.1;
const MIN_DARK_DIM: u8 = 20;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AqiBand {
    NoData,
    Excellent,
    Good,
    Fair,
    Poor,
    VeryPoor,
}

impl AqiBand {
    /// Classify an air-quality index (higher is better, NaN means no data)
    pub fn from_index(index: f32) -> Self {
        if index.is_nan() {
            Self::NoData
        } else if index >= 89.5 {
            Self::Excellent
        } else if index >= 79.5 {
            Self::Good
        } else if index >= 49.5 {
            Self::Fair
        } else if index >= 9.5 {
            Self::Poor
        } else {
            Self::VeryPoor
        }
    }

    pub const fn index(self) -> usize {
        match self {
            Self::NoData => 0,
            Self::Excellent => 1,
            Self::Good => 2,
            Self::Fair => 3,
            Self::Poor => 4,
            Self::VeryPoor => 5,
        }
    }

    pub const fn auto_color(self) -> Rgb {
        AUTO_COLORS[self.index()]
    }
}

/// Fixed output levels of the manual modes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ManualLevel {
    Off,
    Night,
    Day,
    BrightDay,
}

impl ManualLevel {
    pub const ALL: [Self; 4] = [Self::Off, Self::Night, Self::Day, Self::BrightDay];

    const fn index(self) -> usize {
        match self {
            Self::Off => 0,
            Self::Night => 1,
            Self::Day => 2,
            Self::BrightDay => 3,
        }
    }
}

/// Raw driver settings of a manual level
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ManualTable {
    pub currents: Currents,
    /// PWM color per band, in [`AqiBand::index`] order
    pub colors: [Rgb; BAND_COUNT],
}

impl ManualTable {
    pub const fn color_for(&self, band: AqiBand) -> Rgb {
        self.colors[band.index()]
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayMode {
    Disabled,
    Manual(ManualLevel),
    /// Fixed brightness in tenths of a percent (0-1000)
    ManualPercentage(u16),
    Auto,
}

/// Command handed to the pending rule slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FeedbackCommand {
    FadeTo(Coordinate),
    FadeToBlack,
}

impl FeedbackCommand {
    pub fn issue(self, slot: &PendingRuleSlot) -> Result<(), RuleError> {
        match self {
            Self::FadeTo(target) => slot.fade_to(target),
            Self::FadeToBlack => slot.fade_to_black(),
        }
    }
}

/// Air-quality display state.
///
/// Tracks the display mode, the current band, the smoothed luminosity with
/// its derived brightness levels, and whether the boot animation is still
/// showing. [`AqiFeedback::command`] turns that state into a fade target.
pub struct AqiFeedback {
    config: FeedbackConfig,
    tables: [ManualTable; 4],
    mode: DisplayMode,
    band: AqiBand,
    ema: f32,
    brightness: u8,
    dim: u8,
    boot: Instant,
    boot_fade_timeout: Duration,
    boot_fade_active: bool,
}

impl AqiFeedback {
    /// Start in automatic mode with no air-quality data and the boot
    /// animation showing
    pub fn new(config: FeedbackConfig, boot: Instant, boot_fade_timeout: Duration) -> Self {
        Self {
            tables: ManualLevel::ALL.map(default_manual_table),
            mode: DisplayMode::Auto,
            band: AqiBand::NoData,
            ema: config.initial_luminosity,
            brightness: config.max_auto_brightness / 2,
            dim: 128,
            boot,
            boot_fade_timeout,
            boot_fade_active: true,
            config,
        }
    }

    pub const fn mode(&self) -> DisplayMode {
        self.mode
    }

    pub fn set_mode(&mut self, mode: DisplayMode) {
        let mode = match mode {
            DisplayMode::ManualPercentage(deci) => {
                DisplayMode::ManualPercentage(deci.min(PERCENTAGE_MAX))
            }
            other => other,
        };
        #[cfg(feature = "esp32-log")]
        println!("[AqiFeedback.set_mode] {:?}", mode);
        self.mode = mode;
    }

    /// Whether measurements need the blanking protocol
    pub fn uses_blanking(&self) -> bool {
        self.mode == DisplayMode::Auto
    }

    pub const fn band(&self) -> AqiBand {
        self.band
    }

    pub const fn is_boot_fade_active(&self) -> bool {
        self.boot_fade_active
    }

    /// Record a new air-quality index.
    ///
    /// Returns `true` when this reading ends the boot animation.
    pub fn set_aqi(&mut self, index: f32, now: Instant) -> bool {
        self.band = AqiBand::from_index(index);
        if self.boot_fade_active && self.band != AqiBand::NoData {
            self.boot_fade_active = false;
            #[cfg(feature = "esp32-log")]
            println!("[AqiFeedback.set_aqi] first reading, stopping boot fade");
            return true;
        }
        self.check_boot_fade_timeout(now)
    }

    /// Returns `true` once, when the boot animation has outlived its timeout
    pub fn check_boot_fade_timeout(&mut self, now: Instant) -> bool {
        if !self.boot_fade_active {
            return false;
        }
        if now.saturating_duration_since(self.boot) <= self.boot_fade_timeout {
            return false;
        }
        self.boot_fade_active = false;
        #[cfg(feature = "esp32-log")]
        println!("[AqiFeedback.check_boot_fade_timeout] no air-quality data, stopping boot fade");
        true
    }

    /// Feed a raw luminosity reading into the moving average.
    ///
    /// NaN readings leave the average and the derived levels untouched.
    pub fn update_luminosity(&mut self, luminosity: f32) {
        if luminosity.is_nan() {
            return;
        }
        let clamped = luminosity.clamp(0.0, self.config.max_luminosity);
        let alpha = self.config.ema_alpha;
        self.ema = alpha * clamped + (1.0 - alpha) * self.ema;
        (self.brightness, self.dim) = self.levels_for(self.ema);
    }

    pub const fn smoothed_luminosity(&self) -> f32 {
        self.ema
    }

    /// Automatic brightness and PWM dim derived from the smoothed luminosity
    pub const fn auto_levels(&self) -> (u8, u8) {
        (self.brightness, self.dim)
    }

    fn levels_for(&self, luminosity: f32) -> (u8, u8) {
        let coef = (libm::logf(E + luminosity) - 1.0)
            / libm::logf(E + self.config.max_luminosity);
        let max = f32::from(self.config.max_auto_brightness);

        if coef > BRIGHT_REGIME {
            (round_to_u8(max * coef), 255)
        } else if coef > TRANSITIONAL_REGIME {
            (
                round_to_u8(max * BRIGHT_REGIME),
                round_to_u8(255.0 * coef / BRIGHT_REGIME),
            )
        } else {
            (
                round_to_u8(max * DARK_BRIGHTNESS_SHARE),
                round_to_u8(255.0 * coef / DARK_BRIGHTNESS_SHARE).max(MIN_DARK_DIM),
            )
        }
    }

    pub const fn manual_table(&self, level: ManualLevel) -> &ManualTable {
        &self.tables[level.index()]
    }

    /// Replace a manual level's table.
    ///
    /// The off level shares the night level's currents.
    pub fn set_manual_table(&mut self, level: ManualLevel, table: ManualTable) {
        self.tables[level.index()] = table;
        if level == ManualLevel::Night {
            self.tables[ManualLevel::Off.index()].currents = table.currents;
        }
    }

    pub fn reset_manual_table(&mut self, level: ManualLevel) {
        self.set_manual_table(level, default_manual_table(level));
    }

    /// Brightness and dim of the manual percentage mode
    #[allow(clippy::cast_possible_truncation)]
    pub fn percentage_levels(&self, deci: u16) -> (u8, u8) {
        let deci = u32::from(deci.min(PERCENTAGE_MAX));
        let split = u32::from(PERCENTAGE_DIM_SPLIT);
        let min = u32::from(self.config.percentage_min_brightness);
        if deci < split {
            (min as u8, ((255 * deci + split / 2) / split) as u8)
        } else {
            let span = u32::from(PERCENTAGE_MAX) - split;
            let brightness = ((deci - split) * (255 - min) + span / 2) / span + min;
            (brightness as u8, 255)
        }
    }

    /// Command for the current mode and band; `None` while the boot
    /// animation is still showing
    pub fn command(&self) -> Option<FeedbackCommand> {
        if self.boot_fade_active {
            return None;
        }
        let command = match self.mode {
            DisplayMode::Disabled => FeedbackCommand::FadeToBlack,
            DisplayMode::Manual(level) => {
                let table = self.manual_table(level);
                FeedbackCommand::FadeTo(Coordinate::raw(
                    table.currents,
                    table.color_for(self.band),
                ))
            }
            DisplayMode::ManualPercentage(deci) => {
                let (brightness, dim) = self.percentage_levels(deci);
                FeedbackCommand::FadeTo(Coordinate::color(
                    brightness,
                    scale_color(self.band.auto_color(), dim),
                ))
            }
            DisplayMode::Auto => FeedbackCommand::FadeTo(Coordinate::color(
                self.brightness,
                scale_color(self.band.auto_color(), self.dim),
            )),
        };
        Some(command)
    }

    /// Issue the current command to the pending slot.
    ///
    /// Returns whether a command was issued.
    pub fn refresh(&self, slot: &PendingRuleSlot) -> Result<bool, RuleError> {
        match self.command() {
            Some(command) => command.issue(slot).map(|()| true),
            None => Ok(false),
        }
    }
}
