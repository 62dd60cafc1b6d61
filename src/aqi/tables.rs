use crate::color::{BLACK, Currents, Rgb};

use super::{AqiBand, BAND_COUNT, ManualLevel, ManualTable};

const fn rgb(r: u8, g: u8, b: u8) -> Rgb {
    Rgb { r, g, b }
}

/// Automatic-mode color of each band, in [`AqiBand::index`] order
pub const AUTO_COLORS: [Rgb; BAND_COUNT] = [
    BLACK,
    rgb(0, 255, 90),
    rgb(30, 255, 0),
    rgb(240, 255, 0),
    rgb(255, 80, 0),
    rgb(255, 0, 0),
];

pub const NIGHT_CURRENTS: Currents = rgb(12, 2, 10);
pub const DAY_CURRENTS: Currents = rgb(35, 6, 20);
pub const BRIGHT_DAY_CURRENTS: Currents = rgb(150, 70, 255);

const fn with_fair(colors: [Rgb; BAND_COUNT], fair: Rgb) -> [Rgb; BAND_COUNT] {
    let mut colors = colors;
    colors[AqiBand::Fair.index()] = fair;
    colors
}

/// Factory manual table of a level
pub const fn default_manual_table(level: ManualLevel) -> ManualTable {
    match level {
        ManualLevel::Off => ManualTable {
            currents: NIGHT_CURRENTS,
            colors: [BLACK; BAND_COUNT],
        },
        ManualLevel::Night => ManualTable {
            currents: NIGHT_CURRENTS,
            colors: AUTO_COLORS,
        },
        ManualLevel::Day => ManualTable {
            currents: DAY_CURRENTS,
            colors: AUTO_COLORS,
        },
        ManualLevel::BrightDay => ManualTable {
            currents: BRIGHT_DAY_CURRENTS,
            colors: with_fair(AUTO_COLORS, rgb(255, 160, 0)),
        },
    }
}
