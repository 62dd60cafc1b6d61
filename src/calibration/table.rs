//! Factory calibration curve for the status LED.
//!
//! Rows 1-20 keep the night currents and dim through PWM, rows 21-100 hold
//! full PWM and raise the currents geometrically towards the bright-day level.

use super::{CalibrationRow, CalibrationTable};

const fn row(currents: [u8; 3], pwm_dim: [u8; 3]) -> CalibrationRow {
    CalibrationRow::from_arrays(currents, pwm_dim)
}

/// Default calibration table, indexed by brightness percent
pub static DEFAULT_CALIBRATION: CalibrationTable = CalibrationTable::new([
    row([12, 2, 10], [0, 0, 0]),
    row([12, 2, 10], [13, 13, 13]),
    row([12, 2, 10], [26, 26, 26]),
    row([12, 2, 10], [38, 38, 38]),
    row([12, 2, 10], [51, 51, 51]),
    row([12, 2, 10], [64, 64, 64]),
    row([12, 2, 10], [76, 76, 76]),
    row([12, 2, 10], [89, 89, 89]),
    row([12, 2, 10], [102, 102, 102]),
    row([12, 2, 10], [115, 115, 115]),
    row([12, 2, 10], [128, 128, 128]),
    row([12, 2, 10], [140, 140, 140]),
    row([12, 2, 10], [153, 153, 153]),
    row([12, 2, 10], [166, 166, 166]),
    row([12, 2, 10], [178, 178, 178]),
    row([12, 2, 10], [191, 191, 191]),
    row([12, 2, 10], [204, 204, 204]),
    row([12, 2, 10], [217, 217, 217]),
    row([12, 2, 10], [230, 230, 230]),
    row([12, 2, 10], [242, 242, 242]),
    row([12, 2, 10], [255, 255, 255]),
    row([12, 2, 10], [255, 255, 255]),
    row([13, 2, 11], [255, 255, 255]),
    row([13, 2, 11], [255, 255, 255]),
    row([14, 2, 12], [255, 255, 255]),
    row([14, 2, 12], [255, 255, 255]),
    row([15, 3, 13], [255, 255, 255]),
    row([15, 3, 13], [255, 255, 255]),
    row([15, 3, 14], [255, 255, 255]),
    row([16, 3, 14], [255, 255, 255]),
    row([16, 3, 15], [255, 255, 255]),
    row([17, 3, 16], [255, 255, 255]),
    row([18, 3, 16], [255, 255, 255]),
    row([18, 4, 17], [255, 255, 255]),
    row([19, 4, 18], [255, 255, 255]),
    row([19, 4, 18], [255, 255, 255]),
    row([20, 4, 19], [255, 255, 255]),
    row([21, 4, 20], [255, 255, 255]),
    row([21, 4, 21], [255, 255, 255]),
    row([22, 5, 22], [255, 255, 255]),
    row([23, 5, 22], [255, 255, 255]),
    row([23, 5, 23], [255, 255, 255]),
    row([24, 5, 24], [255, 255, 255]),
    row([25, 6, 25], [255, 255, 255]),
    row([26, 6, 26], [255, 255, 255]),
    row([26, 6, 28], [255, 255, 255]),
    row([27, 6, 29], [255, 255, 255]),
    row([28, 7, 30], [255, 255, 255]),
    row([29, 7, 31], [255, 255, 255]),
    row([30, 7, 32], [255, 255, 255]),
    row([31, 8, 34], [255, 255, 255]),
    row([32, 8, 35], [255, 255, 255]),
    row([33, 8, 37], [255, 255, 255]),
    row([34, 9, 38], [255, 255, 255]),
    row([35, 9, 40], [255, 255, 255]),
    row([36, 9, 41], [255, 255, 255]),
    row([37, 10, 43], [255, 255, 255]),
    row([39, 10, 45], [255, 255, 255]),
    row([40, 11, 47], [255, 255, 255]),
    row([41, 11, 48], [255, 255, 255]),
    row([42, 12, 50], [255, 255, 255]),
    row([44, 12, 53], [255, 255, 255]),
    row([45, 13, 55], [255, 255, 255]),
    row([47, 14, 57], [255, 255, 255]),
    row([48, 14, 59], [255, 255, 255]),
    row([50, 15, 62], [255, 255, 255]),
    row([51, 15, 64], [255, 255, 255]),
    row([53, 16, 67], [255, 255, 255]),
    row([55, 17, 70], [255, 255, 255]),
    row([56, 18, 73], [255, 255, 255]),
    row([58, 18, 76], [255, 255, 255]),
    row([60, 19, 79], [255, 255, 255]),
    row([62, 20, 82], [255, 255, 255]),
    row([64, 21, 85], [255, 255, 255]),
    row([66, 22, 89], [255, 255, 255]),
    row([68, 23, 93], [255, 255, 255]),
    row([70, 24, 97], [255, 255, 255]),
    row([73, 25, 100], [255, 255, 255]),
    row([75, 26, 105], [255, 255, 255]),
    row([77, 28, 109], [255, 255, 255]),
    row([80, 29, 113], [255, 255, 255]),
    row([82, 30, 118], [255, 255, 255]),
    row([85, 31, 123], [255, 255, 255]),
    row([88, 33, 128], [255, 255, 255]),
    row([91, 34, 133], [255, 255, 255]),
    row([93, 36, 139], [255, 255, 255]),
    row([96, 38, 145], [255, 255, 255]),
    row([100, 39, 151], [255, 255, 255]),
    row([103, 41, 157], [255, 255, 255]),
    row([106, 43, 163], [255, 255, 255]),
    row([109, 45, 170], [255, 255, 255]),
    row([113, 47, 177], [255, 255, 255]),
    row([117, 49, 184], [255, 255, 255]),
    row([120, 51, 192], [255, 255, 255]),
    row([124, 54, 200], [255, 255, 255]),
    row([128, 56, 208], [255, 255, 255]),
    row([132, 59, 217], [255, 255, 255]),
    row([136, 61, 226], [255, 255, 255]),
    row([141, 64, 235], [255, 255, 255]),
    row([145, 67, 245], [255, 255, 255]),
    row([150, 70, 255], [255, 255, 255]),
]);
