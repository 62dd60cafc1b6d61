//! Rolling luminosity statistic with upper-outlier rejection.

/// Smallest number of valid samples needed to estimate quartiles
pub const MIN_VALID_SAMPLES: usize = 4;

/// Fixed-size ring of luminosity samples
///
/// Failed measurements are stored as NaN and ignored by the statistic.
#[derive(Debug, Clone)]
pub struct LuminosityRing<const N: usize> {
    samples: [f32; N],
    next: usize,
}

impl<const N: usize> LuminosityRing<N> {
    pub const fn new() -> Self {
        Self {
            samples: [f32::NAN; N],
            next: 0,
        }
    }

    /// Overwrite the oldest sample
    pub fn push(&mut self, value: f32) {
        if N == 0 {
            return;
        }
        self.samples[self.next] = value;
        self.next = (self.next + 1) % N;
    }

    pub fn samples(&self) -> &[f32; N] {
        &self.samples
    }

    pub fn valid_count(&self) -> usize {
        self.samples.iter().filter(|value| !value.is_nan()).count()
    }

    /// Mean of the valid samples after dropping bright outliers.
    ///
    /// NaN with fewer than four valid samples.
    pub fn robust_mean(&self) -> f32 {
        let mut sorted = [0.0_f32; N];
        let mut len = 0;
        for value in self.samples.iter().filter(|value| !value.is_nan()) {
            sorted[len] = *value;
            len += 1;
        }
        let sorted = &mut sorted[..len];
        sorted.sort_unstable_by(f32::total_cmp);
        iqr_filtered_mean(sorted)
    }
}

impl<const N: usize> Default for LuminosityRing<N> {
    fn default() -> Self {
        Self::new()
    }
}

/// Median of an ascending slice
fn median(sorted: &[f32]) -> f32 {
    let len = sorted.len();
    if len == 0 {
        return f32::NAN;
    }
    if len % 2 == 0 {
        (sorted[len / 2 - 1] + sorted[len / 2]) / 2.0
    } else {
        sorted[len / 2]
    }
}

/// Mean of the values at or below `Q3 + 1.5 * IQR`.
///
/// `sorted` must be ascending and NaN-free. Quartiles are the medians of the
/// lower and upper halves; with an odd count the middle value belongs to
/// neither half. Dark outliers are never rejected.
#[allow(clippy::cast_precision_loss)]
pub fn iqr_filtered_mean(sorted: &[f32]) -> f32 {
    let len = sorted.len();
    if len < MIN_VALID_SAMPLES {
        return f32::NAN;
    }

    let half = len / 2;
    let q1 = median(&sorted[..half]);
    let q3 = median(&sorted[len - half..]);
    let upper_bound = q3 + 1.5 * (q3 - q1);

    let (sum, count) = sorted
        .iter()
        .take_while(|value| **value <= upper_bound)
        .fold((0.0_f32, 0_usize), |(sum, count), value| (sum + value, count + 1));
    if count == 0 {
        return f32::NAN;
    }
    sum / count as f32
}
