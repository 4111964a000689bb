//! Intensity histograms and Otsu thresholding.

/// 256-bin intensity histogram.
#[derive(Clone, Debug)]
pub struct Histogram {
    pub bins: [u32; 256],
}

impl Default for Histogram {
    fn default() -> Self {
        Self { bins: [0; 256] }
    }
}

impl Histogram {
    pub fn from_samples<'a>(samples: impl IntoIterator<Item = &'a u8>) -> Self {
        let mut hist = Self::default();
        for &v in samples {
            hist.add(v);
        }
        hist
    }

    #[inline]
    pub fn add(&mut self, v: u8) {
        self.bins[v as usize] += 1;
    }

    pub fn total(&self) -> u64 {
        self.bins.iter().map(|&h| h as u64).sum()
    }

    /// `(min, max)` of the populated bins, `None` when empty.
    pub fn range(&self) -> Option<(u8, u8)> {
        let min = self.bins.iter().position(|&h| h > 0)?;
        let max = self.bins.iter().rposition(|&h| h > 0)?;
        Some((min as u8, max as u8))
    }
}

/// Otsu threshold: intensities `<= t` form the dark class.
///
/// Returns `None` for an empty or single-valued histogram, where no split
/// between two classes exists.
pub fn otsu_threshold(hist: &Histogram) -> Option<u8> {
    let (min_v, max_v) = hist.range()?;
    if min_v == max_v {
        return None;
    }

    let nonzero_bins = hist.bins.iter().filter(|&&h| h > 0).count();
    if nonzero_bins <= 2 {
        return Some(((min_v as u16 + max_v as u16) / 2) as u8);
    }

    let total = hist.total() as f64;
    let sum_total: f64 = hist
        .bins
        .iter()
        .enumerate()
        .map(|(i, &h)| i as f64 * h as f64)
        .sum();

    let mut sum_b = 0f64;
    let mut w_b = 0f64;
    let mut best_var = -1f64;
    let mut best_t = min_v;

    for (t, &h) in hist.bins.iter().enumerate() {
        w_b += h as f64;
        if w_b < 1.0 {
            continue;
        }
        let w_f = total - w_b;
        if w_f < 1.0 {
            break;
        }

        sum_b += t as f64 * h as f64;
        let m_b = sum_b / w_b;
        let m_f = (sum_total - sum_b) / w_f;

        let var_between = w_b * w_f * (m_b - m_f) * (m_b - m_f);
        if var_between > best_var {
            best_var = var_between;
            best_t = t as u8;
        }
    }

    Some(best_t)
}
