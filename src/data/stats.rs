use super::model::{BandSummary, SampleTable};

// ---------------------------------------------------------------------------
// Descriptive statistics
// ---------------------------------------------------------------------------

/// Percentiles reported for every band, as fractions.
pub const PERCENTILES: [f64; 4] = [0.25, 0.50, 0.75, 0.95];

/// One summary per distinct wavelength, ascending by wavelength.
pub fn summarize(table: &SampleTable) -> Vec<BandSummary> {
    table
        .groups()
        .into_iter()
        .map(|(wl, values)| describe(wl, &values))
        .collect()
}

/// Count, mean, sample std, min, quartiles, 95th percentile and max.
///
/// NaN samples are skipped. A band without any other samples has a count of
/// zero and no statistics.
pub fn describe(wavelength: f64, values: &[f32]) -> BandSummary {
    let mut sorted = without_nan(values);
    sorted.sort_by(f64::total_cmp);

    let count = sorted.len();
    if count == 0 {
        return BandSummary {
            wavelength,
            count,
            mean: None,
            std: None,
            min: None,
            p25: None,
            p50: None,
            p75: None,
            p95: None,
            max: None,
        };
    }
    let mean = sorted.iter().sum::<f64>() / count as f64;

    BandSummary {
        wavelength,
        count,
        mean: Some(mean),
        std: sample_std(&sorted, mean),
        min: sorted.first().copied(),
        p25: Some(percentile(&sorted, PERCENTILES[0])),
        p50: Some(percentile(&sorted, PERCENTILES[1])),
        p75: Some(percentile(&sorted, PERCENTILES[2])),
        p95: Some(percentile(&sorted, PERCENTILES[3])),
        max: sorted.last().copied(),
    }
}

/// Samples widened to `f64`, NaN (no-data) samples dropped.
pub fn without_nan(values: &[f32]) -> Vec<f64> {
    values
        .iter()
        .filter(|v| !v.is_nan())
        .map(|&v| v as f64)
        .collect()
}

/// Standard deviation with `n - 1` in the denominator.
pub fn sample_std(values: &[f64], mean: f64) -> Option<f64> {
    if values.len() < 2 {
        return None;
    }
    let ss: f64 = values.iter().map(|v| (v - mean).powi(2)).sum();
    Some((ss / (values.len() - 1) as f64).sqrt())
}

/// Percentile of sorted, non-empty data, linearly interpolated between
/// closest ranks.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

// ---------------------------------------------------------------------------
// Histogram
// ---------------------------------------------------------------------------

/// Fixed-width bins over `[lower, upper]`, the last bin closed.
#[derive(Debug, Clone, PartialEq)]
pub struct Histogram {
    pub edges: Vec<f64>,
    pub counts: Vec<usize>,
}

impl Histogram {
    /// Bin `values` into `bins` equal-width bins. Values outside the range
    /// are dropped. A degenerate range is widened by 0.5 on each side.
    pub fn new(
        values: impl IntoIterator<Item = f32>,
        bins: usize,
        lower: f64,
        upper: f64,
    ) -> Self {
        let (lower, upper) = if upper > lower {
            (lower, upper)
        } else {
            (lower - 0.5, upper + 0.5)
        };
        let width = (upper - lower) / bins as f64;
        let edges = (0..=bins).map(|i| lower + width * i as f64).collect();

        let mut counts = vec![0usize; bins];
        for v in values {
            let v = v as f64;
            if !(lower..=upper).contains(&v) {
                continue;
            }
            let bin = (((v - lower) / width) as usize).min(bins - 1);
            counts[bin] += 1;
        }
        Self { edges, counts }
    }

    /// Bin centres.
    pub fn centers(&self) -> Vec<f64> {
        self.edges.windows(2).map(|w| (w[0] + w[1]) / 2.0).collect()
    }

    /// Bin counts as a percentage of all binned values.
    pub fn percentages(&self) -> Vec<f64> {
        let total: usize = self.counts.iter().sum();
        if total == 0 {
            return vec![0.0; self.counts.len()];
        }
        self.counts
            .iter()
            .map(|&c| 100.0 * c as f64 / total as f64)
            .collect()
    }
}

// ---------------------------------------------------------------------------
// Kernel density estimate
// ---------------------------------------------------------------------------

/// Gaussian KDE sampled on an evenly spaced grid.
#[derive(Debug, Clone, PartialEq)]
pub struct Density {
    pub support: Vec<f64>,
    pub density: Vec<f64>,
}

/// Gaussian KDE with Scott's bandwidth (`n^(-1/5) * std`), evaluated at
/// `gridsize` points from `min - cut * bw` to `max + cut * bw`.
///
/// NaN samples are skipped. Returns `None` when the remaining values have no
/// spread (fewer than two values or all equal).
pub fn kde(values: &[f32], gridsize: usize, cut: f64) -> Option<Density> {
    let data = without_nan(values);
    let n = data.len() as f64;
    let mean = data.iter().sum::<f64>() / n;
    let std = sample_std(&data, mean).filter(|s| *s > 0.0)?;
    let bw = n.powf(-0.2) * std;

    let min = data.iter().copied().fold(f64::INFINITY, f64::min);
    let max = data.iter().copied().fold(f64::NEG_INFINITY, f64::max);
    let (lo, hi) = (min - cut * bw, max + cut * bw);
    let step = (hi - lo) / (gridsize.max(2) - 1) as f64;

    let norm = 1.0 / (n * bw * (2.0 * std::f64::consts::PI).sqrt());
    let support: Vec<f64> = (0..gridsize).map(|i| lo + step * i as f64).collect();
    let density = support
        .iter()
        .map(|&x| {
            data.iter()
                .map(|&xi| (-0.5 * ((x - xi) / bw).powi(2)).exp())
                .sum::<f64>()
                * norm
        })
        .collect();

    Some(Density { support, density })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::{ImageCube, WavelengthIndex};
    use crate::data::reshape::reshape;
    use ndarray::Array3;

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn describe_matches_hand_computed_values() {
        let s = describe(500.0, &[4.0, 1.0, 3.0, 2.0]);
        assert_eq!(s.count, 4);
        assert_close(s.mean.unwrap(), 2.5);
        assert_close(s.std.unwrap(), (5.0f64 / 3.0).sqrt());
        assert_close(s.min.unwrap(), 1.0);
        assert_close(s.p25.unwrap(), 1.75);
        assert_close(s.p50.unwrap(), 2.5);
        assert_close(s.p75.unwrap(), 3.25);
        assert_close(s.p95.unwrap(), 3.85);
        assert_close(s.max.unwrap(), 4.0);
    }

    #[test]
    fn describe_skips_nan_samples() {
        let s = describe(500.0, &[1.0, f32::NAN, 3.0]);
        assert_eq!(s.count, 2);
        assert_close(s.mean.unwrap(), 2.0);
        assert_close(s.std.unwrap(), 2.0f64.sqrt());
        assert_close(s.min.unwrap(), 1.0);
        assert_close(s.p50.unwrap(), 2.0);
        assert_close(s.p75.unwrap(), 2.5);
        assert_close(s.p95.unwrap(), 2.9);
        assert_close(s.max.unwrap(), 3.0);
    }

    #[test]
    fn all_nan_band_has_no_statistics() {
        let s = describe(500.0, &[f32::NAN, f32::NAN]);
        assert_eq!(s.count, 0);
        assert_eq!(s.mean, None);
        assert_eq!(s.std, None);
        assert_eq!(s.min, None);
        assert_eq!(s.p95, None);
        assert_eq!(s.max, None);
    }

    #[test]
    fn single_value_has_no_std() {
        let s = describe(500.0, &[7.0]);
        assert_eq!(s.count, 1);
        assert_eq!(s.std, None);
        assert_close(s.p95.unwrap(), 7.0);
    }

    #[test]
    fn synthetic_cube_summary() {
        // 2x2 pixels, bands labelled 0 / 500 / 600
        let band_values: [[f32; 4]; 3] = [
            [1.0, 2.0, 3.0, 4.0],
            [10.0, 20.0, 30.0, 40.0],
            [5.0, 5.0, 5.0, 9.0],
        ];
        let data = Array3::from_shape_fn((2, 2, 3), |(r, c, b)| band_values[b][r * 2 + c]);
        let cube = ImageCube::new(data, "synthetic");
        let index = WavelengthIndex::new(vec![0.0, 500.0, 600.0]);

        let rows = summarize(&reshape(&cube, &index));
        assert_eq!(rows.len(), 3);

        assert_eq!(rows[0].wavelength, 0.0);
        assert_close(rows[0].mean.unwrap(), 2.5);
        assert_close(rows[0].min.unwrap(), 1.0);
        assert_close(rows[0].max.unwrap(), 4.0);

        assert_eq!(rows[1].wavelength, 500.0);
        assert_close(rows[1].mean.unwrap(), 25.0);
        assert_close(rows[1].min.unwrap(), 10.0);
        assert_close(rows[1].max.unwrap(), 40.0);

        assert_eq!(rows[2].wavelength, 600.0);
        assert_close(rows[2].mean.unwrap(), 6.0);
        assert_close(rows[2].min.unwrap(), 5.0);
        assert_close(rows[2].max.unwrap(), 9.0);
        assert!(rows.iter().all(|r| r.count == 4));
    }

    #[test]
    fn histogram_closes_last_bin() {
        let h = Histogram::new([0.0, 0.5, 1.0, 1.0, 2.0], 2, 0.0, 2.0);
        assert_eq!(h.counts, vec![2, 3]);
        assert_eq!(h.edges, vec![0.0, 1.0, 2.0]);
        assert_eq!(h.centers(), vec![0.5, 1.5]);
        assert_eq!(h.percentages(), vec![40.0, 60.0]);
    }

    #[test]
    fn histogram_widens_degenerate_range() {
        let h = Histogram::new([3.0, 3.0], 50, 3.0, 3.0);
        assert_eq!(h.counts.len(), 50);
        assert_eq!(h.counts.iter().sum::<usize>(), 2);
        assert_close(h.edges[0], 2.5);
        assert_close(h.edges[50], 3.5);
    }

    #[test]
    fn kde_grid_extends_past_data() {
        let values = [1.0, 2.0, 3.0, 4.0, 5.0];
        let d = kde(&values, 20, 2.0).unwrap();
        assert_eq!(d.support.len(), 20);
        assert_eq!(d.density.len(), 20);
        assert!(d.support[0] < 1.0);
        assert!(d.support[19] > 5.0);
        assert!(d.density.iter().all(|&v| v > 0.0));

        // Integrates to roughly one.
        let step = d.support[1] - d.support[0];
        let area: f64 = d.density.iter().sum::<f64>() * step;
        assert!((area - 1.0).abs() < 0.1, "area {area}");
    }

    #[test]
    fn kde_ignores_nan_samples() {
        let clean = kde(&[1.0, 2.0, 4.0], 20, 2.0).unwrap();
        let with_nan = kde(&[1.0, f32::NAN, 2.0, 4.0, f32::NAN], 20, 2.0).unwrap();
        assert_eq!(clean, with_nan);
        assert!(kde(&[f32::NAN, 5.0], 20, 2.0).is_none());
    }

    #[test]
    fn kde_of_constant_values_is_none() {
        assert!(kde(&[2.0, 2.0, 2.0], 20, 2.0).is_none());
        assert!(kde(&[2.0], 20, 2.0).is_none());
    }
}
