//! Posterior draw summarization: moments, quantiles, and HDIs.
//!
//! Two interval conventions are used deliberately: eruption-age posteriors
//! are summarized with a 95% highest-density interval (the narrowest
//! interval holding 95% of the mass, appropriate for the skewed posteriors
//! the minimum-age prior produces), while age-depth summaries use two-sided
//! 2.5%/97.5% quantiles.

/// Sample mean. Empty input returns NaN.
pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

/// Population standard deviation around the sample mean.
pub fn std_dev(values: &[f64]) -> f64 {
    if values.is_empty() {
        return f64::NAN;
    }
    let m = mean(values);
    (values.iter().map(|v| (v - m).powi(2)).sum::<f64>() / values.len() as f64).sqrt()
}

/// Linear-interpolation quantile at probability `p` in [0, 1].
///
/// Matches the common default (Hyndman & Fan Type 7): the quantile is
/// interpolated between order statistics at `h = (n - 1) p`.
///
/// # Panics
///
/// Panics if `values` is empty or `p` is outside [0, 1].
pub fn quantile(values: &[f64], p: f64) -> f64 {
    assert!(!values.is_empty(), "cannot compute quantile of empty slice");
    assert!((0.0..=1.0).contains(&p), "quantile probability must be in [0, 1]");

    let mut sorted = values.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    if n == 1 {
        return sorted[0];
    }
    let h = (n - 1) as f64 * p;
    let lo = h.floor() as usize;
    let hi = h.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        let w = h - lo as f64;
        sorted[lo] * (1.0 - w) + sorted[hi] * w
    }
}

/// 95% highest-density interval of a posterior sample.
///
/// Scans all contiguous windows holding 95% of the sorted draws and returns
/// the narrowest one. Returns `(low, high)`.
///
/// # Panics
///
/// Panics if `draws` is empty.
pub fn hdi95(draws: &[f64]) -> (f64, f64) {
    assert!(!draws.is_empty(), "cannot compute HDI of empty slice");

    let mut sorted = draws.to_vec();
    sorted.sort_by(|a, b| a.total_cmp(b));

    let n = sorted.len();
    let window = ((0.95 * n as f64).ceil() as usize).clamp(1, n);
    if window == n {
        return (sorted[0], sorted[n - 1]);
    }

    let mut best_lo = 0;
    let mut best_width = f64::INFINITY;
    for lo in 0..=(n - window) {
        let width = sorted[lo + window - 1] - sorted[lo];
        if width < best_width {
            best_width = width;
            best_lo = lo;
        }
    }
    (sorted[best_lo], sorted[best_lo + window - 1])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mean_and_sd_of_simple_sample() {
        let xs = [1.0, 2.0, 3.0, 4.0];
        assert!((mean(&xs) - 2.5).abs() < 1e-12);
        assert!((std_dev(&xs) - (1.25f64).sqrt()).abs() < 1e-12);
    }

    #[test]
    fn quantile_endpoints_are_min_and_max() {
        let xs = [3.0, 1.0, 2.0];
        assert_eq!(quantile(&xs, 0.0), 1.0);
        assert_eq!(quantile(&xs, 1.0), 3.0);
    }

    #[test]
    fn quantile_interpolates_between_order_statistics() {
        let xs = [0.0, 1.0];
        assert!((quantile(&xs, 0.25) - 0.25).abs() < 1e-12);
        assert!((quantile(&xs, 0.5) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn hdi_covers_bulk_of_sample() {
        // 100 tight points plus two far outliers: the HDI must hug the bulk.
        let mut xs: Vec<f64> = (0..100).map(|i| i as f64 / 100.0).collect();
        xs.push(50.0);
        xs.push(-50.0);
        let (lo, hi) = hdi95(&xs);
        assert!(lo >= -1.0);
        assert!(hi <= 2.0);
    }

    #[test]
    fn hdi_of_singleton_is_degenerate() {
        assert_eq!(hdi95(&[7.0]), (7.0, 7.0));
    }
}
