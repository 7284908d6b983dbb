//! Piecewise-linear age interpolation over one posterior draw.
//!
//! Given a strictly increasing tie-depth vector, a base age and per-segment
//! sedimentation rates, the tie-point ages follow by cumulative summation
//! and any query depth maps to an age on (or beyond) its enclosing segment.
//! Pure functions; called once per posterior draw.

/// Tie-point ages derived from one draw:
/// `age[0] = age0`, `age[k] = age0 + sum(rates[j] * (depths[j+1] - depths[j]))`.
///
/// `rates` must have length `depths.len() - 1`.
pub fn tie_ages(depths: &[f64], age0: f64, rates: &[f64]) -> Vec<f64> {
    debug_assert_eq!(rates.len() + 1, depths.len());
    let mut ages = Vec::with_capacity(depths.len());
    ages.push(age0);
    let mut acc = age0;
    for (j, rate) in rates.iter().enumerate() {
        acc += rate * (depths[j + 1] - depths[j]);
        ages.push(acc);
    }
    ages
}

/// Interpolate (or extrapolate) ages at `query` depths for one draw.
///
/// The enclosing segment is found by a right-biased search (count of tie
/// depths less than or equal to the query, minus one), clamped to
/// `[0, K-2]`: queries outside the observed depth range use the nearest
/// boundary segment's rate instead of failing. Flagging out-of-range
/// results as extrapolated is the caller's concern.
///
/// # Panics
///
/// Panics if `depths` has fewer than 2 entries (no segment to use).
pub fn interpolate(depths: &[f64], age0: f64, rates: &[f64], query: &[f64]) -> Vec<f64> {
    assert!(depths.len() >= 2, "interpolation needs at least one segment");
    debug_assert_eq!(rates.len() + 1, depths.len());

    let ages = tie_ages(depths, age0, rates);
    let last_segment = depths.len() - 2;

    query
        .iter()
        .map(|&q| {
            let idx = depths.partition_point(|&d| d <= q);
            let seg = idx.saturating_sub(1).min(last_segment);
            ages[seg] + rates[seg] * (q - depths[seg])
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const DEPTHS: [f64; 3] = [10.0, 20.0, 35.0];
    const RATES: [f64; 2] = [0.09, 0.04];
    const AGE0: f64 = 2.0;

    #[test]
    fn tie_ages_follow_cumulative_sum() {
        let ages = tie_ages(&DEPTHS, AGE0, &RATES);
        assert_eq!(ages.len(), 3);
        assert!((ages[0] - 2.0).abs() < 1e-12);
        assert!((ages[1] - 2.9).abs() < 1e-12);
        assert!((ages[2] - 3.5).abs() < 1e-12);
    }

    #[test]
    fn query_at_tie_depth_reproduces_tie_age() {
        let ages = tie_ages(&DEPTHS, AGE0, &RATES);
        let got = interpolate(&DEPTHS, AGE0, &RATES, &DEPTHS);
        for (g, a) in got.iter().zip(ages.iter()) {
            assert!((g - a).abs() < 1e-12);
        }
    }

    #[test]
    fn interior_query_lands_on_its_segment() {
        let got = interpolate(&DEPTHS, AGE0, &RATES, &[15.0, 27.5]);
        assert!((got[0] - (2.0 + 0.09 * 5.0)).abs() < 1e-12);
        assert!((got[1] - (2.9 + 0.04 * 7.5)).abs() < 1e-12);
    }

    #[test]
    fn out_of_range_queries_extrapolate_with_boundary_rates() {
        let got = interpolate(&DEPTHS, AGE0, &RATES, &[5.0, 40.0]);
        // Below the shallowest tie: first segment's rate, signed offset.
        assert!((got[0] - (2.0 + 0.09 * -5.0)).abs() < 1e-12);
        // Beyond the deepest tie: last segment's rate.
        assert!((got[1] - (3.5 + 0.04 * 5.0)).abs() < 1e-12);
    }

    #[test]
    fn positive_rates_give_monotonic_ages() {
        let query: Vec<f64> = (0..100).map(|i| 5.0 + i as f64 * 0.4).collect();
        let ages = interpolate(&DEPTHS, AGE0, &RATES, &query);
        for pair in ages.windows(2) {
            assert!(pair[1] >= pair[0]);
        }
    }
}
