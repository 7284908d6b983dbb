//! Gaussian kernel density estimation.
//!
//! Used to turn the bootstrapped-minimum sample into a continuous prior
//! density for the eruption age. Bandwidth follows Scott's rule,
//! `h = sigma_hat * n^(-1/5)`, the same default as the reference
//! implementation's KDE.

use std::f64::consts::PI;

use crate::statistics::{mean, std_dev};

/// A fitted one-dimensional Gaussian KDE.
#[derive(Debug, Clone)]
pub struct GaussianKde {
    points: Vec<f64>,
    bandwidth: f64,
}

impl GaussianKde {
    /// Fit a KDE with Scott's-rule bandwidth.
    ///
    /// Degenerate samples (fewer than 2 points, or zero spread) get a small
    /// positive bandwidth floor so the density stays proper.
    pub fn fit(sample: &[f64]) -> Self {
        let n = sample.len().max(1) as f64;
        let sd = if sample.len() >= 2 { std_dev(sample) } else { 0.0 };
        let scale = if sd > 0.0 {
            sd
        } else {
            // Zero-spread fallback keeps the kernel width meaningful
            // relative to the sample location.
            (mean(sample).abs() * 1e-3).max(1e-6)
        };
        Self {
            points: sample.to_vec(),
            bandwidth: scale * n.powf(-0.2),
        }
    }

    /// Kernel bandwidth in data units.
    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Evaluate the density at `x`.
    pub fn density(&self, x: f64) -> f64 {
        let h = self.bandwidth;
        let norm = 1.0 / (self.points.len() as f64 * h * (2.0 * PI).sqrt());
        self.points
            .iter()
            .map(|p| {
                let z = (x - p) / h;
                (-0.5 * z * z).exp()
            })
            .sum::<f64>()
            * norm
    }

    /// Evaluate the density at every point of `grid`.
    pub fn density_on_grid(&self, grid: &[f64]) -> Vec<f64> {
        grid.iter().map(|&x| self.density(x)).collect()
    }
}
