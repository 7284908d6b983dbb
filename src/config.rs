//! Configuration for the two-stage modeling pipeline.

use serde::{Deserialize, Serialize};

use crate::error::Error;
use crate::sampler::SamplerSettings;

/// Configuration options for the eruption-age and age-depth fits.
///
/// All fields are public; [`Config::validate`] rejects out-of-range values
/// before any model construction. Defaults mirror the reference analysis
/// setup (1 Ma outlier span, 3 cm depth uncertainty, 6000 bootstrap
/// repetitions, 2 chains at 0.9 target acceptance).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // =========================================================================
    // Eruption-age (BEA) stage
    // =========================================================================
    /// Build the eruption-age prior from bootstrapped minima (recommended).
    ///
    /// When disabled, or when an ash bed has fewer than 2 usable grains, a
    /// wide normal prior centered slightly below the minimum filtered age
    /// is used instead.
    pub bootstrap_prior: bool,

    /// Monte-Carlo repetitions for the bootstrapped-minimum prior.
    pub bootstrap_iterations: usize,

    /// Outlier filter width (Ma): grains farther than `max_span / 2` from
    /// the per-bed median age are discarded before fitting.
    pub max_span: f64,

    /// Sampler settings for each per-ash-bed eruption-age fit.
    pub bea_sampler: SamplerSettings,

    // =========================================================================
    // Age-depth (BAD) stage
    // =========================================================================
    /// Depth measurement uncertainty (m): prior sd of each latent true
    /// depth around its observed depth.
    pub depth_sigma: f64,

    /// Log-mean of the log-normal prior on segment sedimentation rates
    /// (Ma per m). Default `ln(0.05)`.
    pub sedrate_log_mu: f64,

    /// Log-sd of the log-normal prior on segment sedimentation rates.
    pub sedrate_log_sigma: f64,

    /// Sampler settings for the age-depth fit.
    pub bad_sampler: SamplerSettings,

    /// Number of evenly spaced query depths generated when the caller
    /// supplies none.
    pub default_query_points: usize,

    // =========================================================================
    // Determinism
    // =========================================================================
    /// Random seed, threaded explicitly through bootstrap simulation and
    /// every sampler chain; never ambient state.
    pub seed: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bootstrap_prior: true,
            bootstrap_iterations: 6000,
            max_span: 1.0,
            bea_sampler: SamplerSettings {
                draws: 2000,
                tune: 2000,
                chains: 2,
                target_accept: 0.9,
            },
            depth_sigma: 0.03,
            sedrate_log_mu: (0.05f64).ln(),
            sedrate_log_sigma: 1.0,
            bad_sampler: SamplerSettings {
                draws: 3000,
                tune: 3000,
                chains: 2,
                target_accept: 0.9,
            },
            default_query_points: 300,
            seed: 42,
        }
    }
}

impl Config {
    /// Reject out-of-range parameters.
    ///
    /// Called by the pipeline entry points before any model is built, so a
    /// bad configuration never reaches the sampling engine.
    pub fn validate(&self) -> Result<(), Error> {
        if !(self.max_span.is_finite() && self.max_span > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "max_span must be positive, got {}",
                self.max_span
            )));
        }
        if !(self.depth_sigma.is_finite() && self.depth_sigma > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "depth_sigma must be positive, got {}",
                self.depth_sigma
            )));
        }
        if !(self.sedrate_log_sigma.is_finite() && self.sedrate_log_sigma > 0.0) {
            return Err(Error::InvalidConfig(format!(
                "sedrate_log_sigma must be positive, got {}",
                self.sedrate_log_sigma
            )));
        }
        if !self.sedrate_log_mu.is_finite() {
            return Err(Error::InvalidConfig(
                "sedrate_log_mu must be finite".to_string(),
            ));
        }
        if self.bootstrap_prior && self.bootstrap_iterations < 2 {
            return Err(Error::InvalidConfig(format!(
                "bootstrap_iterations must be at least 2, got {}",
                self.bootstrap_iterations
            )));
        }
        if self.default_query_points < 2 {
            return Err(Error::InvalidConfig(format!(
                "default_query_points must be at least 2, got {}",
                self.default_query_points
            )));
        }
        self.bea_sampler.validate()?;
        self.bad_sampler.validate()?;
        Ok(())
    }

    /// Set the random seed.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Enable or disable the bootstrapped-minimum prior.
    pub fn with_bootstrap_prior(mut self, enabled: bool) -> Self {
        self.bootstrap_prior = enabled;
        self
    }

    /// Set the outlier filter width (Ma).
    pub fn with_max_span(mut self, max_span: f64) -> Self {
        self.max_span = max_span;
        self
    }

    /// Set the depth measurement uncertainty (m).
    pub fn with_depth_sigma(mut self, depth_sigma: f64) -> Self {
        self.depth_sigma = depth_sigma;
        self
    }
}
