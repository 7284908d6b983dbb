//! Core data types shared across the pipeline.

use serde::{Deserialize, Serialize};

/// A single zircon grain measurement within an ash bed.
///
/// Immutable once loaded; crystallization ages are systematically older
/// than the host bed's eruption age.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ZirconGrain {
    /// Radiometric age (Ma).
    pub age: f64,
    /// Reported 1-sigma measurement uncertainty (Ma).
    pub sigma: f64,
    /// Discordance flag; flagged grains are excluded before any modeling.
    #[serde(default)]
    pub discordant: bool,
}

impl ZirconGrain {
    /// Create an unflagged grain measurement.
    pub fn new(age: f64, sigma: f64) -> Self {
        Self {
            age,
            sigma,
            discordant: false,
        }
    }
}

/// An ash bed: a stratigraphic depth plus its zircon grain set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AshBed {
    /// Ash bed identifier.
    pub ash_id: String,
    /// Stratigraphic depth (m). Observed; treated as latent-with-noise by
    /// the age-depth model.
    pub depth: f64,
    /// Grain measurements belonging to this bed.
    pub grains: Vec<ZirconGrain>,
}

impl AshBed {
    /// Create an ash bed from its grain set.
    pub fn new(ash_id: impl Into<String>, depth: f64, grains: Vec<ZirconGrain>) -> Self {
        Self {
            ash_id: ash_id.into(),
            depth,
            grains,
        }
    }

    /// Grains surviving the discordance filter.
    pub fn concordant_grains(&self) -> impl Iterator<Item = &ZirconGrain> {
        self.grains.iter().filter(|g| !g.discordant)
    }
}

/// Posterior summary of one ash bed's eruption age (BEA output).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EruptionAgeEstimate {
    /// Ash bed identifier.
    pub ash_id: String,
    /// Posterior mean of the eruption age (Ma).
    pub mean: f64,
    /// Posterior standard deviation (Ma).
    pub sd: f64,
    /// 95% highest-density interval, low end (Ma).
    pub hdi95_low: f64,
    /// 95% highest-density interval, high end (Ma).
    pub hdi95_high: f64,
    /// Number of grains retained after filtering.
    pub n_used: usize,
}

/// A tie point: the bridge artifact from BEA to BAD.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TiePoint {
    /// Observed stratigraphic depth (m).
    pub depth: f64,
    /// Eruption-age posterior mean (Ma), carried in as measurement data.
    pub age_mean: f64,
    /// Eruption-age posterior sd (Ma), carried in as measurement noise.
    pub age_sd: f64,
}

/// One output row of the age-depth model: a depth with its modeled age.
///
/// Produced both for tie points and for query depths; the interval is the
/// two-sided 95% quantile interval across posterior draws.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgeDepthSummary {
    /// Depth (m).
    pub depth: f64,
    /// Posterior mean modeled age (Ma).
    pub age_mean: f64,
    /// 2.5th percentile of the modeled age (Ma).
    pub age_q025: f64,
    /// 97.5th percentile of the modeled age (Ma).
    pub age_q975: f64,
}
