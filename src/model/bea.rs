//! Per-ash-bed Bayesian eruption-age (BEA) model.
//!
//! Crystallization ages overestimate the eruption age by a grain-specific
//! inheritance term, so the model is:
//!
//! ```text
//! E       ~ bootstrapped-minimum KDE prior   (or wide normal fallback)
//! tau     ~ HalfNormal(tau_scale)
//! delta_i ~ Exponential(1 / tau)             one per retained grain
//! age_i   ~ Normal(E + delta_i, sigma_i)     sigma_i fixed at the reported value
//! ```
//!
//! Unconstrained parameterization: `E` through an interval (logistic)
//! transform when the prior has bounded grid support, `tau` and each
//! `delta_i` through log transforms. All Jacobians are folded into the log
//! density.

use tracing::debug;

use crate::config::Config;
use crate::error::Error;
use crate::model::{normal_log_pdf, softplus};
use crate::prior::{bootstrap_minimum_prior, GridPrior};
use crate::sampler::{LogDensityModel, PosteriorSampler};
use crate::statistics::{filter_within_span, hdi95, mean, robust_scale, std_dev};
use crate::types::{AshBed, EruptionAgeEstimate};

/// Floor on the excess-age scale `tau_scale`, keeping the exponential rate
/// finite for near-degenerate grain sets.
const TAU_FLOOR: f64 = 0.02;

/// Floor on the fallback prior's standard deviation.
const FALLBACK_SD_FLOOR: f64 = 0.2;

/// Offset below the minimum filtered age used to center the fallback prior
/// and the initial position.
const BELOW_MIN_OFFSET: f64 = 0.05;

/// Prior on the latent eruption age.
enum EruptionPrior {
    /// Empirical density from bootstrapped minima, bounded grid support.
    Grid(GridPrior),
    /// Wide normal fallback, unbounded support.
    WideNormal { mu: f64, sd: f64 },
}

/// The eruption-age model for one ash bed's retained grains.
struct BeaModel {
    prior: EruptionPrior,
    tau_scale: f64,
    ages: Vec<f64>,
    sigmas: Vec<f64>,
}

impl BeaModel {
    /// z layout: `[e_raw, ln tau, ln delta_0, .., ln delta_{n-1}]`.
    fn eruption_age(&self, e_raw: f64) -> f64 {
        match &self.prior {
            EruptionPrior::Grid(p) => {
                let s = 1.0 / (1.0 + (-e_raw).exp());
                p.lo() + (p.hi() - p.lo()) * s
            }
            EruptionPrior::WideNormal { .. } => e_raw,
        }
    }
}

impl LogDensityModel for BeaModel {
    fn dim(&self) -> usize {
        2 + self.ages.len()
    }

    fn parameter_names(&self) -> Vec<String> {
        let mut names = vec!["E".to_string(), "tau".to_string()];
        names.extend((0..self.ages.len()).map(|i| format!("delta[{i}]")));
        names
    }

    fn log_density(&self, z: &[f64]) -> f64 {
        let e = self.eruption_age(z[0]);
        let mut lp = match &self.prior {
            EruptionPrior::Grid(p) => {
                // Interval-transform Jacobian: ln(hi-lo) + ln s + ln(1-s).
                let jac = (p.hi() - p.lo()).ln() - softplus(-z[0]) - softplus(z[0]);
                p.log_density(e) + jac
            }
            EruptionPrior::WideNormal { mu, sd } => normal_log_pdf(e, *mu, *sd),
        };

        // tau ~ HalfNormal(tau_scale), log-transformed.
        let tau = z[1].exp();
        lp += -0.5 * (tau / self.tau_scale).powi(2) + z[1];

        // delta_i ~ Exponential(1/tau), log-transformed.
        let rate = 1.0 / tau;
        for (i, (&age, &sigma)) in self.ages.iter().zip(self.sigmas.iter()).enumerate() {
            let ld = z[2 + i];
            let delta = ld.exp();
            lp += rate.ln() - rate * delta + ld;
            lp += normal_log_pdf(age, e + delta, sigma);
        }
        lp
    }

    fn constrain(&self, z: &[f64]) -> Vec<f64> {
        let mut out = Vec::with_capacity(self.dim());
        out.push(self.eruption_age(z[0]));
        out.push(z[1].exp());
        out.extend(z[2..].iter().map(|ld| ld.exp()));
        out
    }

    fn initial_position(&self) -> Vec<f64> {
        let min_age = self.ages.iter().fold(f64::INFINITY, |m, &a| m.min(a));
        let e0 = min_age - BELOW_MIN_OFFSET;
        let z0 = match &self.prior {
            EruptionPrior::Grid(p) => {
                // Invert the interval transform, keeping clear of the bounds.
                let width = p.hi() - p.lo();
                let frac = ((e0 - p.lo()) / width).clamp(1e-3, 1.0 - 1e-3);
                (frac / (1.0 - frac)).ln()
            }
            EruptionPrior::WideNormal { .. } => e0,
        };
        let mut z = vec![z0, self.tau_scale.ln()];
        z.extend(self.ages.iter().map(|&a| (a - e0).max(1e-3).ln()));
        z
    }
}

/// Fit the eruption-age model for one ash bed.
///
/// Preprocessing order: discordant grains are already excluded by the
/// caller's assembly step; the span filter runs next, reverting to the
/// unfiltered set when fewer than 2 grains survive. Zero usable grains is
/// an [`Error::InsufficientData`] for this ash bed, never a silent skip.
pub fn fit_bea(
    bed: &AshBed,
    config: &Config,
    engine: &dyn PosteriorSampler,
) -> Result<EruptionAgeEstimate, Error> {
    let (ages, sigmas): (Vec<f64>, Vec<f64>) = bed
        .concordant_grains()
        .map(|g| (g.age, g.sigma))
        .unzip();
    if ages.is_empty() {
        return Err(Error::InsufficientData {
            unit: bed.ash_id.clone(),
            detail: "no usable grains after discordance filtering".to_string(),
        });
    }
    if let Some(bad) = ages
        .iter()
        .chain(sigmas.iter())
        .find(|v| !v.is_finite())
    {
        return Err(Error::InputSchema(format!(
            "non-finite grain measurement {bad} in ash bed {}",
            bed.ash_id
        )));
    }

    let (mut ages2, mut sigmas2) = filter_within_span(&ages, &sigmas, config.max_span);
    if ages2.len() < 2 {
        ages2 = ages;
        sigmas2 = sigmas;
    }
    let n_used = ages2.len();
    debug!(ash_id = %bed.ash_id, n_used, "fitting eruption age");

    let tau_scale = robust_scale(&ages2).max(TAU_FLOOR);
    let min_age = ages2.iter().fold(f64::INFINITY, |m, &a| m.min(a));

    let prior = if config.bootstrap_prior && n_used >= 2 {
        EruptionPrior::Grid(bootstrap_minimum_prior(
            &ages2,
            &sigmas2,
            config.bootstrap_iterations,
            config.seed,
        ))
    } else {
        EruptionPrior::WideNormal {
            mu: min_age - BELOW_MIN_OFFSET,
            sd: (3.0 * robust_scale(&ages2)).max(FALLBACK_SD_FLOOR),
        }
    };

    let model = BeaModel {
        prior,
        tau_scale,
        ages: ages2,
        sigmas: sigmas2,
    };
    let draws = engine.sample(&model, &config.bea_sampler, config.seed)?;

    // Column 0 holds E; the delta draws are discarded after summarization.
    let e_draws = draws.column(0);
    let (hdi_low, hdi_high) = hdi95(&e_draws);
    Ok(EruptionAgeEstimate {
        ash_id: bed.ash_id.clone(),
        mean: mean(&e_draws),
        sd: std_dev(&e_draws),
        hdi95_low: hdi_low,
        hdi95_high: hdi_high,
        n_used,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sampler::MetropolisEngine;
    use crate::types::ZirconGrain;

    fn fast_config() -> Config {
        let mut config = Config {
            bootstrap_iterations: 1000,
            ..Config::default()
        };
        config.bea_sampler.draws = 1500;
        config.bea_sampler.tune = 1500;
        config
    }

    #[test]
    fn eruption_age_tracks_youngest_cluster() {
        let bed = AshBed::new(
            "ash_a",
            10.0,
            vec![
                ZirconGrain::new(2.1, 0.05),
                ZirconGrain::new(2.05, 0.05),
                ZirconGrain::new(2.3, 0.05),
            ],
        );
        let est = fit_bea(&bed, &fast_config(), &MetropolisEngine).unwrap();
        assert_eq!(est.n_used, 3);
        assert!(
            (1.85..=2.25).contains(&est.mean),
            "posterior mean was {}",
            est.mean
        );
        assert!(est.hdi95_low <= est.mean && est.mean <= est.hdi95_high);
        assert!(est.sd > 0.0);
    }

    #[test]
    fn fallback_prior_used_when_bootstrap_disabled() {
        let bed = AshBed::new(
            "ash_b",
            20.0,
            vec![ZirconGrain::new(3.0, 0.05), ZirconGrain::new(2.95, 0.05)],
        );
        let config = fast_config().with_bootstrap_prior(false);
        let est = fit_bea(&bed, &config, &MetropolisEngine).unwrap();
        assert!(
            (2.7..=3.1).contains(&est.mean),
            "posterior mean was {}",
            est.mean
        );
    }

    #[test]
    fn single_grain_falls_back_to_wide_prior() {
        let bed = AshBed::new("ash_c", 5.0, vec![ZirconGrain::new(1.5, 0.1)]);
        let est = fit_bea(&bed, &fast_config(), &MetropolisEngine).unwrap();
        assert_eq!(est.n_used, 1);
        assert!(est.mean.is_finite());
    }

    #[test]
    fn all_discordant_grains_is_an_error() {
        let mut grain = ZirconGrain::new(2.0, 0.05);
        grain.discordant = true;
        let bed = AshBed::new("ash_d", 1.0, vec![grain]);
        let err = fit_bea(&bed, &fast_config(), &MetropolisEngine).unwrap_err();
        match err {
            Error::InsufficientData { unit, .. } => assert_eq!(unit, "ash_d"),
            other => panic!("expected InsufficientData, got {other:?}"),
        }
    }

    #[test]
    fn discordant_grain_is_excluded_from_fit() {
        let concordant = vec![
            ZirconGrain::new(2.1, 0.05),
            ZirconGrain::new(2.05, 0.05),
            ZirconGrain::new(2.15, 0.05),
        ];
        let mut with_flagged = concordant.clone();
        let mut old = ZirconGrain::new(2.4, 0.05);
        old.discordant = true;
        with_flagged.push(old);

        let config = fast_config();
        let a = fit_bea(&AshBed::new("x", 0.0, concordant), &config, &MetropolisEngine).unwrap();
        let b = fit_bea(&AshBed::new("x", 0.0, with_flagged), &config, &MetropolisEngine).unwrap();
        assert_eq!(a.n_used, b.n_used);
        assert_eq!(a.mean, b.mean);
        assert_eq!(a.sd, b.sd);
    }
}
