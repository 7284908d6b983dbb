//! Posterior sampling engine contract.
//!
//! The modeling stages depend on a sampler polymorphically: a model exposes
//! its unnormalized log density over an unconstrained parameter vector (all
//! transform Jacobians folded in), and any engine that can return draws
//! asymptotically representative of the posterior satisfies the contract.
//! Nothing in this crate assumes a particular sampling algorithm.
//!
//! The bundled [`MetropolisEngine`] is an adaptive Metropolis-within-Gibbs
//! sampler; a gradient-based engine (HMC/NUTS) can be substituted by
//! implementing [`PosteriorSampler`].

mod metropolis;

use serde::{Deserialize, Serialize};

use crate::error::Error;

pub use metropolis::MetropolisEngine;

/// A model the sampling engine can draw from.
///
/// Parameters live in an unconstrained space; [`constrain`] maps a draw
/// back to the natural (named) parameterization. Ordered or positive
/// parameters are handled by construction inside the model's transforms,
/// never by rejection.
///
/// [`constrain`]: LogDensityModel::constrain
pub trait LogDensityModel: Sync {
    /// Number of unconstrained parameters.
    fn dim(&self) -> usize;

    /// Names of the constrained parameters, one per dimension.
    fn parameter_names(&self) -> Vec<String>;

    /// Unnormalized log posterior density at unconstrained position `z`,
    /// including all transform Jacobians. May return `-inf` for excluded
    /// regions; must never panic on finite input.
    fn log_density(&self, z: &[f64]) -> f64;

    /// Map an unconstrained position to constrained parameter values.
    fn constrain(&self, z: &[f64]) -> Vec<f64>;

    /// Deterministic starting position in unconstrained space.
    fn initial_position(&self) -> Vec<f64>;
}

/// Settings passed through to the sampling engine.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SamplerSettings {
    /// Retained draws per chain.
    pub draws: usize,
    /// Tuning (warmup) iterations per chain, discarded.
    pub tune: usize,
    /// Number of independent chains.
    pub chains: usize,
    /// Target acceptance rate for step-size adaptation, in (0, 1).
    pub target_accept: f64,
}

impl SamplerSettings {
    /// Reject out-of-range settings.
    pub fn validate(&self) -> Result<(), Error> {
        if self.draws == 0 {
            return Err(Error::InvalidConfig("draws must be > 0".to_string()));
        }
        if self.chains == 0 {
            return Err(Error::InvalidConfig("chains must be > 0".to_string()));
        }
        if !(self.target_accept > 0.0 && self.target_accept < 1.0) {
            return Err(Error::InvalidConfig(format!(
                "target_accept must be in (0, 1), got {}",
                self.target_accept
            )));
        }
        Ok(())
    }
}

/// Posterior draws returned by a sampling engine.
///
/// Stored draw-major in constrained space; all chains contribute the same
/// number of draws and are pooled for summarization. Read-only once
/// returned. Serializable, so the age-depth posterior can be persisted as
/// an artifact by external collaborators.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PosteriorDraws {
    names: Vec<String>,
    chains: usize,
    draws_per_chain: usize,
    dim: usize,
    values: Vec<f64>,
}

impl PosteriorDraws {
    /// Assemble pooled draws from per-chain results.
    ///
    /// `values` is draw-major: `chains * draws_per_chain` rows of `dim`
    /// values each.
    pub fn new(
        names: Vec<String>,
        chains: usize,
        draws_per_chain: usize,
        values: Vec<f64>,
    ) -> Self {
        let dim = names.len();
        assert_eq!(values.len(), chains * draws_per_chain * dim);
        Self {
            names,
            chains,
            draws_per_chain,
            dim,
            values,
        }
    }

    /// Parameter names, one per column.
    pub fn names(&self) -> &[String] {
        &self.names
    }

    /// Number of chains pooled into this result.
    pub fn chains(&self) -> usize {
        self.chains
    }

    /// Draws per chain.
    pub fn draws_per_chain(&self) -> usize {
        self.draws_per_chain
    }

    /// Total pooled draw count.
    pub fn total_draws(&self) -> usize {
        self.chains * self.draws_per_chain
    }

    /// Number of parameters per draw.
    pub fn dim(&self) -> usize {
        self.dim
    }

    /// One internally consistent draw (all parameters from the same step).
    pub fn draw(&self, i: usize) -> &[f64] {
        &self.values[i * self.dim..(i + 1) * self.dim]
    }

    /// All draws of the parameter in column `j`.
    pub fn column(&self, j: usize) -> Vec<f64> {
        assert!(j < self.dim, "column {j} out of range for dim {}", self.dim);
        (0..self.total_draws())
            .map(|i| self.values[i * self.dim + j])
            .collect()
    }
}

/// A posterior sampling engine.
///
/// `Sync` so one engine can serve the parallel per-ash-bed fits.
pub trait PosteriorSampler: Sync {
    /// Draw from the model's posterior.
    ///
    /// The seed controls all engine-internal randomness; equal seeds over
    /// equal inputs must reproduce the returned draws.
    fn sample(
        &self,
        model: &dyn LogDensityModel,
        settings: &SamplerSettings,
        seed: u64,
    ) -> Result<PosteriorDraws, Error>;
}
