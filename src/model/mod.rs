//! Model definitions for the two Bayesian stages.
//!
//! - [`bea`]: per-ash-bed eruption-age model (latent eruption age plus
//!   exponentially distributed per-grain excess ages)
//! - [`bad`]: age-depth model over tie points (ordered latent depths, base
//!   age, log-normal segment sedimentation rates)
//! - [`interpolate`]: deterministic piecewise age interpolation applied to
//!   each posterior draw

pub mod bad;
pub mod bea;
pub mod interpolate;

pub use bad::{fit_bad, BadFit, TieAgeSummary};
pub use bea::fit_bea;

/// Log density of `Normal(mu, sigma)` at `x`, dropping the `-ln(2*pi)/2`
/// constant (irrelevant for MCMC).
pub(crate) fn normal_log_pdf(x: f64, mu: f64, sigma: f64) -> f64 {
    let z = (x - mu) / sigma;
    -0.5 * z * z - sigma.ln()
}

/// Numerically stable `ln(1 + e^x)`.
pub(crate) fn softplus(x: f64) -> f64 {
    if x > 30.0 {
        x
    } else if x < -30.0 {
        x.exp()
    } else {
        x.exp().ln_1p()
    }
}
