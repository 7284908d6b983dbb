//! Statistical kernels shared by both model stages.
//!
//! - Robust scale estimation and outlier filtering over grain-age sets
//! - Gaussian kernel density estimation for the empirical eruption-age prior
//! - Posterior summarization: mean/sd, quantiles, highest-density intervals

mod kde;
mod robust;
mod summary;

pub use kde::GaussianKde;
pub use robust::{filter_within_span, robust_scale};
pub use summary::{hdi95, mean, quantile, std_dev};
