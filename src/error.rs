//! Error taxonomy for the modeling pipeline.
//!
//! Validation errors are raised at the boundary, before any model is
//! constructed. A failed per-ash-bed fit aborts the whole run: the age-depth
//! stage requires every intended tie point, so no partial tie-point table is
//! ever produced.

use thiserror::Error;

/// Errors surfaced by the modeling pipeline.
#[derive(Debug, Error)]
pub enum Error {
    /// A supplied dataset is missing required structure (unknown ash bed
    /// references, duplicate identifiers, non-finite values).
    #[error("input schema error: {0}")]
    InputSchema(String),

    /// Fewer observations than the minimum a fit requires: zero usable
    /// grains for an eruption-age fit, or fewer than two tie points for the
    /// age-depth fit.
    #[error("insufficient data for {unit}: {detail}")]
    InsufficientData {
        /// The unit of work that could not be fit (an ash bed id, or the
        /// age-depth stage).
        unit: String,
        /// What was missing.
        detail: String,
    },

    /// The posterior sampling engine failed to produce draws.
    #[error("sampling engine error: {0}")]
    Sampler(String),

    /// A configuration parameter is outside its valid range. Rejected
    /// before any model construction.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}
