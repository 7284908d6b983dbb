//! Two-stage pipeline: per-ash-bed eruption ages, then the age-depth model.
//!
//! The stage ordering is a hard dependency: every eruption-age fit must
//! complete and be assembled into the depth-sorted tie-point table before
//! the age-depth fit begins. Within the first stage, ash beds are mutually
//! independent and run in parallel. A failed eruption-age fit aborts the
//! run; the age-depth model's correctness depends on having every intended
//! tie point, so no partial table is ever fit.

use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::config::Config;
use crate::error::Error;
use crate::model::{fit_bad, fit_bea, TieAgeSummary};
use crate::sampler::{PosteriorDraws, PosteriorSampler};
use crate::types::{AgeDepthSummary, AshBed, EruptionAgeEstimate, TiePoint};

/// One row of the eruption-age summary table: the per-bed estimate joined
/// with its stratigraphic depth.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EruptionAgeRow {
    /// Observed depth of the ash bed (m).
    pub depth: f64,
    /// The eruption-age estimate.
    #[serde(flatten)]
    pub estimate: EruptionAgeEstimate,
}

/// Everything the pipeline produces; persistence is the caller's concern.
#[derive(Debug, Clone)]
pub struct PipelineOutput {
    /// Eruption-age summary, one row per ash bed, sorted by depth.
    pub eruption_ages: Vec<EruptionAgeRow>,
    /// Tie-point table handed to the age-depth stage, sorted by depth.
    pub tie_points: Vec<TiePoint>,
    /// Modeled ages at the tie points.
    pub tie_summary: Vec<TieAgeSummary>,
    /// Modeled ages at the query depths.
    pub query_summary: Vec<AgeDepthSummary>,
    /// Age-depth posterior draws, for downstream inspection.
    pub bad_draws: PosteriorDraws,
}

/// Evenly spaced query depths spanning the tie-point depth range.
///
/// Used when the caller supplies no query depths of their own.
pub fn default_query_grid(tie_points: &[TiePoint], n: usize) -> Vec<f64> {
    debug_assert!(n >= 2);
    let lo = tie_points.iter().map(|t| t.depth).fold(f64::INFINITY, f64::min);
    let hi = tie_points
        .iter()
        .map(|t| t.depth)
        .fold(f64::NEG_INFINITY, f64::max);
    let step = (hi - lo) / (n - 1) as f64;
    (0..n).map(|i| lo + i as f64 * step).collect()
}

/// Run the full pipeline over a set of ash beds.
///
/// `query_depths`: depths at which modeled ages are requested; `None`
/// generates the default evenly spaced grid over the tie-point depth range.
pub fn run_pipeline(
    beds: &[AshBed],
    query_depths: Option<&[f64]>,
    config: &Config,
    engine: &dyn PosteriorSampler,
) -> Result<PipelineOutput, Error> {
    config.validate()?;
    validate_beds(beds)?;

    info!(ash_beds = beds.len(), "starting eruption-age stage");
    let mut eruption_ages: Vec<EruptionAgeRow> = beds
        .par_iter()
        .map(|bed| {
            fit_bea(bed, config, engine).map(|estimate| EruptionAgeRow {
                depth: bed.depth,
                estimate,
            })
        })
        .collect::<Result<_, _>>()?;
    eruption_ages.sort_by(|a, b| a.depth.total_cmp(&b.depth));

    let tie_points: Vec<TiePoint> = eruption_ages
        .iter()
        .map(|row| TiePoint {
            depth: row.depth,
            age_mean: row.estimate.mean,
            age_sd: row.estimate.sd,
        })
        .collect();
    if tie_points.len() < 2 {
        return Err(Error::InsufficientData {
            unit: "age-depth model".to_string(),
            detail: format!("need at least 2 tie points, got {}", tie_points.len()),
        });
    }

    let grid;
    let query = match query_depths {
        Some(q) => q,
        None => {
            grid = default_query_grid(&tie_points, config.default_query_points);
            debug!(points = grid.len(), "generated default query grid");
            &grid
        }
    };

    info!(tie_points = tie_points.len(), "starting age-depth stage");
    let fit = fit_bad(&tie_points, query, config, engine)?;

    Ok(PipelineOutput {
        eruption_ages,
        tie_points,
        tie_summary: fit.tie_summary,
        query_summary: fit.query_summary,
        bad_draws: fit.draws,
    })
}

fn validate_beds(beds: &[AshBed]) -> Result<(), Error> {
    for (i, bed) in beds.iter().enumerate() {
        if !bed.depth.is_finite() {
            return Err(Error::InputSchema(format!(
                "ash bed {} has non-finite depth {}",
                bed.ash_id, bed.depth
            )));
        }
        if beds[..i].iter().any(|other| other.ash_id == bed.ash_id) {
            return Err(Error::InputSchema(format!(
                "duplicate ash bed id {}; each bed contributes at most one tie point",
                bed.ash_id
            )));
        }
    }
    Ok(())
}
