//! Polyomino Packing Library
//!
//! Decides whether a multiset of polyomino pieces fits, all at once and in any
//! rotation or reflection, inside a rectangular region.

pub mod geometry;
pub mod grid;
pub mod parse;
pub mod pieces;
pub mod solver;

use log::{debug, info};
use rayon::prelude::*;

use pieces::{PieceCatalog, RegionRequest};
use solver::{Packer, RequestError, SearchOptions, Verdict};

pub use solver::fits;

/// Settings for evaluating a batch of regions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchOptions {
    pub search: SearchOptions,
    /// Search independent regions on the rayon thread pool.
    pub parallel: bool,
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self {
            search: SearchOptions::default(),
            parallel: true,
        }
    }
}

/// Per-region answer of a batch run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Answer {
    Fits,
    DoesNotFit,
    /// The step budget ran out.
    Unknown,
}

impl From<&Verdict> for Answer {
    fn from(verdict: &Verdict) -> Self {
        match verdict {
            Verdict::Fits(_) => Answer::Fits,
            Verdict::DoesNotFit(_) => Answer::DoesNotFit,
            Verdict::Unknown => Answer::Unknown,
        }
    }
}

/// Searches one region and logs how much work it took.
pub fn evaluate_region(
    catalog: &PieceCatalog,
    request: &RegionRequest,
    options: &SearchOptions,
) -> Result<Answer, RequestError> {
    let outcome = Packer::new(catalog, request)?.search(options);
    let answer = Answer::from(&outcome.verdict);
    debug!(
        "{request} -> {answer:?} ({} steps, {} backtracks)",
        outcome.stats.steps, outcome.stats.backtracks
    );
    Ok(answer)
}

/// Answers every region, in input order.
///
/// Regions share no state, so with `parallel` set each one is searched on its
/// own rayon task.
pub fn evaluate_regions(
    catalog: &PieceCatalog,
    requests: &[RegionRequest],
    options: &BatchOptions,
) -> Result<Vec<Answer>, RequestError> {
    let search = &options.search;
    if options.parallel {
        requests
            .par_iter()
            .map(|request| evaluate_region(catalog, request, search))
            .collect()
    } else {
        requests
            .iter()
            .map(|request| evaluate_region(catalog, request, search))
            .collect()
    }
}

/// Counts the regions whose requested pieces fit.
pub fn count_fitting(
    catalog: &PieceCatalog,
    requests: &[RegionRequest],
    options: &BatchOptions,
) -> Result<usize, RequestError> {
    let answers = evaluate_regions(catalog, requests, options)?;
    let fitting = answers
        .iter()
        .filter(|&&answer| answer == Answer::Fits)
        .count();
    info!("{fitting} of {} regions fit", requests.len());
    Ok(fitting)
}
