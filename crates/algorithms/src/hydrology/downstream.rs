//! Downstream flow cleaning
//!
//! Classification puts every segment of every ancestor reach into the
//! downstream bucket, including the parts of those reaches that lie above
//! the confluence where the selected stream joins. This walks from the
//! selected reach toward the outlet one confluence at a time and keeps only
//! the segments below each confluence.
//!
//! At each step the junction is the first candidate whose local code is
//! the current reach and whose own code is a different (parent) reach. Its
//! downstream route measure marks the confluence on the parent reach; the
//! parent's segments with a smaller measure are kept, and the walk
//! continues from the parent.
//!
//! Ties between several junction candidates go to the first in input
//! order, so the candidate list must be in a stable order.

use confluence_core::segment::StreamSegment;
use confluence_core::{Algorithm, Error, Result};
use tracing::{debug, warn};

use super::watershed_code::{depth, normalize, same_reach};

/// Parameters for downstream cleaning
#[derive(Debug, Clone, Default)]
pub struct DownstreamParams {
    /// Watershed code of the selected segment
    pub start_code: String,
}

/// Downstream flow cleaning algorithm
#[derive(Debug, Clone, Default)]
pub struct DownstreamFlowCleaner;

impl Algorithm for DownstreamFlowCleaner {
    type Input = Vec<StreamSegment>;
    type Output = Vec<StreamSegment>;
    type Params = DownstreamParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "DownstreamFlowCleaner"
    }

    fn description(&self) -> &'static str {
        "Keep only the mainstem segments below each confluence toward the outlet"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(clean_downstream(&input, &params.start_code))
    }
}

/// Find the next confluence below reach `code`: the first candidate indexed
/// against `code` that belongs to another reach. Returns it with its own
/// normalized code.
fn find_junction<'a>(
    candidates: &'a [StreamSegment],
    code: &str,
) -> Option<(&'a StreamSegment, &'a str)> {
    candidates.iter().find_map(|s| {
        let local = s.local_watershed_code()?;
        let global = s.watershed_code()?;
        if same_reach(local, code) && !same_reach(global, local) {
            Some((s, normalize(global)))
        } else {
            None
        }
    })
}

/// Walk confluences from `start_code` toward the outlet, collecting the
/// candidate segments that lie below each one.
///
/// Runs as a loop, one iteration per confluence. Every step must move to a
/// strictly shorter code; a step that does not (inconsistent codes) ends the
/// walk, so iterations are bounded by the depth of `start_code`.
///
/// Returns an empty list when no candidate is a junction for the start code.
pub fn clean_downstream(candidates: &[StreamSegment], start_code: &str) -> Vec<StreamSegment> {
    let mut result = Vec::new();
    let mut code = normalize(start_code);
    let mut code_depth = depth(code);
    if code_depth == 0 {
        warn!("start code {:?} is malformed; no downstream segments", start_code);
        return result;
    }

    let mut steps = 0usize;
    while let Some((junction, next)) = find_junction(candidates, code) {
        let next_depth = depth(next);
        if next_depth == 0 || next_depth >= code_depth {
            warn!(
                "junction {} leads from {} to {}, which is not further downstream; stopping",
                junction.id, code, next
            );
            break;
        }

        let measure = junction.downstream_route_measure;
        result.extend(
            candidates
                .iter()
                .filter(|s| {
                    s.watershed_code().is_some_and(|c| same_reach(c, next))
                        && s.downstream_route_measure < measure
                })
                .cloned(),
        );

        code = next;
        code_depth = next_depth;
        steps += 1;
    }

    debug!(
        "downstream walk from {}: {} confluences, kept {} of {} candidates",
        start_code,
        steps,
        result.len(),
        candidates.len()
    );
    result
}
