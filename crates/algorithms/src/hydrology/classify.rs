//! Upstream / downstream classification by watershed code
//!
//! Partitions a set of stream segments relative to a selected code:
//! - selected: same normalized code (several geometry rows may share one)
//! - upstream: the selected code is a proper ancestor of the segment's code
//! - downstream: the segment's code is a proper ancestor of the selected code
//!
//! Everything else (side tributaries, segments without a usable code) is
//! unrelated and dropped. The downstream bucket over-includes: it holds the
//! whole ancestor reaches, including parts above each confluence. See
//! [`clean_downstream`](super::clean_downstream).

use confluence_core::segment::StreamSegment;
use confluence_core::{Algorithm, Error, Result};
use tracing::{debug, warn};

use super::watershed_code::{depth, is_downstream_of, is_upstream_of, same_reach};

/// Parameters for classification
#[derive(Debug, Clone, Default)]
pub struct ClassifyParams {
    /// Watershed code of the selected segment. Padding is ignored.
    pub selected_code: String,
}

/// Segments partitioned relative to a selected code, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub selected: Vec<StreamSegment>,
    pub upstream: Vec<StreamSegment>,
    pub downstream: Vec<StreamSegment>,
}

impl Classification {
    /// Number of classified segments across all buckets
    pub fn len(&self) -> usize {
        self.selected.len() + self.upstream.len() + self.downstream.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Watershed code classification algorithm
#[derive(Debug, Clone, Default)]
pub struct SegmentClassifier;

impl Algorithm for SegmentClassifier {
    type Input = Vec<StreamSegment>;
    type Output = Classification;
    type Params = ClassifyParams;
    type Error = Error;

    fn name(&self) -> &'static str {
        "SegmentClassifier"
    }

    fn description(&self) -> &'static str {
        "Partition stream segments into selected, upstream and downstream by watershed code"
    }

    fn execute(&self, input: Self::Input, params: Self::Params) -> Result<Self::Output> {
        Ok(classify(&params.selected_code, &input))
    }
}

/// Classify `segments` relative to `selected_code`.
///
/// Total over arbitrary input: segments with missing or malformed codes are
/// skipped, and a malformed selected code yields an empty classification.
/// Buckets are disjoint and preserve input order.
pub fn classify(selected_code: &str, segments: &[StreamSegment]) -> Classification {
    let mut out = Classification::default();

    if depth(selected_code) == 0 {
        warn!("selected watershed code {:?} is malformed; nothing classified", selected_code);
        return out;
    }

    let mut uncoded = 0usize;
    for seg in segments {
        let code = match seg.watershed_code() {
            Some(code) if depth(code) > 0 => code,
            _ => {
                uncoded += 1;
                continue;
            }
        };

        if same_reach(code, selected_code) {
            out.selected.push(seg.clone());
        } else if is_upstream_of(code, selected_code) {
            out.upstream.push(seg.clone());
        } else if is_downstream_of(code, selected_code) {
            out.downstream.push(seg.clone());
        }
    }

    if uncoded > 0 {
        warn!("{} segments without a usable watershed code left unclassified", uncoded);
    }
    debug!(
        "classified against {}: {} selected, {} upstream, {} downstream of {} segments",
        selected_code,
        out.selected.len(),
        out.upstream.len(),
        out.downstream.len(),
        segments.len()
    );

    out
}
