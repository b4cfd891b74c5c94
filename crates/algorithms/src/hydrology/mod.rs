//! Stream network reasoning on hierarchical watershed codes
//!
//! - Watershed codes: normalize, split and compare hierarchical codes
//! - Classify: partition segments into selected, upstream and downstream
//! - Downstream cleaning: keep only segments below each confluence
//! - Highlights: classify + clean into named feature collections

mod classify;
mod downstream;
mod highlights;
pub mod watershed_code;

pub use classify::{classify, Classification, ClassifyParams, SegmentClassifier};
pub use downstream::{clean_downstream, DownstreamFlowCleaner, DownstreamParams};
pub use highlights::{
    stream_highlights, StreamHighlights, DOWNSTREAM_LAYER, SELECTED_LAYER, UPSTREAM_LAYER,
};
pub use watershed_code::{
    ancestor_chain, depth, is_downstream_of, is_upstream_of, normalize, same_reach, segments,
};
