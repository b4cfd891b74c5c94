//! # Confluence Algorithms
//!
//! Stream network analysis on hierarchical watershed codes.
//!
//! ## Available Algorithm Categories
//!
//! - **hydrology**: Watershed-code comparison, upstream/downstream
//!   classification, downstream flow cleaning, highlight layers
//! - **apportionment**: Inverse-distance apportionment of nearby streams,
//!   curation, export rows and analysis sessions

pub mod apportionment;
pub mod hydrology;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::apportionment::{
        AnalysisSession, ApportionmentEngine, ApportionmentParams, ExportRow, FetchOutcome,
        Normalization, WeightingFactor,
    };
    pub use crate::hydrology::{
        classify, clean_downstream, stream_highlights, Classification, DownstreamFlowCleaner,
        SegmentClassifier, StreamHighlights,
    };
    pub use confluence_core::prelude::*;
}
