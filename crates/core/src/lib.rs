//! # Confluence Core
//!
//! Core types, traits and I/O for watershed-code stream analysis.
//!
//! This crate provides:
//! - `StreamSegment`: validated stream segment from the nearby-stream search
//! - `StreamRecord`: raw search record and its all-or-nothing ingestion
//! - `FeatureCollection`: highlight output, convertible to GeoJSON
//! - `StreamSearch`: the search collaborator interface
//! - Algorithm trait for consistent API
//! - JSON I/O for stream records

pub mod error;
pub mod io;
pub mod search;
pub mod segment;
pub mod vector;

pub use error::{Error, Result};
pub use search::{StreamSearch, DEFAULT_SEARCH_RADIUS};
pub use segment::{ingest, SegmentId, StreamRecord, StreamSegment};
pub use vector::{AttributeValue, Feature, FeatureCollection};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::error::{Error, Result};
    pub use crate::search::StreamSearch;
    pub use crate::segment::{SegmentId, StreamRecord, StreamSegment};
    pub use crate::vector::{Feature, FeatureCollection};
    pub use crate::Algorithm;
}

/// Core trait for stream-network algorithms.
///
/// Algorithms are pure functions that transform input data according to parameters.
pub trait Algorithm {
    /// Input type for the algorithm
    type Input;
    /// Output type for the algorithm
    type Output;
    /// Parameters controlling algorithm behavior
    type Params: Default;
    /// Error type for algorithm execution
    type Error: std::error::Error;

    /// Returns the algorithm name
    fn name(&self) -> &'static str;

    /// Returns a description of what the algorithm does
    fn description(&self) -> &'static str;

    /// Execute the algorithm
    fn execute(
        &self,
        input: Self::Input,
        params: Self::Params,
    ) -> std::result::Result<Self::Output, Self::Error>;

    /// Execute with default parameters
    fn execute_default(
        &self,
        input: Self::Input,
    ) -> std::result::Result<Self::Output, Self::Error> {
        self.execute(input, Self::Params::default())
    }
}
