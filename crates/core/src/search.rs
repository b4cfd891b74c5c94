//! Nearby-stream search collaborator
//!
//! The search itself (spatial query, distance computation) lives outside
//! this library. Implementations return raw records; validation happens
//! when they are ingested into a session.

use geo_types::Coord;

use crate::error::Result;
use crate::segment::StreamRecord;

/// Default search radius, in CRS units (metres for the stream atlas)
pub const DEFAULT_SEARCH_RADIUS: f64 = 1000.0;

/// Finds stream segments near a point of interest.
pub trait StreamSearch {
    /// Return every stream record within `radius` of `point`.
    ///
    /// Result order is the service's order; downstream consumers that
    /// keep "the first" of several records depend on it.
    fn nearby(&self, point: Coord<f64>, radius: f64) -> Result<Vec<StreamRecord>>;
}

impl<S: StreamSearch + ?Sized> StreamSearch for &S {
    fn nearby(&self, point: Coord<f64>, radius: f64) -> Result<Vec<StreamRecord>> {
        (**self).nearby(point, radius)
    }
}
