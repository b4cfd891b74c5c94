//! One analysis session: a point of interest and its curated stream set
//!
//! The nearby-stream search is the only call that can be in flight. Each
//! fetch gets a ticket carrying the session token current at the time;
//! choosing a new point issues a new token, and any response that arrives
//! with an older ticket is ignored. A failed or invalid response never
//! touches the existing working set.

use confluence_core::search::StreamSearch;
use confluence_core::segment::{ingest, StreamRecord};
use confluence_core::vector::FeatureCollection;
use confluence_core::{Error, Result};
use geo_types::Coord;
use tracing::{debug, warn};

use super::engine::{ApportionmentEngine, ApportionmentParams, Normalization};

/// Monotonic fetch generation within a session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SessionToken(u64);

/// A pending nearby-stream search
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FetchTicket {
    token: SessionToken,
    pub point: Coord<f64>,
    pub radius: f64,
}

impl FetchTicket {
    pub fn token(&self) -> SessionToken {
        self.token
    }
}

/// What a completed fetch did to the session
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FetchOutcome {
    /// The working set was replaced with `count` segments
    Loaded { count: usize, normalization: Normalization },
    /// The ticket was superseded; the response was discarded
    Stale,
}

#[derive(Debug, Clone, Default)]
pub struct AnalysisSession {
    engine: ApportionmentEngine,
    token: SessionToken,
    pending: Option<SessionToken>,
    point: Option<Coord<f64>>,
}

impl AnalysisSession {
    pub fn new(params: &ApportionmentParams) -> Self {
        Self {
            engine: ApportionmentEngine::new(params.weighting_factor),
            ..Self::default()
        }
    }

    pub fn engine(&self) -> &ApportionmentEngine {
        &self.engine
    }

    /// Curation access to the working set
    pub fn engine_mut(&mut self) -> &mut ApportionmentEngine {
        &mut self.engine
    }

    /// Point of interest of the loaded working set
    pub fn point_of_interest(&self) -> Option<Coord<f64>> {
        self.point
    }

    /// Start a search for `point`. Every earlier ticket becomes stale.
    pub fn begin_fetch(&mut self, point: Coord<f64>, radius: f64) -> FetchTicket {
        self.token = SessionToken(self.token.0 + 1);
        self.pending = Some(self.token);
        debug!("fetch {:?} started for ({}, {}) r={}", self.token, point.x, point.y, radius);
        FetchTicket {
            token: self.token,
            point,
            radius,
        }
    }

    /// Whether `ticket` is the one the session is waiting on
    pub fn is_current(&self, ticket: &FetchTicket) -> bool {
        self.pending == Some(ticket.token)
    }

    /// Apply the search response for `ticket`.
    ///
    /// Stale tickets are ignored. A search error or an invalid record is
    /// returned as an error and leaves the working set as it was. Otherwise
    /// the working set is replaced and recomputed.
    pub fn complete_fetch<E>(
        &mut self,
        ticket: &FetchTicket,
        response: std::result::Result<Vec<StreamRecord>, E>,
    ) -> Result<FetchOutcome>
    where
        E: Into<Error>,
    {
        if !self.is_current(ticket) {
            warn!("ignoring response for superseded fetch {:?}", ticket.token);
            return Ok(FetchOutcome::Stale);
        }
        self.pending = None;

        let records = response.map_err(Into::into)?;
        let segments = ingest(records)?;
        let count = segments.len();

        self.point = Some(ticket.point);
        let normalization = self.engine.load(segments);
        debug!("fetch {:?} loaded {} segments", ticket.token, count);
        Ok(FetchOutcome::Loaded { count, normalization })
    }

    /// Search `source` and load the result, in one step.
    pub fn fetch<S: StreamSearch>(
        &mut self,
        source: &S,
        point: Coord<f64>,
        radius: f64,
    ) -> Result<FetchOutcome> {
        let ticket = self.begin_fetch(point, radius);
        let response = source.nearby(point, radius);
        self.complete_fetch(&ticket, response)
    }

    /// Discard the working set and invalidate outstanding fetches.
    pub fn reset(&mut self) {
        self.token = SessionToken(self.token.0 + 1);
        self.pending = None;
        self.point = None;
        self.engine.clear();
    }

    /// Distance overlay from the point of interest; empty before any load
    pub fn distance_lines(&self) -> FeatureCollection {
        match self.point {
            Some(point) => self.engine.distance_lines(point),
            None => FeatureCollection::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apportionment::WeightingFactor;
    use serde_json::json;
    use std::cell::Cell;

    fn record(id: i64, code: &str, distance: f64) -> StreamRecord {
        serde_json::from_value(json!({
            "ogc_fid": id,
            "fwa_watershed_code": code,
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [1.0, 0.0]] },
            "closest_stream_point": { "type": "Point", "coordinates": [0.0, 0.0] },
            "distance": distance
        }))
        .unwrap()
    }

    fn origin() -> Coord<f64> {
        Coord { x: 0.0, y: 0.0 }
    }

    fn ids(session: &AnalysisSession) -> Vec<i64> {
        session.engine().active().iter().map(|s| s.id.0).collect()
    }

    struct FakeSearch {
        calls: Cell<usize>,
        fail: bool,
    }

    impl StreamSearch for FakeSearch {
        fn nearby(&self, _point: Coord<f64>, _radius: f64) -> Result<Vec<StreamRecord>> {
            self.calls.set(self.calls.get() + 1);
            if self.fail {
                Err(Error::Search("service unavailable".into()))
            } else {
                Ok(vec![record(1, "100", 10.0), record(2, "100-1", 20.0)])
            }
        }
    }

    #[test]
    fn test_fetch_loads_and_normalizes() {
        let mut session = AnalysisSession::new(&ApportionmentParams::default());
        let search = FakeSearch { calls: Cell::new(0), fail: false };
        let outcome = session.fetch(&search, origin(), 500.0).unwrap();

        assert!(matches!(
            outcome,
            FetchOutcome::Loaded { count: 2, normalization } if normalization.is_defined()
        ));
        assert_eq!(search.calls.get(), 1);
        assert_eq!(ids(&session), vec![1, 2]);
        assert!((session.engine().active()[0].apportionment - 80.0).abs() < 1e-9);
        assert_eq!(session.point_of_interest(), Some(origin()));
        assert_eq!(session.distance_lines().len(), 2);
    }

    #[test]
    fn test_stale_response_ignored() {
        let mut session = AnalysisSession::default();
        let first = session.begin_fetch(origin(), 100.0);
        let second = session.begin_fetch(Coord { x: 5.0, y: 5.0 }, 100.0);
        assert!(!session.is_current(&first));

        let outcome = session
            .complete_fetch::<Error>(&first, Ok(vec![record(9, "100", 1.0)]))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(session.engine().is_empty());

        session
            .complete_fetch::<Error>(&second, Ok(vec![record(3, "200", 2.0)]))
            .unwrap();
        assert_eq!(ids(&session), vec![3]);
        assert_eq!(session.point_of_interest(), Some(Coord { x: 5.0, y: 5.0 }));

        // A ticket is consumed once
        let again = session
            .complete_fetch::<Error>(&second, Ok(vec![record(4, "200", 2.0)]))
            .unwrap();
        assert_eq!(again, FetchOutcome::Stale);
        assert_eq!(ids(&session), vec![3]);
    }

    #[test]
    fn test_failure_leaves_working_set() {
        let mut session = AnalysisSession::default();
        let ok = FakeSearch { calls: Cell::new(0), fail: false };
        session.fetch(&ok, origin(), 100.0).unwrap();
        session.engine_mut().remove_overlaps();
        let before = session.engine().active().to_vec();

        let failing = FakeSearch { calls: Cell::new(0), fail: true };
        let err = session.fetch(&failing, Coord { x: 1.0, y: 1.0 }, 100.0).unwrap_err();
        assert!(matches!(err, Error::Search(_)));
        assert_eq!(session.engine().active(), &before[..]);
        assert_eq!(session.point_of_interest(), Some(origin()));
    }

    #[test]
    fn test_invalid_batch_leaves_working_set() {
        let mut session = AnalysisSession::default();
        let ticket = session.begin_fetch(origin(), 100.0);
        session
            .complete_fetch::<Error>(&ticket, Ok(vec![record(1, "100", 4.0)]))
            .unwrap();

        let ticket = session.begin_fetch(origin(), 100.0);
        let err = session
            .complete_fetch::<Error>(
                &ticket,
                Ok(vec![record(2, "100", 4.0), record(3, "100", 0.0)]),
            )
            .unwrap_err();
        assert!(matches!(err, Error::InvalidSegment { id: 3, .. }));
        assert_eq!(ids(&session), vec![1]);
    }

    #[test]
    fn test_reset() {
        let mut session = AnalysisSession::new(&ApportionmentParams {
            weighting_factor: WeightingFactor::Linear,
            ..Default::default()
        });
        let ticket = session.begin_fetch(origin(), 100.0);
        session.reset();
        let outcome = session
            .complete_fetch::<Error>(&ticket, Ok(vec![record(1, "100", 4.0)]))
            .unwrap();
        assert_eq!(outcome, FetchOutcome::Stale);
        assert!(session.engine().is_empty());
        assert!(session.distance_lines().is_empty());
        assert_eq!(session.engine().weighting_factor(), WeightingFactor::Linear);
    }
}
