//! JSON-backed stream records
//!
//! Reads a JSON array of [`StreamRecord`]s, or an object with a `streams`
//! array (the nearby-stream search response shape).

use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};

use geo_types::Coord;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::search::StreamSearch;
use crate::segment::StreamRecord;

#[derive(Deserialize)]
#[serde(untagged)]
enum RecordFile {
    Bare(Vec<StreamRecord>),
    Wrapped { streams: Vec<StreamRecord> },
}

/// Read stream records from a JSON file
pub fn read_stream_records<P: AsRef<Path>>(path: P) -> Result<Vec<StreamRecord>> {
    let file = File::open(path.as_ref())?;
    let parsed: RecordFile = serde_json::from_reader(BufReader::new(file))?;
    let records = match parsed {
        RecordFile::Bare(records) => records,
        RecordFile::Wrapped { streams } => streams,
    };
    debug!("read {} stream records from {}", records.len(), path.as_ref().display());
    Ok(records)
}

/// A [`StreamSearch`] over a JSON file of precomputed records.
///
/// The file's `distance` values are taken as distances to the point of
/// interest; the point passed to [`StreamSearch::nearby`] is not used for
/// anything but logging.
#[derive(Debug, Clone)]
pub struct JsonStreamSearch {
    path: PathBuf,
}

impl JsonStreamSearch {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl StreamSearch for JsonStreamSearch {
    fn nearby(&self, point: Coord<f64>, radius: f64) -> Result<Vec<StreamRecord>> {
        if !radius.is_finite() || radius <= 0.0 {
            return Err(Error::InvalidParameter {
                name: "radius",
                value: radius.to_string(),
                reason: "must be finite and positive".into(),
            });
        }
        let records = read_stream_records(&self.path)
            .map_err(|e| Error::Search(format!("{}: {}", self.path.display(), e)))?;
        let total = records.len();
        let within: Vec<StreamRecord> = records
            .into_iter()
            .filter(|r| r.distance <= radius)
            .collect();
        debug!(
            "nearby ({:.3}, {:.3}) r={}: {} of {} records",
            point.x,
            point.y,
            radius,
            within.len(),
            total
        );
        Ok(within)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn record_json(id: i64, distance: f64) -> String {
        format!(
            r#"{{"ogc_fid": {id}, "fwa_watershed_code": "100-000000",
                "geometry": {{"type": "LineString", "coordinates": [[0, 0], [1, 0]]}},
                "closest_stream_point": {{"type": "Point", "coordinates": [0, 0]}},
                "distance": {distance}}}"#
        )
    }

    fn write_tmp(content: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_read_bare_and_wrapped() {
        let bare = write_tmp(&format!("[{}, {}]", record_json(1, 10.0), record_json(2, 20.0)));
        assert_eq!(read_stream_records(bare.path()).unwrap().len(), 2);

        let wrapped = write_tmp(&format!(
            r#"{{"weighting_factor": 2, "streams": [{}]}}"#,
            record_json(3, 5.0)
        ));
        let records = read_stream_records(wrapped.path()).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].ogc_fid, 3);
    }

    #[test]
    fn test_nearby_filters_by_radius_in_file_order() {
        let file = write_tmp(&format!(
            "[{}, {}, {}]",
            record_json(1, 300.0),
            record_json(2, 1500.0),
            record_json(3, 50.0)
        ));
        let search = JsonStreamSearch::new(file.path());
        let found = search.nearby(Coord { x: 0.0, y: 0.0 }, 1000.0).unwrap();
        let ids: Vec<i64> = found.iter().map(|r| r.ogc_fid).collect();
        assert_eq!(ids, vec![1, 3]);
    }

    #[test]
    fn test_missing_file_is_search_error() {
        let search = JsonStreamSearch::new("/nonexistent/streams.json");
        let err = search.nearby(Coord { x: 0.0, y: 0.0 }, 10.0).unwrap_err();
        assert!(matches!(err, Error::Search(_)));
    }

    #[test]
    fn test_rejects_bad_radius() {
        let search = JsonStreamSearch::new("unused.json");
        let err = search.nearby(Coord { x: 0.0, y: 0.0 }, 0.0).unwrap_err();
        assert!(matches!(err, Error::InvalidParameter { name: "radius", .. }));
    }
}
