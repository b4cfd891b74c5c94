//! Stream segments returned by the nearby-stream search
//!
//! `StreamRecord` is the loose shape the search collaborator sends;
//! `StreamSegment` is the validated, typed form every algorithm works on.
//! Conversion happens once, at ingestion, and a batch is accepted
//! all-or-nothing.

use std::fmt;

use geo::{Euclidean, Length};
use geo_types::{Geometry, LineString, Point};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::vector::{AttributeValue, Feature};

/// Stable identifier of a stream segment (the search service feature id)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SegmentId(pub i64);

impl fmt::Display for SegmentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i64> for SegmentId {
    fn from(id: i64) -> Self {
        Self(id)
    }
}

/// Raw record from the nearby-stream search, before validation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamRecord {
    pub ogc_fid: i64,
    #[serde(default)]
    pub gnis_name: Option<String>,
    #[serde(default)]
    pub length_metre: Option<f64>,
    #[serde(default)]
    pub watershed_group_code: Option<String>,
    #[serde(default)]
    pub fwa_watershed_code: Option<String>,
    #[serde(default)]
    pub local_watershed_code: Option<String>,
    #[serde(default)]
    pub downstream_route_measure: Option<f64>,
    pub geometry: geojson::Geometry,
    pub closest_stream_point: geojson::Geometry,
    pub distance: f64,
}

/// A validated stream segment.
///
/// `inverse_distance` and `apportionment` are derived values owned by the
/// apportionment engine; they start at zero.
#[derive(Debug, Clone, PartialEq)]
pub struct StreamSegment {
    pub id: SegmentId,
    /// GNIS name, if the reach is named
    pub name: Option<String>,
    /// Reach length in CRS units (metres for the stream atlas)
    pub reach_length: f64,
    pub watershed_group_code: Option<String>,
    /// Dash-delimited hierarchical code. Longer codes are further upstream.
    pub watershed_code: Option<String>,
    /// Code of the reach this segment's position is indexed against
    pub local_watershed_code: Option<String>,
    /// Distance along the reach, measured from its downstream end
    pub downstream_route_measure: f64,
    pub geometry: Geometry<f64>,
    /// Nearest point on the segment to the point of interest
    pub closest_point: Point<f64>,
    /// Straight-line distance from the point of interest to `closest_point`
    pub distance: f64,
    pub inverse_distance: f64,
    /// Percentage contribution, 0 to 100
    pub apportionment: f64,
}

impl StreamSegment {
    /// Create an uncoded segment. Reach length is measured from the geometry.
    pub fn new(
        id: impl Into<SegmentId>,
        geometry: LineString<f64>,
        closest_point: Point<f64>,
        distance: f64,
    ) -> Self {
        let geometry = Geometry::LineString(geometry);
        Self {
            id: id.into(),
            name: None,
            reach_length: line_length(&geometry),
            watershed_group_code: None,
            watershed_code: None,
            local_watershed_code: None,
            downstream_route_measure: 0.0,
            geometry,
            closest_point,
            distance,
            inverse_distance: 0.0,
            apportionment: 0.0,
        }
    }

    pub fn with_watershed_code(mut self, code: impl Into<String>) -> Self {
        self.watershed_code = Some(code.into());
        self
    }

    pub fn with_local_watershed_code(mut self, code: impl Into<String>) -> Self {
        self.local_watershed_code = Some(code.into());
        self
    }

    pub fn with_downstream_route_measure(mut self, measure: f64) -> Self {
        self.downstream_route_measure = measure;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// Watershed code, with empty or blank strings treated as missing
    pub fn watershed_code(&self) -> Option<&str> {
        non_blank(self.watershed_code.as_deref())
    }

    /// Local watershed code, with empty or blank strings treated as missing
    pub fn local_watershed_code(&self) -> Option<&str> {
        non_blank(self.local_watershed_code.as_deref())
    }

    /// Render as a highlight feature carrying the stream atlas attribute names
    pub fn to_feature(&self) -> Feature {
        let mut feature = Feature::new(self.geometry.clone());
        feature.id = Some(self.id.to_string());
        if let Some(code) = self.watershed_code() {
            feature.set_property("FWA_WATERSHED_CODE", AttributeValue::String(code.to_string()));
        }
        if let Some(code) = self.local_watershed_code() {
            feature.set_property("LOCAL_WATERSHED_CODE", AttributeValue::String(code.to_string()));
        }
        feature.set_property(
            "DOWNSTREAM_ROUTE_MEASURE",
            AttributeValue::Float(self.downstream_route_measure),
        );
        if let Some(name) = &self.name {
            feature.set_property("GNIS_NAME", AttributeValue::String(name.clone()));
        }
        feature
    }
}

impl TryFrom<StreamRecord> for StreamSegment {
    type Error = Error;

    fn try_from(record: StreamRecord) -> Result<Self> {
        let id = record.ogc_fid;
        let invalid = |reason: String| Error::InvalidSegment { id, reason };

        if !record.distance.is_finite() || record.distance <= 0.0 {
            return Err(invalid(format!(
                "distance must be finite and positive, got {}",
                record.distance
            )));
        }

        let downstream_route_measure = record.downstream_route_measure.unwrap_or(0.0);
        if !downstream_route_measure.is_finite() {
            return Err(invalid("downstream route measure is not finite".into()));
        }

        let geometry = Geometry::<f64>::try_from(record.geometry.value)
            .map_err(|e| invalid(format!("unreadable geometry: {}", e)))?;
        match &geometry {
            Geometry::LineString(ls) if ls.0.len() >= 2 => {}
            Geometry::MultiLineString(mls) if mls.0.iter().any(|ls| ls.0.len() >= 2) => {}
            _ => return Err(invalid("geometry must be a line with at least two vertices".into())),
        }

        let closest_point = Point::<f64>::try_from(record.closest_stream_point.value)
            .map_err(|e| invalid(format!("unreadable closest point: {}", e)))?;

        let reach_length = match record.length_metre {
            Some(len) if len.is_finite() && len >= 0.0 => len,
            _ => line_length(&geometry),
        };

        Ok(Self {
            id: SegmentId(id),
            name: record.gnis_name.filter(|n| !n.trim().is_empty()),
            reach_length,
            watershed_group_code: record.watershed_group_code,
            watershed_code: record.fwa_watershed_code,
            local_watershed_code: record.local_watershed_code,
            downstream_route_measure,
            geometry,
            closest_point,
            distance: record.distance,
            inverse_distance: 0.0,
            apportionment: 0.0,
        })
    }
}

/// Validate a whole batch of records.
///
/// Fails on the first invalid record; nothing is returned for a bad batch.
pub fn ingest(records: Vec<StreamRecord>) -> Result<Vec<StreamSegment>> {
    records.into_iter().map(StreamSegment::try_from).collect()
}

fn non_blank(code: Option<&str>) -> Option<&str> {
    code.map(str::trim).filter(|c| !c.is_empty())
}

fn line_length(geom: &Geometry<f64>) -> f64 {
    match geom {
        Geometry::LineString(ls) => ls.length::<Euclidean>(),
        Geometry::MultiLineString(mls) => mls.0.iter().map(|ls| ls.length::<Euclidean>()).sum(),
        _ => 0.0,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn record(distance: f64) -> StreamRecord {
        serde_json::from_value(json!({
            "ogc_fid": 7,
            "gnis_name": "Salmon River",
            "fwa_watershed_code": "100-190442-000000",
            "local_watershed_code": "100-190442-000000",
            "downstream_route_measure": 1250.5,
            "geometry": { "type": "LineString", "coordinates": [[0.0, 0.0], [3.0, 4.0]] },
            "closest_stream_point": { "type": "Point", "coordinates": [1.5, 2.0] },
            "distance": distance
        }))
        .unwrap()
    }

    #[test]
    fn test_record_converts() {
        let seg = StreamSegment::try_from(record(12.5)).unwrap();
        assert_eq!(seg.id, SegmentId(7));
        assert_eq!(seg.name.as_deref(), Some("Salmon River"));
        assert_eq!(seg.watershed_code(), Some("100-190442-000000"));
        assert!((seg.downstream_route_measure - 1250.5).abs() < 1e-10);
        // length_metre missing: measured from geometry
        assert!((seg.reach_length - 5.0).abs() < 1e-10);
        assert!((seg.closest_point.x() - 1.5).abs() < 1e-10);
        assert_eq!(seg.apportionment, 0.0);
    }

    #[test]
    fn test_rejects_non_positive_distance() {
        for d in [0.0, -3.0, f64::NAN, f64::INFINITY] {
            // JSON has no NaN or infinity, so set the field after decoding
            let mut rec = record(5.0);
            rec.distance = d;
            let err = StreamSegment::try_from(rec).unwrap_err();
            assert!(matches!(err, Error::InvalidSegment { id: 7, .. }), "distance {}", d);
        }
    }

    #[test]
    fn test_rejects_point_geometry() {
        let mut rec = record(5.0);
        rec.geometry = geojson::Geometry::new(geojson::Value::Point(vec![0.0, 0.0]));
        assert!(StreamSegment::try_from(rec).is_err());
    }

    #[test]
    fn test_ingest_is_all_or_nothing() {
        let batch = vec![record(5.0), record(0.0), record(8.0)];
        assert!(ingest(batch).is_err());

        let batch = vec![record(5.0), record(8.0)];
        assert_eq!(ingest(batch).unwrap().len(), 2);
    }

    #[test]
    fn test_blank_codes_are_missing() {
        let seg = StreamSegment::new(
            1,
            LineString::from(vec![(0.0, 0.0), (1.0, 0.0)]),
            Point::new(0.0, 0.0),
            1.0,
        )
            .with_watershed_code("   ")
            .with_local_watershed_code("");
        assert_eq!(seg.watershed_code(), None);
        assert_eq!(seg.local_watershed_code(), None);
    }

    #[test]
    fn test_to_feature_properties() {
        let seg = StreamSegment::try_from(record(3.0)).unwrap();
        let feature = seg.to_feature();
        assert_eq!(feature.id.as_deref(), Some("7"));
        assert!(matches!(
            feature.get_property("FWA_WATERSHED_CODE"),
            Some(AttributeValue::String(s)) if s == "100-190442-000000"
        ));
        assert!(matches!(
            feature.get_property("GNIS_NAME"),
            Some(AttributeValue::String(s)) if s == "Salmon River"
        ));
    }
}
