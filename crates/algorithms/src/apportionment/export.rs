//! Tabular and map outputs of an apportionment

use confluence_core::segment::StreamSegment;
use confluence_core::vector::{AttributeValue, Feature, FeatureCollection};
use geo_types::{Coord, Geometry, LineString};
use serde::{Deserialize, Serialize};

use super::engine::ApportionmentEngine;

/// One row of the spreadsheet export
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportRow {
    pub name: Option<String>,
    pub reach_length: f64,
    pub distance: f64,
    pub apportionment: f64,
}

impl From<&StreamSegment> for ExportRow {
    fn from(seg: &StreamSegment) -> Self {
        Self {
            name: seg.name.clone(),
            reach_length: seg.reach_length,
            distance: seg.distance,
            apportionment: seg.apportionment,
        }
    }
}

/// Lines from the point of interest to each segment's closest point,
/// titled with the distance (`"12.34m"`).
pub fn distance_lines(point: Coord<f64>, segments: &[StreamSegment]) -> FeatureCollection {
    segments
        .iter()
        .map(|seg| {
            let line = LineString::new(vec![point, seg.closest_point.0]);
            let mut feature = Feature::new(Geometry::LineString(line));
            feature.id = Some(seg.id.to_string());
            feature.set_property("title", AttributeValue::String(format!("{:.2}m", seg.distance)));
            feature
        })
        .collect()
}

impl ApportionmentEngine {
    /// Export rows for the active set, in active order
    pub fn export_rows(&self) -> Vec<ExportRow> {
        self.active().iter().map(ExportRow::from).collect()
    }

    /// Distance overlay for the active set
    pub fn distance_lines(&self, point: Coord<f64>) -> FeatureCollection {
        distance_lines(point, self.active())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::apportionment::WeightingFactor;
    use geo_types::{line_string, Point};

    fn engine() -> ApportionmentEngine {
        let mut engine = ApportionmentEngine::new(WeightingFactor::Squared);
        engine.load(vec![
            StreamSegment::new(
                1,
                line_string![(x: 0.0, y: 10.0), (x: 30.0, y: 10.0)],
                Point::new(0.0, 10.0),
                10.0,
            )
            .with_name("Salmon River"),
            StreamSegment::new(
                2,
                line_string![(x: 0.0, y: -20.0), (x: 0.0, y: -60.0)],
                Point::new(0.0, -20.0),
                20.0,
            ),
        ]);
        engine
    }

    #[test]
    fn test_export_rows() {
        let rows = engine().export_rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].name.as_deref(), Some("Salmon River"));
        assert!((rows[0].reach_length - 30.0).abs() < 1e-10);
        assert!((rows[0].apportionment - 80.0).abs() < 1e-9);
        assert_eq!(rows[1].name, None);
        assert!((rows[1].reach_length - 40.0).abs() < 1e-10);

        let json = serde_json::to_value(&rows[0]).unwrap();
        assert_eq!(json["name"], "Salmon River");
        assert_eq!(json["reachLength"], 30.0);
        assert_eq!(json["distance"], 10.0);
    }

    #[test]
    fn test_distance_lines() {
        let lines = engine().distance_lines(Coord { x: 0.0, y: 0.0 });
        assert_eq!(lines.len(), 2);
        let first = &lines.features[0];
        assert!(matches!(
            first.get_property("title"),
            Some(AttributeValue::String(t)) if t == "10.00m"
        ));
        match &first.geometry {
            Some(Geometry::LineString(ls)) => {
                assert_eq!(ls.0, vec![Coord { x: 0.0, y: 0.0 }, Coord { x: 0.0, y: 10.0 }]);
            }
            other => panic!("unexpected geometry {:?}", other),
        }
    }
}
