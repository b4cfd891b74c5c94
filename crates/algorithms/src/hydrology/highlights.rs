//! Upstream/downstream highlight layers for a selected stream segment

use confluence_core::segment::StreamSegment;
use confluence_core::vector::FeatureCollection;
use tracing::warn;

use super::classify::classify;
use super::downstream::clean_downstream;

/// Layer names consumed by the map
pub const SELECTED_LAYER: &str = "selected";
pub const UPSTREAM_LAYER: &str = "upstream";
pub const DOWNSTREAM_LAYER: &str = "downstream";

/// Segments to highlight around a selected segment.
///
/// The default value is the empty highlight, used to reset all three layers.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamHighlights {
    pub selected: Vec<StreamSegment>,
    pub upstream: Vec<StreamSegment>,
    /// Cleaned: only segments below each confluence toward the outlet
    pub downstream: Vec<StreamSegment>,
}

impl StreamHighlights {
    pub fn is_empty(&self) -> bool {
        self.selected.is_empty() && self.upstream.is_empty() && self.downstream.is_empty()
    }

    /// The three named feature collections, in selected/upstream/downstream order
    pub fn feature_collections(&self) -> [(&'static str, FeatureCollection); 3] {
        let collect = |segments: &[StreamSegment]| -> FeatureCollection {
            segments.iter().map(StreamSegment::to_feature).collect()
        };
        [
            (SELECTED_LAYER, collect(&self.selected)),
            (UPSTREAM_LAYER, collect(&self.upstream)),
            (DOWNSTREAM_LAYER, collect(&self.downstream)),
        ]
    }
}

/// Classify `network` around `selected` and clean the downstream bucket.
///
/// A selected segment without a usable watershed code highlights nothing.
pub fn stream_highlights(selected: &StreamSegment, network: &[StreamSegment]) -> StreamHighlights {
    let Some(code) = selected.watershed_code() else {
        warn!("segment {} has no watershed code; nothing to highlight", selected.id);
        return StreamHighlights::default();
    };

    let classification = classify(code, network);
    let downstream = clean_downstream(&classification.downstream, code);

    StreamHighlights {
        selected: classification.selected,
        upstream: classification.upstream,
        downstream,
    }
}
