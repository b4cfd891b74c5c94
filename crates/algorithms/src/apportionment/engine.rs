//! Inverse-distance apportionment over a curated set of stream segments
//!
//! Each active segment gets a share of 100 percent proportional to its
//! inverse distance to the point of interest:
//!
//! ```text
//! w_i = 1 / d_i^p          p ∈ {1, 2}
//! a_i = 100 * w_i / Σ w_j
//! ```
//!
//! Shares are computed from weights relative to the nearest segment,
//! `r_i = (d_min / d_i)^p`, which gives the same `a_i` while staying inside
//! `f64` range for any positive finite distance.
//!
//! Every operation that changes the active set or the weighting factor
//! recomputes, so after any call the apportionments sum to 100 or the
//! active set is empty.

use std::collections::HashSet;
use std::fmt;

use confluence_core::segment::{SegmentId, StreamSegment};
use confluence_core::{Error, Result};
use tracing::debug;

use crate::hydrology::watershed_code::normalize;

/// Exponent applied to distance in the inverse-distance weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum WeightingFactor {
    /// `1 / d`
    Linear,
    /// `1 / d²`, penalizes distant segments more steeply
    #[default]
    Squared,
}

impl WeightingFactor {
    pub fn exponent(self) -> i32 {
        match self {
            WeightingFactor::Linear => 1,
            WeightingFactor::Squared => 2,
        }
    }

    /// Inverse-distance weight of a segment at `distance`
    #[inline]
    pub fn weight(self, distance: f64) -> f64 {
        1.0 / distance.powi(self.exponent())
    }

    /// Weight at `distance` relative to the weight at `nearest`, in `(0, 1]`
    #[inline]
    pub fn relative_weight(self, nearest: f64, distance: f64) -> f64 {
        (nearest / distance).powi(self.exponent())
    }
}

impl TryFrom<f64> for WeightingFactor {
    type Error = Error;

    fn try_from(value: f64) -> Result<Self> {
        if value == 1.0 {
            Ok(WeightingFactor::Linear)
        } else if value == 2.0 {
            Ok(WeightingFactor::Squared)
        } else {
            Err(Error::InvalidParameter {
                name: "weighting_factor",
                value: value.to_string(),
                reason: "must be either 1 (linear) or 2 (squared)".into(),
            })
        }
    }
}

impl fmt::Display for WeightingFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.exponent())
    }
}

/// Parameters for apportionment
#[derive(Debug, Clone)]
pub struct ApportionmentParams {
    /// Distance exponent (default: squared)
    pub weighting_factor: WeightingFactor,
    /// Percentage at or below which a segment counts as low-apportionment
    /// (default: 10.0)
    pub min_apportionment: f64,
}

impl Default for ApportionmentParams {
    fn default() -> Self {
        Self {
            weighting_factor: WeightingFactor::Squared,
            min_apportionment: 10.0,
        }
    }
}

/// Outcome of a recomputation
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Normalization {
    /// Apportionments sum to 100
    Normalized { total_inverse_distance: f64 },
    /// No usable weight (empty active set); every apportionment is 0
    Undefined,
}

impl Normalization {
    pub fn is_defined(&self) -> bool {
        matches!(self, Normalization::Normalized { .. })
    }
}

/// Owns the active candidate set for one analysis and keeps its
/// apportionments normalized.
#[derive(Debug, Clone, Default)]
pub struct ApportionmentEngine {
    active: Vec<StreamSegment>,
    weighting_factor: WeightingFactor,
}

impl ApportionmentEngine {
    pub fn new(weighting_factor: WeightingFactor) -> Self {
        Self {
            active: Vec::new(),
            weighting_factor,
        }
    }

    pub fn active(&self) -> &[StreamSegment] {
        &self.active
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn weighting_factor(&self) -> WeightingFactor {
        self.weighting_factor
    }

    /// Replace the active set wholesale and recompute.
    ///
    /// Segments are expected to come from validated ingestion (`distance > 0`).
    pub fn load(&mut self, segments: Vec<StreamSegment>) -> Normalization {
        self.active = segments;
        self.recompute()
    }

    /// Drop every active segment.
    pub fn clear(&mut self) {
        self.active.clear();
    }

    /// Set the weighting factor from its numeric form.
    ///
    /// Anything other than exactly 1 or 2 is rejected and the engine is left
    /// unchanged.
    pub fn set_weighting_factor(&mut self, value: f64) -> Result<Normalization> {
        self.weighting_factor = WeightingFactor::try_from(value)?;
        Ok(self.recompute())
    }

    /// Recompute inverse distances and apportionments over the active set.
    ///
    /// An empty set has no usable weight: `Undefined` is returned instead of
    /// dividing. The reported total is the raw inverse-distance sum and may
    /// overflow for tiny distances; the shares themselves do not.
    pub fn recompute(&mut self) -> Normalization {
        let factor = self.weighting_factor;
        let nearest = self
            .active
            .iter()
            .map(|seg| seg.distance)
            .fold(f64::INFINITY, f64::min);

        let mut total = 0.0;
        let mut relative_total = 0.0;
        for seg in &mut self.active {
            seg.inverse_distance = factor.weight(seg.distance);
            total += seg.inverse_distance;
            relative_total += factor.relative_weight(nearest, seg.distance);
        }

        if relative_total > 0.0 && relative_total.is_finite() {
            for seg in &mut self.active {
                seg.apportionment =
                    100.0 * factor.relative_weight(nearest, seg.distance) / relative_total;
            }
            Normalization::Normalized {
                total_inverse_distance: total,
            }
        } else {
            for seg in &mut self.active {
                seg.apportionment = 0.0;
            }
            Normalization::Undefined
        }
    }

    /// Keep the first segment of each watershed code, in active order, and
    /// drop later ones. Segments without a code are never treated as
    /// overlapping.
    ///
    /// Which duplicate survives depends on the current order; call
    /// [`sort_by_distance`](Self::sort_by_distance) first to keep the nearest.
    pub fn remove_overlaps(&mut self) -> Normalization {
        let before = self.active.len();
        let mut seen: HashSet<String> = HashSet::new();
        self.active.retain(|seg| match seg.watershed_code() {
            Some(code) => seen.insert(normalize(code).to_string()),
            None => true,
        });
        debug!("remove_overlaps: dropped {} of {}", before - self.active.len(), before);
        self.recompute()
    }

    /// Drop segments whose current apportionment is at or below `threshold`
    /// percent, then re-normalize the survivors. A NaN threshold drops nothing.
    pub fn remove_below_threshold(&mut self, threshold: f64) -> Normalization {
        let before = self.active.len();
        if !threshold.is_nan() {
            self.active.retain(|seg| seg.apportionment > threshold);
        }
        debug!(
            "remove_below_threshold({}): dropped {} of {}",
            threshold,
            before - self.active.len(),
            before
        );
        self.recompute()
    }

    /// Drop the identified segments, then recompute. Unknown ids are ignored.
    pub fn remove_selected(&mut self, ids: &[SegmentId]) -> Normalization {
        let ids: HashSet<SegmentId> = ids.iter().copied().collect();
        let before = self.active.len();
        self.active.retain(|seg| !ids.contains(&seg.id));
        debug!("remove_selected: dropped {} of {}", before - self.active.len(), before);
        self.recompute()
    }

    /// Drop a single segment, then recompute.
    pub fn remove(&mut self, id: SegmentId) -> Normalization {
        self.remove_selected(&[id])
    }

    /// Stable reorder by ascending distance. Apportionments are unchanged.
    pub fn sort_by_distance(&mut self) {
        self.active.sort_by(|a, b| a.distance.total_cmp(&b.distance));
    }

    /// Whether two active segments share a watershed code
    pub fn has_overlaps(&self) -> bool {
        let mut seen = HashSet::new();
        self.active
            .iter()
            .filter_map(StreamSegment::watershed_code)
            .any(|code| !seen.insert(normalize(code)))
    }

    /// Sum of the current apportionments
    pub fn total_apportionment(&self) -> f64 {
        self.active.iter().map(|s| s.apportionment).sum()
    }
}
