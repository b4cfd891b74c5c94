//! Stream apportionment
//!
//! Inverse-distance weighting of candidate stream segments around a point
//! of interest, with curation operations that keep the percentages
//! normalized, plus the per-session fetch bookkeeping that feeds it.

mod engine;
mod export;
mod session;

pub use engine::{ApportionmentEngine, ApportionmentParams, Normalization, WeightingFactor};
pub use export::{distance_lines, ExportRow};
pub use session::{AnalysisSession, FetchOutcome, FetchTicket, SessionToken};
