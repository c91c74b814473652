//! Candidate/job compatibility scoring and ranking.
//!
//! [`MatchingService`] scores one pair with one of four algorithms;
//! [`BatchRanker`] runs it over a pool and returns a stably sorted top-N.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod matching;
pub mod model;

pub use api::{BatchResult, BulkMatchResult, MatchResult, RankedEntry};
pub use config::{BatchConfig, CancellationPolicy, ScoringConfig};
pub use error::{MatchError, PairError};
pub use matching::{
    AlgorithmKind, BatchControl, BatchRanker, BulkOptions, Confidence, FactorWeights,
    MatchingService,
};
pub use model::{Candidate, Job};
