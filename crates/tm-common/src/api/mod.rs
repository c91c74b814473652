//! Result types handed back to callers.

pub mod batch_response;
pub mod match_response;

pub use batch_response::{
    BatchResult, BulkMatchResult, BulkSummary, CandidateRanking, JobMatches, JobRanking,
    RankedEntry,
};
pub use match_response::{MatchDetails, MatchResult, ScoreBreakdown};
