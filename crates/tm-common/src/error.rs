use serde::{Deserialize, Serialize};

use crate::model::RecordKind;

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum MatchError {
    #[error("unknown matching algorithm: {0}")]
    UnknownAlgorithm(String),
    #[error("malformed {record}: {reason}")]
    MalformedInput { record: &'static str, reason: String },
    #[error("batch cancelled after {completed} of {total} pairs")]
    Cancelled { completed: usize, total: usize },
    #[error("failed to build worker pool: {0}")]
    WorkerPool(String),
}

impl MatchError {
    pub fn malformed(record: &'static str, reason: impl Into<String>) -> Self {
        MatchError::MalformedInput {
            record,
            reason: reason.into(),
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            MatchError::UnknownAlgorithm(_) => "UNKNOWN_ALGORITHM",
            MatchError::MalformedInput { .. } => "MALFORMED_INPUT",
            MatchError::Cancelled { .. } => "CANCELLED",
            MatchError::WorkerPool(_) => "WORKER_POOL",
        }
    }
}

/// Serializable view of a per-pair failure inside a batch.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PairError {
    /// Position of the failing record in the caller's input.
    pub index: usize,
    /// Whether `index` points into the job list or the candidate list.
    pub record: RecordKind,
    pub id: Option<String>,
    pub code: String,
    pub message: String,
}

impl PairError {
    pub fn new(record: RecordKind, index: usize, id: Option<String>, error: &MatchError) -> Self {
        Self {
            index,
            record,
            id,
            code: error.code().to_string(),
            message: error.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pair_error_carries_code_and_message() {
        let err = MatchError::malformed("candidate", "id is empty");
        let pair = PairError::new(RecordKind::Candidate, 3, None, &err);
        assert_eq!(pair.code, "MALFORMED_INPUT");
        assert_eq!(pair.message, "malformed candidate: id is empty");
        assert_eq!(pair.index, 3);

        let json = serde_json::to_value(&pair).unwrap();
        assert_eq!(json["record"], "candidate");
        assert_eq!(json["index"], 3);
    }
}
