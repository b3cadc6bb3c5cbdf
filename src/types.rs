use serde::{Deserialize, Serialize};

/// A catalog item retrieved for a query, with its current relevance score.
///
/// Produced by nearest-neighbor search. The reranker may change `score`;
/// the identity fields are never modified after creation.
#[derive(Debug, Clone, PartialEq)]
pub struct Candidate {
    pub name: String,
    pub url: String,
    pub test_type: Option<String>,
    pub description: String,
    pub score: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Support {
    Yes,
    No,
}

impl From<bool> for Support {
    fn from(value: bool) -> Self {
        if value {
            Support::Yes
        } else {
            Support::No
        }
    }
}

/// One recommended assessment, as returned to callers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub url: String,
    pub description: String,
    pub test_type: Vec<String>,
    pub adaptive_support: Support,
    pub remote_support: Support,
    /// Duration in minutes, when the text mentions one
    pub duration: Option<u32>,
    pub relevance_score: Option<f32>,
}
