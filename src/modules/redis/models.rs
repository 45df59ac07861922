use serde::{Deserialize, Serialize};

/// Body of `POST /redis/set`. Both fields are required; empty strings are
/// accepted.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyValueEntry {
    pub key: String,
    pub value: String,
}

/// Body of `GET /redis/populate`. Counts are zero on failure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopulateResponse {
    pub success: bool,
    pub message: String,
    pub books_created: usize,
    pub chapters_created: usize,
}
