use thiserror::Error;

#[derive(Debug, Error)]
pub enum DepreciationError {
    #[error("Invalid input: {field} — {reason}")]
    InvalidInput { field: String, reason: String },

    #[error("Unsupported depreciation method: '{0}'")]
    UnsupportedMethod(String),

    #[error("Query out of range: {query} — {reason}")]
    OutOfRangeQuery { query: String, reason: String },

    #[error("Date error: {0}")]
    DateError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl DepreciationError {
    pub(crate) fn invalid(field: &str, reason: impl Into<String>) -> Self {
        DepreciationError::InvalidInput {
            field: field.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for DepreciationError {
    fn from(e: serde_json::Error) -> Self {
        DepreciationError::SerializationError(e.to_string())
    }
}
