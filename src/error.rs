use thiserror::Error;

/// Failures to read a task document or one of its timestamps.
#[derive(Debug, Error)]
pub enum ParseError {
    /// The draft text is not a valid YAML document.
    #[error("invalid task document: {0}")]
    Document(#[from] serde_yaml::Error),

    /// A value looked like a timestamp but could not be parsed as one.
    #[error("invalid timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    /// Shifting a timestamp moved it outside the representable range.
    #[error("timestamp '{0}' is out of range after shifting")]
    OutOfRange(String),

    /// The document has no top-level `created` string to use as a reference.
    #[error("task document has no 'created' timestamp")]
    MissingCreated,
}

/// Failures of the local SQLite store.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("could not encode task definition: {0}")]
    Encode(#[from] serde_yaml::Error),
}

/// Failures while submitting a task to the platform.
#[derive(Debug, Error)]
pub enum SubmitError {
    #[error("the draft is not a valid task document")]
    InvalidDraft,

    #[error("could not encode task for submission: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("request to {endpoint} failed: {source}")]
    Transport {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("platform answered with HTTP {status}: {body}")]
    Status { status: u16, body: String },

    #[error("createTask failed: {}", .0.join("; "))]
    Graphql(Vec<String>),
}

/// Errors of the draft workflow.
#[derive(Debug, Error)]
pub enum DraftError {
    #[error(transparent)]
    Parse(#[from] ParseError),

    #[error(transparent)]
    Submit(#[from] SubmitError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error("no recent task definition at position {0}")]
    NoSuchRecent(usize),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_created_display() {
        let err = ParseError::MissingCreated;
        assert_eq!(err.to_string(), "task document has no 'created' timestamp");
    }

    #[test]
    fn graphql_errors_are_joined() {
        let err = SubmitError::Graphql(vec!["scope missing".into(), "bad queue".into()]);
        assert_eq!(err.to_string(), "createTask failed: scope missing; bad queue");
    }

    #[test]
    fn parse_error_converts_into_draft_error() {
        let draft_err: DraftError = ParseError::MissingCreated.into();
        assert!(matches!(draft_err, DraftError::Parse(_)));
    }
}
