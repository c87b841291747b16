use thiserror::Error;

/// Failure taxonomy of the aggregation core. Commands wrap these with
/// anyhow context at the boundary; callers that need to branch on the kind
/// match on the variant instead of parsing messages.
#[derive(Debug, Error)]
pub enum EngineError {
    /// No observations, or a zero record total.
    #[error("no observations to aggregate")]
    EmptyInput,

    /// A recommendation filter matched nothing beyond the sentinel.
    #[error("no rows matched the recommendation")]
    NoMatch,

    /// A combining operation was given zero input tables.
    #[error("no input tables given")]
    NoInput,

    /// Positionally-aligned recommendation lists disagree in length.
    #[error("{list} has {actual} entries, expected {expected}")]
    LengthMismatch {
        list: &'static str,
        expected: usize,
        actual: usize,
    },

    /// A path resolved to no concept-map entry.
    #[error("path {path:?} matches no concept mapping")]
    UndefinedConcept { path: String },

    /// A table is missing a required column.
    #[error("missing required column {column:?}")]
    Schema { column: String },

    /// Two input tables carry the same column label.
    #[error("duplicate column label {column:?}")]
    DuplicateColumn { column: String },

    /// The caller-supplied record total is below the observed distinct
    /// record count, so percentages would exceed 1.
    #[error("record total {total} is below the {distinct} distinct records observed")]
    InvalidTotal { total: u64, distinct: u64 },

    #[error("invalid match pattern")]
    Pattern(#[from] regex::Error),
}

pub type EngineResult<T> = std::result::Result<T, EngineError>;
