use thiserror::Error;

/// The crate's typed error taxonomy.
///
/// Configuration-time variants are fatal and surface at the binary
/// boundary wrapped in `anyhow::Context`. Execution-time variants
/// (`ArgGenerationFailed`, `DatabaseError`, ...) are caught per-tick by
/// the scheduler and logged rather than propagated.
#[derive(Debug, Error)]
pub enum DrkError {
    #[error("{field:?} field is missing")]
    FieldMissing { field: String },

    #[error("parsing {field}: {source}")]
    FieldParse {
        field: String,
        #[source]
        source: anyhow::Error,
    },

    #[error("field {field} has the wrong type for kind {kind}")]
    FieldTypeMismatch { field: String, kind: String },

    #[error("unknown generator {name:?}")]
    UnknownGenerator { name: String },

    #[error("unknown argument kind {kind:?}")]
    UnknownArgKind { kind: String },

    #[error("unsupported query type {kind:?}")]
    UnsupportedQueryType { kind: String },

    #[error("missing activity {name:?}")]
    MissingActivity { name: String },

    #[error("no data recorded for query {query:?}")]
    MissingQueryData { query: String },

    #[error("column {column:?} missing from result of query {query:?}")]
    MissingColumn { query: String, column: String },

    #[error("set values and weights need to be the same length (got {values} values, {weights} weights)")]
    WeightLengthMismatch { values: usize, weights: usize },

    #[error("generating value for arg: {0}")]
    ArgGenerationFailed(#[source] Box<DrkError>),

    #[error("running query {query:?}: {source}")]
    DatabaseError {
        query: String,
        #[source]
        source: anyhow::Error,
    },
}

pub type Result<T> = std::result::Result<T, DrkError>;
