use thiserror::Error;

/// Failures while loading a form schema.
#[derive(Debug, Error)]
pub enum SchemaError {
    #[error("failed to parse schema: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("field '{0}' is declared more than once")]
    DuplicateField(String),
    #[error("failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
}
