use thiserror::Error;

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("Arrow error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("Schema mismatch: expected {expected}, found {found}")]
    SchemaMismatch { expected: String, found: String },

    #[error("Column not found: {0}")]
    ColumnNotFound(String),

    #[error("Invalid value {value:?} for setting {name}")]
    InvalidSetting { name: String, value: String },

    #[error("Source error: {0}")]
    SourceError(String),
}

pub type Result<T> = std::result::Result<T, CacheError>;
