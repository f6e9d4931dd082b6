use thiserror::Error;

/// Typed failures raised while decoding a cs file or operating on its columns.
#[derive(Error, Debug)]
pub enum CsError {
    #[error("not a cs file: missing \\x93NUMPY magic")]
    BadMagic,

    #[error("unsupported format version {0}.{1}")]
    UnsupportedVersion(u8, u8),

    #[error("malformed header: {0}")]
    Header(String),

    #[error("unsupported dtype: {0}")]
    UnsupportedDtype(String),

    #[error("data section truncated: expected {expected} bytes, found {actual}")]
    Truncated { expected: usize, actual: usize },

    #[error("no such column: {0}")]
    UnknownColumn(String),

    #[error("column is not numeric: {0}")]
    NotNumeric(String),

    #[error("column has more than one value per row: {0}")]
    NotScalar(String),

    #[error("{0}")]
    Selection(String),
}
