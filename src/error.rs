use thiserror::Error;

/// A feed line that cannot be turned into a row. Fatal for that line only.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FormatError {
    #[error("Invalid input format: line does not match the edit grammar")]
    LineMismatch,

    #[error("Invalid edit size delta: {raw}")]
    InvalidDelta { raw: String },
}

/// Reasons a geo lookup can fail. The decoder absorbs all of them.
#[derive(Error, Debug)]
pub enum GeoError {
    #[error("invalid ip [{address}]")]
    MalformedAddress { address: String },

    #[error("no location known for [{address}]")]
    NotFound { address: String },

    #[error("geo database IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("geo database data error: {0}")]
    Data(String),
}
