use thiserror::Error;

/// Failure kinds shared by every crate in the workspace.
///
/// The API layer maps these onto HTTP statuses: `NotFound` is 404,
/// `Validation` is 422, everything else is surfaced as 500.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Parse error: {0}")]
    Parse(String),

    #[error("Upstream service error: {0}")]
    Upstream(String),

    #[error("Unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("Vector store error: {0}")]
    Store(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Lowercase kind label, used in structured logs.
    pub fn kind(&self) -> &'static str {
        match self {
            Self::InvalidConfig(_) => "invalid_config",
            Self::NotFound(_) => "not_found",
            Self::Validation(_) => "validation",
            Self::Parse(_) => "parse",
            Self::Upstream(_) => "upstream",
            Self::UnsupportedFormat(_) => "unsupported_format",
            Self::Store(_) => "store",
            Self::Io(_) => "io",
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
