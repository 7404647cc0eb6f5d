use thiserror::Error;

#[derive(Error, Debug)]
pub enum FDeltaError {
    /// A source could not be opened or read to the extent required.
    #[error("Input unreadable ({context}): {source}")]
    InputUnreadable {
        context: String,
        #[source]
        source: std::io::Error,
    },

    /// Bytes could not be decoded under the charset supplied by the caller.
    #[error("Encoding error ({encoding}): {reason}")]
    Encoding { encoding: String, reason: String },

    /// A required input was missing or malformed; a programming error, not a difference.
    #[error("Precondition violated: {0}")]
    Precondition(String),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl FDeltaError {
    pub fn unreadable(context: impl Into<String>, source: std::io::Error) -> Self {
        FDeltaError::InputUnreadable {
            context: context.into(),
            source,
        }
    }
}

impl From<std::io::Error> for FDeltaError {
    fn from(source: std::io::Error) -> Self {
        FDeltaError::unreadable("read", source)
    }
}

pub type Result<T> = std::result::Result<T, FDeltaError>;
