use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Structure contains no rows")]
    EmptyStructure,

    #[error("Malformed puzzle: {message}")]
    MalformedPuzzle { message: String },
}

impl Error {
    pub(crate) fn malformed(message: impl Into<String>) -> Self {
        Error::MalformedPuzzle {
            message: message.into(),
        }
    }
}
