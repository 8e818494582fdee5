use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Queue backend unavailable: {0}")]
    BackendUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Terminal error: {0}")]
    Terminal(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// A stored queue item that could not be turned into a request set.
#[derive(Error, Debug)]
pub enum DecodeError {
    #[error("payload is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("payload is not valid UTF-8")]
    Utf8(#[from] std::str::Utf8Error),
}

/// A request carried a visitor id that cannot be turned into 8 bytes.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid visitor id '{value}': {reason}")]
pub struct InvalidVisitorId {
    pub value: String,
    pub reason: &'static str,
}

pub mod exit_code {
    pub const SUCCESS: i32 = 0;
    pub const GENERAL_ERROR: i32 = 1;
    pub const INVALID_ARGUMENTS: i32 = 2;
    pub const BACKEND_UNAVAILABLE: i32 = 3;
    pub const DATABASE_ERROR: i32 = 4;
}

impl Error {
    pub fn exit_code(&self) -> i32 {
        match self {
            Error::InvalidArgument(_) => exit_code::INVALID_ARGUMENTS,
            Error::BackendUnavailable(_) => exit_code::BACKEND_UNAVAILABLE,
            Error::Database(_) => exit_code::DATABASE_ERROR,
            _ => exit_code::GENERAL_ERROR,
        }
    }
}
