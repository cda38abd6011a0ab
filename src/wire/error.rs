// Setrans: Wire error types

use thiserror::Error;

#[derive(Debug, Error)]
pub enum WireError {
    #[error("malformed or empty response")]
    EmptyResponse,

    #[error("response body of {length} bytes exceeds the {max} byte limit")]
    ResponseTooLarge { length: usize, max: usize },

    #[error("response body is not valid UTF-8")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("label of {length} bytes is too long to frame")]
    LabelTooLong { length: usize },

    #[error("unrecognized native byte order (probe bytes {0:02x?})")]
    UnknownByteOrder([u8; 2]),
}
