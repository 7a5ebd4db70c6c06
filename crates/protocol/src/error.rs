//! Protocol error types.

use thiserror::Error;

/// Errors that can occur while decoding sync messages.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("Invalid message opcode: {0:#04x}")]
    InvalidOpcode(u8),

    #[error("Unexpected end of data")]
    UnexpectedEof,

    #[error("Collection length {0} exceeds the limit of {1}")]
    TooManyItems(u32, u32),

    #[error("Trailing bytes after message: {0}")]
    TrailingBytes(usize),

    #[error("Non-finite number in field `{0}`")]
    NonFinite(&'static str),
}
