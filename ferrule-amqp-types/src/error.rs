//! Errors raised while encoding or decoding protocol data

/// Encoding and decoding errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The payload ended before the value was complete
    #[error("Unexpected end of payload")]
    UnexpectedEof,

    /// A string field is not valid UTF-8
    #[error("Invalid UTF-8 encoding")]
    InvalidUtf8Encoding,

    /// A short string longer than 255 bytes was given for encoding
    #[error("Short string is too long ({0} bytes)")]
    ShortStringTooLong(usize),

    /// A field value tag is not known
    #[error("Unknown field value type {0:#04x}")]
    UnknownFieldType(u8),

    /// The class id and method id pair is not known
    #[error("Unknown method (class {class_id}, method {method_id})")]
    UnknownMethod {
        /// Class id found on the wire
        class_id: u16,
        /// Method id found on the wire
        method_id: u16,
    },

    /// A content header uses the property flags continuation bit
    #[error("Property flags continuation is not supported")]
    PropertyFlagsContinuation,

    /// Bytes remained after a method or header was decoded
    #[error("{0} trailing bytes after decoding")]
    TrailingBytes(usize),
}
