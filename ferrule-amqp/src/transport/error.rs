use std::io;

use crate::frames;

/// Errors raised by the transport
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(io::Error),

    /// The frame codec failed
    #[error(transparent)]
    Frame(frames::Error),

    /// No complete frame arrived in time
    #[error("Timed out waiting for a frame")]
    Timeout,

    /// The peer reset or aborted the connection
    #[error("Connection reset by peer")]
    ConnectionReset,

    /// The stream ended without a frame
    #[error("Connection closed by peer without a response")]
    EmptyResponse,

    /// The transport was closed locally
    #[error("Transport is closed")]
    Closed,
}

fn is_reset(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::UnexpectedEof
    )
}

impl From<io::Error> for Error {
    fn from(err: io::Error) -> Self {
        match is_reset(&err) {
            true => Self::ConnectionReset,
            false => Self::Io(err),
        }
    }
}

impl From<frames::Error> for Error {
    fn from(err: frames::Error) -> Self {
        match err {
            frames::Error::Io(err) => err.into(),
            err => Self::Frame(err),
        }
    }
}
