//! Implements errors associated with the connection

use std::io;

use crate::{
    channel::AllocError,
    frames,
    transport,
};

use super::ConnectionState;

/// Errors associated with [`crate::Connection`]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(io::Error),

    /// The byte stream from the broker can no longer be trusted
    #[error("Framing error: {0}")]
    Framing(frames::Error),

    /// A bounded wait for a reply expired
    #[error("Timed out waiting for a reply from the broker")]
    ClientTimeout,

    /// The broker reset the connection
    #[error("Connection reset by peer")]
    ConnectionReset,

    /// The stream ended without a reply
    #[error("Connection closed by peer without a response")]
    EmptyResponse,

    /// The broker dropped the connection during the handshake. Brokers do this
    /// when they reject the credentials.
    #[error(
        "Broker closed the connection during the handshake, possibly due to an \
         authentication failure (username: {username:?}, vhost: {vhost:?}, \
         password length: {password_length})"
    )]
    PossibleAuthenticationFailure {
        /// Username used in Connection.StartOk
        username: String,
        /// Virtual host used in Connection.Open
        vhost: String,
        /// Length of the password in octets
        password_length: usize,
    },

    /// A frame was sent while the connection is closed
    #[error("Connection is closed")]
    ConnectionClosed,

    /// Channel id allocation failed
    #[error(transparent)]
    ChannelAlloc(#[from] AllocError),

    /// The operation is not allowed in the current state
    #[error("Illegal connection state. Expected {expected}, found {found}")]
    IllegalState {
        /// State required by the operation
        expected: ConnectionState,
        /// Actual state
        found: ConnectionState,
    },

    /// The broker sent a frame other than the one awaited
    #[error("Unexpected frame on channel {channel}. Expected {expected}, found {found}")]
    UnexpectedFrame {
        /// Channel of the frame
        channel: u16,
        /// Name of the awaited method
        expected: &'static str,
        /// Description of what arrived instead
        found: String,
    },

    /// The broker closed the connection with Connection.Close
    #[error("Connection closed by broker: {reply_code} {reply_text}")]
    RemoteClose {
        /// Reply code
        reply_code: u16,
        /// Reply text
        reply_text: String,
        /// Class of the method that caused the close
        class_id: u16,
        /// Method that caused the close
        method_id: u16,
    },

    /// The broker closed a channel with Channel.Close
    #[error("Channel {channel} closed by broker: {reply_code} {reply_text}")]
    ChannelClosedByBroker {
        /// Channel number
        channel: u16,
        /// Reply code
        reply_code: u16,
        /// Reply text
        reply_text: String,
    },

    /// A method could not be encoded
    #[error("Encode error: {0}")]
    Encode(#[from] ferrule_amqp_types::Error),

    /// The broker does not offer the PLAIN mechanism
    #[error("Mechanism PLAIN is not offered by the broker (offered: {offered:?})")]
    UnsupportedMechanism {
        /// Mechanisms listed in Connection.Start
        offered: Vec<String>,
    },
}

impl Error {
    /// Whether the error leaves the connection unusable. Channel level errors
    /// do not.
    pub fn is_connection_level(&self) -> bool {
        !matches!(
            self,
            Self::ChannelClosedByBroker { .. }
                | Self::ChannelAlloc(_)
                | Self::UnexpectedFrame { .. }
        )
    }

    /// Whether the error means the broker went silent or away
    pub(crate) fn is_silent_disconnect(&self) -> bool {
        matches!(
            self,
            Self::ClientTimeout | Self::ConnectionReset | Self::EmptyResponse
        )
    }
}

impl From<transport::Error> for Error {
    fn from(err: transport::Error) -> Self {
        match err {
            transport::Error::Io(e) => Self::Io(e),
            transport::Error::Frame(e) => Self::Framing(e),
            transport::Error::Timeout => Self::ClientTimeout,
            transport::Error::ConnectionReset => Self::ConnectionReset,
            transport::Error::EmptyResponse => Self::EmptyResponse,
            transport::Error::Closed => Self::ConnectionClosed,
        }
    }
}

/// Errors associated with opening a connection through [`crate::connection::Builder`]
#[derive(Debug, thiserror::Error)]
pub enum OpenError {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// The url could not be parsed
    #[error(transparent)]
    UrlError(#[from] url::ParseError),

    /// The url scheme is not `amqp`
    #[error("Invalid scheme {0:?}. Only \"amqp\" is supported, use `open_with_stream` for TLS")]
    InvalidScheme(String),

    /// A query parameter could not be understood
    #[error("Invalid query parameter {key}={value}")]
    InvalidQuery {
        /// Parameter name
        key: String,
        /// Parameter value
        value: String,
    },

    /// The url has no host
    #[error("Url has no host")]
    MissingHost,

    /// The handshake failed
    #[error(transparent)]
    Connection(#[from] Error),
}

impl From<transport::Error> for OpenError {
    fn from(err: transport::Error) -> Self {
        Self::Connection(err.into())
    }
}
