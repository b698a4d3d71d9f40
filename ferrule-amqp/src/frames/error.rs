use std::io;

/// Errors raised by the frame codec
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// IO error
    #[error("IO Error {0:?}")]
    Io(#[from] io::Error),

    /// The octet after the payload is not the frame-end marker
    #[error("Corrupt frame: expected frame end 0xCE, found {footer:#04x}")]
    CorruptFrame {
        /// The octet found in place of the frame-end marker
        footer: u8,
    },

    /// The frame type octet is not one of method, header, body or heartbeat
    #[error("Unknown frame type {0}")]
    UnknownFrameKind(u8),

    /// The frame is larger than the negotiated frame-max
    #[error("Frame of {size} octets exceeds frame-max {max}")]
    MaxFrameSizeExceeded {
        /// Size of the whole frame
        size: usize,
        /// Negotiated limit
        max: usize,
    },

    /// A heartbeat frame carried a payload
    #[error("Heartbeat frame with a payload of {0} octets")]
    HeartbeatPayload(usize),

    /// The peer answered with a protocol header, which means it rejected the
    /// protocol version offered by the client
    #[error("Protocol header mismatch. Found {0:?}")]
    ProtocolHeaderMismatch([u8; 8]),

    /// The byte sequence ends before the frame is complete
    #[error("Incomplete frame")]
    Incomplete,

    /// The method or content header payload could not be decoded or encoded
    #[error("Payload codec error: {0}")]
    Payload(#[from] ferrule_amqp_types::Error),
}
