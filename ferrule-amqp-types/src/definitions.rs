//! Constants of the AMQP 0.9.1 protocol

/// Protocol major version
pub const MAJOR: u8 = 0;

/// Protocol minor version
pub const MINOR: u8 = 9;

/// Protocol revision
pub const REVISION: u8 = 1;

/// Default AMQP port
pub const PORT: u16 = 5672;

/// Default AMQP port over TLS
pub const SECURE_PORT: u16 = 5671;

/// Octet terminating every frame
pub const FRAME_END: u8 = 206;

/// Size of type, channel and payload size fields in front of a frame payload
pub const FRAME_HEADER_SIZE: usize = 7;

/// Smallest frame-max a peer is allowed to negotiate
pub const FRAME_MIN_SIZE: u32 = 4096;

/// Class id of the connection class
pub const CLASS_CONNECTION: u16 = 10;

/// Class id of the channel class
pub const CLASS_CHANNEL: u16 = 20;

/// Class id of the basic class
pub const CLASS_BASIC: u16 = 60;

/// Reply codes carried by `Connection.Close` and `Channel.Close`
pub mod reply_code {
    /// Normal completion
    pub const REPLY_SUCCESS: u16 = 200;

    /// The message could not be delivered because of the `mandatory` flag
    pub const NO_ROUTE: u16 = 312;

    /// An operator intervened to close the connection
    pub const CONNECTION_FORCED: u16 = 320;

    /// The client tried to work with an unknown virtual host
    pub const INVALID_PATH: u16 = 402;

    /// The client attempted to work with a server entity it has no access to
    pub const ACCESS_REFUSED: u16 = 403;

    /// The client asked for an entity that does not exist
    pub const NOT_FOUND: u16 = 404;

    /// The client tried to work with an entity that is locked by another client
    pub const RESOURCE_LOCKED: u16 = 405;

    /// The client sent a malformed frame
    pub const FRAME_ERROR: u16 = 501;

    /// The client sent a frame with bad argument values
    pub const SYNTAX_ERROR: u16 = 502;

    /// The client sent an invalid sequence of frames
    pub const COMMAND_INVALID: u16 = 503;

    /// The client attempted to work with a channel that had not been correctly opened
    pub const CHANNEL_ERROR: u16 = 504;

    /// The peer sent a frame that was not expected
    pub const UNEXPECTED_FRAME: u16 = 505;

    /// The server could not complete the method because it lacked sufficient resources
    pub const RESOURCE_ERROR: u16 = 506;

    /// The client tried to work with some entity in a manner that is prohibited
    pub const NOT_ALLOWED: u16 = 530;

    /// The client tried to use functionality that is not implemented in the server
    pub const NOT_IMPLEMENTED: u16 = 540;

    /// The server could not complete the method because of an internal error
    pub const INTERNAL_ERROR: u16 = 541;
}
