//! Frame types and the frame codec

pub mod amqp;
pub mod error;

pub use amqp::{content_frameset, Frame, FrameBody, FrameCodec, FrameKind};
pub use error::Error;

/// Frame type of method frames
pub const FRAME_TYPE_METHOD: u8 = 1;

/// Frame type of content header frames
pub const FRAME_TYPE_HEADER: u8 = 2;

/// Frame type of content body frames
pub const FRAME_TYPE_BODY: u8 = 3;

/// Frame type of heartbeat frames
pub const FRAME_TYPE_HEARTBEAT: u8 = 8;
