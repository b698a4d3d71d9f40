//! AMQP 0.9.1 frame type and corresponding encoder and decoder
//!
//! ```text
//! octet    type
//! short    channel
//! long     payload size
//! octets   payload
//! octet    frame-end (0xCE)
//! ```

use std::{convert::TryFrom, io};

use bytes::{Buf, BufMut, Bytes, BytesMut};
use ferrule_amqp_types::{
    definitions::{FRAME_END, FRAME_HEADER_SIZE},
    methods::basic::Publish,
    BasicProperties, ContentHeader, Method,
};
use tokio_util::codec::{Decoder, Encoder};

use super::{
    Error, FRAME_TYPE_BODY, FRAME_TYPE_HEADER, FRAME_TYPE_HEARTBEAT, FRAME_TYPE_METHOD,
};

const PROTOCOL_HEADER_PREFIX: &[u8; 4] = b"AMQP";

/// Type of a frame
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FrameKind {
    /// Method frame
    Method = FRAME_TYPE_METHOD as isize,
    /// Content header frame
    Header = FRAME_TYPE_HEADER as isize,
    /// Content body frame
    Body = FRAME_TYPE_BODY as isize,
    /// Heartbeat frame
    Heartbeat = FRAME_TYPE_HEARTBEAT as isize,
}

impl TryFrom<u8> for FrameKind {
    type Error = u8;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        let kind = match value {
            FRAME_TYPE_METHOD => Self::Method,
            FRAME_TYPE_HEADER => Self::Header,
            FRAME_TYPE_BODY => Self::Body,
            FRAME_TYPE_HEARTBEAT => Self::Heartbeat,
            _ => return Err(value),
        };
        Ok(kind)
    }
}

/// AMQP frame
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    /// Channel number, 0 for connection level frames
    pub channel: u16,

    /// Frame body
    pub body: FrameBody,
}

/// AMQP frame body
#[derive(Debug, Clone, PartialEq)]
pub enum FrameBody {
    /// A decoded method
    Method(Method),

    /// A decoded content header
    Header(ContentHeader),

    /// Opaque content body
    Body(Bytes),

    /// Heartbeat, always with an empty payload
    Heartbeat,
}

impl Frame {
    /// Creates a new AMQP frame
    pub fn new(channel: impl Into<u16>, body: FrameBody) -> Self {
        Self {
            channel: channel.into(),
            body,
        }
    }

    /// Creates a method frame
    pub fn method(channel: u16, method: impl Into<Method>) -> Self {
        Self::new(channel, FrameBody::Method(method.into()))
    }

    /// Creates a heartbeat frame on channel 0
    pub fn heartbeat() -> Self {
        Self::new(0u16, FrameBody::Heartbeat)
    }

    /// Get the type of the frame
    pub fn kind(&self) -> FrameKind {
        match &self.body {
            FrameBody::Method(_) => FrameKind::Method,
            FrameBody::Header(_) => FrameKind::Header,
            FrameBody::Body(_) => FrameKind::Body,
            FrameBody::Heartbeat => FrameKind::Heartbeat,
        }
    }

    /// Get the channel of the frame
    pub fn channel(&self) -> u16 {
        self.channel
    }

    /// Get the body of the frame
    pub fn body(&self) -> &FrameBody {
        &self.body
    }

    /// Consume the frame to get the frame body
    pub fn into_body(self) -> FrameBody {
        self.body
    }

    /// Encodes the frame into a standalone buffer without any size limit
    pub fn to_bytes(&self) -> Result<Bytes, Error> {
        let mut dst = BytesMut::new();
        encode_frame(self, &mut dst)?;
        Ok(dst.freeze())
    }

    /// Decodes exactly one frame from `src`
    pub fn from_bytes(src: &[u8]) -> Result<Self, Error> {
        let mut buf = BytesMut::from(src);
        let frame = FrameCodec::new().decode(&mut buf)?.ok_or(Error::Incomplete)?;
        Ok(frame)
    }
}

fn encode_frame(frame: &Frame, dst: &mut BytesMut) -> Result<(), Error> {
    let start = dst.len();
    dst.put_u8(frame.kind() as u8);
    dst.put_u16(frame.channel);
    // payload size is patched once the payload is written
    dst.put_u32(0);

    let payload_start = dst.len();
    let result = match &frame.body {
        FrameBody::Method(method) => method.encode(dst),
        FrameBody::Header(header) => header.encode(dst),
        FrameBody::Body(payload) => {
            dst.put_slice(payload);
            Ok(())
        }
        FrameBody::Heartbeat => Ok(()),
    };
    if let Err(err) = result {
        dst.truncate(start);
        return Err(err.into());
    }

    let size = (dst.len() - payload_start) as u32;
    dst[start + 3..payload_start].copy_from_slice(&size.to_be_bytes());
    dst.put_u8(FRAME_END);
    Ok(())
}

/// Encoder and decoder of AMQP frames
#[derive(Debug, Clone, Default)]
pub struct FrameCodec {
    max_frame_size: Option<usize>,
}

impl FrameCodec {
    /// Creates a codec without a frame size limit
    pub fn new() -> Self {
        Self {
            max_frame_size: None,
        }
    }

    /// Creates a codec that rejects frames larger than `max_frame_size`
    pub fn with_max_frame_size(max_frame_size: usize) -> Self {
        Self {
            max_frame_size: Some(max_frame_size),
        }
    }

    /// Get the frame size limit
    pub fn max_frame_size(&self) -> Option<usize> {
        self.max_frame_size
    }

    /// Set the frame size limit, `None` removes the limit
    pub fn set_max_frame_size(&mut self, max_frame_size: Option<usize>) -> &mut Self {
        self.max_frame_size = max_frame_size;
        self
    }

    fn check_size(&self, size: usize) -> Result<(), Error> {
        match self.max_frame_size {
            Some(max) if size > max => Err(Error::MaxFrameSizeExceeded { size, max }),
            _ => Ok(()),
        }
    }
}

impl Encoder<Frame> for FrameCodec {
    type Error = Error;

    fn encode(&mut self, item: Frame, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        encode_frame(&item, dst)?;
        if let Err(err) = self.check_size(dst.len() - start) {
            dst.truncate(start);
            return Err(err);
        }
        Ok(())
    }
}

impl Decoder for FrameCodec {
    type Item = Frame;
    type Error = Error;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        // A broker that does not speak the offered version answers the preamble
        // with its own protocol header and closes the socket
        if src.len() >= PROTOCOL_HEADER_PREFIX.len()
            && &src[..PROTOCOL_HEADER_PREFIX.len()] == PROTOCOL_HEADER_PREFIX
        {
            if src.len() < 8 {
                return Ok(None);
            }
            let mut header = [0u8; 8];
            header.copy_from_slice(&src[..8]);
            src.advance(8);
            return Err(Error::ProtocolHeaderMismatch(header));
        }

        if src.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let kind = src[0];
        let channel = u16::from_be_bytes([src[1], src[2]]);
        let payload_size = u32::from_be_bytes([src[3], src[4], src[5], src[6]]) as usize;
        let frame_size = FRAME_HEADER_SIZE + payload_size + 1;
        self.check_size(frame_size)?;

        if src.len() < frame_size {
            src.reserve(frame_size - src.len());
            return Ok(None);
        }

        let mut buf = src.split_to(frame_size);
        buf.advance(FRAME_HEADER_SIZE);
        let footer = buf[payload_size];
        if footer != FRAME_END {
            return Err(Error::CorruptFrame { footer });
        }
        buf.truncate(payload_size);
        let payload = buf.freeze();

        let body = match FrameKind::try_from(kind).map_err(Error::UnknownFrameKind)? {
            FrameKind::Method => FrameBody::Method(Method::decode(payload)?),
            FrameKind::Header => FrameBody::Header(ContentHeader::decode(payload)?),
            FrameKind::Body => FrameBody::Body(payload),
            FrameKind::Heartbeat if payload_size == 0 => FrameBody::Heartbeat,
            FrameKind::Heartbeat => return Err(Error::HeartbeatPayload(payload_size)),
        };

        Ok(Some(Frame { channel, body }))
    }

    fn decode_eof(&mut self, buf: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(buf)? {
            Some(frame) => Ok(Some(frame)),
            None if buf.is_empty() => Ok(None),
            None => Err(io::Error::new(
                io::ErrorKind::UnexpectedEof,
                "stream ended in the middle of a frame",
            )
            .into()),
        }
    }
}

/// Builds the frames of one content-carrying method: the method frame, the
/// content header frame and as many body frames as `frame_max` requires.
///
/// A `frame_max` of 0 means no limit, the body then travels in a single frame.
pub fn content_frameset(
    channel: u16,
    publish: Publish,
    properties: BasicProperties,
    body: Bytes,
    frame_max: u32,
) -> Vec<Frame> {
    let header = ContentHeader::basic(body.len() as u64, properties);
    let mut frames = vec![
        Frame::method(channel, publish),
        Frame::new(channel, FrameBody::Header(header)),
    ];

    let chunk_size = match frame_max as usize {
        0 => body.len().max(1),
        max => max.saturating_sub(FRAME_HEADER_SIZE + 1).max(1),
    };
    let mut remaining = body;
    while !remaining.is_empty() {
        let len = chunk_size.min(remaining.len());
        frames.push(Frame::new(channel, FrameBody::Body(remaining.split_to(len))));
    }
    frames
}
