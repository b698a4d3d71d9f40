//! Implements the protocol header sent before any frame

use std::convert::TryFrom;

use bytes::Bytes;
use ferrule_amqp_types::definitions::{MAJOR, MINOR, REVISION};

const PROTOCOL_HEADER_PREFIX: &[u8; 4] = b"AMQP";

/// Protocol header, `"AMQP" 0 major minor revision` on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProtocolHeader {
    /// Major number
    pub major: u8,

    /// Minor number
    pub minor: u8,

    /// Revision number
    pub revision: u8,
}

impl Default for ProtocolHeader {
    fn default() -> Self {
        Self::amqp()
    }
}

impl ProtocolHeader {
    /// Creates a new protocol header
    pub fn new(major: u8, minor: u8, revision: u8) -> Self {
        Self {
            major,
            minor,
            revision,
        }
    }

    /// Creates the AMQP 0.9.1 protocol header
    pub fn amqp() -> Self {
        Self::new(MAJOR, MINOR, REVISION)
    }
}

impl From<ProtocolHeader> for [u8; 8] {
    fn from(value: ProtocolHeader) -> Self {
        [
            PROTOCOL_HEADER_PREFIX[0], // b'A'
            PROTOCOL_HEADER_PREFIX[1], // b'M'
            PROTOCOL_HEADER_PREFIX[2], // b'Q'
            PROTOCOL_HEADER_PREFIX[3], // b'P'
            0,
            value.major,
            value.minor,
            value.revision,
        ]
    }
}

impl From<ProtocolHeader> for Bytes {
    fn from(header: ProtocolHeader) -> Self {
        let bytes: [u8; 8] = header.into();
        Bytes::copy_from_slice(&bytes[..])
    }
}

impl TryFrom<[u8; 8]> for ProtocolHeader {
    type Error = [u8; 8];

    fn try_from(v: [u8; 8]) -> Result<Self, Self::Error> {
        if &v[..4] != PROTOCOL_HEADER_PREFIX || v[4] != 0 {
            return Err(v);
        }
        Ok(Self::new(v[5], v[6], v[7]))
    }
}

#[cfg(test)]
mod tests {
    use std::convert::TryFrom;

    use super::ProtocolHeader;

    #[test]
    fn amqp_091_preamble() {
        let bytes: [u8; 8] = ProtocolHeader::amqp().into();
        assert_eq!(&bytes, b"AMQP\x00\x00\x09\x01");
    }

    #[test]
    fn parse_broker_header() {
        let header = ProtocolHeader::try_from(*b"AMQP\x00\x00\x09\x01").unwrap();
        assert_eq!(header, ProtocolHeader::amqp());

        assert!(ProtocolHeader::try_from(*b"AMQP\x01\x01\x00\x0a").is_err());
        assert!(ProtocolHeader::try_from(*b"HTTP/1.1").is_err());
    }
}
