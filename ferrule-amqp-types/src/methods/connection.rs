//! Methods of the `connection` class (class id 10)

use bytes::{BufMut, Bytes, BytesMut};

use super::MethodArgs;
use crate::{
    definitions::{CLASS_CONNECTION, MAJOR, MINOR},
    primitives::{
        read_bits, read_long_bytes, read_long_str, read_short_str, read_u16, read_u32, read_u8,
        write_bits, write_long_bytes, write_short_str,
    },
    value::{decode_table, encode_table},
    Error, FieldTable,
};

/// `connection.start`, sent by the broker right after the protocol header
#[derive(Debug, Clone, PartialEq)]
pub struct Start {
    /// Protocol major version of the broker
    pub version_major: u8,
    /// Protocol minor version of the broker
    pub version_minor: u8,
    /// Broker properties, including `capabilities`
    pub server_properties: FieldTable,
    /// Space separated list of SASL mechanisms
    pub mechanisms: String,
    /// Space separated list of message locales
    pub locales: String,
}

impl Default for Start {
    fn default() -> Self {
        Self {
            version_major: MAJOR,
            version_minor: MINOR,
            server_properties: FieldTable::new(),
            mechanisms: "PLAIN".into(),
            locales: "en_US".into(),
        }
    }
}

impl Start {
    /// The SASL mechanisms offered by the broker
    pub fn mechanism_list(&self) -> Vec<String> {
        self.mechanisms.split_whitespace().map(Into::into).collect()
    }

    /// The locales offered by the broker
    pub fn locale_list(&self) -> Vec<String> {
        self.locales.split_whitespace().map(Into::into).collect()
    }
}

impl MethodArgs for Start {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 10;
    const NAME: &'static str = "connection.start";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u8(self.version_major);
        dst.put_u8(self.version_minor);
        encode_table(dst, &self.server_properties)?;
        write_long_bytes(dst, self.mechanisms.as_bytes());
        write_long_bytes(dst, self.locales.as_bytes());
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            version_major: read_u8(src)?,
            version_minor: read_u8(src)?,
            server_properties: decode_table(src)?,
            mechanisms: read_long_str(src)?,
            locales: read_long_str(src)?,
        })
    }
}

/// `connection.start-ok`, carrying the client properties and the SASL response
#[derive(Debug, Clone, PartialEq, Default)]
pub struct StartOk {
    /// Client properties
    pub client_properties: FieldTable,
    /// Selected SASL mechanism
    pub mechanism: String,
    /// SASL response
    pub response: Bytes,
    /// Selected locale
    pub locale: String,
}

impl MethodArgs for StartOk {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 11;
    const NAME: &'static str = "connection.start-ok";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        encode_table(dst, &self.client_properties)?;
        write_short_str(dst, &self.mechanism)?;
        write_long_bytes(dst, &self.response);
        write_short_str(dst, &self.locale)
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            client_properties: decode_table(src)?,
            mechanism: read_short_str(src)?,
            response: read_long_bytes(src)?,
            locale: read_short_str(src)?,
        })
    }
}

/// `connection.secure`, a SASL challenge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Secure {
    /// Challenge data
    pub challenge: Bytes,
}

impl MethodArgs for Secure {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 20;
    const NAME: &'static str = "connection.secure";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        write_long_bytes(dst, &self.challenge);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            challenge: read_long_bytes(src)?,
        })
    }
}

/// `connection.secure-ok`, a response to a SASL challenge
#[derive(Debug, Clone, PartialEq, Default)]
pub struct SecureOk {
    /// Response data
    pub response: Bytes,
}

impl MethodArgs for SecureOk {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 21;
    const NAME: &'static str = "connection.secure-ok";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        write_long_bytes(dst, &self.response);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            response: read_long_bytes(src)?,
        })
    }
}

/// `connection.tune`, the broker's proposed limits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Tune {
    /// Highest channel number, 0 for no limit
    pub channel_max: u16,
    /// Largest frame size in octets, 0 for no limit
    pub frame_max: u32,
    /// Heartbeat interval in seconds, 0 to disable
    pub heartbeat: u16,
}

impl MethodArgs for Tune {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 30;
    const NAME: &'static str = "connection.tune";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u16(self.channel_max);
        dst.put_u32(self.frame_max);
        dst.put_u16(self.heartbeat);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            channel_max: read_u16(src)?,
            frame_max: read_u32(src)?,
            heartbeat: read_u16(src)?,
        })
    }
}

/// `connection.tune-ok`, the limits agreed by the client
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TuneOk {
    /// Highest channel number the client will use
    pub channel_max: u16,
    /// Largest frame size the client will send
    pub frame_max: u32,
    /// Heartbeat interval in seconds
    pub heartbeat: u16,
}

impl MethodArgs for TuneOk {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 31;
    const NAME: &'static str = "connection.tune-ok";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u16(self.channel_max);
        dst.put_u32(self.frame_max);
        dst.put_u16(self.heartbeat);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            channel_max: read_u16(src)?,
            frame_max: read_u32(src)?,
            heartbeat: read_u16(src)?,
        })
    }
}

/// `connection.open`, selecting the virtual host
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Open {
    /// Virtual host name
    pub virtual_host: String,
}

impl Default for Open {
    fn default() -> Self {
        Self {
            virtual_host: "/".into(),
        }
    }
}

impl MethodArgs for Open {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 40;
    const NAME: &'static str = "connection.open";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        write_short_str(dst, &self.virtual_host)?;
        // reserved-1 (capabilities) and reserved-2 (insist)
        write_short_str(dst, "")?;
        write_bits(dst, &[false]);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let virtual_host = read_short_str(src)?;
        let _capabilities = read_short_str(src)?;
        let [_insist] = read_bits::<1>(src)?;
        Ok(Self { virtual_host })
    }
}

/// `connection.open-ok`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenOk;

impl MethodArgs for OpenOk {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 41;
    const NAME: &'static str = "connection.open-ok";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        // reserved-1 (known-hosts)
        write_short_str(dst, "")
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let _known_hosts = read_short_str(src)?;
        Ok(Self)
    }
}

/// `connection.close`, sent by either peer to end the connection
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Close {
    /// Reply code, see [`crate::definitions::reply_code`]
    pub reply_code: u16,
    /// Human readable reason
    pub reply_text: String,
    /// Class of the method that caused the close, if any
    pub class_id: u16,
    /// Method that caused the close, if any
    pub method_id: u16,
}

impl MethodArgs for Close {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 50;
    const NAME: &'static str = "connection.close";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u16(self.reply_code);
        write_short_str(dst, &self.reply_text)?;
        dst.put_u16(self.class_id);
        dst.put_u16(self.method_id);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            reply_code: read_u16(src)?,
            reply_text: read_short_str(src)?,
            class_id: read_u16(src)?,
            method_id: read_u16(src)?,
        })
    }
}

/// `connection.close-ok`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseOk;

impl MethodArgs for CloseOk {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 51;
    const NAME: &'static str = "connection.close-ok";

    fn encode_args(&self, _dst: &mut BytesMut) -> Result<(), Error> {
        Ok(())
    }

    fn decode_args(_src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self)
    }
}

/// `connection.blocked`, a RabbitMQ extension signalling resource alarms
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Blocked {
    /// Reason given by the broker
    pub reason: String,
}

impl MethodArgs for Blocked {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 60;
    const NAME: &'static str = "connection.blocked";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        write_short_str(dst, &self.reason)
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self {
            reason: read_short_str(src)?,
        })
    }
}

/// `connection.unblocked`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Unblocked;

impl MethodArgs for Unblocked {
    const CLASS_ID: u16 = CLASS_CONNECTION;
    const METHOD_ID: u16 = 61;
    const NAME: &'static str = "connection.unblocked";

    fn encode_args(&self, _dst: &mut BytesMut) -> Result<(), Error> {
        Ok(())
    }

    fn decode_args(_src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self)
    }
}
