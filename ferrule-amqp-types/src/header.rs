//! Content header carried in header frames
//!
//! ```text
//! short     class-id
//! short     weight (always 0)
//! longlong  body-size
//! short     property-flags
//! ...       properties present in property-flags, in flag order
//! ```

use bytes::{BufMut, Bytes, BytesMut};

use crate::{
    definitions::CLASS_BASIC,
    primitives::{read_short_str, read_u16, read_u64, read_u8, write_short_str},
    value::{decode_table, encode_table},
    Error, FieldTable,
};

const FLAG_CONTINUATION: u16 = 0x0001;

const FLAG_CONTENT_TYPE: u16 = 0x8000;
const FLAG_CONTENT_ENCODING: u16 = 0x4000;
const FLAG_HEADERS: u16 = 0x2000;
const FLAG_DELIVERY_MODE: u16 = 0x1000;
const FLAG_PRIORITY: u16 = 0x0800;
const FLAG_CORRELATION_ID: u16 = 0x0400;
const FLAG_REPLY_TO: u16 = 0x0200;
const FLAG_EXPIRATION: u16 = 0x0100;
const FLAG_MESSAGE_ID: u16 = 0x0080;
const FLAG_TIMESTAMP: u16 = 0x0040;
const FLAG_TYPE: u16 = 0x0020;
const FLAG_USER_ID: u16 = 0x0010;
const FLAG_APP_ID: u16 = 0x0008;
const FLAG_CLUSTER_ID: u16 = 0x0004;

/// Properties of the `basic` content class
#[derive(Debug, Clone, PartialEq, Default)]
pub struct BasicProperties {
    /// MIME content type
    pub content_type: Option<String>,
    /// MIME content encoding
    pub content_encoding: Option<String>,
    /// Application headers
    pub headers: Option<FieldTable>,
    /// 1 for transient, 2 for persistent
    pub delivery_mode: Option<u8>,
    /// Message priority, 0 to 9
    pub priority: Option<u8>,
    /// Application correlation identifier
    pub correlation_id: Option<String>,
    /// Address to reply to
    pub reply_to: Option<String>,
    /// Message expiration
    pub expiration: Option<String>,
    /// Application message identifier
    pub message_id: Option<String>,
    /// Message timestamp
    pub timestamp: Option<u64>,
    /// Message type name
    pub kind: Option<String>,
    /// Creating user id
    pub user_id: Option<String>,
    /// Creating application id
    pub app_id: Option<String>,
    /// Reserved, must be empty
    pub cluster_id: Option<String>,
}

impl BasicProperties {
    fn flags(&self) -> u16 {
        [
            (self.content_type.is_some(), FLAG_CONTENT_TYPE),
            (self.content_encoding.is_some(), FLAG_CONTENT_ENCODING),
            (self.headers.is_some(), FLAG_HEADERS),
            (self.delivery_mode.is_some(), FLAG_DELIVERY_MODE),
            (self.priority.is_some(), FLAG_PRIORITY),
            (self.correlation_id.is_some(), FLAG_CORRELATION_ID),
            (self.reply_to.is_some(), FLAG_REPLY_TO),
            (self.expiration.is_some(), FLAG_EXPIRATION),
            (self.message_id.is_some(), FLAG_MESSAGE_ID),
            (self.timestamp.is_some(), FLAG_TIMESTAMP),
            (self.kind.is_some(), FLAG_TYPE),
            (self.user_id.is_some(), FLAG_USER_ID),
            (self.app_id.is_some(), FLAG_APP_ID),
            (self.cluster_id.is_some(), FLAG_CLUSTER_ID),
        ]
        .iter()
        .filter(|(present, _)| *present)
        .fold(0, |acc, (_, flag)| acc | flag)
    }

    fn encode(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u16(self.flags());

        fn put_str(dst: &mut BytesMut, value: &Option<String>) -> Result<(), Error> {
            match value {
                Some(value) => write_short_str(dst, value),
                None => Ok(()),
            }
        }

        put_str(dst, &self.content_type)?;
        put_str(dst, &self.content_encoding)?;
        if let Some(headers) = &self.headers {
            encode_table(dst, headers)?;
        }
        if let Some(delivery_mode) = self.delivery_mode {
            dst.put_u8(delivery_mode);
        }
        if let Some(priority) = self.priority {
            dst.put_u8(priority);
        }
        put_str(dst, &self.correlation_id)?;
        put_str(dst, &self.reply_to)?;
        put_str(dst, &self.expiration)?;
        put_str(dst, &self.message_id)?;
        if let Some(timestamp) = self.timestamp {
            dst.put_u64(timestamp);
        }
        put_str(dst, &self.kind)?;
        put_str(dst, &self.user_id)?;
        put_str(dst, &self.app_id)?;
        put_str(dst, &self.cluster_id)
    }

    fn decode(src: &mut Bytes) -> Result<Self, Error> {
        let flags = read_u16(src)?;
        if flags & FLAG_CONTINUATION != 0 {
            return Err(Error::PropertyFlagsContinuation);
        }

        let str_if = |src: &mut Bytes, flag: u16| -> Result<Option<String>, Error> {
            match flags & flag != 0 {
                true => read_short_str(src).map(Some),
                false => Ok(None),
            }
        };

        let content_type = str_if(src, FLAG_CONTENT_TYPE)?;
        let content_encoding = str_if(src, FLAG_CONTENT_ENCODING)?;
        let headers = match flags & FLAG_HEADERS != 0 {
            true => Some(decode_table(src)?),
            false => None,
        };
        let delivery_mode = match flags & FLAG_DELIVERY_MODE != 0 {
            true => Some(read_u8(src)?),
            false => None,
        };
        let priority = match flags & FLAG_PRIORITY != 0 {
            true => Some(read_u8(src)?),
            false => None,
        };
        let correlation_id = str_if(src, FLAG_CORRELATION_ID)?;
        let reply_to = str_if(src, FLAG_REPLY_TO)?;
        let expiration = str_if(src, FLAG_EXPIRATION)?;
        let message_id = str_if(src, FLAG_MESSAGE_ID)?;
        let timestamp = match flags & FLAG_TIMESTAMP != 0 {
            true => Some(read_u64(src)?),
            false => None,
        };
        let kind = str_if(src, FLAG_TYPE)?;
        let user_id = str_if(src, FLAG_USER_ID)?;
        let app_id = str_if(src, FLAG_APP_ID)?;
        let cluster_id = str_if(src, FLAG_CLUSTER_ID)?;

        Ok(Self {
            content_type,
            content_encoding,
            headers,
            delivery_mode,
            priority,
            correlation_id,
            reply_to,
            expiration,
            message_id,
            timestamp,
            kind,
            user_id,
            app_id,
            cluster_id,
        })
    }
}

/// The header frame payload that precedes the body frames of a message
#[derive(Debug, Clone, PartialEq)]
pub struct ContentHeader {
    /// Content class, same as the class of the method that carries the content
    pub class_id: u16,
    /// Total size of the body frames that follow
    pub body_size: u64,
    /// Content properties
    pub properties: BasicProperties,
}

impl ContentHeader {
    /// Creates a header for a `basic` class content of `body_size` octets
    pub fn basic(body_size: u64, properties: BasicProperties) -> Self {
        Self {
            class_id: CLASS_BASIC,
            body_size,
            properties,
        }
    }

    /// Encodes the header payload
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u16(self.class_id);
        // weight
        dst.put_u16(0);
        dst.put_u64(self.body_size);
        self.properties.encode(dst)
    }

    /// Decodes a complete header payload
    pub fn decode(mut src: Bytes) -> Result<Self, Error> {
        let class_id = read_u16(&mut src)?;
        let _weight = read_u16(&mut src)?;
        let body_size = read_u64(&mut src)?;
        let properties = BasicProperties::decode(&mut src)?;
        match src.is_empty() {
            true => Ok(Self {
                class_id,
                body_size,
                properties,
            }),
            false => Err(Error::TrailingBytes(src.len())),
        }
    }
}
