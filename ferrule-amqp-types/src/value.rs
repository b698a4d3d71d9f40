//! Field values and field tables
//!
//! Tags follow the dialect used by RabbitMQ and most 0.9.1 brokers, which differs
//! from the AMQP 0.9.1 errata for the 16 bit and unsigned 32 bit types.

use std::collections::BTreeMap;

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::{
    primitives::{
        read_bytes, read_long_bytes, read_long_str, read_short_str, read_u32, read_u64, read_u8,
        write_long_bytes, write_short_str,
    },
    Error,
};

/// A table of named field values
pub type FieldTable = BTreeMap<String, FieldValue>;

/// A value stored in a [`FieldTable`] or a field array
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    /// `t`
    Boolean(bool),
    /// `b`
    ShortShortInt(i8),
    /// `B`
    ShortShortUInt(u8),
    /// `s`
    ShortInt(i16),
    /// `u`
    ShortUInt(u16),
    /// `I`
    LongInt(i32),
    /// `i`
    LongUInt(u32),
    /// `l`
    LongLongInt(i64),
    /// `f`
    Float(f32),
    /// `d`
    Double(f64),
    /// `D`, a value of `value / 10^scale`
    Decimal {
        /// Number of decimal digits
        scale: u8,
        /// Unscaled value
        value: u32,
    },
    /// `S`
    LongString(String),
    /// `A`
    FieldArray(Vec<FieldValue>),
    /// `T`, seconds since the epoch
    Timestamp(u64),
    /// `F`
    FieldTable(FieldTable),
    /// `V`
    Void,
    /// `x`
    ByteArray(Bytes),
}

impl FieldValue {
    /// The tag octet written in front of the value
    pub fn tag(&self) -> u8 {
        match self {
            FieldValue::Boolean(_) => b't',
            FieldValue::ShortShortInt(_) => b'b',
            FieldValue::ShortShortUInt(_) => b'B',
            FieldValue::ShortInt(_) => b's',
            FieldValue::ShortUInt(_) => b'u',
            FieldValue::LongInt(_) => b'I',
            FieldValue::LongUInt(_) => b'i',
            FieldValue::LongLongInt(_) => b'l',
            FieldValue::Float(_) => b'f',
            FieldValue::Double(_) => b'd',
            FieldValue::Decimal { .. } => b'D',
            FieldValue::LongString(_) => b'S',
            FieldValue::FieldArray(_) => b'A',
            FieldValue::Timestamp(_) => b'T',
            FieldValue::FieldTable(_) => b'F',
            FieldValue::Void => b'V',
            FieldValue::ByteArray(_) => b'x',
        }
    }

    /// Writes the tag followed by the value
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u8(self.tag());
        match self {
            FieldValue::Boolean(v) => dst.put_u8(*v as u8),
            FieldValue::ShortShortInt(v) => dst.put_i8(*v),
            FieldValue::ShortShortUInt(v) => dst.put_u8(*v),
            FieldValue::ShortInt(v) => dst.put_i16(*v),
            FieldValue::ShortUInt(v) => dst.put_u16(*v),
            FieldValue::LongInt(v) => dst.put_i32(*v),
            FieldValue::LongUInt(v) => dst.put_u32(*v),
            FieldValue::LongLongInt(v) => dst.put_i64(*v),
            FieldValue::Float(v) => dst.put_f32(*v),
            FieldValue::Double(v) => dst.put_f64(*v),
            FieldValue::Decimal { scale, value } => {
                dst.put_u8(*scale);
                dst.put_u32(*value);
            }
            FieldValue::LongString(v) => write_long_bytes(dst, v.as_bytes()),
            FieldValue::FieldArray(values) => {
                let mut buf = BytesMut::new();
                for value in values {
                    value.encode(&mut buf)?;
                }
                write_long_bytes(dst, &buf);
            }
            FieldValue::Timestamp(v) => dst.put_u64(*v),
            FieldValue::FieldTable(table) => encode_table(dst, table)?,
            FieldValue::Void => {}
            FieldValue::ByteArray(v) => write_long_bytes(dst, v),
        }
        Ok(())
    }

    /// Reads a tag and the value that follows it
    pub fn decode(src: &mut Bytes) -> Result<Self, Error> {
        let tag = read_u8(src)?;
        let value = match tag {
            b't' => FieldValue::Boolean(read_u8(src)? != 0),
            b'b' => FieldValue::ShortShortInt(read_u8(src)? as i8),
            b'B' => FieldValue::ShortShortUInt(read_u8(src)?),
            b's' => FieldValue::ShortInt(read_bytes(src, 2)?.get_i16()),
            b'u' => FieldValue::ShortUInt(read_bytes(src, 2)?.get_u16()),
            b'I' => FieldValue::LongInt(read_bytes(src, 4)?.get_i32()),
            b'i' => FieldValue::LongUInt(read_u32(src)?),
            b'l' => FieldValue::LongLongInt(read_bytes(src, 8)?.get_i64()),
            b'f' => FieldValue::Float(read_bytes(src, 4)?.get_f32()),
            b'd' => FieldValue::Double(read_bytes(src, 8)?.get_f64()),
            b'D' => FieldValue::Decimal {
                scale: read_u8(src)?,
                value: read_u32(src)?,
            },
            b'S' => FieldValue::LongString(read_long_str(src)?),
            b'A' => {
                let mut buf = read_long_bytes(src)?;
                let mut values = Vec::new();
                while buf.has_remaining() {
                    values.push(FieldValue::decode(&mut buf)?);
                }
                FieldValue::FieldArray(values)
            }
            b'T' => FieldValue::Timestamp(read_u64(src)?),
            b'F' => FieldValue::FieldTable(decode_table(src)?),
            b'V' => FieldValue::Void,
            b'x' => FieldValue::ByteArray(read_long_bytes(src)?),
            other => return Err(Error::UnknownFieldType(other)),
        };
        Ok(value)
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Boolean(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::LongString(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::LongString(value)
    }
}

impl From<u16> for FieldValue {
    fn from(value: u16) -> Self {
        FieldValue::ShortUInt(value)
    }
}

impl From<i32> for FieldValue {
    fn from(value: i32) -> Self {
        FieldValue::LongInt(value)
    }
}

impl From<i64> for FieldValue {
    fn from(value: i64) -> Self {
        FieldValue::LongLongInt(value)
    }
}

impl From<FieldTable> for FieldValue {
    fn from(value: FieldTable) -> Self {
        FieldValue::FieldTable(value)
    }
}

/// Writes a field table as a long-string sized block of `name, value` pairs
pub fn encode_table(dst: &mut BytesMut, table: &FieldTable) -> Result<(), Error> {
    let mut buf = BytesMut::new();
    for (name, value) in table {
        write_short_str(&mut buf, name)?;
        value.encode(&mut buf)?;
    }
    write_long_bytes(dst, &buf);
    Ok(())
}

/// Reads a field table
pub fn decode_table(src: &mut Bytes) -> Result<FieldTable, Error> {
    let mut buf = read_long_bytes(src)?;
    let mut table = FieldTable::new();
    while buf.has_remaining() {
        let name = read_short_str(&mut buf)?;
        let value = FieldValue::decode(&mut buf)?;
        table.insert(name, value);
    }
    Ok(table)
}
