//! Methods of the `channel` class (class id 20)

use bytes::{BufMut, Bytes, BytesMut};

use super::MethodArgs;
use crate::{
    definitions::CLASS_CHANNEL,
    primitives::{
        read_bits, read_long_bytes, read_short_str, read_u16, write_bits, write_long_bytes,
        write_short_str,
    },
    Error,
};

/// `channel.open`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Open;

impl MethodArgs for Open {
    const CLASS_ID: u16 = CLASS_CHANNEL;
    const METHOD_ID: u16 = 10;
    const NAME: &'static str = "channel.open";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        // reserved-1 (out-of-band)
        write_short_str(dst, "")
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let _out_of_band = read_short_str(src)?;
        Ok(Self)
    }
}

/// `channel.open-ok`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct OpenOk;

impl MethodArgs for OpenOk {
    const CLASS_ID: u16 = CLASS_CHANNEL;
    const METHOD_ID: u16 = 11;
    const NAME: &'static str = "channel.open-ok";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        // reserved-1 (channel-id)
        write_long_bytes(dst, b"");
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let _channel_id = read_long_bytes(src)?;
        Ok(Self)
    }
}

/// `channel.flow`, asks the peer to pause or restart content delivery
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Flow {
    /// `true` to start sending content frames, `false` to stop
    pub active: bool,
}

impl MethodArgs for Flow {
    const CLASS_ID: u16 = CLASS_CHANNEL;
    const METHOD_ID: u16 = 20;
    const NAME: &'static str = "channel.flow";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        write_bits(dst, &[self.active]);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let [active] = read_bits::<1>(src)?;
        Ok(Self { active })
    }
}

/// `channel.flow-ok`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct FlowOk {
    /// Current flow setting
    pub active: bool,
}

impl MethodArgs for FlowOk {
    const CLASS_ID: u16 = CLASS_CHANNEL;
    const METHOD_ID: u16 = 21;
    const NAME: &'static str = "channel.flow-ok";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        write_bits(dst, &[self.active]);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let [active] = read_bits::<1>(src)?;
        Ok(Self { active })
    }
}

/// `channel.close`, sent by either peer to end a channel
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
    const CLASS_ID: u16 = CLASS_CHANNEL;
    const METHOD_ID: u16 = 40;
    const NAME: &'static str = "channel.close";

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

/// `channel.close-ok`
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CloseOk;

impl MethodArgs for CloseOk {
    const CLASS_ID: u16 = CLASS_CHANNEL;
    const METHOD_ID: u16 = 41;
    const NAME: &'static str = "channel.close-ok";

    fn encode_args(&self, _dst: &mut BytesMut) -> Result<(), Error> {
        Ok(())
    }

    fn decode_args(_src: &mut Bytes) -> Result<Self, Error> {
        Ok(Self)
    }
}
