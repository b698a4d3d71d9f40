//! Methods of the `basic` class (class id 60) used by content-carrying framesets

use bytes::{BufMut, Bytes, BytesMut};

use super::MethodArgs;
use crate::{
    definitions::CLASS_BASIC,
    primitives::{read_bits, read_short_str, read_u16, write_bits, write_short_str},
    Error,
};

/// `basic.publish`, followed on the wire by a content header and body frames
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Publish {
    /// Exchange name, empty for the default exchange
    pub exchange: String,
    /// Routing key
    pub routing_key: String,
    /// Return the message if it cannot be routed
    pub mandatory: bool,
    /// Return the message if it cannot be delivered immediately
    pub immediate: bool,
}

impl MethodArgs for Publish {
    const CLASS_ID: u16 = CLASS_BASIC;
    const METHOD_ID: u16 = 40;
    const NAME: &'static str = "basic.publish";

    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
        // reserved-1 (ticket)
        dst.put_u16(0);
        write_short_str(dst, &self.exchange)?;
        write_short_str(dst, &self.routing_key)?;
        write_bits(dst, &[self.mandatory, self.immediate]);
        Ok(())
    }

    fn decode_args(src: &mut Bytes) -> Result<Self, Error> {
        let _ticket = read_u16(src)?;
        let exchange = read_short_str(src)?;
        let routing_key = read_short_str(src)?;
        let [mandatory, immediate] = read_bits::<2>(src)?;
        Ok(Self {
            exchange,
            routing_key,
            mandatory,
            immediate,
        })
    }
}

#[cfg(test)]
mod tests {
    use bytes::BytesMut;

    use super::Publish;
    use crate::Method;

    #[test]
    fn publish_packs_flags() {
        let publish = Publish {
            exchange: "".into(),
            routing_key: "q".into(),
            mandatory: true,
            immediate: false,
        };
        let mut dst = BytesMut::new();
        Method::from(publish.clone()).encode(&mut dst).unwrap();
        assert_eq!(&dst[..], &[0, 60, 0, 40, 0, 0, 0, 1, b'q', 0b01]);
        assert_eq!(
            Method::decode(dst.freeze()).unwrap(),
            Method::BasicPublish(publish)
        );
    }
}
