//! Protocol methods carried in method frames
//!
//! A method payload starts with the class id and method id (two shorts) followed by
//! the method arguments. [`Method`] dispatches on the id pair; every argument struct
//! implements [`MethodArgs`].

use bytes::{BufMut, Bytes, BytesMut};

use crate::{primitives::read_u16, Error};

pub mod basic;
pub mod channel;
pub mod connection;

/// Arguments of a single protocol method
pub trait MethodArgs: Sized {
    /// Class id
    const CLASS_ID: u16;

    /// Method id within the class
    const METHOD_ID: u16;

    /// Dotted method name, eg. `connection.start`
    const NAME: &'static str;

    /// Writes the arguments (without the class and method ids)
    fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error>;

    /// Reads the arguments (the class and method ids are already consumed)
    fn decode_args(src: &mut Bytes) -> Result<Self, Error>;
}

macro_rules! methods {
    ($($variant:ident($ty:ty)),* $(,)?) => {
        /// A decoded method
        #[derive(Debug, Clone, PartialEq)]
        pub enum Method {
            $(
                #[doc = concat!("`", stringify!($ty), "`")]
                $variant($ty),
            )*
        }

        impl Method {
            /// Class id of the method
            pub fn class_id(&self) -> u16 {
                match self {
                    $(Method::$variant(_) => <$ty as MethodArgs>::CLASS_ID,)*
                }
            }

            /// Method id of the method
            pub fn method_id(&self) -> u16 {
                match self {
                    $(Method::$variant(_) => <$ty as MethodArgs>::METHOD_ID,)*
                }
            }

            /// Dotted name of the method
            pub fn name(&self) -> &'static str {
                match self {
                    $(Method::$variant(_) => <$ty as MethodArgs>::NAME,)*
                }
            }

            fn encode_args(&self, dst: &mut BytesMut) -> Result<(), Error> {
                match self {
                    $(Method::$variant(args) => args.encode_args(dst),)*
                }
            }

            fn decode_args(class_id: u16, method_id: u16, src: &mut Bytes) -> Result<Self, Error> {
                $(
                    if class_id == <$ty as MethodArgs>::CLASS_ID
                        && method_id == <$ty as MethodArgs>::METHOD_ID
                    {
                        return <$ty as MethodArgs>::decode_args(src).map(Method::$variant);
                    }
                )*
                Err(Error::UnknownMethod { class_id, method_id })
            }
        }

        $(
            impl From<$ty> for Method {
                fn from(args: $ty) -> Self {
                    Method::$variant(args)
                }
            }
        )*
    };
}

methods! {
    ConnectionStart(connection::Start),
    ConnectionStartOk(connection::StartOk),
    ConnectionSecure(connection::Secure),
    ConnectionSecureOk(connection::SecureOk),
    ConnectionTune(connection::Tune),
    ConnectionTuneOk(connection::TuneOk),
    ConnectionOpen(connection::Open),
    ConnectionOpenOk(connection::OpenOk),
    ConnectionClose(connection::Close),
    ConnectionCloseOk(connection::CloseOk),
    ConnectionBlocked(connection::Blocked),
    ConnectionUnblocked(connection::Unblocked),
    ChannelOpen(channel::Open),
    ChannelOpenOk(channel::OpenOk),
    ChannelFlow(channel::Flow),
    ChannelFlowOk(channel::FlowOk),
    ChannelClose(channel::Close),
    ChannelCloseOk(channel::CloseOk),
    BasicPublish(basic::Publish),
}

impl Method {
    /// Encodes class id, method id and arguments
    pub fn encode(&self, dst: &mut BytesMut) -> Result<(), Error> {
        dst.put_u16(self.class_id());
        dst.put_u16(self.method_id());
        self.encode_args(dst)
    }

    /// Decodes a complete method payload
    pub fn decode(mut src: Bytes) -> Result<Self, Error> {
        let class_id = read_u16(&mut src)?;
        let method_id = read_u16(&mut src)?;
        let method = Self::decode_args(class_id, method_id, &mut src)?;
        match src.is_empty() {
            true => Ok(method),
            false => Err(Error::TrailingBytes(src.len())),
        }
    }
}
