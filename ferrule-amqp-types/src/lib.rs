#![warn(missing_docs, missing_debug_implementations)]

//! Implements the AMQP 0.9.1 data types used by the `ferrule-amqp` client core.
//!
//! The crate covers the encoding of field values and field tables, the subset of
//! protocol methods needed to establish a connection and manage channels, and the
//! content header that precedes message bodies. It performs no I/O: encoding writes
//! into a [`bytes::BytesMut`] and decoding consumes a [`bytes::Bytes`].

pub mod definitions;
pub mod error;
pub mod header;
pub mod methods;
pub mod primitives;
pub mod value;

pub use error::Error;
pub use header::{BasicProperties, ContentHeader};
pub use methods::Method;
pub use value::{FieldTable, FieldValue};
