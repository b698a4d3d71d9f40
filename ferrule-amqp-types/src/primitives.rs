//! Checked readers and writers for the primitive domains of AMQP 0.9.1
//!
//! All integers are big-endian. A short string carries a one octet length, a long
//! string a four octet length. Consecutive bit fields of a method share one octet.

use bytes::{Buf, BufMut, Bytes, BytesMut};

use crate::Error;

fn ensure(src: &Bytes, len: usize) -> Result<(), Error> {
    match src.remaining() >= len {
        true => Ok(()),
        false => Err(Error::UnexpectedEof),
    }
}

/// Reads an octet
pub fn read_u8(src: &mut Bytes) -> Result<u8, Error> {
    ensure(src, 1)?;
    Ok(src.get_u8())
}

/// Reads a short (16 bit) integer
pub fn read_u16(src: &mut Bytes) -> Result<u16, Error> {
    ensure(src, 2)?;
    Ok(src.get_u16())
}

/// Reads a long (32 bit) integer
pub fn read_u32(src: &mut Bytes) -> Result<u32, Error> {
    ensure(src, 4)?;
    Ok(src.get_u32())
}

/// Reads a long long (64 bit) integer
pub fn read_u64(src: &mut Bytes) -> Result<u64, Error> {
    ensure(src, 8)?;
    Ok(src.get_u64())
}

/// Splits `len` raw bytes off the front of `src`
pub fn read_bytes(src: &mut Bytes, len: usize) -> Result<Bytes, Error> {
    ensure(src, len)?;
    Ok(src.split_to(len))
}

fn into_string(bytes: Bytes) -> Result<String, Error> {
    String::from_utf8(bytes.to_vec()).map_err(|_| Error::InvalidUtf8Encoding)
}

/// Reads a short string
pub fn read_short_str(src: &mut Bytes) -> Result<String, Error> {
    let len = read_u8(src)? as usize;
    read_bytes(src, len).and_then(into_string)
}

/// Reads a long string as raw bytes
pub fn read_long_bytes(src: &mut Bytes) -> Result<Bytes, Error> {
    let len = read_u32(src)? as usize;
    read_bytes(src, len)
}

/// Reads a long string that must be valid UTF-8
pub fn read_long_str(src: &mut Bytes) -> Result<String, Error> {
    read_long_bytes(src).and_then(into_string)
}

/// Writes a short string, failing if it is longer than 255 bytes
pub fn write_short_str(dst: &mut BytesMut, value: &str) -> Result<(), Error> {
    let len = u8::try_from(value.len()).map_err(|_| Error::ShortStringTooLong(value.len()))?;
    dst.put_u8(len);
    dst.put_slice(value.as_bytes());
    Ok(())
}

/// Writes a long string
pub fn write_long_bytes(dst: &mut BytesMut, value: &[u8]) {
    dst.put_u32(value.len() as u32);
    dst.put_slice(value);
}

/// Reads one octet of packed bit fields
pub fn read_bits<const N: usize>(src: &mut Bytes) -> Result<[bool; N], Error> {
    let octet = read_u8(src)?;
    let mut bits = [false; N];
    for (i, bit) in bits.iter_mut().enumerate() {
        *bit = octet & (1 << i) != 0;
    }
    Ok(bits)
}

/// Packs up to eight bit fields into one octet, the first field in the lowest bit
pub fn write_bits(dst: &mut BytesMut, bits: &[bool]) {
    let octet = bits
        .iter()
        .take(8)
        .enumerate()
        .fold(0u8, |acc, (i, bit)| acc | ((*bit as u8) << i));
    dst.put_u8(octet);
}

#[cfg(test)]
mod tests {
    use bytes::{Bytes, BytesMut};

    use super::*;

    #[test]
    fn short_string_layout() {
        let mut dst = BytesMut::new();
        write_short_str(&mut dst, "PLAIN").unwrap();
        assert_eq!(&dst[..], b"\x05PLAIN");

        let mut src = dst.freeze();
        assert_eq!(read_short_str(&mut src).unwrap(), "PLAIN");
        assert!(src.is_empty());
    }

    #[test]
    fn short_string_longer_than_255_is_rejected() {
        let long = "a".repeat(256);
        let mut dst = BytesMut::new();
        assert_eq!(
            write_short_str(&mut dst, &long),
            Err(Error::ShortStringTooLong(256))
        );
    }

    #[test]
    fn truncated_long_string_is_eof() {
        let mut src = Bytes::from_static(&[0, 0, 0, 5, b'a', b'b']);
        assert_eq!(read_long_bytes(&mut src), Err(Error::UnexpectedEof));
    }

    #[test]
    fn bits_are_packed_lowest_first() {
        let mut dst = BytesMut::new();
        write_bits(&mut dst, &[true, false, true]);
        assert_eq!(&dst[..], &[0b0000_0101]);

        let mut src = dst.freeze();
        let bits: [bool; 3] = read_bits(&mut src).unwrap();
        assert_eq!(bits, [true, false, true]);
    }
}
