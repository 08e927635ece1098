//! Little-endian binary codecs for the game protocol
//!
//! Readers consume from a `&mut &[u8]` cursor (advanced with [`bytes::Buf`]),
//! writers append to a [`BytesMut`]. Every reader checks the remaining length
//! first so a short buffer yields an error instead of a panic.

use bytes::{Buf, BufMut, BytesMut};
use hookwire_core::{Color3, HookwireError, Result};

#[inline]
fn ensure(buf: &&[u8], needed: usize, what: &str) -> Result<()> {
    if buf.remaining() < needed {
        return Err(HookwireError::InvalidData(format!(
            "Not enough bytes for {} (need {}, have {})",
            what,
            needed,
            buf.remaining()
        )));
    }
    Ok(())
}

/// Read a single byte
#[inline]
pub fn read_u8(buf: &mut &[u8]) -> Result<u8> {
    ensure(buf, 1, "u8")?;
    Ok(buf.get_u8())
}

/// Write a single byte
#[inline]
pub fn write_u8(buf: &mut BytesMut, val: u8) {
    buf.put_u8(val);
}

/// Read a boolean (any non-zero byte is `true`)
#[inline]
pub fn read_bool(buf: &mut &[u8]) -> Result<bool> {
    Ok(read_u8(buf)? != 0)
}

/// Write a boolean as `0` or `1`
#[inline]
pub fn write_bool(buf: &mut BytesMut, val: bool) {
    buf.put_u8(val as u8);
}

#[inline]
pub fn read_i16(buf: &mut &[u8]) -> Result<i16> {
    ensure(buf, 2, "i16")?;
    Ok(buf.get_i16_le())
}

#[inline]
pub fn write_i16(buf: &mut BytesMut, val: i16) {
    buf.put_i16_le(val);
}

#[inline]
pub fn read_u16(buf: &mut &[u8]) -> Result<u16> {
    ensure(buf, 2, "u16")?;
    Ok(buf.get_u16_le())
}

#[inline]
pub fn write_u16(buf: &mut BytesMut, val: u16) {
    buf.put_u16_le(val);
}

/// Read a 7-bit encoded length
///
/// # Format
/// Little-endian groups of 7 bits; the high bit of each byte marks a
/// continuation. At most 5 bytes are accepted.
pub fn read_7bit_len(buf: &mut &[u8]) -> Result<usize> {
    let mut value: u32 = 0;
    for shift in (0..35).step_by(7) {
        let byte = read_u8(buf)?;
        value |= ((byte & 0x7f) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(value as usize);
        }
    }
    Err(HookwireError::InvalidData("7-bit length is longer than 5 bytes".into()))
}

/// Write a 7-bit encoded length
pub fn write_7bit_len(buf: &mut BytesMut, len: usize) {
    let mut value = len as u32;
    while value >= 0x80 {
        buf.put_u8((value as u8) | 0x80);
        value >>= 7;
    }
    buf.put_u8(value as u8);
}

/// Read a length-prefixed UTF-8 string
///
/// # Format
/// ```text
/// {7BIT length}{UTF-8 bytes}
/// ```
pub fn read_string(buf: &mut &[u8]) -> Result<String> {
    let len = read_7bit_len(buf)?;
    ensure(buf, len, "string")?;
    let (text, rest) = buf.split_at(len);
    let text = std::str::from_utf8(text)
        .map_err(|e| HookwireError::InvalidData(format!("Invalid UTF-8 in string: {}", e)))?
        .to_owned();
    *buf = rest;
    Ok(text)
}

/// Write a length-prefixed UTF-8 string
pub fn write_string(buf: &mut BytesMut, val: &str) {
    write_7bit_len(buf, val.len());
    buf.put_slice(val.as_bytes());
}

/// Read a 3-byte RGB color
#[inline]
pub fn read_color(buf: &mut &[u8]) -> Result<Color3> {
    ensure(buf, 3, "color")?;
    Ok(Color3::new(buf.get_u8(), buf.get_u8(), buf.get_u8()))
}

#[inline]
pub fn write_color(buf: &mut BytesMut, val: Color3) {
    buf.put_u8(val.r);
    buf.put_u8(val.g);
    buf.put_u8(val.b);
}

/// Take every remaining byte
#[inline]
pub fn read_remaining(buf: &mut &[u8]) -> Vec<u8> {
    let bytes = buf.to_vec();
    buf.advance(buf.remaining());
    bytes
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_i16_little_endian() {
        let mut buf = BytesMut::new();
        write_i16(&mut buf, 500);
        assert_eq!(&buf[..], &[244, 1]);

        let mut slice = &buf[..];
        assert_eq!(read_i16(&mut slice).unwrap(), 500);
        assert!(slice.is_empty());
    }

    #[test]
    fn test_7bit_len_multi_byte() {
        let mut buf = BytesMut::new();
        write_7bit_len(&mut buf, 300);
        assert_eq!(&buf[..], &[0xac, 0x02]);

        let mut slice = &buf[..];
        assert_eq!(read_7bit_len(&mut slice).unwrap(), 300);
    }

    #[test]
    fn test_7bit_len_too_long() {
        let mut slice: &[u8] = &[0xff, 0xff, 0xff, 0xff, 0xff, 0x01];
        assert!(read_7bit_len(&mut slice).is_err());
    }

    #[test]
    fn test_string_matches_wire_bytes() {
        let mut slice: &[u8] = &[8, 84, 101, 114, 114, 97, 114, 105, 97];
        assert_eq!(read_string(&mut slice).unwrap(), "Terraria");

        let mut buf = BytesMut::new();
        write_string(&mut buf, "Terraria");
        assert_eq!(&buf[..], &[8, 84, 101, 114, 114, 97, 114, 105, 97]);
    }

    #[test]
    fn test_short_reads_are_errors() {
        let mut slice: &[u8] = &[1];
        assert!(read_u16(&mut slice).is_err());

        let mut slice: &[u8] = &[5, b'a', b'b'];
        assert!(read_string(&mut slice).is_err());

        let mut slice: &[u8] = &[];
        assert!(read_u8(&mut slice).is_err());
    }

    #[test]
    fn test_invalid_utf8_is_error() {
        let mut slice: &[u8] = &[2, 0xc3, 0x28];
        assert!(read_string(&mut slice).is_err());
    }
}
