//! Variable-byte integer encoding utilities.
//!
//! This module provides the byte-aligned integer compression used by the
//! posting files. Values are split into 7-bit groups emitted most significant
//! group first, and the high bit of a byte marks the final byte of a value.
//! Zero therefore encodes as the single byte `0x80`, and a stream that ends
//! before a terminator byte is reported as corrupt.

use std::io::{self, Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{PilumError, Result};

/// Encode a u32 value using variable-byte encoding.
///
/// Uses 7 bits per byte, most significant group first. The final byte of a
/// value carries the high bit as a terminator.
pub fn encode_u32(value: u32) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut val = value;

    loop {
        bytes.push((val % 128) as u8);
        val /= 128;

        if val == 0 {
            break;
        }
    }

    // Groups were produced least significant first. The terminator belongs on
    // the least significant group, which becomes the last byte on the wire.
    bytes[0] |= 0x80;
    bytes.reverse();

    bytes
}

/// Decode a u32 value from variable-byte encoding.
pub fn decode_u32(bytes: &[u8]) -> Result<(u32, usize)> {
    let mut result = 0u32;
    let mut bytes_read = 0;

    for &byte in bytes {
        bytes_read += 1;

        result = result
            .checked_mul(128)
            .and_then(|v| v.checked_add((byte & 0x7F) as u32))
            .ok_or_else(|| PilumError::corrupt("variable-byte value overflows u32"))?;

        if byte & 0x80 != 0 {
            return Ok((result, bytes_read));
        }
    }

    Err(PilumError::corrupt(
        "variable-byte stream ends without a terminator byte",
    ))
}

/// Encode a u64 value using variable-byte encoding.
pub fn encode_u64(value: u64) -> Vec<u8> {
    let mut bytes = Vec::new();
    let mut val = value;

    loop {
        bytes.push((val % 128) as u8);
        val /= 128;

        if val == 0 {
            break;
        }
    }

    bytes[0] |= 0x80;
    bytes.reverse();

    bytes
}

/// Decode a u64 value from variable-byte encoding.
pub fn decode_u64(bytes: &[u8]) -> Result<(u64, usize)> {
    let mut result = 0u64;
    let mut bytes_read = 0;

    for &byte in bytes {
        bytes_read += 1;

        result = result
            .checked_mul(128)
            .and_then(|v| v.checked_add((byte & 0x7F) as u64))
            .ok_or_else(|| PilumError::corrupt("variable-byte value overflows u64"))?;

        if byte & 0x80 != 0 {
            return Ok((result, bytes_read));
        }
    }

    Err(PilumError::corrupt(
        "variable-byte stream ends without a terminator byte",
    ))
}

/// Write a variable-byte encoded u32 to a writer.
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<usize> {
    let bytes = encode_u32(value);
    writer.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Read a variable-byte encoded u32 from a reader.
pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut result = 0u32;

    loop {
        let byte = read_byte(reader)?;

        result = result
            .checked_mul(128)
            .and_then(|v| v.checked_add((byte & 0x7F) as u32))
            .ok_or_else(|| PilumError::corrupt("variable-byte value overflows u32"))?;

        if byte & 0x80 != 0 {
            return Ok(result);
        }
    }
}

/// Write a variable-byte encoded u64 to a writer.
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<usize> {
    let bytes = encode_u64(value);
    writer.write_all(&bytes)?;
    Ok(bytes.len())
}

/// Read a variable-byte encoded u64 from a reader.
pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut result = 0u64;

    loop {
        let byte = read_byte(reader)?;

        result = result
            .checked_mul(128)
            .and_then(|v| v.checked_add((byte & 0x7F) as u64))
            .ok_or_else(|| PilumError::corrupt("variable-byte value overflows u64"))?;

        if byte & 0x80 != 0 {
            return Ok(result);
        }
    }
}

fn read_byte<R: Read>(reader: &mut R) -> Result<u8> {
    match reader.read_u8() {
        Ok(byte) => Ok(byte),
        Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => Err(PilumError::corrupt(
            "variable-byte stream ends without a terminator byte",
        )),
        Err(e) => Err(e.into()),
    }
}

/// A trait for types that can be encoded as variable-byte integers.
pub trait VarInt: Sized {
    /// Encode this value as a variable-byte integer.
    fn encode_varint(&self) -> Vec<u8>;

    /// Decode a variable-byte integer from bytes.
    fn decode_varint(bytes: &[u8]) -> Result<(Self, usize)>;

    /// Write this value as a variable-byte integer to a writer.
    fn write_varint<W: Write>(&self, writer: &mut W) -> Result<usize>;

    /// Read a variable-byte integer from a reader.
    fn read_varint<R: Read>(reader: &mut R) -> Result<Self>;
}

impl VarInt for u32 {
    fn encode_varint(&self) -> Vec<u8> {
        encode_u32(*self)
    }

    fn decode_varint(bytes: &[u8]) -> Result<(Self, usize)> {
        decode_u32(bytes)
    }

    fn write_varint<W: Write>(&self, writer: &mut W) -> Result<usize> {
        write_u32(writer, *self)
    }

    fn read_varint<R: Read>(reader: &mut R) -> Result<Self> {
        read_u32(reader)
    }
}

impl VarInt for u64 {
    fn encode_varint(&self) -> Vec<u8> {
        encode_u64(*self)
    }

    fn decode_varint(bytes: &[u8]) -> Result<(Self, usize)> {
        decode_u64(bytes)
    }

    fn write_varint<W: Write>(&self, writer: &mut W) -> Result<usize> {
        write_u64(writer, *self)
    }

    fn read_varint<R: Read>(reader: &mut R) -> Result<Self> {
        read_u64(reader)
    }
}
