//! Variable-length integer encoding.
//!
//! 7 bits per byte, least significant group first, with a continuation bit
//! in the high bit (the usual protocol-buffers layout). The dictionary
//! persistence format uses it for counts and delta-coded posting lists.

use std::io::{Read, Write};

use byteorder::ReadBytesExt;

use crate::error::{Result, TrievalError};

/// Write a variable-length encoded u32. Returns the number of bytes written.
pub fn write_u32<W: Write>(writer: &mut W, value: u32) -> Result<usize> {
    write_u64(writer, value as u64)
}

/// Write a variable-length encoded u64. Returns the number of bytes written.
pub fn write_u64<W: Write>(writer: &mut W, value: u64) -> Result<usize> {
    let mut val = value;
    let mut written = 0;
    loop {
        let mut byte = (val & 0x7F) as u8;
        val >>= 7;
        if val != 0 {
            byte |= 0x80;
        }
        writer.write_all(&[byte])?;
        written += 1;
        if val == 0 {
            return Ok(written);
        }
    }
}

/// Read a variable-length encoded u32.
pub fn read_u32<R: Read>(reader: &mut R) -> Result<u32> {
    let mut result = 0u32;
    let mut shift = 0u32;
    loop {
        let byte = reader.read_u8()?;
        if shift >= 32 {
            return Err(TrievalError::decoding("varint overflows u32"));
        }
        result |= ((byte & 0x7F) as u32) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}

/// Read a variable-length encoded u64.
pub fn read_u64<R: Read>(reader: &mut R) -> Result<u64> {
    let mut result = 0u64;
    let mut shift = 0u32;
    loop {
        let byte = reader.read_u8()?;
        if shift >= 64 {
            return Err(TrievalError::decoding("varint overflows u64"));
        }
        result |= ((byte & 0x7F) as u64) << shift;
        if byte & 0x80 == 0 {
            return Ok(result);
        }
        shift += 7;
    }
}
