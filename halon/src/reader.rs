//! Sequential reader over an in-memory byte buffer.
//!
//! Every PACK structure is decoded from a fully materialized buffer, so the
//! cursor tracks an explicit position and reports truncation with the offset
//! at which the read failed instead of a bare EOF.

use byteorder::{ByteOrder, LittleEndian};

use crate::error::{Error, Result};

/// Bounds-checked cursor over `&[u8]`. All integers are little-endian,
/// matching the PACK format.
pub struct PackCursor<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> PackCursor<'a> {
    pub fn new(buf: &'a [u8]) -> PackCursor<'a> {
        PackCursor { buf, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn remaining(&self) -> usize {
        self.buf.len() - self.pos
    }

    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        if self.remaining() < n {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed: n,
            });
        }
        let bytes = &self.buf[self.pos..self.pos + n];
        self.pos += n;
        Ok(bytes)
    }

    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(LittleEndian::read_u16(self.take(2)?))
    }

    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(LittleEndian::read_u32(self.take(4)?))
    }

    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(LittleEndian::read_u64(self.take(8)?))
    }

    /// Read exactly `n` bytes.
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Skip `n` bytes of padding or unknown data.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n)?;
        Ok(())
    }

    /// Read a u32 length prefix followed by that many bytes of UTF-8.
    /// The length is validated against the remaining buffer before any
    /// allocation happens.
    pub fn read_string(&mut self) -> Result<String> {
        let length = self.read_u32()? as usize;
        if self.remaining() < length {
            return Err(Error::TruncatedData {
                offset: self.pos,
                needed: length,
            });
        }
        let bytes = self.take(length)?;
        Ok(std::str::from_utf8(bytes)?.to_string())
    }
}
