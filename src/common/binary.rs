//! Bounds-checked byte cursor shared by the opcode parser and every codec.
//!
//! QuickDraw data is big-endian; a handful of little-endian readers exist for
//! embedded foreign formats (Targa). Every read validates
//! `position + length <= buffer length`, which is the only validation this
//! layer performs. Callers add their own domain checks.

use crate::common::error::{Error, Result};
use crate::common::fixed::FixedPoint;
use encoding_rs::MACINTOSH;
use std::fmt;
use zerocopy::{BE, FromBytes, I16, I32, LE, U16, U32, U64};

/// Four-character code (QuickTime codec types, application signatures).
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct FourCc(pub [u8; 4]);

impl FourCc {
    /// Build from a byte literal such as `b"cvid"`.
    pub const fn new(bytes: &[u8; 4]) -> Self {
        Self(*bytes)
    }

    /// The code as a Mac Roman decoded string.
    pub fn as_string(&self) -> String {
        let (text, _) = MACINTOSH.decode_without_bom_handling(&self.0);
        text.into_owned()
    }
}

impl fmt::Debug for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "'{}'", self.as_string())
    }
}

impl fmt::Display for FourCc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.as_string())
    }
}

/// Convert a signed length field into a usable byte count.
#[inline]
pub fn checked_len(length: i64, what: &'static str) -> Result<usize> {
    usize::try_from(length).map_err(|_| Error::InvalidLength { what, length })
}

/// Cursor over an immutable byte buffer.
#[derive(Debug, Clone)]
pub struct ByteReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> ByteReader<'a> {
    /// Create a cursor at the start of `data`.
    pub fn new(data: &'a [u8]) -> Self {
        Self { data, pos: 0 }
    }

    /// Create a cursor positioned at `offset`.
    pub fn at(data: &'a [u8], offset: usize) -> Result<Self> {
        if offset > data.len() {
            return Err(Error::OutOfBounds {
                offset,
                requested: 0,
                available: data.len(),
            });
        }
        Ok(Self { data, pos: offset })
    }

    /// Current position.
    #[inline]
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Total size of the underlying buffer.
    #[inline]
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// True if the underlying buffer is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Bytes left after the current position.
    #[inline]
    pub fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.pos)
    }

    /// True once every byte has been consumed.
    #[inline]
    pub fn at_end(&self) -> bool {
        self.remaining() == 0
    }

    /// The unread part of the buffer.
    #[inline]
    pub fn rest(&self) -> &'a [u8] {
        &self.data[self.pos.min(self.data.len())..]
    }

    /// Move to an absolute position.
    pub fn seek(&mut self, pos: usize) -> Result<()> {
        if pos > self.data.len() {
            return Err(Error::OutOfBounds {
                offset: pos,
                requested: 0,
                available: self.data.len(),
            });
        }
        self.pos = pos;
        Ok(())
    }

    /// Skip `n` bytes.
    pub fn skip(&mut self, n: usize) -> Result<()> {
        self.take(n).map(|_| ())
    }

    /// Skip forward so that `position - base` is a multiple of `alignment`.
    pub fn align(&mut self, base: usize, alignment: usize) -> Result<()> {
        let misalignment = self.pos.saturating_sub(base) % alignment;
        if misalignment != 0 {
            self.skip(alignment - misalignment)?;
        }
        Ok(())
    }

    #[inline]
    fn check(&self, n: usize) -> Result<()> {
        match self.pos.checked_add(n) {
            Some(end) if end <= self.data.len() => Ok(()),
            _ => Err(Error::OutOfBounds {
                offset: self.pos,
                requested: n,
                available: self.remaining(),
            }),
        }
    }

    #[inline]
    fn take(&mut self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        let slice = &self.data[self.pos..self.pos + n];
        self.pos += n;
        Ok(slice)
    }

    /// Look at the next `n` bytes without consuming them.
    pub fn peek_bytes(&self, n: usize) -> Result<&'a [u8]> {
        self.check(n)?;
        Ok(&self.data[self.pos..self.pos + n])
    }

    /// Borrow the next `n` bytes (no copy).
    pub fn read_bytes(&mut self, n: usize) -> Result<&'a [u8]> {
        self.take(n)
    }

    /// Copy the next `n` bytes.
    pub fn read_vec(&mut self, n: usize) -> Result<Vec<u8>> {
        self.take(n).map(<[u8]>::to_vec)
    }

    /// Read a fixed-size byte array.
    pub fn read_array<const N: usize>(&mut self) -> Result<[u8; N]> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.take(N)?);
        Ok(out)
    }

    /// Cursor over the next `n` bytes; the parent skips past them.
    pub fn sub_reader(&mut self, n: usize) -> Result<ByteReader<'a>> {
        Ok(ByteReader::new(self.take(n)?))
    }

    #[inline]
    pub fn peek_u8(&self) -> Result<u8> {
        Ok(self.peek_bytes(1)?[0])
    }

    #[inline]
    pub fn peek_u16(&self) -> Result<u16> {
        Ok(U16::<BE>::read_from_bytes(self.peek_bytes(2)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    #[inline]
    pub fn peek_u32(&self) -> Result<u32> {
        Ok(U32::<BE>::read_from_bytes(self.peek_bytes(4)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        Ok(self.take(1)?[0])
    }

    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        Ok(self.take(1)?[0] as i8)
    }

    /// Read a big-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(U16::<BE>::read_from_bytes(self.take(2)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a big-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(I16::<BE>::read_from_bytes(self.take(2)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a big-endian 24-bit value.
    #[inline]
    pub fn read_u24(&mut self) -> Result<u32> {
        let b = self.take(3)?;
        Ok(((b[0] as u32) << 16) | ((b[1] as u32) << 8) | b[2] as u32)
    }

    /// Read a big-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(U32::<BE>::read_from_bytes(self.take(4)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a big-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(I32::<BE>::read_from_bytes(self.take(4)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a big-endian u64.
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(U64::<BE>::read_from_bytes(self.take(8)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16_le(&mut self) -> Result<u16> {
        Ok(U16::<LE>::read_from_bytes(self.take(2)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32_le(&mut self) -> Result<u32> {
        Ok(U32::<LE>::read_from_bytes(self.take(4)?)
            .map(|v| v.get())
            .unwrap_or_default())
    }

    /// Read a 16.16 fixed-point value.
    #[inline]
    pub fn read_fixed(&mut self) -> Result<FixedPoint> {
        self.read_i32().map(FixedPoint::from_raw)
    }

    /// Read a four-character code.
    pub fn read_four_cc(&mut self) -> Result<FourCc> {
        self.read_array::<4>().map(FourCc)
    }

    /// Read a length-prefixed (Pascal) Mac Roman string.
    pub fn read_pascal_string(&mut self) -> Result<String> {
        let len = self.read_u8()? as usize;
        let bytes = self.take(len)?;
        Ok(decode_mac_roman(bytes))
    }

    /// Read a `Str31`: a length byte followed by 31 bytes of storage.
    pub fn read_str31(&mut self) -> Result<String> {
        let raw = self.take(32)?;
        let len = (raw[0] as usize).min(31);
        Ok(decode_mac_roman(&raw[1..1 + len]))
    }
}

/// Decode Mac Roman text into a `String`.
pub fn decode_mac_roman(bytes: &[u8]) -> String {
    let (text, _) = MACINTOSH.decode_without_bom_handling(bytes);
    text.into_owned()
}
