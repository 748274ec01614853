//! Binary reader for zero-copy parsing of byte slices.
//!
//! This module provides [`BinaryReader`], a cursor-like type that efficiently
//! reads little-endian engine data from a byte slice without copying.

use crate::{Error, Guid, Result};

/// A binary reader that provides zero-copy reading from a byte slice.
///
/// Every read either returns a complete value and advances the position, or
/// fails with [`Error::UnexpectedEof`] and leaves the position unchanged.
///
/// # Example
///
/// ```
/// use uepak_common::BinaryReader;
///
/// let data = [0x01, 0x02, 0x03, 0x04, 0x05, 0x06, 0x07, 0x08];
/// let mut reader = BinaryReader::new(&data);
///
/// assert_eq!(reader.read_u32().unwrap(), 0x04030201);
/// assert_eq!(reader.read_u32().unwrap(), 0x08070605);
/// assert!(reader.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct BinaryReader<'a> {
    data: &'a [u8],
    position: usize,
}

impl<'a> BinaryReader<'a> {
    /// Create a new reader from a byte slice.
    #[inline]
    pub const fn new(data: &'a [u8]) -> Self {
        Self { data, position: 0 }
    }

    /// Create a new reader starting at a specific position.
    #[inline]
    pub const fn new_at(data: &'a [u8], position: usize) -> Self {
        Self { data, position }
    }

    /// Get the current position in the buffer.
    #[inline]
    pub const fn position(&self) -> usize {
        self.position
    }

    /// Get the total length of the underlying buffer.
    #[inline]
    pub const fn len(&self) -> usize {
        self.data.len()
    }

    /// Get the number of bytes remaining to read.
    #[inline]
    pub const fn remaining(&self) -> usize {
        self.data.len().saturating_sub(self.position)
    }

    /// Check if there are no more bytes to read.
    #[inline]
    pub const fn is_empty(&self) -> bool {
        self.position >= self.data.len()
    }

    /// Advance the position by a number of bytes.
    #[inline]
    pub fn advance(&mut self, count: usize) {
        self.position = self.position.saturating_add(count);
    }

    /// Peek at bytes without advancing the position.
    #[inline]
    pub fn peek_bytes(&self, count: usize) -> Result<&'a [u8]> {
        if self.remaining() < count {
            return Err(Error::UnexpectedEof {
                needed: count,
                available: self.remaining(),
            });
        }
        Ok(&self.data[self.position..self.position + count])
    }

    /// Read bytes and advance the position.
    #[inline]
    pub fn read_bytes(&mut self, count: usize) -> Result<&'a [u8]> {
        let bytes = self.peek_bytes(count)?;
        self.position += count;
        Ok(bytes)
    }

    /// Read a fixed-size byte array.
    #[inline]
    pub fn read_array_bytes<const N: usize>(&mut self) -> Result<[u8; N]> {
        let bytes = self.read_bytes(N)?;
        let mut out = [0u8; N];
        out.copy_from_slice(bytes);
        Ok(out)
    }

    /// Split off a child reader over the next `count` bytes and advance past them.
    ///
    /// The child cannot read beyond its window, which bounds decoding of
    /// size-prefixed records.
    pub fn sub_reader(&mut self, count: usize) -> Result<BinaryReader<'a>> {
        let bytes = self.read_bytes(count)?;
        Ok(BinaryReader::new(bytes))
    }

    /// Read a single byte.
    #[inline]
    pub fn read_u8(&mut self) -> Result<u8> {
        self.read_bytes(1).map(|b| b[0])
    }

    /// Read a signed byte.
    #[inline]
    pub fn read_i8(&mut self) -> Result<i8> {
        self.read_u8().map(|b| b as i8)
    }

    /// Read an 8-bit boolean (non-zero = true).
    #[inline]
    pub fn read_bool(&mut self) -> Result<bool> {
        self.read_u8().map(|b| b != 0)
    }

    /// Read a 32-bit boolean, the engine's native encoding.
    #[inline]
    pub fn read_ubool(&mut self) -> Result<bool> {
        self.read_u32().map(|v| v != 0)
    }

    /// Read a little-endian u16.
    #[inline]
    pub fn read_u16(&mut self) -> Result<u16> {
        Ok(u16::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian i16.
    #[inline]
    pub fn read_i16(&mut self) -> Result<i16> {
        Ok(i16::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian u32.
    #[inline]
    pub fn read_u32(&mut self) -> Result<u32> {
        Ok(u32::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian i32.
    #[inline]
    pub fn read_i32(&mut self) -> Result<i32> {
        Ok(i32::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian u64.
    #[inline]
    pub fn read_u64(&mut self) -> Result<u64> {
        Ok(u64::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian i64.
    #[inline]
    pub fn read_i64(&mut self) -> Result<i64> {
        Ok(i64::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian f32.
    #[inline]
    pub fn read_f32(&mut self) -> Result<f32> {
        Ok(f32::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a little-endian f64.
    #[inline]
    pub fn read_f64(&mut self) -> Result<f64> {
        Ok(f64::from_le_bytes(self.read_array_bytes()?))
    }

    /// Read a GUID stored as four little-endian u32 words.
    #[inline]
    pub fn read_guid(&mut self) -> Result<Guid> {
        let a = self.read_u32()?;
        let b = self.read_u32()?;
        let c = self.read_u32()?;
        let d = self.read_u32()?;
        Ok(Guid::new(a, b, c, d))
    }

    /// Read a length-prefixed engine string.
    ///
    /// A positive length counts narrow bytes, a negative length counts UTF-16
    /// code units; both include the trailing NUL, which is stripped. Zero is
    /// the empty string.
    pub fn read_fstring(&mut self) -> Result<String> {
        let start = self.position;
        let len = self.read_i32()?;

        let result = if len == 0 {
            Ok(String::new())
        } else if len > 0 {
            self.read_bytes(len as usize).map(|bytes| {
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                String::from_utf8_lossy(&bytes[..end]).into_owned()
            })
        } else if len == i32::MIN {
            Err(Error::InvalidStringLength(len))
        } else {
            let units = len.unsigned_abs() as usize;
            self.read_bytes(units * 2).map(|bytes| {
                let chars: Vec<u16> = bytes
                    .chunks_exact(2)
                    .map(|c| u16::from_le_bytes([c[0], c[1]]))
                    .take_while(|&c| c != 0)
                    .collect();
                String::from_utf16_lossy(&chars)
            })
        };

        if result.is_err() {
            self.position = start;
        }
        result
    }

    /// Read `count` values with `f`, checking first that at least
    /// `count * min_element_size` bytes remain.
    pub fn read_array<T, F>(&mut self, count: usize, min_element_size: usize, mut f: F) -> Result<Vec<T>>
    where
        F: FnMut(&mut Self) -> Result<T>,
    {
        let needed = count.saturating_mul(min_element_size);
        if needed > self.remaining() {
            return Err(Error::UnexpectedEof {
                needed,
                available: self.remaining(),
            });
        }

        let mut values = Vec::with_capacity(count);
        for _ in 0..count {
            values.push(f(self)?);
        }
        Ok(values)
    }
}
