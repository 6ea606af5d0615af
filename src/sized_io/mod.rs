//! Bounds-checked big-endian reads over an in-memory byte buffer.

use nom::{error::Error as NomError, number::complete as num, IResult};

use crate::{ClassParseError, CrateResult};

/// A cursor over an immutable byte buffer. Reads advance the position and never rewind; a nested
/// structure such as an attribute payload is taken whole with [`read_bytes`] and decoded later by
/// a fresh cursor of its own.
///
/// [`read_bytes`]: #method.read_bytes
#[derive(Clone, Debug)]
pub struct ByteCursor<'a> {
    bytes: &'a [u8],
    pos: usize,
}

impl<'a> ByteCursor<'a> {
    /// Create a cursor positioned at the start of `bytes`.
    pub fn new(bytes: &'a [u8]) -> Self {
        Self { bytes, pos: 0 }
    }

    /// The number of bytes consumed so far.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// The number of bytes not yet consumed.
    pub fn remaining(&self) -> usize {
        self.bytes.len() - self.pos
    }

    /// True iff every byte has been consumed.
    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    fn truncated(&self, requested: usize) -> ClassParseError {
        ClassParseError::TruncatedInput {
            offset: self.pos,
            requested,
            available: self.remaining(),
        }
    }

    /// Run a fixed-width nom number parser against the unread bytes.
    fn take_with<T>(
        &mut self,
        width: usize,
        parser: fn(&'a [u8]) -> IResult<&'a [u8], T, NomError<&'a [u8]>>,
    ) -> CrateResult<T> {
        let bytes = self.bytes;
        let (rest, value) = parser(&bytes[self.pos..]).map_err(|_| self.truncated(width))?;
        self.pos = bytes.len() - rest.len();
        Ok(value)
    }

    /// Read one byte.
    pub fn read_u8(&mut self) -> CrateResult<u8> {
        self.take_with(1, num::be_u8)
    }

    /// Read one byte as a signed value.
    pub fn read_i8(&mut self) -> CrateResult<i8> {
        self.take_with(1, num::be_i8)
    }

    /// Read a big-endian u16.
    pub fn read_u16(&mut self) -> CrateResult<u16> {
        self.take_with(2, num::be_u16)
    }

    /// Read a big-endian i16.
    pub fn read_i16(&mut self) -> CrateResult<i16> {
        self.take_with(2, num::be_i16)
    }

    /// Read a big-endian u32.
    pub fn read_u32(&mut self) -> CrateResult<u32> {
        self.take_with(4, num::be_u32)
    }

    /// Read a big-endian i32.
    pub fn read_i32(&mut self) -> CrateResult<i32> {
        self.take_with(4, num::be_i32)
    }

    /// Read a big-endian i64.
    pub fn read_i64(&mut self) -> CrateResult<i64> {
        self.take_with(8, num::be_i64)
    }

    /// Read a big-endian IEEE 754 single.
    pub fn read_f32(&mut self) -> CrateResult<f32> {
        self.take_with(4, num::be_f32)
    }

    /// Read a big-endian IEEE 754 double.
    pub fn read_f64(&mut self) -> CrateResult<f64> {
        self.take_with(8, num::be_f64)
    }

    /// Read exactly `length` bytes. Fails without consuming anything if fewer remain.
    pub fn read_bytes(&mut self, length: usize) -> CrateResult<&'a [u8]> {
        if self.remaining() < length {
            return Err(self.truncated(length));
        }
        let start = self.pos;
        self.pos += length;
        Ok(&self.bytes[start..self.pos])
    }
}
