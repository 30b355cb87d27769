//! Bounds-checked sequential reader over a debug section.
//!
//! Every DWARF structure decoded by this crate is read through a
//! [`ByteCursor`]: a borrowed byte slice, the byte order of the container
//! it came from, and a read position. Each read checks the remaining length
//! first and reports [`DwarfError::OutOfBounds`] instead of reading past the
//! end of the section.
//!
//! ## Offset sizes
//!
//! DWARF structures come in a 32-bit and a 64-bit format, selected by the
//! initial length field of each unit. [`ByteCursor::read_initial_length`]
//! detects the format and [`ByteCursor::read_offset`] reads an offset-sized
//! field for it, so call sites never branch on the format themselves.

use gimli::{Endianity, Format, RunTimeEndian, SectionId};

use crate::error::{DwarfError, Result};

/// Initial length value announcing the 64-bit DWARF format.
pub const DWARF64_SENTINEL: u32 = 0xffff_ffff;

/// Sequential reader over one section's bytes
#[derive(Debug, Clone)]
pub struct ByteCursor<'data>
{
    section: SectionId,
    data: &'data [u8],
    position: usize,
    endian: RunTimeEndian,
}

impl<'data> ByteCursor<'data>
{
    /// Create a cursor positioned at the start of `data`.
    pub fn new(section: SectionId, data: &'data [u8], endian: RunTimeEndian) -> Self
    {
        Self {
            section,
            data,
            position: 0,
            endian,
        }
    }

    /// Create a cursor positioned at `offset`.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if `offset` lies past the end of `data`.
    pub fn at(section: SectionId, data: &'data [u8], endian: RunTimeEndian, offset: u64) -> Result<Self>
    {
        let mut cursor = Self::new(section, data, endian);
        cursor.seek(offset)?;
        Ok(cursor)
    }

    /// Move the read position to an absolute offset within the section.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if `offset` lies past the end of the section.
    pub fn seek(&mut self, offset: u64) -> Result<()>
    {
        match usize::try_from(offset) {
            Ok(position) if position <= self.data.len() => {
                self.position = position;
                Ok(())
            }
            _ => Err(DwarfError::OutOfBounds {
                section: self.section.name(),
                offset,
                needed: 0,
            }),
        }
    }

    /// Current read position, as an offset from the start of the section.
    pub fn position(&self) -> u64
    {
        self.position as u64
    }

    /// Number of bytes left after the read position.
    pub fn remaining(&self) -> usize
    {
        self.data.len() - self.position
    }

    /// Whether the read position is at the end of the section.
    pub fn is_empty(&self) -> bool
    {
        self.remaining() == 0
    }

    /// The section this cursor reads.
    pub fn section(&self) -> SectionId
    {
        self.section
    }

    /// Byte order used for fixed-width integer reads.
    pub fn endian(&self) -> RunTimeEndian
    {
        self.endian
    }

    fn out_of_bounds(&self, offset: usize, needed: usize) -> DwarfError
    {
        DwarfError::OutOfBounds {
            section: self.section.name(),
            offset: offset as u64,
            needed: needed as u64,
        }
    }

    /// Consume `len` bytes and return them.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'data [u8]>
    {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.data.len())
            .ok_or_else(|| self.out_of_bounds(self.position, len))?;
        let bytes = &self.data[self.position..end];
        self.position = end;
        Ok(bytes)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N]>
    {
        let mut array = [0u8; N];
        array.copy_from_slice(self.read_bytes(N)?);
        Ok(array)
    }

    /// Advance the read position by `len` bytes without decoding them.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if fewer than `len` bytes remain.
    pub fn skip(&mut self, len: u64) -> Result<()>
    {
        let len = usize::try_from(len).map_err(|_| DwarfError::OutOfBounds {
            section: self.section.name(),
            offset: self.position(),
            needed: len,
        })?;
        self.read_bytes(len).map(|_| ())
    }

    pub fn read_u8(&mut self) -> Result<u8>
    {
        let [byte] = self.read_array::<1>()?;
        Ok(byte)
    }

    pub fn read_i8(&mut self) -> Result<i8>
    {
        self.read_u8().map(|byte| i8::from_ne_bytes([byte]))
    }

    pub fn read_u16(&mut self) -> Result<u16>
    {
        let bytes = self.read_array::<2>()?;
        Ok(if self.endian.is_big_endian() {
            u16::from_be_bytes(bytes)
        } else {
            u16::from_le_bytes(bytes)
        })
    }

    pub fn read_u32(&mut self) -> Result<u32>
    {
        let bytes = self.read_array::<4>()?;
        Ok(if self.endian.is_big_endian() {
            u32::from_be_bytes(bytes)
        } else {
            u32::from_le_bytes(bytes)
        })
    }

    pub fn read_u64(&mut self) -> Result<u64>
    {
        let bytes = self.read_array::<8>()?;
        Ok(if self.endian.is_big_endian() {
            u64::from_be_bytes(bytes)
        } else {
            u64::from_le_bytes(bytes)
        })
    }

    /// Read an unsigned LEB128 value.
    ///
    /// The encoding has no width limit: bytes are consumed up to the first
    /// byte with a clear continuation bit, and payload bits past the 64th
    /// are dropped.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if the section ends before the
    /// terminating byte. The read position is left unchanged in that case.
    pub fn read_uleb128(&mut self) -> Result<u64>
    {
        let start = self.position;
        let mut position = start;
        let mut result = 0u64;
        let mut shift = 0u32;

        loop {
            let Some(&byte) = self.data.get(position) else {
                return Err(self.out_of_bounds(start, position - start + 1));
            };
            position += 1;

            if shift < 64 {
                result |= u64::from(byte & 0x7f) << shift;
            }
            if byte & 0x80 == 0 {
                self.position = position;
                return Ok(result);
            }
            shift = shift.saturating_add(7);
        }
    }

    /// Read a signed LEB128 value.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if the section ends before the
    /// terminating byte.
    pub fn read_sleb128(&mut self) -> Result<i64>
    {
        let start = self.position;
        let mut position = start;
        let mut result = 0i64;
        let mut shift = 0u32;

        loop {
            let Some(&byte) = self.data.get(position) else {
                return Err(self.out_of_bounds(start, position - start + 1));
            };
            position += 1;

            if shift < 64 {
                result |= i64::from(byte & 0x7f) << shift;
            }
            shift = shift.saturating_add(7);
            if byte & 0x80 == 0 {
                // Sign-extend from the last payload bit
                if shift < 64 && byte & 0x40 != 0 {
                    result |= -1i64 << shift;
                }
                self.position = position;
                return Ok(result);
            }
        }
    }

    /// Read a null-terminated string, returning the bytes before the terminator.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if no terminator is found before
    /// the end of the section.
    pub fn read_cstring(&mut self) -> Result<&'data [u8]>
    {
        let rest = &self.data[self.position..];
        let Some(len) = rest.iter().position(|&byte| byte == 0) else {
            return Err(self.out_of_bounds(self.position, rest.len() + 1));
        };
        let bytes = &rest[..len];
        self.position += len + 1;
        Ok(bytes)
    }

    /// Read an initial length field and the format it selects.
    ///
    /// A 32-bit value of [`DWARF64_SENTINEL`] is followed by the real length
    /// as a 64-bit value and selects [`Format::Dwarf64`].
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if the field is truncated.
    pub fn read_initial_length(&mut self) -> Result<(u64, Format)>
    {
        let length = self.read_u32()?;
        if length == DWARF64_SENTINEL {
            Ok((self.read_u64()?, Format::Dwarf64))
        } else {
            Ok((u64::from(length), Format::Dwarf32))
        }
    }

    /// Read an offset-sized field (4 bytes in 32-bit DWARF, 8 in 64-bit DWARF).
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if the field is truncated.
    pub fn read_offset(&mut self, format: Format) -> Result<u64>
    {
        match format {
            Format::Dwarf32 => self.read_u32().map(u64::from),
            Format::Dwarf64 => self.read_u64(),
        }
    }
}
