//! Encoders for building synthetic debug sections in unit tests.

use gimli::{Endianity, Format, RunTimeEndian};

pub(crate) fn uleb128(mut value: u64) -> Vec<u8>
{
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        if value == 0 {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

pub(crate) fn sleb128(mut value: i64) -> Vec<u8>
{
    let mut out = Vec::new();
    loop {
        let byte = (value & 0x7f) as u8;
        value >>= 7;
        let done = (value == 0 && byte & 0x40 == 0) || (value == -1 && byte & 0x40 != 0);
        if done {
            out.push(byte);
            return out;
        }
        out.push(byte | 0x80);
    }
}

/// Growable section image with endian-aware writers.
pub(crate) struct SectionWriter
{
    endian: RunTimeEndian,
    bytes: Vec<u8>,
}

impl SectionWriter
{
    pub(crate) fn new(endian: RunTimeEndian) -> Self
    {
        Self { endian, bytes: Vec::new() }
    }

    pub(crate) fn u8(&mut self, value: u8) -> &mut Self
    {
        self.bytes.push(value);
        self
    }

    pub(crate) fn u16(&mut self, value: u16) -> &mut Self
    {
        if self.endian.is_big_endian() {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub(crate) fn u32(&mut self, value: u32) -> &mut Self
    {
        if self.endian.is_big_endian() {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub(crate) fn u64(&mut self, value: u64) -> &mut Self
    {
        if self.endian.is_big_endian() {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        }
        self
    }

    pub(crate) fn offset(&mut self, format: Format, value: u64) -> &mut Self
    {
        match format {
            Format::Dwarf32 => self.u32(u32::try_from(value).unwrap()),
            Format::Dwarf64 => self.u64(value),
        }
    }

    /// Initial length field for a body of `length` bytes.
    pub(crate) fn initial_length(&mut self, format: Format, length: u64) -> &mut Self
    {
        match format {
            Format::Dwarf32 => self.u32(u32::try_from(length).unwrap()),
            Format::Dwarf64 => self.u32(0xffff_ffff).u64(length),
        }
    }

    pub(crate) fn uleb(&mut self, value: u64) -> &mut Self
    {
        self.bytes.extend(uleb128(value));
        self
    }

    pub(crate) fn sleb(&mut self, value: i64) -> &mut Self
    {
        self.bytes.extend(sleb128(value));
        self
    }

    pub(crate) fn cstr(&mut self, value: &str) -> &mut Self
    {
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(0);
        self
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) -> &mut Self
    {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub(crate) fn finish(&mut self) -> Vec<u8>
    {
        std::mem::take(&mut self.bytes)
    }
}

/// Abbreviation declaration followed by its `(0, 0)` terminator.
pub(crate) fn abbreviation(code: u64, tag: u16, has_children: bool, attributes: &[(u16, u16)]) -> Vec<u8>
{
    let mut w = SectionWriter::new(RunTimeEndian::Little);
    w.uleb(code).uleb(u64::from(tag)).u8(u8::from(has_children));
    for &(attribute, form) in attributes {
        w.uleb(u64::from(attribute)).uleb(u64::from(form));
    }
    w.uleb(0).uleb(0);
    w.finish()
}

/// A version 2-4 compilation unit whose root DIE bytes are `die`.
///
/// `die` starts with the root abbreviation code.
pub(crate) fn compile_unit(
    endian: RunTimeEndian,
    format: Format,
    version: u16,
    abbrev_offset: u64,
    address_size: u8,
    die: &[u8],
) -> Vec<u8>
{
    let length = 2 + u64::from(format.word_size()) + 1 + die.len() as u64;
    let mut w = SectionWriter::new(endian);
    w.initial_length(format, length)
        .u16(version)
        .offset(format, abbrev_offset)
        .u8(address_size)
        .raw(die);
    w.finish()
}

/// Line program header used by the line table tests.
pub(crate) struct LineHeaderFixture<'a>
{
    pub(crate) format: Format,
    pub(crate) version: u16,
    pub(crate) directories: &'a [&'a str],
    pub(crate) files: &'a [(&'a str, u64)],
    /// Added to the correct `header_length`, padding the header with zero bytes
    pub(crate) extra_header_length: u64,
}

impl<'a> LineHeaderFixture<'a>
{
    pub(crate) fn new(directories: &'a [&'a str], files: &'a [(&'a str, u64)]) -> Self
    {
        Self {
            format: Format::Dwarf32,
            version: 4,
            directories,
            files,
            extra_header_length: 0,
        }
    }

    /// Encode the header followed by a two-byte line program.
    pub(crate) fn encode(&self, endian: RunTimeEndian) -> Vec<u8>
    {
        let opcode_base = 13u8;
        let mut tables = SectionWriter::new(endian);
        tables.u8(1);
        if self.version >= 4 {
            tables.u8(1);
        }
        tables.u8(1).u8((-5i8).to_ne_bytes()[0]).u8(14).u8(opcode_base);
        tables.raw(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
        for dir in self.directories {
            tables.cstr(dir);
        }
        tables.u8(0);
        for (path, dir_index) in self.files {
            tables.cstr(path).uleb(*dir_index).uleb(0).uleb(0);
        }
        tables.u8(0);
        for _ in 0..self.extra_header_length {
            tables.u8(0);
        }
        let tables = tables.finish();
        let program = [0x00, 0x01];

        let header_length = tables.len() as u64;
        let unit_length = 2 + u64::from(self.format.word_size()) + header_length + program.len() as u64;

        let mut w = SectionWriter::new(endian);
        w.initial_length(self.format, unit_length)
            .u16(self.version)
            .offset(self.format, header_length)
            .raw(&tables)
            .raw(&program);
        w.finish()
    }
}
