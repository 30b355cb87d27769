//! Line program headers in `.debug_line`.
//!
//! Only the header is decoded: the fixed fields, the include directory table
//! and the file name table. The opcode stream that follows is never read.
//!
//! Header layouts are only understood for versions 2 to 4. Any other version
//! is reported as [`LineHeader::Unsupported`] after the version field, and
//! nothing further is read.

use std::ops::RangeInclusive;

use gimli::{Format, SectionId};
use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::error::{DwarfError, Result};
use crate::report::FileEntry;
use crate::sections::DebugSections;

/// Line program versions whose header layout can be decoded.
pub const SUPPORTED_VERSIONS: RangeInclusive<u16> = 2..=4;

/// Decoded line program header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineProgramHeader
{
    /// Offset of the line table in `.debug_line`
    pub offset: u64,
    pub format: Format,
    pub unit_length: u64,
    pub version: u16,
    /// Declared size of the header after the `header_length` field
    pub header_length: u64,
    /// Position right after the `header_length` field
    pub header_start: u64,
    pub minimum_instruction_length: u8,
    /// Always 1 before version 4, where the field does not exist
    pub maximum_operations_per_instruction: u8,
    pub default_is_stmt: bool,
    pub line_base: i8,
    pub line_range: u8,
    pub opcode_base: u8,
    pub standard_opcode_lengths: Vec<u8>,
    pub include_directories: Vec<String>,
    pub file_names: Vec<FileEntry>,
    /// Bytes actually read after the `header_length` field
    pub consumed_length: u64,
}

/// Result of decoding a line table header.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LineHeader
{
    Supported(LineProgramHeader),
    /// The version is outside [`SUPPORTED_VERSIONS`]; nothing after it was read
    Unsupported
    {
        offset: u64,
        version: u16,
    },
}

impl LineHeader
{
    /// Decode the header starting at the cursor's position.
    ///
    /// A `header_length` that disagrees with the bytes read is not an error
    /// here; see [`LineProgramHeader::validate`].
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::OutOfBounds`] if the header runs past the end of
    /// the section.
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self>
    {
        let offset = cursor.position();
        let (unit_length, format) = cursor.read_initial_length()?;
        let version = cursor.read_u16()?;

        if !SUPPORTED_VERSIONS.contains(&version) {
            debug!(offset, version, "unsupported line table version");
            return Ok(Self::Unsupported { offset, version });
        }

        let header_length = cursor.read_offset(format)?;
        let header_start = cursor.position();

        let minimum_instruction_length = cursor.read_u8()?;
        let maximum_operations_per_instruction = if version >= 4 { cursor.read_u8()? } else { 1 };
        let default_is_stmt = cursor.read_u8()? != 0;
        let line_base = cursor.read_i8()?;
        let line_range = cursor.read_u8()?;
        let opcode_base = cursor.read_u8()?;
        let standard_opcode_lengths = cursor
            .read_bytes(usize::from(opcode_base.saturating_sub(1)))?
            .to_vec();

        let mut include_directories = Vec::new();
        loop {
            let directory = cursor.read_cstring()?;
            if directory.is_empty() {
                break;
            }
            include_directories.push(String::from_utf8_lossy(directory).into_owned());
        }

        let mut file_names = Vec::new();
        loop {
            let path = cursor.read_cstring()?;
            if path.is_empty() {
                break;
            }
            let directory_index = cursor.read_uleb128()?;
            // modification time, file length
            cursor.read_uleb128()?;
            cursor.read_uleb128()?;

            let path = String::from_utf8_lossy(path).into_owned();
            trace!(%path, directory_index, "line table file");
            file_names.push(FileEntry { path, directory_index });
        }

        Ok(Self::Supported(LineProgramHeader {
            offset,
            format,
            unit_length,
            version,
            header_length,
            header_start,
            minimum_instruction_length,
            maximum_operations_per_instruction,
            default_is_stmt,
            line_base,
            line_range,
            opcode_base,
            standard_opcode_lengths,
            include_directories,
            file_names,
            consumed_length: cursor.position() - header_start,
        }))
    }

    /// The header's version field.
    pub fn version(&self) -> u16
    {
        match self {
            Self::Supported(header) => header.version,
            Self::Unsupported { version, .. } => *version,
        }
    }
}

impl LineProgramHeader
{
    /// Check that the header tables end exactly where `header_length` says.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::HeaderLengthMismatch`] otherwise.
    pub fn validate(&self) -> Result<()>
    {
        if self.consumed_length == self.header_length {
            return Ok(());
        }
        Err(DwarfError::HeaderLengthMismatch {
            offset: self.offset,
            declared: self.header_length,
            consumed: self.consumed_length,
        })
    }

    /// Where the opcode stream starts, per the declared header length.
    pub fn program_offset(&self) -> u64
    {
        self.header_start.saturating_add(self.header_length)
    }
}

/// Decode and validate the line table header at `offset` in `.debug_line`.
///
/// ## Errors
///
/// - [`DwarfError::HeaderLengthMismatch`] if the header is inconsistent
/// - [`DwarfError::OutOfBounds`] if `offset` or the header lies past the end of the section
pub fn read_line_program_header(sections: &DebugSections<'_>, offset: u64) -> Result<LineHeader>
{
    let mut cursor = sections.cursor(SectionId::DebugLine, offset)?;
    let header = LineHeader::parse(&mut cursor)?;
    if let LineHeader::Supported(supported) = &header {
        supported.validate()?;
    }
    Ok(header)
}
