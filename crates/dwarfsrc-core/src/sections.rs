//! Debug section loading.
//!
//! The decoder works on four named byte buffers (`.debug_info`,
//! `.debug_abbrev`, `.debug_line`, and optionally `.debug_str`), plus
//! `.debug_line_str` when present. [`SectionMap`] pulls them out of an ELF or
//! Mach-O container with the `object` crate; [`DebugSections`] is the
//! borrowed view the decoder reads from, and can also be built directly from
//! byte slices.
//!
//! ## Which sections count
//!
//! A section is ignored when:
//! - it has no bytes in the file (`SHT_NOBITS`), or its data is empty
//! - it belongs to an ELF section group (`SHF_GROUP`)
//!
//! A section stored compressed is refused with [`DwarfError::CompressedSection`].

use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;

use gimli::{RunTimeEndian, SectionId};
use object::{CompressionFormat, Object, ObjectSection, SectionFlags, SectionKind};
use tracing::{debug, trace};

use crate::cursor::ByteCursor;
use crate::error::{DwarfError, Result};

const DWARF_SECTIONS: &[(SectionId, &[&str])] = &[
    (SectionId::DebugAbbrev, &[".debug_abbrev", "__debug_abbrev"]),
    (SectionId::DebugInfo, &[".debug_info", "__debug_info"]),
    (SectionId::DebugLine, &[".debug_line", "__debug_line"]),
    (SectionId::DebugLineStr, &[".debug_line_str", "__debug_line_str"]),
    (SectionId::DebugStr, &[".debug_str", "__debug_str"]),
];

fn section_id(name: &str) -> Option<SectionId>
{
    DWARF_SECTIONS
        .iter()
        .find(|(_, aliases)| aliases.contains(&name))
        .map(|(id, _)| *id)
}

fn is_group_member(flags: SectionFlags) -> bool
{
    match flags {
        SectionFlags::Elf { sh_flags } => sh_flags & u64::from(object::elf::SHF_GROUP) != 0,
        _ => false,
    }
}

/// Debug sections copied out of a container file.
#[derive(Debug, Clone)]
pub struct SectionMap
{
    endian: RunTimeEndian,
    sections: HashMap<&'static str, Arc<[u8]>>,
}

impl SectionMap
{
    /// Read and parse the container file at `path`.
    ///
    /// ## Errors
    ///
    /// Returns an error if the file cannot be read or parsed, or if a debug
    /// section is compressed.
    pub fn load(path: &Path) -> Result<Self>
    {
        let bytes = fs::read(path)?;
        debug!(path = %path.display(), size = bytes.len(), "read container");
        Self::parse(&bytes)
    }

    /// Parse an in-memory container.
    ///
    /// ## Errors
    ///
    /// Returns an error if the container cannot be parsed, or if a debug
    /// section is compressed.
    pub fn parse(bytes: &[u8]) -> Result<Self>
    {
        let file = object::File::parse(bytes)?;
        let endian = if file.is_little_endian() {
            RunTimeEndian::Little
        } else {
            RunTimeEndian::Big
        };

        let mut sections = HashMap::new();
        for section in file.sections() {
            let Ok(name) = section.name() else {
                continue;
            };
            let Some(id) = section_id(name) else {
                continue;
            };

            if matches!(
                section.kind(),
                SectionKind::UninitializedData | SectionKind::UninitializedTls
            ) {
                trace!(name, "skipping storage-only section");
                continue;
            }
            if is_group_member(section.flags()) {
                trace!(name, "skipping section group member");
                continue;
            }
            if section.compressed_file_range()?.format != CompressionFormat::None {
                return Err(DwarfError::CompressedSection { name: name.to_string() });
            }

            let data = section.data()?;
            if data.is_empty() {
                trace!(name, "skipping empty section");
                continue;
            }

            debug!(name, size = data.len(), "found debug section");
            sections.insert(id.name(), Arc::<[u8]>::from(data));
        }

        Ok(Self { endian, sections })
    }

    /// Byte order of the container.
    pub fn endian(&self) -> RunTimeEndian
    {
        self.endian
    }

    /// Raw bytes of a loaded section.
    pub fn get(&self, id: SectionId) -> Option<&[u8]>
    {
        self.sections.get(id.name()).map(AsRef::as_ref)
    }

    fn require(&self, id: SectionId) -> Result<&[u8]>
    {
        self.get(id).ok_or(DwarfError::MissingSection { name: id.name() })
    }

    /// Borrow the sections the decoder needs.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::MissingSection`] for the first of `.debug_info`,
    /// `.debug_line` and `.debug_abbrev` that is absent.
    pub fn debug_sections(&self) -> Result<DebugSections<'_>>
    {
        let debug_info = self.require(SectionId::DebugInfo)?;
        let debug_line = self.require(SectionId::DebugLine)?;
        let debug_abbrev = self.require(SectionId::DebugAbbrev)?;

        Ok(DebugSections {
            endian: self.endian,
            debug_info,
            debug_abbrev,
            debug_line,
            debug_str: self.get(SectionId::DebugStr),
            debug_line_str: self.get(SectionId::DebugLineStr),
        })
    }
}

/// Borrowed debug section buffers and their byte order.
#[derive(Debug, Clone, Copy)]
pub struct DebugSections<'data>
{
    pub endian: RunTimeEndian,
    pub debug_info: &'data [u8],
    pub debug_abbrev: &'data [u8],
    pub debug_line: &'data [u8],
    pub debug_str: Option<&'data [u8]>,
    pub debug_line_str: Option<&'data [u8]>,
}

impl<'data> DebugSections<'data>
{
    pub fn new(endian: RunTimeEndian, debug_info: &'data [u8], debug_abbrev: &'data [u8], debug_line: &'data [u8]) -> Self
    {
        Self {
            endian,
            debug_info,
            debug_abbrev,
            debug_line,
            debug_str: None,
            debug_line_str: None,
        }
    }

    #[must_use]
    pub fn with_debug_str(mut self, debug_str: &'data [u8]) -> Self
    {
        self.debug_str = Some(debug_str);
        self
    }

    #[must_use]
    pub fn with_debug_line_str(mut self, debug_line_str: &'data [u8]) -> Self
    {
        self.debug_line_str = Some(debug_line_str);
        self
    }

    /// Bytes of a section, `None` if it is optional and absent.
    pub fn data(&self, id: SectionId) -> Option<&'data [u8]>
    {
        match id {
            SectionId::DebugInfo => Some(self.debug_info),
            SectionId::DebugAbbrev => Some(self.debug_abbrev),
            SectionId::DebugLine => Some(self.debug_line),
            SectionId::DebugStr => self.debug_str,
            SectionId::DebugLineStr => self.debug_line_str,
            _ => None,
        }
    }

    /// Cursor over a section, positioned at `offset`.
    ///
    /// ## Errors
    ///
    /// Returns [`DwarfError::MissingSection`] if the section is absent, or
    /// [`DwarfError::OutOfBounds`] if `offset` lies past its end.
    pub fn cursor(&self, id: SectionId, offset: u64) -> Result<ByteCursor<'data>>
    {
        let data = self.data(id).ok_or(DwarfError::MissingSection { name: id.name() })?;
        ByteCursor::at(id, data, self.endian, offset)
    }
}

#[cfg(test)]
mod tests
{
    use super::*;

    #[test]
    fn test_section_aliases()
    {
        assert_eq!(section_id(".debug_info"), Some(SectionId::DebugInfo));
        assert_eq!(section_id("__debug_line"), Some(SectionId::DebugLine));
        assert_eq!(section_id(".debug_str"), Some(SectionId::DebugStr));
        assert_eq!(section_id(".debug_ranges"), None);
        assert_eq!(section_id(".zdebug_info"), None);
    }

    #[test]
    fn test_group_flag_is_a_bitmask_test()
    {
        let group = u64::from(object::elf::SHF_GROUP);
        assert!(is_group_member(SectionFlags::Elf { sh_flags: group }));
        assert!(is_group_member(SectionFlags::Elf { sh_flags: group | 0x1 }));
        assert!(!is_group_member(SectionFlags::Elf { sh_flags: 0x1 }));
        assert!(!is_group_member(SectionFlags::None));
    }

    #[test]
    fn test_debug_sections_cursor()
    {
        let info = [1u8, 2, 3];
        let sections = DebugSections::new(RunTimeEndian::Little, &info, &[], &[]);
        let mut cursor = sections.cursor(SectionId::DebugInfo, 1).unwrap();
        assert_eq!(cursor.read_u8().unwrap(), 2);
        assert!(matches!(
            sections.cursor(SectionId::DebugStr, 0),
            Err(DwarfError::MissingSection { name: ".debug_str" })
        ));

        let strings = b"abc\0";
        let sections = sections.with_debug_str(strings);
        assert_eq!(sections.data(SectionId::DebugStr), Some(&strings[..]));
    }
}
