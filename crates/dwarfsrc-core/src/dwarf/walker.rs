//! Sequential walk over the compilation units of `.debug_info`.
//!
//! Each unit goes through the same pipeline: header, root abbreviation, root
//! attributes, then the line table header if the unit names one. The walk
//! starts at offset 0 and follows each unit's next-unit offset until it
//! reaches the end of the section.

use gimli::SectionId;
use tracing::{debug, debug_span, warn};

use crate::dwarf::abbrev::Abbreviation;
use crate::dwarf::attributes::RootAttributes;
use crate::dwarf::line::LineHeader;
use crate::dwarf::unit::UnitHeader;
use crate::error::Result;
use crate::report::{LineTableRecord, LineTableStatus, Report, UnitRecord};
use crate::sections::DebugSections;

/// Knobs for a walk.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WalkOptions
{
    /// Stop the walk on a line table whose header length is inconsistent,
    /// instead of reporting the table with a diagnostic status
    pub strict_line_tables: bool,
}

/// Iterator over the compilation units of `.debug_info`.
///
/// Yields one [`UnitRecord`] per unit in offset order. After the first
/// error no more items are produced.
#[derive(Debug, Clone)]
pub struct UnitWalker<'data>
{
    sections: DebugSections<'data>,
    options: WalkOptions,
    offset: u64,
    finished: bool,
}

impl<'data> UnitWalker<'data>
{
    pub fn new(sections: DebugSections<'data>, options: WalkOptions) -> Self
    {
        Self {
            sections,
            options,
            offset: 0,
            finished: false,
        }
    }

    /// Offset of the next unit to decode.
    pub fn offset(&self) -> u64
    {
        self.offset
    }

    fn decode_unit(&self, offset: u64) -> Result<(UnitRecord, u64)>
    {
        let mut cursor = self.sections.cursor(SectionId::DebugInfo, offset)?;
        let header = UnitHeader::parse(&mut cursor)?;
        debug!(
            version = header.version,
            abbrev_offset = header.abbrev_offset,
            address_size = header.address_size,
            next = header.next_unit_offset,
            "unit header"
        );

        let attributes = if header.root_abbrev_code == 0 {
            debug!("unit has no root entry");
            RootAttributes::default()
        } else {
            let mut abbrev_cursor = self.sections.cursor(SectionId::DebugAbbrev, header.abbrev_offset)?;
            let abbrev = Abbreviation::parse_root(&mut abbrev_cursor, &header)?;
            RootAttributes::extract(&mut cursor, &abbrev, &header, &self.sections)?
        };

        let line_table = attributes
            .stmt_list
            .map(|line_offset| self.line_table(line_offset))
            .transpose()?;

        let record = UnitRecord {
            offset: header.offset,
            version: header.version,
            abbrev_offset: header.abbrev_offset,
            address_size: header.address_size,
            name: attributes.name,
            comp_dir: attributes.comp_dir,
            line_table,
        };
        Ok((record, header.next_unit_offset))
    }

    fn line_table(&self, offset: u64) -> Result<LineTableRecord>
    {
        let mut cursor = self.sections.cursor(SectionId::DebugLine, offset)?;
        let header = match LineHeader::parse(&mut cursor)? {
            LineHeader::Supported(header) => header,
            LineHeader::Unsupported { offset, version } => {
                return Ok(LineTableRecord {
                    offset,
                    version,
                    status: LineTableStatus::UnsupportedVersion,
                    directories: Vec::new(),
                    files: Vec::new(),
                });
            }
        };

        let status = match header.validate() {
            Ok(()) => LineTableStatus::Decoded,
            Err(err) if err.is_unit_local() && !self.options.strict_line_tables => {
                warn!(error = %err, "line table header is unreliable");
                LineTableStatus::HeaderLengthMismatch {
                    declared: header.header_length,
                    consumed: header.consumed_length,
                }
            }
            Err(err) => return Err(err),
        };

        Ok(LineTableRecord {
            offset: header.offset,
            version: header.version,
            status,
            directories: header.include_directories,
            files: header.file_names,
        })
    }
}

impl Iterator for UnitWalker<'_>
{
    type Item = Result<UnitRecord>;

    fn next(&mut self) -> Option<Self::Item>
    {
        let end = self.sections.debug_info.len() as u64;
        if self.finished || self.offset >= end {
            return None;
        }

        let offset = self.offset;
        let _span = debug_span!("unit", offset).entered();

        match self.decode_unit(offset) {
            Ok((record, next)) => {
                if next > end {
                    warn!(next, end, "unit extends past the end of .debug_info");
                }
                self.offset = next;
                Some(Ok(record))
            }
            Err(err) => {
                self.finished = true;
                Some(Err(err))
            }
        }
    }
}

impl std::iter::FusedIterator for UnitWalker<'_> {}

/// Decode every compilation unit into a [`Report`].
///
/// ## Errors
///
/// Returns the first run-fatal condition met during the walk.
pub fn walk_units(sections: &DebugSections<'_>, options: WalkOptions) -> Result<Report>
{
    let report = UnitWalker::new(*sections, options).collect::<Result<Report>>()?;
    debug!(units = report.units.len(), "walk finished");
    Ok(report)
}
