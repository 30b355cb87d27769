//! The structured result of a walk over `.debug_info`.
//!
//! A [`Report`] holds one [`UnitRecord`] per compilation unit, in the order
//! the units appear in the section. All types serialize with `serde`;
//! absent optional fields are left out of the serialized form.

use serde::Serialize;

/// Every compilation unit found in `.debug_info`, in offset order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Report
{
    pub units: Vec<UnitRecord>,
}

impl Report
{
    pub fn is_empty(&self) -> bool
    {
        self.units.is_empty()
    }
}

impl FromIterator<UnitRecord> for Report
{
    fn from_iter<I: IntoIterator<Item = UnitRecord>>(iter: I) -> Self
    {
        Self {
            units: iter.into_iter().collect(),
        }
    }
}

/// One compilation unit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UnitRecord
{
    /// Offset of the unit in `.debug_info`
    pub offset: u64,
    pub version: u16,
    /// Offset of the unit's abbreviation table in `.debug_abbrev`
    pub abbrev_offset: u64,
    pub address_size: u8,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comp_dir: Option<String>,
    /// Absent when the unit has no `DW_AT_stmt_list`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line_table: Option<LineTableRecord>,
}

/// The header tables of a unit's line table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LineTableRecord
{
    /// Offset of the line table in `.debug_line`
    pub offset: u64,
    pub version: u16,
    pub status: LineTableStatus,
    /// Include directories, without the compilation directory entry
    pub directories: Vec<String>,
    pub files: Vec<FileEntry>,
}

/// How far a line table header could be trusted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum LineTableStatus
{
    /// Header and tables decoded, and the header length matches
    Decoded,
    /// Version outside 2..=4, so the tables were not decoded
    UnsupportedVersion,
    /// Tables decoded, but they do not end where `header_length` says
    ///
    /// The directory and file lists are kept as diagnostic context only.
    HeaderLengthMismatch
    {
        declared: u64,
        consumed: u64,
    },
}

impl LineTableStatus
{
    /// Whether the directory and file lists can be relied on.
    pub fn is_reliable(&self) -> bool
    {
        matches!(self, Self::Decoded)
    }
}

/// One entry of a line table's file name list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FileEntry
{
    pub path: String,
    /// Index into the include directories; 0 is the compilation directory
    pub directory_index: u64,
}
