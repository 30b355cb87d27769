//! Compilation unit headers in `.debug_info`.
//!
//! Headers of versions 2 to 5 are decoded, including the DWARF 5 unit types
//! that carry a `dwo_id` or a type signature. Decoding the header is as far
//! as DWARF 5 support goes. The root DIE is expected to use abbreviation
//! code 1, and DWARF 5 producers usually share one abbreviation table across
//! units, so most later units fail with [`DwarfError::AbbrevMismatch`]. A
//! name or compilation directory stored as `DW_FORM_strx*` needs
//! `.debug_str_offsets`, which is never read, and fails with
//! [`DwarfError::UnknownForm`].

use gimli::{constants, DwUt, Format};

use crate::cursor::ByteCursor;
use crate::error::{DwarfError, Result};

/// Decoded header of one compilation unit.
///
/// Produced by [`UnitHeader::parse`], which leaves the cursor on the first
/// attribute value of the unit's root DIE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnitHeader
{
    /// Offset of the unit in `.debug_info`
    pub offset: u64,
    /// 32-bit or 64-bit DWARF, selected by the initial length field
    pub format: Format,
    /// Value of the unit length field
    pub unit_length: u64,
    /// Format version of the unit
    pub version: u16,
    /// Unit type, only present from version 5 onward
    pub unit_type: Option<DwUt>,
    /// Offset of the unit's abbreviation table in `.debug_abbrev`
    pub abbrev_offset: u64,
    /// Width of target addresses in bytes
    pub address_size: u8,
    /// Abbreviation code of the root DIE (0 for a unit without entries)
    pub root_abbrev_code: u64,
    /// Offset where the following unit starts
    pub next_unit_offset: u64,
}

impl UnitHeader
{
    /// Decode the unit header starting at the cursor's position.
    ///
    /// The next unit offset is `offset + (2 * offset_size - 4) + unit_length`,
    /// which is the size of the initial length field plus the declared length.
    ///
    /// ## Errors
    ///
    /// - [`DwarfError::MalformedUnit`] if the next unit offset overflows
    /// - [`DwarfError::OutOfBounds`] if the header is truncated
    pub fn parse(cursor: &mut ByteCursor<'_>) -> Result<Self>
    {
        let offset = cursor.position();
        let (unit_length, format) = cursor.read_initial_length()?;

        let initial_length_size = 2 * u64::from(format.word_size()) - 4;
        let next_unit_offset = offset
            .checked_add(initial_length_size)
            .and_then(|end| end.checked_add(unit_length))
            .filter(|next| *next > offset)
            .ok_or(DwarfError::MalformedUnit {
                offset,
                length: unit_length,
            })?;

        let version = cursor.read_u16()?;

        let (unit_type, abbrev_offset, address_size) = if version >= 5 {
            let unit_type = DwUt(cursor.read_u8()?);
            let address_size = cursor.read_u8()?;
            let abbrev_offset = cursor.read_offset(format)?;
            match unit_type {
                constants::DW_UT_skeleton | constants::DW_UT_split_compile => {
                    // dwo_id
                    cursor.skip(8)?;
                }
                constants::DW_UT_type | constants::DW_UT_split_type => {
                    // type_signature, type_offset
                    cursor.skip(8)?;
                    cursor.read_offset(format)?;
                }
                _ => {}
            }
            (Some(unit_type), abbrev_offset, address_size)
        } else {
            let abbrev_offset = cursor.read_offset(format)?;
            let address_size = cursor.read_u8()?;
            (None, abbrev_offset, address_size)
        };

        let root_abbrev_code = cursor.read_uleb128()?;

        Ok(Self {
            offset,
            format,
            unit_length,
            version,
            unit_type,
            abbrev_offset,
            address_size,
            root_abbrev_code,
            next_unit_offset,
        })
    }

    /// Size of section offsets in this unit (4 or 8 bytes).
    pub fn offset_size(&self) -> u8
    {
        self.format.word_size()
    }
}
