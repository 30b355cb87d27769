//! Abbreviation declarations in `.debug_abbrev`.
//!
//! Only the declaration describing a unit's root DIE is decoded. It must be
//! the first declaration of the unit's abbreviation table: the code found
//! there has to match the root DIE's code, otherwise the table is not laid
//! out the way the decoder expects and decoding stops.

use gimli::{constants, DwAt, DwForm, DwTag};
use smallvec::SmallVec;

use crate::cursor::ByteCursor;
use crate::dwarf::unit::UnitHeader;
use crate::error::{DwarfError, Result};

/// One `(attribute, form)` pair of an abbreviation declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttributeSpec
{
    /// Raw attribute code
    pub attribute: u64,
    /// Raw form code
    pub form: u64,
    /// Constant stored in the declaration for `DW_FORM_implicit_const`
    pub implicit_const: Option<i64>,
}

impl AttributeSpec
{
    /// The attribute as a gimli constant, if it fits the constant's range.
    pub fn name(&self) -> Option<DwAt>
    {
        u16::try_from(self.attribute).ok().map(DwAt)
    }

    /// The form as a gimli constant, if it fits the constant's range.
    pub fn form(&self) -> Option<DwForm>
    {
        u16::try_from(self.form).ok().map(DwForm)
    }
}

/// An abbreviation declaration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Abbreviation
{
    pub code: u64,
    pub tag: u64,
    pub has_children: bool,
    /// Attribute specifications in declaration order, without the `(0, 0)` terminator
    pub attributes: SmallVec<[AttributeSpec; 8]>,
}

impl Abbreviation
{
    /// Decode the declaration of `unit`'s root DIE.
    ///
    /// The cursor must be positioned at the unit's abbreviation offset.
    ///
    /// ## Errors
    ///
    /// - [`DwarfError::AbbrevMismatch`] if the declaration's code is not the root DIE's code
    /// - [`DwarfError::OutOfBounds`] if the declaration is truncated
    pub fn parse_root(cursor: &mut ByteCursor<'_>, unit: &UnitHeader) -> Result<Self>
    {
        let code = cursor.read_uleb128()?;
        if code != unit.root_abbrev_code {
            return Err(DwarfError::AbbrevMismatch {
                unit_offset: unit.offset,
                abbrev_offset: unit.abbrev_offset,
                expected: unit.root_abbrev_code,
                found: code,
            });
        }

        let tag = cursor.read_uleb128()?;
        let has_children = cursor.read_u8()? != 0;

        let mut attributes = SmallVec::new();
        loop {
            let attribute = cursor.read_uleb128()?;
            let form = cursor.read_uleb128()?;
            if attribute == 0 {
                break;
            }

            let implicit_const = if form == u64::from(constants::DW_FORM_implicit_const.0) {
                Some(cursor.read_sleb128()?)
            } else {
                None
            };

            attributes.push(AttributeSpec {
                attribute,
                form,
                implicit_const,
            });
        }

        Ok(Self {
            code,
            tag,
            has_children,
            attributes,
        })
    }

    /// The tag as a gimli constant, if it fits the constant's range.
    pub fn tag(&self) -> Option<DwTag>
    {
        u16::try_from(self.tag).ok().map(DwTag)
    }
}
