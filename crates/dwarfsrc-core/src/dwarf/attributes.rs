//! Attribute values of a unit's root DIE.
//!
//! Every attribute listed by the root abbreviation is consumed in order, so
//! the cursor stays aligned with the next value. Three attributes are kept:
//!
//! - `DW_AT_name`: the primary source file of the unit
//! - `DW_AT_comp_dir`: the directory the unit was compiled in
//! - `DW_AT_stmt_list`: offset of the unit's line table in `.debug_line`
//!
//! All other values are skipped by the width their form dictates. A form
//! whose width is unknown stops decoding, since nothing after it can be
//! located.

use gimli::{constants, DwForm, SectionId};
use tracing::trace;

use crate::cursor::ByteCursor;
use crate::dwarf::abbrev::{Abbreviation, AttributeSpec};
use crate::dwarf::unit::UnitHeader;
use crate::error::{DwarfError, Result};
use crate::sections::DebugSections;

/// The root DIE attributes the report is built from.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RootAttributes
{
    pub name: Option<String>,
    pub comp_dir: Option<String>,
    /// Offset of the line table; `None` means the unit has no line table
    pub stmt_list: Option<u64>,
}

/// A decoded attribute value, reduced to what the tracked attributes need.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FormValue<'data>
{
    String(&'data [u8]),
    DebugStrRef(u64),
    DebugLineStrRef(u64),
    SecOffset(u64),
    Data4(u32),
    Data8(u64),
    Skipped,
}

impl RootAttributes
{
    /// Decode the root DIE's attribute values.
    ///
    /// `cursor` must be positioned on the first attribute value, as left by
    /// [`UnitHeader::parse`].
    ///
    /// ## Errors
    ///
    /// - [`DwarfError::UnknownForm`] for a form that cannot be sized, or a
    ///   tracked attribute encoded with a form it cannot have
    /// - [`DwarfError::MissingStringTable`] when the name or directory refers
    ///   to a string section that is absent
    /// - [`DwarfError::OutOfBounds`] if a value runs past the end of its section
    pub fn extract<'data>(
        cursor: &mut ByteCursor<'data>,
        abbrev: &Abbreviation,
        unit: &UnitHeader,
        sections: &DebugSections<'data>,
    ) -> Result<Self>
    {
        let mut attributes = Self::default();

        for spec in &abbrev.attributes {
            let value = read_value(cursor, unit, spec, spec.form)?;
            trace!(
                attribute = spec.attribute,
                form = spec.form,
                position = cursor.position(),
                "root attribute"
            );

            match spec.name() {
                Some(constants::DW_AT_name) => {
                    attributes.name = Some(string_value(value, unit, spec, sections)?);
                }
                Some(constants::DW_AT_comp_dir) => {
                    attributes.comp_dir = Some(string_value(value, unit, spec, sections)?);
                }
                Some(constants::DW_AT_stmt_list) => {
                    let offset = match value {
                        FormValue::SecOffset(offset) | FormValue::Data8(offset) => offset,
                        FormValue::Data4(offset) => u64::from(offset),
                        _ => return Err(unknown_form(unit, spec, spec.form)),
                    };
                    attributes.stmt_list = Some(offset);
                }
                _ => {}
            }
        }

        Ok(attributes)
    }
}

fn unknown_form(unit: &UnitHeader, spec: &AttributeSpec, form: u64) -> DwarfError
{
    DwarfError::UnknownForm {
        unit_offset: unit.offset,
        attribute: spec.attribute,
        form,
    }
}

fn read_value<'data>(
    cursor: &mut ByteCursor<'data>,
    unit: &UnitHeader,
    spec: &AttributeSpec,
    form: u64,
) -> Result<FormValue<'data>>
{
    let Some(dw_form) = u16::try_from(form).ok().map(DwForm) else {
        return Err(unknown_form(unit, spec, form));
    };

    let value = match dw_form {
        constants::DW_FORM_string => FormValue::String(cursor.read_cstring()?),
        constants::DW_FORM_strp => FormValue::DebugStrRef(cursor.read_offset(unit.format)?),
        constants::DW_FORM_line_strp => FormValue::DebugLineStrRef(cursor.read_offset(unit.format)?),
        constants::DW_FORM_sec_offset => FormValue::SecOffset(cursor.read_offset(unit.format)?),
        constants::DW_FORM_data4 => FormValue::Data4(cursor.read_u32()?),
        constants::DW_FORM_data8 => FormValue::Data8(cursor.read_u64()?),
        constants::DW_FORM_indirect => {
            let actual = cursor.read_uleb128()?;
            if actual == form || actual == u64::from(constants::DW_FORM_implicit_const.0) {
                return Err(unknown_form(unit, spec, actual));
            }
            return read_value(cursor, unit, spec, actual);
        }
        other => {
            if !skip_value(cursor, unit, other)? {
                return Err(unknown_form(unit, spec, form));
            }
            FormValue::Skipped
        }
    };

    Ok(value)
}

/// Skip a value whose content is never needed; `false` if the form cannot be sized.
fn skip_value(cursor: &mut ByteCursor<'_>, unit: &UnitHeader, form: DwForm) -> Result<bool>
{
    let offset_size = u64::from(unit.offset_size());
    let address_size = u64::from(unit.address_size);

    match form {
        constants::DW_FORM_flag_present | constants::DW_FORM_implicit_const => {}
        constants::DW_FORM_addr => cursor.skip(address_size)?,
        constants::DW_FORM_data1
        | constants::DW_FORM_flag
        | constants::DW_FORM_ref1
        | constants::DW_FORM_strx1
        | constants::DW_FORM_addrx1 => cursor.skip(1)?,
        constants::DW_FORM_data2 | constants::DW_FORM_ref2 | constants::DW_FORM_strx2 | constants::DW_FORM_addrx2 => {
            cursor.skip(2)?;
        }
        constants::DW_FORM_strx3 | constants::DW_FORM_addrx3 => cursor.skip(3)?,
        constants::DW_FORM_ref4 | constants::DW_FORM_ref_sup4 | constants::DW_FORM_strx4 | constants::DW_FORM_addrx4 => {
            cursor.skip(4)?;
        }
        constants::DW_FORM_ref8 | constants::DW_FORM_ref_sig8 | constants::DW_FORM_ref_sup8 => cursor.skip(8)?,
        constants::DW_FORM_data16 => cursor.skip(16)?,
        constants::DW_FORM_strp_sup | constants::DW_FORM_GNU_ref_alt | constants::DW_FORM_GNU_strp_alt => {
            cursor.skip(offset_size)?;
        }
        // Address-sized before version 3
        constants::DW_FORM_ref_addr => cursor.skip(if unit.version <= 2 { address_size } else { offset_size })?,
        constants::DW_FORM_udata
        | constants::DW_FORM_ref_udata
        | constants::DW_FORM_strx
        | constants::DW_FORM_addrx
        | constants::DW_FORM_loclistx
        | constants::DW_FORM_rnglistx
        | constants::DW_FORM_GNU_addr_index
        | constants::DW_FORM_GNU_str_index => {
            cursor.read_uleb128()?;
        }
        constants::DW_FORM_sdata => {
            cursor.read_sleb128()?;
        }
        constants::DW_FORM_block1 => {
            let len = cursor.read_u8()?;
            cursor.skip(u64::from(len))?;
        }
        constants::DW_FORM_block2 => {
            let len = cursor.read_u16()?;
            cursor.skip(u64::from(len))?;
        }
        constants::DW_FORM_block4 => {
            let len = cursor.read_u32()?;
            cursor.skip(u64::from(len))?;
        }
        constants::DW_FORM_block | constants::DW_FORM_exprloc => {
            let len = cursor.read_uleb128()?;
            cursor.skip(len)?;
        }
        _ => return Ok(false),
    }

    Ok(true)
}

fn string_value(
    value: FormValue<'_>,
    unit: &UnitHeader,
    spec: &AttributeSpec,
    sections: &DebugSections<'_>,
) -> Result<String>
{
    let bytes = match value {
        FormValue::String(bytes) => bytes,
        FormValue::DebugStrRef(offset) => table_string(sections, SectionId::DebugStr, offset, unit)?,
        FormValue::DebugLineStrRef(offset) => table_string(sections, SectionId::DebugLineStr, offset, unit)?,
        _ => return Err(unknown_form(unit, spec, spec.form)),
    };
    Ok(String::from_utf8_lossy(bytes).into_owned())
}

fn table_string<'data>(
    sections: &DebugSections<'data>,
    id: SectionId,
    offset: u64,
    unit: &UnitHeader,
) -> Result<&'data [u8]>
{
    if sections.data(id).is_none() {
        return Err(DwarfError::MissingStringTable {
            unit_offset: unit.offset,
            section: id.name(),
        });
    }
    sections.cursor(id, offset)?.read_cstring()
}
