//! # Error Types
//!
//! Error handling for DWARF decoding.
//!
//! We use `thiserror` to automatically generate `Error` trait implementations
//! and nice error messages.

use thiserror::Error;

/// Main error type for decoding operations
///
/// Each variant corresponds to a specific condition detected while walking
/// the debug sections. Variants carry the offsets needed to locate the
/// problem in the binary.
///
/// ## Error Categories
///
/// 1. **Container errors**: MissingSection, CompressedSection, Object, Io
/// 2. **Unit errors**: MalformedUnit, AbbrevMismatch, UnknownForm, MissingStringTable
/// 3. **Line table errors**: HeaderLengthMismatch
/// 4. **Bounds errors**: OutOfBounds (any read past the end of a section)
///
/// Only `HeaderLengthMismatch` is local to a single unit, see
/// [`DwarfError::is_unit_local`].
#[derive(Error, Debug)]
pub enum DwarfError
{
    /// A mandatory debug section is absent (or empty, or storage-only)
    #[error("Failed to find {name} section")]
    MissingSection
    {
        /// Canonical section name, e.g. `.debug_info`
        name: &'static str,
    },

    /// A debug section is stored compressed
    ///
    /// Compressed sections (`SHF_COMPRESSED`) are not decoded.
    #[error("Section {name} is compressed, which is not supported")]
    CompressedSection
    {
        /// Section name as found in the container
        name: String,
    },

    /// The unit length bookkeeping of a compilation unit is inconsistent
    ///
    /// Raised when the computed offset of the next unit overflows or does
    /// not move past the current unit.
    #[error("Malformed compilation unit at offset {offset}: unit length {length} does not advance the walk")]
    MalformedUnit
    {
        /// Offset of the unit in `.debug_info`
        offset: u64,
        /// Declared unit length
        length: u64,
    },

    /// The abbreviation table does not start with the root DIE's code
    #[error(
        "Abbreviation code mismatch in compilation unit at offset {unit_offset}: \
         expected {expected}, found {found} at abbreviation offset {abbrev_offset}"
    )]
    AbbrevMismatch
    {
        /// Offset of the unit in `.debug_info`
        unit_offset: u64,
        /// Offset of the unit's abbreviation table in `.debug_abbrev`
        abbrev_offset: u64,
        /// Abbreviation code of the root DIE
        expected: u64,
        /// Code found at the start of the abbreviation table
        found: u64,
    },

    /// An attribute uses a form whose byte width cannot be determined
    ///
    /// This is also raised when one of the tracked attributes (name,
    /// compilation directory, statement list) uses a form that is not
    /// valid for it.
    #[error("Unknown DW_FORM {form:#x} for attribute {attribute:#x} in compilation unit at offset {unit_offset}")]
    UnknownForm
    {
        /// Offset of the unit in `.debug_info`
        unit_offset: u64,
        /// Raw attribute code
        attribute: u64,
        /// Raw form code
        form: u64,
    },

    /// A string-table reference was found but the string table is absent
    #[error("Failed to find {section} section, but it is referenced by compilation unit at offset {unit_offset}")]
    MissingStringTable
    {
        /// Offset of the unit in `.debug_info`
        unit_offset: u64,
        /// The string section that was referenced
        section: &'static str,
    },

    /// The line program header's declared length disagrees with its contents
    #[error(
        "Invalid .debug_line header at offset {offset}. Header was supposed to be {declared} bytes long, \
         but it is {consumed} bytes long"
    )]
    HeaderLengthMismatch
    {
        /// Offset of the line table in `.debug_line`
        offset: u64,
        /// Value of the `header_length` field
        declared: u64,
        /// Bytes actually consumed by the header fields and tables
        consumed: u64,
    },

    /// A read would run past the end of a section
    #[error("Read of {needed} bytes at offset {offset} runs past the end of {section}")]
    OutOfBounds
    {
        /// Name of the section being read
        section: &'static str,
        /// Offset of the read within the section
        offset: u64,
        /// Number of bytes the read required
        needed: u64,
    },

    /// The container could not be parsed
    #[error("Failed to parse object file: {0}")]
    Object(#[from] object::Error),

    /// I/O error (reading the container from disk)
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl DwarfError
{
    /// Whether the error only invalidates the current unit's line table
    ///
    /// The unit walker reports such units with a diagnostic status and
    /// carries on, unless strict mode is enabled. Every other condition
    /// means the remaining bytes cannot be trusted and stops the walk.
    #[must_use]
    pub fn is_unit_local(&self) -> bool
    {
        matches!(self, DwarfError::HeaderLengthMismatch { .. })
    }
}

/// Convenience type alias for `Result<T, DwarfError>`
///
/// ```rust
/// use dwarfsrc_core::error::Result;
/// fn foo() -> Result<()>
/// {
///     Ok(())
/// }
/// ```
pub type Result<T> = std::result::Result<T, DwarfError>;
