//! DWARF decoding, one module per structure.
//!
//! The pipeline for a single unit is [`unit`] → [`abbrev`] → [`attributes`]
//! → [`line`], driven across the whole section by [`walker`].

pub mod abbrev;
pub mod attributes;
pub mod line;
pub mod unit;
pub mod walker;

pub use abbrev::{Abbreviation, AttributeSpec};
pub use attributes::RootAttributes;
pub use line::{read_line_program_header, LineHeader, LineProgramHeader};
pub use unit::UnitHeader;
pub use walker::{walk_units, UnitWalker, WalkOptions};
