//! # dwarfsrc-core
//!
//! Lists the source files behind a binary from its DWARF debug sections.
//!
//! For every compilation unit in `.debug_info` the crate decodes:
//! - the unit header and the declaration of its root DIE
//! - the unit's name and compilation directory
//! - the include directory and file name tables of its line program header
//!
//! Nothing else is interpreted: no DIE tree traversal, no line number
//! program execution, no address lookup.
//!
//! ## Usage
//!
//! ```no_run
//! use dwarfsrc_core::{walk_units, SectionMap, WalkOptions};
//!
//! # fn main() -> dwarfsrc_core::Result<()> {
//! let map = SectionMap::load("target/debug/app".as_ref())?;
//! let report = walk_units(&map.debug_sections()?, WalkOptions::default())?;
//! for unit in &report.units {
//!     println!("{:#x} {}", unit.offset, unit.name.as_deref().unwrap_or("?"));
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure model
//!
//! Reads are bounds checked against each section. A structural problem in a
//! unit stops the walk, since the following bytes can no longer be located.
//! A line table whose header length disagrees with its contents only marks
//! that table as unreliable, unless [`WalkOptions::strict_line_tables`] is set.

pub mod cursor;
pub mod dwarf;
pub mod error;
pub mod report;
pub mod sections;

#[cfg(test)]
mod test_util;

pub use cursor::ByteCursor;
pub use dwarf::{walk_units, UnitWalker, WalkOptions};
// Re-export commonly used types
pub use error::{DwarfError, Result};
pub use report::{FileEntry, LineTableRecord, LineTableStatus, Report, UnitRecord};
pub use sections::{DebugSections, SectionMap};
