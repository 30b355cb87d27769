//! Report rendering.
//!
//! The text format is a nested key/value listing, one block per unit:
//!
//! ```text
//! CompilationUnits:
//! - Offset: 0
//!   AbbrevOffset: 0
//!   Name: main.c
//!   CompDir: /home/user
//!   LineTableOffset: 0
//!   LineTableVersion: 4
//!   Directories:
//!   - /usr/include
//!   Files:
//!   - Path: main.c
//!     DirectoryIndex: 0
//! ```
//!
//! Units are written as they are decoded, so a walk that fails part way still
//! shows everything before the failure.

use std::io::{self, Write};

use clap::ValueEnum;
use dwarfsrc_core::{LineTableStatus, Report, UnitRecord};

/// Report format selected with `--format`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat
{
    /// Nested key/value text
    #[default]
    Text,
    /// A single JSON document
    Json,
}

pub fn write_text_header(out: &mut impl Write) -> io::Result<()>
{
    writeln!(out, "CompilationUnits:")
}

pub fn write_text_unit(out: &mut impl Write, unit: &UnitRecord) -> io::Result<()>
{
    writeln!(out, "- Offset: {}", unit.offset)?;
    writeln!(out, "  AbbrevOffset: {}", unit.abbrev_offset)?;
    if let Some(name) = &unit.name {
        writeln!(out, "  Name: {name}")?;
    }
    if let Some(comp_dir) = &unit.comp_dir {
        writeln!(out, "  CompDir: {comp_dir}")?;
    }

    let Some(table) = &unit.line_table else {
        return Ok(());
    };
    writeln!(out, "  LineTableOffset: {}", table.offset)?;
    writeln!(out, "  LineTableVersion: {}", table.version)?;

    if !table.directories.is_empty() {
        writeln!(out, "  Directories:")?;
        for directory in &table.directories {
            writeln!(out, "  - {directory}")?;
        }
    }
    if !table.files.is_empty() {
        writeln!(out, "  Files:")?;
        for file in &table.files {
            writeln!(out, "  - Path: {}", file.path)?;
            writeln!(out, "    DirectoryIndex: {}", file.directory_index)?;
        }
    }

    if let LineTableStatus::HeaderLengthMismatch { declared, consumed } = table.status {
        writeln!(
            out,
            "  LineTableWarning: header was supposed to be {declared} bytes long, but it is {consumed} bytes long"
        )?;
    }
    Ok(())
}

pub fn write_json(out: &mut impl Write, report: &Report) -> io::Result<()>
{
    serde_json::to_writer_pretty(&mut *out, report).map_err(io::Error::from)?;
    writeln!(out)
}
