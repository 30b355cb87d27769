//! Shared fixtures: synthetic debug sections and ELF containers holding them.

#![allow(dead_code)]

use gimli::constants;
use object::write::Object;
use object::{Architecture, BinaryFormat, Endianness, SectionFlags, SectionKind};

/// Byte sink with the container's byte order.
pub struct Encoder
{
    big_endian: bool,
    pub bytes: Vec<u8>,
}

impl Encoder
{
    pub fn new(big_endian: bool) -> Self
    {
        Self {
            big_endian,
            bytes: Vec::new(),
        }
    }

    pub fn u8(&mut self, value: u8) -> &mut Self
    {
        self.bytes.push(value);
        self
    }

    pub fn u16(&mut self, value: u16) -> &mut Self
    {
        let bytes = if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() };
        self.bytes.extend_from_slice(&bytes);
        self
    }

    pub fn u32(&mut self, value: u32) -> &mut Self
    {
        let bytes = if self.big_endian { value.to_be_bytes() } else { value.to_le_bytes() };
        self.bytes.extend_from_slice(&bytes);
        self
    }

    pub fn uleb(&mut self, mut value: u64) -> &mut Self
    {
        loop {
            let byte = (value & 0x7f) as u8;
            value >>= 7;
            if value == 0 {
                self.bytes.push(byte);
                return self;
            }
            self.bytes.push(byte | 0x80);
        }
    }

    pub fn cstr(&mut self, value: &str) -> &mut Self
    {
        self.bytes.extend_from_slice(value.as_bytes());
        self.bytes.push(0);
        self
    }

    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self
    {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> u32
    {
        u32::try_from(self.bytes.len()).unwrap()
    }
}

/// Debug sections of a two-unit program, 32-bit DWARF version 4.
pub struct DebugImage
{
    pub info: Vec<u8>,
    pub abbrev: Vec<u8>,
    pub line: Vec<u8>,
    pub str: Vec<u8>,
}

fn line_table(big_endian: bool, directories: &[&str], files: &[(&str, u64)]) -> Vec<u8>
{
    let mut tables = Encoder::new(big_endian);
    // min_inst_length, max_ops, default_is_stmt, line_base, line_range, opcode_base
    tables.raw(&[1, 1, 1, 0xfb, 14, 13]);
    tables.raw(&[0, 1, 1, 1, 1, 0, 0, 0, 1, 0, 0, 1]);
    for dir in directories {
        tables.cstr(dir);
    }
    tables.u8(0);
    for (path, dir) in files {
        tables.cstr(path).uleb(*dir).uleb(0).uleb(0);
    }
    tables.u8(0);

    let mut out = Encoder::new(big_endian);
    out.u32(2 + 4 + tables.len() + 1)
        .u16(4)
        .u32(tables.len())
        .raw(&tables.bytes)
        // DW_LNS_copy
        .u8(0x01);
    out.bytes
}

fn unit(big_endian: bool, die: &[u8]) -> Vec<u8>
{
    let mut out = Encoder::new(big_endian);
    out.u32(u32::try_from(2 + 4 + 1 + die.len()).unwrap())
        .u16(4)
        .u32(0)
        .u8(8)
        .raw(die);
    out.bytes
}

impl DebugImage
{
    /// `main.c` and `util.c`, compiled in `/home/user`.
    ///
    /// Names are inline strings, the compilation directory lives in
    /// `.debug_str`, and a producer string is skipped by width.
    pub fn two_units(big_endian: bool) -> Self
    {
        let mut str = Encoder::new(big_endian);
        str.cstr("clang version 17").cstr("/home/user");
        let producer = 0;
        let comp_dir = 17;

        let mut abbrev = Encoder::new(big_endian);
        abbrev
            .uleb(1)
            .uleb(constants::DW_TAG_compile_unit.0.into())
            .u8(constants::DW_CHILDREN_yes.0);
        for (attribute, form) in [
            (constants::DW_AT_producer, constants::DW_FORM_strp),
            (constants::DW_AT_name, constants::DW_FORM_string),
            (constants::DW_AT_comp_dir, constants::DW_FORM_strp),
            (constants::DW_AT_stmt_list, constants::DW_FORM_sec_offset),
        ] {
            abbrev.uleb(attribute.0.into()).uleb(form.0.into());
        }
        abbrev.uleb(0).uleb(0).u8(0);

        let first_line = line_table(big_endian, &["/usr/include"], &[("main.c", 0), ("stdio.h", 1)]);
        let second_line = line_table(big_endian, &[], &[("util.c", 0)]);
        let mut line = first_line.clone();
        line.extend_from_slice(&second_line);

        let mut info = Vec::new();
        for (name, stmt_list) in [("main.c", 0), ("util.c", u32::try_from(first_line.len()).unwrap())] {
            let mut die = Encoder::new(big_endian);
            die.uleb(1).u32(producer).cstr(name).u32(comp_dir).u32(stmt_list);
            info.extend(unit(big_endian, &die.bytes));
        }

        Self {
            info,
            abbrev: abbrev.bytes,
            line,
            str: str.bytes,
        }
    }

    pub fn named_sections(&self) -> Vec<(&'static str, &[u8])>
    {
        vec![
            (".debug_info", self.info.as_slice()),
            (".debug_abbrev", self.abbrev.as_slice()),
            (".debug_line", self.line.as_slice()),
            (".debug_str", self.str.as_slice()),
        ]
    }
}

/// One section to place in a synthetic ELF file.
pub struct ElfSection<'a>
{
    pub name: &'a str,
    pub data: &'a [u8],
    /// `UninitializedData` places a NOBITS section of `data.len()` bytes
    pub kind: SectionKind,
    pub sh_flags: u64,
}

impl<'a> From<(&'a str, &'a [u8])> for ElfSection<'a>
{
    fn from((name, data): (&'a str, &'a [u8])) -> Self
    {
        Self {
            name,
            data,
            kind: SectionKind::Debug,
            sh_flags: 0,
        }
    }
}

/// Wrap `payload` in an `Elf64_Chdr` announcing zlib compression.
///
/// The payload is not real zlib data; only the header is ever read.
pub fn zlib_compressed(uncompressed_size: u64, payload: &[u8]) -> Vec<u8>
{
    let mut out = Encoder::new(false);
    out.u32(object::elf::ELFCOMPRESS_ZLIB)
        // ch_reserved
        .u32(0)
        .raw(&uncompressed_size.to_le_bytes())
        // ch_addralign
        .raw(&1u64.to_le_bytes())
        .raw(payload);
    out.bytes
}

/// Build an ELF relocatable object holding `sections` as debug sections.
pub fn elf<'a>(big_endian: bool, sections: impl IntoIterator<Item = ElfSection<'a>>) -> Vec<u8>
{
    let (architecture, endian) = if big_endian {
        (Architecture::PowerPc64, Endianness::Big)
    } else {
        (Architecture::X86_64, Endianness::Little)
    };
    let mut object = Object::new(BinaryFormat::Elf, architecture, endian);
    for section in sections {
        let id = object.add_section(Vec::new(), section.name.as_bytes().to_vec(), section.kind);
        if section.kind == SectionKind::UninitializedData {
            object.append_section_bss(id, section.data.len() as u64, 1);
        } else {
            object.append_section_data(id, section.data, 1);
            object.section_mut(id).flags = SectionFlags::Elf {
                sh_flags: section.sh_flags,
            };
        }
    }
    object.write().unwrap()
}
