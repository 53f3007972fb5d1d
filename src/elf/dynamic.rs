//! The .dynamic section: tag/value pairs used by the run-time linker.
use super::class::{Field, Layout};
use super::error::{ElfError, format_error, not_found};
use super::{ElfFile, StringIndex, Table};
use std::borrow::Cow;

pub const DT_NULL: i64 = 0;
pub const DT_NEEDED: i64 = 1;
pub const DT_PLTRELSZ: i64 = 2;
pub const DT_PLTGOT: i64 = 3;
pub const DT_HASH: i64 = 4;
pub const DT_STRTAB: i64 = 5;
pub const DT_SYMTAB: i64 = 6;
pub const DT_RELA: i64 = 7;
pub const DT_RELASZ: i64 = 8;
pub const DT_RELAENT: i64 = 9;
pub const DT_STRSZ: i64 = 10;
pub const DT_SYMENT: i64 = 11;
pub const DT_INIT: i64 = 12;
pub const DT_FINI: i64 = 13;
pub const DT_SONAME: i64 = 14;
pub const DT_RPATH: i64 = 15;
pub const DT_SYMBOLIC: i64 = 16;
pub const DT_REL: i64 = 17;
pub const DT_RELSZ: i64 = 18;
pub const DT_RELENT: i64 = 19;
pub const DT_PLTREL: i64 = 20;
pub const DT_DEBUG: i64 = 21;
pub const DT_TEXTREL: i64 = 22;
pub const DT_JMPREL: i64 = 23;
pub const DT_BIND_NOW: i64 = 24;
pub const DT_INIT_ARRAY: i64 = 25;
pub const DT_FINI_ARRAY: i64 = 26;
pub const DT_INIT_ARRAYSZ: i64 = 27;
pub const DT_FINI_ARRAYSZ: i64 = 28;
pub const DT_RUNPATH: i64 = 29;
pub const DT_FLAGS: i64 = 30;
pub const DT_PREINIT_ARRAY: i64 = 32;
pub const DT_PREINIT_ARRAYSZ: i64 = 33;
pub const DT_GNU_HASH: i64 = 0x6ffffef5;
pub const DT_VERSYM: i64 = 0x6ffffff0;
pub const DT_RELACOUNT: i64 = 0x6ffffff9;
pub const DT_RELCOUNT: i64 = 0x6ffffffa;
pub const DT_FLAGS_1: i64 = 0x6ffffffb;
pub const DT_VERDEF: i64 = 0x6ffffffc;
pub const DT_VERDEFNUM: i64 = 0x6ffffffd;
pub const DT_VERNEED: i64 = 0x6ffffffe;
pub const DT_VERNEEDNUM: i64 = 0x6fffffff;
pub const DT_LOPROC: i64 = 0x70000000;
pub const DT_HIPROC: i64 = 0x7fffffff;

#[derive(Clone, Copy)]
pub struct DynamicEntry<'a> {
    pub file: &'a ElfFile,
    pub index: usize,
}

impl ElfFile {
    pub fn dynamic_entry(&self, index: usize) -> Result<DynamicEntry<'_>, ElfError> {
        dynamic_table(self)?.entry(index)?;
        Ok(DynamicEntry { file: self, index })
    }

    /// First entry with the tag along with its index. NotFound if there's no such
    /// entry or no .dynamic section at all.
    pub fn dynamic_by_tag(&self, tag: i64) -> Result<(usize, DynamicEntry<'_>), ElfError> {
        dynamic_table(self)?;
        for entry in self.dynamic_entries() {
            if entry.tag()? == tag {
                return Ok((entry.index, entry));
            }
        }
        Err(not_found(format!("dynamic entry {}", tag_name(tag))))
    }

    /// Includes the DT_NULL terminator and anything after it.
    pub fn dynamic_entries(&self) -> impl Iterator<Item = DynamicEntry<'_>> {
        let count = self.num_dynamic_entries();
        (0..count).map(move |index| DynamicEntry { file: self, index })
    }
}

impl<'a> DynamicEntry<'a> {
    /// d_tag, signed in both classes.
    pub fn tag(&self) -> Result<i64, ElfError> {
        let table = dynamic_table(self.file)?;
        self.file
            .signed_entry_field(&table, self.index, |l| l.dynamic.tag)
    }

    /// d_un: an address or an integer depending on the tag.
    pub fn value(&self) -> Result<u64, ElfError> {
        self.field(|l| l.dynamic.value)
    }

    pub fn tag_name(&self) -> Result<&'static str, ElfError> {
        Ok(tag_name(self.tag()?))
    }

    /// The string for tags whose value is an offset into .dynstr, None for all other
    /// tags.
    pub fn string_value(&self) -> Result<Option<Cow<'a, str>>, ElfError> {
        match self.tag()? {
            DT_NEEDED | DT_SONAME | DT_RPATH | DT_RUNPATH => {
                let strings = self.file.tables.dynstr.ok_or_else(|| not_found(".dynstr"))?;
                let index = u32::try_from(self.value()?)
                    .map_err(|_| format_error("dynamic string offset is too large"))?;
                Ok(Some(strings.get_str(&self.file.reader, StringIndex(index))?))
            }
            _ => Ok(None),
        }
    }

    fn field(&self, select: impl Fn(&'static Layout) -> Field) -> Result<u64, ElfError> {
        let table = dynamic_table(self.file)?;
        self.file.entry_field(&table, self.index, select)
    }
}

fn dynamic_table(file: &ElfFile) -> Result<Table, ElfError> {
    file.tables.dynamic.ok_or_else(|| not_found(".dynamic"))
}

/// Unknown tags are reported as "UNKNOWN".
pub fn tag_name(tag: i64) -> &'static str {
    match tag {
        DT_NULL => "DT_NULL",
        DT_NEEDED => "DT_NEEDED",
        DT_PLTRELSZ => "DT_PLTRELSZ",
        DT_PLTGOT => "DT_PLTGOT",
        DT_HASH => "DT_HASH",
        DT_STRTAB => "DT_STRTAB",
        DT_SYMTAB => "DT_SYMTAB",
        DT_RELA => "DT_RELA",
        DT_RELASZ => "DT_RELASZ",
        DT_RELAENT => "DT_RELAENT",
        DT_STRSZ => "DT_STRSZ",
        DT_SYMENT => "DT_SYMENT",
        DT_INIT => "DT_INIT",
        DT_FINI => "DT_FINI",
        DT_SONAME => "DT_SONAME",
        DT_RPATH => "DT_RPATH",
        DT_SYMBOLIC => "DT_SYMBOLIC",
        DT_REL => "DT_REL",
        DT_RELSZ => "DT_RELSZ",
        DT_RELENT => "DT_RELENT",
        DT_PLTREL => "DT_PLTREL",
        DT_DEBUG => "DT_DEBUG",
        DT_TEXTREL => "DT_TEXTREL",
        DT_JMPREL => "DT_JMPREL",
        DT_BIND_NOW => "DT_BIND_NOW",
        DT_INIT_ARRAY => "DT_INIT_ARRAY",
        DT_FINI_ARRAY => "DT_FINI_ARRAY",
        DT_INIT_ARRAYSZ => "DT_INIT_ARRAYSZ",
        DT_FINI_ARRAYSZ => "DT_FINI_ARRAYSZ",
        DT_RUNPATH => "DT_RUNPATH",
        DT_FLAGS => "DT_FLAGS",
        DT_PREINIT_ARRAY => "DT_PREINIT_ARRAY",
        DT_PREINIT_ARRAYSZ => "DT_PREINIT_ARRAYSZ",
        DT_GNU_HASH => "DT_GNU_HASH",
        DT_VERSYM => "DT_VERSYM",
        DT_RELACOUNT => "DT_RELACOUNT",
        DT_RELCOUNT => "DT_RELCOUNT",
        DT_FLAGS_1 => "DT_FLAGS_1",
        DT_VERDEF => "DT_VERDEF",
        DT_VERDEFNUM => "DT_VERDEFNUM",
        DT_VERNEED => "DT_VERNEED",
        DT_VERNEEDNUM => "DT_VERNEEDNUM",
        DT_LOPROC => "DT_LOPROC",
        DT_HIPROC => "DT_HIPROC",
        _ => "UNKNOWN",
    }
}
