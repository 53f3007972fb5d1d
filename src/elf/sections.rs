//! Used by the linker and debugger. Also see segments.
use super::class::{Field, Layout};
use super::error::{ElfError, not_found};
use super::{ElfFile, StringIndex, Table};
use std::borrow::Cow;

const WRITE_FLAG: u64 = 1 << 0; // Writable
const ALLOC_FLAG: u64 = 1 << 1; // Occupies memory during execution
const EXECINSTR_FLAG: u64 = 1 << 2; // Executable
const MERGE_FLAG: u64 = 1 << 4; // Might be merged
const STRINGS_FLAG: u64 = 1 << 5; // Contains nul-terminated strings
const INFO_LINK_FLAG: u64 = 1 << 6; // `sh_info' contains SHT index
const LINK_ORDER_FLAG: u64 = 1 << 7; // Preserve order after combining
const OS_NONCONFORMING_FLAG: u64 = 1 << 8; // Non-standard OS specific handling required
const GROUP_FLAG: u64 = 1 << 9; // Section is member of a group.
const TLS_FLAG: u64 = 1 << 10; // Section hold thread-local data.
const COMPRESSED_FLAG: u64 = 1 << 11; // Section with compressed data.
const MASKOS_FLAG: u64 = 0x0ff00000; // OS-specific.
const MASKPROC_FLAG: u64 = 0xf0000000; // Processor-specific

pub const SHT_RELA: u32 = 4;
pub const SHT_NOBITS: u32 = 8;
pub const SHT_REL: u32 = 9;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SectionType {
    /// Dynamic linking information.
    Dynamic,

    // Dynamic linker symbol table.
    DynamicSymbolTable,

    /// Array of pointers to termination functions.
    FiniArray,

    /// GNU style hash table.
    GnuHash,

    /// Section group.
    Group,

    /// Array of pointers to initialization functions.
    InitArray,

    /// Uninitialized data.
    NoBits,

    /// Arbitrary metadata.
    Note,

    /// Not to be used.
    Null,

    /// Array of pointers to functions to be called before the regular
    /// initialization functions.
    PreinitArray,

    /// CPU instructions or constant data.
    ProgBits,

    /// Relocation entries with addends.
    RelocationsWith,

    /// Relocation entries without addends.
    RelocationsWithout,

    /// Strings for use by the linker and debugger.
    StringTable,

    /// Symbol hash table.
    SymbolHashTable,

    /// Full symbol table, usually stripped from release builds.
    SymbolTable,

    /// Extended section indices for a symbol table.
    SymbolTableIndices,

    /// GNU symbol versions that are provided.
    VerDef,

    /// GNU symbol versions that are required.
    VerNeed,

    /// GNU symbol version table.
    VerSym,

    /// OS or processor specific, or just garbage.
    Unknown(u32),
}

impl SectionType {
    pub fn from_u32(value: u32) -> Self {
        match value {
            0x6 => SectionType::Dynamic, // see https://android.googlesource.com/platform/art/+/e34fa1d/runtime/elf.h
            0xb => SectionType::DynamicSymbolTable,
            0xf => SectionType::FiniArray,
            0x5 => SectionType::SymbolHashTable,
            0xe => SectionType::InitArray,
            0x11 => SectionType::Group,
            0x8 => SectionType::NoBits,
            0x7 => SectionType::Note,
            0x0 => SectionType::Null,
            0x10 => SectionType::PreinitArray,
            0x1 => SectionType::ProgBits,
            SHT_REL => SectionType::RelocationsWithout,
            SHT_RELA => SectionType::RelocationsWith,
            0x3 => SectionType::StringTable,
            0x2 => SectionType::SymbolTable,
            0x12 => SectionType::SymbolTableIndices,
            0x6ffffff6 => SectionType::GnuHash,
            0x6ffffffd => SectionType::VerDef,
            0x6ffffffe => SectionType::VerNeed,
            0x6fffffff => SectionType::VerSym,
            _ => SectionType::Unknown(value),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SectionType::Dynamic => "SHT_DYNAMIC",
            SectionType::DynamicSymbolTable => "SHT_DYNSYM",
            SectionType::FiniArray => "SHT_FINI_ARRAY",
            SectionType::GnuHash => "SHT_GNU_HASH",
            SectionType::Group => "SHT_GROUP",
            SectionType::InitArray => "SHT_INIT_ARRAY",
            SectionType::NoBits => "SHT_NOBITS",
            SectionType::Note => "SHT_NOTE",
            SectionType::Null => "SHT_NULL",
            SectionType::PreinitArray => "SHT_PREINIT_ARRAY",
            SectionType::ProgBits => "SHT_PROGBITS",
            SectionType::RelocationsWith => "SHT_RELA",
            SectionType::RelocationsWithout => "SHT_REL",
            SectionType::StringTable => "SHT_STRTAB",
            SectionType::SymbolHashTable => "SHT_HASH",
            SectionType::SymbolTable => "SHT_SYMTAB",
            SectionType::SymbolTableIndices => "SHT_SYMTAB_SHNDX",
            SectionType::VerDef => "SHT_GNU_verdef",
            SectionType::VerNeed => "SHT_GNU_verneed",
            SectionType::VerSym => "SHT_GNU_versym",
            SectionType::Unknown(_) => "UNKNOWN",
        }
    }
}

pub fn section_flags(flags: u64) -> String {
    let mut result = Vec::new();
    if flags & WRITE_FLAG != 0 {
        result.push("WRITE");
    }
    if flags & ALLOC_FLAG != 0 {
        result.push("ALLOC");
    }
    if flags & EXECINSTR_FLAG != 0 {
        result.push("EXEC");
    }
    if flags & MERGE_FLAG != 0 {
        result.push("MERGE");
    }
    if flags & STRINGS_FLAG != 0 {
        result.push("STRINGS");
    }
    if flags & INFO_LINK_FLAG != 0 {
        result.push("INFO");
    }
    if flags & LINK_ORDER_FLAG != 0 {
        result.push("LINK");
    }
    if flags & OS_NONCONFORMING_FLAG != 0 {
        result.push("OS_NONCONFORMING");
    }
    if flags & GROUP_FLAG != 0 {
        result.push("GROUP");
    }
    if flags & TLS_FLAG != 0 {
        result.push("TLS");
    }
    if flags & COMPRESSED_FLAG != 0 {
        result.push("COMPRESSED");
    }
    if flags & MASKOS_FLAG != 0 {
        result.push("MASKOS");
    }
    if flags & MASKPROC_FLAG != 0 {
        result.push("MASKPROC");
    }
    if result.is_empty() {
        result.push("none");
    }
    result.join(" ")
}

/// A section header within an open file (Elf32_Shdr or Elf64_Shdr). Fields are read
/// from the mapping on each call.
#[derive(Clone, Copy)]
pub struct Section<'a> {
    pub file: &'a ElfFile,
    pub index: usize,
}

impl ElfFile {
    pub fn section(&self, index: usize) -> Result<Section<'_>, ElfError> {
        self.tables.sections.entry(index)?;
        Ok(Section { file: self, index })
    }

    /// Returns the first section named name along with its index. Section names aren't
    /// required to be unique.
    pub fn section_by_name(&self, name: &str) -> Result<(usize, Section<'_>), ElfError> {
        if self.tables.shstrtab.is_none() {
            return Err(not_found(".shstrtab"));
        }
        for section in self.sections() {
            if section.name_bytes().is_ok_and(|n| n == name.as_bytes()) {
                log::trace!("found section {name} at {}", section.index);
                return Ok((section.index, section));
            }
        }
        Err(not_found(format!("section {name}")))
    }

    pub fn sections(&self) -> impl Iterator<Item = Section<'_>> {
        (0..self.tables.sections.count).map(move |index| Section { file: self, index })
    }
}

impl<'a> Section<'a> {
    /// Index of the name within .shstrtab.
    pub fn name_index(&self) -> Result<StringIndex, ElfError> {
        Ok(StringIndex(self.field(|l| l.section.name)? as u32))
    }

    pub fn name(&self) -> Result<Cow<'a, str>, ElfError> {
        Ok(String::from_utf8_lossy(self.name_bytes()?))
    }

    pub fn name_bytes(&self) -> Result<&'a [u8], ElfError> {
        let names = self.file.tables.shstrtab.ok_or_else(|| not_found(".shstrtab"))?;
        names.get(&self.file.reader, self.name_index()?)
    }

    /// The raw sh_type.
    pub fn stype(&self) -> Result<u32, ElfError> {
        Ok(self.field(|l| l.section.stype)? as u32)
    }

    pub fn section_type(&self) -> Result<SectionType, ElfError> {
        Ok(SectionType::from_u32(self.stype()?))
    }

    /// Write, alloc, and/or exec. See section_flags.
    pub fn flags(&self) -> Result<u64, ElfError> {
        self.field(|l| l.section.flags)
    }

    /// Virtual address at execution, zero if the section isn't loaded.
    pub fn addr(&self) -> Result<u64, ElfError> {
        self.field(|l| l.section.addr)
    }

    /// Offset into the file of the section's contents.
    pub fn offset(&self) -> Result<u64, ElfError> {
        self.field(|l| l.section.offset)
    }

    /// Size in bytes.
    pub fn size(&self) -> Result<u64, ElfError> {
        self.field(|l| l.section.bytes)
    }

    /// Link to another section with related information, usually a string
    /// or symbol table.
    pub fn link(&self) -> Result<u32, ElfError> {
        Ok(self.field(|l| l.section.link)? as u32)
    }

    pub fn info(&self) -> Result<u32, ElfError> {
        Ok(self.field(|l| l.section.info)? as u32)
    }

    pub fn align(&self) -> Result<u64, ElfError> {
        self.field(|l| l.section.align)
    }

    /// Set if the section holds a table of entries.
    pub fn entry_size(&self) -> Result<u64, ElfError> {
        self.field(|l| l.section.entry_size)
    }

    /// size / entry_size, or zero when there is no entry size.
    pub fn num_entries(&self) -> Result<usize, ElfError> {
        Ok(Table::count_entries(self.size()?, self.entry_size()?))
    }

    pub fn is_relocation(&self) -> Result<bool, ElfError> {
        Ok(matches!(self.stype()?, SHT_REL | SHT_RELA))
    }

    fn field(&self, select: impl Fn(&'static Layout) -> Field) -> Result<u64, ElfError> {
        self.file
            .entry_field(&self.file.tables.sections, self.index, select)
    }
}
