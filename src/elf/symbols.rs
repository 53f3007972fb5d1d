//! .symtab and .dynsym. The two tables have the same format but different string
//! tables and either may be missing, e.g. stripped executables have only .dynsym.
use super::class::{Field, Layout};
use super::elf_file::SHN_XINDEX;
use super::error::{ElfError, not_found};
use super::{ElfFile, SectionIndex, StringIndex, StringTable, Table};
use std::borrow::Cow;

pub const SHN_UNDEF: u16 = 0;
pub const SHN_ABS: u16 = 0xfff1;
pub const SHN_COMMON: u16 = 0xfff2;
pub const SHN_LORESERVE: u16 = 0xff00;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolTableKind {
    /// .symtab with names in .strtab
    Static,

    /// .dynsym with names in .dynstr
    Dynamic,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolIndex {
    /// Symbol has an absolute value that will not change with relocation.
    Abs,

    /// A common block that has not yet been allocated. Value has alignment.
    Common,

    /// Symbol value refers to another section at this index.
    Index(SectionIndex),

    /// Value is undefined. Linker will fix these up.
    Undef,

    /// Used when Index overflows. Related section will be of type SHT_SYMTAB_SHNDX.
    XIndex,

    /// Some other index in SHN_LORESERVE..=SHN_HIRESERVE, e.g. processor or OS
    /// specific like SHN_X86_64_LCOMMON. These never name a section.
    Reserved(u16),
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolVisibility {
    /// Visibility is per binding.
    Default,

    /// Visible only within its object file. CPU may special case this.
    Internal,

    /// Visible only within its object file.
    Hidden,

    /// Visible to other object files but cannot be prempted.
    Protected,
}

/// Linkage visibility and behavior
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolBinding {
    /// Symbol is not visible outside the object file containing its definition. These
    /// will appear before global and weak symbols in the table.
    Local,

    /// Visible to all object files.
    Global,

    /// Similar to Global but has lower precedence. These can be preempted by a Global.
    Weak,

    /// For use by OS or CPU.
    Reserved,
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SymbolType {
    None,

    /// A data object, variable, array, etc.
    Object,

    /// Function or other executable code.
    Func,

    /// Another section. Used for relocation.
    Section,

    /// Source file associated with the symbol table.
    File,

    /// Uninitialized common blocks. Used by the linker.
    Common,

    /// Thread Local Storage data. Value is an offset to the data.
    Tls,

    /// For use by OS or CPU.
    Reserved,
}

/// An entry in .symtab or .dynsym (Elf32_Sym or Elf64_Sym).
#[derive(Clone, Copy)]
pub struct Symbol<'a> {
    pub file: &'a ElfFile,
    pub kind: SymbolTableKind,
    pub index: usize,
}

impl ElfFile {
    pub fn symbol(&self, index: usize) -> Result<Symbol<'_>, ElfError> {
        self.symbol_in(SymbolTableKind::Static, index)
    }

    pub fn dynamic_symbol(&self, index: usize) -> Result<Symbol<'_>, ElfError> {
        self.symbol_in(SymbolTableKind::Dynamic, index)
    }

    /// Returns the first symbol in .symtab named name along with its index.
    pub fn symbol_by_name(&self, name: &str) -> Result<(usize, Symbol<'_>), ElfError> {
        self.symbol_by_name_in(SymbolTableKind::Static, name)
    }

    pub fn dynamic_symbol_by_name(&self, name: &str) -> Result<(usize, Symbol<'_>), ElfError> {
        self.symbol_by_name_in(SymbolTableKind::Dynamic, name)
    }

    /// Empty if there is no .symtab.
    pub fn symbols(&self) -> impl Iterator<Item = Symbol<'_>> {
        self.symbols_in(SymbolTableKind::Static)
    }

    /// Empty if there is no .dynsym.
    pub fn dynamic_symbols(&self) -> impl Iterator<Item = Symbol<'_>> {
        self.symbols_in(SymbolTableKind::Dynamic)
    }

    pub fn symbol_in(&self, kind: SymbolTableKind, index: usize) -> Result<Symbol<'_>, ElfError> {
        symbol_table(self, kind)?.entry(index)?;
        Ok(Symbol {
            file: self,
            kind,
            index,
        })
    }

    pub fn symbol_by_name_in(
        &self,
        kind: SymbolTableKind,
        name: &str,
    ) -> Result<(usize, Symbol<'_>), ElfError> {
        symbol_table(self, kind)?;
        symbol_names(self, kind)?;
        for symbol in self.symbols_in(kind) {
            if symbol.name_bytes().is_ok_and(|n| n == Some(name.as_bytes())) {
                log::trace!("found {kind:?} symbol {name} at {}", symbol.index);
                return Ok((symbol.index, symbol));
            }
        }
        Err(not_found(format!("symbol {name}")))
    }

    pub fn symbols_in(&self, kind: SymbolTableKind) -> impl Iterator<Item = Symbol<'_>> {
        let count = symbol_table(self, kind).map_or(0, |t| t.count);
        (0..count).map(move |index| Symbol {
            file: self,
            kind,
            index,
        })
    }
}

impl<'a> Symbol<'a> {
    /// Index of the name within the table's string table, zero if the symbol has no name.
    pub fn name_index(&self) -> Result<StringIndex, ElfError> {
        Ok(StringIndex(self.field(|l| l.symbol.name)? as u32))
    }

    /// None if the symbol has no name.
    pub fn name(&self) -> Result<Option<Cow<'a, str>>, ElfError> {
        Ok(self.name_bytes()?.map(String::from_utf8_lossy))
    }

    pub fn name_bytes(&self) -> Result<Option<&'a [u8]>, ElfError> {
        let index = self.name_index()?;
        if index.0 == 0 {
            return Ok(None);
        }
        let names = symbol_names(self.file, self.kind)?;
        Ok(Some(names.get(&self.file.reader, index)?))
    }

    /// Can be an address, absolute value, etc.
    pub fn value(&self) -> Result<u64, ElfError> {
        self.field(|l| l.symbol.value)
    }

    /// Size of the symbol. Zero if the symbol has no or unknown size.
    pub fn size(&self) -> Result<u64, ElfError> {
        self.field(|l| l.symbol.bytes)
    }

    /// Type and binding.
    pub fn info(&self) -> Result<u8, ElfError> {
        Ok(self.field(|l| l.symbol.info)? as u8)
    }

    /// Visibility.
    pub fn other(&self) -> Result<u8, ElfError> {
        Ok(self.field(|l| l.symbol.other)? as u8)
    }

    pub fn symbol_type(&self) -> Result<SymbolType, ElfError> {
        Ok(SymbolType::from_u8(self.info()?))
    }

    pub fn binding(&self) -> Result<SymbolBinding, ElfError> {
        Ok(SymbolBinding::from_u8(self.info()?))
    }

    pub fn visibility(&self) -> Result<SymbolVisibility, ElfError> {
        Ok(SymbolVisibility::from_u8(self.other()?))
    }

    pub fn section_index(&self) -> Result<SymbolIndex, ElfError> {
        Ok(SymbolIndex::from_u16(self.field(|l| l.symbol.section)? as u16))
    }

    /// Name of the section the symbol is defined in. None for the reserved indices,
    /// those don't name a section.
    pub fn section_name(&self) -> Result<Option<Cow<'a, str>>, ElfError> {
        match self.section_index()? {
            SymbolIndex::Index(index) => {
                let section = self.file.section(index.0 as usize)?;
                Ok(Some(section.name()?))
            }
            _ => Ok(None),
        }
    }

    fn field(&self, select: impl Fn(&'static Layout) -> Field) -> Result<u64, ElfError> {
        let table = symbol_table(self.file, self.kind)?;
        self.file.entry_field(&table, self.index, select)
    }
}

fn symbol_table(file: &ElfFile, kind: SymbolTableKind) -> Result<Table, ElfError> {
    match kind {
        SymbolTableKind::Static => file.tables.symtab.ok_or_else(|| not_found(".symtab")),
        SymbolTableKind::Dynamic => file.tables.dynsym.ok_or_else(|| not_found(".dynsym")),
    }
}

fn symbol_names(file: &ElfFile, kind: SymbolTableKind) -> Result<StringTable, ElfError> {
    match kind {
        SymbolTableKind::Static => file.tables.strtab.ok_or_else(|| not_found(".strtab")),
        SymbolTableKind::Dynamic => file.tables.dynstr.ok_or_else(|| not_found(".dynstr")),
    }
}

impl SymbolIndex {
    pub fn from_u16(value: u16) -> Self {
        match value {
            SHN_UNDEF => SymbolIndex::Undef,
            SHN_ABS => SymbolIndex::Abs,
            SHN_COMMON => SymbolIndex::Common,
            SHN_XINDEX => SymbolIndex::XIndex,
            SHN_LORESERVE.. => SymbolIndex::Reserved(value),
            _ => SymbolIndex::Index(SectionIndex(value as u32)),
        }
    }
}

impl SymbolVisibility {
    pub fn from_u8(value: u8) -> Self {
        // Only the low two bits are used.
        match value & 0x3 {
            0 => SymbolVisibility::Default,
            1 => SymbolVisibility::Internal,
            2 => SymbolVisibility::Hidden,
            _ => SymbolVisibility::Protected,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolVisibility::Default => "DEFAULT",
            SymbolVisibility::Internal => "INTERNAL",
            SymbolVisibility::Hidden => "HIDDEN",
            SymbolVisibility::Protected => "PROTECTED",
        }
    }
}

impl SymbolBinding {
    pub fn from_u8(value: u8) -> Self {
        match value >> 4 {
            0 => SymbolBinding::Local,
            1 => SymbolBinding::Global,
            2 => SymbolBinding::Weak,
            10 | 12 | 13 | 15 => SymbolBinding::Reserved,
            other => {
                log::warn!("unknown symbol binding: {other}");
                SymbolBinding::Reserved
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolBinding::Local => "LOCAL",
            SymbolBinding::Global => "GLOBAL",
            SymbolBinding::Weak => "WEAK",
            SymbolBinding::Reserved => "RESERVED",
        }
    }
}

impl SymbolType {
    pub fn from_u8(value: u8) -> Self {
        match value & 0xf {
            0 => SymbolType::None,
            1 => SymbolType::Object,
            2 => SymbolType::Func,
            3 => SymbolType::Section,
            4 => SymbolType::File,
            5 => SymbolType::Common,
            6 => SymbolType::Tls,
            10 | 12 | 13 | 15 => SymbolType::Reserved,
            other => {
                log::warn!("unknown symbol type: {other}");
                SymbolType::Reserved
            }
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            SymbolType::None => "NOTYPE",
            SymbolType::Object => "OBJECT",
            SymbolType::Func => "FUNC",
            SymbolType::Section => "SECTION",
            SymbolType::File => "FILE",
            SymbolType::Common => "COMMON",
            SymbolType::Tls => "TLS",
            SymbolType::Reserved => "RESERVED",
        }
    }
}
