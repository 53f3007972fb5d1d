//! The 32-bit and 64-bit ELF structures hold the same logical fields but at different
//! offsets and widths (and symbols and program headers even reorder them). Rather than
//! branching on the class at every field read we resolve a [`Layout`] once, when the
//! file is opened, and every reader looks its fields up in that.
//!
//! Layouts follow <https://refspecs.linuxfoundation.org/elf/gabi4+/contents.html>.
use super::error::ElfError;

pub const ELFCLASS32: u8 = 1;
pub const ELFCLASS64: u8 = 2;

/// Width of the file's structures, from EI_CLASS.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum ElfClass {
    Elf32,
    Elf64,
}

impl ElfClass {
    pub fn from_u8(value: u8) -> Result<Self, ElfError> {
        match value {
            ELFCLASS32 => Ok(ElfClass::Elf32),
            ELFCLASS64 => Ok(ElfClass::Elf64),
            _ => Err(ElfError::UnsupportedClass { class: value }),
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            ElfClass::Elf32 => "ELF32",
            ElfClass::Elf64 => "ELF64",
        }
    }

    pub fn layout(self) -> &'static Layout {
        match self {
            ElfClass::Elf32 => &LAYOUT32,
            ElfClass::Elf64 => &LAYOUT64,
        }
    }

    /// Symbol index packed into a relocation's r_info (ELF32_R_SYM/ELF64_R_SYM).
    pub fn r_sym(self, info: u64) -> u32 {
        match self {
            ElfClass::Elf32 => (info >> 8) as u32,
            ElfClass::Elf64 => (info >> 32) as u32,
        }
    }

    /// Relocation type packed into a relocation's r_info (ELF32_R_TYPE/ELF64_R_TYPE).
    pub fn r_type(self, info: u64) -> u32 {
        match self {
            ElfClass::Elf32 => (info & 0xff) as u32,
            ElfClass::Elf64 => (info & 0xffff_ffff) as u32,
        }
    }
}

/// Where a field lives within its structure and how many bytes wide it is.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Field {
    pub offset: usize,
    pub size: usize,
}

const fn field(offset: usize, size: usize) -> Field {
    Field { offset, size }
}

#[derive(Debug)]
pub struct HeaderLayout {
    pub size: usize,
    pub etype: Field,
    pub machine: Field,
    pub version: Field,
    pub entry: Field,
    pub ph_offset: Field,
    pub section_offset: Field,
    pub flags: Field,
    pub header_size: Field,
    pub ph_entry_size: Field,
    pub num_ph_entries: Field,
    pub section_entry_size: Field,
    pub num_section_entries: Field,
    pub string_table_index: Field,
}

#[derive(Debug)]
pub struct SectionLayout {
    pub size: usize,
    pub name: Field,
    pub stype: Field,
    pub flags: Field,
    pub addr: Field,
    pub offset: Field,
    pub bytes: Field,
    pub link: Field,
    pub info: Field,
    pub align: Field,
    pub entry_size: Field,
}

#[derive(Debug)]
pub struct ProgramLayout {
    pub size: usize,
    pub ptype: Field,
    pub flags: Field,
    pub offset: Field,
    pub vaddr: Field,
    pub paddr: Field,
    pub file_size: Field,
    pub mem_size: Field,
    pub align: Field,
}

#[derive(Debug)]
pub struct SymbolLayout {
    pub size: usize,
    pub name: Field,
    pub value: Field,
    pub bytes: Field,
    pub info: Field,
    pub other: Field,
    pub section: Field,
}

#[derive(Debug)]
pub struct DynamicLayout {
    pub size: usize,
    pub tag: Field,
    pub value: Field,
}

#[derive(Debug)]
pub struct RelocationLayout {
    pub size: usize,
    pub offset: Field,
    pub info: Field,
    /// Only relocations "with addend" (SHT_RELA) have this.
    pub addend: Option<Field>,
}

/// Offsets and widths of every field the readers use, for one class.
#[derive(Debug)]
pub struct Layout {
    pub header: HeaderLayout,
    pub section: SectionLayout,
    pub program: ProgramLayout,
    pub symbol: SymbolLayout,
    pub dynamic: DynamicLayout,
    pub rel: RelocationLayout,
    pub rela: RelocationLayout,
}

// Elf32_Ehdr, Elf32_Shdr, Elf32_Phdr, Elf32_Sym, Elf32_Dyn, Elf32_Rel, Elf32_Rela
static LAYOUT32: Layout = Layout {
    header: HeaderLayout {
        size: 52,
        etype: field(16, 2),
        machine: field(18, 2),
        version: field(20, 4),
        entry: field(24, 4),
        ph_offset: field(28, 4),
        section_offset: field(32, 4),
        flags: field(36, 4),
        header_size: field(40, 2),
        ph_entry_size: field(42, 2),
        num_ph_entries: field(44, 2),
        section_entry_size: field(46, 2),
        num_section_entries: field(48, 2),
        string_table_index: field(50, 2),
    },
    section: SectionLayout {
        size: 40,
        name: field(0, 4),
        stype: field(4, 4),
        flags: field(8, 4),
        addr: field(12, 4),
        offset: field(16, 4),
        bytes: field(20, 4),
        link: field(24, 4),
        info: field(28, 4),
        align: field(32, 4),
        entry_size: field(36, 4),
    },
    program: ProgramLayout {
        size: 32,
        ptype: field(0, 4),
        offset: field(4, 4),
        vaddr: field(8, 4),
        paddr: field(12, 4),
        file_size: field(16, 4),
        mem_size: field(20, 4),
        flags: field(24, 4),
        align: field(28, 4),
    },
    symbol: SymbolLayout {
        size: 16,
        name: field(0, 4),
        value: field(4, 4),
        bytes: field(8, 4),
        info: field(12, 1),
        other: field(13, 1),
        section: field(14, 2),
    },
    dynamic: DynamicLayout {
        size: 8,
        tag: field(0, 4),
        value: field(4, 4),
    },
    rel: RelocationLayout {
        size: 8,
        offset: field(0, 4),
        info: field(4, 4),
        addend: None,
    },
    rela: RelocationLayout {
        size: 12,
        offset: field(0, 4),
        info: field(4, 4),
        addend: Some(field(8, 4)),
    },
};

// Elf64_Ehdr, Elf64_Shdr, Elf64_Phdr, Elf64_Sym, Elf64_Dyn, Elf64_Rel, Elf64_Rela
static LAYOUT64: Layout = Layout {
    header: HeaderLayout {
        size: 64,
        etype: field(16, 2),
        machine: field(18, 2),
        version: field(20, 4),
        entry: field(24, 8),
        ph_offset: field(32, 8),
        section_offset: field(40, 8),
        flags: field(48, 4),
        header_size: field(52, 2),
        ph_entry_size: field(54, 2),
        num_ph_entries: field(56, 2),
        section_entry_size: field(58, 2),
        num_section_entries: field(60, 2),
        string_table_index: field(62, 2),
    },
    section: SectionLayout {
        size: 64,
        name: field(0, 4),
        stype: field(4, 4),
        flags: field(8, 8),
        addr: field(16, 8),
        offset: field(24, 8),
        bytes: field(32, 8),
        link: field(40, 4),
        info: field(44, 4),
        align: field(48, 8),
        entry_size: field(56, 8),
    },
    program: ProgramLayout {
        size: 56,
        ptype: field(0, 4),
        flags: field(4, 4),
        offset: field(8, 8),
        vaddr: field(16, 8),
        paddr: field(24, 8),
        file_size: field(32, 8),
        mem_size: field(40, 8),
        align: field(48, 8),
    },
    symbol: SymbolLayout {
        size: 24,
        name: field(0, 4),
        info: field(4, 1),
        other: field(5, 1),
        section: field(6, 2),
        value: field(8, 8),
        bytes: field(16, 8),
    },
    dynamic: DynamicLayout {
        size: 16,
        tag: field(0, 8),
        value: field(8, 8),
    },
    rel: RelocationLayout {
        size: 16,
        offset: field(0, 8),
        info: field(8, 8),
        addend: None,
    },
    rela: RelocationLayout {
        size: 24,
        offset: field(0, 8),
        info: field(8, 8),
        addend: Some(field(16, 8)),
    },
};
