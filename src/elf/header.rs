//! The ELF header: always at the start of the file, with fixed but class dependent
//! field offsets.
use super::error::ElfError;
use super::{ElfClass, Reader};

const EI_DATA: usize = 5;
const EI_VERSION: usize = 6;
const EI_OSABI: usize = 7;
const EI_ABIVERSION: usize = 8;

const EV_CURRENT: u8 = 1;

pub const ET_REL: u16 = 1;
pub const ET_EXEC: u16 = 2;
pub const ET_DYN: u16 = 3;
pub const ET_CORE: u16 = 4;

pub const EM_X86_64: u16 = 62;

pub struct ElfHeader {
    pub class: ElfClass,

    /// EI_DATA: 1 for little endian, 2 for big endian.
    pub data: u8,

    /// EI_VERSION, should be EV_CURRENT.
    pub ident_version: u8,

    pub osabi: u8,
    pub abiversion: u8,

    /// Relocatable, executable, shared object, or core.
    pub etype: u16,

    pub machine: u16,

    /// e_version, normally the same as ident_version.
    pub version: u32,

    /// Virtual address execution starts at, zero if there is no entry point.
    pub entry: u64,

    /// Offset to the program header table.
    pub ph_offset: u64,

    /// Offset to the section header table.
    pub section_offset: u64,

    pub flags: u32,
    pub header_size: u16,
    pub ph_entry_size: u16,
    pub num_ph_entries: u16,
    pub section_entry_size: u16,
    pub num_section_entries: u16,

    /// Section index of .shstrtab.
    pub string_table_index: u16,
}

impl ElfHeader {
    pub fn new(reader: &Reader) -> Result<Self, ElfError> {
        let l = &reader.layout().header;
        Ok(ElfHeader {
            class: reader.class,
            data: reader.read_byte(EI_DATA)?,
            ident_version: reader.read_byte(EI_VERSION)?,
            osabi: reader.read_byte(EI_OSABI)?,
            abiversion: reader.read_byte(EI_ABIVERSION)?,
            etype: reader.read_field(0, l.etype)? as u16,
            machine: reader.read_field(0, l.machine)? as u16,
            version: reader.read_field(0, l.version)? as u32,
            entry: reader.read_field(0, l.entry)?,
            ph_offset: reader.read_field(0, l.ph_offset)?,
            section_offset: reader.read_field(0, l.section_offset)?,
            flags: reader.read_field(0, l.flags)? as u32,
            header_size: reader.read_field(0, l.header_size)? as u16,
            ph_entry_size: reader.read_field(0, l.ph_entry_size)? as u16,
            num_ph_entries: reader.read_field(0, l.num_ph_entries)? as u16,
            section_entry_size: reader.read_field(0, l.section_entry_size)? as u16,
            num_section_entries: reader.read_field(0, l.num_section_entries)? as u16,
            string_table_index: reader.read_field(0, l.string_table_index)? as u16,
        })
    }

    /// "ELF32" or "ELF64".
    pub fn class_name(&self) -> &'static str {
        self.class.name()
    }

    pub fn data_name(&self) -> Option<&'static str> {
        match self.data {
            1 => Some("2's complement, little-endian"),
            2 => Some("2's complement, big-endian"),
            _ => None,
        }
    }

    /// The ELF version from e_ident, 0 if it isn't EV_CURRENT.
    pub fn version(&self) -> u32 {
        if self.ident_version == EV_CURRENT {
            EV_CURRENT as u32
        } else {
            0
        }
    }

    pub fn type_name(&self) -> Option<&'static str> {
        match self.etype {
            ET_REL => Some("REL (relocatable file)"),
            ET_EXEC => Some("EXEC (executable file)"),
            ET_DYN => Some("DYN (shared object)"),
            ET_CORE => Some("CORE (core file)"),
            _ => None,
        }
    }

    pub fn machine(&self) -> &'static str {
        // see https://github.com/torvalds/linux/blob/master/include/uapi/linux/elf-em.h
        match self.machine {
            0 => "none",
            3 => "Intel 80386",
            8 => "MIPS",
            20 => "PowerPC",
            21 => "PowerPC64",
            22 => "IBM S/390",
            40 => "ARM",
            42 => "SuperH",
            43 => "SPARC v9",
            EM_X86_64 => "AMD x86-64",
            183 => "AArch64",
            243 => "RISC-V",
            258 => "LoongArch",
            _ => "unknown",
        }
    }

    pub fn abi(&self) -> &'static str {
        match self.osabi {
            0 => "UNIX - System V",
            1 => "HP-UX",
            2 => "NetBSD",
            3 => "Linux",
            6 => "Solaris",
            9 => "FreeBSD",
            12 => "OpenBSD",
            97 => "ARM",
            255 => "Standalone",
            _ => "unknown",
        }
    }

    pub fn is_x86_64(&self) -> bool {
        self.machine == EM_X86_64
    }
}
