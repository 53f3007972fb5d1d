//! Used by the run-time loader. Also see sections.
use super::ElfFile;
use super::class::{Field, Layout};
use super::error::ElfError;

const EXECUTE_FLAG: u32 = 0x1;
const WRITE_FLAG: u32 = 0x2;
const READ_FLAG: u32 = 0x4;

pub const PT_NULL: u32 = 0;
pub const PT_LOAD: u32 = 1;
pub const PT_DYNAMIC: u32 = 2;
pub const PT_INTERP: u32 = 3;
pub const PT_NOTE: u32 = 4;
pub const PT_SHLIB: u32 = 5;
pub const PT_PHDR: u32 = 6;
pub const PT_TLS: u32 = 7;
pub const PT_GNU_EH_FRAME: u32 = 0x6474e550;
pub const PT_GNU_STACK: u32 = 0x6474e551;
pub const PT_GNU_RELRO: u32 = 0x6474e552;
pub const PT_GNU_PROPERTY: u32 = 0x6474e553;
pub const PT_LOPROC: u32 = 0x70000000;
pub const PT_HIPROC: u32 = 0x7fffffff;

/// Describes a segment (Elf64_Phdr or Elf32_Phdr). The field order differs between
/// the two classes: p_flags follows p_type in 64-bit files.
#[derive(Clone, Copy)]
pub struct ProgramHeader<'a> {
    pub file: &'a ElfFile,
    pub index: usize,
}

impl ElfFile {
    pub fn segment(&self, index: usize) -> Result<ProgramHeader<'_>, ElfError> {
        self.tables.segments.entry(index)?;
        Ok(ProgramHeader { file: self, index })
    }

    pub fn segments(&self) -> impl Iterator<Item = ProgramHeader<'_>> {
        (0..self.tables.segments.count).map(move |index| ProgramHeader { file: self, index })
    }
}

impl<'a> ProgramHeader<'a> {
    /// The raw p_type.
    pub fn ptype(&self) -> Result<u32, ElfError> {
        Ok(self.field(|l| l.program.ptype)? as u32)
    }

    /// Read/Write/Execute flags.
    pub fn flags(&self) -> Result<u32, ElfError> {
        Ok(self.field(|l| l.program.flags)? as u32)
    }

    /// Offset to the first byte of the segment.
    pub fn offset(&self) -> Result<u64, ElfError> {
        self.field(|l| l.program.offset)
    }

    /// Virtual address of the first byte in the segment.
    pub fn vaddr(&self) -> Result<u64, ElfError> {
        self.field(|l| l.program.vaddr)
    }

    /// Physical address of the first byte in the segment.
    pub fn paddr(&self) -> Result<u64, ElfError> {
        self.field(|l| l.program.paddr)
    }

    /// Number of bytes in the segment in the file.
    pub fn file_size(&self) -> Result<u64, ElfError> {
        self.field(|l| l.program.file_size)
    }

    /// Number of bytes in the segment in memory.
    pub fn mem_size(&self) -> Result<u64, ElfError> {
        self.field(|l| l.program.mem_size)
    }

    pub fn align(&self) -> Result<u64, ElfError> {
        self.field(|l| l.program.align)
    }

    pub fn type_name(&self) -> Result<&'static str, ElfError> {
        Ok(segment_type_name(self.ptype()?))
    }

    pub fn executable(&self) -> Result<bool, ElfError> {
        Ok(self.flags()? & EXECUTE_FLAG != 0)
    }

    pub fn writeable(&self) -> Result<bool, ElfError> {
        Ok(self.flags()? & WRITE_FLAG != 0)
    }

    pub fn readable(&self) -> Result<bool, ElfError> {
        Ok(self.flags()? & READ_FLAG != 0)
    }

    fn field(&self, select: impl Fn(&'static Layout) -> Field) -> Result<u64, ElfError> {
        self.file
            .entry_field(&self.file.tables.segments, self.index, select)
    }
}

/// Unknown types are fine, they're reported as "UNKNOWN". Processor specific types
/// are grouped: PT_HIPROC names only 0x7fffffff and every other value from PT_LOPROC
/// (0x70000000) up to it is "PT_LOPROC", so e.g. PT_ARM_EXIDX reads as "PT_LOPROC".
pub fn segment_type_name(ptype: u32) -> &'static str {
    match ptype {
        PT_NULL => "PT_NULL",
        PT_LOAD => "PT_LOAD",
        PT_DYNAMIC => "PT_DYNAMIC",
        PT_INTERP => "PT_INTERP",
        PT_NOTE => "PT_NOTE",
        PT_SHLIB => "PT_SHLIB",
        PT_PHDR => "PT_PHDR",
        PT_TLS => "PT_TLS",
        PT_GNU_EH_FRAME => "PT_GNU_EH_FRAME",
        PT_GNU_STACK => "PT_GNU_STACK",
        PT_GNU_RELRO => "PT_GNU_RELRO",
        PT_GNU_PROPERTY => "PT_GNU_PROPERTY",
        PT_HIPROC => "PT_HIPROC",
        PT_LOPROC..PT_HIPROC => "PT_LOPROC",
        _ => "UNKNOWN",
    }
}

/// rwx style, e.g. "r-x".
pub fn segment_flags(flags: u32) -> String {
    let mut result = String::new();
    if flags & READ_FLAG != 0 {
        result.push('r');
    } else {
        result.push('-');
    }
    if flags & WRITE_FLAG != 0 {
        result.push('w');
    } else {
        result.push('-');
    }
    if flags & EXECUTE_FLAG != 0 {
        result.push('x');
    } else {
        result.push('-');
    }
    result
}
