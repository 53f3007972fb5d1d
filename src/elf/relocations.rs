//! Entries of SHT_REL and SHT_RELA sections.
// see https://intezer.com/blog/executable-and-linkable-format-101-part-3-relocations/
use super::class::{Field, RelocationLayout};
use super::error::{ElfError, format_error, not_found};
use super::sections::{SHT_RELA, Section};
use super::{Symbol, Table};
use std::borrow::Cow;

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum RelocationX86_64 {
    // name        val  field   calculation
    None,       // 0	None	None
    SixtyFour,  // 1	qword	S + A
    Pc32,       // 2	dword	S + A – P
    Got32,      // 3	dword	G + A
    Plt32,      // 4	dword	L + A – P
    Copy,       // 5	None	Value is copied directly from shared object
    GlobDat,    // 6	qword	S
    JumpSlot,   // 7	qword	S
    Relative,   // 8	qword	B + A
    GotPcRel,   // 9	dword	G + GOT + A – P
    ThirtyTwo,  // 10	dword	S + A
    ThirtyTwoS, // 11	dword	S + A
    Sixteen,    // 12	word	S + A
    Pc16,       // 13	word	S + A – P
    Eight,      // 14	word8	S + A
    Pc8,        // 15	word8	S + A – P
    DtpMod64,   // 16	qword
    DtpOff64,   // 17	qword
    TpOff64,    // 18	qword
    TlsGd,      // 19	dword
    TlsLd,      // 20	dword
    DtpOff32,   // 21	dword
    GotTpOff,   // 22	dword
    TpOff32,    // 23	dword
    Pc64,       // 24	qword	S + A – P
    GoTOoff64,  // 25	qword	S + A – GOT
    GotPc32,    // 26	dword	GOT + A – P
    Size32,     // 32	dword	Z + A
    Size64,     // 33	qword	Z + A
    IRelative,  // 37	qword	indirect (B + A)
}

/// One entry in a relocation section (Elf32_Rel, Elf32_Rela, Elf64_Rel, or Elf64_Rela).
#[derive(Clone, Copy)]
pub struct Relocation<'a> {
    pub section: Section<'a>,
    pub index: usize,
    table: Table,
    with_addend: bool,
}

impl<'a> Section<'a> {
    /// NotFound if this isn't a SHT_REL or SHT_RELA section.
    pub fn relocation(&self, index: usize) -> Result<Relocation<'a>, ElfError> {
        let (table, with_addend) = self.relocation_table()?;
        table.entry(index)?;
        Ok(Relocation {
            section: *self,
            index,
            table,
            with_addend,
        })
    }

    /// Empty if this isn't a relocation section.
    pub fn relocations(&self) -> impl Iterator<Item = Relocation<'a>> {
        let section = *self;
        self.relocation_table()
            .into_iter()
            .flat_map(move |(table, with_addend)| {
                (0..table.count).map(move |index| Relocation {
                    section,
                    index,
                    table,
                    with_addend,
                })
            })
    }

    fn relocation_table(&self) -> Result<(Table, bool), ElfError> {
        if !self.is_relocation()? {
            return Err(not_found(format!(
                "relocations in section {}",
                self.name().unwrap_or_default()
            )));
        }
        let with_addend = self.stype()? == SHT_RELA;
        let layout = self.file.reader.layout();
        let entry_size = if with_addend {
            layout.rela.size
        } else {
            layout.rel.size
        };
        let offset = usize::try_from(self.offset()?)
            .map_err(|_| format_error("relocation section offset is too large"))?;
        let table = Table::new("relocation", offset, self.num_entries()?, entry_size);
        match table.end() {
            Some(end) if end <= self.file.reader.len() => Ok((table, with_addend)),
            _ => Err(format_error(format!(
                "relocation section {} extends past the end of the file",
                self.index
            ))),
        }
    }
}

impl<'a> Relocation<'a> {
    /// r_offset: where the relocation applies.
    pub fn offset(&self) -> Result<u64, ElfError> {
        self.field(|l| l.offset)
    }

    /// r_info: the symbol index and relocation type.
    pub fn info(&self) -> Result<u64, ElfError> {
        self.field(|l| l.info)
    }

    /// r_addend, None for SHT_REL entries.
    pub fn addend(&self) -> Result<Option<i64>, ElfError> {
        if !self.with_addend {
            return Ok(None);
        }
        let file = self.section.file;
        let field = file.reader.layout().rela.addend;
        match field {
            Some(field) => Ok(Some(
                file.reader
                    .read_signed_field(self.table.entry(self.index)?, field)?,
            )),
            None => Ok(None),
        }
    }

    pub fn rtype(&self) -> Result<u32, ElfError> {
        Ok(self.section.file.reader.class.r_type(self.info()?))
    }

    /// Index into .dynsym, zero if the relocation has no symbol.
    pub fn symbol_index(&self) -> Result<u32, ElfError> {
        Ok(self.section.file.reader.class.r_sym(self.info()?))
    }

    /// The .dynsym entry the relocation refers to.
    pub fn symbol(&self) -> Result<Option<Symbol<'a>>, ElfError> {
        match self.symbol_index()? {
            0 => Ok(None),
            index => Ok(Some(self.section.file.dynamic_symbol(index as usize)?)),
        }
    }

    pub fn symbol_name(&self) -> Result<Option<Cow<'a, str>>, ElfError> {
        match self.symbol()? {
            Some(symbol) => symbol.name(),
            None => Ok(None),
        }
    }

    /// R_X86_64_* for x86-64 files, "UNKNOWN" for other machines and unknown types.
    pub fn type_name(&self) -> Result<&'static str, ElfError> {
        if !self.section.file.header.is_x86_64() {
            return Ok("UNKNOWN");
        }
        Ok(RelocationX86_64::from_u32(self.rtype()?).map_or("UNKNOWN", |r| r.name()))
    }

    fn field(
        &self,
        select: impl Fn(&'static RelocationLayout) -> Field,
    ) -> Result<u64, ElfError> {
        let layout = self.section.file.reader.layout();
        let layout = if self.with_addend {
            &layout.rela
        } else {
            &layout.rel
        };
        let base = self.table.entry(self.index)?;
        self.section.file.reader.read_field(base, select(layout))
    }
}

impl RelocationX86_64 {
    pub fn from_u32(rtype: u32) -> Option<Self> {
        match rtype {
            0 => Some(RelocationX86_64::None),
            1 => Some(RelocationX86_64::SixtyFour),
            2 => Some(RelocationX86_64::Pc32),
            3 => Some(RelocationX86_64::Got32),
            4 => Some(RelocationX86_64::Plt32),
            5 => Some(RelocationX86_64::Copy),
            6 => Some(RelocationX86_64::GlobDat),
            7 => Some(RelocationX86_64::JumpSlot),
            8 => Some(RelocationX86_64::Relative),
            9 => Some(RelocationX86_64::GotPcRel),
            10 => Some(RelocationX86_64::ThirtyTwo),
            11 => Some(RelocationX86_64::ThirtyTwoS),
            12 => Some(RelocationX86_64::Sixteen),
            13 => Some(RelocationX86_64::Pc16),
            14 => Some(RelocationX86_64::Eight),
            15 => Some(RelocationX86_64::Pc8),
            16 => Some(RelocationX86_64::DtpMod64),
            17 => Some(RelocationX86_64::DtpOff64),
            18 => Some(RelocationX86_64::TpOff64),
            19 => Some(RelocationX86_64::TlsGd),
            20 => Some(RelocationX86_64::TlsLd),
            21 => Some(RelocationX86_64::DtpOff32),
            22 => Some(RelocationX86_64::GotTpOff),
            23 => Some(RelocationX86_64::TpOff32),
            24 => Some(RelocationX86_64::Pc64),
            25 => Some(RelocationX86_64::GoTOoff64),
            26 => Some(RelocationX86_64::GotPc32),
            32 => Some(RelocationX86_64::Size32),
            33 => Some(RelocationX86_64::Size64),
            37 => Some(RelocationX86_64::IRelative),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            RelocationX86_64::None => "R_X86_64_NONE",
            RelocationX86_64::SixtyFour => "R_X86_64_64",
            RelocationX86_64::Pc32 => "R_X86_64_PC32",
            RelocationX86_64::Got32 => "R_X86_64_GOT32",
            RelocationX86_64::Plt32 => "R_X86_64_PLT32",
            RelocationX86_64::Copy => "R_X86_64_COPY",
            RelocationX86_64::GlobDat => "R_X86_64_GLOB_DAT",
            RelocationX86_64::JumpSlot => "R_X86_64_JUMP_SLOT",
            RelocationX86_64::Relative => "R_X86_64_RELATIVE",
            RelocationX86_64::GotPcRel => "R_X86_64_GOTPCREL",
            RelocationX86_64::ThirtyTwo => "R_X86_64_32",
            RelocationX86_64::ThirtyTwoS => "R_X86_64_32S",
            RelocationX86_64::Sixteen => "R_X86_64_16",
            RelocationX86_64::Pc16 => "R_X86_64_PC16",
            RelocationX86_64::Eight => "R_X86_64_8",
            RelocationX86_64::Pc8 => "R_X86_64_PC8",
            RelocationX86_64::DtpMod64 => "R_X86_64_DTPMOD64",
            RelocationX86_64::DtpOff64 => "R_X86_64_DTPOFF64",
            RelocationX86_64::TpOff64 => "R_X86_64_TPOFF64",
            RelocationX86_64::TlsGd => "R_X86_64_TLSGD",
            RelocationX86_64::TlsLd => "R_X86_64_TLSLD",
            RelocationX86_64::DtpOff32 => "R_X86_64_DTPOFF32",
            RelocationX86_64::GotTpOff => "R_X86_64_GOTTPOFF",
            RelocationX86_64::TpOff32 => "R_X86_64_TPOFF32",
            RelocationX86_64::Pc64 => "R_X86_64_PC64",
            RelocationX86_64::GoTOoff64 => "R_X86_64_GOTOFF64",
            RelocationX86_64::GotPc32 => "R_X86_64_GOTPC32",
            RelocationX86_64::Size32 => "R_X86_64_SIZE32",
            RelocationX86_64::Size64 => "R_X86_64_SIZE64",
            RelocationX86_64::IRelative => "R_X86_64_IRELATIVE",
        }
    }
}
