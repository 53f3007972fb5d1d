//! Builds small but complete ELF files for the unit tests. Structures are written field
//! by field in declaration order (like a Stream reads them), independently of the
//! layout tables the readers use.
use super::class::Field;
use super::{ElfError, ElfFile};
use std::sync::atomic::{AtomicUsize, Ordering};

pub const SHT_PROGBITS: u32 = 1;
pub const SHT_SYMTAB: u32 = 2;
pub const SHT_STRTAB: u32 = 3;
pub const SHT_RELA: u32 = 4;
pub const SHT_DYNAMIC: u32 = 6;
pub const SHT_REL: u32 = 9;
pub const SHT_DYNSYM: u32 = 11;

pub const TEXT_ADDR: u64 = 0x401000;
pub const DATA_ADDR: u64 = 0x402000;
pub const ENTRY: u64 = 0x401010;

#[derive(Clone, Copy, Debug)]
pub struct Fixture {
    pub sixty_four_bit: bool,
    pub little_endian: bool,

    /// Adds .dynsym, .dynstr, .rel.dyn, .rela.plt, and .dynamic along with the program
    /// headers a dynamic object would have.
    pub dynamic: bool,

    /// Adds .symtab and .strtab.
    pub symbols: bool,

    /// Writes .symtab with an sh_entsize of zero.
    pub zero_entry_size: bool,
}

impl Fixture {
    pub fn dynamic64() -> Self {
        Fixture {
            sixty_four_bit: true,
            little_endian: true,
            dynamic: true,
            symbols: true,
            zero_entry_size: false,
        }
    }

    pub fn dynamic32() -> Self {
        Fixture {
            sixty_four_bit: false,
            ..Fixture::dynamic64()
        }
    }

    pub fn big_endian32() -> Self {
        Fixture {
            sixty_four_bit: false,
            little_endian: false,
            ..Fixture::dynamic64()
        }
    }

    /// A static executable with no symbols: just .text, .data, and .shstrtab.
    pub fn stripped64() -> Self {
        Fixture {
            dynamic: false,
            symbols: false,
            ..Fixture::dynamic64()
        }
    }

    pub fn open(&self) -> ElfFile {
        open_bytes(&self.bytes()).unwrap()
    }

    /// Opens the fixture after overwriting fields. `patches` is given the unmodified
    /// file so it can find the structures to change and returns (structure offset,
    /// field, new value) triples.
    pub fn open_patched(
        &self,
        patches: impl FnOnce(&ElfFile) -> Vec<(usize, Field, u64)>,
    ) -> Result<ElfFile, ElfError> {
        let mut bytes = self.bytes();
        for (base, field, value) in patches(&self.open()) {
            let size = field.size;
            let encoded = if self.little_endian {
                value.to_le_bytes()[..size].to_vec()
            } else {
                value.to_be_bytes()[8 - size..].to_vec()
            };
            let start = base + field.offset;
            bytes[start..start + size].copy_from_slice(&encoded);
        }
        open_bytes(&bytes)
    }

    pub fn bytes(&self) -> Vec<u8> {
        let mut names = Strings::new();
        let mut sections = vec![SectionDef::null()];
        sections.push(SectionDef {
            name: names.add(".text"),
            stype: SHT_PROGBITS,
            flags: 0x6, // ALLOC | EXECINSTR
            addr: TEXT_ADDR,
            align: 16,
            data: vec![0x90; 48],
            ..SectionDef::null()
        });
        sections.push(SectionDef {
            name: names.add(".data"),
            stype: SHT_PROGBITS,
            flags: 0x3, // WRITE | ALLOC
            addr: DATA_ADDR,
            align: 8,
            data: vec![0; 32],
            ..SectionDef::null()
        });
        if self.dynamic {
            self.add_dynamic(&mut names, &mut sections);
        }
        if self.symbols {
            self.add_symbols(&mut names, &mut sections);
        }
        let shstrtab_name = names.add(".shstrtab");
        sections.push(SectionDef {
            name: shstrtab_name,
            stype: SHT_STRTAB,
            align: 1,
            data: names.bytes,
            ..SectionDef::null()
        });

        let segments = self.segments();
        self.layout(&segments, &sections)
    }

    fn writer(&self) -> Writer {
        Writer {
            bytes: Vec::new(),
            sixty_four_bit: self.sixty_four_bit,
            little_endian: self.little_endian,
        }
    }

    fn symbol_size(&self) -> u64 {
        if self.sixty_four_bit { 24 } else { 16 }
    }

    fn add_dynamic(&self, names: &mut Strings, sections: &mut Vec<SectionDef>) {
        let dynsym_index = sections.len() as u32;
        let dynstr_index = dynsym_index + 1;

        let mut strings = Strings::new();
        let libc = strings.add("libc.so.6");
        let soname = strings.add("libfoo.so");
        let runpath = strings.add("/opt/foo/lib");
        let puts = strings.add("puts");
        let foo_init = strings.add("foo_init");
        let foo_data = strings.add("foo_data");

        let mut w = self.writer();
        w.symbol(0, 0, 0, 0, 0, 0);
        w.symbol(puts, 0, 0, 0x12, 0, 0); // GLOBAL FUNC, UNDEF
        w.symbol(foo_init, TEXT_ADDR, 16, 0x12, 0, 1); // GLOBAL FUNC in .text
        w.symbol(foo_data, DATA_ADDR, 8, 0x11, 0, 2); // GLOBAL OBJECT in .data
        sections.push(SectionDef {
            name: names.add(".dynsym"),
            stype: SHT_DYNSYM,
            flags: 0x2,
            link: dynstr_index,
            info: 1,
            align: 8,
            entry_size: self.symbol_size(),
            data: w.bytes,
            ..SectionDef::null()
        });

        let dynstr_size = strings.bytes.len() as u64;
        sections.push(SectionDef {
            name: names.add(".dynstr"),
            stype: SHT_STRTAB,
            flags: 0x2,
            align: 1,
            data: strings.bytes,
            ..SectionDef::null()
        });

        // GLOB_DAT against foo_data
        let mut w = self.writer();
        w.relocation(0x402010, 3, 6, None);
        sections.push(SectionDef {
            name: names.add(".rel.dyn"),
            stype: SHT_REL,
            flags: 0x2,
            link: dynsym_index,
            align: 8,
            entry_size: if self.sixty_four_bit { 16 } else { 8 },
            data: w.bytes,
            ..SectionDef::null()
        });

        // JUMP_SLOT against puts and a 64-bit absolute against foo_init
        let mut w = self.writer();
        w.relocation(0x403018, 1, 7, Some(0));
        w.relocation(0x403020, 2, 1, Some(-16));
        sections.push(SectionDef {
            name: names.add(".rela.plt"),
            stype: SHT_RELA,
            flags: 0x42,
            link: dynsym_index,
            info: 1,
            align: 8,
            entry_size: if self.sixty_four_bit { 24 } else { 12 },
            data: w.bytes,
            ..SectionDef::null()
        });

        let mut w = self.writer();
        w.dynamic(1, libc as u64); // DT_NEEDED
        w.dynamic(14, soname as u64); // DT_SONAME
        w.dynamic(29, runpath as u64); // DT_RUNPATH
        w.dynamic(5, 0x400300); // DT_STRTAB
        w.dynamic(6, 0x400200); // DT_SYMTAB
        w.dynamic(10, dynstr_size); // DT_STRSZ
        w.dynamic(0x12345, 7);
        w.dynamic(0, 0); // DT_NULL
        sections.push(SectionDef {
            name: names.add(".dynamic"),
            stype: SHT_DYNAMIC,
            flags: 0x3,
            link: dynstr_index,
            align: 8,
            entry_size: if self.sixty_four_bit { 16 } else { 8 },
            data: w.bytes,
            ..SectionDef::null()
        });
    }

    fn add_symbols(&self, names: &mut Strings, sections: &mut Vec<SectionDef>) {
        let strtab_index = sections.len() as u32 + 1;

        let mut strings = Strings::new();
        let crt = strings.add("crt.c");
        let counter = strings.add("counter");
        let main = strings.add("main");
        let dup = strings.add("dup");
        let buffer = strings.add("buffer");
        let external = strings.add("external");

        let mut w = self.writer();
        w.symbol(0, 0, 0, 0, 0, 0);
        w.symbol(crt, 0, 0, 0x04, 0, 0xfff1); // LOCAL FILE, ABS
        w.symbol(counter, DATA_ADDR + 8, 4, 0x01, 2, 2); // LOCAL OBJECT, hidden, .data
        w.symbol(main, ENTRY, 32, 0x12, 0, 1); // GLOBAL FUNC, .text
        w.symbol(dup, DATA_ADDR, 8, 0x11, 0, 2); // GLOBAL OBJECT, .data
        w.symbol(dup, DATA_ADDR + 4, 4, 0x21, 0, 2); // WEAK OBJECT, .data
        w.symbol(buffer, 16, 64, 0x11, 0, 0xfff2); // GLOBAL OBJECT, COMMON
        w.symbol(external, 0, 0, 0x10, 0, 0); // GLOBAL NOTYPE, UNDEF
        sections.push(SectionDef {
            name: names.add(".symtab"),
            stype: SHT_SYMTAB,
            link: strtab_index,
            info: 3,
            align: 8,
            entry_size: if self.zero_entry_size {
                0
            } else {
                self.symbol_size()
            },
            data: w.bytes,
            ..SectionDef::null()
        });
        sections.push(SectionDef {
            name: names.add(".strtab"),
            stype: SHT_STRTAB,
            align: 1,
            data: strings.bytes,
            ..SectionDef::null()
        });
    }

    fn segments(&self) -> Vec<SegmentDef> {
        let mut segments = Vec::new();
        if self.dynamic {
            segments.push(SegmentDef::new(6, 0x4, 0x400040)); // PT_PHDR
        }
        segments.push(SegmentDef::new(1, 0x5, 0x400000)); // PT_LOAD
        if self.dynamic {
            segments.push(SegmentDef::new(2, 0x6, 0x403000)); // PT_DYNAMIC
        }
        segments.push(SegmentDef::new(0x6474e551, 0x6, 0)); // PT_GNU_STACK
        if self.dynamic {
            segments.push(SegmentDef::new(0x70000001, 0x4, 0)); // processor specific
            segments.push(SegmentDef::new(0x12345678, 0, 0));
        }
        segments
    }

    fn layout(&self, segments: &[SegmentDef], sections: &[SectionDef]) -> Vec<u8> {
        let (header_size, ph_size, sh_size) = if self.sixty_four_bit {
            (64, 56, 64)
        } else {
            (52, 32, 40)
        };
        let ph_offset = header_size;
        let data_start = ph_offset + segments.len() * ph_size;

        let mut body = Vec::new();
        let mut offsets = Vec::new();
        for section in sections {
            if section.stype == 0 {
                offsets.push(0);
                continue;
            }
            while (data_start + body.len()) % 8 != 0 {
                body.push(0);
            }
            offsets.push(data_start + body.len());
            body.extend_from_slice(&section.data);
        }
        while (data_start + body.len()) % 8 != 0 {
            body.push(0);
        }
        let sh_offset = data_start + body.len();

        let mut w = self.writer();
        w.bytes.extend_from_slice(&[0x7f, b'E', b'L', b'F']);
        w.byte(if self.sixty_four_bit { 2 } else { 1 });
        w.byte(if self.little_endian { 1 } else { 2 });
        w.byte(1); // EI_VERSION
        w.byte(0); // EI_OSABI
        w.byte(0); // EI_ABIVERSION
        w.bytes.resize(16, 0);
        w.half(if self.dynamic { 3 } else { 2 }); // ET_DYN or ET_EXEC
        w.half(if self.sixty_four_bit { 62 } else { 3 }); // x86-64 or 386
        w.word(1);
        w.addr(ENTRY);
        w.addr(ph_offset as u64);
        w.addr(sh_offset as u64);
        w.word(0);
        w.half(header_size as u16);
        w.half(ph_size as u16);
        w.half(segments.len() as u16);
        w.half(sh_size as u16);
        w.half(sections.len() as u16);
        w.half(sections.len() as u16 - 1); // .shstrtab is last
        assert_eq!(w.bytes.len(), header_size);

        for segment in segments {
            w.segment(segment);
        }
        assert_eq!(w.bytes.len(), data_start);

        w.bytes.extend_from_slice(&body);
        for (section, offset) in sections.iter().zip(offsets) {
            w.section(section, offset as u64);
        }
        w.bytes
    }
}

static NEXT_FILE: AtomicUsize = AtomicUsize::new(0);

/// Writes arbitrary bytes to a fresh file in the temp directory and opens it. The
/// file is removed either way, a mapping stays valid after its file is unlinked.
pub fn open_bytes(bytes: &[u8]) -> Result<ElfFile, ElfError> {
    let n = NEXT_FILE.fetch_add(1, Ordering::Relaxed);
    let path = std::env::temp_dir().join(format!("elfscope-test-{}-{n}", std::process::id()));
    std::fs::write(&path, bytes).unwrap();
    let result = ElfFile::open(&path);
    let _ = std::fs::remove_file(&path);
    result
}

struct Strings {
    bytes: Vec<u8>,
}

impl Strings {
    fn new() -> Self {
        Strings { bytes: vec![0] }
    }

    fn add(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }
        let offset = self.bytes.len() as u32;
        self.bytes.extend_from_slice(s.as_bytes());
        self.bytes.push(0);
        offset
    }
}

struct SectionDef {
    name: u32,
    stype: u32,
    flags: u64,
    addr: u64,
    link: u32,
    info: u32,
    align: u64,
    entry_size: u64,
    data: Vec<u8>,
}

impl SectionDef {
    fn null() -> Self {
        SectionDef {
            name: 0,
            stype: 0,
            flags: 0,
            addr: 0,
            link: 0,
            info: 0,
            align: 0,
            entry_size: 0,
            data: Vec::new(),
        }
    }
}

struct SegmentDef {
    ptype: u32,
    flags: u32,
    vaddr: u64,
}

impl SegmentDef {
    fn new(ptype: u32, flags: u32, vaddr: u64) -> Self {
        SegmentDef {
            ptype,
            flags,
            vaddr,
        }
    }
}

struct Writer {
    bytes: Vec<u8>,
    sixty_four_bit: bool,
    little_endian: bool,
}

impl Writer {
    fn byte(&mut self, value: u8) {
        self.bytes.push(value);
    }

    fn half(&mut self, value: u16) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn word(&mut self, value: u32) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    fn xword(&mut self, value: u64) {
        if self.little_endian {
            self.bytes.extend_from_slice(&value.to_le_bytes());
        } else {
            self.bytes.extend_from_slice(&value.to_be_bytes());
        }
    }

    /// Addresses, offsets, and the other fields that are 4 or 8 bytes depending on class.
    fn addr(&mut self, value: u64) {
        if self.sixty_four_bit {
            self.xword(value);
        } else {
            self.word(value as u32);
        }
    }

    fn signed(&mut self, value: i64) {
        if self.sixty_four_bit {
            self.xword(value as u64);
        } else {
            self.word(value as i32 as u32);
        }
    }

    fn symbol(&mut self, name: u32, value: u64, size: u64, info: u8, other: u8, section: u16) {
        self.word(name);
        if self.sixty_four_bit {
            self.byte(info);
            self.byte(other);
            self.half(section);
            self.xword(value);
            self.xword(size);
        } else {
            self.word(value as u32);
            self.word(size as u32);
            self.byte(info);
            self.byte(other);
            self.half(section);
        }
    }

    fn relocation(&mut self, offset: u64, symbol: u32, rtype: u32, addend: Option<i64>) {
        self.addr(offset);
        if self.sixty_four_bit {
            self.xword(((symbol as u64) << 32) | rtype as u64);
        } else {
            self.word((symbol << 8) | (rtype & 0xff));
        }
        if let Some(addend) = addend {
            self.signed(addend);
        }
    }

    fn dynamic(&mut self, tag: i64, value: u64) {
        self.signed(tag);
        self.addr(value);
    }

    fn segment(&mut self, segment: &SegmentDef) {
        self.word(segment.ptype);
        if self.sixty_four_bit {
            self.word(segment.flags);
        }
        self.addr(0); // offset
        self.addr(segment.vaddr);
        self.addr(segment.vaddr); // paddr
        self.addr(0x1000); // file size
        self.addr(0x2000); // memory size
        if !self.sixty_four_bit {
            self.word(segment.flags);
        }
        self.addr(0x1000); // align
    }

    fn section(&mut self, section: &SectionDef, offset: u64) {
        self.word(section.name);
        self.word(section.stype);
        self.addr(section.flags);
        self.addr(section.addr);
        self.addr(offset);
        self.addr(section.data.len() as u64);
        self.word(section.link);
        self.word(section.info);
        self.addr(section.align);
        self.addr(section.entry_size);
    }
}
