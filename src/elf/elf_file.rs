//! An opened ELF file: the mapping plus the locations of the tables everything else
//! reads from.
use super::class::{Field, Layout};
use super::error::{ElfError, format_error};
use super::{ElfHeader, Reader, SHT_NOBITS, StringIndex, StringTable, Table};
use memmap2::Mmap;
use std::fs::File;
use std::path::{Path, PathBuf};

/// Section index used by e_shstrndx when the real index is in section 0's sh_link.
pub const SHN_XINDEX: u16 = 0xffff;

/// Where the tables live within the mapping. These are offsets, not pointers, and are
/// fixed once the file has been opened.
#[derive(Clone, Copy, Debug)]
pub struct Tables {
    pub sections: Table,
    pub segments: Table,

    /// Section names.
    pub shstrtab: Option<StringTable>,

    /// Names for .symtab.
    pub strtab: Option<StringTable>,

    /// Names for .dynsym and string values in .dynamic.
    pub dynstr: Option<StringTable>,

    pub symtab: Option<Table>,
    pub dynsym: Option<Table>,
    pub dynamic: Option<Table>,
}

pub struct ElfFile {
    pub path: PathBuf,
    pub header: ElfHeader,
    pub reader: Reader,
    pub tables: Tables,
}

impl ElfFile {
    pub fn open(path: impl AsRef<Path>) -> Result<Self, ElfError> {
        let path = path.as_ref().to_path_buf();
        let file = File::open(&path).map_err(|source| ElfError::Open {
            path: path.clone(),
            source,
        })?;

        // This is unsafe because it has undefined behavior if the underlying file is
        // modified while the memory map is in use.
        let bytes = unsafe { Mmap::map(&file) }.map_err(|source| ElfError::Map {
            path: path.clone(),
            source,
        })?;
        let reader = Reader::new(bytes)?;
        let header = ElfHeader::new(&reader)?;
        let tables = Tables::locate(&reader, &header)?;
        log::debug!(
            "opened {} ({}, {} sections, {} segments)",
            path.display(),
            reader.class.name(),
            tables.sections.count,
            tables.segments.count
        );
        Ok(ElfFile {
            path,
            header,
            reader,
            tables,
        })
    }

    /// Unmaps the file. Everything borrowed from it has to be gone by now, the borrow
    /// checker enforces that.
    pub fn close(self) {
        log::trace!("closing {}", self.path.display());
    }

    /// "ELF32" or "ELF64".
    pub fn class_name(&self) -> &'static str {
        self.header.class_name()
    }

    pub fn data_name(&self) -> Option<&'static str> {
        self.header.data_name()
    }

    pub fn version(&self) -> u32 {
        self.header.version()
    }

    pub fn type_name(&self) -> Option<&'static str> {
        self.header.type_name()
    }

    pub fn entry(&self) -> u64 {
        self.header.entry
    }

    /// This is e_shnum unless extended section numbering is in use.
    pub fn num_sections(&self) -> usize {
        self.tables.sections.count
    }

    pub fn num_segments(&self) -> usize {
        self.tables.segments.count
    }

    /// Number of entries in .symtab, zero if there isn't one.
    pub fn num_symbols(&self) -> usize {
        self.tables.symtab.map_or(0, |t| t.count)
    }

    /// Number of entries in .dynsym, zero if there isn't one.
    pub fn num_dynamic_symbols(&self) -> usize {
        self.tables.dynsym.map_or(0, |t| t.count)
    }

    /// Number of entries in .dynamic, zero if there isn't one.
    pub fn num_dynamic_entries(&self) -> usize {
        self.tables.dynamic.map_or(0, |t| t.count)
    }

    /// Reads a field of the entry at index within table. This is how all the entry
    /// readers get at their data: select picks the field from the layout for this
    /// file's class.
    pub fn entry_field(
        &self,
        table: &Table,
        index: usize,
        select: impl Fn(&'static Layout) -> Field,
    ) -> Result<u64, ElfError> {
        let base = table.entry(index)?;
        self.reader.read_field(base, select(self.reader.layout()))
    }

    /// Like entry_field but sign extended.
    pub fn signed_entry_field(
        &self,
        table: &Table,
        index: usize,
        select: impl Fn(&'static Layout) -> Field,
    ) -> Result<i64, ElfError> {
        let base = table.entry(index)?;
        self.reader
            .read_signed_field(base, select(self.reader.layout()))
    }
}

impl Tables {
    /// Finds the program and section header tables using the ELF header and then scans
    /// the sections once for the string, symbol, and dynamic tables. Optional tables
    /// that are missing are simply None.
    fn locate(reader: &Reader, header: &ElfHeader) -> Result<Self, ElfError> {
        let layout = reader.layout();

        let ph_offset = to_usize(header.ph_offset)?;
        let num_segments = if ph_offset == 0 {
            0
        } else {
            header.num_ph_entries as usize
        };
        let segments = Table::new("program header", ph_offset, num_segments, layout.program.size);
        check_table(reader, &segments)?;

        let section_offset = to_usize(header.section_offset)?;
        let mut num_sections = header.num_section_entries as usize;
        let mut names_index = header.string_table_index as usize;
        if section_offset == 0 {
            if num_sections != 0 {
                log::warn!("e_shnum is {num_sections} but there is no section header table");
            }
            num_sections = 0;
        } else if num_sections == 0 || header.string_table_index == SHN_XINDEX {
            // Extended numbering: the real values are stashed in section 0.
            if num_sections == 0 {
                num_sections = to_usize(reader.read_field(section_offset, layout.section.bytes)?)?;
            }
            if header.string_table_index == SHN_XINDEX {
                names_index = reader.read_field(section_offset, layout.section.link)? as usize;
            }
        }
        let sections = Table::new("section", section_offset, num_sections, layout.section.size);
        check_table(reader, &sections)?;

        let mut tables = Tables {
            sections,
            segments,
            shstrtab: None,
            strtab: None,
            dynstr: None,
            symtab: None,
            dynsym: None,
            dynamic: None,
        };

        if names_index == 0 {
            log::debug!("no section name string table");
            return Ok(tables);
        } else if names_index >= num_sections {
            log::warn!("e_shstrndx {names_index} is out of range, section names are unavailable");
            return Ok(tables);
        }
        let shstrtab = string_table(reader, &sections, names_index)?;
        tables.shstrtab = Some(shstrtab);

        for index in 0..num_sections {
            let base = sections.entry(index)?;
            let name = reader.read_field(base, layout.section.name)? as u32;
            let name = match shstrtab.get(reader, StringIndex(name)) {
                Ok(name) => name,
                Err(err) => {
                    log::warn!("skipping section {index}: {err}");
                    continue;
                }
            };
            // NOBITS sections occupy no file space, e.g. .dynamic after
            // objcopy --only-keep-debug.
            let stype = reader.read_field(base, layout.section.stype)? as u32;
            if stype == SHT_NOBITS && is_located(name) {
                log::debug!(
                    "{} in section {index} is SHT_NOBITS, leaving it absent",
                    String::from_utf8_lossy(name)
                );
                continue;
            }
            match name {
                b".strtab" if tables.strtab.is_none() => {
                    tables.strtab = Some(string_table(reader, &sections, index)?);
                }
                b".dynstr" if tables.dynstr.is_none() => {
                    tables.dynstr = Some(string_table(reader, &sections, index)?);
                }
                b".symtab" if tables.symtab.is_none() => {
                    let size = layout.symbol.size;
                    tables.symtab = Some(entry_table(reader, &sections, index, "symbol", size)?);
                }
                b".dynsym" if tables.dynsym.is_none() => {
                    let size = layout.symbol.size;
                    tables.dynsym =
                        Some(entry_table(reader, &sections, index, "dynamic symbol", size)?);
                }
                b".dynamic" if tables.dynamic.is_none() => {
                    let size = layout.dynamic.size;
                    tables.dynamic =
                        Some(entry_table(reader, &sections, index, "dynamic entry", size)?);
                }
                _ => (),
            }
        }
        log::debug!(
            "symtab: {:?}, dynsym: {:?}, dynamic: {:?}",
            tables.symtab.map(|t| t.count),
            tables.dynsym.map(|t| t.count),
            tables.dynamic.map(|t| t.count)
        );
        Ok(tables)
    }
}

fn is_located(name: &[u8]) -> bool {
    matches!(name, b".strtab" | b".dynstr" | b".symtab" | b".dynsym" | b".dynamic")
}

fn to_usize(value: u64) -> Result<usize, ElfError> {
    usize::try_from(value).map_err(|_| format_error(format!("offset {value:#x} is too large")))
}

fn check_table(reader: &Reader, table: &Table) -> Result<(), ElfError> {
    match table.end() {
        Some(end) if end <= reader.len() => Ok(()),
        _ => Err(format_error(format!(
            "{} table at offset {} with {} entries extends past the end of the file",
            table.what, table.offset, table.count
        ))),
    }
}

/// Offset and size of a section's contents, checked against the file length.
fn section_extent(reader: &Reader, sections: &Table, index: usize) -> Result<(usize, u64), ElfError> {
    let l = &reader.layout().section;
    let base = sections.entry(index)?;
    let offset = to_usize(reader.read_field(base, l.offset)?)?;
    let size = reader.read_field(base, l.bytes)?;
    reader.slice(offset, to_usize(size)?)?;
    Ok((offset, size))
}

fn string_table(reader: &Reader, sections: &Table, index: usize) -> Result<StringTable, ElfError> {
    let (offset, size) = section_extent(reader, sections, index)?;
    Ok(StringTable {
        offset,
        size: size as usize,
    })
}

fn entry_table(
    reader: &Reader,
    sections: &Table,
    index: usize,
    what: &'static str,
    entry_size: usize,
) -> Result<Table, ElfError> {
    let (offset, size) = section_extent(reader, sections, index)?;
    let base = sections.entry(index)?;
    let stated = reader.read_field(base, reader.layout().section.entry_size)?;
    if stated == 0 {
        log::warn!("{what} table in section {index} has a zero entry size");
    }
    let table = Table::new(what, offset, Table::count_entries(size, stated), entry_size);
    check_table(reader, &table)?;
    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::fixtures::{Fixture, open_bytes};

    #[test]
    fn missing_file() {
        let result = ElfFile::open("/this/path/does/not/exist");
        assert!(matches!(result, Err(ElfError::Open { .. })));
    }

    #[test]
    fn bad_magic() {
        let result = open_bytes(b"\x7fELG and then some more bytes to be long enough........");
        assert!(matches!(result, Err(ElfError::Format { .. })));

        assert!(matches!(open_bytes(b"MZ"), Err(ElfError::Format { .. })));
    }

    #[test]
    fn unsupported_class() {
        let mut bytes = Fixture::dynamic64().bytes();
        bytes[4] = 3;
        assert!(matches!(
            open_bytes(&bytes),
            Err(ElfError::UnsupportedClass { class: 3 })
        ));
    }

    #[test]
    fn truncated_header() {
        let bytes = Fixture::dynamic64().bytes();
        assert!(matches!(open_bytes(&bytes[..40]), Err(ElfError::Format { .. })));
    }

    #[test]
    fn truncated_section_table() {
        // The section header table is last in the fixtures.
        let bytes = Fixture::dynamic64().bytes();
        let result = open_bytes(&bytes[..bytes.len() - 10]);
        assert!(matches!(result, Err(ElfError::Format { .. })));
    }

    #[test]
    fn classes() {
        assert_eq!(Fixture::dynamic64().open().class_name(), "ELF64");
        assert_eq!(Fixture::dynamic32().open().class_name(), "ELF32");
        assert_eq!(Fixture::big_endian32().open().class_name(), "ELF32");
    }

    #[test]
    fn header() {
        let file = Fixture::dynamic64().open();
        assert_eq!(file.data_name(), Some("2's complement, little-endian"));
        assert_eq!(file.version(), 1);
        assert_eq!(file.type_name(), Some("DYN (shared object)"));
        assert_eq!(file.entry(), 0x401010);
        assert_eq!(file.header.machine(), "AMD x86-64");
        assert_eq!(file.header.abi(), "UNIX - System V");
        assert_eq!(file.num_sections(), 11);
        assert_eq!(file.num_segments(), 6);

        let file = Fixture::big_endian32().open();
        assert_eq!(file.data_name(), Some("2's complement, big-endian"));
        assert_eq!(file.type_name(), Some("DYN (shared object)"));
        assert_eq!(file.entry(), 0x401010);
        assert_eq!(file.num_sections(), 11);

        let file = Fixture::stripped64().open();
        assert_eq!(file.type_name(), Some("EXEC (executable file)"));
        assert_eq!(file.num_sections(), 4);
        assert_eq!(file.num_segments(), 2);
    }

    #[test]
    fn located_tables() {
        for fixture in [Fixture::dynamic64(), Fixture::dynamic32(), Fixture::big_endian32()] {
            let file = fixture.open();
            assert!(file.tables.shstrtab.is_some());
            assert!(file.tables.strtab.is_some());
            assert!(file.tables.dynstr.is_some());
            assert_eq!(file.num_symbols(), 8);
            assert_eq!(file.num_dynamic_symbols(), 4);
            assert_eq!(file.num_dynamic_entries(), 8);
        }

        let file = Fixture::stripped64().open();
        assert!(file.tables.shstrtab.is_some());
        assert!(file.tables.strtab.is_none());
        assert!(file.tables.dynstr.is_none());
        assert_eq!(file.num_symbols(), 0);
        assert_eq!(file.num_dynamic_symbols(), 0);
        assert_eq!(file.num_dynamic_entries(), 0);
    }

    #[test]
    fn symbols_without_dynamic() {
        let fixture = Fixture {
            dynamic: false,
            ..Fixture::dynamic64()
        };
        let file = fixture.open();
        assert_eq!(file.num_symbols(), 8);
        assert_eq!(file.num_dynamic_symbols(), 0);
        assert!(file.tables.dynamic.is_none());
    }

    #[test]
    fn nobits_tables_are_absent() {
        for fixture in [Fixture::dynamic64(), Fixture::big_endian32()] {
            let file = fixture
                .open_patched(|file| {
                    let (index, _) = file.section_by_name(".dynamic").unwrap();
                    let base = file.tables.sections.entry(index).unwrap();
                    let l = &file.reader.layout().section;
                    vec![
                        (base, l.stype, SHT_NOBITS as u64),
                        (base, l.offset, file.reader.len() as u64 + 0x1000),
                    ]
                })
                .unwrap();
            assert!(file.tables.dynamic.is_none());
            assert_eq!(file.num_dynamic_entries(), 0);
            assert!(matches!(file.dynamic_by_tag(1), Err(ElfError::NotFound { .. })));
            assert!(file.tables.dynsym.is_some());
            assert_eq!(file.section_by_name(".dynamic").unwrap().0, 7);
        }
    }

    #[test]
    fn zero_entry_size() {
        let fixture = Fixture {
            zero_entry_size: true,
            ..Fixture::dynamic64()
        };
        let file = fixture.open();
        assert!(file.tables.symtab.is_some());
        assert_eq!(file.num_symbols(), 0);
        assert!(matches!(
            file.symbol(0),
            Err(ElfError::IndexOutOfRange { index: 0, count: 0, .. })
        ));
    }

    #[test]
    fn entry_fields() {
        let file = Fixture::dynamic32().open();
        let sections = file.tables.sections;
        let stype = file.entry_field(&sections, 1, |l| l.section.stype).unwrap();
        assert_eq!(stype, 1); // SHT_PROGBITS
        assert!(matches!(
            file.entry_field(&sections, 11, |l| l.section.stype),
            Err(ElfError::IndexOutOfRange { .. })
        ));
    }

    #[test]
    fn close_releases() {
        let file = Fixture::stripped64().open();
        let count = file.num_sections();
        file.close();
        assert_eq!(count, 4);
    }
}
