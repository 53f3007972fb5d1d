use super::tables::{Column, FieldList, ReportTable, row};
use crate::elf::{ElfFile, SymbolIndex, SymbolTableKind, section_flags, segment_flags};
use crate::repl::{ExplainArgs, FindArgs, SymbolArgs, TableArgs};
use crate::utils::{Styling, uwriteln};
use std::error::Error;
use std::io::Write;

const SEGMENT_COLUMNS: &[Column] = &[
    Column::right("index", "the program header index"),
    Column::left("type", "the segment type"),
    Column::right("offset", "the offset into the ELF file at which the segment appears"),
    Column::right("vaddr", "the virtual address the segment starts at"),
    Column::right("paddr", "the physical address, usually the same as vaddr"),
    Column::right("file size", "the size of the segment in the file"),
    Column::right("memory size", "the size of the segment in memory"),
    Column::left("flags", "readable, writeable, and/or executable"),
    Column::right("align", "alignment of the segment in memory and in the file"),
];

const SECTION_COLUMNS: &[Column] = &[
    Column::right("index", "the section header index"),
    Column::left("name", "the section name, from .shstrtab"),
    Column::left("type", "the section type"),
    Column::right("addr", "the virtual address of the section, zero if it isn't loaded"),
    Column::right("offset", "the offset into the ELF file at which the section appears"),
    Column::right("size", "the size of the section in bytes"),
    Column::right("entries", "number of entries for sections that are tables"),
    Column::right("link", "index of an associated section, e.g. a string table"),
    Column::left("flags", "writeable, allocated, executable, etc"),
];

const SYMBOL_COLUMNS: &[Column] = &[
    Column::right("index", "the symbol table index"),
    Column::right("value", "usually an address"),
    Column::right("size", "size of the object, zero if unknown"),
    Column::left("type", "function, object, file, etc"),
    Column::left("binding", "local, global, or weak"),
    Column::left("visibility", "whether other object files can see the symbol"),
    Column::left("section", "the section the symbol is defined in"),
    Column::left("name", "the symbol name"),
];

const DYNAMIC_COLUMNS: &[Column] = &[
    Column::right("index", "the .dynamic index"),
    Column::left("tag", "what the entry is for"),
    Column::left("value", "a string for names and paths, otherwise an integer or address"),
];

const RELOCATION_COLUMNS: &[Column] = &[
    Column::right("offset", "where the relocation is applied"),
    Column::right("info", "the symbol index and relocation type"),
    Column::left("type", "how the relocation is computed"),
    Column::right("addend", "constant added to the computed value, REL sections have none"),
    Column::left("symbol", "the .dynsym symbol the relocation refers to"),
];

pub fn elf_header(
    out: &mut impl Write,
    file: &ElfFile,
    args: &ExplainArgs,
) -> Result<(), Box<dyn Error>> {
    let header = &file.header;
    let mut fields = FieldList::new();
    fields.push("class", file.class_name(), "32-bit or 64-bit structures");
    fields.push(
        "data",
        file.data_name().unwrap_or("unknown"),
        "byte order used for multi-byte fields",
    );
    fields.push("version", file.version(), "ELF version, 1 is the only one");
    fields.push(
        "type",
        file.type_name().unwrap_or("unknown"),
        "relocatable object, executable, shared object, or core file",
    );
    fields.push("machine", header.machine(), "CPU architecture");
    fields.push("osabi", header.abi(), "the OS the binary was compiled for");
    fields.push("entry", format!("0x{:x}", file.entry()), "virtual address execution starts at");
    fields.push("flags", format!("0x{:x}", header.flags), "processor specific flags");
    fields.push("sections", file.num_sections(), "number of entries in the section header table");
    fields.push("segments", file.num_segments(), "number of entries in the program header table");
    fields.push(
        "section_offset",
        header.section_offset,
        "offset in the ELF file to the section header table",
    );
    fields.push(
        "ph_offset",
        header.ph_offset,
        "offset in the ELF file to the program header table",
    );
    fields.push(
        "string_table_index",
        header.string_table_index,
        "section index containing the section names",
    );
    fields.writeln(out, args.explain);
    Ok(())
}

pub fn elf_segments(
    out: &mut impl Write,
    file: &ElfFile,
    args: &TableArgs,
) -> Result<(), Box<dyn Error>> {
    let mut table = ReportTable::new(SEGMENT_COLUMNS);
    for segment in file.segments() {
        table.push(row![
            segment.index,
            segment.type_name()?,
            format!("{:x}", segment.offset()?),
            format!("{:x}", segment.vaddr()?),
            format!("{:x}", segment.paddr()?),
            format!("{:x}", segment.file_size()?),
            format!("{:x}", segment.mem_size()?),
            segment_flags(segment.flags()?),
            format!("{:x}", segment.align()?),
        ]);
    }
    table.writeln(out, args.titles, args.explain);
    Ok(())
}

pub fn elf_sections(
    out: &mut impl Write,
    file: &ElfFile,
    args: &TableArgs,
) -> Result<(), Box<dyn Error>> {
    let mut table = ReportTable::new(SECTION_COLUMNS);
    for section in file.sections() {
        // Sections are listed even if .shstrtab is missing.
        let name = section.name().unwrap_or_default();
        table.push(row![
            section.index,
            name,
            section.section_type()?.name(),
            format!("{:x}", section.addr()?),
            format!("{:x}", section.offset()?),
            format!("{:x}", section.size()?),
            section.num_entries()?,
            section.link()?,
            section_flags(section.flags()?),
        ]);
    }
    table.writeln(out, args.titles, args.explain);
    Ok(())
}

pub fn elf_symbols(
    out: &mut impl Write,
    file: &ElfFile,
    args: &SymbolArgs,
) -> Result<(), Box<dyn Error>> {
    let (kind, present) = if args.dynamic {
        (SymbolTableKind::Dynamic, file.tables.dynsym.is_some())
    } else {
        (SymbolTableKind::Static, file.tables.symtab.is_some())
    };
    if !present {
        let name = if args.dynamic { ".dynsym" } else { ".symtab" };
        uwriteln!(out, "{}", format!("there is no {name} section").warn());
        return Ok(());
    }

    let mut table = ReportTable::new(SYMBOL_COLUMNS);
    for symbol in file.symbols_in(kind) {
        let section = match symbol.section_index()? {
            SymbolIndex::Abs => "ABS".to_string(),
            SymbolIndex::Common => "COMMON".to_string(),
            SymbolIndex::Undef => "UNDEF".to_string(),
            SymbolIndex::XIndex => "XINDEX".to_string(),
            SymbolIndex::Reserved(index) => format!("{index:#x}"),
            // Symbols can point at sections that don't exist.
            SymbolIndex::Index(index) => match symbol.section_name() {
                Ok(Some(name)) => name.into_owned(),
                _ => format!("#{}", index.0),
            },
        };
        table.push(row![
            symbol.index,
            format!("{:x}", symbol.value()?),
            symbol.size()?,
            symbol.symbol_type()?.name(),
            symbol.binding()?.name(),
            symbol.visibility()?.name(),
            section,
            symbol.name()?.unwrap_or_default(),
        ]);
    }
    table.writeln(out, args.table.titles, args.table.explain);
    Ok(())
}

pub fn elf_dynamic(
    out: &mut impl Write,
    file: &ElfFile,
    args: &TableArgs,
) -> Result<(), Box<dyn Error>> {
    if file.tables.dynamic.is_none() {
        uwriteln!(out, "{}", "there is no .dynamic section".warn());
        return Ok(());
    }

    let mut table = ReportTable::new(DYNAMIC_COLUMNS);
    for entry in file.dynamic_entries() {
        let value = match entry.string_value()? {
            Some(s) => s.into_owned(),
            None => format!("0x{:x}", entry.value()?),
        };
        table.push(row![entry.index, entry.tag_name()?, value]);
    }
    table.writeln(out, args.titles, args.explain);
    Ok(())
}

pub fn elf_relocations(
    out: &mut impl Write,
    file: &ElfFile,
    args: &TableArgs,
) -> Result<(), Box<dyn Error>> {
    let mut found = false;
    for section in file.sections() {
        if !section.is_relocation()? {
            continue;
        }
        if found {
            uwriteln!(out);
        }
        found = true;

        let name = section.name().unwrap_or_default();
        uwriteln!(
            out,
            "relocation section {} with {} entries:",
            (&*name).table_header(),
            section.num_entries()?
        );

        let mut table = ReportTable::new(RELOCATION_COLUMNS);
        for relocation in section.relocations() {
            let addend = relocation
                .addend()?
                .map(|a| a.to_string())
                .unwrap_or_default();
            // Symbols are reported even if .dynsym doesn't have them.
            let symbol = match relocation.symbol_name() {
                Ok(Some(name)) => name.into_owned(),
                Ok(None) => String::new(),
                Err(_) => format!("#{}", relocation.symbol_index()?),
            };
            table.push(row![
                format!("{:x}", relocation.offset()?),
                format!("{:x}", relocation.info()?),
                relocation.type_name()?,
                addend,
                symbol,
            ]);
        }
        table.writeln(out, args.titles, args.explain);
    }
    if !found {
        uwriteln!(out, "{}", "there are no relocation sections".warn());
    }
    Ok(())
}

/// Looks for sections and symbols with the name.
pub fn elf_find(
    out: &mut impl Write,
    file: &ElfFile,
    args: &FindArgs,
) -> Result<(), Box<dyn Error>> {
    let mut found = false;
    if let Ok((index, section)) = file.section_by_name(&args.name) {
        uwriteln!(
            out,
            "section {index} {} at 0x{:x}",
            section.section_type()?.name(),
            section.addr()?
        );
        found = true;
    }
    for (what, kind) in [
        ("symbol", SymbolTableKind::Static),
        ("dynamic symbol", SymbolTableKind::Dynamic),
    ] {
        if let Ok((index, symbol)) = file.symbol_by_name_in(kind, &args.name) {
            let section = symbol
                .section_name()?
                .map(|s| format!(" in {s}"))
                .unwrap_or_default();
            uwriteln!(
                out,
                "{what} {index} {} at 0x{:x}{section}",
                symbol.symbol_type()?.name(),
                symbol.value()?
            );
            found = true;
        }
    }
    if !found {
        uwriteln!(out, "{}", format!("{} not found", args.name).warn());
    }
    Ok(())
}
