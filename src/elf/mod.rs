//! Read-only, class independent ELF support. Files are memory mapped and nothing is
//! copied out of them up front: sections, segments, symbols, dynamic entries, and
//! relocations are small `Copy` references that re-read their fields from the mapping.
//! Quick ELF reference: https://gist.github.com/x0nu11byt3/bcb35c3de461e5fb66173071a2379779
//!
//! ELF files start with an ELF header which includes:
//! * A magic number to identify the file as an ELF file.
//! * The class (32 or 64-bit) and byte order.
//! * The offset to and number of program headers.
//! * The offset to and number of section headers.
//!
//! Program headers identify segments. Segments are used by the OS to load an exe into
//! memory. A program header has type, vaddr, offset, etc.
//!
//! Section headers identify sections. Sections are used for static linking and
//! include the symbol tables, string tables, the dynamic section, and relocations.
//!
//! The 32 and 64-bit variants of every structure differ only in layout so the class
//! is resolved once, when the file is opened, into a table of field offsets (see
//! [`class`]) and all reads go through that.
pub mod class;
pub mod dynamic;
pub mod elf_file;
pub mod error;
pub mod header;
pub mod io;
pub mod primitives;
pub mod relocations;
pub mod sections;
pub mod segments;
pub mod strings;
pub mod symbols;

#[cfg(test)]
pub mod fixtures;

pub use class::*;
pub use dynamic::*;
pub use elf_file::*;
pub use error::*;
pub use header::*;
pub use io::*;
pub use primitives::*;
pub use relocations::*;
pub use sections::*;
pub use segments::*;
pub use strings::*;
pub use symbols::*;
