use std::borrow::Cow;
use std::fmt::{self, Display};
use std::io;
use std::path::PathBuf;

/// Everything that can go wrong while opening or reading an ELF file.
#[derive(Debug)]
pub enum ElfError {
    /// The path could not be opened, e.g. it's missing or permission was denied.
    Open { path: PathBuf, source: io::Error },

    /// The file was opened but could not be memory mapped.
    Map { path: PathBuf, source: io::Error },

    /// The bytes are not a (well enough formed) ELF file. This covers a bad magic
    /// number as well as offsets, tables, and strings that point outside the file.
    Format { msg: Cow<'static, str> },

    /// EI_CLASS is neither ELFCLASS32 nor ELFCLASS64.
    UnsupportedClass { class: u8 },

    /// A by-index lookup was given an index at or past the end of its table.
    IndexOutOfRange {
        what: &'static str,
        index: usize,
        count: usize,
    },

    /// A by-name or by-tag lookup found nothing, or the table it needs is absent.
    NotFound { what: Cow<'static, str> },
}

impl Display for ElfError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ElfError::Open { path, source } => {
                write!(f, "couldn't open {}: {source}", path.display())
            }
            ElfError::Map { path, source } => {
                write!(f, "couldn't map {}: {source}", path.display())
            }
            ElfError::Format { msg } => write!(f, "bad ELF file: {msg}"),
            ElfError::UnsupportedClass { class } => {
                write!(f, "unsupported ELF class: {class}")
            }
            ElfError::IndexOutOfRange { what, index, count } => {
                write!(f, "{what} index {index} is out of range (count is {count})")
            }
            ElfError::NotFound { what } => write!(f, "{what} not found"),
        }
    }
}

impl std::error::Error for ElfError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ElfError::Open { source, .. } | ElfError::Map { source, .. } => Some(source),
            _ => None,
        }
    }
}

#[cold]
#[inline(never)]
pub(crate) fn format_error(msg: impl Into<Cow<'static, str>>) -> ElfError {
    ElfError::Format { msg: msg.into() }
}

#[cold]
#[inline(never)]
pub(crate) fn not_found(what: impl Into<Cow<'static, str>>) -> ElfError {
    ElfError::NotFound { what: what.into() }
}
