//! String tables: .shstrtab, .strtab, and .dynstr. Each is a blob of null-terminated
//! strings addressed by byte offset, and an offset can point into the middle of a string.
use super::error::{ElfError, format_error};
use super::{Reader, StringIndex};
use std::borrow::Cow;

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub struct StringTable {
    pub offset: usize,
    pub size: usize,
}

impl StringTable {
    /// Returns the raw bytes of the string at index (without its terminator). The string
    /// must end within the table.
    pub fn get<'a>(&self, reader: &'a Reader, index: StringIndex) -> Result<&'a [u8], ElfError> {
        let index = index.0 as usize;
        if index >= self.size {
            return Err(format_error(format!(
                "string index {index} is past the end of its table ({} bytes)",
                self.size
            )));
        }
        reader.read_cstr(self.offset + index, self.offset + self.size)
    }

    /// Like get but decoded for display. Names are nearly always ASCII; anything else
    /// is decoded lossily.
    pub fn get_str<'a>(
        &self,
        reader: &'a Reader,
        index: StringIndex,
    ) -> Result<Cow<'a, str>, ElfError> {
        Ok(String::from_utf8_lossy(self.get(reader, index)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elf::fixtures::Fixture;

    #[test]
    fn lookups() {
        let file = Fixture::dynamic64().open();
        let names = file.tables.shstrtab.unwrap();
        assert_eq!(names.get(&file.reader, StringIndex(0)).unwrap(), b"");
        assert_eq!(names.get_str(&file.reader, StringIndex(1)).unwrap(), ".text");

        // Offsets can land in the middle of a string.
        assert_eq!(names.get_str(&file.reader, StringIndex(2)).unwrap(), "text");
    }

    #[test]
    fn bounded_by_table() {
        let file = Fixture::dynamic64().open();
        let names = file.tables.shstrtab.unwrap();
        assert!(matches!(
            names.get(&file.reader, StringIndex(names.size as u32)),
            Err(ElfError::Format { .. })
        ));

        // ".text" isn't terminated within the first three bytes.
        let short = StringTable {
            offset: names.offset,
            size: 3,
        };
        assert!(short.get(&file.reader, StringIndex(0)).is_ok());
        assert!(matches!(
            short.get(&file.reader, StringIndex(1)),
            Err(ElfError::Format { .. })
        ));
    }
}
